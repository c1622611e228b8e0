use std::fmt;
use std::time::Duration;

use board::{EntityKey, EntityKind, StoreError};
use thiserror::Error;

use crate::db::RunPhase;
use crate::sources::SourceError;

/// Store-facing stage of a run, reported with store failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Reset,
    Populate,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Reset => f.write_str("reset"),
            Phase::Populate => f.write_str("populate"),
        }
    }
}

fn record_position(index: &Option<usize>) -> String {
    index.map(|i| format!(" #{i}")).unwrap_or_default()
}

/// Reasons a seeding run stops. Every variant is fatal to the run.
#[derive(Debug, Error)]
pub enum SeedError {
    #[error("{kind} records unavailable: {source}")]
    SourceUnavailable {
        kind: EntityKind,
        #[source]
        source: SourceError,
    },

    #[error("Malformed {kind} record{}: {reason}", record_position(.index))]
    MalformedRecord {
        kind: EntityKind,
        index: Option<usize>,
        reason: String,
    },

    #[error("{kind}.{relation} references {target} {key}, which is not loaded")]
    DanglingReference {
        kind: EntityKind,
        relation: &'static str,
        target: EntityKind,
        key: EntityKey,
    },

    #[error("Store rejected {kind} during {phase}: {source}")]
    Store {
        phase: Phase,
        kind: EntityKind,
        #[source]
        source: StoreError,
    },

    #[error("{kind} {phase} did not finish within {after:?}")]
    Timeout {
        phase: Phase,
        kind: EntityKind,
        after: Duration,
    },

    #[error("Invalid run transition from {from} to {to}")]
    InvalidTransition { from: RunPhase, to: RunPhase },
}

impl SeedError {
    /// Entity kind the failure is attributed to, if any.
    pub fn kind(&self) -> Option<EntityKind> {
        match self {
            SeedError::SourceUnavailable { kind, .. }
            | SeedError::MalformedRecord { kind, .. }
            | SeedError::DanglingReference { kind, .. }
            | SeedError::Store { kind, .. }
            | SeedError::Timeout { kind, .. } => Some(*kind),
            SeedError::InvalidTransition { .. } => None,
        }
    }
}
