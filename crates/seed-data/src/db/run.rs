//! Run lifecycle: phases and the report of a finished run.

use std::fmt;
use std::time::{Duration, Instant};

use board::EntityKind;
use tracing::{error, info};
use uuid::Uuid;

use crate::errors::SeedError;

/// Phase of a seeding run.
///
/// `Idle -> Resetting -> Populating(kind).. -> Done`, with any phase able to
/// fall into `Failed`. `Done` and `Failed` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Idle,
    Resetting,
    Populating(EntityKind),
    Done,
    Failed,
}

impl RunPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunPhase::Done | RunPhase::Failed)
    }

    /// Whether a run in this phase may move to `next`.
    pub fn can_advance_to(&self, next: RunPhase) -> bool {
        match (self, next) {
            (RunPhase::Done | RunPhase::Failed, _) => false,
            (_, RunPhase::Failed) => true,
            (RunPhase::Idle, RunPhase::Resetting) => true,
            (RunPhase::Resetting, RunPhase::Populating(_)) => true,
            (RunPhase::Populating(current), RunPhase::Populating(following)) => {
                following.level() > current.level()
            }
            (RunPhase::Populating(_), RunPhase::Done) => true,
            _ => false,
        }
    }
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunPhase::Idle => f.write_str("idle"),
            RunPhase::Resetting => f.write_str("resetting"),
            RunPhase::Populating(kind) => write!(f, "populating {kind}"),
            RunPhase::Done => f.write_str("done"),
            RunPhase::Failed => f.write_str("failed"),
        }
    }
}

/// State of a single seeding run.
#[derive(Debug)]
pub struct SeedRun {
    id: Uuid,
    phase: RunPhase,
    started: Instant,
}

impl Default for SeedRun {
    fn default() -> Self {
        Self::new()
    }
}

impl SeedRun {
    /// Starts a fresh run in [`RunPhase::Idle`].
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            phase: RunPhase::Idle,
            started: Instant::now(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Moves to `next`, rejecting transitions the lifecycle does not allow.
    pub fn advance(&mut self, next: RunPhase) -> Result<(), SeedError> {
        if !self.phase.can_advance_to(next) {
            return Err(SeedError::InvalidTransition {
                from: self.phase,
                to: next,
            });
        }

        info!("Run phase: {} -> {}", self.phase, next);
        self.phase = next;
        Ok(())
    }

    /// Marks the run failed and hands the error back for propagation.
    pub fn fail(&mut self, err: SeedError) -> SeedError {
        error!("Run failed while {}: {}", self.phase, err);
        if !self.phase.is_terminal() {
            self.phase = RunPhase::Failed;
        }
        err
    }
}

/// Outcome of a completed run.
#[derive(Debug, Clone)]
pub struct SeedReport {
    pub run_id: Uuid,
    /// Rows inserted per kind, in dependency order.
    pub counts: Vec<(EntityKind, usize)>,
    pub elapsed: Duration,
}

impl SeedReport {
    pub(crate) fn new(run: &SeedRun, counts: Vec<(EntityKind, usize)>) -> Self {
        Self {
            run_id: run.id(),
            counts,
            elapsed: run.elapsed(),
        }
    }

    /// Rows inserted for `kind`.
    pub fn count(&self, kind: EntityKind) -> Option<usize> {
        self.counts
            .iter()
            .find(|(k, _)| *k == kind)
            .map(|(_, count)| *count)
    }

    pub fn total(&self) -> usize {
        self.counts.iter().map(|(_, count)| count).sum()
    }
}

impl fmt::Display for SeedReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Seeded {} rows in {:.2?} (run {})",
            self.total(),
            self.elapsed,
            self.run_id
        )?;
        for (kind, count) in &self.counts {
            writeln!(f, "  {kind}: {count}")?;
        }
        Ok(())
    }
}
