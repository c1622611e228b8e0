//! Record sets held in memory.

use std::collections::HashMap;

use async_trait::async_trait;
use board::EntityKind;

use super::{DataSource, SourceError};

/// In-memory record sets, keyed by kind.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    sets: HashMap<EntityKind, Vec<u8>>,
}

impl MemorySource {
    /// Creates a source where every kind has an empty record set.
    pub fn empty() -> Self {
        let sets = EntityKind::ORDER
            .into_iter()
            .map(|kind| (kind, b"[]".to_vec()))
            .collect();
        Self { sets }
    }

    /// Sets the records for `kind` from a JSON value.
    pub fn with_json(mut self, kind: EntityKind, records: serde_json::Value) -> Self {
        self.sets.insert(kind, records.to_string().into_bytes());
        self
    }

    /// Sets the raw bytes returned for `kind`.
    pub fn with_raw(mut self, kind: EntityKind, data: impl Into<Vec<u8>>) -> Self {
        self.sets.insert(kind, data.into());
        self
    }

    /// Removes the record set for `kind`, so fetching it fails.
    pub fn without(mut self, kind: EntityKind) -> Self {
        self.sets.remove(&kind);
        self
    }
}

#[async_trait]
impl DataSource for MemorySource {
    async fn fetch(&self, kind: EntityKind) -> Result<Vec<u8>, SourceError> {
        self.sets
            .get(&kind)
            .cloned()
            .ok_or(SourceError::Missing(kind))
    }
}
