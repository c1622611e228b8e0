//! Record sets stored as JSON files in a directory.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use board::EntityKind;
use tracing::debug;

use super::{DataSource, SourceError, file_name};

/// Reads `<dir>/<kind file>.json` for each entity kind.
#[derive(Debug, Clone)]
pub struct JsonDirSource {
    dir: PathBuf,
}

impl JsonDirSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the file holding the record set for `kind`.
    pub fn path_for(&self, kind: EntityKind) -> PathBuf {
        self.dir.join(file_name(kind))
    }
}

#[async_trait]
impl DataSource for JsonDirSource {
    async fn fetch(&self, kind: EntityKind) -> Result<Vec<u8>, SourceError> {
        let path = self.path_for(kind);
        debug!("Reading {} records from {}", kind, path.display());

        tokio::fs::read(&path)
            .await
            .map_err(|source| SourceError::Io { path, source })
    }
}
