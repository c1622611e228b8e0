//! Data sources for seed records.
//!
//! A [`DataSource`] returns the full raw JSON of one record set per entity
//! kind. Two implementations are provided:
//! - [`JsonDirSource`]: one JSON file per kind in a directory
//! - [`MemorySource`]: record sets held in memory

pub mod json_dir;
pub mod memory;

use async_trait::async_trait;
use board::EntityKind;
use std::path::PathBuf;
use thiserror::Error;

pub use json_dir::JsonDirSource;
pub use memory::MemorySource;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("IO error reading {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("No record set for {0}")]
    Missing(EntityKind),
}

/// Retrieves raw record sets, one per entity kind.
#[async_trait]
pub trait DataSource: Send + Sync {
    /// Returns the complete record set for `kind` as a JSON array.
    async fn fetch(&self, kind: EntityKind) -> Result<Vec<u8>, SourceError>;
}

/// File name holding the record set for `kind`.
pub fn file_name(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::Team => "team.json",
        EntityKind::Project => "project.json",
        EntityKind::User => "user.json",
        EntityKind::ProjectTeam => "projectTeam.json",
        EntityKind::Task => "task.json",
        EntityKind::Attachment => "attachment.json",
        EntityKind::Comment => "comment.json",
        EntityKind::TaskAssignment => "taskAssignment.json",
    }
}
