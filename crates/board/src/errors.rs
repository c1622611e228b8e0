use sqlx::error::ErrorKind;
use thiserror::Error;

use crate::models::{EntityKey, EntityKind};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("{kind}: foreign key violation: {detail}")]
    ForeignKey { kind: EntityKind, detail: String },

    #[error("{kind} {key} already exists")]
    Duplicate { kind: EntityKind, key: EntityKey },

    #[error("{kind}.{relation}: no {target} with key {key}")]
    MissingTarget {
        kind: EntityKind,
        relation: &'static str,
        target: EntityKind,
        key: EntityKey,
    },

    #[error("cannot delete {kind}: {count} {dependent} row(s) still reference it")]
    HasDependents {
        kind: EntityKind,
        dependent: EntityKind,
        count: usize,
    },

    #[error("Store is closed")]
    Closed,
}

impl StoreError {
    /// Classifies a database error raised while writing `kind`.
    ///
    /// Constraint violations the schema enforces become their own variants so
    /// callers can tell a data problem apart from a connectivity problem.
    pub fn from_database(err: sqlx::Error, kind: EntityKind, key: Option<EntityKey>) -> Self {
        let classified = match &err {
            sqlx::Error::Database(db) => match (db.kind(), key) {
                (ErrorKind::ForeignKeyViolation, _) => Some(StoreError::ForeignKey {
                    kind,
                    detail: db.message().to_string(),
                }),
                (ErrorKind::UniqueViolation, Some(key)) => {
                    Some(StoreError::Duplicate { kind, key })
                }
                _ => None,
            },
            sqlx::Error::PoolClosed => Some(StoreError::Closed),
            _ => None,
        };

        classified.unwrap_or_else(|| StoreError::Database(err))
    }
}
