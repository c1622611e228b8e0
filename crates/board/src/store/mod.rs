//! The persistence contract the seeder writes through.
//!
//! A [`Store`] is a relational backend that enforces foreign keys: a
//! `delete_all` is rejected while dependent rows remain and a `create` is
//! rejected when a connected key does not resolve. Each call is its own unit
//! of work; no transaction spans calls.

mod memory;
mod postgres;

use async_trait::async_trait;

pub use memory::{MemoryStore, StoredRow};
pub use postgres::PgStore;

use crate::errors::StoreError;
use crate::models::{EntityKey, EntityKind};
use crate::request::CreateRequest;

#[async_trait]
pub trait Store: Send + Sync {
    /// Deletes every row of `kind`, returning how many were removed.
    async fn delete_all(&self, kind: EntityKind) -> Result<u64, StoreError>;

    /// Inserts one row and returns its primary key.
    async fn create(&self, request: &CreateRequest) -> Result<EntityKey, StoreError>;

    /// Counts the rows of `kind`.
    async fn count(&self, kind: EntityKind) -> Result<u64, StoreError>;

    /// Releases the underlying connections. Calling it twice is harmless.
    async fn close(&self);
}
