//! Schema model and persistence contract for the project board.
//!
//! The board schema has eight tables (teams, projects, users, project teams,
//! tasks, attachments, comments and task assignments). [`EntityKind::ORDER`]
//! lists them so that every table only references tables listed before it.
//! Writers go through the [`Store`] trait; [`store::PgStore`] targets
//! PostgreSQL with the DDL in `migrations/` and [`store::MemoryStore`] keeps
//! rows in process under the same referential rules.

pub mod errors;
pub mod models;
pub mod request;
pub mod store;

pub use errors::StoreError;
pub use models::{EntityKey, EntityKind, Relation, relations};
pub use request::{Connection, CreateRequest, FieldValue, Link};
pub use store::Store;
