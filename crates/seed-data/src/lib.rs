//! Seeding for the project board.
//!
//! This crate wipes the board schema and reloads it from static record sets:
//! teams, projects, users, project teams, tasks, attachments, comments and
//! task assignments. Tables are emptied children first and refilled parents
//! first, so every foreign key points at a row that already exists.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use seed_data::prelude::*;
//!
//! let store = PgStore::connect(&config.database_url, config.max_connections).await?;
//! let seeder = Seeder::from_config(JsonDirSource::new(&config.data_dir), &config);
//! let report = seeder.run_to_completion(&store).await?;
//! println!("{report}");
//! ```

pub mod config;
pub mod db;
pub mod errors;
pub mod records;
pub mod sources;

pub use errors::{Phase, SeedError};

pub mod prelude {
    //! Convenient re-exports for common usage.

    pub use crate::config::SeedConfig;
    pub use crate::db::{RunPhase, SeedPlan, SeedReport, SeedRun, Seeder};
    pub use crate::errors::{Phase, SeedError};
    pub use crate::records::{Batch, RecordSet};
    pub use crate::sources::{DataSource, JsonDirSource, MemorySource};
    pub use board::store::{MemoryStore, PgStore};
    pub use board::{EntityKind, Store};
}
