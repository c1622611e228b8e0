//! Database integration for seeding.
//!
//! The [`Seeder`] resets the store and reloads it batch by batch in
//! dependency order; [`SeedRun`] tracks the phase of one run.

mod run;
mod seeder;

pub use run::{RunPhase, SeedReport, SeedRun};
pub use seeder::{SeedPlan, Seeder};
