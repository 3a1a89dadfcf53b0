//! Ordered execution of registered seed units against a freshly scoped
//! data context, after the migration precondition has been checked.
//!
//! Seed units are registered explicitly in a [`SeedRegistry`] and run by a
//! [`SeedRunner`]. Per-unit failures are collected into the
//! [`SeedSummary`]; only collaborator failures and a missing-migrations
//! precondition under [`MigrationPolicy::Strict`] abort a run.

pub mod errors;
pub mod hosting;
pub mod migration_state;
pub mod options;
pub mod progress;
pub mod registry;
pub mod seed_runner;
pub mod summary;

use anyhow::Result;
use async_trait::async_trait;

/// A unit of seeding logic.
///
/// `C` is the scoped data context the unit writes through. Units are
/// instantiated once per run by their registry factory.
#[async_trait]
pub trait Seed<C>: Send + Sync {
    /// Position in the run. Lower values run first; equal values keep
    /// registration order.
    fn order(&self) -> i32;

    /// Inserts or updates the unit's baseline data. `amount_of_objects` is
    /// the upper bound for units that generate a variable number of rows.
    async fn apply(&self, context: &mut C, amount_of_objects: usize)
    -> Result<()>;
}

pub use errors::{ProvidedScopeError, SeedError, SeedUnitError};
pub use hosting::{
    HOSTED_AMOUNT_OF_OBJECTS, ProvidedScope, SeedHost, ensure_host_seed_data,
    ensure_seed_data, ensure_seed_data_in_scope,
};
pub use migration_state::{MigrationState, pending_migrations};
pub use options::{DEFAULT_AMOUNT_OF_OBJECTS, MigrationPolicy, SeedOptions};
pub use progress::{ProgressEvent, ProgressTracker, ProgressUpdate};
pub use registry::SeedRegistry;
pub use seed_runner::{SeedRunner, run};
pub use summary::{SeedOutcome, SeedStatus, SeedSummary};
