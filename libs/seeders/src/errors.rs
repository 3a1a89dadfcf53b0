use std::any::Any;

use database_traits::BoxError;
use serde::Serialize;
use thiserror::Error;

/// Run-aborting failures. Per-unit failures are reported as
/// [`SeedUnitError`] values in the summary instead.
#[derive(Debug, Error)]
pub enum SeedError {
    #[error(
        "The migrations must be applied in order to run the seeds (pending: {})",
        .pending.join(", ")
    )]
    Precondition { pending: Vec<String> },
    #[error("Failed to open a seeding scope")]
    Scope(#[source] BoxError),
    #[error("Failed to read the migration state")]
    MigrationState(#[source] BoxError),
    #[error("Failed to apply pending migrations")]
    Migrate(#[source] BoxError),
}

impl SeedError {
    pub fn is_precondition(&self) -> bool {
        matches!(self, Self::Precondition { .. })
    }
}

/// Why a single seed unit did not complete.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
pub enum SeedUnitError {
    /// The unit could not be instantiated or its order could not be read.
    #[error("discovery failed: {message}")]
    Discovery { message: String },
    /// The unit's `apply` returned an error or panicked.
    #[error("execution failed: {message}")]
    Execution { message: String },
}

impl SeedUnitError {
    pub fn message(&self) -> &str {
        match self {
            Self::Discovery { message } | Self::Execution { message } => {
                message
            }
        }
    }
}

#[derive(Debug, Error)]
pub enum ProvidedScopeError {
    #[error("The provided scope was already used by a seeding run")]
    AlreadyTaken,
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("panicked: {message}")
    }
    else if let Some(message) = payload.downcast_ref::<String>() {
        format!("panicked: {message}")
    }
    else {
        "panicked".to_string()
    }
}
