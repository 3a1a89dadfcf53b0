use std::time::Duration;

use serde::Serialize;

use crate::errors::SeedUnitError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum SeedStatus {
    Succeeded,
    Failed(SeedUnitError),
    /// Not attempted because the run was cancelled first.
    Skipped,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeedOutcome {
    pub seed: String,
    /// `None` when the unit failed before its order could be read.
    pub order: Option<i32>,
    pub status: SeedStatus,
}

/// Result of one seeding run.
///
/// `outcomes` lists units that failed discovery first (in registration
/// order), followed by the remaining units in execution order.
#[derive(Debug, Clone, Serialize)]
pub struct SeedSummary {
    pub outcomes: Vec<SeedOutcome>,
    /// Migrations missing when the precondition was checked.
    pub pending_migrations: Vec<String>,
    /// Migrations applied by the run under the auto-migrate policy.
    pub applied_migrations: Vec<String>,
    pub cancelled: bool,
    pub elapsed: Duration,
}

impl SeedSummary {
    pub fn discovered(&self) -> usize { self.outcomes.len() }

    pub fn succeeded(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.status == SeedStatus::Succeeded)
            .count()
    }

    pub fn failed(&self) -> usize { self.failures().count() }

    pub fn skipped(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.status == SeedStatus::Skipped)
            .count()
    }

    /// Each failed unit's name with its error.
    pub fn failures(&self) -> impl Iterator<Item = (&str, &SeedUnitError)> {
        self.outcomes.iter().filter_map(|o| match &o.status {
            SeedStatus::Failed(error) => Some((o.seed.as_str(), error)),
            _ => None,
        })
    }

    /// Names of the units whose `apply` was invoked, in invocation order.
    pub fn attempted(&self) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|o| {
                matches!(
                    o.status,
                    SeedStatus::Succeeded
                        | SeedStatus::Failed(SeedUnitError::Execution { .. })
                )
            })
            .map(|o| o.seed.as_str())
            .collect()
    }

    /// True when no migration was pending at the start of the run.
    pub fn precondition_passed(&self) -> bool {
        self.pending_migrations.is_empty()
    }

    pub fn is_success(&self) -> bool {
        !self.cancelled && self.failed() == 0
    }
}
