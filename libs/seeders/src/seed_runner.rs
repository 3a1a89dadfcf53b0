use std::{panic::AssertUnwindSafe, time::Instant};

use database_traits::{GetDatabaseScope, MigrationHistory};
use futures::FutureExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use crate::{
    MigrationPolicy, ProgressTracker, ProgressUpdate, SeedOptions,
    SeedRegistry,
    errors::{SeedError, SeedUnitError, panic_message},
    migration_state::MigrationState,
    summary::{SeedOutcome, SeedStatus, SeedSummary},
};

/// Runs every registered seed unit once, in order, against one scope.
#[derive(Debug, Clone, Default)]
pub struct SeedRunner {
    options: SeedOptions,
    progress_tracker: Option<ProgressTracker>,
    cancellation: Option<CancellationToken>,
}

/// Runs `registry` against a fresh scope from `factory` with `options`.
pub async fn run<F>(
    factory: &F, registry: &SeedRegistry<F::Scope>, options: SeedOptions,
) -> Result<SeedSummary, SeedError>
where
    F: GetDatabaseScope,
    F::Scope: MigrationHistory + 'static,
{
    SeedRunner::new(options).run(factory, registry).await
}

impl SeedRunner {
    pub fn new(options: SeedOptions) -> Self {
        Self {
            options,
            progress_tracker: None,
            cancellation: None,
        }
    }

    pub fn with_progress(mut self, progress_tracker: ProgressTracker) -> Self {
        self.progress_tracker = Some(progress_tracker);
        self
    }

    /// Cancellation is checked between units only; a unit that has started
    /// always runs to completion.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = Some(token);
        self
    }

    pub fn options(&self) -> &SeedOptions { &self.options }

    /// Acquires one scope, checks the migration precondition, then applies
    /// each unit in ascending `order`. The scope is released exactly once
    /// before this returns, whatever the outcome.
    #[instrument(
        skip_all,
        fields(
            policy = ?self.options.policy,
            amount_of_objects = self.options.amount_of_objects,
            seeds = registry.len(),
        )
    )]
    pub async fn run<F>(
        &self, factory: &F, registry: &SeedRegistry<F::Scope>,
    ) -> Result<SeedSummary, SeedError>
    where
        F: GetDatabaseScope,
        F::Scope: MigrationHistory + 'static,
    {
        let started = Instant::now();
        info!("Starting the seeding of the objects");

        let mut scope = factory
            .get_scope()
            .await
            .map_err(|e| SeedError::Scope(Box::new(e)))?;

        let result = self.run_in_scope(&mut scope, registry, started).await;

        drop(scope);
        debug!("Released seeding scope");

        if let Some(tracker) = &self.progress_tracker {
            tracker.finish();
        }

        match &result {
            Ok(summary) => info!(
                "Finished the seeding process after {:.2}s: {} discovered, \
                 {} succeeded, {} failed, {} skipped",
                summary.elapsed.as_secs_f64(),
                summary.discovered(),
                summary.succeeded(),
                summary.failed(),
                summary.skipped()
            ),
            Err(e) => error!(
                cause = ?std::error::Error::source(e).map(ToString::to_string),
                "Seeding aborted after {:.2}s: {}",
                started.elapsed().as_secs_f64(),
                e
            ),
        }

        result
    }

    async fn run_in_scope<C>(
        &self, scope: &mut C, registry: &SeedRegistry<C>, started: Instant,
    ) -> Result<SeedSummary, SeedError>
    where
        C: MigrationHistory + 'static,
    {
        let state = MigrationState::load(scope)
            .await
            .map_err(|e| SeedError::MigrationState(Box::new(e)))?;
        let pending_migrations = state.pending();

        let mut applied_migrations = Vec::new();
        if !pending_migrations.is_empty() {
            match self.options.policy {
                MigrationPolicy::Strict => {
                    warn!(
                        pending = ?pending_migrations,
                        "Refusing to seed with pending migrations"
                    );
                    return Err(SeedError::Precondition {
                        pending: pending_migrations,
                    });
                }
                MigrationPolicy::AutoMigrate => {
                    info!(
                        "Applying {} pending migrations before seeding",
                        pending_migrations.len()
                    );
                    applied_migrations = scope
                        .apply_pending_migrations()
                        .await
                        .map_err(|e| SeedError::Migrate(Box::new(e)))?;

                    let still_pending = MigrationState::load(scope)
                        .await
                        .map_err(|e| SeedError::MigrationState(Box::new(e)))?
                        .pending();
                    if !still_pending.is_empty() {
                        warn!(
                            pending = ?still_pending,
                            "Migrations still pending after applying"
                        );
                        return Err(SeedError::Precondition {
                            pending: still_pending,
                        });
                    }
                }
            }
        }

        let discovered = registry.discover();
        let total = discovered.len();
        info!("Found {} seed units", total);

        if let Some(tracker) = &self.progress_tracker {
            tracker.started(total);
        }

        let mut outcomes = Vec::with_capacity(total);
        let mut runnable = Vec::with_capacity(total);
        for seed in discovered {
            match seed.unit {
                Ok((order, unit)) => runnable.push((seed.name, order, unit)),
                Err(message) => {
                    error!(
                        seed = %seed.name,
                        "Exception discovering the seed unit: {}",
                        message
                    );
                    self.report_error(&seed.name, &message);
                    outcomes.push(SeedOutcome {
                        seed: seed.name,
                        order: None,
                        status: SeedStatus::Failed(SeedUnitError::Discovery {
                            message,
                        }),
                    });
                }
            }
        }

        // Stable: equal orders keep registration order.
        runnable.sort_by_key(|(_, order, _)| *order);

        let mut cancelled = false;
        for (name, order, unit) in runnable {
            if !cancelled && self.is_cancelled() {
                warn!("Seeding cancelled before {}", name);
                cancelled = true;
            }
            if cancelled {
                if let Some(tracker) = &self.progress_tracker {
                    tracker.skipped(name.clone());
                }
                outcomes.push(SeedOutcome {
                    seed: name,
                    order: Some(order),
                    status: SeedStatus::Skipped,
                });
                continue;
            }

            if let Some(tracker) = &self.progress_tracker {
                tracker.update(ProgressUpdate {
                    seed_name: name.clone(),
                    current: outcomes.len() + 1,
                    total,
                    message: format!("Applying {name} (order {order})"),
                });
            }

            let seed_start = Instant::now();
            debug!(seed = %name, order, "Running seed unit");

            let result = AssertUnwindSafe(
                unit.apply(scope, self.options.amount_of_objects),
            )
            .catch_unwind()
            .await;

            let status = match result {
                Ok(Ok(())) => {
                    debug!(
                        seed = %name,
                        "Seed unit completed in {:.2}s",
                        seed_start.elapsed().as_secs_f64()
                    );
                    if let Some(tracker) = &self.progress_tracker {
                        tracker.complete(name.clone());
                    }
                    SeedStatus::Succeeded
                }
                Ok(Err(e)) => self.execution_failure(&name, format!("{e:#}")),
                Err(payload) => {
                    self.execution_failure(&name, panic_message(payload.as_ref()))
                }
            };

            outcomes.push(SeedOutcome {
                seed: name,
                order: Some(order),
                status,
            });
        }

        Ok(SeedSummary {
            outcomes,
            pending_migrations,
            applied_migrations,
            cancelled,
            elapsed: started.elapsed(),
        })
    }

    fn execution_failure(&self, name: &str, message: String) -> SeedStatus {
        error!(
            seed = %name,
            "Exception seeding in the seed unit: {}",
            message
        );
        self.report_error(name, &message);
        SeedStatus::Failed(SeedUnitError::Execution { message })
    }

    fn report_error(&self, name: &str, message: &str) {
        if let Some(tracker) = &self.progress_tracker {
            tracker.error(name.to_string(), message.to_string());
        }
    }

    fn is_cancelled(&self) -> bool {
        self.cancellation
            .as_ref()
            .is_some_and(CancellationToken::is_cancelled)
    }
}
