//! Startup entry points for applications.
//!
//! Each entry point is a thin call into [`SeedRunner`] with the batch size
//! hosts use and the migration policy that fits how the scope is obtained.

use async_trait::async_trait;
use database_traits::{GetDatabaseScope, MigrationHistory};
use tokio::sync::Mutex;
use tracing::warn;

use crate::{
    MigrationPolicy, SeedOptions, SeedRegistry, SeedRunner,
    errors::{ProvidedScopeError, SeedError},
    summary::SeedSummary,
};

pub const HOSTED_AMOUNT_OF_OBJECTS: usize = 100;

fn hosted_options(policy: MigrationPolicy) -> SeedOptions {
    SeedOptions::builder()
        .policy(policy)
        .amount_of_objects(HOSTED_AMOUNT_OF_OBJECTS)
        .build()
}

/// Seeds during application startup. Refuses to run while migrations are
/// pending.
pub async fn ensure_seed_data<F>(
    factory: &F, registry: &SeedRegistry<F::Scope>,
) -> Result<SeedSummary, SeedError>
where
    F: GetDatabaseScope,
    F::Scope: MigrationHistory + 'static,
{
    SeedRunner::new(hosted_options(MigrationPolicy::Strict))
        .run(factory, registry)
        .await
}

/// A host that can hand out data scopes.
pub trait SeedHost: Send + Sync {
    type Factory: GetDatabaseScope;

    fn scope_factory(&self) -> &Self::Factory;
}

/// Migrates if needed, seeds, and gives the host back for further setup.
/// Unit failures are logged; only run-aborting errors are returned.
pub async fn ensure_host_seed_data<H>(
    host: H,
    registry: &SeedRegistry<<H::Factory as GetDatabaseScope>::Scope>,
) -> Result<H, SeedError>
where
    H: SeedHost,
    <H::Factory as GetDatabaseScope>::Scope: MigrationHistory + 'static,
{
    let summary = SeedRunner::new(hosted_options(MigrationPolicy::AutoMigrate))
        .run(host.scope_factory(), registry)
        .await?;

    if summary.failed() > 0 {
        warn!(
            "{} of {} seed units failed during host startup",
            summary.failed(),
            summary.discovered()
        );
    }

    Ok(host)
}

/// Seeds through a scope the caller already opened, migrating first if
/// needed. The scope is consumed and released by the run.
pub async fn ensure_seed_data_in_scope<C>(
    scope: C, registry: &SeedRegistry<C>,
) -> Result<SeedSummary, SeedError>
where
    C: MigrationHistory + 'static,
{
    let provided = ProvidedScope::new(scope);
    SeedRunner::new(hosted_options(MigrationPolicy::AutoMigrate))
        .run(&provided, registry)
        .await
}

/// One-shot scope factory around an already opened scope.
#[derive(Debug)]
pub struct ProvidedScope<C> {
    slot: Mutex<Option<C>>,
}

impl<C> ProvidedScope<C> {
    pub fn new(scope: C) -> Self {
        Self {
            slot: Mutex::new(Some(scope)),
        }
    }
}

#[async_trait]
impl<C: Send> GetDatabaseScope for ProvidedScope<C> {
    type Error = ProvidedScopeError;
    type Scope = C;

    async fn get_scope(&self) -> Result<C, ProvidedScopeError> {
        self.slot
            .lock()
            .await
            .take()
            .ok_or(ProvidedScopeError::AlreadyTaken)
    }
}
