use std::error::Error as StdError;

use async_trait::async_trait;

/// Migration bookkeeping exposed by a data context.
///
/// `known_migrations` is the catalog compiled into (or shipped with) the
/// application, in the order it would be applied. `applied_migrations`
/// reflects what the store has recorded at call time.
#[async_trait]
pub trait MigrationHistory: Send {
    type Error: StdError + Send + Sync + 'static;

    fn known_migrations(&self) -> Vec<String>;

    async fn applied_migrations(&mut self) -> Result<Vec<String>, Self::Error>;

    /// Applies every known migration not yet recorded, returning the ids
    /// it applied in order.
    async fn apply_pending_migrations(
        &mut self,
    ) -> Result<Vec<String>, Self::Error>;
}
