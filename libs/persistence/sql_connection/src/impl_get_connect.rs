use std::sync::Arc;

use async_trait::async_trait;
use database_traits::{GetDatabaseConnect, GetDatabaseScope, MigrationHistory};
use deadpool_postgres::{Object, Pool};
use tokio_postgres::Client;
use tracing::{debug, info, instrument};

use crate::{
    SqlError,
    migrator::{
        MigrationCatalog, create_migration_table, list_applied_migrations,
        quote_ident, run_migration,
    },
};

/// Hands out one pooled connection per scope, paired with the
/// application's migration catalog.
#[derive(Debug, Clone)]
pub struct SqlConnect {
    pool: Pool,
    catalog: Arc<MigrationCatalog>,
}

impl SqlConnect {
    pub fn new(pool: Pool, catalog: MigrationCatalog) -> Self {
        Self {
            pool,
            catalog: Arc::new(catalog),
        }
    }

    pub fn pool(&self) -> &Pool { &self.pool }

    pub fn catalog(&self) -> &MigrationCatalog { &self.catalog }
}

#[async_trait]
impl GetDatabaseScope for SqlConnect {
    type Error = SqlError;
    type Scope = SqlScope;

    async fn get_scope(&self) -> Result<SqlScope, SqlError> {
        let client = self.pool.get().await?;
        debug!("Checked out scoped connection");
        Ok(SqlScope {
            client,
            catalog: Arc::clone(&self.catalog),
        })
    }
}

/// A single checked-out connection. Dropping it returns the connection
/// to the pool.
pub struct SqlScope {
    client: Object,
    catalog: Arc<MigrationCatalog>,
}

impl SqlScope {
    pub fn client(&self) -> &Client { &self.client }

    /// Deletes every row of `table`, returning how many were removed.
    #[instrument(skip(self))]
    pub async fn delete_all(&self, table: &str) -> Result<u64, SqlError> {
        let statement = format!("DELETE FROM {}", quote_ident(table));
        let removed = self.client.execute(statement.as_str(), &[]).await?;
        debug!("Deleted {} rows from {}", removed, table);
        Ok(removed)
    }
}

impl GetDatabaseConnect for SqlScope {
    type Connect = Client;

    fn get_connect(&self) -> &Client { &self.client }
}

#[async_trait]
impl MigrationHistory for SqlScope {
    type Error = SqlError;

    fn known_migrations(&self) -> Vec<String> { self.catalog.names() }

    async fn applied_migrations(&mut self) -> Result<Vec<String>, SqlError> {
        list_applied_migrations(&self.client).await
    }

    #[instrument(skip_all)]
    async fn apply_pending_migrations(
        &mut self,
    ) -> Result<Vec<String>, SqlError> {
        create_migration_table(&self.client).await?;
        let applied = list_applied_migrations(&self.client).await?;
        let catalog = Arc::clone(&self.catalog);
        let client: &mut Client = &mut self.client;

        let mut newly_applied = Vec::new();
        for migration in catalog.iter() {
            if applied.contains(&migration.name) {
                debug!("Migration {} already applied, skipping", migration.name);
                continue;
            }
            run_migration(client, migration).await?;
            newly_applied.push(migration.name.clone());
        }

        info!("Applied {} pending migrations", newly_applied.len());
        Ok(newly_applied)
    }
}
