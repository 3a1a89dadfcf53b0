//! Migration catalog and the `_migrations` history table.
//!
//! The catalog is the application's list of known migrations, in apply
//! order. The history table records which of them the store has applied.

use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
};

use tokio_postgres::Client;
use tracing::{debug, info, instrument};
use walkdir::WalkDir;

use crate::SqlError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Migration {
    pub name: String,
    pub sql: String,
}

#[derive(Debug, Clone, Default)]
pub struct MigrationCatalog {
    migrations: Vec<Migration>,
}

impl MigrationCatalog {
    pub fn new() -> Self { Self::default() }

    /// Appends a migration, typically embedded with `include_str!`.
    /// A later migration with an existing name replaces the earlier one.
    pub fn add(mut self, name: impl Into<String>, sql: impl Into<String>) -> Self {
        let migration = Migration {
            name: name.into(),
            sql: sql.into(),
        };
        match self.migrations.iter_mut().find(|m| m.name == migration.name) {
            Some(existing) => *existing = migration,
            None => self.migrations.push(migration),
        }
        self
    }

    /// Loads every `*.sql` file below `dir`, ordered by path. The file
    /// stem is the migration name. Files ending in `.down.sql` are ignored.
    pub fn from_dir(dir: impl AsRef<Path>) -> Result<Self, SqlError> {
        let dir = dir.as_ref();

        let mut files: Vec<PathBuf> = WalkDir::new(dir)
            .follow_links(true)
            .into_iter()
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| SqlError::Io {
                path: dir.to_path_buf(),
                source: e.into(),
            })?
            .into_iter()
            .filter(|e| e.file_type().is_file())
            .map(|e| e.into_path())
            .filter(|p| is_up_migration(p))
            .collect();

        files.sort();

        let mut seen = HashSet::new();
        let mut migrations = Vec::with_capacity(files.len());
        for path in files {
            let name = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            if !seen.insert(name.clone()) {
                return Err(SqlError::DuplicateMigration(name));
            }
            let sql = fs::read_to_string(&path)
                .map_err(|source| SqlError::Io { path, source })?;
            migrations.push(Migration { name, sql });
        }

        debug!("Loaded {} migrations from {}", migrations.len(), dir.display());
        Ok(Self { migrations })
    }

    pub fn names(&self) -> Vec<String> {
        self.migrations.iter().map(|m| m.name.clone()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Migration> {
        self.migrations.iter()
    }

    pub fn len(&self) -> usize { self.migrations.len() }

    pub fn is_empty(&self) -> bool { self.migrations.is_empty() }
}

fn is_up_migration(path: &Path) -> bool {
    let Some(file_name) = path.file_name().and_then(|n| n.to_str())
    else {
        return false;
    };
    file_name.ends_with(".sql") && !file_name.ends_with(".down.sql")
}

pub(crate) async fn create_migration_table(
    client: &Client,
) -> Result<(), SqlError> {
    client
        .batch_execute(
            r#"
            CREATE TABLE IF NOT EXISTS _migrations (
                id SERIAL PRIMARY KEY,
                name VARCHAR(255) NOT NULL UNIQUE,
                applied_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            )
            "#,
        )
        .await?;
    Ok(())
}

/// Read-only: a missing history table means nothing has been applied.
pub(crate) async fn list_applied_migrations(
    client: &Client,
) -> Result<Vec<String>, SqlError> {
    let exists: bool = client
        .query_one("SELECT to_regclass('_migrations') IS NOT NULL", &[])
        .await?
        .get(0);
    if !exists {
        debug!("No _migrations table yet");
        return Ok(Vec::new());
    }

    let rows = client
        .query("SELECT name FROM _migrations ORDER BY applied_at, id", &[])
        .await?;

    Ok(rows.iter().map(|row| row.get::<_, String>(0)).collect())
}

/// Runs one migration and records it, inside a single transaction.
#[instrument(skip_all, fields(migration = %migration.name))]
pub(crate) async fn run_migration(
    client: &mut Client, migration: &Migration,
) -> Result<(), SqlError> {
    info!("Running migration: {}", migration.name);

    let tx = client.transaction().await?;

    tx.batch_execute(&migration.sql).await.map_err(|source| {
        SqlError::Migration {
            name: migration.name.clone(),
            source,
        }
    })?;

    tx.execute(
        "INSERT INTO _migrations (name, applied_at) VALUES ($1, NOW())",
        &[&migration.name],
    )
    .await?;

    tx.commit().await?;
    info!("Migration {} completed successfully", migration.name);
    Ok(())
}

/// Quotes a possibly schema-qualified identifier for interpolation.
pub(crate) fn quote_ident(ident: &str) -> String {
    ident
        .split('.')
        .map(|part| format!("\"{}\"", part.replace('"', "\"\"")))
        .collect::<Vec<_>>()
        .join(".")
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn test_add_keeps_insertion_order() {
        let catalog = MigrationCatalog::new()
            .add("002_create_users", "CREATE TABLE users (id INT);")
            .add("001_create_roles", "CREATE TABLE roles (id INT);");

        assert_eq!(catalog.names(), vec!["002_create_users", "001_create_roles"]);
        assert_eq!(catalog.len(), 2);
    }

    #[test]
    fn test_add_replaces_same_name() {
        let catalog = MigrationCatalog::new()
            .add("001_init", "SELECT 1;")
            .add("001_init", "SELECT 2;");

        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.iter().next().unwrap().sql, "SELECT 2;");
    }

    #[test]
    fn test_from_dir_sorts_and_skips_down_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("events")).unwrap();
        fs::write(dir.path().join("002_b.sql"), "SELECT 2;").unwrap();
        fs::write(dir.path().join("001_a.sql"), "SELECT 1;").unwrap();
        fs::write(dir.path().join("001_a.down.sql"), "SELECT 0;").unwrap();
        fs::write(dir.path().join("README.md"), "notes").unwrap();
        fs::write(dir.path().join("events/003_c.sql"), "SELECT 3;").unwrap();

        let catalog = MigrationCatalog::from_dir(dir.path()).unwrap();

        assert_eq!(catalog.names(), vec!["001_a", "002_b", "003_c"]);
    }

    #[test]
    fn test_from_dir_rejects_duplicate_names() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("a")).unwrap();
        fs::create_dir(dir.path().join("b")).unwrap();
        fs::write(dir.path().join("a/001_init.sql"), "SELECT 1;").unwrap();
        fs::write(dir.path().join("b/001_init.sql"), "SELECT 1;").unwrap();

        let error = MigrationCatalog::from_dir(dir.path()).unwrap_err();

        assert!(matches!(error, SqlError::DuplicateMigration(name) if name == "001_init"));
    }

    #[test]
    fn test_from_missing_dir_is_io_error() {
        let dir = tempfile::tempdir().unwrap();

        let error =
            MigrationCatalog::from_dir(dir.path().join("missing")).unwrap_err();

        assert!(matches!(error, SqlError::Io { .. }));
    }

    #[test]
    fn test_quote_ident() {
        assert_eq!(quote_ident("users"), "\"users\"");
        assert_eq!(quote_ident("public.users"), "\"public\".\"users\"");
        assert_eq!(quote_ident("we\"ird"), "\"we\"\"ird\"");
    }
}
