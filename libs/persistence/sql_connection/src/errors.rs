use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SqlError {
    #[error("Database error: {0}")]
    Database(#[from] tokio_postgres::Error),
    #[error("Connection error: {0}")]
    Connection(#[from] deadpool_postgres::PoolError),
    #[error("Failed to build connection pool: {0}")]
    Build(#[from] deadpool_postgres::BuildError),
    #[error("Missing configuration value: {0}")]
    MissingConfig(&'static str),
    #[error("Invalid configuration value for {key}: {value}")]
    InvalidConfig { key: &'static str, value: String },
    #[error("Failed to read migrations from {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Duplicate migration name: {0}")]
    DuplicateMigration(String),
    #[error("Failed to run migration {name}: {source}")]
    Migration {
        name: String,
        #[source]
        source: tokio_postgres::Error,
    },
}
