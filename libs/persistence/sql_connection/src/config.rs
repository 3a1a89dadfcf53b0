use std::env;

use serde::Deserialize;

use crate::SqlError;

pub trait DbConnectConfig {
    fn uri(&self) -> &str;
}

/// Configure database connection pool data
pub trait DbOptionsConfig {
    fn max_conn(&self) -> Option<u32> { None }
    fn wait_timeout_ms(&self) -> Option<u64> { None }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PostgresDbConfig {
    pub uri: String,
    pub max_conn: Option<u32>,
    pub wait_timeout_ms: Option<u64>,
}

impl PostgresDbConfig {
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            max_conn: None,
            wait_timeout_ms: None,
        }
    }

    /// Reads `DATABASE_URL`, `DATABASE_MAX_CONN` and
    /// `DATABASE_WAIT_TIMEOUT_MS`, loading a `.env` file first if present.
    pub fn from_env() -> Result<Self, SqlError> {
        dotenvy::dotenv().ok();

        let uri = env::var("DATABASE_URL")
            .map_err(|_| SqlError::MissingConfig("DATABASE_URL"))?;

        Ok(Self {
            uri,
            max_conn: parse_optional("DATABASE_MAX_CONN")?,
            wait_timeout_ms: parse_optional("DATABASE_WAIT_TIMEOUT_MS")?,
        })
    }
}

fn parse_optional<T: std::str::FromStr>(
    key: &'static str,
) -> Result<Option<T>, SqlError> {
    match env::var(key) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| SqlError::InvalidConfig { key, value }),
        Err(_) => Ok(None),
    }
}

impl DbConnectConfig for PostgresDbConfig {
    fn uri(&self) -> &str { &self.uri }
}

impl DbOptionsConfig for PostgresDbConfig {
    fn max_conn(&self) -> Option<u32> { self.max_conn }

    fn wait_timeout_ms(&self) -> Option<u64> { self.wait_timeout_ms }
}
