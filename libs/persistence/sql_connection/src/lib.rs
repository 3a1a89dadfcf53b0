pub use config::{DbConnectConfig, DbOptionsConfig, PostgresDbConfig};
pub use database_traits;
pub use deadpool_postgres::{Pool, PoolError};
pub use errors::SqlError;
pub use impl_get_connect::{SqlConnect, SqlScope};
pub use migrator::{Migration, MigrationCatalog};
pub use pool::build_pool;
pub use tokio_postgres::{Client, Error as PgError};

pub mod config;
mod errors;
mod impl_get_connect;
pub mod migrator;
mod pool;
