pub mod connection;
pub mod migration;
pub mod scope;

pub use connection::GetDatabaseConnect;
pub use migration::MigrationHistory;
pub use scope::GetDatabaseScope;

/// Type-erased collaborator error, used where callers only need to report.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;
