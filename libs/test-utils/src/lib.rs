//! Shared fixtures for the workspace's tests.
//!
//! [`MemoryStore`] stands in for a real database: scopes opened from it
//! record what seeds write, how many scopes were opened and released, and
//! which migrations were applied. [`TestPostgresContainer`] starts a real
//! PostgreSQL for tests that need one (requires Docker).

pub mod memory;
pub mod postgres;
pub mod test_helpers;

pub use memory::{MemoryError, MemoryFactory, MemoryScope, MemoryStore};
pub use postgres::TestPostgresContainer;
pub use test_helpers::*;
