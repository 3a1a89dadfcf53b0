use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use database_traits::{GetDatabaseConnect, GetDatabaseScope, MigrationHistory};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MemoryError {
    #[error("Memory store refused to open a scope")]
    ScopeUnavailable,
    #[error("Memory store migration history is unreadable")]
    HistoryUnavailable,
    #[error("Memory store failed to apply migration {0}")]
    MigrationFailed(String),
}

#[derive(Debug, Default)]
struct StoreState {
    known: Vec<String>,
    applied: Vec<String>,
    journal: Vec<String>,
    scopes_opened: usize,
    scopes_released: usize,
    migrate_calls: usize,
    fail_scope: bool,
    fail_history: bool,
    fail_migration: Option<String>,
    skip_migration: Option<String>,
}

/// Shared in-memory store. Clones observe the same state.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<StoreState>>,
}

impl MemoryStore {
    pub fn new() -> Self { Self::default() }

    /// A store whose catalog knows `known` and whose history records
    /// `applied`.
    pub fn with_migrations(known: &[&str], applied: &[&str]) -> Self {
        let store = Self::new();
        {
            let mut state = store.lock();
            state.known = known.iter().map(|m| m.to_string()).collect();
            state.applied = applied.iter().map(|m| m.to_string()).collect();
        }
        store
    }

    pub fn factory(&self) -> MemoryFactory {
        MemoryFactory {
            store: self.clone(),
        }
    }

    /// Opens a scope directly, bypassing the factory's failure switch.
    pub fn open_scope(&self) -> MemoryScope {
        self.lock().scopes_opened += 1;
        MemoryScope {
            store: self.clone(),
        }
    }

    pub fn fail_scopes(&self) { self.lock().fail_scope = true; }

    pub fn fail_history_reads(&self) { self.lock().fail_history = true; }

    pub fn fail_migration(&self, name: &str) {
        self.lock().fail_migration = Some(name.to_string());
    }

    /// Makes migrating report success while leaving `name` unapplied.
    pub fn skip_migration(&self, name: &str) {
        self.lock().skip_migration = Some(name.to_string());
    }

    /// Everything written through scopes, including applied migrations as
    /// `migration:<name>`, in write order.
    pub fn journal(&self) -> Vec<String> { self.lock().journal.clone() }

    pub fn applied_migrations(&self) -> Vec<String> {
        self.lock().applied.clone()
    }

    pub fn scopes_opened(&self) -> usize { self.lock().scopes_opened }

    pub fn scopes_released(&self) -> usize { self.lock().scopes_released }

    pub fn migrate_calls(&self) -> usize { self.lock().migrate_calls }

    fn lock(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[derive(Debug, Clone)]
pub struct MemoryFactory {
    store: MemoryStore,
}

#[async_trait]
impl GetDatabaseScope for MemoryFactory {
    type Error = MemoryError;
    type Scope = MemoryScope;

    async fn get_scope(&self) -> Result<MemoryScope, MemoryError> {
        if self.store.lock().fail_scope {
            return Err(MemoryError::ScopeUnavailable);
        }
        Ok(self.store.open_scope())
    }
}

/// Counts itself as released when dropped.
#[derive(Debug)]
pub struct MemoryScope {
    store: MemoryStore,
}

impl MemoryScope {
    pub fn record(&mut self, entry: impl Into<String>) {
        self.store.lock().journal.push(entry.into());
    }

    pub fn journal(&self) -> Vec<String> { self.store.journal() }
}

impl Drop for MemoryScope {
    fn drop(&mut self) { self.store.lock().scopes_released += 1; }
}

impl GetDatabaseConnect for MemoryScope {
    type Connect = MemoryStore;

    fn get_connect(&self) -> &MemoryStore { &self.store }
}

#[async_trait]
impl MigrationHistory for MemoryScope {
    type Error = MemoryError;

    fn known_migrations(&self) -> Vec<String> { self.store.lock().known.clone() }

    async fn applied_migrations(&mut self) -> Result<Vec<String>, MemoryError> {
        let state = self.store.lock();
        if state.fail_history {
            return Err(MemoryError::HistoryUnavailable);
        }
        Ok(state.applied.clone())
    }

    async fn apply_pending_migrations(
        &mut self,
    ) -> Result<Vec<String>, MemoryError> {
        let mut state = self.store.lock();
        state.migrate_calls += 1;

        let pending: Vec<String> = state
            .known
            .iter()
            .filter(|m| !state.applied.contains(m))
            .cloned()
            .collect();

        let mut newly_applied = Vec::with_capacity(pending.len());
        for name in pending {
            if state.fail_migration.as_deref() == Some(name.as_str()) {
                return Err(MemoryError::MigrationFailed(name));
            }
            if state.skip_migration.as_deref() == Some(name.as_str()) {
                continue;
            }
            state.journal.push(format!("migration:{name}"));
            state.applied.push(name.clone());
            newly_applied.push(name);
        }
        Ok(newly_applied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scopes_count_release_on_drop() {
        let store = MemoryStore::new();
        let factory = store.factory();

        let scope = factory.get_scope().await.unwrap();
        assert_eq!(store.scopes_opened(), 1);
        assert_eq!(store.scopes_released(), 0);

        drop(scope);
        assert_eq!(store.scopes_released(), 1);
    }

    #[tokio::test]
    async fn test_apply_pending_journals_migrations() {
        let store = MemoryStore::with_migrations(&["001", "002"], &["001"]);
        let mut scope = store.open_scope();

        let applied = scope.apply_pending_migrations().await.unwrap();

        assert_eq!(applied, vec!["002".to_string()]);
        assert_eq!(store.journal(), vec!["migration:002".to_string()]);
        assert_eq!(store.applied_migrations(), vec!["001", "002"]);
    }

    #[tokio::test]
    async fn test_skipped_migration_stays_pending() {
        let store = MemoryStore::with_migrations(&["001", "002"], &[]);
        store.skip_migration("001");
        let mut scope = store.open_scope();

        let applied = scope.apply_pending_migrations().await.unwrap();

        assert_eq!(applied, vec!["002".to_string()]);
        assert_eq!(store.applied_migrations(), vec!["002"]);
    }

    #[tokio::test]
    async fn test_failure_switches() {
        let store = MemoryStore::with_migrations(&["001"], &[]);
        store.fail_history_reads();
        store.fail_migration("001");

        let mut scope = store.open_scope();
        assert_eq!(
            scope.applied_migrations().await,
            Err(MemoryError::HistoryUnavailable)
        );
        assert_eq!(
            scope.apply_pending_migrations().await,
            Err(MemoryError::MigrationFailed("001".to_string()))
        );

        store.fail_scopes();
        assert_eq!(
            store.factory().get_scope().await.err(),
            Some(MemoryError::ScopeUnavailable)
        );
    }
}
