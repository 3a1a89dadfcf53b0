use std::collections::HashSet;

use database_traits::MigrationHistory;
use serde::Serialize;

/// Snapshot of known versus applied migrations, taken at load time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationState {
    known: Vec<String>,
    applied: Vec<String>,
}

impl MigrationState {
    pub fn new(known: Vec<String>, applied: Vec<String>) -> Self {
        Self { known, applied }
    }

    pub async fn load<H>(history: &mut H) -> Result<Self, H::Error>
    where
        H: MigrationHistory,
    {
        let known = history.known_migrations();
        let applied = history.applied_migrations().await?;
        Ok(Self { known, applied })
    }

    pub fn known(&self) -> &[String] { &self.known }

    pub fn applied(&self) -> &[String] { &self.applied }

    pub fn pending(&self) -> Vec<String> {
        pending_migrations(&self.known, &self.applied)
    }

    pub fn all_migrations_applied(&self) -> bool { self.pending().is_empty() }
}

/// Known migrations that are not recorded as applied, in catalog order.
/// Applied ids the catalog does not know about are ignored.
pub fn pending_migrations(known: &[String], applied: &[String]) -> Vec<String> {
    let applied: HashSet<&str> = applied.iter().map(String::as_str).collect();
    known
        .iter()
        .filter(|id| !applied.contains(id.as_str()))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn test_all_applied() {
        let state = MigrationState::new(
            ids(&["001_init", "002_users"]),
            ids(&["002_users", "001_init"]),
        );

        assert!(state.all_migrations_applied());
        assert!(state.pending().is_empty());
    }

    #[test]
    fn test_pending_keeps_catalog_order() {
        let state = MigrationState::new(
            ids(&["001_init", "002_users", "003_roles"]),
            ids(&["002_users"]),
        );

        assert!(!state.all_migrations_applied());
        assert_eq!(state.pending(), ids(&["001_init", "003_roles"]));
    }

    #[test]
    fn test_unknown_applied_migrations_do_not_fail() {
        let state = MigrationState::new(
            ids(&["001_init"]),
            ids(&["001_init", "999_hotfix_from_another_branch"]),
        );

        assert!(state.all_migrations_applied());
    }

    #[test]
    fn test_empty_catalog_is_complete() {
        assert!(MigrationState::new(vec![], vec![]).all_migrations_applied());
        assert!(pending_migrations(&[], &ids(&["001_init"])).is_empty());
    }
}
