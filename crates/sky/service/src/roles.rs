//! Named role set management.

use sky_core::ApiError;
use sky_storage::RoleStore;

/// A named role set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleSet {
    /// Roles granting administrative access.
    Admin,
    /// Roles assigned to newly created users.
    Default,
}

/// Replaces named role sets as a whole.
#[derive(Clone)]
pub struct RoleService<S> {
    store: S,
}

impl<S: RoleStore> RoleService<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Replace a role set, returning the roles now in effect.
    ///
    /// An empty list clears the set.
    pub fn replace(&self, set: RoleSet, roles: Vec<String>) -> Result<Vec<String>, ApiError> {
        match set {
            RoleSet::Admin => self.store.set_admin_roles(&roles)?,
            RoleSet::Default => self.store.set_default_roles(&roles)?,
        }

        tracing::info!(set = ?set, count = roles.len(), "replaced role set");
        Ok(roles)
    }
}

#[cfg(test)]
mod tests {
    use sky_storage::MemoryStorage;

    use super::*;

    fn roles(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_replace_round_trips() {
        let store = MemoryStorage::new();
        let service = RoleService::new(store.clone());

        let result = service
            .replace(RoleSet::Default, roles(&["human", "chinese"]))
            .unwrap();

        assert_eq!(result, roles(&["human", "chinese"]));
        assert_eq!(store.default_roles().unwrap(), roles(&["chinese", "human"]));
        assert!(store.admin_roles().unwrap().is_empty());
    }

    #[test]
    fn test_empty_list_clears() {
        let store = MemoryStorage::new();
        let service = RoleService::new(store.clone());

        service.replace(RoleSet::Admin, roles(&["god"])).unwrap();
        let result = service.replace(RoleSet::Admin, Vec::new()).unwrap();

        assert!(result.is_empty());
        assert!(store.admin_roles().unwrap().is_empty());
    }
}
