//! In-memory storage.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use sky_core::{Device, UserInfo};

use crate::traits::*;
use crate::{Result, StoreError};

#[derive(Default)]
struct State {
    users: BTreeMap<String, UserInfo>,
    devices: BTreeMap<String, Device>,
    admin_roles: Vec<String>,
    default_roles: Vec<String>,
}

impl State {
    /// Whether another user already holds the username or email of `user`.
    fn conflicts(&self, user: &UserInfo) -> bool {
        self.users.values().filter(|other| other.id != user.id).any(|other| {
            let same_username = user.stored_username().is_some()
                && other.stored_username() == user.stored_username();
            let same_email =
                user.stored_email().is_some() && other.stored_email() == user.stored_email();
            same_username || same_email
        })
    }
}

/// Stored form of a user: empty identifiers dropped, roles as a set.
fn normalize(user: &UserInfo) -> UserInfo {
    UserInfo {
        id: user.id.clone(),
        username: user.stored_username().map(str::to_string),
        email: user.stored_email().map(str::to_string),
        hashed_password: user.hashed_password.clone(),
        auth: user.auth.clone(),
        roles: user.role_set(),
    }
}

/// Storage held in process memory.
///
/// Clones share the same state. Role sets keep the order they were given.
#[derive(Clone, Default)]
pub struct MemoryStorage {
    state: Arc<Mutex<State>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a storage pre-populated with devices.
    pub fn with_devices(devices: impl IntoIterator<Item = Device>) -> Self {
        let storage = Self::new();
        {
            let mut state = storage.state();
            for device in devices {
                state.devices.insert(device.id.clone(), device);
            }
        }
        storage
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

impl UserStore for MemoryStorage {
    fn create_user(&self, user: &UserInfo) -> Result<()> {
        let mut state = self.state();

        if state.users.contains_key(&user.id) || state.conflicts(user) {
            return Err(StoreError::UserDuplicated);
        }

        state.users.insert(user.id.clone(), normalize(user));
        Ok(())
    }

    fn update_user(&self, user: &UserInfo) -> Result<()> {
        let mut state = self.state();

        if !state.users.contains_key(&user.id) {
            return Err(StoreError::UserNotFound(user.id.clone()));
        }
        if state.conflicts(user) {
            return Err(StoreError::UserDuplicated);
        }

        state.users.insert(user.id.clone(), normalize(user));
        Ok(())
    }

    fn get_user(&self, id: &str) -> Result<UserInfo> {
        self.state()
            .users
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::UserNotFound(id.to_string()))
    }

    fn get_user_by_username_email(
        &self,
        username: Option<&str>,
        email: Option<&str>,
    ) -> Result<UserInfo> {
        let username = username.filter(|s| !s.is_empty());
        let email = email.filter(|s| !s.is_empty());
        let key = username.or(email).unwrap_or_default();

        if username.is_none() && email.is_none() {
            return Err(StoreError::UserNotFound(String::new()));
        }

        self.state()
            .users
            .values()
            .find(|user| {
                username.is_none_or(|u| user.stored_username() == Some(u))
                    && email.is_none_or(|e| user.stored_email() == Some(e))
            })
            .cloned()
            .ok_or_else(|| StoreError::UserNotFound(key.to_string()))
    }

    fn get_user_by_principal_id(&self, principal_id: &str) -> Result<UserInfo> {
        self.state()
            .users
            .values()
            .find(|user| user.auth.contains_principal(principal_id))
            .cloned()
            .ok_or_else(|| StoreError::UserNotFound(principal_id.to_string()))
    }

    fn query_users_by_emails(&self, emails: &[String]) -> Result<Vec<UserInfo>> {
        Ok(self
            .state()
            .users
            .values()
            .filter(|user| {
                user.stored_email()
                    .is_some_and(|email| emails.iter().any(|e| e == email))
            })
            .cloned()
            .collect())
    }

    fn delete_user(&self, id: &str) -> Result<()> {
        self.state()
            .users
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| StoreError::UserNotFound(id.to_string()))
    }
}

impl DeviceStore for MemoryStorage {
    fn get_device(&self, id: &str) -> Result<Device> {
        self.state()
            .devices
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::DeviceNotFound(id.to_string()))
    }

    fn query_devices_by_user(&self, user_id: &str) -> Result<Vec<Device>> {
        let devices: Vec<Device> = self
            .state()
            .devices
            .values()
            .filter(|device| device.user_id.as_deref() == Some(user_id))
            .cloned()
            .collect();

        if devices.is_empty() {
            return Err(StoreError::UserNotFound(user_id.to_string()));
        }

        Ok(devices)
    }

    fn save_device(&self, device: &Device) -> Result<()> {
        self.state()
            .devices
            .insert(device.id.clone(), device.clone());
        Ok(())
    }

    fn delete_device(&self, id: &str) -> Result<()> {
        self.state()
            .devices
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| StoreError::DeviceNotFound(id.to_string()))
    }
}

/// Role sets are stored sorted and deduplicated.
fn role_set(roles: &[String]) -> Vec<String> {
    let mut roles = roles.to_vec();
    roles.sort();
    roles.dedup();
    roles
}

impl RoleStore for MemoryStorage {
    fn set_admin_roles(&self, roles: &[String]) -> Result<()> {
        self.state().admin_roles = role_set(roles);
        Ok(())
    }

    fn set_default_roles(&self, roles: &[String]) -> Result<()> {
        self.state().default_roles = role_set(roles);
        Ok(())
    }

    fn admin_roles(&self) -> Result<Vec<String>> {
        Ok(self.state().admin_roles.clone())
    }

    fn default_roles(&self) -> Result<Vec<String>> {
        Ok(self.state().default_roles.clone())
    }
}
