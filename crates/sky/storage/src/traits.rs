//! Storage traits.

use sky_core::{Device, UserInfo};

use crate::Result;

/// User record storage.
pub trait UserStore: Send + Sync {
    /// Insert a new user together with its role memberships.
    ///
    /// Fails with [`StoreError::UserDuplicated`](crate::StoreError::UserDuplicated)
    /// if the id, username or email is already taken.
    fn create_user(&self, user: &UserInfo) -> Result<()>;

    /// Overwrite username, email, password and auth of an existing user and
    /// replace its role memberships.
    fn update_user(&self, user: &UserInfo) -> Result<()>;

    /// Get a user by ID.
    fn get_user(&self, id: &str) -> Result<UserInfo>;

    /// Get a user by username, email, or both.
    fn get_user_by_username_email(
        &self,
        username: Option<&str>,
        email: Option<&str>,
    ) -> Result<UserInfo>;

    /// Get the user holding credentials for an external principal.
    fn get_user_by_principal_id(&self, principal_id: &str) -> Result<UserInfo>;

    /// Get all users with one of the given emails.
    fn query_users_by_emails(&self, emails: &[String]) -> Result<Vec<UserInfo>>;

    /// Delete a user and its role memberships.
    fn delete_user(&self, id: &str) -> Result<()>;
}

/// Device storage.
pub trait DeviceStore: Send + Sync {
    /// Get a device by ID.
    fn get_device(&self, id: &str) -> Result<Device>;

    /// Get all devices owned by a user, ordered by device ID.
    ///
    /// An empty set is reported as
    /// [`StoreError::UserNotFound`](crate::StoreError::UserNotFound).
    fn query_devices_by_user(&self, user_id: &str) -> Result<Vec<Device>>;

    /// Insert or replace a device.
    fn save_device(&self, device: &Device) -> Result<()>;

    /// Delete a device.
    fn delete_device(&self, id: &str) -> Result<()>;
}

/// Named role set storage.
pub trait RoleStore: Send + Sync {
    /// Replace the administrative role set.
    fn set_admin_roles(&self, roles: &[String]) -> Result<()>;

    /// Replace the set of roles assigned to new users.
    fn set_default_roles(&self, roles: &[String]) -> Result<()>;

    fn admin_roles(&self) -> Result<Vec<String>>;

    fn default_roles(&self) -> Result<Vec<String>>;
}

/// Combined storage trait.
pub trait AllStorage: UserStore + DeviceStore + RoleStore {}

impl<T> AllStorage for T where T: UserStore + DeviceStore + RoleStore {}
