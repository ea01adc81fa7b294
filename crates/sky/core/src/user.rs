//! User identity records.

use std::collections::BTreeMap;

/// Credentials keyed by principal ID (e.g. `"com.facebook:1234"`).
///
/// Values are provider-specific and stored verbatim.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct AuthInfo(pub BTreeMap<String, serde_json::Value>);

impl AuthInfo {
    /// Check whether credentials exist for a principal.
    pub fn contains_principal(&self, principal_id: &str) -> bool {
        self.0.contains_key(principal_id)
    }

    /// Attach credentials for a principal.
    pub fn with_principal(
        mut self,
        principal_id: impl Into<String>,
        value: serde_json::Value,
    ) -> Self {
        self.0.insert(principal_id.into(), value);
        self
    }
}

/// A user account.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserInfo {
    /// Primary key, supplied by the caller.
    pub id: String,
    /// Unique when present.
    pub username: Option<String>,
    /// Unique when present.
    pub email: Option<String>,
    pub hashed_password: Vec<u8>,
    pub auth: AuthInfo,
    /// Role names. Order carries no meaning.
    pub roles: Vec<String>,
}

impl UserInfo {
    /// Create a user with only an ID.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_roles<I, R>(mut self, roles: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<String>,
    {
        self.roles = roles.into_iter().map(Into::into).collect();
        self
    }

    /// Username as persisted: empty strings are stored as NULL.
    pub fn stored_username(&self) -> Option<&str> {
        self.username.as_deref().filter(|s| !s.is_empty())
    }

    /// Email as persisted: empty strings are stored as NULL.
    pub fn stored_email(&self) -> Option<&str> {
        self.email.as_deref().filter(|s| !s.is_empty())
    }

    /// Role set as persisted: sorted and deduplicated.
    pub fn role_set(&self) -> Vec<String> {
        let mut roles = self.roles.clone();
        roles.sort();
        roles.dedup();
        roles
    }
}
