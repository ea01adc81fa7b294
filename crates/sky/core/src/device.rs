//! Push notification endpoints.

/// Device type tag for Apple devices.
pub const DEVICE_TYPE_IOS: &str = "ios";

/// A registered push notification endpoint.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Device {
    /// Globally unique device ID.
    pub id: String,
    /// Platform tag, e.g. `"ios"`.
    #[serde(rename = "type")]
    pub device_type: String,
    /// Provider token (hex for APNs).
    pub token: String,
    /// Owning user, if any.
    pub user_id: Option<String>,
    pub last_registered_at: chrono::DateTime<chrono::Utc>,
}

impl Device {
    pub fn is_ios(&self) -> bool {
        self.device_type == DEVICE_TYPE_IOS
    }
}
