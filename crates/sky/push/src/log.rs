//! Logging dispatcher.

use sky_core::{Device, Mapper};

use crate::Dispatcher;

/// Dispatcher that only records sends in the log.
///
/// Used when no push provider is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogDispatcher;

impl Dispatcher for LogDispatcher {
    async fn send(&self, device: &Device, message: &dyn Mapper) -> color_eyre::eyre::Result<()> {
        tracing::info!(
            device_id = %device.id,
            device_type = %device.device_type,
            payload = %serde_json::Value::Object(message.map()),
            "push dispatched without provider"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sky_core::Notification;

    #[tokio::test]
    async fn test_log_dispatcher_accepts_any_device() {
        let device = Device {
            id: "device".into(),
            device_type: "android".into(),
            token: "token".into(),
            user_id: None,
            last_registered_at: chrono::Utc::now(),
        };

        LogDispatcher
            .send(&device, &Notification::default())
            .await
            .unwrap();
    }
}
