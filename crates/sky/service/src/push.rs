//! Push notification batches.

use std::sync::Arc;

use sky_core::{ApiError, BatchResponse, Device, Notification};
use sky_push::Dispatcher;
use sky_storage::DeviceStore;

use crate::{BatchAction, TargetKind, TargetResolver, execute};

/// Sends one notification to every device behind an identifier.
pub struct PushAction<'a, S, D> {
    resolver: &'a TargetResolver<S>,
    dispatcher: &'a D,
    kind: TargetKind,
    notification: &'a Notification,
}

impl<S: DeviceStore, D: Dispatcher> BatchAction for PushAction<'_, S, D> {
    type Target = Device;

    fn resolve(&self, id: &str) -> Result<Vec<Device>, ApiError> {
        self.resolver
            .resolve(self.kind, id)
            .map_err(ApiError::from)
    }

    async fn act(&self, id: &str, device: Device) {
        // Delivery failures are logged; the batch entry reflects resolution only.
        if let Err(e) = self.dispatcher.send(&device, self.notification).await {
            tracing::warn!(
                target_id = %id,
                device_id = %device.id,
                error = %e,
                "push dispatch failed"
            );
        }
    }
}

/// Push service that resolves device or user IDs to devices.
pub struct PushService<S, D> {
    resolver: TargetResolver<S>,
    dispatcher: Arc<D>,
}

impl<S: Clone, D> Clone for PushService<S, D> {
    fn clone(&self) -> Self {
        Self {
            resolver: self.resolver.clone(),
            dispatcher: Arc::clone(&self.dispatcher),
        }
    }
}

impl<S, D> PushService<S, D>
where
    S: DeviceStore,
    D: Dispatcher,
{
    /// Create a new push service.
    pub fn new(store: S, dispatcher: Arc<D>) -> Self {
        Self {
            resolver: TargetResolver::new(store),
            dispatcher,
        }
    }

    /// Push a notification to each identifier of `kind`.
    pub async fn push(
        &self,
        kind: TargetKind,
        ids: &[String],
        notification: &Notification,
    ) -> BatchResponse {
        tracing::info!(kind = ?kind, count = ids.len(), "pushing notification");

        let action = PushAction {
            resolver: &self.resolver,
            dispatcher: self.dispatcher.as_ref(),
            kind,
            notification,
        };

        execute(&action, ids).await
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use chrono::TimeZone as _;
    use serde_json::{Map, Value, json};
    use sky_core::{BatchItem, ErrorCode, Mapper};
    use sky_storage::MemoryStorage;

    use super::*;

    #[derive(Default)]
    struct RecordingDispatcher {
        sent: Mutex<Vec<(Device, Map<String, Value>)>>,
    }

    impl RecordingDispatcher {
        fn sent(&self) -> Vec<(Device, Map<String, Value>)> {
            self.sent.lock().unwrap().clone()
        }
    }

    impl Dispatcher for RecordingDispatcher {
        async fn send(
            &self,
            device: &Device,
            message: &dyn Mapper,
        ) -> color_eyre::eyre::Result<()> {
            self.sent
                .lock()
                .unwrap()
                .push((device.clone(), message.map()));
            Ok(())
        }
    }

    struct FailingDispatcher;

    impl Dispatcher for FailingDispatcher {
        async fn send(&self, _: &Device, _: &dyn Mapper) -> color_eyre::eyre::Result<()> {
            color_eyre::eyre::bail!("provider unavailable")
        }
    }

    fn device(id: &str, token: &str, user_id: &str) -> Device {
        Device {
            id: id.into(),
            device_type: "ios".into(),
            token: token.into(),
            user_id: Some(user_id.into()),
            last_registered_at: chrono::Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap(),
        }
    }

    fn notification() -> Notification {
        serde_json::from_value(json!({
            "aps": {"alert": "This is a message.", "sound": "sosumi.mp3"},
            "acme": "interesting"
        }))
        .unwrap()
    }

    fn ids(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn service(
        devices: Vec<Device>,
    ) -> (PushService<MemoryStorage, RecordingDispatcher>, Arc<RecordingDispatcher>) {
        let dispatcher = Arc::new(RecordingDispatcher::default());
        let service = PushService::new(MemoryStorage::with_devices(devices), dispatcher.clone());
        (service, dispatcher)
    }

    #[tokio::test]
    async fn test_push_to_device() {
        let target = device("device", "token", "userid");
        let (service, dispatcher) = service(vec![target.clone()]);

        let response = service
            .push(TargetKind::Device, &ids(&["device"]), &notification())
            .await;

        assert_eq!(
            response.items(),
            &[BatchItem::Ok {
                id: "device".into()
            }]
        );
        assert_eq!(dispatcher.sent(), vec![(target, notification().map())]);
    }

    #[tokio::test]
    async fn test_push_to_missing_device() {
        let (service, dispatcher) = service(vec![device("device", "token", "userid")]);

        let response = service
            .push(TargetKind::Device, &ids(&["nonexistent"]), &notification())
            .await;

        let BatchItem::Err { id, error } = &response.items()[0] else {
            panic!("expected error entry");
        };
        assert_eq!(id, "nonexistent");
        assert_eq!(error.code, ErrorCode::ResourceNotFound);
        assert_eq!(error.message, "cannot find device \"nonexistent\"");
        assert!(dispatcher.sent().is_empty());
    }

    #[tokio::test]
    async fn test_push_to_user_fans_out() {
        let device1 = device("device1", "token1", "johndoe");
        let device2 = device("device2", "token2", "johndoe");
        let (service, dispatcher) = service(vec![
            device1.clone(),
            device2.clone(),
            device("device3", "token3", "janedoe"),
        ]);

        let response = service
            .push(TargetKind::User, &ids(&["johndoe"]), &notification())
            .await;

        assert_eq!(
            response.items(),
            &[BatchItem::Ok {
                id: "johndoe".into()
            }]
        );
        let sent: Vec<Device> = dispatcher.sent().into_iter().map(|(d, _)| d).collect();
        assert_eq!(sent, vec![device1, device2]);
    }

    #[tokio::test]
    async fn test_push_to_missing_user() {
        let (service, dispatcher) = service(vec![device("device1", "token1", "johndoe")]);

        let response = service
            .push(TargetKind::User, &ids(&["nonexistent"]), &notification())
            .await;

        assert_eq!(response.len(), 1);
        let BatchItem::Err { id, error } = &response.items()[0] else {
            panic!("expected error entry");
        };
        assert_eq!(id, "nonexistent");
        assert_eq!(error.message, "cannot find user \"nonexistent\"");
        assert!(dispatcher.sent().is_empty());
    }

    #[tokio::test]
    async fn test_mixed_batch_keeps_input_order() {
        let (service, dispatcher) = service(vec![
            device("device1", "token1", "johndoe"),
            device("device2", "token2", "johndoe"),
        ]);

        let response = service
            .push(
                TargetKind::Device,
                &ids(&["device2", "nonexistent", "device1"]),
                &notification(),
            )
            .await;

        let entries: Vec<(&str, bool)> = response
            .items()
            .iter()
            .map(|item| (item.id(), item.is_ok()))
            .collect();
        assert_eq!(
            entries,
            vec![("device2", true), ("nonexistent", false), ("device1", true)]
        );
        assert_eq!(dispatcher.sent().len(), 2);
    }

    #[tokio::test]
    async fn test_dispatch_failure_is_not_reported() {
        let service = PushService::new(
            MemoryStorage::with_devices([device("device", "token", "userid")]),
            Arc::new(FailingDispatcher),
        );

        let response = service
            .push(TargetKind::Device, &ids(&["device"]), &notification())
            .await;

        assert!(response.items()[0].is_ok());
    }
}
