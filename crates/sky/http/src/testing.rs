//! Router test harness.

use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::TimeZone as _;
use serde_json::{Map, Value};
use sky_core::{Device, Mapper};
use sky_push::Dispatcher;
use sky_storage::{AllStorage, MemoryStorage, SqliteStorage};
use tower::ServiceExt as _;

/// Dispatcher that records every send.
#[derive(Default)]
pub struct RecordingDispatcher {
    sent: Mutex<Vec<(Device, Map<String, Value>)>>,
}

impl RecordingDispatcher {
    pub fn sent(&self) -> Vec<(Device, Map<String, Value>)> {
        self.sent.lock().unwrap().clone()
    }
}

impl Dispatcher for RecordingDispatcher {
    async fn send(&self, device: &Device, message: &dyn Mapper) -> color_eyre::eyre::Result<()> {
        self.sent
            .lock()
            .unwrap()
            .push((device.clone(), message.map()));
        Ok(())
    }
}

pub struct TestApp<S = MemoryStorage> {
    pub store: S,
    pub dispatcher: Arc<RecordingDispatcher>,
    router: axum::Router,
}

impl TestApp {
    pub fn with_devices(devices: Vec<Device>) -> Self {
        Self::with_store(MemoryStorage::with_devices(devices))
    }
}

impl TestApp<SqliteStorage> {
    /// App backed by a migrated SQLite file inside `dir`.
    pub fn sqlite(dir: &tempfile::TempDir) -> Self {
        let path = dir.path().join("sky.db");
        let store = SqliteStorage::new(path.to_str().unwrap()).unwrap();
        store.run_migrations().unwrap();
        Self::with_store(store)
    }
}

impl<S: AllStorage + Clone + 'static> TestApp<S> {
    pub fn with_store(store: S) -> Self {
        let dispatcher = Arc::new(RecordingDispatcher::default());
        let router = crate::api_router(crate::AppState::new(store.clone(), dispatcher.clone()));

        Self {
            store,
            dispatcher,
            router,
        }
    }

    pub async fn post(&self, path: &str, body: Value) -> (StatusCode, Value) {
        self.post_raw(path, &body.to_string()).await
    }

    pub async fn post_raw(&self, path: &str, body: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        (status, serde_json::from_slice(&bytes).unwrap())
    }
}

pub fn device(id: &str, token: &str, user_id: &str) -> Device {
    Device {
        id: id.into(),
        device_type: "ios".into(),
        token: token.into(),
        user_id: Some(user_id.into()),
        last_registered_at: chrono::Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap(),
    }
}
