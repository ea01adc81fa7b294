//! Push notification endpoints.

use axum::body::Bytes;
use axum::extract::State;
use serde::Deserialize;
use sky_core::{ApiError, BatchResponse, Notification};
use sky_push::Dispatcher;
use sky_service::TargetKind;
use sky_storage::AllStorage;

use crate::AppState;
use crate::envelope::{ApiResponse, ApiResult, decode};

/// Push request body.
#[derive(Debug, Deserialize)]
pub struct PushPayload {
    pub device_ids: Option<Vec<String>>,
    pub user_ids: Option<Vec<String>>,
    pub notification: Option<Notification>,
}

impl PushPayload {
    /// Extract the identifiers of `kind` and the notification.
    pub fn validate(self, kind: TargetKind) -> Result<(Vec<String>, Notification), ApiError> {
        let ids = match kind {
            TargetKind::Device => self.device_ids,
            TargetKind::User => self.user_ids,
        }
        .ok_or_else(|| {
            ApiError::invalid_argument(format!("empty {}", kind.field()), &[kind.field()])
        })?;

        let notification = self
            .notification
            .ok_or_else(|| ApiError::invalid_argument("empty notification", &["notification"]))?;

        Ok((ids, notification))
    }
}

/// Push a notification to devices by device ID.
pub async fn push_to_device<S, D>(
    State(state): State<AppState<S, D>>,
    body: Bytes,
) -> ApiResponse<BatchResponse>
where
    S: AllStorage,
    D: Dispatcher,
{
    push_inner(&state, TargetKind::Device, &body).await
}

/// Push a notification to every device of each user.
pub async fn push_to_user<S, D>(
    State(state): State<AppState<S, D>>,
    body: Bytes,
) -> ApiResponse<BatchResponse>
where
    S: AllStorage,
    D: Dispatcher,
{
    push_inner(&state, TargetKind::User, &body).await
}

async fn push_inner<S: AllStorage, D: Dispatcher>(
    state: &AppState<S, D>,
    kind: TargetKind,
    body: &[u8],
) -> ApiResponse<BatchResponse> {
    let payload: PushPayload = decode(body)?;
    let (ids, notification) = payload.validate(kind)?;

    let result = state.push.push(kind, &ids, &notification).await;
    Ok(ApiResult { result })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::testing::{TestApp, device};

    fn notification() -> serde_json::Value {
        json!({
            "aps": {"alert": "This is a message.", "sound": "sosumi.mp3"},
            "acme": "interesting"
        })
    }

    #[tokio::test]
    async fn test_push_to_single_device() {
        let app = TestApp::with_devices(vec![device("device", "token", "userid")]);

        let (status, body) = app
            .post(
                "/push/device",
                json!({"device_ids": ["device"], "notification": notification()}),
            )
            .await;

        assert_eq!(status, 200);
        assert_eq!(body, json!({"result": [{"_id": "device"}]}));

        let sent = app.dispatcher.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, device("device", "token", "userid"));
        assert_eq!(serde_json::Value::Object(sent[0].1.clone()), notification());
    }

    #[tokio::test]
    async fn test_push_to_nonexistent_device() {
        let app = TestApp::with_devices(vec![device("device", "token", "userid")]);

        let (status, body) = app
            .post(
                "/push/device",
                json!({"device_ids": ["nonexistent"], "notification": notification()}),
            )
            .await;

        assert_eq!(status, 200);
        assert_eq!(
            body,
            json!({"result": [{
                "_id": "nonexistent",
                "_type": "error",
                "message": "cannot find device \"nonexistent\"",
                "name": "ResourceNotFound",
                "code": 110,
                "info": {"id": "nonexistent"}
            }]})
        );
        assert!(app.dispatcher.sent().is_empty());
    }

    #[tokio::test]
    async fn test_push_to_single_user() {
        let app = TestApp::with_devices(vec![
            device("device1", "token1", "johndoe"),
            device("device2", "token2", "johndoe"),
            device("device3", "token3", "janedoe"),
        ]);

        let (status, body) = app
            .post(
                "/push/user",
                json!({"user_ids": ["johndoe"], "notification": notification()}),
            )
            .await;

        assert_eq!(status, 200);
        assert_eq!(body, json!({"result": [{"_id": "johndoe"}]}));

        let sent: Vec<_> = app.dispatcher.sent().into_iter().map(|(d, _)| d).collect();
        assert_eq!(
            sent,
            vec![
                device("device1", "token1", "johndoe"),
                device("device2", "token2", "johndoe"),
            ]
        );
    }

    #[tokio::test]
    async fn test_push_to_nonexistent_user() {
        let app = TestApp::with_devices(vec![device("device1", "token1", "johndoe")]);

        let (status, body) = app
            .post(
                "/push/user",
                json!({"user_ids": ["nonexistent"], "notification": notification()}),
            )
            .await;

        assert_eq!(status, 200);
        assert_eq!(
            body,
            json!({"result": [{
                "_id": "nonexistent",
                "_type": "error",
                "message": "cannot find user \"nonexistent\"",
                "name": "ResourceNotFound",
                "code": 110,
                "info": {"id": "nonexistent"}
            }]})
        );
        assert!(app.dispatcher.sent().is_empty());
    }

    #[tokio::test]
    async fn test_missing_notification_is_rejected() {
        let app = TestApp::with_devices(Vec::new());

        let (status, body) = app
            .post("/push/device", json!({"device_ids": ["device"]}))
            .await;

        assert_eq!(status, 400);
        assert_eq!(body["error"]["code"], json!(108));
        assert_eq!(body["error"]["info"]["arguments"], json!(["notification"]));
    }

    #[tokio::test]
    async fn test_wrong_target_field_is_rejected() {
        let app = TestApp::with_devices(Vec::new());

        let (status, body) = app
            .post(
                "/push/user",
                json!({"device_ids": ["device"], "notification": notification()}),
            )
            .await;

        assert_eq!(status, 400);
        assert_eq!(body["error"]["name"], json!("InvalidArgument"));
        assert_eq!(body["error"]["info"]["arguments"], json!(["user_ids"]));
    }
}
