//! APNs dispatch using the a2 crate.

use a2::NotificationBuilder as _;
use a2::request::payload::Payload;
use color_eyre::eyre::WrapErr as _;
use serde_json::{Map, Value};
use sky_core::{Device, Mapper};

use crate::Dispatcher;

/// APNs dispatcher using certificate authentication.
pub struct ApnsDispatcher {
    client: a2::Client,
    topic: String,
}

impl ApnsDispatcher {
    /// Create a new APNs dispatcher from PKCS12 certificate bytes and password.
    pub fn new(
        pkcs12_der: &[u8],
        password: &str,
        topic: impl Into<String>,
    ) -> color_eyre::eyre::Result<Self> {
        Self::with_endpoint(pkcs12_der, password, topic, a2::Endpoint::Production)
    }

    /// Create a new APNs dispatcher for the sandbox environment.
    pub fn sandbox(
        pkcs12_der: &[u8],
        password: &str,
        topic: impl Into<String>,
    ) -> color_eyre::eyre::Result<Self> {
        Self::with_endpoint(pkcs12_der, password, topic, a2::Endpoint::Sandbox)
    }

    fn with_endpoint(
        pkcs12_der: &[u8],
        password: &str,
        topic: impl Into<String>,
        endpoint: a2::Endpoint,
    ) -> color_eyre::eyre::Result<Self> {
        let mut cursor = std::io::Cursor::new(pkcs12_der);
        let config = a2::ClientConfig::new(endpoint);

        let client = a2::Client::certificate(&mut cursor, password, config)
            .wrap_err("failed to create APNs client")?;

        Ok(Self {
            client,
            topic: topic.into(),
        })
    }
}

impl Dispatcher for ApnsDispatcher {
    async fn send(&self, device: &Device, message: &dyn Mapper) -> color_eyre::eyre::Result<()> {
        if !device.is_ios() {
            tracing::warn!(
                device_id = %device.id,
                device_type = %device.device_type,
                "no push provider for device type, skipping"
            );
            return Ok(());
        }

        let rendered = message.map();
        let payload = build_payload(&rendered, &device.token, &self.topic)?;

        let response = self
            .client
            .send(payload)
            .await
            .wrap_err_with(|| format!("failed to push to device {}", device.id))?;

        tracing::debug!(
            device_id = %device.id,
            apns_id = ?response.apns_id,
            "push delivered"
        );

        Ok(())
    }
}

/// Translate a rendered notification into an APNs payload.
///
/// Known `aps` fields go through the builder; every other top-level key is
/// attached as custom data.
fn build_payload<'a>(
    rendered: &'a Map<String, Value>,
    token: &'a str,
    topic: &'a str,
) -> color_eyre::eyre::Result<Payload<'a>> {
    let aps = rendered.get("aps").and_then(Value::as_object);
    let field = |key: &str| aps.and_then(|aps| aps.get(key));

    let mut builder = a2::DefaultNotificationBuilder::new();

    match field("alert") {
        Some(Value::String(body)) => builder = builder.set_body(body),
        Some(Value::Object(alert)) => {
            if let Some(title) = alert.get("title").and_then(Value::as_str) {
                builder = builder.set_title(title);
            }
            if let Some(body) = alert.get("body").and_then(Value::as_str) {
                builder = builder.set_body(body);
            }
        }
        _ => {}
    }

    if let Some(sound) = field("sound").and_then(Value::as_str) {
        builder = builder.set_sound(sound);
    }

    if let Some(badge) = field("badge").and_then(Value::as_u64) {
        builder = builder.set_badge(u32::try_from(badge).unwrap_or(u32::MAX));
    }

    if field("content-available").and_then(Value::as_u64) == Some(1) {
        builder = builder.set_content_available();
    }

    let mut payload = builder.build(
        token,
        a2::NotificationOptions {
            apns_topic: Some(topic),
            ..Default::default()
        },
    );

    for (key, value) in rendered.iter().filter(|(key, _)| key.as_str() != "aps") {
        payload
            .add_custom_data(key, value)
            .wrap_err_with(|| format!("failed to attach custom data {key}"))?;
    }

    Ok(payload)
}
