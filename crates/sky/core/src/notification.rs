//! Notification payloads.

use serde_json::{Map, Value};

/// A message that renders itself to a key-value structure.
///
/// Dispatchers translate the rendered map into a provider envelope.
pub trait Mapper: Send + Sync {
    fn map(&self) -> Map<String, Value>;
}

/// A notification forwarded verbatim from the request body.
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct Notification(pub Map<String, Value>);

impl Mapper for Notification {
    fn map(&self) -> Map<String, Value> {
        self.0.clone()
    }
}
