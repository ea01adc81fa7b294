//! API error model.
//!
//! Errors cross the wire as `{"name", "code", "message", "info"}` objects,
//! either inside a batch result entry or wrapped in a top-level
//! `{"error": ...}` envelope.

use serde_json::{Map, Value};

/// Machine-readable error kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    BadRequest,
    InvalidArgument,
    Duplicated,
    ResourceNotFound,
    UnexpectedError,
}

impl ErrorCode {
    /// Numeric wire code.
    pub fn code(self) -> u32 {
        match self {
            ErrorCode::BadRequest => 107,
            ErrorCode::InvalidArgument => 108,
            ErrorCode::Duplicated => 109,
            ErrorCode::ResourceNotFound => 110,
            ErrorCode::UnexpectedError => 10000,
        }
    }

    /// Wire name.
    pub fn name(self) -> &'static str {
        match self {
            ErrorCode::BadRequest => "BadRequest",
            ErrorCode::InvalidArgument => "InvalidArgument",
            ErrorCode::Duplicated => "Duplicated",
            ErrorCode::ResourceNotFound => "ResourceNotFound",
            ErrorCode::UnexpectedError => "UnexpectedError",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// An error reported to API callers.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
    pub info: Option<Map<String, Value>>,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            info: None,
        }
    }

    /// A required request argument is missing or malformed.
    pub fn invalid_argument(message: impl Into<String>, arguments: &[&str]) -> Self {
        Self::new(ErrorCode::InvalidArgument, message).with_info("arguments", arguments.into())
    }

    /// A resource could not be found by `id`.
    pub fn not_found(message: impl Into<String>, id: &str) -> Self {
        Self::new(ErrorCode::ResourceNotFound, message).with_info("id", id.into())
    }

    pub fn with_info(mut self, key: impl Into<String>, value: Value) -> Self {
        self.info
            .get_or_insert_with(Map::new)
            .insert(key.into(), value);
        self
    }

    /// Serialize the error body, without the envelope.
    pub fn to_json(&self) -> Map<String, Value> {
        let mut body = Map::new();
        self.write_fields(&mut body);
        body
    }

    /// Write `name`, `code`, `message` and `info` into an existing object.
    pub fn write_fields(&self, target: &mut Map<String, Value>) {
        target.insert("name".into(), self.code.name().into());
        target.insert("code".into(), self.code.code().into());
        target.insert("message".into(), self.message.clone().into());
        if let Some(info) = &self.info {
            target.insert("info".into(), Value::Object(info.clone()));
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}): {}", self.code, self.code.code(), self.message)
    }
}

impl std::error::Error for ApiError {}

impl serde::Serialize for ApiError {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_invalid_argument_body() {
        let err = ApiError::invalid_argument("unspecified roles in request", &["roles"]);
        assert_eq!(
            serde_json::to_value(&err).unwrap(),
            json!({
                "name": "InvalidArgument",
                "code": 108,
                "message": "unspecified roles in request",
                "info": {"arguments": ["roles"]}
            })
        );
    }

    #[test]
    fn test_info_omitted_when_empty() {
        let err = ApiError::new(ErrorCode::BadRequest, "bad json");
        assert_eq!(
            serde_json::to_value(&err).unwrap(),
            json!({"name": "BadRequest", "code": 107, "message": "bad json"})
        );
    }
}
