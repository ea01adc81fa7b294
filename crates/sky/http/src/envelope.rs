//! JSON response envelopes.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use sky_core::{ApiError, ErrorCode};

/// Successful response: `{"result": ...}`.
#[derive(Debug, Serialize)]
pub struct ApiResult<T> {
    pub result: T,
}

impl<T: Serialize> IntoResponse for ApiResult<T> {
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}

/// Failed response: `{"error": {...}}`.
#[derive(Debug)]
pub struct ApiFailure(pub ApiError);

impl From<ApiError> for ApiFailure {
    fn from(err: ApiError) -> Self {
        Self(err)
    }
}

impl From<sky_storage::StoreError> for ApiFailure {
    fn from(err: sky_storage::StoreError) -> Self {
        Self(err.into())
    }
}

impl IntoResponse for ApiFailure {
    fn into_response(self) -> Response {
        let status = match self.0.code {
            ErrorCode::BadRequest | ErrorCode::InvalidArgument => StatusCode::BAD_REQUEST,
            ErrorCode::Duplicated => StatusCode::CONFLICT,
            ErrorCode::ResourceNotFound => StatusCode::NOT_FOUND,
            ErrorCode::UnexpectedError => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(serde_json::json!({ "error": self.0 }))).into_response()
    }
}

pub type ApiResponse<T> = Result<ApiResult<T>, ApiFailure>;

/// Decode a JSON request body.
pub fn decode<T: DeserializeOwned>(body: &[u8]) -> Result<T, ApiFailure> {
    serde_json::from_slice(body).map_err(|e| {
        tracing::debug!(error = %e, "failed to decode request body");
        ApiFailure(ApiError::new(
            ErrorCode::BadRequest,
            format!("fails to decode the request payload: {e}"),
        ))
    })
}
