//! Role set endpoints.

use axum::body::Bytes;
use axum::extract::State;
use serde::Deserialize;
use sky_core::ApiError;
use sky_push::Dispatcher;
use sky_service::RoleSet;
use sky_storage::AllStorage;

use crate::AppState;
use crate::envelope::{ApiResponse, ApiResult, decode};

/// Role request body.
#[derive(Debug, Deserialize)]
pub struct RolePayload {
    pub roles: Option<Vec<String>>,
}

impl RolePayload {
    /// An absent `roles` field is an error; an empty list is not.
    pub fn validate(self) -> Result<Vec<String>, ApiError> {
        self.roles
            .ok_or_else(|| ApiError::invalid_argument("unspecified roles in request", &["roles"]))
    }
}

/// Replace the administrative role set.
pub async fn set_admin_roles<S, D>(
    State(state): State<AppState<S, D>>,
    body: Bytes,
) -> ApiResponse<Vec<String>>
where
    S: AllStorage,
    D: Dispatcher,
{
    replace_inner(&state, RoleSet::Admin, &body)
}

/// Replace the default role set.
pub async fn set_default_roles<S, D>(
    State(state): State<AppState<S, D>>,
    body: Bytes,
) -> ApiResponse<Vec<String>>
where
    S: AllStorage,
    D: Dispatcher,
{
    replace_inner(&state, RoleSet::Default, &body)
}

fn replace_inner<S: AllStorage, D>(
    state: &AppState<S, D>,
    set: RoleSet,
    body: &[u8],
) -> ApiResponse<Vec<String>> {
    let payload: RolePayload = decode(body)?;
    let roles = payload.validate()?;

    let result = state.roles.replace(set, roles)?;
    Ok(ApiResult { result })
}
