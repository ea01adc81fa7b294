//! User lookup endpoints.

use axum::body::Bytes;
use axum::extract::State;
use serde::{Deserialize, Serialize};
use sky_core::{ApiError, UserInfo};
use sky_storage::AllStorage;

use crate::AppState;
use crate::envelope::{ApiResponse, ApiResult, decode};

/// Public view of a user. Credentials are never returned.
#[derive(Debug, Serialize)]
pub struct UserView {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub roles: Vec<String>,
}

impl From<UserInfo> for UserView {
    fn from(user: UserInfo) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            roles: user.roles,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct QueryPayload {
    pub emails: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct DeletePayload {
    pub user_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DeletedUser {
    #[serde(rename = "_id")]
    pub id: String,
}

/// Find users by email.
pub async fn query_users<S, D>(
    State(state): State<AppState<S, D>>,
    body: Bytes,
) -> ApiResponse<Vec<UserView>>
where
    S: AllStorage,
{
    let payload: QueryPayload = decode(&body)?;
    let emails = payload
        .emails
        .ok_or_else(|| ApiError::invalid_argument("unspecified emails in request", &["emails"]))?;

    let users = state.store.query_users_by_emails(&emails)?;
    tracing::debug!(requested = emails.len(), found = users.len(), "queried users");

    Ok(ApiResult {
        result: users.into_iter().map(UserView::from).collect(),
    })
}

/// Delete a user by ID.
pub async fn delete_user<S, D>(
    State(state): State<AppState<S, D>>,
    body: Bytes,
) -> ApiResponse<DeletedUser>
where
    S: AllStorage,
{
    let payload: DeletePayload = decode(&body)?;
    let id = payload
        .user_id
        .filter(|id| !id.is_empty())
        .ok_or_else(|| ApiError::invalid_argument("empty user_id", &["user_id"]))?;

    state.store.delete_user(&id)?;
    Ok(ApiResult {
        result: DeletedUser { id },
    })
}
