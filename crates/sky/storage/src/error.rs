//! Storage errors.

use sky_core::{ApiError, ErrorCode};

pub type Result<T, E = StoreError> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("cannot find user {0:?}")]
    UserNotFound(String),

    #[error("cannot find device {0:?}")]
    DeviceNotFound(String),

    #[error("user with the same id, username or email already exists")]
    UserDuplicated,

    #[error("failed to update user roles")]
    RoleSyncFailed(#[source] diesel::result::Error),

    #[error("invalid auth data for user {id:?}")]
    InvalidAuth {
        id: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("migration failed")]
    Migration(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("database error")]
    Database(#[from] diesel::result::Error),

    #[error("failed to get database connection")]
    Pool(#[from] diesel::r2d2::PoolError),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            StoreError::UserNotFound(_) | StoreError::DeviceNotFound(_)
        )
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match &err {
            StoreError::UserNotFound(id) | StoreError::DeviceNotFound(id) => {
                ApiError::not_found(err.to_string(), id)
            }
            StoreError::UserDuplicated => ApiError::new(ErrorCode::Duplicated, err.to_string()),
            _ => {
                tracing::error!(error = ?err, "storage failure");
                ApiError::new(ErrorCode::UnexpectedError, err.to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_maps_to_resource_not_found() {
        let err: ApiError = StoreError::DeviceNotFound("nonexistent".into()).into();
        assert_eq!(err.code, ErrorCode::ResourceNotFound);
        assert_eq!(err.message, "cannot find device \"nonexistent\"");
        assert_eq!(
            err.info.as_ref().and_then(|info| info.get("id")),
            Some(&serde_json::json!("nonexistent"))
        );
    }

    #[test]
    fn test_duplicate_maps_to_duplicated() {
        let err: ApiError = StoreError::UserDuplicated.into();
        assert_eq!(err.code, ErrorCode::Duplicated);
    }
}
