//! Sky HTTP Layer
//!
//! Axum handlers for push, role and user endpoints.

mod envelope;
mod middleware;
mod push;
mod role;
mod user;

#[cfg(test)]
mod testing;

pub use envelope::*;
pub use middleware::*;
pub use push::*;
pub use role::*;
pub use user::*;

use std::sync::Arc;

use axum::Router;
use sky_push::Dispatcher;
use sky_service::{PushService, RoleService};
use sky_storage::AllStorage;

/// Shared handler state.
pub struct AppState<S, D> {
    pub store: S,
    pub push: PushService<S, D>,
    pub roles: RoleService<S>,
}

impl<S, D> AppState<S, D>
where
    S: AllStorage + Clone,
    D: Dispatcher,
{
    /// Build the state around one store and one dispatcher.
    pub fn new(store: S, dispatcher: Arc<D>) -> Self {
        Self {
            push: PushService::new(store.clone(), dispatcher),
            roles: RoleService::new(store.clone()),
            store,
        }
    }
}

impl<S: Clone, D> Clone for AppState<S, D> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            push: self.push.clone(),
            roles: self.roles.clone(),
        }
    }
}

/// Create the API router.
pub fn api_router<S, D>(state: AppState<S, D>) -> Router
where
    S: AllStorage + Clone + 'static,
    D: Dispatcher + 'static,
{
    use axum::routing::post;

    Router::new()
        .route("/push/device", post(push::push_to_device::<S, D>))
        .route("/push/user", post(push::push_to_user::<S, D>))
        .route("/role/admin", post(role::set_admin_roles::<S, D>))
        .route("/role/default", post(role::set_default_roles::<S, D>))
        .route("/user/query", post(user::query_users::<S, D>))
        .route("/user/delete", post(user::delete_user::<S, D>))
        .layer(axum::middleware::from_fn(middleware::logging_middleware))
        .with_state(state)
}
