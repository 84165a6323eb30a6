//! Route modules organized by bounded context.

use axum::Router;

use crate::state::AppState;

pub mod health;
pub mod user;

/// Builds the full application router.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(health::router())
        .nest("/api/v1/users", user::router())
        .with_state(state)
}
