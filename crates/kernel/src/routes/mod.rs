//! HTTP route handlers.

pub mod announcement;
pub mod conference;
pub mod cron;
pub mod health;
mod helpers;
pub mod profile;
pub mod session;
pub mod speaker;
pub mod wishlist;

use axum::Router;

use crate::auth::authenticate_bearer_token;
use crate::state::AppState;

/// Prefix of the conference API.
pub const API_PREFIX: &str = "/api/conference/v1";

/// Routes of the conference API, relative to [`API_PREFIX`].
fn api_router() -> Router<AppState> {
    Router::new()
        .merge(conference::router())
        .merge(profile::router())
        .merge(session::router())
        .merge(speaker::router())
        .merge(wishlist::router())
        .merge(announcement::router())
}

/// The full application router with bearer authentication applied.
///
/// Transport layers (CORS, tracing) are added by the binary.
pub fn app_router(state: AppState) -> Router {
    Router::new()
        .nest(API_PREFIX, api_router())
        .merge(health::router())
        .merge(cron::router())
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            authenticate_bearer_token,
        ))
        .with_state(state)
}
