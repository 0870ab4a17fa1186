//! Bearer token authentication middleware.
//!
//! Checks `Authorization: Bearer <token>` headers, verifies the JWT and sets
//! the [`AuthUser`](super::AuthUser) in request extensions.

use axum::{
    Json,
    body::Body,
    extract::State,
    http::{Request, StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::debug;

use crate::state::AppState;

/// Middleware to authenticate Bearer JWT tokens.
///
/// If a valid Bearer token is present, sets the caller in request
/// extensions. If no token is present, passes through without modification
/// and handlers that need a user answer 401. An invalid token is a 401 here.
pub async fn authenticate_bearer_token(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let auth_header = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    let Some(auth_header) = auth_header else {
        return next.run(request).await;
    };

    let Some(token) = auth_header.strip_prefix("Bearer ") else {
        return next.run(request).await;
    };

    let user = match state.auth().verify(token.trim()) {
        Ok(user) => user,
        Err(e) => {
            debug!(error = %e, "invalid bearer token");
            return (
                StatusCode::UNAUTHORIZED,
                [(header::WWW_AUTHENTICATE, "Bearer error=\"invalid_token\"")],
                Json(json!({ "error": "Invalid token" })),
            )
                .into_response();
        }
    };

    debug!(user_id = %user.user_id, "bearer token accepted");
    request.extensions_mut().insert(user);

    next.run(request).await
}
