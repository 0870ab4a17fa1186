//! Session wishlist routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, put},
};
use tracing::info;

use crate::auth::AuthUser;
use crate::error::AppResult;
use crate::forms::{BooleanMessage, SessionForms};
use crate::models::{EntityKind, Profile, Session};
use crate::state::AppState;

use super::helpers::{decode_key, ensure_profile, load_session, missing, stored_keys};

/// Create the wishlist router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/session/{websafe_session_key}/wishlist",
            put(add_session_to_wishlist).delete(delete_session_in_wishlist),
        )
        .route("/sessions/wishlist", get(get_sessions_in_wishlist))
}

/// PUT /session/{websafe_session_key}/wishlist
async fn add_session_to_wishlist(
    State(state): State<AppState>,
    user: AuthUser,
    Path(websafe_key): Path<String>,
) -> AppResult<Json<BooleanMessage>> {
    let session = load_session(&state, &websafe_key).await?;
    ensure_profile(&state, &user).await?;

    let mut tx = state.db().begin().await?;
    let mut profile = Profile::find_for_update(&mut tx, &user.user_id)
        .await?
        .ok_or_else(|| missing(EntityKind::Profile, &user.user_id))?;

    profile.add_to_wishlist(&session.websafe_key())?;
    profile.save_lists(&mut tx).await?;
    tx.commit().await?;

    info!(user_id = %user.user_id, session = session.id, "session added to wishlist");
    Ok(Json(BooleanMessage { data: true }))
}

/// DELETE /session/{websafe_session_key}/wishlist
async fn delete_session_in_wishlist(
    State(state): State<AppState>,
    user: AuthUser,
    Path(websafe_key): Path<String>,
) -> AppResult<Json<BooleanMessage>> {
    let key = decode_key(&websafe_key, EntityKind::Session)?;
    ensure_profile(&state, &user).await?;

    let mut tx = state.db().begin().await?;
    let mut profile = Profile::find_for_update(&mut tx, &user.user_id)
        .await?
        .ok_or_else(|| missing(EntityKind::Profile, &user.user_id))?;

    let removed = profile.remove_from_wishlist(&key.to_websafe());
    if removed {
        profile.save_lists(&mut tx).await?;
        tx.commit().await?;
        info!(user_id = %user.user_id, "session removed from wishlist");
    }

    Ok(Json(BooleanMessage { data: removed }))
}

/// GET /sessions/wishlist
async fn get_sessions_in_wishlist(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<SessionForms>> {
    let profile = ensure_profile(&state, &user).await?;
    let keys = stored_keys(&profile.session_keys_in_wishlist, EntityKind::Session);
    let sessions = Session::list_by_keys(state.db(), &keys).await?;
    Ok(Json(SessionForms::from(sessions)))
}
