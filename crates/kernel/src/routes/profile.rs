//! Profile and registration routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use tracing::info;

use crate::auth::AuthUser;
use crate::error::AppResult;
use crate::forms::{BooleanMessage, ConferenceForms, ProfileForm, ProfileMiniForm};
use crate::models::{Conference, EntityKind, Profile};
use crate::state::AppState;

use super::helpers::{conference_forms, decode_key, ensure_profile, missing, stored_keys};

/// Create the profile router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/profile", get(get_profile).post(save_profile))
        .route(
            "/conference/{websafe_conference_key}",
            post(register_for_conference).delete(unregister_from_conference),
        )
        .route("/conferences/attending", get(get_conferences_to_attend))
}

/// GET /profile
async fn get_profile(State(state): State<AppState>, user: AuthUser) -> AppResult<Json<ProfileForm>> {
    let profile = ensure_profile(&state, &user).await?;
    Ok(Json(ProfileForm::from(&profile)))
}

/// POST /profile
async fn save_profile(
    State(state): State<AppState>,
    user: AuthUser,
    Json(form): Json<ProfileMiniForm>,
) -> AppResult<Json<ProfileForm>> {
    let mut profile = ensure_profile(&state, &user).await?;
    profile.apply_mini(form.display_name.as_deref(), form.tee_shirt_size);
    profile.save_details(state.db()).await?;

    info!(user_id = %user.user_id, "profile saved");
    Ok(Json(ProfileForm::from(&profile)))
}

/// Which way a registration change goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Registration {
    Register,
    Unregister,
}

/// Apply a registration change to the profile and conference in one transaction.
async fn change_registration(
    state: &AppState,
    user: &AuthUser,
    websafe_key: &str,
    change: Registration,
) -> AppResult<bool> {
    let key = decode_key(websafe_key, EntityKind::Conference)?;
    ensure_profile(state, user).await?;

    let mut tx = state.db().begin().await?;

    // Profile first, then conference: every writer locks in this order
    let mut profile = Profile::find_for_update(&mut tx, &user.user_id)
        .await?
        .ok_or_else(|| missing(EntityKind::Profile, &user.user_id))?;
    let mut conference = Conference::find_for_update(&mut tx, &key)
        .await?
        .ok_or_else(|| missing(EntityKind::Conference, websafe_key))?;

    let conference_key = conference.websafe_key();
    let changed = match change {
        Registration::Register => {
            profile.register(&mut conference, &conference_key)?;
            true
        }
        Registration::Unregister => profile.unregister(&mut conference, &conference_key),
    };

    if changed {
        profile.save_lists(&mut tx).await?;
        conference.save(&mut tx).await?;
        tx.commit().await?;
        info!(
            user_id = %user.user_id,
            conference = conference.id,
            seats_available = conference.seats_available,
            change = ?change,
            "registration changed"
        );
    }

    Ok(changed)
}

/// POST /conference/{websafe_conference_key}
async fn register_for_conference(
    State(state): State<AppState>,
    user: AuthUser,
    Path(websafe_key): Path<String>,
) -> AppResult<Json<BooleanMessage>> {
    let data = change_registration(&state, &user, &websafe_key, Registration::Register).await?;
    Ok(Json(BooleanMessage { data }))
}

/// DELETE /conference/{websafe_conference_key}
async fn unregister_from_conference(
    State(state): State<AppState>,
    user: AuthUser,
    Path(websafe_key): Path<String>,
) -> AppResult<Json<BooleanMessage>> {
    let data = change_registration(&state, &user, &websafe_key, Registration::Unregister).await?;
    Ok(Json(BooleanMessage { data }))
}

/// GET /conferences/attending
async fn get_conferences_to_attend(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ConferenceForms>> {
    let profile = ensure_profile(&state, &user).await?;
    let keys = stored_keys(&profile.conference_keys_to_attend, EntityKind::Conference);
    let conferences = Conference::list_by_keys(state.db(), &keys).await?;
    Ok(Json(conference_forms(&state, conferences).await?))
}
