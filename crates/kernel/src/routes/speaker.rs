//! Speaker routes.

use axum::{
    Json, Router,
    extract::{Query, State},
    routing::{get, post},
};
use tracing::info;

use crate::auth::AuthUser;
use crate::error::{AppError, AppResult};
use crate::forms::{SpeakerForm, SpeakerForms, SpeakerQueryOrganizationForm};
use crate::models::Speaker;
use crate::state::AppState;

use super::helpers::ensure_profile;

/// Create the speaker router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/speaker", post(create_speaker))
        .route("/speakers", get(get_speakers))
        .route("/getSpeakersByOrganization", get(get_speakers_by_organization))
}

/// POST /speaker
async fn create_speaker(
    State(state): State<AppState>,
    user: AuthUser,
    Json(form): Json<SpeakerForm>,
) -> AppResult<Json<SpeakerForm>> {
    let input = form.to_create()?;
    ensure_profile(&state, &user).await?;

    let speaker = Speaker::create(state.db(), &user.user_id, input).await?;
    info!(id = speaker.id, creator = %user.user_id, "speaker created");
    Ok(Json(SpeakerForm::from(&speaker)))
}

/// GET /speakers
async fn get_speakers(State(state): State<AppState>) -> AppResult<Json<SpeakerForms>> {
    let speakers = Speaker::list_all(state.db()).await?;
    Ok(Json(SpeakerForms::from(speakers)))
}

/// GET /getSpeakersByOrganization
async fn get_speakers_by_organization(
    State(state): State<AppState>,
    Query(form): Query<SpeakerQueryOrganizationForm>,
) -> AppResult<Json<SpeakerForms>> {
    let organization = form
        .organization
        .as_deref()
        .filter(|o| !o.is_empty())
        .ok_or_else(|| {
            AppError::bad_request("Speaker 'organization' query parameter required")
        })?;

    let speakers = Speaker::list_by_organization(state.db(), organization).await?;
    Ok(Json(SpeakerForms::from(speakers)))
}
