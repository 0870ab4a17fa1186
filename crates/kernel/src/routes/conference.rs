//! Conference routes: create, update, read and query.

use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use tracing::info;

use crate::auth::AuthUser;
use crate::error::{AppError, AppResult};
use crate::forms::{ConferenceForm, ConferenceForms, ConferenceQueryForms};
use crate::models::{Conference, EntityKind, Profile};
use crate::query::{FilterDescriptor, compile};
use crate::state::AppState;
use crate::tasks::Task;

use super::helpers::{
    conference_forms, decode_key, enqueue_task, ensure_profile, load_conference, missing,
};

/// Create the conference router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/conference", post(create_conference))
        .route(
            "/conference/{websafe_conference_key}",
            get(get_conference).put(update_conference),
        )
        .route("/getConferencesCreated", post(get_conferences_created))
        .route("/queryConferences", post(query_conferences))
        .route("/filterPlayground", get(filter_playground))
}

/// POST /conference
async fn create_conference(
    State(state): State<AppState>,
    user: AuthUser,
    Json(form): Json<ConferenceForm>,
) -> AppResult<Json<ConferenceForm>> {
    let input = form.to_create()?;
    let profile = ensure_profile(&state, &user).await?;

    let conference = Conference::create(state.db(), &user.user_id, input).await?;
    let stored = ConferenceForm::from_conference(&conference, profile.display_name.as_deref());

    enqueue_task(
        &state,
        Task::SendConfirmationEmail {
            email: user.email.clone(),
            conference_info: stored.summary(),
        },
    )
    .await;

    info!(id = conference.id, organizer = %user.user_id, "conference created");
    Ok(Json(stored))
}

/// PUT /conference/{websafe_conference_key}
async fn update_conference(
    State(state): State<AppState>,
    user: AuthUser,
    Path(websafe_key): Path<String>,
    Json(form): Json<ConferenceForm>,
) -> AppResult<Json<ConferenceForm>> {
    let key = decode_key(&websafe_key, EntityKind::Conference)?;
    let update = form.to_update()?;

    let mut tx = state.db().begin().await?;
    let mut conference = Conference::find_for_update(&mut tx, &key)
        .await?
        .ok_or_else(|| missing(EntityKind::Conference, &websafe_key))?;

    if conference.organizer_user_id != user.user_id {
        return Err(AppError::forbidden(
            "Only the owner can update the conference.",
        ));
    }

    conference.apply_update(update);
    conference.save(&mut tx).await?;
    tx.commit().await?;

    info!(id = conference.id, "conference updated");

    let organizer = Profile::find(state.db(), &conference.organizer_user_id).await?;
    let display_name = organizer.as_ref().and_then(|p| p.display_name.as_deref());
    Ok(Json(ConferenceForm::from_conference(&conference, display_name)))
}

/// GET /conference/{websafe_conference_key}
async fn get_conference(
    State(state): State<AppState>,
    Path(websafe_key): Path<String>,
) -> AppResult<Json<ConferenceForm>> {
    let (_, conference) = load_conference(&state, &websafe_key).await?;

    let organizer = Profile::find(state.db(), &conference.organizer_user_id).await?;
    let display_name = organizer.as_ref().and_then(|p| p.display_name.as_deref());
    Ok(Json(ConferenceForm::from_conference(&conference, display_name)))
}

/// POST /getConferencesCreated
async fn get_conferences_created(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ConferenceForms>> {
    let profile = ensure_profile(&state, &user).await?;
    let conferences = Conference::list_by_organizer(state.db(), &user.user_id).await?;

    let items = conferences
        .iter()
        .map(|c| ConferenceForm::from_conference(c, profile.display_name.as_deref()))
        .collect();
    Ok(Json(ConferenceForms { items }))
}

/// POST /queryConferences
async fn query_conferences(
    State(state): State<AppState>,
    Json(forms): Json<ConferenceQueryForms>,
) -> AppResult<Json<ConferenceForms>> {
    let compiled = compile(&forms.filters)?;
    let conferences = Conference::query(state.db(), &compiled).await?;
    Ok(Json(conference_forms(&state, conferences).await?))
}

/// Filters run by `filterPlayground`.
fn playground_filters() -> Vec<FilterDescriptor> {
    vec![
        FilterDescriptor::new("CITY", "EQ", "London"),
        FilterDescriptor::new("TOPIC", "EQ", "Medical Innovations"),
        FilterDescriptor::new("MONTH", "EQ", "6"),
    ]
}

/// GET /filterPlayground
async fn filter_playground(State(state): State<AppState>) -> AppResult<Json<ConferenceForms>> {
    let compiled = compile(&playground_filters())?;
    let conferences = Conference::query(state.db(), &compiled).await?;
    Ok(Json(conference_forms(&state, conferences).await?))
}
