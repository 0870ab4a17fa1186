//! Session routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use chrono::NaiveTime;
use tracing::info;

use crate::auth::AuthUser;
use crate::error::{AppError, AppResult};
use crate::forms::{SessionForm, SessionForms, SessionQueryDurationForm};
use crate::models::{Conference, EntityKind, Session, Speaker};
use crate::state::AppState;
use crate::tasks::Task;

use super::helpers::{decode_key, enqueue_task, load_conference, load_speaker, missing};

/// Sessions starting at or after this hour are evening sessions.
const EVENING_CUTOFF_HOUR: u32 = 19;

/// Create the session router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/session", post(create_session))
        .route(
            "/conference/{websafe_conference_key}/sessions",
            get(get_conference_sessions),
        )
        .route(
            "/conference/{websafe_conference_key}/sessions/{type_of_session}",
            get(get_conference_sessions_by_type),
        )
        .route(
            "/speaker/{websafe_speaker_key}/sessions",
            get(get_sessions_by_speaker),
        )
        .route("/getSessionsByDuration", get(get_sessions_by_duration))
        .route(
            "/getNonWorkshopSessionsBefore7",
            get(get_non_workshop_sessions_before_7),
        )
}

/// POST /session
async fn create_session(
    State(state): State<AppState>,
    user: AuthUser,
    Json(form): Json<SessionForm>,
) -> AppResult<Json<SessionForm>> {
    let (conf_websafe, mut input) = form.to_create()?;

    let conference_key = decode_key(conf_websafe, EntityKind::Conference)?;
    let conference = Conference::find(state.db(), &conference_key)
        .await?
        .ok_or_else(|| missing(EntityKind::Conference, conf_websafe))?;

    if conference.organizer_user_id != user.user_id {
        return Err(AppError::forbidden(
            "Only the conference owner can add a session to a conference.",
        ));
    }

    let mut speakers = Vec::with_capacity(input.speaker_keys.len());
    for websafe in &input.speaker_keys {
        speakers.push(load_speaker(&state, websafe).await?);
    }
    input.speaker_keys = speakers.iter().map(Speaker::websafe_key).collect();

    let session = Session::create(state.db(), &conference_key, input).await?;
    info!(id = session.id, conference = conference.id, "session created");

    if let Some(speaker) = speakers.first() {
        check_featured_speaker(&state, &conference, speaker).await?;
    }

    Ok(Json(SessionForm::from(&session)))
}

/// Feature the principal speaker once they give more than one session at the conference.
async fn check_featured_speaker(
    state: &AppState,
    conference: &Conference,
    speaker: &Speaker,
) -> AppResult<()> {
    let sessions =
        Session::list_by_conference_and_speaker(state.db(), conference.id, &speaker.websafe_key())
            .await?;

    if sessions.len() > 1 {
        let session_names = sessions
            .iter()
            .map(|s| s.name.as_str())
            .collect::<Vec<_>>()
            .join(", ");

        enqueue_task(
            state,
            Task::SetFeaturedSpeaker {
                speaker_name: speaker.name.clone(),
                session_names,
            },
        )
        .await;
    }

    Ok(())
}

/// GET /conference/{websafe_conference_key}/sessions
async fn get_conference_sessions(
    State(state): State<AppState>,
    Path(websafe_key): Path<String>,
) -> AppResult<Json<SessionForms>> {
    let (_, conference) = load_conference(&state, &websafe_key).await?;
    let sessions = Session::list_by_conference(state.db(), conference.id).await?;
    Ok(Json(SessionForms::from(sessions)))
}

/// GET /conference/{websafe_conference_key}/sessions/{type_of_session}
async fn get_conference_sessions_by_type(
    State(state): State<AppState>,
    Path((websafe_key, type_of_session)): Path<(String, String)>,
) -> AppResult<Json<SessionForms>> {
    let (_, conference) = load_conference(&state, &websafe_key).await?;
    let sessions =
        Session::list_by_conference_and_type(state.db(), conference.id, &type_of_session).await?;
    Ok(Json(SessionForms::from(sessions)))
}

/// GET /speaker/{websafe_speaker_key}/sessions
async fn get_sessions_by_speaker(
    State(state): State<AppState>,
    Path(websafe_key): Path<String>,
) -> AppResult<Json<SessionForms>> {
    let speaker = load_speaker(&state, &websafe_key).await?;
    let sessions = Session::list_by_speaker(state.db(), &speaker.websafe_key()).await?;
    Ok(Json(SessionForms::from(sessions)))
}

/// GET /getSessionsByDuration
async fn get_sessions_by_duration(
    State(state): State<AppState>,
    Query(form): Query<SessionQueryDurationForm>,
) -> AppResult<Json<SessionForms>> {
    let sessions = Session::list_by_duration(state.db(), form.min(), form.max()).await?;
    Ok(Json(SessionForms::from(sessions)))
}

/// GET /getNonWorkshopSessionsBefore7
async fn get_non_workshop_sessions_before_7(
    State(state): State<AppState>,
) -> AppResult<Json<SessionForms>> {
    let cutoff = NaiveTime::from_hms_opt(EVENING_CUTOFF_HOUR, 0, 0)
        .ok_or_else(|| anyhow::anyhow!("invalid evening cutoff"))?;
    let sessions = Session::list_non_workshop_before(state.db(), cutoff).await?;
    Ok(Json(SessionForms::from(sessions)))
}
