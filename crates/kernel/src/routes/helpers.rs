//! Shared route helpers: key resolution, profiles and display names.

use std::collections::HashSet;

use tracing::warn;

use crate::auth::AuthUser;
use crate::error::{AppError, AppResult};
use crate::forms::{ConferenceForm, ConferenceForms};
use crate::models::{Conference, EntityKey, EntityKind, Profile, Session, Speaker};
use crate::state::AppState;
use crate::tasks::{self, Task};

/// Decode a websafe key of the expected kind, or 400.
pub fn decode_key(websafe: &str, kind: EntityKind) -> AppResult<EntityKey> {
    EntityKey::from_websafe(websafe, kind).map_err(|e| AppError::bad_request(e.to_string()))
}

/// 404 for a well-formed key that addresses nothing.
pub fn missing(kind: EntityKind, websafe: &str) -> AppError {
    AppError::not_found(format!("No {} found with websafe key: {websafe}", kind.label()))
}

/// Resolve a conference websafe key.
pub async fn load_conference(state: &AppState, websafe: &str) -> AppResult<(EntityKey, Conference)> {
    let key = decode_key(websafe, EntityKind::Conference)?;
    let conference = Conference::find(state.db(), &key)
        .await?
        .ok_or_else(|| missing(EntityKind::Conference, websafe))?;
    Ok((key, conference))
}

/// Resolve a session websafe key.
pub async fn load_session(state: &AppState, websafe: &str) -> AppResult<Session> {
    let key = decode_key(websafe, EntityKind::Session)?;
    Session::find(state.db(), &key)
        .await?
        .ok_or_else(|| missing(EntityKind::Session, websafe))
}

/// Resolve a speaker websafe key.
pub async fn load_speaker(state: &AppState, websafe: &str) -> AppResult<Speaker> {
    let key = decode_key(websafe, EntityKind::Speaker)?;
    Speaker::find(state.db(), &key)
        .await?
        .ok_or_else(|| missing(EntityKind::Speaker, websafe))
}

/// The caller's profile, created from the token identity on first use.
pub async fn ensure_profile(state: &AppState, user: &AuthUser) -> AppResult<Profile> {
    let profile =
        Profile::get_or_create(state.db(), &user.user_id, &user.nickname, &user.email).await?;
    Ok(profile)
}

/// Decode stored keys, skipping any that no longer parse.
pub fn stored_keys(websafe_keys: &[String], kind: EntityKind) -> Vec<EntityKey> {
    websafe_keys
        .iter()
        .filter_map(|k| match EntityKey::from_websafe(k, kind) {
            Ok(key) => Some(key),
            Err(e) => {
                warn!(error = %e, "skipping stored key");
                None
            }
        })
        .collect()
}

/// Conference forms with organizer display names attached.
pub async fn conference_forms(
    state: &AppState,
    conferences: Vec<Conference>,
) -> AppResult<ConferenceForms> {
    let organizers: Vec<String> = conferences
        .iter()
        .map(|c| c.organizer_user_id.clone())
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();
    let names = Profile::display_names(state.db(), &organizers).await?;

    let items = conferences
        .iter()
        .map(|c| {
            let name = names.get(&c.organizer_user_id).and_then(|n| n.as_deref());
            ConferenceForm::from_conference(c, name)
        })
        .collect();

    Ok(ConferenceForms { items })
}

/// Push a task; a failed push is logged, never surfaced to the caller.
pub async fn enqueue_task(state: &AppState, task: Task) {
    if let Err(e) = tasks::enqueue(state.queue().as_ref(), &task).await {
        warn!(error = %e, task = ?task, "failed to enqueue task");
    }
}
