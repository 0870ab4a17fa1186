//! Announcement and featured speaker reads.

use axum::{Json, Router, extract::State, routing::get};

use crate::forms::StringMessage;
use crate::state::AppState;
use crate::tasks::{FEATURED_SPEAKER_KEY, RECENT_ANNOUNCEMENTS_KEY};

/// Create the announcement router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/conference/announcement/get", get(get_announcement))
        .route("/getFeaturedSpeaker", get(get_featured_speaker))
}

/// GET /conference/announcement/get
async fn get_announcement(State(state): State<AppState>) -> Json<StringMessage> {
    let data = state
        .cache()
        .get(RECENT_ANNOUNCEMENTS_KEY)
        .await
        .unwrap_or_default();
    Json(StringMessage { data })
}

/// GET /getFeaturedSpeaker
async fn get_featured_speaker(State(state): State<AppState>) -> Json<StringMessage> {
    let data = state
        .cache()
        .get(FEATURED_SPEAKER_KEY)
        .await
        .unwrap_or_default();
    Json(StringMessage { data })
}
