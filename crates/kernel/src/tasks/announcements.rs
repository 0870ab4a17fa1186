//! Derived announcement strings.
//!
//! Both strings live in the shared cache under fixed keys and are read back
//! verbatim by the API.

use anyhow::Result;
use sqlx::PgPool;
use tracing::info;

use crate::cache::CacheLayer;
use crate::models::Conference;

/// Cache key of the nearly-sold-out announcement.
pub const RECENT_ANNOUNCEMENTS_KEY: &str = "RECENT_ANNOUNCEMENTS";

/// Cache key of the featured speaker message.
pub const FEATURED_SPEAKER_KEY: &str = "FEATURED_SPEAKER";

/// Announcement for nearly sold out conferences, or None when there are none.
pub fn format_announcement(conference_names: &[String]) -> Option<String> {
    if conference_names.is_empty() {
        return None;
    }
    Some(format!(
        "Last chance to attend! The following conferences are nearly sold out: {}",
        conference_names.join(", ")
    ))
}

pub fn format_featured_speaker(speaker_name: &str, session_names: &str) -> String {
    format!(
        "The Featured Speaker is {speaker_name}, who is giving the following sessions: {session_names}."
    )
}

/// Recompute the announcement and store it, or clear it when nothing is nearly sold out.
///
/// Returns the announcement, empty when cleared.
pub async fn cache_announcement(pool: &PgPool, cache: &CacheLayer) -> Result<String> {
    let conferences = Conference::list_nearly_sold_out(pool).await?;
    let names: Vec<String> = conferences.into_iter().map(|c| c.name).collect();

    match format_announcement(&names) {
        Some(announcement) => {
            cache
                .set(RECENT_ANNOUNCEMENTS_KEY, &announcement, None)
                .await;
            info!(conferences = names.len(), "announcement updated");
            Ok(announcement)
        }
        None => {
            cache.invalidate(RECENT_ANNOUNCEMENTS_KEY).await;
            info!("no nearly sold out conferences, announcement cleared");
            Ok(String::new())
        }
    }
}

/// Store the featured speaker message.
pub async fn cache_featured_speaker(
    cache: &CacheLayer,
    speaker_name: &str,
    session_names: &str,
) -> String {
    let message = format_featured_speaker(speaker_name, session_names);
    cache.set(FEATURED_SPEAKER_KEY, &message, None).await;
    info!(speaker = %speaker_name, "featured speaker updated");
    message
}
