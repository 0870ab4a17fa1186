//! Conference session model.

use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tracing::debug;

use super::key::{EntityKey, EntityKind};

/// Session type excluded by the evening query.
pub const WORKSHOP_TYPE: &str = "Workshop";

/// Session record.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Session {
    pub id: i64,

    /// Parent conference.
    pub conference_id: i64,

    /// Organizer of the parent conference; completes the key path.
    pub organizer_user_id: String,

    pub name: String,

    pub type_of_session: String,

    pub highlights: Vec<String>,

    /// Websafe keys of the speakers; the first is the principal speaker.
    pub speaker_keys: Vec<String>,

    /// Length in minutes.
    pub duration: Option<i32>,

    pub date: Option<NaiveDate>,

    pub start_time: Option<NaiveTime>,
}

/// Input for creating a session.
#[derive(Debug, Clone, Default)]
pub struct CreateSession {
    pub name: String,
    pub type_of_session: String,
    pub highlights: Vec<String>,
    pub speaker_keys: Vec<String>,
    pub duration: Option<i32>,
    pub date: Option<NaiveDate>,
    pub start_time: Option<NaiveTime>,
}

const SESSION_COLUMNS: &str = "id, conference_id, organizer_user_id, name, type_of_session, highlights, speaker_keys, duration, date, start_time";

impl Session {
    pub fn key(&self) -> EntityKey {
        EntityKey::session(&self.organizer_user_id, self.conference_id, self.id)
    }

    pub fn websafe_key(&self) -> String {
        self.key().to_websafe()
    }

    /// Websafe key of the parent conference.
    pub fn conference_websafe_key(&self) -> String {
        EntityKey::conference(&self.organizer_user_id, self.conference_id).to_websafe()
    }

    /// Websafe key of the principal speaker, if any.
    pub fn principal_speaker(&self) -> Option<&str> {
        self.speaker_keys.first().map(String::as_str)
    }

    /// Insert a session under a conference.
    pub async fn create(
        pool: &PgPool,
        conference_key: &EntityKey,
        input: CreateSession,
    ) -> Result<Self> {
        let conference_id = conference_key
            .id_of(EntityKind::Conference)
            .context("session parent must be a conference key")?;

        let session = sqlx::query_as::<_, Session>(&format!(
            r#"
            INSERT INTO session (conference_id, organizer_user_id, name, type_of_session, highlights, speaker_keys, duration, date, start_time)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {SESSION_COLUMNS}
            "#
        ))
        .bind(conference_id)
        .bind(conference_key.user_id())
        .bind(&input.name)
        .bind(&input.type_of_session)
        .bind(&input.highlights)
        .bind(&input.speaker_keys)
        .bind(input.duration)
        .bind(input.date)
        .bind(input.start_time)
        .fetch_one(pool)
        .await
        .context("failed to insert session")?;

        debug!(id = session.id, conference_id, "session created");
        Ok(session)
    }

    /// Find the session a key addresses.
    pub async fn find(pool: &PgPool, key: &EntityKey) -> Result<Option<Self>> {
        let (Some(conference_id), Some(id)) = (
            key.id_of(EntityKind::Conference),
            key.id_of(EntityKind::Session),
        ) else {
            return Ok(None);
        };

        let session = sqlx::query_as::<_, Session>(&format!(
            "SELECT {SESSION_COLUMNS} FROM session WHERE id = $1 AND conference_id = $2 AND organizer_user_id = $3"
        ))
        .bind(id)
        .bind(conference_id)
        .bind(key.user_id())
        .fetch_optional(pool)
        .await
        .context("failed to fetch session")?;

        Ok(session)
    }

    /// Sessions of a conference.
    pub async fn list_by_conference(pool: &PgPool, conference_id: i64) -> Result<Vec<Self>> {
        let sessions = sqlx::query_as::<_, Session>(&format!(
            "SELECT {SESSION_COLUMNS} FROM session WHERE conference_id = $1 ORDER BY id"
        ))
        .bind(conference_id)
        .fetch_all(pool)
        .await
        .context("failed to list sessions by conference")?;

        Ok(sessions)
    }

    /// Sessions of a conference with a given type.
    pub async fn list_by_conference_and_type(
        pool: &PgPool,
        conference_id: i64,
        type_of_session: &str,
    ) -> Result<Vec<Self>> {
        let sessions = sqlx::query_as::<_, Session>(&format!(
            "SELECT {SESSION_COLUMNS} FROM session WHERE conference_id = $1 AND type_of_session = $2 ORDER BY id"
        ))
        .bind(conference_id)
        .bind(type_of_session)
        .fetch_all(pool)
        .await
        .context("failed to list sessions by type")?;

        Ok(sessions)
    }

    /// Sessions of a conference given by a speaker.
    pub async fn list_by_conference_and_speaker(
        pool: &PgPool,
        conference_id: i64,
        speaker_key: &str,
    ) -> Result<Vec<Self>> {
        let sessions = sqlx::query_as::<_, Session>(&format!(
            "SELECT {SESSION_COLUMNS} FROM session WHERE conference_id = $1 AND $2 = ANY(speaker_keys) ORDER BY id"
        ))
        .bind(conference_id)
        .bind(speaker_key)
        .fetch_all(pool)
        .await
        .context("failed to list sessions by conference and speaker")?;

        Ok(sessions)
    }

    /// Sessions across all conferences given by a speaker.
    pub async fn list_by_speaker(pool: &PgPool, speaker_key: &str) -> Result<Vec<Self>> {
        let sessions = sqlx::query_as::<_, Session>(&format!(
            "SELECT {SESSION_COLUMNS} FROM session WHERE $1 = ANY(speaker_keys) ORDER BY id"
        ))
        .bind(speaker_key)
        .fetch_all(pool)
        .await
        .context("failed to list sessions by speaker")?;

        Ok(sessions)
    }

    /// Sessions whose duration lies in `[min, max]`, shortest first.
    ///
    /// Sessions without a duration never match.
    pub async fn list_by_duration(
        pool: &PgPool,
        min_duration: i32,
        max_duration: Option<i32>,
    ) -> Result<Vec<Self>> {
        let sessions = sqlx::query_as::<_, Session>(&format!(
            "SELECT {SESSION_COLUMNS} FROM session WHERE duration >= $1 AND ($2::INTEGER IS NULL OR duration <= $2) ORDER BY duration, id"
        ))
        .bind(min_duration)
        .bind(max_duration)
        .fetch_all(pool)
        .await
        .context("failed to list sessions by duration")?;

        Ok(sessions)
    }

    /// Sessions that are not workshops and start before `before`.
    pub async fn list_non_workshop_before(pool: &PgPool, before: NaiveTime) -> Result<Vec<Self>> {
        let sessions = sqlx::query_as::<_, Session>(&format!(
            "SELECT {SESSION_COLUMNS} FROM session WHERE type_of_session <> $1 AND start_time < $2 ORDER BY start_time, id"
        ))
        .bind(WORKSHOP_TYPE)
        .bind(before)
        .fetch_all(pool)
        .await
        .context("failed to list non-workshop sessions")?;

        Ok(sessions)
    }

    /// Sessions addressed by a list of keys, in list order.
    ///
    /// Keys that no longer resolve are skipped.
    pub async fn list_by_keys(pool: &PgPool, keys: &[EntityKey]) -> Result<Vec<Self>> {
        let ids: Vec<i64> = keys
            .iter()
            .filter_map(|k| k.id_of(EntityKind::Session))
            .collect();

        let found = sqlx::query_as::<_, Session>(&format!(
            "SELECT {SESSION_COLUMNS} FROM session WHERE id = ANY($1)"
        ))
        .bind(&ids)
        .fetch_all(pool)
        .await
        .context("failed to list sessions by key")?;

        Ok(keys
            .iter()
            .filter_map(|key| found.iter().find(|s| &s.key() == key).cloned())
            .collect())
    }
}

#[cfg(test)]
// Tests are allowed to use unwrap/expect freely.
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn keys_follow_the_conference() {
        let session = Session {
            id: 12,
            conference_id: 7,
            organizer_user_id: "alice".to_string(),
            name: "Ownership".to_string(),
            type_of_session: "Lecture".to_string(),
            highlights: Vec::new(),
            speaker_keys: vec!["sp-1".to_string(), "sp-2".to_string()],
            duration: Some(45),
            date: None,
            start_time: None,
        };

        assert_eq!(
            session.key().to_string(),
            "Profile:alice/Conference:7/Session:12"
        );
        assert_eq!(
            session.conference_websafe_key(),
            EntityKey::conference("alice", 7).to_websafe()
        );
        assert_eq!(session.principal_speaker(), Some("sp-1"));
    }
}
