//! Speaker model.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

use super::key::{EntityKey, EntityKind};

/// Speaker record.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Speaker {
    pub id: i64,

    /// User who created the speaker (parent profile).
    pub creator_user_id: String,

    pub name: String,

    pub organization: Option<String>,

    pub email: Option<String>,

    pub website: Option<String>,
}

/// Input for creating a speaker.
#[derive(Debug, Clone, Default)]
pub struct CreateSpeaker {
    pub name: String,
    pub organization: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
}

const SPEAKER_COLUMNS: &str = "id, creator_user_id, name, organization, email, website";

impl Speaker {
    pub fn key(&self) -> EntityKey {
        EntityKey::speaker(&self.creator_user_id, self.id)
    }

    pub fn websafe_key(&self) -> String {
        self.key().to_websafe()
    }

    pub async fn create(pool: &PgPool, creator_user_id: &str, input: CreateSpeaker) -> Result<Self> {
        let speaker = sqlx::query_as::<_, Speaker>(&format!(
            r#"
            INSERT INTO speaker (creator_user_id, name, organization, email, website)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {SPEAKER_COLUMNS}
            "#
        ))
        .bind(creator_user_id)
        .bind(&input.name)
        .bind(&input.organization)
        .bind(&input.email)
        .bind(&input.website)
        .fetch_one(pool)
        .await
        .context("failed to insert speaker")?;

        Ok(speaker)
    }

    pub async fn find(pool: &PgPool, key: &EntityKey) -> Result<Option<Self>> {
        let Some(id) = key.id_of(EntityKind::Speaker) else {
            return Ok(None);
        };

        let speaker = sqlx::query_as::<_, Speaker>(&format!(
            "SELECT {SPEAKER_COLUMNS} FROM speaker WHERE id = $1 AND creator_user_id = $2"
        ))
        .bind(id)
        .bind(key.user_id())
        .fetch_optional(pool)
        .await
        .context("failed to fetch speaker")?;

        Ok(speaker)
    }

    pub async fn list_all(pool: &PgPool) -> Result<Vec<Self>> {
        let speakers = sqlx::query_as::<_, Speaker>(&format!(
            "SELECT {SPEAKER_COLUMNS} FROM speaker ORDER BY name, id"
        ))
        .fetch_all(pool)
        .await
        .context("failed to list speakers")?;

        Ok(speakers)
    }

    pub async fn list_by_organization(pool: &PgPool, organization: &str) -> Result<Vec<Self>> {
        let speakers = sqlx::query_as::<_, Speaker>(&format!(
            "SELECT {SPEAKER_COLUMNS} FROM speaker WHERE organization = $1 ORDER BY name, id"
        ))
        .bind(organization)
        .fetch_all(pool)
        .await
        .context("failed to list speakers by organization")?;

        Ok(speakers)
    }
}
