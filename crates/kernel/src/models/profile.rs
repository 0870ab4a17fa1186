//! User profile model.
//!
//! A profile is keyed by the authenticated user id and is created lazily the
//! first time the user touches the API. It carries the user's conference
//! registrations and session wishlist as lists of websafe keys.

use std::fmt;
use std::str::FromStr;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};
use thiserror::Error;

use super::conference::Conference;
use super::key::EntityKey;

/// T-shirt size choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TeeShirtSize {
    #[default]
    NotSpecified,
    XsM,
    XsW,
    SM,
    SW,
    MM,
    MW,
    LM,
    LW,
    XlM,
    XlW,
    XxlM,
    XxlW,
    XxxlM,
    XxxlW,
}

impl TeeShirtSize {
    pub const ALL: [TeeShirtSize; 15] = [
        TeeShirtSize::NotSpecified,
        TeeShirtSize::XsM,
        TeeShirtSize::XsW,
        TeeShirtSize::SM,
        TeeShirtSize::SW,
        TeeShirtSize::MM,
        TeeShirtSize::MW,
        TeeShirtSize::LM,
        TeeShirtSize::LW,
        TeeShirtSize::XlM,
        TeeShirtSize::XlW,
        TeeShirtSize::XxlM,
        TeeShirtSize::XxlW,
        TeeShirtSize::XxxlM,
        TeeShirtSize::XxxlW,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TeeShirtSize::NotSpecified => "NOT_SPECIFIED",
            TeeShirtSize::XsM => "XS_M",
            TeeShirtSize::XsW => "XS_W",
            TeeShirtSize::SM => "S_M",
            TeeShirtSize::SW => "S_W",
            TeeShirtSize::MM => "M_M",
            TeeShirtSize::MW => "M_W",
            TeeShirtSize::LM => "L_M",
            TeeShirtSize::LW => "L_W",
            TeeShirtSize::XlM => "XL_M",
            TeeShirtSize::XlW => "XL_W",
            TeeShirtSize::XxlM => "XXL_M",
            TeeShirtSize::XxlW => "XXL_W",
            TeeShirtSize::XxxlM => "XXXL_M",
            TeeShirtSize::XxxlW => "XXXL_W",
        }
    }
}

impl FromStr for TeeShirtSize {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        TeeShirtSize::ALL
            .into_iter()
            .find(|size| size.as_str() == s)
            .with_context(|| format!("unknown tee shirt size: {s}"))
    }
}

impl fmt::Display for TeeShirtSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Conflicts raised by registration and wishlist changes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProfileConflict {
    #[error("You have already registered for this conference")]
    AlreadyRegistered,

    #[error("There are no seats available.")]
    NoSeatsAvailable,

    #[error("You already have this session in your wishlist")]
    AlreadyInWishlist,
}

/// Profile record.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Profile {
    /// Authenticated user id.
    pub user_id: String,

    pub display_name: Option<String>,

    pub main_email: Option<String>,

    /// Stored as the enum's wire name.
    pub tee_shirt_size: String,

    /// Websafe keys of conferences the user registered for.
    pub conference_keys_to_attend: Vec<String>,

    /// Websafe keys of sessions in the user's wishlist.
    pub session_keys_in_wishlist: Vec<String>,
}

const PROFILE_COLUMNS: &str = "user_id, display_name, main_email, tee_shirt_size, conference_keys_to_attend, session_keys_in_wishlist";

impl Profile {
    pub fn key(&self) -> EntityKey {
        EntityKey::profile(&self.user_id)
    }

    /// Parsed tee shirt size; unknown stored values read as not specified.
    pub fn tee_shirt_size(&self) -> TeeShirtSize {
        self.tee_shirt_size.parse().unwrap_or_default()
    }

    /// Find a profile by user id.
    pub async fn find(pool: &PgPool, user_id: &str) -> Result<Option<Self>> {
        let profile = sqlx::query_as::<_, Profile>(&format!(
            "SELECT {PROFILE_COLUMNS} FROM profile WHERE user_id = $1"
        ))
        .bind(user_id)
        .fetch_optional(pool)
        .await
        .context("failed to fetch profile")?;

        Ok(profile)
    }

    /// Fetch the profile, creating it from the token identity when missing.
    pub async fn get_or_create(
        pool: &PgPool,
        user_id: &str,
        nickname: &str,
        email: &str,
    ) -> Result<Self> {
        sqlx::query(
            r#"
            INSERT INTO profile (user_id, display_name, main_email, tee_shirt_size)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(nickname)
        .bind(email)
        .bind(TeeShirtSize::NotSpecified.as_str())
        .execute(pool)
        .await
        .context("failed to create profile")?;

        Self::find(pool, user_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("failed to fetch created profile"))
    }

    /// Lock and fetch a profile inside a transaction.
    pub async fn find_for_update(conn: &mut PgConnection, user_id: &str) -> Result<Option<Self>> {
        let profile = sqlx::query_as::<_, Profile>(&format!(
            "SELECT {PROFILE_COLUMNS} FROM profile WHERE user_id = $1 FOR UPDATE"
        ))
        .bind(user_id)
        .fetch_optional(conn)
        .await
        .context("failed to lock profile")?;

        Ok(profile)
    }

    /// Display names for a set of user ids. Missing profiles are absent from the map.
    pub async fn display_names(
        pool: &PgPool,
        user_ids: &[String],
    ) -> Result<std::collections::HashMap<String, Option<String>>> {
        let rows: Vec<(String, Option<String>)> =
            sqlx::query_as("SELECT user_id, display_name FROM profile WHERE user_id = ANY($1)")
                .bind(user_ids)
                .fetch_all(pool)
                .await
                .context("failed to fetch display names")?;

        Ok(rows.into_iter().collect())
    }

    /// Apply a `saveProfile` request; empty values leave fields untouched.
    pub fn apply_mini(&mut self, display_name: Option<&str>, tee_shirt_size: Option<TeeShirtSize>) {
        if let Some(name) = display_name.filter(|n| !n.is_empty()) {
            self.display_name = Some(name.to_string());
        }
        if let Some(size) = tee_shirt_size {
            self.tee_shirt_size = size.as_str().to_string();
        }
    }

    /// Persist the user-editable fields.
    pub async fn save_details(&self, pool: &PgPool) -> Result<()> {
        sqlx::query("UPDATE profile SET display_name = $1, tee_shirt_size = $2 WHERE user_id = $3")
            .bind(&self.display_name)
            .bind(&self.tee_shirt_size)
            .bind(&self.user_id)
            .execute(pool)
            .await
            .context("failed to update profile")?;

        Ok(())
    }

    /// Persist the registration and wishlist lists.
    pub async fn save_lists(&self, conn: &mut PgConnection) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE profile SET
                conference_keys_to_attend = $1,
                session_keys_in_wishlist = $2
            WHERE user_id = $3
            "#,
        )
        .bind(&self.conference_keys_to_attend)
        .bind(&self.session_keys_in_wishlist)
        .bind(&self.user_id)
        .execute(conn)
        .await
        .context("failed to update profile lists")?;

        Ok(())
    }

    pub fn is_registered(&self, conference_key: &str) -> bool {
        self.conference_keys_to_attend
            .iter()
            .any(|k| k == conference_key)
    }

    /// Register for a conference, taking one seat.
    pub fn register(
        &mut self,
        conference: &mut Conference,
        conference_key: &str,
    ) -> Result<(), ProfileConflict> {
        if self.is_registered(conference_key) {
            return Err(ProfileConflict::AlreadyRegistered);
        }
        if conference.seats_available <= 0 {
            return Err(ProfileConflict::NoSeatsAvailable);
        }

        self.conference_keys_to_attend
            .push(conference_key.to_string());
        conference.seats_available -= 1;
        Ok(())
    }

    /// Unregister from a conference, giving the seat back.
    ///
    /// Returns false when the user was not registered.
    pub fn unregister(&mut self, conference: &mut Conference, conference_key: &str) -> bool {
        let before = self.conference_keys_to_attend.len();
        self.conference_keys_to_attend.retain(|k| k != conference_key);
        if self.conference_keys_to_attend.len() == before {
            return false;
        }

        conference.seats_available += 1;
        true
    }

    pub fn add_to_wishlist(&mut self, session_key: &str) -> Result<(), ProfileConflict> {
        if self.session_keys_in_wishlist.iter().any(|k| k == session_key) {
            return Err(ProfileConflict::AlreadyInWishlist);
        }
        self.session_keys_in_wishlist.push(session_key.to_string());
        Ok(())
    }

    /// Returns false when the session was not in the wishlist.
    pub fn remove_from_wishlist(&mut self, session_key: &str) -> bool {
        let before = self.session_keys_in_wishlist.len();
        self.session_keys_in_wishlist.retain(|k| k != session_key);
        self.session_keys_in_wishlist.len() != before
    }
}
