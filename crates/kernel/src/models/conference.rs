//! Conference model and CRUD operations.
//!
//! Conferences live under the organizer's profile. Filtered listing goes
//! through the query compiler and [`ConferenceQueryBuilder`].

use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};
use tracing::debug;

use super::key::{EntityKey, EntityKind};
use crate::query::{CompiledQuery, ConferenceQueryBuilder};

/// City used when a conference is created without one.
pub const DEFAULT_CITY: &str = "Default City";

/// Topics used when a conference is created without any.
pub const DEFAULT_TOPICS: [&str; 2] = ["Default", "Topic"];

/// Upper bound (inclusive) of seats left for a conference to be announced.
pub const NEARLY_SOLD_OUT_SEATS: i32 = 5;

/// Conference record.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Conference {
    pub id: i64,

    /// User id of the organizer (parent profile).
    pub organizer_user_id: String,

    pub name: String,

    pub description: Option<String>,

    pub topics: Vec<String>,

    pub city: Option<String>,

    pub start_date: Option<NaiveDate>,

    pub end_date: Option<NaiveDate>,

    /// Month of `start_date`, 0 when there is none.
    pub month: i32,

    pub max_attendees: i32,

    pub seats_available: i32,
}

/// Input for creating a conference.
#[derive(Debug, Clone, Default)]
pub struct CreateConference {
    pub name: String,
    pub description: Option<String>,
    pub topics: Vec<String>,
    pub city: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub max_attendees: Option<i32>,
    pub seats_available: Option<i32>,
}

/// Fields an organizer may change. `None` leaves the stored value as is.
#[derive(Debug, Clone, Default)]
pub struct UpdateConference {
    pub name: Option<String>,
    pub description: Option<String>,
    pub topics: Option<Vec<String>>,
    pub city: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub max_attendees: Option<i32>,
    pub seats_available: Option<i32>,
}

const CONFERENCE_COLUMNS: &str = "id, organizer_user_id, name, description, topics, city, start_date, end_date, month, max_attendees, seats_available";

/// Month number of an optional start date.
pub fn month_of(start_date: Option<NaiveDate>) -> i32 {
    start_date.map(|d| d.month() as i32).unwrap_or(0)
}

impl CreateConference {
    /// Fill missing values and derive `month` and `seats_available`.
    pub fn into_record(self, organizer_user_id: &str) -> Conference {
        let topics = if self.topics.is_empty() {
            DEFAULT_TOPICS.iter().map(|t| t.to_string()).collect()
        } else {
            self.topics
        };
        let max_attendees = self.max_attendees.unwrap_or(0);
        let seats_available = if max_attendees > 0 {
            max_attendees
        } else {
            self.seats_available.unwrap_or(0)
        };

        Conference {
            id: 0,
            organizer_user_id: organizer_user_id.to_string(),
            name: self.name,
            description: self.description,
            topics,
            city: Some(self.city.unwrap_or_else(|| DEFAULT_CITY.to_string())),
            start_date: self.start_date,
            end_date: self.end_date,
            month: month_of(self.start_date),
            max_attendees,
            seats_available,
        }
    }
}

impl Conference {
    pub fn key(&self) -> EntityKey {
        EntityKey::conference(&self.organizer_user_id, self.id)
    }

    pub fn websafe_key(&self) -> String {
        self.key().to_websafe()
    }

    /// Apply an organizer update. A new start date also moves `month`.
    pub fn apply_update(&mut self, update: UpdateConference) {
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(description) = update.description {
            self.description = Some(description);
        }
        if let Some(topics) = update.topics {
            self.topics = topics;
        }
        if let Some(city) = update.city {
            self.city = Some(city);
        }
        if let Some(start_date) = update.start_date {
            self.start_date = Some(start_date);
            self.month = month_of(Some(start_date));
        }
        if let Some(end_date) = update.end_date {
            self.end_date = Some(end_date);
        }
        if let Some(max_attendees) = update.max_attendees {
            self.max_attendees = max_attendees;
        }
        if let Some(seats_available) = update.seats_available {
            self.seats_available = seats_available;
        }
    }

    /// Insert a new conference with defaults applied.
    pub async fn create(
        pool: &PgPool,
        organizer_user_id: &str,
        input: CreateConference,
    ) -> Result<Self> {
        let record = input.into_record(organizer_user_id);

        let conference = sqlx::query_as::<_, Conference>(&format!(
            r#"
            INSERT INTO conference (organizer_user_id, name, description, topics, city, start_date, end_date, month, max_attendees, seats_available)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {CONFERENCE_COLUMNS}
            "#
        ))
        .bind(&record.organizer_user_id)
        .bind(&record.name)
        .bind(&record.description)
        .bind(&record.topics)
        .bind(&record.city)
        .bind(record.start_date)
        .bind(record.end_date)
        .bind(record.month)
        .bind(record.max_attendees)
        .bind(record.seats_available)
        .fetch_one(pool)
        .await
        .context("failed to insert conference")?;

        debug!(id = conference.id, organizer = %organizer_user_id, "conference created");
        Ok(conference)
    }

    /// Find the conference a key addresses.
    pub async fn find(pool: &PgPool, key: &EntityKey) -> Result<Option<Self>> {
        let Some(id) = key.id_of(EntityKind::Conference) else {
            return Ok(None);
        };

        let conference = sqlx::query_as::<_, Conference>(&format!(
            "SELECT {CONFERENCE_COLUMNS} FROM conference WHERE id = $1 AND organizer_user_id = $2"
        ))
        .bind(id)
        .bind(key.user_id())
        .fetch_optional(pool)
        .await
        .context("failed to fetch conference")?;

        Ok(conference)
    }

    /// Lock and fetch a conference inside a transaction.
    pub async fn find_for_update(conn: &mut PgConnection, key: &EntityKey) -> Result<Option<Self>> {
        let Some(id) = key.id_of(EntityKind::Conference) else {
            return Ok(None);
        };

        let conference = sqlx::query_as::<_, Conference>(&format!(
            "SELECT {CONFERENCE_COLUMNS} FROM conference WHERE id = $1 AND organizer_user_id = $2 FOR UPDATE"
        ))
        .bind(id)
        .bind(key.user_id())
        .fetch_optional(conn)
        .await
        .context("failed to lock conference")?;

        Ok(conference)
    }

    /// Write every mutable column back.
    pub async fn save(&self, conn: &mut PgConnection) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE conference SET
                name = $1,
                description = $2,
                topics = $3,
                city = $4,
                start_date = $5,
                end_date = $6,
                month = $7,
                max_attendees = $8,
                seats_available = $9
            WHERE id = $10
            "#,
        )
        .bind(&self.name)
        .bind(&self.description)
        .bind(&self.topics)
        .bind(&self.city)
        .bind(self.start_date)
        .bind(self.end_date)
        .bind(self.month)
        .bind(self.max_attendees)
        .bind(self.seats_available)
        .bind(self.id)
        .execute(conn)
        .await
        .context("failed to update conference")?;

        Ok(())
    }

    /// Conferences organized by a user.
    pub async fn list_by_organizer(pool: &PgPool, user_id: &str) -> Result<Vec<Self>> {
        let conferences = sqlx::query_as::<_, Conference>(&format!(
            "SELECT {CONFERENCE_COLUMNS} FROM conference WHERE organizer_user_id = $1 ORDER BY name"
        ))
        .bind(user_id)
        .fetch_all(pool)
        .await
        .context("failed to list conferences by organizer")?;

        Ok(conferences)
    }

    /// Conferences addressed by a list of websafe keys, in list order.
    ///
    /// Keys that no longer resolve are skipped.
    pub async fn list_by_keys(pool: &PgPool, keys: &[EntityKey]) -> Result<Vec<Self>> {
        let ids: Vec<i64> = keys
            .iter()
            .filter_map(|k| k.id_of(EntityKind::Conference))
            .collect();

        let found = sqlx::query_as::<_, Conference>(&format!(
            "SELECT {CONFERENCE_COLUMNS} FROM conference WHERE id = ANY($1)"
        ))
        .bind(&ids)
        .fetch_all(pool)
        .await
        .context("failed to list conferences by key")?;

        Ok(keys
            .iter()
            .filter_map(|key| found.iter().find(|c| &c.key() == key).cloned())
            .collect())
    }

    /// Run a compiled filter query.
    pub async fn query(pool: &PgPool, compiled: &CompiledQuery) -> Result<Vec<Self>> {
        let sql = ConferenceQueryBuilder::new(compiled).build();
        debug!(sql = %sql, "conference query");

        let conferences = sqlx::query_as::<_, Conference>(&sql)
            .fetch_all(pool)
            .await
            .context("failed to execute conference query")?;

        Ok(conferences)
    }

    /// Conferences with a handful of seats left.
    pub async fn list_nearly_sold_out(pool: &PgPool) -> Result<Vec<Self>> {
        let conferences = sqlx::query_as::<_, Conference>(&format!(
            "SELECT {CONFERENCE_COLUMNS} FROM conference WHERE seats_available > 0 AND seats_available <= $1 ORDER BY seats_available, name"
        ))
        .bind(NEARLY_SOLD_OUT_SEATS)
        .fetch_all(pool)
        .await
        .context("failed to list nearly sold out conferences")?;

        Ok(conferences)
    }
}

#[cfg(test)]
// Tests are allowed to use unwrap/expect freely.
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn defaults_fill_missing_values() {
        let record = CreateConference {
            name: "RustConf".to_string(),
            ..Default::default()
        }
        .into_record("alice");

        assert_eq!(record.city.as_deref(), Some(DEFAULT_CITY));
        assert_eq!(record.topics, vec!["Default", "Topic"]);
        assert_eq!(record.max_attendees, 0);
        assert_eq!(record.seats_available, 0);
        assert_eq!(record.month, 0);
        assert_eq!(record.organizer_user_id, "alice");
    }

    #[test]
    fn seats_follow_max_attendees() {
        let record = CreateConference {
            name: "RustConf".to_string(),
            max_attendees: Some(150),
            seats_available: Some(3),
            ..Default::default()
        }
        .into_record("alice");

        assert_eq!(record.seats_available, 150);
    }

    #[test]
    fn month_comes_from_start_date() {
        let record = CreateConference {
            name: "RustConf".to_string(),
            start_date: Some(date("2026-06-14")),
            end_date: Some(date("2026-06-16")),
            topics: vec!["Rust".to_string()],
            city: Some("London".to_string()),
            ..Default::default()
        }
        .into_record("alice");

        assert_eq!(record.month, 6);
        assert_eq!(record.topics, vec!["Rust"]);
        assert_eq!(record.city.as_deref(), Some("London"));
    }

    #[test]
    fn update_moves_month_with_start_date() {
        let mut conference = CreateConference {
            name: "RustConf".to_string(),
            start_date: Some(date("2026-06-14")),
            ..Default::default()
        }
        .into_record("alice");

        conference.apply_update(UpdateConference {
            city: Some("Paris".to_string()),
            ..Default::default()
        });
        assert_eq!(conference.month, 6);
        assert_eq!(conference.city.as_deref(), Some("Paris"));

        conference.apply_update(UpdateConference {
            start_date: Some(date("2026-09-01")),
            max_attendees: Some(40),
            ..Default::default()
        });
        assert_eq!(conference.month, 9);
        assert_eq!(conference.max_attendees, 40);
        assert_eq!(conference.name, "RustConf");
    }

    #[test]
    fn key_is_below_organizer() {
        let mut conference = CreateConference {
            name: "RustConf".to_string(),
            ..Default::default()
        }
        .into_record("alice");
        conference.id = 9;

        let key = conference.key();
        assert_eq!(key.to_string(), "Profile:alice/Conference:9");
        assert_eq!(key.parent(), Some(EntityKey::profile("alice")));
    }
}
