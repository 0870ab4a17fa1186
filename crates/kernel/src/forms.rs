//! Wire messages of the conference API.
//!
//! Field names are camelCase. Every entity has an explicit mapping to and
//! from its form; nothing is copied by name reflection.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};
use crate::models::{
    Conference, CreateConference, CreateSession, CreateSpeaker, Profile, Session, Speaker,
    TeeShirtSize, UpdateConference,
};
use crate::query::FilterDescriptor;

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M";

/// Parse a `YYYY-MM-DD` date from the first ten characters of `value`.
pub fn parse_date(field: &str, value: &str) -> AppResult<NaiveDate> {
    let head = value.get(..10).unwrap_or(value);
    NaiveDate::parse_from_str(head, DATE_FORMAT)
        .map_err(|_| AppError::bad_request(format!("Invalid date for '{field}': {value}")))
}

/// Parse an `HH:MM` time.
pub fn parse_time(field: &str, value: &str) -> AppResult<NaiveTime> {
    NaiveTime::parse_from_str(value, TIME_FORMAT)
        .map_err(|_| AppError::bad_request(format!("Invalid time for '{field}': {value}")))
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

fn format_date(date: Option<NaiveDate>) -> Option<String> {
    date.map(|d| d.format(DATE_FORMAT).to_string())
}

/// Single string response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StringMessage {
    pub data: String,
}

/// Single boolean response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BooleanMessage {
    pub data: bool,
}

// -------------------------------------------------------------------------
// Profile
// -------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileForm {
    pub display_name: Option<String>,
    pub main_email: Option<String>,
    pub tee_shirt_size: TeeShirtSize,
    #[serde(default)]
    pub conference_keys_to_attend: Vec<String>,
    #[serde(default)]
    pub session_keys_in_wishlist: Vec<String>,
}

impl From<&Profile> for ProfileForm {
    fn from(profile: &Profile) -> Self {
        Self {
            display_name: profile.display_name.clone(),
            main_email: profile.main_email.clone(),
            tee_shirt_size: profile.tee_shirt_size(),
            conference_keys_to_attend: profile.conference_keys_to_attend.clone(),
            session_keys_in_wishlist: profile.session_keys_in_wishlist.clone(),
        }
    }
}

/// Profile fields a user may edit.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileMiniForm {
    pub display_name: Option<String>,
    pub tee_shirt_size: Option<TeeShirtSize>,
}

// -------------------------------------------------------------------------
// Conference
// -------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConferenceForm {
    pub name: Option<String>,
    pub description: Option<String>,
    pub organizer_user_id: Option<String>,
    #[serde(default)]
    pub topics: Vec<String>,
    pub city: Option<String>,
    pub start_date: Option<String>,
    pub month: Option<i32>,
    pub max_attendees: Option<i32>,
    pub seats_available: Option<i32>,
    pub end_date: Option<String>,
    pub websafe_key: Option<String>,
    pub organizer_display_name: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConferenceForms {
    pub items: Vec<ConferenceForm>,
}

impl ConferenceForm {
    /// Build the form for a stored conference.
    pub fn from_conference(conference: &Conference, display_name: Option<&str>) -> Self {
        Self {
            name: Some(conference.name.clone()),
            description: conference.description.clone(),
            organizer_user_id: Some(conference.organizer_user_id.clone()),
            topics: conference.topics.clone(),
            city: conference.city.clone(),
            start_date: format_date(conference.start_date),
            month: Some(conference.month),
            max_attendees: Some(conference.max_attendees),
            seats_available: Some(conference.seats_available),
            end_date: format_date(conference.end_date),
            websafe_key: Some(conference.websafe_key()),
            organizer_display_name: display_name.map(str::to_string),
        }
    }

    /// Validate a creation request.
    pub fn to_create(&self) -> AppResult<CreateConference> {
        let name = non_empty(&self.name)
            .ok_or_else(|| AppError::bad_request("Conference 'name' field required"))?;

        Ok(CreateConference {
            name: name.to_string(),
            description: self.description.clone(),
            topics: self.topics.clone(),
            city: self.city.clone(),
            start_date: non_empty(&self.start_date)
                .map(|d| parse_date("startDate", d))
                .transpose()?,
            end_date: non_empty(&self.end_date)
                .map(|d| parse_date("endDate", d))
                .transpose()?,
            max_attendees: self.max_attendees,
            seats_available: self.seats_available,
        })
    }

    /// Collect the updatable fields that carry data.
    ///
    /// `organizerUserId`, `month` and `websafeKey` are never taken from the request.
    pub fn to_update(&self) -> AppResult<UpdateConference> {
        Ok(UpdateConference {
            name: non_empty(&self.name).map(str::to_string),
            description: non_empty(&self.description).map(str::to_string),
            topics: (!self.topics.is_empty()).then(|| self.topics.clone()),
            city: non_empty(&self.city).map(str::to_string),
            start_date: non_empty(&self.start_date)
                .map(|d| parse_date("startDate", d))
                .transpose()?,
            end_date: non_empty(&self.end_date)
                .map(|d| parse_date("endDate", d))
                .transpose()?,
            max_attendees: self.max_attendees,
            seats_available: self.seats_available,
        })
    }

    /// Summary used in the confirmation email.
    pub fn summary(&self) -> String {
        let mut lines = vec![format!("Name: {}", self.name.as_deref().unwrap_or_default())];
        if let Some(description) = non_empty(&self.description) {
            lines.push(format!("Description: {description}"));
        }
        if let Some(city) = non_empty(&self.city) {
            lines.push(format!("City: {city}"));
        }
        if !self.topics.is_empty() {
            lines.push(format!("Topics: {}", self.topics.join(", ")));
        }
        if let Some(start) = non_empty(&self.start_date) {
            lines.push(format!("Start date: {start}"));
        }
        if let Some(end) = non_empty(&self.end_date) {
            lines.push(format!("End date: {end}"));
        }
        if let Some(max) = self.max_attendees {
            lines.push(format!("Max attendees: {max}"));
        }
        lines.join("\n")
    }
}

/// Filter list for `queryConferences`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConferenceQueryForms {
    #[serde(default)]
    pub filters: Vec<FilterDescriptor>,
}

// -------------------------------------------------------------------------
// Session
// -------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionForm {
    pub name: Option<String>,
    pub type_of_session: Option<String>,
    #[serde(default)]
    pub highlights: Vec<String>,
    pub conf_websafe_key: Option<String>,
    #[serde(default)]
    pub speaker_web_safe_keys: Vec<String>,
    pub duration: Option<i32>,
    pub date: Option<String>,
    pub start_time: Option<String>,
    pub websafe_key: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionForms {
    pub items: Vec<SessionForm>,
}

impl From<&Session> for SessionForm {
    fn from(session: &Session) -> Self {
        Self {
            name: Some(session.name.clone()),
            type_of_session: Some(session.type_of_session.clone()),
            highlights: session.highlights.clone(),
            conf_websafe_key: Some(session.conference_websafe_key()),
            speaker_web_safe_keys: session.speaker_keys.clone(),
            duration: session.duration,
            date: format_date(session.date),
            start_time: session
                .start_time
                .map(|t| t.format(TIME_FORMAT).to_string()),
            websafe_key: Some(session.websafe_key()),
        }
    }
}

impl From<Vec<Session>> for SessionForms {
    fn from(sessions: Vec<Session>) -> Self {
        Self {
            items: sessions.iter().map(SessionForm::from).collect(),
        }
    }
}

impl SessionForm {
    /// Validate a creation request. Returns the raw conference key and the input.
    pub fn to_create(&self) -> AppResult<(&str, CreateSession)> {
        let name = non_empty(&self.name)
            .ok_or_else(|| AppError::bad_request("Session 'name' field required"))?;
        let type_of_session = non_empty(&self.type_of_session)
            .ok_or_else(|| AppError::bad_request("Session 'typeOfSession' field required"))?;
        let conf_key = non_empty(&self.conf_websafe_key)
            .ok_or_else(|| AppError::bad_request("Session 'confWebsafeKey' field required"))?;

        let input = CreateSession {
            name: name.to_string(),
            type_of_session: type_of_session.to_string(),
            highlights: self.highlights.clone(),
            speaker_keys: self.speaker_web_safe_keys.clone(),
            duration: self.duration,
            date: non_empty(&self.date)
                .map(|d| parse_date("date", d))
                .transpose()?,
            start_time: non_empty(&self.start_time)
                .map(|t| parse_time("startTime", t))
                .transpose()?,
        };

        Ok((conf_key, input))
    }
}

/// Query parameters of `getSessionsByDuration`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionQueryDurationForm {
    pub min_duration: Option<i32>,
    pub max_duration: Option<i32>,
}

impl SessionQueryDurationForm {
    /// Lower bound; absent or zero means 0.
    pub fn min(&self) -> i32 {
        self.min_duration.unwrap_or(0)
    }

    /// Upper bound; absent or zero means unbounded.
    pub fn max(&self) -> Option<i32> {
        self.max_duration.filter(|m| *m != 0)
    }
}

// -------------------------------------------------------------------------
// Speaker
// -------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeakerForm {
    pub name: Option<String>,
    pub organization: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
    pub websafe_key: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpeakerForms {
    pub items: Vec<SpeakerForm>,
}

impl From<&Speaker> for SpeakerForm {
    fn from(speaker: &Speaker) -> Self {
        Self {
            name: Some(speaker.name.clone()),
            organization: speaker.organization.clone(),
            email: speaker.email.clone(),
            website: speaker.website.clone(),
            websafe_key: Some(speaker.websafe_key()),
        }
    }
}

impl From<Vec<Speaker>> for SpeakerForms {
    fn from(speakers: Vec<Speaker>) -> Self {
        Self {
            items: speakers.iter().map(SpeakerForm::from).collect(),
        }
    }
}

impl SpeakerForm {
    pub fn to_create(&self) -> AppResult<CreateSpeaker> {
        let name = non_empty(&self.name)
            .ok_or_else(|| AppError::bad_request("Speaker 'name' field required"))?;

        Ok(CreateSpeaker {
            name: name.to_string(),
            organization: self.organization.clone(),
            email: self.email.clone(),
            website: self.website.clone(),
        })
    }
}

/// Query parameters of `getSpeakersByOrganization`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpeakerQueryOrganizationForm {
    pub organization: Option<String>,
}

#[cfg(test)]
// Tests are allowed to use unwrap/expect freely.
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn dates_use_first_ten_characters() {
        let date = parse_date("startDate", "2026-06-14T09:00:00Z").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2026, 6, 14).unwrap());
        assert!(parse_date("startDate", "14/06/2026").is_err());
        assert!(parse_date("startDate", "2026-13-01").is_err());
    }

    #[test]
    fn times_are_hours_and_minutes() {
        assert_eq!(
            parse_time("startTime", "18:30").unwrap(),
            NaiveTime::from_hms_opt(18, 30, 0).unwrap()
        );
        assert!(parse_time("startTime", "6pm").is_err());
    }

    #[test]
    fn conference_form_reads_camel_case() {
        let form: ConferenceForm = serde_json::from_value(json!({
            "name": "RustConf",
            "maxAttendees": 100,
            "startDate": "2026-06-14",
            "topics": ["Rust"]
        }))
        .unwrap();

        let create = form.to_create().unwrap();
        assert_eq!(create.name, "RustConf");
        assert_eq!(create.max_attendees, Some(100));
        assert_eq!(create.start_date, NaiveDate::from_ymd_opt(2026, 6, 14));
        assert!(create.end_date.is_none());
    }

    #[test]
    fn conference_name_is_required() {
        for form in [
            ConferenceForm::default(),
            ConferenceForm {
                name: Some(String::new()),
                ..Default::default()
            },
        ] {
            let err = form.to_create().unwrap_err();
            assert_eq!(err.to_string(), "Conference 'name' field required");
        }
    }

    #[test]
    fn update_ignores_empty_and_protected_fields() {
        let form = ConferenceForm {
            name: Some(String::new()),
            organizer_user_id: Some("mallory".to_string()),
            month: Some(12),
            city: Some("Paris".to_string()),
            ..Default::default()
        };

        let update = form.to_update().unwrap();
        assert!(update.name.is_none());
        assert!(update.topics.is_none());
        assert_eq!(update.city.as_deref(), Some("Paris"));
    }

    #[test]
    fn conference_output_carries_key_and_null_dates() {
        let conference = Conference {
            id: 3,
            organizer_user_id: "alice".to_string(),
            name: "RustConf".to_string(),
            description: None,
            topics: vec!["Default".to_string(), "Topic".to_string()],
            city: Some("Default City".to_string()),
            start_date: None,
            end_date: None,
            month: 0,
            max_attendees: 0,
            seats_available: 0,
        };

        let form = ConferenceForm::from_conference(&conference, Some("Alice"));
        let value = serde_json::to_value(&form).unwrap();

        assert_eq!(value["websafeKey"], json!(conference.websafe_key()));
        assert_eq!(value["organizerDisplayName"], json!("Alice"));
        assert_eq!(value["organizerUserId"], json!("alice"));
        assert_eq!(value["startDate"], json!(null));
        assert_eq!(value["maxAttendees"], json!(0));
    }

    #[test]
    fn session_requires_name_type_and_conference() {
        let mut form = SessionForm::default();
        assert_eq!(
            form.to_create().unwrap_err().to_string(),
            "Session 'name' field required"
        );

        form.name = Some("Ownership".to_string());
        assert_eq!(
            form.to_create().unwrap_err().to_string(),
            "Session 'typeOfSession' field required"
        );

        form.type_of_session = Some("Lecture".to_string());
        assert_eq!(
            form.to_create().unwrap_err().to_string(),
            "Session 'confWebsafeKey' field required"
        );

        form.conf_websafe_key = Some("abc".to_string());
        form.start_time = Some("09:15".to_string());
        let (key, input) = form.to_create().unwrap();
        assert_eq!(key, "abc");
        assert_eq!(input.start_time, NaiveTime::from_hms_opt(9, 15, 0));
    }

    #[test]
    fn session_form_speaker_keys_wire_name() {
        let form: SessionForm = serde_json::from_value(json!({
            "name": "Ownership",
            "speakerWebSafeKeys": ["a", "b"]
        }))
        .unwrap();
        assert_eq!(form.speaker_web_safe_keys, vec!["a", "b"]);

        let value = serde_json::to_value(&form).unwrap();
        assert_eq!(value["speakerWebSafeKeys"], json!(["a", "b"]));
        assert!(value.get("confWebsafeKey").is_some());
    }

    #[test]
    fn duration_bounds() {
        let form = SessionQueryDurationForm::default();
        assert_eq!(form.min(), 0);
        assert_eq!(form.max(), None);

        let form = SessionQueryDurationForm {
            min_duration: Some(30),
            max_duration: Some(0),
        };
        assert_eq!(form.min(), 30);
        assert_eq!(form.max(), None);
    }

    #[test]
    fn speaker_name_is_required() {
        let err = SpeakerForm::default().to_create().unwrap_err();
        assert_eq!(err.to_string(), "Speaker 'name' field required");
    }

    #[test]
    fn profile_mini_form_reads_enum_name() {
        let form: ProfileMiniForm =
            serde_json::from_value(json!({"teeShirtSize": "XL_W"})).unwrap();
        assert_eq!(form.tee_shirt_size, Some(TeeShirtSize::XlW));
        assert!(form.display_name.is_none());
    }

    #[test]
    fn query_forms_default_to_no_filters() {
        let forms: ConferenceQueryForms = serde_json::from_value(json!({})).unwrap();
        assert!(forms.filters.is_empty());
    }
}
