//! Conference Central test utilities.
//!
//! Helpers for integration testing: request fixtures, bearer token minting
//! and assertion utilities for JSON responses.

use serde::Serialize;
use serde_json::{Value as JsonValue, json};

/// Secret shared by tests and the test configuration (at least 32 bytes).
pub const TEST_JWT_SECRET: &str = "confcentral-test-secret-0123456789abcdef";

/// Issuer expected by the test configuration.
pub const TEST_JWT_ISSUER: &str = "confcentral";

/// A test user whose identity ends up in a bearer token.
#[derive(Debug, Clone)]
pub struct TestUser {
    pub user_id: String,
    pub email: String,
    pub name: Option<String>,
}

/// Create a test user with an email derived from the id.
pub fn test_user(user_id: &str) -> TestUser {
    TestUser {
        user_id: user_id.to_string(),
        email: format!("{user_id}@example.com"),
        name: None,
    }
}

impl TestUser {
    /// Set the nickname claim.
    pub fn with_name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    /// Mint a token signed with [`TEST_JWT_SECRET`].
    pub fn token(&self) -> String {
        mint_token(TEST_JWT_SECRET, TEST_JWT_ISSUER, self, 3600)
    }

    /// `Authorization` header value for this user.
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.token())
    }
}

#[derive(Serialize)]
struct Claims<'a> {
    iss: &'a str,
    sub: &'a str,
    email: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
    iat: i64,
    exp: i64,
}

/// Mint an HS256 token; a negative `lifetime_secs` yields an expired token.
pub fn mint_token(secret: &str, issuer: &str, user: &TestUser, lifetime_secs: i64) -> String {
    let now = chrono::Utc::now().timestamp();
    let claims = Claims {
        iss: issuer,
        sub: &user.user_id,
        email: &user.email,
        name: user.name.as_deref(),
        iat: now,
        exp: now + lifetime_secs,
    };

    jsonwebtoken::encode(
        &jsonwebtoken::Header::new(jsonwebtoken::Algorithm::HS256),
        &claims,
        &jsonwebtoken::EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap_or_default()
}

/// Request body builders.
pub mod forms {
    use super::*;

    /// A conference creation body.
    pub fn conference(name: &str) -> JsonValue {
        json!({
            "name": name,
            "description": "A test conference",
            "topics": ["Rust"],
            "city": "London",
            "startDate": "2026-06-14",
            "endDate": "2026-06-16",
            "maxAttendees": 100
        })
    }

    /// A session creation body.
    pub fn session(name: &str, conf_websafe_key: &str, speaker_keys: &[&str]) -> JsonValue {
        json!({
            "name": name,
            "typeOfSession": "Lecture",
            "confWebsafeKey": conf_websafe_key,
            "speakerWebSafeKeys": speaker_keys,
            "duration": 45,
            "date": "2026-06-14",
            "startTime": "10:00"
        })
    }

    /// A speaker creation body.
    pub fn speaker(name: &str, organization: &str) -> JsonValue {
        json!({
            "name": name,
            "organization": organization
        })
    }

    /// A `queryConferences` body from `(field, operator, value)` triples.
    pub fn query(filters: &[(&str, &str, &str)]) -> JsonValue {
        let filters: Vec<JsonValue> = filters
            .iter()
            .map(|(field, operator, value)| {
                json!({ "field": field, "operator": operator, "value": value })
            })
            .collect();
        json!({ "filters": filters })
    }
}

/// Assertion helpers for JSON content.
pub mod assert {
    use serde_json::Value;

    /// Assert that a JSON value has a specific key.
    pub fn has_key(value: &Value, key: &str) {
        assert!(
            value.get(key).is_some(),
            "Expected JSON to have key '{key}', got: {value}"
        );
    }

    /// Assert that a JSON error body carries the given message.
    pub fn error_message(value: &Value, expected: &str) {
        assert_eq!(
            value["error"].as_str(),
            Some(expected),
            "Unexpected error body: {value}"
        );
    }

    /// Assert that a string contains a substring.
    pub fn contains(haystack: &str, needle: &str) {
        assert!(
            haystack.contains(needle),
            "Expected string to contain '{needle}'\nActual: {haystack}"
        );
    }
}

#[cfg(test)]
// Tests are allowed to use unwrap/expect freely.
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_user_builder() {
        let user = test_user("alice").with_name("Alice");
        assert_eq!(user.email, "alice@example.com");
        assert_eq!(user.name.as_deref(), Some("Alice"));
        assert!(user.bearer().starts_with("Bearer "));
    }

    #[test]
    fn tokens_are_three_part_jwts() {
        let token = test_user("bob").token();
        assert_eq!(token.split('.').count(), 3);
    }

    #[test]
    fn query_builder_shapes_filters() {
        let body = forms::query(&[("CITY", "EQ", "London")]);
        assert_eq!(body["filters"][0]["field"], "CITY");
        assert_eq!(body["filters"][0]["value"], "London");
    }

    #[test]
    fn test_assertions() {
        let json = serde_json::json!({"error": "Authorization required"});
        assert::has_key(&json, "error");
        assert::error_message(&json, "Authorization required");
        assert::contains("hello world", "world");
    }
}
