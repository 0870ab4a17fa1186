//! HTTP API tests that never reach PostgreSQL or Redis.
//!
//! Each request fails during authentication, validation, filter compilation
//! or key decoding, all of which happen before storage is touched.

#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use serde_json::json;

use common::{TEST_CRON_KEY, TestApp, api, body_json};
use confcentral_kernel::models::EntityKey;
use confcentral_test_utils::{TEST_JWT_SECRET, assert, forms, mint_token, test_user};

#[tokio::test]
async fn create_conference_requires_auth() {
    let app = TestApp::offline();

    let response = app
        .send(
            Method::POST,
            &api("/conference"),
            None,
            Some(forms::conference("RustConf")),
        )
        .await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert::error_message(&body_json(response).await, "Authorization required");
}

#[tokio::test]
async fn garbage_token_is_rejected() {
    let app = TestApp::offline();

    let request = Request::builder()
        .method(Method::GET)
        .uri(api("/profile"))
        .header(header::AUTHORIZATION, "Bearer not.a.token")
        .body(Body::empty())
        .unwrap();
    let response = app.request(request).await;

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.headers().contains_key(header::WWW_AUTHENTICATE));
    assert::error_message(&body_json(response).await, "Invalid token");
}

#[tokio::test]
async fn foreign_and_expired_tokens_are_rejected() {
    let app = TestApp::offline();
    let user = test_user("alice");

    for token in [
        mint_token(TEST_JWT_SECRET, "someone-else", &user, 3600),
        mint_token(TEST_JWT_SECRET, "confcentral", &user, -3600),
        mint_token("another-secret-that-is-long-enough!!", "confcentral", &user, 3600),
    ] {
        let request = Request::builder()
            .uri(api("/profile"))
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap();

        let response = app.request(request).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}

#[tokio::test]
async fn conference_name_is_required() {
    let app = TestApp::offline();
    let user = test_user("alice");

    let response = app
        .send(
            Method::POST,
            &api("/conference"),
            Some(&user),
            Some(json!({ "city": "London" })),
        )
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert::error_message(
        &body_json(response).await,
        "Conference 'name' field required",
    );
}

#[tokio::test]
async fn malformed_conference_date_is_400() {
    let app = TestApp::offline();
    let user = test_user("alice");

    let response = app
        .send(
            Method::POST,
            &api("/conference"),
            Some(&user),
            Some(json!({ "name": "RustConf", "startDate": "June 14th" })),
        )
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert::contains(body["error"].as_str().unwrap(), "startDate");
}

#[tokio::test]
async fn unknown_filter_field_is_400() {
    let app = TestApp::offline();

    let response = app
        .send(
            Method::POST,
            &api("/queryConferences"),
            None,
            Some(forms::query(&[("COUNTRY", "EQ", "France")])),
        )
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert::contains(body["error"].as_str().unwrap(), "COUNTRY");
}

#[tokio::test]
async fn unknown_filter_operator_is_400() {
    let app = TestApp::offline();

    let response = app
        .send(
            Method::POST,
            &api("/queryConferences"),
            None,
            Some(forms::query(&[("CITY", "LIKE", "Lon")])),
        )
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert::contains(body["error"].as_str().unwrap(), "LIKE");
}

#[tokio::test]
async fn two_inequality_fields_are_400() {
    let app = TestApp::offline();

    let response = app
        .send(
            Method::POST,
            &api("/queryConferences"),
            None,
            Some(forms::query(&[
                ("MAX_ATTENDEES", "GT", "10"),
                ("MONTH", "LT", "6"),
            ])),
        )
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert::contains(body["error"].as_str().unwrap(), "Inequality filter");
}

#[tokio::test]
async fn non_numeric_month_is_400() {
    let app = TestApp::offline();

    let response = app
        .send(
            Method::POST,
            &api("/queryConferences"),
            None,
            Some(forms::query(&[("MONTH", "EQ", "June")])),
        )
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn corrupt_conference_key_is_400() {
    let app = TestApp::offline();

    let response = app
        .send(Method::GET, &api("/conference/not-a-key"), None, None)
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert::error_message(
        &body_json(response).await,
        "Bad or corrupt conference websafe key: not-a-key",
    );
}

#[tokio::test]
async fn key_of_the_wrong_kind_is_400() {
    let app = TestApp::offline();
    let user = test_user("alice");
    let session_key = EntityKey::session("alice", 1, 2).to_websafe();

    // Registering with a session key
    let response = app
        .send(
            Method::POST,
            &api(&format!("/conference/{session_key}")),
            Some(&user),
            None,
        )
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert::contains(
        body_json(response).await["error"].as_str().unwrap(),
        "Bad or corrupt conference websafe key",
    );
}

#[tokio::test]
async fn corrupt_wishlist_key_is_400() {
    let app = TestApp::offline();
    let user = test_user("alice");

    let response = app
        .send(
            Method::DELETE,
            &api("/session/garbage/wishlist"),
            Some(&user),
            None,
        )
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn session_fields_are_required() {
    let app = TestApp::offline();
    let user = test_user("alice");

    let response = app
        .send(
            Method::POST,
            &api("/session"),
            Some(&user),
            Some(json!({ "name": "Ownership" })),
        )
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert::error_message(
        &body_json(response).await,
        "Session 'typeOfSession' field required",
    );
}

#[tokio::test]
async fn speaker_name_is_required() {
    let app = TestApp::offline();
    let user = test_user("alice");

    let response = app
        .send(
            Method::POST,
            &api("/speaker"),
            Some(&user),
            Some(json!({ "organization": "Mozilla" })),
        )
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert::error_message(&body_json(response).await, "Speaker 'name' field required");
}

#[tokio::test]
async fn speakers_by_organization_needs_organization() {
    let app = TestApp::offline();

    let response = app
        .send(Method::GET, &api("/getSpeakersByOrganization"), None, None)
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert::error_message(
        &body_json(response).await,
        "Speaker 'organization' query parameter required",
    );
}

#[tokio::test]
async fn cron_rejects_wrong_key() {
    let app = TestApp::offline();
    assert_ne!(TEST_CRON_KEY, "wrong");

    let response = app.send(Method::POST, "/cron/wrong", None, None).await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let body = body_json(response).await;
    assert_eq!(body["status"], "error");
}

#[tokio::test]
async fn unknown_route_is_404() {
    let app = TestApp::offline();

    let response = app.send(Method::GET, &api("/nope"), None, None).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
