//! End-to-end conference flow against PostgreSQL and Redis.
//!
//! Run with `DATABASE_URL` (and optionally `REDIS_URL`) pointing at
//! disposable services: `cargo test -- --ignored`.

#![allow(clippy::unwrap_used, clippy::expect_used)]

mod common;

use axum::http::{Method, StatusCode};
use serde_json::json;

use common::{TEST_CRON_KEY, TestApp, api, body_json};
use confcentral_kernel::tasks::{CronResult, Task, TaskWorker};
use confcentral_test_utils::{forms, test_user};

/// Unique suffix so repeated runs do not collide.
fn unique(prefix: &str) -> String {
    format!("{prefix}-{}", chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default())
}

#[tokio::test]
#[ignore = "requires PostgreSQL and Redis"]
async fn organizer_creates_and_updates_conference() {
    let app = TestApp::live().await;
    let organizer = test_user(&unique("organizer")).with_name("Olga");
    let other = test_user(&unique("other"));

    let response = app
        .send(
            Method::POST,
            &api("/conference"),
            Some(&organizer),
            Some(forms::conference("Flow Conf")),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let created = body_json(response).await;
    assert_eq!(created["seatsAvailable"], 100);
    assert_eq!(created["month"], 6);
    assert_eq!(created["organizerDisplayName"], "Olga");
    let key = created["websafeKey"].as_str().unwrap().to_string();

    // Not the owner
    let response = app
        .send(
            Method::PUT,
            &api(&format!("/conference/{key}")),
            Some(&other),
            Some(json!({ "city": "Paris" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .send(
            Method::PUT,
            &api(&format!("/conference/{key}")),
            Some(&organizer),
            Some(json!({ "city": "Paris", "startDate": "2026-09-01" })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let updated = body_json(response).await;
    assert_eq!(updated["city"], "Paris");
    assert_eq!(updated["month"], 9);
    assert_eq!(updated["name"], "Flow Conf");

    let response = app
        .send(Method::POST, &api("/getConferencesCreated"), Some(&organizer), None)
        .await;
    let created_list = body_json(response).await;
    assert_eq!(created_list["items"].as_array().unwrap().len(), 1);
}

#[tokio::test]
#[ignore = "requires PostgreSQL and Redis"]
async fn registration_counts_seats() {
    let app = TestApp::live().await;
    let organizer = test_user(&unique("organizer"));
    let attendee = test_user(&unique("attendee"));

    let mut body = forms::conference("Tiny Conf");
    body["maxAttendees"] = json!(1);
    let response = app
        .send(Method::POST, &api("/conference"), Some(&organizer), Some(body))
        .await;
    let key = body_json(response).await["websafeKey"]
        .as_str()
        .unwrap()
        .to_string();
    let path = api(&format!("/conference/{key}"));

    let response = app.send(Method::POST, &path, Some(&attendee), None).await;
    assert_eq!(body_json(response).await["data"], true);

    // Already registered
    let response = app.send(Method::POST, &path, Some(&attendee), None).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    // Sold out
    let response = app.send(Method::POST, &path, Some(&organizer), None).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(
        body_json(response).await["error"],
        "There are no seats available."
    );

    let response = app
        .send(Method::GET, &api("/conferences/attending"), Some(&attendee), None)
        .await;
    assert_eq!(body_json(response).await["items"][0]["seatsAvailable"], 0);

    let response = app.send(Method::DELETE, &path, Some(&attendee), None).await;
    assert_eq!(body_json(response).await["data"], true);
    let response = app.send(Method::DELETE, &path, Some(&attendee), None).await;
    assert_eq!(body_json(response).await["data"], false);
}

#[tokio::test]
#[ignore = "requires PostgreSQL and Redis"]
async fn sessions_speakers_and_wishlist() {
    let app = TestApp::live().await;
    let organizer = test_user(&unique("organizer"));

    let response = app
        .send(
            Method::POST,
            &api("/conference"),
            Some(&organizer),
            Some(forms::conference("Session Conf")),
        )
        .await;
    let conf_key = body_json(response).await["websafeKey"]
        .as_str()
        .unwrap()
        .to_string();

    let organization = unique("org");
    let response = app
        .send(
            Method::POST,
            &api("/speaker"),
            Some(&organizer),
            Some(forms::speaker("Ada", &organization)),
        )
        .await;
    let speaker_key = body_json(response).await["websafeKey"]
        .as_str()
        .unwrap()
        .to_string();

    let mut session_keys = Vec::new();
    for name in ["Engines", "Looms"] {
        let response = app
            .send(
                Method::POST,
                &api("/session"),
                Some(&organizer),
                Some(forms::session(name, &conf_key, &[speaker_key.as_str()])),
            )
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        let session = body_json(response).await;
        assert_eq!(session["startTime"], "10:00");
        session_keys.push(session["websafeKey"].as_str().unwrap().to_string());
    }

    let response = app
        .send(
            Method::GET,
            &api(&format!("/speaker/{speaker_key}/sessions")),
            None,
            None,
        )
        .await;
    assert_eq!(body_json(response).await["items"].as_array().unwrap().len(), 2);

    let response = app
        .send(
            Method::GET,
            &api(&format!("/getSpeakersByOrganization?organization={organization}")),
            None,
            None,
        )
        .await;
    assert_eq!(body_json(response).await["items"][0]["name"], "Ada");

    let wishlist = api(&format!("/session/{}/wishlist", session_keys[0]));
    let response = app.send(Method::PUT, &wishlist, Some(&organizer), None).await;
    assert_eq!(body_json(response).await["data"], true);
    let response = app.send(Method::PUT, &wishlist, Some(&organizer), None).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = app
        .send(Method::GET, &api("/sessions/wishlist"), Some(&organizer), None)
        .await;
    assert_eq!(body_json(response).await["items"][0]["name"], "Engines");

    // Run the featured speaker task directly instead of racing a worker
    let worker = TaskWorker::new(
        app.state.queue().clone(),
        app.state.cache().clone(),
        None,
    );
    worker
        .handle(Task::SetFeaturedSpeaker {
            speaker_name: "Ada".to_string(),
            session_names: "Engines, Looms".to_string(),
        })
        .await
        .unwrap();

    let response = app
        .send(Method::GET, &api("/getFeaturedSpeaker"), None, None)
        .await;
    assert_eq!(
        body_json(response).await["data"],
        "The Featured Speaker is Ada, who is giving the following sessions: Engines, Looms."
    );
}

#[tokio::test]
#[ignore = "requires PostgreSQL and Redis"]
async fn cron_refreshes_announcement() {
    let app = TestApp::live().await;
    let organizer = test_user(&unique("organizer"));

    let mut body = forms::conference(&unique("Almost Full"));
    body["maxAttendees"] = json!(3);
    app.send(Method::POST, &api("/conference"), Some(&organizer), Some(body))
        .await;

    match app.state.cron().run().await {
        CronResult::Completed { .. } | CronResult::Skipped => {}
        CronResult::Failed(e) => panic!("cron failed: {e}"),
    }

    let response = app
        .send(Method::POST, &format!("/cron/{TEST_CRON_KEY}"), None, None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .send(Method::GET, &api("/conference/announcement/get"), None, None)
        .await;
    let data = body_json(response).await["data"].as_str().unwrap().to_string();
    assert!(data.starts_with("Last chance to attend!"));
}
