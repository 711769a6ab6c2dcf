// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Scheduling and edit flow tests (require the Firestore emulator).

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use gigpitch::models::{PitchStatus, SubscriptionTier};
use tower::ServiceExt;

mod common;

async fn send(
    app: &axum::Router,
    method: &str,
    uri: &str,
    token: &str,
    body: Option<serde_json::Value>,
) -> (StatusCode, serde_json::Value) {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token));

    let body = match body {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = app
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, json)
}

fn schedule_body() -> serde_json::Value {
    serde_json::json!({
        "scheduledDate": "2026-08-10T10:00:00Z",
        "duration": 30,
        "title": "Send pitch"
    })
}

#[tokio::test]
async fn test_schedule_without_authorization_leaves_pitch_untouched() {
    require_emulator!();

    let (app, state) = common::create_emulator_app().await;
    let user_id = format!("sched-noauth-{}", uuid::Uuid::new_v4());
    common::seed_user(&state.db, &user_id, SubscriptionTier::Free).await;

    let pitch = common::sample_pitch(&user_id, "2026-08-01T10:00:00Z");
    common::seed_pitch(&state.db, &pitch).await;

    let token = common::create_test_jwt(&user_id, &state.config.jwt_signing_key);

    // No calendar credential was ever stored for this user
    let (status, body) = send(
        &app,
        "POST",
        &format!("/pitches/{}/schedule", pitch.id),
        &token,
        Some(schedule_body()),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "calendar/not-authorized");

    // The pitch is unchanged: still a draft, no event reference
    let stored = state.db.get_pitch(&pitch.id).await.unwrap().unwrap();
    assert_eq!(stored.status, PitchStatus::Draft);
    assert!(stored.calendar_event_id.is_none());
}

#[tokio::test]
async fn test_schedule_twice_is_rejected_deterministically() {
    require_emulator!();

    let (app, state) = common::create_emulator_app().await;
    let user_id = format!("sched-twice-{}", uuid::Uuid::new_v4());
    common::seed_user(&state.db, &user_id, SubscriptionTier::Free).await;

    // A pitch that already went through the schedule flow
    let mut pitch = common::sample_pitch(&user_id, "2026-08-01T10:00:00Z");
    pitch.status = PitchStatus::Scheduled;
    pitch.calendar_event_id = Some("existing-event".to_string());
    common::seed_pitch(&state.db, &pitch).await;

    let token = common::create_test_jwt(&user_id, &state.config.jwt_signing_key);

    let (status, body) = send(
        &app,
        "POST",
        &format!("/pitches/{}/schedule", pitch.id),
        &token,
        Some(schedule_body()),
    )
    .await;

    // Rejected before any provider call; the existing event is untouched
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "pitch/already-scheduled");

    let stored = state.db.get_pitch(&pitch.id).await.unwrap().unwrap();
    assert_eq!(stored.calendar_event_id.as_deref(), Some("existing-event"));
}

#[tokio::test]
async fn test_schedule_validates_arguments_before_provider_call() {
    require_emulator!();

    let (app, state) = common::create_emulator_app().await;
    let user_id = format!("sched-valid-{}", uuid::Uuid::new_v4());
    common::seed_user(&state.db, &user_id, SubscriptionTier::Free).await;

    let pitch = common::sample_pitch(&user_id, "2026-08-01T10:00:00Z");
    common::seed_pitch(&state.db, &pitch).await;

    let token = common::create_test_jwt(&user_id, &state.config.jwt_signing_key);
    let uri = format!("/pitches/{}/schedule", pitch.id);

    let mut blank_title = schedule_body();
    blank_title["title"] = serde_json::json!("  ");
    let (status, _) = send(&app, "POST", &uri, &token, Some(blank_title)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let mut zero_duration = schedule_body();
    zero_duration["duration"] = serde_json::json!(0);
    let (status, _) = send(&app, "POST", &uri, &token, Some(zero_duration)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let mut bad_date = schedule_body();
    bad_date["scheduledDate"] = serde_json::json!("tomorrow at ten");
    let (status, _) = send(&app, "POST", &uri, &token, Some(bad_date)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_edit_round_trip_controls_effective_text() {
    require_emulator!();

    let (app, state) = common::create_emulator_app().await;
    let user_id = format!("edit-{}", uuid::Uuid::new_v4());
    common::seed_user(&state.db, &user_id, SubscriptionTier::Free).await;

    let pitch = common::sample_pitch(&user_id, "2026-08-01T10:00:00Z");
    common::seed_pitch(&state.db, &pitch).await;

    let token = common::create_test_jwt(&user_id, &state.config.jwt_signing_key);
    let uri = format!("/pitches/{}", pitch.id);

    // Edit the text
    let (status, body) = send(
        &app,
        "PUT",
        &uri,
        &token,
        Some(serde_json::json!({ "editedPitch": "My rewritten pitch" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["editedPitch"], "My rewritten pitch");
    assert_eq!(body["generatedPitch"], "Seeded pitch text");

    let stored = state.db.get_pitch(&pitch.id).await.unwrap().unwrap();
    assert_eq!(stored.effective_pitch(), "My rewritten pitch");

    // Clearing the edit restores the generated text as effective
    let (status, _) = send(
        &app,
        "PUT",
        &uri,
        &token,
        Some(serde_json::json!({ "editedPitch": "" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let stored = state.db.get_pitch(&pitch.id).await.unwrap().unwrap();
    assert_eq!(stored.effective_pitch(), "Seeded pitch text");
}

#[tokio::test]
async fn test_update_allows_free_status_overwrite() {
    require_emulator!();

    let (app, state) = common::create_emulator_app().await;
    let user_id = format!("status-{}", uuid::Uuid::new_v4());
    common::seed_user(&state.db, &user_id, SubscriptionTier::Free).await;

    let pitch = common::sample_pitch(&user_id, "2026-08-01T10:00:00Z");
    common::seed_pitch(&state.db, &pitch).await;

    let token = common::create_test_jwt(&user_id, &state.config.jwt_signing_key);
    let uri = format!("/pitches/{}", pitch.id);

    // The generic update endpoint accepts any status value, including ones
    // the schedule flow would normally gate
    let (status, body) = send(
        &app,
        "PUT",
        &uri,
        &token,
        Some(serde_json::json!({ "status": "approved" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "approved");

    // Unknown status strings are rejected at deserialization
    let (status, _) = send(
        &app,
        "PUT",
        &uri,
        &token,
        Some(serde_json::json!({ "status": "archived" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}
