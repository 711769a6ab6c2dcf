// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Monthly quota enforcement tests (require the Firestore emulator).

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use gigpitch::models::SubscriptionTier;
use tower::ServiceExt;

mod common;

fn generate_body() -> String {
    serde_json::json!({
        "skills": ["Go", "API design"],
        "gigDetails": {
            "projectType": "Backend API",
            "budget": 500,
            "timeline": "1_2_weeks",
            "platform": "upwork"
        }
    })
    .to_string()
}

async fn post_generate(app: &axum::Router, token: &str) -> StatusCode {
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/pitches/generate")
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(generate_body()))
                .unwrap(),
        )
        .await
        .unwrap();
    response.status()
}

#[tokio::test]
async fn test_free_tier_sixth_pitch_rejected() {
    require_emulator!();

    let (app, state) = common::create_emulator_app().await;
    let user_id = format!("quota-free-{}", uuid::Uuid::new_v4());
    common::seed_user(&state.db, &user_id, SubscriptionTier::Free).await;

    let token = common::create_test_jwt(&user_id, &state.config.jwt_signing_key);

    for i in 0..5 {
        let status = post_generate(&app, &token).await;
        assert_eq!(status, StatusCode::CREATED, "create #{} should succeed", i + 1);
    }

    let status = post_generate(&app, &token).await;
    assert_eq!(status, StatusCode::PAYMENT_REQUIRED, "6th create must hit the quota");
}

#[tokio::test]
async fn test_pro_tier_is_unlimited() {
    require_emulator!();

    let (app, state) = common::create_emulator_app().await;
    let user_id = format!("quota-pro-{}", uuid::Uuid::new_v4());
    common::seed_user(&state.db, &user_id, SubscriptionTier::Pro).await;

    let token = common::create_test_jwt(&user_id, &state.config.jwt_signing_key);

    for i in 0..6 {
        let status = post_generate(&app, &token).await;
        assert_eq!(status, StatusCode::CREATED, "create #{} should succeed", i + 1);
    }
}

#[tokio::test]
async fn test_previous_month_pitches_do_not_count() {
    require_emulator!();

    let (app, state) = common::create_emulator_app().await;
    let user_id = format!("quota-rollover-{}", uuid::Uuid::new_v4());
    common::seed_user(&state.db, &user_id, SubscriptionTier::Free).await;

    // Five pitches from an earlier billing period
    for _ in 0..5 {
        let pitch = common::sample_pitch(&user_id, "2020-01-15T12:00:00Z");
        common::seed_pitch(&state.db, &pitch).await;
    }

    let token = common::create_test_jwt(&user_id, &state.config.jwt_signing_key);

    // The current month starts at zero, so this create succeeds
    let status = post_generate(&app, &token).await;
    assert_eq!(status, StatusCode::CREATED);
}
