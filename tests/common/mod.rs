// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use gigpitch::config::Config;
use gigpitch::db::FirestoreDb;
use gigpitch::routes::create_router;
use gigpitch::services::{
    CalendarService, DraftingService, GoogleCalendarClient, PitchService, QuotaLedger, TokenVault,
};
use gigpitch::AppState;
use std::sync::Arc;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Create a mock database connection (offline).
#[allow(dead_code)]
pub fn test_db_offline() -> FirestoreDb {
    FirestoreDb::new_mock()
}

/// Build app state over the given database with offline collaborators
/// (mock drafting, no calendar credentials).
#[allow(dead_code)]
pub fn build_test_state(db: FirestoreDb) -> Arc<AppState> {
    let config = Config::default();

    let vault = TokenVault::new(db.clone());
    let refresh_locks = Arc::new(dashmap::DashMap::new());

    let calendar_client = GoogleCalendarClient::new(
        config.google_client_id.clone(),
        config.google_client_secret.clone(),
        config.google_redirect_uri.clone(),
    );
    let calendar_service = CalendarService::new(
        calendar_client,
        vault,
        config.oauth_state_key.clone(),
        refresh_locks,
    );

    let drafting_service = DraftingService::new_mock();
    let quota_ledger = QuotaLedger::new(db.clone());

    let pitch_service = PitchService::new(
        db.clone(),
        drafting_service,
        quota_ledger,
        calendar_service.clone(),
    );

    Arc::new(AppState {
        config,
        db,
        calendar_service,
        pitch_service,
    })
}

/// Create a test app with offline mock dependencies.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    let state = build_test_state(test_db_offline());
    (create_router(state.clone()), state)
}

/// Create a test app backed by the Firestore emulator.
#[allow(dead_code)]
pub async fn create_emulator_app() -> (axum::Router, Arc<AppState>) {
    let state = build_test_state(test_db().await);
    (create_router(state.clone()), state)
}

/// Create a JWT token for test requests (mirrors middleware/auth.rs logic).
#[allow(dead_code)]
pub fn create_test_jwt(user_id: &str, signing_key: &[u8]) -> String {
    gigpitch::middleware::auth::create_jwt(user_id, signing_key).expect("Failed to create JWT")
}

/// Seed a user profile with the given tier.
#[allow(dead_code)]
pub async fn seed_user(db: &FirestoreDb, user_id: &str, tier: gigpitch::models::SubscriptionTier) {
    use gigpitch::models::{Subscription, User};

    let now = "2026-01-01T00:00:00Z".to_string();
    let user = User {
        display_name: format!("Test {}", user_id),
        email: None,
        skills: vec![],
        preferences: serde_json::json!({}),
        subscription: Some(Subscription {
            tier,
            start_date: now.clone(),
            end_date: "2099-01-01T00:00:00Z".to_string(),
        }),
        created_at: now.clone(),
        updated_at: now,
    };

    db.upsert_user(user_id, &user)
        .await
        .expect("Failed to seed user");
}

/// Seed a pitch document directly (bypassing generation and quota).
#[allow(dead_code)]
pub async fn seed_pitch(db: &FirestoreDb, pitch: &gigpitch::models::Pitch) {
    db.create_pitch_quota_checked(pitch, None, "1970-01-01T00:00:00Z")
        .await
        .expect("Failed to seed pitch");
}

/// A draft pitch owned by `user_id` with the given creation timestamp.
#[allow(dead_code)]
pub fn sample_pitch(user_id: &str, created_at: &str) -> gigpitch::models::Pitch {
    use gigpitch::models::{GigDetails, Pitch, PitchStatus};

    Pitch {
        id: uuid::Uuid::new_v4().to_string(),
        user_id: user_id.to_string(),
        created_at: created_at.to_string(),
        updated_at: created_at.to_string(),
        skills: vec!["Go".to_string(), "API design".to_string()],
        gig_details: GigDetails {
            project_type: "Backend API".to_string(),
            budget: 500.0,
            timeline: "1_2_weeks".to_string(),
            platform: "upwork".to_string(),
            additional_info: None,
        },
        generated_pitch: "Seeded pitch text".to_string(),
        edited_pitch: String::new(),
        status: PitchStatus::Draft,
        calendar_event_id: None,
    }
}
