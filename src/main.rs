// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! GigPitch API Server
//!
//! Drafts freelance pitches with AI assistance, enforces per-tier monthly
//! quotas, and schedules approved pitches as Google Calendar reminders.

use gigpitch::{
    config::Config,
    db::FirestoreDb,
    services::{
        CalendarService, DraftingService, GoogleCalendarClient, PitchService, QuotaLedger,
        TokenVault,
    },
    AppState,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize structured JSON logging for GCP
    init_logging();

    // Load configuration from environment
    let config = Config::from_env().expect("Failed to load configuration");
    tracing::info!(port = config.port, "Starting GigPitch API");

    // Initialize Firestore database
    let db = FirestoreDb::new(&config.gcp_project_id)
        .await
        .expect("Failed to connect to Firestore");

    // Token vault holds per-user calendar credentials
    let vault = TokenVault::new(db.clone());

    // Per-user refresh locks are shared across all requests in this instance
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
    tracing::info!("Calendar service initialized");

    let drafting_service = DraftingService::new(config.openai_api_key.clone());
    let quota_ledger = QuotaLedger::new(db.clone());

    let pitch_service = PitchService::new(
        db.clone(),
        drafting_service,
        quota_ledger,
        calendar_service.clone(),
    );

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        db,
        calendar_service,
        pitch_service,
    });

    // Build router
    let app = gigpitch::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("gigpitch=debug".parse().unwrap())
                .add_directive("info".parse().unwrap()),
        )
        .with(format)
        .init();
}
