// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Pitch routes for authenticated users.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{CalendarEvent, GigDetails, Pitch, PitchStatus};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

const MAX_PAGE_SIZE: usize = 100;

/// Pitch routes (require authentication via JWT).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/pitches/generate", post(generate_pitch))
        .route("/pitches", get(list_pitches))
        .route(
            "/pitches/{id}",
            get(get_pitch).put(update_pitch).delete(delete_pitch),
        )
        .route("/pitches/{id}/schedule", post(schedule_pitch))
}

// ─── Generate ────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeneratePitchRequest {
    skills: Vec<String>,
    gig_details: GigDetails,
}

/// Generate a new draft pitch.
async fn generate_pitch(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<GeneratePitchRequest>,
) -> Result<(StatusCode, Json<Pitch>)> {
    tracing::debug!(
        user_id = %user.user_id,
        skills = body.skills.len(),
        project_type = %body.gig_details.project_type,
        "Generating pitch"
    );

    let pitch = state
        .pitch_service
        .create(&user.user_id, body.skills, body.gig_details)
        .await?;

    Ok((StatusCode::CREATED, Json(pitch)))
}

// ─── List ────────────────────────────────────────────────────

#[derive(Deserialize)]
struct PitchesQuery {
    /// Filter by lifecycle status
    status: Option<PitchStatus>,
    /// Pagination: items per page
    #[serde(default = "default_limit")]
    limit: usize,
    /// Pagination: items to skip
    #[serde(default)]
    offset: usize,
}

fn default_limit() -> usize {
    20
}

#[derive(Serialize)]
pub struct PitchListResponse {
    pub pitches: Vec<Pitch>,
    pub total: usize,
    pub limit: usize,
    pub offset: usize,
}

/// List the caller's pitches, newest first.
async fn list_pitches(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<PitchesQuery>,
) -> Result<Json<PitchListResponse>> {
    let limit = params.limit.min(MAX_PAGE_SIZE);

    let (pitches, total) = state
        .pitch_service
        .list(&user.user_id, params.status, limit, params.offset)
        .await?;

    Ok(Json(PitchListResponse {
        pitches,
        total,
        limit,
        offset: params.offset,
    }))
}

// ─── Get ─────────────────────────────────────────────────────

/// Get a single pitch by id.
async fn get_pitch(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(pitch_id): Path<String>,
) -> Result<Json<Pitch>> {
    let pitch = state.pitch_service.get(&pitch_id, &user.user_id).await?;
    Ok(Json(pitch))
}

// ─── Update ──────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdatePitchRequest {
    edited_pitch: Option<String>,
    status: Option<PitchStatus>,
}

/// Apply a partial update to a pitch.
async fn update_pitch(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(pitch_id): Path<String>,
    Json(body): Json<UpdatePitchRequest>,
) -> Result<Json<Pitch>> {
    let pitch = state
        .pitch_service
        .update(&pitch_id, &user.user_id, body.edited_pitch, body.status)
        .await?;

    Ok(Json(pitch))
}

// ─── Delete ──────────────────────────────────────────────────

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct DeletePitchResponse {
    pub success: bool,
    pub message: String,
}

/// Delete a pitch. Any linked calendar event is left on the provider side.
async fn delete_pitch(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(pitch_id): Path<String>,
) -> Result<Json<DeletePitchResponse>> {
    state.pitch_service.delete(&pitch_id, &user.user_id).await?;

    Ok(Json(DeletePitchResponse {
        success: true,
        message: "Pitch deleted successfully".to_string(),
    }))
}

// ─── Schedule ────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SchedulePitchRequest {
    scheduled_date: String,
    /// Duration in minutes
    duration: i64,
    title: String,
    description: Option<String>,
}

#[derive(Serialize)]
pub struct SchedulePitchResponse {
    pub success: bool,
    pub pitch: Pitch,
    #[serde(rename = "calendarEvent")]
    pub calendar_event: CalendarEvent,
}

/// Schedule a pitch as a calendar reminder.
async fn schedule_pitch(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(pitch_id): Path<String>,
    Json(body): Json<SchedulePitchRequest>,
) -> Result<Json<SchedulePitchResponse>> {
    if body.scheduled_date.trim().is_empty() {
        return Err(AppError::InvalidInput(
            "Scheduled date, duration, and title are required".to_string(),
        ));
    }

    let (pitch, calendar_event) = state
        .pitch_service
        .schedule(
            &pitch_id,
            &user.user_id,
            &body.title,
            body.description.as_deref(),
            &body.scheduled_date,
            body.duration,
        )
        .await?;

    Ok(Json(SchedulePitchResponse {
        success: true,
        pitch,
        calendar_event,
    }))
}
