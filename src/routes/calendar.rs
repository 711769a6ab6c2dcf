// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Google Calendar authorization and event routes.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::CalendarEvent;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Redirect,
    routing::{get, post},
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Calendar routes (require authentication via JWT).
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/calendar/authorize", post(authorize))
        .route("/calendar/events", get(list_events).post(create_event))
        .route(
            "/calendar/events/{id}",
            axum::routing::put(update_event).delete(delete_event),
        )
}

/// Public callback route; Google redirects here, no session attached.
pub fn callback_routes() -> Router<Arc<AppState>> {
    Router::new().route("/calendar/callback", get(callback))
}

// ─── Authorization ───────────────────────────────────────────

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct AuthUrlResponse {
    pub success: bool,
    #[serde(rename = "authUrl")]
    pub auth_url: String,
}

/// Produce the provider consent URL for the calling user.
async fn authorize(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<AuthUrlResponse>> {
    let auth_url = state.calendar_service.authorization_url(&user.user_id)?;

    tracing::info!(user_id = %user.user_id, "Starting calendar authorization");

    Ok(Json(AuthUrlResponse {
        success: true,
        auth_url,
    }))
}

#[derive(Deserialize)]
pub struct CallbackParams {
    code: Option<String>,
    state: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// OAuth callback - exchange code for tokens, store credential, redirect.
///
/// Always redirects to the frontend; errors land on the error page rather
/// than returning a JSON body to the browser.
async fn callback(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CallbackParams>,
) -> Redirect {
    let error_page = format!("{}/calendar/error", state.config.frontend_url);
    let success_page = format!("{}/calendar/success", state.config.frontend_url);

    if let Some(error) = params.error {
        tracing::warn!(error = %error, "OAuth error from Google");
        return Redirect::temporary(&error_page);
    }

    let (code, oauth_state) = match (params.code, params.state) {
        (Some(code), Some(state)) => (code, state),
        _ => {
            tracing::warn!("Calendar callback missing code or state");
            return Redirect::temporary(&error_page);
        }
    };

    match state
        .calendar_service
        .complete_authorization(&code, &oauth_state)
        .await
    {
        Ok(user_id) => {
            tracing::info!(user_id = %user_id, "Calendar authorization stored");
            Redirect::temporary(&success_page)
        }
        Err(e) => {
            tracing::warn!(error = %e, "Calendar authorization failed");
            Redirect::temporary(&error_page)
        }
    }
}

// ─── Events ──────────────────────────────────────────────────

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventsQuery {
    start_date: Option<String>,
    end_date: Option<String>,
    limit: Option<u32>,
}

#[derive(Serialize)]
pub struct EventsResponse {
    pub events: Vec<CalendarEvent>,
}

/// List upcoming events from the user's primary calendar.
async fn list_events(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<EventsQuery>,
) -> Result<Json<EventsResponse>> {
    let events = state
        .calendar_service
        .list_events(
            &user.user_id,
            params.start_date.as_deref(),
            params.end_date.as_deref(),
            params.limit,
        )
        .await?;

    Ok(Json(EventsResponse { events }))
}

#[derive(Deserialize)]
struct EventRequest {
    summary: String,
    description: Option<String>,
    start: String,
    end: String,
}

impl EventRequest {
    fn validate(&self) -> Result<()> {
        if self.summary.trim().is_empty()
            || self.start.trim().is_empty()
            || self.end.trim().is_empty()
        {
            return Err(AppError::InvalidInput(
                "Summary, start, and end are required".to_string(),
            ));
        }
        Ok(())
    }
}

/// Create a standalone event on the user's calendar.
async fn create_event(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<EventRequest>,
) -> Result<(StatusCode, Json<CalendarEvent>)> {
    body.validate()?;

    let event = state
        .calendar_service
        .create_event(
            &user.user_id,
            &body.summary,
            body.description.as_deref(),
            &body.start,
            &body.end,
        )
        .await?;

    Ok((StatusCode::CREATED, Json(event)))
}

/// Replace an event's content.
async fn update_event(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(event_id): Path<String>,
    Json(body): Json<EventRequest>,
) -> Result<Json<CalendarEvent>> {
    body.validate()?;

    let event = state
        .calendar_service
        .update_event(
            &user.user_id,
            &event_id,
            &body.summary,
            body.description.as_deref(),
            &body.start,
            &body.end,
        )
        .await?;

    Ok(Json(event))
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct DeleteEventResponse {
    pub success: bool,
    pub message: String,
}

/// Delete an event from the user's calendar.
async fn delete_event(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(event_id): Path<String>,
) -> Result<Json<DeleteEventResponse>> {
    state
        .calendar_service
        .delete_event(&user.user_id, &event_id)
        .await?;

    Ok(Json(DeleteEventResponse {
        success: true,
        message: "Event deleted successfully".to_string(),
    }))
}
