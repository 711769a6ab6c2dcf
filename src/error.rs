// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Invalid request: {0}")]
    InvalidInput(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Calendar event not found: {0}")]
    EventNotFound(String),

    #[error("User not found: {0}")]
    UserNotFound(String),

    #[error("Monthly pitch limit exceeded")]
    QuotaExceeded,

    #[error("Pitch already scheduled: {0}")]
    AlreadyScheduled(String),

    #[error("Pitch generation failed: {0}")]
    GenerationFailed(String),

    #[error("Google Calendar not authorized")]
    CalendarNotAuthorized,

    #[error("Calendar API error: {0}")]
    CalendarApi(String),

    #[error("Invalid OAuth callback: {0}")]
    CallbackInvalid(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Sentinel message for a 401 from the calendar provider, so callers can
    /// distinguish a revoked/expired credential from other provider failures.
    pub const GOOGLE_TOKEN_ERROR: &'static str = "google_token_invalid";

    /// True if this error means the user's Google credential is unusable.
    pub fn is_calendar_token_error(&self) -> bool {
        match self {
            AppError::CalendarApi(msg) => msg.contains(Self::GOOGLE_TOKEN_ERROR),
            AppError::CalendarNotAuthorized => true,
            _ => false,
        }
    }
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    code: String,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "auth/unauthorized"),
            AppError::InvalidToken => (StatusCode::UNAUTHORIZED, "auth/invalid-token"),
            AppError::Forbidden(_) => (StatusCode::FORBIDDEN, "auth/forbidden"),
            AppError::InvalidInput(_) => (StatusCode::BAD_REQUEST, "validation/invalid-input"),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "pitch/not-found"),
            AppError::EventNotFound(_) => (StatusCode::NOT_FOUND, "calendar/event-not-found"),
            AppError::UserNotFound(_) => (StatusCode::NOT_FOUND, "user/not-found"),
            AppError::QuotaExceeded => (StatusCode::PAYMENT_REQUIRED, "pitch/limit-exceeded"),
            AppError::AlreadyScheduled(_) => (StatusCode::CONFLICT, "pitch/already-scheduled"),
            AppError::GenerationFailed(msg) => {
                tracing::error!(error = %msg, "Pitch generation failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "generation/failed")
            }
            AppError::CalendarNotAuthorized => {
                (StatusCode::UNAUTHORIZED, "calendar/not-authorized")
            }
            AppError::CalendarApi(msg) => {
                tracing::error!(error = %msg, "Calendar API error");
                (StatusCode::INTERNAL_SERVER_ERROR, "calendar/api-error")
            }
            AppError::CallbackInvalid(_) => (StatusCode::BAD_REQUEST, "calendar/invalid-callback"),
            AppError::Database(msg) => {
                tracing::error!(error = %msg, "Database error");
                (StatusCode::INTERNAL_SERVER_ERROR, "database/error")
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal/error")
            }
        };

        let body = ErrorResponse {
            code: code.to_string(),
            message: self.to_string(),
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
