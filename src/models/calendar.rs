// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Calendar credential and event models.

use serde::{Deserialize, Serialize};

/// Google Calendar OAuth credential stored per user.
///
/// Keyed by user id in the `calendar_tokens` collection; last write wins.
/// An expired access token must be refreshed (or the credential treated as
/// absent) before use.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalendarCredential {
    /// OAuth access token
    pub access_token: String,
    /// OAuth refresh token; Google only issues one on the first consent
    pub refresh_token: Option<String>,
    /// When the access token expires (ISO 8601)
    pub expires_at: String,
    /// Granted OAuth scopes
    pub scopes: Vec<String>,
}

/// Calendar event as exposed to the API.
///
/// The remote provider owns the canonical record; pitches hold only a weak
/// back-reference to the event id. Start and end are RFC3339 instants, or
/// bare dates for all-day events (passed through from the provider).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEvent {
    /// Provider-assigned event id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Event title
    pub summary: String,
    /// Event body text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Start time
    pub start: String,
    /// End time
    pub end: String,
    /// Shareable link to the event
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub html_link: Option<String>,
}
