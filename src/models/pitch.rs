// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Pitch model for storage and API.

use serde::{Deserialize, Serialize};

/// Lifecycle status of a pitch.
///
/// The normal progression is draft → approved → scheduled. `scheduled` is
/// only reached through the schedule flow, which also records the remote
/// calendar event id. Generic updates may overwrite the status freely
/// (matching the permissive update contract).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PitchStatus {
    Draft,
    Approved,
    Scheduled,
}

impl PitchStatus {
    /// Lowercase name as stored in Firestore and used in query filters.
    pub fn as_str(self) -> &'static str {
        match self {
            PitchStatus::Draft => "draft",
            PitchStatus::Approved => "approved",
            PitchStatus::Scheduled => "scheduled",
        }
    }
}

/// Details of the gig a pitch is drafted for.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GigDetails {
    /// Project type, e.g. "Backend API"
    pub project_type: String,
    /// Budget in dollars; must be positive at creation
    pub budget: f64,
    /// Timeline category, e.g. "1_2_weeks"
    pub timeline: String,
    /// Target platform, e.g. "upwork"
    pub platform: String,
    /// Optional free-text notes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_info: Option<String>,
}

/// Stored pitch record in Firestore.
///
/// Serialized camelCase, both in storage and on the wire.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pitch {
    /// Pitch ID (UUID, also used as document ID)
    pub id: String,
    /// Owning user ID (immutable)
    pub user_id: String,
    /// Creation timestamp (ISO 8601)
    pub created_at: String,
    /// Last update timestamp (ISO 8601)
    pub updated_at: String,
    /// Skills the pitch is built around, in the order the user gave them
    pub skills: Vec<String>,
    /// Gig details the pitch was generated for
    pub gig_details: GigDetails,
    /// Text produced by the drafting service
    pub generated_pitch: String,
    /// User-edited text; empty means "keep generated"
    pub edited_pitch: String,
    /// Lifecycle status
    pub status: PitchStatus,
    /// Remote calendar event id; present iff status is `scheduled`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub calendar_event_id: Option<String>,
}

impl Pitch {
    /// The text shown to the user: edited if non-empty, else generated.
    pub fn effective_pitch(&self) -> &str {
        if self.edited_pitch.is_empty() {
            &self.generated_pitch
        } else {
            &self.edited_pitch
        }
    }
}
