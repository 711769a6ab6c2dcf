// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Pitch lifecycle coordinator.
//!
//! Owns the draft → approved → scheduled state machine:
//! 1. Create: quota check, text generation, transactional insert
//! 2. Update: ownership-checked partial update (status overwrite allowed)
//! 3. Schedule: remote event creation + conditional local update
//! 4. Delete: ownership-checked hard delete
//!
//! External failures leave the pitch in its prior, consistent state; no
//! partial record is ever persisted.

use crate::db::FirestoreDb;
use crate::error::{AppError, Result};
use crate::models::{CalendarEvent, GigDetails, Pitch, PitchStatus};
use crate::services::{CalendarService, DraftingService, QuotaLedger};
use crate::time_utils::{format_utc_rfc3339, start_of_month};
use chrono::{DateTime, Duration, Utc};

/// Coordinates pitch state transitions and the services they touch.
#[derive(Clone)]
pub struct PitchService {
    db: FirestoreDb,
    drafting: DraftingService,
    quota: QuotaLedger,
    calendar: CalendarService,
}

impl PitchService {
    pub fn new(
        db: FirestoreDb,
        drafting: DraftingService,
        quota: QuotaLedger,
        calendar: CalendarService,
    ) -> Self {
        Self {
            db,
            drafting,
            quota,
            calendar,
        }
    }

    // ─── Create ──────────────────────────────────────────────────

    /// Generate and persist a new draft pitch.
    pub async fn create(
        &self,
        user_id: &str,
        skills: Vec<String>,
        gig_details: GigDetails,
    ) -> Result<Pitch> {
        validate_create(&skills, &gig_details)?;

        let user = self
            .db
            .get_user(user_id)
            .await?
            .ok_or_else(|| AppError::UserNotFound(user_id.to_string()))?;

        let tier = user.tier();
        let now = Utc::now();

        if !self.quota.can_create(user_id, tier, now).await? {
            return Err(AppError::QuotaExceeded);
        }

        // Generation happens before any write; a drafting failure persists nothing
        let generated_pitch = self.drafting.generate_pitch(&skills, &gig_details).await?;

        let timestamp = format_utc_rfc3339(now);
        let pitch = Pitch {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            created_at: timestamp.clone(),
            updated_at: timestamp,
            skills,
            gig_details,
            generated_pitch,
            edited_pitch: String::new(),
            status: PitchStatus::Draft,
            calendar_event_id: None,
        };

        // The insert re-validates the count transactionally; concurrent
        // creates cannot push a free-tier user past the limit.
        let month_start = format_utc_rfc3339(start_of_month(now));
        self.db
            .create_pitch_quota_checked(&pitch, QuotaLedger::monthly_limit(tier), &month_start)
            .await?;

        Ok(pitch)
    }

    // ─── Read ────────────────────────────────────────────────────

    /// List the caller's pitches, newest first.
    ///
    /// Returns the page plus the total count of matching records.
    pub async fn list(
        &self,
        user_id: &str,
        status: Option<PitchStatus>,
        limit: usize,
        offset: usize,
    ) -> Result<(Vec<Pitch>, usize)> {
        let all = self.db.get_pitches_for_user(user_id, status).await?;
        let total = all.len();

        let page = all.into_iter().skip(offset).take(limit).collect();

        Ok((page, total))
    }

    /// Get a single pitch, enforcing ownership.
    pub async fn get(&self, pitch_id: &str, caller_id: &str) -> Result<Pitch> {
        let pitch = self
            .db
            .get_pitch(pitch_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Pitch {}", pitch_id)))?;

        if pitch.user_id != caller_id {
            return Err(AppError::Forbidden(
                "Pitch belongs to another user".to_string(),
            ));
        }

        Ok(pitch)
    }

    // ─── Update ──────────────────────────────────────────────────

    /// Apply a partial update to a pitch.
    ///
    /// Only the supplied fields change. Status may be overwritten freely
    /// here; only the schedule flow attaches a calendar event.
    pub async fn update(
        &self,
        pitch_id: &str,
        caller_id: &str,
        edited_pitch: Option<String>,
        status: Option<PitchStatus>,
    ) -> Result<Pitch> {
        // Ownership check before any write
        self.get(pitch_id, caller_id).await?;

        self.db
            .update_pitch_fields(pitch_id, edited_pitch, status, Utc::now())
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Pitch {}", pitch_id)))
    }

    // ─── Schedule ────────────────────────────────────────────────

    /// Schedule a pitch as a calendar reminder.
    ///
    /// Creates the remote event first, then records the scheduled state
    /// conditionally: if a concurrent schedule already attached an event,
    /// the freshly created remote event is removed again and the call
    /// fails with `AlreadyScheduled`. Two remote events are never left
    /// behind for one pitch.
    pub async fn schedule(
        &self,
        pitch_id: &str,
        caller_id: &str,
        title: &str,
        description: Option<&str>,
        scheduled_date: &str,
        duration_minutes: i64,
    ) -> Result<(Pitch, CalendarEvent)> {
        let pitch = self.get(pitch_id, caller_id).await?;

        if title.trim().is_empty() {
            return Err(AppError::InvalidInput("Title is required".to_string()));
        }
        if duration_minutes <= 0 {
            return Err(AppError::InvalidInput(
                "Duration must be positive".to_string(),
            ));
        }
        let start = parse_instant(scheduled_date)?;
        let end = start + Duration::minutes(duration_minutes);

        if pitch.calendar_event_id.is_some() {
            return Err(AppError::AlreadyScheduled(pitch_id.to_string()));
        }

        let description = match description {
            Some(text) if !text.trim().is_empty() => text.to_string(),
            _ => pitch.effective_pitch().to_string(),
        };

        // Remote create happens before the local write; a gateway failure
        // leaves the pitch unmodified.
        let event = self
            .calendar
            .create_event(
                caller_id,
                title,
                Some(&description),
                &format_utc_rfc3339(start),
                &format_utc_rfc3339(end),
            )
            .await?;

        let event_id = event
            .id
            .clone()
            .ok_or_else(|| AppError::CalendarApi("Provider returned no event id".to_string()))?;

        match self
            .db
            .set_pitch_scheduled_if_unscheduled(pitch_id, &event_id, Utc::now())
            .await?
        {
            Some(updated) => Ok((updated, event)),
            None => {
                // Lost the race: another request scheduled this pitch while
                // our remote create was in flight. Remove our event so only
                // the winner's remains.
                if let Err(e) = self.calendar.delete_event(caller_id, &event_id).await {
                    tracing::warn!(
                        pitch_id,
                        event_id = %event_id,
                        error = %e,
                        "Failed to clean up duplicate calendar event"
                    );
                }
                Err(AppError::AlreadyScheduled(pitch_id.to_string()))
            }
        }
    }

    // ─── Delete ──────────────────────────────────────────────────

    /// Hard-delete a pitch.
    ///
    /// Any associated remote calendar event is intentionally left in place;
    /// the provider owns that record and the user can remove it there.
    pub async fn delete(&self, pitch_id: &str, caller_id: &str) -> Result<()> {
        self.get(pitch_id, caller_id).await?;
        self.db.delete_pitch(pitch_id).await?;

        tracing::info!(pitch_id, user_id = caller_id, "Pitch deleted");

        Ok(())
    }
}

/// Validate the creation request fields.
fn validate_create(skills: &[String], gig_details: &GigDetails) -> Result<()> {
    if skills.is_empty() || skills.iter().any(|s| s.trim().is_empty()) {
        return Err(AppError::InvalidInput("Skills are required".to_string()));
    }

    if gig_details.project_type.trim().is_empty() {
        return Err(AppError::InvalidInput(
            "Project type is required".to_string(),
        ));
    }

    if gig_details.budget <= 0.0 {
        return Err(AppError::InvalidInput(
            "Budget must be positive".to_string(),
        ));
    }

    Ok(())
}

fn parse_instant(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| AppError::InvalidInput(format!("'{}' is not an RFC3339 timestamp", raw)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gig() -> GigDetails {
        GigDetails {
            project_type: "Backend API".to_string(),
            budget: 500.0,
            timeline: "1_2_weeks".to_string(),
            platform: "upwork".to_string(),
            additional_info: None,
        }
    }

    #[test]
    fn test_validate_create_accepts_valid_input() {
        let skills = vec!["Go".to_string(), "API design".to_string()];
        assert!(validate_create(&skills, &gig()).is_ok());
    }

    #[test]
    fn test_validate_create_rejects_empty_skills() {
        let err = validate_create(&[], &gig()).unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[test]
    fn test_validate_create_rejects_blank_skill_entries() {
        let skills = vec!["Go".to_string(), "   ".to_string()];
        let err = validate_create(&skills, &gig()).unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[test]
    fn test_validate_create_rejects_missing_project_type() {
        let mut details = gig();
        details.project_type = String::new();
        let err = validate_create(&["Rust".to_string()], &details).unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[test]
    fn test_validate_create_rejects_zero_budget() {
        let mut details = gig();
        details.budget = 0.0;
        let err = validate_create(&["Rust".to_string()], &details).unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[test]
    fn test_parse_instant() {
        let ts = parse_instant("2026-08-07T10:00:00Z").unwrap();
        assert_eq!(format_utc_rfc3339(ts), "2026-08-07T10:00:00Z");
        assert!(parse_instant("tomorrow").is_err());
    }
}
