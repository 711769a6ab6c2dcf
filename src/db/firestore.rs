// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Users (profile + subscription storage)
//! - Calendar tokens (OAuth credentials, read through the Token Vault)
//! - Pitches (lifecycle records, with transactional writes for the
//!   quota-checked insert and the schedule-once update)

use crate::db::collections;
use crate::error::AppError;
use crate::models::{CalendarCredential, Pitch, PitchStatus, User};
use crate::time_utils::format_utc_rfc3339;

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        // If the emulator environment variable is set, use unauthenticated connection
        // to avoid local credential warnings and leakage.
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        // Use ExternalJwtFunctionSource to provide a dummy token without needing
        // a custom TokenSource implementation struct.
        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    /// Helper to get the client or return an error if offline.
    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    // ─── User Operations ─────────────────────────────────────────

    /// Get a user profile by id.
    pub async fn get_user(&self, user_id: &str) -> Result<Option<User>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::USERS)
            .obj()
            .one(user_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create or update a user profile.
    pub async fn upsert_user(&self, user_id: &str, user: &User) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::USERS)
            .document_id(user_id)
            .object(user)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    // ─── Calendar Token Operations ───────────────────────────────

    /// Get the stored calendar credential for a user.
    pub async fn get_calendar_credential(
        &self,
        user_id: &str,
    ) -> Result<Option<CalendarCredential>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::CALENDAR_TOKENS)
            .obj()
            .one(user_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Store a calendar credential for a user (last write wins).
    pub async fn set_calendar_credential(
        &self,
        user_id: &str,
        credential: &CalendarCredential,
    ) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::CALENDAR_TOKENS)
            .document_id(user_id)
            .object(credential)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Delete a calendar credential (for deauthorization).
    pub async fn delete_calendar_credential(&self, user_id: &str) -> Result<(), AppError> {
        self.get_client()?
            .fluent()
            .delete()
            .from(collections::CALENDAR_TOKENS)
            .document_id(user_id)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    // ─── Pitch Operations ────────────────────────────────────────

    /// Get a pitch by id.
    pub async fn get_pitch(&self, pitch_id: &str) -> Result<Option<Pitch>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::PITCHES)
            .obj()
            .one(pitch_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get all pitches for a user, newest first, optionally filtered by status.
    ///
    /// Returns the full matching set; pagination is applied in memory by the
    /// caller so the reported total stays exact.
    pub async fn get_pitches_for_user(
        &self,
        user_id: &str,
        status: Option<PitchStatus>,
    ) -> Result<Vec<Pitch>, AppError> {
        let user_id = user_id.to_string();
        let query = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::PITCHES);

        let query = if let Some(status) = status {
            query.filter(move |q| {
                q.for_all([
                    q.field("userId").eq(user_id.clone()),
                    q.field("status").eq(status.as_str()),
                ])
            })
        } else {
            query.filter(move |q| q.field("userId").eq(user_id.clone()))
        };

        query
            .order_by([("createdAt", firestore::FirestoreQueryDirection::Descending)])
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Count pitches a user created at or after `since` (ISO 8601).
    pub async fn count_pitches_since(&self, user_id: &str, since: &str) -> Result<u32, AppError> {
        let user_id = user_id.to_string();
        let since = since.to_string();
        let pitches: Vec<Pitch> = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::PITCHES)
            .filter(move |q| {
                q.for_all([
                    q.field("userId").eq(user_id.clone()),
                    q.field("createdAt").greater_than_or_equal(since.clone()),
                ])
            })
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(pitches.len() as u32)
    }

    /// Persist a new pitch, re-validating the monthly quota inside a
    /// transaction.
    ///
    /// The count query runs between `begin_transaction` and `commit`, and the
    /// insert is part of the same transaction, so two concurrent creates
    /// cannot both observe `count < limit` and commit: Firestore aborts the
    /// conflicting commit and the quota is never exceeded.
    ///
    /// `monthly_limit = None` means unlimited (no count performed).
    pub async fn create_pitch_quota_checked(
        &self,
        pitch: &Pitch,
        monthly_limit: Option<u32>,
        month_start: &str,
    ) -> Result<(), AppError> {
        let client = self.get_client()?;

        let mut transaction = client
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        if let Some(limit) = monthly_limit {
            let count = self.count_pitches_since(&pitch.user_id, month_start).await?;
            if count >= limit {
                let _ = transaction.rollback().await;
                return Err(AppError::QuotaExceeded);
            }
        }

        client
            .fluent()
            .update()
            .in_col(collections::PITCHES)
            .document_id(&pitch.id)
            .object(pitch)
            .add_to_transaction(&mut transaction)
            .map_err(|e| AppError::Database(format!("Failed to add pitch to transaction: {}", e)))?;

        transaction
            .commit()
            .await
            .map_err(|e| AppError::Database(format!("Transaction commit failed: {}", e)))?;

        tracing::info!(
            user_id = %pitch.user_id,
            pitch_id = %pitch.id,
            "Pitch created"
        );

        Ok(())
    }

    /// Apply a partial update to a pitch inside a transaction.
    ///
    /// The read and write share one transaction so concurrent updates to the
    /// same pitch serialize instead of losing writes. Returns the updated
    /// pitch, or `None` if the pitch does not exist.
    pub async fn update_pitch_fields(
        &self,
        pitch_id: &str,
        edited_pitch: Option<String>,
        status: Option<PitchStatus>,
        now: chrono::DateTime<chrono::Utc>,
    ) -> Result<Option<Pitch>, AppError> {
        let client = self.get_client()?;

        let mut transaction = client
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        let pitch: Option<Pitch> = client
            .fluent()
            .select()
            .by_id_in(collections::PITCHES)
            .obj()
            .one(pitch_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to read pitch in transaction: {}", e)))?;

        let mut pitch = match pitch {
            Some(p) => p,
            None => {
                let _ = transaction.rollback().await;
                return Ok(None);
            }
        };

        if let Some(edited) = edited_pitch {
            pitch.edited_pitch = edited;
        }
        if let Some(status) = status {
            pitch.status = status;
        }
        pitch.updated_at = format_utc_rfc3339(now);

        client
            .fluent()
            .update()
            .in_col(collections::PITCHES)
            .document_id(pitch_id)
            .object(&pitch)
            .add_to_transaction(&mut transaction)
            .map_err(|e| AppError::Database(format!("Failed to add update to transaction: {}", e)))?;

        transaction
            .commit()
            .await
            .map_err(|e| AppError::Database(format!("Transaction commit failed: {}", e)))?;

        Ok(Some(pitch))
    }

    /// Mark a pitch scheduled, recording the remote event id, unless another
    /// request already scheduled it.
    ///
    /// Returns the updated pitch, or `None` if a concurrent schedule won
    /// (the pitch already carries a calendar event id). The caller is
    /// responsible for cleaning up the remote event it created when `None`
    /// comes back, so a double schedule never leaves two remote events.
    pub async fn set_pitch_scheduled_if_unscheduled(
        &self,
        pitch_id: &str,
        calendar_event_id: &str,
        now: chrono::DateTime<chrono::Utc>,
    ) -> Result<Option<Pitch>, AppError> {
        let client = self.get_client()?;

        let mut transaction = client
            .begin_transaction()
            .await
            .map_err(|e| AppError::Database(format!("Failed to begin transaction: {}", e)))?;

        let pitch: Option<Pitch> = client
            .fluent()
            .select()
            .by_id_in(collections::PITCHES)
            .obj()
            .one(pitch_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to read pitch in transaction: {}", e)))?;

        let mut pitch = match pitch {
            Some(p) => p,
            None => {
                let _ = transaction.rollback().await;
                return Err(AppError::NotFound(format!("Pitch {}", pitch_id)));
            }
        };

        if pitch.calendar_event_id.is_some() {
            tracing::debug!(pitch_id, "Pitch already scheduled, skipping write");
            let _ = transaction.rollback().await;
            return Ok(None);
        }

        pitch.status = PitchStatus::Scheduled;
        pitch.calendar_event_id = Some(calendar_event_id.to_string());
        pitch.updated_at = format_utc_rfc3339(now);

        client
            .fluent()
            .update()
            .in_col(collections::PITCHES)
            .document_id(pitch_id)
            .object(&pitch)
            .add_to_transaction(&mut transaction)
            .map_err(|e| {
                AppError::Database(format!("Failed to add schedule to transaction: {}", e))
            })?;

        transaction
            .commit()
            .await
            .map_err(|e| AppError::Database(format!("Transaction commit failed: {}", e)))?;

        tracing::info!(pitch_id, calendar_event_id, "Pitch scheduled");

        Ok(Some(pitch))
    }

    /// Hard-delete a pitch.
    pub async fn delete_pitch(&self, pitch_id: &str) -> Result<(), AppError> {
        self.get_client()?
            .fluent()
            .delete()
            .from(collections::PITCHES)
            .document_id(pitch_id)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}
