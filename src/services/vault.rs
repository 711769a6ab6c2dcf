// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Token vault: per-user storage of calendar OAuth credentials.
//!
//! Backed by the `calendar_tokens` Firestore collection, one document per
//! user, last write wins. No expiry-driven eviction happens here; the
//! calendar service checks staleness at use time.

use crate::db::FirestoreDb;
use crate::error::AppError;
use crate::models::CalendarCredential;

/// Durable per-user credential store.
#[derive(Clone)]
pub struct TokenVault {
    db: FirestoreDb,
}

impl TokenVault {
    pub fn new(db: FirestoreDb) -> Self {
        Self { db }
    }

    /// Get the stored credential for a user, or `None` if the user never
    /// completed the authorization handshake.
    pub async fn get(&self, user_id: &str) -> Result<Option<CalendarCredential>, AppError> {
        self.db.get_calendar_credential(user_id).await
    }

    /// Store a credential, replacing any previous one.
    pub async fn put(
        &self,
        user_id: &str,
        credential: &CalendarCredential,
    ) -> Result<(), AppError> {
        self.db.set_calendar_credential(user_id, credential).await
    }

    /// Remove a credential (deauthorization).
    pub async fn delete(&self, user_id: &str) -> Result<(), AppError> {
        self.db.delete_calendar_credential(user_id).await
    }
}
