// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Quota ledger: monthly pitch allowance per subscription tier.
//!
//! Pure check against current records; no side effects. The authoritative
//! re-check happens inside the creation transaction (see
//! `FirestoreDb::create_pitch_quota_checked`), so this precheck can only
//! reject early, never admit past the limit.

use crate::db::FirestoreDb;
use crate::error::AppError;
use crate::models::SubscriptionTier;
use crate::time_utils::{format_utc_rfc3339, start_of_month};
use chrono::{DateTime, Utc};

/// Computes whether a user's tier permits creating another pitch in the
/// billing period containing `now`.
#[derive(Clone)]
pub struct QuotaLedger {
    db: FirestoreDb,
}

impl QuotaLedger {
    pub fn new(db: FirestoreDb) -> Self {
        Self { db }
    }

    /// Monthly pitch limit for a tier; `None` means unlimited.
    pub fn monthly_limit(tier: SubscriptionTier) -> Option<u32> {
        tier.features().pitches_per_month
    }

    /// Whether `user_id` may create another pitch this calendar month.
    ///
    /// A Record Store failure propagates as an error, which denies creation
    /// (fail closed) rather than admitting an uncounted pitch.
    pub async fn can_create(
        &self,
        user_id: &str,
        tier: SubscriptionTier,
        now: DateTime<Utc>,
    ) -> Result<bool, AppError> {
        let limit = match Self::monthly_limit(tier) {
            Some(limit) => limit,
            None => return Ok(true),
        };

        let month_start = format_utc_rfc3339(start_of_month(now));
        let count = self.db.count_pitches_since(user_id, &month_start).await?;

        tracing::debug!(user_id, count, limit, "Quota check");

        Ok(count < limit)
    }
}
