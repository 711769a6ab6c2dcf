//! User model for storage and API.

use serde::{Deserialize, Serialize};

/// Subscription tier controlling the monthly pitch allowance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionTier {
    Free,
    Pro,
    Premium,
}

impl Default for SubscriptionTier {
    fn default() -> Self {
        SubscriptionTier::Free
    }
}

/// Feature set derived from a tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TierFeatures {
    /// Monthly pitch allowance; `None` means unlimited
    pub pitches_per_month: Option<u32>,
    pub analytics: bool,
    pub multi_platform: bool,
}

impl SubscriptionTier {
    /// Feature set for this tier. Total over all tiers, so a lookup can
    /// never yield an undefined entry.
    pub fn features(self) -> TierFeatures {
        match self {
            SubscriptionTier::Free => TierFeatures {
                pitches_per_month: Some(5),
                analytics: false,
                multi_platform: false,
            },
            SubscriptionTier::Pro => TierFeatures {
                pitches_per_month: None,
                analytics: true,
                multi_platform: false,
            },
            SubscriptionTier::Premium => TierFeatures {
                pitches_per_month: None,
                analytics: true,
                multi_platform: true,
            },
        }
    }
}

/// User's subscription as stored in their profile document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub tier: SubscriptionTier,
    /// When this tier took effect (ISO 8601)
    pub start_date: String,
    /// When this tier lapses (ISO 8601)
    pub end_date: String,
}

/// User profile stored in Firestore.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Display name
    pub display_name: String,
    /// Email address (may be None if not shared)
    pub email: Option<String>,
    /// Skills listed on the profile
    #[serde(default)]
    pub skills: Vec<String>,
    /// Free-form UI preferences
    #[serde(default)]
    pub preferences: serde_json::Value,
    /// Current subscription; older documents may lack one entirely
    #[serde(default)]
    pub subscription: Option<Subscription>,
    /// When the user registered (ISO 8601)
    pub created_at: String,
    /// Last profile update (ISO 8601)
    pub updated_at: String,
}

impl User {
    /// Effective tier: free when no subscription is recorded.
    pub fn tier(&self) -> SubscriptionTier {
        self.subscription
            .as_ref()
            .map(|s| s.tier)
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_free_tier_features() {
        let features = SubscriptionTier::Free.features();
        assert_eq!(features.pitches_per_month, Some(5));
        assert!(!features.analytics);
        assert!(!features.multi_platform);
    }

    #[test]
    fn test_paid_tiers_are_unlimited() {
        assert_eq!(SubscriptionTier::Pro.features().pitches_per_month, None);
        assert_eq!(SubscriptionTier::Premium.features().pitches_per_month, None);
        assert!(SubscriptionTier::Premium.features().multi_platform);
        assert!(!SubscriptionTier::Pro.features().multi_platform);
    }

    #[test]
    fn test_missing_subscription_defaults_to_free() {
        let user: User = serde_json::from_str(
            r#"{
                "displayName": "Ada",
                "email": null,
                "createdAt": "2026-01-01T00:00:00Z",
                "updatedAt": "2026-01-01T00:00:00Z"
            }"#,
        )
        .unwrap();
        assert_eq!(user.tier(), SubscriptionTier::Free);
        assert!(user.skills.is_empty());
    }

    #[test]
    fn test_tier_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&SubscriptionTier::Premium).unwrap(),
            "\"premium\""
        );
        let parsed: SubscriptionTier = serde_json::from_str("\"free\"").unwrap();
        assert_eq!(parsed, SubscriptionTier::Free);
    }
}
