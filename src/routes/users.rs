// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User profile and subscription routes.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{Subscription, SubscriptionTier, TierFeatures, User};
use crate::time_utils::format_utc_rfc3339;
use crate::AppState;
use axum::{extract::State, routing::get, Extension, Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// User routes (require authentication via JWT).
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/users/profile", get(get_profile).put(update_profile))
        .route(
            "/users/subscription",
            get(get_subscription).put(update_subscription),
        )
}

// ─── Profile ─────────────────────────────────────────────────

#[derive(Serialize)]
pub struct ProfileResponse {
    pub uid: String,
    #[serde(flatten)]
    pub user: User,
}

/// Get the caller's profile.
async fn get_profile(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<ProfileResponse>> {
    let profile = state
        .db
        .get_user(&user.user_id)
        .await?
        .ok_or_else(|| AppError::UserNotFound(user.user_id.clone()))?;

    Ok(Json(ProfileResponse {
        uid: user.user_id,
        user: profile,
    }))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdateProfileRequest {
    display_name: String,
    skills: Option<Vec<String>>,
    preferences: Option<serde_json::Value>,
}

#[derive(Serialize)]
pub struct UpdateProfileResponse {
    pub success: bool,
    pub user: ProfileResponse,
}

/// Update the caller's profile.
async fn update_profile(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<UpdateProfileRequest>,
) -> Result<Json<UpdateProfileResponse>> {
    if body.display_name.trim().is_empty() {
        return Err(AppError::InvalidInput(
            "Display name is required".to_string(),
        ));
    }

    let mut profile = state
        .db
        .get_user(&user.user_id)
        .await?
        .ok_or_else(|| AppError::UserNotFound(user.user_id.clone()))?;

    profile.display_name = body.display_name;
    profile.skills = body.skills.unwrap_or_default();
    profile.preferences = body
        .preferences
        .unwrap_or_else(|| serde_json::json!({}));
    profile.updated_at = format_utc_rfc3339(chrono::Utc::now());

    state.db.upsert_user(&user.user_id, &profile).await?;

    Ok(Json(UpdateProfileResponse {
        success: true,
        user: ProfileResponse {
            uid: user.user_id,
            user: profile,
        },
    }))
}

// ─── Subscription ────────────────────────────────────────────

#[derive(Serialize)]
pub struct SubscriptionResponse {
    #[serde(flatten)]
    pub subscription: Subscription,
    pub features: TierFeatures,
}

/// Get the caller's subscription, defaulting to free when none is recorded.
async fn get_subscription(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<SubscriptionResponse>> {
    let profile = state
        .db
        .get_user(&user.user_id)
        .await?
        .ok_or_else(|| AppError::UserNotFound(user.user_id.clone()))?;

    let subscription = profile
        .subscription
        .unwrap_or_else(|| default_subscription(SubscriptionTier::Free));

    let features = subscription.tier.features();

    Ok(Json(SubscriptionResponse {
        subscription,
        features,
    }))
}

#[derive(Deserialize)]
struct UpdateSubscriptionRequest {
    tier: SubscriptionTier,
}

#[derive(Serialize)]
pub struct UpdateSubscriptionResponse {
    pub success: bool,
    pub subscription: SubscriptionResponse,
}

/// Change the caller's tier. The feature set follows from the tier alone.
async fn update_subscription(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<UpdateSubscriptionRequest>,
) -> Result<Json<UpdateSubscriptionResponse>> {
    let mut profile = state
        .db
        .get_user(&user.user_id)
        .await?
        .ok_or_else(|| AppError::UserNotFound(user.user_id.clone()))?;

    let subscription = default_subscription(body.tier);
    profile.subscription = Some(subscription.clone());
    profile.updated_at = format_utc_rfc3339(chrono::Utc::now());

    state.db.upsert_user(&user.user_id, &profile).await?;

    tracing::info!(user_id = %user.user_id, tier = ?body.tier, "Subscription updated");

    let features = subscription.tier.features();

    Ok(Json(UpdateSubscriptionResponse {
        success: true,
        subscription: SubscriptionResponse {
            subscription,
            features,
        },
    }))
}

/// A fresh 30-day subscription window starting now.
fn default_subscription(tier: SubscriptionTier) -> Subscription {
    let now = chrono::Utc::now();
    Subscription {
        tier,
        start_date: format_utc_rfc3339(now),
        end_date: format_utc_rfc3339(now + chrono::Duration::days(30)),
    }
}
