// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data models shared between storage and the API.

pub mod calendar;
pub mod pitch;
pub mod user;

pub use calendar::{CalendarCredential, CalendarEvent};
pub use pitch::{GigDetails, Pitch, PitchStatus};
pub use user::{Subscription, SubscriptionTier, TierFeatures, User};
