// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod calendar;
pub mod drafting;
pub mod pitches;
pub mod quota;
pub mod vault;

pub use calendar::{CalendarService, GoogleCalendarClient, RefreshLocks};
pub use drafting::DraftingService;
pub use pitches::PitchService;
pub use quota::QuotaLedger;
pub use vault::TokenVault;
