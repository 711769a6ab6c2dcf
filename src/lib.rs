// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! GigPitch: AI-drafted freelance pitches with calendar scheduling
//!
//! This crate provides the backend API for generating pitch drafts,
//! enforcing per-tier monthly quotas, and mirroring scheduled pitches
//! into Google Calendar.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::FirestoreDb;
use services::{CalendarService, PitchService};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: FirestoreDb,
    pub calendar_service: CalendarService,
    pub pitch_service: PitchService,
}
