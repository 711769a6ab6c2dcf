//! Database layer (Firestore).

pub mod firestore;

pub use firestore::FirestoreDb;

/// Collection names as constants.
pub mod collections {
    pub const USERS: &str = "users";
    pub const PITCHES: &str = "pitches";
    /// Calendar OAuth credentials (keyed by user id)
    pub const CALENDAR_TOKENS: &str = "calendar_tokens";
}
