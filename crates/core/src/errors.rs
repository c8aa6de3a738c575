//! Error taxonomy shared across the turnstile crates.

use thiserror::Error;

/// Result type alias used throughout the core.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Badge or check-in input rejected; user-correctable, never retried.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Sync transport or central-store failure; retried wholesale next cycle.
    #[error(transparent)]
    Sync(#[from] SyncError),

    /// Local persistence failure; fatal to the current operation.
    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Scan validation failures, one per pipeline stage, each with its own
/// user-facing message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Outdated badge: this badge uses an old format and must be reprinted")]
    OutdatedBadge,

    #[error("Wrong sprint: this badge is for {0}")]
    WrongSprint(String),

    #[error("Access denied: attendee not found in system")]
    AttendeeNotFound,

    #[error("Access denied: {0} is not on the guest list for this event")]
    NotInvited(String),
}

#[derive(Debug, Error)]
pub enum SyncError {
    /// Network-level failure before a response was received.
    #[error("Sync transport error: {0}")]
    Transport(String),

    /// Error response from the central store.
    #[error("Sync API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// A sync cycle for this event is already in flight on this device.
    #[error("Sync already in progress for event {0}")]
    CycleInProgress(i32),
}

impl SyncError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Connection pool error: {0}")]
    Pool(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Write failed: {0}")]
    Write(String),

    #[error("{0}")]
    Internal(String),
}
