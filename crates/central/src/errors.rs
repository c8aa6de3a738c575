use thiserror::Error;

use turnstile_core::{DatabaseError, SyncError};

/// Errors internal to the central store.
#[derive(Debug, Error)]
pub enum CentralError {
    #[error("Database query error: {0}")]
    Diesel(#[from] diesel::result::Error),

    #[error("Connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("Database connection error: {0}")]
    Connection(#[from] diesel::result::ConnectionError),

    #[error("Migration error: {0}")]
    Migration(String),

    #[error("Sync clock error: {0}")]
    Clock(String),

    /// A pushed scan references an event or person the store does not know.
    /// Maps to the 400 response of the HTTP surface.
    #[error("Invalid scan: {0}")]
    InvalidScan(String),
}

impl From<CentralError> for turnstile_core::Error {
    fn from(err: CentralError) -> Self {
        match err {
            CentralError::Diesel(e) => DatabaseError::Query(e.to_string()).into(),
            CentralError::Pool(e) => DatabaseError::Pool(e.to_string()).into(),
            CentralError::Connection(e) => DatabaseError::Pool(e.to_string()).into(),
            CentralError::Migration(message) => DatabaseError::Internal(message).into(),
            CentralError::Clock(message) => DatabaseError::Internal(message).into(),
            CentralError::InvalidScan(message) => SyncError::Api {
                status: 400,
                message,
            }
            .into(),
        }
    }
}
