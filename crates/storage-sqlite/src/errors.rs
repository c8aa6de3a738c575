//! Storage-level error mapping into the core taxonomy.

use thiserror::Error;

use turnstile_core::{DatabaseError, Error};

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database query failed: {0}")]
    Diesel(#[from] diesel::result::Error),

    #[error("Connection pool failure: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("Connection failed: {0}")]
    Connection(#[from] diesel::result::ConnectionError),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Writer thread unavailable: {0}")]
    Writer(String),
}

impl From<StorageError> for Error {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Diesel(e) => Error::Database(DatabaseError::Query(e.to_string())),
            StorageError::Pool(e) => Error::Database(DatabaseError::Pool(e.to_string())),
            StorageError::Connection(e) => Error::Database(DatabaseError::Pool(e.to_string())),
            StorageError::Migration(msg) => Error::Database(DatabaseError::Internal(msg)),
            StorageError::Writer(msg) => Error::Database(DatabaseError::Write(msg)),
        }
    }
}
