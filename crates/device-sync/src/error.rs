//! Error types for the central-store API client.

use thiserror::Error;

use turnstile_core::sync::{classify_http_status, SyncRetryClass};

/// Result type alias for API client operations.
pub type Result<T> = std::result::Result<T, DeviceSyncError>;

/// Errors raised while talking to the central store.
#[derive(Debug, Error)]
pub enum DeviceSyncError {
    /// HTTP client error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// API error response from the central store
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Invalid request (missing required data, etc.)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl DeviceSyncError {
    /// Create an API error from status and message
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Create an invalid request error
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    /// HTTP status if this is an API error.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Classify error for retry policy.
    pub fn retry_class(&self) -> SyncRetryClass {
        match self {
            Self::Api { status, .. } => classify_http_status(*status),
            Self::Http(_) => SyncRetryClass::Retryable,
            Self::Json(_) => SyncRetryClass::Permanent,
            Self::InvalidRequest(_) => SyncRetryClass::Permanent,
        }
    }
}

impl From<DeviceSyncError> for turnstile_core::Error {
    fn from(err: DeviceSyncError) -> Self {
        use turnstile_core::SyncError;
        match err {
            DeviceSyncError::Http(e) => SyncError::Transport(e.to_string()).into(),
            DeviceSyncError::Json(e) => turnstile_core::Error::Serialization(e),
            DeviceSyncError::Api { status, message } => SyncError::Api { status, message }.into(),
            DeviceSyncError::InvalidRequest(message) => {
                SyncError::Api {
                    status: 400,
                    message,
                }
                .into()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_errors_are_retryable() {
        let err = DeviceSyncError::api(503, "maintenance");
        assert_eq!(err.retry_class(), SyncRetryClass::Retryable);
    }

    #[test]
    fn client_errors_are_permanent() {
        let err = DeviceSyncError::api(400, "missing event_id");
        assert_eq!(err.retry_class(), SyncRetryClass::Permanent);
    }
}
