//! Network-related error types.

use crate::traits::HttpError;

/// Network-specific error variants.
///
/// These errors represent issues reaching the backend at all, as opposed
/// to [`super::BackendError`] which covers responses the backend did send.
#[derive(Debug, Clone)]
pub enum NetworkError {
    /// Connection to the server failed.
    ConnectionFailed { message: String },

    /// Request timed out.
    Timeout {
        operation: String,
        duration_secs: u64,
    },

    /// The client is known to be offline.
    Offline,

    /// Request was cancelled.
    Cancelled,

    /// Generic network error.
    Other { message: String },
}

impl NetworkError {
    /// Check if this error is likely transient and can be retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            NetworkError::ConnectionFailed { .. } => true,
            NetworkError::Timeout { .. } => true,
            NetworkError::Offline => true,
            NetworkError::Cancelled => false,
            NetworkError::Other { .. } => false,
        }
    }

    /// Get a user-friendly error message.
    pub fn user_message(&self) -> String {
        match self {
            NetworkError::ConnectionFailed { .. } => {
                "Unable to connect to the server. Please check your internet connection."
                    .to_string()
            }
            NetworkError::Timeout { operation, .. } => {
                format!(
                    "The {} operation timed out. The server may be slow or unreachable.",
                    operation
                )
            }
            NetworkError::Offline => {
                "You are offline. Changes will be saved and synced when you reconnect."
                    .to_string()
            }
            NetworkError::Cancelled => "The request was cancelled.".to_string(),
            NetworkError::Other { .. } => {
                "An unexpected network error occurred. Please try again later.".to_string()
            }
        }
    }

    /// Classify a transport-level [`HttpError`] into a network error.
    ///
    /// Status errors are not network errors and should be mapped by the
    /// backend layer instead; here they fall into `Other`.
    pub fn from_http(err: &HttpError, operation: &str) -> Self {
        match err {
            HttpError::ConnectionFailed(msg) => NetworkError::ConnectionFailed {
                message: msg.clone(),
            },
            HttpError::Timeout(_) => NetworkError::Timeout {
                operation: operation.to_string(),
                duration_secs: 30,
            },
            HttpError::Cancelled => NetworkError::Cancelled,
            other => NetworkError::Other {
                message: other.to_string(),
            },
        }
    }
}

impl std::fmt::Display for NetworkError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NetworkError::ConnectionFailed { message } => {
                write!(f, "Connection failed: {}", message)
            }
            NetworkError::Timeout {
                operation,
                duration_secs,
            } => write!(f, "{} timed out after {}s", operation, duration_secs),
            NetworkError::Offline => write!(f, "Offline"),
            NetworkError::Cancelled => write!(f, "Request cancelled"),
            NetworkError::Other { message } => write!(f, "Network error: {}", message),
        }
    }
}

impl std::error::Error for NetworkError {}
