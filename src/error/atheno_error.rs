//! Unified error type for the Atheno data layer.

use crate::traits::{HttpError, StorageError};

use super::ai::AiError;
use super::auth::AuthError;
use super::backend::BackendError;
use super::category::ErrorCategory;
use super::network::NetworkError;

/// Unified error type for the Atheno data layer.
///
/// `AthenoError` consolidates all domain-specific error types into a single
/// enum, enabling consistent error handling, uniform categorization and
/// retry logic, and user-friendly error messages.
#[derive(Debug)]
pub enum AthenoError {
    /// Network-related errors (connections, timeouts, offline).
    Network(NetworkError),

    /// Authentication/session errors.
    Auth(AuthError),

    /// Backend (PostgREST) errors.
    Backend(BackendError),

    /// Generative-content errors.
    Ai(AiError),

    /// Local persistence errors.
    Storage(StorageError),
}

impl AthenoError {
    /// Get the category of this error.
    pub fn category(&self) -> ErrorCategory {
        match self {
            AthenoError::Network(_) => ErrorCategory::Network,
            AthenoError::Auth(_) => ErrorCategory::Auth,
            AthenoError::Backend(err) => {
                if err.is_unauthorized() {
                    ErrorCategory::Auth
                } else {
                    match err {
                        BackendError::HttpStatus { status, .. } if *status < 500 => {
                            ErrorCategory::Client
                        }
                        BackendError::InvalidResponse { .. }
                        | BackendError::MissingField { .. } => ErrorCategory::Client,
                        _ => ErrorCategory::Server,
                    }
                }
            }
            AthenoError::Ai(err) => {
                if err.is_retryable() {
                    ErrorCategory::Server
                } else {
                    ErrorCategory::Client
                }
            }
            AthenoError::Storage(_) => ErrorCategory::Storage,
        }
    }

    /// Check if this error is likely transient and can be retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            AthenoError::Network(err) => err.is_retryable(),
            AthenoError::Auth(_) => false,
            AthenoError::Backend(err) => err.is_retryable(),
            AthenoError::Ai(err) => err.is_retryable(),
            AthenoError::Storage(_) => false,
        }
    }

    /// Whether handling this error means forcing the user back through
    /// sign-in (and clearing cached data).
    pub fn requires_reauth(&self) -> bool {
        match self {
            AthenoError::Auth(err) => err.requires_reauth(),
            AthenoError::Backend(err) => err.is_unauthorized(),
            _ => false,
        }
    }

    /// Get a user-friendly error message.
    pub fn user_message(&self) -> String {
        match self {
            AthenoError::Network(err) => err.user_message(),
            AthenoError::Auth(err) => err.user_message(),
            AthenoError::Backend(err) => err.user_message(),
            AthenoError::Ai(err) => err.user_message(),
            AthenoError::Storage(_) => {
                "Local data could not be saved. Please check disk space and permissions."
                    .to_string()
            }
        }
    }
}

impl std::fmt::Display for AthenoError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AthenoError::Network(err) => write!(f, "{}", err),
            AthenoError::Auth(err) => write!(f, "{}", err),
            AthenoError::Backend(err) => write!(f, "{}", err),
            AthenoError::Ai(err) => write!(f, "{}", err),
            AthenoError::Storage(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for AthenoError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AthenoError::Network(err) => Some(err),
            AthenoError::Auth(err) => Some(err),
            AthenoError::Backend(err) => Some(err),
            AthenoError::Ai(err) => Some(err),
            AthenoError::Storage(err) => Some(err),
        }
    }
}

impl From<NetworkError> for AthenoError {
    fn from(err: NetworkError) -> Self {
        AthenoError::Network(err)
    }
}

impl From<AuthError> for AthenoError {
    fn from(err: AuthError) -> Self {
        AthenoError::Auth(err)
    }
}

impl From<BackendError> for AthenoError {
    fn from(err: BackendError) -> Self {
        AthenoError::Backend(err)
    }
}

impl From<AiError> for AthenoError {
    fn from(err: AiError) -> Self {
        AthenoError::Ai(err)
    }
}

impl From<StorageError> for AthenoError {
    fn from(err: StorageError) -> Self {
        AthenoError::Storage(err)
    }
}

impl From<HttpError> for AthenoError {
    fn from(err: HttpError) -> Self {
        match err {
            HttpError::ServerError { status, message } => {
                AthenoError::Backend(BackendError::HttpStatus { status, message })
            }
            other => AthenoError::Network(NetworkError::from_http(&other, "request")),
        }
    }
}

impl From<serde_json::Error> for AthenoError {
    fn from(err: serde_json::Error) -> Self {
        AthenoError::Backend(BackendError::InvalidResponse {
            message: err.to_string(),
        })
    }
}
