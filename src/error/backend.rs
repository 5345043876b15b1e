//! Backend (PostgREST) error types.

/// Errors returned by the hosted Postgres REST backend.
#[derive(Debug, Clone)]
pub enum BackendError {
    /// HTTP status error (non-2xx response).
    HttpStatus { status: u16, message: String },

    /// A PostgREST error with an error code (e.g. `PGRST301`).
    Postgrest { code: String, message: String },

    /// Response body could not be decoded.
    InvalidResponse { message: String },

    /// The response was missing an expected header or field.
    MissingField { field: String },
}

impl BackendError {
    /// Check if this error is likely transient and can be retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            BackendError::HttpStatus { status, .. } => {
                *status >= 500 || *status == 429 || *status == 408
            }
            // PGRST3xx are connection-pool/availability errors
            BackendError::Postgrest { code, .. } => code.starts_with("PGRST3"),
            BackendError::InvalidResponse { .. } => false,
            BackendError::MissingField { .. } => false,
        }
    }

    /// Whether this error means the session is no longer accepted.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, BackendError::HttpStatus { status: 401, .. })
    }

    /// Get a user-friendly error message.
    ///
    /// The 401/403/404 and database wording matches what the web
    /// client surfaced.
    pub fn user_message(&self) -> String {
        match self {
            BackendError::HttpStatus { status, .. } => match *status {
                401 => "Your session has expired. Please sign in again.".to_string(),
                403 => "You don't have permission to access this resource.".to_string(),
                404 => "The requested resource was not found.".to_string(),
                429 => "Too many requests. Please wait a moment and try again.".to_string(),
                500..=599 => {
                    "The server is experiencing issues. Please try again later.".to_string()
                }
                _ => format!(
                    "The server returned an error (HTTP {}). Please try again.",
                    status
                ),
            },
            BackendError::Postgrest { code, .. } => {
                if code == "PGRST301" {
                    "Database connection error. Please try again later.".to_string()
                } else {
                    "A database error occurred. Please try again later.".to_string()
                }
            }
            BackendError::InvalidResponse { .. } | BackendError::MissingField { .. } => {
                "The server sent an unexpected response. Please try again later.".to_string()
            }
        }
    }
}

impl std::fmt::Display for BackendError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendError::HttpStatus { status, message } => {
                write!(f, "Backend error ({}): {}", status, message)
            }
            BackendError::Postgrest { code, message } => {
                write!(f, "PostgREST error {}: {}", code, message)
            }
            BackendError::InvalidResponse { message } => {
                write!(f, "Invalid backend response: {}", message)
            }
            BackendError::MissingField { field } => {
                write!(f, "Backend response missing field: {}", field)
            }
        }
    }
}

impl std::error::Error for BackendError {}
