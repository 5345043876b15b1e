//! Error categories for high-level handling decisions.

/// High-level error classification.
///
/// Callers use the category to decide whether to retry, re-authenticate,
/// surface a message, or fail fast.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Connection, DNS, timeout. Usually transient.
    Network,
    /// Session invalid or expired. Requires sign-in.
    Auth,
    /// Backend failure (5xx, database errors). Usually transient.
    Server,
    /// Programming or validation error. Not retryable.
    Client,
    /// Local persistence failure.
    Storage,
}

impl ErrorCategory {
    /// Whether errors in this category are generally worth retrying.
    pub fn is_retryable(self) -> bool {
        matches!(self, ErrorCategory::Network | ErrorCategory::Server)
    }

    /// Short label for logging.
    pub fn label(self) -> &'static str {
        match self {
            ErrorCategory::Network => "network",
            ErrorCategory::Auth => "auth",
            ErrorCategory::Server => "server",
            ErrorCategory::Client => "client",
            ErrorCategory::Storage => "storage",
        }
    }
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
