//! Authentication error types.

/// Authentication-specific error variants.
#[derive(Debug, Clone)]
pub enum AuthError {
    /// The stored session has expired.
    SessionExpired,

    /// No session is stored at all.
    NotSignedIn,

    /// Sign-in was rejected (bad credentials).
    InvalidCredentials,

    /// Refreshing the access token failed.
    RefreshFailed { message: String },

    /// The auth response could not be parsed.
    MalformedSession { message: String },
}

impl AuthError {
    /// Whether recovering requires the user to sign in again.
    pub fn requires_reauth(&self) -> bool {
        match self {
            AuthError::SessionExpired => true,
            AuthError::NotSignedIn => true,
            AuthError::InvalidCredentials => true,
            AuthError::RefreshFailed { .. } => true,
            AuthError::MalformedSession { .. } => true,
        }
    }

    /// Get a user-friendly error message.
    pub fn user_message(&self) -> String {
        match self {
            AuthError::SessionExpired => {
                "Your session has expired. Please sign in again.".to_string()
            }
            AuthError::NotSignedIn => "Please sign in to continue.".to_string(),
            AuthError::InvalidCredentials => {
                "Incorrect email or password. Please try again.".to_string()
            }
            AuthError::RefreshFailed { .. } => {
                "Your session could not be renewed. Please sign in again.".to_string()
            }
            AuthError::MalformedSession { .. } => {
                "Your session data is invalid. Please sign in again.".to_string()
            }
        }
    }
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::SessionExpired => write!(f, "Session expired"),
            AuthError::NotSignedIn => write!(f, "Not signed in"),
            AuthError::InvalidCredentials => write!(f, "Invalid credentials"),
            AuthError::RefreshFailed { message } => write!(f, "Token refresh failed: {}", message),
            AuthError::MalformedSession { message } => {
                write!(f, "Malformed session: {}", message)
            }
        }
    }
}

impl std::error::Error for AuthError {}
