//! AI generation error types.

/// Errors from the generative-content client.
#[derive(Debug, Clone)]
pub enum AiError {
    /// Request parameters failed validation before any network call.
    InvalidRequest { errors: Vec<String> },

    /// The model endpoint rejected or failed the request.
    RequestFailed { status: u16, message: String },

    /// All retry attempts were exhausted.
    RetriesExhausted { attempts: u32, last_error: String },

    /// The model's response was not the JSON we asked for.
    MalformedResponse { message: String },

    /// The model's response had no candidates/text.
    EmptyResponse,
}

impl AiError {
    /// Check if this error is likely transient and can be retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            AiError::InvalidRequest { .. } => false,
            AiError::RequestFailed { status, .. } => *status >= 500 || *status == 429,
            AiError::RetriesExhausted { .. } => false,
            AiError::MalformedResponse { .. } => false,
            AiError::EmptyResponse => false,
        }
    }

    /// Get a user-friendly error message.
    pub fn user_message(&self) -> String {
        match self {
            AiError::InvalidRequest { errors } => errors.join(", "),
            AiError::RequestFailed { .. } | AiError::RetriesExhausted { .. } => {
                "Content generation is temporarily unavailable. Please try again later."
                    .to_string()
            }
            AiError::MalformedResponse { .. } | AiError::EmptyResponse => {
                "The generated content could not be read. Please try again.".to_string()
            }
        }
    }
}

impl std::fmt::Display for AiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AiError::InvalidRequest { errors } => {
                write!(f, "Invalid generation request: {}", errors.join(", "))
            }
            AiError::RequestFailed { status, message } => {
                write!(f, "Generation request failed ({}): {}", status, message)
            }
            AiError::RetriesExhausted {
                attempts,
                last_error,
            } => write!(
                f,
                "Generation failed after {} attempts: {}",
                attempts, last_error
            ),
            AiError::MalformedResponse { message } => {
                write!(f, "Malformed generation response: {}", message)
            }
            AiError::EmptyResponse => write!(f, "Empty generation response"),
        }
    }
}

impl std::error::Error for AiError {}
