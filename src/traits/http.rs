//! HTTP client trait abstraction.
//!
//! Provides a trait-based abstraction for HTTP operations, enabling
//! dependency injection and mocking in tests.

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashMap;

/// HTTP headers represented as a key-value map.
pub type Headers = HashMap<String, String>;

/// HTTP response wrapper.
#[derive(Debug, Clone)]
pub struct Response {
    /// HTTP status code
    pub status: u16,
    /// Response headers
    pub headers: Headers,
    /// Response body
    pub body: Bytes,
}

impl Response {
    /// Create a new response.
    pub fn new(status: u16, body: Bytes) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body,
        }
    }

    /// Create a new response with headers.
    pub fn with_headers(status: u16, headers: Headers, body: Bytes) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// Check if the response indicates success (2xx status).
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Get the response body as a string.
    pub fn text(&self) -> Result<String, std::string::FromUtf8Error> {
        String::from_utf8(self.body.to_vec())
    }

    /// Parse the response body as JSON.
    pub fn json<T: serde::de::DeserializeOwned>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_slice(&self.body)
    }
}

/// HTTP client errors.
#[derive(Debug, Clone)]
pub enum HttpError {
    /// Connection failed
    ConnectionFailed(String),
    /// Request timeout
    Timeout(String),
    /// Server returned an error status
    ServerError { status: u16, message: String },
    /// Request was cancelled
    Cancelled,
    /// IO error
    Io(String),
    /// Invalid URL
    InvalidUrl(String),
    /// Other error
    Other(String),
}

impl std::fmt::Display for HttpError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HttpError::ConnectionFailed(msg) => write!(f, "Connection failed: {}", msg),
            HttpError::Timeout(msg) => write!(f, "Request timeout: {}", msg),
            HttpError::ServerError { status, message } => {
                write!(f, "Server error ({}): {}", status, message)
            }
            HttpError::Cancelled => write!(f, "Request cancelled"),
            HttpError::Io(msg) => write!(f, "IO error: {}", msg),
            HttpError::InvalidUrl(msg) => write!(f, "Invalid URL: {}", msg),
            HttpError::Other(msg) => write!(f, "HTTP error: {}", msg),
        }
    }
}

impl std::error::Error for HttpError {}

impl HttpError {
    /// Check if this error is likely transient and worth retrying.
    pub fn is_retryable(&self) -> bool {
        match self {
            HttpError::ConnectionFailed(_) => true,
            HttpError::Timeout(_) => true,
            HttpError::ServerError { status, .. } => {
                *status >= 500 || *status == 429 || *status == 408
            }
            _ => false,
        }
    }
}

/// Trait for HTTP client operations.
///
/// This trait abstracts HTTP operations to enable dependency injection
/// and mocking in tests. Implementations include the production reqwest-based
/// client and mock clients for testing.
///
/// # Example
///
/// ```ignore
/// use atheno_data::traits::{Headers, HttpClient, HttpError};
///
/// async fn fetch_data<C: HttpClient>(client: &C) -> Result<String, HttpError> {
///     let response = client.get("https://api.example.com/data", &Headers::new()).await?;
///     response.text().map_err(|e| HttpError::Other(e.to_string()))
/// }
/// ```
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Perform a GET request.
    async fn get(&self, url: &str, headers: &Headers) -> Result<Response, HttpError>;

    /// Perform a POST request with a string body.
    async fn post(&self, url: &str, body: &str, headers: &Headers) -> Result<Response, HttpError>;

    /// Perform a PATCH request with a string body.
    async fn patch(&self, url: &str, body: &str, headers: &Headers)
        -> Result<Response, HttpError>;

    /// Perform a DELETE request.
    async fn delete(&self, url: &str, headers: &Headers) -> Result<Response, HttpError>;
}
