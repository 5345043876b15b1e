//! Mock HTTP client for testing.
//!
//! Provides a configurable mock HTTP client that can return predefined
//! responses or errors for testing purposes.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::traits::{Headers, HttpClient, HttpError, Response};

/// A recorded HTTP request for verification in tests.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    /// HTTP method (GET, POST, PATCH or DELETE)
    pub method: String,
    /// Request URL
    pub url: String,
    /// Request headers
    pub headers: Headers,
    /// Request body (for POST/PATCH requests)
    pub body: Option<String>,
}

/// Configuration for a mock response.
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// Return a successful response
    Success(Response),
    /// Return an error
    Error(HttpError),
    /// Return each response in turn, repeating the last one
    Sequence(Vec<Result<Response, HttpError>>),
}

/// Mock HTTP client for testing.
///
/// This client can be configured to return specific responses for URLs,
/// allowing tests to verify HTTP interactions without network access.
///
/// # Example
///
/// ```ignore
/// use atheno_data::adapters::mock::{MockHttpClient, MockResponse};
/// use atheno_data::traits::{Headers, HttpClient, Response};
/// use bytes::Bytes;
///
/// let client = MockHttpClient::new();
/// client.set_response(
///     "https://api.example.com/data",
///     MockResponse::Success(Response::new(200, Bytes::from("Hello"))),
/// );
///
/// let response = client.get("https://api.example.com/data", &Headers::new()).await?;
/// assert_eq!(response.status, 200);
///
/// let requests = client.get_requests();
/// assert_eq!(requests.len(), 1);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MockHttpClient {
    /// Configured responses by URL pattern
    responses: Arc<Mutex<HashMap<String, MockResponse>>>,
    /// Default response when no specific match
    default_response: Arc<Mutex<Option<MockResponse>>>,
    /// Recorded requests for verification
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockHttpClient {
    /// Create a new mock HTTP client.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a response for a specific URL.
    ///
    /// URLs are matched exactly first, then by prefix.
    pub fn set_response(&self, url: &str, response: MockResponse) {
        let mut responses = self.responses.lock().unwrap();
        responses.insert(url.to_string(), response);
    }

    /// Set a default response for URLs without specific matches.
    pub fn set_default_response(&self, response: MockResponse) {
        let mut default = self.default_response.lock().unwrap();
        *default = Some(response);
    }

    /// Get all recorded requests.
    pub fn get_requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Clear all recorded requests.
    pub fn clear_requests(&self) {
        self.requests.lock().unwrap().clear();
    }

    /// Clear all configured responses.
    pub fn clear_responses(&self) {
        self.responses.lock().unwrap().clear();
    }

    /// Record a request.
    fn record_request(&self, method: &str, url: &str, headers: &Headers, body: Option<String>) {
        let mut requests = self.requests.lock().unwrap();
        requests.push(RecordedRequest {
            method: method.to_string(),
            url: url.to_string(),
            headers: headers.clone(),
            body,
        });
    }

    /// Resolve the next result for a URL, consuming sequence entries.
    fn next_result(&self, url: &str) -> Result<Response, HttpError> {
        let mut responses = self.responses.lock().unwrap();

        // First try exact match, then prefix match (for URL patterns)
        let key = if responses.contains_key(url) {
            Some(url.to_string())
        } else {
            responses
                .keys()
                .find(|pattern| url.starts_with(pattern.as_str()))
                .cloned()
        };

        let entry = match key {
            Some(key) => responses.get_mut(&key),
            None => None,
        };

        match entry {
            Some(MockResponse::Success(response)) => Ok(response.clone()),
            Some(MockResponse::Error(err)) => Err(err.clone()),
            Some(MockResponse::Sequence(results)) => {
                let result = if results.len() > 1 {
                    results.remove(0)
                } else {
                    results
                        .first()
                        .cloned()
                        .unwrap_or(Err(HttpError::Other("empty mock sequence".to_string())))
                };
                result
            }
            None => {
                let default = self.default_response.lock().unwrap();
                match default.as_ref() {
                    Some(MockResponse::Success(response)) => Ok(response.clone()),
                    Some(MockResponse::Error(err)) => Err(err.clone()),
                    Some(MockResponse::Sequence(results)) => results
                        .first()
                        .cloned()
                        .unwrap_or(Err(HttpError::Other("empty mock sequence".to_string()))),
                    None => Err(HttpError::Other(format!("No mock response for URL: {}", url))),
                }
            }
        }
    }
}

#[async_trait]
impl HttpClient for MockHttpClient {
    async fn get(&self, url: &str, headers: &Headers) -> Result<Response, HttpError> {
        self.record_request("GET", url, headers, None);
        self.next_result(url)
    }

    async fn post(&self, url: &str, body: &str, headers: &Headers) -> Result<Response, HttpError> {
        self.record_request("POST", url, headers, Some(body.to_string()));
        self.next_result(url)
    }

    async fn patch(
        &self,
        url: &str,
        body: &str,
        headers: &Headers,
    ) -> Result<Response, HttpError> {
        self.record_request("PATCH", url, headers, Some(body.to_string()));
        self.next_result(url)
    }

    async fn delete(&self, url: &str, headers: &Headers) -> Result<Response, HttpError> {
        self.record_request("DELETE", url, headers, None);
        self.next_result(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    #[tokio::test]
    async fn test_exact_match_and_recording() {
        let client = MockHttpClient::new();
        client.set_response(
            "https://api.test/data",
            MockResponse::Success(Response::new(200, Bytes::from("ok"))),
        );

        let response = client
            .get("https://api.test/data", &Headers::new())
            .await
            .unwrap();
        assert_eq!(response.status, 200);

        let requests = client.get_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].method, "GET");
        assert_eq!(requests[0].url, "https://api.test/data");
    }

    #[tokio::test]
    async fn test_prefix_match() {
        let client = MockHttpClient::new();
        client.set_response(
            "https://api.test/rest/v1/courses",
            MockResponse::Success(Response::new(200, Bytes::from("[]"))),
        );

        let response = client
            .get(
                "https://api.test/rest/v1/courses?user_id=eq.u1",
                &Headers::new(),
            )
            .await
            .unwrap();
        assert_eq!(response.status, 200);
    }

    #[tokio::test]
    async fn test_sequence_consumes_then_repeats_last() {
        let client = MockHttpClient::new();
        client.set_response(
            "https://api.test/flaky",
            MockResponse::Sequence(vec![
                Err(HttpError::Timeout("first".to_string())),
                Ok(Response::new(200, Bytes::from("recovered"))),
            ]),
        );

        let first = client.get("https://api.test/flaky", &Headers::new()).await;
        assert!(first.is_err());

        let second = client
            .get("https://api.test/flaky", &Headers::new())
            .await
            .unwrap();
        assert_eq!(second.status, 200);

        // Last entry repeats
        let third = client
            .get("https://api.test/flaky", &Headers::new())
            .await
            .unwrap();
        assert_eq!(third.status, 200);
    }

    #[tokio::test]
    async fn test_unconfigured_url_errors() {
        let client = MockHttpClient::new();
        let result = client.get("https://api.test/none", &Headers::new()).await;
        assert!(result.is_err());
    }
}
