//! Reqwest-based HTTP client adapter.
//!
//! This module provides the production HTTP client implementation using
//! reqwest, implementing the [`HttpClient`] trait from `crate::traits`.

use async_trait::async_trait;

use crate::traits::{Headers, HttpClient, HttpError, Response};

/// HTTP client implementation using reqwest.
///
/// This adapter wraps a `reqwest::Client` and implements the [`HttpClient`]
/// trait, providing GET, POST, PATCH and DELETE operations.
///
/// # Example
///
/// ```ignore
/// use atheno_data::adapters::ReqwestHttpClient;
/// use atheno_data::traits::{Headers, HttpClient};
///
/// let client = ReqwestHttpClient::new();
/// let response = client.get("https://api.example.com/data", &Headers::new()).await?;
/// println!("Status: {}", response.status);
/// ```
#[derive(Debug, Clone)]
pub struct ReqwestHttpClient {
    client: reqwest::Client,
}

impl ReqwestHttpClient {
    /// Create a new ReqwestHttpClient with default settings.
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    /// Create a new ReqwestHttpClient with a custom reqwest::Client.
    ///
    /// This allows for advanced configuration like custom timeouts,
    /// connection pools, or TLS settings.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Get a reference to the underlying reqwest::Client.
    pub fn inner(&self) -> &reqwest::Client {
        &self.client
    }

    /// Convert reqwest error to HttpError.
    fn convert_error(err: reqwest::Error) -> HttpError {
        if err.is_timeout() {
            HttpError::Timeout(err.to_string())
        } else if err.is_connect() {
            HttpError::ConnectionFailed(err.to_string())
        } else {
            HttpError::Other(err.to_string())
        }
    }

    /// Convert reqwest headers to our Headers type.
    fn convert_headers(headers: &reqwest::header::HeaderMap) -> Headers {
        headers
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.to_string(), v.to_string()))
            })
            .collect()
    }

    /// Apply headers to a request builder.
    fn apply_headers(
        builder: reqwest::RequestBuilder,
        headers: &Headers,
    ) -> reqwest::RequestBuilder {
        let mut builder = builder;
        for (key, value) in headers {
            builder = builder.header(key, value);
        }
        builder
    }

    /// Send a prepared request and convert the response.
    async fn dispatch(builder: reqwest::RequestBuilder) -> Result<Response, HttpError> {
        let response = builder.send().await.map_err(Self::convert_error)?;

        let status = response.status().as_u16();
        let response_headers = Self::convert_headers(response.headers());
        let body = response.bytes().await.map_err(Self::convert_error)?;

        Ok(Response::with_headers(status, response_headers, body))
    }
}

impl Default for ReqwestHttpClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn get(&self, url: &str, headers: &Headers) -> Result<Response, HttpError> {
        let builder = Self::apply_headers(self.client.get(url), headers);
        Self::dispatch(builder).await
    }

    async fn post(&self, url: &str, body: &str, headers: &Headers) -> Result<Response, HttpError> {
        let builder = Self::apply_headers(self.client.post(url).body(body.to_string()), headers);
        Self::dispatch(builder).await
    }

    async fn patch(
        &self,
        url: &str,
        body: &str,
        headers: &Headers,
    ) -> Result<Response, HttpError> {
        let builder = Self::apply_headers(self.client.patch(url).body(body.to_string()), headers);
        Self::dispatch(builder).await
    }

    async fn delete(&self, url: &str, headers: &Headers) -> Result<Response, HttpError> {
        let builder = Self::apply_headers(self.client.delete(url), headers);
        Self::dispatch(builder).await
    }
}
