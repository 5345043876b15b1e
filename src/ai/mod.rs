//! Generative-content client (Gemini).
//!
//! Roadmap and flashcard generation over the `generateContent` REST
//! endpoint, with request validation, bounded exponential-backoff
//! retries for transient failures, and a 24-hour response cache so a
//! repeated request never burns a second model call.

pub mod prompts;

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::backoff::ExponentialBackoff;
use crate::cache::CacheStore;
use crate::config::DEFAULT_CACHE_TTL;
use crate::error::{AiError, AthenoResult};
use crate::models::Flashcard;
use crate::traits::{Headers, HttpClient, HttpError};

/// Hosted model endpoint.
const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Model used for all generation.
const MODEL: &str = "gemini-2.0-flash";

/// Retry attempts per request, counting the first.
const MAX_ATTEMPTS: u32 = 3;

/// Accepted roadmap timelines.
pub const TIMELINES: [&str; 6] = [
    "1 week", "2 weeks", "1 month", "2 months", "3 months", "6 months",
];

/// Accepted difficulty levels.
pub const DIFFICULTIES: [&str; 3] = ["beginner", "intermediate", "advanced"];

/// Parameters for roadmap generation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RoadmapRequest {
    /// Subject line; required when no syllabus is given.
    #[serde(default)]
    pub subject: Option<String>,
    /// Full syllabus text; takes precedence over the subject.
    #[serde(default)]
    pub syllabus: Option<String>,
    pub timeline: String,
    pub difficulty: String,
}

impl RoadmapRequest {
    /// Validate the request, collecting every problem at once.
    pub fn validate(&self) -> Result<(), AiError> {
        let mut errors = Vec::new();

        let has_subject = self
            .subject
            .as_deref()
            .map(|s| !s.trim().is_empty())
            .unwrap_or(false);
        let has_syllabus = self
            .syllabus
            .as_deref()
            .map(|s| !s.trim().is_empty())
            .unwrap_or(false);
        if !has_subject && !has_syllabus {
            errors.push("a subject or a syllabus is required".to_string());
        }

        if !TIMELINES.contains(&self.timeline.as_str()) {
            errors.push(format!(
                "timeline must be one of: {}",
                TIMELINES.join(", ")
            ));
        }
        if !DIFFICULTIES.contains(&self.difficulty.as_str()) {
            errors.push(format!(
                "difficulty must be one of: {}",
                DIFFICULTIES.join(", ")
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(AiError::InvalidRequest { errors })
        }
    }
}

/// One module of a generated roadmap.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedModule {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub key_topics: Vec<String>,
    #[serde(default)]
    pub resources: Vec<String>,
    pub estimated_duration: String,
    pub order: u32,
}

/// A generated roadmap: ordered modules.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GeneratedRoadmap {
    pub modules: Vec<GeneratedModule>,
}

/// Client for the Gemini `generateContent` endpoint.
#[derive(Clone)]
pub struct GeminiClient {
    http: Arc<dyn HttpClient>,
    api_key: String,
    base_url: String,
    cache: Option<CacheStore>,
    cache_ttl: Duration,
}

impl GeminiClient {
    pub fn new(api_key: &str, http: Arc<dyn HttpClient>) -> Self {
        Self {
            http,
            api_key: api_key.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            cache: None,
            cache_ttl: DEFAULT_CACHE_TTL,
        }
    }

    /// Create a client with the API key from a
    /// [`Config`](crate::config::Config).
    pub fn from_config(config: &crate::config::Config, http: Arc<dyn HttpClient>) -> Self {
        Self::new(&config.gemini_api_key, http)
    }

    /// Cache generated responses for 24 hours.
    pub fn with_cache(mut self, cache: CacheStore) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Point at a different endpoint (tests).
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    /// Generate a study roadmap.
    pub async fn generate_roadmap(
        &self,
        request: &RoadmapRequest,
    ) -> AthenoResult<GeneratedRoadmap> {
        request.validate()?;

        let cache_key = Self::cache_key("roadmap", &serde_json::to_string(request)?);
        if let Some(hit) = self.cached::<GeneratedRoadmap>(&cache_key) {
            tracing::debug!("Roadmap served from cache");
            return Ok(hit);
        }

        let text = self.generate_text(&prompts::roadmap(request)).await?;
        let roadmap: GeneratedRoadmap =
            serde_json::from_str(Self::strip_fences(&text)).map_err(|err| {
                AiError::MalformedResponse {
                    message: err.to_string(),
                }
            })?;
        if roadmap.modules.is_empty() {
            return Err(AiError::EmptyResponse.into());
        }

        self.store(&cache_key, &roadmap);
        Ok(roadmap)
    }

    /// Generate flashcards for a topic.
    pub async fn generate_flashcards(
        &self,
        topic: &str,
        difficulty: &str,
        count: u32,
    ) -> AthenoResult<Vec<Flashcard>> {
        let mut errors = Vec::new();
        if topic.trim().is_empty() {
            errors.push("a topic is required".to_string());
        }
        if !DIFFICULTIES.contains(&difficulty) {
            errors.push(format!(
                "difficulty must be one of: {}",
                DIFFICULTIES.join(", ")
            ));
        }
        if count == 0 || count > 50 {
            errors.push("count must be between 1 and 50".to_string());
        }
        if !errors.is_empty() {
            return Err(AiError::InvalidRequest { errors }.into());
        }

        let cache_key = Self::cache_key(
            "flashcards",
            &format!("{}|{}|{}", topic, difficulty, count),
        );
        if let Some(hit) = self.cached::<Vec<Flashcard>>(&cache_key) {
            tracing::debug!("Flashcards served from cache");
            return Ok(hit);
        }

        let text = self
            .generate_text(&prompts::flashcards(topic, difficulty, count))
            .await?;
        let cards: Vec<Flashcard> =
            serde_json::from_str(Self::strip_fences(&text)).map_err(|err| {
                AiError::MalformedResponse {
                    message: err.to_string(),
                }
            })?;
        if cards.is_empty() {
            return Err(AiError::EmptyResponse.into());
        }

        self.store(&cache_key, &cards);
        Ok(cards)
    }

    /// Cache key: a stable hash of the full request, not a truncation of
    /// it, so near-identical prompts never collide.
    fn cache_key(kind: &str, payload: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(kind.as_bytes());
        hasher.update(b"\n");
        hasher.update(payload.as_bytes());
        format!("ai_{}_{}", kind, hex::encode(hasher.finalize()))
    }

    fn cached<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.cache.as_ref()?.get_as(key)
    }

    fn store<T: Serialize>(&self, key: &str, value: &T) {
        if let Some(cache) = &self.cache {
            match serde_json::to_value(value) {
                Ok(json) => cache.set_with_ttl(key, json, self.cache_ttl),
                Err(err) => tracing::warn!("Failed to cache generation result: {}", err),
            }
        }
    }

    /// Issue the `generateContent` call, retrying transient failures with
    /// exponential backoff up to [`MAX_ATTEMPTS`].
    async fn generate_text(&self, prompt: &str) -> Result<String, AiError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent?key={}",
            self.base_url, MODEL, self.api_key
        );
        let body = serde_json::json!({
            "contents": [{ "parts": [{ "text": prompt }] }]
        })
        .to_string();
        let mut headers = Headers::new();
        headers.insert("Content-Type".to_string(), "application/json".to_string());

        let mut backoff = ExponentialBackoff::new();
        let mut last_error = String::new();

        for attempt in 1..=MAX_ATTEMPTS {
            match self.request_once(&url, &body, &headers).await {
                Ok(text) => return Ok(text),
                Err(err) if err.is_retryable() && attempt < MAX_ATTEMPTS => {
                    last_error = err.to_string();
                    let delay = backoff.current_delay();
                    backoff.record_failure();
                    tokio::time::sleep(delay).await;
                }
                Err(err) if err.is_retryable() => {
                    last_error = err.to_string();
                }
                Err(err) => return Err(err),
            }
        }

        Err(AiError::RetriesExhausted {
            attempts: MAX_ATTEMPTS,
            last_error,
        })
    }

    async fn request_once(
        &self,
        url: &str,
        body: &str,
        headers: &Headers,
    ) -> Result<String, AiError> {
        let response = match self.http.post(url, body, headers).await {
            Ok(response) => response,
            Err(HttpError::ServerError { status, message }) => {
                return Err(AiError::RequestFailed { status, message })
            }
            // Transient transport failures (timeouts, refused connections)
            // count as a retryable server error; everything else does not.
            Err(err) if err.is_retryable() => {
                return Err(AiError::RequestFailed {
                    status: 503,
                    message: err.to_string(),
                })
            }
            Err(err) => {
                return Err(AiError::RequestFailed {
                    status: 0,
                    message: err.to_string(),
                })
            }
        };

        if !response.is_success() {
            let message: String = response
                .text()
                .unwrap_or_default()
                .chars()
                .take(200)
                .collect();
            return Err(AiError::RequestFailed {
                status: response.status,
                message,
            });
        }

        let parsed: serde_json::Value =
            response.json().map_err(|err| AiError::MalformedResponse {
                message: err.to_string(),
            })?;

        Self::extract_text(&parsed).ok_or(AiError::EmptyResponse)
    }

    /// Concatenate the text parts of the first candidate.
    fn extract_text(response: &serde_json::Value) -> Option<String> {
        let parts = response
            .get("candidates")?
            .get(0)?
            .get("content")?
            .get("parts")?
            .as_array()?;

        let text: String = parts
            .iter()
            .filter_map(|part| part.get("text")?.as_str())
            .collect();
        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }

    /// Strip a surrounding markdown code fence; the model often wraps its
    /// JSON in one despite instructions.
    fn strip_fences(text: &str) -> &str {
        let trimmed = text.trim();
        let without_open = trimmed
            .strip_prefix("```json")
            .or_else(|| trimmed.strip_prefix("```"))
            .unwrap_or(trimmed);
        without_open
            .strip_suffix("```")
            .unwrap_or(without_open)
            .trim()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::mock::{MockHttpClient, MockResponse};
    use crate::adapters::MemoryStorage;
    use crate::error::AthenoError;
    use crate::traits::{HttpError, Response};
    use bytes::Bytes;

    const ENDPOINT: &str =
        "https://ai.test/v1beta/models/gemini-2.0-flash:generateContent?key=k";

    fn client(http: MockHttpClient) -> GeminiClient {
        GeminiClient::new("k", Arc::new(http)).with_base_url("https://ai.test")
    }

    fn valid_request() -> RoadmapRequest {
        RoadmapRequest {
            subject: Some("Organic chemistry".to_string()),
            syllabus: None,
            timeline: "1 month".to_string(),
            difficulty: "beginner".to_string(),
        }
    }

    fn gemini_body(text: &str) -> Bytes {
        Bytes::from(
            serde_json::json!({
                "candidates": [{
                    "content": { "parts": [{ "text": text }] }
                }]
            })
            .to_string(),
        )
    }

    fn roadmap_json() -> String {
        serde_json::json!({
            "modules": [{
                "title": "Foundations",
                "description": "Atoms and bonds",
                "keyTopics": ["orbitals"],
                "resources": ["Clayden ch. 1"],
                "estimatedDuration": "1 week",
                "order": 1
            }]
        })
        .to_string()
    }

    #[test]
    fn test_validation_collects_all_errors() {
        let request = RoadmapRequest {
            subject: Some("   ".to_string()),
            syllabus: None,
            timeline: "4 months".to_string(),
            difficulty: "expert".to_string(),
        };

        let err = request.validate().unwrap_err();
        match err {
            AiError::InvalidRequest { errors } => assert_eq!(errors.len(), 3),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_strip_fences() {
        assert_eq!(
            GeminiClient::strip_fences("```json\n{\"a\":1}\n```"),
            "{\"a\":1}"
        );
        assert_eq!(GeminiClient::strip_fences("```\n[]\n```"), "[]");
        assert_eq!(GeminiClient::strip_fences("{\"a\":1}"), "{\"a\":1}");
    }

    #[test]
    fn test_cache_keys_differ_for_near_identical_requests() {
        let a = GeminiClient::cache_key("roadmap", "syllabus v1 ...");
        let b = GeminiClient::cache_key("roadmap", "syllabus v2 ...");
        assert_ne!(a, b);
        assert!(a.starts_with("ai_roadmap_"));
    }

    #[tokio::test]
    async fn test_generate_roadmap_parses_fenced_json() {
        let http = MockHttpClient::new();
        http.set_response(
            ENDPOINT,
            MockResponse::Success(Response::new(
                200,
                gemini_body(&format!("```json\n{}\n```", roadmap_json())),
            )),
        );

        let roadmap = client(http)
            .generate_roadmap(&valid_request())
            .await
            .unwrap();
        assert_eq!(roadmap.modules.len(), 1);
        assert_eq!(roadmap.modules[0].key_topics, vec!["orbitals"]);
        assert_eq!(roadmap.modules[0].order, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_transient_failures_then_succeeds() {
        let http = MockHttpClient::new();
        http.set_response(
            ENDPOINT,
            MockResponse::Sequence(vec![
                Ok(Response::new(503, Bytes::from("overloaded"))),
                Ok(Response::new(200, gemini_body(&roadmap_json()))),
            ]),
        );

        let roadmap = client(http.clone())
            .generate_roadmap(&valid_request())
            .await
            .unwrap();
        assert_eq!(roadmap.modules.len(), 1);
        assert_eq!(http.get_requests().len(), 2);
    }

    #[tokio::test]
    async fn test_client_error_is_not_retried() {
        let http = MockHttpClient::new();
        http.set_response(
            ENDPOINT,
            MockResponse::Success(Response::new(400, Bytes::from("bad key"))),
        );

        let err = client(http.clone())
            .generate_roadmap(&valid_request())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AthenoError::Ai(AiError::RequestFailed { status: 400, .. })
        ));
        assert_eq!(http.get_requests().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_exhausted_after_max_attempts() {
        let http = MockHttpClient::new();
        http.set_response(
            ENDPOINT,
            MockResponse::Error(HttpError::ServerError {
                status: 503,
                message: "overloaded".to_string(),
            }),
        );

        let err = client(http.clone())
            .generate_roadmap(&valid_request())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AthenoError::Ai(AiError::RetriesExhausted { attempts: 3, .. })
        ));
        assert_eq!(http.get_requests().len(), 3);
    }

    #[tokio::test]
    async fn test_second_generation_served_from_cache() {
        let http = MockHttpClient::new();
        http.set_response(
            ENDPOINT,
            MockResponse::Success(Response::new(200, gemini_body(&roadmap_json()))),
        );

        let cache = CacheStore::new(Arc::new(MemoryStorage::new()));
        let client = client(http.clone()).with_cache(cache);

        let first = client.generate_roadmap(&valid_request()).await.unwrap();
        let second = client.generate_roadmap(&valid_request()).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(http.get_requests().len(), 1);
    }

    #[tokio::test]
    async fn test_flashcards_validation_and_parse() {
        let http = MockHttpClient::new();
        http.set_response(
            ENDPOINT,
            MockResponse::Success(Response::new(
                200,
                gemini_body(
                    r#"[{"front_content":"What is ATP?","back_content":"Energy currency"}]"#,
                ),
            )),
        );

        let client = client(http);
        let cards = client
            .generate_flashcards("cell biology", "beginner", 10)
            .await
            .unwrap();
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].hint, "");

        let err = client
            .generate_flashcards("", "beginner", 0)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AthenoError::Ai(AiError::InvalidRequest { .. })
        ));
    }

    #[tokio::test]
    async fn test_empty_candidates_is_empty_response() {
        let http = MockHttpClient::new();
        http.set_response(
            ENDPOINT,
            MockResponse::Success(Response::new(
                200,
                Bytes::from(r#"{"candidates":[]}"#),
            )),
        );

        let err = client(http)
            .generate_roadmap(&valid_request())
            .await
            .unwrap_err();
        assert!(matches!(err, AthenoError::Ai(AiError::EmptyResponse)));
    }
}
