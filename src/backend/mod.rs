//! Supabase backend client.
//!
//! This module provides the HTTP client for the hosted Postgres backend:
//! a thin typed layer over its REST surface (PostgREST) plus the auth
//! endpoints (GoTrue). Durability and querying live server-side; this is
//! deliberately request plumbing only.

pub mod auth_api;
pub mod query;

pub use auth_api::AuthApi;
pub use query::QueryBuilder;

use std::sync::{Arc, RwLock};

use crate::error::BackendError;
use crate::traits::{Headers, HttpClient, Response};

/// Database table names.
pub mod tables {
    pub const USERS: &str = "users";
    pub const COURSES: &str = "courses";
    pub const ROADMAPS: &str = "roadmaps";
    pub const ROADMAP_ITEMS: &str = "roadmap_items";
    pub const FLASHCARD_SETS: &str = "flashcard_sets";
    pub const FLASHCARDS: &str = "flashcards";
    pub const TASKS: &str = "tasks";
    pub const POMODORO_SESSIONS: &str = "pomodoro_sessions";
    pub const STUDY_LOGS: &str = "study_logs";
}

/// Body shape of a PostgREST error response.
#[derive(Debug, serde::Deserialize)]
struct PostgrestErrorBody {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Client for the Supabase REST backend.
///
/// Sends the `apikey` header on every request and a `Bearer` token that is
/// the user's access token when signed in, the anon key otherwise. The
/// token slot is shared: the auth store updates it on sign-in, refresh and
/// sign-out, and every in-flight query builder picks up the change.
#[derive(Clone)]
pub struct SupabaseClient {
    base_url: String,
    anon_key: String,
    http: Arc<dyn HttpClient>,
    access_token: Arc<RwLock<Option<String>>>,
}

impl SupabaseClient {
    /// Create a new client.
    pub fn new(base_url: &str, anon_key: &str, http: Arc<dyn HttpClient>) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
            http,
            access_token: Arc::new(RwLock::new(None)),
        }
    }

    /// Create a client from a [`Config`](crate::config::Config).
    pub fn from_config(config: &crate::config::Config, http: Arc<dyn HttpClient>) -> Self {
        Self::new(&config.supabase_url, &config.supabase_anon_key, http)
    }

    /// The project base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The anon key.
    pub fn anon_key(&self) -> &str {
        &self.anon_key
    }

    /// The HTTP client used for requests.
    pub(crate) fn http(&self) -> Arc<dyn HttpClient> {
        Arc::clone(&self.http)
    }

    /// Install (or clear) the user access token used for Bearer auth.
    pub fn set_access_token(&self, token: Option<String>) {
        *self.access_token.write().unwrap() = token;
    }

    /// Current user access token, if signed in.
    pub fn access_token(&self) -> Option<String> {
        self.access_token.read().unwrap().clone()
    }

    /// Headers for a REST request.
    pub(crate) fn rest_headers(&self) -> Headers {
        let bearer = self
            .access_token()
            .unwrap_or_else(|| self.anon_key.clone());
        let mut headers = Headers::new();
        headers.insert("apikey".to_string(), self.anon_key.clone());
        headers.insert("Authorization".to_string(), format!("Bearer {}", bearer));
        headers.insert("Content-Type".to_string(), "application/json".to_string());
        headers
    }

    /// Start a query against `table`.
    pub fn table(&self, table: &str) -> QueryBuilder {
        QueryBuilder::new(self.clone(), table)
    }

    /// An auth API handle sharing this client's endpoint and key.
    pub fn auth(&self) -> AuthApi {
        AuthApi::new(&self.base_url, &self.anon_key, self.http())
    }

    /// Map a non-2xx REST response into a backend error.
    pub(crate) fn error_from_response(response: &Response) -> BackendError {
        let message = response.text().unwrap_or_default();
        if let Ok(body) = serde_json::from_slice::<PostgrestErrorBody>(&response.body) {
            if let Some(code) = body.code {
                if code.starts_with('P') {
                    return BackendError::Postgrest {
                        code,
                        message: body.message.unwrap_or(message),
                    };
                }
            }
        }
        BackendError::HttpStatus {
            status: response.status,
            message,
        }
    }
}
