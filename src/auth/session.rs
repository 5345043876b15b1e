//! Session types and local session persistence.
//!
//! The session is stored under its own key (outside the cache prefix) so
//! that clearing the cache never signs the user out, matching the web
//! client's separate `sb-session` entry.

use serde::{Deserialize, Serialize};

use crate::traits::KeyValueStorage;

/// Storage key for the persisted session.
pub const SESSION_KEY: &str = "sb-session";

/// The authenticated user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// An authenticated session for the Supabase backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Session {
    /// JWT used as the Bearer token for REST calls.
    pub access_token: String,
    /// Token used to obtain a new access token.
    pub refresh_token: String,
    /// Access token expiry as Unix timestamp (seconds since epoch).
    pub expires_at: i64,
    /// The signed-in user.
    pub user: User,
}

impl Session {
    /// Check if the access token is expired.
    pub fn is_expired(&self) -> bool {
        chrono::Utc::now().timestamp() >= self.expires_at
    }

    /// Check if the session is usable without a refresh.
    pub fn is_valid(&self) -> bool {
        !self.access_token.is_empty() && !self.is_expired()
    }
}

/// Loads and saves the session through local storage.
#[derive(Clone)]
pub struct SessionManager {
    storage: std::sync::Arc<dyn KeyValueStorage>,
}

impl SessionManager {
    /// Create a manager over `storage`.
    pub fn new(storage: std::sync::Arc<dyn KeyValueStorage>) -> Self {
        Self { storage }
    }

    /// Load the persisted session, if any.
    ///
    /// A corrupt entry is removed and reported as absent rather than
    /// failing startup.
    pub fn load(&self) -> Option<Session> {
        let raw = self.storage.get(SESSION_KEY).ok()??;
        match serde_json::from_str(&raw) {
            Ok(session) => Some(session),
            Err(err) => {
                tracing::warn!("Failed to parse cached session: {}", err);
                let _ = self.storage.remove(SESSION_KEY);
                None
            }
        }
    }

    /// Persist `session`.
    pub fn save(&self, session: &Session) {
        match serde_json::to_string(session) {
            Ok(raw) => {
                if let Err(err) = self.storage.set(SESSION_KEY, &raw) {
                    tracing::warn!("Failed to persist session: {}", err);
                }
            }
            Err(err) => tracing::warn!("Failed to serialize session: {}", err),
        }
    }

    /// Remove the persisted session.
    pub fn clear(&self) {
        let _ = self.storage.remove(SESSION_KEY);
    }
}
