//! Auth store: session state sourced from the backend's auth subsystem.
//!
//! Restores a persisted session at startup, exposes the current user as a
//! cached watchable value, refreshes the access token when it expires,
//! and broadcasts auth changes so the data stores and sync scheduler can
//! react (the web client wired this through `onAuthStateChange`).

pub mod loading;
pub mod session;

pub use loading::LoadingFlag;
pub use session::{Session, SessionManager, User, SESSION_KEY};

use std::sync::{Arc, Mutex};

use tokio::sync::broadcast;

use crate::backend::{AuthApi, SupabaseClient};
use crate::cache::CacheStore;
use crate::config::USER_CACHE_TTL;
use crate::error::{AthenoResult, AuthError};
use crate::store::CachedStore;

/// Auth state change events.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthEvent {
    SignedIn(User),
    SignedOut,
    TokenRefreshed,
}

/// Coarse auth phase, used by the route guard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthPhase {
    /// Session restoration or sign-in still in flight.
    Loading,
    SignedIn,
    SignedOut,
}

/// Session state store.
pub struct AuthStore {
    api: AuthApi,
    client: SupabaseClient,
    manager: SessionManager,
    cache: CacheStore,
    user: CachedStore<Option<User>>,
    session: Mutex<Option<Session>>,
    events: broadcast::Sender<AuthEvent>,
    loading: LoadingFlag,
}

impl AuthStore {
    /// Create the auth store, restoring a persisted session when one
    /// exists and has not expired.
    pub fn new(client: SupabaseClient, manager: SessionManager, cache: CacheStore) -> Self {
        let (events, _) = broadcast::channel(16);
        let user = CachedStore::new("user", None, cache.clone()).with_ttl(USER_CACHE_TTL);

        let store = Self {
            api: client.auth(),
            client,
            manager,
            cache,
            user,
            session: Mutex::new(None),
            events,
            loading: LoadingFlag::new(),
        };

        if let Some(session) = store.manager.load() {
            if session.is_valid() {
                store.install_session(session.clone());
                tracing::info!("Restored session for user {}", session.user.id);
            } else if session.is_expired() {
                // Keep the refresh token around; ensure_fresh() will use it.
                *store.session.lock().unwrap() = Some(session);
            }
        }

        store
    }

    /// Make `session` the active one: persist it, install the Bearer
    /// token, and publish the user.
    fn install_session(&self, session: Session) {
        self.manager.save(&session);
        self.client.set_access_token(Some(session.access_token.clone()));
        self.user.set(Some(session.user.clone()));
        *self.session.lock().unwrap() = Some(session);
    }

    /// Sign in with email and password.
    pub async fn sign_in(&self, email: &str, password: &str) -> AthenoResult<User> {
        self.loading.begin();
        let result = self.api.sign_in_with_password(email, password).await;
        self.loading.finish();

        let session = result?;
        let user = session.user.clone();
        self.install_session(session);
        let _ = self.events.send(AuthEvent::SignedIn(user.clone()));
        Ok(user)
    }

    /// Sign out: best-effort server revocation, then local teardown.
    pub async fn sign_out(&self) {
        let token = self.session.lock().unwrap().as_ref().map(|s| s.access_token.clone());
        if let Some(token) = token {
            if let Err(err) = self.api.sign_out(&token).await {
                tracing::warn!("Server sign-out failed: {}", err);
            }
        }
        self.clear_local_state();
    }

    /// Local sign-out: clear the session, the access token, the user
    /// value and the whole cache, and broadcast `SignedOut`.
    ///
    /// Also the 401 recovery path: any layer seeing a rejected token funnels here.
    pub fn clear_local_state(&self) {
        self.manager.clear();
        self.client.set_access_token(None);
        self.cache.clear();
        self.user.reset(None);
        *self.session.lock().unwrap() = None;
        let _ = self.events.send(AuthEvent::SignedOut);
    }

    /// Ensure the session's access token is fresh, refreshing when it has
    /// expired. Errors mean the user must sign in again; local state is
    /// already cleared when that happens.
    pub async fn ensure_fresh(&self) -> AthenoResult<()> {
        let stale = {
            let session = self.session.lock().unwrap();
            match session.as_ref() {
                None => return Err(AuthError::NotSignedIn.into()),
                Some(s) if s.is_valid() => return Ok(()),
                Some(s) => s.refresh_token.clone(),
            }
        };

        match self.api.refresh_session(&stale).await {
            Ok(session) => {
                self.install_session(session);
                let _ = self.events.send(AuthEvent::TokenRefreshed);
                Ok(())
            }
            Err(err) => {
                tracing::warn!("Session refresh failed: {}", err);
                self.clear_local_state();
                Err(err)
            }
        }
    }

    /// The current user, if signed in.
    pub fn current_user(&self) -> Option<User> {
        self.user.get()
    }

    /// The current user's id, if signed in.
    pub fn user_id(&self) -> Option<String> {
        self.current_user().map(|u| u.id)
    }

    /// Coarse phase for routing decisions.
    pub fn phase(&self) -> AuthPhase {
        if self.loading.is_loading() {
            AuthPhase::Loading
        } else if self.current_user().is_some() {
            AuthPhase::SignedIn
        } else {
            AuthPhase::SignedOut
        }
    }

    /// Subscribe to the current-user value.
    pub fn subscribe_user(&self) -> tokio::sync::watch::Receiver<Option<User>> {
        self.user.subscribe()
    }

    /// Subscribe to auth change events.
    pub fn subscribe_events(&self) -> broadcast::Receiver<AuthEvent> {
        self.events.subscribe()
    }

    /// The debounced loading flag.
    pub fn loading(&self) -> &LoadingFlag {
        &self.loading
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::mock::{MockHttpClient, MockResponse};
    use crate::adapters::MemoryStorage;
    use crate::traits::{KeyValueStorage, Response};
    use bytes::Bytes;

    fn fixture(http: MockHttpClient) -> (AuthStore, MemoryStorage) {
        let storage = MemoryStorage::new();
        let client = SupabaseClient::new("https://p.supabase.co", "anon", Arc::new(http));
        let manager = SessionManager::new(Arc::new(storage.clone()));
        let cache = CacheStore::new(Arc::new(storage.clone()));
        (AuthStore::new(client, manager, cache), storage)
    }

    fn sign_in_body() -> Bytes {
        Bytes::from(
            r#"{
                "access_token": "jwt-1",
                "refresh_token": "refresh-1",
                "expires_in": 3600,
                "user": { "id": "u1", "email": "u@example.com" }
            }"#,
        )
    }

    #[tokio::test]
    async fn test_sign_in_installs_session() {
        let http = MockHttpClient::new();
        http.set_response(
            "https://p.supabase.co/auth/v1/token?grant_type=password",
            MockResponse::Success(Response::new(200, sign_in_body())),
        );

        let (store, _) = fixture(http);
        let mut events = store.subscribe_events();

        let user = store.sign_in("u@example.com", "pw").await.unwrap();
        assert_eq!(user.id, "u1");
        assert_eq!(store.user_id(), Some("u1".to_string()));
        assert_eq!(store.phase(), AuthPhase::SignedIn);
        assert!(matches!(events.recv().await, Ok(AuthEvent::SignedIn(_))));
    }

    #[tokio::test]
    async fn test_session_restored_from_storage() {
        let storage = MemoryStorage::new();
        SessionManager::new(Arc::new(storage.clone())).save(&Session {
            access_token: "jwt".to_string(),
            refresh_token: "refresh".to_string(),
            expires_at: i64::MAX,
            user: User {
                id: "u7".to_string(),
                email: None,
            },
        });

        let client =
            SupabaseClient::new("https://p.supabase.co", "anon", Arc::new(MockHttpClient::new()));
        let store = AuthStore::new(
            client.clone(),
            SessionManager::new(Arc::new(storage.clone())),
            CacheStore::new(Arc::new(storage)),
        );

        assert_eq!(store.user_id(), Some("u7".to_string()));
        assert_eq!(client.access_token(), Some("jwt".to_string()));
    }

    #[tokio::test]
    async fn test_expired_session_not_published_but_refreshable() {
        let storage = MemoryStorage::new();
        SessionManager::new(Arc::new(storage.clone())).save(&Session {
            access_token: "old-jwt".to_string(),
            refresh_token: "refresh-ok".to_string(),
            expires_at: 0,
            user: User {
                id: "u7".to_string(),
                email: None,
            },
        });

        let http = MockHttpClient::new();
        http.set_response(
            "https://p.supabase.co/auth/v1/token?grant_type=refresh_token",
            MockResponse::Success(Response::new(200, sign_in_body())),
        );

        let client = SupabaseClient::new("https://p.supabase.co", "anon", Arc::new(http));
        let store = AuthStore::new(
            client.clone(),
            SessionManager::new(Arc::new(storage.clone())),
            CacheStore::new(Arc::new(storage)),
        );

        // Expired session must not surface a user...
        assert_eq!(store.user_id(), None);
        assert_eq!(client.access_token(), None);

        // ...but its refresh token still gets us a fresh session.
        store.ensure_fresh().await.unwrap();
        assert_eq!(store.user_id(), Some("u1".to_string()));
        assert_eq!(client.access_token(), Some("jwt-1".to_string()));
    }

    #[tokio::test]
    async fn test_failed_refresh_clears_state() {
        let storage = MemoryStorage::new();
        SessionManager::new(Arc::new(storage.clone())).save(&Session {
            access_token: "old-jwt".to_string(),
            refresh_token: "revoked".to_string(),
            expires_at: 0,
            user: User {
                id: "u7".to_string(),
                email: None,
            },
        });

        let http = MockHttpClient::new();
        http.set_response(
            "https://p.supabase.co/auth/v1/token?grant_type=refresh_token",
            MockResponse::Success(Response::new(401, Bytes::from("revoked"))),
        );

        let client = SupabaseClient::new("https://p.supabase.co", "anon", Arc::new(http));
        let store = AuthStore::new(
            client,
            SessionManager::new(Arc::new(storage.clone())),
            CacheStore::new(Arc::new(storage.clone())),
        );

        assert!(store.ensure_fresh().await.is_err());
        assert_eq!(store.phase(), AuthPhase::SignedOut);
        assert_eq!(storage.get(SESSION_KEY).unwrap(), None);
    }

    #[tokio::test]
    async fn test_clear_local_state_clears_cache() {
        let http = MockHttpClient::new();
        http.set_response(
            "https://p.supabase.co/auth/v1/token?grant_type=password",
            MockResponse::Success(Response::new(200, sign_in_body())),
        );

        let (store, storage) = fixture(http);
        store.sign_in("u@example.com", "pw").await.unwrap();

        // Something unrelated in the cache.
        let cache = CacheStore::new(Arc::new(storage.clone()));
        cache.set("courses", serde_json::json!([1, 2]));

        let mut events = store.subscribe_events();
        store.clear_local_state();

        assert_eq!(store.user_id(), None);
        assert_eq!(cache.get("courses"), None);
        // Skip the SignedIn event from earlier if still buffered.
        loop {
            match events.try_recv() {
                Ok(AuthEvent::SignedOut) => break,
                Ok(_) => continue,
                Err(_) => panic!("expected SignedOut event"),
            }
        }
    }
}
