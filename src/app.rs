//! Crate assembly.
//!
//! Wires the whole data layer together from a [`Config`]: storage,
//! cache, backend client, auth, domain stores, offline queue, sync
//! scheduler and the AI client. Hosts that need a different composition
//! can still build the pieces directly.

use std::sync::Arc;

use crate::adapters::{FileStorage, ReqwestHttpClient};
use crate::ai::GeminiClient;
use crate::auth::{AuthStore, SessionManager};
use crate::backend::SupabaseClient;
use crate::cache::CacheStore;
use crate::config::Config;
use crate::queue::OfflineQueue;
use crate::stores::DataStores;
use crate::sync::{Connectivity, SyncScheduler};
use crate::traits::{HttpClient, KeyValueStorage, StorageError};

/// The assembled data layer.
///
/// Owns one instance of every subsystem, all sharing the same storage,
/// cache and HTTP adapter. Call [`SyncScheduler::spawn`] on
/// [`scheduler`](Self::scheduler) to start background sync.
pub struct DataLayer {
    pub config: Config,
    pub client: SupabaseClient,
    pub auth: AuthStore,
    pub stores: Arc<DataStores>,
    pub queue: OfflineQueue,
    pub connectivity: Connectivity,
    pub scheduler: SyncScheduler,
    pub ai: GeminiClient,
}

impl DataLayer {
    /// Assemble the layer from `config` with file-backed storage and the
    /// production HTTP adapter.
    pub fn from_config(config: Config) -> Result<Self, StorageError> {
        let storage = Arc::new(FileStorage::from_config(&config)?);
        let http = Arc::new(ReqwestHttpClient::new());
        Ok(Self::assemble(config, storage, http))
    }

    /// Assemble the layer over explicit storage and HTTP adapters. Tests
    /// pass the in-memory and mock ones.
    pub fn assemble(
        config: Config,
        storage: Arc<dyn KeyValueStorage>,
        http: Arc<dyn HttpClient>,
    ) -> Self {
        let cache = CacheStore::with_default_ttl(storage.clone(), config.cache_ttl);
        let client = SupabaseClient::from_config(&config, http.clone());
        let auth = AuthStore::new(
            client.clone(),
            SessionManager::new(storage.clone()),
            cache.clone(),
        );
        let stores = Arc::new(DataStores::new(client.clone(), cache.clone()));
        let queue = OfflineQueue::new(storage);
        let connectivity = Connectivity::new();
        let scheduler = SyncScheduler::from_config(
            &config,
            queue.clone(),
            Arc::clone(&stores),
            connectivity.clone(),
        );
        let ai = GeminiClient::from_config(&config, http).with_cache(cache);

        // A session restored from storage scopes the stores immediately.
        stores.set_user(auth.user_id());

        Self {
            config,
            client,
            auth,
            stores,
            queue,
            connectivity,
            scheduler,
            ai,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::mock::MockHttpClient;
    use crate::adapters::MemoryStorage;
    use crate::auth::{Session, User};
    use std::time::Duration;

    fn config() -> Config {
        Config::new("https://p.supabase.co/", "anon", "gem-key")
    }

    #[tokio::test]
    async fn test_assemble_wires_endpoints_from_config() {
        let layer = DataLayer::assemble(
            config().with_cache_ttl(Duration::from_secs(60)),
            Arc::new(MemoryStorage::new()),
            Arc::new(MockHttpClient::new()),
        );

        assert_eq!(layer.client.base_url(), "https://p.supabase.co");
        assert_eq!(layer.client.anon_key(), "anon");
        assert_eq!(layer.config.cache_ttl, Duration::from_secs(60));
        assert!(layer.stores.current_user_id().is_none());
        assert!(layer.queue.is_empty());
    }

    #[tokio::test]
    async fn test_assemble_scopes_stores_to_restored_session() {
        let storage = Arc::new(MemoryStorage::new());
        SessionManager::new(storage.clone()).save(&Session {
            access_token: "jwt".to_string(),
            refresh_token: "refresh".to_string(),
            expires_at: i64::MAX,
            user: User {
                id: "u7".to_string(),
                email: None,
            },
        });

        let layer = DataLayer::assemble(config(), storage, Arc::new(MockHttpClient::new()));

        assert_eq!(layer.stores.current_user_id().as_deref(), Some("u7"));
        assert_eq!(layer.client.access_token(), Some("jwt".to_string()));
    }
}
