//! Cached reactive store.
//!
//! `CachedStore` is the crate's rendition of the web client's
//! `createCachedStore`: a watchable value container layered over the TTL
//! cache. Construction seeds from cache when a fresh entry exists, writes
//! go through to the cache, and an optional async fetch function refreshes
//! the value from the backend. Observers subscribe through a
//! `tokio::sync::watch` receiver.

use std::sync::Arc;

use futures::future::BoxFuture;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::watch;

use crate::cache::CacheStore;
use crate::error::AthenoResult;

/// Async fetch function producing a fresh value for a store.
pub type FetchFn<T> = Arc<dyn Fn() -> BoxFuture<'static, AthenoResult<T>> + Send + Sync>;

/// A reactive value container with cache write-through and remote refresh.
///
/// Staleness-aware by design: a failed refresh leaves the current (possibly
/// stale) value in place, because stale data beats no data for this app.
pub struct CachedStore<T> {
    key: String,
    cache: CacheStore,
    tx: watch::Sender<T>,
    // Held so sends never fail when all external receivers are dropped.
    _rx: watch::Receiver<T>,
    fetch: Option<FetchFn<T>>,
    ttl: Option<std::time::Duration>,
}

impl<T> CachedStore<T>
where
    T: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
{
    /// Create a store seeded from the cache, falling back to `initial`.
    pub fn new(key: &str, initial: T, cache: CacheStore) -> Self {
        let seed = cache.get_as::<T>(key).unwrap_or(initial);
        let (tx, rx) = watch::channel(seed);
        Self {
            key: key.to_string(),
            cache,
            tx,
            _rx: rx,
            fetch: None,
            ttl: None,
        }
    }

    /// Use a per-store TTL instead of the cache's default (e.g. the user
    /// value is cached for 5 minutes, not 24 hours).
    pub fn with_ttl(mut self, ttl: std::time::Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Create a store with a bound fetch function.
    ///
    /// The fetch does not run here; call [`refresh`](Self::refresh) to pull
    /// the first remote value (the web client ran it on construction, which a
    /// library cannot do without an executor at hand).
    pub fn with_fetch(key: &str, initial: T, cache: CacheStore, fetch: FetchFn<T>) -> Self {
        let mut store = Self::new(key, initial, cache);
        store.fetch = Some(fetch);
        store
    }

    /// The cache key this store persists under.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Clone of the current value.
    pub fn get(&self) -> T {
        self.tx.borrow().clone()
    }

    /// Subscribe to value changes.
    pub fn subscribe(&self) -> watch::Receiver<T> {
        self.tx.subscribe()
    }

    /// Set the value, notifying subscribers and writing through to cache.
    pub fn set(&self, value: T) {
        match (serde_json::to_value(&value), self.ttl) {
            (Ok(json), Some(ttl)) => self.cache.set_with_ttl(&self.key, json, ttl),
            (Ok(json), None) => self.cache.set(&self.key, json),
            (Err(err), _) => tracing::warn!("Failed to serialize '{}': {}", self.key, err),
        }
        self.tx.send_replace(value);
    }

    /// Update the value in place, notifying subscribers and writing
    /// through to cache.
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&T) -> T,
    {
        let next = f(&self.tx.borrow());
        self.set(next);
    }

    /// Run the bound fetch function and replace the value on success.
    ///
    /// On failure the current value stays in place and the error is
    /// returned. A store without a fetch function refreshes to itself.
    pub async fn refresh(&self) -> AthenoResult<()> {
        let fetch = match &self.fetch {
            Some(fetch) => Arc::clone(fetch),
            None => return Ok(()),
        };

        match fetch().await {
            Ok(value) => {
                self.set(value);
                Ok(())
            }
            Err(err) => {
                tracing::warn!("Refresh of '{}' failed: {}", self.key, err);
                Err(err)
            }
        }
    }

    /// Reset to `value` without writing to the cache, and drop the cache
    /// entry. Used on sign-out.
    pub fn reset(&self, value: T) {
        self.cache.remove(&self.key);
        self.tx.send_replace(value);
    }
}
