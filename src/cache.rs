//! TTL key/value cache over local storage.
//!
//! Entries are stored under a common prefix with their write timestamp and
//! per-entry TTL, matching the layout the web client used in
//! `localStorage`. Expired or corrupt entries are treated as absent and
//! removed on sight.

use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::config::DEFAULT_CACHE_TTL;
use crate::traits::KeyValueStorage;

/// Prefix for every cache key in storage.
pub const CACHE_PREFIX: &str = "Atheno_cache_";

/// A stored cache entry: the value plus freshness metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CacheEntry {
    value: serde_json::Value,
    /// Unix milliseconds at write time.
    timestamp: i64,
    /// TTL in milliseconds.
    expiry: i64,
}

impl CacheEntry {
    fn is_expired(&self, now_ms: i64) -> bool {
        now_ms - self.timestamp > self.expiry
    }
}

/// TTL cache layered over a [`KeyValueStorage`].
///
/// Storage failures degrade to cache misses: the cache is an optimization,
/// never a source of truth, so a broken disk must not take reads down.
#[derive(Clone)]
pub struct CacheStore {
    storage: Arc<dyn KeyValueStorage>,
    default_ttl: Duration,
}

impl CacheStore {
    /// Create a cache over `storage` with the default 24 h TTL, purging
    /// expired entries left over from previous runs.
    pub fn new(storage: Arc<dyn KeyValueStorage>) -> Self {
        Self::with_default_ttl(storage, DEFAULT_CACHE_TTL)
    }

    /// Create a cache with a custom default TTL.
    pub fn with_default_ttl(storage: Arc<dyn KeyValueStorage>, default_ttl: Duration) -> Self {
        let cache = Self {
            storage,
            default_ttl,
        };
        cache.purge_expired();
        cache
    }

    fn now_ms() -> i64 {
        chrono::Utc::now().timestamp_millis()
    }

    fn storage_key(key: &str) -> String {
        format!("{}{}", CACHE_PREFIX, key)
    }

    /// Store a JSON value under `key` with the default TTL.
    pub fn set(&self, key: &str, value: serde_json::Value) {
        self.set_with_ttl(key, value, self.default_ttl);
    }

    /// Store a JSON value under `key` with an explicit TTL.
    pub fn set_with_ttl(&self, key: &str, value: serde_json::Value, ttl: Duration) {
        let entry = CacheEntry {
            value,
            timestamp: Self::now_ms(),
            expiry: ttl.as_millis() as i64,
        };
        let serialized = match serde_json::to_string(&entry) {
            Ok(s) => s,
            Err(err) => {
                tracing::warn!("Failed to serialize cache entry for {}: {}", key, err);
                return;
            }
        };
        if let Err(err) = self.storage.set(&Self::storage_key(key), &serialized) {
            tracing::warn!("Failed to write cache entry for {}: {}", key, err);
        } else {
            tracing::debug!("Cache set for key: {}", key);
        }
    }

    /// Store a serializable value under `key` with the default TTL.
    pub fn set_as<T: Serialize>(&self, key: &str, value: &T) {
        match serde_json::to_value(value) {
            Ok(json) => self.set(key, json),
            Err(err) => tracing::warn!("Failed to serialize value for {}: {}", key, err),
        }
    }

    /// Read the value under `key` if present and fresh.
    ///
    /// Expired and corrupt entries are removed and reported as misses.
    pub fn get(&self, key: &str) -> Option<serde_json::Value> {
        let storage_key = Self::storage_key(key);
        let raw = self.storage.get(&storage_key).ok()??;

        match serde_json::from_str::<CacheEntry>(&raw) {
            Ok(entry) if !entry.is_expired(Self::now_ms()) => Some(entry.value),
            Ok(_) => {
                let _ = self.storage.remove(&storage_key);
                None
            }
            Err(_) => {
                let _ = self.storage.remove(&storage_key);
                None
            }
        }
    }

    /// Read and deserialize the value under `key` if present and fresh.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.get(key)?;
        serde_json::from_value(value).ok()
    }

    /// Remove the entry under `key`.
    pub fn remove(&self, key: &str) {
        let _ = self.storage.remove(&Self::storage_key(key));
    }

    /// Remove every cache entry (only keys with the cache prefix).
    pub fn clear(&self) {
        if let Ok(keys) = self.storage.keys() {
            for key in keys {
                if key.starts_with(CACHE_PREFIX) {
                    let _ = self.storage.remove(&key);
                }
            }
        }
    }

    /// List cached keys with the prefix stripped.
    pub fn keys(&self) -> Vec<String> {
        match self.storage.keys() {
            Ok(keys) => keys
                .into_iter()
                .filter_map(|key| key.strip_prefix(CACHE_PREFIX).map(|k| k.to_string()))
                .collect(),
            Err(_) => Vec::new(),
        }
    }

    /// Drop expired and corrupt entries.
    ///
    /// Run at construction so stale data from previous runs does not
    /// linger on disk.
    pub fn purge_expired(&self) {
        let keys = match self.storage.keys() {
            Ok(keys) => keys,
            Err(_) => return,
        };
        let now = Self::now_ms();
        for key in keys {
            if !key.starts_with(CACHE_PREFIX) {
                continue;
            }
            let stale = match self.storage.get(&key) {
                Ok(Some(raw)) => match serde_json::from_str::<CacheEntry>(&raw) {
                    Ok(entry) => entry.is_expired(now),
                    Err(_) => true,
                },
                _ => false,
            };
            if stale {
                tracing::debug!("Purging expired cache entry: {}", key);
                let _ = self.storage.remove(&key);
            }
        }
    }

    /// The default TTL for entries written without an explicit TTL.
    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }
}
