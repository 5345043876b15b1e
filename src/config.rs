//! Configuration for the data layer.
//!
//! Endpoints and keys come from the environment (the web client read
//! them from Vite's `import.meta.env`); timing knobs default to the
//! values the web client shipped with and can be overridden for
//! tests.

use std::path::PathBuf;
use std::time::Duration;

/// Environment variable holding the Supabase project URL.
pub const ENV_SUPABASE_URL: &str = "ATHENO_SUPABASE_URL";

/// Environment variable holding the Supabase anon (publishable) key.
pub const ENV_SUPABASE_ANON_KEY: &str = "ATHENO_SUPABASE_ANON_KEY";

/// Environment variable holding the Gemini API key.
pub const ENV_GEMINI_API_KEY: &str = "ATHENO_GEMINI_API_KEY";

/// Default cache entry TTL (24 hours).
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// TTL for the cached user session value (5 minutes).
pub const USER_CACHE_TTL: Duration = Duration::from_secs(5 * 60);

/// Debounce before the loading flag flips on (300 ms).
pub const LOADING_DEBOUNCE: Duration = Duration::from_millis(300);

/// Interval between periodic sync passes (2 minutes).
pub const SYNC_INTERVAL: Duration = Duration::from_secs(2 * 60);

/// Staleness threshold for focus-triggered refreshes (5 minutes).
pub const REFRESH_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Data-layer configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Supabase project URL, e.g. `https://abc.supabase.co`.
    pub supabase_url: String,
    /// Supabase anon key, sent as `apikey` on every request.
    pub supabase_anon_key: String,
    /// Gemini API key for content generation.
    pub gemini_api_key: String,
    /// Local data directory; `None` selects the default (`~/.atheno`).
    pub data_dir: Option<PathBuf>,
    /// Default TTL for cache entries.
    pub cache_ttl: Duration,
    /// Interval between periodic sync passes.
    pub sync_interval: Duration,
    /// Staleness threshold for focus-triggered refreshes.
    pub refresh_interval: Duration,
}

/// Error produced when required configuration is missing.
#[derive(Debug, Clone, thiserror::Error)]
#[error("Missing required configuration: {variable}")]
pub struct MissingConfig {
    /// Name of the missing environment variable.
    pub variable: &'static str,
}

impl Config {
    /// Build a configuration with explicit endpoints and default timings.
    pub fn new(supabase_url: &str, supabase_anon_key: &str, gemini_api_key: &str) -> Self {
        Self {
            supabase_url: supabase_url.trim_end_matches('/').to_string(),
            supabase_anon_key: supabase_anon_key.to_string(),
            gemini_api_key: gemini_api_key.to_string(),
            data_dir: None,
            cache_ttl: DEFAULT_CACHE_TTL,
            sync_interval: SYNC_INTERVAL,
            refresh_interval: REFRESH_INTERVAL,
        }
    }

    /// Load configuration from the environment.
    pub fn from_env() -> Result<Self, MissingConfig> {
        let supabase_url = std::env::var(ENV_SUPABASE_URL).map_err(|_| MissingConfig {
            variable: ENV_SUPABASE_URL,
        })?;
        let supabase_anon_key = std::env::var(ENV_SUPABASE_ANON_KEY).map_err(|_| MissingConfig {
            variable: ENV_SUPABASE_ANON_KEY,
        })?;
        // The AI key is optional at load time; generation fails without it.
        let gemini_api_key = std::env::var(ENV_GEMINI_API_KEY).unwrap_or_default();

        Ok(Self::new(&supabase_url, &supabase_anon_key, &gemini_api_key))
    }

    /// Override the local data directory.
    pub fn with_data_dir(mut self, dir: PathBuf) -> Self {
        self.data_dir = Some(dir);
        self
    }

    /// Override the default cache TTL.
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Override the sync interval.
    pub fn with_sync_interval(mut self, interval: Duration) -> Self {
        self.sync_interval = interval;
        self
    }

    /// Override the refresh staleness threshold.
    pub fn with_refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval = interval;
        self
    }
}
