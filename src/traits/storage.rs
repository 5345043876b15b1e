//! Local key/value storage trait abstraction.
//!
//! The web client persisted caches, the session and the offline
//! queue in `localStorage`. This trait mirrors that surface so production
//! code can use file-backed storage while tests run fully in memory.

/// Storage errors.
#[derive(Debug, Clone)]
pub enum StorageError {
    /// Underlying IO failed
    Io(String),
    /// Stored value could not be (de)serialized
    Serialization(String),
    /// No usable storage location (e.g. no home directory)
    Unavailable(String),
}

impl std::fmt::Display for StorageError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageError::Io(msg) => write!(f, "Storage IO error: {}", msg),
            StorageError::Serialization(msg) => write!(f, "Storage serialization error: {}", msg),
            StorageError::Unavailable(msg) => write!(f, "Storage unavailable: {}", msg),
        }
    }
}

impl std::error::Error for StorageError {}

/// Trait for key/value persistence.
///
/// Keys are opaque strings; values are stored as raw strings (callers
/// serialize through serde where needed). Implementations must tolerate
/// concurrent readers; writers are expected to be serialized by the caller.
pub trait KeyValueStorage: Send + Sync {
    /// Read the value stored under `key`, or `None` if absent.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any existing value.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Remove the value stored under `key`. Removing an absent key is not
    /// an error.
    fn remove(&self, key: &str) -> Result<(), StorageError>;

    /// List all stored keys.
    fn keys(&self) -> Result<Vec<String>, StorageError>;
}
