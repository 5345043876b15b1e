//! File-backed key/value storage.
//!
//! Persists each key as a file under a data directory, default
//! `~/.atheno`. This is the native replacement for the browser
//! `localStorage` the web client stored its caches, session and
//! offline queue in.

use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use crate::traits::{KeyValueStorage, StorageError};

/// The default storage directory name under the home directory.
const STORAGE_DIR: &str = ".atheno";

/// File extension for stored values.
const VALUE_EXT: &str = "json";

/// File-backed implementation of [`KeyValueStorage`].
///
/// Keys are percent-encoded to produce safe file names, so any string key
/// round-trips. Writes go through a mutex to serialize concurrent writers
/// within the process.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
    write_lock: Arc<Mutex<()>>,
}

impl FileStorage {
    /// Create a storage rooted at the default location (`~/.atheno`).
    ///
    /// Returns an error if the home directory cannot be determined or the
    /// directory cannot be created.
    pub fn new() -> Result<Self, StorageError> {
        let home = dirs::home_dir()
            .ok_or_else(|| StorageError::Unavailable("no home directory".to_string()))?;
        Self::with_dir(home.join(STORAGE_DIR))
    }

    /// Create a storage rooted at the directory a
    /// [`Config`](crate::config::Config) names, or the default location
    /// when it names none.
    pub fn from_config(config: &crate::config::Config) -> Result<Self, StorageError> {
        match &config.data_dir {
            Some(dir) => Self::with_dir(dir.clone()),
            None => Self::new(),
        }
    }

    /// Create a storage rooted at a specific directory.
    pub fn with_dir(dir: PathBuf) -> Result<Self, StorageError> {
        if !dir.exists() {
            fs::create_dir_all(&dir).map_err(|e| StorageError::Io(e.to_string()))?;
        }
        Ok(Self {
            dir,
            write_lock: Arc::new(Mutex::new(())),
        })
    }

    /// The directory values are stored under.
    pub fn dir(&self) -> &PathBuf {
        &self.dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        let encoded = urlencoding::encode(key);
        self.dir.join(format!("{}.{}", encoded, VALUE_EXT))
    }

    fn key_from_file_name(name: &str) -> Option<String> {
        let stem = name.strip_suffix(&format!(".{}", VALUE_EXT))?;
        urlencoding::decode(stem).ok().map(|k| k.into_owned())
    }
}

impl KeyValueStorage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }
        let value = fs::read_to_string(&path).map_err(|e| StorageError::Io(e.to_string()))?;
        Ok(Some(value))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().unwrap();
        fs::write(self.path_for(key), value).map_err(|e| StorageError::Io(e.to_string()))
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().unwrap();
        let path = self.path_for(key);
        if path.exists() {
            fs::remove_file(&path).map_err(|e| StorageError::Io(e.to_string()))?;
        }
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        let entries = fs::read_dir(&self.dir).map_err(|e| StorageError::Io(e.to_string()))?;
        let mut keys = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| StorageError::Io(e.to_string()))?;
            if let Some(name) = entry.file_name().to_str() {
                if let Some(key) = Self::key_from_file_name(name) {
                    keys.push(key);
                }
            }
        }
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_round_trip() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::with_dir(dir.path().to_path_buf()).unwrap();

        storage.set("Atheno_cache_courses", r#"{"v":1}"#).unwrap();
        assert_eq!(
            storage.get("Atheno_cache_courses").unwrap(),
            Some(r#"{"v":1}"#.to_string())
        );
    }

    #[test]
    fn test_key_with_unsafe_characters() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::with_dir(dir.path().to_path_buf()).unwrap();

        let key = "ai_roadmap/linear algebra?v=2";
        storage.set(key, "cached").unwrap();
        assert_eq!(storage.get(key).unwrap(), Some("cached".to_string()));
        assert!(storage.keys().unwrap().contains(&key.to_string()));
    }

    #[test]
    fn test_from_config_uses_named_data_dir() {
        let dir = tempdir().unwrap();
        let config = crate::config::Config::new("u", "k", "g")
            .with_data_dir(dir.path().join("store"));

        let storage = FileStorage::from_config(&config).unwrap();
        assert_eq!(storage.dir(), &dir.path().join("store"));
        storage.set("sb_request_queue", "[]").unwrap();
        assert!(dir.path().join("store").exists());
    }

    #[test]
    fn test_missing_key_returns_none() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::with_dir(dir.path().to_path_buf()).unwrap();
        assert_eq!(storage.get("nope").unwrap(), None);
    }

    #[test]
    fn test_remove() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::with_dir(dir.path().to_path_buf()).unwrap();

        storage.set("gone", "soon").unwrap();
        storage.remove("gone").unwrap();
        assert_eq!(storage.get("gone").unwrap(), None);
        // removing again is fine
        storage.remove("gone").unwrap();
    }
}
