//! Key/value persistence for store snapshots.
//!
//! Both stores follow the same pattern: restore a snapshot when they are
//! constructed, persist a fresh one after every mutation. The storage scope
//! is chosen by the caller: [`FileStorage`] survives restarts,
//! [`MemoryStorage`] lives only as long as the process.

use crate::error::StorageError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing::{debug, warn};

/// Opaque string storage keyed by snapshot name.
pub trait Storage: Send + Sync {
    /// Returns the stored value, or `None` if the key was never written.
    fn read(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Replaces the stored value.
    fn write(&self, key: &str, value: &str) -> Result<(), StorageError>;
}

/// Durable storage: one JSON file per key inside a directory.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Create storage rooted at `dir`. The directory is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl Storage for FileStorage {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key);
        if !path.exists() {
            return Ok(None);
        }

        fs::read_to_string(&path)
            .map(Some)
            .map_err(|source| StorageError::Io {
                key: key.to_string(),
                source,
            })
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let io_err = |source: std::io::Error| StorageError::Io {
            key: key.to_string(),
            source,
        };

        fs::create_dir_all(&self.dir).map_err(io_err)?;

        // Write-then-rename so a crash never leaves a torn snapshot.
        let path = self.path_for(key);
        let temp_path = path.with_extension("json.tmp");
        fs::write(&temp_path, value).map_err(io_err)?;
        fs::rename(&temp_path, &path).map_err(io_err)?;

        debug!("Persisted {} to {}", key, path.display());
        Ok(())
    }
}

/// Session-scoped storage held in memory.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        Ok(entries.get(key).cloned())
    }

    fn write(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// Load and decode a snapshot.
pub fn load_snapshot<T: DeserializeOwned>(
    storage: &dyn Storage,
    key: &str,
) -> Result<Option<T>, StorageError> {
    let Some(content) = storage.read(key)? else {
        return Ok(None);
    };

    serde_json::from_str(&content)
        .map(Some)
        .map_err(|source| StorageError::Serialize {
            key: key.to_string(),
            source,
        })
}

/// Encode and store a snapshot.
pub fn save_snapshot<T: Serialize>(
    storage: &dyn Storage,
    key: &str,
    value: &T,
) -> Result<(), StorageError> {
    let content =
        serde_json::to_string_pretty(value).map_err(|source| StorageError::Serialize {
            key: key.to_string(),
            source,
        })?;

    storage.write(key, &content)
}

/// Restore a snapshot, treating any failure as "nothing stored".
pub fn restore<T: DeserializeOwned>(storage: &dyn Storage, key: &str) -> Option<T> {
    match load_snapshot(storage, key) {
        Ok(value) => value,
        Err(e) => {
            warn!("Ignoring unreadable snapshot: {}", e);
            None
        }
    }
}

/// Persist a snapshot, logging instead of failing.
pub fn persist<T: Serialize>(storage: &dyn Storage, key: &str, value: &T) {
    if let Err(e) = save_snapshot(storage, key, value) {
        warn!("Failed to persist snapshot: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_file_storage_roundtrip() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("state"));

        assert!(storage.read("notes").unwrap().is_none());
        storage.write("notes", "[1,2,3]").unwrap();
        assert_eq!(storage.read("notes").unwrap().as_deref(), Some("[1,2,3]"));
        assert!(dir.path().join("state").join("notes.json").exists());
        assert!(!dir.path().join("state").join("notes.json.tmp").exists());
    }

    #[test]
    fn test_file_storage_overwrites() {
        let dir = tempdir().unwrap();
        let storage = FileStorage::new(dir.path());

        storage.write("k", "old").unwrap();
        storage.write("k", "new").unwrap();
        assert_eq!(storage.read("k").unwrap().as_deref(), Some("new"));
    }

    #[test]
    fn test_memory_storage_is_isolated_per_instance() {
        let first = MemoryStorage::new();
        let second = MemoryStorage::new();

        first.write("k", "v").unwrap();
        assert_eq!(first.read("k").unwrap().as_deref(), Some("v"));
        assert!(second.read("k").unwrap().is_none());
    }

    #[test]
    fn test_restore_corrupt_snapshot_is_none() {
        let storage = MemoryStorage::new();
        storage.write("k", "{not json").unwrap();

        assert!(load_snapshot::<Vec<u32>>(&storage, "k").is_err());
        assert!(restore::<Vec<u32>>(&storage, "k").is_none());
    }

    #[test]
    fn test_persist_then_restore() {
        let storage = MemoryStorage::new();
        persist(&storage, "k", &vec![1u32, 2, 3]);
        assert_eq!(restore::<Vec<u32>>(&storage, "k"), Some(vec![1, 2, 3]));
    }
}
