//! Key-value blob stores behind the state codec.
//!
//! A [`BlobStore`] maps a short key to opaque bytes. Reads of an absent key
//! return `Ok(None)`, never an error. Implementations block; the codec calls
//! them off the owning thread.

use crate::ConfigError;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

/// Durable key-value storage for serialized state.
pub trait BlobStore: Send + Sync {
    /// Reads the blob stored under `key`, or `None` if absent.
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>, ConfigError>;

    /// Stores `bytes` under `key`, replacing any previous blob.
    fn write(&self, key: &str, bytes: &[u8]) -> Result<(), ConfigError>;

    /// Deletes the blob under `key`. Returns whether one existed.
    fn remove(&self, key: &str) -> Result<bool, ConfigError>;

    /// Where the blob for `key` lives, if the store is file-backed.
    fn location(&self, _key: &str) -> Option<PathBuf> {
        None
    }
}

/// Stores each blob as `<dir>/<key>.toml`.
#[derive(Debug, Clone)]
pub struct FileBlobStore {
    dir: PathBuf,
}

impl FileBlobStore {
    /// Creates a store rooted at `dir`. The directory is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Root directory of the store.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, ConfigError> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(ConfigError::InvalidKey(key.to_string()));
        }
        Ok(self.dir.join(format!("{key}.toml")))
    }
}

impl BlobStore for FileBlobStore {
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>, ConfigError> {
        let path = self.path_for(key)?;
        match std::fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(ConfigError::read_file(path, e)),
        }
    }

    fn write(&self, key: &str, bytes: &[u8]) -> Result<(), ConfigError> {
        let path = self.path_for(key)?;
        if !self.dir.exists() {
            std::fs::create_dir_all(&self.dir)
                .map_err(|e| ConfigError::create_dir(&self.dir, e))?;
        }

        // Write-then-rename so a crash never leaves a torn snapshot.
        let staging = path.with_extension("toml.tmp");
        std::fs::write(&staging, bytes).map_err(|e| ConfigError::write_file(&staging, e))?;
        std::fs::rename(&staging, &path).map_err(|e| ConfigError::write_file(&path, e))?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<bool, ConfigError> {
        let path = self.path_for(key)?;
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(ConfigError::remove_file(path, e)),
        }
    }

    fn location(&self, key: &str) -> Option<PathBuf> {
        self.path_for(key).ok()
    }
}

/// In-memory store for tests and ephemeral sessions.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blobs: Mutex<BTreeMap<String, Vec<u8>>>,
    fail_writes: AtomicBool,
}

impl MemoryBlobStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes subsequent writes fail (or succeed again).
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::Release);
    }

    /// Stores raw bytes directly, bypassing failure injection.
    pub fn insert(&self, key: &str, bytes: impl Into<Vec<u8>>) {
        self.blobs.lock().insert(key.to_string(), bytes.into());
    }

    /// Raw bytes under `key`.
    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.blobs.lock().get(key).cloned()
    }
}

impl BlobStore for MemoryBlobStore {
    fn read(&self, key: &str) -> Result<Option<Vec<u8>>, ConfigError> {
        Ok(self.get(key))
    }

    fn write(&self, key: &str, bytes: &[u8]) -> Result<(), ConfigError> {
        if self.fail_writes.load(Ordering::Acquire) {
            return Err(ConfigError::write_file(
                format!("memory:{key}"),
                std::io::Error::other("write failure injected"),
            ));
        }
        self.insert(key, bytes);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<bool, ConfigError> {
        Ok(self.blobs.lock().remove(key).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn file_store_absent_key_is_none() {
        let dir = TempDir::new().unwrap();
        let store = FileBlobStore::new(dir.path().join("state"));
        assert_eq!(store.read("params").unwrap(), None);
        assert!(!store.remove("params").unwrap());
    }

    #[test]
    fn file_store_creates_dir_and_roundtrips() {
        let dir = TempDir::new().unwrap();
        let store = FileBlobStore::new(dir.path().join("nested").join("state"));
        store.write("params", b"cutoff_hz = 2500\n").unwrap();
        assert_eq!(
            store.read("params").unwrap().as_deref(),
            Some(&b"cutoff_hz = 2500\n"[..])
        );
        assert!(store.location("params").unwrap().ends_with("params.toml"));
        assert!(store.remove("params").unwrap());
        assert_eq!(store.read("params").unwrap(), None);
    }

    #[test]
    fn file_store_rejects_path_keys() {
        let dir = TempDir::new().unwrap();
        let store = FileBlobStore::new(dir.path());
        assert!(matches!(
            store.write("../escape", b""),
            Err(ConfigError::InvalidKey(_))
        ));
        assert!(store.location("").is_none());
    }

    #[test]
    fn memory_store_failure_injection() {
        let store = MemoryBlobStore::new();
        store.set_fail_writes(true);
        assert!(store.write("k", b"v").is_err());
        store.set_fail_writes(false);
        store.write("k", b"v").unwrap();
        assert_eq!(store.read("k").unwrap(), Some(b"v".to_vec()));
    }
}
