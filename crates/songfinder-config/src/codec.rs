//! Persisted state codec.
//!
//! [`StateCodec`] turns a [`ProcessingParameters`] snapshot into TOML bytes
//! and back, and moves the blocking store I/O onto a worker thread:
//!
//! ```text
//! owning thread            worker thread                 owning thread
//! ─────────────            ─────────────                 ─────────────
//! load_async(done) ──────► store.read → decode ─► done(result) ─► event queue
//! save_async(p, done) ───► encode → store.write ─► done(result) ─► event queue
//! ```
//!
//! The completion runs on the worker; callers hand in a closure that posts the
//! result back to their own thread. An absent blob loads as defaults; a
//! present but malformed blob is an error.

use crate::ConfigError;
use crate::store::BlobStore;
use songfinder_core::ProcessingParameters;
use std::sync::Arc;
use std::thread::JoinHandle;

/// Store key of the parameter snapshot.
pub const STATE_KEY: &str = "processing-parameters";

/// Serializes parameter snapshots into a [`BlobStore`].
#[derive(Clone)]
pub struct StateCodec {
    store: Arc<dyn BlobStore>,
    key: String,
}

impl StateCodec {
    /// Creates a codec writing under [`STATE_KEY`].
    pub fn new(store: Arc<dyn BlobStore>) -> Self {
        Self::with_key(store, STATE_KEY)
    }

    /// Creates a codec writing under a custom key.
    pub fn with_key(store: Arc<dyn BlobStore>, key: impl Into<String>) -> Self {
        Self {
            store,
            key: key.into(),
        }
    }

    /// Store key of the snapshot.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The underlying store.
    pub fn store(&self) -> &Arc<dyn BlobStore> {
        &self.store
    }

    /// Encodes a snapshot as TOML.
    pub fn encode(params: &ProcessingParameters) -> Result<Vec<u8>, ConfigError> {
        Ok(toml::to_string_pretty(params)?.into_bytes())
    }

    /// Decodes a TOML snapshot. Missing fields take their defaults.
    pub fn decode(bytes: &[u8]) -> Result<ProcessingParameters, ConfigError> {
        let text = String::from_utf8(bytes.to_vec())?;
        Ok(toml::from_str(&text)?)
    }

    /// Loads the snapshot, blocking. Absent ⇒ defaults.
    pub fn load(&self) -> Result<ProcessingParameters, ConfigError> {
        match self.store.read(&self.key)? {
            Some(bytes) => Self::decode(&bytes),
            None => {
                tracing::debug!(key = %self.key, "no saved state, using defaults");
                Ok(ProcessingParameters::default())
            }
        }
    }

    /// Saves the snapshot, blocking.
    pub fn save(&self, params: &ProcessingParameters) -> Result<(), ConfigError> {
        let bytes = Self::encode(params)?;
        self.store.write(&self.key, &bytes)
    }

    /// Deletes the saved snapshot. Returns whether one existed.
    pub fn reset(&self) -> Result<bool, ConfigError> {
        self.store.remove(&self.key)
    }

    /// Loads on a worker thread and hands the result to `completion`.
    pub fn load_async<F>(&self, completion: F) -> Result<JoinHandle<()>, ConfigError>
    where
        F: FnOnce(Result<ProcessingParameters, ConfigError>) + Send + 'static,
    {
        let codec = self.clone();
        std::thread::Builder::new()
            .name("songfinder-state-load".into())
            .spawn(move || completion(codec.load()))
            .map_err(ConfigError::Worker)
    }

    /// Saves on a worker thread and hands the result to `completion`.
    pub fn save_async<F>(
        &self,
        params: ProcessingParameters,
        completion: F,
    ) -> Result<JoinHandle<()>, ConfigError>
    where
        F: FnOnce(Result<(), ConfigError>) + Send + 'static,
    {
        let codec = self.clone();
        std::thread::Builder::new()
            .name("songfinder-state-save".into())
            .spawn(move || completion(codec.save(&params)))
            .map_err(ConfigError::Worker)
    }
}

impl std::fmt::Debug for StateCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateCodec")
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}
