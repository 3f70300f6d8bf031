//! Settings and persisted session state for songfinder.
//!
//! # Features
//!
//! - **State codec**: [`StateCodec`] saves and restores the full
//!   [`ProcessingParameters`](songfinder_core::ProcessingParameters) snapshot,
//!   synchronously or on a worker thread
//! - **Blob stores**: [`BlobStore`] with a file-backed and an in-memory
//!   implementation
//! - **Settings**: [`Settings`], the user's `settings.toml`
//! - **Paths**: platform-specific config and state directories
//!
//! # Example
//!
//! ```rust,no_run
//! use songfinder_config::{FileBlobStore, Settings, StateCodec, paths};
//! use std::sync::Arc;
//!
//! let settings = Settings::load_default().unwrap();
//! let codec = StateCodec::new(Arc::new(FileBlobStore::new(paths::state_dir())));
//!
//! let mut params = codec.load().unwrap();
//! params.cutoff_hz = 3000;
//! codec.save(&params).unwrap();
//! ```

mod codec;
mod error;
mod settings;
mod store;

/// Platform-specific paths for settings and saved state.
pub mod paths;

pub use codec::{STATE_KEY, StateCodec};
pub use error::ConfigError;
pub use paths::{settings_path, state_dir, user_config_dir};
pub use settings::Settings;
pub use store::{BlobStore, FileBlobStore, MemoryBlobStore};
