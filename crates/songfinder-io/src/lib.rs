//! Platform audio collaborators for the songfinder session.
//!
//! This crate provides:
//!
//! - **Platform session**: [`PlatformSession`], the hardware query/mutator surface
//!   (current input port, gain capability, channel counts, preferred input)
//! - **Audio graph**: [`AudioGraph`], attach/activate/deactivate/detach of the
//!   effect between hardware input and output
//! - **cpal backends**: [`CpalSession`] and [`CpalGraph`], the desktop
//!   implementations of both traits
//! - **Device watcher**: [`DeviceWatcher`], which turns default-device changes
//!   into route-change notifications
//! - **Mocks**: [`mock::MockSession`] and [`mock::MockGraph`], deterministic
//!   doubles for tests
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use songfinder_io::{AudioGraph, CpalSession, PlatformSession};
//! use songfinder_core::GainBalanceUnit;
//! use std::sync::Arc;
//!
//! let mut session = CpalSession::new(None, None);
//! session.configure(48000, 128)?;
//! let mut graph = session.graph(Arc::new(|err: &str| eprintln!("{err}")));
//!
//! let format = session.graph_format(128);
//! graph.attach(Arc::new(GainBalanceUnit::new()), format)?;
//! graph.activate()?;
//! ```

pub mod backend;
pub mod cpal_backend;
pub mod mock;
mod stream;
pub mod watcher;

pub use backend::{AudioGraph, FaultCallback, InputPort, PlatformSession, PortKind, StreamHandle};
pub use cpal_backend::{CpalGraph, CpalSession};
pub use stream::{AudioDevice, default_device, list_devices};
pub use watcher::{DeviceSnapshot, DeviceWatcher};

/// Error types for platform audio operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Audio stream setup or runtime error.
    #[error("Audio stream error: {0}")]
    Stream(String),

    /// No audio device available on the system.
    #[error("No audio device available")]
    NoDevice,

    /// The requested audio device was not found.
    #[error("Device not found: {0}")]
    DeviceNotFound(String),

    /// The hardware does not offer this operation.
    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    /// The platform refused a request it normally accepts.
    #[error("Platform rejected request: {0}")]
    Rejected(String),

    /// Standard I/O error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type for platform audio operations.
pub type Result<T> = std::result::Result<T, Error>;
