//! User settings file.

use crate::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Application settings, read from `settings.toml`.
///
/// # TOML Format
///
/// ```toml
/// zero_cutoff_enabled = false
/// meter_interval_ms = 50
/// sample_rate = 48000
/// buffer_frames = 128
/// input_device = "USB"
/// ```
///
/// Every field is optional; absent fields take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Offer a 0 Hz cutoff (no high-pass filtering).
    pub zero_cutoff_enabled: bool,
    /// Level meter sampling period in milliseconds.
    pub meter_interval_ms: u64,
    /// Preferred hardware sample rate in Hz. The effect kernel requires 48 kHz.
    pub sample_rate: u32,
    /// Preferred I/O buffer size in frames.
    pub buffer_frames: u32,
    /// Input device name or index (system default if absent).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_device: Option<String>,
    /// Output device name or index (system default if absent).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_device: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            zero_cutoff_enabled: false,
            meter_interval_ms: 50,
            sample_rate: 48000,
            buffer_frames: 128,
            input_device: None,
            output_device: None,
        }
    }
}

impl Settings {
    /// Loads settings from a TOML file. A missing file yields defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(content) => Self::from_toml(&content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no settings file, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(ConfigError::read_file(path, e)),
        }
    }

    /// Loads from the platform settings path.
    pub fn load_default() -> Result<Self, ConfigError> {
        Self::load(crate::paths::settings_path())
    }

    /// Parses settings from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Saves settings to a TOML file, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::create_dir(parent, e))?;
        }
        let content = self.to_toml()?;
        std::fs::write(path, content).map_err(|e| ConfigError::write_file(path, e))
    }

    /// Serializes settings to a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}
