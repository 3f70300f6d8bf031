//! Platform-specific paths for settings and saved state.
//!
//! # Directory Structure
//!
//! - **User config**: `~/.config/songfinder/` (Linux), `~/Library/Application Support/songfinder/` (macOS), `%APPDATA%\songfinder\` (Windows)
//! - **Settings file**: `<user config>/settings.toml`
//! - **Saved state**: `<user config>/state/`

use std::path::PathBuf;

/// Application name used for directory paths.
const APP_NAME: &str = "songfinder";

/// Subdirectory holding persisted session state blobs.
const STATE_SUBDIR: &str = "state";

/// File name of the settings file.
const SETTINGS_FILE: &str = "settings.toml";

/// Returns the user-specific configuration directory.
///
/// Returns a fallback path if the config directory cannot be determined.
pub fn user_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Returns the directory holding persisted session state.
pub fn state_dir() -> PathBuf {
    user_config_dir().join(STATE_SUBDIR)
}

/// Returns the path of the settings file.
pub fn settings_path() -> PathBuf {
    user_config_dir().join(SETTINGS_FILE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn paths_live_under_app_dir() {
        assert!(user_config_dir().to_string_lossy().contains("songfinder"));
        assert!(state_dir().starts_with(user_config_dir()));
        assert_eq!(settings_path().file_name().unwrap(), "settings.toml");
    }
}
