//! Controller configuration.

use crate::gain_memory::GainPolicy;
use songfinder_config::Settings;
use std::time::Duration;

/// Construction-time settings for a [`SessionController`](crate::SessionController).
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    /// Preferred hardware sample rate in Hz.
    pub sample_rate: u32,
    /// Preferred I/O buffer size in frames.
    pub buffer_frames: u32,
    /// Level meter sampling period.
    pub meter_interval: Duration,
    /// Whether a 0 Hz cutoff is allowed.
    pub zero_cutoff_enabled: bool,
    /// Gains for ports seen for the first time.
    pub gain_policy: GainPolicy,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::from(&Settings::default())
    }
}

impl From<&Settings> for SessionConfig {
    fn from(settings: &Settings) -> Self {
        Self {
            sample_rate: settings.sample_rate,
            buffer_frames: settings.buffer_frames,
            // A zero period would spin the owning loop.
            meter_interval: Duration::from_millis(settings.meter_interval_ms.max(1)),
            zero_cutoff_enabled: settings.zero_cutoff_enabled,
            gain_policy: GainPolicy::default(),
        }
    }
}
