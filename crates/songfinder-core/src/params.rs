//! The authoritative processing parameter set and its validation rules.
//!
//! [`ProcessingParameters`] is the snapshot the session controller owns,
//! pushes into the effect unit, and persists. Values are never rejected:
//! every `coerce_*` function maps an arbitrary input onto the nearest value
//! the effect accepts, so callers can feed raw UI or file input straight in.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Cutoff frequencies offered when the zero-cutoff feature is disabled.
pub const CUTOFF_CHOICES_HZ: [u32; 4] = [2000, 2500, 3000, 4000];

/// Cutoff used by default and as the coercion target for a disallowed zero.
pub const DEFAULT_CUTOFF_HZ: u32 = 2000;

/// Smallest and largest pitch-shift divisors.
pub const PITCH_SHIFT_RANGE: (u32, u32) = (2, 4);

/// Default pitch-shift divisor (one octave down).
pub const DEFAULT_PITCH_SHIFT: u32 = 2;

/// Smallest and largest analysis window sizes in milliseconds.
pub const WINDOW_SIZE_RANGE_MS: (u32, u32) = (5, 50);

/// Default analysis window size in milliseconds.
pub const DEFAULT_WINDOW_SIZE_MS: u32 = 20;

/// Range of the app-side gain in dB. App gain only ever amplifies.
pub const APP_GAIN_RANGE_DB: (f32, f32) = (0.0, 20.0);

/// Range of the balance in dB.
pub const BALANCE_RANGE_DB: (f32, f32) = (-10.0, 10.0);

/// Range of the hardware input gain in percent.
pub const INPUT_GAIN_RANGE_PERCENT: (f32, f32) = (0.0, 100.0);

/// Analysis window applied by the effect's spectral stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WindowKind {
    /// Hann window.
    #[default]
    Hann,
    /// The effect's own tapered window.
    SongFinder,
}

impl WindowKind {
    /// Value written to the effect unit's `window_type` parameter.
    pub const fn as_param(self) -> f32 {
        match self {
            WindowKind::Hann => 0.0,
            WindowKind::SongFinder => 1.0,
        }
    }

    /// Decodes an effect unit `window_type` value, rounding to the nearest kind.
    pub fn from_param(value: f32) -> Self {
        if value >= 0.5 {
            WindowKind::SongFinder
        } else {
            WindowKind::Hann
        }
    }
}

impl fmt::Display for WindowKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WindowKind::Hann => f.write_str("Hann"),
            WindowKind::SongFinder => f.write_str("SongFinder"),
        }
    }
}

impl std::str::FromStr for WindowKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "hann" => Ok(WindowKind::Hann),
            "songfinder" | "song-finder" => Ok(WindowKind::SongFinder),
            other => Err(format!("unknown window kind '{other}'")),
        }
    }
}

/// Remembered gain settings for one input port.
///
/// `input_gain_percent` is only present for ports whose hardware gain is
/// adjustable; on other ports all amplification is done by `app_gain_db`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct GainSetting {
    /// Hardware input gain, 0–100 %.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_gain_percent: Option<f32>,
    /// App-side gain in dB.
    #[serde(default)]
    pub app_gain_db: f32,
}

/// The full, persisted parameter snapshot.
///
/// # TOML Format
///
/// ```toml
/// cutoff_hz = 2500
/// pitch_shift_divisor = 3
/// window_kind = "hann"
/// window_size_ms = 20
/// app_gain_db = 5.0
/// balance_db = 0.0
///
/// [per_port_gains."Built-In Microphone"]
/// input_gain_percent = 42.0
/// app_gain_db = 5.0
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingParameters {
    /// High-pass cutoff applied before pitch shifting, in Hz.
    pub cutoff_hz: u32,
    /// Frequency divisor of the pitch shifter.
    pub pitch_shift_divisor: u32,
    /// Analysis window kind.
    pub window_kind: WindowKind,
    /// Analysis window size in milliseconds.
    pub window_size_ms: u32,
    /// Currently active app-side gain in dB.
    pub app_gain_db: f32,
    /// Currently active left/right balance in dB.
    pub balance_db: f32,
    /// Remembered gains keyed by input port name.
    pub per_port_gains: BTreeMap<String, GainSetting>,
}

impl Default for ProcessingParameters {
    fn default() -> Self {
        Self {
            cutoff_hz: DEFAULT_CUTOFF_HZ,
            pitch_shift_divisor: DEFAULT_PITCH_SHIFT,
            window_kind: WindowKind::Hann,
            window_size_ms: DEFAULT_WINDOW_SIZE_MS,
            app_gain_db: 0.0,
            balance_db: 0.0,
            per_port_gains: BTreeMap::new(),
        }
    }
}

impl ProcessingParameters {
    /// Returns a copy with every field coerced into its valid domain.
    pub fn coerced(mut self, zero_cutoff_allowed: bool) -> Self {
        self.cutoff_hz = coerce_cutoff(self.cutoff_hz, zero_cutoff_allowed);
        self.pitch_shift_divisor = coerce_pitch_shift(self.pitch_shift_divisor);
        self.window_size_ms = coerce_window_size(self.window_size_ms);
        self.app_gain_db = coerce_app_gain(self.app_gain_db);
        self.balance_db = coerce_balance(self.balance_db);
        for setting in self.per_port_gains.values_mut() {
            setting.app_gain_db = coerce_app_gain(setting.app_gain_db);
            setting.input_gain_percent = setting.input_gain_percent.map(coerce_input_gain);
        }
        self
    }
}

/// Cutoff values valid under the given zero-cutoff policy, ascending.
pub fn allowed_cutoffs(zero_cutoff_allowed: bool) -> Vec<u32> {
    let mut choices = Vec::with_capacity(CUTOFF_CHOICES_HZ.len() + 1);
    if zero_cutoff_allowed {
        choices.push(0);
    }
    choices.extend_from_slice(&CUTOFF_CHOICES_HZ);
    choices
}

/// Snaps a cutoff to the nearest allowed value. Ties go to the lower value.
///
/// ```rust
/// use songfinder_core::params::coerce_cutoff;
///
/// assert_eq!(coerce_cutoff(0, false), 2000);
/// assert_eq!(coerce_cutoff(0, true), 0);
/// assert_eq!(coerce_cutoff(2700, false), 2500);
/// assert_eq!(coerce_cutoff(9000, false), 4000);
/// ```
pub fn coerce_cutoff(hz: u32, zero_cutoff_allowed: bool) -> u32 {
    allowed_cutoffs(zero_cutoff_allowed)
        .into_iter()
        .min_by_key(|&choice| (choice.abs_diff(hz), choice))
        .unwrap_or(DEFAULT_CUTOFF_HZ)
}

/// Clamps a pitch-shift divisor into `{2, 3, 4}`.
pub fn coerce_pitch_shift(divisor: u32) -> u32 {
    divisor.clamp(PITCH_SHIFT_RANGE.0, PITCH_SHIFT_RANGE.1)
}

/// Clamps a window size into `[5, 50]` ms.
pub fn coerce_window_size(ms: u32) -> u32 {
    ms.clamp(WINDOW_SIZE_RANGE_MS.0, WINDOW_SIZE_RANGE_MS.1)
}

/// Clamps an app gain into `[0, 20]` dB. Non-finite input yields 0 dB.
pub fn coerce_app_gain(db: f32) -> f32 {
    clamp_finite(db, APP_GAIN_RANGE_DB, 0.0)
}

/// Clamps a balance into `[-10, 10]` dB. Non-finite input yields 0 dB.
pub fn coerce_balance(db: f32) -> f32 {
    clamp_finite(db, BALANCE_RANGE_DB, 0.0)
}

/// Clamps an input gain into `[0, 100]` %. Non-finite input yields 100 %.
pub fn coerce_input_gain(percent: f32) -> f32 {
    clamp_finite(percent, INPUT_GAIN_RANGE_PERCENT, INPUT_GAIN_RANGE_PERCENT.1)
}

fn clamp_finite(value: f32, (min, max): (f32, f32), fallback: f32) -> f32 {
    if value.is_finite() {
        value.clamp(min, max)
    } else {
        fallback
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let params = ProcessingParameters::default();
        assert_eq!(params.clone().coerced(false), params);
    }

    #[test]
    fn zero_cutoff_is_coerced_to_minimum_when_disabled() {
        assert_eq!(coerce_cutoff(0, false), DEFAULT_CUTOFF_HZ);
        assert_eq!(coerce_cutoff(1, false), 2000);
    }

    #[test]
    fn cutoff_ties_go_low() {
        assert_eq!(coerce_cutoff(2250, false), 2000);
        assert_eq!(coerce_cutoff(1000, true), 0);
    }

    #[test]
    fn integer_ranges_clamp() {
        assert_eq!(coerce_pitch_shift(0), 2);
        assert_eq!(coerce_pitch_shift(9), 4);
        assert_eq!(coerce_window_size(1), 5);
        assert_eq!(coerce_window_size(500), 50);
    }

    #[test]
    fn real_ranges_clamp_and_reject_nan() {
        assert_eq!(coerce_app_gain(-3.0), 0.0);
        assert_eq!(coerce_app_gain(f32::INFINITY), 0.0);
        assert_eq!(coerce_balance(-30.0), -10.0);
        assert_eq!(coerce_input_gain(f32::NAN), 100.0);
        assert_eq!(coerce_input_gain(150.0), 100.0);
    }

    #[test]
    fn coerced_touches_port_gains() {
        let mut params = ProcessingParameters::default();
        params.per_port_gains.insert(
            "USB".into(),
            GainSetting {
                input_gain_percent: Some(140.0),
                app_gain_db: 99.0,
            },
        );
        let params = params.coerced(false);
        let usb = params.per_port_gains["USB"];
        assert_eq!(usb.input_gain_percent, Some(100.0));
        assert_eq!(usb.app_gain_db, 20.0);
    }

    #[test]
    fn window_kind_param_roundtrip() {
        for kind in [WindowKind::Hann, WindowKind::SongFinder] {
            assert_eq!(WindowKind::from_param(kind.as_param()), kind);
        }
        assert_eq!("SongFinder".parse::<WindowKind>(), Ok(WindowKind::SongFinder));
        assert!("blackman".parse::<WindowKind>().is_err());
    }
}
