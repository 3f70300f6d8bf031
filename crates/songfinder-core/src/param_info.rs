//! Parameter descriptors for the effect unit's control surface.
//!
//! Every control the session pushes into an [`EffectUnit`](crate::EffectUnit)
//! is addressed by a stable string key and described by a [`ParamDescriptor`]:
//! display name, unit, range, default, and capability flags. The keys are the
//! contract between the session and the effect; they must never change.
//!
//! # Keys
//!
//! | Key | Name | Range | Default |
//! |-----|------|-------|---------|
//! | [`CUTOFF`] | Cutoff | 0–4000 Hz | 0 |
//! | [`PITCH_SHIFT`] | Pitch Shift | 2–4 | 2 |
//! | [`WINDOW_TYPE`] | Window Type | 0–1 | 0 |
//! | [`WINDOW_SIZE`] | Window Size | 5–50 ms | 20 |
//! | [`GAIN`] | Gain | -20–20 dB | 0 |
//! | [`BALANCE`] | Balance | -10–10 dB | 0 |
//!
//! The defaults are the effect unit's own power-on values. The session layer
//! applies its own policy on top (e.g. a zero cutoff is only allowed behind a
//! feature flag), see [`crate::params`].

/// Stable key of the high-pass cutoff parameter.
pub const CUTOFF: &str = "cutoff";
/// Stable key of the pitch-shift divisor parameter.
pub const PITCH_SHIFT: &str = "pitch_shift";
/// Stable key of the analysis window kind parameter.
pub const WINDOW_TYPE: &str = "window_type";
/// Stable key of the analysis window size parameter.
pub const WINDOW_SIZE: &str = "window_size";
/// Stable key of the output gain parameter.
pub const GAIN: &str = "gain";
/// Stable key of the left/right balance parameter.
pub const BALANCE: &str = "balance";

/// All parameter keys, in the order the effect unit declares them.
pub const PARAM_KEYS: [&str; 6] = [CUTOFF, PITCH_SHIFT, WINDOW_TYPE, WINDOW_SIZE, GAIN, BALANCE];

/// Parameter capability flags.
///
/// Use [`union`](Self::union) to combine.
///
/// # Example
///
/// ```rust
/// use songfinder_core::ParamFlags;
///
/// let flags = ParamFlags::STEPPED.union(ParamFlags::CAN_RAMP);
/// assert!(flags.contains(ParamFlags::STEPPED));
/// assert!(!flags.contains(ParamFlags::READ_ONLY));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParamFlags(u8);

impl ParamFlags {
    /// No flags set.
    pub const NONE: Self = Self(0);
    /// Parameter has discrete steps (enum-like, integer values).
    pub const STEPPED: Self = Self(1 << 0);
    /// The effect can absorb a change while audio is flowing, without a
    /// discontinuity. Parameters without this flag need a graph restart.
    pub const CAN_RAMP: Self = Self(1 << 1);
    /// Parameter is read-only (metering, display only).
    pub const READ_ONLY: Self = Self(1 << 2);

    /// Returns `true` if all bits in `other` are set in `self`.
    #[inline]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns the union of two flag sets.
    #[inline]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }
}

impl Default for ParamFlags {
    fn default() -> Self {
        Self::NONE
    }
}

/// Unit of a parameter value, used for display formatting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamUnit {
    /// Decibels (dB) - gain and balance.
    Decibels,
    /// Hertz (Hz) - cutoff frequency.
    Hertz,
    /// Milliseconds (ms) - window size.
    Milliseconds,
    /// Index into a fixed list of choices (window kind).
    Indexed,
    /// No unit - dimensionless (pitch-shift divisor).
    None,
}

impl ParamUnit {
    /// Returns the unit suffix string for display.
    ///
    /// ```rust
    /// use songfinder_core::ParamUnit;
    ///
    /// assert_eq!(ParamUnit::Decibels.suffix(), " dB");
    /// assert_eq!(ParamUnit::None.suffix(), "");
    /// ```
    pub const fn suffix(&self) -> &'static str {
        match self {
            ParamUnit::Decibels => " dB",
            ParamUnit::Hertz => " Hz",
            ParamUnit::Milliseconds => " ms",
            ParamUnit::Indexed | ParamUnit::None => "",
        }
    }
}

/// Describes a single effect parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamDescriptor {
    /// Stable key used to address the parameter on the effect unit.
    pub key: &'static str,
    /// Full name for display.
    pub name: &'static str,
    /// Unit type for formatting the value.
    pub unit: ParamUnit,
    /// Minimum allowed value.
    pub min: f32,
    /// Maximum allowed value.
    pub max: f32,
    /// Value the effect unit starts with.
    pub default: f32,
    /// Capability flags.
    pub flags: ParamFlags,
}

impl ParamDescriptor {
    /// Clamps a value to this parameter's range.
    ///
    /// Non-finite input yields the default.
    ///
    /// ```rust
    /// use songfinder_core::param_info::descriptor;
    ///
    /// let gain = descriptor("gain").unwrap();
    /// assert_eq!(gain.clamp(100.0), 20.0);
    /// assert_eq!(gain.clamp(f32::NAN), 0.0);
    /// ```
    #[inline]
    pub fn clamp(&self, value: f32) -> f32 {
        if !value.is_finite() {
            self.default
        } else if value < self.min {
            self.min
        } else if value > self.max {
            self.max
        } else {
            value
        }
    }

    /// Whether a change to this parameter can be applied to a running graph.
    pub const fn is_live_updatable(&self) -> bool {
        self.flags.contains(ParamFlags::CAN_RAMP)
    }

    /// Formats a value with this parameter's unit.
    pub fn format_value(&self, value: f32) -> String {
        format!("{value:.0}{}", self.unit.suffix())
    }
}

const STEPPED: ParamFlags = ParamFlags::STEPPED;
const RAMPED: ParamFlags = ParamFlags::CAN_RAMP;

/// Descriptor table of the effect unit, in [`PARAM_KEYS`] order.
pub const DESCRIPTORS: [ParamDescriptor; 6] = [
    ParamDescriptor {
        key: CUTOFF,
        name: "Cutoff",
        unit: ParamUnit::Hertz,
        min: 0.0,
        max: 4000.0,
        default: 0.0,
        flags: STEPPED,
    },
    ParamDescriptor {
        key: PITCH_SHIFT,
        name: "Pitch Shift",
        unit: ParamUnit::None,
        min: 2.0,
        max: 4.0,
        default: 2.0,
        flags: STEPPED,
    },
    ParamDescriptor {
        key: WINDOW_TYPE,
        name: "Window Type",
        unit: ParamUnit::Indexed,
        min: 0.0,
        max: 1.0,
        default: 0.0,
        flags: STEPPED,
    },
    ParamDescriptor {
        key: WINDOW_SIZE,
        name: "Window Size",
        unit: ParamUnit::Milliseconds,
        min: 5.0,
        max: 50.0,
        default: 20.0,
        flags: STEPPED,
    },
    ParamDescriptor {
        key: GAIN,
        name: "Gain",
        unit: ParamUnit::Decibels,
        min: -20.0,
        max: 20.0,
        default: 0.0,
        flags: RAMPED,
    },
    ParamDescriptor {
        key: BALANCE,
        name: "Balance",
        unit: ParamUnit::Decibels,
        min: -10.0,
        max: 10.0,
        default: 0.0,
        flags: RAMPED,
    },
];

/// Looks up the descriptor for a key.
pub fn descriptor(key: &str) -> Option<&'static ParamDescriptor> {
    DESCRIPTORS.iter().find(|d| d.key == key)
}
