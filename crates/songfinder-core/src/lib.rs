//! Songfinder Core - data model and effect-unit interface
//!
//! This crate holds everything the session layer reasons about that does not
//! touch hardware: the parameter snapshot and its validation rules, level
//! readouts, the vocabulary of hardware notifications, and the control surface
//! of the opaque pitch-shift effect.
//!
//! # Core Abstractions
//!
//! ## Parameters
//!
//! - [`ProcessingParameters`] - The authoritative, persisted parameter set
//! - [`GainSetting`] - Remembered gains for one input port
//! - [`WindowKind`] - Analysis window of the spectral stage
//! - `coerce_*` in [`params`] - Silent validation onto the allowed domain
//!
//! ## Effect Unit
//!
//! - [`EffectUnit`] - Keyed parameter access and level readouts
//! - [`EffectRenderer`] - Real-time render callback built per attach
//! - [`ParamDescriptor`] - Range, default, and live-update capability per key
//! - [`GainBalanceUnit`] - Reference unit applying gain and balance only
//!
//! ## Metering
//!
//! - [`OutputLevels`] - One dB reading per output channel
//!
//! ## Hardware Events
//!
//! - [`RouteChangeReason`], [`InterruptionPhase`], [`DeviceOrientation`],
//!   [`StereoOrientation`], [`PolarPattern`]
//!
//! # Example
//!
//! ```rust
//! use songfinder_core::{EffectUnit, GainBalanceUnit, ProcessingParameters, param_info};
//!
//! let params = ProcessingParameters {
//!     cutoff_hz: 0,
//!     ..ProcessingParameters::default()
//! }
//! .coerced(false);
//! assert_eq!(params.cutoff_hz, 2000);
//!
//! let unit = GainBalanceUnit::new();
//! unit.set_parameter_value(param_info::GAIN, 6.0).unwrap();
//! assert_eq!(unit.parameter_value(param_info::GAIN), Some(6.0));
//! ```

pub mod effect_unit;
pub mod gain_balance;
pub mod hardware;
pub mod levels;
pub mod math;
pub mod param_info;
pub mod params;

pub use effect_unit::{EffectRenderer, EffectUnit, GraphFormat, ParamError};
pub use gain_balance::{GainBalanceUnit, MAX_METER_CHANNELS};
pub use hardware::{
    DeviceOrientation, InterruptionPhase, PolarPattern, RouteChangeReason, StereoOrientation,
};
pub use levels::{LEVEL_CEILING_DB, OutputLevels, SILENT_FLOOR_DB, clamp_level};
pub use math::{balance_gains, db_to_linear, linear_to_db};
pub use param_info::{ParamDescriptor, ParamFlags, ParamUnit};
pub use params::{GainSetting, ProcessingParameters, WindowKind};
