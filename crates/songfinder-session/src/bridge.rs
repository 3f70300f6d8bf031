//! Effect parameter bridge.
//!
//! Maps each field of [`ProcessingParameters`] onto the effect unit control
//! with the same stable key:
//!
//! | Field | Key |
//! |---|---|
//! | `cutoff_hz` | [`param_info::CUTOFF`] |
//! | `pitch_shift_divisor` | [`param_info::PITCH_SHIFT`] |
//! | `window_kind` | [`param_info::WINDOW_TYPE`] |
//! | `window_size_ms` | [`param_info::WINDOW_SIZE`] |
//! | `app_gain_db` | [`param_info::GAIN`] |
//! | `balance_db` | [`param_info::BALANCE`] |
//!
//! The effect unit is a fixed part of the build. A missing key is a build
//! defect, so every function here panics on one instead of skipping it.

use songfinder_core::{EffectUnit, ProcessingParameters, WindowKind, param_info};

/// Reads one parameter.
///
/// # Panics
///
/// Panics if the effect does not declare `key`.
pub fn read(effect: &dyn EffectUnit, key: &str) -> f32 {
    match effect.parameter_value(key) {
        Some(value) => value,
        None => missing_key(effect, key),
    }
}

/// Writes one parameter.
///
/// # Panics
///
/// Panics if the effect does not declare `key`.
pub fn write(effect: &dyn EffectUnit, key: &str, value: f32) {
    if effect.set_parameter_value(key, value).is_err() {
        missing_key(effect, key);
    }
}

/// Checks that the effect declares every key the bridge maps.
///
/// # Panics
///
/// Panics naming the first missing key.
pub fn verify_keys(effect: &dyn EffectUnit) {
    let declared = effect.parameter_keys();
    if let Some(missing) = param_info::PARAM_KEYS
        .iter()
        .find(|&&key| !declared.contains(&key))
    {
        missing_key(effect, missing);
    }
}

/// Reads the effect's current values into a parameter snapshot.
///
/// Values are taken as the effect reports them, without session policy;
/// callers coerce the result. `per_port_gains` is empty.
///
/// # Panics
///
/// Panics if the effect lacks any mapped key.
pub fn initialize_from(effect: &dyn EffectUnit) -> ProcessingParameters {
    verify_keys(effect);
    ProcessingParameters {
        cutoff_hz: to_count(read(effect, param_info::CUTOFF)),
        pitch_shift_divisor: to_count(read(effect, param_info::PITCH_SHIFT)),
        window_kind: WindowKind::from_param(read(effect, param_info::WINDOW_TYPE)),
        window_size_ms: to_count(read(effect, param_info::WINDOW_SIZE)),
        app_gain_db: read(effect, param_info::GAIN),
        balance_db: read(effect, param_info::BALANCE),
        ..ProcessingParameters::default()
    }
}

/// Pushes every mapped field into the effect.
///
/// # Panics
///
/// Panics if the effect lacks any mapped key.
pub fn apply(params: &ProcessingParameters, effect: &dyn EffectUnit) {
    write(effect, param_info::CUTOFF, params.cutoff_hz as f32);
    write(effect, param_info::PITCH_SHIFT, params.pitch_shift_divisor as f32);
    write(effect, param_info::WINDOW_TYPE, params.window_kind.as_param());
    write(effect, param_info::WINDOW_SIZE, params.window_size_ms as f32);
    write(effect, param_info::GAIN, params.app_gain_db);
    write(effect, param_info::BALANCE, params.balance_db);
}

fn to_count(value: f32) -> u32 {
    if value.is_finite() {
        value.round().max(0.0) as u32
    } else {
        0
    }
}

fn missing_key(effect: &dyn EffectUnit, key: &str) -> ! {
    panic!(
        "effect unit '{}' has no parameter '{}'; the build is misconfigured",
        effect.name(),
        key
    )
}
