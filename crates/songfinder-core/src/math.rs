//! Level conversions.
//!
//! - [`db_to_linear`] / [`linear_to_db`] - Convert between dB and linear gain
//! - [`balance_gains`] - Per-channel linear gains for a balance setting

use libm::{expf, logf};

/// Convert decibels to linear gain.
///
/// # Example
/// ```rust
/// use songfinder_core::db_to_linear;
///
/// assert!((db_to_linear(0.0) - 1.0).abs() < 0.001);
/// assert!((db_to_linear(-6.02) - 0.5).abs() < 0.01);
/// ```
#[inline]
pub fn db_to_linear(db: f32) -> f32 {
    // 10^(dB/20) = e^(dB * ln(10)/20)
    const FACTOR: f32 = core::f32::consts::LN_10 / 20.0;
    expf(db * FACTOR)
}

/// Convert linear gain to decibels.
///
/// Inputs at or below zero are treated as -200 dB.
///
/// # Example
/// ```rust
/// use songfinder_core::linear_to_db;
///
/// assert!((linear_to_db(1.0) - 0.0).abs() < 0.001);
/// assert!((linear_to_db(0.5) - (-6.02)).abs() < 0.01);
/// ```
#[inline]
pub fn linear_to_db(linear: f32) -> f32 {
    // 20 * log10(linear) = 20 * ln(linear) / ln(10)
    const FACTOR: f32 = 20.0 / core::f32::consts::LN_10;
    logf(linear.max(1e-10)) * FACTOR
}

/// Left/right linear gains for a balance in dB.
///
/// Positive balance attenuates the left channel by `balance_db`, negative
/// balance attenuates the right channel. Zero leaves both at unity.
///
/// ```rust
/// use songfinder_core::balance_gains;
///
/// let (l, r) = balance_gains(6.0);
/// assert!(l < 0.51 && l > 0.49);
/// assert_eq!(r, 1.0);
/// ```
#[inline]
pub fn balance_gains(balance_db: f32) -> (f32, f32) {
    if balance_db > 0.0 {
        (db_to_linear(-balance_db), 1.0)
    } else if balance_db < 0.0 {
        (1.0, db_to_linear(balance_db))
    } else {
        (1.0, 1.0)
    }
}
