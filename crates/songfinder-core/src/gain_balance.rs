//! Reference effect unit: gain, balance, and output metering.
//!
//! [`GainBalanceUnit`] declares the full songfinder parameter set so the
//! session can drive it exactly like the pitch-shift kernel, but it only acts
//! on [`GAIN`](crate::param_info::GAIN) and
//! [`BALANCE`](crate::param_info::BALANCE). The spectral parameters are stored
//! and read back unchanged. Input channels are mapped onto the output format
//! (mono is duplicated, stereo is summed for mono output) and each block's
//! peak is published per output channel.

use crate::effect_unit::{EffectRenderer, EffectUnit, GraphFormat, ParamError};
use crate::levels::{SILENT_FLOOR_DB, clamp_level};
use crate::math::{balance_gains, db_to_linear, linear_to_db};
use crate::param_info::{BALANCE, DESCRIPTORS, GAIN, PARAM_KEYS};
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

/// Most output channels a unit meters.
pub const MAX_METER_CHANNELS: usize = 8;

#[derive(Debug)]
struct Shared {
    params: [AtomicU32; PARAM_KEYS.len()],
    levels: [AtomicU32; MAX_METER_CHANNELS],
}

impl Shared {
    fn new() -> Self {
        Self {
            params: std::array::from_fn(|i| AtomicU32::new(DESCRIPTORS[i].default.to_bits())),
            levels: std::array::from_fn(|_| AtomicU32::new(SILENT_FLOOR_DB.to_bits())),
        }
    }

    #[inline]
    fn param(&self, index: usize) -> f32 {
        f32::from_bits(self.params[index].load(Ordering::Acquire))
    }

    #[inline]
    fn store_level(&self, channel: usize, db: f32) {
        if let Some(slot) = self.levels.get(channel) {
            slot.store(clamp_level(db).to_bits(), Ordering::Release);
        }
    }
}

fn index_of(key: &str) -> Option<usize> {
    PARAM_KEYS.iter().position(|&k| k == key)
}

/// Gain/balance effect unit with lock-free parameters and meters.
#[derive(Debug, Clone)]
pub struct GainBalanceUnit {
    shared: Arc<Shared>,
}

impl GainBalanceUnit {
    /// Creates a unit with every parameter at its default.
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared::new()),
        }
    }
}

impl Default for GainBalanceUnit {
    fn default() -> Self {
        Self::new()
    }
}

impl EffectUnit for GainBalanceUnit {
    fn name(&self) -> &str {
        "gain-balance"
    }

    fn parameter_keys(&self) -> Vec<&'static str> {
        PARAM_KEYS.to_vec()
    }

    fn parameter_value(&self, key: &str) -> Option<f32> {
        index_of(key).map(|i| self.shared.param(i))
    }

    fn set_parameter_value(&self, key: &str, value: f32) -> Result<(), ParamError> {
        let index = index_of(key).ok_or_else(|| ParamError::UnknownKey(key.to_string()))?;
        let clamped = DESCRIPTORS[index].clamp(value);
        self.shared.params[index].store(clamped.to_bits(), Ordering::Release);
        Ok(())
    }

    fn output_level_db(&self, channel: usize) -> f32 {
        self.shared
            .levels
            .get(channel)
            .map_or(SILENT_FLOOR_DB, |l| f32::from_bits(l.load(Ordering::Acquire)))
    }

    fn prepare(&self, format: GraphFormat) -> Box<dyn EffectRenderer> {
        for channel in 0..MAX_METER_CHANNELS {
            self.shared.store_level(channel, SILENT_FLOOR_DB);
        }
        Box::new(GainBalanceRenderer {
            shared: Arc::clone(&self.shared),
            input_channels: usize::from(format.input_channels.max(1)),
            output_channels: usize::from(format.output_channels.max(1)),
            gain_index: index_of(GAIN).unwrap_or(4),
            balance_index: index_of(BALANCE).unwrap_or(5),
        })
    }
}

struct GainBalanceRenderer {
    shared: Arc<Shared>,
    input_channels: usize,
    output_channels: usize,
    gain_index: usize,
    balance_index: usize,
}

impl EffectRenderer for GainBalanceRenderer {
    fn render(&mut self, input: &[f32], output: &mut [f32]) {
        let frames = (input.len() / self.input_channels).min(output.len() / self.output_channels);
        let gain = db_to_linear(self.shared.param(self.gain_index));
        let (left_gain, right_gain) = balance_gains(self.shared.param(self.balance_index));

        let mut peaks = [0.0f32; 2];
        for (in_frame, out_frame) in input
            .chunks_exact(self.input_channels)
            .zip(output.chunks_exact_mut(self.output_channels))
            .take(frames)
        {
            let left = in_frame[0];
            let right = in_frame.get(1).copied().unwrap_or(left);
            let left = left * gain * left_gain;
            let right = right * gain * right_gain;

            match out_frame {
                [mono] => {
                    *mono = (left + right) * 0.5;
                    peaks[0] = peaks[0].max(mono.abs());
                }
                [l, r, rest @ ..] => {
                    *l = left;
                    *r = right;
                    rest.fill(0.0);
                    peaks[0] = peaks[0].max(left.abs());
                    peaks[1] = peaks[1].max(right.abs());
                }
                [] => {}
            }
        }
        output[frames * self.output_channels..].fill(0.0);

        let metered = self.output_channels.min(MAX_METER_CHANNELS);
        for channel in 0..metered {
            let peak = peaks.get(channel).copied().unwrap_or(0.0);
            self.shared.store_level(channel, linear_to_db(peak));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::param_info::{CUTOFF, WINDOW_SIZE};

    fn format(input_channels: u16, output_channels: u16) -> GraphFormat {
        GraphFormat {
            input_channels,
            output_channels,
            ..GraphFormat::default()
        }
    }

    #[test]
    fn declares_every_key() {
        let unit = GainBalanceUnit::new();
        for key in PARAM_KEYS {
            assert!(unit.parameter_value(key).is_some(), "{key}");
        }
    }

    #[test]
    fn unknown_key_is_an_error() {
        let unit = GainBalanceUnit::new();
        assert_eq!(
            unit.set_parameter_value("attenuation", 1.0),
            Err(ParamError::UnknownKey("attenuation".into()))
        );
        assert_eq!(unit.parameter_value("attenuation"), None);
    }

    #[test]
    fn spectral_parameters_are_stored() {
        let unit = GainBalanceUnit::new();
        unit.set_parameter_value(CUTOFF, 3000.0).unwrap();
        unit.set_parameter_value(WINDOW_SIZE, 99.0).unwrap();
        assert_eq!(unit.parameter_value(CUTOFF), Some(3000.0));
        assert_eq!(unit.parameter_value(WINDOW_SIZE), Some(50.0));
    }

    #[test]
    fn mono_input_is_duplicated_to_stereo() {
        let unit = GainBalanceUnit::new();
        let mut renderer = unit.prepare(format(1, 2));
        let input = [0.5, -0.25];
        let mut output = [0.0; 4];
        renderer.render(&input, &mut output);
        assert_eq!(output, [0.5, 0.5, -0.25, -0.25]);
    }

    #[test]
    fn stereo_input_sums_for_mono_output() {
        let unit = GainBalanceUnit::new();
        let mut renderer = unit.prepare(format(2, 1));
        let mut output = [0.0; 1];
        renderer.render(&[0.4, 0.2], &mut output);
        assert!((output[0] - 0.3).abs() < 1e-6);
    }

    #[test]
    fn gain_is_applied_live() {
        let unit = GainBalanceUnit::new();
        let mut renderer = unit.prepare(format(1, 1));
        let mut output = [0.0; 1];
        renderer.render(&[0.1], &mut output);
        assert!((output[0] - 0.1).abs() < 1e-6);

        unit.set_parameter_value(GAIN, 20.0).unwrap();
        renderer.render(&[0.1], &mut output);
        assert!((output[0] - 1.0).abs() < 1e-4);
    }

    #[test]
    fn balance_attenuates_one_side() {
        let unit = GainBalanceUnit::new();
        unit.set_parameter_value(BALANCE, 10.0).unwrap();
        let mut renderer = unit.prepare(format(2, 2));
        let mut output = [0.0; 2];
        renderer.render(&[1.0, 1.0], &mut output);
        assert!(output[0] < 0.33);
        assert_eq!(output[1], 1.0);
    }

    #[test]
    fn meters_track_block_peak() {
        let unit = GainBalanceUnit::new();
        let mut renderer = unit.prepare(format(2, 2));
        let mut output = [0.0; 4];
        renderer.render(&[0.5, 0.0, -1.0, 0.0], &mut output);
        assert!((unit.output_level_db(0) - 0.0).abs() < 1e-3);
        assert_eq!(unit.output_level_db(1), SILENT_FLOOR_DB);
        assert_eq!(unit.output_level_db(MAX_METER_CHANNELS + 1), SILENT_FLOOR_DB);
    }

    #[test]
    fn short_input_pads_output_with_silence() {
        let unit = GainBalanceUnit::new();
        let mut renderer = unit.prepare(format(1, 2));
        let mut output = [9.0; 6];
        renderer.render(&[0.5], &mut output);
        assert_eq!(output, [0.5, 0.5, 0.0, 0.0, 0.0, 0.0]);
    }
}
