//! The effect unit collaborator.
//!
//! The pitch-shift/filter kernel is opaque to the session: it is reached only
//! through the [`EffectUnit`] control surface (keyed parameters and level
//! readouts) and an [`EffectRenderer`] that runs on the real-time thread.
//!
//! ## Threading
//!
//! ```text
//!  owning thread                       real-time thread
//!  ─────────────                       ────────────────
//!  EffectUnit::set_parameter_value ──► (atomics) ──► EffectRenderer::render
//!  EffectUnit::output_level_db     ◄── (atomics) ◄──┘
//! ```
//!
//! An effect unit is `Send + Sync` and is shared as `Arc<dyn EffectUnit>`
//! between the session and the audio graph. Its renderer is created once per
//! attach by [`EffectUnit::prepare`] and moved into the audio callback.

use thiserror::Error;

/// Errors raised by an effect unit's parameter interface.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParamError {
    /// The effect does not declare a parameter with this key.
    #[error("unknown effect parameter '{0}'")]
    UnknownKey(String),
}

/// Stream format negotiated when the effect is attached to the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GraphFormat {
    /// Sample rate in Hz, shared by input and output.
    pub sample_rate: u32,
    /// Interleaved input channel count.
    pub input_channels: u16,
    /// Interleaved output channel count.
    pub output_channels: u16,
    /// Preferred I/O buffer size in frames.
    pub buffer_frames: u32,
}

impl Default for GraphFormat {
    fn default() -> Self {
        Self {
            sample_rate: 48000,
            input_channels: 1,
            output_channels: 2,
            buffer_frames: 128,
        }
    }
}

/// Control surface of the effect unit.
///
/// Parameter access is by stable key (see [`crate::param_info`]).
/// Implementations must be callable from the owning thread while the
/// renderer runs on the audio thread; use atomics, not locks.
pub trait EffectUnit: Send + Sync {
    /// Human-readable effect name.
    fn name(&self) -> &str;

    /// Keys of every parameter the effect declares.
    fn parameter_keys(&self) -> Vec<&'static str>;

    /// Current value of a parameter, or `None` if the key is not declared.
    fn parameter_value(&self, key: &str) -> Option<f32>;

    /// Writes a parameter. The effect clamps to its own range.
    fn set_parameter_value(&self, key: &str, value: f32) -> Result<(), ParamError>;

    /// Most recent output level of one channel in dB.
    ///
    /// Channels the effect does not render read as the silent floor.
    fn output_level_db(&self, channel: usize) -> f32;

    /// Builds the real-time renderer for one attach.
    fn prepare(&self, format: GraphFormat) -> Box<dyn EffectRenderer>;
}

/// Real-time render callback of an attached effect.
///
/// Runs on the audio thread: no allocation, no locks, no I/O.
pub trait EffectRenderer: Send {
    /// Renders one block.
    ///
    /// `input` holds `frames * input_channels` interleaved samples and
    /// `output` holds `frames * output_channels`, using the format passed to
    /// [`EffectUnit::prepare`].
    fn render(&mut self, input: &[f32], output: &mut [f32]);
}
