//! Deterministic platform doubles for tests.
//!
//! [`MockSession`] and [`MockGraph`] are cheap cloneable handles over shared
//! state. Hand one clone to the session controller and keep another to script
//! hardware changes (plug in a headset, rotate the route to stereo) and to
//! inspect every call the controller made.
//!
//! ```rust
//! use songfinder_io::mock::{MockSession, SessionCall};
//! use songfinder_io::{InputPort, PlatformSession, PortKind};
//!
//! let session = MockSession::new();
//! let mut owned: Box<dyn PlatformSession> = Box::new(session.clone());
//!
//! session.plug_in(InputPort::new("USB Mic", PortKind::Usb, 1), true);
//! assert_eq!(owned.current_input_port_name().as_deref(), Some("USB Mic"));
//!
//! owned.set_input_gain(0.25).unwrap();
//! assert_eq!(session.calls(), vec![SessionCall::SetInputGain(0.25)]);
//! ```

use crate::backend::{AudioGraph, InputPort, PlatformSession, PortKind};
use crate::{Error, Result};
use parking_lot::{Mutex, MutexGuard};
use songfinder_core::{
    EffectRenderer, EffectUnit, GraphFormat, PolarPattern, StereoOrientation,
};
use std::sync::Arc;

/// A platform call recorded by [`MockSession`].
#[derive(Debug, Clone, PartialEq)]
pub enum SessionCall {
    /// `configure(sample_rate, buffer_frames)`.
    Configure(u32, u32),
    /// `set_input_gain(fraction)`.
    SetInputGain(f32),
    /// `set_preferred_input_channel_count(channels)`.
    SetPreferredInputChannelCount(u16),
    /// `set_preferred_input(port name, pattern)`.
    SetPreferredInput(String, Option<PolarPattern>),
    /// `set_preferred_stereo_orientation(orientation)`.
    SetPreferredStereoOrientation(StereoOrientation),
}

/// Scriptable hardware state behind a [`MockSession`].
#[derive(Debug, Clone)]
pub struct MockSessionState {
    /// Every input port the hardware offers.
    pub available: Vec<InputPort>,
    /// Name of the current input port.
    pub current: Option<String>,
    /// Whether the current input's gain is adjustable.
    pub gain_adjustable: bool,
    /// Last hardware input gain set, as a fraction.
    pub input_gain: f32,
    /// Active input channel count.
    pub input_channels: u16,
    /// Active output channel count.
    pub output_channels: u16,
    /// Active sample rate.
    pub sample_rate: u32,
    /// Polar pattern of the current input data source.
    pub polar_pattern: Option<PolarPattern>,
    /// Makes `configure` fail.
    pub fail_configure: bool,
    /// Makes every preference setter fail.
    pub fail_preferences: bool,
    /// Calls made so far, oldest first.
    pub calls: Vec<SessionCall>,
}

impl Default for MockSessionState {
    fn default() -> Self {
        let mic = InputPort::new("Built-In Microphone", PortKind::BuiltInMic, 2);
        Self {
            current: Some(mic.name.clone()),
            available: vec![mic],
            gain_adjustable: true,
            input_gain: 1.0,
            input_channels: 1,
            output_channels: 2,
            sample_rate: 48000,
            polar_pattern: Some(PolarPattern::Omnidirectional),
            fail_configure: false,
            fail_preferences: false,
            calls: Vec::new(),
        }
    }
}

impl MockSessionState {
    fn current_port(&self) -> Option<&InputPort> {
        let name = self.current.as_deref()?;
        self.available.iter().find(|p| p.name == name)
    }

    fn check_preferences(&self) -> Result<()> {
        if self.fail_preferences {
            Err(Error::Rejected("mock preference failure".into()))
        } else {
            Ok(())
        }
    }
}

/// Shared-state [`PlatformSession`] double.
#[derive(Debug, Clone, Default)]
pub struct MockSession {
    state: Arc<Mutex<MockSessionState>>,
}

impl MockSession {
    /// A built-in stereo-capable microphone with adjustable gain, mono in,
    /// stereo out, 48 kHz.
    pub fn new() -> Self {
        Self::default()
    }

    /// Locks the state for scripting or inspection.
    pub fn state(&self) -> MutexGuard<'_, MockSessionState> {
        self.state.lock()
    }

    /// Calls recorded so far.
    pub fn calls(&self) -> Vec<SessionCall> {
        self.state.lock().calls.clone()
    }

    /// Forgets recorded calls.
    pub fn clear_calls(&self) {
        self.state.lock().calls.clear();
    }

    /// Adds `port` if new and makes it current.
    pub fn plug_in(&self, port: InputPort, gain_adjustable: bool) {
        let mut state = self.state.lock();
        if !state.available.iter().any(|p| p.name == port.name) {
            state.available.push(port.clone());
        }
        state.current = Some(port.name);
        state.gain_adjustable = gain_adjustable;
        state.input_channels = 1;
        state.polar_pattern = None;
    }

    /// Removes `name` and falls back to the first remaining port.
    pub fn unplug(&self, name: &str, fallback_gain_adjustable: bool) {
        let mut state = self.state.lock();
        state.available.retain(|p| p.name != name);
        state.current = state.available.first().map(|p| p.name.clone());
        state.gain_adjustable = fallback_gain_adjustable;
        state.input_channels = 1;
    }

    /// Sets the active channel counts.
    pub fn set_channels(&self, input: u16, output: u16) {
        let mut state = self.state.lock();
        state.input_channels = input;
        state.output_channels = output;
    }
}

impl PlatformSession for MockSession {
    fn name(&self) -> &str {
        "mock"
    }

    fn configure(&mut self, sample_rate: u32, buffer_frames: u32) -> Result<()> {
        let mut state = self.state.lock();
        state.calls.push(SessionCall::Configure(sample_rate, buffer_frames));
        if state.fail_configure {
            return Err(Error::Unsupported(format!("sample rate {sample_rate} Hz")));
        }
        state.sample_rate = sample_rate;
        Ok(())
    }

    fn current_input_port(&self) -> Option<InputPort> {
        self.state.lock().current_port().cloned()
    }

    fn available_inputs(&self) -> Vec<InputPort> {
        self.state.lock().available.clone()
    }

    fn is_input_gain_adjustable(&self) -> bool {
        self.state.lock().gain_adjustable
    }

    fn input_channel_count(&self) -> u16 {
        self.state.lock().input_channels
    }

    fn output_channel_count(&self) -> u16 {
        self.state.lock().output_channels
    }

    fn max_input_channel_count(&self) -> u16 {
        self.state.lock().current_port().map_or(0, |p| p.max_channels)
    }

    fn sample_rate(&self) -> u32 {
        self.state.lock().sample_rate
    }

    fn input_polar_pattern(&self) -> Option<PolarPattern> {
        self.state.lock().polar_pattern
    }

    fn set_input_gain(&mut self, fraction: f32) -> Result<()> {
        let mut state = self.state.lock();
        state.calls.push(SessionCall::SetInputGain(fraction));
        if !state.gain_adjustable {
            return Err(Error::Unsupported("hardware input gain".into()));
        }
        state.check_preferences()?;
        state.input_gain = fraction;
        Ok(())
    }

    fn set_preferred_input_channel_count(&mut self, channels: u16) -> Result<()> {
        let mut state = self.state.lock();
        state.calls.push(SessionCall::SetPreferredInputChannelCount(channels));
        state.check_preferences()?;
        let max = state.current_port().map_or(0, |p| p.max_channels);
        if channels == 0 || channels > max {
            return Err(Error::Unsupported(format!("{channels} input channels")));
        }
        state.input_channels = channels;
        Ok(())
    }

    fn set_preferred_input(
        &mut self,
        port: &InputPort,
        pattern: Option<PolarPattern>,
    ) -> Result<()> {
        let mut state = self.state.lock();
        state
            .calls
            .push(SessionCall::SetPreferredInput(port.name.clone(), pattern));
        state.check_preferences()?;
        if !state.available.iter().any(|p| p.name == port.name) {
            return Err(Error::DeviceNotFound(port.name.clone()));
        }
        state.current = Some(port.name.clone());
        state.polar_pattern = pattern;
        match pattern {
            Some(PolarPattern::Stereo) => state.input_channels = 2,
            Some(PolarPattern::Omnidirectional) => state.input_channels = 1,
            None => {}
        }
        Ok(())
    }

    fn set_preferred_stereo_orientation(&mut self, orientation: StereoOrientation) -> Result<()> {
        let mut state = self.state.lock();
        state
            .calls
            .push(SessionCall::SetPreferredStereoOrientation(orientation));
        state.check_preferences()
    }
}

/// State behind a [`MockGraph`].
#[derive(Default)]
pub struct MockGraphState {
    effect: Option<Arc<dyn EffectUnit>>,
    renderer: Option<Box<dyn EffectRenderer>>,
    /// Format of the current attachment.
    pub format: Option<GraphFormat>,
    /// Whether the graph is running.
    pub active: bool,
    /// Makes `activate` fail.
    pub fail_activate: bool,
    /// Number of `attach` calls.
    pub attach_count: usize,
    /// Number of successful `activate` calls.
    pub activate_count: usize,
    /// Number of `detach` calls that released an effect.
    pub detach_count: usize,
}

impl MockGraphState {
    /// The attached effect, if any.
    pub fn effect(&self) -> Option<&Arc<dyn EffectUnit>> {
        self.effect.as_ref()
    }
}

impl std::fmt::Debug for MockGraphState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockGraphState")
            .field("attached", &self.effect.is_some())
            .field("format", &self.format)
            .field("active", &self.active)
            .field("attach_count", &self.attach_count)
            .field("activate_count", &self.activate_count)
            .field("detach_count", &self.detach_count)
            .finish_non_exhaustive()
    }
}

/// Shared-state [`AudioGraph`] double that renders on demand.
#[derive(Debug, Clone, Default)]
pub struct MockGraph {
    state: Arc<Mutex<MockGraphState>>,
}

impl MockGraph {
    /// An idle graph with nothing attached.
    pub fn new() -> Self {
        Self::default()
    }

    /// Locks the state for scripting or inspection.
    pub fn state(&self) -> MutexGuard<'_, MockGraphState> {
        self.state.lock()
    }

    /// Makes subsequent activations fail (or succeed again).
    pub fn fail_activation(&self, fail: bool) {
        self.state.lock().fail_activate = fail;
    }

    /// Renders one block through the attached effect, as the audio thread
    /// would. Returns `None` unless the graph is active.
    pub fn render(&self, input: &[f32]) -> Option<Vec<f32>> {
        let mut state = self.state.lock();
        if !state.active {
            return None;
        }
        let format = state.format?;
        let frames = input.len() / usize::from(format.input_channels.max(1));
        let mut output = vec![0.0; frames * usize::from(format.output_channels.max(1))];
        state.renderer.as_mut()?.render(input, &mut output);
        Some(output)
    }
}

impl AudioGraph for MockGraph {
    fn name(&self) -> &str {
        "mock"
    }

    fn attach(&mut self, effect: Arc<dyn EffectUnit>, format: GraphFormat) -> Result<()> {
        let mut state = self.state.lock();
        state.active = false;
        state.renderer = Some(effect.prepare(format));
        state.effect = Some(effect);
        state.format = Some(format);
        state.attach_count += 1;
        Ok(())
    }

    fn activate(&mut self) -> Result<()> {
        let mut state = self.state.lock();
        if state.effect.is_none() {
            return Err(Error::Stream("no effect attached".into()));
        }
        if state.fail_activate {
            return Err(Error::Rejected("mock activation failure".into()));
        }
        state.active = true;
        state.activate_count += 1;
        Ok(())
    }

    fn deactivate(&mut self) {
        self.state.lock().active = false;
    }

    fn detach(&mut self) {
        let mut state = self.state.lock();
        state.active = false;
        state.renderer = None;
        state.format = None;
        if state.effect.take().is_some() {
            state.detach_count += 1;
        }
    }

    fn is_attached(&self) -> bool {
        self.state.lock().effect.is_some()
    }

    fn is_active(&self) -> bool {
        self.state.lock().active
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use songfinder_core::{GainBalanceUnit, SILENT_FLOOR_DB};

    #[test]
    fn preferred_stereo_input_switches_channels() {
        let session = MockSession::new();
        let mut owned = session.clone();
        let mic = owned.built_in_mic().unwrap();
        owned
            .set_preferred_input(&mic, Some(PolarPattern::Stereo))
            .unwrap();
        assert_eq!(owned.input_channel_count(), 2);
        assert_eq!(owned.input_polar_pattern(), Some(PolarPattern::Stereo));
    }

    #[test]
    fn channel_count_beyond_port_is_rejected() {
        let session = MockSession::new();
        session.plug_in(InputPort::new("Headset", PortKind::Headset, 1), false);
        let mut owned = session.clone();
        assert!(owned.set_preferred_input_channel_count(2).is_err());
        assert_eq!(owned.input_channel_count(), 1);
    }

    #[test]
    fn unplug_falls_back() {
        let session = MockSession::new();
        session.plug_in(InputPort::new("Headset", PortKind::Headset, 1), false);
        session.unplug("Headset", true);
        assert_eq!(
            session.current_input_port_name().as_deref(),
            Some("Built-In Microphone")
        );
        assert!(session.is_input_gain_adjustable());
    }

    #[test]
    fn graph_renders_only_while_active() {
        let graph = MockGraph::new();
        let mut owned = graph.clone();
        let unit = Arc::new(GainBalanceUnit::new());
        owned.attach(unit.clone(), GraphFormat::default()).unwrap();
        assert!(graph.render(&[0.5]).is_none());

        owned.activate().unwrap();
        assert_eq!(graph.render(&[0.5]), Some(vec![0.5, 0.5]));
        assert!(unit.output_level_db(0) > SILENT_FLOOR_DB);

        owned.detach();
        assert!(graph.render(&[0.5]).is_none());
        assert_eq!(graph.state().detach_count, 1);
    }

    #[test]
    fn scripted_activation_failure() {
        let graph = MockGraph::new();
        graph.fail_activation(true);
        let mut owned = graph.clone();
        owned
            .attach(Arc::new(GainBalanceUnit::new()), GraphFormat::default())
            .unwrap();
        assert!(owned.activate().is_err());
        assert!(!owned.is_active());
    }
}
