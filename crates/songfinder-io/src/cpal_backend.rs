//! cpal-based platform session and audio graph.
//!
//! [`CpalSession`] answers the controller's hardware queries from cpal device
//! metadata and records its preferences (device names, channel count, sample
//! rate) in a shared table. [`CpalGraph`] reads the same table when it builds
//! streams, so a preference set on the session takes effect on the next
//! activation, exactly like a platform route preference.
//!
//! ## Stream Topology
//!
//! ```text
//! input stream ──Vec<f32>──► bounded channel ──► output stream
//!                                                  │ EffectRenderer::render
//!                                                  ▼
//!                                               device
//! ```
//!
//! Desktop hosts expose no hardware input gain, so
//! [`PlatformSession::is_input_gain_adjustable`] is always `false` and all
//! amplification happens in the effect.

use crate::backend::{AudioGraph, FaultCallback, InputPort, PlatformSession, StreamHandle};
use crate::stream::{
    default_output_channels, input_port, resolve_input_device, resolve_output_device,
};
use crate::{Error, Result};
use cpal::Host;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use parking_lot::Mutex;
use songfinder_core::{EffectUnit, GraphFormat, PolarPattern, StereoOrientation};
use std::sync::Arc;

/// Capture blocks buffered between input and output callbacks.
const CAPTURE_QUEUE_BLOCKS: usize = 8;

/// Moves the next `needed` capture samples into `block`.
///
/// Input and output run on separate clocks, so `pending` is first trimmed to
/// [`CAPTURE_QUEUE_BLOCKS`] blocks by dropping the oldest samples. Returns
/// `false` (leaving `block` untouched) while fewer than `needed` are queued.
fn next_capture_block(pending: &mut Vec<f32>, needed: usize, block: &mut Vec<f32>) -> bool {
    let limit = CAPTURE_QUEUE_BLOCKS * needed;
    if pending.len() > limit {
        pending.drain(..pending.len() - limit);
    }
    if needed == 0 || pending.len() < needed {
        return false;
    }
    block.clear();
    block.extend(pending.drain(..needed));
    true
}

#[derive(Debug, Clone)]
struct Preferences {
    input_device: Option<String>,
    output_device: Option<String>,
    sample_rate: u32,
    buffer_frames: u32,
    input_channels: Option<u16>,
    polar_pattern: Option<PolarPattern>,
    stereo_orientation: Option<StereoOrientation>,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            input_device: None,
            output_device: None,
            sample_rate: 48000,
            buffer_frames: 128,
            input_channels: None,
            polar_pattern: None,
            stereo_orientation: None,
        }
    }
}

/// Platform session backed by the default cpal host.
pub struct CpalSession {
    host: Host,
    prefs: Arc<Mutex<Preferences>>,
}

impl CpalSession {
    /// Creates a session. `None` selects the system default device.
    pub fn new(input_device: Option<String>, output_device: Option<String>) -> Self {
        let host = cpal::default_host();
        tracing::info!(host = host.id().name(), "cpal session initialized");
        Self {
            host,
            prefs: Arc::new(Mutex::new(Preferences {
                input_device,
                output_device,
                ..Preferences::default()
            })),
        }
    }

    /// Creates a graph sharing this session's device preferences.
    ///
    /// `on_fault` is called from the audio thread when a running stream fails.
    pub fn graph(&self, on_fault: FaultCallback) -> CpalGraph {
        CpalGraph {
            host: cpal::default_host(),
            prefs: Arc::clone(&self.prefs),
            on_fault,
            attached: None,
            streams: None,
        }
    }

    fn input_device(&self) -> Result<cpal::Device> {
        let name = self.prefs.lock().input_device.clone();
        resolve_input_device(&self.host, name.as_deref())
    }

    fn output_device(&self) -> Result<cpal::Device> {
        let name = self.prefs.lock().output_device.clone();
        resolve_output_device(&self.host, name.as_deref())
    }
}

impl PlatformSession for CpalSession {
    fn name(&self) -> &str {
        "cpal"
    }

    fn configure(&mut self, sample_rate: u32, buffer_frames: u32) -> Result<()> {
        let input = self.input_device()?;
        let output = self.output_device()?;

        let supports = |ranges: Option<Vec<(u32, u32)>>| {
            ranges.is_some_and(|r| r.iter().any(|&(lo, hi)| (lo..=hi).contains(&sample_rate)))
        };
        let input_rates = input.supported_input_configs().ok().map(|configs| {
            configs
                .map(|c| (c.min_sample_rate(), c.max_sample_rate()))
                .collect()
        });
        let output_rates = output.supported_output_configs().ok().map(|configs| {
            configs
                .map(|c| (c.min_sample_rate(), c.max_sample_rate()))
                .collect()
        });
        if !supports(input_rates) || !supports(output_rates) {
            return Err(Error::Unsupported(format!("sample rate {sample_rate} Hz")));
        }

        let mut prefs = self.prefs.lock();
        prefs.sample_rate = sample_rate;
        prefs.buffer_frames = buffer_frames;
        tracing::info!(sample_rate, buffer_frames, "cpal session configured");
        Ok(())
    }

    fn current_input_port(&self) -> Option<InputPort> {
        self.input_device().ok().as_ref().and_then(input_port)
    }

    fn available_inputs(&self) -> Vec<InputPort> {
        self.host
            .input_devices()
            .map(|devices| devices.filter_map(|d| input_port(&d)).collect())
            .unwrap_or_default()
    }

    fn is_input_gain_adjustable(&self) -> bool {
        false
    }

    fn input_channel_count(&self) -> u16 {
        let max = self.max_input_channel_count();
        let preferred = self.prefs.lock().input_channels;
        preferred.unwrap_or(1).clamp(1, max.max(1))
    }

    fn output_channel_count(&self) -> u16 {
        self.output_device()
            .map(|d| default_output_channels(&d).min(2))
            .unwrap_or(2)
    }

    fn max_input_channel_count(&self) -> u16 {
        self.current_input_port().map_or(0, |p| p.max_channels)
    }

    fn sample_rate(&self) -> u32 {
        self.prefs.lock().sample_rate
    }

    fn input_polar_pattern(&self) -> Option<PolarPattern> {
        let port = self.current_input_port()?;
        if !port.supports_stereo {
            return None;
        }
        Some(
            self.prefs
                .lock()
                .polar_pattern
                .unwrap_or(PolarPattern::Omnidirectional),
        )
    }

    fn set_input_gain(&mut self, _fraction: f32) -> Result<()> {
        Err(Error::Unsupported("hardware input gain".into()))
    }

    fn set_preferred_input_channel_count(&mut self, channels: u16) -> Result<()> {
        let max = self.max_input_channel_count();
        if channels == 0 || channels > max {
            return Err(Error::Unsupported(format!(
                "{channels} input channels (device offers {max})"
            )));
        }
        self.prefs.lock().input_channels = Some(channels);
        Ok(())
    }

    fn set_preferred_input(
        &mut self,
        port: &InputPort,
        pattern: Option<PolarPattern>,
    ) -> Result<()> {
        if !self.available_inputs().iter().any(|p| p.name == port.name) {
            return Err(Error::DeviceNotFound(port.name.clone()));
        }
        if pattern == Some(PolarPattern::Stereo) && !port.supports_stereo {
            return Err(Error::Unsupported(format!("stereo capture on {}", port.name)));
        }
        let mut prefs = self.prefs.lock();
        prefs.input_device = Some(port.name.clone());
        prefs.polar_pattern = pattern;
        prefs.input_channels = match pattern {
            Some(PolarPattern::Stereo) => Some(2),
            Some(PolarPattern::Omnidirectional) => Some(1),
            None => prefs.input_channels,
        };
        Ok(())
    }

    fn set_preferred_stereo_orientation(&mut self, orientation: StereoOrientation) -> Result<()> {
        self.prefs.lock().stereo_orientation = Some(orientation);
        tracing::debug!(?orientation, "stereo orientation preference recorded");
        Ok(())
    }
}

/// Real-time graph running an effect between two cpal streams.
pub struct CpalGraph {
    host: Host,
    prefs: Arc<Mutex<Preferences>>,
    on_fault: FaultCallback,
    attached: Option<(Arc<dyn EffectUnit>, GraphFormat)>,
    streams: Option<(StreamHandle, StreamHandle)>,
}

impl CpalGraph {
    fn stream_config(channels: u16, format: GraphFormat) -> cpal::StreamConfig {
        cpal::StreamConfig {
            channels,
            sample_rate: format.sample_rate,
            buffer_size: cpal::BufferSize::Fixed(format.buffer_frames),
        }
    }
}

impl AudioGraph for CpalGraph {
    fn name(&self) -> &str {
        "cpal"
    }

    fn attach(&mut self, effect: Arc<dyn EffectUnit>, format: GraphFormat) -> Result<()> {
        self.detach();
        tracing::debug!(
            effect = effect.name(),
            input_channels = format.input_channels,
            output_channels = format.output_channels,
            "effect attached"
        );
        self.attached = Some((effect, format));
        Ok(())
    }

    fn activate(&mut self) -> Result<()> {
        if self.streams.is_some() {
            return Ok(());
        }
        let (effect, format) = self
            .attached
            .as_ref()
            .ok_or_else(|| Error::Stream("no effect attached".into()))?;
        let format = *format;

        let (input_name, output_name) = {
            let prefs = self.prefs.lock();
            (prefs.input_device.clone(), prefs.output_device.clone())
        };
        let input_device = resolve_input_device(&self.host, input_name.as_deref())?;
        let output_device = resolve_output_device(&self.host, output_name.as_deref())?;

        let (tx, rx) = crossbeam_channel::bounded::<Vec<f32>>(CAPTURE_QUEUE_BLOCKS);

        let input_fault = Arc::clone(&self.on_fault);
        let input_stream = input_device
            .build_input_stream(
                &Self::stream_config(format.input_channels, format),
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    let _ = tx.try_send(data.to_vec());
                },
                move |err| input_fault(&err.to_string()),
                None,
            )
            .map_err(|e| Error::Stream(e.to_string()))?;

        let mut renderer = effect.prepare(format);
        let input_channels = usize::from(format.input_channels);
        let output_channels = usize::from(format.output_channels);
        let mut pending: Vec<f32> = Vec::new();
        let mut block: Vec<f32> = Vec::new();
        let output_fault = Arc::clone(&self.on_fault);
        let output_stream = output_device
            .build_output_stream(
                &Self::stream_config(format.output_channels, format),
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    while let Ok(samples) = rx.try_recv() {
                        pending.extend(samples);
                    }
                    let needed = data.len() / output_channels * input_channels;
                    if next_capture_block(&mut pending, needed, &mut block) {
                        renderer.render(&block, data);
                    } else {
                        data.fill(0.0);
                    }
                },
                move |err| output_fault(&err.to_string()),
                None,
            )
            .map_err(|e| Error::Stream(e.to_string()))?;

        input_stream
            .play()
            .map_err(|e| Error::Stream(e.to_string()))?;
        output_stream
            .play()
            .map_err(|e| Error::Stream(e.to_string()))?;

        tracing::info!(
            sample_rate = format.sample_rate,
            input_channels = format.input_channels,
            output_channels = format.output_channels,
            buffer_frames = format.buffer_frames,
            "audio graph active"
        );
        self.streams = Some((StreamHandle::new(input_stream), StreamHandle::new(output_stream)));
        Ok(())
    }

    fn deactivate(&mut self) {
        if self.streams.take().is_some() {
            tracing::info!("audio graph inactive");
        }
    }

    fn detach(&mut self) {
        self.deactivate();
        self.attached = None;
    }

    fn is_attached(&self) -> bool {
        self.attached.is_some()
    }

    fn is_active(&self) -> bool {
        self.streams.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use songfinder_core::GainBalanceUnit;

    #[test]
    fn session_name() {
        let session = CpalSession::new(None, None);
        assert_eq!(session.name(), "cpal");
        assert!(!session.is_input_gain_adjustable());
    }

    #[test]
    fn input_gain_is_unsupported() {
        let mut session = CpalSession::new(None, None);
        assert!(matches!(session.set_input_gain(0.5), Err(Error::Unsupported(_))));
    }

    #[test]
    fn activate_without_attach_fails() {
        let session = CpalSession::new(None, None);
        let mut graph = session.graph(Arc::new(|_: &str| {}));
        assert!(graph.activate().is_err());
        assert!(!graph.is_active());
    }

    #[test]
    fn capture_backlog_stays_bounded() {
        let needed = 4;
        let mut pending = Vec::new();
        let mut block = Vec::new();

        // Input outpaces output by one sample per callback.
        let mut next = 0.0;
        for _ in 0..1000 {
            for _ in 0..=needed {
                pending.push(next);
                next += 1.0;
            }
            assert!(next_capture_block(&mut pending, needed, &mut block));
            assert!(pending.len() <= CAPTURE_QUEUE_BLOCKS * needed);
        }

        // The oldest samples were dropped, so the newest are close behind.
        let newest = next - 1.0;
        assert!(newest - block[needed - 1] <= (CAPTURE_QUEUE_BLOCKS * needed) as f32);
    }

    #[test]
    fn capture_block_waits_for_enough_samples() {
        let mut pending = vec![1.0, 2.0, 3.0];
        let mut block = vec![9.0];
        assert!(!next_capture_block(&mut pending, 4, &mut block));
        assert_eq!(pending, vec![1.0, 2.0, 3.0]);
        assert_eq!(block, vec![9.0]);

        pending.push(4.0);
        assert!(next_capture_block(&mut pending, 4, &mut block));
        assert_eq!(block, vec![1.0, 2.0, 3.0, 4.0]);
        assert!(pending.is_empty());
    }

    #[test]
    fn detach_releases_effect() {
        let session = CpalSession::new(None, None);
        let mut graph = session.graph(Arc::new(|_: &str| {}));
        graph
            .attach(Arc::new(GainBalanceUnit::new()), GraphFormat::default())
            .unwrap();
        assert!(graph.is_attached());
        graph.detach();
        assert!(!graph.is_attached());
        assert!(!graph.is_active());
    }
}
