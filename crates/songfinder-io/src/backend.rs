//! Platform collaborator traits.
//!
//! The session controller never talks to an audio API directly. It sees two
//! object-safe seams, each owned exclusively by the controller:
//!
//! ```text
//! ┌──────────────────────────────────┐
//! │        SessionController         │
//! └──────┬─────────────────┬─────────┘
//!        │ queries/mutators │ attach/activate
//!        ▼                  ▼
//! ┌───────────────┐  ┌───────────────┐
//! │PlatformSession│  │  AudioGraph   │
//! └──────┬────────┘  └──────┬────────┘
//!        │ implemented by    │
//!   ┌────┴─────┐        ┌────┴─────┐
//!   ▼          ▼        ▼          ▼
//! CpalSession MockSession CpalGraph MockGraph
//! ```
//!
//! [`PlatformSession`] is the hardware view: which input port is current, whether
//! its gain is adjustable, channel counts, and the preference setters. Its
//! setters may fail; callers decide whether a failure matters.
//!
//! [`AudioGraph`] is the real-time path. An effect is attached with a negotiated
//! [`GraphFormat`], then the graph is activated. Deactivating and detaching
//! always succeed and leave nothing running.

use crate::Result;
use songfinder_core::{EffectUnit, GraphFormat, PolarPattern, StereoOrientation};
use std::sync::Arc;

/// Callback invoked from a real-time backend thread when a running stream fails.
pub type FaultCallback = Arc<dyn Fn(&str) + Send + Sync>;

/// Broad class of an input port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PortKind {
    /// Microphone built into the device.
    BuiltInMic,
    /// Wired headset microphone.
    Headset,
    /// USB audio interface or microphone.
    Usb,
    /// Bluetooth headset.
    Bluetooth,
    /// Anything else.
    Other,
}

impl PortKind {
    /// Guesses the kind from a device name.
    ///
    /// ```rust
    /// use songfinder_io::PortKind;
    ///
    /// assert_eq!(PortKind::from_device_name("MacBook Pro Microphone"), PortKind::BuiltInMic);
    /// assert_eq!(PortKind::from_device_name("Scarlett 2i2 USB"), PortKind::Usb);
    /// ```
    pub fn from_device_name(name: &str) -> Self {
        let lower = name.to_lowercase();
        if lower.contains("usb") {
            PortKind::Usb
        } else if lower.contains("bluetooth") || lower.contains("airpods") {
            PortKind::Bluetooth
        } else if lower.contains("headset") || lower.contains("headphone") {
            PortKind::Headset
        } else if lower.contains("built-in")
            || lower.contains("internal")
            || lower.contains("microphone")
            || lower.contains("mic")
        {
            PortKind::BuiltInMic
        } else {
            PortKind::Other
        }
    }
}

/// A named physical input endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputPort {
    /// Port name; also the key for remembered gains.
    pub name: String,
    /// Broad class of the port.
    pub kind: PortKind,
    /// Most channels the port can capture.
    pub max_channels: u16,
    /// Whether the port offers a stereo polar pattern.
    pub supports_stereo: bool,
}

impl InputPort {
    /// Creates a port description.
    pub fn new(name: impl Into<String>, kind: PortKind, max_channels: u16) -> Self {
        Self {
            name: name.into(),
            kind,
            max_channels,
            supports_stereo: max_channels >= 2,
        }
    }
}

/// Hardware query and preference surface of the platform audio session.
///
/// Owned by the session controller. Implementations must be cheap to query;
/// the controller calls the getters on every route change.
pub trait PlatformSession: Send {
    /// Human-readable backend name (e.g., "cpal", "mock").
    fn name(&self) -> &str;

    /// Applies the preferred sample rate and I/O buffer duration.
    fn configure(&mut self, sample_rate: u32, buffer_frames: u32) -> Result<()>;

    /// The current input port, if any.
    fn current_input_port(&self) -> Option<InputPort>;

    /// Name of the current input port, if any.
    fn current_input_port_name(&self) -> Option<String> {
        self.current_input_port().map(|port| port.name)
    }

    /// Every input port the platform offers.
    fn available_inputs(&self) -> Vec<InputPort>;

    /// The device's built-in microphone, if present.
    fn built_in_mic(&self) -> Option<InputPort> {
        self.available_inputs()
            .into_iter()
            .find(|port| port.kind == PortKind::BuiltInMic)
    }

    /// Whether the current input's hardware gain can be set.
    fn is_input_gain_adjustable(&self) -> bool;

    /// Active input channel count.
    fn input_channel_count(&self) -> u16;

    /// Active output channel count.
    fn output_channel_count(&self) -> u16;

    /// Most input channels the current route can deliver.
    fn max_input_channel_count(&self) -> u16;

    /// Active hardware sample rate in Hz.
    fn sample_rate(&self) -> u32;

    /// Polar pattern of the current input data source, if it has one.
    fn input_polar_pattern(&self) -> Option<PolarPattern>;

    /// Sets the hardware input gain, `fraction` in 0..=1.
    fn set_input_gain(&mut self, fraction: f32) -> Result<()>;

    /// Asks for a specific number of input channels.
    fn set_preferred_input_channel_count(&mut self, channels: u16) -> Result<()>;

    /// Makes `port` the preferred input, optionally selecting a polar pattern.
    fn set_preferred_input(&mut self, port: &InputPort, pattern: Option<PolarPattern>)
    -> Result<()>;

    /// Sets the orientation hint for stereo capture.
    fn set_preferred_stereo_orientation(&mut self, orientation: StereoOrientation) -> Result<()>;

    /// Graph format for the current route.
    fn graph_format(&self, buffer_frames: u32) -> GraphFormat {
        GraphFormat {
            sample_rate: self.sample_rate(),
            input_channels: self.input_channel_count().max(1),
            output_channels: self.output_channel_count().max(1),
            buffer_frames,
        }
    }
}

/// The real-time audio graph connecting hardware input, effect, and output.
///
/// Owned by the session controller. The graph holds the attached effect until
/// [`detach`](Self::detach); it must not keep rendering into it afterwards.
pub trait AudioGraph: Send {
    /// Human-readable backend name.
    fn name(&self) -> &str;

    /// Connects `effect` between input and output using `format`.
    ///
    /// Replaces any previous attachment.
    fn attach(&mut self, effect: Arc<dyn EffectUnit>, format: GraphFormat) -> Result<()>;

    /// Starts real-time processing. Requires an attached effect.
    fn activate(&mut self) -> Result<()>;

    /// Stops real-time processing. No-op when inactive.
    fn deactivate(&mut self);

    /// Deactivates and releases the attached effect. No-op when detached.
    fn detach(&mut self);

    /// Whether an effect is attached.
    fn is_attached(&self) -> bool;

    /// Whether real-time processing is running.
    fn is_active(&self) -> bool;
}

/// Type-erased audio stream handle.
///
/// The stream is active while this handle exists; dropping it stops
/// playback/capture.
pub struct StreamHandle {
    _inner: Box<dyn Send>,
}

impl StreamHandle {
    /// Wraps a backend-specific stream object, keeping it alive until drop.
    pub fn new<T: Send + 'static>(stream: T) -> Self {
        Self {
            _inner: Box::new(stream),
        }
    }
}

impl std::fmt::Debug for StreamHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamHandle").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn port_kind_guesses() {
        assert_eq!(PortKind::from_device_name("Built-in Microphone"), PortKind::BuiltInMic);
        assert_eq!(PortKind::from_device_name("AirPods Pro"), PortKind::Bluetooth);
        assert_eq!(PortKind::from_device_name("Headset Mic"), PortKind::Headset);
        assert_eq!(PortKind::from_device_name("default"), PortKind::Other);
    }

    #[test]
    fn stereo_support_follows_channels() {
        assert!(!InputPort::new("Mic", PortKind::BuiltInMic, 1).supports_stereo);
        assert!(InputPort::new("Mic", PortKind::BuiltInMic, 2).supports_stereo);
    }

    #[test]
    fn stream_handle_debug() {
        let handle = StreamHandle::new(42u32);
        assert!(format!("{handle:?}").contains("StreamHandle"));
    }
}
