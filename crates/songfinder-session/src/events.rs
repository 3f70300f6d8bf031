//! Events delivered to the session controller.
//!
//! Hardware notifications, state-load/save completions, audio-thread faults,
//! and commands from other threads all arrive as [`SessionEvent`]s on one
//! queue. Producers hold an [`EventSender`]; only the controller drains the
//! queue, so every state mutation happens on the controller's thread.

use crossbeam_channel::Sender;
use songfinder_config::ConfigError;
use songfinder_core::{
    DeviceOrientation, InterruptionPhase, ProcessingParameters, RouteChangeReason, WindowKind,
};
use songfinder_io::FaultCallback;
use std::sync::Arc;

/// A request to change run state or a parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Start processing.
    Start,
    /// Stop processing.
    Stop,
    /// Set the cutoff frequency in Hz.
    SetCutoff(u32),
    /// Set the pitch-shift divisor.
    SetPitchShift(u32),
    /// Set the analysis window kind.
    SetWindowKind(WindowKind),
    /// Set the analysis window size in milliseconds.
    SetWindowSize(u32),
    /// Set the app-side gain in dB.
    SetAppGain(f32),
    /// Set the balance in dB.
    SetBalance(f32),
    /// Set the hardware input gain in percent.
    SetInputGain(f32),
    /// Enable or disable the 0 Hz cutoff choice.
    SetZeroCutoffEnabled(bool),
    /// Load the saved snapshot.
    LoadState,
    /// Save the current snapshot.
    SaveState,
}

/// Something the controller must react to.
#[derive(Debug)]
pub enum SessionEvent {
    /// The platform changed the active audio route.
    RouteChange {
        /// Why the route changed.
        reason: RouteChangeReason,
        /// Whether the platform asks secondary audio to be silenced.
        silence_secondary_audio: bool,
    },
    /// An audio interruption began or ended.
    Interruption(InterruptionPhase),
    /// The device was rotated.
    OrientationChange(DeviceOrientation),
    /// The host application moved to an inactive lifecycle phase.
    AppBecameInactive,
    /// A background state load finished.
    StateLoaded(Result<ProcessingParameters, ConfigError>),
    /// A background state save finished.
    StateSaved(Result<(), ConfigError>),
    /// The real-time backend reported a stream failure.
    GraphFault(String),
    /// A command from another thread.
    Command(Command),
}

/// Cloneable, `Send` handle for posting events to a controller.
#[derive(Debug, Clone)]
pub struct EventSender {
    tx: Sender<SessionEvent>,
}

impl EventSender {
    pub(crate) fn new(tx: Sender<SessionEvent>) -> Self {
        Self { tx }
    }

    /// Posts an event. Returns `false` if the controller is gone.
    pub fn send(&self, event: SessionEvent) -> bool {
        self.tx.send(event).is_ok()
    }

    /// Posts a route change.
    pub fn route_change(&self, reason: RouteChangeReason, silence_secondary_audio: bool) -> bool {
        self.send(SessionEvent::RouteChange {
            reason,
            silence_secondary_audio,
        })
    }

    /// Posts an interruption phase.
    pub fn interruption(&self, phase: InterruptionPhase) -> bool {
        self.send(SessionEvent::Interruption(phase))
    }

    /// Posts an orientation change.
    pub fn orientation(&self, orientation: DeviceOrientation) -> bool {
        self.send(SessionEvent::OrientationChange(orientation))
    }

    /// Posts a command.
    pub fn command(&self, command: Command) -> bool {
        self.send(SessionEvent::Command(command))
    }

    /// A graph fault callback that posts [`SessionEvent::GraphFault`].
    pub fn fault_callback(&self) -> FaultCallback {
        let sender = self.clone();
        Arc::new(move |message: &str| {
            sender.send(SessionEvent::GraphFault(message.to_string()));
        })
    }
}
