//! Route and interruption decisions.
//!
//! Pure decision functions plus the platform-preference steps the controller
//! runs before acting on a route change. The router never mutates controller
//! state; the controller calls these and applies the outcome.
//!
//! # Decision Table
//!
//! | Event | Action |
//! |---|---|
//! | `CategoryChange`, silence hint set | stop |
//! | `CategoryChange`, no hint | restart if running |
//! | `NewDeviceAvailable` | restart if running |
//! | `OldDeviceUnavailable` | stop |
//! | any other reason | restart if running |
//! | interruption began | stop |
//! | interruption ended | none |

use songfinder_core::{
    DeviceOrientation, InterruptionPhase, PolarPattern, RouteChangeReason, StereoOrientation,
};
use songfinder_io::{PlatformSession, PortKind};

/// What the controller does in response to a hardware event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteAction {
    /// Tear the graph down.
    Stop,
    /// Rebuild the graph if it was running.
    RestartIfRunning,
}

/// Action for a route change.
pub fn route_action(reason: RouteChangeReason, silence_secondary_audio: bool) -> RouteAction {
    match reason {
        RouteChangeReason::CategoryChange if silence_secondary_audio => RouteAction::Stop,
        RouteChangeReason::OldDeviceUnavailable => RouteAction::Stop,
        RouteChangeReason::CategoryChange
        | RouteChangeReason::NewDeviceAvailable
        | RouteChangeReason::Override
        | RouteChangeReason::WakeFromSleep
        | RouteChangeReason::NoSuitableRoute
        | RouteChangeReason::RouteConfigurationChange
        | RouteChangeReason::Unknown => RouteAction::RestartIfRunning,
    }
}

/// Action for an interruption phase, if any.
pub fn interruption_action(phase: InterruptionPhase) -> Option<RouteAction> {
    match phase {
        InterruptionPhase::Began => Some(RouteAction::Stop),
        InterruptionPhase::Ended => None,
    }
}

/// Asks the platform for an input channel layout matching the output.
///
/// - Stereo in, mono out on the built-in mic: prefer the mic in mono.
/// - Mono in, stereo out: prefer two channels from the current input, or
///   else the built-in mic's stereo pattern, oriented for `last_orientation`.
///
/// Failures are logged and otherwise ignored. Returns whether a preference
/// was applied.
pub fn reconcile_channel_counts(
    session: &mut dyn PlatformSession,
    last_orientation: Option<DeviceOrientation>,
) -> bool {
    let inputs = session.input_channel_count();
    let outputs = session.output_channel_count();
    if inputs == outputs {
        return false;
    }
    tracing::debug!(inputs, outputs, "channel counts differ");

    if inputs >= 2 && outputs == 1 {
        let Some(port) = session.current_input_port() else {
            return false;
        };
        if port.kind != PortKind::BuiltInMic {
            return false;
        }
        return prefer_input(session, &port, PolarPattern::Omnidirectional);
    }

    if inputs == 1 && outputs >= 2 {
        if session.max_input_channel_count() >= 2 {
            return match session.set_preferred_input_channel_count(2) {
                Ok(()) => {
                    tracing::info!("preferring two input channels");
                    true
                }
                Err(e) => {
                    tracing::warn!(error = %e, "could not prefer two input channels");
                    false
                }
            };
        }
        if let Some(mic) = session.built_in_mic()
            && mic.supports_stereo
            && prefer_input(session, &mic, PolarPattern::Stereo)
        {
            if let Some(orientation) = last_orientation {
                reapply_stereo_orientation(session, orientation);
            }
            return true;
        }
    }
    false
}

/// Re-applies the stereo orientation hint if the input captures in stereo.
///
/// Returns whether a hint was applied.
pub fn reapply_stereo_orientation(
    session: &mut dyn PlatformSession,
    orientation: DeviceOrientation,
) -> bool {
    if session.input_polar_pattern() != Some(PolarPattern::Stereo) {
        return false;
    }
    let Some(stereo) = StereoOrientation::for_device(orientation) else {
        return false;
    };
    match session.set_preferred_stereo_orientation(stereo) {
        Ok(()) => {
            tracing::debug!(?stereo, "stereo orientation applied");
            true
        }
        Err(e) => {
            tracing::warn!(error = %e, "could not set stereo orientation");
            false
        }
    }
}

fn prefer_input(
    session: &mut dyn PlatformSession,
    port: &songfinder_io::InputPort,
    pattern: PolarPattern,
) -> bool {
    match session.set_preferred_input(port, Some(pattern)) {
        Ok(()) => {
            tracing::info!(port = %port.name, ?pattern, "preferred input applied");
            true
        }
        Err(e) => {
            tracing::warn!(port = %port.name, ?pattern, error = %e, "could not prefer input");
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use songfinder_io::InputPort;
    use songfinder_io::mock::{MockSession, SessionCall};

    #[test]
    fn decision_table() {
        use RouteChangeReason as R;
        assert_eq!(route_action(R::CategoryChange, true), RouteAction::Stop);
        assert_eq!(
            route_action(R::CategoryChange, false),
            RouteAction::RestartIfRunning
        );
        assert_eq!(
            route_action(R::NewDeviceAvailable, true),
            RouteAction::RestartIfRunning
        );
        assert_eq!(route_action(R::OldDeviceUnavailable, false), RouteAction::Stop);
        for reason in [
            R::Override,
            R::WakeFromSleep,
            R::NoSuitableRoute,
            R::RouteConfigurationChange,
            R::Unknown,
        ] {
            assert_eq!(route_action(reason, true), RouteAction::RestartIfRunning);
        }
        assert_eq!(
            interruption_action(InterruptionPhase::Began),
            Some(RouteAction::Stop)
        );
        assert_eq!(interruption_action(InterruptionPhase::Ended), None);
    }

    #[test]
    fn matching_counts_do_nothing() {
        let session = MockSession::new();
        session.set_channels(2, 2);
        let mut owned = session.clone();
        assert!(!reconcile_channel_counts(&mut owned, None));
        assert!(session.calls().is_empty());
    }

    #[test]
    fn mono_in_stereo_out_prefers_two_channels() {
        let session = MockSession::new();
        let mut owned = session.clone();
        assert!(reconcile_channel_counts(&mut owned, None));
        assert_eq!(
            session.calls(),
            vec![SessionCall::SetPreferredInputChannelCount(2)]
        );
        assert_eq!(session.state().input_channels, 2);
    }

    #[test]
    fn mono_port_falls_back_to_stereo_built_in_mic() {
        let session = MockSession::new();
        session.plug_in(InputPort::new("Headset", PortKind::Headset, 1), false);
        let mut owned = session.clone();
        assert!(reconcile_channel_counts(
            &mut owned,
            Some(DeviceOrientation::LandscapeLeft)
        ));
        assert_eq!(
            session.calls(),
            vec![
                SessionCall::SetPreferredInput(
                    "Built-In Microphone".into(),
                    Some(PolarPattern::Stereo)
                ),
                SessionCall::SetPreferredStereoOrientation(StereoOrientation::LandscapeRight),
            ]
        );
    }

    #[test]
    fn stereo_in_mono_out_prefers_mono_built_in_mic() {
        let session = MockSession::new();
        session.set_channels(2, 1);
        let mut owned = session.clone();
        assert!(reconcile_channel_counts(&mut owned, None));
        assert_eq!(
            session.calls(),
            vec![SessionCall::SetPreferredInput(
                "Built-In Microphone".into(),
                Some(PolarPattern::Omnidirectional)
            )]
        );
        assert_eq!(session.state().input_channels, 1);
    }

    #[test]
    fn preference_failure_is_swallowed() {
        let session = MockSession::new();
        session.state().fail_preferences = true;
        let mut owned = session.clone();
        assert!(!reconcile_channel_counts(&mut owned, None));
    }

    #[test]
    fn orientation_only_applies_in_stereo() {
        let session = MockSession::new();
        let mut owned = session.clone();
        assert!(!reapply_stereo_orientation(
            &mut owned,
            DeviceOrientation::Portrait
        ));
        session.state().polar_pattern = Some(PolarPattern::Stereo);
        assert!(!reapply_stereo_orientation(&mut owned, DeviceOrientation::FaceUp));
        assert!(reapply_stereo_orientation(
            &mut owned,
            DeviceOrientation::Portrait
        ));
    }
}
