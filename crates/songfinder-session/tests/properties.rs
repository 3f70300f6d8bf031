//! Property-based tests for the session controller state machine.
//!
//! Whatever mix of commands and hardware events arrives, the graph is active
//! exactly while the controller reports `Running`, levels are silent while
//! stopped, and every parameter stays inside its domain.

use proptest::prelude::*;
use songfinder_core::params::allowed_cutoffs;
use songfinder_core::{EffectUnit, GainBalanceUnit, InterruptionPhase, RouteChangeReason, WindowKind};
use songfinder_io::AudioGraph;
use songfinder_io::mock::{MockGraph, MockSession};
use songfinder_session::{Command, SessionConfig, SessionController, SessionEvent};
use std::sync::Arc;

#[derive(Debug, Clone)]
enum Step {
    Event(StepEvent),
    FailActivation(bool),
}

#[derive(Debug, Clone)]
enum StepEvent {
    Command(Command),
    Route(RouteChangeReason, bool),
    Interruption(InterruptionPhase),
}

fn reason() -> impl Strategy<Value = RouteChangeReason> {
    prop_oneof![
        Just(RouteChangeReason::CategoryChange),
        Just(RouteChangeReason::NewDeviceAvailable),
        Just(RouteChangeReason::OldDeviceUnavailable),
        Just(RouteChangeReason::Override),
        Just(RouteChangeReason::WakeFromSleep),
        Just(RouteChangeReason::NoSuitableRoute),
        Just(RouteChangeReason::RouteConfigurationChange),
        Just(RouteChangeReason::Unknown),
    ]
}

fn command() -> impl Strategy<Value = Command> {
    prop_oneof![
        Just(Command::Start),
        Just(Command::Stop),
        any::<u32>().prop_map(Command::SetCutoff),
        any::<u32>().prop_map(Command::SetPitchShift),
        prop_oneof![Just(WindowKind::Hann), Just(WindowKind::SongFinder)]
            .prop_map(Command::SetWindowKind),
        any::<u32>().prop_map(Command::SetWindowSize),
        (-40.0f32..40.0).prop_map(Command::SetAppGain),
        (-20.0f32..20.0).prop_map(Command::SetBalance),
        (-50.0f32..150.0).prop_map(Command::SetInputGain),
        any::<bool>().prop_map(Command::SetZeroCutoffEnabled),
    ]
}

fn step() -> impl Strategy<Value = Step> {
    prop_oneof![
        6 => command().prop_map(|c| Step::Event(StepEvent::Command(c))),
        3 => (reason(), any::<bool>()).prop_map(|(r, s)| Step::Event(StepEvent::Route(r, s))),
        1 => prop_oneof![Just(InterruptionPhase::Began), Just(InterruptionPhase::Ended)]
            .prop_map(|p| Step::Event(StepEvent::Interruption(p))),
        1 => any::<bool>().prop_map(Step::FailActivation),
    ]
}

fn controller(graph: &MockGraph) -> SessionController {
    SessionController::new(
        SessionConfig::default(),
        Box::new(MockSession::new()),
        Box::new(graph.clone()),
        Box::new(|| Arc::new(GainBalanceUnit::new()) as Arc<dyn EffectUnit>),
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Run state, graph state and levels agree after every step.
    #[test]
    fn graph_active_iff_running(steps in prop::collection::vec(step(), 1..40)) {
        let graph = MockGraph::new();
        let mut controller = controller(&graph);

        for step in steps {
            match step {
                Step::FailActivation(fail) => graph.fail_activation(fail),
                Step::Event(StepEvent::Command(c)) => controller.execute(c),
                Step::Event(StepEvent::Route(reason, silence)) => {
                    controller.handle_event(SessionEvent::RouteChange {
                        reason,
                        silence_secondary_audio: silence,
                    });
                }
                Step::Event(StepEvent::Interruption(phase)) => {
                    controller.handle_event(SessionEvent::Interruption(phase));
                }
            }

            let observer = graph.clone();
            prop_assert_eq!(controller.is_running(), observer.is_active());
            prop_assert_eq!(controller.is_running(), observer.is_attached());
            prop_assert_eq!(controller.is_running(), controller.effect().is_some());
            if !controller.is_running() {
                prop_assert!(controller.levels().is_silent());
            }

            let params = controller.parameters();
            let zero = controller.config().zero_cutoff_enabled;
            prop_assert!(allowed_cutoffs(zero).contains(&params.cutoff_hz));
            prop_assert!((2..=4).contains(&params.pitch_shift_divisor));
            prop_assert!((5..=50).contains(&params.window_size_ms));
            prop_assert!((0.0..=20.0).contains(&params.app_gain_db));
            prop_assert!((-10.0..=10.0).contains(&params.balance_db));
            prop_assert!((0.0..=100.0).contains(&controller.input_gain_percent()));
        }
    }

    /// Gain and balance changes never rebuild a running graph.
    #[test]
    fn live_parameters_never_restart(
        gains in prop::collection::vec((-40.0f32..40.0, -20.0f32..20.0), 1..50),
    ) {
        let graph = MockGraph::new();
        let mut controller = controller(&graph);
        controller.start();
        for (gain, balance) in gains {
            controller.set_app_gain(gain);
            controller.set_balance(balance);
        }
        prop_assert!(controller.is_running());
        prop_assert_eq!(graph.state().attach_count, 1);
    }
}
