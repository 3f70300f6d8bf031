//! Session controller.
//!
//! The single owner of the run state, the parameter snapshot, the audio graph
//! and the attached effect. Everything that changes session state happens in
//! a `&mut self` method on the owning thread; other threads post
//! [`SessionEvent`]s through an [`EventSender`].
//!
//! # Run State
//!
//! ```text
//!              start()                     stop()
//!   Stopped ─────────────▶ Running ─────────────────▶ Stopped
//!      ▲                   │     ▲
//!      │  activate fails   │     │ restart() = stop(); start()
//!      └───────────────────┘     └──── restart setters, route changes
//! ```
//!
//! `Running` exactly when an [`ActiveGraph`] record exists. The record holds
//! the attached effect and the level meter, so stopping drops both at once.
//!
//! # Restart vs. Live Parameters
//!
//! | Setter | Effect write | Restart |
//! |---|---|---|
//! | [`set_cutoff`](SessionController::set_cutoff) | yes | if running |
//! | [`set_pitch_shift`](SessionController::set_pitch_shift) | yes | if running |
//! | [`set_window_kind`](SessionController::set_window_kind) | yes | if running |
//! | [`set_window_size`](SessionController::set_window_size) | yes | if running |
//! | [`set_app_gain`](SessionController::set_app_gain) | yes | never |
//! | [`set_balance`](SessionController::set_balance) | yes | never |

use crate::bridge;
use crate::config::SessionConfig;
use crate::errors::{ErrorChannel, Severity};
use crate::events::{Command, EventSender, SessionEvent};
use crate::gain_memory::GainMemory;
use crate::meter::LevelMeterSampler;
use crate::router::{self, RouteAction};
use crossbeam_channel::Receiver;
use songfinder_config::{ConfigError, StateCodec};
use songfinder_core::params::{
    INPUT_GAIN_RANGE_PERCENT, coerce_app_gain, coerce_balance, coerce_cutoff, coerce_input_gain,
    coerce_pitch_shift, coerce_window_size,
};
use songfinder_core::{
    DeviceOrientation, EffectUnit, GainSetting, InterruptionPhase, OutputLevels,
    ProcessingParameters, RouteChangeReason, WindowKind, param_info,
};
use songfinder_io::{AudioGraph, PlatformSession};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Builds a fresh effect unit. Called once at construction to read defaults
/// and once per [`SessionController::start`].
pub type EffectFactory = Box<dyn Fn() -> Arc<dyn EffectUnit> + Send>;

/// Whether the audio graph is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunState {
    /// No graph, no effect, levels silent.
    #[default]
    Stopped,
    /// Graph active with the effect attached.
    Running,
}

/// Resources that exist only while running.
struct ActiveGraph {
    effect: Arc<dyn EffectUnit>,
    meter: LevelMeterSampler,
}

/// What woke [`SessionController::wait_and_dispatch`].
enum Wake {
    Event(SessionEvent),
    Tick,
    Idle,
}

/// Owner of the session lifecycle.
///
/// ## Example
///
/// ```rust
/// use songfinder_core::{EffectUnit, GainBalanceUnit};
/// use songfinder_io::mock::{MockGraph, MockSession};
/// use songfinder_session::{RunState, SessionConfig, SessionController};
/// use std::sync::Arc;
///
/// let mut session = SessionController::new(
///     SessionConfig::default(),
///     Box::new(MockSession::new()),
///     Box::new(MockGraph::new()),
///     Box::new(|| Arc::new(GainBalanceUnit::new()) as Arc<dyn EffectUnit>),
/// );
/// session.start();
/// assert_eq!(session.run_state(), RunState::Running);
///
/// session.set_cutoff(2600);
/// assert_eq!(session.parameters().cutoff_hz, 2500);
/// assert!(session.is_running());
/// ```
pub struct SessionController {
    config: SessionConfig,
    platform: Box<dyn PlatformSession>,
    graph: Box<dyn AudioGraph>,
    make_effect: EffectFactory,
    params: ProcessingParameters,
    active: Option<ActiveGraph>,
    levels: OutputLevels,
    input_port: Option<String>,
    input_gain_adjustable: bool,
    input_gain_percent: f32,
    last_orientation: Option<DeviceOrientation>,
    errors: ErrorChannel,
    codec: Option<StateCodec>,
    events_tx: EventSender,
    events_rx: Receiver<SessionEvent>,
}

impl SessionController {
    /// Configures the platform session and reads the effect's defaults.
    ///
    /// A rejected platform configuration is published as a fatal error; the
    /// controller is still returned so the caller can show it.
    ///
    /// # Panics
    ///
    /// Panics if the effect built by `make_effect` lacks a parameter key.
    pub fn new(
        config: SessionConfig,
        mut platform: Box<dyn PlatformSession>,
        graph: Box<dyn AudioGraph>,
        make_effect: EffectFactory,
    ) -> Self {
        let mut errors = ErrorChannel::default();
        if let Err(e) = platform.configure(config.sample_rate, config.buffer_frames) {
            errors.publish(
                Severity::Fatal,
                format!("could not configure the audio session: {e}"),
            );
        }

        let probe = make_effect();
        let params = bridge::initialize_from(probe.as_ref()).coerced(config.zero_cutoff_enabled);
        tracing::info!(
            platform = platform.name(),
            graph = graph.name(),
            effect = probe.name(),
            "session created"
        );

        let levels = OutputLevels::silent(usize::from(platform.output_channel_count()));
        let (tx, rx) = crossbeam_channel::unbounded();
        let mut controller = Self {
            config,
            platform,
            graph,
            make_effect,
            params,
            active: None,
            levels,
            input_port: None,
            input_gain_adjustable: false,
            input_gain_percent: INPUT_GAIN_RANGE_PERCENT.1,
            last_orientation: None,
            errors,
            codec: None,
            events_tx: EventSender::new(tx),
            events_rx: rx,
        };
        controller.refresh_input_port();
        controller
    }

    /// Persists state through `codec`.
    pub fn with_state_codec(mut self, codec: StateCodec) -> Self {
        self.codec = Some(codec);
        self
    }

    // --- run state -------------------------------------------------------

    /// Pushes parameters into a fresh effect, attaches it and activates the
    /// graph. No-op while running.
    ///
    /// An activation failure detaches the effect, leaves the controller
    /// stopped and publishes a nonfatal error.
    pub fn start(&mut self) {
        if self.active.is_some() {
            tracing::debug!("start ignored: already running");
            return;
        }

        let effect = (self.make_effect)();
        bridge::apply(&self.params, effect.as_ref());

        let format = self.platform.graph_format(self.config.buffer_frames);
        if let Err(e) = self.graph.attach(Arc::clone(&effect), format) {
            self.graph.detach();
            self.errors.publish(
                Severity::Nonfatal,
                format!("could not connect the audio effect: {e}"),
            );
            return;
        }

        self.levels.reconcile(usize::from(format.output_channels));

        if let Err(e) = self.graph.activate() {
            self.graph.detach();
            self.levels.reset();
            self.errors
                .publish(Severity::Nonfatal, format!("could not start audio: {e}"));
            return;
        }

        tracing::info!(
            sample_rate = format.sample_rate,
            inputs = format.input_channels,
            outputs = format.output_channels,
            "session started"
        );
        let meter = LevelMeterSampler::new(Arc::clone(&effect), self.config.meter_interval);
        self.active = Some(ActiveGraph { effect, meter });
    }

    /// Deactivates the graph, detaches the effect, cancels metering and
    /// silences the levels. No-op while stopped.
    pub fn stop(&mut self) {
        let Some(active) = self.active.take() else {
            return;
        };
        self.graph.deactivate();
        self.graph.detach();
        drop(active);
        self.levels.reset();
        tracing::info!("session stopped");
    }

    /// `stop()` then `start()`. No-op while stopped.
    pub fn restart(&mut self) {
        if self.active.is_none() {
            return;
        }
        tracing::info!("session restarting");
        self.stop();
        self.start();
    }

    // --- restart-required parameters ---------------------------------------

    /// Sets the cutoff, snapping to the nearest allowed value.
    pub fn set_cutoff(&mut self, hz: u32) {
        let applied = coerce_cutoff(hz, self.config.zero_cutoff_enabled);
        if applied != hz {
            tracing::debug!(requested = hz, applied, "cutoff coerced");
        }
        self.params.cutoff_hz = applied;
        self.write_live(param_info::CUTOFF, applied as f32);
        self.restart();
    }

    /// Sets the pitch-shift divisor, clamped to 2..=4.
    pub fn set_pitch_shift(&mut self, divisor: u32) {
        let applied = coerce_pitch_shift(divisor);
        if applied != divisor {
            tracing::debug!(requested = divisor, applied, "pitch shift coerced");
        }
        self.params.pitch_shift_divisor = applied;
        self.write_live(param_info::PITCH_SHIFT, applied as f32);
        self.restart();
    }

    /// Sets the analysis window kind.
    pub fn set_window_kind(&mut self, kind: WindowKind) {
        self.params.window_kind = kind;
        self.write_live(param_info::WINDOW_TYPE, kind.as_param());
        self.restart();
    }

    /// Sets the analysis window size, clamped to 5..=50 ms.
    pub fn set_window_size(&mut self, ms: u32) {
        let applied = coerce_window_size(ms);
        if applied != ms {
            tracing::debug!(requested = ms, applied, "window size coerced");
        }
        self.params.window_size_ms = applied;
        self.write_live(param_info::WINDOW_SIZE, applied as f32);
        self.restart();
    }

    /// Enables or disables the 0 Hz cutoff choice.
    ///
    /// Disabling it while the cutoff is 0 moves the cutoff to the default
    /// through [`set_cutoff`](Self::set_cutoff).
    pub fn set_zero_cutoff_enabled(&mut self, enabled: bool) {
        self.config.zero_cutoff_enabled = enabled;
        let cutoff = self.params.cutoff_hz;
        if coerce_cutoff(cutoff, enabled) != cutoff {
            self.set_cutoff(cutoff);
        }
    }

    // --- live parameters -------------------------------------------------

    /// Sets the app-side gain and remembers it for the current port.
    pub fn set_app_gain(&mut self, db: f32) {
        let applied = coerce_app_gain(db);
        tracing::debug!(requested = db, applied, "app gain set");
        self.params.app_gain_db = applied;
        self.write_live(param_info::GAIN, applied);
        self.remember_port_gain();
    }

    /// Sets the left/right balance.
    pub fn set_balance(&mut self, db: f32) {
        let applied = coerce_balance(db);
        tracing::debug!(requested = db, applied, "balance set");
        self.params.balance_db = applied;
        self.write_live(param_info::BALANCE, applied);
    }

    /// Sets the hardware input gain and remembers it for the current port.
    ///
    /// No-op on ports without adjustable gain.
    pub fn set_input_gain_percent(&mut self, percent: f32) {
        if !self.input_gain_adjustable {
            tracing::info!(port = ?self.input_port, "input gain is fixed on this port");
            return;
        }
        let applied = coerce_input_gain(percent);
        if let Err(e) = self.platform.set_input_gain(applied / 100.0) {
            tracing::warn!(error = %e, percent = applied, "could not set input gain");
        }
        self.input_gain_percent = applied;
        self.remember_port_gain();
    }

    /// Whether the app gain control is usable: the port's gain is fixed, or
    /// its hardware gain is already at maximum.
    pub fn is_app_gain_enabled(&self) -> bool {
        !self.input_gain_adjustable || self.input_gain_percent >= INPUT_GAIN_RANGE_PERCENT.1
    }

    /// Whether the input gain control is usable: the port's gain is
    /// adjustable and no app gain is applied.
    pub fn is_input_gain_enabled(&self) -> bool {
        self.input_gain_adjustable && self.params.app_gain_db <= 0.0
    }

    // --- events ------------------------------------------------------------

    /// Reacts to one event.
    pub fn handle_event(&mut self, event: SessionEvent) {
        match event {
            SessionEvent::RouteChange {
                reason,
                silence_secondary_audio,
            } => self.handle_route_change(reason, silence_secondary_audio),
            SessionEvent::Interruption(phase) => self.handle_interruption(phase),
            SessionEvent::OrientationChange(orientation) => {
                tracing::debug!(?orientation, "orientation changed");
                self.last_orientation = Some(orientation);
                router::reapply_stereo_orientation(self.platform.as_mut(), orientation);
            }
            SessionEvent::AppBecameInactive => {
                tracing::info!("app became inactive");
                self.save_state();
            }
            SessionEvent::StateLoaded(Ok(params)) => {
                tracing::info!("saved state loaded");
                self.params = params.coerced(self.config.zero_cutoff_enabled);
                let port = self.input_port.clone();
                let loaded_gain = self.params.app_gain_db;
                // Without a stored entry for an unchanged port, the loaded
                // gain stands over the policy default.
                if !self.refresh_input_port() && self.input_port == port {
                    self.params.app_gain_db = loaded_gain;
                }
                self.restart();
            }
            SessionEvent::StateLoaded(Err(e)) => {
                self.errors
                    .publish(Severity::Nonfatal, format!("could not load settings: {e}"));
            }
            SessionEvent::StateSaved(Ok(())) => tracing::debug!("state saved"),
            SessionEvent::StateSaved(Err(e)) => {
                self.errors
                    .publish(Severity::Nonfatal, format!("could not save settings: {e}"));
            }
            SessionEvent::GraphFault(message) => {
                self.stop();
                self.errors
                    .publish(Severity::Nonfatal, format!("audio stopped: {message}"));
            }
            SessionEvent::Command(command) => self.execute(command),
        }
    }

    /// Runs one command.
    pub fn execute(&mut self, command: Command) {
        match command {
            Command::Start => self.start(),
            Command::Stop => self.stop(),
            Command::SetCutoff(hz) => self.set_cutoff(hz),
            Command::SetPitchShift(divisor) => self.set_pitch_shift(divisor),
            Command::SetWindowKind(kind) => self.set_window_kind(kind),
            Command::SetWindowSize(ms) => self.set_window_size(ms),
            Command::SetAppGain(db) => self.set_app_gain(db),
            Command::SetBalance(db) => self.set_balance(db),
            Command::SetInputGain(percent) => self.set_input_gain_percent(percent),
            Command::SetZeroCutoffEnabled(enabled) => self.set_zero_cutoff_enabled(enabled),
            Command::LoadState => self.load_state(),
            Command::SaveState => self.save_state(),
        }
    }

    /// Handles every queued event without blocking. Returns how many ran.
    pub fn dispatch_pending(&mut self) -> usize {
        let mut handled = 0;
        while let Ok(event) = self.events_rx.try_recv() {
            self.handle_event(event);
            handled += 1;
        }
        handled
    }

    /// Blocks until an event arrives, the level meter ticks, or `timeout`
    /// passes. Events are handled; a tick samples levels.
    ///
    /// Returns how many events ran.
    pub fn wait_and_dispatch(&mut self, timeout: Duration) -> usize {
        let never = crossbeam_channel::never::<Instant>();
        let ticker = self
            .active
            .as_ref()
            .map_or(&never, |active| active.meter.ticker());

        let wake = crossbeam_channel::select! {
            recv(self.events_rx) -> event => event.map_or(Wake::Idle, Wake::Event),
            recv(ticker) -> _ => Wake::Tick,
            default(timeout) => Wake::Idle,
        };

        match wake {
            Wake::Event(event) => {
                self.handle_event(event);
                1 + self.dispatch_pending()
            }
            Wake::Tick => {
                self.sample_levels();
                0
            }
            Wake::Idle => 0,
        }
    }

    /// Reads the effect's output levels. No-op while stopped.
    pub fn sample_levels(&mut self) {
        if let Some(active) = &self.active {
            active.meter.sample(&mut self.levels);
        }
    }

    // --- persistence -------------------------------------------------------

    /// Loads the saved snapshot in the background; the result arrives as
    /// [`SessionEvent::StateLoaded`].
    pub fn load_state(&mut self) {
        let Some(codec) = &self.codec else {
            tracing::debug!("no state store; load skipped");
            return;
        };
        let sender = self.events_tx.clone();
        if let Err(e) = codec.load_async(move |result| {
            sender.send(SessionEvent::StateLoaded(result));
        }) {
            self.errors
                .publish(Severity::Nonfatal, format!("could not load settings: {e}"));
        }
    }

    /// Saves the snapshot in the background; the result arrives as
    /// [`SessionEvent::StateSaved`].
    pub fn save_state(&mut self) {
        let Some(codec) = &self.codec else {
            tracing::debug!("no state store; save skipped");
            return;
        };
        let sender = self.events_tx.clone();
        if let Err(e) = codec.save_async(self.params.clone(), move |result| {
            sender.send(SessionEvent::StateSaved(result));
        }) {
            self.errors
                .publish(Severity::Nonfatal, format!("could not save settings: {e}"));
        }
    }

    /// Saves the snapshot on the calling thread, for shutdown paths.
    pub fn save_state_blocking(&self) -> Result<(), ConfigError> {
        match &self.codec {
            Some(codec) => codec.save(&self.params),
            None => Ok(()),
        }
    }

    // --- accessors ---------------------------------------------------------

    /// Current run state.
    pub fn run_state(&self) -> RunState {
        if self.active.is_some() {
            RunState::Running
        } else {
            RunState::Stopped
        }
    }

    /// Whether the graph is running.
    pub fn is_running(&self) -> bool {
        self.active.is_some()
    }

    /// The parameter snapshot.
    pub fn parameters(&self) -> &ProcessingParameters {
        &self.params
    }

    /// Latest output levels, one per output channel.
    pub fn levels(&self) -> &OutputLevels {
        &self.levels
    }

    /// Name of the current input port.
    pub fn current_input_port_name(&self) -> Option<&str> {
        self.input_port.as_deref()
    }

    /// Whether the current port's hardware gain is adjustable.
    pub fn is_input_gain_adjustable(&self) -> bool {
        self.input_gain_adjustable
    }

    /// Current hardware input gain in percent; 100 on fixed-gain ports.
    pub fn input_gain_percent(&self) -> f32 {
        self.input_gain_percent
    }

    /// Published errors.
    pub fn errors(&self) -> &ErrorChannel {
        &self.errors
    }

    /// Published errors, for acknowledging.
    pub fn errors_mut(&mut self) -> &mut ErrorChannel {
        &mut self.errors
    }

    /// A handle for posting events from other threads.
    pub fn event_sender(&self) -> EventSender {
        self.events_tx.clone()
    }

    /// Active configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// The attached effect while running.
    pub fn effect(&self) -> Option<&Arc<dyn EffectUnit>> {
        self.active.as_ref().map(|active| &active.effect)
    }

    // --- internals ---------------------------------------------------------

    fn handle_route_change(&mut self, reason: RouteChangeReason, silence_secondary_audio: bool) {
        tracing::info!(%reason, silence_secondary_audio, "route change");
        router::reconcile_channel_counts(self.platform.as_mut(), self.last_orientation);
        self.refresh_input_port();
        let outputs = usize::from(self.platform.output_channel_count());
        if self.levels.reconcile(outputs) {
            tracing::debug!(outputs, "level meter channels changed");
        }
        match router::route_action(reason, silence_secondary_audio) {
            RouteAction::Stop => self.stop(),
            RouteAction::RestartIfRunning => self.restart(),
        }
    }

    fn handle_interruption(&mut self, phase: InterruptionPhase) {
        tracing::info!(?phase, "audio interruption");
        if let Some(RouteAction::Stop) = router::interruption_action(phase) {
            self.stop();
        }
    }

    /// Re-reads the current port and applies its remembered gains. Returns
    /// whether a stored entry was recalled.
    fn refresh_input_port(&mut self) -> bool {
        let port = self.platform.current_input_port_name();
        let adjustable = self.platform.is_input_gain_adjustable();
        if port != self.input_port {
            tracing::info!(port = ?port, adjustable, "input port changed");
        }

        let (setting, recalled) = match &port {
            Some(name) => {
                let memory = GainMemory::new(&mut self.params.per_port_gains);
                let recalled = memory.get(name).is_some();
                (
                    memory.recall(name, adjustable, &self.config.gain_policy),
                    recalled,
                )
            }
            None => (self.config.gain_policy.initial(adjustable), false),
        };

        self.input_port = port;
        self.input_gain_adjustable = adjustable;
        self.input_gain_percent = match setting.input_gain_percent {
            Some(percent) if adjustable => {
                let percent = coerce_input_gain(percent);
                if let Err(e) = self.platform.set_input_gain(percent / 100.0) {
                    tracing::warn!(error = %e, percent, "could not restore input gain");
                }
                percent
            }
            _ => INPUT_GAIN_RANGE_PERCENT.1,
        };
        self.params.app_gain_db = coerce_app_gain(setting.app_gain_db);
        self.write_live(param_info::GAIN, self.params.app_gain_db);
        recalled
    }

    fn remember_port_gain(&mut self) {
        let Some(port) = &self.input_port else {
            return;
        };
        let setting = GainSetting {
            input_gain_percent: self
                .input_gain_adjustable
                .then_some(self.input_gain_percent),
            app_gain_db: self.params.app_gain_db,
        };
        GainMemory::new(&mut self.params.per_port_gains).remember(port, setting);
    }

    fn write_live(&self, key: &str, value: f32) {
        if let Some(active) = &self.active {
            bridge::write(active.effect.as_ref(), key, value);
        }
    }
}

impl std::fmt::Debug for SessionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionController")
            .field("run_state", &self.run_state())
            .field("platform", &self.platform.name())
            .field("graph", &self.graph.name())
            .field("params", &self.params)
            .field("input_port", &self.input_port)
            .field("errors", &self.errors)
            .finish_non_exhaustive()
    }
}
