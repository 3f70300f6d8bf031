//! Live listening session command.

use clap::Args;
use crossbeam_channel::{Receiver, Sender};
use songfinder_config::{FileBlobStore, Settings, StateCodec, state_dir};
use songfinder_core::{EffectUnit, GainBalanceUnit, WindowKind};
use songfinder_io::{CpalSession, DeviceWatcher};
use songfinder_session::{
    Command, EventSender, SessionConfig, SessionController, SessionEvent,
};
use std::io::BufRead;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

/// How often the device watcher polls for changes.
const WATCH_INTERVAL: Duration = Duration::from_millis(500);

/// Upper bound on one owning-loop wait, so Ctrl+C is noticed promptly.
const LOOP_TIMEOUT: Duration = Duration::from_millis(100);

#[derive(Args)]
pub struct ListenArgs {
    /// Input device name or index (see `songfinder devices`)
    #[arg(long)]
    input: Option<String>,

    /// Output device name or index
    #[arg(long)]
    output: Option<String>,

    /// Offer a 0 Hz cutoff (no high-pass filtering)
    #[arg(long)]
    zero_cutoff: bool,

    /// Settings file (defaults to the user config directory)
    #[arg(long)]
    settings: Option<PathBuf>,
}

/// One line typed at the prompt.
#[derive(Debug, Clone, PartialEq)]
enum PromptLine {
    /// Forwarded to the controller's event queue.
    Session(Command),
    /// Answered by the owning loop.
    Local(Request),
}

/// Requests the owning loop answers itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Request {
    Status,
    Help,
    Quit,
}

pub fn run(args: ListenArgs) -> anyhow::Result<()> {
    let mut settings = match &args.settings {
        Some(path) => Settings::load(path)?,
        None => Settings::load_default()?,
    };
    if args.input.is_some() {
        settings.input_device = args.input;
    }
    if args.output.is_some() {
        settings.output_device = args.output;
    }
    settings.zero_cutoff_enabled |= args.zero_cutoff;

    let platform = CpalSession::new(
        settings.input_device.clone(),
        settings.output_device.clone(),
    );

    // The graph needs its fault callback before the controller (and so the
    // event queue) exists.
    let fault_target: Arc<OnceLock<EventSender>> = Arc::default();
    let slot = Arc::clone(&fault_target);
    let graph = platform.graph(Arc::new(move |message: &str| {
        if let Some(sender) = slot.get() {
            sender.send(SessionEvent::GraphFault(message.to_string()));
        }
    }));

    let codec = StateCodec::new(Arc::new(FileBlobStore::new(state_dir())));
    let mut controller = SessionController::new(
        SessionConfig::from(&settings),
        Box::new(platform),
        Box::new(graph),
        Box::new(|| Arc::new(GainBalanceUnit::new()) as Arc<dyn EffectUnit>),
    )
    .with_state_codec(codec);

    if let Some(message) = controller.errors_mut().acknowledge_fatal() {
        anyhow::bail!("{message}");
    }

    let sender = controller.event_sender();
    let _ = fault_target.set(sender.clone());

    let watcher_sender = sender.clone();
    let _watcher = DeviceWatcher::spawn(WATCH_INTERVAL, move |reason| {
        watcher_sender.route_change(reason, false);
    })?;

    let running = Arc::new(AtomicBool::new(true));
    let r = Arc::clone(&running);
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })?;

    let (request_tx, request_rx) = crossbeam_channel::unbounded();
    spawn_prompt(sender, request_tx)?;

    controller.load_state();
    controller.start();

    println!("Listening.");
    println!("  Input:  {}", controller.current_input_port_name().unwrap_or("none"));
    println!("  Sample rate: {} Hz", settings.sample_rate);
    println!("  Buffer size: {} frames", settings.buffer_frames);
    println!("\nType 'help' for commands, 'quit' or Ctrl+C to stop.\n");

    while running.load(Ordering::SeqCst) {
        controller.wait_and_dispatch(LOOP_TIMEOUT);

        if let Some(message) = controller.errors_mut().acknowledge_nonfatal() {
            eprintln!("warning: {message}");
        }
        if let Some(message) = controller.errors_mut().acknowledge_fatal() {
            controller.stop();
            anyhow::bail!("{message}");
        }

        if !handle_requests(&controller, &request_rx) {
            break;
        }
    }

    println!("Stopping...");
    controller.stop();
    // Leaving the session is the inactive transition; save synchronously so
    // the process does not exit before the write lands.
    controller.save_state_blocking()?;
    tracing::info!("state saved");
    Ok(())
}

/// Answers prompt-local requests. Returns `false` on quit.
fn handle_requests(controller: &SessionController, requests: &Receiver<Request>) -> bool {
    while let Ok(request) = requests.try_recv() {
        match request {
            Request::Status => print_status(controller),
            Request::Help => print_help(),
            Request::Quit => return false,
        }
    }
    true
}

/// Reads stdin lines on a helper thread. Session commands go straight to the
/// controller's queue; everything else to the owning loop.
fn spawn_prompt(sender: EventSender, requests: Sender<Request>) -> std::io::Result<()> {
    std::thread::Builder::new()
        .name("songfinder-prompt".into())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                if line.trim().is_empty() {
                    continue;
                }
                match parse_line(&line) {
                    Ok(PromptLine::Session(command)) => {
                        if !sender.command(command) {
                            break;
                        }
                    }
                    Ok(PromptLine::Local(request)) => {
                        let quit = request == Request::Quit;
                        if requests.send(request).is_err() || quit {
                            break;
                        }
                    }
                    Err(message) => eprintln!("{message}"),
                }
            }
        })?;
    Ok(())
}

fn parse_line(line: &str) -> Result<PromptLine, String> {
    let mut words = line.split_whitespace();
    let verb = words.next().unwrap_or_default().to_ascii_lowercase();
    let arg = words.next();

    let command = match verb.as_str() {
        "status" => return Ok(PromptLine::Local(Request::Status)),
        "help" | "?" => return Ok(PromptLine::Local(Request::Help)),
        "quit" | "exit" => return Ok(PromptLine::Local(Request::Quit)),
        "start" => Command::Start,
        "stop" => Command::Stop,
        "save" => Command::SaveState,
        "load" => Command::LoadState,
        "cutoff" => Command::SetCutoff(number(&verb, arg)?),
        "pitch" => Command::SetPitchShift(number(&verb, arg)?),
        "window" => {
            let kind = arg.ok_or("usage: window hann|songfinder")?;
            Command::SetWindowKind(kind.parse::<WindowKind>()?)
        }
        "window-size" => Command::SetWindowSize(number(&verb, arg)?),
        "gain" => Command::SetAppGain(number(&verb, arg)?),
        "balance" => Command::SetBalance(number(&verb, arg)?),
        "input-gain" => Command::SetInputGain(number(&verb, arg)?),
        "zero-cutoff" => match arg {
            Some("on") => Command::SetZeroCutoffEnabled(true),
            Some("off") => Command::SetZeroCutoffEnabled(false),
            _ => return Err("usage: zero-cutoff on|off".into()),
        },
        other => return Err(format!("unknown command '{other}'; type 'help'")),
    };
    Ok(PromptLine::Session(command))
}

fn number<T: std::str::FromStr>(verb: &str, arg: Option<&str>) -> Result<T, String> {
    let arg = arg.ok_or_else(|| format!("usage: {verb} <value>"))?;
    arg.parse()
        .map_err(|_| format!("{verb}: '{arg}' is not a valid number"))
}

fn print_status(controller: &SessionController) {
    let params = controller.parameters();
    println!("state:       {:?}", controller.run_state());
    println!(
        "input:       {} (gain {})",
        controller.current_input_port_name().unwrap_or("none"),
        if controller.is_input_gain_adjustable() {
            format!("{:.0}%", controller.input_gain_percent())
        } else {
            "fixed".to_string()
        }
    );
    println!("cutoff:      {} Hz", params.cutoff_hz);
    println!("pitch:       1/{}", params.pitch_shift_divisor);
    println!(
        "window:      {} {} ms",
        params.window_kind, params.window_size_ms
    );
    println!("gain:        {:.1} dB", params.app_gain_db);
    println!("balance:     {:.1} dB", params.balance_db);
    let levels: Vec<String> = controller
        .levels()
        .as_slice()
        .iter()
        .map(|db| format!("{db:.1}"))
        .collect();
    println!("levels:      [{}] dB", levels.join(", "));
}

fn print_help() {
    println!("Commands:");
    println!("  start | stop");
    println!("  cutoff <hz>          2000, 2500, 3000, 4000 (0 with zero-cutoff on)");
    println!("  pitch <2-4>          pitch shift divisor");
    println!("  window hann|songfinder");
    println!("  window-size <5-50>   analysis window in ms");
    println!("  gain <0-20>          app gain in dB");
    println!("  balance <-10-10>     left/right balance in dB");
    println!("  input-gain <0-100>   hardware input gain in percent");
    println!("  zero-cutoff on|off");
    println!("  save | load | status | quit");
}
