//! Songfinder CLI - live assistive listening from the command line.

mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "songfinder")]
#[command(author, version, about = "Songfinder assistive-listening CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a live listening session
    Listen(commands::listen::ListenArgs),

    /// List audio devices
    Devices(commands::devices::DevicesArgs),

    /// Inspect or reset the saved processing state
    State(commands::state::StateArgs),
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();
    tracing_log::LogTracer::init().ok();

    let cli = Cli::parse();

    match cli.command {
        Commands::Listen(args) => commands::listen::run(args),
        Commands::Devices(args) => commands::devices::run(args),
        Commands::State(args) => commands::state::run(args),
    }
}
