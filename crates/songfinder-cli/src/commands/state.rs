//! Saved state inspection command.

use clap::{Args, Subcommand};
use songfinder_config::{BlobStore, FileBlobStore, StateCodec, state_dir};
use std::sync::Arc;

#[derive(Args)]
pub struct StateArgs {
    #[command(subcommand)]
    command: Option<StateCommand>,
}

#[derive(Subcommand)]
enum StateCommand {
    /// Print the saved parameters
    Show,

    /// Print where the state is stored
    Path,

    /// Delete the saved state
    Reset,
}

pub fn run(args: StateArgs) -> anyhow::Result<()> {
    let store = Arc::new(FileBlobStore::new(state_dir()));
    let codec = StateCodec::new(store.clone());

    match args.command.unwrap_or(StateCommand::Show) {
        StateCommand::Show => {
            let saved = store.read(codec.key())?.is_some();
            let params = codec.load()?;
            if !saved {
                println!("No saved state; defaults would be used.\n");
            }
            let text = String::from_utf8(StateCodec::encode(&params)?)?;
            print!("{}", text);
        }

        StateCommand::Path => match store.location(codec.key()) {
            Some(path) => println!("{}", path.display()),
            None => println!("{}", store.dir().display()),
        },

        StateCommand::Reset => {
            if codec.reset()? {
                println!("Saved state removed.");
            } else {
                println!("No saved state.");
            }
        }
    }

    Ok(())
}
