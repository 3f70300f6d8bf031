//! Audio device listing command.

use clap::{Args, Subcommand};
use songfinder_io::{AudioDevice, PortKind, default_device, list_devices};

#[derive(Args)]
pub struct DevicesArgs {
    #[command(subcommand)]
    command: Option<DevicesCommand>,
}

#[derive(Subcommand)]
enum DevicesCommand {
    /// List all available audio devices
    List,

    /// Show default device information
    Info,
}

pub fn run(args: DevicesArgs) -> anyhow::Result<()> {
    match args.command.unwrap_or(DevicesCommand::List) {
        DevicesCommand::List => {
            let devices = list_devices()?;
            if devices.is_empty() {
                println!("No audio devices found.");
                return Ok(());
            }

            let inputs: Vec<&AudioDevice> = devices.iter().filter(|d| d.is_input).collect();
            let outputs: Vec<&AudioDevice> = devices.iter().filter(|d| d.is_output).collect();

            print_section("Microphones", &inputs, |device| {
                format!(
                    "{} ch, {}",
                    device.max_input_channels,
                    port_label(PortKind::from_device_name(&device.name))
                )
            });
            print_section("Speakers / headphones", &outputs, |_| String::new());

            println!("Select a device by index or by part of its name:");
            println!("  songfinder listen --input 0");
            println!("  songfinder listen --input \"USB\" --output 1");
        }

        DevicesCommand::Info => {
            let (input, output) = default_device()?;
            match input {
                Some(device) => println!(
                    "Default microphone: {} ({} Hz, {} ch)",
                    device.name, device.default_sample_rate, device.max_input_channels
                ),
                None => println!("Default microphone: none"),
            }
            match output {
                Some(device) => println!(
                    "Default output:     {} ({} Hz)",
                    device.name, device.default_sample_rate
                ),
                None => println!("Default output:     none"),
            }
        }
    }

    Ok(())
}

fn print_section(title: &str, devices: &[&AudioDevice], detail: impl Fn(&AudioDevice) -> String) {
    if devices.is_empty() {
        return;
    }
    println!("{title}:");
    for (idx, device) in devices.iter().enumerate() {
        let extra = detail(*device);
        let sep = if extra.is_empty() { "" } else { ", " };
        println!(
            "  {:>2}  {}  [{} Hz{}{}]",
            idx, device.name, device.default_sample_rate, sep, extra
        );
    }
    println!();
}

fn port_label(kind: PortKind) -> &'static str {
    match kind {
        PortKind::BuiltInMic => "built-in",
        PortKind::Headset => "headset",
        PortKind::Usb => "usb",
        PortKind::Bluetooth => "bluetooth",
        PortKind::Other => "other",
    }
}
