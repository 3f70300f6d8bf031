//! cpal device enumeration and lookup.

use crate::backend::{InputPort, PortKind};
use crate::{Error, Result};
use cpal::traits::{DeviceTrait, HostTrait};
use cpal::{Device, Host};

/// Extract device name via `description()` (cpal 0.17+).
pub(crate) fn device_name(device: &Device) -> std::result::Result<String, cpal::DeviceNameError> {
    device.description().map(|d| d.name().to_string())
}

/// Audio device information.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioDevice {
    /// Human-readable device name.
    pub name: String,
    /// Whether the device supports audio input.
    pub is_input: bool,
    /// Whether the device supports audio output.
    pub is_output: bool,
    /// Default sample rate in Hz.
    pub default_sample_rate: u32,
    /// Most input channels the device supports (0 for output-only devices).
    pub max_input_channels: u16,
}

/// List all available audio devices.
pub fn list_devices() -> Result<Vec<AudioDevice>> {
    let host = cpal::default_host();
    let mut devices = Vec::new();

    if let Ok(inputs) = host.input_devices() {
        for device in inputs {
            if let Ok(name) = device_name(&device) {
                devices.push(AudioDevice {
                    name,
                    is_input: true,
                    is_output: device.default_output_config().is_ok(),
                    default_sample_rate: device
                        .default_input_config()
                        .map(|c| c.sample_rate())
                        .unwrap_or(48000),
                    max_input_channels: max_input_channels(&device),
                });
            }
        }
    }

    if let Ok(outputs) = host.output_devices() {
        for device in outputs {
            if let Ok(name) = device_name(&device) {
                if devices.iter().any(|d| d.name == name) {
                    continue;
                }
                devices.push(AudioDevice {
                    name,
                    is_input: false,
                    is_output: true,
                    default_sample_rate: device
                        .default_output_config()
                        .map(|c| c.sample_rate())
                        .unwrap_or(48000),
                    max_input_channels: 0,
                });
            }
        }
    }

    Ok(devices)
}

/// Get the default input and output device info.
pub fn default_device() -> Result<(Option<AudioDevice>, Option<AudioDevice>)> {
    let host = cpal::default_host();

    let input = host.default_input_device().and_then(|d| {
        device_name(&d).ok().map(|name| AudioDevice {
            name,
            is_input: true,
            is_output: false,
            default_sample_rate: d
                .default_input_config()
                .map(|c| c.sample_rate())
                .unwrap_or(48000),
            max_input_channels: max_input_channels(&d),
        })
    });

    let output = host.default_output_device().and_then(|d| {
        device_name(&d).ok().map(|name| AudioDevice {
            name,
            is_input: false,
            is_output: true,
            default_sample_rate: d
                .default_output_config()
                .map(|c| c.sample_rate())
                .unwrap_or(48000),
            max_input_channels: 0,
        })
    });

    Ok((input, output))
}

/// Most channels any supported input configuration of `device` offers.
pub(crate) fn max_input_channels(device: &Device) -> u16 {
    device
        .supported_input_configs()
        .map(|configs| configs.map(|c| c.channels()).max().unwrap_or(0))
        .unwrap_or(0)
}

/// Channel count of the device's default output configuration.
pub(crate) fn default_output_channels(device: &Device) -> u16 {
    device
        .default_output_config()
        .map(|c| c.channels())
        .unwrap_or(2)
}

/// Describes a cpal input device as an [`InputPort`].
pub(crate) fn input_port(device: &Device) -> Option<InputPort> {
    let name = device_name(device).ok()?;
    let kind = PortKind::from_device_name(&name);
    Some(InputPort::new(name, kind, max_input_channels(device).max(1)))
}

/// Resolves an input device by name or index, or the default when `None`.
pub(crate) fn resolve_input_device(host: &Host, name_or_index: Option<&str>) -> Result<Device> {
    match name_or_index {
        Some(search) => {
            let devices: Vec<_> = host
                .input_devices()
                .map_err(|e| Error::Stream(e.to_string()))?
                .collect();
            find_device_from_list(&devices, search, "input")
        }
        None => host.default_input_device().ok_or(Error::NoDevice),
    }
}

/// Resolves an output device by name or index, or the default when `None`.
pub(crate) fn resolve_output_device(host: &Host, name_or_index: Option<&str>) -> Result<Device> {
    match name_or_index {
        Some(search) => {
            let devices: Vec<_> = host
                .output_devices()
                .map_err(|e| Error::Stream(e.to_string()))?
                .collect();
            find_device_from_list(&devices, search, "output")
        }
        None => host.default_output_device().ok_or(Error::NoDevice),
    }
}

/// Find a device from a list by index, exact name, or case-insensitive
/// partial match. The first partial match wins.
fn find_device_from_list(devices: &[Device], name_or_index: &str, kind: &str) -> Result<Device> {
    if let Ok(index) = name_or_index.parse::<usize>() {
        return devices.get(index).cloned().ok_or_else(|| {
            Error::DeviceNotFound(format!(
                "{} device index {} (only {} devices available)",
                kind,
                index,
                devices.len()
            ))
        });
    }

    if let Some(device) = devices
        .iter()
        .find(|d| device_name(d).is_ok_and(|n| n == name_or_index))
    {
        return Ok(device.clone());
    }

    let search_lower = name_or_index.to_lowercase();
    let matches: Vec<_> = devices
        .iter()
        .filter_map(|d| {
            device_name(d)
                .ok()
                .filter(|name| name.to_lowercase().contains(&search_lower))
                .map(|name| (d, name))
        })
        .collect();

    match matches.as_slice() {
        [] => Err(Error::DeviceNotFound(format!(
            "no {} device matching '{}'",
            kind, name_or_index
        ))),
        [(device, _)] => Ok((*device).clone()),
        [(device, first), ..] => {
            let names: Vec<_> = matches.iter().map(|(_, n)| n.as_str()).collect();
            tracing::warn!(
                search = name_or_index,
                kind,
                candidates = ?names,
                chosen = %first,
                "ambiguous device name, using first match"
            );
            Ok((*device).clone())
        }
    }
}
