//! Default-device watcher.
//!
//! Desktop hosts have no route-change notification, so [`DeviceWatcher`]
//! polls the device list on a background thread and synthesizes one:
//!
//! | Observation | Reason |
//! |---|---|
//! | A previously listed device disappeared | `OldDeviceUnavailable` |
//! | A new device appeared | `NewDeviceAvailable` |
//! | Same devices, different defaults | `Override` |
//!
//! The callback runs on the watcher thread; it should only post an event.

use crate::stream::{default_device, list_devices};
use songfinder_core::RouteChangeReason;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::Duration;

/// Device names and defaults at one instant.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceSnapshot {
    /// Every device name the host lists.
    pub devices: BTreeSet<String>,
    /// Default input device name.
    pub default_input: Option<String>,
    /// Default output device name.
    pub default_output: Option<String>,
}

impl DeviceSnapshot {
    /// Captures the current host state. Enumeration failures read as empty.
    pub fn capture() -> Self {
        let devices = list_devices()
            .map(|list| list.into_iter().map(|d| d.name).collect())
            .unwrap_or_default();
        let (input, output) = default_device().unwrap_or((None, None));
        Self {
            devices,
            default_input: input.map(|d| d.name),
            default_output: output.map(|d| d.name),
        }
    }

    /// Classifies the change from `self` to `next`, or `None` if nothing
    /// relevant changed.
    pub fn classify(&self, next: &DeviceSnapshot) -> Option<RouteChangeReason> {
        if self.devices.difference(&next.devices).next().is_some() {
            Some(RouteChangeReason::OldDeviceUnavailable)
        } else if next.devices.difference(&self.devices).next().is_some() {
            Some(RouteChangeReason::NewDeviceAvailable)
        } else if self.default_input != next.default_input
            || self.default_output != next.default_output
        {
            Some(RouteChangeReason::Override)
        } else {
            None
        }
    }
}

/// Background poller that reports device changes.
///
/// Stops and joins its thread on drop.
pub struct DeviceWatcher {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl DeviceWatcher {
    /// Starts polling every `interval`, calling `on_change` for each change.
    pub fn spawn<F>(interval: Duration, mut on_change: F) -> std::io::Result<Self>
    where
        F: FnMut(RouteChangeReason) + Send + 'static,
    {
        let stop = Arc::new(AtomicBool::new(false));
        let thread_stop = Arc::clone(&stop);
        let handle = std::thread::Builder::new()
            .name("songfinder-device-watcher".into())
            .spawn(move || {
                let mut last = DeviceSnapshot::capture();
                while !thread_stop.load(Ordering::Acquire) {
                    std::thread::sleep(interval);
                    let next = DeviceSnapshot::capture();
                    if let Some(reason) = last.classify(&next) {
                        tracing::debug!(%reason, "device change detected");
                        on_change(reason);
                    }
                    last = next;
                }
            })?;
        Ok(Self {
            stop,
            handle: Some(handle),
        })
    }

    /// Stops polling and waits for the thread to exit.
    pub fn stop(&mut self) {
        self.stop.store(true, Ordering::Release);
        if let Some(handle) = self.handle.take()
            && handle.join().is_err()
        {
            tracing::warn!("device watcher thread panicked");
        }
    }
}

impl Drop for DeviceWatcher {
    fn drop(&mut self) {
        self.stop();
    }
}
