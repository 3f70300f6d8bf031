//! Remembered gain settings per input port.

use songfinder_core::GainSetting;
use std::collections::BTreeMap;

/// Gains applied to a port seen for the first time.
///
/// Hardware gain gives better audio than app-side gain, so a port with
/// adjustable gain starts with moderate hardware gain and no app gain, while
/// a fixed-gain port needs app gain from the start.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GainPolicy {
    /// Initial hardware gain, in percent, on an adjustable port.
    pub adjustable_input_gain_percent: f32,
    /// Initial app gain, in dB, on an adjustable port.
    pub adjustable_app_gain_db: f32,
    /// Initial app gain, in dB, on a fixed-gain port.
    pub fixed_app_gain_db: f32,
}

impl Default for GainPolicy {
    fn default() -> Self {
        Self {
            adjustable_input_gain_percent: 50.0,
            adjustable_app_gain_db: 0.0,
            fixed_app_gain_db: 10.0,
        }
    }
}

impl GainPolicy {
    /// Initial setting for a new port.
    pub fn initial(&self, gain_adjustable: bool) -> GainSetting {
        if gain_adjustable {
            GainSetting {
                input_gain_percent: Some(self.adjustable_input_gain_percent),
                app_gain_db: self.adjustable_app_gain_db,
            }
        } else {
            GainSetting {
                input_gain_percent: None,
                app_gain_db: self.fixed_app_gain_db,
            }
        }
    }
}

/// Mutable view of the port → gain map inside the parameter snapshot.
///
/// Entries are created the first time a port's gain is written and are never
/// evicted.
#[derive(Debug)]
pub struct GainMemory<'a> {
    entries: &'a mut BTreeMap<String, GainSetting>,
}

impl<'a> GainMemory<'a> {
    /// Wraps a port → gain map.
    pub fn new(entries: &'a mut BTreeMap<String, GainSetting>) -> Self {
        Self { entries }
    }

    /// The stored setting for `port`.
    pub fn get(&self, port: &str) -> Option<GainSetting> {
        self.entries.get(port).copied()
    }

    /// Stores `setting` for `port`.
    pub fn remember(&mut self, port: &str, setting: GainSetting) {
        match self.entries.get_mut(port) {
            Some(existing) => *existing = setting,
            None => {
                tracing::debug!(port, "first gain setting for port");
                self.entries.insert(port.to_string(), setting);
            }
        }
    }

    /// The setting to apply when `port` becomes current.
    ///
    /// A stored setting wins. When the port is adjustable but the stored
    /// setting has no hardware gain (it was saved while the port was fixed),
    /// the policy's hardware gain fills the gap.
    pub fn recall(&self, port: &str, gain_adjustable: bool, policy: &GainPolicy) -> GainSetting {
        match self.get(port) {
            Some(stored) if gain_adjustable && stored.input_gain_percent.is_none() => GainSetting {
                input_gain_percent: Some(policy.adjustable_input_gain_percent),
                ..stored
            },
            Some(stored) => stored,
            None => policy.initial(gain_adjustable),
        }
    }

    /// Number of remembered ports.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no port is remembered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_port_uses_policy() {
        let mut map = BTreeMap::new();
        let memory = GainMemory::new(&mut map);
        let policy = GainPolicy::default();

        let adjustable = memory.recall("Mic", true, &policy);
        assert_eq!(adjustable.input_gain_percent, Some(50.0));
        assert_eq!(adjustable.app_gain_db, 0.0);

        let fixed = memory.recall("Headset", false, &policy);
        assert_eq!(fixed.input_gain_percent, None);
        assert_eq!(fixed.app_gain_db, 10.0);
        assert!(memory.is_empty());
    }

    #[test]
    fn remembered_port_roundtrips() {
        let mut map = BTreeMap::new();
        let mut memory = GainMemory::new(&mut map);
        let setting = GainSetting {
            input_gain_percent: Some(42.0),
            app_gain_db: 5.0,
        };
        memory.remember("Mic", setting);
        memory.remember("Mic", setting);
        assert_eq!(memory.len(), 1);
        assert_eq!(memory.recall("Mic", true, &GainPolicy::default()), setting);
    }

    #[test]
    fn fixed_entry_on_adjustable_port_gets_hardware_gain() {
        let mut map = BTreeMap::new();
        let mut memory = GainMemory::new(&mut map);
        memory.remember(
            "USB",
            GainSetting {
                input_gain_percent: None,
                app_gain_db: 8.0,
            },
        );
        let recalled = memory.recall("USB", true, &GainPolicy::default());
        assert_eq!(recalled.input_gain_percent, Some(50.0));
        assert_eq!(recalled.app_gain_db, 8.0);
    }
}
