//! Per-channel output level readouts.

/// Level reported for a channel that carries no signal, in dB.
pub const SILENT_FLOOR_DB: f32 = -80.0;

/// Loudest level a meter displays, in dB.
pub const LEVEL_CEILING_DB: f32 = 0.0;

/// One level in dB per output channel, clamped to
/// [`SILENT_FLOOR_DB`]..=[`LEVEL_CEILING_DB`].
///
/// Length 1 for mono output, 2 for stereo.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputLevels {
    levels: Vec<f32>,
}

impl OutputLevels {
    /// Silent levels for `channels` output channels.
    pub fn silent(channels: usize) -> Self {
        Self {
            levels: vec![SILENT_FLOOR_DB; channels],
        }
    }

    /// Number of channels.
    pub fn len(&self) -> usize {
        self.levels.len()
    }

    /// Whether there are no channels.
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    /// Level of one channel, or `None` if out of range.
    pub fn get(&self, channel: usize) -> Option<f32> {
        self.levels.get(channel).copied()
    }

    /// All levels in channel order.
    pub fn as_slice(&self) -> &[f32] {
        &self.levels
    }

    /// Stores a reading for one channel. Out-of-range channels are ignored.
    pub fn set(&mut self, channel: usize, db: f32) {
        if let Some(level) = self.levels.get_mut(channel) {
            *level = clamp_level(db);
        }
    }

    /// Resets every channel to the silent floor.
    pub fn reset(&mut self) {
        self.levels.fill(SILENT_FLOOR_DB);
    }

    /// Matches the channel count to `channels`.
    ///
    /// When the count changes, all entries are reset to the silent floor.
    /// Returns `true` if the count changed.
    pub fn reconcile(&mut self, channels: usize) -> bool {
        if self.levels.len() == channels {
            return false;
        }
        self.levels = vec![SILENT_FLOOR_DB; channels];
        true
    }

    /// Whether every channel sits at the silent floor.
    pub fn is_silent(&self) -> bool {
        self.levels.iter().all(|&l| l <= SILENT_FLOOR_DB)
    }
}

impl Default for OutputLevels {
    fn default() -> Self {
        Self::silent(2)
    }
}

/// Clamps a dB reading into the displayable range. NaN reads as silence.
#[inline]
pub fn clamp_level(db: f32) -> f32 {
    if db.is_nan() {
        SILENT_FLOOR_DB
    } else {
        db.clamp(SILENT_FLOOR_DB, LEVEL_CEILING_DB)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reconcile_grows_and_resets() {
        let mut levels = OutputLevels::silent(1);
        levels.set(0, -12.0);
        assert!(levels.reconcile(2));
        assert_eq!(levels.as_slice(), &[SILENT_FLOOR_DB, SILENT_FLOOR_DB]);
    }

    #[test]
    fn reconcile_same_count_keeps_readings() {
        let mut levels = OutputLevels::silent(2);
        levels.set(1, -6.0);
        assert!(!levels.reconcile(2));
        assert_eq!(levels.get(1), Some(-6.0));
    }

    #[test]
    fn readings_are_clamped() {
        let mut levels = OutputLevels::silent(2);
        levels.set(0, 12.0);
        levels.set(1, -300.0);
        levels.set(5, 0.0);
        assert_eq!(levels.as_slice(), &[LEVEL_CEILING_DB, SILENT_FLOOR_DB]);
    }

    #[test]
    fn reset_silences() {
        let mut levels = OutputLevels::silent(2);
        levels.set(0, -1.0);
        levels.reset();
        assert!(levels.is_silent());
    }
}
