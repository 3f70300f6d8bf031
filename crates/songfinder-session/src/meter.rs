//! Level meter sampler.
//!
//! A [`LevelMeterSampler`] exists only while the graph runs: the controller
//! creates one with the attached effect on start and drops it on stop. The
//! sampler owns both its tick source and its handle to the effect, so once
//! it is gone nothing can sample a detached effect or fire a stale tick.

use crossbeam_channel::Receiver;
use songfinder_core::{EffectUnit, OutputLevels};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Periodic reader of the effect's output levels.
pub struct LevelMeterSampler {
    effect: Arc<dyn EffectUnit>,
    ticker: Receiver<Instant>,
    interval: Duration,
}

impl LevelMeterSampler {
    /// Starts a ticker firing every `interval` for `effect`.
    pub fn new(effect: Arc<dyn EffectUnit>, interval: Duration) -> Self {
        Self {
            effect,
            ticker: crossbeam_channel::tick(interval),
            interval,
        }
    }

    /// The tick source; ready once per interval.
    pub fn ticker(&self) -> &Receiver<Instant> {
        &self.ticker
    }

    /// Sampling period.
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Reads one level per channel of `levels` from the effect.
    pub fn sample(&self, levels: &mut OutputLevels) {
        // Drain ticks that piled up while the owner was busy.
        while self.ticker.try_recv().is_ok() {}
        for channel in 0..levels.len() {
            levels.set(channel, self.effect.output_level_db(channel));
        }
        tracing::trace!(levels = ?levels.as_slice(), "output levels sampled");
    }
}

impl std::fmt::Debug for LevelMeterSampler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LevelMeterSampler")
            .field("effect", &self.effect.name())
            .field("interval", &self.interval)
            .finish_non_exhaustive()
    }
}
