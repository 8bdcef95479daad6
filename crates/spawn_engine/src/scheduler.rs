//! Spawn timing
//!
//! Spawns happen at random intervals drawn from `[spawn_interval_min,
//! spawn_interval_max)`. A speed multiplier shortens the interval in progress
//! without losing how far through it the session already is.

use crate::config::SchedulerConfig;
use crate::foundation::random::RandomSource;

/// Decides when the next platform may spawn
#[derive(Debug, Clone)]
pub struct SpawnScheduler {
    interval_min: f64,
    interval_max: f64,
    multiplier: f64,
    last_spawn: f64,
    base_interval: f64,
    interval: f64,
    deadline: f64,
}

impl SpawnScheduler {
    /// A scheduler whose first spawn is due immediately
    pub fn new(config: &SchedulerConfig) -> Self {
        Self {
            interval_min: config.spawn_interval_min,
            interval_max: config.spawn_interval_max,
            multiplier: 1.0,
            last_spawn: 0.0,
            base_interval: 0.0,
            interval: 0.0,
            deadline: 0.0,
        }
    }

    /// Whether a spawn may happen now
    pub fn ready(&self, now: f64, active: usize, capacity: usize) -> bool {
        active < capacity && now >= self.deadline
    }

    /// Start a new interval at `now`. Returns the effective interval.
    pub fn schedule_next(&mut self, now: f64, rng: &mut dyn RandomSource) -> f64 {
        self.base_interval = rng.uniform(self.interval_min, self.interval_max);
        self.interval = self.base_interval / self.multiplier;
        self.last_spawn = now;
        self.deadline = now + self.interval;
        self.interval
    }

    /// Change the speed multiplier, keeping the elapsed fraction of the
    /// current interval
    ///
    /// Non-positive or non-finite multipliers are ignored.
    pub fn set_speed_multiplier(&mut self, now: f64, multiplier: f64) {
        if !(multiplier.is_finite() && multiplier > 0.0) {
            log::warn!("Ignoring speed multiplier {multiplier}");
            return;
        }

        let elapsed_fraction = self.elapsed_fraction(now);

        self.multiplier = multiplier;
        self.interval = self.base_interval / multiplier;
        self.last_spawn = now - elapsed_fraction * self.interval;
        self.deadline = self.last_spawn + self.interval;
    }

    /// Return to normal speed; the inverse of [`Self::set_speed_multiplier`]
    pub fn reset_speed(&mut self, now: f64) {
        self.set_speed_multiplier(now, 1.0);
    }

    /// Forget all timing state. The next spawn is due immediately.
    pub fn reset(&mut self) {
        self.multiplier = 1.0;
        self.last_spawn = 0.0;
        self.base_interval = 0.0;
        self.interval = 0.0;
        self.deadline = 0.0;
    }

    /// How far through the current interval `now` is, in `[0, 1]`
    ///
    /// An empty interval counts as complete.
    pub fn elapsed_fraction(&self, now: f64) -> f64 {
        if self.interval > 0.0 {
            ((now - self.last_spawn) / self.interval).clamp(0.0, 1.0)
        } else {
            1.0
        }
    }

    /// Time the next spawn becomes due
    pub fn deadline(&self) -> f64 {
        self.deadline
    }

    /// Current speed multiplier
    pub fn multiplier(&self) -> f64 {
        self.multiplier
    }

    /// Current interval after the multiplier
    pub fn interval(&self) -> f64 {
        self.interval
    }
}
