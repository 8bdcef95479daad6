//! Stage progression and per-stage item quotas
//!
//! A stage ends after a fixed number of platforms, or, when a stage duration
//! is configured, after that many seconds, whichever comes first. Every
//! stage change resets the per-stage counters.

use crate::config::StageConfig;
use crate::foundation::time::Deadline;

/// Per-stage counters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageState {
    /// Stage number, starting at 1
    pub current_stage: u32,
    /// Platforms spawned since the stage began
    pub platforms_this_stage: u32,
    /// Pills spawned and not yet consumed this stage
    pub pills_spawned_this_stage: u32,
    /// Sunlight items spawned this stage
    pub sunlight_spawned_this_stage: u32,
}

impl Default for StageState {
    fn default() -> Self {
        Self {
            current_stage: 1,
            platforms_this_stage: 0,
            pills_spawned_this_stage: 0,
            sunlight_spawned_this_stage: 0,
        }
    }
}

/// Sole owner of [`StageState`]
#[derive(Debug, Clone)]
pub struct StageProgressionController {
    config: StageConfig,
    state: StageState,
    stage_timer: Deadline,
}

impl StageProgressionController {
    /// Start at stage 1
    pub fn new(config: &StageConfig) -> Self {
        Self {
            config: config.clone(),
            state: StageState::default(),
            stage_timer: Deadline::unarmed(),
        }
    }

    /// Snapshot of the counters
    pub fn state(&self) -> StageState {
        self.state
    }

    /// Current stage number
    pub fn current_stage(&self) -> u32 {
        self.state.current_stage
    }

    /// Count a spawned platform, advancing the stage once the count exceeds
    /// `platforms_per_stage`
    ///
    /// Returns the new stage number when the stage changed.
    pub fn record_platform(&mut self, now: f64) -> Option<u32> {
        self.state.platforms_this_stage += 1;
        if self.state.platforms_this_stage > self.config.platforms_per_stage {
            Some(self.advance(now))
        } else {
            None
        }
    }

    /// Advance the stage when its time runs out
    ///
    /// Does nothing unless `stage_duration` is configured. The first call after
    /// construction or restart starts the stage timer.
    pub fn tick(&mut self, now: f64) -> Option<u32> {
        let duration = self.config.stage_duration?;
        if !self.stage_timer.is_armed() {
            self.stage_timer.arm(now, duration);
            return None;
        }
        if self.stage_timer.fire(now) {
            Some(self.advance(now))
        } else {
            None
        }
    }

    fn advance(&mut self, now: f64) -> u32 {
        let stage = self.state.current_stage + 1;
        self.state = StageState {
            current_stage: stage,
            ..StageState::default()
        };
        if let Some(duration) = self.config.stage_duration {
            self.stage_timer.arm(now, duration);
        }
        log::info!("Advanced to stage {stage}");
        stage
    }

    /// Whether the pill quota allows another pill
    pub fn can_spawn_pill(&self) -> bool {
        self.state.pills_spawned_this_stage < self.config.max_pills_per_stage
    }

    /// Count a spawned pill. Returns `false` and counts nothing when the quota
    /// is exhausted.
    pub fn record_pill(&mut self) -> bool {
        if !self.can_spawn_pill() {
            return false;
        }
        self.state.pills_spawned_this_stage += 1;
        true
    }

    /// Whether the sunlight quota allows another sunlight item
    pub fn can_spawn_sunlight(&self) -> bool {
        self.state.sunlight_spawned_this_stage < self.config.max_sunlight_per_stage
    }

    /// Count a spawned sunlight item. Returns `false` when the quota is exhausted.
    pub fn record_sunlight(&mut self) -> bool {
        if !self.can_spawn_sunlight() {
            return false;
        }
        self.state.sunlight_spawned_this_stage += 1;
        true
    }

    /// A pill was consumed, freeing one pill of the quota
    pub fn notify_pill_consumed(&mut self) {
        self.state.pills_spawned_this_stage = self.state.pills_spawned_this_stage.saturating_sub(1);
    }

    /// Back to stage 1 with empty counters and no running stage timer
    pub fn restart(&mut self) {
        self.state = StageState::default();
        self.stage_timer.cancel();
    }

    /// Index of the theme for the current stage, clamped to the last theme
    pub fn theme_index(&self, theme_count: usize) -> usize {
        stage_theme(self.state.current_stage, theme_count)
    }

    /// Index of the theme for the stage the next recorded platform counts in
    ///
    /// A platform that rolls the stage over belongs to the new stage, so it
    /// takes the new stage's theme along with its quotas.
    pub fn next_platform_theme_index(&self, theme_count: usize) -> usize {
        let stage = if self.state.platforms_this_stage + 1 > self.config.platforms_per_stage {
            self.state.current_stage + 1
        } else {
            self.state.current_stage
        };
        stage_theme(stage, theme_count)
    }

    /// Seconds until the stage timer advances the stage
    pub fn stage_time_remaining(&self, now: f64) -> Option<f64> {
        self.stage_timer.remaining(now)
    }
}

fn stage_theme(stage: u32, theme_count: usize) -> usize {
    let index = usize::try_from(stage.saturating_sub(1)).unwrap_or(usize::MAX);
    index.min(theme_count.saturating_sub(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controller() -> StageProgressionController {
        StageProgressionController::new(&StageConfig::default())
    }

    #[test]
    fn test_stage_rollover() {
        let mut stage = controller();
        stage.record_pill();
        stage.record_sunlight();

        for _ in 0..10 {
            assert_eq!(stage.record_platform(0.0), None);
        }
        assert_eq!(stage.current_stage(), 1);
        assert_eq!(stage.state().pills_spawned_this_stage, 1);

        assert_eq!(stage.record_platform(0.0), Some(2));
        let state = stage.state();
        assert_eq!(state.current_stage, 2);
        assert_eq!(state.platforms_this_stage, 0);
        assert_eq!(state.pills_spawned_this_stage, 0);
        assert_eq!(state.sunlight_spawned_this_stage, 0);
    }

    #[test]
    fn test_consume_replenish() {
        let mut stage = controller();
        stage.record_pill();
        stage.record_pill();
        assert_eq!(stage.state().pills_spawned_this_stage, 2);

        stage.notify_pill_consumed();
        assert_eq!(stage.state().pills_spawned_this_stage, 1);
        assert!(stage.can_spawn_pill());
    }

    #[test]
    fn test_consume_floors_at_zero() {
        let mut stage = controller();
        stage.notify_pill_consumed();
        assert_eq!(stage.state().pills_spawned_this_stage, 0);
    }

    #[test]
    fn test_quota_monotonicity() {
        let mut stage = controller();
        for _ in 0..10 {
            stage.record_pill();
            assert!(stage.state().pills_spawned_this_stage <= 3);
        }
        assert!(!stage.can_spawn_pill());
        assert!(!stage.record_pill());

        assert!(stage.record_sunlight());
        assert!(!stage.record_sunlight());
        assert_eq!(stage.state().sunlight_spawned_this_stage, 1);
    }

    #[test]
    fn test_time_based_advance() {
        let config = StageConfig {
            stage_duration: Some(34.0),
            ..StageConfig::default()
        };
        let mut stage = StageProgressionController::new(&config);

        // First tick starts the timer
        assert_eq!(stage.tick(1.0), None);
        assert_eq!(stage.tick(34.9), None);
        assert_eq!(stage.tick(35.0), Some(2));
        assert_eq!(stage.tick(68.0), None);
        assert_eq!(stage.tick(69.0), Some(3));
    }

    #[test]
    fn test_platform_advance_rearms_timer() {
        let config = StageConfig {
            platforms_per_stage: 1,
            stage_duration: Some(10.0),
            ..StageConfig::default()
        };
        let mut stage = StageProgressionController::new(&config);
        stage.tick(0.0);
        stage.record_platform(5.0);
        assert_eq!(stage.record_platform(8.0), Some(2));
        // Timer restarted at 8.0
        assert_eq!(stage.tick(12.0), None);
        assert_eq!(stage.tick(18.0), Some(3));
    }

    #[test]
    fn test_no_duration_never_ticks() {
        let mut stage = controller();
        assert_eq!(stage.tick(1.0e6), None);
        assert_eq!(stage.stage_time_remaining(0.0), None);
    }

    #[test]
    fn test_restart() {
        let config = StageConfig {
            stage_duration: Some(5.0),
            ..StageConfig::default()
        };
        let mut stage = StageProgressionController::new(&config);
        stage.tick(0.0);
        stage.tick(5.0);
        stage.record_pill();
        stage.restart();

        assert_eq!(stage.state(), StageState::default());
        assert_eq!(stage.stage_time_remaining(5.0), None);
    }

    #[test]
    fn test_theme_index_clamps() {
        let mut stage = controller();
        assert_eq!(stage.theme_index(4), 0);
        for _ in 0..(11 * 6) {
            stage.record_platform(0.0);
        }
        assert_eq!(stage.current_stage(), 7);
        assert_eq!(stage.theme_index(4), 3);
        assert_eq!(stage.theme_index(0), 0);
    }

    #[test]
    fn test_rollover_platform_takes_new_theme() {
        let mut stage = controller();
        for _ in 0..9 {
            stage.record_platform(0.0);
        }
        // Tenth platform still belongs to stage 1
        assert_eq!(stage.next_platform_theme_index(4), 0);
        stage.record_platform(0.0);
        // Eleventh rolls over and is counted in stage 2
        assert_eq!(stage.next_platform_theme_index(4), 1);
        assert_eq!(stage.theme_index(4), 0);
        assert_eq!(stage.record_platform(0.0), Some(2));
        assert_eq!(stage.theme_index(4), 1);
        assert_eq!(stage.next_platform_theme_index(4), 1);
        assert_eq!(stage.next_platform_theme_index(1), 0);
    }
}
