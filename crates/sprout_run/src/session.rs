//! Headless play session
//!
//! A simulated player stands at a fixed X while platforms scroll past. It
//! lands on whatever platform passes under it and gets one chance to grab
//! each item that comes within reach. Water scores, sunlight extends max
//! health, pills trigger a speed boost. Health drains over time and a run
//! ends when it hits zero.

use crate::config::{GameConfig, SessionConfig};
use spawn_engine::prelude::*;
use std::collections::HashSet;
use thiserror::Error;

/// Session errors
#[derive(Error, Debug)]
pub enum SessionError {
    /// The spawn director rejected its configuration
    #[error("Failed to build spawn director: {0}")]
    Director(#[from] SpawnError),

    /// The session settings cannot drive a simulation
    #[error("Invalid session settings: {0}")]
    InvalidSettings(String),
}

/// Result type for session operations
pub type SessionResult<T> = Result<T, SessionError>;

/// Outcome of a finished session
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunSummary {
    /// Simulated seconds
    pub elapsed: f64,
    /// Runs started, including the first
    pub runs: u32,
    /// Best score across runs
    pub best_score: u64,
    /// Score of the run in progress when the session ended
    pub final_score: u64,
    /// Highest stage reached in any run
    pub best_stage: u32,
    /// Pipeline totals across all runs
    pub stats: DirectorStats,
}

/// The simulated player's state for one run
#[derive(Debug, Clone, Copy, PartialEq)]
struct Player {
    score: u64,
    health: f32,
    max_health: f32,
}

impl Player {
    fn new(settings: &SessionConfig) -> Self {
        Self {
            score: 0,
            health: settings.starting_health,
            max_health: settings.starting_health,
        }
    }
}

/// A running game
pub struct Session {
    settings: SessionConfig,
    director: SpawnDirector,
    clock: ManualClock,
    rng: StdRandom,
    judged: HashSet<PoolHandle>,
    player: Player,
    runs: u32,
    best_score: u64,
    best_stage: u32,
    game_over: bool,
}

impl Session {
    /// Build a session and its spawn director
    pub fn new(config: GameConfig) -> SessionResult<Self> {
        let settings = config.session;
        if !(settings.tick_rate.is_finite() && settings.tick_rate > 0.0) {
            return Err(SessionError::InvalidSettings(format!(
                "tick_rate must be positive, got {}",
                settings.tick_rate
            )));
        }
        if !(0.0..=1.0).contains(&settings.collect_chance) {
            return Err(SessionError::InvalidSettings(format!(
                "collect_chance must be in [0, 1], got {}",
                settings.collect_chance
            )));
        }
        if settings.starting_health <= 0.0 {
            return Err(SessionError::InvalidSettings(
                "starting_health must be positive".to_string(),
            ));
        }

        let (spawn_rng, player_rng) = match config.spawn.seed {
            Some(seed) => (StdRandom::seeded(seed), StdRandom::seeded(seed.wrapping_add(1))),
            None => (StdRandom::from_entropy(), StdRandom::from_entropy()),
        };
        let director = SpawnDirector::new(
            config.spawn,
            Box::new(spawn_rng),
            Box::new(NoColliders),
            Box::new(LogSink),
        )?;

        Ok(Self {
            player: Player::new(&settings),
            settings,
            director,
            clock: ManualClock::new(),
            rng: player_rng,
            judged: HashSet::new(),
            runs: 1,
            best_score: 0,
            best_stage: 1,
            game_over: false,
        })
    }

    /// Advance one fixed tick
    pub fn step(&mut self) -> TickReport {
        self.clock.advance(1.0 / self.settings.tick_rate);
        let report = self.director.tick(&self.clock);
        if report.boost_expired {
            log::debug!("Pill wore off at {:.2}s", report.now);
        }

        self.land();
        self.reach_items();
        self.drain_health(report.dt);

        self.best_stage = self.best_stage.max(self.director.stage().current_stage);
        self.best_score = self.best_score.max(self.player.score);
        report
    }

    /// Run until the configured duration elapses or the game ends
    pub fn run(&mut self) -> RunSummary {
        let ticks = (self.settings.duration * self.settings.tick_rate).ceil();
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let ticks = ticks.max(0.0) as u64;

        for _ in 0..ticks {
            self.step();
            if self.game_over {
                if self.settings.restart_on_game_over {
                    self.restart();
                } else {
                    break;
                }
            }
        }
        self.summary()
    }

    fn land(&mut self) {
        let player_x = self.settings.player_x;
        let under: Vec<PoolHandle> = self
            .director
            .active_platforms()
            .iter()
            .copied()
            .filter(|&handle| {
                match (self.director.platform(handle), self.director.platform_position(handle)) {
                    (Some(platform), Some(position)) => {
                        (position.x - player_x).abs() <= platform.half_extents().x
                    }
                    _ => false,
                }
            })
            .collect();

        for handle in under {
            if self.director.mark_stepped(handle) {
                self.player.score += self.settings.step_score;
            }
        }
    }

    fn reach_items(&mut self) {
        let player_x = self.settings.player_x;
        let reach = self.settings.pickup_radius;
        let in_reach: Vec<PoolHandle> = self
            .director
            .active_platforms()
            .iter()
            .filter_map(|&platform| self.director.platform(platform))
            .flat_map(|platform| platform.items().iter().copied())
            .filter(|item| !self.judged.contains(item))
            .filter(|&item| {
                self.director
                    .item_world_position(item)
                    .is_some_and(|position| (position.x - player_x).abs() <= reach)
            })
            .collect();

        for item in in_reach {
            self.judged.insert(item);
            if !self.rng.chance(self.settings.collect_chance) {
                continue;
            }
            if let Some(kind) = self.director.collect_item(item) {
                self.consume(kind);
            }
        }

        // Handles of recycled items can come back with a new generation, so
        // only the live ones are worth remembering.
        let director = &self.director;
        self.judged.retain(|&item| director.item(item).is_some());
    }

    fn consume(&mut self, kind: ItemKind) {
        match kind {
            ItemKind::Water => self.player.score += self.settings.water_score,
            ItemKind::Sunlight => {
                self.player.max_health += self.settings.sunlight_life_boost;
                self.player.health = (self.player.health + self.settings.sunlight_life_boost)
                    .min(self.player.max_health);
            }
            ItemKind::Pill => self.director.apply_speed_boost(
                self.clock.now(),
                self.settings.pill_speed_multiplier,
                self.settings.pill_duration,
            ),
        }
        log::trace!("Picked up {kind}, score {}", self.player.score);
    }

    fn drain_health(&mut self, dt: f64) {
        #[allow(clippy::cast_possible_truncation)]
        let drain = self.settings.health_drain * dt as f32;
        self.player.health = (self.player.health - drain).max(0.0);
        if self.player.health <= 0.0 && !self.game_over {
            self.game_over = true;
            log::info!(
                "Run {} over at {:.1}s: score {}, stage {}",
                self.runs,
                self.clock.now(),
                self.player.score,
                self.director.stage().current_stage
            );
        }
    }

    /// Start a fresh run, keeping session bests and pipeline totals
    pub fn restart(&mut self) {
        self.director.restart();
        self.judged.clear();
        self.player = Player::new(&self.settings);
        self.game_over = false;
        self.runs += 1;
    }

    /// Summary of the session so far
    pub fn summary(&self) -> RunSummary {
        RunSummary {
            elapsed: self.clock.now(),
            runs: self.runs,
            best_score: self.best_score,
            final_score: self.player.score,
            best_stage: self.best_stage,
            stats: self.director.stats(),
        }
    }

    /// Score of the current run
    pub fn score(&self) -> u64 {
        self.player.score
    }

    /// Health of the current run
    pub fn health(&self) -> f32 {
        self.player.health
    }

    /// Max health of the current run
    pub fn max_health(&self) -> f32 {
        self.player.max_health
    }

    /// Whether the current run has ended
    pub fn is_game_over(&self) -> bool {
        self.game_over
    }

    /// The spawn director, for inspection
    pub fn director(&self) -> &SpawnDirector {
        &self.director
    }
}
