//! Game configuration

use serde::{Deserialize, Serialize};
use spawn_engine::config::{Config, SpawnConfig};

/// Everything a session needs: the spawn pipeline plus the simulated player
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Spawn pipeline settings
    pub spawn: SpawnConfig,
    /// Session and player settings
    pub session: SessionConfig,
}

impl Config for GameConfig {}

/// Session and simulated player settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Simulation ticks per second
    pub tick_rate: f64,
    /// Simulated seconds to run
    pub duration: f64,
    /// Fixed X position of the player
    pub player_x: f32,
    /// Items within this distance of the player are in reach
    pub pickup_radius: f32,
    /// Chance the player grabs an item in reach
    pub collect_chance: f64,
    /// Score per water item
    pub water_score: u64,
    /// Score for the first landing on a platform
    pub step_score: u64,
    /// Health at the start of a run
    pub starting_health: f32,
    /// Health lost per second
    pub health_drain: f32,
    /// Max health and health gained per sunlight item
    pub sunlight_life_boost: f32,
    /// Speed multiplier while a pill is active
    pub pill_speed_multiplier: f64,
    /// Seconds a pill lasts
    pub pill_duration: f64,
    /// Start a new run when health runs out instead of ending the session
    pub restart_on_game_over: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            tick_rate: 60.0,
            duration: 180.0,
            player_x: -6.0,
            pickup_radius: 0.5,
            collect_chance: 0.7,
            water_score: 100,
            step_score: 10,
            starting_health: 100.0,
            health_drain: 4.0,
            sunlight_life_boost: 100.0,
            pill_speed_multiplier: 2.0,
            pill_duration: 5.0,
            restart_on_game_over: true,
        }
    }
}
