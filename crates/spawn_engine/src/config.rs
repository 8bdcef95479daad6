//! Configuration system
//!
//! Every tunable of the spawn pipeline lives in [`SpawnConfig`]. Files are
//! read and written as TOML or RON depending on the extension.

pub use serde::{Deserialize, Serialize};

/// Configuration trait
pub trait Config: Serialize + for<'de> Deserialize<'de> + Default {
    /// Load configuration from file
    fn load_from_file(path: &str) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;

        if path.ends_with(".toml") {
            toml::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else if path.ends_with(".ron") {
            ron::from_str(&contents).map_err(|e| ConfigError::Parse(e.to_string()))
        } else {
            Err(ConfigError::UnsupportedFormat(path.to_string()))
        }
    }

    /// Save configuration to file
    fn save_to_file(&self, path: &str) -> Result<(), ConfigError> {
        let contents = if path.ends_with(".toml") {
            toml::to_string_pretty(self).map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else if path.ends_with(".ron") {
            ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
                .map_err(|e| ConfigError::Serialize(e.to_string()))?
        } else {
            return Err(ConfigError::UnsupportedFormat(path.to_string()));
        };

        std::fs::write(path, contents)?;
        Ok(())
    }
}

/// Configuration errors
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Parse error
    #[error("Parse error: {0}")]
    Parse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialize(String),

    /// Unsupported format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Values that parse but cannot drive a session
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Pool sizing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Platforms pre-built per template
    pub platform_pool_size: usize,
    /// Water items pre-built
    pub water_pool_size: usize,
    /// Pill items pre-built
    pub pill_pool_size: usize,
    /// Sunlight items pre-built
    pub sunlight_pool_size: usize,
    /// Entries added whenever a pool runs dry
    pub grow_by: usize,
    /// Where pooled entities are parked
    pub pool_position: [f32; 2],
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            platform_pool_size: 8,
            water_pool_size: 15,
            pill_pool_size: 5,
            sunlight_pool_size: 3,
            grow_by: 2,
            pool_position: [0.0, 25.0],
        }
    }
}

/// Spawn timing and the active window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Upper bound on simultaneously active platforms
    pub max_active_platforms: usize,
    /// Shortest gap between spawns, in seconds
    pub spawn_interval_min: f64,
    /// Longest gap between spawns, in seconds
    pub spawn_interval_max: f64,
    /// X coordinate new platforms appear at
    pub spawn_x: f32,
    /// Lowest spawn height
    pub spawn_y_min: f32,
    /// Highest spawn height
    pub spawn_y_max: f32,
    /// Platforms whose trailing edge passes this X are recycled
    pub despawn_x: f32,
    /// Leftward scroll speed in units per second
    pub scroll_speed: f32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_active_platforms: 4,
            spawn_interval_min: 1.25,
            spawn_interval_max: 2.5,
            spawn_x: 20.0,
            spawn_y_min: -3.5,
            spawn_y_max: 1.5,
            despawn_x: -15.0,
            scroll_speed: 6.0,
        }
    }
}

/// Item layout on a platform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementConfig {
    /// Platform width per item slot
    pub slot_spacing: f32,
    /// Fewest slots in a line layout
    pub min_items: usize,
    /// Most slots in a line layout
    pub max_items: usize,
    /// Fraction of the width excluded on each side of a line layout
    pub margin_fraction: f32,
    /// Height of items above the platform's top surface
    pub item_height_offset: f32,
    /// Narrower platforms get no items
    pub min_platform_width: f32,
    /// Candidates sampled along a curve layout
    pub curve_samples: usize,
    /// Arc spans `[-half_angle, +half_angle]` degrees
    pub curve_half_angle_deg: f32,
    /// Arc radius as a fraction of the platform width
    pub curve_radius_factor: f32,
    /// Vertical squash of the arc
    pub curve_vertical_factor: f32,
    /// Constant subtracted from every arc height
    pub curve_drop: f32,
    /// Clearance kept around each curve candidate
    pub clearance_radius: f32,
    /// Per-platform chance of a pill
    pub pill_chance: f64,
    /// Per-platform chance of a sunlight while the stage quota allows one
    pub sunlight_chance: f64,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            slot_spacing: 1.5,
            min_items: 3,
            max_items: 5,
            margin_fraction: 0.15,
            item_height_offset: 1.0,
            min_platform_width: 2.0,
            curve_samples: 8,
            curve_half_angle_deg: 75.0,
            curve_radius_factor: 0.45,
            curve_vertical_factor: 0.7,
            curve_drop: 1.0,
            clearance_radius: 0.8,
            pill_chance: 0.1,
            sunlight_chance: 0.2,
        }
    }
}

/// Stage progression and quotas
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StageConfig {
    /// Platforms per stage before the next one starts
    pub platforms_per_stage: u32,
    /// Pills allowed per stage
    pub max_pills_per_stage: u32,
    /// Sunlight items allowed per stage
    pub max_sunlight_per_stage: u32,
    /// Also advance the stage after this many seconds
    pub stage_duration: Option<f64>,
    /// Each obstacle is enabled with probability `1 / denominator`
    pub obstacle_chance_denominator: u32,
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            platforms_per_stage: 10,
            max_pills_per_stage: 3,
            max_sunlight_per_stage: 1,
            stage_duration: None,
            obstacle_chance_denominator: 3,
        }
    }
}

/// Obstacle slot on a platform template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObstacleTemplate {
    /// Offset from the platform centre
    pub offset: [f32; 2],
    /// Collision radius
    pub radius: f32,
}

/// Shape of one platform variant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformTemplate {
    /// Variant name, used in logs and pool names
    pub name: String,
    /// Full width
    pub width: f32,
    /// Full height
    pub height: f32,
    /// Obstacle slots
    #[serde(default)]
    pub obstacles: Vec<ObstacleTemplate>,
}

/// Platform variants available during one stage
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StageTheme {
    /// Variants, picked uniformly per spawn
    pub platforms: Vec<PlatformTemplate>,
}

/// Complete spawn pipeline configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnConfig {
    /// Seed for the session RNG; entropy when absent
    pub seed: Option<u64>,
    /// Pool sizing
    pub pools: PoolConfig,
    /// Spawn timing
    pub scheduler: SchedulerConfig,
    /// Item layout
    pub placement: PlacementConfig,
    /// Stage progression
    pub stage: StageConfig,
    /// One theme per stage; later stages reuse the last theme
    pub themes: Vec<StageTheme>,
}

impl Default for SpawnConfig {
    fn default() -> Self {
        Self {
            seed: None,
            pools: PoolConfig::default(),
            scheduler: SchedulerConfig::default(),
            placement: PlacementConfig::default(),
            stage: StageConfig::default(),
            themes: default_themes(),
        }
    }
}

impl Config for SpawnConfig {}

impl SpawnConfig {
    /// Reject values the pipeline cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |reason: &str| Err(ConfigError::Invalid(reason.to_string()));

        let pools = &self.pools;
        if pools.platform_pool_size == 0
            || pools.water_pool_size == 0
            || pools.pill_pool_size == 0
            || pools.sunlight_pool_size == 0
        {
            return invalid("pool sizes must be non-zero");
        }
        if pools.grow_by == 0 {
            return invalid("grow_by must be non-zero");
        }

        let scheduler = &self.scheduler;
        if scheduler.max_active_platforms == 0 {
            return invalid("max_active_platforms must be non-zero");
        }
        if !(scheduler.spawn_interval_min > 0.0
            && scheduler.spawn_interval_min <= scheduler.spawn_interval_max)
        {
            return invalid("spawn interval must satisfy 0 < min <= max");
        }
        if scheduler.spawn_y_min > scheduler.spawn_y_max {
            return invalid("spawn_y_min exceeds spawn_y_max");
        }
        if scheduler.despawn_x >= scheduler.spawn_x {
            return invalid("despawn_x must lie left of spawn_x");
        }
        if !(scheduler.scroll_speed >= 0.0) {
            return invalid("scroll_speed must not be negative");
        }

        let placement = &self.placement;
        if !(placement.slot_spacing > 0.0) {
            return invalid("slot_spacing must be positive");
        }
        if placement.min_items == 0 || placement.min_items > placement.max_items {
            return invalid("item count must satisfy 0 < min_items <= max_items");
        }
        if !(0.0..0.5).contains(&placement.margin_fraction) {
            return invalid("margin_fraction must lie in [0, 0.5)");
        }
        if placement.curve_samples == 0 {
            return invalid("curve_samples must be non-zero");
        }
        if !(0.0..=1.0).contains(&placement.pill_chance)
            || !(0.0..=1.0).contains(&placement.sunlight_chance)
        {
            return invalid("item chances must lie in [0, 1]");
        }

        let stage = &self.stage;
        if stage.platforms_per_stage == 0 {
            return invalid("platforms_per_stage must be non-zero");
        }
        if stage.obstacle_chance_denominator == 0 {
            return invalid("obstacle_chance_denominator must be non-zero");
        }
        if stage.stage_duration.is_some_and(|duration| !(duration > 0.0)) {
            return invalid("stage_duration must be positive");
        }

        if self.themes.is_empty() || self.themes.iter().any(|theme| theme.platforms.is_empty()) {
            return invalid("every stage needs at least one platform template");
        }

        Ok(())
    }
}

fn obstacle(x: f32, y: f32) -> ObstacleTemplate {
    ObstacleTemplate {
        offset: [x, y],
        radius: 0.4,
    }
}

fn template(name: &str, width: f32, obstacles: Vec<ObstacleTemplate>) -> PlatformTemplate {
    PlatformTemplate {
        name: name.to_string(),
        width,
        height: 1.0,
        obstacles,
    }
}

/// Four stages with a short and a long platform each
pub fn default_themes() -> Vec<StageTheme> {
    (1..=4)
        .map(|stage| {
            #[allow(clippy::cast_precision_loss)]
            let extra = (stage - 1) as f32 * 0.5;
            StageTheme {
                platforms: vec![
                    template(
                        &format!("stage{stage}/short"),
                        4.5 + extra,
                        vec![obstacle(0.0, 0.9)],
                    ),
                    template(
                        &format!("stage{stage}/long"),
                        9.0 + extra,
                        vec![obstacle(-2.0, 0.9), obstacle(2.5, 0.9)],
                    ),
                ],
            }
        })
        .collect()
}
