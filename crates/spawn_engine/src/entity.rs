//! Pooled entities: platforms, their obstacles, and collectible items

use crate::config::PlatformTemplate;
use crate::error::FactoryError;
use crate::foundation::math::{vec2, Vec2};
use crate::foundation::random::RandomSource;
use crate::pool::{EntityFactory, PoolHandle, Poolable};

/// Kind of collectible item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ItemKind {
    /// Common collectible
    Water,
    /// Power-up, limited per stage
    Pill,
    /// Bonus item
    Sunlight,
}

impl ItemKind {
    /// All kinds, in pool order
    pub const ALL: [Self; 3] = [Self::Water, Self::Pill, Self::Sunlight];

    /// Lowercase name used in logs and pool names
    pub const fn name(self) -> &'static str {
        match self {
            Self::Water => "water",
            Self::Pill => "pill",
            Self::Sunlight => "sunlight",
        }
    }
}

impl std::fmt::Display for ItemKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Collision volume on a platform, enabled or disabled on each activation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Obstacle {
    /// Offset from the platform centre
    pub offset: Vec2,
    /// Radius of the collision circle
    pub radius: f32,
    /// Whether the obstacle is present for this activation
    pub active: bool,
}

/// A scrolling platform
#[derive(Debug, Clone)]
pub struct Platform {
    template: String,
    half_extents: Vec2,
    obstacles: Vec<Obstacle>,
    stepped: bool,
    items: Vec<PoolHandle>,
}

impl Platform {
    /// Create an inactive platform of the given size
    pub fn new(template: impl Into<String>, width: f32, height: f32, obstacles: Vec<Obstacle>) -> Self {
        Self {
            template: template.into(),
            half_extents: vec2([width * 0.5, height * 0.5]),
            obstacles,
            stepped: false,
            items: Vec::new(),
        }
    }

    /// Template the platform was built from
    pub fn template(&self) -> &str {
        &self.template
    }

    /// Full width
    pub fn width(&self) -> f32 {
        self.half_extents.x * 2.0
    }

    /// Full height
    pub fn height(&self) -> f32 {
        self.half_extents.y * 2.0
    }

    /// Half width and half height
    pub fn half_extents(&self) -> Vec2 {
        self.half_extents
    }

    /// All obstacles, active or not
    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    /// Obstacles enabled for this activation
    pub fn active_obstacles(&self) -> impl Iterator<Item = &Obstacle> {
        self.obstacles.iter().filter(|obstacle| obstacle.active)
    }

    /// First enabled obstacle, the anchor for curved item layouts
    pub fn first_active_obstacle(&self) -> Option<&Obstacle> {
        self.active_obstacles().next()
    }

    /// Enable each obstacle independently when `uniform_int(0, denominator)` rolls 0
    ///
    /// Returns the number of enabled obstacles.
    pub fn roll_obstacles(&mut self, rng: &mut dyn RandomSource, denominator: u32) -> usize {
        let upper = i32::try_from(denominator.max(1)).unwrap_or(i32::MAX);
        let mut enabled = 0;
        for obstacle in &mut self.obstacles {
            obstacle.active = rng.uniform_int(0, upper) == 0;
            enabled += usize::from(obstacle.active);
        }
        enabled
    }

    /// Start a new activation: not stepped, obstacles re-rolled
    pub fn activate(&mut self, rng: &mut dyn RandomSource, denominator: u32) -> usize {
        self.stepped = false;
        self.roll_obstacles(rng, denominator)
    }

    /// Whether the player has landed on this platform since activation
    pub fn is_stepped(&self) -> bool {
        self.stepped
    }

    /// Record a landing. Returns `true` only for the first landing.
    pub fn mark_stepped(&mut self) -> bool {
        !std::mem::replace(&mut self.stepped, true)
    }

    /// Items parented to this platform
    pub fn items(&self) -> &[PoolHandle] {
        &self.items
    }

    /// Record an item as parented to this platform
    pub fn push_item(&mut self, item: PoolHandle) {
        self.items.push(item);
    }

    /// Forget a parented item. Returns `false` if it was not parented here.
    pub fn remove_item(&mut self, item: PoolHandle) -> bool {
        match self.items.iter().position(|handle| *handle == item) {
            Some(index) => {
                self.items.remove(index);
                true
            }
            None => false,
        }
    }

    /// Take every parented item, keeping the list's allocation
    pub fn drain_items(&mut self) -> std::vec::Drain<'_, PoolHandle> {
        self.items.drain(..)
    }
}

impl Poolable for Platform {
    fn reset(&mut self) {
        self.stepped = false;
        self.items.clear();
        for obstacle in &mut self.obstacles {
            obstacle.active = false;
        }
    }
}

/// A collectible item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Item {
    kind: ItemKind,
}

impl Item {
    /// Create an item of the given kind
    pub const fn new(kind: ItemKind) -> Self {
        Self { kind }
    }

    /// Item kind
    pub const fn kind(&self) -> ItemKind {
        self.kind
    }
}

impl Poolable for Item {}

/// Builds platforms from a template
#[derive(Debug, Clone)]
pub struct PlatformFactory {
    template: PlatformTemplate,
}

impl PlatformFactory {
    /// Factory for one platform template
    pub fn new(template: PlatformTemplate) -> Self {
        Self { template }
    }
}

impl EntityFactory<Platform> for PlatformFactory {
    fn instantiate(&mut self) -> Result<Platform, FactoryError> {
        let template = &self.template;
        let invalid = |reason: &str| FactoryError::InvalidTemplate {
            name: template.name.clone(),
            reason: reason.to_string(),
        };

        if !(template.width > 0.0 && template.height > 0.0) {
            return Err(invalid("platform size must be positive"));
        }
        if template.obstacles.iter().any(|obstacle| !(obstacle.radius > 0.0)) {
            return Err(invalid("obstacle radius must be positive"));
        }

        let obstacles = template
            .obstacles
            .iter()
            .map(|obstacle| Obstacle {
                offset: vec2(obstacle.offset),
                radius: obstacle.radius,
                active: false,
            })
            .collect();

        Ok(Platform::new(
            template.name.clone(),
            template.width,
            template.height,
            obstacles,
        ))
    }
}

/// Builds items of a single kind
#[derive(Debug, Clone, Copy)]
pub struct ItemFactory {
    kind: ItemKind,
}

impl ItemFactory {
    /// Factory for one item kind
    pub const fn new(kind: ItemKind) -> Self {
        Self { kind }
    }
}

impl EntityFactory<Item> for ItemFactory {
    fn instantiate(&mut self) -> Result<Item, FactoryError> {
        Ok(Item::new(self.kind))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ObstacleTemplate;
    use crate::foundation::random::ScriptedRandom;
    use crate::pool::PoolId;

    fn template() -> PlatformTemplate {
        PlatformTemplate {
            name: "log".to_string(),
            width: 6.0,
            height: 1.0,
            obstacles: vec![
                ObstacleTemplate {
                    offset: [-1.0, 0.8],
                    radius: 0.4,
                },
                ObstacleTemplate {
                    offset: [1.5, 0.8],
                    radius: 0.4,
                },
            ],
        }
    }

    #[test]
    fn test_platform_factory() {
        let mut factory = PlatformFactory::new(template());
        let platform = factory.instantiate().unwrap();
        assert_eq!(platform.template(), "log");
        assert_eq!(platform.width(), 6.0);
        assert_eq!(platform.obstacles().len(), 2);
        assert!(platform.first_active_obstacle().is_none());
    }

    #[test]
    fn test_platform_factory_rejects_bad_template() {
        let mut bad = template();
        bad.width = 0.0;
        let error = PlatformFactory::new(bad).instantiate().unwrap_err();
        assert!(matches!(error, FactoryError::InvalidTemplate { .. }));
    }

    #[test]
    fn test_roll_obstacles_one_in_three() {
        let mut platform = PlatformFactory::new(template()).instantiate().unwrap();
        // 0.2 * 3 floors to 0 (enabled), 0.5 * 3 floors to 1 (disabled)
        let mut rng = ScriptedRandom::new(vec![0.2, 0.5]);
        assert_eq!(platform.roll_obstacles(&mut rng, 3), 1);
        assert!(platform.obstacles()[0].active);
        assert!(!platform.obstacles()[1].active);
        assert_eq!(platform.first_active_obstacle().unwrap().offset, Vec2::new(-1.0, 0.8));
    }

    #[test]
    fn test_mark_stepped_once() {
        let mut platform = PlatformFactory::new(template()).instantiate().unwrap();
        assert!(platform.mark_stepped());
        assert!(!platform.mark_stepped());
        platform.reset();
        assert!(!platform.is_stepped());
    }

    #[test]
    fn test_item_bookkeeping() {
        let mut platform = PlatformFactory::new(template()).instantiate().unwrap();
        let a = PoolHandle::new(PoolId(1), 0, 1);
        let b = PoolHandle::new(PoolId(1), 1, 1);
        platform.push_item(a);
        platform.push_item(b);
        assert!(platform.remove_item(a));
        assert!(!platform.remove_item(a));
        assert_eq!(platform.drain_items().collect::<Vec<_>>(), vec![b]);
        assert!(platform.items().is_empty());
    }
}
