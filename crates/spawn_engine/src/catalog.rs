//! Typed collections of pools
//!
//! Platforms get one pool per template per stage theme; items get one pool per
//! kind. Handles carry their pool id, so lookups never go through names.

use crate::config::{PoolConfig, StageTheme};
use crate::entity::{Item, ItemFactory, ItemKind, Platform, PlatformFactory};
use crate::error::{report_violation, Violation};
use crate::foundation::math::{vec2, Vec2};
use crate::pool::{ObjectPool, PoolHandle, PoolId};

/// First pool id used for platform pools; item pools use the ids below it
pub const PLATFORM_POOL_BASE: u16 = 16;

/// Pools for every platform template, grouped by stage theme
#[derive(Debug)]
pub struct PlatformPools {
    pools: Vec<ObjectPool<Platform>>,
    themes: Vec<std::ops::Range<usize>>,
}

impl PlatformPools {
    /// Build and fill one pool per template
    pub fn new(themes: &[StageTheme], config: &PoolConfig) -> Self {
        let mut pools = Vec::new();
        let mut ranges = Vec::with_capacity(themes.len());

        for theme in themes {
            let start = pools.len();
            for template in &theme.platforms {
                #[allow(clippy::cast_possible_truncation)]
                let id = PoolId(PLATFORM_POOL_BASE + pools.len() as u16);
                pools.push(ObjectPool::<Platform>::new(
                    id,
                    template.name.clone(),
                    config.platform_pool_size,
                    config.grow_by,
                    vec2(config.pool_position),
                    Box::new(PlatformFactory::new(template.clone())),
                ));
            }
            ranges.push(start..pools.len());
        }

        Self {
            pools,
            themes: ranges,
        }
    }

    /// Number of stage themes
    pub fn theme_count(&self) -> usize {
        self.themes.len()
    }

    /// Number of templates in a theme
    pub fn variant_count(&self, theme: usize) -> usize {
        self.themes.get(theme).map_or(0, ExactSizeIterator::len)
    }

    /// Acquire a platform of one template
    pub fn acquire(&mut self, theme: usize, variant: usize) -> Option<PoolHandle> {
        let range = self.themes.get(theme)?.clone();
        let index = range.start + variant;
        if !range.contains(&index) {
            return None;
        }
        self.pools[index].acquire()
    }

    fn slot(&self, pool: PoolId) -> Option<usize> {
        let slot = usize::from(pool.0.checked_sub(PLATFORM_POOL_BASE)?);
        (slot < self.pools.len()).then_some(slot)
    }

    /// Pool that owns a handle
    pub fn pool(&self, handle: PoolHandle) -> Option<&ObjectPool<Platform>> {
        self.slot(handle.pool).map(|slot| &self.pools[slot])
    }

    /// Pool that owns a handle, mutably
    pub fn pool_mut(&mut self, handle: PoolHandle) -> Option<&mut ObjectPool<Platform>> {
        self.slot(handle.pool).map(|slot| &mut self.pools[slot])
    }

    /// Live platform by handle
    pub fn get(&self, handle: PoolHandle) -> Option<&Platform> {
        self.pool(handle)?.get(handle)
    }

    /// Live platform by handle, mutably
    pub fn get_mut(&mut self, handle: PoolHandle) -> Option<&mut Platform> {
        self.pool_mut(handle)?.get_mut(handle)
    }

    /// World position of a live platform
    pub fn position(&self, handle: PoolHandle) -> Option<Vec2> {
        self.pool(handle)?.position(handle)
    }

    /// Move a live platform
    pub fn set_position(&mut self, handle: PoolHandle, position: Vec2) -> bool {
        self.pool_mut(handle)
            .is_some_and(|pool| pool.set_position(handle, position))
    }

    /// Whether the handle refers to an active platform
    pub fn is_live(&self, handle: PoolHandle) -> bool {
        self.pool(handle).is_some_and(|pool| pool.is_live(handle))
    }

    /// Return a platform to its pool
    pub fn release(&mut self, handle: PoolHandle) -> bool {
        match self.slot(handle.pool) {
            Some(slot) => self.pools[slot].release(handle),
            None => {
                report_violation(Violation::ForeignHandle {
                    handle,
                    pool: handle.pool,
                });
                false
            }
        }
    }

    /// Force every platform back into its pool
    pub fn release_all(&mut self) -> usize {
        self.pools.iter_mut().map(ObjectPool::release_all).sum()
    }

    /// Lift growth blocks left by factory failures on the previous tick
    pub fn begin_tick(&mut self) {
        self.pools.iter_mut().for_each(ObjectPool::begin_tick);
    }

    /// Every platform pool
    pub fn iter(&self) -> impl Iterator<Item = &ObjectPool<Platform>> {
        self.pools.iter()
    }

    /// Platforms lent out across all pools
    pub fn active_count(&self) -> usize {
        self.pools.iter().map(ObjectPool::active_count).sum()
    }
}

/// One pool per item kind
#[derive(Debug)]
pub struct ItemPools {
    pools: [ObjectPool<Item>; 3],
}

impl ItemPools {
    /// Build and fill the water, pill and sunlight pools
    pub fn new(config: &PoolConfig) -> Self {
        let pool_position = vec2(config.pool_position);
        let make = |kind: ItemKind, size: usize| {
            ObjectPool::<Item>::new(
                Self::pool_id(kind),
                kind.name(),
                size,
                config.grow_by,
                pool_position,
                Box::new(ItemFactory::new(kind)),
            )
        };

        Self {
            pools: [
                make(ItemKind::Water, config.water_pool_size),
                make(ItemKind::Pill, config.pill_pool_size),
                make(ItemKind::Sunlight, config.sunlight_pool_size),
            ],
        }
    }

    /// Pool id used for a kind
    pub const fn pool_id(kind: ItemKind) -> PoolId {
        match kind {
            ItemKind::Water => PoolId(0),
            ItemKind::Pill => PoolId(1),
            ItemKind::Sunlight => PoolId(2),
        }
    }

    fn slot(pool: PoolId) -> Option<usize> {
        let slot = usize::from(pool.0);
        (slot < 3).then_some(slot)
    }

    /// Pool for one kind
    pub fn pool(&self, kind: ItemKind) -> &ObjectPool<Item> {
        &self.pools[usize::from(Self::pool_id(kind).0)]
    }

    /// Pool that owns a handle
    pub fn pool_for(&self, handle: PoolHandle) -> Option<&ObjectPool<Item>> {
        Self::slot(handle.pool).map(|slot| &self.pools[slot])
    }

    fn pool_for_mut(&mut self, handle: PoolHandle) -> Option<&mut ObjectPool<Item>> {
        Self::slot(handle.pool).map(|slot| &mut self.pools[slot])
    }

    /// Acquire an item of one kind
    pub fn acquire(&mut self, kind: ItemKind) -> Option<PoolHandle> {
        self.pools[usize::from(Self::pool_id(kind).0)].acquire()
    }

    /// Live item by handle
    pub fn get(&self, handle: PoolHandle) -> Option<&Item> {
        self.pool_for(handle)?.get(handle)
    }

    /// Parent of a live item
    pub fn parent(&self, handle: PoolHandle) -> Option<PoolHandle> {
        self.pool_for(handle)?.parent(handle)
    }

    /// Position of a live item, local to its parent when attached
    pub fn position(&self, handle: PoolHandle) -> Option<Vec2> {
        self.pool_for(handle)?.position(handle)
    }

    /// Parent an item to a platform at a local position
    pub fn attach(&mut self, handle: PoolHandle, platform: PoolHandle, local_position: Vec2) -> bool {
        self.pool_for_mut(handle)
            .is_some_and(|pool| pool.attach(handle, platform, local_position))
    }

    /// Unparent an item, leaving it at a world position
    pub fn detach(&mut self, handle: PoolHandle, world_position: Vec2) -> bool {
        self.pool_for_mut(handle)
            .is_some_and(|pool| pool.detach(handle, world_position))
    }

    /// Return an item to its pool
    pub fn release(&mut self, handle: PoolHandle) -> bool {
        match Self::slot(handle.pool) {
            Some(slot) => self.pools[slot].release(handle),
            None => {
                report_violation(Violation::ForeignHandle {
                    handle,
                    pool: handle.pool,
                });
                false
            }
        }
    }

    /// Force every item back into its pool
    pub fn release_all(&mut self) -> usize {
        self.pools.iter_mut().map(ObjectPool::release_all).sum()
    }

    /// Lift growth blocks left by factory failures on the previous tick
    pub fn begin_tick(&mut self) {
        self.pools.iter_mut().for_each(ObjectPool::begin_tick);
    }

    /// Items lent out across all kinds
    pub fn active_count(&self) -> usize {
        self.pools.iter().map(ObjectPool::active_count).sum()
    }

    /// Every item pool
    pub fn iter(&self) -> impl Iterator<Item = &ObjectPool<Item>> {
        self.pools.iter()
    }
}
