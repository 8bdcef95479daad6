//! Active platform bookkeeping
//!
//! Platform lifecycle:
//!
//! ```text
//! Pooled ──activate──> Active (unstepped) ──mark_stepped──> Active (stepped)
//!    ^                        │                                  │
//!    └──────────── recycle <──┴──────────────────────────────────┘
//! ```
//!
//! Recycling releases every item parented to the platform before the
//! platform itself, so nothing is left dangling in the item pools.

use crate::catalog::{ItemPools, PlatformPools};
use crate::entity::Platform;
use crate::error::{report_violation, SpawnError, SpawnResult, Violation};
use crate::events::NotificationSink;
use crate::foundation::math::Vec2;
use crate::foundation::random::RandomSource;
use crate::pool::PoolHandle;

/// Ordered set of active platforms, oldest first
#[derive(Debug, Clone)]
pub struct ActiveSetTracker {
    active: Vec<PoolHandle>,
    capacity: usize,
}

impl ActiveSetTracker {
    /// Create an empty set holding at most `capacity` platforms
    pub fn new(capacity: usize) -> Self {
        Self {
            active: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Reset a freshly acquired platform for a new activation
    ///
    /// Clears `stepped` and rolls every obstacle once. Returns how many
    /// obstacles are enabled, or `None` for a dead handle.
    pub fn activate(
        &self,
        platforms: &mut PlatformPools,
        handle: PoolHandle,
        rng: &mut dyn RandomSource,
        obstacle_chance_denominator: u32,
    ) -> Option<usize> {
        let platform = platforms.get_mut(handle)?;
        Some(platform.activate(rng, obstacle_chance_denominator))
    }

    /// Add a platform to the end of the set
    pub fn register(&mut self, handle: PoolHandle) -> SpawnResult<()> {
        if self.active.contains(&handle) {
            return Ok(());
        }
        if self.is_full() {
            return Err(SpawnError::CapacityReached {
                capacity: self.capacity,
            });
        }
        self.active.push(handle);
        Ok(())
    }

    /// Move every active platform left by `dx`
    pub fn scroll(&self, platforms: &mut PlatformPools, dx: f32) {
        for &handle in &self.active {
            if let Some(position) = platforms.position(handle) {
                platforms.set_position(handle, position - Vec2::new(dx, 0.0));
            }
        }
    }

    /// Recycle every platform whose trailing edge is left of `despawn_x`
    ///
    /// Returns the number of recycled platforms.
    pub fn sweep(
        &mut self,
        platforms: &mut PlatformPools,
        items: &mut ItemPools,
        despawn_x: f32,
        sink: &mut dyn NotificationSink,
    ) -> usize {
        let mut recycled = 0;
        let mut index = 0;
        while index < self.active.len() {
            let handle = self.active[index];
            let expired = match (platforms.position(handle), platforms.get(handle)) {
                (Some(position), Some(platform)) => position.x + platform.half_extents().x < despawn_x,
                // Released behind our back; drop it from the set
                _ => true,
            };
            if expired {
                self.recycle_at(index, platforms, items, sink);
                recycled += 1;
            } else {
                index += 1;
            }
        }
        recycled
    }

    /// Recycle one platform
    ///
    /// Returns `false` without side effects if the platform is not in the set,
    /// e.g. when it was already recycled.
    pub fn recycle(
        &mut self,
        handle: PoolHandle,
        platforms: &mut PlatformPools,
        items: &mut ItemPools,
        sink: &mut dyn NotificationSink,
    ) -> bool {
        match self.active.iter().position(|active| *active == handle) {
            Some(index) => {
                self.recycle_at(index, platforms, items, sink);
                true
            }
            None => {
                report_violation(Violation::RecycleInactive(handle));
                false
            }
        }
    }

    fn recycle_at(
        &mut self,
        index: usize,
        platforms: &mut PlatformPools,
        items: &mut ItemPools,
        sink: &mut dyn NotificationSink,
    ) {
        let handle = self.active.remove(index);
        let mut released_items = 0;
        if let Some(platform) = platforms.get_mut(handle) {
            for item in platform.drain_items() {
                released_items += usize::from(items.release(item));
            }
        }
        platforms.release(handle);
        sink.on_platform_recycled(handle);
        log::debug!(
            "Recycled platform {} with {} items ({} still active)",
            handle,
            released_items,
            self.active.len()
        );
    }

    /// Record that the player landed on a platform
    ///
    /// Returns `true` only for the first landing of an activation.
    pub fn mark_stepped(&self, platforms: &mut PlatformPools, handle: PoolHandle) -> bool {
        if !self.contains(handle) {
            return false;
        }
        platforms
            .get_mut(handle)
            .is_some_and(Platform::mark_stepped)
    }

    /// Forget every platform. Pools are reset separately.
    pub fn clear(&mut self) {
        self.active.clear();
    }

    /// Active platforms, oldest first
    pub fn handles(&self) -> &[PoolHandle] {
        &self.active
    }

    /// Whether a platform is in the set
    pub fn contains(&self, handle: PoolHandle) -> bool {
        self.active.contains(&handle)
    }

    /// Number of active platforms
    pub fn len(&self) -> usize {
        self.active.len()
    }

    /// Whether no platform is active
    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    /// Maximum number of active platforms
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Whether the set is at capacity
    pub fn is_full(&self) -> bool {
        self.active.len() >= self.capacity
    }
}
