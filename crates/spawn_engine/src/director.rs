//! Composition root of the spawn pipeline
//!
//! The director owns every pool and component and runs them in a fixed order
//! each tick:
//!
//! 1. Let pools grow again after last tick's factory failures, then fire due
//!    deadlines (speed boost expiry, stage timer)
//! 2. Scroll active platforms left
//! 3. Recycle platforms that left the screen
//! 4. If the scheduler allows, spawn one platform, roll its obstacles,
//!    count it towards the stage, populate it and register it
//!
//! Everything the host provides (time, dice, collision queries, event
//! delivery) comes in through traits at construction or per call.

use crate::catalog::{ItemPools, PlatformPools};
use crate::config::{ConfigError, SpawnConfig};
use crate::entity::{Item, ItemKind, Platform};
use crate::error::{SpawnError, SpawnResult};
use crate::events::NotificationSink;
use crate::foundation::math::Vec2;
use crate::foundation::random::RandomSource;
use crate::foundation::time::{Clock, Deadline};
use crate::placement::{Layout, PlacementContext, PlacementPlanner, PlacementReport};
use crate::pool::PoolHandle;
use crate::scheduler::SpawnScheduler;
use crate::spatial::SpatialQuery;
use crate::stage::{StageProgressionController, StageState};
use crate::tracker::ActiveSetTracker;

/// What happened during one tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickReport {
    /// Clock time of the tick
    pub now: f64,
    /// Seconds since the previous tick
    pub dt: f64,
    /// Platforms recycled this tick
    pub recycled: usize,
    /// Platform spawned this tick, if any
    pub spawned: Option<PoolHandle>,
    /// Placement outcome for the spawned platform
    pub placement: Option<PlacementReport>,
    /// New stage number if the stage changed this tick
    pub stage_advanced: Option<u32>,
    /// Whether a speed boost ran out this tick
    pub boost_expired: bool,
}

impl TickReport {
    fn new(now: f64, dt: f64) -> Self {
        Self {
            now,
            dt,
            recycled: 0,
            spawned: None,
            placement: None,
            stage_advanced: None,
            boost_expired: false,
        }
    }
}

/// Running totals for a session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DirectorStats {
    /// Ticks processed
    pub ticks: u64,
    /// Platforms spawned
    pub platforms_spawned: u64,
    /// Platforms recycled
    pub platforms_recycled: u64,
    /// Spawns abandoned because no platform could be acquired
    pub spawn_failures: u64,
    /// Curve layouts that fell back to a line
    pub fallback_layouts: u64,
    /// Items placed, indexed like [`ItemKind::ALL`]
    pub items_placed: [u64; 3],
    /// Items collected, indexed like [`ItemKind::ALL`]
    pub items_collected: [u64; 3],
    /// First landings on platforms
    pub platforms_stepped: u64,
}

const fn kind_index(kind: ItemKind) -> usize {
    match kind {
        ItemKind::Water => 0,
        ItemKind::Pill => 1,
        ItemKind::Sunlight => 2,
    }
}

/// Owns and drives the whole spawn pipeline
pub struct SpawnDirector {
    config: SpawnConfig,
    platforms: PlatformPools,
    items: ItemPools,
    planner: PlacementPlanner,
    tracker: ActiveSetTracker,
    scheduler: SpawnScheduler,
    stage: StageProgressionController,
    rng: Box<dyn RandomSource>,
    spatial: Box<dyn SpatialQuery>,
    sink: Box<dyn NotificationSink>,
    boost: Deadline,
    speed_multiplier: f64,
    last_tick: Option<f64>,
    stats: DirectorStats,
}

impl SpawnDirector {
    /// Validate the configuration and pre-build every pool
    pub fn new(
        config: SpawnConfig,
        rng: Box<dyn RandomSource>,
        spatial: Box<dyn SpatialQuery>,
        sink: Box<dyn NotificationSink>,
    ) -> SpawnResult<Self> {
        config.validate().map_err(|error| match error {
            ConfigError::Invalid(reason) => SpawnError::InvalidConfig(reason),
            other => SpawnError::InvalidConfig(other.to_string()),
        })?;

        let platforms = PlatformPools::new(&config.themes, &config.pools);
        let items = ItemPools::new(&config.pools);
        let director = Self {
            planner: PlacementPlanner::new(&config.placement),
            tracker: ActiveSetTracker::new(config.scheduler.max_active_platforms),
            scheduler: SpawnScheduler::new(&config.scheduler),
            stage: StageProgressionController::new(&config.stage),
            platforms,
            items,
            rng,
            spatial,
            sink,
            boost: Deadline::unarmed(),
            speed_multiplier: 1.0,
            last_tick: None,
            stats: DirectorStats::default(),
            config,
        };

        log::info!(
            "Spawn director ready: {} themes, {} platform pools, {} active platforms max",
            director.platforms.theme_count(),
            director.platforms.iter().count(),
            director.tracker.capacity()
        );
        Ok(director)
    }

    /// Advance the pipeline to the clock's current time
    pub fn tick(&mut self, clock: &dyn Clock) -> TickReport {
        let now = clock.now();
        let dt = self.last_tick.map_or(0.0, |previous| (now - previous).max(0.0));
        self.last_tick = Some(now);
        self.stats.ticks += 1;

        let mut report = TickReport::new(now, dt);
        self.platforms.begin_tick();
        self.items.begin_tick();

        if self.boost.fire(now) {
            self.end_boost(now);
            report.boost_expired = true;
        }
        if let Some(stage) = self.stage.tick(now) {
            self.sink.on_stage_advanced(stage);
            report.stage_advanced = Some(stage);
        }

        #[allow(clippy::cast_possible_truncation)]
        let dx = self.config.scheduler.scroll_speed * (self.speed_multiplier * dt) as f32;
        if dx > 0.0 {
            self.tracker.scroll(&mut self.platforms, dx);
        }

        report.recycled = self.tracker.sweep(
            &mut self.platforms,
            &mut self.items,
            self.config.scheduler.despawn_x,
            self.sink.as_mut(),
        );
        self.stats.platforms_recycled += report.recycled as u64;

        if self
            .scheduler
            .ready(now, self.tracker.len(), self.tracker.capacity())
        {
            self.spawn(now, &mut report);
        }

        report
    }

    fn spawn(&mut self, now: f64, report: &mut TickReport) {
        let theme = self.stage.next_platform_theme_index(self.platforms.theme_count());
        let variant = self.rng.index(self.platforms.variant_count(theme));

        let Some(handle) = self.platforms.acquire(theme, variant) else {
            self.stats.spawn_failures += 1;
            log::warn!("No platform available for theme {theme} variant {variant}");
            self.scheduler.schedule_next(now, self.rng.as_mut());
            return;
        };

        let scheduler = &self.config.scheduler;
        #[allow(clippy::cast_possible_truncation)]
        let y = self
            .rng
            .uniform(f64::from(scheduler.spawn_y_min), f64::from(scheduler.spawn_y_max)) as f32;
        self.platforms
            .set_position(handle, Vec2::new(scheduler.spawn_x, y));
        let obstacles = self.tracker.activate(
            &mut self.platforms,
            handle,
            self.rng.as_mut(),
            self.config.stage.obstacle_chance_denominator,
        );

        if let Some(stage) = self.stage.record_platform(now) {
            self.sink.on_stage_advanced(stage);
            report.stage_advanced = Some(stage);
        }

        let mut cx = PlacementContext {
            platforms: &mut self.platforms,
            items: &mut self.items,
            stage: &mut self.stage,
            spatial: self.spatial.as_ref(),
            rng: self.rng.as_mut(),
            sink: self.sink.as_mut(),
        };
        match self.planner.populate(handle, &mut cx) {
            Ok(placement) => {
                if placement.layout == Layout::LineFallback {
                    self.stats.fallback_layouts += 1;
                }
                let placed = [placement.water, placement.pills, placement.sunlight];
                for (total, count) in self.stats.items_placed.iter_mut().zip(placed) {
                    *total += count as u64;
                }
                report.placement = Some(placement);
            }
            Err(error) => log::warn!("Could not populate {handle}: {error}"),
        }

        if let Err(error) = self.tracker.register(handle) {
            log::warn!("{error}; returning {handle} to its pool");
            if let Some(platform) = self.platforms.get_mut(handle) {
                for item in platform.drain_items() {
                    self.items.release(item);
                }
            }
            self.platforms.release(handle);
        } else {
            self.stats.platforms_spawned += 1;
            report.spawned = Some(handle);
            log::debug!(
                "Spawned {} at y={:.2} with {:?} obstacles ({}/{} active)",
                handle,
                y,
                obstacles,
                self.tracker.len(),
                self.tracker.capacity()
            );
        }

        self.scheduler.schedule_next(now, self.rng.as_mut());
    }

    /// The player picked up an item
    ///
    /// Detaches the item from its platform and returns it to its pool.
    /// Collecting a pill frees one pill of the stage quota. Returns `None` for
    /// dead handles.
    pub fn collect_item(&mut self, handle: PoolHandle) -> Option<ItemKind> {
        let kind = self.items.get(handle)?.kind();
        let world_position = self.item_world_position(handle)?;

        if let Some(parent) = self.items.parent(handle) {
            if let Some(platform) = self.platforms.get_mut(parent) {
                platform.remove_item(handle);
            }
        }
        self.items.detach(handle, world_position);
        self.items.release(handle);

        if kind == ItemKind::Pill {
            self.stage.notify_pill_consumed();
        }
        self.stats.items_collected[kind_index(kind)] += 1;
        log::debug!("Collected {kind} at ({:.2}, {:.2})", world_position.x, world_position.y);
        Some(kind)
    }

    /// Speed up scrolling and spawning for `duration` seconds
    ///
    /// Applying a boost while one is running replaces it.
    pub fn apply_speed_boost(&mut self, now: f64, multiplier: f64, duration: f64) {
        if !(multiplier.is_finite() && multiplier > 0.0) {
            log::warn!("Ignoring speed boost with multiplier {multiplier}");
            return;
        }
        self.speed_multiplier = multiplier;
        self.scheduler.set_speed_multiplier(now, multiplier);
        self.boost.arm(now, duration);
        log::info!("Speed boost x{multiplier} for {duration}s");
    }

    fn end_boost(&mut self, now: f64) {
        self.speed_multiplier = 1.0;
        self.scheduler.reset_speed(now);
        log::info!("Speed boost ended");
    }

    /// Record that the player landed on a platform
    ///
    /// Returns `true` only for the first landing of an activation.
    pub fn mark_stepped(&mut self, handle: PoolHandle) -> bool {
        let first = self.tracker.mark_stepped(&mut self.platforms, handle);
        if first {
            self.stats.platforms_stepped += 1;
        }
        first
    }

    /// Return every entity to its pool and reset all progression
    ///
    /// The next tick starts from stage 1 with an immediate spawn.
    pub fn restart(&mut self) {
        let items = self.items.release_all();
        let platforms = self.platforms.release_all();
        self.tracker.clear();
        self.stage.restart();
        self.scheduler.reset();
        self.boost.cancel();
        self.speed_multiplier = 1.0;
        self.last_tick = None;
        log::info!("Restarted: returned {platforms} platforms and {items} items to their pools");
    }

    /// Active platforms, oldest first
    pub fn active_platforms(&self) -> &[PoolHandle] {
        self.tracker.handles()
    }

    /// Active platform by handle
    pub fn platform(&self, handle: PoolHandle) -> Option<&Platform> {
        self.platforms.get(handle)
    }

    /// World position of an active platform
    pub fn platform_position(&self, handle: PoolHandle) -> Option<Vec2> {
        self.platforms.position(handle)
    }

    /// Live item by handle
    pub fn item(&self, handle: PoolHandle) -> Option<&Item> {
        self.items.get(handle)
    }

    /// World position of a live item, following its parent platform
    pub fn item_world_position(&self, handle: PoolHandle) -> Option<Vec2> {
        let position = self.items.position(handle)?;
        match self.items.parent(handle) {
            Some(parent) => Some(self.platforms.position(parent)? + position),
            None => Some(position),
        }
    }

    /// Stage counters
    pub fn stage(&self) -> StageState {
        self.stage.state()
    }

    /// Session totals
    pub fn stats(&self) -> DirectorStats {
        self.stats
    }

    /// Current scroll and spawn speed multiplier
    pub fn speed_multiplier(&self) -> f64 {
        self.speed_multiplier
    }

    /// Seconds left on the running speed boost
    pub fn boost_remaining(&self, now: f64) -> Option<f64> {
        self.boost.remaining(now)
    }

    /// Time the next spawn becomes due
    pub fn next_spawn_at(&self) -> f64 {
        self.scheduler.deadline()
    }

    /// Configuration the director was built with
    pub fn config(&self) -> &SpawnConfig {
        &self.config
    }

    /// Platform pools, for inspection
    pub fn platform_pools(&self) -> &PlatformPools {
        &self.platforms
    }

    /// Item pools, for inspection
    pub fn item_pools(&self) -> &ItemPools {
        &self.items
    }
}

impl std::fmt::Debug for SpawnDirector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpawnDirector")
            .field("stage", &self.stage.state())
            .field("active", &self.tracker.handles())
            .field("speed_multiplier", &self.speed_multiplier)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}
