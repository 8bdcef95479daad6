//! Item placement on freshly spawned platforms
//!
//! Two layouts are available:
//!
//! - **Line**: `clamp(floor(width / slot_spacing), min_items, max_items)` slots
//!   spread evenly across the platform minus a margin on each side.
//! - **Curve**: used when the platform has an active obstacle. Candidates are
//!   sampled along an arc over the first active obstacle, and any candidate
//!   whose clearance circle touches an obstacle is dropped. If every candidate is
//!   dropped the platform gets a line layout instead.
//!
//! Slots are then assigned kinds: at most one sunlight, at most one pill,
//! water everywhere else. Slot and kind buffers are owned by the planner and
//! reused between platforms.

use crate::catalog::{ItemPools, PlatformPools};
use crate::config::PlacementConfig;
use crate::entity::{ItemKind, Platform};
use crate::error::{SpawnError, SpawnResult, Violation};
use crate::events::NotificationSink;
use crate::foundation::math::{utils, Vec2};
use crate::foundation::random::RandomSource;
use crate::pool::PoolHandle;
use crate::spatial::{LayerMask, SpatialQuery};
use crate::stage::StageProgressionController;

/// Layout chosen for a platform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    /// Platform narrower than `min_platform_width`; no items
    Bare,
    /// Evenly spaced line
    Line,
    /// Arc over an obstacle
    Curve,
    /// Line layout after every curve candidate was rejected
    LineFallback,
}

/// Outcome of populating one platform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlacementReport {
    /// Layout used
    pub layout: Layout,
    /// Water items placed
    pub water: usize,
    /// Pills placed
    pub pills: usize,
    /// Sunlight items placed
    pub sunlight: usize,
    /// Slots left empty because an item pool could not supply an item
    pub skipped: usize,
    /// Items evicted from a previous population of the same platform
    pub evicted: usize,
}

impl PlacementReport {
    fn new(layout: Layout) -> Self {
        Self {
            layout,
            water: 0,
            pills: 0,
            sunlight: 0,
            skipped: 0,
            evicted: 0,
        }
    }

    /// Total items placed
    pub fn placed(&self) -> usize {
        self.water + self.pills + self.sunlight
    }

    fn count(&mut self, kind: ItemKind) {
        match kind {
            ItemKind::Water => self.water += 1,
            ItemKind::Pill => self.pills += 1,
            ItemKind::Sunlight => self.sunlight += 1,
        }
    }
}

/// Collaborators [`PlacementPlanner::populate`] reads from and writes to
pub struct PlacementContext<'a> {
    /// Platform pools, for the target platform
    pub platforms: &'a mut PlatformPools,
    /// Item pools, for eviction and acquisition
    pub items: &'a mut ItemPools,
    /// Quotas
    pub stage: &'a mut StageProgressionController,
    /// Host collision volumes
    pub spatial: &'a dyn SpatialQuery,
    /// Dice
    pub rng: &'a mut dyn RandomSource,
    /// Placement notifications
    pub sink: &'a mut dyn NotificationSink,
}

/// Computes item slots and fills them from the item pools
#[derive(Debug, Clone)]
pub struct PlacementPlanner {
    config: PlacementConfig,
    slots: Vec<Vec2>,
    kinds: Vec<ItemKind>,
}

impl PlacementPlanner {
    /// Create a planner
    pub fn new(config: &PlacementConfig) -> Self {
        let capacity = config.max_items.max(config.curve_samples);
        Self {
            config: config.clone(),
            slots: Vec::with_capacity(capacity),
            kinds: Vec::with_capacity(capacity),
        }
    }

    /// Line layout slots in platform-local coordinates
    ///
    /// Returns no slots for platforms narrower than `min_platform_width`.
    pub fn line_slots(&mut self, width: f32, height: f32) -> &[Vec2] {
        self.slots.clear();
        if width < self.config.min_platform_width {
            return &self.slots;
        }

        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let fit = (width / self.config.slot_spacing).floor().max(0.0) as usize;
        let count = fit.clamp(self.config.min_items, self.config.max_items);
        let y = height * 0.5 + self.config.item_height_offset;

        if count == 1 {
            self.slots.push(Vec2::new(0.0, y));
            return &self.slots;
        }

        let usable = width * (1.0 - 2.0 * self.config.margin_fraction);
        #[allow(clippy::cast_precision_loss)]
        let step = usable / (count - 1) as f32;
        for i in 0..count {
            #[allow(clippy::cast_precision_loss)]
            let x = -usable * 0.5 + step * i as f32;
            self.slots.push(Vec2::new(x, y));
        }
        &self.slots
    }

    /// Curve layout slots in platform-local coordinates
    ///
    /// `origin` is the platform's world position, used for the host query.
    /// Candidates outside the platform's width are dropped along with those
    /// that overlap an obstacle.
    pub fn curve_slots(
        &mut self,
        platform: &Platform,
        origin: Vec2,
        spatial: &dyn SpatialQuery,
    ) -> SpawnResult<&[Vec2]> {
        self.slots.clear();
        let Some(anchor) = platform.first_active_obstacle() else {
            return Err(SpawnError::PlacementInfeasible { candidates: 0 });
        };

        let config = &self.config;
        let half_width = platform.half_extents().x;
        let radius = config.curve_radius_factor * platform.width();
        let base_y = platform.half_extents().y + config.item_height_offset;
        let half_angle = utils::deg_to_rad(config.curve_half_angle_deg);
        let samples = config.curve_samples;

        for i in 0..samples {
            let angle = if samples == 1 {
                0.0
            } else {
                #[allow(clippy::cast_precision_loss)]
                let t = i as f32 / (samples - 1) as f32;
                utils::lerp(-half_angle, half_angle, t)
            };
            let candidate = Vec2::new(
                anchor.offset.x + angle.sin() * radius,
                base_y + angle.cos() * radius * config.curve_vertical_factor - config.curve_drop,
            );

            if candidate.x.abs() > half_width {
                continue;
            }
            let hits_own_obstacle = platform.active_obstacles().any(|obstacle| {
                utils::circles_overlap(candidate, config.clearance_radius, obstacle.offset, obstacle.radius)
            });
            if hits_own_obstacle
                || spatial.overlaps(origin + candidate, config.clearance_radius, LayerMask::OBSTACLE)
            {
                continue;
            }
            self.slots.push(candidate);
        }

        if self.slots.is_empty() {
            return Err(SpawnError::PlacementInfeasible {
                candidates: samples,
            });
        }
        Ok(&self.slots)
    }

    /// Assign a kind to each of `slot_count` slots
    ///
    /// At most one sunlight while the stage quota allows one and the
    /// `sunlight_chance` roll passes, uniformly over all slots. At most one
    /// pill under the same rules, uniformly over the remaining slots. Water
    /// everywhere else. Quotas are only read here; they are recorded once an
    /// item is actually placed.
    pub fn assign_kinds(
        &mut self,
        slot_count: usize,
        stage: &StageProgressionController,
        rng: &mut dyn RandomSource,
    ) -> &[ItemKind] {
        self.kinds.clear();
        self.kinds.resize(slot_count, ItemKind::Water);
        if slot_count == 0 {
            return &self.kinds;
        }

        let sunlight = (stage.can_spawn_sunlight() && rng.chance(self.config.sunlight_chance))
            .then(|| rng.index(slot_count));
        if let Some(index) = sunlight {
            self.kinds[index] = ItemKind::Sunlight;
        }

        let remaining = slot_count - usize::from(sunlight.is_some());
        if remaining > 0 && stage.can_spawn_pill() && rng.chance(self.config.pill_chance) {
            let mut index = rng.index(remaining);
            if sunlight.is_some_and(|taken| index >= taken) {
                index += 1;
            }
            self.kinds[index] = ItemKind::Pill;
        }

        &self.kinds
    }

    /// Evict any existing items from `platform`, lay out new slots and fill them
    ///
    /// Each placed item is parented to the platform at its slot's local
    /// position. Pill and sunlight quotas are recorded on the stage controller
    /// as they are placed. A slot whose pool cannot supply an item is skipped.
    pub fn populate(
        &mut self,
        platform: PoolHandle,
        cx: &mut PlacementContext<'_>,
    ) -> SpawnResult<PlacementReport> {
        let Some(origin) = cx.platforms.position(platform) else {
            return Err(SpawnError::InvariantViolation(Violation::StaleHandle(platform)));
        };

        let mut evicted = 0;
        if let Some(target) = cx.platforms.get_mut(platform) {
            for item in target.drain_items() {
                evicted += usize::from(cx.items.release(item));
            }
        }

        let Some(target) = cx.platforms.get(platform) else {
            return Err(SpawnError::InvariantViolation(Violation::StaleHandle(platform)));
        };

        let layout = if target.width() < self.config.min_platform_width {
            Layout::Bare
        } else if target.first_active_obstacle().is_some() {
            match self.curve_slots(target, origin, cx.spatial) {
                Ok(_) => Layout::Curve,
                Err(error) => {
                    log::debug!("{error}; using line layout on {platform}");
                    Layout::LineFallback
                }
            }
        } else {
            Layout::Line
        };

        if matches!(layout, Layout::Line | Layout::LineFallback) {
            let (width, height) = (target.width(), target.height());
            self.line_slots(width, height);
        } else if layout == Layout::Bare {
            self.slots.clear();
        }

        let mut report = PlacementReport::new(layout);
        report.evicted = evicted;

        self.assign_kinds(self.slots.len(), cx.stage, cx.rng);

        for (&slot, &kind) in self.slots.iter().zip(&self.kinds) {
            let Some(item) = cx.items.acquire(kind) else {
                report.skipped += 1;
                continue;
            };
            cx.items.attach(item, platform, slot);
            if let Some(target) = cx.platforms.get_mut(platform) {
                target.push_item(item);
            }

            match kind {
                ItemKind::Pill => {
                    cx.stage.record_pill();
                }
                ItemKind::Sunlight => {
                    cx.stage.record_sunlight();
                }
                ItemKind::Water => {}
            }

            cx.sink.on_item_placed(kind, origin + slot);
            report.count(kind);
        }

        log::debug!(
            "Populated {} with {:?}: {} water, {} pill, {} sunlight, {} skipped",
            platform,
            report.layout,
            report.water,
            report.pills,
            report.sunlight,
            report.skipped
        );
        Ok(report)
    }
}
