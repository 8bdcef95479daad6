//! Notifications emitted by the spawn pipeline
//!
//! Effects, audio and UI subscribe through a [`NotificationSink`] handed to
//! the director at construction. The pipeline never waits on a sink.

use crate::entity::ItemKind;
use crate::foundation::math::Vec2;
use crate::pool::PoolHandle;
use std::cell::RefCell;
use std::rc::Rc;

/// Receiver of spawn pipeline notifications
pub trait NotificationSink {
    /// An item was placed on a platform at `world_position`
    fn on_item_placed(&mut self, kind: ItemKind, world_position: Vec2);

    /// A platform left the active set and returned to its pool
    fn on_platform_recycled(&mut self, platform: PoolHandle);

    /// The session moved to `stage`
    fn on_stage_advanced(&mut self, stage: u32);
}

/// A single notification, as recorded by [`EventLog`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SpawnEvent {
    /// See [`NotificationSink::on_item_placed`]
    ItemPlaced {
        /// Item kind
        kind: ItemKind,
        /// World position at placement time
        position: Vec2,
    },
    /// See [`NotificationSink::on_platform_recycled`]
    PlatformRecycled(PoolHandle),
    /// See [`NotificationSink::on_stage_advanced`]
    StageAdvanced(u32),
}

/// Sink that drops every notification
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl NotificationSink for NullSink {
    fn on_item_placed(&mut self, _kind: ItemKind, _world_position: Vec2) {}
    fn on_platform_recycled(&mut self, _platform: PoolHandle) {}
    fn on_stage_advanced(&mut self, _stage: u32) {}
}

/// Sink that reports notifications through `log`
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl NotificationSink for LogSink {
    fn on_item_placed(&mut self, kind: ItemKind, world_position: Vec2) {
        log::trace!(
            "Placed {} at ({:.2}, {:.2})",
            kind,
            world_position.x,
            world_position.y
        );
    }

    fn on_platform_recycled(&mut self, platform: PoolHandle) {
        log::trace!("Recycled platform {platform}");
    }

    fn on_stage_advanced(&mut self, stage: u32) {
        log::info!("Stage {stage} reached");
    }
}

/// Sink that records notifications in order
///
/// Clones share the same buffer, so a host can keep one clone and hand the
/// other to the director.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Rc<RefCell<Vec<SpawnEvent>>>,
}

impl EventLog {
    /// Create an empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything recorded so far
    pub fn events(&self) -> Vec<SpawnEvent> {
        self.events.borrow().clone()
    }

    /// Remove and return everything recorded so far
    pub fn drain(&self) -> Vec<SpawnEvent> {
        std::mem::take(&mut *self.events.borrow_mut())
    }

    /// Number of recorded notifications
    pub fn len(&self) -> usize {
        self.events.borrow().len()
    }

    /// Whether nothing has been recorded
    pub fn is_empty(&self) -> bool {
        self.events.borrow().is_empty()
    }

    /// Count recorded notifications matching a predicate
    pub fn count(&self, predicate: impl Fn(&SpawnEvent) -> bool) -> usize {
        self.events.borrow().iter().filter(|event| predicate(*event)).count()
    }

    fn push(&self, event: SpawnEvent) {
        self.events.borrow_mut().push(event);
    }
}

impl NotificationSink for EventLog {
    fn on_item_placed(&mut self, kind: ItemKind, world_position: Vec2) {
        self.push(SpawnEvent::ItemPlaced {
            kind,
            position: world_position,
        });
    }

    fn on_platform_recycled(&mut self, platform: PoolHandle) {
        self.push(SpawnEvent::PlatformRecycled(platform));
    }

    fn on_stage_advanced(&mut self, stage: u32) {
        self.push(SpawnEvent::StageAdvanced(stage));
    }
}
