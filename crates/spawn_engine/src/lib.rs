//! # Spawn Engine
//!
//! Pooled spawn-and-placement scheduler for endless-runner games.
//!
//! ## Features
//!
//! - **Object Pools**: Pre-built platforms and items with generation-checked handles
//! - **Item Placement**: Line and obstacle-avoiding curve layouts with quota-aware kinds
//! - **Active Set**: Scrolling, off-screen recycling and stepped tracking
//! - **Stage Progression**: Platform-count and timed stages with per-stage quotas
//! - **Injected Services**: Clock, randomness, collision queries and notifications
//!   are all traits
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use spawn_engine::prelude::*;
//!
//! fn main() -> Result<(), SpawnError> {
//!     let mut director = SpawnDirector::new(
//!         SpawnConfig::default(),
//!         Box::new(StdRandom::seeded(7)),
//!         Box::new(NoColliders),
//!         Box::new(LogSink),
//!     )?;
//!
//!     let mut clock = ManualClock::new();
//!     for _ in 0..600 {
//!         clock.advance(1.0 / 60.0);
//!         director.tick(&clock);
//!     }
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod catalog;
pub mod config;
pub mod director;
pub mod entity;
pub mod error;
pub mod events;
pub mod foundation;
pub mod placement;
pub mod pool;
pub mod scheduler;
pub mod spatial;
pub mod stage;
pub mod tracker;

#[cfg(test)]
mod tests;

pub use director::{DirectorStats, SpawnDirector, TickReport};
pub use error::{SpawnError, SpawnResult};

/// Common imports for spawn engine users
pub mod prelude {
    pub use crate::{
        config::{Config, ConfigError, SpawnConfig},
        director::{DirectorStats, SpawnDirector, TickReport},
        entity::{Item, ItemKind, Platform},
        error::{SpawnError, SpawnResult},
        events::{EventLog, LogSink, NotificationSink, NullSink, SpawnEvent},
        foundation::{
            math::Vec2,
            random::{RandomSource, StdRandom},
            time::{Clock, ManualClock},
        },
        pool::PoolHandle,
        spatial::{ColliderWorld, LayerMask, NoColliders, SpatialQuery},
        stage::StageState,
    };
}
