//! Spatial overlap queries used to keep items clear of obstacles
//!
//! The placement planner never owns colliders. It asks the host's physics
//! world whether a circle overlaps anything on a set of layers. Hosts
//! without a physics world can use [`ColliderWorld`], a flat list of circles,
//! or [`NoColliders`].

use crate::foundation::math::{utils, Vec2};
use bitflags::bitflags;
use slotmap::{new_key_type, SlotMap};

bitflags! {
    /// Collision layers for filtering overlap queries
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct LayerMask: u32 {
        /// Platform surfaces
        const PLATFORM = 1 << 0;
        /// Hazards items must keep clear of
        const OBSTACLE = 1 << 1;
        /// Collectible items
        const PICKUP = 1 << 2;
        /// The player character
        const PLAYER = 1 << 3;
    }
}

/// Overlap test against the host's collision volumes
pub trait SpatialQuery {
    /// Whether a circle at `point` with `radius` touches any volume on `mask`
    fn overlaps(&self, point: Vec2, radius: f32, mask: LayerMask) -> bool;
}

/// Query that never reports an overlap
#[derive(Debug, Clone, Copy, Default)]
pub struct NoColliders;

impl SpatialQuery for NoColliders {
    fn overlaps(&self, _point: Vec2, _radius: f32, _mask: LayerMask) -> bool {
        false
    }
}

new_key_type! {
    /// Key of a collider in a [`ColliderWorld`]
    pub struct ColliderKey;
}

/// Circular collision volume
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CircleCollider {
    /// World-space centre
    pub center: Vec2,
    /// Radius
    pub radius: f32,
    /// Layer the collider lives on
    pub layer: LayerMask,
}

/// Minimal collider store answering overlap queries by linear scan
#[derive(Debug, Clone, Default)]
pub struct ColliderWorld {
    colliders: SlotMap<ColliderKey, CircleCollider>,
}

impl ColliderWorld {
    /// Create an empty world
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a collider
    pub fn insert(&mut self, center: Vec2, radius: f32, layer: LayerMask) -> ColliderKey {
        self.colliders.insert(CircleCollider {
            center,
            radius,
            layer,
        })
    }

    /// Remove a collider, returning it if it existed
    pub fn remove(&mut self, key: ColliderKey) -> Option<CircleCollider> {
        self.colliders.remove(key)
    }

    /// Move a collider. Returns `false` for unknown keys.
    pub fn set_center(&mut self, key: ColliderKey, center: Vec2) -> bool {
        match self.colliders.get_mut(key) {
            Some(collider) => {
                collider.center = center;
                true
            }
            None => false,
        }
    }

    /// Look up a collider
    pub fn get(&self, key: ColliderKey) -> Option<&CircleCollider> {
        self.colliders.get(key)
    }

    /// Remove every collider
    pub fn clear(&mut self) {
        self.colliders.clear();
    }

    /// Number of colliders
    pub fn len(&self) -> usize {
        self.colliders.len()
    }

    /// Whether the world has no colliders
    pub fn is_empty(&self) -> bool {
        self.colliders.is_empty()
    }
}

impl SpatialQuery for ColliderWorld {
    fn overlaps(&self, point: Vec2, radius: f32, mask: LayerMask) -> bool {
        self.colliders.values().any(|collider| {
            mask.intersects(collider.layer)
                && utils::circles_overlap(point, radius, collider.center, collider.radius)
        })
    }
}
