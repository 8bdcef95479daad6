//! Math utilities and types
//!
//! The scheduler lives on a 2D scrolling plane, so only the 2D subset of
//! nalgebra is exposed here.

pub use nalgebra::Vector2;

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// Build a `Vec2` from a `[x, y]` pair (the config file representation)
pub fn vec2(pair: [f32; 2]) -> Vec2 {
    Vec2::new(pair[0], pair[1])
}

/// Math constants
pub mod constants {
    /// Pi constant
    pub const PI: f32 = std::f32::consts::PI;

    /// Degrees to radians conversion factor
    pub const DEG_TO_RAD: f32 = PI / 180.0;
}

/// Math utility functions
pub mod utils {
    use super::constants;
    use super::Vec2;

    /// Convert degrees to radians
    pub fn deg_to_rad(degrees: f32) -> f32 {
        degrees * constants::DEG_TO_RAD
    }

    /// Linear interpolation
    pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
        a + (b - a) * t
    }

    /// Whether two circles overlap (touching counts as overlap)
    pub fn circles_overlap(a: Vec2, radius_a: f32, b: Vec2, radius_b: f32) -> bool {
        let reach = radius_a + radius_b;
        (a - b).norm_squared() <= reach * reach
    }
}
