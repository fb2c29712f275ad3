//! Ember math - vector types and geometric primitives shared by the
//! scene model and the renderer.

// Re-export glam for convenience
pub use glam::*;

mod aabb;
mod interval;
mod onb;
mod ray;

pub use aabb::Aabb;
pub use interval::Interval;
pub use onb::Onb;
pub use ray::Ray;

/// Index of an axis: 0 = X, 1 = Y, 2 = Z.
pub type Axis = usize;
