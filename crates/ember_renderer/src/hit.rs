//! Intersection result record.

use ember_core::MaterialHandle;
use ember_math::Vec3;

/// Closest-hit information for one ray. A miss is `None` at the call site.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HitRecord {
    /// Ray parameter of the hit
    pub t: f32,
    /// World-space hit point
    pub point: Vec3,
    /// Geometric unit normal as stored on the primitive (not flipped
    /// towards the ray)
    pub normal: Vec3,
    /// Barycentric coordinates for triangles, patch coordinates for
    /// planes and area lights, zero for spheres
    pub u: f32,
    pub v: f32,
    /// Whether the ray arrived on the side the normal points to
    pub front_face: bool,
    /// `None` for area lights
    pub material: Option<MaterialHandle>,
}

impl HitRecord {
    pub fn new(
        ray_dir: Vec3,
        t: f32,
        point: Vec3,
        normal: Vec3,
        material: Option<MaterialHandle>,
    ) -> Self {
        Self {
            t,
            point,
            normal,
            u: 0.0,
            v: 0.0,
            front_face: ray_dir.dot(normal) < 0.0,
            material,
        }
    }

    pub fn with_uv(mut self, u: f32, v: f32) -> Self {
        self.u = u;
        self.v = v;
        self
    }

    /// Normal flipped to face the incoming ray.
    #[inline]
    pub fn shading_normal(&self) -> Vec3 {
        if self.front_face {
            self.normal
        } else {
            -self.normal
        }
    }
}
