//! Geometry buffers: spheres, triangles and rectangular plane patches.

use glam::Vec3;

use crate::MaterialHandle;

/// A sphere primitive.
#[derive(Clone, Debug, PartialEq)]
pub struct Sphere {
    pub position: Vec3,
    pub radius: f32,
    /// Orientation hint, unused by intersection.
    pub direction: Vec3,
    pub material: MaterialHandle,
}

impl Sphere {
    pub fn new(position: Vec3, radius: f32, material: MaterialHandle) -> Self {
        Self {
            position,
            radius: radius.max(0.0),
            direction: Vec3::Y,
            material,
        }
    }
}

/// A triangle with a precomputed unit face normal.
#[derive(Clone, Debug, PartialEq)]
pub struct Triangle {
    pub v: [Vec3; 3],
    pub normal: Vec3,
    pub material: MaterialHandle,
}

impl Triangle {
    /// Create a triangle; the normal follows the `v0 -> v1 -> v2` winding.
    pub fn new(v0: Vec3, v1: Vec3, v2: Vec3, material: MaterialHandle) -> Self {
        let normal = (v1 - v0).cross(v2 - v0).normalize_or_zero();
        Self {
            v: [v0, v1, v2],
            normal,
            material,
        }
    }

    /// Create a triangle with an explicit normal.
    pub fn with_normal(v0: Vec3, v1: Vec3, v2: Vec3, normal: Vec3, material: MaterialHandle) -> Self {
        Self {
            v: [v0, v1, v2],
            normal: normal.normalize_or_zero(),
            material,
        }
    }
}

/// A plane patch spanned by `position + a*u + b*v` for `a, b` in `[0, 1]`.
#[derive(Clone, Debug, PartialEq)]
pub struct Plane {
    pub position: Vec3,
    pub u: Vec3,
    pub v: Vec3,
    pub normal: Vec3,
    pub material: MaterialHandle,
}

impl Plane {
    /// Create a patch whose normal is `u x v`.
    pub fn new(position: Vec3, u: Vec3, v: Vec3, material: MaterialHandle) -> Self {
        Self {
            position,
            u,
            v,
            normal: u.cross(v).normalize_or_zero(),
            material,
        }
    }

    /// Centre of the patch.
    pub fn center(&self) -> Vec3 {
        self.position + 0.5 * (self.u + self.v)
    }

    /// The four patch corners.
    pub fn corners(&self) -> [Vec3; 4] {
        [
            self.position,
            self.position + self.u,
            self.position + self.v,
            self.position + self.u + self.v,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_triangle_normal_follows_winding() {
        let tri = Triangle::new(Vec3::ZERO, Vec3::X, Vec3::Y, MaterialHandle(0));
        assert_eq!(tri.normal, Vec3::Z);

        let flipped = Triangle::new(Vec3::ZERO, Vec3::Y, Vec3::X, MaterialHandle(0));
        assert_eq!(flipped.normal, Vec3::NEG_Z);
    }

    #[test]
    fn test_degenerate_triangle_has_zero_normal() {
        let tri = Triangle::new(Vec3::ZERO, Vec3::X, Vec3::X * 2.0, MaterialHandle(0));
        assert_eq!(tri.normal, Vec3::ZERO);
    }

    #[test]
    fn test_plane_corners() {
        let plane = Plane::new(Vec3::ZERO, Vec3::X * 2.0, Vec3::Z * 2.0, MaterialHandle(1));
        assert_eq!(plane.normal, Vec3::NEG_Y);
        assert_eq!(plane.center(), Vec3::new(1.0, 0.0, 1.0));
        assert_eq!(plane.corners()[3], Vec3::new(2.0, 0.0, 2.0));
    }

    #[test]
    fn test_sphere_clamps_radius() {
        let sphere = Sphere::new(Vec3::ZERO, -1.0, MaterialHandle(0));
        assert_eq!(sphere.radius, 0.0);
    }
}
