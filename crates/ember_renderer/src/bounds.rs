//! Per-primitive bounding boxes for the scene KD-tree.

use ember_core::{Plane, Sphere, Triangle};
use ember_math::{Aabb, Vec3};

/// Half-extent of the box used to bound planes.
///
/// Planes get a large fixed box so the tree can still partition around
/// them. This is an approximation: geometry reaching beyond this extent
/// is still bounded correctly because the box is also grown to cover the
/// patch corners, but very large scenes will see planes in most leaves.
pub const PLANE_BOUND_EXTENT: f32 = 10_000.0;

pub fn sphere_bounds(sphere: &Sphere) -> Aabb {
    let r = Vec3::splat(sphere.radius);
    Aabb::from_points(sphere.position - r, sphere.position + r)
}

pub fn triangle_bounds(tri: &Triangle) -> Aabb {
    Aabb::from_iter_points(tri.v)
}

pub fn plane_bounds(plane: &Plane) -> Aabb {
    let mut bounds = Aabb::from_points(
        Vec3::splat(-PLANE_BOUND_EXTENT),
        Vec3::splat(PLANE_BOUND_EXTENT),
    );
    for corner in plane.corners() {
        bounds.expand(corner);
    }
    bounds
}

#[cfg(test)]
mod tests {
    use super::*;
    use ember_core::MaterialHandle;

    #[test]
    fn test_sphere_and_triangle_bounds() {
        let sphere = Sphere::new(Vec3::new(1.0, 2.0, 3.0), 0.5, MaterialHandle(0));
        let b = sphere_bounds(&sphere);
        assert_eq!(b.min, Vec3::new(0.5, 1.5, 2.5));
        assert_eq!(b.max, Vec3::new(1.5, 2.5, 3.5));

        let tri = Triangle::new(Vec3::ZERO, Vec3::new(2.0, 0.0, 1.0), Vec3::new(0.0, -1.0, 0.0), MaterialHandle(0));
        let b = triangle_bounds(&tri);
        assert_eq!(b.min, Vec3::new(0.0, -1.0, 0.0));
        assert_eq!(b.max, Vec3::new(2.0, 0.0, 1.0));
    }

    #[test]
    fn test_plane_bounds_cover_patch() {
        let small = Plane::new(Vec3::ZERO, Vec3::X, Vec3::Z, MaterialHandle(0));
        let b = plane_bounds(&small);
        assert_eq!(b.max, Vec3::splat(PLANE_BOUND_EXTENT));

        let huge = Plane::new(Vec3::splat(-2.0e4), Vec3::X * 4.0e4, Vec3::Z * 4.0e4, MaterialHandle(0));
        let b = plane_bounds(&huge);
        for corner in huge.corners() {
            assert!(b.contains(corner));
        }
    }
}
