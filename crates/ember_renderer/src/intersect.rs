//! Ray/primitive intersection routines.
//!
//! Every test takes the ray, one primitive and the open parameter range
//! `ray_t`, and returns the hit only when `ray_t.min < t < ray_t.max`.
//! Near-parallel and degenerate configurations are reported as misses.

use ember_core::{AreaLight, Color, Plane, Scene, Sphere, Triangle};
use ember_math::{Interval, Mat3, Ray, Vec3};

use crate::HitRecord;

const TRIANGLE_EPSILON: f32 = 1e-6;
const PLANE_PARALLEL_EPSILON: f32 = 1e-7;

/// Möller-Trumbore ray-triangle intersection.
///
/// Back faces are not culled: a negative determinant is folded into the
/// edge vector instead.
pub fn intersect_triangle(ray: &Ray, tri: &Triangle, ray_t: Interval) -> Option<HitRecord> {
    let [v0, v1, v2] = tri.v;
    let e1 = v1 - v0;
    let e2 = v2 - v0;

    let p = ray.direction.cross(e2);
    let mut det = e1.dot(p);
    let s = if det > 0.0 {
        ray.origin - v0
    } else {
        det = -det;
        v0 - ray.origin
    };

    // Ray is parallel to the triangle (or the triangle is degenerate)
    if det < TRIANGLE_EPSILON {
        return None;
    }

    let u = s.dot(p);
    if u < 0.0 || u > det {
        return None;
    }

    let q = s.cross(e1);
    let v = ray.direction.dot(q);
    if v < 0.0 || u + v > det {
        return None;
    }

    let inv_det = 1.0 / det;
    let t = e2.dot(q) * inv_det;
    if !ray_t.surrounds(t) {
        return None;
    }

    Some(
        HitRecord::new(ray.direction, t, ray.at(t), tri.normal.normalize_or_zero(), Some(tri.material))
            .with_uv(u * inv_det, v * inv_det),
    )
}

/// Analytic ray-sphere intersection; the near root is preferred.
pub fn intersect_sphere(ray: &Ray, sphere: &Sphere, ray_t: Interval) -> Option<HitRecord> {
    if sphere.radius <= 0.0 {
        return None;
    }
    let oc = ray.origin - sphere.position;
    let a = ray.direction.length_squared();
    let b = oc.dot(ray.direction);
    let c = oc.length_squared() - sphere.radius * sphere.radius;

    let discriminant = b * b - a * c;
    if discriminant <= 0.0 || a == 0.0 {
        return None;
    }
    let sqrtd = discriminant.sqrt();

    let near = (-b - sqrtd) / a;
    let far = (-b + sqrtd) / a;
    let t = if ray_t.surrounds(near) {
        near
    } else if ray_t.surrounds(far) {
        far
    } else {
        return None;
    };

    let point = ray.at(t);
    let normal = (point - sphere.position) / sphere.radius;
    Some(HitRecord::new(ray.direction, t, point, normal, Some(sphere.material)))
}

/// Ray against a parallelogram patch `position + a*u + b*v`.
///
/// Returns `(t, point, a, b)` with `a, b` in `[0, 1]`.
fn intersect_patch(
    ray: &Ray,
    position: Vec3,
    u: Vec3,
    v: Vec3,
    normal: Vec3,
    ray_t: Interval,
) -> Option<(f32, Vec3, f32, f32)> {
    let n_dot_d = ray.direction.dot(normal);
    if n_dot_d.abs() < PLANE_PARALLEL_EPSILON {
        return None;
    }

    let t = (position - ray.origin).dot(normal) / n_dot_d;
    if !ray_t.surrounds(t) {
        return None;
    }

    let basis = Mat3::from_cols(u, v, u.cross(v));
    if basis.determinant().abs() < f32::MIN_POSITIVE {
        return None;
    }
    let point = ray.at(t);
    let local = basis.inverse() * (point - position);

    if (0.0..=1.0).contains(&local.x) && (0.0..=1.0).contains(&local.y) {
        Some((t, point, local.x, local.y))
    } else {
        None
    }
}

/// Ray against a bounded plane patch.
pub fn intersect_plane(ray: &Ray, plane: &Plane, ray_t: Interval) -> Option<HitRecord> {
    let normal = plane.normal.normalize_or_zero();
    let (t, point, a, b) = intersect_patch(ray, plane.position, plane.u, plane.v, normal, ray_t)?;
    Some(HitRecord::new(ray.direction, t, point, normal, Some(plane.material)).with_uv(a, b))
}

/// Ray against an area light. The record carries no material.
pub fn intersect_area_light(ray: &Ray, light: &AreaLight, ray_t: Interval) -> Option<HitRecord> {
    let normal = light.normal();
    let (t, point, a, b) = intersect_patch(ray, light.position, light.u, light.v, normal, ray_t)?;
    Some(HitRecord::new(ray.direction, t, point, normal, None).with_uv(a, b))
}

/// Nearest area light along the ray, as `(t, radiance)`.
pub fn closest_area_light(lights: &[AreaLight], ray: &Ray, ray_t: Interval) -> Option<(f32, Color)> {
    let mut closest: Option<(f32, Color)> = None;
    let mut range = ray_t;
    for light in lights {
        if let Some(rec) = intersect_area_light(ray, light, range) {
            range = range.with_max(rec.t);
            closest = Some((rec.t, light.radiance));
        }
    }
    closest
}

/// Linear search over every primitive in the scene.
///
/// Reference for the KD-tree: primitives are visited spheres, triangles,
/// then planes, and a later hit replaces the current one only when
/// strictly closer.
pub fn closest_hit_brute_force(scene: &Scene, ray: &Ray, ray_t: Interval) -> Option<HitRecord> {
    if ray.is_degenerate() {
        return None;
    }
    let mut closest: Option<HitRecord> = None;
    let mut range = ray_t;

    let mut consider = |hit: Option<HitRecord>, range: &mut Interval| {
        if let Some(rec) = hit {
            *range = range.with_max(rec.t);
            closest = Some(rec);
        }
    };

    for s in &scene.spheres {
        let hit = intersect_sphere(ray, s, range);
        consider(hit, &mut range);
    }
    for t in &scene.triangles {
        let hit = intersect_triangle(ray, t, range);
        consider(hit, &mut range);
    }
    for p in &scene.planes {
        let hit = intersect_plane(ray, p, range);
        consider(hit, &mut range);
    }
    closest
}
