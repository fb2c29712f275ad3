//! Camera ray generation.

use ember_core::CameraParams;
use ember_math::{Ray, Vec3};
use rand::RngCore;

use crate::sampling::random_in_unit_disk;

/// Field of view limits in degrees.
const MIN_FOV: f32 = 20.0;
const MAX_FOV: f32 = 160.0;

/// Thin-lens camera that maps normalized image coordinates to rays.
///
/// `s` runs left to right and `t` bottom to top, both in `[0, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct RayCamera {
    origin: Vec3,
    lower_left: Vec3,
    horizontal: Vec3,
    vertical: Vec3,
    u: Vec3,
    v: Vec3,
    w: Vec3,
    lens_radius: f32,
}

impl RayCamera {
    pub fn new(params: &CameraParams) -> Self {
        let fov = params.fov.clamp(MIN_FOV, MAX_FOV);
        if fov != params.fov {
            log::warn!("camera fov {} clamped to {}", params.fov, fov);
        }

        let half_height = (fov.to_radians() / 2.0).tan();
        let half_width = params.aspect * half_height;
        let focus = params.focus_distance;

        // Camera basis
        let w = (params.position - params.look_at).normalize_or_zero();
        let u = params.up.cross(w).normalize_or_zero();
        let v = w.cross(u);

        let origin = params.position;
        let lower_left = origin - half_width * focus * u - half_height * focus * v - focus * w;

        Self {
            origin,
            lower_left,
            horizontal: 2.0 * half_width * focus * u,
            vertical: 2.0 * half_height * focus * v,
            u,
            v,
            w,
            lens_radius: params.aperture.max(0.0) / 2.0,
        }
    }

    pub fn origin(&self) -> Vec3 {
        self.origin
    }

    /// Viewing direction (towards the look-at point).
    pub fn forward(&self) -> Vec3 {
        -self.w
    }

    pub fn lens_radius(&self) -> f32 {
        self.lens_radius
    }

    /// Pinhole ray through image point `(s, t)`.
    pub fn shoot(&self, s: f32, t: f32) -> Ray {
        Ray::new(self.origin, self.image_point(s, t) - self.origin)
    }

    /// Ray with its origin jittered over the lens disk. Equivalent to
    /// [`RayCamera::shoot`] when the aperture is zero.
    pub fn shoot_with_lens(&self, s: f32, t: f32, rng: &mut dyn RngCore) -> Ray {
        if self.lens_radius <= 0.0 {
            return self.shoot(s, t);
        }
        let rd = self.lens_radius * random_in_unit_disk(rng);
        let offset = self.u * rd.x + self.v * rd.y;
        let origin = self.origin + offset;
        Ray::new(origin, self.image_point(s, t) - origin)
    }

    #[inline]
    fn image_point(&self, s: f32, t: f32) -> Vec3 {
        self.lower_left + s * self.horizontal + t * self.vertical
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_centre_ray_looks_at_target() {
        let params = CameraParams::default()
            .with_position(Vec3::new(1.0, 2.0, -5.0), Vec3::new(0.0, 0.5, 0.0), Vec3::Y);
        let cam = RayCamera::new(&params);
        let ray = cam.shoot(0.5, 0.5);
        let expected = (params.look_at - params.position).normalize();
        assert!((ray.direction - expected).length() < 1e-5);
        assert_eq!(ray.origin, params.position);
    }

    #[test]
    fn test_image_orientation() {
        let cam = RayCamera::new(&CameraParams::default());
        // Default camera sits on -Z looking at +Z with +Y up.
        assert!(cam.shoot(0.5, 1.0).direction.y > 0.0);
        assert!(cam.shoot(0.5, 0.0).direction.y < 0.0);
        let left = cam.shoot(0.0, 0.5).direction.x;
        let right = cam.shoot(1.0, 0.5).direction.x;
        assert!(left * right < 0.0);
    }

    #[test]
    fn test_fov_is_clamped() {
        let narrow = RayCamera::new(&CameraParams::default().with_lens(1.0, 0.0, 1.0));
        let min = RayCamera::new(&CameraParams::default().with_lens(20.0, 0.0, 1.0));
        let a = narrow.shoot(0.5, 1.0).direction;
        let b = min.shoot(0.5, 1.0).direction;
        assert!((a - b).length() < 1e-6);

        // Top edge of a 20 degree view is 10 degrees above the axis.
        let angle = a.dot(narrow.forward()).acos().to_degrees();
        assert!((angle - 10.0).abs() < 1e-3);
    }

    #[test]
    fn test_lens_rays_converge_on_focus_plane() {
        let mut rng = StdRng::seed_from_u64(9);
        let params = CameraParams::default().with_lens(40.0, 0.5, 3.0);
        let cam = RayCamera::new(&params);
        let pinhole = cam.shoot(0.3, 0.6);
        // The image plane sits at the focus distance along the view axis.
        let focus_point = pinhole.at(3.0 / pinhole.direction.dot(cam.forward()));

        for _ in 0..20 {
            let ray = cam.shoot_with_lens(0.3, 0.6, &mut rng);
            assert!((ray.origin - params.position).length() <= 0.25 + 1e-5);
            let t = (focus_point - ray.origin).dot(ray.direction);
            assert!((ray.at(t) - focus_point).length() < 1e-3);
        }
    }
}
