//! Ray casting with direct point light and photon-map indirect light.

use ember_core::{Color, PointLight};
use ember_math::{Interval, Ray};
use rand::RngCore;

use super::parallel::PixelRenderer;
use crate::camera::RayCamera;
use crate::config::PhotonConfig;
use crate::hit::HitRecord;
use crate::kdtree::KdTree;
use crate::photon_map::PhotonMap;
use crate::shading::{DirectShader, ShaderTable};

/// Shadow ray origins are pushed this far off the surface.
const SHADOW_OFFSET: f32 = 0.001;

pub(crate) struct RayCaster<'a> {
    pub tree: &'a KdTree<'a>,
    pub shaders: &'a ShaderTable,
    pub camera: &'a RayCamera,
    pub light: Option<&'a PointLight>,
    /// `None` when photon mapping is off or nothing was stored
    pub photons: Option<&'a PhotonMap>,
    pub config: PhotonConfig,
    pub background: Color,
    pub width: u32,
    pub height: u32,
}

impl RayCaster<'_> {
    fn direct(&self, light: &PointLight, ray: &Ray, rec: &HitRecord) -> Color {
        let n = rec.shading_normal();
        let to_light = light.position - rec.point;
        let distance = to_light.length();
        if distance <= 0.0 {
            return Color::ZERO;
        }
        let l = to_light / distance;
        if l.dot(n) <= 0.0 {
            return Color::ZERO;
        }

        let shadow_ray = Ray::new(rec.point + n * SHADOW_OFFSET, l);
        let shadow_t = Interval::new(self.config.ray_epsilon, distance);
        let visibility = if self.tree.occluded(&shadow_ray, shadow_t) {
            self.config.shadow_factor
        } else {
            1.0
        };

        let shader = self.shaders.get(rec.material);
        shader.shade(-ray.direction, l, n) * light.intensity * visibility
    }

    fn indirect(&self, map: &PhotonMap, rec: &HitRecord) -> Color {
        let albedo = self.shaders.reflectance(rec.material);
        let estimate = map.estimate_radiance_adaptive(
            rec.point,
            rec.shading_normal(),
            self.config.k_nearest,
            self.config.min_radius,
            albedo,
        );
        estimate * self.config.indirect_scale
    }
}

impl PixelRenderer for RayCaster<'_> {
    fn render_pixel(&self, x: u32, y: u32, _rng: &mut dyn RngCore) -> Color {
        let s = x as f32 / self.width as f32;
        let t = y as f32 / self.height as f32;
        let ray = self.camera.shoot(s, t);

        let Some(rec) = self
            .tree
            .closest_hit(&ray, Interval::from_min(self.config.ray_epsilon))
        else {
            return self.background;
        };

        let direct = self
            .light
            .map_or(Color::ZERO, |light| self.direct(light, &ray, &rec));
        let indirect = self
            .photons
            .map_or(Color::ZERO, |map| self.indirect(map, &rec));
        direct + indirect
    }
}
