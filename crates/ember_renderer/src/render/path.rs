//! Monte-Carlo path tracing with area lights.

use ember_core::{AreaLight, Color};
use ember_math::{Interval, Ray};
use rand::RngCore;

use super::parallel::PixelRenderer;
use crate::camera::RayCamera;
use crate::intersect::closest_area_light;
use crate::kdtree::KdTree;
use crate::sampling::gen_f32;
use crate::shading::{ScatterShader, ShaderTable};

/// Scatter events with a smaller pdf end the path.
const MIN_PDF: f32 = 1e-6;

pub(crate) struct PathTracer<'a> {
    pub tree: &'a KdTree<'a>,
    pub shaders: &'a ShaderTable,
    pub camera: &'a RayCamera,
    pub area_lights: &'a [AreaLight],
    /// Returned once a path reaches `max_depth`
    pub ambient: Color,
    pub background: Color,
    pub samples_per_pixel: u32,
    pub max_depth: u32,
    pub ray_epsilon: f32,
    pub width: u32,
    pub height: u32,
}

impl PathTracer<'_> {
    /// Radiance along `ray`.
    ///
    /// Iterative form of the recursion
    /// `L = emitted + attenuation * L_next * |cos| / pdf`, where a path that
    /// reaches `max_depth` returns the ambient term, an area light closer
    /// than any surface returns its radiance and a miss returns the
    /// background.
    pub fn trace(&self, ray: Ray, rng: &mut dyn RngCore) -> Color {
        let mut ray = ray;
        let mut throughput = Color::ONE;
        let mut radiance = Color::ZERO;
        let ray_t = Interval::from_min(self.ray_epsilon);

        for _ in 0..self.max_depth {
            let hit = self.tree.closest_hit(&ray, ray_t);
            let light = closest_area_light(self.area_lights, &ray, ray_t);

            let rec = match (hit, light) {
                (Some(rec), Some((light_t, _))) if rec.t < light_t => rec,
                (Some(rec), None) => rec,
                (_, Some((_, emitted))) => return radiance + throughput * emitted,
                (None, None) => return radiance + throughput * self.background,
            };

            let shader = self.shaders.get(rec.material);
            let scattered = shader.scatter(&ray, rec.point, rec.normal, rng);
            radiance += throughput * scattered.emitted;

            if scattered.pdf.is_nan() || scattered.pdf <= MIN_PDF {
                return radiance;
            }
            let cos = scattered.ray.direction.dot(rec.normal).abs();
            throughput *= scattered.attenuation * cos / scattered.pdf;
            if throughput == Color::ZERO || !throughput.is_finite() {
                return radiance;
            }
            ray = scattered.ray;
        }

        radiance + throughput * self.ambient
    }
}

impl PixelRenderer for PathTracer<'_> {
    fn render_pixel(&self, x: u32, y: u32, rng: &mut dyn RngCore) -> Color {
        let mut sum = Color::ZERO;
        for _ in 0..self.samples_per_pixel {
            let s = (x as f32 + gen_f32(rng)) / self.width as f32;
            let t = (y as f32 + gen_f32(rng)) / self.height as f32;
            let ray = self.camera.shoot_with_lens(s, t, rng);
            sum += self.trace(ray, rng);
        }
        sum / self.samples_per_pixel.max(1) as f32
    }
}
