//! Photon emission and propagation.
//!
//! Photons leave the first point light of the scene, bounce through the
//! KD-tree and are deposited on diffuse surfaces. Each emitted photon
//! deposits at most once. Propagation uses an explicit work stack so a
//! dielectric split never recurses.

use std::f32::consts::PI;

use ember_core::{Color, PointLight, Scene};
use ember_math::{Interval, Onb, Ray, Vec3};
use rand::RngCore;

use crate::config::PhotonConfig;
use crate::kdtree::KdTree;
use crate::photon_map::{Photon, PhotonMap};
use crate::sampling::{cosine_hemisphere, gen_f32};
use crate::shading::{fresnel, reflect, refract, MaterialShader, ShaderTable};

/// Paths with less total power than this are dropped.
const MIN_ENERGY: f32 = 1e-6;
/// Diffuse hits below this power are never stored.
const MIN_STORE_ENERGY: f32 = 1e-5;
/// Reference energy for the storage probability.
const STORE_REFERENCE: f32 = 1e-3;
/// Offset applied to continuation origins.
const SURFACE_OFFSET: f32 = 0.001;

/// Counters gathered while tracing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EmissionStats {
    pub emitted: u32,
    pub stored: u32,
    /// Path segments that left the scene
    pub escaped: u32,
    /// Path segments ended by the bounce limit, low power or a
    /// back-facing continuation
    pub absorbed: u32,
    pub roulette_terminations: u32,
}

#[derive(Debug, Clone, Copy)]
struct PhotonPath {
    ray: Ray,
    power: Color,
    bounce: u32,
}

/// Traces photons from a point light through an indexed scene.
pub struct PhotonTracer<'a> {
    tree: &'a KdTree<'a>,
    shaders: &'a ShaderTable,
    config: PhotonConfig,
}

impl<'a> PhotonTracer<'a> {
    pub fn new(tree: &'a KdTree<'a>, shaders: &'a ShaderTable, config: PhotonConfig) -> Self {
        Self {
            tree,
            shaders,
            config,
        }
    }

    /// Trace from the first point light of `scene`. A scene without one
    /// yields an empty map.
    pub fn trace_scene(&self, scene: &Scene, rng: &mut dyn RngCore) -> (PhotonMap, EmissionStats) {
        match scene.point_lights.first() {
            Some(light) => self.trace(light, rng),
            None => {
                log::warn!("Photon mapping enabled but the scene has no point light");
                (PhotonMap::new(), EmissionStats::default())
            }
        }
    }

    /// Emit `photon_count` photons from `light` and build the photon map.
    pub fn trace(&self, light: &PointLight, rng: &mut dyn RngCore) -> (PhotonMap, EmissionStats) {
        let mut map = PhotonMap::new();
        let mut stats = EmissionStats::default();
        let count = self.config.photon_count;
        if count == 0 {
            return (map, stats);
        }

        let power = light.intensity * (2.0 * PI) / count as f32;
        let mut stack = Vec::new();

        for id in 0..count {
            let direction = emission_direction(rng);
            stack.push(PhotonPath {
                ray: Ray::new(light.position + direction * SURFACE_OFFSET, direction),
                power,
                bounce: 0,
            });
            stats.emitted += 1;

            let mut stored = false;
            while let Some(path) = stack.pop() {
                self.propagate(path, id, &mut stored, &mut stack, &mut map, &mut stats, rng);
            }
        }

        map.build_index();
        log::info!(
            "Photons: {} emitted, {} stored, {} escaped, {} absorbed, {} roulette",
            stats.emitted,
            stats.stored,
            stats.escaped,
            stats.absorbed,
            stats.roulette_terminations
        );
        (map, stats)
    }

    #[allow(clippy::too_many_arguments)]
    fn propagate(
        &self,
        path: PhotonPath,
        id: u32,
        stored: &mut bool,
        stack: &mut Vec<PhotonPath>,
        map: &mut PhotonMap,
        stats: &mut EmissionStats,
        rng: &mut dyn RngCore,
    ) {
        if path.bounce >= self.config.max_bounces || path.power.element_sum() < MIN_ENERGY {
            stats.absorbed += 1;
            return;
        }

        let ray_t = Interval::from_min(self.config.ray_epsilon);
        let Some(rec) = self.tree.closest_hit(&path.ray, ray_t) else {
            stats.escaped += 1;
            return;
        };

        let dir = path.ray.direction;
        let facing = rec.shading_normal();

        if let MaterialShader::Glass(glass) = self.shaders.get(rec.material) {
            let f = fresnel(dir, rec.normal, glass.ior);

            let reflected = path.power * f;
            if reflected.element_sum() > MIN_ENERGY {
                stack.push(PhotonPath {
                    ray: Ray::new(rec.point + facing * SURFACE_OFFSET, reflect(dir, rec.normal)),
                    power: reflected,
                    bounce: path.bounce + 1,
                });
            }
            if let Some(t) = refract(dir, rec.normal, glass.ior) {
                let transmitted = path.power * (1.0 - f);
                if transmitted.element_sum() > MIN_ENERGY {
                    stack.push(PhotonPath {
                        ray: Ray::new(rec.point - facing * SURFACE_OFFSET, t),
                        power: transmitted,
                        bounce: path.bounce + 1,
                    });
                }
            }
            return;
        }

        // Only materials tagged Lambertian store and bounce; Phong and
        // unknown tags end the path here.
        if !self.shaders.is_diffuse(rec.material) {
            let p_terminate = if path.bounce == 0 { 0.3 } else { 0.9 };
            if gen_f32(rng) < p_terminate {
                stats.roulette_terminations += 1;
            } else {
                stats.absorbed += 1;
            }
            return;
        }

        let energy = path.power.element_sum();
        if path.bounce >= 1 && energy > MIN_STORE_ENERGY && !*stored {
            let p_store = (energy * self.config.store_scale / STORE_REFERENCE).min(1.0);
            if gen_f32(rng) < p_store {
                map.store(Photon {
                    position: rec.point,
                    incident: -dir,
                    power: path.power,
                    bounce: path.bounce,
                    id,
                });
                *stored = true;
                stats.stored += 1;
            }
        }

        let p_terminate = match path.bounce {
            0 => 0.0,
            1 => 0.2,
            _ => 0.8,
        };
        if gen_f32(rng) < p_terminate {
            stats.roulette_terminations += 1;
            return;
        }

        let new_dir = Onb::from_w(facing).local(cosine_hemisphere(rng));
        let cos = new_dir.dot(facing);
        if cos <= 0.0 {
            stats.absorbed += 1;
            return;
        }
        let albedo = self.shaders.reflectance(rec.material);
        let power = path.power * albedo / PI * cos;
        if power.element_sum() < MIN_ENERGY {
            stats.absorbed += 1;
            return;
        }
        stack.push(PhotonPath {
            ray: Ray::new(rec.point + facing * SURFACE_OFFSET, new_dir),
            power,
            bounce: path.bounce + 1,
        });
    }
}

/// Emission direction biased towards -Y, the usual placement of a ceiling
/// light above the scene.
fn emission_direction(rng: &mut dyn RngCore) -> Vec3 {
    let phi = 2.0 * PI * gen_f32(rng);
    let theta = (1.0 - 2.0 * gen_f32(rng)).clamp(-1.0, 1.0).acos() * 0.5;
    let (sin_t, cos_t) = theta.sin_cos();
    Vec3::new(sin_t * phi.cos(), -(sin_t * phi.sin()).abs(), cos_t).normalize()
}
