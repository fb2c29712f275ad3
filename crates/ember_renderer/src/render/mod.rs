//! Render entry point and drivers.
//!
//! A render runs in three phases. Setup moves the scene to world space,
//! builds the KD-tree and shader table and, for ray casting, traces the
//! photon map. The pixel phase renders interleaved scanline stripes in
//! parallel. Post-processing clamps each pixel and applies gamma 2.

mod buffer;
mod parallel;
mod path;
mod raycast;

pub use buffer::{PixelBuffer, Rgba};

use std::fmt;
use std::time::{Duration, Instant};

use ember_core::Scene;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::camera::RayCamera;
use crate::config::{RenderConfig, RenderMode};
use crate::error::{RenderError, RenderResult};
use crate::kdtree::{KdQueryStats, KdTree, KdTreeStats};
use crate::photon_map::{EnergyReport, PhotonMap};
use crate::photon_tracer::{EmissionStats, PhotonTracer};
use crate::shading::ShaderTable;
use buffer::post_process;
use parallel::render_stripes;
use path::PathTracer;
use raycast::RayCaster;

/// Mixed into the render seed for the photon pass.
const PHOTON_SEED_SALT: u64 = 0x5048_4f54_4f4e_5321;

/// Photon pass summary.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhotonReport {
    pub emission: EmissionStats,
    pub energy: EnergyReport,
    pub indexed: bool,
}

/// What a render did, for logging by the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderReport {
    pub mode: RenderMode,
    pub width: u32,
    pub height: u32,
    pub samples_per_pixel: u32,
    /// Whether this render moved the scene into world space
    pub transformed: bool,
    pub setup_time: Duration,
    pub elapsed: Duration,
    pub kd_tree: KdTreeStats,
    /// Tree traversal work, photon tracing included
    pub kd_queries: KdQueryStats,
    pub photons: Option<PhotonReport>,
}

impl fmt::Display for RenderReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} render {}x{} @ {} spp in {:.2?} (setup {:.2?})",
            self.mode,
            self.width,
            self.height,
            self.samples_per_pixel,
            self.elapsed,
            self.setup_time
        )?;
        write!(
            f,
            "kd-tree: {} nodes, {} leaves, depth {}, {} refs for {} primitives",
            self.kd_tree.nodes,
            self.kd_tree.leaves,
            self.kd_tree.depth,
            self.kd_tree.primitive_refs,
            self.kd_tree.primitives
        )?;
        write!(
            f,
            "\nkd queries: {} rays ({} early outs), {} nodes visited, {} box tests, \
             {} triangle / {} sphere / {} plane tests",
            self.kd_queries.rays,
            self.kd_queries.early_outs,
            self.kd_queries.nodes_visited,
            self.kd_queries.aabb_tests,
            self.kd_queries.triangle_tests,
            self.kd_queries.sphere_tests,
            self.kd_queries.plane_tests
        )?;
        if let Some(p) = &self.photons {
            write!(
                f,
                "\nphotons: {} emitted, {} stored, energy retained {:.1}%",
                p.emission.emitted,
                p.emission.stored,
                p.energy.ratio * 100.0
            )?;
        }
        Ok(())
    }
}

/// Finished image plus its report.
#[derive(Debug, Clone)]
pub struct RenderOutput {
    pub pixels: PixelBuffer,
    pub report: RenderReport,
}

/// Render `scene` with `config`.
///
/// The scene is moved into world space on first use; later renders of
/// the same scene skip that step.
pub fn render(scene: &mut Scene, config: &RenderConfig) -> RenderResult<RenderOutput> {
    config.validate()?;
    let width = scene.options.width;
    let height = scene.options.height;
    if width == 0 || height == 0 {
        return Err(RenderError::InvalidConfig(format!(
            "image size {width}x{height} has no pixels"
        )));
    }

    let start = Instant::now();
    let transformed = scene.apply_world_transform()?;
    let scene: &Scene = scene;

    log::info!(
        "Rendering '{}' {}x{} ({} mode): {}",
        scene.name,
        width,
        height,
        config.mode,
        scene.summary()
    );

    let tree = KdTree::build(scene, config.kd_tree);
    let shaders = ShaderTable::new(&scene.materials, config.path.sampling);
    let camera = RayCamera::new(&scene.camera);

    let (pixels, samples_per_pixel, photons, setup_time) = match config.mode {
        RenderMode::RayCast => {
            let light = scene.point_lights.first();
            if light.is_none() {
                log::warn!("No point light in scene, direct lighting disabled");
            }

            let mut map = PhotonMap::new();
            let mut photon_report = None;
            if config.photon.enabled {
                let tracer = PhotonTracer::new(&tree, &shaders, config.photon);
                let mut rng = StdRng::seed_from_u64(config.seed ^ PHOTON_SEED_SALT);
                let (traced, emission) = tracer.trace_scene(scene, &mut rng);
                if let Some(light) = light {
                    let energy = traced.energy_report(light.intensity);
                    log::info!(
                        "Photon energy: emitted {:.3}, stored {:.3}, retained {:.1}%",
                        energy.emitted.element_sum(),
                        energy.stored.element_sum(),
                        energy.ratio * 100.0
                    );
                    if !energy.is_plausible() {
                        log::debug!("Photon energy retention outside the usual 30-70% band");
                    }
                    photon_report = Some(PhotonReport {
                        emission,
                        energy,
                        indexed: traced.is_indexed(),
                    });
                }
                if traced.is_empty() && light.is_some() {
                    log::warn!("Photon map is empty, rendering direct light only");
                }
                map = traced;
            }

            let setup_time = start.elapsed();
            let caster = RayCaster {
                tree: &tree,
                shaders: &shaders,
                camera: &camera,
                light,
                photons: (!map.is_empty()).then_some(&map),
                config: config.photon,
                background: config.background,
                width,
                height,
            };
            let pixels = render_stripes(&caster, width, height, config.threads, config.seed, post_process)?;
            (pixels, 1, photon_report, setup_time)
        }
        RenderMode::PathTrace => {
            let samples_per_pixel = config
                .path
                .samples_per_pixel
                .unwrap_or(scene.options.samples_per_pixel)
                .max(1);
            let max_depth = config.path.max_depth.unwrap_or(scene.options.depth);
            if scene.area_lights.is_empty() {
                log::warn!("No area lights in scene, path traced image only sees ambient and background");
            }

            let setup_time = start.elapsed();
            let tracer = PathTracer {
                tree: &tree,
                shaders: &shaders,
                camera: &camera,
                area_lights: &scene.area_lights,
                ambient: scene.ambient.constant,
                background: config.background,
                samples_per_pixel,
                max_depth,
                ray_epsilon: config.path.ray_epsilon,
                width,
                height,
            };
            let pixels = render_stripes(&tracer, width, height, config.threads, config.seed, post_process)?;
            (pixels, samples_per_pixel, None, setup_time)
        }
    };

    let report = RenderReport {
        mode: config.mode,
        width,
        height,
        samples_per_pixel,
        transformed,
        setup_time,
        elapsed: start.elapsed(),
        kd_tree: tree.stats(),
        kd_queries: tree.query_stats(),
        photons,
    };
    log::info!("Render finished in {:.2?}", report.elapsed);
    log::info!(
        "KD-tree queries: {} rays, {} nodes visited, {} primitive tests, {} early outs",
        report.kd_queries.rays,
        report.kd_queries.nodes_visited,
        report.kd_queries.primitive_tests(),
        report.kd_queries.early_outs
    );

    Ok(RenderOutput { pixels, report })
}
