//! Ember Renderer - CPU ray casting, photon mapping and path tracing.
//!
//! The render entry point is [`render`]: it moves the scene into world
//! space, builds the scene KD-tree, instantiates one shader per material,
//! optionally traces a photon map, then renders row stripes in parallel
//! and returns the pixel buffer together with a [`RenderReport`].

mod bounds;
mod camera;
mod config;
mod error;
mod hit;
mod intersect;
mod kdtree;
mod photon_map;
mod photon_tracer;
mod point_kdtree;
mod render;
mod sampling;
mod shading;

pub use bounds::{plane_bounds, sphere_bounds, triangle_bounds, PLANE_BOUND_EXTENT};
pub use camera::RayCamera;
pub use config::{HemisphereSampling, PathTracerConfig, PhotonConfig, RenderConfig, RenderMode};
pub use error::{RenderError, RenderResult};
pub use hit::HitRecord;
pub use intersect::{
    closest_area_light, closest_hit_brute_force, intersect_area_light, intersect_plane,
    intersect_sphere, intersect_triangle,
};
pub use kdtree::{KdNode, KdQueryStats, KdTree, KdTreeConfig, KdTreeStats, NodeId};
pub use photon_map::{EnergyReport, Photon, PhotonMap};
pub use photon_tracer::{EmissionStats, PhotonTracer};
pub use point_kdtree::{PointKdTree, Positioned};
pub use render::{render, PhotonReport, PixelBuffer, RenderOutput, RenderReport, Rgba};
pub use sampling::gen_f32;
pub use shading::{
    fresnel, reflect, refract, DirectShader, Glass, Lambertian, MaterialShader, Phong,
    ScatterShader, Scattered, ShaderTable,
};

/// Re-export math and scene types used throughout the public API
pub use ember_core::Color;
pub use ember_math::{Aabb, Interval, Ray, Vec3};
