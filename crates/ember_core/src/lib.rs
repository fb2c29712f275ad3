//! Ember Core - scene model consumed by the renderer.
//!
//! This crate provides:
//!
//! - **Geometry buffers**: `Sphere`, `Triangle`, `Plane`
//! - **Lights**: point, area, directional and spot lights
//! - **Materials**: a type tag plus uniquely-keyed typed properties
//! - **Scene**: camera, render options, models/nodes and the one-time
//!   local-to-world transform pass
//!
//! Scene import is handled elsewhere; scenes are built in code here.
//!
//! # Example
//!
//! ```
//! use ember_core::{Material, Scene, Sphere};
//! use glam::Vec3;
//!
//! let mut scene = Scene::new("example");
//! let red = scene.add_material(Material::lambertian("red", Vec3::new(0.8, 0.1, 0.1)));
//! scene.add_sphere(Sphere::new(Vec3::ZERO, 1.0, red), None);
//! assert_eq!(scene.spheres.len(), 1);
//! ```

pub mod camera;
pub mod error;
pub mod geometry;
pub mod light;
pub mod material;
pub mod scene;
pub mod texture;

// Re-export commonly used types
pub use camera::CameraParams;
pub use error::{SceneError, SceneResult};
pub use geometry::{Plane, Sphere, Triangle};
pub use light::{AreaLight, DirectionalLight, PointLight, SpotLight};
pub use material::{
    keys, Material, MaterialHandle, MaterialKind, PropertyValue, TextureHandle,
};
pub use scene::{Ambient, Model, ModelId, Node, NodeKind, RenderOptions, Scene, SceneSummary};
pub use texture::Texture;

/// RGB color with components typically in `[0, 1]`.
pub type Color = glam::Vec3;
