//! Scene container and the one-time local-to-world transform pass.

use std::fmt;

use glam::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::{
    AreaLight, CameraParams, Color, DirectionalLight, Material, MaterialHandle, Plane,
    PointLight, PropertyValue, SceneError, SceneResult, Sphere, SpotLight, Texture, Triangle,
};

/// Output resolution and sampling settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderOptions {
    pub width: u32,
    pub height: u32,
    /// Maximum path depth.
    pub depth: u32,
    pub samples_per_pixel: u32,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            width: 500,
            height: 500,
            depth: 4,
            samples_per_pixel: 16,
        }
    }
}

/// Constant ambient term, returned by the path tracer at max depth.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Ambient {
    pub constant: Color,
}

/// Index of a model in `Scene::models`.
pub type ModelId = usize;

/// Local-to-world placement shared by a group of nodes.
#[derive(Clone, Debug, PartialEq)]
pub struct Model {
    pub name: String,
    pub translation: Vec3,
    pub scale: Vec3,
}

impl Model {
    pub fn new(name: impl Into<String>, translation: Vec3, scale: Vec3) -> Self {
        Self {
            name: name.into(),
            translation,
            scale,
        }
    }

    /// Scale, then translate. Models carry no rotation.
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, Quat::IDENTITY, self.translation)
    }
}

/// Which geometry buffer a node points into.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Sphere,
    Triangle,
    Plane,
}

/// Places one geometry entity under one model.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub entity: usize,
    pub model: ModelId,
}

/// Counts reported when a scene is handed to the renderer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SceneSummary {
    pub spheres: usize,
    pub triangles: usize,
    pub planes: usize,
    pub point_lights: usize,
    pub area_lights: usize,
    pub materials: usize,
    pub nodes: usize,
}

impl fmt::Display for SceneSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} spheres, {} triangles, {} planes, {} point lights, {} area lights, {} materials, {} nodes",
            self.spheres,
            self.triangles,
            self.planes,
            self.point_lights,
            self.area_lights,
            self.materials,
            self.nodes
        )
    }
}

/// A complete scene: geometry buffers, lights, materials and camera.
#[derive(Clone, Debug, Default)]
pub struct Scene {
    pub name: String,
    pub camera: CameraParams,
    pub options: RenderOptions,
    pub ambient: Ambient,

    pub materials: Vec<Material>,
    pub textures: Vec<Texture>,

    pub spheres: Vec<Sphere>,
    pub triangles: Vec<Triangle>,
    pub planes: Vec<Plane>,

    pub point_lights: Vec<PointLight>,
    pub area_lights: Vec<AreaLight>,
    pub directional_lights: Vec<DirectionalLight>,
    pub spot_lights: Vec<SpotLight>,

    pub models: Vec<Model>,
    pub nodes: Vec<Node>,

    world_space: bool,
}

impl Scene {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn add_material(&mut self, material: Material) -> MaterialHandle {
        self.materials.push(material);
        MaterialHandle((self.materials.len() - 1) as u32)
    }

    pub fn material(&self, handle: MaterialHandle) -> Option<&Material> {
        self.materials.get(handle.index())
    }

    pub fn add_model(&mut self, model: Model) -> ModelId {
        self.models.push(model);
        self.models.len() - 1
    }

    /// Add a sphere, optionally placed under `model`. Without a model the
    /// sphere is taken to be in world space already.
    pub fn add_sphere(&mut self, sphere: Sphere, model: Option<ModelId>) -> usize {
        self.spheres.push(sphere);
        let entity = self.spheres.len() - 1;
        self.attach(NodeKind::Sphere, entity, model);
        entity
    }

    pub fn add_triangle(&mut self, triangle: Triangle, model: Option<ModelId>) -> usize {
        self.triangles.push(triangle);
        let entity = self.triangles.len() - 1;
        self.attach(NodeKind::Triangle, entity, model);
        entity
    }

    pub fn add_plane(&mut self, plane: Plane, model: Option<ModelId>) -> usize {
        self.planes.push(plane);
        let entity = self.planes.len() - 1;
        self.attach(NodeKind::Plane, entity, model);
        entity
    }

    fn attach(&mut self, kind: NodeKind, entity: usize, model: Option<ModelId>) {
        if let Some(model) = model {
            self.nodes.push(Node { kind, entity, model });
        }
    }

    /// True once [`Scene::apply_world_transform`] has run.
    pub fn is_world_space(&self) -> bool {
        self.world_space
    }

    pub fn is_empty(&self) -> bool {
        self.spheres.is_empty() && self.triangles.is_empty() && self.planes.is_empty()
    }

    pub fn summary(&self) -> SceneSummary {
        SceneSummary {
            spheres: self.spheres.len(),
            triangles: self.triangles.len(),
            planes: self.planes.len(),
            point_lights: self.point_lights.len(),
            area_lights: self.area_lights.len(),
            materials: self.materials.len(),
            nodes: self.nodes.len(),
        }
    }

    /// Check node, model and texture references without modifying anything.
    pub fn validate(&self) -> SceneResult<()> {
        let mut seen = std::collections::HashSet::new();
        for (i, node) in self.nodes.iter().enumerate() {
            let model = self.models.get(node.model).ok_or(SceneError::MissingModel {
                node: i,
                model: node.model,
            })?;
            if model.scale.cmpeq(Vec3::ZERO).any() {
                return Err(SceneError::DegenerateScale {
                    model: node.model,
                    scale: model.scale,
                });
            }

            let len = match node.kind {
                NodeKind::Sphere => self.spheres.len(),
                NodeKind::Triangle => self.triangles.len(),
                NodeKind::Plane => self.planes.len(),
            };
            if node.entity >= len {
                return Err(SceneError::MissingEntity {
                    node: i,
                    kind: node.kind,
                    entity: node.entity,
                });
            }
            if !seen.insert((node.kind, node.entity)) {
                return Err(SceneError::SharedEntity {
                    kind: node.kind,
                    entity: node.entity,
                });
            }
        }

        for material in &self.materials {
            for (key, value) in material.properties() {
                if let PropertyValue::Texture(handle) = value {
                    if handle.0 as usize >= self.textures.len() {
                        return Err(SceneError::MissingTexture {
                            key: key.to_string(),
                            texture: handle.0,
                        });
                    }
                }
            }
        }
        Ok(())
    }

    /// Move all node geometry from model space into world space.
    ///
    /// Runs at most once per scene: returns `Ok(true)` when geometry was
    /// transformed and `Ok(false)` when the scene is already in world
    /// space. Fails without touching geometry if any node reference is
    /// malformed.
    pub fn apply_world_transform(&mut self) -> SceneResult<bool> {
        if self.world_space {
            return Ok(false);
        }
        self.validate()?;

        for node in &self.nodes {
            let model = &self.models[node.model];
            let matrix = model.to_matrix();
            let normal_matrix = matrix.inverse().transpose();

            match node.kind {
                NodeKind::Sphere => {
                    let sphere = &mut self.spheres[node.entity];
                    sphere.position = matrix.transform_point3(sphere.position);
                    sphere.radius *= model.scale.abs().max_element();
                }
                NodeKind::Triangle => {
                    let tri = &mut self.triangles[node.entity];
                    for v in tri.v.iter_mut() {
                        *v = matrix.transform_point3(*v);
                    }
                    tri.normal = normal_matrix.transform_vector3(tri.normal).normalize_or_zero();
                }
                NodeKind::Plane => {
                    let plane = &mut self.planes[node.entity];
                    plane.position = matrix.transform_point3(plane.position);
                    plane.u = matrix.transform_vector3(plane.u);
                    plane.v = matrix.transform_vector3(plane.v);
                    plane.normal = normal_matrix.transform_vector3(plane.normal).normalize_or_zero();
                }
            }
        }

        log::debug!("Scene '{}': {} nodes moved to world space", self.name, self.nodes.len());
        self.world_space = true;
        Ok(true)
    }
}
