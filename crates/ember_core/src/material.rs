//! Materials: a type tag plus an ordered set of uniquely-keyed typed
//! properties.
//!
//! Shaders read properties once at construction time. Missing properties
//! resolve to the shader's documented default rather than failing.

use glam::{Vec3, Vec4};
use serde::{Deserialize, Serialize};

use crate::{Color, SceneError, SceneResult};

/// Well-known property keys.
pub mod keys {
    pub const DIFFUSE_COLOR: &str = "diffuseColor";
    pub const SPECULAR_COLOR: &str = "specularColor";
    pub const SPECULAR_EXPONENT: &str = "specularEx";
    pub const IOR: &str = "ior";
}

/// Index of a material in `Scene::materials`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct MaterialHandle(pub u32);

impl MaterialHandle {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Index of a texture in `Scene::textures`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextureHandle(pub u32);

/// Shading model selector.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MaterialKind {
    Lambertian,
    Phong,
    Glass,
    /// Tag with no dedicated shading model.
    Other(u32),
}

impl MaterialKind {
    /// Map an imported integer tag: 0 Lambertian, 1 Phong, 2 Glass.
    pub fn from_tag(tag: u32) -> Self {
        match tag {
            0 => MaterialKind::Lambertian,
            1 => MaterialKind::Phong,
            2 => MaterialKind::Glass,
            other => MaterialKind::Other(other),
        }
    }

    pub fn tag(self) -> u32 {
        match self {
            MaterialKind::Lambertian => 0,
            MaterialKind::Phong => 1,
            MaterialKind::Glass => 2,
            MaterialKind::Other(tag) => tag,
        }
    }
}

/// A typed material property value.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum PropertyValue {
    Int(i32),
    Float(f32),
    Rgb(Color),
    Rgba(Vec4),
    Vec3(Vec3),
    Vec4(Vec4),
    Texture(TextureHandle),
}

impl PropertyValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            PropertyValue::Int(_) => "int",
            PropertyValue::Float(_) => "float",
            PropertyValue::Rgb(_) => "rgb",
            PropertyValue::Rgba(_) => "rgba",
            PropertyValue::Vec3(_) => "vec3",
            PropertyValue::Vec4(_) => "vec4",
            PropertyValue::Texture(_) => "texture",
        }
    }
}

/// A material definition.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub name: String,
    pub kind: MaterialKind,
    properties: Vec<(String, PropertyValue)>,
}

impl Material {
    /// Create a material with no properties.
    pub fn new(name: impl Into<String>, kind: MaterialKind) -> Self {
        Self {
            name: name.into(),
            kind,
            properties: Vec::new(),
        }
    }

    pub fn lambertian(name: impl Into<String>, diffuse: Color) -> Self {
        Self::new(name, MaterialKind::Lambertian).with(keys::DIFFUSE_COLOR, PropertyValue::Rgb(diffuse))
    }

    pub fn phong(name: impl Into<String>, diffuse: Color, specular: Color, exponent: f32) -> Self {
        Self::new(name, MaterialKind::Phong)
            .with(keys::DIFFUSE_COLOR, PropertyValue::Rgb(diffuse))
            .with(keys::SPECULAR_COLOR, PropertyValue::Rgb(specular))
            .with(keys::SPECULAR_EXPONENT, PropertyValue::Float(exponent))
    }

    pub fn glass(name: impl Into<String>, specular: Color, ior: f32) -> Self {
        Self::new(name, MaterialKind::Glass)
            .with(keys::SPECULAR_COLOR, PropertyValue::Rgb(specular))
            .with(keys::IOR, PropertyValue::Float(ior))
    }

    /// Builder form of [`Material::set_property`].
    pub fn with(mut self, key: &str, value: PropertyValue) -> Self {
        self.set_property(key, value);
        self
    }

    /// Register a new property. Fails if `key` is already present.
    pub fn register_property(&mut self, key: &str, value: PropertyValue) -> SceneResult<()> {
        if self.has_property(key) {
            return Err(SceneError::DuplicateProperty(key.to_string()));
        }
        self.properties.push((key.to_string(), value));
        Ok(())
    }

    /// Insert or replace a property, keeping its original position.
    pub fn set_property(&mut self, key: &str, value: PropertyValue) {
        match self.properties.iter_mut().find(|(k, _)| k == key) {
            Some((_, slot)) => *slot = value,
            None => self.properties.push((key.to_string(), value)),
        }
    }

    pub fn has_property(&self, key: &str) -> bool {
        self.properties.iter().any(|(k, _)| k == key)
    }

    pub fn property(&self, key: &str) -> Option<&PropertyValue> {
        self.properties.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Remove a property, returning its value.
    pub fn remove_property(&mut self, key: &str) -> Option<PropertyValue> {
        let idx = self.properties.iter().position(|(k, _)| k == key)?;
        Some(self.properties.remove(idx).1)
    }

    pub fn property_count(&self) -> usize {
        self.properties.len()
    }

    /// Properties in registration order.
    pub fn properties(&self) -> impl Iterator<Item = (&str, &PropertyValue)> {
        self.properties.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn try_float(&self, key: &str) -> SceneResult<Option<f32>> {
        self.typed(key, "float", |v| match v {
            PropertyValue::Float(f) => Some(*f),
            PropertyValue::Int(i) => Some(*i as f32),
            _ => None,
        })
    }

    /// RGB lookup; RGBA values drop their alpha.
    pub fn try_rgb(&self, key: &str) -> SceneResult<Option<Color>> {
        self.typed(key, "rgb", |v| match v {
            PropertyValue::Rgb(c) => Some(*c),
            PropertyValue::Rgba(c) => Some(c.truncate()),
            _ => None,
        })
    }

    /// Float property or `default` when missing or mistyped.
    pub fn float_or(&self, key: &str, default: f32) -> f32 {
        self.or_default(self.try_float(key), default)
    }

    /// RGB property or `default` when missing or mistyped.
    pub fn rgb_or(&self, key: &str, default: Color) -> Color {
        self.or_default(self.try_rgb(key), default)
    }

    fn typed<T>(
        &self,
        key: &str,
        expected: &'static str,
        extract: impl Fn(&PropertyValue) -> Option<T>,
    ) -> SceneResult<Option<T>> {
        match self.property(key) {
            None => Ok(None),
            Some(value) => extract(value).map(Some).ok_or_else(|| SceneError::PropertyType {
                key: key.to_string(),
                expected,
                found: value.type_name(),
            }),
        }
    }

    fn or_default<T>(&self, lookup: SceneResult<Option<T>>, default: T) -> T {
        match lookup {
            Ok(value) => value.unwrap_or(default),
            Err(e) => {
                log::warn!("material '{}': {}, using default", self.name, e);
                default
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_rejects_duplicates() {
        let mut material = Material::new("m", MaterialKind::Lambertian);
        assert!(material.register_property("ior", PropertyValue::Float(1.3)).is_ok());
        let err = material
            .register_property("ior", PropertyValue::Float(2.0))
            .unwrap_err();
        assert_eq!(err, SceneError::DuplicateProperty("ior".into()));
        assert_eq!(material.float_or("ior", 1.5), 1.3);
        assert_eq!(material.property_count(), 1);
    }

    #[test]
    fn test_missing_property_uses_default() {
        let material = Material::new("m", MaterialKind::Glass);
        assert_eq!(material.float_or(keys::IOR, 1.5), 1.5);
        assert_eq!(material.rgb_or(keys::SPECULAR_COLOR, Color::ONE), Color::ONE);
        assert_eq!(material.try_rgb(keys::DIFFUSE_COLOR), Ok(None));
    }

    #[test]
    fn test_mistyped_property() {
        let material = Material::new("m", MaterialKind::Phong)
            .with(keys::DIFFUSE_COLOR, PropertyValue::Float(0.5));

        assert!(matches!(
            material.try_rgb(keys::DIFFUSE_COLOR),
            Err(SceneError::PropertyType { expected: "rgb", found: "float", .. })
        ));
        assert_eq!(material.rgb_or(keys::DIFFUSE_COLOR, Color::ONE), Color::ONE);
    }

    #[test]
    fn test_properties_keep_order() {
        let mut material = Material::phong("p", Color::ONE, Color::splat(0.5), 32.0);
        material.set_property(keys::DIFFUSE_COLOR, PropertyValue::Rgb(Color::ZERO));

        let order: Vec<&str> = material.properties().map(|(k, _)| k).collect();
        assert_eq!(order, vec![keys::DIFFUSE_COLOR, keys::SPECULAR_COLOR, keys::SPECULAR_EXPONENT]);
        assert_eq!(material.rgb_or(keys::DIFFUSE_COLOR, Color::ONE), Color::ZERO);

        assert_eq!(material.remove_property(keys::SPECULAR_COLOR), Some(PropertyValue::Rgb(Color::splat(0.5))));
        assert!(!material.has_property(keys::SPECULAR_COLOR));
    }

    #[test]
    fn test_rgba_reads_as_rgb() {
        let material = Material::new("m", MaterialKind::Lambertian)
            .with(keys::DIFFUSE_COLOR, PropertyValue::Rgba(Vec4::new(0.1, 0.2, 0.3, 0.5)));
        assert_eq!(material.try_rgb(keys::DIFFUSE_COLOR), Ok(Some(Color::new(0.1, 0.2, 0.3))));
    }

    #[test]
    fn test_kind_tags() {
        assert_eq!(MaterialKind::from_tag(0), MaterialKind::Lambertian);
        assert_eq!(MaterialKind::from_tag(1), MaterialKind::Phong);
        assert_eq!(MaterialKind::from_tag(2), MaterialKind::Glass);
        assert_eq!(MaterialKind::from_tag(7), MaterialKind::Other(7));
        assert_eq!(MaterialKind::Other(7).tag(), 7);
    }

    #[test]
    fn test_material_json() {
        let material = Material::glass("glass", Color::ONE, 1.33);
        let json = serde_json::to_string(&material).unwrap();
        let back: Material = serde_json::from_str(&json).unwrap();
        assert_eq!(back.float_or(keys::IOR, 1.5), 1.33);
    }
}
