//! Shading dispatch.
//!
//! Each material gets one [`MaterialShader`], chosen by its type tag.
//! Shaders speak two protocols: [`DirectShader`] evaluates the BRDF times
//! the cosine term for a known light direction (ray casting), and
//! [`ScatterShader`] samples a continuation ray together with its BRDF
//! value and pdf (path tracing). The integrator combines the scatter
//! result as `emitted + attenuation * L_in * cos / pdf`.

mod glass;
mod lambertian;
mod phong;

pub use glass::Glass;
pub use lambertian::Lambertian;
pub use phong::Phong;

use ember_core::{keys, Color, Material, MaterialHandle, MaterialKind};
use ember_math::{Ray, Vec3};
use rand::RngCore;

use crate::config::HemisphereSampling;

/// Albedo assumed by the photon tracer when a material has none.
pub const DEFAULT_PHOTON_ALBEDO: Color = Color::splat(0.7);

/// Result of sampling a scattering event.
///
/// `emitted` is meaningful even when `pdf` or `attenuation` is degenerate;
/// the integrator then adds only the emission.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scattered {
    pub ray: Ray,
    pub attenuation: Color,
    pub emitted: Color,
    pub pdf: f32,
}

/// BRDF evaluation for a known light direction.
pub trait DirectShader {
    /// `incoming` points towards the viewer, `outgoing` towards the light,
    /// `normal` is the unit surface normal facing the viewer.
    fn shade(&self, incoming: Vec3, outgoing: Vec3, normal: Vec3) -> Color;
}

/// Sampled scattering for the path tracer.
pub trait ScatterShader {
    /// `normal` is the geometric unit normal; shaders orient it themselves.
    fn scatter(&self, ray: &Ray, hit_point: Vec3, normal: Vec3, rng: &mut dyn RngCore) -> Scattered;
}

/// The closed set of shading models.
#[derive(Debug, Clone, PartialEq)]
pub enum MaterialShader {
    Lambertian(Lambertian),
    Phong(Phong),
    Glass(Glass),
}

impl MaterialShader {
    /// Pick the shading model for a material. Unknown tags shade as
    /// Lambertian.
    pub fn from_material(material: &Material, sampling: HemisphereSampling) -> Self {
        match material.kind {
            MaterialKind::Phong => MaterialShader::Phong(Phong::from_material(material)),
            MaterialKind::Glass => MaterialShader::Glass(Glass::from_material(material)),
            MaterialKind::Lambertian => {
                MaterialShader::Lambertian(Lambertian::from_material(material, sampling))
            }
            MaterialKind::Other(tag) => {
                log::warn!(
                    "material '{}': unknown type tag {}, shading as Lambertian",
                    material.name,
                    tag
                );
                MaterialShader::Lambertian(Lambertian::from_material(material, sampling))
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            MaterialShader::Lambertian(_) => "lambertian",
            MaterialShader::Phong(_) => "phong",
            MaterialShader::Glass(_) => "glass",
        }
    }
}

impl DirectShader for MaterialShader {
    fn shade(&self, incoming: Vec3, outgoing: Vec3, normal: Vec3) -> Color {
        match self {
            MaterialShader::Lambertian(s) => s.shade(incoming, outgoing, normal),
            MaterialShader::Phong(s) => s.shade(incoming, outgoing, normal),
            MaterialShader::Glass(s) => s.shade(incoming, outgoing, normal),
        }
    }
}

impl ScatterShader for MaterialShader {
    fn scatter(&self, ray: &Ray, hit_point: Vec3, normal: Vec3, rng: &mut dyn RngCore) -> Scattered {
        match self {
            MaterialShader::Lambertian(s) => s.scatter(ray, hit_point, normal, rng),
            MaterialShader::Phong(s) => s.scatter(ray, hit_point, normal, rng),
            MaterialShader::Glass(s) => s.scatter(ray, hit_point, normal, rng),
        }
    }
}

/// Per-material shaders plus the photon albedo of each material.
#[derive(Debug, Clone)]
pub struct ShaderTable {
    shaders: Vec<MaterialShader>,
    reflectance: Vec<Color>,
    kinds: Vec<MaterialKind>,
    fallback: MaterialShader,
}

impl ShaderTable {
    pub fn new(materials: &[Material], sampling: HemisphereSampling) -> Self {
        let shaders = materials
            .iter()
            .map(|m| {
                let shader = MaterialShader::from_material(m, sampling);
                log::debug!("material '{}': {} shader", m.name, shader.name());
                shader
            })
            .collect();
        let reflectance = materials
            .iter()
            .map(|m| match m.kind {
                MaterialKind::Lambertian | MaterialKind::Phong => {
                    m.rgb_or(keys::DIFFUSE_COLOR, DEFAULT_PHOTON_ALBEDO)
                }
                _ => DEFAULT_PHOTON_ALBEDO,
            })
            .collect();
        Self {
            shaders,
            reflectance,
            kinds: materials.iter().map(|m| m.kind).collect(),
            fallback: MaterialShader::Lambertian(Lambertian::new(Color::ONE, sampling)),
        }
    }

    pub fn len(&self) -> usize {
        self.shaders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shaders.is_empty()
    }

    /// Shader for a hit. Missing or out-of-range handles get a white
    /// Lambertian.
    pub fn get(&self, handle: Option<MaterialHandle>) -> &MaterialShader {
        handle
            .and_then(|h| self.shaders.get(h.index()))
            .unwrap_or(&self.fallback)
    }

    /// Diffuse reflectance used by the photon tracer and the photon
    /// radiance estimate.
    pub fn reflectance(&self, handle: Option<MaterialHandle>) -> Color {
        handle
            .and_then(|h| self.reflectance.get(h.index()).copied())
            .unwrap_or(DEFAULT_PHOTON_ALBEDO)
    }

    /// True only for materials tagged Lambertian. Unknown tags shade as
    /// Lambertian but are not diffuse for photon transport.
    pub fn is_diffuse(&self, handle: Option<MaterialHandle>) -> bool {
        handle
            .and_then(|h| self.kinds.get(h.index()))
            .is_some_and(|kind| *kind == MaterialKind::Lambertian)
    }
}

// =============================================================================
// Optics helpers
// =============================================================================

/// Mirror `v` about the plane with unit normal `n`.
#[inline]
pub fn reflect(v: Vec3, n: Vec3) -> Vec3 {
    v - 2.0 * v.dot(n) * n
}

/// Refract unit direction `incident` through a surface with outward unit
/// normal `normal` into a medium of index `ior` (outside is 1.0).
///
/// Works from either side. Returns `None` on total internal reflection.
pub fn refract(incident: Vec3, normal: Vec3, ior: f32) -> Option<Vec3> {
    let mut cos_i = incident.dot(normal).clamp(-1.0, 1.0);
    let (mut eta_i, mut eta_t) = (1.0, ior);
    let mut n = normal;
    if cos_i < 0.0 {
        cos_i = -cos_i;
    } else {
        std::mem::swap(&mut eta_i, &mut eta_t);
        n = -normal;
    }

    let eta = eta_i / eta_t;
    let k = 1.0 - eta * eta * (1.0 - cos_i * cos_i);
    if k < 0.0 {
        return None;
    }
    Some(eta * incident + (eta * cos_i - k.sqrt()) * n)
}

/// Unpolarised Fresnel reflectance for `incident` hitting a surface with
/// outward unit normal `normal`. Returns 1 under total internal reflection.
pub fn fresnel(incident: Vec3, normal: Vec3, ior: f32) -> f32 {
    let cos_i = incident.dot(normal).clamp(-1.0, 1.0);
    let (mut eta_i, mut eta_t) = (1.0_f32, ior);
    if cos_i > 0.0 {
        std::mem::swap(&mut eta_i, &mut eta_t);
    }

    let sin_t = eta_i / eta_t * (1.0 - cos_i * cos_i).max(0.0).sqrt();
    if sin_t >= 1.0 {
        return 1.0;
    }
    let cos_t = (1.0 - sin_t * sin_t).max(0.0).sqrt();
    let cos_i = cos_i.abs();
    let rs = (eta_t * cos_i - eta_i * cos_t) / (eta_t * cos_i + eta_i * cos_t);
    let rp = (eta_i * cos_i - eta_t * cos_t) / (eta_i * cos_i + eta_t * cos_t);
    (rs * rs + rp * rp) / 2.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use ember_core::PropertyValue;

    #[test]
    fn test_factory_maps_tags() {
        let sampling = HemisphereSampling::Cosine;
        let lam = Material::lambertian("l", Color::ONE);
        let pho = Material::phong("p", Color::ONE, Color::ONE, 8.0);
        let gla = Material::glass("g", Color::ONE, 1.5);
        let odd = Material::new("o", MaterialKind::from_tag(9));

        assert_eq!(MaterialShader::from_material(&lam, sampling).name(), "lambertian");
        assert_eq!(MaterialShader::from_material(&pho, sampling).name(), "phong");
        assert_eq!(MaterialShader::from_material(&gla, sampling).name(), "glass");
        assert_eq!(MaterialShader::from_material(&odd, sampling).name(), "lambertian");
    }

    #[test]
    fn test_table_fallbacks() {
        let materials = vec![
            Material::lambertian("red", Color::new(0.8, 0.1, 0.1)),
            Material::glass("glass", Color::ONE, 1.5),
            Material::new("bare", MaterialKind::Lambertian),
        ];
        let table = ShaderTable::new(&materials, HemisphereSampling::Cosine);
        assert_eq!(table.len(), 3);

        assert_eq!(table.get(None).name(), "lambertian");
        assert_eq!(table.get(Some(MaterialHandle(99))).name(), "lambertian");
        assert!(matches!(table.get(Some(MaterialHandle(1))), MaterialShader::Glass(_)));

        assert_eq!(table.reflectance(Some(MaterialHandle(0))), Color::new(0.8, 0.1, 0.1));
        assert_eq!(table.reflectance(Some(MaterialHandle(1))), DEFAULT_PHOTON_ALBEDO);
        assert_eq!(table.reflectance(Some(MaterialHandle(2))), DEFAULT_PHOTON_ALBEDO);
        assert_eq!(table.reflectance(None), DEFAULT_PHOTON_ALBEDO);
    }

    #[test]
    fn test_only_lambertian_tag_is_diffuse() {
        let materials = vec![
            Material::lambertian("white", Color::ONE),
            Material::phong("shiny", Color::ONE, Color::ONE, 10.0),
            Material::glass("glass", Color::ONE, 1.5),
            Material::new("mystery", MaterialKind::from_tag(5))
                .with(keys::DIFFUSE_COLOR, PropertyValue::Rgb(Color::splat(0.8))),
        ];
        let table = ShaderTable::new(&materials, HemisphereSampling::Cosine);

        assert!(table.is_diffuse(Some(MaterialHandle(0))));
        assert!(!table.is_diffuse(Some(MaterialHandle(1))));
        assert!(!table.is_diffuse(Some(MaterialHandle(2))));
        // Shades as Lambertian, still not diffuse for photons.
        assert_eq!(table.get(Some(MaterialHandle(3))).name(), "lambertian");
        assert!(!table.is_diffuse(Some(MaterialHandle(3))));
        assert!(!table.is_diffuse(Some(MaterialHandle(99))));
        assert!(!table.is_diffuse(None));
    }

    #[test]
    fn test_mistyped_diffuse_uses_default() {
        let material = Material::new("bad", MaterialKind::Lambertian)
            .with(keys::DIFFUSE_COLOR, PropertyValue::Int(3));
        let shader = MaterialShader::from_material(&material, HemisphereSampling::Cosine);
        let c = shader.shade(Vec3::Y, Vec3::Y, Vec3::Y);
        assert_eq!(c, Color::ONE);
    }

    #[test]
    fn test_reflect() {
        let r = reflect(Vec3::new(1.0, -1.0, 0.0), Vec3::Y);
        assert_eq!(r, Vec3::new(1.0, 1.0, 0.0));
    }

    #[test]
    fn test_refract_normal_incidence_passes_straight() {
        let t = refract(Vec3::NEG_Y, Vec3::Y, 1.5).unwrap();
        assert!((t - Vec3::NEG_Y).length() < 1e-6);
    }

    #[test]
    fn test_refract_obeys_snell() {
        let angle = 30.0_f32.to_radians();
        let d = Vec3::new(angle.sin(), -angle.cos(), 0.0);
        let t = refract(d, Vec3::Y, 1.5).unwrap();
        assert!((t.length() - 1.0).abs() < 1e-5);
        let sin_t = t.x;
        assert!((angle.sin() - 1.5 * sin_t).abs() < 1e-5);
    }

    #[test]
    fn test_total_internal_reflection() {
        // Leaving glass at 60 degrees, past the ~41.8 degree critical angle.
        let angle = 60.0_f32.to_radians();
        let d = Vec3::new(angle.sin(), angle.cos(), 0.0);
        assert!(refract(d, Vec3::Y, 1.5).is_none());
        assert_eq!(fresnel(d, Vec3::Y, 1.5), 1.0);

        // Below the critical angle it refracts.
        let angle = 30.0_f32.to_radians();
        let d = Vec3::new(angle.sin(), angle.cos(), 0.0);
        assert!(refract(d, Vec3::Y, 1.5).is_some());
        assert!(fresnel(d, Vec3::Y, 1.5) < 1.0);
    }

    #[test]
    fn test_fresnel_normal_incidence() {
        let f = fresnel(Vec3::NEG_Y, Vec3::Y, 1.5);
        assert!((f - 0.04).abs() < 1e-5);
        // Grazing incidence reflects almost everything.
        let grazing = Vec3::new(1.0, -0.001, 0.0).normalize();
        assert!(fresnel(grazing, Vec3::Y, 1.5) > 0.95);
    }
}
