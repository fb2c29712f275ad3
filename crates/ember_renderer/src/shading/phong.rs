//! Phong reflection model.

use std::f32::consts::PI;

use ember_core::{keys, Color, Material};
use ember_math::{Onb, Ray, Vec3};
use rand::RngCore;

use super::{reflect, DirectShader, ScatterShader, Scattered};
use crate::sampling::{cosine_hemisphere, cosine_hemisphere_pdf};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Phong {
    pub diffuse: Color,
    pub specular: Color,
    pub exponent: f32,
}

impl Default for Phong {
    fn default() -> Self {
        Self {
            diffuse: Color::ONE,
            specular: Color::ONE,
            exponent: 1.0,
        }
    }
}

impl Phong {
    pub fn new(diffuse: Color, specular: Color, exponent: f32) -> Self {
        Self {
            diffuse,
            specular,
            exponent: exponent.max(0.0),
        }
    }

    pub fn from_material(material: &Material) -> Self {
        let d = Self::default();
        Self::new(
            material.rgb_or(keys::DIFFUSE_COLOR, d.diffuse),
            material.rgb_or(keys::SPECULAR_COLOR, d.specular),
            material.float_or(keys::SPECULAR_EXPONENT, d.exponent),
        )
    }

    /// Normalized Phong lobe around the mirror direction `mirror`.
    fn lobe(&self, mirror: Vec3, direction: Vec3) -> f32 {
        let cos_alpha = mirror.dot(direction).max(0.0);
        (self.exponent + 2.0) / (2.0 * PI) * cos_alpha.powf(self.exponent)
    }
}

impl DirectShader for Phong {
    fn shade(&self, incoming: Vec3, outgoing: Vec3, normal: Vec3) -> Color {
        let cos_l = outgoing.dot(normal);
        if cos_l <= 0.0 {
            return Color::ZERO;
        }
        let r = reflect(-outgoing, normal);
        let spec = incoming.dot(r).max(0.0).powf(self.exponent);
        self.diffuse * cos_l + self.specular * spec
    }
}

impl ScatterShader for Phong {
    fn scatter(&self, ray: &Ray, hit_point: Vec3, normal: Vec3, rng: &mut dyn RngCore) -> Scattered {
        let n = if ray.direction.dot(normal) > 0.0 { -normal } else { normal };
        let onb = Onb::from_w(n);
        let local = cosine_hemisphere(rng);
        let direction = onb.local(local);

        let mirror = reflect(ray.direction, n);
        let brdf = self.diffuse / PI + self.specular * self.lobe(mirror, direction);

        Scattered {
            ray: Ray::new(hit_point, direction),
            attenuation: brdf,
            emitted: Color::ZERO,
            pdf: cosine_hemisphere_pdf(local.z),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ember_core::MaterialKind;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_defaults_from_bare_material() {
        let p = Phong::from_material(&Material::new("bare", MaterialKind::Phong));
        assert_eq!(p, Phong::default());
    }

    #[test]
    fn test_highlight_peaks_on_mirror_direction() {
        let p = Phong::new(Color::ZERO, Color::ONE, 20.0);
        let light = Vec3::new(1.0, 1.0, 0.0).normalize();
        let mirror_view = Vec3::new(-1.0, 1.0, 0.0).normalize();
        let off_view = Vec3::new(-0.2, 1.0, 0.0).normalize();

        let peak = p.shade(mirror_view, light, Vec3::Y);
        let off = p.shade(off_view, light, Vec3::Y);
        assert!((peak.x - 1.0).abs() < 1e-5);
        assert!(off.x < peak.x);
    }

    #[test]
    fn test_light_below_surface_is_black() {
        let p = Phong::default();
        assert_eq!(p.shade(Vec3::Y, Vec3::NEG_Y, Vec3::Y), Color::ZERO);
    }

    #[test]
    fn test_scatter_is_non_negative() {
        let mut rng = StdRng::seed_from_u64(8);
        let p = Phong::new(Color::splat(0.5), Color::splat(0.5), 10.0);
        let ray = Ray::new(Vec3::new(-1.0, 1.0, 0.0), Vec3::new(1.0, -1.0, 0.0));
        for _ in 0..100 {
            let s = p.scatter(&ray, Vec3::ZERO, Vec3::Y, &mut rng);
            assert!(s.attenuation.min_element() >= 0.0);
            assert!(s.ray.direction.y >= -1e-6);
        }
    }
}
