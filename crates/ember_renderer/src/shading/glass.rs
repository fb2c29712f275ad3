//! Smooth dielectric.

use ember_core::{keys, Color, Material};
use ember_math::{Ray, Vec3};
use rand::RngCore;

use super::{fresnel, reflect, refract, DirectShader, ScatterShader, Scattered};
use crate::sampling::gen_f32;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Glass {
    pub specular: Color,
    pub ior: f32,
}

impl Default for Glass {
    fn default() -> Self {
        Self {
            specular: Color::ONE,
            ior: 1.5,
        }
    }
}

impl Glass {
    pub fn new(specular: Color, ior: f32) -> Self {
        Self { specular, ior }
    }

    pub fn from_material(material: &Material) -> Self {
        let d = Self::default();
        Self::new(
            material.rgb_or(keys::SPECULAR_COLOR, d.specular),
            material.float_or(keys::IOR, d.ior),
        )
    }
}

impl DirectShader for Glass {
    fn shade(&self, incoming: Vec3, _outgoing: Vec3, normal: Vec3) -> Color {
        self.specular * fresnel(-incoming, normal, self.ior)
    }
}

impl ScatterShader for Glass {
    fn scatter(&self, ray: &Ray, hit_point: Vec3, normal: Vec3, rng: &mut dyn RngCore) -> Scattered {
        let f = fresnel(ray.direction, normal, self.ior);

        // Delta lobe: pdf equals |cos| so the integrator weight reduces to
        // the specular colour.
        let direction = match refract(ray.direction, normal, self.ior) {
            Some(t) if gen_f32(rng) >= f => t,
            _ => reflect(ray.direction, normal),
        };

        Scattered {
            ray: Ray::new(hit_point, direction),
            attenuation: self.specular,
            emitted: Color::ZERO,
            pdf: direction.dot(normal).abs(),
        }
    }
}
