//! Ideal diffuse reflector.

use std::f32::consts::PI;

use ember_core::{keys, Color, Material};
use ember_math::{Onb, Ray, Vec3};
use rand::RngCore;

use super::{DirectShader, ScatterShader, Scattered};
use crate::config::HemisphereSampling;
use crate::sampling::{
    cosine_hemisphere, cosine_hemisphere_pdf, uniform_hemisphere, UNIFORM_HEMISPHERE_PDF,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lambertian {
    pub albedo: Color,
    pub sampling: HemisphereSampling,
}

impl Lambertian {
    pub fn new(albedo: Color, sampling: HemisphereSampling) -> Self {
        Self { albedo, sampling }
    }

    /// `diffuseColor` defaults to white.
    pub fn from_material(material: &Material, sampling: HemisphereSampling) -> Self {
        Self::new(material.rgb_or(keys::DIFFUSE_COLOR, Color::ONE), sampling)
    }
}

impl DirectShader for Lambertian {
    fn shade(&self, _incoming: Vec3, outgoing: Vec3, normal: Vec3) -> Color {
        self.albedo * outgoing.dot(normal).max(0.0)
    }
}

impl ScatterShader for Lambertian {
    fn scatter(&self, ray: &Ray, hit_point: Vec3, normal: Vec3, rng: &mut dyn RngCore) -> Scattered {
        let n = if ray.direction.dot(normal) > 0.0 { -normal } else { normal };
        let onb = Onb::from_w(n);

        let (local, pdf) = match self.sampling {
            HemisphereSampling::Cosine => {
                let local = cosine_hemisphere(rng);
                (local, cosine_hemisphere_pdf(local.z))
            }
            HemisphereSampling::Uniform => (uniform_hemisphere(rng), UNIFORM_HEMISPHERE_PDF),
        };

        Scattered {
            ray: Ray::new(hit_point, onb.local(local)),
            attenuation: self.albedo / PI,
            emitted: Color::ZERO,
            pdf,
        }
    }
}
