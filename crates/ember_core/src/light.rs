//! Light sources.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::Color;

/// Isotropic point light.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PointLight {
    pub intensity: Color,
    pub position: Vec3,
}

/// Emitting parallelogram `position + a*u + b*v`, facing `u x v`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AreaLight {
    pub radiance: Color,
    pub position: Vec3,
    pub u: Vec3,
    pub v: Vec3,
}

impl AreaLight {
    pub fn normal(&self) -> Vec3 {
        self.u.cross(self.v).normalize_or_zero()
    }

    pub fn area(&self) -> f32 {
        self.u.cross(self.v).length()
    }
}

/// Light arriving from infinitely far away along `direction`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DirectionalLight {
    pub irradiance: Color,
    pub direction: Vec3,
}

/// Cone light. Angles are in radians: full intensity inside `hot_spot`,
/// nothing outside `fallout`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpotLight {
    pub intensity: Color,
    pub position: Vec3,
    pub direction: Vec3,
    pub hot_spot: f32,
    pub fallout: f32,
}

impl SpotLight {
    pub fn new(intensity: Color, position: Vec3, direction: Vec3) -> Self {
        Self {
            intensity,
            position,
            direction,
            hot_spot: std::f32::consts::FRAC_PI_4,
            fallout: std::f32::consts::FRAC_PI_3,
        }
    }
}
