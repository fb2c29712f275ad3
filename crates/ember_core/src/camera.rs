//! Camera description as delivered by scene import.

use glam::Vec3;
use serde::{Deserialize, Serialize};

/// Pinhole / thin-lens camera parameters. `fov` is the vertical field of
/// view in degrees.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraParams {
    pub position: Vec3,
    pub up: Vec3,
    pub look_at: Vec3,
    pub fov: f32,
    pub aperture: f32,
    pub focus_distance: f32,
    pub aspect: f32,
}

impl Default for CameraParams {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, -3.0),
            up: Vec3::Y,
            look_at: Vec3::ZERO,
            fov: 40.0,
            aperture: 0.0,
            focus_distance: 0.1,
            aspect: 1.0,
        }
    }
}

impl CameraParams {
    /// Set position, target and up vector.
    pub fn with_position(mut self, position: Vec3, look_at: Vec3, up: Vec3) -> Self {
        self.position = position;
        self.look_at = look_at;
        self.up = up;
        self
    }

    /// Set lens settings.
    pub fn with_lens(mut self, fov: f32, aperture: f32, focus_distance: f32) -> Self {
        self.fov = fov;
        self.aperture = aperture;
        self.focus_distance = focus_distance;
        self
    }

    pub fn with_aspect(mut self, aspect: f32) -> Self {
        self.aspect = aspect;
        self
    }
}
