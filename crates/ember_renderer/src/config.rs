//! Render configuration.
//!
//! Everything here deserializes with defaults for missing fields, so a
//! JSON file only needs to name what it changes:
//!
//! ```
//! use ember_renderer::{RenderConfig, RenderMode};
//!
//! let config: RenderConfig =
//!     serde_json::from_str(r#"{ "mode": "path_trace", "threads": 2 }"#).unwrap();
//! assert_eq!(config.mode, RenderMode::PathTrace);
//! assert_eq!(config.photon.photon_count, 10_000);
//! ```

use std::fmt;
use std::str::FromStr;

use ember_core::Color;
use serde::{Deserialize, Serialize};

use crate::error::{RenderError, RenderResult};
use crate::kdtree::KdTreeConfig;

/// Which driver produces the pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderMode {
    /// One primary ray per pixel, direct light plus optional photon map.
    #[default]
    RayCast,
    /// Monte-Carlo path tracing with area lights.
    PathTrace,
}

impl fmt::Display for RenderMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderMode::RayCast => write!(f, "raycast"),
            RenderMode::PathTrace => write!(f, "path"),
        }
    }
}

impl FromStr for RenderMode {
    type Err = RenderError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "raycast" | "ray_cast" | "ray" => Ok(RenderMode::RayCast),
            "path" | "path_trace" | "pathtrace" => Ok(RenderMode::PathTrace),
            other => Err(RenderError::InvalidConfig(format!("unknown render mode '{other}'"))),
        }
    }
}

/// Hemisphere distribution for diffuse bounces.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HemisphereSampling {
    #[default]
    Cosine,
    Uniform,
}

/// Photon mapping settings for the ray-cast driver.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PhotonConfig {
    pub enabled: bool,
    /// Photons emitted from the point light
    pub photon_count: u32,
    pub max_bounces: u32,
    /// Photons gathered per radiance estimate
    pub k_nearest: usize,
    /// Lower bound on the gather radius
    pub min_radius: f32,
    /// Scales the probability that a diffuse hit stores its photon
    pub store_scale: f32,
    /// Multiplier applied to the photon estimate before adding it to the
    /// direct term
    pub indirect_scale: f32,
    /// Direct light attenuation for shadowed points
    pub shadow_factor: f32,
    /// Minimum ray parameter for primary and shadow rays
    pub ray_epsilon: f32,
}

impl Default for PhotonConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            photon_count: 10_000,
            max_bounces: 5,
            k_nearest: 50,
            min_radius: 10.0,
            store_scale: 0.2,
            indirect_scale: 1.0e6,
            shadow_factor: 0.3,
            ray_epsilon: 0.01,
        }
    }
}

/// Path tracer settings. `None` falls back to the scene's render options.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathTracerConfig {
    pub samples_per_pixel: Option<u32>,
    pub max_depth: Option<u32>,
    pub sampling: HemisphereSampling,
    pub ray_epsilon: f32,
}

impl Default for PathTracerConfig {
    fn default() -> Self {
        Self {
            samples_per_pixel: None,
            max_depth: None,
            sampling: HemisphereSampling::Cosine,
            ray_epsilon: 1.0e-4,
        }
    }
}

/// Top-level render settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    pub mode: RenderMode,
    /// Worker threads; rows are split into this many interleaved stripes
    pub threads: usize,
    pub seed: u64,
    /// Radiance for rays that leave the scene
    pub background: Color,
    pub kd_tree: KdTreeConfig,
    pub photon: PhotonConfig,
    pub path: PathTracerConfig,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            mode: RenderMode::RayCast,
            threads: 8,
            seed: 0,
            background: Color::ZERO,
            kd_tree: KdTreeConfig::default(),
            photon: PhotonConfig::default(),
            path: PathTracerConfig::default(),
        }
    }
}

impl RenderConfig {
    pub fn new(mode: RenderMode) -> Self {
        Self {
            mode,
            ..Default::default()
        }
    }

    pub fn with_mode(mut self, mode: RenderMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_background(mut self, color: Color) -> Self {
        self.background = color;
        self
    }

    pub fn with_kd_tree(mut self, kd_tree: KdTreeConfig) -> Self {
        self.kd_tree = kd_tree;
        self
    }

    pub fn with_photons(mut self, photon: PhotonConfig) -> Self {
        self.photon = photon;
        self
    }

    /// Turn photon mapping off for the ray-cast driver.
    pub fn without_photons(mut self) -> Self {
        self.photon.enabled = false;
        self
    }

    pub fn with_path(mut self, path: PathTracerConfig) -> Self {
        self.path = path;
        self
    }

    pub fn with_samples(mut self, samples_per_pixel: u32) -> Self {
        self.path.samples_per_pixel = Some(samples_per_pixel);
        self
    }

    pub fn with_max_depth(mut self, max_depth: u32) -> Self {
        self.path.max_depth = Some(max_depth);
        self
    }

    /// Reject settings no render can run with.
    pub fn validate(&self) -> RenderResult<()> {
        if self.threads == 0 {
            return Err(RenderError::InvalidConfig("threads must be at least 1".into()));
        }
        if self.path.samples_per_pixel == Some(0) {
            return Err(RenderError::InvalidConfig(
                "samples_per_pixel must be at least 1".into(),
            ));
        }
        if self.kd_tree.leaf_threshold == 0 {
            return Err(RenderError::InvalidConfig(
                "kd_tree.leaf_threshold must be at least 1".into(),
            ));
        }
        if self.photon.enabled && self.photon.k_nearest == 0 {
            return Err(RenderError::InvalidConfig("photon.k_nearest must be at least 1".into()));
        }
        Ok(())
    }
}
