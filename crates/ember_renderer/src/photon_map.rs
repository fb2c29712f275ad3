//! Photon storage and density-based radiance estimation.

use std::f32::consts::PI;

use ember_core::Color;
use ember_math::Vec3;

use crate::point_kdtree::{PointKdTree, Positioned};

/// Below this many photons the map stays a linear list.
pub const MIN_INDEXED_PHOTONS: usize = 16;

/// Incident directions must agree with the surface normal by more than
/// this to count in the fixed-radius estimate.
const FIXED_RADIUS_COS_CUTOFF: f32 = 0.1;
/// Looser cutoff for the adaptive estimate.
const ADAPTIVE_COS_CUTOFF: f32 = -0.5;

/// A stored light particle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Photon {
    pub position: Vec3,
    /// Unit vector pointing back along the path the photon arrived on.
    pub incident: Vec3,
    pub power: Color,
    pub bounce: u32,
    pub id: u32,
}

impl Positioned for Photon {
    fn position(&self) -> Vec3 {
        self.position
    }
}

/// Emitted versus stored power, as a sanity diagnostic.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnergyReport {
    pub emitted: Color,
    pub stored: Color,
    pub stored_photons: usize,
    /// Stored over emitted, channel sums.
    pub ratio: f32,
}

impl EnergyReport {
    /// Retention between 30% and 70% is typical once escape, absorption
    /// and roulette losses are accounted for.
    pub fn is_plausible(&self) -> bool {
        self.ratio > 0.3 && self.ratio < 0.7
    }
}

/// Photon collection with a point k-d tree index.
#[derive(Debug, Clone, Default)]
pub struct PhotonMap {
    photons: PointKdTree<Photon>,
}

impl PhotonMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store(&mut self, photon: Photon) {
        self.photons.push(photon);
    }

    /// Freeze the collection into its spatial index. Small maps are left
    /// as a linear list.
    pub fn build_index(&mut self) {
        if self.photons.len() >= MIN_INDEXED_PHOTONS {
            self.photons.build();
        }
        log::debug!(
            "Photon map: {} photons, indexed: {}",
            self.photons.len(),
            self.photons.is_built()
        );
    }

    pub fn is_indexed(&self) -> bool {
        self.photons.is_built()
    }

    pub fn len(&self) -> usize {
        self.photons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.photons.is_empty()
    }

    pub fn photons(&self) -> &[Photon] {
        self.photons.items()
    }

    pub fn within_radius(&self, position: Vec3, radius: f32) -> Vec<&Photon> {
        self.photons.within_radius(position, radius)
    }

    pub fn nearest(&self, position: Vec3, k: usize) -> Vec<(f32, &Photon)> {
        self.photons.nearest(position, k)
    }

    pub fn total_power(&self) -> Color {
        self.photons.items().iter().map(|p| p.power).sum()
    }

    /// Radiance from photons within a fixed `radius`, clamped to `[0, 1]`.
    pub fn estimate_radiance(&self, position: Vec3, normal: Vec3, radius: f32, albedo: Color) -> Color {
        if self.is_empty() || radius <= 0.0 {
            return Color::ZERO;
        }
        let brdf = albedo / PI;
        let mut flux = Color::ZERO;
        let mut used = 0;
        for photon in self.within_radius(position, radius) {
            if photon.incident.dot(normal) > FIXED_RADIUS_COS_CUTOFF {
                flux += brdf * photon.power;
                used += 1;
            }
        }
        if used == 0 {
            return Color::ZERO;
        }
        (flux / (PI * radius * radius)).clamp(Color::ZERO, Color::ONE)
    }

    /// Radiance from the `k` nearest photons. The gather radius is the
    /// distance to the k-th photon, floored at `min_radius`.
    pub fn estimate_radiance_adaptive(
        &self,
        position: Vec3,
        normal: Vec3,
        k: usize,
        min_radius: f32,
        albedo: Color,
    ) -> Color {
        let nearest = self.nearest(position, k);
        let Some(&(kth, _)) = nearest.last() else {
            return Color::ZERO;
        };
        let radius = kth.max(min_radius);
        if radius <= 0.0 {
            return Color::ZERO;
        }

        let brdf = albedo / PI;
        let mut flux = Color::ZERO;
        let mut used = 0;
        for (_, photon) in &nearest {
            if photon.incident.dot(normal) > ADAPTIVE_COS_CUTOFF {
                flux += brdf * photon.power;
                used += 1;
            }
        }
        if used == 0 {
            return Color::ZERO;
        }
        flux / (PI * radius * radius)
    }

    /// Compare stored power with the power emitted by a point light of
    /// `intensity` into a hemisphere (`intensity * 2π`).
    pub fn energy_report(&self, intensity: Color) -> EnergyReport {
        let emitted = intensity * (2.0 * PI);
        let stored = self.total_power();
        let emitted_sum = emitted.element_sum();
        let ratio = if emitted_sum > 0.0 {
            stored.element_sum() / emitted_sum
        } else {
            0.0
        };
        EnergyReport {
            emitted,
            stored,
            stored_photons: self.len(),
            ratio,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn photon(position: Vec3, incident: Vec3, power: f32, id: u32) -> Photon {
        Photon {
            position,
            incident,
            power: Color::splat(power),
            bounce: 1,
            id,
        }
    }

    #[test]
    fn test_fixed_radius_estimate() {
        let mut map = PhotonMap::new();
        map.store(photon(Vec3::ZERO, Vec3::Y, 1.0, 0));
        map.store(photon(Vec3::new(0.5, 0.0, 0.0), Vec3::Y, 1.0, 1));
        // Arrives from below the surface: filtered out.
        map.store(photon(Vec3::new(0.0, 0.0, 0.5), Vec3::NEG_Y, 1.0, 2));
        // Outside the radius.
        map.store(photon(Vec3::new(5.0, 0.0, 0.0), Vec3::Y, 1.0, 3));
        map.build_index();
        assert!(!map.is_indexed());

        let albedo = Color::splat(0.7);
        let radius = 1.0;
        let expected = (2.0 * 0.7 / PI) / (PI * radius * radius);
        let l = map.estimate_radiance(Vec3::ZERO, Vec3::Y, radius, albedo);
        assert!((l.x - expected).abs() < 1e-5, "got {}", l.x);

        // Clamped to [0, 1].
        let bright = map.estimate_radiance(Vec3::ZERO, Vec3::Y, 0.01, albedo);
        assert!(bright.x <= 1.0);
    }

    #[test]
    fn test_adaptive_estimate_uses_min_radius() {
        let mut map = PhotonMap::new();
        for i in 0..4 {
            map.store(photon(Vec3::new(0.1 * i as f32, 0.0, 0.0), Vec3::Y, 2.0, i));
        }
        let albedo = Color::ONE;
        let l = map.estimate_radiance_adaptive(Vec3::ZERO, Vec3::Y, 50, 10.0, albedo);
        let expected = (4.0 * 2.0 / PI) / (PI * 100.0);
        assert!((l.x - expected).abs() < 1e-6);
    }

    #[test]
    fn test_adaptive_estimate_uses_kth_distance() {
        let mut map = PhotonMap::new();
        for i in 0..40u32 {
            let x = i as f32;
            map.store(photon(Vec3::new(x, 0.0, 0.0), Vec3::Y, 1.0, i));
        }
        map.build_index();
        assert!(map.is_indexed());

        // k = 3 nearest to the origin: x = 0, 1, 2; radius 2.
        let l = map.estimate_radiance_adaptive(Vec3::ZERO, Vec3::Y, 3, 0.0, Color::ONE);
        let expected = (3.0 / PI) / (PI * 4.0);
        assert!((l.x - expected).abs() < 1e-5);
    }

    #[test]
    fn test_empty_map_estimates_zero() {
        let map = PhotonMap::new();
        assert_eq!(map.estimate_radiance(Vec3::ZERO, Vec3::Y, 1.0, Color::ONE), Color::ZERO);
        assert_eq!(map.estimate_radiance_adaptive(Vec3::ZERO, Vec3::Y, 50, 10.0, Color::ONE), Color::ZERO);
        assert_eq!(map.energy_report(Color::ONE).ratio, 0.0);
    }

    #[test]
    fn test_energy_report() {
        let mut map = PhotonMap::new();
        let intensity = Color::ONE;
        // Half of the emitted power ends up stored.
        let half = PI / 2.0;
        map.store(photon(Vec3::ZERO, Vec3::Y, half, 0));
        map.store(photon(Vec3::X, Vec3::Y, half, 1));
        let report = map.energy_report(intensity);
        assert!((report.ratio - 0.5).abs() < 1e-5);
        assert!(report.is_plausible());
        assert_eq!(report.stored_photons, 2);
    }
}
