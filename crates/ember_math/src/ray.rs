use crate::Vec3;

/// A ray with an origin and a unit-length direction.
///
/// Rays are created per camera sample and per scattering or shadow event
/// and never mutated afterwards.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    /// Create a ray, normalizing `direction`.
    ///
    /// A zero-length direction stays zero; every intersection routine
    /// treats such a ray as a miss.
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }

    /// Ray from `origin` towards `target`.
    pub fn towards(origin: Vec3, target: Vec3) -> Self {
        Self::new(origin, target - origin)
    }

    /// Returns: origin + t * direction
    #[inline]
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// True when the direction is degenerate.
    #[inline]
    pub fn is_degenerate(&self) -> bool {
        self.direction == Vec3::ZERO
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ray_normalizes_direction() {
        let ray = Ray::new(Vec3::ZERO, Vec3::new(0.0, 0.0, 4.0));
        assert_eq!(ray.direction, Vec3::Z);
        assert_eq!(ray.at(2.0), Vec3::new(0.0, 0.0, 2.0));
    }

    #[test]
    fn test_ray_zero_direction() {
        let ray = Ray::new(Vec3::ONE, Vec3::ZERO);
        assert!(ray.is_degenerate());
        assert_eq!(ray.at(5.0), Vec3::ONE);
    }

    #[test]
    fn test_ray_towards() {
        let ray = Ray::towards(Vec3::new(0.0, 0.0, -3.0), Vec3::ZERO);
        assert!((ray.direction - Vec3::Z).length() < 1e-6);
    }
}
