//! World-space rays.

use glam::DVec3;

/// Half-line in world coordinates.
///
/// `direction` is unit length; constructors normalize, the solver relies on it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: DVec3,
    pub direction: DVec3,
}

impl Ray {
    /// Create a ray, normalizing `direction`.
    pub fn new(origin: DVec3, direction: DVec3) -> Self {
        Self {
            origin,
            direction: direction.normalize(),
        }
    }

    /// Ray through two points, pointing from `from` towards `to`.
    pub fn through(from: DVec3, to: DVec3) -> Self {
        Self::new(from, to - from)
    }

    pub fn point_at(&self, s: f64) -> DVec3 {
        self.origin + self.direction * s
    }

    /// Perpendicular distance from `point` to the ray's supporting line.
    pub fn distance_to(&self, point: DVec3) -> f64 {
        let offset = point - self.origin;
        (offset - self.direction * offset.dot(self.direction)).length()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_new_normalizes() {
        let ray = Ray::new(DVec3::ZERO, DVec3::new(0.0, 3.0, 4.0));
        assert_abs_diff_eq!(ray.direction.length(), 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_distance_to() {
        let ray = Ray::through(DVec3::ZERO, DVec3::Z);
        assert_abs_diff_eq!(ray.distance_to(DVec3::new(3.0, 4.0, 10.0)), 5.0, epsilon = 1e-12);
        assert_abs_diff_eq!(ray.distance_to(ray.point_at(-2.0)), 0.0, epsilon = 1e-12);
    }
}
