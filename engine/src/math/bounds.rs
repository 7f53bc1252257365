//! Axis-Aligned Bounds
//!
//! World/local AABBs with an explicit empty state so that unions over
//! arbitrary sets of bricks can start from nothing.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::transform::RigidTransform;

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: Vec3,
    pub max: Vec3,
}

impl Default for Bounds {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl Bounds {
    /// Inverted box; encapsulating anything into it yields that thing.
    pub const EMPTY: Self = Self {
        min: Vec3::splat(f32::INFINITY),
        max: Vec3::splat(f32::NEG_INFINITY),
    };

    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self {
            min: min.min(max),
            max: min.max(max),
        }
    }

    pub fn from_center_extents(center: Vec3, extents: Vec3) -> Self {
        let extents = extents.abs();
        Self {
            min: center - extents,
            max: center + extents,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    pub fn center(&self) -> Vec3 {
        if self.is_empty() {
            return Vec3::ZERO;
        }
        (self.min + self.max) * 0.5
    }

    /// Half size along each axis
    pub fn extents(&self) -> Vec3 {
        if self.is_empty() {
            return Vec3::ZERO;
        }
        (self.max - self.min) * 0.5
    }

    pub fn size(&self) -> Vec3 {
        self.extents() * 2.0
    }

    pub fn encapsulate_point(&mut self, point: Vec3) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }

    pub fn encapsulate(&mut self, other: &Bounds) {
        if other.is_empty() {
            return;
        }
        self.encapsulate_point(other.min);
        self.encapsulate_point(other.max);
    }

    pub fn expanded(&self, margin: f32) -> Bounds {
        if self.is_empty() {
            return *self;
        }
        Bounds {
            min: self.min - Vec3::splat(margin),
            max: self.max + Vec3::splat(margin),
        }
    }

    pub fn contains(&self, point: Vec3) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }

    pub fn intersects(&self, other: &Bounds) -> bool {
        if self.is_empty() || other.is_empty() {
            return false;
        }
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
            && self.min.z <= other.max.z
            && self.max.z >= other.min.z
    }

    /// Squared distance from `point` to the box (zero inside).
    pub fn sqr_distance(&self, point: Vec3) -> f32 {
        if self.is_empty() {
            return f32::INFINITY;
        }
        let closest = point.clamp(self.min, self.max);
        closest.distance_squared(point)
    }

    pub fn corners(&self) -> [Vec3; 8] {
        let (a, b) = (self.min, self.max);
        [
            Vec3::new(a.x, a.y, a.z),
            Vec3::new(b.x, a.y, a.z),
            Vec3::new(a.x, b.y, a.z),
            Vec3::new(b.x, b.y, a.z),
            Vec3::new(a.x, a.y, b.z),
            Vec3::new(b.x, a.y, b.z),
            Vec3::new(a.x, b.y, b.z),
            Vec3::new(b.x, b.y, b.z),
        ]
    }

    /// AABB of this box after moving it by `transform`.
    pub fn transformed(&self, transform: &RigidTransform) -> Bounds {
        if self.is_empty() {
            return *self;
        }
        let mut result = Bounds::EMPTY;
        for corner in self.corners() {
            result.encapsulate_point(transform.transform_point(corner));
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Quat;

    #[test]
    fn test_empty_encapsulate() {
        let mut b = Bounds::EMPTY;
        assert!(b.is_empty());
        b.encapsulate(&Bounds::new(Vec3::ZERO, Vec3::ONE));
        assert!(!b.is_empty());
        assert_eq!(b.center(), Vec3::splat(0.5));
    }

    #[test]
    fn test_intersects_touching_faces() {
        let a = Bounds::new(Vec3::ZERO, Vec3::ONE);
        let b = Bounds::new(Vec3::new(1.0, 0.0, 0.0), Vec3::new(2.0, 1.0, 1.0));
        assert!(a.intersects(&b));
        assert!(!a.intersects(&Bounds::EMPTY));
    }

    #[test]
    fn test_transformed_quarter_turn() {
        let b = Bounds::new(Vec3::new(0.0, 0.0, 0.0), Vec3::new(2.0, 1.0, 1.0));
        let t = RigidTransform::new(Vec3::ZERO, Quat::from_rotation_y(std::f32::consts::FRAC_PI_2));
        let r = b.transformed(&t);
        assert!((r.size() - Vec3::new(1.0, 1.0, 2.0)).length() < 1e-4);
    }

    #[test]
    fn test_sqr_distance() {
        let b = Bounds::new(Vec3::ZERO, Vec3::ONE);
        assert_eq!(b.sqr_distance(Vec3::splat(0.5)), 0.0);
        assert!((b.sqr_distance(Vec3::new(3.0, 0.5, 0.5)) - 4.0).abs() < 1e-6);
    }
}
