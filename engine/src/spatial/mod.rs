//! Spatial Query Module
//!
//! The narrow geometry interface the search and the editor controller depend
//! on. Queries take the scene by shared reference and never mutate it, so they
//! can be repeated freely while a drag is evaluated.
//!
//! # Submodules
//!
//! - [`collider_world`] - Brute-force implementation over part box colliders

pub mod collider_world;

use std::collections::HashSet;

use glam::Vec3;

use crate::math::OrientedBox;
use crate::scene::{BrickId, BrickScene, PartId};

pub use collider_world::ColliderWorld;

/// A half-line with a unit direction
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    /// Build a ray; a zero direction falls back to -Y.
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.try_normalize().unwrap_or(Vec3::NEG_Y),
        }
    }

    pub fn at(&self, distance: f32) -> Vec3 {
        self.origin + self.direction * distance
    }

    /// Distance along the ray to a plane, `None` if parallel or behind.
    pub fn intersect_plane(&self, point: Vec3, normal: Vec3) -> Option<f32> {
        let denom = self.direction.dot(normal);
        if denom.abs() < 1e-6 {
            return None;
        }
        let t = (point - self.origin).dot(normal) / denom;
        (t >= 0.0).then_some(t)
    }
}

/// One box collider of one part
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ColliderRef {
    pub brick: BrickId,
    pub part: PartId,
    /// Index into the part's collider list
    pub index: usize,
}

/// First surface hit along a ray
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub point: Vec3,
    pub normal: Vec3,
    pub distance: f32,
    /// `None` for synthetic hits such as the reference plane
    pub collider: Option<ColliderRef>,
}

impl RayHit {
    pub fn brick(&self) -> Option<BrickId> {
        self.collider.map(|c| c.brick)
    }
}

/// Geometry queries against the current brick transforms.
pub trait SpatialQuery {
    /// Closest hit along `ray`, ignoring every brick in `exclude`.
    fn raycast(&self, scene: &BrickScene, ray: &Ray, exclude: &HashSet<BrickId>) -> Option<RayHit>;

    /// Every collider overlapping `volume`.
    fn overlap_box(&self, scene: &BrickScene, volume: &OrientedBox) -> Vec<ColliderRef>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ray_plane() {
        let ray = Ray::new(Vec3::new(0.0, 5.0, 0.0), Vec3::new(0.0, -2.0, 0.0));
        assert_eq!(ray.intersect_plane(Vec3::ZERO, Vec3::Y), Some(5.0));
        assert_eq!(ray.at(5.0), Vec3::ZERO);

        let away = Ray::new(Vec3::new(0.0, 5.0, 0.0), Vec3::Y);
        assert!(away.intersect_plane(Vec3::ZERO, Vec3::Y).is_none());
        let parallel = Ray::new(Vec3::new(0.0, 5.0, 0.0), Vec3::X);
        assert!(parallel.intersect_plane(Vec3::ZERO, Vec3::Y).is_none());
    }
}
