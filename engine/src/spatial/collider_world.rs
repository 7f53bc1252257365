//! Collider World
//!
//! Headless [`SpatialQuery`] over the box colliders stored on parts. Every
//! query walks all bricks; cached brick bounds reject most of them early.

use std::collections::HashSet;

use crate::math::{OrientedBox, RigidTransform};
use crate::scene::{BrickId, BrickScene};

use super::{ColliderRef, Ray, RayHit, SpatialQuery};

/// Brute-force collider queries
#[derive(Debug, Clone, Copy, Default)]
pub struct ColliderWorld;

impl ColliderWorld {
    pub fn new() -> Self {
        Self
    }

    /// World boxes of every collider of a brick, placed at `transform`
    /// instead of the brick's current frame.
    pub fn brick_colliders_at(
        scene: &BrickScene,
        brick: BrickId,
        transform: &RigidTransform,
    ) -> Vec<(ColliderRef, OrientedBox)> {
        let mut out = Vec::new();
        let Some(b) = scene.brick(brick) else {
            return out;
        };
        for part_id in &b.parts {
            let Some(part) = scene.part(*part_id) else {
                continue;
            };
            let part_world = transform.compose(&part.local);
            for (index, collider) in part.colliders.iter().enumerate() {
                out.push((
                    ColliderRef {
                        brick,
                        part: *part_id,
                        index,
                    },
                    collider.to_world(&part_world),
                ));
            }
        }
        out
    }

    fn brick_colliders(scene: &BrickScene, brick: BrickId) -> Vec<(ColliderRef, OrientedBox)> {
        match scene.brick_transform(brick) {
            Some(t) => Self::brick_colliders_at(scene, brick, &t),
            None => Vec::new(),
        }
    }
}

impl SpatialQuery for ColliderWorld {
    fn raycast(&self, scene: &BrickScene, ray: &Ray, exclude: &HashSet<BrickId>) -> Option<RayHit> {
        let mut best: Option<RayHit> = None;
        for brick in scene.brick_ids() {
            if exclude.contains(&brick) {
                continue;
            }
            let bounds = scene.brick_world_bounds(brick);
            if bounds.is_empty() {
                continue;
            }
            let coarse = OrientedBox::new(bounds.center(), bounds.extents(), glam::Quat::IDENTITY);
            if coarse.ray_intersect(ray.origin, ray.direction).is_none() {
                continue;
            }
            for (collider, volume) in Self::brick_colliders(scene, brick) {
                let Some((distance, normal)) = volume.ray_intersect(ray.origin, ray.direction) else {
                    continue;
                };
                if best.is_none_or(|b| distance < b.distance) {
                    best = Some(RayHit {
                        point: ray.at(distance),
                        normal,
                        distance,
                        collider: Some(collider),
                    });
                }
            }
        }
        best
    }

    fn overlap_box(&self, scene: &BrickScene, volume: &OrientedBox) -> Vec<ColliderRef> {
        let area = volume.bounds();
        let mut out = Vec::new();
        for brick in scene.brick_ids() {
            if !scene.brick_world_bounds(brick).intersects(&area) {
                continue;
            }
            for (collider, other) in Self::brick_colliders(scene, brick) {
                if other.overlaps(volume) {
                    out.push(collider);
                }
            }
        }
        out
    }
}
