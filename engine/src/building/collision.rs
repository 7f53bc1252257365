//! Placement Collision
//!
//! A placement is legal when no collider of the moving bricks overlaps a
//! collider of any other brick. Colliders are shrunk slightly first so bricks
//! resting flush on each other (stacked, or side by side on the grid) do not
//! count as colliding.

use std::collections::HashSet;

use glam::Vec3;

use crate::math::{Bounds, LU_1, RigidTransform};
use crate::scene::{BrickId, BrickScene};
use crate::spatial::{ColliderWorld, SpatialQuery};

/// Amount every collider half extent is shrunk by before overlap tests
pub const COLLISION_TOLERANCE: f32 = LU_1 * 0.25;

/// World-space union of the bounds of `bricks`.
pub fn compute_bounds(scene: &BrickScene, bricks: &[BrickId]) -> Bounds {
    let mut total = Bounds::EMPTY;
    for brick in bricks {
        total.encapsulate(&scene.brick_world_bounds(*brick));
    }
    total
}

/// Whether `brick` would collide if it were placed at `transform`.
///
/// # Arguments
/// * `query` - Spatial query used for the overlap tests
/// * `brick` - Brick whose colliders are tested
/// * `transform` - Hypothetical world frame of the brick
/// * `ignore` - Bricks whose colliders never count (the moving set)
pub fn is_colliding_at_transformation<Q: SpatialQuery + ?Sized>(
    scene: &BrickScene,
    query: &Q,
    brick: BrickId,
    transform: &RigidTransform,
    ignore: &HashSet<BrickId>,
) -> bool {
    ColliderWorld::brick_colliders_at(scene, brick, transform)
        .into_iter()
        .any(|(_, volume)| {
            let shrunk = volume.shrunk(COLLISION_TOLERANCE);
            if shrunk.half_extents.cmple(Vec3::ZERO).any() {
                return false;
            }
            query
                .overlap_box(scene, &shrunk)
                .iter()
                .any(|hit| hit.brick != brick && !ignore.contains(&hit.brick))
        })
}

/// Whether any of `bricks`, at its current transform, collides with a brick
/// outside the set.
pub fn collide_at_transformation<Q: SpatialQuery + ?Sized>(scene: &BrickScene, query: &Q, bricks: &[BrickId]) -> bool {
    let ignore: HashSet<BrickId> = bricks.iter().copied().collect();
    bricks.iter().any(|brick| {
        scene
            .brick_transform(*brick)
            .is_some_and(|t| is_colliding_at_transformation(scene, query, *brick, &t, &ignore))
    })
}
