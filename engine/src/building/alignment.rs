//! Free Alignment
//!
//! Placement used when no connection is chosen: the moving set follows the
//! pointer ray onto scene geometry or, failing that, a horizontal reference
//! plane, and rests on the surface it lands on.

use std::collections::HashSet;

use glam::{Quat, Vec3};

use crate::math::{POSITION_EPSILON, snap_major_axis};
use crate::scene::{BrickId, BrickScene, ConnectionId};
use crate::spatial::{Ray, RayHit, SpatialQuery};

/// Result of [`align_bricks`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FreeAlignment {
    /// Translation bringing the pivot onto the hit point
    pub offset: Vec3,
    /// Translation that rests the rotated set on the hit surface
    pub aligned_offset: Vec3,
    /// Rotation (about the pivot) snapping the focus brick onto the hit normal
    pub rotation: Quat,
    pub hit: RayHit,
}

/// Work out a free placement for `bricks` under `ray`.
///
/// # Arguments
/// * `focus` - Brick whose closest major axis is turned onto the hit normal
/// * `bricks` - Moving set, excluded from the raycast
/// * `pivot` - Point of the set that follows the pointer
/// * `plane_height` - Height of the horizontal fallback plane
///
/// # Returns
/// `None` when the ray hits neither geometry nor the plane
pub fn align_bricks<Q: SpatialQuery + ?Sized>(
    scene: &BrickScene,
    query: &Q,
    focus: BrickId,
    bricks: &[BrickId],
    pivot: Vec3,
    ray: &Ray,
    plane_height: f32,
) -> Option<FreeAlignment> {
    let exclude: HashSet<BrickId> = bricks.iter().copied().collect();
    let hit = query.raycast(scene, ray, &exclude).or_else(|| {
        let plane_point = Vec3::new(0.0, plane_height, 0.0);
        ray.intersect_plane(plane_point, Vec3::Y).map(|distance| RayHit {
            point: ray.at(distance),
            normal: Vec3::Y,
            distance,
            collider: None,
        })
    })?;
    let normal = hit.normal.try_normalize().unwrap_or(Vec3::Y);

    let focus_rotation = scene.brick_transform(focus)?.rotation;
    let local_normal = focus_rotation.inverse() * normal;
    let world_axis = focus_rotation * snap_major_axis(local_normal, true);
    let rotation = if world_axis == Vec3::ZERO {
        Quat::IDENTITY
    } else {
        Quat::from_rotation_arc(world_axis.normalize(), normal)
    };

    let offset = hit.point - pivot;

    // Lowest point of the rotated and offset set, measured along the normal
    let mut lowest = f32::INFINITY;
    for brick in bricks {
        let Some(b) = scene.brick(*brick) else {
            continue;
        };
        if b.total_bounds.is_empty() {
            continue;
        }
        let mut t = b.transform;
        t.rotate_around_by(pivot, rotation);
        t.translation += offset;
        for corner in b.total_bounds.corners() {
            lowest = lowest.min((t.transform_point(corner) - hit.point).dot(normal));
        }
    }
    let lift = if lowest.is_finite() { -lowest } else { 0.0 };

    Some(FreeAlignment {
        offset,
        aligned_offset: offset + normal * lift,
        rotation,
        hit,
    })
}

/// Rotate every brick about `pivot`, then translate it by `offset`.
pub fn align_transformations(
    scene: &mut BrickScene,
    bricks: &[BrickId],
    pivot: Vec3,
    axis: Vec3,
    angle: f32,
    offset: Vec3,
) {
    let rotation = match axis.try_normalize() {
        Some(axis) if angle != 0.0 => Quat::from_axis_angle(axis, angle),
        _ => Quat::IDENTITY,
    };
    for brick in bricks {
        if let Some(mut t) = scene.brick_transform(*brick) {
            t.rotate_around_by(pivot, rotation);
            t.translation += offset;
            scene.set_brick_transform(*brick, t);
        }
    }
}

/// Whether a chosen connection is physically reachable from the surface the
/// pointer is on.
///
/// A target anchor below the hit plane would need the set to be inserted
/// through the surface, so it is refused. Synthetic hits (no collider) never
/// refuse.
pub fn can_connect(scene: &BrickScene, target: ConnectionId, hit: Option<&RayHit>) -> bool {
    let Some(hit) = hit.filter(|h| h.collider.is_some()) else {
        return true;
    };
    let Some(frame) = scene.connection_frame(target) else {
        return false;
    };
    let normal = hit.normal.try_normalize().unwrap_or(Vec3::Y);
    (frame.position - hit.point).dot(normal) >= -POSITION_EPSILON
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::connectivity::ConnectorKind;
    use crate::import::PartCatalog;
    use crate::math::{BRICK_HEIGHT, LU_10, RigidTransform};
    use crate::spatial::ColliderWorld;

    #[test]
    fn test_align_on_reference_plane() {
        let catalog = PartCatalog::standard();
        let mut scene = BrickScene::new();
        let id = catalog
            .spawn(&mut scene, 3003, RigidTransform::from_translation(Vec3::new(0.0, 4.0, 0.0)))
            .unwrap();
        // Grab the brick at its top face
        let pivot = Vec3::new(0.0, 4.0 + BRICK_HEIGHT, 0.0);
        let ray = Ray::new(Vec3::new(3.0, 10.0, 2.0), Vec3::NEG_Y);

        let free = align_bricks(&scene, &ColliderWorld, id, &[id], pivot, &ray, 0.0).unwrap();
        assert!(free.hit.collider.is_none());
        assert_eq!(free.rotation, Quat::IDENTITY);
        align_transformations(&mut scene, &[id], pivot, Vec3::Y, 0.0, free.aligned_offset);

        let p = scene.brick_transform(id).unwrap().translation;
        assert_relative_eq!(p.x, 3.0, epsilon = 1e-5);
        assert_relative_eq!(p.y, 0.0, epsilon = 1e-5);
        assert_relative_eq!(p.z, 2.0, epsilon = 1e-5);
    }

    #[test]
    fn test_align_rests_on_brick_below() {
        let catalog = PartCatalog::standard();
        let mut scene = BrickScene::new();
        let base = catalog.spawn(&mut scene, 3001, RigidTransform::IDENTITY).unwrap();
        let id = catalog
            .spawn(&mut scene, 3003, RigidTransform::from_translation(Vec3::new(5.0, 0.0, 0.0)))
            .unwrap();
        let pivot = Vec3::new(5.0, 0.0, 0.0);
        let ray = Ray::new(Vec3::new(0.3, 10.0, 0.1), Vec3::NEG_Y);

        let free = align_bricks(&scene, &ColliderWorld, id, &[id], pivot, &ray, 0.0).unwrap();
        assert_eq!(free.hit.brick(), Some(base));
        align_transformations(&mut scene, &[id], pivot, Vec3::Y, 0.0, free.aligned_offset);
        let p = scene.brick_transform(id).unwrap().translation;
        assert_relative_eq!(p.y, BRICK_HEIGHT, epsilon = 1e-4);
    }

    #[test]
    fn test_align_transformations_is_rigid() {
        let catalog = PartCatalog::standard();
        let mut scene = BrickScene::new();
        let a = catalog.spawn(&mut scene, 3003, RigidTransform::IDENTITY).unwrap();
        let b = catalog
            .spawn(&mut scene, 3003, RigidTransform::from_translation(Vec3::new(LU_10 * 2.0, 0.0, 0.0)))
            .unwrap();
        let before = scene.brick_transform(a).unwrap().translation.distance(scene.brick_transform(b).unwrap().translation);
        align_transformations(&mut scene, &[a, b], Vec3::new(0.3, 0.0, 0.2), Vec3::Y, 1.2, Vec3::new(1.0, 2.0, 3.0));
        let after = scene.brick_transform(a).unwrap().translation.distance(scene.brick_transform(b).unwrap().translation);
        assert_relative_eq!(before, after, epsilon = 1e-5);
    }

    #[test]
    fn test_can_connect_rejects_anchor_below_surface() {
        let catalog = PartCatalog::standard();
        let mut scene = BrickScene::new();
        let base = catalog.spawn(&mut scene, 3003, RigidTransform::IDENTITY).unwrap();
        let stud_field = scene
            .brick_fields(base)
            .into_iter()
            .find(|f| scene.field(*f).is_some_and(|f| f.kind == ConnectorKind::STUD))
            .unwrap();
        let stud = scene.field(stud_field).unwrap().connections[0];

        let top_hit = ColliderWorld
            .raycast(&scene, &Ray::new(Vec3::new(0.1, 5.0, 0.1), Vec3::NEG_Y), &HashSet::new())
            .unwrap();
        assert!(can_connect(&scene, stud, Some(&top_hit)));

        let side_hit = ColliderWorld
            .raycast(&scene, &Ray::new(Vec3::new(5.0, 0.5, 0.0), Vec3::NEG_X), &HashSet::new())
            .unwrap();
        assert!(!can_connect(&scene, stud, Some(&side_hit)));
        assert!(can_connect(&scene, stud, None));
    }
}
