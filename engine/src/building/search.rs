//! Best Connection Search
//!
//! Given a set of moving bricks, find the single connection pair that the
//! set should snap onto. Candidate bricks are limited to the neighbourhood of
//! the moving set and capped in number; every compatible free pair between
//! the two sides is scored and the lowest score wins. The winner is rejected
//! if snapping to it would make the moving set collide.

use std::collections::HashSet;

use glam::Vec3;
use serde::{Deserialize, Serialize};
use tracing::trace;

use super::collision::{compute_bounds, is_colliding_at_transformation};
use crate::connectivity::ConnectedTransform;
use crate::math::LU_10;
use crate::scene::{BrickId, BrickScene, ConnectionId};
use crate::spatial::SpatialQuery;

/// Tunables of the connection search
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    /// Maximum number of candidate bricks examined per search
    pub max_tries_per_brick: usize,
    /// Growth applied to the moving set's bounds when gathering candidates
    pub neighborhood_margin: f32,
    /// Anchor pairs farther apart than this are ignored
    pub snap_radius: f32,
    /// Weight of the `1 - dot(up_a, up_b)` term in the score
    pub orientation_weight: f32,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            max_tries_per_brick: 20,
            neighborhood_margin: LU_10,
            snap_radius: LU_10,
            orientation_weight: 1.0,
        }
    }
}

/// The pair chosen by [`find_best_connection`] and the motion that realises it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BestConnection {
    /// Connection on the moving set
    pub moving: ConnectionId,
    /// Connection on a stationary brick
    pub target: ConnectionId,
    pub score: f32,
    pub transform: ConnectedTransform,
}

/// Stationary bricks worth searching, nearest bounds center first.
///
/// Legacy bricks and members of `moving` are never returned. Ties in
/// distance keep scene order.
pub fn candidate_bricks(scene: &BrickScene, moving: &[BrickId], settings: &SearchSettings) -> Vec<BrickId> {
    let moving_set: HashSet<BrickId> = moving.iter().copied().collect();
    let area = compute_bounds(scene, moving);
    if area.is_empty() {
        return Vec::new();
    }
    let search_area = area.expanded(settings.neighborhood_margin);
    let center = area.center();

    let mut found: Vec<(f32, BrickId)> = scene
        .brick_ids()
        .into_iter()
        .filter(|b| !moving_set.contains(b) && !scene.is_legacy(*b))
        .filter_map(|b| {
            let bounds = scene.brick_world_bounds(b);
            bounds
                .intersects(&search_area)
                .then(|| (bounds.center().distance_squared(center), b))
        })
        .collect();
    found.sort_by(|a, b| a.0.total_cmp(&b.0));
    found.truncate(settings.max_tries_per_brick);
    found.into_iter().map(|(_, b)| b).collect()
}

/// Pick the best connection between `moving` and the bricks around it.
///
/// # Arguments
/// * `query` - Used to reject a snap that would collide
/// * `moving` - Bricks being placed; links among them are kept and ignored
/// * `pivot` - Rotation pivot handed to the connected transformation
/// * `settings` - Search tunables
///
/// # Returns
/// The lowest scoring pair (first found on ties), or `None` when nothing is
/// in range or the best pair collides
pub fn find_best_connection<Q: SpatialQuery + ?Sized>(
    scene: &BrickScene,
    query: &Q,
    moving: &[BrickId],
    pivot: Vec3,
    settings: &SearchSettings,
) -> Option<BestConnection> {
    let candidates = candidate_bricks(scene, moving, settings);
    if candidates.is_empty() {
        return None;
    }
    let target_fields: Vec<_> = candidates
        .iter()
        .flat_map(|b| scene.connectable_fields(*b))
        .collect();

    let mut best: Option<(ConnectionId, ConnectionId, f32)> = None;
    for brick in moving {
        for field_id in scene.connectable_fields(*brick) {
            let Some(field) = scene.field(field_id) else {
                continue;
            };
            for target_field_id in &target_fields {
                let Some(target_field) = scene.field(*target_field_id) else {
                    continue;
                };
                if !field.kind.compatible_with(&target_field.kind) {
                    continue;
                }
                for own in &field.connections {
                    let Some(own_connection) = scene.connection(*own) else {
                        continue;
                    };
                    if own_connection.has_connection() {
                        continue;
                    }
                    let Some(a) = scene.connection_frame(*own) else {
                        continue;
                    };
                    for other in &target_field.connections {
                        if scene.connection(*other).is_none_or(|c| c.has_connection()) {
                            continue;
                        }
                        let Some(b) = scene.connection_frame(*other) else {
                            continue;
                        };
                        let facing = a.up.dot(b.up);
                        let distance = a.position.distance(b.position);
                        if facing < 0.0 || distance > settings.snap_radius {
                            continue;
                        }
                        let score = distance + settings.orientation_weight * (1.0 - facing);
                        if best.is_none_or(|(_, _, s)| score < s) {
                            best = Some((*own, *other, score));
                        }
                    }
                }
            }
        }
    }

    let (own, other, score) = best?;
    let transform = scene.connected_transformation(own, other, pivot)?;

    let ignore: HashSet<BrickId> = moving.iter().copied().collect();
    let rotation = transform.rotation();
    for brick in moving {
        let Some(mut t) = scene.brick_transform(*brick) else {
            continue;
        };
        t.rotate_around_by(pivot, rotation);
        t.translation += transform.offset;
        if is_colliding_at_transformation(scene, query, *brick, &t, &ignore) {
            trace!("[Brick Builder] Best pair {:?} -> {:?} collides, rejected", own, other);
            return None;
        }
    }
    Some(BestConnection {
        moving: own,
        target: other,
        score,
        transform,
    })
}

/// Offset to hover the moving set above its targets while a snap is shown.
///
/// Every currently coinciding pair between the set and the rest of the scene
/// proposes [`BrickScene::preconnect_offset`] of its stationary side. The
/// offset is used only when all proposals agree; otherwise it is zero.
pub fn preconnect_place_offset(scene: &BrickScene, moving: &[BrickId]) -> Vec3 {
    let moving_set: HashSet<BrickId> = moving.iter().copied().collect();
    let mut agreed: Option<Vec3> = None;
    for brick in moving {
        for field in scene.connectable_fields(*brick) {
            for (own, other) in scene.query_connections(field) {
                let target = if scene.connection_brick(other).is_some_and(|b| moving_set.contains(&b)) {
                    own
                } else {
                    other
                };
                if scene.connection_brick(target).is_some_and(|b| moving_set.contains(&b)) {
                    continue;
                }
                let offset = scene.preconnect_offset(target);
                match agreed {
                    None => agreed = Some(offset),
                    Some(previous) if previous.distance_squared(offset) < 0.01 => {}
                    Some(_) => return Vec3::ZERO,
                }
            }
        }
    }
    agreed.unwrap_or(Vec3::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::PartCatalog;
    use crate::math::{BRICK_HEIGHT, LU_5, PLATE_HEIGHT, RigidTransform};
    use crate::spatial::ColliderWorld;

    fn spawn(scene: &mut BrickScene, catalog: &PartCatalog, design: u32, pos: Vec3) -> BrickId {
        catalog
            .spawn(scene, design, RigidTransform::from_translation(pos))
            .unwrap()
    }

    #[test]
    fn test_candidate_bricks_filters_and_caps() {
        let catalog = PartCatalog::standard();
        let mut scene = BrickScene::new();
        let moving = spawn(&mut scene, &catalog, 3003, Vec3::new(0.0, BRICK_HEIGHT, 0.0));
        let near = spawn(&mut scene, &catalog, 3003, Vec3::ZERO);
        let second = spawn(&mut scene, &catalog, 3003, Vec3::new(1.6, 0.0, 0.0));
        let _far = spawn(&mut scene, &catalog, 3003, Vec3::new(20.0, 0.0, 0.0));
        let legacy = spawn(&mut scene, &catalog, 3003, Vec3::new(-1.6, 0.0, 0.0));
        let part = scene.brick(legacy).unwrap().parts[0];
        scene.part_mut(part).unwrap().legacy = true;

        let settings = SearchSettings::default();
        assert_eq!(candidate_bricks(&scene, &[moving], &settings), vec![near, second]);

        let capped = SearchSettings {
            max_tries_per_brick: 1,
            ..settings
        };
        assert_eq!(candidate_bricks(&scene, &[moving], &capped), vec![near]);
    }

    #[test]
    fn test_find_best_snaps_nearest_pair() {
        let catalog = PartCatalog::standard();
        let mut scene = BrickScene::new();
        spawn(&mut scene, &catalog, 3003, Vec3::ZERO);
        let moving = spawn(&mut scene, &catalog, 3003, Vec3::new(0.1, BRICK_HEIGHT, -0.05));
        let pivot = scene.brick_transform(moving).unwrap().translation;

        let best = find_best_connection(&scene, &ColliderWorld, &[moving], pivot, &SearchSettings::default()).unwrap();
        assert!(best.score < 0.2);
        best.transform.apply(&mut scene, moving, pivot);
        let p = scene.brick_transform(moving).unwrap().translation;
        assert!(p.distance(Vec3::new(0.0, BRICK_HEIGHT, 0.0)) < 1e-4);
    }

    #[test]
    fn test_find_best_ties_keep_first_found() {
        let catalog = PartCatalog::standard();
        let mut scene = BrickScene::new();
        spawn(&mut scene, &catalog, 3005, Vec3::new(-LU_5, 0.0, 0.0));
        spawn(&mut scene, &catalog, 3005, Vec3::new(LU_5, 0.0, 0.0));
        // Exactly between both studs
        let moving = spawn(&mut scene, &catalog, 3005, Vec3::new(0.0, BRICK_HEIGHT, 0.0));
        let pivot = Vec3::new(0.0, BRICK_HEIGHT, 0.0);

        let settings = SearchSettings::default();
        let first = find_best_connection(&scene, &ColliderWorld, &[moving], pivot, &settings).unwrap();
        let again = find_best_connection(&scene, &ColliderWorld, &[moving], pivot, &settings).unwrap();
        assert_eq!(first.target, again.target);
        let candidates = candidate_bricks(&scene, &[moving], &settings);
        assert_eq!(scene.connection_brick(first.target), Some(candidates[0]));
    }

    #[test]
    fn test_find_best_rejects_colliding_snap() {
        let catalog = PartCatalog::standard();
        let mut scene = BrickScene::new();
        spawn(&mut scene, &catalog, 3003, Vec3::ZERO);
        // Blocker occupies the space right above the target
        let blocker = spawn(&mut scene, &catalog, 3005, Vec3::new(0.4, BRICK_HEIGHT, 0.4));
        let part = scene.brick(blocker).unwrap().parts[0];
        if let Some(c) = scene.part_mut(part).and_then(|p| p.connectivity.as_mut()) {
            c.fields.clear();
        }
        let moving = spawn(&mut scene, &catalog, 3003, Vec3::new(0.6, BRICK_HEIGHT, 0.0));
        let pivot = scene.brick_transform(moving).unwrap().translation;
        assert!(find_best_connection(&scene, &ColliderWorld, &[moving], pivot, &SearchSettings::default()).is_none());
    }

    #[test]
    fn test_preconnect_place_offset() {
        let catalog = PartCatalog::standard();
        let mut scene = BrickScene::new();
        spawn(&mut scene, &catalog, 3003, Vec3::ZERO);
        let moving = spawn(&mut scene, &catalog, 3003, Vec3::new(0.0, BRICK_HEIGHT, 0.0));
        let offset = preconnect_place_offset(&scene, &[moving]);
        assert!(offset.distance(Vec3::Y * PLATE_HEIGHT) < 1e-5);

        let lonely = spawn(&mut scene, &catalog, 3003, Vec3::new(10.0, 0.0, 0.0));
        assert_eq!(preconnect_place_offset(&scene, &[lonely]), Vec3::ZERO);
    }
}
