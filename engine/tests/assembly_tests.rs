//! Assembly Tests - Controller Scenarios
//!
//! Drives the assembly controller with scripted pointer and key events
//! against a headless collider world and checks transforms, links and the
//! state machine afterwards.

use std::collections::HashSet;

use glam::{Vec2, Vec3};
use brick_builder_engine::editor::{
    AssemblyController, AssemblySession, BuilderState, EditorCamera, EditorEvent, HostNotification, InteractionKey,
    ModifierState,
};
use brick_builder_engine::import::PartCatalog;
use brick_builder_engine::math::{BRICK_HEIGHT, LU_10, OrientedBox, RigidTransform};
use brick_builder_engine::spatial::{ColliderRef, Ray, RayHit, SpatialQuery};
use brick_builder_engine::building::collide_at_transformation;
use brick_builder_engine::{BrickId, BrickScene, BuilderSettings, ColliderWorld};

// ============================================================================
// Harness
// ============================================================================

/// Collider world whose raycasts see nothing while a selection is moving, so
/// the selection always lands on the reference plane under the pointer.
#[derive(Debug, Clone, Copy, Default)]
struct PlaneWhileMoving(ColliderWorld);

impl SpatialQuery for PlaneWhileMoving {
    fn raycast(&self, scene: &BrickScene, ray: &Ray, exclude: &HashSet<BrickId>) -> Option<RayHit> {
        if exclude.is_empty() {
            self.0.raycast(scene, ray, exclude)
        } else {
            None
        }
    }

    fn overlap_box(&self, scene: &BrickScene, volume: &OrientedBox) -> Vec<ColliderRef> {
        self.0.overlap_box(scene, volume)
    }
}

struct Harness<Q: SpatialQuery> {
    controller: AssemblyController<Q>,
    session: AssemblySession,
    scene: BrickScene,
    catalog: PartCatalog,
}

impl<Q: SpatialQuery> Harness<Q> {
    fn new(query: Q, settings: BuilderSettings) -> Self {
        let camera = EditorCamera::new(Vec3::new(0.0, 8.0, 8.0), Vec3::ZERO);
        Self {
            session: AssemblySession::new(&settings),
            controller: AssemblyController::new(query, settings).with_camera(camera),
            scene: BrickScene::new(),
            catalog: PartCatalog::standard(),
        }
    }

    fn spawn(&mut self, design: u32, position: Vec3) -> BrickId {
        self.catalog
            .spawn(&mut self.scene, design, RigidTransform::from_translation(position))
            .expect("standard design")
    }

    fn link_all(&mut self) {
        for brick in self.scene.brick_ids() {
            for field in self.scene.brick_fields(brick) {
                for (a, b) in self.scene.query_connections(field) {
                    if self.scene.connection_valid(a, b) {
                        self.scene.connect(a, b);
                    }
                }
            }
        }
    }

    fn pixel(&self, point: Vec3) -> Vec2 {
        self.controller.camera.world_to_screen(point).expect("point in front of camera")
    }

    fn top_of(&self, brick: BrickId) -> Vec3 {
        let bounds = self.scene.brick_world_bounds(brick);
        Vec3::new(bounds.center().x, bounds.max.y, bounds.center().z)
    }

    fn send(&mut self, event: EditorEvent) {
        self.controller.handle_event(&mut self.session, &mut self.scene, event);
        self.controller.update(&mut self.session, &mut self.scene);
    }

    fn press(&mut self, position: Vec2, modifiers: ModifierState) {
        self.send(EditorEvent::PointerDown { position, modifiers });
    }

    fn drag(&mut self, position: Vec2) {
        self.send(EditorEvent::PointerDrag {
            position,
            modifiers: ModifierState::new(),
        });
    }

    fn release(&mut self, position: Vec2, modifiers: ModifierState) {
        self.send(EditorEvent::PointerUp { position, modifiers });
    }

    fn click(&mut self, brick: BrickId, modifiers: ModifierState) {
        let pixel = self.pixel(self.top_of(brick));
        self.press(pixel, modifiers);
        self.release(pixel, modifiers);
    }

    fn translation(&self, brick: BrickId) -> Vec3 {
        self.scene.brick_transform(brick).expect("live brick").translation
    }
}

fn no_select_connected() -> BuilderSettings {
    BuilderSettings {
        select_connected: false,
        ..BuilderSettings::default()
    }
}

fn shift() -> ModifierState {
    ModifierState {
        shift: true,
        ..ModifierState::new()
    }
}

// ============================================================================
// Selection
// ============================================================================

#[test]
fn test_click_selects_connected_group() {
    let mut h = Harness::new(ColliderWorld::new(), BuilderSettings::default());
    let bottom = h.spawn(3003, Vec3::ZERO);
    let top = h.spawn(3003, Vec3::new(0.0, BRICK_HEIGHT, 0.0));
    h.spawn(3003, Vec3::new(4.0, 0.0, 0.0));
    h.link_all();

    h.click(top, ModifierState::new());
    assert_eq!(h.session.state(), BuilderState::Selected);
    assert_eq!(h.session.focus(), Some(top));
    let selected: HashSet<BrickId> = h.session.selection().iter().copied().collect();
    assert_eq!(selected, HashSet::from([top, bottom]));
}

#[test]
fn test_additive_click_toggles() {
    let mut h = Harness::new(ColliderWorld::new(), no_select_connected());
    let a = h.spawn(3003, Vec3::new(-2.0, 0.0, 0.0));
    let b = h.spawn(3003, Vec3::new(2.0, 0.0, 0.0));

    h.click(a, ModifierState::new());
    h.click(b, shift());
    assert_eq!(h.session.selection(), &[a, b]);
    assert_eq!(h.session.focus(), Some(b));

    h.click(a, shift());
    assert_eq!(h.session.selection(), &[b]);

    h.click(a, ModifierState::new());
    assert_eq!(h.session.selection(), &[a]);
}

#[test]
fn test_expand_and_host_selection() {
    let mut h = Harness::new(ColliderWorld::new(), no_select_connected());
    let bottom = h.spawn(3003, Vec3::ZERO);
    let top = h.spawn(3003, Vec3::new(0.0, BRICK_HEIGHT, 0.0));
    h.link_all();

    h.click(top, ModifierState::new());
    assert_eq!(h.session.selection(), &[top]);
    h.send(EditorEvent::ExpandSelection);
    assert_eq!(h.session.selection(), &[top, bottom]);

    h.send(EditorEvent::HostSelectionChanged(vec![bottom]));
    assert_eq!(h.session.selection(), &[bottom]);

    h.send(EditorEvent::ToggleSelectConnected);
    h.send(EditorEvent::HostSelectionChanged(vec![bottom]));
    assert_eq!(h.session.selection(), &[bottom, top]);

    let notified = h
        .session
        .drain_notifications()
        .into_iter()
        .filter(|n| matches!(n, HostNotification::SelectionChanged(_)))
        .count();
    assert_eq!(notified, 4);
}

#[test]
fn test_destroyed_focus_resets_session() {
    let mut h = Harness::new(ColliderWorld::new(), no_select_connected());
    let a = h.spawn(3003, Vec3::ZERO);
    h.click(a, ModifierState::new());
    assert_eq!(h.session.state(), BuilderState::Selected);

    h.scene.destroy_brick(a);
    h.send(EditorEvent::RotateOrNudge(InteractionKey::Right));
    assert_eq!(h.session.state(), BuilderState::NoSelection);
    assert!(h.session.selection().is_empty());
    assert_eq!(h.session.focus(), None);
}

// ============================================================================
// Moving
// ============================================================================

#[test]
fn test_drag_snaps_and_links_on_release() {
    let mut h = Harness::new(ColliderWorld::new(), BuilderSettings::default());
    let base = h.spawn(3001, Vec3::ZERO);
    let loose = h.spawn(3003, Vec3::new(4.0, 0.0, 0.0));

    let start = h.pixel(h.top_of(loose));
    let target = h.pixel(h.top_of(base) + Vec3::new(0.8, 0.0, 0.0));
    h.press(start, ModifierState::new());
    assert_eq!(h.session.state(), BuilderState::Dragging);

    h.drag(target);
    assert_eq!(h.session.state(), BuilderState::Moving);
    assert!(h.session.snapped().is_some());
    assert!(h.translation(loose).y > BRICK_HEIGHT + 0.1, "hovers while the snap is previewed");

    h.release(target, ModifierState::new());
    assert_eq!(h.session.state(), BuilderState::Selected);
    assert!((h.translation(loose) - Vec3::new(0.8, BRICK_HEIGHT, 0.0)).length() < 1e-3);
    assert_eq!(h.scene.link_count(), 4);
    assert_eq!(h.scene.connected_bricks(loose, false), vec![base]);
    assert!(!collide_at_transformation(&h.scene, &h.controller.query, &[loose]));

    let checkpoints: Vec<_> = h
        .session
        .drain_notifications()
        .into_iter()
        .filter_map(|n| match n {
            HostNotification::UndoCheckpoint(label) => Some(label),
            _ => None,
        })
        .collect();
    assert_eq!(checkpoints, vec!["Move bricks".to_string()]);

    h.send(EditorEvent::Undo);
    assert!((h.translation(loose) - Vec3::new(4.0, 0.0, 0.0)).length() < 1e-6);
    assert_eq!(h.scene.link_count(), 0);
    assert_eq!(h.session.state(), BuilderState::Selected);
}

#[test]
fn test_small_drag_is_a_click() {
    let mut h = Harness::new(ColliderWorld::new(), BuilderSettings::default());
    let a = h.spawn(3003, Vec3::ZERO);
    let pixel = h.pixel(h.top_of(a));
    h.press(pixel, ModifierState::new());
    h.drag(pixel + Vec2::new(5.0, 5.0));
    assert_eq!(h.session.state(), BuilderState::Dragging);
    h.release(pixel + Vec2::new(5.0, 5.0), ModifierState::new());
    assert_eq!(h.session.state(), BuilderState::Selected);
    assert_eq!(h.translation(a), Vec3::ZERO);
}

#[test]
fn test_rotating_group_preserves_offsets() {
    let mut h = Harness::new(ColliderWorld::new(), BuilderSettings::default());
    let bricks = [
        h.spawn(3003, Vec3::ZERO),
        h.spawn(3003, Vec3::new(0.0, BRICK_HEIGHT, 0.0)),
        h.spawn(3003, Vec3::new(0.0, 2.0 * BRICK_HEIGHT, 0.0)),
    ];
    h.link_all();
    assert_eq!(h.scene.link_count(), 8);

    let distances = |h: &Harness<ColliderWorld>| {
        [
            h.translation(bricks[0]).distance(h.translation(bricks[1])),
            h.translation(bricks[1]).distance(h.translation(bricks[2])),
            h.translation(bricks[0]).distance(h.translation(bricks[2])),
        ]
    };
    let before = distances(&h);

    let start = h.pixel(h.top_of(bricks[2]));
    h.press(start, ModifierState::new());
    h.drag(h.pixel(Vec3::new(3.0, 0.0, 0.0)));
    assert_eq!(h.session.state(), BuilderState::Moving);
    assert_eq!(h.session.selection().len(), 3);
    let yaw_before = h.scene.brick_transform(bricks[0]).unwrap().rotation;

    h.send(EditorEvent::RotateOrNudge(InteractionKey::Right));
    let after = distances(&h);
    for (b, a) in before.iter().zip(after.iter()) {
        assert!((b - a).abs() < 1e-4);
    }
    let yaw_after = h.scene.brick_transform(bricks[0]).unwrap().rotation;
    assert!(yaw_before.angle_between(yaw_after) > 1.0);

    let up = h.pixel(Vec3::new(3.0, 0.0, 0.0));
    h.release(up, ModifierState::new());
    assert_eq!(h.session.state(), BuilderState::Selected);
    assert_eq!(h.scene.link_count(), 8);
    let after_place = distances(&h);
    for (b, a) in before.iter().zip(after_place.iter()) {
        assert!((b - a).abs() < 1e-4);
    }
}

#[test]
fn test_colliding_move_reverts_to_pre_move() {
    let mut h = Harness::new(PlaneWhileMoving::default(), no_select_connected());
    let obstacle = h.spawn(3003, Vec3::new(3.0, 0.0, 0.0));
    let moving = h.spawn(3003, Vec3::new(-3.0, 0.0, 0.0));
    let pre_move = h.scene.brick_transform(moving);

    h.press(h.pixel(h.top_of(moving)), ModifierState::new());
    let onto_obstacle = h.pixel(Vec3::new(3.0, 0.0, 0.0));
    h.drag(onto_obstacle);
    assert_eq!(h.session.state(), BuilderState::Moving);
    h.release(onto_obstacle, ModifierState::new());

    assert_eq!(h.session.state(), BuilderState::Selected);
    assert_eq!(h.scene.brick_transform(moving), pre_move);
    assert_eq!(h.translation(obstacle), Vec3::new(3.0, 0.0, 0.0));
    assert!(!collide_at_transformation(&h.scene, &h.controller.query, &[moving]));
}

#[test]
fn test_escape_restores_pre_move_snapshot() {
    let mut h = Harness::new(ColliderWorld::new(), no_select_connected());
    h.spawn(3003, Vec3::ZERO);
    let top = h.spawn(3003, Vec3::new(0.0, BRICK_HEIGHT, 0.0));
    h.link_all();
    assert_eq!(h.scene.link_count(), 4);

    h.press(h.pixel(h.top_of(top)), ModifierState::new());
    h.drag(h.pixel(Vec3::new(-4.0, 0.0, 0.0)));
    assert_eq!(h.session.state(), BuilderState::Moving);
    assert_eq!(h.scene.link_count(), 0);

    h.send(EditorEvent::Cancel);
    assert_eq!(h.session.state(), BuilderState::Selected);
    assert_eq!(h.session.selection(), &[top]);
    assert_eq!(h.translation(top), Vec3::new(0.0, BRICK_HEIGHT, 0.0));
    assert_eq!(h.scene.link_count(), 4);
}

#[test]
fn test_duplicate_then_cancel_removes_copies() {
    let mut h = Harness::new(ColliderWorld::new(), no_select_connected());
    let a = h.spawn(3003, Vec3::ZERO);
    h.click(a, ModifierState::new());

    h.send(EditorEvent::Duplicate);
    assert_eq!(h.scene.brick_count(), 2);
    assert_eq!(h.session.state(), BuilderState::Moving);
    assert!(!h.session.selection().contains(&a));

    h.send(EditorEvent::Cancel);
    assert_eq!(h.scene.brick_count(), 1);
    assert_eq!(h.session.selection(), &[a]);
    assert_eq!(h.session.state(), BuilderState::Selected);
}

#[test]
fn test_undo_after_placed_duplicate_removes_copies() {
    let mut h = Harness::new(PlaneWhileMoving::default(), no_select_connected());
    let a = h.spawn(3003, Vec3::ZERO);
    h.click(a, ModifierState::new());

    h.send(EditorEvent::Duplicate);
    let copy = h.session.selection()[0];
    assert_ne!(copy, a);

    let aside = h.pixel(Vec3::new(-3.0, 0.0, 0.0));
    h.drag(aside);
    h.release(aside, ModifierState::new());
    assert_eq!(h.session.state(), BuilderState::Selected);
    assert_eq!(h.scene.brick_count(), 2);
    assert!(h.translation(copy).distance(Vec3::ZERO) > 1.0);
    assert_eq!(h.session.undo_stack().undo_count(), 1);

    h.send(EditorEvent::Undo);
    assert_eq!(h.scene.brick_count(), 1);
    assert!(!h.scene.contains_brick(copy));
    assert_eq!(h.translation(a), Vec3::ZERO);
    assert_eq!(h.session.undo_stack().undo_count(), 0);
    assert_eq!(h.session.state(), BuilderState::NoSelection);
}

#[test]
fn test_removing_moving_brick_reverts_move() {
    let mut h = Harness::new(ColliderWorld::new(), no_select_connected());
    let base = h.spawn(3001, Vec3::ZERO);
    let support = h.spawn(3003, Vec3::new(4.0, 0.0, 0.0));
    let a = h.spawn(3003, Vec3::new(4.0, BRICK_HEIGHT, 0.0));
    let b = h.spawn(3003, Vec3::new(6.0, 0.0, 0.0));
    h.link_all();
    assert_eq!(h.scene.link_count(), 4);

    h.click(a, ModifierState::new());
    h.click(b, shift());
    assert_eq!(h.session.selection().len(), 2);

    h.press(h.pixel(h.top_of(a)), ModifierState::new());
    h.drag(h.pixel(h.top_of(base) + Vec3::new(0.8, 0.0, 0.0)));
    assert_eq!(h.session.state(), BuilderState::Moving);
    assert_eq!(h.scene.link_count(), 0);

    h.scene.destroy_brick(b);
    h.drag(h.pixel(Vec3::new(-2.0, 0.0, 0.0)));
    assert_eq!(h.session.state(), BuilderState::NoSelection);
    assert!(h.session.selection().is_empty());
    assert_eq!(h.translation(a), Vec3::new(4.0, BRICK_HEIGHT, 0.0));
    assert_eq!(h.scene.connected_bricks(a, false), vec![support]);
    assert_eq!(h.scene.link_count(), 4);
    assert_eq!(h.session.undo_stack().undo_count(), 0);
}

// ============================================================================
// Nudge
// ============================================================================

#[test]
fn test_nudge_moves_one_stud_and_reverts_on_collision() {
    let mut h = Harness::new(ColliderWorld::new(), no_select_connected());
    let a = h.spawn(3003, Vec3::ZERO);
    h.click(a, ModifierState::new());

    h.send(EditorEvent::RotateOrNudge(InteractionKey::Right));
    assert!((h.translation(a) - Vec3::new(LU_10, 0.0, 0.0)).length() < 1e-5);
    assert_eq!(h.session.undo_stack().undo_count(), 1);

    h.spawn(3003, Vec3::new(LU_10 + 2.0, 0.0, 0.0));
    h.send(EditorEvent::RotateOrNudge(InteractionKey::Right));
    assert!((h.translation(a) - Vec3::new(LU_10, 0.0, 0.0)).length() < 1e-5);
    assert_eq!(h.session.undo_stack().undo_count(), 1);
}
