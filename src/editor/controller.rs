//! Assembly Controller
//!
//! Turns editor events into brick moves, snaps and links. The controller owns
//! nothing mutable of its own: every call receives the [`AssemblySession`] and
//! the [`BrickScene`], and geometry questions go through the injected
//! [`SpatialQuery`].
//!
//! State machine:
//!
//! ```text
//! NoSelection --press on brick--> Dragging --release--> Selected
//!                                 Dragging --drag past threshold--> Moving
//! Moving --drag--> Moving (search every re-evaluation distance)
//! Moving --release--> Selected (links committed)
//! Selected --rotate/nudge--> Selected
//! any --cancel/undo--> Selected | NoSelection
//! ```

use std::collections::HashSet;
use std::f32::consts::FRAC_PI_2;

use glam::{Vec2, Vec3};
use tracing::{debug, info, warn};

use super::commands::QueuedCommand;
use super::input::{EditorCamera, EditorEvent, InteractionKey, KeyBindings, KeyCode, ModifierState};
use super::session::{AssemblySession, BuilderState, HostNotification};
use super::undo::Snapshot;
use crate::building::{align_bricks, align_transformations, can_connect, collide_at_transformation};
use crate::building::{find_best_connection, preconnect_place_offset};
use crate::config::BuilderSettings;
use crate::math::{LU_10, PLATE_HEIGHT, snap_major_axis};
use crate::scene::{BrickId, BrickScene};
use crate::spatial::SpatialQuery;

/// Interactive assembly controller
#[derive(Debug, Clone)]
pub struct AssemblyController<Q: SpatialQuery> {
    pub query: Q,
    pub settings: BuilderSettings,
    pub camera: EditorCamera,
    pub bindings: KeyBindings,
}

impl<Q: SpatialQuery> AssemblyController<Q> {
    pub fn new(query: Q, settings: BuilderSettings) -> Self {
        Self {
            query,
            settings,
            camera: EditorCamera::default(),
            bindings: KeyBindings::new(),
        }
    }

    pub fn with_camera(mut self, camera: EditorCamera) -> Self {
        self.camera = camera;
        self
    }

    // ========================================================================
    // ENTRY POINTS
    // ========================================================================

    /// Map a key press through the bindings and handle the resulting event.
    ///
    /// # Returns
    /// `true` if the chord was bound
    pub fn handle_key(
        &self,
        session: &mut AssemblySession,
        scene: &mut BrickScene,
        key: KeyCode,
        modifiers: ModifierState,
    ) -> bool {
        match self.bindings.event_for(key, modifiers) {
            Some(event) => {
                self.handle_event(session, scene, event);
                true
            }
            None => false,
        }
    }

    /// Handle one input event. Scene changes are committed or fully reverted
    /// before this returns; selection changes are queued for [`Self::update`].
    pub fn handle_event(&self, session: &mut AssemblySession, scene: &mut BrickScene, event: EditorEvent) {
        session.prune(scene);

        match event {
            EditorEvent::ToggleBrickBuilding => self.toggle_brick_building(session),
            EditorEvent::ToggleSelectConnected => {
                session.select_connected = !session.select_connected;
                info!("[Brick Builder] Select connected: {}", session.select_connected);
            }
            EditorEvent::TransformsChanged(bricks) => self.transforms_changed(scene, &bricks),
            EditorEvent::HostSelectionChanged(bricks) => self.host_selection_changed(session, scene, bricks),
            _ if !session.brick_building => {}
            EditorEvent::PointerDown { position, .. } => self.pointer_down(session, scene, position),
            EditorEvent::PointerDrag { position, .. } => self.pointer_drag(session, scene, position),
            EditorEvent::PointerUp { position, modifiers } => self.pointer_up(session, scene, position, modifiers),
            EditorEvent::RotateOrNudge(key) => match session.state {
                BuilderState::Moving => self.rotate(session, scene, key),
                BuilderState::Selected => self.nudge(session, scene, key),
                _ => {}
            },
            EditorEvent::Cancel => self.cancel(session),
            EditorEvent::Undo => self.request_undo(session),
            EditorEvent::Duplicate => self.duplicate(session, scene),
            EditorEvent::ExpandSelection => self.expand_selection(session, scene),
        }
    }

    /// Per-tick drain: apply every queued command in order.
    pub fn update(&self, session: &mut AssemblySession, scene: &mut BrickScene) {
        for command in session.queue.drain() {
            match command {
                QueuedCommand::ApplySelection { bricks, focus } => session.apply_selection(scene, &bricks, focus),
                QueuedCommand::PerformUndo => self.perform_undo(session, scene),
            }
        }
        session.prune(scene);
    }

    // ========================================================================
    // POINTER
    // ========================================================================

    fn pointer_down(&self, session: &mut AssemblySession, scene: &BrickScene, position: Vec2) {
        let ray = self.camera.screen_to_ray(position);
        let hit = self.query.raycast(scene, &ray, &HashSet::new());

        session.press_position = Some(position);
        session.last_pointer = position;
        session.press_hit = hit;
        session.pressed_brick = hit.and_then(|h| h.brick());

        if session.pressed_brick.is_some()
            && matches!(session.state, BuilderState::NoSelection | BuilderState::Selected)
        {
            session.state = BuilderState::Dragging;
        }
    }

    fn pointer_drag(&self, session: &mut AssemblySession, scene: &mut BrickScene, position: Vec2) {
        session.last_pointer = position;
        match session.state {
            BuilderState::Dragging => {
                let travelled = session.press_position.map_or(0.0, |p| p.distance(position));
                if travelled > self.settings.sticky_snap_distance {
                    self.begin_move(session, scene, position);
                }
            }
            BuilderState::Moving => {
                let due = session
                    .last_evaluation
                    .is_none_or(|p| p.distance(position) > self.settings.reevaluate_distance);
                if due {
                    self.compute_new_connection(session, scene, position);
                    session.last_evaluation = Some(position);
                }
            }
            _ => {}
        }
    }

    fn pointer_up(&self, session: &mut AssemblySession, scene: &mut BrickScene, position: Vec2, modifiers: ModifierState) {
        session.last_pointer = position;
        match session.state {
            BuilderState::Dragging => self.click_select(session, scene, modifiers),
            BuilderState::Moving => self.place(session, scene, position),
            _ => {
                if session.press_position.is_some() && session.pressed_brick.is_none() && !modifiers.additive() {
                    session.queue.push(QueuedCommand::ApplySelection {
                        bricks: Vec::new(),
                        focus: None,
                    });
                }
            }
        }
        session.clear_pointer();
    }

    /// The clicked brick plus, when select-connected is on, everything linked
    /// to it.
    fn click_group(&self, session: &AssemblySession, scene: &BrickScene, brick: BrickId) -> Vec<BrickId> {
        let mut group = vec![brick];
        if session.select_connected {
            group.extend(scene.connected_bricks(brick, true));
        }
        group
    }

    fn click_select(&self, session: &mut AssemblySession, scene: &BrickScene, modifiers: ModifierState) {
        let Some(brick) = session.pressed_brick.filter(|b| scene.contains_brick(*b)) else {
            session.state = if session.selection.is_empty() {
                BuilderState::NoSelection
            } else {
                BuilderState::Selected
            };
            return;
        };
        let group = self.click_group(session, scene, brick);

        let (bricks, focus) = if modifiers.additive() {
            let mut bricks = session.selection.clone();
            if bricks.contains(&brick) {
                bricks.retain(|b| !group.contains(b));
                let focus = session.focus.filter(|f| bricks.contains(f));
                (bricks, focus)
            } else {
                for b in group {
                    if !bricks.contains(&b) {
                        bricks.push(b);
                    }
                }
                (bricks, Some(brick))
            }
        } else {
            (group, Some(brick))
        };

        session.state = if bricks.is_empty() {
            BuilderState::NoSelection
        } else {
            BuilderState::Selected
        };
        session.queue.push(QueuedCommand::ApplySelection { bricks, focus });
    }

    // ========================================================================
    // MOVING
    // ========================================================================

    fn begin_move(&self, session: &mut AssemblySession, scene: &mut BrickScene, position: Vec2) {
        let Some(pressed) = session.pressed_brick.filter(|b| scene.contains_brick(*b)) else {
            session.state = BuilderState::NoSelection;
            return;
        };
        if !session.selection.contains(&pressed) {
            session.selection = self.click_group(session, scene, pressed);
        }
        session.focus = Some(pressed);
        session.queue.push(QueuedCommand::ApplySelection {
            bricks: session.selection.clone(),
            focus: Some(pressed),
        });

        let anchor = match session.press_hit {
            Some(hit) => hit.point,
            None => scene.brick_world_bounds(pressed).center(),
        };
        self.start_move(session, scene, "Move bricks", anchor);
        self.compute_new_connection(session, scene, position);
        session.last_evaluation = Some(position);
    }

    /// Snapshot the selection, cut it loose from the rest of the scene and
    /// enter `Moving`.
    ///
    /// # Arguments
    /// * `anchor` - World point that follows the pointer
    fn start_move(&self, session: &mut AssemblySession, scene: &mut BrickScene, label: &str, anchor: Vec3) {
        let snapshot = Snapshot::capture(scene, &session.selection);
        session.undo.push_created(label, snapshot.clone(), session.spawned.clone());
        session
            .notifications
            .push(HostNotification::UndoCheckpoint(label.to_string()));
        session.pre_move = Some(snapshot);

        let keep: HashSet<BrickId> = session.selection.iter().copied().collect();
        for brick in &session.selection {
            for field in scene.brick_fields(*brick) {
                scene.disconnect_inverse(field, &keep);
            }
        }

        session.rebuild_relative(scene);
        session.pickup_local = session
            .focus
            .and_then(|f| scene.brick_transform(f))
            .map_or(Vec3::ZERO, |t| t.inverse_transform_point(anchor));
        session.snapped = None;
        session.preconnect = Vec3::ZERO;
        session.last_hit = session.press_hit;
        session.capture_good(scene);
        session.state = BuilderState::Moving;
        info!("[Brick Builder] Picked up {} bricks", session.selection.len());
    }

    fn offset_selection(session: &AssemblySession, scene: &mut BrickScene, offset: Vec3) {
        if offset == Vec3::ZERO {
            return;
        }
        for brick in &session.selection {
            scene.translate_brick(*brick, offset);
        }
    }

    fn remove_preconnect(session: &mut AssemblySession, scene: &mut BrickScene) {
        Self::offset_selection(session, scene, -session.preconnect);
        session.preconnect = Vec3::ZERO;
    }

    /// Place the moving selection under the pointer and snap it to the best
    /// connection in range.
    ///
    /// # Returns
    /// `false` when the new placement collided and the last good placement
    /// was restored
    fn compute_new_connection(&self, session: &mut AssemblySession, scene: &mut BrickScene, position: Vec2) -> bool {
        let Some(focus) = session.focus.filter(|f| scene.contains_brick(*f)) else {
            return false;
        };
        Self::remove_preconnect(session, scene);
        session.snapped = None;

        let Some(pivot) = session.pivot(scene) else {
            return false;
        };
        let ray = self.camera.screen_to_ray(position);
        if let Some(alignment) = align_bricks(
            scene,
            &self.query,
            focus,
            &session.selection,
            pivot,
            &ray,
            self.settings.reference_plane_height,
        ) {
            let (axis, angle) = alignment.rotation.to_axis_angle();
            align_transformations(scene, &session.selection, pivot, axis, angle, alignment.aligned_offset);
            session.last_hit = Some(alignment.hit);
        }
        session.reset_positions(scene);

        if let Some(pivot) = session.pivot(scene) {
            let best = find_best_connection(scene, &self.query, &session.selection, pivot, &self.settings.search);
            if let Some(best) = best.filter(|b| can_connect(scene, b.target, session.last_hit.as_ref())) {
                for brick in &session.selection {
                    best.transform.apply(scene, *brick, pivot);
                }
                session.snapped = Some((best.moving, best.target));
                debug!("[Brick Builder] Snapped {:?} -> {:?} (score {:.3})", best.moving, best.target, best.score);
            }
        }

        if session.snapped.is_some() {
            session.preconnect = preconnect_place_offset(scene, &session.selection);
            Self::offset_selection(session, scene, session.preconnect);
        }

        if collide_at_transformation(scene, &self.query, &session.selection) {
            debug!("[Brick Builder] Placement collides, keeping last good placement");
            session.restore_good(scene);
            return false;
        }
        session.capture_good(scene);
        true
    }

    /// Commit the move: drop the hover offset, then link every coinciding
    /// pair, or revert the whole move if the placement collides.
    fn place(&self, session: &mut AssemblySession, scene: &mut BrickScene, position: Vec2) {
        let due = session
            .last_evaluation
            .is_none_or(|p| p.distance(position) > self.settings.place_tolerance);
        if due {
            self.compute_new_connection(session, scene, position);
        }
        Self::remove_preconnect(session, scene);

        let (selection, focus) = if collide_at_transformation(scene, &self.query, &session.selection) {
            warn!("[Brick Builder] Placement collides, move reverted");
            session.undo.discard_last();
            if session.spawned.is_empty() {
                if let Some(pre_move) = &session.pre_move {
                    pre_move.restore(scene);
                }
                (session.selection.clone(), session.focus)
            } else {
                for copy in &session.spawned {
                    scene.destroy_brick(*copy);
                }
                (session.duplicated_from.clone(), None)
            }
        } else {
            let links = Self::connect_selection(session, scene);
            info!(
                "[Brick Builder] Placed {} bricks with {} new links",
                session.selection.len(),
                links
            );
            (session.selection.clone(), session.focus)
        };

        session.clear_move();
        session.selection = selection.clone();
        session.state = BuilderState::Selected;
        session.queue.push(QueuedCommand::ApplySelection {
            bricks: selection,
            focus,
        });
    }

    /// Link every valid coinciding pair between the selection and the scene.
    fn connect_selection(session: &AssemblySession, scene: &mut BrickScene) -> usize {
        let mut links = 0;
        for brick in &session.selection {
            for field in scene.connectable_fields(*brick) {
                for (a, b) in scene.query_connections(field) {
                    if scene.connection_valid(a, b) {
                        scene.connect(a, b);
                        links += 1;
                    }
                }
            }
        }
        links
    }

    // ========================================================================
    // ROTATE / NUDGE
    // ========================================================================

    /// Quarter turn of the moving selection about the pointer anchor, then a
    /// fresh search from the same pointer position.
    fn rotate(&self, session: &mut AssemblySession, scene: &mut BrickScene, key: InteractionKey) {
        Self::remove_preconnect(session, scene);
        let Some(pivot) = session.pivot(scene) else {
            return;
        };
        let camera_right = snap_major_axis(self.camera.right(), true);
        let (axis, angle) = match key {
            InteractionKey::Left => (Vec3::Y, -FRAC_PI_2),
            InteractionKey::Right => (Vec3::Y, FRAC_PI_2),
            InteractionKey::Up => (camera_right, FRAC_PI_2),
            InteractionKey::Down => (camera_right, -FRAC_PI_2),
        };
        align_transformations(scene, &session.selection, pivot, axis, angle, Vec3::ZERO);

        let position = session.last_pointer;
        self.compute_new_connection(session, scene, position);
        session.last_evaluation = Some(position);
        debug!("[Brick Builder] Rotated selection {:?}", key);
    }

    /// One grid step of the selected bricks along a camera-snapped axis.
    fn nudge(&self, session: &mut AssemblySession, scene: &mut BrickScene, key: InteractionKey) {
        if session.selection.is_empty() || session.focus.is_none() {
            return;
        }
        let right = snap_major_axis(self.camera.right(), true);
        let up = snap_major_axis(self.camera.up(), true);
        let vertical_step = if snap_major_axis(self.camera.up(), false) == Vec3::Y {
            PLATE_HEIGHT
        } else {
            LU_10
        };
        let offset = match key {
            InteractionKey::Left => -right * LU_10,
            InteractionKey::Right => right * LU_10,
            InteractionKey::Up => up * vertical_step,
            InteractionKey::Down => -up * vertical_step,
        };

        let label = "Nudge bricks";
        let snapshot = Snapshot::capture(scene, &session.selection);
        session.undo.push(label, snapshot.clone());
        session
            .notifications
            .push(HostNotification::UndoCheckpoint(label.to_string()));

        let keep: HashSet<BrickId> = session.selection.iter().copied().collect();
        for brick in &session.selection {
            for field in scene.brick_fields(*brick) {
                scene.disconnect_inverse(field, &keep);
            }
        }
        Self::offset_selection(session, scene, offset);

        if collide_at_transformation(scene, &self.query, &session.selection) {
            debug!("[Brick Builder] Nudge collides, reverted");
            snapshot.restore(scene);
            session.undo.discard_last();
            return;
        }
        let links = Self::connect_selection(session, scene);
        debug!("[Brick Builder] Nudged selection by {:?}, {} links", offset, links);
    }

    // ========================================================================
    // CANCEL / UNDO
    // ========================================================================

    fn cancel(&self, session: &mut AssemblySession) {
        match session.state {
            BuilderState::Moving => {
                info!("[Brick Builder] Move cancelled");
                session.state = BuilderState::Selected;
                session.queue.push(QueuedCommand::PerformUndo);
            }
            BuilderState::Dragging => {
                session.state = if session.selection.is_empty() {
                    BuilderState::NoSelection
                } else {
                    BuilderState::Selected
                };
                session.clear_pointer();
            }
            _ => {}
        }
    }

    fn request_undo(&self, session: &mut AssemblySession) {
        if matches!(session.state, BuilderState::Moving | BuilderState::Dragging) {
            session.state = BuilderState::Selected;
        }
        session.queue.push(QueuedCommand::PerformUndo);
    }

    fn perform_undo(&self, session: &mut AssemblySession, scene: &mut BrickScene) {
        let undone = session.undo.undo(scene);
        match &undone {
            Some(entry) => info!("[Brick Builder] Undo '{}'", entry.label),
            None => debug!("[Brick Builder] Nothing to undo"),
        }
        // Copies of a move still in flight belong to the entry just undone
        for copy in &session.spawned {
            scene.destroy_brick(*copy);
        }
        let (selection, focus) = if !session.duplicated_from.is_empty() {
            (session.duplicated_from.clone(), None)
        } else if undone.as_ref().is_some_and(|e| !e.created.is_empty()) {
            (Vec::new(), None)
        } else {
            (session.selection.clone(), session.focus)
        };
        session.clear_move();
        session.clear_pointer();
        if matches!(session.state, BuilderState::Moving | BuilderState::Dragging) {
            session.state = BuilderState::Selected;
        }
        session.apply_selection(scene, &selection, focus);
    }

    // ========================================================================
    // SELECTION COMMANDS
    // ========================================================================

    /// Copy the selection and pick the copies up at the focus brick.
    fn duplicate(&self, session: &mut AssemblySession, scene: &mut BrickScene) {
        if session.state != BuilderState::Selected || session.selection.is_empty() {
            return;
        }
        let pairs = scene.duplicate_bricks(&session.selection);
        if pairs.is_empty() {
            return;
        }
        let focus_copy = session
            .focus
            .and_then(|f| pairs.iter().find(|(original, _)| *original == f))
            .map_or(pairs[0].1, |(_, copy)| *copy);

        session.duplicated_from = session.selection.clone();
        session.selection = pairs.iter().map(|(_, copy)| *copy).collect();
        session.spawned = session.selection.clone();
        session.focus = Some(focus_copy);
        session.queue.push(QueuedCommand::ApplySelection {
            bricks: session.selection.clone(),
            focus: Some(focus_copy),
        });

        let anchor = scene.brick_world_bounds(focus_copy).center();
        self.start_move(session, scene, "Duplicate bricks", anchor);
        let position = session.last_pointer;
        self.compute_new_connection(session, scene, position);
        session.last_evaluation = Some(position);
        info!("[Brick Builder] Duplicated {} bricks", pairs.len());
    }

    fn expand_selection(&self, session: &mut AssemblySession, scene: &BrickScene) {
        if session.state != BuilderState::Selected {
            return;
        }
        let mut bricks = session.selection.clone();
        for brick in &session.selection {
            for other in scene.connected_bricks(*brick, true) {
                if !bricks.contains(&other) {
                    bricks.push(other);
                }
            }
        }
        session.queue.push(QueuedCommand::ApplySelection {
            bricks,
            focus: session.focus,
        });
    }

    fn host_selection_changed(&self, session: &mut AssemblySession, scene: &BrickScene, bricks: Vec<BrickId>) {
        if matches!(session.state, BuilderState::Moving | BuilderState::Dragging) {
            debug!("[Brick Builder] Ignoring host selection during a drag");
            return;
        }
        let mut expanded = bricks;
        if session.select_connected && session.brick_building {
            let seeds = expanded.clone();
            for brick in seeds {
                for other in scene.connected_bricks(brick, true) {
                    if !expanded.contains(&other) {
                        expanded.push(other);
                    }
                }
            }
        }
        let focus = expanded.first().copied();
        session.queue.push(QueuedCommand::ApplySelection {
            bricks: expanded,
            focus,
        });
    }

    /// Drop links broken by transform edits made outside the builder.
    fn transforms_changed(&self, scene: &mut BrickScene, bricks: &[BrickId]) {
        let mut removed = 0;
        for brick in bricks {
            for field in scene.brick_fields(*brick) {
                removed += scene.disconnect_all_invalid(field);
            }
        }
        if removed > 0 {
            info!("[Brick Builder] Removed {} invalid connections", removed);
        }
    }

    fn toggle_brick_building(&self, session: &mut AssemblySession) {
        session.brick_building = !session.brick_building;
        if !session.brick_building {
            self.cancel(session);
            session.clear_pointer();
        }
        info!("[Brick Builder] Brick building: {}", session.brick_building);
    }
}
