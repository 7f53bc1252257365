//! Assembly Session
//!
//! All mutable state of one interactive editing session: selection, focus,
//! drag bookkeeping, pending commands, host notifications and undo history.
//! The controller receives it by `&mut` on every call.

use std::collections::HashMap;

use glam::{Vec2, Vec3};
use tracing::{debug, info};

use super::commands::CommandQueue;
use super::undo::{Snapshot, UndoStack};
use crate::config::BuilderSettings;
use crate::math::RigidTransform;
use crate::scene::{BrickId, BrickScene, ConnectionId};
use crate::spatial::RayHit;

/// Controller state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BuilderState {
    #[default]
    NoSelection,
    /// Pointer pressed on a brick, not yet moved past the drag threshold
    Dragging,
    Selected,
    /// Selection follows the pointer
    Moving,
}

/// Output for the host, drained once per tick
#[derive(Debug, Clone, PartialEq)]
pub enum HostNotification {
    /// The bricks the host should show as selected
    SelectionChanged(Vec<BrickId>),
    /// An undoable operation is about to change the scene
    UndoCheckpoint(String),
}

/// Transforms and snap state of the last collision-free placement
#[derive(Debug, Clone, Default)]
pub(crate) struct GoodPlacement {
    pub transforms: Vec<(BrickId, RigidTransform)>,
    pub preconnect: Vec3,
    pub snapped: Option<(ConnectionId, ConnectionId)>,
}

/// Mutable editor state, owned by the host and lent to the controller
#[derive(Debug)]
pub struct AssemblySession {
    pub(crate) state: BuilderState,
    pub(crate) selection: Vec<BrickId>,
    pub(crate) focus: Option<BrickId>,
    pub(crate) select_connected: bool,
    pub(crate) brick_building: bool,

    // Pointer
    pub(crate) press_position: Option<Vec2>,
    pub(crate) pressed_brick: Option<BrickId>,
    pub(crate) press_hit: Option<RayHit>,
    pub(crate) last_pointer: Vec2,
    pub(crate) last_evaluation: Option<Vec2>,

    // Moving
    /// Pointer anchor expressed in the focus brick's frame
    pub(crate) pickup_local: Vec3,
    /// Frame of every selected brick relative to the focus brick
    pub(crate) relative: HashMap<BrickId, RigidTransform>,
    pub(crate) pre_move: Option<Snapshot>,
    pub(crate) last_good: GoodPlacement,
    pub(crate) snapped: Option<(ConnectionId, ConnectionId)>,
    pub(crate) preconnect: Vec3,
    pub(crate) last_hit: Option<RayHit>,
    /// Copies created by a duplicate that has not been placed yet
    pub(crate) spawned: Vec<BrickId>,
    /// Selection before the duplicate, restored on cancel
    pub(crate) duplicated_from: Vec<BrickId>,

    pub(crate) queue: CommandQueue,
    pub(crate) notifications: Vec<HostNotification>,
    pub(crate) undo: UndoStack,
}

impl Default for AssemblySession {
    fn default() -> Self {
        Self::new(&BuilderSettings::default())
    }
}

impl AssemblySession {
    pub fn new(settings: &BuilderSettings) -> Self {
        Self {
            state: BuilderState::NoSelection,
            selection: Vec::new(),
            focus: None,
            select_connected: settings.select_connected,
            brick_building: settings.brick_building,
            press_position: None,
            pressed_brick: None,
            press_hit: None,
            last_pointer: Vec2::ZERO,
            last_evaluation: None,
            pickup_local: Vec3::ZERO,
            relative: HashMap::new(),
            pre_move: None,
            last_good: GoodPlacement::default(),
            snapped: None,
            preconnect: Vec3::ZERO,
            last_hit: None,
            spawned: Vec::new(),
            duplicated_from: Vec::new(),
            queue: CommandQueue::new(),
            notifications: Vec::new(),
            undo: UndoStack::with_max_size(settings.max_undo_steps),
        }
    }

    // ========================================================================
    // ACCESSORS
    // ========================================================================

    pub fn state(&self) -> BuilderState {
        self.state
    }

    pub fn selection(&self) -> &[BrickId] {
        &self.selection
    }

    pub fn focus(&self) -> Option<BrickId> {
        self.focus
    }

    pub fn select_connected(&self) -> bool {
        self.select_connected
    }

    pub fn brick_building(&self) -> bool {
        self.brick_building
    }

    /// Connection pair the moving selection is currently snapped to.
    pub fn snapped(&self) -> Option<(ConnectionId, ConnectionId)> {
        self.snapped
    }

    pub fn undo_stack(&self) -> &UndoStack {
        &self.undo
    }

    pub fn pending_commands(&self) -> usize {
        self.queue.len()
    }

    /// Take every notification produced since the last call.
    pub fn drain_notifications(&mut self) -> Vec<HostNotification> {
        std::mem::take(&mut self.notifications)
    }

    // ========================================================================
    // SELECTION
    // ========================================================================

    /// Replace the selection with the live bricks of `bricks`.
    ///
    /// Outside a move the state follows the selection (`Selected` or
    /// `NoSelection`); a move in progress keeps its state.
    pub(crate) fn apply_selection(&mut self, scene: &BrickScene, bricks: &[BrickId], focus: Option<BrickId>) {
        let mut live: Vec<BrickId> = Vec::with_capacity(bricks.len());
        for brick in bricks {
            if scene.contains_brick(*brick) && !live.contains(brick) {
                live.push(*brick);
            }
        }
        self.focus = focus
            .filter(|f| live.contains(f))
            .or_else(|| live.first().copied());
        self.selection = live;

        if !matches!(self.state, BuilderState::Moving | BuilderState::Dragging) {
            self.state = if self.selection.is_empty() {
                BuilderState::NoSelection
            } else {
                BuilderState::Selected
            };
        }
        debug!("[Brick Builder] Selection is now {} bricks", self.selection.len());
        self.notifications
            .push(HostNotification::SelectionChanged(self.selection.clone()));
    }

    /// Drop stale handles from the selection. A move that lost a brick is
    /// rolled back before the reset.
    ///
    /// # Returns
    /// `false` when the focus brick is gone, in which case the session has
    /// been reset to `NoSelection`
    pub(crate) fn prune(&mut self, scene: &mut BrickScene) -> bool {
        let before = self.selection.len();
        self.selection.retain(|b| scene.contains_brick(*b));
        if self.state == BuilderState::Moving && self.selection.len() != before {
            info!("[Brick Builder] A moving brick was removed, move reverted");
            self.abort_move(scene);
            self.reset();
            self.notifications.push(HostNotification::SelectionChanged(Vec::new()));
            return false;
        }
        self.spawned.retain(|b| scene.contains_brick(*b));
        if let Some(pressed) = self.pressed_brick {
            if !scene.contains_brick(pressed) {
                self.pressed_brick = None;
            }
        }
        let focus_alive = self.focus.is_some_and(|f| scene.contains_brick(f));
        if self.focus.is_some() && !focus_alive {
            info!("[Brick Builder] Focus brick was removed, resetting session");
            if self.state == BuilderState::Moving {
                self.abort_move(scene);
            }
            self.reset();
            self.notifications.push(HostNotification::SelectionChanged(Vec::new()));
            return false;
        }
        if self.focus.is_none() && matches!(self.state, BuilderState::Selected | BuilderState::Moving) {
            if self.state == BuilderState::Moving {
                self.abort_move(scene);
            }
            self.reset();
            return false;
        }
        true
    }

    /// Undo an unfinished move: surviving bricks go back to their pre-move
    /// transforms and links, copies of a duplicate are destroyed, and the
    /// move's undo entry is dropped.
    pub(crate) fn abort_move(&mut self, scene: &mut BrickScene) {
        if self.spawned.is_empty() {
            if let Some(pre_move) = &self.pre_move {
                pre_move.restore(scene);
            }
        } else {
            for copy in &self.spawned {
                scene.destroy_brick(*copy);
            }
        }
        self.undo.discard_last();
    }

    /// Forget selection and every in-flight operation.
    pub(crate) fn reset(&mut self) {
        self.state = BuilderState::NoSelection;
        self.selection.clear();
        self.focus = None;
        self.clear_pointer();
        self.clear_move();
    }

    pub(crate) fn clear_pointer(&mut self) {
        self.press_position = None;
        self.pressed_brick = None;
        self.press_hit = None;
        self.last_evaluation = None;
    }

    pub(crate) fn clear_move(&mut self) {
        self.relative.clear();
        self.pre_move = None;
        self.last_good = GoodPlacement::default();
        self.snapped = None;
        self.preconnect = Vec3::ZERO;
        self.last_hit = None;
        self.spawned.clear();
        self.duplicated_from.clear();
    }

    // ========================================================================
    // RIGID GROUP
    // ========================================================================

    /// Record every selected brick's frame relative to the focus brick.
    pub(crate) fn rebuild_relative(&mut self, scene: &BrickScene) {
        self.relative.clear();
        let Some(focus) = self.focus.and_then(|f| scene.brick_transform(f)) else {
            return;
        };
        let inverse = focus.inverse();
        for brick in &self.selection {
            if let Some(t) = scene.brick_transform(*brick) {
                self.relative.insert(*brick, inverse.compose(&t));
            }
        }
    }

    /// Re-derive every selected brick from the focus frame so the group
    /// stays rigid.
    pub(crate) fn reset_positions(&self, scene: &mut BrickScene) {
        let Some(focus) = self.focus.and_then(|f| scene.brick_transform(f)) else {
            return;
        };
        for (brick, relative) in &self.relative {
            scene.set_brick_transform(*brick, focus.compose(relative));
        }
    }

    /// World position of the pointer anchor on the focus brick.
    pub(crate) fn pivot(&self, scene: &BrickScene) -> Option<Vec3> {
        let focus = scene.brick_transform(self.focus?)?;
        Some(focus.transform_point(self.pickup_local))
    }

    pub(crate) fn capture_good(&mut self, scene: &BrickScene) {
        self.last_good = GoodPlacement {
            transforms: self
                .selection
                .iter()
                .filter_map(|b| scene.brick_transform(*b).map(|t| (*b, t)))
                .collect(),
            preconnect: self.preconnect,
            snapped: self.snapped,
        };
    }

    pub(crate) fn restore_good(&mut self, scene: &mut BrickScene) {
        for (brick, transform) in &self.last_good.transforms {
            scene.set_brick_transform(*brick, *transform);
        }
        self.preconnect = self.last_good.preconnect;
        self.snapped = self.last_good.snapped;
    }
}
