//! Undo Snapshots
//!
//! A bounded undo stack of scene snapshots. Each snapshot records the
//! world transforms of a set of bricks and every link touching them, which is
//! all the builder ever changes.

use std::collections::HashSet;

use tracing::debug;

use crate::math::RigidTransform;
use crate::scene::{BrickId, BrickScene, ConnectionId};

// ============================================================================
// SNAPSHOT
// ============================================================================

/// Transforms and links of a set of bricks at one point in time
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Snapshot {
    pub transforms: Vec<(BrickId, RigidTransform)>,
    /// Active links with at least one end on a recorded brick, each pair once
    pub links: Vec<(ConnectionId, ConnectionId)>,
}

impl Snapshot {
    /// Record the current state of `bricks`; stale handles are skipped.
    pub fn capture(scene: &BrickScene, bricks: &[BrickId]) -> Self {
        let mut transforms = Vec::with_capacity(bricks.len());
        let mut links = Vec::new();
        let mut seen: HashSet<(ConnectionId, ConnectionId)> = HashSet::new();

        for brick in bricks {
            let Some(transform) = scene.brick_transform(*brick) else {
                continue;
            };
            transforms.push((*brick, transform));
            for field_id in scene.brick_fields(*brick) {
                for own in scene.connected_connections(field_id) {
                    let Some(peer) = scene.connection(own).and_then(|c| c.connected_to) else {
                        continue;
                    };
                    let key = if own < peer { (own, peer) } else { (peer, own) };
                    if seen.insert(key) {
                        links.push(key);
                    }
                }
            }
        }
        Self { transforms, links }
    }

    pub fn bricks(&self) -> Vec<BrickId> {
        self.transforms.iter().map(|(b, _)| *b).collect()
    }

    pub fn transform_of(&self, brick: BrickId) -> Option<RigidTransform> {
        self.transforms
            .iter()
            .find(|(b, _)| *b == brick)
            .map(|(_, t)| *t)
    }

    /// Put every recorded brick back where it was and relink it exactly as it
    /// was linked. Bricks destroyed since the capture are ignored.
    pub fn restore(&self, scene: &mut BrickScene) {
        for (brick, transform) in &self.transforms {
            if scene.set_brick_transform(*brick, *transform) {
                scene.disconnect_all_on_brick(*brick);
            }
        }
        for (a, b) in &self.links {
            scene.connect(*a, *b);
        }
        debug!(
            "[Brick Builder] Restored {} bricks and {} links",
            self.transforms.len(),
            self.links.len()
        );
    }
}

// ============================================================================
// UNDO STACK
// ============================================================================

/// Maximum number of entries stored in the undo stack.
/// When exceeded, the oldest entries are dropped.
pub const MAX_UNDO_SIZE: usize = 50;

/// One undoable builder operation
#[derive(Debug, Clone)]
pub struct UndoEntry {
    pub label: String,
    /// State before the operation
    pub before: Snapshot,
    /// Bricks the operation created; undoing destroys them
    pub created: Vec<BrickId>,
}

/// A bounded undo stack. Undone entries are dropped.
#[derive(Debug)]
pub struct UndoStack {
    entries: Vec<UndoEntry>,
    max_size: usize,
}

impl Default for UndoStack {
    fn default() -> Self {
        Self::new()
    }
}

impl UndoStack {
    /// Create an empty stack with the default max size (50).
    pub fn new() -> Self {
        Self::with_max_size(MAX_UNDO_SIZE)
    }

    pub fn with_max_size(max_size: usize) -> Self {
        Self {
            entries: Vec::new(),
            max_size: max_size.max(1),
        }
    }

    /// Record the state before an operation.
    pub fn push(&mut self, label: impl Into<String>, before: Snapshot) {
        self.push_created(label, before, Vec::new());
    }

    /// Record the state before an operation that spawns `created`.
    pub fn push_created(&mut self, label: impl Into<String>, before: Snapshot, created: Vec<BrickId>) {
        self.entries.push(UndoEntry {
            label: label.into(),
            before,
            created,
        });
        if self.entries.len() > self.max_size {
            let excess = self.entries.len() - self.max_size;
            self.entries.drain(0..excess);
        }
    }

    /// Drop the most recent entry without applying it (the operation was
    /// reverted by other means).
    pub fn discard_last(&mut self) -> Option<UndoEntry> {
        self.entries.pop()
    }

    /// Revert the most recent operation: created bricks are destroyed, then
    /// the surviving recorded bricks are restored.
    ///
    /// # Returns
    /// The undone entry, or `None` if there is nothing to undo
    pub fn undo(&mut self, scene: &mut BrickScene) -> Option<UndoEntry> {
        let entry = self.entries.pop()?;
        for brick in &entry.created {
            scene.destroy_brick(*brick);
        }
        entry.before.restore(scene);
        if !entry.created.is_empty() {
            debug!("[Brick Builder] Undo destroyed {} created bricks", entry.created.len());
        }
        Some(entry)
    }

    pub fn can_undo(&self) -> bool {
        !self.entries.is_empty()
    }

    pub fn undo_count(&self) -> usize {
        self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use super::*;
    use crate::import::PartCatalog;
    use crate::math::BRICK_HEIGHT;

    fn stacked_pair() -> (BrickScene, BrickId, BrickId) {
        let catalog = PartCatalog::standard();
        let mut scene = BrickScene::new();
        let a = catalog.spawn(&mut scene, 3003, RigidTransform::IDENTITY).unwrap();
        let b = catalog
            .spawn(&mut scene, 3003, RigidTransform::from_translation(Vec3::new(0.0, BRICK_HEIGHT, 0.0)))
            .unwrap();
        for field in scene.brick_fields(b) {
            for (x, y) in scene.query_connections(field) {
                scene.connect(x, y);
            }
        }
        (scene, a, b)
    }

    #[test]
    fn test_snapshot_restores_transforms_and_links() {
        let (mut scene, _a, b) = stacked_pair();
        assert_eq!(scene.link_count(), 4);
        let snapshot = Snapshot::capture(&scene, &[b]);
        assert_eq!(snapshot.links.len(), 4);

        scene.disconnect_all_on_brick(b);
        scene.translate_brick(b, Vec3::new(5.0, 0.0, 0.0));
        assert_eq!(scene.link_count(), 0);

        snapshot.restore(&mut scene);
        assert_eq!(scene.brick_transform(b), snapshot.transform_of(b));
        assert_eq!(scene.link_count(), 4);
    }

    #[test]
    fn test_undo_restores_and_pops() {
        let (mut scene, _a, b) = stacked_pair();
        let mut stack = UndoStack::new();
        stack.push("Move", Snapshot::capture(&scene, &[b]));
        scene.disconnect_all_on_brick(b);
        scene.translate_brick(b, Vec3::new(5.0, 0.0, 0.0));

        assert_eq!(stack.undo(&mut scene).map(|e| e.label).as_deref(), Some("Move"));
        assert_eq!(scene.brick_transform(b).unwrap().translation, Vec3::new(0.0, BRICK_HEIGHT, 0.0));
        assert_eq!(scene.link_count(), 4);
        assert!(!stack.can_undo());
        assert!(stack.undo(&mut scene).is_none());
    }

    #[test]
    fn test_undo_destroys_created_bricks() {
        let (mut scene, a, b) = stacked_pair();
        let pairs = scene.duplicate_bricks(&[b]);
        let copy = pairs[0].1;
        let mut stack = UndoStack::new();
        stack.push_created("Duplicate", Snapshot::capture(&scene, &[copy]), vec![copy]);
        scene.translate_brick(copy, Vec3::new(4.0, 0.0, 0.0));

        let entry = stack.undo(&mut scene).unwrap();
        assert_eq!(entry.created, vec![copy]);
        assert!(!scene.contains_brick(copy));
        assert!(scene.contains_brick(a) && scene.contains_brick(b));
        assert_eq!(scene.link_count(), 4);
    }

    #[test]
    fn test_max_size_enforcement() {
        let (scene, a, _b) = stacked_pair();
        let mut stack = UndoStack::with_max_size(5);
        for i in 0..8 {
            stack.push(format!("Step {i}"), Snapshot::capture(&scene, &[a]));
        }
        assert_eq!(stack.undo_count(), 5);
        assert_eq!(stack.discard_last().map(|e| e.label), Some("Step 7".to_string()));
        assert_eq!(stack.undo_count(), 4);
    }
}
