//! Scene Module
//!
//! Arena-backed storage for every brick entity. Ownership runs
//! brick → parts → fields → connections; every reference in the other
//! direction (`part.brick`, `connection.field`, `connection.connected_to`)
//! is a plain handle that may go stale and is always re-resolved.
//!
//! # Submodules
//!
//! - [`arena`] - Generational tables and handle types
//! - [`part`] - Parts, colliders and the connectivity block
//! - [`brick`] - Brick aggregate: connected-brick graph, duplicate, destroy

pub mod arena;
pub mod brick;
pub mod part;

use glam::Vec3;
use tracing::debug;

use crate::connectivity::{Connection, ConnectionField, ConnectionFrame, ConnectorKind, Knob, Tube};
use crate::math::{Bounds, RigidTransform};
use arena::{Arena, define_handle};

pub use brick::Brick;
pub use part::{BoxCollider, Connectivity, Part};

define_handle!(
    /// Handle to a [`Brick`]
    BrickId
);
define_handle!(
    /// Handle to a [`Part`]
    PartId
);
define_handle!(
    /// Handle to a [`ConnectionField`]
    FieldId
);
define_handle!(
    /// Handle to a [`Connection`]
    ConnectionId
);
define_handle!(
    /// Handle to a [`Knob`]
    KnobId
);
define_handle!(
    /// Handle to a [`Tube`]
    TubeId
);

/// All bricks of one editing stage and everything they own.
#[derive(Debug, Default, Clone)]
pub struct BrickScene {
    pub(crate) bricks: Arena<BrickId, Brick>,
    pub(crate) parts: Arena<PartId, Part>,
    pub(crate) fields: Arena<FieldId, ConnectionField>,
    pub(crate) connections: Arena<ConnectionId, Connection>,
    pub(crate) knobs: Arena<KnobId, Knob>,
    pub(crate) tubes: Arena<TubeId, Tube>,
}

impl BrickScene {
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // ACCESSORS
    // ========================================================================

    pub fn brick(&self, id: BrickId) -> Option<&Brick> {
        self.bricks.get(id)
    }

    pub fn part(&self, id: PartId) -> Option<&Part> {
        self.parts.get(id)
    }

    pub fn field(&self, id: FieldId) -> Option<&ConnectionField> {
        self.fields.get(id)
    }

    pub fn connection(&self, id: ConnectionId) -> Option<&Connection> {
        self.connections.get(id)
    }

    pub fn knob(&self, id: KnobId) -> Option<&Knob> {
        self.knobs.get(id)
    }

    pub fn tube(&self, id: TubeId) -> Option<&Tube> {
        self.tubes.get(id)
    }

    pub fn contains_brick(&self, id: BrickId) -> bool {
        self.bricks.contains(id)
    }

    pub fn brick_count(&self) -> usize {
        self.bricks.len()
    }

    /// Live bricks in creation (slot) order.
    pub fn brick_ids(&self) -> Vec<BrickId> {
        self.bricks.handles().collect()
    }

    pub fn connection_ids(&self) -> Vec<ConnectionId> {
        self.connections.handles().collect()
    }

    /// Number of active links (each symmetric pair counted once).
    pub fn link_count(&self) -> usize {
        self.connections
            .iter()
            .filter(|(id, c)| c.connected_to.is_some_and(|peer| *id < peer))
            .count()
    }

    // ========================================================================
    // TRANSFORMS
    // ========================================================================

    pub fn brick_transform(&self, id: BrickId) -> Option<RigidTransform> {
        self.bricks.get(id).map(|b| b.transform)
    }

    /// Write a brick's world frame. Links are left untouched; callers that
    /// move bricks freely disconnect first.
    pub fn set_brick_transform(&mut self, id: BrickId, transform: RigidTransform) -> bool {
        match self.bricks.get_mut(id) {
            Some(brick) => {
                brick.transform = transform;
                true
            }
            None => false,
        }
    }

    pub fn set_brick_position(&mut self, id: BrickId, position: Vec3) -> bool {
        match self.bricks.get_mut(id) {
            Some(brick) => {
                brick.transform.translation = position;
                true
            }
            None => false,
        }
    }

    pub fn translate_brick(&mut self, id: BrickId, offset: Vec3) -> bool {
        match self.bricks.get_mut(id) {
            Some(brick) => {
                brick.transform.translation += offset;
                true
            }
            None => false,
        }
    }

    pub fn rotate_brick_around(&mut self, id: BrickId, pivot: Vec3, axis: Vec3, angle: f32) -> bool {
        match self.bricks.get_mut(id) {
            Some(brick) => {
                brick.transform.rotate_around(pivot, axis, angle);
                true
            }
            None => false,
        }
    }

    pub fn part_world_transform(&self, id: PartId) -> Option<RigidTransform> {
        let part = self.parts.get(id)?;
        let brick = self.bricks.get(part.brick)?;
        Some(brick.transform.compose(&part.local))
    }

    pub fn field_world_transform(&self, id: FieldId) -> Option<RigidTransform> {
        let field = self.fields.get(id)?;
        Some(self.part_world_transform(field.part)?.compose(&field.local))
    }

    /// World position, up and reference axis of a connection.
    pub fn connection_frame(&self, id: ConnectionId) -> Option<ConnectionFrame> {
        let connection = self.connections.get(id)?;
        let field_world = self.field_world_transform(connection.field)?;
        Some(ConnectionFrame {
            position: field_world.transform_point(connection.local_position),
            up: field_world.up(),
            reference: field_world.right(),
        })
    }

    // ========================================================================
    // OWNERSHIP LOOKUPS
    // ========================================================================

    pub fn field_part(&self, id: FieldId) -> Option<PartId> {
        self.fields.get(id).map(|f| f.part)
    }

    pub fn field_brick(&self, id: FieldId) -> Option<BrickId> {
        let part = self.parts.get(self.fields.get(id)?.part)?;
        self.bricks.contains(part.brick).then_some(part.brick)
    }

    pub fn connection_brick(&self, id: ConnectionId) -> Option<BrickId> {
        self.field_brick(self.connections.get(id)?.field)
    }

    pub fn connection_kind(&self, id: ConnectionId) -> Option<ConnectorKind> {
        let connection = self.connections.get(id)?;
        self.fields.get(connection.field).map(|f| f.kind)
    }

    /// Every field handle of a brick, in part order.
    pub fn brick_fields(&self, id: BrickId) -> Vec<FieldId> {
        let Some(brick) = self.bricks.get(id) else {
            return Vec::new();
        };
        brick
            .parts
            .iter()
            .filter_map(|p| self.parts.get(*p))
            .flat_map(|p| p.fields().iter().copied())
            .collect()
    }

    /// Fields of connectable (non-legacy) parts only.
    pub fn connectable_fields(&self, id: BrickId) -> Vec<FieldId> {
        let Some(brick) = self.bricks.get(id) else {
            return Vec::new();
        };
        brick
            .parts
            .iter()
            .filter_map(|p| self.parts.get(*p))
            .filter(|p| p.is_connectable())
            .flat_map(|p| p.fields().iter().copied())
            .collect()
    }

    // ========================================================================
    // CONSTRUCTION
    // ========================================================================

    pub fn spawn_brick(&mut self, design_id: u32, uuid: impl Into<String>, transform: RigidTransform) -> BrickId {
        self.bricks.insert(Brick::new(design_id, uuid.into(), transform))
    }

    /// Attach a new part to a brick.
    pub fn add_part(&mut self, brick: BrickId, design_id: u32, local: RigidTransform) -> Option<PartId> {
        if !self.bricks.contains(brick) {
            debug!("[Scene] add_part on missing brick {:?}", brick);
            return None;
        }
        let id = self.parts.insert(Part::new(design_id, brick, local));
        if let Some(b) = self.bricks.get_mut(brick) {
            b.parts.push(id);
        }
        Some(id)
    }

    pub fn part_mut(&mut self, id: PartId) -> Option<&mut Part> {
        self.parts.get_mut(id)
    }

    /// Give a part a connectivity block and fold its extents into the brick bounds.
    pub fn set_connectivity(&mut self, part: PartId, extents: Bounds) -> bool {
        let Some(p) = self.parts.get_mut(part) else {
            return false;
        };
        p.connectivity = Some(Connectivity {
            extents,
            fields: Vec::new(),
        });
        let brick = p.brick;
        self.recompute_brick_bounds(brick);
        true
    }

    pub fn add_field(&mut self, part: PartId, kind: ConnectorKind, local: RigidTransform) -> Option<FieldId> {
        if self.parts.get(part)?.connectivity.is_none() {
            return None;
        }
        let id = self.fields.insert(ConnectionField::new(part, kind, local));
        if let Some(connectivity) = self.parts.get_mut(part).and_then(|p| p.connectivity.as_mut()) {
            connectivity.fields.push(id);
        }
        Some(id)
    }

    pub fn add_connection(&mut self, field: FieldId, local_position: Vec3) -> Option<ConnectionId> {
        if !self.fields.contains(field) {
            return None;
        }
        let id = self.connections.insert(Connection::new(field, local_position));
        if let Some(f) = self.fields.get_mut(field) {
            f.connections.push(id);
        }
        Some(id)
    }

    pub fn add_knob(&mut self, part: PartId, local_position: Vec3, local_up: Vec3) -> Option<KnobId> {
        if !self.parts.contains(part) {
            return None;
        }
        let id = self.knobs.insert(Knob::new(part, local_position, local_up));
        if let Some(p) = self.parts.get_mut(part) {
            p.knobs.push(id);
        }
        Some(id)
    }

    pub fn add_tube(&mut self, part: PartId, local_position: Vec3, local_up: Vec3, radius: f32) -> Option<TubeId> {
        if !self.parts.contains(part) {
            return None;
        }
        let id = self.tubes.insert(Tube::new(part, local_position, local_up, radius));
        if let Some(p) = self.parts.get_mut(part) {
            p.tubes.push(id);
        }
        Some(id)
    }

    pub(crate) fn recompute_brick_bounds(&mut self, brick: BrickId) {
        let Some(b) = self.bricks.get(brick) else {
            return;
        };
        let mut total = Bounds::EMPTY;
        for part_id in &b.parts {
            if let Some(part) = self.parts.get(*part_id) {
                if let Some(connectivity) = &part.connectivity {
                    total.encapsulate(&connectivity.extents.transformed(&part.local));
                }
                for collider in &part.colliders {
                    total.encapsulate(&collider.to_world(&part.local).bounds());
                }
            }
        }
        if let Some(b) = self.bricks.get_mut(brick) {
            b.total_bounds = total;
        }
    }

    /// Refresh cached bounds after colliders were edited directly.
    pub fn refresh_bounds(&mut self, brick: BrickId) {
        self.recompute_brick_bounds(brick);
    }
}
