//! Connection Fields
//!
//! Query, validate, link and unlink connections. Everything here is
//! evaluated every frame while a brick is dragged, so invalid requests are
//! answered with "no" / no-op rather than errors.

use std::collections::HashSet;

use tracing::debug;

use super::connection::ConnectorKind;
use crate::math::{PLATE_HEIGHT, RigidTransform, anchors_coincide};
use crate::scene::{BrickId, BrickScene, ConnectionId, FieldId, PartId};

/// An ordered group of connections on one part
#[derive(Debug, Clone)]
pub struct ConnectionField {
    /// Owning part (non-owning back-reference)
    pub part: PartId,
    pub kind: ConnectorKind,
    /// Frame relative to the owning part
    pub local: RigidTransform,
    pub connections: Vec<ConnectionId>,
}

impl ConnectionField {
    pub fn new(part: PartId, kind: ConnectorKind, local: RigidTransform) -> Self {
        Self {
            part,
            kind,
            local,
            connections: Vec::new(),
        }
    }
}

impl BrickScene {
    /// Connections of this field that currently have a peer.
    pub fn connected_connections(&self, field: FieldId) -> Vec<ConnectionId> {
        self.fields
            .get(field)
            .map(|f| {
                f.connections
                    .iter()
                    .copied()
                    .filter(|c| self.connections.get(*c).is_some_and(|c| c.has_connection()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Find coincident, compatible, unconnected partners for every free
    /// connection of `field`.
    ///
    /// Only bricks whose world bounds touch the field's brick are examined.
    ///
    /// # Returns
    /// `(connection in field, partner)` pairs in discovery order; a pair is
    /// never repeated in either orientation
    pub fn query_connections(&self, field: FieldId) -> Vec<(ConnectionId, ConnectionId)> {
        let mut result = Vec::new();
        let Some(own_brick) = self.field_brick(field) else {
            return result;
        };
        let Some(f) = self.fields.get(field) else {
            return result;
        };
        if !self.parts.get(f.part).is_some_and(|p| p.is_connectable()) {
            return result;
        }

        let search_area = self.brick_world_bounds(own_brick).expanded(crate::math::POSITION_EPSILON);
        let neighbours: Vec<BrickId> = self
            .bricks
            .handles()
            .filter(|b| *b != own_brick)
            .filter(|b| self.brick_world_bounds(*b).intersects(&search_area))
            .collect();

        let mut seen: HashSet<(ConnectionId, ConnectionId)> = HashSet::new();
        for connection in &f.connections {
            let Some(frame) = self.connection_frame(*connection) else {
                continue;
            };
            if self.connections.get(*connection).is_none_or(|c| c.has_connection()) {
                continue;
            }
            for other_brick in &neighbours {
                for other_field in self.connectable_fields(*other_brick) {
                    let Some(of) = self.fields.get(other_field) else {
                        continue;
                    };
                    if !f.kind.compatible_with(&of.kind) {
                        continue;
                    }
                    for other in &of.connections {
                        let Some(other_frame) = self.connection_frame(*other) else {
                            continue;
                        };
                        if !anchors_coincide(frame.position, frame.up, other_frame.position, other_frame.up) {
                            continue;
                        }
                        if !self.connection_valid(*connection, *other) {
                            continue;
                        }
                        let key = if connection < other {
                            (*connection, *other)
                        } else {
                            (*other, *connection)
                        };
                        if seen.insert(key) {
                            result.push((*connection, *other));
                        }
                    }
                }
            }
        }
        result
    }

    /// Whether two connections may be linked.
    ///
    /// False when either handle is stale, either side already has a peer,
    /// the connector kinds are not complementary, either part is legacy or
    /// both connections sit on the same brick.
    pub fn connection_valid(&self, a: ConnectionId, b: ConnectionId) -> bool {
        if a == b {
            return false;
        }
        let (Some(ca), Some(cb)) = (self.connections.get(a), self.connections.get(b)) else {
            return false;
        };
        if ca.has_connection() || cb.has_connection() {
            return false;
        }
        let (Some(fa), Some(fb)) = (self.fields.get(ca.field), self.fields.get(cb.field)) else {
            return false;
        };
        if !fa.kind.compatible_with(&fb.kind) {
            return false;
        }
        let (Some(pa), Some(pb)) = (self.parts.get(fa.part), self.parts.get(fb.part)) else {
            return false;
        };
        if pa.legacy || pb.legacy {
            return false;
        }
        pa.brick != pb.brick && self.bricks.contains(pa.brick) && self.bricks.contains(pb.brick)
    }

    /// Link two connections symmetrically.
    ///
    /// Any previous peer of either side is released first. Linking two
    /// connections that already point at each other changes nothing.
    pub fn connect(&mut self, a: ConnectionId, b: ConnectionId) {
        if a == b || !self.connections.contains(a) || !self.connections.contains(b) {
            debug!("[Connectivity] Ignoring connect of {:?} and {:?}", a, b);
            return;
        }
        if self.connection_brick(a) == self.connection_brick(b) {
            debug!("[Connectivity] Refusing self-brick link {:?} - {:?}", a, b);
            return;
        }
        let already = self.connections.get(a).and_then(|c| c.connected_to) == Some(b)
            && self.connections.get(b).and_then(|c| c.connected_to) == Some(a);
        if already {
            return;
        }
        self.disconnect(a);
        self.disconnect(b);
        if let Some(c) = self.connections.get_mut(a) {
            c.connected_to = Some(b);
        }
        if let Some(c) = self.connections.get_mut(b) {
            c.connected_to = Some(a);
        }
        self.update_knobs_and_tubes(a);
        self.update_knobs_and_tubes(b);
    }

    /// Remove the link of `connection` on both sides.
    pub fn disconnect(&mut self, connection: ConnectionId) {
        let Some(peer) = self.connections.get_mut(connection).and_then(|c| c.connected_to.take()) else {
            return;
        };
        if let Some(p) = self.connections.get_mut(peer) {
            if p.connected_to == Some(connection) {
                p.connected_to = None;
            }
        }
        self.update_knobs_and_tubes(connection);
        self.update_knobs_and_tubes(peer);
    }

    pub fn disconnect_all(&mut self, field: FieldId) {
        let Some(f) = self.fields.get(field) else {
            return;
        };
        for connection in f.connections.clone() {
            self.disconnect(connection);
        }
    }

    /// Remove only links whose other side lies on a brick outside `keep`.
    ///
    /// Used before moving a selection: links inside the moving group survive,
    /// links to the rest of the scene are severed.
    pub fn disconnect_inverse(&mut self, field: FieldId, keep: &HashSet<BrickId>) {
        let Some(f) = self.fields.get(field) else {
            return;
        };
        for connection in f.connections.clone() {
            let Some(peer) = self.connections.get(connection).and_then(|c| c.connected_to) else {
                continue;
            };
            let inside = self.connection_brick(peer).is_some_and(|b| keep.contains(&b));
            if !inside {
                self.disconnect(connection);
            }
        }
    }

    /// Remove links whose two ends no longer coincide (after a transform was
    /// edited outside the builder) or whose peer is gone.
    pub fn disconnect_all_invalid(&mut self, field: FieldId) -> usize {
        let Some(f) = self.fields.get(field) else {
            return 0;
        };
        let mut removed = 0;
        for connection in f.connections.clone() {
            let Some(peer) = self.connections.get(connection).and_then(|c| c.connected_to) else {
                continue;
            };
            let still_valid = match (self.connection_frame(connection), self.connection_frame(peer)) {
                (Some(a), Some(b)) => anchors_coincide(a.position, a.up, b.position, b.up),
                _ => false,
            };
            if !still_valid {
                if self.connections.contains(peer) {
                    self.disconnect(connection);
                } else if let Some(c) = self.connections.get_mut(connection) {
                    c.connected_to = None;
                    self.update_knobs_and_tubes(connection);
                }
                removed += 1;
            }
        }
        removed
    }

    /// Hover offset shown while a snap onto `target` is previewed: the
    /// moving brick floats one plate above studs, nothing for other kinds.
    pub fn preconnect_offset(&self, target: ConnectionId) -> glam::Vec3 {
        match (self.connection_kind(target), self.connection_frame(target)) {
            (Some(kind), Some(frame)) if kind == ConnectorKind::STUD => frame.up * PLATE_HEIGHT,
            _ => glam::Vec3::ZERO,
        }
    }
}
