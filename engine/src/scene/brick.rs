//! Brick Aggregate
//!
//! A brick groups parts into one rigid unit, the unit of selection and
//! movement. Active connections between parts of different bricks form the
//! connected-bricks graph walked here.

use std::collections::{HashMap, HashSet};

use tracing::debug;

use super::{BrickId, BrickScene, ConnectionId, PartId};
use crate::connectivity::{Connection, ConnectionField, Knob, Tube};
use crate::math::{Bounds, RigidTransform};

/// A rigid assembly of one or more parts
#[derive(Debug, Clone)]
pub struct Brick {
    pub design_id: u32,
    pub uuid: String,
    pub name: String,
    /// World frame of the brick
    pub transform: RigidTransform,
    pub parts: Vec<PartId>,
    /// Brick-local union of part extents and colliders
    pub total_bounds: Bounds,
}

impl Brick {
    pub fn new(design_id: u32, uuid: String, transform: RigidTransform) -> Self {
        Self {
            design_id,
            name: design_id.to_string(),
            uuid,
            transform,
            parts: Vec::new(),
            total_bounds: Bounds::EMPTY,
        }
    }
}

impl BrickScene {
    /// Bricks reachable over active connections.
    ///
    /// # Arguments
    /// * `brick` - Origin brick, never part of the result
    /// * `recursive` - Follow links transitively; `false` returns direct neighbours only
    ///
    /// # Returns
    /// Neighbours in discovery order, each listed once
    pub fn connected_bricks(&self, brick: BrickId, recursive: bool) -> Vec<BrickId> {
        let mut visited: HashSet<BrickId> = HashSet::new();
        let mut result = Vec::new();
        if !self.bricks.contains(brick) {
            return result;
        }
        visited.insert(brick);

        let mut stack = vec![brick];
        while let Some(current) = stack.pop() {
            for neighbour in self.direct_neighbours(current) {
                if visited.insert(neighbour) {
                    result.push(neighbour);
                    if recursive {
                        stack.push(neighbour);
                    }
                }
            }
        }
        result
    }

    fn direct_neighbours(&self, brick: BrickId) -> Vec<BrickId> {
        let mut out = Vec::new();
        for field_id in self.connectable_fields(brick) {
            let Some(field) = self.fields.get(field_id) else {
                continue;
            };
            for connection_id in &field.connections {
                let peer = self
                    .connections
                    .get(*connection_id)
                    .and_then(|c| c.connected_to);
                if let Some(other) = peer.and_then(|p| self.connection_brick(p)) {
                    if other != brick && !out.contains(&other) {
                        out.push(other);
                    }
                }
            }
        }
        out
    }

    /// Sever every active connection on every part of the brick.
    pub fn disconnect_all_on_brick(&mut self, brick: BrickId) {
        for field in self.brick_fields(brick) {
            self.disconnect_all(field);
        }
    }

    /// True if any part came through the legacy import path.
    pub fn is_legacy(&self, brick: BrickId) -> bool {
        self.bricks.get(brick).is_some_and(|b| {
            b.parts
                .iter()
                .any(|p| self.parts.get(*p).is_none_or(|part| part.legacy))
        })
    }

    /// World-space AABB of a brick's cached bounds.
    pub fn brick_world_bounds(&self, brick: BrickId) -> Bounds {
        match self.bricks.get(brick) {
            Some(b) => b.total_bounds.transformed(&b.transform),
            None => Bounds::EMPTY,
        }
    }

    /// Disconnect and free a brick with everything it owns.
    pub fn destroy_brick(&mut self, brick: BrickId) -> bool {
        if !self.bricks.contains(brick) {
            return false;
        }
        self.disconnect_all_on_brick(brick);
        let Some(removed) = self.bricks.remove(brick) else {
            return false;
        };
        for part_id in removed.parts {
            let Some(part) = self.parts.remove(part_id) else {
                continue;
            };
            for knob in part.knobs {
                self.knobs.remove(knob);
            }
            for tube in part.tubes {
                self.tubes.remove(tube);
            }
            if let Some(connectivity) = part.connectivity {
                for field_id in connectivity.fields {
                    if let Some(field) = self.fields.remove(field_id) {
                        for connection in field.connections {
                            self.connections.remove(connection);
                        }
                    }
                }
            }
        }
        debug!("[Scene] Destroyed brick {:?}", brick);
        true
    }

    /// Deep-copy a set of bricks in place.
    ///
    /// Links between two duplicated bricks are re-created between the
    /// copies; links to anything outside the set are not copied, so the
    /// originals keep all of their connections.
    ///
    /// # Returns
    /// `(original, copy)` pairs in input order; missing bricks are skipped
    pub fn duplicate_bricks(&mut self, bricks: &[BrickId]) -> Vec<(BrickId, BrickId)> {
        let mut pairs = Vec::new();
        let mut connection_map: HashMap<ConnectionId, ConnectionId> = HashMap::new();

        for &original in bricks {
            let Some(source) = self.bricks.get(original).cloned() else {
                continue;
            };
            let mut copy = source.clone();
            copy.parts = Vec::new();
            let copy_id = self.bricks.insert(copy);

            for part_id in &source.parts {
                if let Some(new_part) = self.duplicate_part(*part_id, copy_id, &mut connection_map) {
                    if let Some(b) = self.bricks.get_mut(copy_id) {
                        b.parts.push(new_part);
                    }
                }
            }
            pairs.push((original, copy_id));
        }

        // Re-link only where both ends were copied
        let originals: Vec<ConnectionId> = connection_map.keys().copied().collect();
        for original in originals {
            let peer = self.connections.get(original).and_then(|c| c.connected_to);
            let (Some(peer), Some(&new_self)) = (peer, connection_map.get(&original)) else {
                continue;
            };
            if let Some(&new_peer) = connection_map.get(&peer) {
                if let Some(c) = self.connections.get_mut(new_self) {
                    c.connected_to = Some(new_peer);
                }
            }
        }
        for &copy in connection_map.values() {
            self.update_knobs_and_tubes(copy);
        }
        pairs
    }

    fn duplicate_part(
        &mut self,
        part_id: PartId,
        new_brick: BrickId,
        connection_map: &mut HashMap<ConnectionId, ConnectionId>,
    ) -> Option<PartId> {
        let source = self.parts.get(part_id)?.clone();
        let mut part = source.clone();
        part.brick = new_brick;
        part.knobs = Vec::new();
        part.tubes = Vec::new();
        if let Some(c) = part.connectivity.as_mut() {
            c.fields = Vec::new();
        }
        let new_part = self.parts.insert(part);

        let mut knob_map = HashMap::new();
        for knob_id in &source.knobs {
            if let Some(knob) = self.knobs.get(*knob_id).cloned() {
                let id = self.knobs.insert(Knob {
                    part: new_part,
                    connection: None,
                    ..knob
                });
                knob_map.insert(*knob_id, id);
                if let Some(p) = self.parts.get_mut(new_part) {
                    p.knobs.push(id);
                }
            }
        }
        let mut tube_map = HashMap::new();
        for tube_id in &source.tubes {
            if let Some(tube) = self.tubes.get(*tube_id).cloned() {
                let id = self.tubes.insert(Tube {
                    part: new_part,
                    connections: Vec::new(),
                    ..tube
                });
                tube_map.insert(*tube_id, id);
                if let Some(p) = self.parts.get_mut(new_part) {
                    p.tubes.push(id);
                }
            }
        }

        for field_id in source.fields() {
            let Some(field) = self.fields.get(*field_id).cloned() else {
                continue;
            };
            let new_field = self.fields.insert(ConnectionField {
                part: new_part,
                connections: Vec::new(),
                ..field.clone()
            });
            if let Some(c) = self.parts.get_mut(new_part).and_then(|p| p.connectivity.as_mut()) {
                c.fields.push(new_field);
            }
            for connection_id in &field.connections {
                let Some(connection) = self.connections.get(*connection_id).cloned() else {
                    continue;
                };
                let new_knob = connection.knob.and_then(|k| knob_map.get(&k).copied());
                let new_tubes: Vec<_> = connection
                    .tubes
                    .iter()
                    .filter_map(|t| tube_map.get(t).copied())
                    .collect();
                let new_connection = self.connections.insert(Connection {
                    field: new_field,
                    local_position: connection.local_position,
                    connected_to: None,
                    knob: new_knob,
                    tubes: new_tubes.clone(),
                });
                if let Some(k) = new_knob.and_then(|k| self.knobs.get_mut(k)) {
                    k.connection = Some(new_connection);
                }
                for t in new_tubes {
                    if let Some(tube) = self.tubes.get_mut(t) {
                        tube.connections.push(new_connection);
                    }
                }
                if let Some(f) = self.fields.get_mut(new_field) {
                    f.connections.push(new_connection);
                }
                connection_map.insert(*connection_id, new_connection);
            }
        }
        Some(new_part)
    }
}
