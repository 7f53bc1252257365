//! Knobs and Tubes
//!
//! Visual sub-meshes attached to parts. Their visibility follows the link
//! state of the connections they sit on: a knob pushed into another brick is
//! hidden, and so is a tube whose every surrounding receptor is filled.

use glam::Vec3;

use super::connection::MAX_TUBES_PER_CONNECTION;
use crate::math::{Bounds, ORIENTATION_EPSILON, POSITION_EPSILON};
use crate::scene::{BrickScene, ConnectionId, PartId};

/// Horizontal slack added around a tube when matching receptors to it
const TUBE_MATCH_MARGIN: f32 = 0.4;

/// A stud mesh on top of a part
#[derive(Debug, Clone)]
pub struct Knob {
    pub part: PartId,
    pub local_position: Vec3,
    pub local_up: Vec3,
    pub connection: Option<ConnectionId>,
    pub visible: bool,
}

impl Knob {
    pub fn new(part: PartId, local_position: Vec3, local_up: Vec3) -> Self {
        Self {
            part,
            local_position,
            local_up: local_up.normalize_or_zero(),
            connection: None,
            visible: true,
        }
    }
}

/// A tube mesh on the underside of a part
#[derive(Debug, Clone)]
pub struct Tube {
    pub part: PartId,
    pub local_position: Vec3,
    pub local_up: Vec3,
    pub radius: f32,
    pub connections: Vec<ConnectionId>,
    pub visible: bool,
}

impl Tube {
    pub fn new(part: PartId, local_position: Vec3, local_up: Vec3, radius: f32) -> Self {
        Self {
            part,
            local_position,
            local_up: local_up.normalize_or_zero(),
            radius,
            connections: Vec::new(),
            visible: true,
        }
    }
}

impl BrickScene {
    /// Refresh knob/tube visibility around one connection.
    pub fn update_knobs_and_tubes(&mut self, connection: ConnectionId) {
        let Some(c) = self.connections.get(connection) else {
            return;
        };
        let linked = c.connected_to.is_some();
        let knob = c.knob;
        let tubes = c.tubes.clone();

        if let Some(k) = knob.and_then(|k| self.knobs.get_mut(k)) {
            k.visible = !linked;
        }
        for tube_id in tubes {
            let all_linked = match self.tubes.get(tube_id) {
                Some(tube) => tube.connections.iter().all(|c| {
                    self.connections
                        .get(*c)
                        .is_some_and(|c| c.connected_to.is_some())
                }),
                None => continue,
            };
            if let Some(tube) = self.tubes.get_mut(tube_id) {
                tube.visible = !all_linked;
            }
        }
    }

    /// Associate every connection of a part with the knob sitting on it and
    /// with up to four tubes surrounding it.
    ///
    /// Positions and up vectors are compared in the part frame, using the
    /// same epsilons as connection matching.
    pub fn match_common_parts(&mut self, part: PartId) {
        let Some(p) = self.parts.get(part) else {
            return;
        };
        let knobs = p.knobs.clone();
        let tubes = p.tubes.clone();
        let fields = p.fields().to_vec();

        for field_id in fields {
            let Some(field) = self.fields.get(field_id) else {
                continue;
            };
            let field_local = field.local;
            let relevant_for_tube = field.kind.is_relevant_for_tube();
            let connections = field.connections.clone();
            let up = field_local.up();

            for connection_id in connections {
                let Some(connection) = self.connections.get(connection_id) else {
                    continue;
                };
                let position = field_local.transform_point(connection.local_position);

                let matched_knob = knobs.iter().copied().find(|k| {
                    self.knobs.get(*k).is_some_and(|knob| {
                        knob.connection.is_none()
                            && knob.local_position.distance(position) < POSITION_EPSILON
                            && 1.0 - knob.local_up.dot(up) < ORIENTATION_EPSILON
                    })
                });
                if let Some(k) = matched_knob {
                    if let Some(knob) = self.knobs.get_mut(k) {
                        knob.connection = Some(connection_id);
                    }
                    if let Some(c) = self.connections.get_mut(connection_id) {
                        c.knob = Some(k);
                    }
                }

                if !relevant_for_tube {
                    continue;
                }
                let mut matched_tubes = Vec::new();
                for tube_id in &tubes {
                    let Some(tube) = self.tubes.get(*tube_id) else {
                        continue;
                    };
                    let reach = Vec3::new(
                        tube.radius + TUBE_MATCH_MARGIN,
                        POSITION_EPSILON,
                        tube.radius + TUBE_MATCH_MARGIN,
                    );
                    let area = Bounds::from_center_extents(tube.local_position, reach);
                    if area.sqr_distance(position) < POSITION_EPSILON * POSITION_EPSILON
                        && 1.0 - tube.local_up.dot(up) < ORIENTATION_EPSILON
                    {
                        matched_tubes.push(*tube_id);
                    }
                    if matched_tubes.len() == MAX_TUBES_PER_CONNECTION {
                        break;
                    }
                }
                for tube_id in &matched_tubes {
                    if let Some(tube) = self.tubes.get_mut(*tube_id) {
                        tube.connections.push(connection_id);
                    }
                }
                if let Some(c) = self.connections.get_mut(connection_id) {
                    c.tubes = matched_tubes;
                }
            }
        }
    }
}
