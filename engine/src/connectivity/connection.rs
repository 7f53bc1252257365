//! Connections
//!
//! Oriented connectable points. A connection belongs to exactly one field
//! and is linked to at most one peer; links are always symmetric.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::scene::{ConnectionId, FieldId, KnobId, TubeId};

/// Maximum number of tubes one connection can be associated with
pub const MAX_TUBES_PER_CONNECTION: usize = 4;

/// Geometric family of a connector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConnectorShape {
    /// Classic stud / anti-stud (knob on top, receptor underneath)
    Stud,
    /// Technic pin / pin hole
    Pin,
    /// Cross axle / axle hole
    Axle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Polarity {
    Male,
    Female,
}

/// Shape + polarity of every connection in a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectorKind {
    pub shape: ConnectorShape,
    pub polarity: Polarity,
}

impl ConnectorKind {
    pub const STUD: Self = Self {
        shape: ConnectorShape::Stud,
        polarity: Polarity::Male,
    };
    pub const ANTI_STUD: Self = Self {
        shape: ConnectorShape::Stud,
        polarity: Polarity::Female,
    };

    /// Same shape, opposite polarity.
    pub fn compatible_with(&self, other: &ConnectorKind) -> bool {
        self.shape == other.shape && self.polarity != other.polarity
    }

    /// Receptors on the underside of a brick sit inside tubes.
    pub fn is_relevant_for_tube(&self) -> bool {
        *self == Self::ANTI_STUD
    }
}

/// A connectable point on a field
#[derive(Debug, Clone)]
pub struct Connection {
    /// Owning field (non-owning back-reference)
    pub field: FieldId,
    /// Position in the field's frame
    pub local_position: Vec3,
    pub connected_to: Option<ConnectionId>,
    pub knob: Option<KnobId>,
    pub tubes: Vec<TubeId>,
}

impl Connection {
    pub fn new(field: FieldId, local_position: Vec3) -> Self {
        Self {
            field,
            local_position,
            connected_to: None,
            knob: None,
            tubes: Vec::new(),
        }
    }

    pub fn has_connection(&self) -> bool {
        self.connected_to.is_some()
    }
}

/// World-space frame of a connection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConnectionFrame {
    pub position: Vec3,
    /// Insertion direction shared by both sides of a link
    pub up: Vec3,
    /// Secondary axis used to resolve the twist about `up`
    pub reference: Vec3,
}
