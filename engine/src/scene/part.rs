//! Parts
//!
//! A part is one rigid piece of geometry inside a brick. It carries the
//! collision boxes used by placement checks and, unless it came through the
//! legacy import path, a connectivity block with its connection fields.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use super::{BrickId, FieldId, KnobId, TubeId};
use crate::math::{Bounds, OrientedBox, RigidTransform};

/// Box collider in part-local space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoxCollider {
    pub center: Vec3,
    pub half_extents: Vec3,
    #[serde(default = "identity_rotation")]
    pub rotation: Quat,
}

fn identity_rotation() -> Quat {
    Quat::IDENTITY
}

impl BoxCollider {
    pub fn new(center: Vec3, half_extents: Vec3) -> Self {
        Self {
            center,
            half_extents,
            rotation: Quat::IDENTITY,
        }
    }

    /// Place the collider in the world given its part's world frame.
    pub fn to_world(&self, part_world: &RigidTransform) -> OrientedBox {
        OrientedBox::new(
            part_world.transform_point(self.center),
            self.half_extents,
            part_world.rotation * self.rotation,
        )
    }
}

/// Connection fields of a part plus their combined extents.
#[derive(Debug, Clone, Default)]
pub struct Connectivity {
    /// Part-local bounds of all connection geometry
    pub extents: Bounds,
    pub fields: Vec<FieldId>,
}

/// A single piece of brick geometry
#[derive(Debug, Clone)]
pub struct Part {
    pub design_id: u32,
    /// Owning brick (non-owning back-reference)
    pub brick: BrickId,
    /// Frame relative to the owning brick
    pub local: RigidTransform,
    /// Imported without collider/connectivity data
    pub legacy: bool,
    pub material_ids: Vec<u32>,
    pub colliders: Vec<BoxCollider>,
    pub connectivity: Option<Connectivity>,
    pub knobs: Vec<KnobId>,
    pub tubes: Vec<TubeId>,
}

impl Part {
    pub fn new(design_id: u32, brick: BrickId, local: RigidTransform) -> Self {
        Self {
            design_id,
            brick,
            local,
            legacy: false,
            material_ids: Vec::new(),
            colliders: Vec::new(),
            connectivity: None,
            knobs: Vec::new(),
            tubes: Vec::new(),
        }
    }

    /// Field handles, empty for parts without connectivity.
    pub fn fields(&self) -> &[FieldId] {
        self.connectivity
            .as_ref()
            .map(|c| c.fields.as_slice())
            .unwrap_or(&[])
    }

    /// Whether this part can take part in connection search.
    pub fn is_connectable(&self) -> bool {
        !self.legacy && self.connectivity.is_some()
    }
}
