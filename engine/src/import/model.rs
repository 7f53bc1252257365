//! Model Description
//!
//! The already-parsed form of a model file (bricks, their parts and the
//! groups they belong to) and the [`Model`] record an import leaves behind.

use std::path::Path;

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::error::ImportError;
use crate::scene::BrickId;

/// How the bricks of a group are brought into the scene
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum GroupType {
    /// Not imported at all
    Ignore,
    /// Colliders and connectivity; links only inside the group
    Static,
    /// Colliders and connectivity; links to anything
    #[default]
    Dynamic,
    /// Visual only: no colliders, no connectivity
    Environment,
}

impl GroupType {
    /// Whether parts of this group get colliders and connectivity.
    pub fn is_physical(&self) -> bool {
        matches!(self, GroupType::Static | GroupType::Dynamic)
    }
}

/// Where the model origin is placed after import
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Pivot {
    /// Keep the source coordinates
    #[default]
    Original,
    /// Center of the model bounds
    Center,
    /// Center of the bottom face of the model bounds
    BottomCenter,
}

fn identity_rotation() -> Quat {
    Quat::IDENTITY
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartDescription {
    pub design_id: u32,
    /// World position of the part in the source file
    #[serde(default)]
    pub position: Vec3,
    #[serde(default = "identity_rotation")]
    pub rotation: Quat,
    #[serde(default)]
    pub materials: Vec<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrickDescription {
    /// Identifier used by groups to refer to this brick
    pub ref_id: u32,
    pub design_id: u32,
    #[serde(default)]
    pub uuid: String,
    pub parts: Vec<PartDescription>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupDescription {
    pub number: usize,
    pub name: String,
    #[serde(default)]
    pub group_type: GroupType,
    pub brick_refs: Vec<u32>,
}

/// A parsed model file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelDescription {
    pub name: String,
    pub bricks: Vec<BrickDescription>,
    #[serde(default)]
    pub groups: Vec<GroupDescription>,
}

impl ModelDescription {
    pub fn from_json(json: &str) -> Result<Self, ImportError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read a model description from a JSON file.
    pub fn load(path: &Path) -> Result<Self, ImportError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Group a brick belongs to, if any.
    pub fn group_of(&self, ref_id: u32) -> Option<&GroupDescription> {
        self.groups.iter().find(|g| g.brick_refs.contains(&ref_id))
    }
}

/// One imported group
#[derive(Debug, Clone, PartialEq)]
pub struct ModelGroup {
    pub number: usize,
    pub name: String,
    pub group_type: GroupType,
    pub bricks: Vec<BrickId>,
}

/// What an import left in the scene
#[derive(Debug, Clone, PartialEq)]
pub struct Model {
    pub name: String,
    pub pivot: Pivot,
    /// Translation applied to every brick to honour `pivot`
    pub pivot_offset: Vec3,
    pub groups: Vec<ModelGroup>,
    /// Bricks that belong to no group
    pub ungrouped: Vec<BrickId>,
}

impl Model {
    /// Every brick of the model, grouped ones first.
    pub fn bricks(&self) -> Vec<BrickId> {
        self.groups
            .iter()
            .flat_map(|g| g.bricks.iter().copied())
            .chain(self.ungrouped.iter().copied())
            .collect()
    }

    pub fn group(&self, number: usize) -> Option<&ModelGroup> {
        self.groups.iter().find(|g| g.number == number)
    }
}
