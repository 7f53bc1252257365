//! Import Module
//!
//! Turns an already-parsed model description into bricks in a
//! [`crate::scene::BrickScene`].
//!
//! # Submodules
//!
//! - [`catalog`] - Part templates and the procedural standard catalog
//! - [`model`] - Serde model description and the imported model record
//! - [`importer`] - Import, connectivity detection and reimport

pub mod catalog;
pub mod importer;
pub mod model;

pub use catalog::{FieldTemplate, KnobTemplate, PartCatalog, PartTemplate, TubeTemplate};
pub use importer::{import_model, reimport_group, reimport_model};
pub use model::{
    BrickDescription, GroupDescription, GroupType, Model, ModelDescription, ModelGroup, PartDescription, Pivot,
};
