//! Render Module
//!
//! Host-facing output of the builder. The renderer itself lives in the host;
//! this module only packs brick transforms and highlight state into a flat
//! instance buffer.
//!
//! # Submodules
//!
//! - [`instances`] - `BrickInstance` records and the selection flags

pub mod instances;

pub use instances::{
    BrickInstance, FLAG_FOCUS, FLAG_LEGACY, FLAG_SELECTED, build_instances, instance_bytes, material_tint,
};
