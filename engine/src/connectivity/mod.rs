//! Connectivity Module
//!
//! The connection model: typed connection points grouped in fields, the
//! symmetric links between them and the snap math that brings two of them
//! together.
//!
//! # Submodules
//!
//! - [`connection`] - Connector kinds and single connection points
//! - [`field`] - Query / validate / connect / disconnect
//! - [`transformation`] - Rigid motion that snaps one connection onto another
//! - [`common_parts`] - Knob and tube visibility tied to link state

pub mod common_parts;
pub mod connection;
pub mod field;
pub mod transformation;

pub use common_parts::{Knob, Tube};
pub use connection::{
    Connection, ConnectionFrame, ConnectorKind, ConnectorShape, MAX_TUBES_PER_CONNECTION, Polarity,
};
pub use field::ConnectionField;
pub use transformation::ConnectedTransform;
