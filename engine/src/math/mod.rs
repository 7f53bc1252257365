//! Math Module
//!
//! Geometry helpers shared by the connection model, the search and the
//! editor controller.
//!
//! # Unit System
//!
//! **1 unit = 1 world unit, 0.8 units = 1 stud pitch** (see [`snap::LU_10`])

pub mod bounds;
pub mod oriented_box;
pub mod snap;
pub mod transform;

pub use bounds::Bounds;
pub use oriented_box::OrientedBox;
pub use snap::{
    BRICK_HEIGHT, LU_1, LU_5, LU_10, ORIENTATION_EPSILON, PLATE_HEIGHT, POSITION_EPSILON,
    anchors_coincide, snap_major_axis, snap_to_grid,
};
pub use transform::RigidTransform;
