//! Building Module
//!
//! Connection search and placement validation for a set of moving bricks.
//!
//! # Submodules
//!
//! - [`search`] - Candidate gathering and best-connection scoring
//! - [`collision`] - Overlap predicate against non-moving geometry
//! - [`alignment`] - Free placement on a hit surface or reference plane

pub mod alignment;
pub mod collision;
pub mod search;

pub use alignment::{FreeAlignment, align_bricks, align_transformations, can_connect};
pub use collision::{COLLISION_TOLERANCE, collide_at_transformation, compute_bounds, is_colliding_at_transformation};
pub use search::{BestConnection, SearchSettings, candidate_bricks, find_best_connection, preconnect_place_offset};
