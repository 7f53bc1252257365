//! Axis and Grid Snapping
//!
//! Helpers for turning free camera directions into cardinal axes and
//! positions into LEGO grid positions.

use glam::Vec3;

/// One LEGO unit (a fifth of a stud pitch, in world units)
pub const LU_1: f32 = 0.08;
/// Half a stud pitch
pub const LU_5: f32 = LU_1 * 5.0;
/// Stud pitch
pub const LU_10: f32 = LU_1 * 10.0;
/// Height of a plate
pub const PLATE_HEIGHT: f32 = LU_1 * 4.0;
/// Height of a brick (three plates)
pub const BRICK_HEIGHT: f32 = LU_1 * 12.0;

/// Maximum anchor distance for two connections to count as coincident
pub const POSITION_EPSILON: f32 = 0.01;
/// Maximum `1 - dot(up_a, up_b)` for two connections to count as aligned
pub const ORIENTATION_EPSILON: f32 = 0.01;

/// Snap a vector to the closest cardinal axis.
///
/// # Arguments
/// * `v` - Direction to snap
/// * `keep_sign` - When false the returned axis always points along +X, +Y or +Z
///
/// # Returns
/// A unit cardinal axis, or `Vec3::ZERO` for a zero input
pub fn snap_major_axis(v: Vec3, keep_sign: bool) -> Vec3 {
    let a = v.abs();
    if a.max_element() <= 0.0 {
        return Vec3::ZERO;
    }
    let (index, component) = if a.x >= a.y && a.x >= a.z {
        (0, v.x)
    } else if a.y >= a.z {
        (1, v.y)
    } else {
        (2, v.z)
    };
    let mut axis = Vec3::ZERO;
    axis[index] = if keep_sign { component.signum() } else { 1.0 };
    axis
}

/// Snap a scalar to the nearest multiple of `step`.
pub fn snap_to_grid(value: f32, step: f32) -> f32 {
    if step <= 0.0 {
        return value;
    }
    (value / step).round() * step
}

/// Whether two oriented points coincide within the connection epsilons.
pub fn anchors_coincide(pos_a: Vec3, up_a: Vec3, pos_b: Vec3, up_b: Vec3) -> bool {
    pos_a.distance(pos_b) < POSITION_EPSILON && 1.0 - up_a.dot(up_b) < ORIENTATION_EPSILON
}
