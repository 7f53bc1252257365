//! Rigid Transforms
//!
//! Translation + rotation pairs used for brick, part, field and connection
//! frames. Scale is never part of a brick frame, so a full matrix is only
//! produced at the renderer boundary.

use glam::{Mat4, Quat, Vec3};
use serde::{Deserialize, Serialize};

/// A rotation followed by a translation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RigidTransform {
    /// World (or parent) space position of the frame origin
    pub translation: Vec3,
    /// Orientation of the frame, always kept normalized
    pub rotation: Quat,
}

impl Default for RigidTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl RigidTransform {
    pub const IDENTITY: Self = Self {
        translation: Vec3::ZERO,
        rotation: Quat::IDENTITY,
    };

    pub fn new(translation: Vec3, rotation: Quat) -> Self {
        Self {
            translation,
            rotation: rotation.normalize(),
        }
    }

    pub fn from_translation(translation: Vec3) -> Self {
        Self {
            translation,
            rotation: Quat::IDENTITY,
        }
    }

    /// `self * child`: express a child frame given relative to `self` in the
    /// space `self` lives in.
    pub fn compose(&self, child: &RigidTransform) -> RigidTransform {
        RigidTransform {
            translation: self.translation + self.rotation * child.translation,
            rotation: (self.rotation * child.rotation).normalize(),
        }
    }

    pub fn inverse(&self) -> RigidTransform {
        let inv_rot = self.rotation.inverse();
        RigidTransform {
            translation: inv_rot * -self.translation,
            rotation: inv_rot,
        }
    }

    pub fn transform_point(&self, point: Vec3) -> Vec3 {
        self.translation + self.rotation * point
    }

    pub fn transform_vector(&self, vector: Vec3) -> Vec3 {
        self.rotation * vector
    }

    pub fn inverse_transform_point(&self, point: Vec3) -> Vec3 {
        self.rotation.inverse() * (point - self.translation)
    }

    pub fn inverse_transform_vector(&self, vector: Vec3) -> Vec3 {
        self.rotation.inverse() * vector
    }

    pub fn up(&self) -> Vec3 {
        self.rotation * Vec3::Y
    }

    pub fn right(&self) -> Vec3 {
        self.rotation * Vec3::X
    }

    pub fn forward(&self) -> Vec3 {
        self.rotation * Vec3::Z
    }

    /// Rotate the frame about a world-space pivot.
    ///
    /// # Arguments
    /// * `pivot` - World position the rotation is centered on
    /// * `axis` - Rotation axis (need not be normalized; zero axis is a no-op)
    /// * `angle` - Rotation angle in radians
    pub fn rotate_around(&mut self, pivot: Vec3, axis: Vec3, angle: f32) {
        let Some(axis) = axis.try_normalize() else {
            return;
        };
        self.rotate_around_by(pivot, Quat::from_axis_angle(axis, angle));
    }

    /// Same as [`rotate_around`](Self::rotate_around) with a prebuilt rotation.
    pub fn rotate_around_by(&mut self, pivot: Vec3, rotation: Quat) {
        self.translation = pivot + rotation * (self.translation - pivot);
        self.rotation = (rotation * self.rotation).normalize();
    }

    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_rotation_translation(self.rotation, self.translation)
    }

    /// Whether two frames agree within the given position / rotation tolerance.
    pub fn approx_eq(&self, other: &RigidTransform, position_epsilon: f32, angle_epsilon: f32) -> bool {
        self.translation.distance(other.translation) <= position_epsilon
            && self.rotation.angle_between(other.rotation) <= angle_epsilon
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn test_compose_then_inverse_is_identity() {
        let a = RigidTransform::new(Vec3::new(1.0, 2.0, 3.0), Quat::from_rotation_y(0.7));
        let b = a.compose(&a.inverse());
        assert!(b.translation.abs_diff_eq(Vec3::ZERO, 1e-5));
        assert!(b.rotation.angle_between(Quat::IDENTITY) < 1e-4);
    }

    #[test]
    fn test_inverse_transform_point() {
        let t = RigidTransform::new(Vec3::new(5.0, 0.0, 0.0), Quat::from_rotation_y(FRAC_PI_2));
        let p = Vec3::new(1.0, 1.0, 0.0);
        let world = t.transform_point(p);
        assert!(t.inverse_transform_point(world).abs_diff_eq(p, 1e-5));
    }

    #[test]
    fn test_rotate_around_pivot() {
        let mut t = RigidTransform::from_translation(Vec3::new(1.0, 0.0, 0.0));
        t.rotate_around(Vec3::ZERO, Vec3::Y, FRAC_PI_2);
        // +X rotated a quarter turn about +Y lands on -Z
        assert!(t.translation.abs_diff_eq(Vec3::new(0.0, 0.0, -1.0), 1e-5));
    }

    #[test]
    fn test_rotate_around_zero_axis_is_noop() {
        let mut t = RigidTransform::from_translation(Vec3::ONE);
        t.rotate_around(Vec3::ZERO, Vec3::ZERO, 1.0);
        assert_eq!(t, RigidTransform::from_translation(Vec3::ONE));
    }
}
