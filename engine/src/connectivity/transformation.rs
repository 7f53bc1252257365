//! Connected Transformation
//!
//! The rigid motion that carries one connection onto another: the moving
//! side's up vector is turned onto the target's, then twisted about it to the
//! nearest quarter turn, and finally translated so both anchors coincide.

use std::f32::consts::FRAC_PI_2;

use glam::{Quat, Vec3};

use crate::scene::{BrickId, BrickScene, ConnectionId};

/// Rotation about a pivot followed by a translation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConnectedTransform {
    /// Translation applied after the rotation
    pub offset: Vec3,
    /// Rotation angle in radians
    pub angle: f32,
    /// Unit rotation axis
    pub axis: Vec3,
}

impl ConnectedTransform {
    pub const IDENTITY: Self = Self {
        offset: Vec3::ZERO,
        angle: 0.0,
        axis: Vec3::Y,
    };

    pub fn rotation(&self) -> Quat {
        if self.angle == 0.0 {
            Quat::IDENTITY
        } else {
            Quat::from_axis_angle(self.axis, self.angle)
        }
    }

    /// Rotate `brick` about `pivot`, then move it by `offset`.
    pub fn apply(&self, scene: &mut BrickScene, brick: BrickId, pivot: Vec3) -> bool {
        let Some(mut transform) = scene.brick_transform(brick) else {
            return false;
        };
        transform.rotate_around_by(pivot, self.rotation());
        transform.translation += self.offset;
        scene.set_brick_transform(brick, transform)
    }
}

/// Signed angle from `from` to `to` about `axis`, both projected onto the
/// plane orthogonal to `axis`.
fn signed_angle_about(from: Vec3, to: Vec3, axis: Vec3) -> f32 {
    let a = from.reject_from_normalized(axis);
    let b = to.reject_from_normalized(axis);
    if a.length_squared() < 1e-10 || b.length_squared() < 1e-10 {
        return 0.0;
    }
    let (a, b) = (a.normalize(), b.normalize());
    a.cross(b).dot(axis).atan2(a.dot(b))
}

impl BrickScene {
    /// Motion that snaps connection `moving` onto connection `target`.
    ///
    /// # Arguments
    /// * `moving` - Connection on the brick(s) that will move
    /// * `target` - Connection that stays in place
    /// * `pivot` - World point the rotation is applied around
    ///
    /// # Returns
    /// `None` when either handle is stale
    pub fn connected_transformation(
        &self,
        moving: ConnectionId,
        target: ConnectionId,
        pivot: Vec3,
    ) -> Option<ConnectedTransform> {
        let a = self.connection_frame(moving)?;
        let b = self.connection_frame(target)?;

        let align = Quat::from_rotation_arc(a.up.normalize(), b.up.normalize());
        let reference = align * a.reference;
        let angle = signed_angle_about(reference, b.reference, b.up);
        let residual = angle - (angle / FRAC_PI_2).round() * FRAC_PI_2;
        let twist = Quat::from_axis_angle(b.up, residual);
        let rotation = (twist * align).normalize();

        let rotated_anchor = pivot + rotation * (a.position - pivot);
        let (axis, angle) = rotation.to_axis_angle();
        let (axis, angle) = if angle.abs() < 1e-6 || !axis.is_finite() {
            (Vec3::Y, 0.0)
        } else {
            (axis, angle)
        };
        Some(ConnectedTransform {
            offset: b.position - rotated_anchor,
            angle,
            axis,
        })
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use glam::{Quat, Vec3};

    use super::*;
    use crate::import::PartCatalog;
    use crate::math::{BRICK_HEIGHT, RigidTransform, anchors_coincide};

    fn stud_and_receptor(scene: &BrickScene, bottom: BrickId, top: BrickId) -> (ConnectionId, ConnectionId) {
        let receptor_field = scene
            .brick_fields(top)
            .into_iter()
            .find(|f| scene.field(*f).is_some_and(|f| f.kind == crate::connectivity::ConnectorKind::ANTI_STUD))
            .unwrap();
        let stud_field = scene
            .brick_fields(bottom)
            .into_iter()
            .find(|f| scene.field(*f).is_some_and(|f| f.kind == crate::connectivity::ConnectorKind::STUD))
            .unwrap();
        (
            scene.field(receptor_field).unwrap().connections[0],
            scene.field(stud_field).unwrap().connections[0],
        )
    }

    #[test]
    fn test_translation_only() {
        let catalog = PartCatalog::standard();
        let mut scene = BrickScene::new();
        let bottom = catalog.spawn(&mut scene, 3005, RigidTransform::IDENTITY).unwrap();
        let top = catalog
            .spawn(&mut scene, 3005, RigidTransform::from_translation(Vec3::new(1.3, 2.0, -0.7)))
            .unwrap();
        let (moving, target) = stud_and_receptor(&scene, bottom, top);
        let pivot = scene.brick_transform(top).unwrap().translation;

        let t = scene.connected_transformation(moving, target, pivot).unwrap();
        assert_relative_eq!(t.angle, 0.0);
        assert!(t.apply(&mut scene, top, pivot));

        let position = scene.brick_transform(top).unwrap().translation;
        assert_relative_eq!(position.x, 0.0, epsilon = 1e-5);
        assert_relative_eq!(position.y, BRICK_HEIGHT, epsilon = 1e-5);
        assert_relative_eq!(position.z, 0.0, epsilon = 1e-5);
    }

    #[test]
    fn test_twist_snaps_to_quarter_turn() {
        let catalog = PartCatalog::standard();
        let mut scene = BrickScene::new();
        let bottom = catalog.spawn(&mut scene, 3005, RigidTransform::IDENTITY).unwrap();
        let tilted = RigidTransform::new(
            Vec3::new(0.5, 3.0, 0.5),
            Quat::from_rotation_y(0.3) * Quat::from_rotation_x(0.4),
        );
        let top = catalog.spawn(&mut scene, 3005, tilted).unwrap();
        let (moving, target) = stud_and_receptor(&scene, bottom, top);
        let pivot = Vec3::new(0.2, 2.5, 0.1);

        let t = scene.connected_transformation(moving, target, pivot).unwrap();
        t.apply(&mut scene, top, pivot);

        let a = scene.connection_frame(moving).unwrap();
        let b = scene.connection_frame(target).unwrap();
        assert!(anchors_coincide(a.position, a.up, b.position, b.up));
        // Reference axes end up parallel or perpendicular
        let d = a.reference.dot(b.reference).abs();
        assert!(d < 1e-4 || (d - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_stale_handle_gives_none() {
        let catalog = PartCatalog::standard();
        let mut scene = BrickScene::new();
        let bottom = catalog.spawn(&mut scene, 3005, RigidTransform::IDENTITY).unwrap();
        let top = catalog
            .spawn(&mut scene, 3005, RigidTransform::from_translation(Vec3::Y * 3.0))
            .unwrap();
        let (moving, target) = stud_and_receptor(&scene, bottom, top);
        scene.destroy_brick(bottom);
        assert!(scene.connected_transformation(moving, target, Vec3::ZERO).is_none());
    }
}
