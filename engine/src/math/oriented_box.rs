//! Oriented Boxes
//!
//! World-space boxes produced from part colliders. Overlap uses the
//! separating axis test (3 + 3 face axes, 9 edge cross products); ray
//! intersection runs the slab test in box-local space.

use glam::{Mat3, Quat, Vec3};

use super::bounds::Bounds;

/// A box with arbitrary orientation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrientedBox {
    pub center: Vec3,
    pub half_extents: Vec3,
    pub rotation: Quat,
}

impl OrientedBox {
    pub fn new(center: Vec3, half_extents: Vec3, rotation: Quat) -> Self {
        Self {
            center,
            half_extents: half_extents.abs(),
            rotation: rotation.normalize(),
        }
    }

    /// Box axes as columns
    pub fn axes(&self) -> [Vec3; 3] {
        let m = Mat3::from_quat(self.rotation);
        [m.x_axis, m.y_axis, m.z_axis]
    }

    /// Shrink every half extent by `amount`, clamped at zero.
    pub fn shrunk(&self, amount: f32) -> OrientedBox {
        OrientedBox {
            half_extents: (self.half_extents - Vec3::splat(amount)).max(Vec3::ZERO),
            ..*self
        }
    }

    pub fn bounds(&self) -> Bounds {
        let axes = self.axes();
        let reach = axes[0].abs() * self.half_extents.x
            + axes[1].abs() * self.half_extents.y
            + axes[2].abs() * self.half_extents.z;
        Bounds::from_center_extents(self.center, reach)
    }

    /// Separating axis test against another box. Touching boxes count as
    /// overlapping, so callers shrink boxes to allow flush contact.
    pub fn overlaps(&self, other: &OrientedBox) -> bool {
        let a = self.axes();
        let b = other.axes();
        let t = other.center - self.center;

        let mut axes: Vec<Vec3> = Vec::with_capacity(15);
        axes.extend_from_slice(&a);
        axes.extend_from_slice(&b);
        for ai in &a {
            for bi in &b {
                let cross = ai.cross(*bi);
                // Parallel edges produce no useful axis
                if cross.length_squared() > 1e-8 {
                    axes.push(cross.normalize());
                }
            }
        }

        for axis in axes {
            let ra = self.projected_radius(&a, axis);
            let rb = other.projected_radius(&b, axis);
            if t.dot(axis).abs() > ra + rb {
                return false;
            }
        }
        true
    }

    fn projected_radius(&self, axes: &[Vec3; 3], axis: Vec3) -> f32 {
        self.half_extents.x * axes[0].dot(axis).abs()
            + self.half_extents.y * axes[1].dot(axis).abs()
            + self.half_extents.z * axes[2].dot(axis).abs()
    }

    /// Intersect a ray with the box.
    ///
    /// # Returns
    /// `(distance, world_normal)` of the entry point, or `None` when the ray
    /// misses or the box is entirely behind the origin.
    pub fn ray_intersect(&self, origin: Vec3, direction: Vec3) -> Option<(f32, Vec3)> {
        let inv = self.rotation.inverse();
        let local_origin = inv * (origin - self.center);
        let local_dir = inv * direction;

        let mut t_min = f32::NEG_INFINITY;
        let mut t_max = f32::INFINITY;
        let mut entry_axis = 0usize;
        let mut entry_sign = 0.0f32;

        for axis in 0..3 {
            let o = local_origin[axis];
            let d = local_dir[axis];
            let h = self.half_extents[axis];
            if d.abs() < 1e-10 {
                // Parallel to this slab: must already be inside it
                if o < -h || o > h {
                    return None;
                }
                continue;
            }
            let inv_d = 1.0 / d;
            let mut t1 = (-h - o) * inv_d;
            let mut t2 = (h - o) * inv_d;
            let mut sign = -1.0;
            if t1 > t2 {
                std::mem::swap(&mut t1, &mut t2);
                sign = 1.0;
            }
            if t1 > t_min {
                t_min = t1;
                entry_axis = axis;
                entry_sign = sign;
            }
            t_max = t_max.min(t2);
            if t_min > t_max {
                return None;
            }
        }

        if t_max < 0.0 {
            return None;
        }

        let mut local_normal = Vec3::ZERO;
        local_normal[entry_axis] = if entry_sign == 0.0 { 1.0 } else { entry_sign };

        if t_min >= 0.0 {
            Some((t_min, self.rotation * local_normal))
        } else {
            // Origin inside the box
            Some((0.0, -direction.normalize_or_zero()))
        }
    }
}
