//! Brick Instance Buffer
//!
//! GPU-ready per-part instance records handed to the host renderer, with the
//! selection highlight encoded as flags.

use std::collections::HashSet;

use crate::scene::{BrickId, BrickScene};

/// Part belongs to a selected brick
pub const FLAG_SELECTED: u32 = 1 << 0;
/// Part belongs to the focus brick
pub const FLAG_FOCUS: u32 = 1 << 1;
/// Part came through the legacy path
pub const FLAG_LEGACY: u32 = 1 << 2;

/// Instance data for one part.
///
/// Layout (80 bytes total, 16-byte aligned for GPU compatibility):
/// - model:      mat4x4<f32> (64 bytes) - Part world matrix, column major
/// - design_id:  u32 (4 bytes)
/// - tint_color: u32 (4 bytes) - Packed RGBA (0xRRGGBBAA)
/// - flags:      u32 (4 bytes) - `FLAG_*` bits
/// - _pad0:      u32 (4 bytes)
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct BrickInstance {
    pub model: [[f32; 4]; 4],
    pub design_id: u32,
    pub tint_color: u32,
    pub flags: u32,
    pub _pad0: u32,
}

static_assertions::assert_eq_size!(BrickInstance, [u8; 80]);

impl BrickInstance {
    pub fn is_selected(&self) -> bool {
        self.flags & FLAG_SELECTED != 0
    }

    pub fn is_focus(&self) -> bool {
        self.flags & FLAG_FOCUS != 0
    }
}

/// Packed tint for a material id; unknown materials are medium stone grey.
pub fn material_tint(material_id: u32) -> u32 {
    match material_id {
        1 => 0xF4F4F4FF,
        21 => 0xB40000FF,
        23 => 0x1E5AA8FF,
        24 => 0xFAC80AFF,
        26 => 0x1B2A34FF,
        28 => 0x00852BFF,
        _ => 0xA0A5A9FF,
    }
}

/// One instance per part of every brick, in scene order.
pub fn build_instances(scene: &BrickScene, selection: &[BrickId], focus: Option<BrickId>) -> Vec<BrickInstance> {
    let selected: HashSet<BrickId> = selection.iter().copied().collect();
    let mut out = Vec::new();
    for brick in scene.brick_ids() {
        let Some(b) = scene.brick(brick) else {
            continue;
        };
        let mut brick_flags = 0;
        if selected.contains(&brick) {
            brick_flags |= FLAG_SELECTED;
        }
        if focus == Some(brick) {
            brick_flags |= FLAG_FOCUS;
        }
        for part_id in &b.parts {
            let (Some(part), Some(world)) = (scene.part(*part_id), scene.part_world_transform(*part_id)) else {
                continue;
            };
            let mut flags = brick_flags;
            if part.legacy {
                flags |= FLAG_LEGACY;
            }
            out.push(BrickInstance {
                model: world.to_matrix().to_cols_array_2d(),
                design_id: part.design_id,
                tint_color: material_tint(part.material_ids.first().copied().unwrap_or(0)),
                flags,
                _pad0: 0,
            });
        }
    }
    out
}

/// Raw bytes of an instance list, ready for a vertex buffer upload.
pub fn instance_bytes(instances: &[BrickInstance]) -> &[u8] {
    bytemuck::cast_slice(instances)
}
