//! Part Catalog
//!
//! Templates describing the geometry and connectivity of each part design.
//! Instantiating a template creates the part with its colliders, connection
//! fields, knobs and tubes inside a [`BrickScene`].

use std::collections::HashMap;

use glam::Vec3;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::connectivity::ConnectorKind;
use crate::error::ImportError;
use crate::math::{BRICK_HEIGHT, Bounds, LU_1, LU_5, LU_10, PLATE_HEIGHT, RigidTransform};
use crate::scene::arena::ArenaHandle;
use crate::scene::{BoxCollider, BrickId, BrickScene, PartId};

/// Outer radius of the tube under 2xN bricks
const TUBE_RADIUS: f32 = LU_1 * 4.07;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldTemplate {
    pub kind: ConnectorKind,
    /// Field frame relative to the part
    pub local: RigidTransform,
    /// Connection positions in the field frame
    pub connections: Vec<Vec3>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct KnobTemplate {
    pub position: Vec3,
    pub up: Vec3,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TubeTemplate {
    pub position: Vec3,
    pub up: Vec3,
    pub radius: f32,
}

/// Everything needed to build one part design
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartTemplate {
    pub design_id: u32,
    #[serde(default)]
    pub name: String,
    /// Legacy parts have no connectivity
    #[serde(default)]
    pub legacy: bool,
    #[serde(default)]
    pub colliders: Vec<BoxCollider>,
    /// Part-local connectivity extents; `None` means no connectivity data
    #[serde(default)]
    pub extents: Option<Bounds>,
    #[serde(default)]
    pub fields: Vec<FieldTemplate>,
    #[serde(default)]
    pub knobs: Vec<KnobTemplate>,
    #[serde(default)]
    pub tubes: Vec<TubeTemplate>,
}

impl PartTemplate {
    /// Rectangular brick or plate, `width` studs along X and `depth` along Z,
    /// origin at the bottom center.
    pub fn rectangular(design_id: u32, name: &str, width: u32, depth: u32, height: f32) -> Self {
        let half = Vec3::new(width as f32 * LU_5, height * 0.5, depth as f32 * LU_5);

        let mut grid = Vec::with_capacity((width * depth) as usize);
        for i in 0..width {
            for j in 0..depth {
                grid.push(Vec3::new(
                    (i as f32 + 0.5) * LU_10 - half.x,
                    0.0,
                    (j as f32 + 0.5) * LU_10 - half.z,
                ));
            }
        }

        let mut tubes = Vec::new();
        if width >= 2 && depth >= 2 {
            for i in 1..width {
                for j in 1..depth {
                    tubes.push(TubeTemplate {
                        position: Vec3::new(i as f32 * LU_10 - half.x, 0.0, j as f32 * LU_10 - half.z),
                        up: Vec3::Y,
                        radius: TUBE_RADIUS,
                    });
                }
            }
        }

        Self {
            design_id,
            name: name.to_string(),
            legacy: false,
            colliders: vec![BoxCollider::new(Vec3::new(0.0, half.y, 0.0), half)],
            extents: Some(Bounds::new(Vec3::new(-half.x, 0.0, -half.z), Vec3::new(half.x, height, half.z))),
            fields: vec![
                FieldTemplate {
                    kind: ConnectorKind::STUD,
                    local: RigidTransform::from_translation(Vec3::new(0.0, height, 0.0)),
                    connections: grid.clone(),
                },
                FieldTemplate {
                    kind: ConnectorKind::ANTI_STUD,
                    local: RigidTransform::IDENTITY,
                    connections: grid.clone(),
                },
            ],
            knobs: grid
                .iter()
                .map(|p| KnobTemplate {
                    position: *p + Vec3::new(0.0, height, 0.0),
                    up: Vec3::Y,
                })
                .collect(),
            tubes,
        }
    }
}

/// Templates keyed by design id
#[derive(Debug, Clone, Default)]
pub struct PartCatalog {
    templates: HashMap<u32, PartTemplate>,
}

impl PartCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Common bricks and plates built procedurally.
    pub fn standard() -> Self {
        let mut catalog = Self::new();
        let bricks = [
            (3001, "Brick 2x4", 4, 2),
            (3003, "Brick 2x2", 2, 2),
            (3004, "Brick 1x2", 2, 1),
            (3005, "Brick 1x1", 1, 1),
            (3010, "Brick 1x4", 4, 1),
        ];
        for (id, name, w, d) in bricks {
            catalog.insert(PartTemplate::rectangular(id, name, w, d, BRICK_HEIGHT));
        }
        let plates = [
            (3020, "Plate 2x4", 4, 2),
            (3022, "Plate 2x2", 2, 2),
            (3023, "Plate 1x2", 2, 1),
            (3024, "Plate 1x1", 1, 1),
        ];
        for (id, name, w, d) in plates {
            catalog.insert(PartTemplate::rectangular(id, name, w, d, PLATE_HEIGHT));
        }
        catalog
    }

    /// Parse a JSON list of templates.
    pub fn from_json(json: &str) -> Result<Self, ImportError> {
        let templates: Vec<PartTemplate> = serde_json::from_str(json)?;
        let mut catalog = Self::new();
        for template in templates {
            catalog.insert(template);
        }
        Ok(catalog)
    }

    pub fn insert(&mut self, template: PartTemplate) {
        self.templates.insert(template.design_id, template);
    }

    pub fn get(&self, design_id: u32) -> Option<&PartTemplate> {
        self.templates.get(&design_id)
    }

    pub fn contains(&self, design_id: u32) -> bool {
        self.templates.contains_key(&design_id)
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Build a one-part brick at `transform`.
    ///
    /// # Returns
    /// `None` if the design is unknown
    pub fn spawn(&self, scene: &mut BrickScene, design_id: u32, transform: RigidTransform) -> Option<BrickId> {
        let template = self.get(design_id)?;
        let brick = scene.spawn_brick(design_id, String::new(), transform);
        if let Some(b) = scene.bricks.get_mut(brick) {
            b.uuid = format!("{}-{}v{}", design_id, brick.index(), brick.generation());
            b.name = template.name.clone();
        }
        self.instantiate_part(scene, brick, template, RigidTransform::IDENTITY, &[], true);
        Some(brick)
    }

    /// Add a part built from `template` to `brick`.
    ///
    /// # Arguments
    /// * `local` - Part frame relative to the brick
    /// * `materials` - Material ids, stored as-is
    /// * `physical` - Create colliders and connectivity; visual-only parts get neither
    pub fn instantiate_part(
        &self,
        scene: &mut BrickScene,
        brick: BrickId,
        template: &PartTemplate,
        local: RigidTransform,
        materials: &[u32],
        physical: bool,
    ) -> Option<PartId> {
        let part = scene.add_part(brick, template.design_id, local)?;
        if let Some(p) = scene.part_mut(part) {
            p.legacy = template.legacy;
            p.material_ids = materials.to_vec();
            if physical {
                p.colliders = template.colliders.clone();
            }
        }

        match template.extents {
            Some(extents) if physical && !template.legacy => {
                scene.set_connectivity(part, extents);
                for field in &template.fields {
                    let Some(field_id) = scene.add_field(part, field.kind, field.local) else {
                        continue;
                    };
                    for position in &field.connections {
                        scene.add_connection(field_id, *position);
                    }
                }
                for knob in &template.knobs {
                    scene.add_knob(part, knob.position, knob.up);
                }
                for tube in &template.tubes {
                    scene.add_tube(part, tube.position, tube.up, tube.radius);
                }
                scene.match_common_parts(part);
            }
            _ => {
                debug!("[Import] Part {} has no connectivity", template.design_id);
                scene.refresh_bounds(brick);
            }
        }
        Some(part)
    }
}
