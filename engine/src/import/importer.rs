//! Model Import
//!
//! Builds bricks from a [`ModelDescription`], links coinciding connections
//! and records the result as a [`Model`]. Missing part data is logged and
//! skipped; reimport refuses to touch the scene when groups no longer match.

use std::collections::HashMap;

use glam::Vec3;
use tracing::{error, info, warn};

use super::catalog::PartCatalog;
use super::model::{BrickDescription, GroupType, Model, ModelDescription, ModelGroup, Pivot};
use crate::building::compute_bounds;
use crate::error::ImportError;
use crate::math::RigidTransform;
use crate::scene::{BrickId, BrickScene};

// ============================================================================
// BRICK CREATION
// ============================================================================

/// Create one brick; parts with unknown designs are skipped and a brick left
/// without parts is discarded.
fn build_brick(
    scene: &mut BrickScene,
    catalog: &PartCatalog,
    description: &BrickDescription,
    physical: bool,
    offset: Vec3,
) -> Option<BrickId> {
    let known: Vec<_> = description
        .parts
        .iter()
        .filter(|p| {
            let found = catalog.contains(p.design_id);
            if !found {
                error!("[Import] Missing part -> {} (brick {})", p.design_id, description.ref_id);
            }
            found
        })
        .collect();
    let first = known.first()?;

    let brick_transform = RigidTransform::new(first.position + offset, first.rotation.normalize());
    let brick = scene.spawn_brick(description.design_id, description.uuid.clone(), brick_transform);
    let inverse = brick_transform.inverse();
    for part in known {
        let Some(template) = catalog.get(part.design_id) else {
            continue;
        };
        let world = RigidTransform::new(part.position + offset, part.rotation.normalize());
        let local = inverse.compose(&world);
        catalog.instantiate_part(scene, brick, template, local, &part.materials, physical);
    }
    if scene.brick(brick).is_none_or(|b| b.parts.is_empty()) {
        scene.destroy_brick(brick);
        return None;
    }
    Some(brick)
}

/// Link every coinciding connection of `bricks`. Static groups only link
/// to bricks of their own group.
fn detect_connectivity(scene: &mut BrickScene, bricks: &[BrickId], group_of: &HashMap<BrickId, (usize, GroupType)>) -> usize {
    let mut links = 0;
    for brick in bricks {
        let own_group = group_of.get(brick).copied();
        for field in scene.connectable_fields(*brick) {
            for (a, b) in scene.query_connections(field) {
                if let Some((number, GroupType::Static)) = own_group {
                    let other_group = scene.connection_brick(b).and_then(|o| group_of.get(&o)).map(|g| g.0);
                    if other_group != Some(number) {
                        continue;
                    }
                }
                if scene.connection_valid(a, b) {
                    scene.connect(a, b);
                    links += 1;
                }
            }
        }
    }
    links
}

fn pivot_offset(scene: &BrickScene, bricks: &[BrickId], pivot: Pivot) -> Vec3 {
    let bounds = compute_bounds(scene, bricks);
    if bounds.is_empty() {
        return Vec3::ZERO;
    }
    match pivot {
        Pivot::Original => Vec3::ZERO,
        Pivot::Center => -bounds.center(),
        Pivot::BottomCenter => -(bounds.center() - Vec3::Y * bounds.extents().y),
    }
}

/// Build the bricks of `description`, only those of `only_group` when given.
///
/// # Returns
/// Built bricks per group number (`None` for ungrouped) and the group type
/// each brick was built with
fn build_bricks(
    scene: &mut BrickScene,
    catalog: &PartCatalog,
    description: &ModelDescription,
    types: &HashMap<usize, GroupType>,
    only_group: Option<usize>,
    offset: Vec3,
) -> (HashMap<Option<usize>, Vec<BrickId>>, HashMap<BrickId, (usize, GroupType)>) {
    let mut built: HashMap<Option<usize>, Vec<BrickId>> = HashMap::new();
    let mut group_of = HashMap::new();
    for brick in &description.bricks {
        let group = description.group_of(brick.ref_id);
        let number = group.map(|g| g.number);
        if only_group.is_some() && number != only_group {
            continue;
        }
        let group_type = match group {
            Some(g) => types.get(&g.number).copied().unwrap_or(g.group_type),
            None => GroupType::Environment,
        };
        if group_type == GroupType::Ignore {
            continue;
        }
        let Some(id) = build_brick(scene, catalog, brick, group_type.is_physical(), offset) else {
            warn!("[Import] Brick {} has no usable parts, discarded", brick.ref_id);
            continue;
        };
        if let Some(n) = number {
            group_of.insert(id, (n, group_type));
        }
        built.entry(number).or_default().push(id);
    }
    (built, group_of)
}

fn linkable(group_of: &HashMap<BrickId, (usize, GroupType)>) -> Vec<BrickId> {
    let mut bricks: Vec<BrickId> = group_of
        .iter()
        .filter(|(_, (_, t))| t.is_physical())
        .map(|(b, _)| *b)
        .collect();
    bricks.sort();
    bricks
}

// ============================================================================
// IMPORT
// ============================================================================

/// Import a model into the scene.
///
/// # Arguments
/// * `catalog` - Part templates; parts missing from it are skipped with an error log
/// * `description` - Parsed model
/// * `pivot` - Where the model origin ends up
///
/// # Returns
/// The imported [`Model`], or [`ImportError::EmptyModel`] when no brick
/// could be built
pub fn import_model(
    scene: &mut BrickScene,
    catalog: &PartCatalog,
    description: &ModelDescription,
    pivot: Pivot,
) -> Result<Model, ImportError> {
    let (built, group_of) = build_bricks(scene, catalog, description, &HashMap::new(), None, Vec3::ZERO);
    let all: Vec<BrickId> = built.values().flatten().copied().collect();
    if all.is_empty() {
        return Err(ImportError::EmptyModel(description.name.clone()));
    }

    let offset = pivot_offset(scene, &all, pivot);
    if offset != Vec3::ZERO {
        for brick in &all {
            scene.translate_brick(*brick, offset);
        }
    }

    let links = detect_connectivity(scene, &linkable(&group_of), &group_of);

    let groups = description
        .groups
        .iter()
        .map(|g| ModelGroup {
            number: g.number,
            name: g.name.clone(),
            group_type: g.group_type,
            bricks: built.get(&Some(g.number)).cloned().unwrap_or_default(),
        })
        .collect();
    let model = Model {
        name: description.name.clone(),
        pivot,
        pivot_offset: offset,
        groups,
        ungrouped: built.get(&None).cloned().unwrap_or_default(),
    };
    info!(
        "[Import] Imported '{}': {} bricks, {} links",
        model.name,
        all.len(),
        links
    );
    Ok(model)
}

// ============================================================================
// REIMPORT
// ============================================================================

fn check_group(model_group: &ModelGroup, description: &ModelDescription) -> Result<(), ImportError> {
    let matches = description
        .groups
        .get(model_group.number)
        .is_some_and(|g| g.name == model_group.name);
    if matches {
        Ok(())
    } else {
        warn!(
            "[Import] Group {} {} does not match up with the source",
            model_group.number, model_group.name
        );
        Err(ImportError::GroupMismatch {
            number: model_group.number,
            name: model_group.name.clone(),
        })
    }
}

/// Replace the bricks of one group with a fresh import of that group.
///
/// Nothing is changed when the group is unknown or no longer matches the
/// source. The group keeps its current [`GroupType`].
pub fn reimport_group(
    scene: &mut BrickScene,
    catalog: &PartCatalog,
    model: &mut Model,
    description: &ModelDescription,
    number: usize,
) -> Result<(), ImportError> {
    let index = model
        .groups
        .iter()
        .position(|g| g.number == number)
        .ok_or(ImportError::UnknownGroup(number))?;
    check_group(&model.groups[index], description)?;
    rebuild_group(scene, catalog, model, description, index);
    Ok(())
}

fn rebuild_group(
    scene: &mut BrickScene,
    catalog: &PartCatalog,
    model: &mut Model,
    description: &ModelDescription,
    index: usize,
) {
    let group = &model.groups[index];
    let number = group.number;
    for brick in &group.bricks {
        scene.destroy_brick(*brick);
    }

    // Source group numbers are positional
    let source_number = description.groups[number].number;
    let types: HashMap<usize, GroupType> = [(source_number, group.group_type)].into_iter().collect();
    let (built, group_of) = build_bricks(scene, catalog, description, &types, Some(source_number), model.pivot_offset);
    let bricks = built.get(&Some(source_number)).cloned().unwrap_or_default();

    // Links to the rest of the model follow the group type rules
    let mut full_group_of: HashMap<BrickId, (usize, GroupType)> = HashMap::new();
    for g in &model.groups {
        if g.number != number {
            for b in &g.bricks {
                full_group_of.insert(*b, (g.number, g.group_type));
            }
        }
    }
    for (b, (_, t)) in &group_of {
        full_group_of.insert(*b, (number, *t));
    }
    let links = detect_connectivity(scene, &linkable(&group_of), &full_group_of);

    info!(
        "[Import] Reimported group {} '{}': {} bricks, {} links",
        number,
        model.groups[index].name,
        bricks.len(),
        links
    );
    model.groups[index].bricks = bricks;
}

/// Reimport every group of a model.
///
/// All groups are checked first; a single mismatch aborts with no change to
/// the scene.
pub fn reimport_model(
    scene: &mut BrickScene,
    catalog: &PartCatalog,
    model: &mut Model,
    description: &ModelDescription,
) -> Result<(), ImportError> {
    // Groups whose bricks were all destroyed externally are dropped, but only
    // once every remaining group matches
    let survives = |g: &ModelGroup| g.bricks.is_empty() || g.bricks.iter().any(|b| scene.contains_brick(*b));

    let mismatches: Vec<ImportError> = model
        .groups
        .iter()
        .filter(|g| survives(*g))
        .filter_map(|g| check_group(g, description).err())
        .collect();
    if let Some(first) = mismatches.into_iter().next() {
        return Err(first);
    }

    model.groups.retain(|g| survives(g));
    for index in 0..model.groups.len() {
        rebuild_group(scene, catalog, model, description, index);
    }
    model.ungrouped.retain(|b| scene.contains_brick(*b));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::import::model::{GroupDescription, PartDescription};
    use crate::math::BRICK_HEIGHT;
    use glam::Quat;

    fn part(design_id: u32, position: Vec3) -> PartDescription {
        PartDescription {
            design_id,
            position,
            rotation: Quat::IDENTITY,
            materials: vec![21],
        }
    }

    fn tower(group_type: GroupType) -> ModelDescription {
        ModelDescription {
            name: "Tower".to_string(),
            bricks: (0..3)
                .map(|i| BrickDescription {
                    ref_id: i,
                    design_id: 3003,
                    uuid: format!("b{i}"),
                    parts: vec![part(3003, Vec3::new(2.0, i as f32 * BRICK_HEIGHT, 0.0))],
                })
                .collect(),
            groups: vec![GroupDescription {
                number: 0,
                name: "Main".to_string(),
                group_type,
                brick_refs: vec![0, 1, 2],
            }],
        }
    }

    #[test]
    fn test_import_detects_connectivity() {
        let catalog = PartCatalog::standard();
        let mut scene = BrickScene::new();
        let model = import_model(&mut scene, &catalog, &tower(GroupType::Dynamic), Pivot::Original).unwrap();
        assert_eq!(model.groups[0].bricks.len(), 3);
        assert_eq!(scene.link_count(), 8);
        let bottom = model.groups[0].bricks[0];
        assert_eq!(scene.connected_bricks(bottom, true).len(), 2);
    }

    #[test]
    fn test_missing_parts_are_skipped() {
        let catalog = PartCatalog::standard();
        let mut scene = BrickScene::new();
        let mut description = tower(GroupType::Dynamic);
        description.bricks[1].parts = vec![part(424242, Vec3::ZERO)];
        description.bricks[2].parts.push(part(424242, Vec3::ZERO));

        let model = import_model(&mut scene, &catalog, &description, Pivot::Original).unwrap();
        assert_eq!(model.groups[0].bricks.len(), 2);
        assert_eq!(scene.brick_count(), 2);
        let survivor = model.groups[0].bricks[1];
        assert_eq!(scene.brick(survivor).unwrap().parts.len(), 1);
    }

    #[test]
    fn test_empty_model_is_error() {
        let catalog = PartCatalog::standard();
        let mut scene = BrickScene::new();
        let description = tower(GroupType::Ignore);
        assert!(matches!(
            import_model(&mut scene, &catalog, &description, Pivot::Original),
            Err(ImportError::EmptyModel(_))
        ));
        assert_eq!(scene.brick_count(), 0);
    }

    #[test]
    fn test_environment_group_has_no_connectivity() {
        let catalog = PartCatalog::standard();
        let mut scene = BrickScene::new();
        let model = import_model(&mut scene, &catalog, &tower(GroupType::Environment), Pivot::Original).unwrap();
        assert_eq!(scene.link_count(), 0);
        assert!(model.groups[0].bricks.iter().all(|b| scene.brick_fields(*b).is_empty()));
    }

    #[test]
    fn test_bottom_center_pivot() {
        let catalog = PartCatalog::standard();
        let mut scene = BrickScene::new();
        let model = import_model(&mut scene, &catalog, &tower(GroupType::Dynamic), Pivot::BottomCenter).unwrap();
        let bounds = compute_bounds(&scene, &model.bricks());
        assert!(bounds.min.y.abs() < 1e-5);
        assert!(bounds.center().x.abs() < 1e-5);
        assert!((model.pivot_offset.x + 2.0).abs() < 1e-5);
    }

    #[test]
    fn test_reimport_mismatch_leaves_scene_untouched() {
        let catalog = PartCatalog::standard();
        let mut scene = BrickScene::new();
        let mut model = import_model(&mut scene, &catalog, &tower(GroupType::Dynamic), Pivot::Original).unwrap();
        let before = model.clone();
        let mut changed = tower(GroupType::Dynamic);
        changed.groups[0].name = "Renamed".to_string();

        let result = reimport_model(&mut scene, &catalog, &mut model, &changed);
        assert!(matches!(result, Err(ImportError::GroupMismatch { number: 0, .. })));
        assert_eq!(model, before);
        assert!(before.bricks().iter().all(|b| scene.contains_brick(*b)));
        assert!(matches!(
            reimport_group(&mut scene, &catalog, &mut model, &changed, 7),
            Err(ImportError::UnknownGroup(7))
        ));
    }

    #[test]
    fn test_aborted_reimport_keeps_destroyed_groups() {
        let catalog = PartCatalog::standard();
        let mut scene = BrickScene::new();
        let mut description = tower(GroupType::Dynamic);
        description.bricks.push(BrickDescription {
            ref_id: 3,
            design_id: 3003,
            uuid: "b3".to_string(),
            parts: vec![part(3003, Vec3::new(6.0, 0.0, 0.0))],
        });
        description.groups.push(GroupDescription {
            number: 1,
            name: "Side".to_string(),
            group_type: GroupType::Dynamic,
            brick_refs: vec![3],
        });
        let mut model = import_model(&mut scene, &catalog, &description, Pivot::Original).unwrap();
        let side = model.groups[1].bricks[0];
        scene.destroy_brick(side);

        let mut changed = description.clone();
        changed.groups[0].name = "Renamed".to_string();
        assert!(reimport_model(&mut scene, &catalog, &mut model, &changed).is_err());
        assert_eq!(model.groups.len(), 2);

        reimport_model(&mut scene, &catalog, &mut model, &description).unwrap();
        assert_eq!(model.groups.len(), 1);
        assert_eq!(model.groups[0].name, "Main");
    }

    #[test]
    fn test_reimport_group_rebuilds_bricks() {
        let catalog = PartCatalog::standard();
        let mut scene = BrickScene::new();
        let mut model = import_model(&mut scene, &catalog, &tower(GroupType::Dynamic), Pivot::Original).unwrap();
        let old = model.bricks();
        let mut source = tower(GroupType::Dynamic);
        source.bricks.pop();
        source.groups[0].brick_refs.pop();

        reimport_group(&mut scene, &catalog, &mut model, &source, 0).unwrap();
        assert_eq!(model.groups[0].bricks.len(), 2);
        assert!(old.iter().all(|b| !scene.contains_brick(*b)));
        assert_eq!(scene.brick_count(), 2);
        assert_eq!(scene.link_count(), 4);
    }
}
