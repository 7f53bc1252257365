//! Headless Brick Scene
//!
//! Run with: `cargo run --bin brick_scene -- [model.json] [settings.json]`
//!
//! Imports a model (or a built-in demo), then replays a scripted pick-up,
//! drag, rotate and place through the assembly controller and logs the
//! resulting connection graph. Set `RUST_LOG=debug` for search details.

use std::path::Path;

use glam::{Quat, Vec2, Vec3};
use tracing::info;
use tracing_subscriber::EnvFilter;

use brick_builder_engine::editor::{
    AssemblyController, AssemblySession, EditorCamera, EditorEvent, HostNotification, InteractionKey, ModifierState,
};
use brick_builder_engine::import::{
    BrickDescription, GroupDescription, GroupType, ModelDescription, PartCatalog, PartDescription, Pivot, import_model,
};
use brick_builder_engine::math::BRICK_HEIGHT;
use brick_builder_engine::render::build_instances;
use brick_builder_engine::{BrickScene, BuilderSettings, ColliderWorld};

// ============================================================================
// DEMO MODEL
// ============================================================================

fn part(design_id: u32, position: Vec3) -> PartDescription {
    PartDescription {
        design_id,
        position,
        rotation: Quat::IDENTITY,
        materials: vec![21],
    }
}

/// A 2x4 base with a 2x2 on top, and a loose 2x2 lying beside them.
fn demo_model() -> ModelDescription {
    ModelDescription {
        name: "Demo".to_string(),
        bricks: vec![
            BrickDescription {
                ref_id: 0,
                design_id: 3001,
                uuid: "base".to_string(),
                parts: vec![part(3001, Vec3::ZERO)],
            },
            BrickDescription {
                ref_id: 1,
                design_id: 3003,
                uuid: "top".to_string(),
                parts: vec![part(3003, Vec3::new(-0.8, BRICK_HEIGHT, 0.0))],
            },
            BrickDescription {
                ref_id: 2,
                design_id: 3003,
                uuid: "loose".to_string(),
                parts: vec![part(3003, Vec3::new(4.0, 0.0, 0.0))],
            },
        ],
        groups: vec![GroupDescription {
            number: 0,
            name: "Tower".to_string(),
            group_type: GroupType::Dynamic,
            brick_refs: vec![0, 1],
        }],
    }
}

fn log_graph(scene: &BrickScene) {
    info!("[Brick Scene] {} bricks, {} links", scene.brick_count(), scene.link_count());
    for brick in scene.brick_ids() {
        let Some(b) = scene.brick(brick) else {
            continue;
        };
        info!(
            "[Brick Scene]   {} '{}' at {:?} -> {:?}",
            b.design_id,
            b.uuid,
            b.transform.translation,
            scene
                .connected_bricks(brick, false)
                .iter()
                .filter_map(|n| scene.brick(*n).map(|x| x.uuid.clone()))
                .collect::<Vec<_>>()
        );
    }
}

fn main() -> brick_builder_engine::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let description = match args.first() {
        Some(path) => ModelDescription::load(Path::new(path))?,
        None => demo_model(),
    };
    let settings = match args.get(1) {
        Some(path) => BuilderSettings::load(Path::new(path))?,
        None => BuilderSettings::default(),
    };

    let catalog = PartCatalog::standard();
    let mut scene = BrickScene::new();
    let model = import_model(&mut scene, &catalog, &description, Pivot::Original)?;
    info!("[Brick Scene] Imported '{}' ({} bricks)", model.name, model.bricks().len());
    log_graph(&scene);

    let camera = EditorCamera::new(Vec3::new(2.0, 9.0, 10.0), Vec3::new(1.0, 0.0, 0.0));
    let controller = AssemblyController::new(ColliderWorld::new(), settings.clone()).with_camera(camera);
    let mut session = AssemblySession::new(&settings);

    // Pick up the last brick of the model by its top face and drop it on the
    // first one.
    let bricks = model.bricks();
    let (Some(&target), Some(&moving)) = (bricks.first(), bricks.last()) else {
        return Ok(());
    };
    let top_of = |scene: &BrickScene, brick| {
        let bounds = scene.brick_world_bounds(brick);
        Vec3::new(bounds.center().x, bounds.max.y, bounds.center().z)
    };
    let none = ModifierState::new();
    let press = camera.world_to_screen(top_of(&scene, moving)).unwrap_or(Vec2::ZERO);
    let drop = camera
        .world_to_screen(top_of(&scene, target) + Vec3::new(0.8, 0.0, 0.0))
        .unwrap_or(Vec2::ZERO);

    let mut script = vec![EditorEvent::PointerDown {
        position: press,
        modifiers: none,
    }];
    for step in 1..=10 {
        let t = step as f32 / 10.0;
        script.push(EditorEvent::PointerDrag {
            position: press.lerp(drop, t),
            modifiers: none,
        });
    }
    script.push(EditorEvent::RotateOrNudge(InteractionKey::Right));
    script.push(EditorEvent::PointerUp {
        position: drop,
        modifiers: none,
    });

    for event in script {
        controller.handle_event(&mut session, &mut scene, event);
        controller.update(&mut session, &mut scene);
        for notification in session.drain_notifications() {
            match notification {
                HostNotification::SelectionChanged(selection) => {
                    info!("[Brick Scene] Selection: {} bricks", selection.len())
                }
                HostNotification::UndoCheckpoint(label) => info!("[Brick Scene] Undo checkpoint '{}'", label),
            }
        }
    }

    info!("[Brick Scene] Final state {:?}", session.state());
    log_graph(&scene);
    let instances = build_instances(&scene, session.selection(), session.focus());
    info!("[Brick Scene] {} render instances", instances.len());
    Ok(())
}
