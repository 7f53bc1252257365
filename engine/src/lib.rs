//! Brick Builder Engine
//!
//! Connectivity and interactive assembly of studded building bricks: an
//! arena-backed scene of bricks, parts and connections, the algorithms that
//! find, validate and commit snaps, and an editor controller that drives them
//! from pointer and keyboard input.
//!
//! # Modules
//!
//! - [`math`] - Rigid transforms, bounds, oriented boxes and brick units
//! - [`scene`] - Arena storage and the brick aggregate
//! - [`connectivity`] - Connections, fields, links and the snap transformation
//! - [`spatial`] - Raycast/overlap port and the headless collider world
//! - [`building`] - Best-connection search, collision and free alignment
//! - [`import`] - Part catalog and model import/reimport
//! - [`config`] - Persisted builder settings
//! - [`render`] - Instance buffer for the host renderer
//! - [`editor`] - Assembly controller, session, undo and input mapping
//!
//! # Example
//!
//! ```ignore
//! use brick_builder_engine::editor::{AssemblyController, AssemblySession, EditorEvent};
//! use brick_builder_engine::{BrickScene, BuilderSettings, ColliderWorld};
//!
//! let settings = BuilderSettings::default();
//! let controller = AssemblyController::new(ColliderWorld::new(), settings.clone());
//! let mut session = AssemblySession::new(&settings);
//! let mut scene = BrickScene::new();
//!
//! controller.handle_event(&mut session, &mut scene, EditorEvent::ExpandSelection);
//! controller.update(&mut session, &mut scene);
//! ```

pub mod building;
pub mod config;
pub mod connectivity;
pub mod error;
pub mod import;
pub mod math;
pub mod render;
pub mod scene;
pub mod spatial;

// Editor-level modules (located in src/editor/ directory)
#[path = "../../src/editor/mod.rs"]
pub mod editor;

pub use config::BuilderSettings;
pub use error::{BuilderError, ConfigError, ImportError, Result};
pub use math::{Bounds, OrientedBox, RigidTransform};
pub use scene::{Brick, BrickId, BrickScene, ConnectionId, FieldId, PartId};
pub use spatial::{ColliderWorld, Ray, RayHit, SpatialQuery};
