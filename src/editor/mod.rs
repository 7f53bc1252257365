//! Editor Module
//!
//! Interactive brick assembly on top of the engine library: pointer and key
//! events drive a state machine that picks bricks up, snaps them onto studs
//! and links them.
//!
//! # Submodules
//!
//! - [`input`] - Events, key bindings and the pointer camera
//! - [`commands`] - Deferred selection/undo intents
//! - [`undo`] - Scene snapshots and the bounded undo stack
//! - [`session`] - Mutable per-session editor state
//! - [`controller`] - The assembly state machine

pub mod commands;
pub mod controller;
pub mod input;
pub mod session;
pub mod undo;

pub use commands::{CommandQueue, QueuedCommand};
pub use controller::AssemblyController;
pub use input::{EditorCamera, EditorEvent, InteractionKey, KeyBindings, KeyChord, KeyCode, ModifierState};
pub use session::{AssemblySession, BuilderState, HostNotification};
pub use undo::{MAX_UNDO_SIZE, Snapshot, UndoEntry, UndoStack};
