//! Editor Input
//!
//! Windowing-agnostic events consumed by the assembly controller, the key
//! bindings that produce them and the camera used to turn a pointer position
//! into a world ray.

use std::collections::HashMap;

use glam::{Vec2, Vec3};

use crate::scene::BrickId;
use crate::spatial::Ray;

// ============================================================================
// KEYS AND MODIFIERS
// ============================================================================

/// Physical keys the editor reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    A,
    D,
    E,
    K,
    N,
    S,
    W,
    Z,
    Escape,
}

/// State of keyboard modifier keys at the time of an event
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ModifierState {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    /// Command on macOS
    pub meta: bool,
}

impl ModifierState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        !self.shift && !self.ctrl && !self.alt && !self.meta
    }

    /// Whether a click should add to / toggle the selection instead of replacing it.
    pub fn additive(&self) -> bool {
        self.ctrl || self.meta || self.shift
    }
}

/// Direction of a rotate/nudge request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InteractionKey {
    Left,
    Right,
    Up,
    Down,
}

// ============================================================================
// EVENTS
// ============================================================================

/// Everything the host can tell the assembly controller
#[derive(Debug, Clone, PartialEq)]
pub enum EditorEvent {
    /// Primary button pressed at a screen position (pixels, origin top-left)
    PointerDown { position: Vec2, modifiers: ModifierState },
    /// Pointer moved with the primary button held
    PointerDrag { position: Vec2, modifiers: ModifierState },
    /// Primary button released
    PointerUp { position: Vec2, modifiers: ModifierState },
    /// Rotate while moving, nudge while selected
    RotateOrNudge(InteractionKey),
    /// Abort the current move
    Cancel,
    /// The host performed an undo step
    Undo,
    /// Copy the selection and pick the copies up
    Duplicate,
    /// Grow the selection by every transitively connected brick
    ExpandSelection,
    ToggleSelectConnected,
    ToggleBrickBuilding,
    /// The host changed the selection itself
    HostSelectionChanged(Vec<BrickId>),
    /// The host edited brick transforms outside the builder
    TransformsChanged(Vec<BrickId>),
}

/// Key chord: a key plus the modifiers that must be held
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyChord {
    pub key: KeyCode,
    pub ctrl: bool,
    pub alt: bool,
}

impl KeyChord {
    pub fn new(key: KeyCode) -> Self {
        Self {
            key,
            ctrl: false,
            alt: false,
        }
    }

    pub fn alt(key: KeyCode) -> Self {
        Self {
            alt: true,
            ..Self::new(key)
        }
    }

    pub fn ctrl(key: KeyCode) -> Self {
        Self {
            ctrl: true,
            ..Self::new(key)
        }
    }

    pub fn ctrl_alt(key: KeyCode) -> Self {
        Self {
            ctrl: true,
            alt: true,
            key,
        }
    }

    /// Chord produced by a key press; meta counts as ctrl.
    pub fn from_press(key: KeyCode, modifiers: ModifierState) -> Self {
        Self {
            key,
            ctrl: modifiers.ctrl || modifiers.meta,
            alt: modifiers.alt,
        }
    }
}

/// Maps key chords to editor events.
///
/// Default bindings:
/// - Alt+A / Alt+D / Alt+W / Alt+S = rotate or nudge left / right / up / down
/// - Escape = Cancel
/// - Ctrl+Z = Undo
/// - Ctrl+D = Duplicate
/// - Ctrl+Alt+E = ExpandSelection
/// - Ctrl+Alt+K = ToggleSelectConnected
/// - Ctrl+Alt+N = ToggleBrickBuilding
#[derive(Debug, Clone)]
pub struct KeyBindings {
    chords: HashMap<KeyChord, EditorEvent>,
}

impl Default for KeyBindings {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyBindings {
    pub fn new() -> Self {
        let mut bindings = Self {
            chords: HashMap::new(),
        };
        bindings.bind(KeyChord::alt(KeyCode::A), EditorEvent::RotateOrNudge(InteractionKey::Left));
        bindings.bind(KeyChord::alt(KeyCode::D), EditorEvent::RotateOrNudge(InteractionKey::Right));
        bindings.bind(KeyChord::alt(KeyCode::W), EditorEvent::RotateOrNudge(InteractionKey::Up));
        bindings.bind(KeyChord::alt(KeyCode::S), EditorEvent::RotateOrNudge(InteractionKey::Down));
        bindings.bind(KeyChord::new(KeyCode::Escape), EditorEvent::Cancel);
        bindings.bind(KeyChord::ctrl(KeyCode::Z), EditorEvent::Undo);
        bindings.bind(KeyChord::ctrl(KeyCode::D), EditorEvent::Duplicate);
        bindings.bind(KeyChord::ctrl_alt(KeyCode::E), EditorEvent::ExpandSelection);
        bindings.bind(KeyChord::ctrl_alt(KeyCode::K), EditorEvent::ToggleSelectConnected);
        bindings.bind(KeyChord::ctrl_alt(KeyCode::N), EditorEvent::ToggleBrickBuilding);
        bindings
    }

    /// Bind a chord, replacing whatever it produced before.
    pub fn bind(&mut self, chord: KeyChord, event: EditorEvent) {
        self.chords.insert(chord, event);
    }

    pub fn unbind(&mut self, chord: KeyChord) {
        self.chords.remove(&chord);
    }

    /// Event produced by a key press, if the chord is bound.
    pub fn event_for(&self, key: KeyCode, modifiers: ModifierState) -> Option<EditorEvent> {
        self.chords.get(&KeyChord::from_press(key, modifiers)).cloned()
    }
}

// ============================================================================
// CAMERA
// ============================================================================

/// Look-at camera used to cast pointer rays
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EditorCamera {
    pub position: Vec3,
    pub target: Vec3,
    /// Vertical field of view in radians
    pub fov: f32,
    /// Viewport size in pixels
    pub viewport: Vec2,
}

impl Default for EditorCamera {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 8.0, 12.0),
            target: Vec3::ZERO,
            fov: 60f32.to_radians(),
            viewport: Vec2::new(1280.0, 720.0),
        }
    }
}

impl EditorCamera {
    pub fn new(position: Vec3, target: Vec3) -> Self {
        Self {
            position,
            target,
            ..Self::default()
        }
    }

    pub fn forward(&self) -> Vec3 {
        (self.target - self.position).try_normalize().unwrap_or(Vec3::NEG_Z)
    }

    /// Camera right vector; world X when looking straight up or down.
    pub fn right(&self) -> Vec3 {
        let forward = self.forward();
        if forward.y.abs() > 0.99 {
            Vec3::X
        } else {
            forward.cross(Vec3::Y).normalize()
        }
    }

    pub fn up(&self) -> Vec3 {
        self.right().cross(self.forward())
    }

    /// Ray from the camera through a pixel.
    ///
    /// # Arguments
    /// * `pixel` - Screen position in pixels, origin top-left, y down
    pub fn screen_to_ray(&self, pixel: Vec2) -> Ray {
        let size = self.viewport.max(Vec2::ONE);
        let ndc = Vec2::new(pixel.x / size.x * 2.0 - 1.0, 1.0 - pixel.y / size.y * 2.0);
        let aspect = size.x / size.y;
        let half_fov = (self.fov * 0.5).tan();

        let direction = self.forward() + self.right() * ndc.x * aspect * half_fov + self.up() * ndc.y * half_fov;
        Ray::new(self.position, direction)
    }

    /// Pixel position of a world point, `None` when it is behind the camera.
    pub fn world_to_screen(&self, point: Vec3) -> Option<Vec2> {
        let to_point = point - self.position;
        let depth = to_point.dot(self.forward());
        if depth <= 1e-5 {
            return None;
        }
        let half_fov = (self.fov * 0.5).tan();
        let size = self.viewport.max(Vec2::ONE);
        let aspect = size.x / size.y;
        let x = to_point.dot(self.right()) / (depth * half_fov * aspect);
        let y = to_point.dot(self.up()) / (depth * half_fov);
        Some(Vec2::new((x + 1.0) * 0.5 * size.x, (1.0 - y) * 0.5 * size.y))
    }
}
