//! Builder Settings
//!
//! Persisted preferences of the interactive builder. Missing JSON fields
//! fall back to their defaults so older settings files keep loading.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::building::SearchSettings;
use crate::error::ConfigError;

/// Preferences of the assembly controller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuilderSettings {
    /// Master switch; when off the controller ignores pointer input
    pub brick_building: bool,
    /// Expand click selection to every transitively connected brick
    pub select_connected: bool,
    /// Pointer travel (pixels) before a press turns into a drag
    pub sticky_snap_distance: f32,
    /// Pointer travel (pixels) between two connection searches while moving
    pub reevaluate_distance: f32,
    /// Pointer travel (pixels) at release that forces one last search
    pub place_tolerance: f32,
    /// Height of the horizontal plane used when the ray hits nothing
    pub reference_plane_height: f32,
    /// Snapshots kept on the undo stack
    pub max_undo_steps: usize,
    pub search: SearchSettings,
}

impl Default for BuilderSettings {
    fn default() -> Self {
        Self {
            brick_building: true,
            select_connected: true,
            sticky_snap_distance: 20.0,
            reevaluate_distance: 15.0,
            place_tolerance: 20.0,
            reference_plane_height: 0.0,
            max_undo_steps: 50,
            search: SearchSettings::default(),
        }
    }
}

impl BuilderSettings {
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load settings from a JSON file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        let settings = Self::from_json(&json)?;
        info!("[Brick Builder] Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Save settings to a JSON file, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.to_json()?)?;
        info!("[Brick Builder] Saved settings to {}", path.display());
        Ok(())
    }
}
