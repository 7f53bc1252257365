//! Error Types
//!
//! Fallible library operations: model import/reimport and settings I/O.
//! Per-frame predicates (connection validity, collision) never produce
//! errors; they answer "no".

use thiserror::Error;

// ============================================================================
// IMPORT
// ============================================================================

/// Errors raised while importing or reimporting a model.
#[derive(Debug, Error)]
pub enum ImportError {
    /// The model contains no brick that could be built.
    #[error("model '{0}' produced no bricks")]
    EmptyModel(String),
    /// A group of the existing model no longer matches the source.
    #[error("group {number} ('{name}') no longer matches the source model")]
    GroupMismatch { number: usize, name: String },
    /// A group number does not exist in the existing model.
    #[error("unknown group {0}")]
    UnknownGroup(usize),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

// ============================================================================
// CONFIG
// ============================================================================

/// Errors raised while loading or saving [`crate::config::BuilderSettings`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

// ============================================================================
// TOP LEVEL
// ============================================================================

/// Any error surfaced by the builder library.
#[derive(Debug, Error)]
pub enum BuilderError {
    #[error(transparent)]
    Import(#[from] ImportError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub type Result<T, E = BuilderError> = std::result::Result<T, E>;
