//! Error types for cleanup operations.

use scene_types::SceneError;
use thiserror::Error;

/// Result type for cleanup operations.
pub type CleanupResult<T> = Result<T, CleanupError>;

/// Errors that can occur during cleanup.
///
/// Only configuration errors abort a run, and they do so before the model is
/// touched. The texture variants are raised inside orphan repair and handled
/// there per material.
#[derive(Debug, Error)]
pub enum CleanupError {
    /// Scope tag not recognised.
    #[error("invalid scope '{value}' (expected WholeModel, CurrentEditContext or Selection)")]
    InvalidScope {
        /// The rejected tag.
        value: String,
    },

    /// Configuration could not be parsed or holds out-of-range values.
    #[error("invalid configuration: {reason}")]
    InvalidConfig {
        /// What was wrong.
        reason: String,
    },

    /// A material's texture could not be rendered to an image file.
    #[error("cannot export texture of material '{material}': {reason}")]
    Texture {
        /// Material name.
        material: String,
        /// Why the export failed.
        reason: String,
    },

    /// Filesystem failure while exporting or importing a texture.
    #[error("texture file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// The model rejected an edit.
    #[error(transparent)]
    Scene(#[from] SceneError),
}

impl CleanupError {
    pub(crate) fn config(reason: impl Into<String>) -> Self {
        Self::InvalidConfig { reason: reason.into() }
    }
}
