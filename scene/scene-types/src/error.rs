//! Error types for scene construction and editing.

use thiserror::Error;

/// Result type for scene operations.
pub type SceneResult<T> = Result<T, SceneError>;

/// Errors that can occur while building or editing a [`Model`](crate::Model).
#[derive(Debug, Error)]
pub enum SceneError {
    /// A handle no longer refers to a live entity.
    #[error("stale {kind} handle {index}")]
    StaleHandle {
        /// Kind of entity the handle refers to.
        kind: &'static str,
        /// Arena index carried by the handle.
        index: usize,
    },

    /// A face loop is too short or repeats an edge in an unusable way.
    #[error("invalid face loop: {reason}")]
    InvalidLoop {
        /// Why the loop was rejected.
        reason: String,
    },

    /// An edge would connect a vertex to itself.
    #[error("edge endpoints must differ (vertex {vertex})")]
    DegenerateEdge {
        /// The repeated vertex index.
        vertex: usize,
    },

    /// A face's vertices do not span a plane.
    #[error("face vertices are collinear or coincident")]
    DegenerateFace,

    /// Instancing a definition inside itself (directly or through nesting).
    #[error("definition '{name}' cannot contain an instance of itself")]
    RecursiveInstance {
        /// Name of the offending definition.
        name: String,
    },
}

impl SceneError {
    pub(crate) const fn stale(kind: &'static str, index: usize) -> Self {
        Self::StaleHandle { kind, index }
    }
}
