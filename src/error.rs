//! Error types for sliver.
//!
//! Malformed input geometry is not an error: the builder drops offending
//! triangles and records them in the mesh defect counters. Errors are reserved
//! for broken caller contracts (out-of-range indices, stale handles, flipping a
//! boundary edge), invalid options, and I/O.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using [`MeshError`].
pub type Result<T> = std::result::Result<T, MeshError>;

/// Errors that can occur during mesh operations.
#[derive(Error, Debug)]
pub enum MeshError {
    /// A triangle references a vertex index outside the position array.
    #[error("triangle {face} references invalid vertex index {vertex}")]
    InvalidVertexIndex {
        /// The triangle index in the input.
        face: usize,
        /// The invalid vertex index.
        vertex: usize,
    },

    /// A handle does not refer to a live element.
    #[error("{kind} handle {index} does not refer to a live element")]
    StaleHandle {
        /// The element kind ("vertex", "half-edge" or "face").
        kind: &'static str,
        /// The raw slot index.
        index: usize,
    },

    /// An operation that needs an interior edge was given a boundary half-edge.
    #[error("half-edge {halfedge} lies on the boundary (no opposite half-edge)")]
    BoundaryHalfEdge {
        /// The raw half-edge slot index.
        halfedge: usize,
    },

    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Error saving mesh to file.
    #[error("failed to save mesh to {path}: {message}")]
    SaveError {
        /// The file path.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// Invalid parameter value.
    #[error("invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// The invalid value (as string).
        value: String,
        /// Reason the value is invalid.
        reason: &'static str,
    },
}

impl MeshError {
    /// Create an invalid parameter error.
    pub fn invalid_param<T: std::fmt::Display>(
        name: &'static str,
        value: T,
        reason: &'static str,
    ) -> Self {
        MeshError::InvalidParameter {
            name,
            value: value.to_string(),
            reason,
        }
    }

    pub(crate) fn stale(kind: &'static str, index: usize) -> Self {
        MeshError::StaleHandle { kind, index }
    }
}
