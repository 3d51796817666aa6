//! Error types for trellis.
//!
//! This module defines all error types used throughout the library.
//!
//! The error taxonomy distinguishes recoverable misuse (accessing a disabled
//! optional component, requesting a custom component with the wrong type,
//! passing a reference list of the wrong arity) from plain out-of-bounds
//! element access, which panics like slice indexing does. No operation is
//! ever retried; the core performs no I/O.

use thiserror::Error;

/// Result type alias using [`MeshError`].
pub type Result<T> = std::result::Result<T, MeshError>;

/// Errors that can occur during mesh operations.
#[derive(Error, Debug)]
pub enum MeshError {
    /// An element or component index is past the end of its array.
    #[error("index {index} out of range for length {len}")]
    OutOfRange {
        /// The offending index.
        index: usize,
        /// The length of the indexed array.
        len: usize,
    },

    /// An optional component was accessed while disabled.
    #[error("optional component `{component}` is not enabled")]
    ComponentNotEnabled {
        /// Name of the component slot.
        component: &'static str,
    },

    /// A value list has the wrong length for a fixed-size target.
    #[error("size mismatch: expected {expected} entries, got {actual}")]
    SizeMismatch {
        /// The required length.
        expected: usize,
        /// The length that was supplied.
        actual: usize,
    },

    /// A custom component was accessed with the wrong static type.
    #[error("custom component `{name}` stores `{stored}`, not `{requested}`")]
    TypeMismatch {
        /// Name of the custom component.
        name: String,
        /// Type name of the stored values.
        stored: &'static str,
        /// Type name the caller asked for.
        requested: &'static str,
    },

    /// No custom component with the given name exists.
    #[error("no custom component named `{name}`")]
    ComponentNotFound {
        /// The requested name.
        name: String,
    },

    /// A custom component with the given name already exists.
    #[error("custom component `{name}` already exists")]
    ComponentExists {
        /// The conflicting name.
        name: String,
    },

    /// A face references an invalid vertex index.
    #[error("face {face} references invalid vertex index {vertex}")]
    InvalidVertexIndex {
        /// The face index.
        face: usize,
        /// The invalid vertex index.
        vertex: usize,
    },

    /// A face has duplicate vertex indices (degenerate polygon).
    #[error("face {face} is degenerate (has duplicate vertices)")]
    DegenerateFace {
        /// The face index.
        face: usize,
    },

    /// The mesh has no faces.
    #[error("mesh has no faces")]
    EmptyMesh,

    /// A face cannot be converted to the destination face arity.
    #[error("face {face} has {actual} vertices, destination requires {expected}")]
    ShapeMismatch {
        /// The offending face index.
        face: usize,
        /// The arity required by the destination mesh type.
        expected: usize,
        /// The arity the source face has.
        actual: usize,
    },
}

impl MeshError {
    /// Create a type-mismatch error from the stored and requested type names.
    pub fn type_mismatch(
        name: impl Into<String>,
        stored: &'static str,
        requested: &'static str,
    ) -> Self {
        MeshError::TypeMismatch {
            name: name.into(),
            stored,
            requested,
        }
    }
}
