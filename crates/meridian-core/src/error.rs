//! Error types for graph operations.
//!
//! [`GraphError`] is the single error type of the core crate. Lookup misses,
//! reference failures and lifecycle violations are all reported through it,
//! carrying the element path (and where relevant the expected kind) that
//! caused the failure.

use thiserror::Error;

/// A type alias for `Result<T, GraphError>`.
pub type Result<T> = std::result::Result<T, GraphError>;

/// Errors raised by the graph, its elements and the mapping engine.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("element `{path}` already exists in the graph")]
    DuplicatePath { path: String },

    #[error("invalid element path `{path}`: {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("can't find {expected_kind} `{path}`")]
    ElementNotFound { path: String, expected_kind: String },

    #[error("reference to `{path}` has not been resolved")]
    UnresolvedReference { path: String },

    #[error("can't resolve reference `{path}` as {expected_kind}")]
    ReferenceResolution {
        path: String,
        expected_kind: String,
        found_kind: Option<String>,
    },

    #[error("can't find class mapping with ID `{id}` in mapping `{mapping_path}`")]
    ClassMappingNotFound { id: String, mapping_path: String },

    #[error("can't find enumeration mapping with ID `{id}` in mapping `{mapping_path}`")]
    EnumerationMappingNotFound { id: String, mapping_path: String },

    #[error("can't find property mapping for property `{property}` in class mapping `{set_implementation}`")]
    PropertyMappingNotFound {
        property: String,
        set_implementation: String,
    },

    #[error("can't find property `{property}` on `{owner}`")]
    PropertyNotFound { owner: String, property: String },

    #[error("element `{path}` is already disposed")]
    DisposedElementAccess { path: String },

    #[error("read-only element `{path}` is modified")]
    ImmutableElementMutation { path: String },

    #[error("extension `{name}` is already registered")]
    DuplicateExtension { name: String },
}

impl GraphError {
    /// Returns the element path this error is about, when there is one.
    pub fn path(&self) -> Option<&str> {
        match self {
            GraphError::DuplicatePath { path }
            | GraphError::InvalidPath { path, .. }
            | GraphError::ElementNotFound { path, .. }
            | GraphError::UnresolvedReference { path }
            | GraphError::ReferenceResolution { path, .. }
            | GraphError::DisposedElementAccess { path }
            | GraphError::ImmutableElementMutation { path } => Some(path),
            GraphError::ClassMappingNotFound { mapping_path, .. }
            | GraphError::EnumerationMappingNotFound { mapping_path, .. } => Some(mapping_path),
            GraphError::PropertyNotFound { owner, .. } => Some(owner),
            GraphError::PropertyMappingNotFound { .. } | GraphError::DuplicateExtension { .. } => {
                None
            }
        }
    }
}
