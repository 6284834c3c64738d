//! Error types for Meridian operations.
//!
//! This module provides the main error type [`MeridianError`] which wraps
//! the error conditions of building, serializing and comparing graphs.

use std::io;

use thiserror::Error;

use meridian_core::GraphError;
use meridian_protocol::{BuildError, SerializeError};

use crate::extensions::service_store::ServiceStoreError;

/// The main error type for Meridian operations.
///
/// # Diagnostic Variants
///
/// The `Build` variant carries the coded diagnostics of a failed build
/// together with the JSON source the entities were read from, so reporters
/// can point at the offending entities.
#[derive(Debug, Error)]
pub enum MeridianError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("{err}")]
    Build { err: BuildError, src: String },

    #[error("Serialization error: {0}")]
    Serialize(#[from] SerializeError),

    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    #[error("Service store error: {0}")]
    ServiceStore(#[from] ServiceStoreError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Round trip changed {} entities: {}", paths.len(), paths.join(", "))]
    Roundtrip { paths: Vec<String> },
}

impl MeridianError {
    /// Create a new `Build` error with the JSON source of the entities.
    pub fn new_build_error(err: BuildError, src: impl Into<String>) -> Self {
        Self::Build {
            err,
            src: src.into(),
        }
    }
}
