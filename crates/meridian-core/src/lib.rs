//! Meridian Core: the model graph
//!
//! This crate provides the semantic core of the Meridian modeling toolchain.
//! It includes:
//!
//! - **Identifiers**: String-interned element paths ([`identifier::Id`])
//! - **Elements**: The element model and its kinds ([`element`] module)
//! - **References**: Deferred, typed pointers between elements ([`reference`] module)
//! - **Graph**: The element container with path and kind indexes ([`Graph`])
//! - **Mappings**: Class and enumeration mappings and their resolution ([`mapping`] module)
//! - **Plugins**: Extension element kinds, cleaners and mapping extensions ([`plugin`] module)
//! - **Visitor**: Exhaustive dispatch over element kinds ([`visitor`] module)
//! - **Hashing**: Structural hashes and graph diffs ([`hash`], [`diff`] modules)

pub mod diff;
pub mod element;
pub mod error;
pub mod graph;
pub mod hash;
pub mod identifier;
pub mod mapping;
pub mod plugin;
pub mod reference;
pub mod visitor;

pub use diff::GraphDiff;
pub use element::{Element, ElementBody, ElementId, ElementKind};
pub use error::{GraphError, Result};
pub use graph::Graph;
pub use hash::HashCode;
