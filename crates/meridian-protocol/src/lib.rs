//! # Meridian Protocol
//!
//! The exchange format of Meridian model graphs. This crate provides the
//! pipeline from an entity collection to a bound graph and back:
//!
//! - **Entities**: the `{path, classifierPath, content}` exchange records
//!   and their canonical form ([`Entity`], [`canonical`])
//! - **Protocol documents**: typed serde views of entity content
//!   ([`protocol`] module)
//! - **Building**: phased graph construction with coded diagnostics
//!   ([`GraphBuilder`], [`BuildError`])
//! - **Serialization**: graph to entities ([`serialize_graph`])
//!
//! ## Usage
//!
//! ```
//! # use std::rc::Rc;
//! # use meridian_core::plugin::PluginRegistry;
//! # use meridian_protocol::{GraphBuilder, canonical_entities, parse_entities, serialize_graph};
//! let json = r#"[
//!     {
//!         "path": "model::Gender",
//!         "classifierPath": "meta::pure::metamodel::type::Enumeration",
//!         "content": {
//!             "_type": "Enumeration",
//!             "name": "Gender",
//!             "package": "model",
//!             "values": [{"value": "MALE"}, {"value": "FEMALE"}]
//!         }
//!     }
//! ]"#;
//!
//! let entities = parse_entities(json).unwrap();
//! let graph = GraphBuilder::new(Rc::new(PluginRegistry::new()))
//!     .build(&entities)
//!     .unwrap();
//!
//! let written = serialize_graph(&graph).unwrap();
//! assert_eq!(canonical_entities(&written), canonical_entities(&entities));
//! ```

mod builder;
mod classifier;
mod convert;
mod entity;
pub mod error;
pub mod protocol;
mod serializer;
mod validate;

pub use builder::GraphBuilder;
pub use classifier::CoreClassifier;
pub use entity::{Entity, canonical, canonical_entities, entities_to_json, parse_entities};
pub use error::{BuildError, Diagnostic};
pub use serializer::{ProtocolSerializer, SerializeError, serialize_graph};
