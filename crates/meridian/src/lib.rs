//! Meridian - build, validate, hash and serialize model graphs.
//!
//! Entity collections are built into a bound, wired [`Graph`], checked with
//! coded diagnostics, written back to entities and compared by structural
//! hash. The built-in extension presets (text, diagram, service store) are
//! installed according to the [`config::AppConfig`].

pub mod config;
pub mod extensions;

mod error;

pub use meridian_core::{
    Graph, GraphDiff, GraphError, HashCode, diff, element, hash, identifier, mapping, plugin,
    reference, visitor,
};
pub use meridian_protocol::{
    BuildError, Diagnostic, Entity, SerializeError, canonical_entities, entities_to_json,
    error::{ErrorCode, Label, Severity},
    parse_entities,
};

pub use error::MeridianError;

use std::rc::Rc;

use indexmap::IndexMap;
use log::{debug, info, trace};

use meridian_core::plugin::PluginRegistry;
use meridian_protocol::GraphBuilder;

use config::AppConfig;

/// An entity whose written form differs from the one it was built from.
#[derive(Debug, Clone, PartialEq)]
pub enum RoundtripMismatch {
    /// The entity was not written back.
    Missing { path: String },
    /// An entity was written that was not part of the input.
    Unexpected { path: String },
    /// The canonical forms differ.
    Changed {
        path: String,
        expected: Entity,
        actual: Entity,
    },
}

impl RoundtripMismatch {
    pub fn path(&self) -> &str {
        match self {
            RoundtripMismatch::Missing { path }
            | RoundtripMismatch::Unexpected { path }
            | RoundtripMismatch::Changed { path, .. } => path,
        }
    }
}

/// Entry point for building and inspecting Meridian graphs.
///
/// A manager owns the plugin registry assembled from the configured
/// extension presets; every graph it builds shares that registry.
///
/// # Examples
///
/// ```rust
/// use meridian::{GraphManager, config::AppConfig};
///
/// let json = r#"{"entities": [{
///     "path": "model::Person",
///     "classifierPath": "meta::pure::metamodel::type::Class",
///     "content": {"_type": "class", "name": "Person", "package": "model"}
/// }]}"#;
///
/// let manager = GraphManager::new(AppConfig::default()).expect("Failed to install extensions");
/// let graph = manager.build_graph_from_json(json).expect("Failed to build graph");
///
/// assert!(graph.get_element("model::Person").is_some());
/// ```
#[derive(Debug)]
pub struct GraphManager {
    config: AppConfig,
    registry: Rc<PluginRegistry>,
}

impl GraphManager {
    /// Create a new graph manager with the given configuration.
    ///
    /// # Arguments
    ///
    /// * `config` - Application configuration including build and extension settings
    ///
    /// # Errors
    ///
    /// Returns `MeridianError::Graph` when an extension preset is enabled twice.
    pub fn new(config: AppConfig) -> Result<Self, MeridianError> {
        let registry = extensions::registry(config.extensions().enabled())?;
        info!(plugins:? = registry.plugins(); "Created graph manager");
        Ok(Self {
            config,
            registry: Rc::new(registry),
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// The registry shared by every graph built by this manager.
    pub fn registry(&self) -> &Rc<PluginRegistry> {
        &self.registry
    }

    fn builder(&self) -> GraphBuilder {
        GraphBuilder::new(Rc::clone(&self.registry)).with_freeze(self.config.build().freeze())
    }

    /// Build a graph from an entity collection.
    ///
    /// # Errors
    ///
    /// Returns `MeridianError::Build` with the diagnostics of the first
    /// failing build phase. The entities, written as JSON, are attached as
    /// the error source.
    pub fn build_graph(&self, entities: &[Entity]) -> Result<Graph, MeridianError> {
        self.builder().build(entities).map_err(|err| {
            let src = entities_to_json(entities).unwrap_or_default();
            MeridianError::new_build_error(err, src)
        })
    }

    /// Parse an entity collection and build it into a graph.
    ///
    /// Accepts a JSON array of entities or an object with an `entities`
    /// array.
    ///
    /// # Errors
    ///
    /// Returns `MeridianError::Build` for malformed JSON (E001) and for
    /// every build failure, with `json` attached as the error source.
    pub fn build_graph_from_json(&self, json: &str) -> Result<Graph, MeridianError> {
        let entities = parse_entities(json)
            .map_err(|diagnostic| MeridianError::new_build_error(diagnostic.into(), json))?;
        debug!(entities = entities.len(); "Parsed entities");

        self.builder()
            .build(&entities)
            .map_err(|err| MeridianError::new_build_error(err, json))
    }

    /// Write a graph back to entities, sorted by path.
    ///
    /// # Errors
    ///
    /// Returns `MeridianError::Serialize` when an element can't be written.
    pub fn serialize_graph(&self, graph: &Graph) -> Result<Vec<Entity>, MeridianError> {
        Ok(meridian_protocol::serialize_graph(graph)?)
    }

    /// Build `entities`, write the graph back and compare canonical forms.
    ///
    /// Returns the entities that did not survive the round trip; an empty
    /// list means the round trip is lossless.
    ///
    /// # Errors
    ///
    /// Returns the build or serialization failure.
    pub fn check_roundtrip(&self, entities: &[Entity]) -> Result<Vec<RoundtripMismatch>, MeridianError> {
        let graph = self.build_graph(entities)?;
        let written = self.serialize_graph(&graph)?;

        let mismatches = roundtrip_mismatches(entities, &written);
        info!(entities = entities.len(), mismatches = mismatches.len(); "Checked round trip");
        Ok(mismatches)
    }

    /// Structural hashes of every model element, sorted by path.
    ///
    /// # Errors
    ///
    /// Returns `MeridianError::Graph` when an element can't be hashed, e.g.
    /// after the graph was disposed.
    pub fn hash_index(&self, graph: &Graph) -> Result<IndexMap<String, HashCode>, MeridianError> {
        Ok(graph.hash_index()?)
    }

    /// Build both collections and compare them element by element.
    ///
    /// # Errors
    ///
    /// Returns the first build or hashing failure.
    pub fn diff(&self, before: &[Entity], after: &[Entity]) -> Result<GraphDiff, MeridianError> {
        let before = self.build_graph(before)?;
        let after = self.build_graph(after)?;

        let diff = GraphDiff::between(&before, &after)?;
        info!(
            added = diff.added.len(),
            removed = diff.removed.len(),
            modified = diff.modified.len();
            "Compared graphs"
        );
        trace!(diff:?; "Graph diff");
        Ok(diff)
    }
}

/// Compares the canonical forms of the entities a graph was built from and
/// the entities it was written back to.
pub fn roundtrip_mismatches(entities: &[Entity], written: &[Entity]) -> Vec<RoundtripMismatch> {
    compare_entities(&canonical_entities(entities), &canonical_entities(written))
}

/// Pairs two path-sorted canonical collections.
fn compare_entities(expected: &[Entity], actual: &[Entity]) -> Vec<RoundtripMismatch> {
    let actual_by_path: IndexMap<&str, &Entity> =
        actual.iter().map(|entity| (entity.path.as_str(), entity)).collect();

    let mut mismatches = Vec::new();
    for entity in expected {
        match actual_by_path.get(entity.path.as_str()) {
            None => mismatches.push(RoundtripMismatch::Missing {
                path: entity.path.clone(),
            }),
            Some(written) if *written != entity => mismatches.push(RoundtripMismatch::Changed {
                path: entity.path.clone(),
                expected: entity.clone(),
                actual: (*written).clone(),
            }),
            Some(_) => {}
        }
    }
    for entity in actual {
        if !expected.iter().any(|candidate| candidate.path == entity.path) {
            mismatches.push(RoundtripMismatch::Unexpected {
                path: entity.path.clone(),
            });
        }
    }
    mismatches
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entity(path: &str, content: serde_json::Value) -> Entity {
        Entity::new(path, "meta::pure::metamodel::type::Class", content)
    }

    #[test]
    fn test_compare_entities() {
        let a = entity("model::A", json!({"_type": "class", "name": "A"}));
        let b = entity("model::B", json!({"_type": "class", "name": "B"}));
        let b_changed = entity("model::B", json!({"_type": "class", "name": "B2"}));
        let c = entity("model::C", json!({"_type": "class", "name": "C"}));

        let mismatches = compare_entities(&[a.clone(), b.clone()], &[b_changed.clone(), c]);

        assert_eq!(
            mismatches,
            vec![
                RoundtripMismatch::Missing {
                    path: "model::A".to_string()
                },
                RoundtripMismatch::Changed {
                    path: "model::B".to_string(),
                    expected: b,
                    actual: b_changed,
                },
                RoundtripMismatch::Unexpected {
                    path: "model::C".to_string()
                },
            ]
        );
        assert!(compare_entities(&[a.clone()], &[a]).is_empty());
    }
}
