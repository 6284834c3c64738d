//! Graph construction from entities.
//!
//! # Overview
//!
//! [`GraphBuilder::build`] turns an entity collection into a bound, wired
//! graph in phases:
//!
//! 1. **Check** - entity paths are valid and unique, classifiers are known,
//!    content agrees with its path and kind.
//! 2. **Register** - content is converted to element bodies and registered
//!    under their paths.
//! 3. **Resolve** - every reference is bound to its target element.
//! 4. **Wire** - class mapping ids are checked for uniqueness and the
//!    mapping engine binds set implementation targets.
//! 5. **Validate** - annotations and relational pointers are checked against
//!    their profiles and databases.
//! 6. **Freeze** - optionally, every element becomes read-only.
//!
//! Diagnostics are collected across a phase. The build stops at the end of
//! the first phase that produced an error.

use std::{collections::HashSet, rc::Rc};

use log::{debug, info, trace};
use serde_json::Value;

use meridian_core::{
    ElementBody, ElementKind, Graph,
    identifier::{self, Id},
    plugin::{ElementKindPlugin, PluginRegistry},
};

use crate::{
    classifier::CoreClassifier,
    convert,
    entity::Entity,
    error::{BuildError, Diagnostic, DiagnosticCollector, ErrorCode},
    validate,
};

/// Kind of a checked entity.
#[derive(Clone, Copy)]
enum EntityKind<'r> {
    Core(CoreClassifier),
    Extension(&'r dyn ElementKindPlugin),
}

impl EntityKind<'_> {
    fn protocol_type(&self) -> &str {
        match self {
            EntityKind::Core(classifier) => classifier.protocol_type(),
            EntityKind::Extension(plugin) => plugin.protocol_type(),
        }
    }
}

/// Builds graphs from entity collections.
///
/// # Examples
///
/// ```
/// use std::rc::Rc;
///
/// use meridian_core::plugin::PluginRegistry;
/// use meridian_protocol::{Entity, GraphBuilder};
/// use serde_json::json;
///
/// let entities = vec![Entity::new(
///     "model::Person",
///     "meta::pure::metamodel::type::Class",
///     json!({
///         "_type": "class",
///         "name": "Person",
///         "package": "model",
///         "properties": [{
///             "name": "name",
///             "type": "String",
///             "multiplicity": {"lowerBound": 1, "upperBound": 1}
///         }]
///     }),
/// )];
///
/// let graph = GraphBuilder::new(Rc::new(PluginRegistry::new()))
///     .with_freeze(true)
///     .build(&entities)
///     .unwrap();
///
/// assert!(graph.is_frozen());
/// assert!(graph.get_element("model::Person").is_some());
/// ```
#[derive(Debug, Clone)]
pub struct GraphBuilder {
    registry: Rc<PluginRegistry>,
    freeze: bool,
}

impl GraphBuilder {
    /// Creates a builder using the extensions of `registry`.
    pub fn new(registry: Rc<PluginRegistry>) -> Self {
        Self {
            registry,
            freeze: false,
        }
    }

    /// Sets whether the built graph is frozen.
    pub fn with_freeze(mut self, freeze: bool) -> Self {
        self.freeze = freeze;
        self
    }

    /// Builds a graph from `entities`.
    ///
    /// # Errors
    ///
    /// Returns a [`BuildError`] carrying every error diagnostic of the first
    /// failing phase.
    pub fn build(&self, entities: &[Entity]) -> Result<Graph, BuildError> {
        info!(entities = entities.len(), freeze = self.freeze; "Building graph");

        let checked = self.check_entities(entities)?;
        let mut graph = Graph::new(Rc::clone(&self.registry));
        self.register(&mut graph, &checked)?;
        resolve(&graph)?;
        wire(&graph)?;

        let mut collector = DiagnosticCollector::new();
        validate::validate(&graph, &mut collector);
        collector.finish()?;

        if self.freeze {
            graph.freeze();
        }

        info!(elements = graph.len(); "Graph built");
        Ok(graph)
    }

    // =========================================================================
    // Check
    // =========================================================================

    fn check_entities<'e>(
        &self,
        entities: &'e [Entity],
    ) -> Result<Vec<(&'e Entity, EntityKind<'_>)>, BuildError> {
        let mut collector = DiagnosticCollector::new();
        let mut seen = HashSet::new();
        let mut checked = Vec::with_capacity(entities.len());

        for entity in entities {
            let path = entity.path.as_str();
            if !seen.insert(path) {
                collector.emit(
                    Diagnostic::error(format!("entity `{path}` is declared more than once"))
                        .with_code(ErrorCode::E002)
                        .with_label(path, "duplicate entity"),
                );
                continue;
            }
            if let Err(reason) = identifier::validate_path(path) {
                collector.emit(
                    Diagnostic::error(format!("invalid entity path `{path}`: {reason}"))
                        .with_code(ErrorCode::E003)
                        .with_label(path, "invalid path"),
                );
                continue;
            }

            let Some(kind) = self.entity_kind(&entity.classifier_path) else {
                collector.emit(
                    Diagnostic::error(format!(
                        "unknown classifier path `{}` of `{path}`",
                        entity.classifier_path
                    ))
                    .with_code(ErrorCode::E005)
                    .with_label(path, "unknown classifier")
                    .with_help("install the plugin providing this element kind"),
                );
                continue;
            };

            match check_content(entity, kind) {
                Ok(()) => {
                    trace!(path, classifier = entity.classifier_path.as_str(); "Checked entity");
                    checked.push((entity, kind));
                }
                Err(diagnostic) => collector.emit(diagnostic),
            }
        }

        collector.finish()?;
        debug!(entities = checked.len(); "Checked entities");
        Ok(checked)
    }

    fn entity_kind(&self, classifier_path: &str) -> Option<EntityKind<'_>> {
        if let Some(classifier) = CoreClassifier::from_path(classifier_path) {
            return Some(EntityKind::Core(classifier));
        }
        self.registry
            .element_kind_by_classifier(classifier_path)
            .map(EntityKind::Extension)
    }

    // =========================================================================
    // Register
    // =========================================================================

    fn register(&self, graph: &mut Graph, checked: &[(&Entity, EntityKind<'_>)]) -> Result<(), BuildError> {
        let mut collector = DiagnosticCollector::new();

        for (entity, kind) in checked {
            let path = entity.path.as_str();
            let body = match kind {
                EntityKind::Core(classifier) => {
                    convert::element_body(*classifier, path, &entity.content, &self.registry)
                }
                EntityKind::Extension(plugin) => plugin
                    .build(&entity.document())
                    .map(ElementBody::Extension)
                    .map_err(|err| {
                        Diagnostic::error(format!("malformed content of `{path}`: {err}"))
                            .with_code(ErrorCode::E006)
                            .with_label(path, "malformed content")
                    }),
            };

            match body.and_then(|body| {
                graph
                    .create_element(path, body)
                    .map_err(|err| Diagnostic::from_graph_error(err, None))
            }) {
                Ok(_) => trace!(path; "Registered element"),
                Err(diagnostic) => collector.emit(diagnostic),
            }
        }

        collector.finish()?;
        debug!(elements = graph.len(); "Registered elements");
        Ok(())
    }
}

/// Checks the members every entity content carries: `_type`, `name` and
/// `package`.
fn check_content(entity: &Entity, kind: EntityKind<'_>) -> Result<(), Diagnostic> {
    let path = entity.path.as_str();
    if !entity.content.is_object() {
        return Err(Diagnostic::error(format!("content of `{path}` is not a JSON object"))
            .with_code(ErrorCode::E006)
            .with_label(path, "malformed content"));
    }

    let expected = kind.protocol_type();
    match entity.content_type() {
        Some(found) if found == expected => {}
        found => {
            return Err(Diagnostic::error(format!(
                "content of `{path}` has type `{}`, expected `{expected}`",
                found.unwrap_or("<none>")
            ))
            .with_code(ErrorCode::E007)
            .with_label(path, "content type mismatch")
            .with_help(format!("the classifier `{}` carries `{expected}` content", entity.classifier_path)));
        }
    }

    let id = Id::new(path);
    let name = entity.content.get("name").and_then(Value::as_str);
    let package = entity
        .content
        .get("package")
        .and_then(Value::as_str)
        .filter(|package| !package.is_empty());
    let expected_package = id.package_path().map(|package| package.as_string());

    if name != Some(id.name().as_str()) || package != expected_package.as_deref() {
        return Err(Diagnostic::error(format!(
            "content of `{path}` declares name `{}` in package `{}`",
            name.unwrap_or_default(),
            package.unwrap_or_default()
        ))
        .with_code(ErrorCode::E004)
        .with_label(path, "content disagrees with path"));
    }
    Ok(())
}

// =============================================================================
// Resolve and wire
// =============================================================================

fn resolve(graph: &Graph) -> Result<(), BuildError> {
    let mut collector = DiagnosticCollector::new();
    let mut resolved = 0usize;

    for (_, element) in graph.elements() {
        let owner = element.path().as_string();
        for reference in element.body().references() {
            match reference.resolve(graph) {
                Ok(_) => resolved += 1,
                Err(err) => collector.emit(Diagnostic::from_graph_error(err, Some(&owner))),
            }
        }
    }

    collector.finish()?;
    debug!(resolved; "Resolved references");
    Ok(())
}

fn wire(graph: &Graph) -> Result<(), BuildError> {
    let mut collector = DiagnosticCollector::new();
    let mappings: Vec<_> = graph.elements_of_kind(ElementKind::Mapping).collect();

    for (id, element) in &mappings {
        let ElementBody::Mapping(mapping) = element.body() else {
            continue;
        };
        let path = element.path().as_string();

        let mut ids = HashSet::new();
        for (_, set_implementation) in mapping.set_implementations() {
            let value = set_implementation.id.value();
            if !ids.insert(value) {
                collector.emit(
                    Diagnostic::error(format!(
                        "class mapping id `{value}` is used more than once in `{path}`"
                    ))
                    .with_code(ErrorCode::E302)
                    .with_label(path.as_str(), "duplicate class mapping id")
                    .with_help("give each class mapping of the same class an explicit `id`"),
                );
            }
        }

        for err in graph.wire_mapping(*id) {
            collector.emit(Diagnostic::from_graph_error(err, Some(&path)));
        }
    }

    collector.finish()?;
    debug!(mappings = mappings.len(); "Wired mappings");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn builder() -> GraphBuilder {
        GraphBuilder::new(Rc::new(PluginRegistry::new()))
    }

    fn class(path: &str, content: Value) -> Entity {
        Entity::new(path, CoreClassifier::Class.path(), content)
    }

    fn codes(err: &BuildError) -> Vec<ErrorCode> {
        err.diagnostics().iter().filter_map(Diagnostic::code).collect()
    }

    #[test]
    fn test_duplicate_entity_path() {
        let person = class(
            "model::Person",
            json!({"_type": "class", "name": "Person", "package": "model"}),
        );
        let err = builder().build(&[person.clone(), person]).unwrap_err();
        assert_eq!(codes(&err), vec![ErrorCode::E002]);
    }

    #[test]
    fn test_check_phase_collects_every_error() {
        let entities = vec![
            class("model::", json!({"_type": "class", "name": "", "package": "model"})),
            Entity::new("model::Thing", "meta::unknown::Thing", json!({"_type": "thing"})),
            class(
                "model::Person",
                json!({"_type": "class", "name": "Human", "package": "model"}),
            ),
            class(
                "model::Firm",
                json!({"_type": "Enumeration", "name": "Firm", "package": "model"}),
            ),
        ];

        let err = builder().build(&entities).unwrap_err();
        assert_eq!(
            codes(&err),
            vec![ErrorCode::E003, ErrorCode::E005, ErrorCode::E004, ErrorCode::E007]
        );
    }

    #[test]
    fn test_top_level_entity_has_no_package() {
        let graph = builder()
            .build(&[class("Person", json!({"_type": "class", "name": "Person"}))])
            .unwrap();
        assert!(graph.get_element("Person").is_some());
    }

    #[test]
    fn test_unresolved_reference_names_owner() {
        let entities = vec![class(
            "model::Person",
            json!({
                "_type": "class",
                "name": "Person",
                "package": "model",
                "superTypes": ["x::y::Missing"]
            }),
        )];

        let err = builder().build(&entities).unwrap_err();
        let diagnostic = &err.diagnostics()[0];
        assert_eq!(diagnostic.code(), Some(ErrorCode::E200));
        assert_eq!(diagnostic.labels()[0].path(), "model::Person");
        assert!(matches!(
            diagnostic.cause(),
            Some(meridian_core::GraphError::ReferenceResolution { path, .. }) if path == "x::y::Missing"
        ));
    }

    #[test]
    fn test_path_conflict_with_class() {
        let entities = vec![
            class("model", json!({"_type": "class", "name": "model"})),
            class(
                "model::Person",
                json!({"_type": "class", "name": "Person", "package": "model"}),
            ),
        ];

        let err = builder().build(&entities).unwrap_err();
        assert_eq!(codes(&err), vec![ErrorCode::E101]);
    }

    #[test]
    fn test_duplicate_class_mapping_id() {
        let entities = vec![
            class(
                "model::Person",
                json!({"_type": "class", "name": "Person", "package": "model"}),
            ),
            Entity::new(
                "model::M",
                CoreClassifier::Mapping.path(),
                json!({
                    "_type": "mapping",
                    "name": "M",
                    "package": "model",
                    "classMappings": [
                        {"_type": "pureInstance", "class": "model::Person", "root": true},
                        {"_type": "pureInstance", "class": "model::Person", "root": false}
                    ]
                }),
            ),
        ];

        let err = builder().build(&entities).unwrap_err();
        assert_eq!(codes(&err), vec![ErrorCode::E302]);
    }
}
