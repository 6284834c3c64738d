//! Plugin registry for extension element kinds, dead-reference cleaners and
//! mapping extensions.
//!
//! # Overview
//!
//! The core model is closed over its built-in element kinds. Everything else
//! is contributed by a [`GraphPlugin`], which the [`PluginRegistry`] pulls
//! apart into three extension points:
//!
//! - [`ElementKindPlugin`]: builds and serializes the body of an extension
//!   element kind, keyed by classifier path and protocol `_type`.
//! - [`DeadReferencesCleaner`]: a procedure run by
//!   [`Graph::dead_reference_sweep`](crate::Graph::dead_reference_sweep).
//! - [`MappingExtension`]: builds and serializes plugin-specific class
//!   mappings that take part in mapping resolution.
//!
//! Registrations are keyed; a second registration under an existing key, or
//! one claiming a key of the core element kinds, fails with
//! [`GraphError::DuplicateExtension`]. Installing a plugin is all or nothing.

use std::fmt;

use indexmap::IndexMap;
use log::debug;
use serde_json::Value;

use crate::{
    element::ExtensionElement,
    error::{GraphError, Result},
    graph::Graph,
    identifier::Id,
    mapping::SetImplementationExtension,
};

/// Classifier paths of the core element kinds.
pub const CORE_CLASSIFIER_PATHS: [&str; 10] = [
    "meta::pure::metamodel::extension::Profile",
    "meta::pure::metamodel::type::Enumeration",
    "meta::pure::metamodel::type::Class",
    "meta::pure::metamodel::relationship::Association",
    "meta::pure::metamodel::function::ConcreteFunctionDefinition",
    "meta::relational::metamodel::Database",
    "meta::pure::mapping::Mapping",
    "meta::pure::runtime::PackageableConnection",
    "meta::pure::runtime::PackageableRuntime",
    "meta::legend::service::metamodel::Service",
];

/// Content `_type`s of the core element kinds.
pub const CORE_PROTOCOL_TYPES: [&str; 10] = [
    "profile",
    "Enumeration",
    "class",
    "association",
    "function",
    "relational",
    "mapping",
    "connection",
    "runtime",
    "service",
];

/// `_type`s of the class mappings the mapping engine handles itself.
pub const CORE_CLASS_MAPPING_TYPES: [&str; 4] =
    ["pureInstance", "relational", "aggregationAware", "operation"];

/// A cleanup procedure invoked by the dead-reference sweep.
pub type DeadReferencesCleaner = Box<dyn Fn(&mut Graph)>;

/// Builder and serializer of one extension element kind.
pub trait ElementKindPlugin {
    /// Kind tag of the elements this plugin builds.
    fn kind(&self) -> Id;

    /// Classifier path of the entities carrying this kind.
    fn classifier_path(&self) -> &str;

    /// Protocol `_type` of the entity content.
    fn protocol_type(&self) -> &str;

    /// Builds the element body from the entity content.
    ///
    /// `_type`, `name` and `package` are removed by the builder, which has
    /// already validated them. Members the kind doesn't know should be
    /// rejected rather than dropped.
    ///
    /// # Errors
    ///
    /// Returns the deserialization error when the content is malformed.
    fn build(&self, content: &Value) -> serde_json::Result<Box<dyn ExtensionElement>>;

    /// Serializes the element body into protocol content.
    ///
    /// The caller adds `_type`, `name` and `package`. References should be
    /// written with the current path of their bound element, see
    /// [`Graph::reference_path`].
    ///
    /// # Errors
    ///
    /// Returns the serialization error when the body can't be represented.
    fn serialize(&self, element: &dyn ExtensionElement, graph: &Graph) -> serde_json::Result<Value>;
}

/// Builder and serializer of a plugin-specific class mapping.
pub trait MappingExtension {
    /// Protocol `_type` of the class mappings this extension handles.
    fn protocol_type(&self) -> &str;

    /// Builds the extension part of a class mapping.
    ///
    /// The common fields (`_type`, `id`, `class`, `root`) are handled and
    /// removed by the caller.
    ///
    /// # Errors
    ///
    /// Returns the deserialization error when the class mapping is malformed.
    fn build(&self, class_mapping: &Value) -> serde_json::Result<Box<dyn SetImplementationExtension>>;

    fn serialize(
        &self,
        set_implementation: &dyn SetImplementationExtension,
        graph: &Graph,
    ) -> serde_json::Result<Value>;
}

/// A bundle of extensions installed together.
pub trait GraphPlugin {
    /// Unique plugin name.
    fn name(&self) -> &str;

    fn supported_element_kinds(&self) -> Vec<Box<dyn ElementKindPlugin>> {
        Vec::new()
    }

    fn dead_reference_cleaners(&self) -> Vec<DeadReferencesCleaner> {
        Vec::new()
    }

    fn mapping_extensions(&self) -> Vec<Box<dyn MappingExtension>> {
        Vec::new()
    }
}

/// Registered extensions, shared by every graph built with them.
#[derive(Default)]
pub struct PluginRegistry {
    plugins: Vec<String>,
    element_kinds: IndexMap<Id, Box<dyn ElementKindPlugin>>,
    cleaners: Vec<DeadReferencesCleaner>,
    mapping_extensions: IndexMap<String, Box<dyn MappingExtension>>,
}

impl PluginRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs every extension contributed by `plugin`.
    ///
    /// Nothing is installed unless every contribution can be.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::DuplicateExtension`] when the plugin, or any of
    /// its element kinds or mapping extensions, is already registered or
    /// claims a key of the core element kinds.
    pub fn install(&mut self, plugin: &dyn GraphPlugin) -> Result<()> {
        let name = plugin.name().to_string();
        if self.plugins.contains(&name) {
            return Err(GraphError::DuplicateExtension { name });
        }

        let mut staged = PluginRegistry::new();
        for element_kind in plugin.supported_element_kinds() {
            self.check_element_kind(element_kind.as_ref())?;
            staged.register_element_kind(element_kind)?;
        }
        for extension in plugin.mapping_extensions() {
            self.check_mapping_extension(extension.as_ref())?;
            staged.register_mapping_extension(extension)?;
        }

        self.element_kinds.extend(staged.element_kinds);
        self.mapping_extensions.extend(staged.mapping_extensions);
        self.cleaners.extend(plugin.dead_reference_cleaners());

        debug!(plugin = name.as_str(); "Installed plugin");
        self.plugins.push(name);
        Ok(())
    }

    /// Registers an extension element kind.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::DuplicateExtension`] when the kind tag, the
    /// classifier path or the protocol type is already taken, by another
    /// extension or by a core element kind.
    pub fn register_element_kind(&mut self, plugin: Box<dyn ElementKindPlugin>) -> Result<()> {
        self.check_element_kind(plugin.as_ref())?;

        let kind = plugin.kind();
        debug!(kind:% = kind; "Registered element kind");
        self.element_kinds.insert(kind, plugin);
        Ok(())
    }

    fn check_element_kind(&self, plugin: &dyn ElementKindPlugin) -> Result<()> {
        let kind = plugin.kind();
        if self.element_kinds.contains_key(&kind) {
            return Err(GraphError::DuplicateExtension {
                name: kind.as_string(),
            });
        }

        let classifier_path = plugin.classifier_path();
        if CORE_CLASSIFIER_PATHS.contains(&classifier_path)
            || self.element_kind_by_classifier(classifier_path).is_some()
        {
            return Err(GraphError::DuplicateExtension {
                name: classifier_path.to_string(),
            });
        }

        let protocol_type = plugin.protocol_type();
        if CORE_PROTOCOL_TYPES.contains(&protocol_type)
            || self.element_kind_by_protocol_type(protocol_type).is_some()
        {
            return Err(GraphError::DuplicateExtension {
                name: protocol_type.to_string(),
            });
        }
        Ok(())
    }

    /// Registers a procedure run after the core dead-reference sweep.
    pub fn register_cleanup_procedure(&mut self, cleaner: DeadReferencesCleaner) {
        self.cleaners.push(cleaner);
    }

    /// Registers a class mapping extension.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::DuplicateExtension`] when the protocol type is
    /// already taken or names a core class mapping type.
    pub fn register_mapping_extension(&mut self, extension: Box<dyn MappingExtension>) -> Result<()> {
        self.check_mapping_extension(extension.as_ref())?;

        let protocol_type = extension.protocol_type().to_string();
        debug!(protocol_type = protocol_type.as_str(); "Registered mapping extension");
        self.mapping_extensions.insert(protocol_type, extension);
        Ok(())
    }

    fn check_mapping_extension(&self, extension: &dyn MappingExtension) -> Result<()> {
        let protocol_type = extension.protocol_type();
        if CORE_CLASS_MAPPING_TYPES.contains(&protocol_type)
            || self.mapping_extensions.contains_key(protocol_type)
        {
            return Err(GraphError::DuplicateExtension {
                name: protocol_type.to_string(),
            });
        }
        Ok(())
    }

    /// Names of the installed plugins, in installation order.
    pub fn plugins(&self) -> &[String] {
        &self.plugins
    }

    pub fn element_kind(&self, kind: Id) -> Option<&dyn ElementKindPlugin> {
        self.element_kinds.get(&kind).map(Box::as_ref)
    }

    pub fn element_kind_by_classifier(&self, classifier_path: &str) -> Option<&dyn ElementKindPlugin> {
        self.element_kinds
            .values()
            .find(|plugin| plugin.classifier_path() == classifier_path)
            .map(Box::as_ref)
    }

    pub fn element_kind_by_protocol_type(&self, protocol_type: &str) -> Option<&dyn ElementKindPlugin> {
        self.element_kinds
            .values()
            .find(|plugin| plugin.protocol_type() == protocol_type)
            .map(Box::as_ref)
    }

    /// Registered element kinds, in registration order.
    pub fn element_kinds(&self) -> impl Iterator<Item = &dyn ElementKindPlugin> {
        self.element_kinds.values().map(Box::as_ref)
    }

    pub fn mapping_extension(&self, protocol_type: &str) -> Option<&dyn MappingExtension> {
        self.mapping_extensions.get(protocol_type).map(Box::as_ref)
    }

    pub fn cleaners(&self) -> &[DeadReferencesCleaner] {
        &self.cleaners
    }
}

impl fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PluginRegistry")
            .field("plugins", &self.plugins)
            .field(
                "element_kinds",
                &self.element_kinds.keys().map(Id::as_string).collect::<Vec<_>>(),
            )
            .field("cleaners", &self.cleaners.len())
            .field(
                "mapping_extensions",
                &self.mapping_extensions.keys().collect::<Vec<_>>(),
            )
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::{any::Any, cell::Cell, rc::Rc};

    use super::*;
    use crate::hash::{HashBuilder, HashCode};

    #[derive(Debug)]
    struct Note;

    impl ExtensionElement for Note {
        fn kind(&self) -> Id {
            Id::new("Note")
        }

        fn hash_code(&self, path: &str) -> HashCode {
            let mut builder = HashBuilder::extension("NOTE");
            builder.str(path);
            builder.finish()
        }

        fn as_any(&self) -> &dyn Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    struct NoteKind;

    impl ElementKindPlugin for NoteKind {
        fn kind(&self) -> Id {
            Id::new("Note")
        }

        fn classifier_path(&self) -> &str {
            "meta::pure::metamodel::note::Note"
        }

        fn protocol_type(&self) -> &str {
            "note"
        }

        fn build(&self, _content: &Value) -> serde_json::Result<Box<dyn ExtensionElement>> {
            Ok(Box::new(Note))
        }

        fn serialize(&self, _element: &dyn ExtensionElement, _graph: &Graph) -> serde_json::Result<Value> {
            Ok(Value::Object(serde_json::Map::new()))
        }
    }

    struct NotePlugin {
        swept: Rc<Cell<u32>>,
    }

    impl GraphPlugin for NotePlugin {
        fn name(&self) -> &str {
            "notes"
        }

        fn supported_element_kinds(&self) -> Vec<Box<dyn ElementKindPlugin>> {
            vec![Box::new(NoteKind)]
        }

        fn dead_reference_cleaners(&self) -> Vec<DeadReferencesCleaner> {
            let swept = Rc::clone(&self.swept);
            vec![Box::new(move |_graph: &mut Graph| swept.set(swept.get() + 1))]
        }
    }

    #[test]
    fn test_install_registers_everything() {
        let plugin = NotePlugin {
            swept: Rc::new(Cell::new(0)),
        };
        let mut registry = PluginRegistry::new();
        registry.install(&plugin).unwrap();

        assert_eq!(registry.plugins(), &["notes".to_string()]);
        assert!(registry.element_kind(Id::new("Note")).is_some());
        assert!(
            registry
                .element_kind_by_classifier("meta::pure::metamodel::note::Note")
                .is_some()
        );
        assert!(registry.element_kind_by_protocol_type("note").is_some());
        assert_eq!(registry.cleaners().len(), 1);
    }

    #[test]
    fn test_install_twice_fails() {
        let plugin = NotePlugin {
            swept: Rc::new(Cell::new(0)),
        };
        let mut registry = PluginRegistry::new();
        registry.install(&plugin).unwrap();

        assert_eq!(
            registry.install(&plugin),
            Err(GraphError::DuplicateExtension {
                name: "notes".to_string()
            })
        );
    }

    #[test]
    fn test_duplicate_element_kind_fails() {
        let mut registry = PluginRegistry::new();
        registry.register_element_kind(Box::new(NoteKind)).unwrap();

        assert!(matches!(
            registry.register_element_kind(Box::new(NoteKind)),
            Err(GraphError::DuplicateExtension { .. })
        ));
    }

    struct ClaimingKind {
        classifier_path: &'static str,
        protocol_type: &'static str,
    }

    impl ElementKindPlugin for ClaimingKind {
        fn kind(&self) -> Id {
            Id::new("Claiming")
        }

        fn classifier_path(&self) -> &str {
            self.classifier_path
        }

        fn protocol_type(&self) -> &str {
            self.protocol_type
        }

        fn build(&self, _content: &Value) -> serde_json::Result<Box<dyn ExtensionElement>> {
            Ok(Box::new(Note))
        }

        fn serialize(&self, _element: &dyn ExtensionElement, _graph: &Graph) -> serde_json::Result<Value> {
            Ok(Value::Null)
        }
    }

    struct NamedMapping(&'static str);

    impl MappingExtension for NamedMapping {
        fn protocol_type(&self) -> &str {
            self.0
        }

        fn build(&self, _class_mapping: &Value) -> serde_json::Result<Box<dyn SetImplementationExtension>> {
            unimplemented!("never built")
        }

        fn serialize(
            &self,
            _set_implementation: &dyn SetImplementationExtension,
            _graph: &Graph,
        ) -> serde_json::Result<Value> {
            unimplemented!("never serialized")
        }
    }

    struct MappingPlugin {
        mappings: Vec<&'static str>,
    }

    impl GraphPlugin for MappingPlugin {
        fn name(&self) -> &str {
            "mappings"
        }

        fn supported_element_kinds(&self) -> Vec<Box<dyn ElementKindPlugin>> {
            vec![Box::new(NoteKind)]
        }

        fn dead_reference_cleaners(&self) -> Vec<DeadReferencesCleaner> {
            vec![Box::new(|_graph: &mut Graph| {})]
        }

        fn mapping_extensions(&self) -> Vec<Box<dyn MappingExtension>> {
            self.mappings
                .iter()
                .map(|name| Box::new(NamedMapping(*name)) as Box<dyn MappingExtension>)
                .collect()
        }
    }

    #[test]
    fn test_failed_install_leaves_registry_unchanged() {
        let mut registry = PluginRegistry::new();
        registry
            .register_mapping_extension(Box::new(NamedMapping("taken")))
            .unwrap();

        let conflicting = MappingPlugin {
            mappings: vec!["fresh", "taken"],
        };
        assert_eq!(
            registry.install(&conflicting),
            Err(GraphError::DuplicateExtension {
                name: "taken".to_string()
            })
        );

        assert!(registry.plugins().is_empty());
        assert!(registry.element_kind(Id::new("Note")).is_none());
        assert!(registry.mapping_extension("fresh").is_none());
        assert!(registry.cleaners().is_empty());

        let fixed = MappingPlugin {
            mappings: vec!["fresh"],
        };
        registry.install(&fixed).unwrap();
        assert!(registry.mapping_extension("fresh").is_some());
        assert_eq!(registry.cleaners().len(), 1);
    }

    #[test]
    fn test_plugin_with_duplicate_contributions_is_rejected() {
        let mut registry = PluginRegistry::new();
        let plugin = MappingPlugin {
            mappings: vec!["fresh", "fresh"],
        };

        assert!(registry.install(&plugin).is_err());
        assert!(registry.mapping_extension("fresh").is_none());
    }

    #[test]
    fn test_core_keys_cannot_be_claimed() {
        let mut registry = PluginRegistry::new();

        assert_eq!(
            registry.register_element_kind(Box::new(ClaimingKind {
                classifier_path: "meta::pure::metamodel::type::Class",
                protocol_type: "classish",
            })),
            Err(GraphError::DuplicateExtension {
                name: "meta::pure::metamodel::type::Class".to_string()
            })
        );
        assert_eq!(
            registry.register_element_kind(Box::new(ClaimingKind {
                classifier_path: "meta::pure::metamodel::claiming::Claiming",
                protocol_type: "mapping",
            })),
            Err(GraphError::DuplicateExtension {
                name: "mapping".to_string()
            })
        );
        assert_eq!(
            registry.register_mapping_extension(Box::new(NamedMapping("relational"))),
            Err(GraphError::DuplicateExtension {
                name: "relational".to_string()
            })
        );
        assert_eq!(registry.element_kinds().count(), 0);
    }

    #[test]
    fn test_cleaners_run_during_sweep() {
        let swept = Rc::new(Cell::new(0));
        let plugin = NotePlugin {
            swept: Rc::clone(&swept),
        };
        let mut registry = PluginRegistry::new();
        registry.install(&plugin).unwrap();

        let mut graph = Graph::new(Rc::new(registry));
        graph.dead_reference_sweep();

        assert_eq!(swept.get(), 1);
    }
}
