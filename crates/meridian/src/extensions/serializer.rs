//! Serialization schemas (`_type: "serializerSchema"`).
//!
//! # Overview
//!
//! A [`Schema`] describes how instances of a root class, read from a store,
//! are written out: the format, the other classes the output may contain and
//! the names properties are written under. The store and every class are
//! graph references. When a class is deleted the [`SerializerPlugin`]
//! cleaner drops it from the included classes, together with its field
//! names, during the dead-reference sweep. A deleted root class or store is
//! left in place and surfaces as a dead reference.

use std::{any::Any, collections::HashSet};

use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use meridian_core::{
    ElementId, Graph,
    element::{Class, ExtensionElement, Store},
    hash::{HashBuilder, HashCode},
    identifier::Id,
    plugin::{DeadReferencesCleaner, ElementKindPlugin, GraphPlugin},
    reference::{Reference, Resolvable},
};

use super::wrong_body;

pub const CLASSIFIER_PATH: &str = "meta::external::serializer::Schema";
pub const PROTOCOL_TYPE: &str = "serializerSchema";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SchemaFormat {
    Json,
    Xml,
}

impl SchemaFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            SchemaFormat::Json => "JSON",
            SchemaFormat::Xml => "XML",
        }
    }
}

/// The name a property of a class is written under.
#[derive(Debug, Clone)]
pub struct FieldName {
    pub class: Reference<Class>,
    pub property: String,
    pub serialized_name: String,
}

#[derive(Debug, Clone)]
pub struct Schema {
    pub format: SchemaFormat,
    pub store: Option<Reference<dyn Store>>,
    pub root_class: Reference<Class>,
    pub included_classes: Vec<Reference<Class>>,
    pub field_names: Vec<FieldName>,
}

impl Schema {
    pub fn element_kind() -> Id {
        Id::new("SerializerSchema")
    }

    /// Returns `true` when instances of `class` may appear in the output.
    pub fn covers(&self, class: ElementId) -> bool {
        self.root_class.points_to(class)
            || self
                .included_classes
                .iter()
                .any(|included| included.points_to(class))
    }

    /// The name `property` of `class` is written under: its field name when
    /// one is declared, the property name otherwise.
    pub fn serialized_name<'a>(&'a self, class: ElementId, property: &'a str) -> &'a str {
        self.field_names
            .iter()
            .find(|field| field.class.points_to(class) && field.property == property)
            .map_or(property, |field| field.serialized_name.as_str())
    }

    /// Removes the included classes and field names bound to a dead class.
    /// Returns the number of entries removed.
    pub fn remove_dead_classes(&mut self, is_dead: &dyn Fn(ElementId) -> bool) -> usize {
        let before = self.included_classes.len() + self.field_names.len();
        self.included_classes
            .retain(|class| !class.target().is_some_and(is_dead));
        self.field_names
            .retain(|field| !field.class.target().is_some_and(is_dead));
        before - self.included_classes.len() - self.field_names.len()
    }

    /// Deleted classes this schema still refers to, root class excluded.
    fn dead_classes(&self, graph: &Graph) -> HashSet<ElementId> {
        self.included_classes
            .iter()
            .chain(self.field_names.iter().map(|field| &field.class))
            .filter_map(Reference::target)
            .filter(|class| graph.element(*class).is_deleted())
            .collect()
    }
}

impl ExtensionElement for Schema {
    fn kind(&self) -> Id {
        Schema::element_kind()
    }

    fn hash_code(&self, path: &str) -> HashCode {
        let mut builder = HashBuilder::extension("SERIALIZER_SCHEMA");
        builder
            .str(path)
            .str(self.format.as_str())
            .opt_hashable(self.store.as_ref())
            .hashable(&self.root_class)
            .list(&self.included_classes);
        for field in &self.field_names {
            builder
                .hashable(&field.class)
                .str(&field.property)
                .str(&field.serialized_name);
        }
        builder.finish()
    }

    fn references(&self) -> Vec<&dyn Resolvable> {
        let mut references: Vec<&dyn Resolvable> = Vec::new();
        if let Some(store) = &self.store {
            references.push(store);
        }
        references.push(&self.root_class);
        references.extend(self.included_classes.iter().map(|class| class as &dyn Resolvable));
        references.extend(self.field_names.iter().map(|field| &field.class as &dyn Resolvable));
        references
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

// =============================================================================
// Protocol
// =============================================================================

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct FieldNameDocument {
    class: String,
    property: String,
    serialized_name: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct SchemaDocument {
    format: SchemaFormat,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    store: Option<String>,
    root_class: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    included_classes: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    field_names: Vec<FieldNameDocument>,
}

struct SchemaKind;

impl ElementKindPlugin for SchemaKind {
    fn kind(&self) -> Id {
        Schema::element_kind()
    }

    fn classifier_path(&self) -> &str {
        CLASSIFIER_PATH
    }

    fn protocol_type(&self) -> &str {
        PROTOCOL_TYPE
    }

    fn build(&self, content: &Value) -> serde_json::Result<Box<dyn ExtensionElement>> {
        let document = SchemaDocument::deserialize(content)?;
        Ok(Box::new(Schema {
            format: document.format,
            store: document.store.as_deref().map(Reference::new),
            root_class: Reference::new(document.root_class.as_str()),
            included_classes: document
                .included_classes
                .iter()
                .map(|class| Reference::new(class.as_str()))
                .collect(),
            field_names: document
                .field_names
                .into_iter()
                .map(|field| FieldName {
                    class: Reference::new(field.class.as_str()),
                    property: field.property,
                    serialized_name: field.serialized_name,
                })
                .collect(),
        }))
    }

    fn serialize(&self, element: &dyn ExtensionElement, graph: &Graph) -> serde_json::Result<Value> {
        let schema = element
            .as_any()
            .downcast_ref::<Schema>()
            .ok_or_else(|| wrong_body("Schema"))?;
        serde_json::to_value(SchemaDocument {
            format: schema.format,
            store: schema
                .store
                .as_ref()
                .map(|store| graph.reference_path(store).as_string()),
            root_class: graph.reference_path(&schema.root_class).as_string(),
            included_classes: schema
                .included_classes
                .iter()
                .map(|class| graph.reference_path(class).as_string())
                .collect(),
            field_names: schema
                .field_names
                .iter()
                .map(|field| FieldNameDocument {
                    class: graph.reference_path(&field.class).as_string(),
                    property: field.property.clone(),
                    serialized_name: field.serialized_name.clone(),
                })
                .collect(),
        })
    }
}

/// Drops deleted classes from every schema.
fn remove_dead_schema_classes(graph: &mut Graph) {
    let stale: Vec<(ElementId, HashSet<ElementId>)> = graph
        .elements()
        .filter_map(|(id, element)| {
            let dead = element.extension::<Schema>()?.dead_classes(graph);
            (!dead.is_empty()).then_some((id, dead))
        })
        .collect();

    for (id, dead) in stale {
        let Some(schema) = graph.element_mut(id).extension_mut::<Schema>() else {
            continue;
        };
        let removed = schema.remove_dead_classes(&|class| dead.contains(&class));
        debug!(schema:% = graph.element(id).path(), removed; "Removed dead schema classes");
    }
}

/// Preset contributing the [`Schema`] element kind and its cleaner.
#[derive(Debug, Default)]
pub struct SerializerPlugin;

impl GraphPlugin for SerializerPlugin {
    fn name(&self) -> &str {
        "serializer"
    }

    fn supported_element_kinds(&self) -> Vec<Box<dyn ElementKindPlugin>> {
        vec![Box::new(SchemaKind)]
    }

    fn dead_reference_cleaners(&self) -> Vec<DeadReferencesCleaner> {
        vec![Box::new(remove_dead_schema_classes)]
    }
}
