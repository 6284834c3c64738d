//! Class diagrams (`_type: "diagram"`).
//!
//! # Overview
//!
//! A [`Diagram`] lays out views of classes and the generalization lines
//! between them. Class views reference their class; when a class is deleted
//! the [`DiagramPlugin`] cleaner drops its views, and every generalization
//! view touching them, during the dead-reference sweep.

use std::any::Any;

use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use meridian_core::{
    ElementId, Graph,
    element::{Class, ExtensionElement},
    hash::{HashBuilder, HashCode},
    identifier::Id,
    plugin::{DeadReferencesCleaner, ElementKindPlugin, GraphPlugin},
    reference::{Reference, Resolvable},
};

use super::wrong_body;

pub const CLASSIFIER_PATH: &str = "meta::pure::metamodel::diagram::Diagram";
pub const PROTOCOL_TYPE: &str = "diagram";

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Rectangle {
    pub width: f64,
    pub height: f64,
}

/// A box showing one class.
#[derive(Debug, Clone)]
pub struct ClassView {
    pub id: String,
    pub class: Reference<Class>,
    pub position: Point,
    pub rectangle: Rectangle,
}

/// A line between two class views, by view id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct GeneralizationView {
    pub source_view: String,
    pub target_view: String,
}

impl GeneralizationView {
    fn touches(&self, view: &str) -> bool {
        self.source_view == view || self.target_view == view
    }
}

#[derive(Debug, Clone, Default)]
pub struct Diagram {
    pub class_views: Vec<ClassView>,
    pub generalization_views: Vec<GeneralizationView>,
}

impl Diagram {
    pub fn element_kind() -> Id {
        Id::new("Diagram")
    }

    pub fn class_view(&self, id: &str) -> Option<&ClassView> {
        self.class_views.iter().find(|view| view.id == id)
    }

    /// Removes the class views named by `ids` and every generalization view
    /// attached to them. Returns the number of views removed.
    pub fn remove_class_views(&mut self, ids: &[String]) -> usize {
        let before = self.class_views.len() + self.generalization_views.len();
        self.class_views.retain(|view| !ids.contains(&view.id));
        self.generalization_views
            .retain(|line| !ids.iter().any(|id| line.touches(id)));
        before - self.class_views.len() - self.generalization_views.len()
    }

    /// Ids of the class views whose class has been deleted from `graph`.
    fn dead_class_views(&self, graph: &Graph) -> Vec<String> {
        self.class_views
            .iter()
            .filter(|view| {
                view.class
                    .target()
                    .is_some_and(|class| graph.element(class).is_deleted())
            })
            .map(|view| view.id.clone())
            .collect()
    }
}

impl ExtensionElement for Diagram {
    fn kind(&self) -> Id {
        Diagram::element_kind()
    }

    fn hash_code(&self, path: &str) -> HashCode {
        let mut builder = HashBuilder::extension("DIAGRAM");
        builder.str(path);
        for view in &self.class_views {
            builder
                .str(&view.id)
                .hashable(&view.class)
                .u64(view.position.x.to_bits())
                .u64(view.position.y.to_bits())
                .u64(view.rectangle.width.to_bits())
                .u64(view.rectangle.height.to_bits());
        }
        for line in &self.generalization_views {
            builder.str(&line.source_view).str(&line.target_view);
        }
        builder.finish()
    }

    fn references(&self) -> Vec<&dyn Resolvable> {
        self.class_views
            .iter()
            .map(|view| &view.class as &dyn Resolvable)
            .collect()
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
struct ClassViewDocument {
    id: String,
    class: String,
    position: Point,
    rectangle: Rectangle,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct DiagramDocument {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    class_views: Vec<ClassViewDocument>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    generalization_views: Vec<GeneralizationView>,
}

struct DiagramKind;

impl ElementKindPlugin for DiagramKind {
    fn kind(&self) -> Id {
        Diagram::element_kind()
    }

    fn classifier_path(&self) -> &str {
        CLASSIFIER_PATH
    }

    fn protocol_type(&self) -> &str {
        PROTOCOL_TYPE
    }

    fn build(&self, content: &Value) -> serde_json::Result<Box<dyn ExtensionElement>> {
        let document = DiagramDocument::deserialize(content)?;
        Ok(Box::new(Diagram {
            class_views: document
                .class_views
                .into_iter()
                .map(|view| ClassView {
                    id: view.id,
                    class: Reference::new(view.class.as_str()),
                    position: view.position,
                    rectangle: view.rectangle,
                })
                .collect(),
            generalization_views: document.generalization_views,
        }))
    }

    fn serialize(&self, element: &dyn ExtensionElement, graph: &Graph) -> serde_json::Result<Value> {
        let diagram = element
            .as_any()
            .downcast_ref::<Diagram>()
            .ok_or_else(|| wrong_body("Diagram"))?;
        serde_json::to_value(DiagramDocument {
            class_views: diagram
                .class_views
                .iter()
                .map(|view| ClassViewDocument {
                    id: view.id.clone(),
                    class: graph.reference_path(&view.class).as_string(),
                    position: view.position,
                    rectangle: view.rectangle,
                })
                .collect(),
            generalization_views: diagram.generalization_views.clone(),
        })
    }
}

/// Drops the views of deleted classes from every diagram.
fn remove_dead_class_views(graph: &mut Graph) {
    let stale: Vec<(ElementId, Vec<String>)> = graph
        .elements()
        .filter_map(|(id, element)| {
            let dead = element.extension::<Diagram>()?.dead_class_views(graph);
            (!dead.is_empty()).then_some((id, dead))
        })
        .collect();

    for (id, dead) in stale {
        let Some(diagram) = graph.element_mut(id).extension_mut::<Diagram>() else {
            continue;
        };
        let removed = diagram.remove_class_views(&dead);
        debug!(diagram:% = graph.element(id).path(), removed; "Removed dead class views");
    }
}

/// Preset contributing the [`Diagram`] element kind and its cleaner.
#[derive(Debug, Default)]
pub struct DiagramPlugin;

impl GraphPlugin for DiagramPlugin {
    fn name(&self) -> &str {
        "diagram"
    }

    fn supported_element_kinds(&self) -> Vec<Box<dyn ElementKindPlugin>> {
        vec![Box::new(DiagramKind)]
    }

    fn dead_reference_cleaners(&self) -> Vec<DeadReferencesCleaner> {
        vec![Box::new(remove_dead_class_views)]
    }
}
