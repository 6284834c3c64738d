//! Semantic checks run after references are bound and mappings wired.
//!
//! - Stereotypes and tagged values must name a stereotype or tag declared by
//!   their profile.
//! - Main tables of relational class mappings, and the table and join
//!   pointers of relational operations, must name a table or join of their
//!   database or of a store it includes.
//!
//! Unbound references are skipped: they were reported by the resolve phase.

use log::debug;

use meridian_core::{
    ElementBody, Graph,
    element::{Annotated, Database, JoinPointer, Profile, RelationalOperation, TablePointer},
    mapping::{Mapping, PropertyMappingKind, SetImplementationKind},
    reference::Reference,
};

use crate::error::{Diagnostic, DiagnosticCollector, ErrorCode};

/// Runs every check over the live elements of `graph`.
pub(crate) fn validate(graph: &Graph, collector: &mut DiagnosticCollector) {
    let mut checked = 0usize;
    for (_, element) in graph.elements() {
        let path = element.path().as_string();
        let body = element.body();

        for annotated in annotated_items(body) {
            check_annotations(graph, &path, annotated, collector);
            checked += 1;
        }

        for pointer in main_tables(body) {
            check_table(graph, &path, pointer, collector);
        }
        for operation in relational_operations(body) {
            for pointer in operation.table_pointers() {
                check_table(graph, &path, pointer, collector);
            }
            for pointer in operation.join_pointers() {
                check_join(graph, &path, pointer, collector);
            }
            checked += 1;
        }
    }
    debug!(checked; "Validated graph");
}

// =============================================================================
// Annotations
// =============================================================================

fn annotated_items(body: &ElementBody) -> Vec<&dyn Annotated> {
    let mut items: Vec<&dyn Annotated> = Vec::new();
    match body {
        ElementBody::Class(class) => {
            items.push(class);
            items.extend(class.properties.iter().map(|p| p as &dyn Annotated));
            items.extend(class.derived_properties.iter().map(|p| p as &dyn Annotated));
        }
        ElementBody::Association(association) => {
            items.push(association);
            items.extend(association.properties.iter().map(|p| p as &dyn Annotated));
            items.extend(association.derived_properties.iter().map(|p| p as &dyn Annotated));
        }
        ElementBody::Enumeration(enumeration) => {
            items.push(enumeration);
            items.extend(enumeration.values.iter().map(|v| v as &dyn Annotated));
        }
        ElementBody::Function(function) => items.push(function),
        ElementBody::Service(service) => items.push(service),
        _ => {}
    }
    items
}

fn profile<'g>(graph: &'g Graph, reference: &Reference<Profile>) -> Option<&'g Profile> {
    match graph.element(reference.target()?).body() {
        ElementBody::Profile(profile) => Some(profile),
        _ => None,
    }
}

fn check_annotations(
    graph: &Graph,
    path: &str,
    annotated: &dyn Annotated,
    collector: &mut DiagnosticCollector,
) {
    for stereotype in annotated.stereotypes() {
        let Some(profile) = profile(graph, &stereotype.profile) else {
            continue;
        };
        if !profile.has_stereotype(&stereotype.value) {
            let profile_path = graph.reference_path(&stereotype.profile);
            collector.emit(
                Diagnostic::error(format!(
                    "profile `{profile_path}` has no stereotype `{}`",
                    stereotype.value
                ))
                .with_code(ErrorCode::E201)
                .with_label(path, "annotated here")
                .with_secondary_label(profile_path.as_string(), "profile declared here"),
            );
        }
    }

    for tagged in annotated.tagged_values() {
        let Some(profile) = profile(graph, &tagged.tag.profile) else {
            continue;
        };
        if !profile.has_tag(&tagged.tag.value) {
            let profile_path = graph.reference_path(&tagged.tag.profile);
            collector.emit(
                Diagnostic::error(format!(
                    "profile `{profile_path}` has no tag `{}`",
                    tagged.tag.value
                ))
                .with_code(ErrorCode::E202)
                .with_label(path, "tagged here")
                .with_secondary_label(profile_path.as_string(), "profile declared here"),
            );
        }
    }
}

// =============================================================================
// Relational pointers
// =============================================================================

fn relational_operations(body: &ElementBody) -> Vec<&RelationalOperation> {
    match body {
        ElementBody::Database(database) => database.joins.iter().map(|join| &join.operation).collect(),
        ElementBody::Mapping(mapping) => mapping_operations(mapping),
        _ => Vec::new(),
    }
}

fn mapping_operations(mapping: &Mapping) -> Vec<&RelationalOperation> {
    let mut operations = Vec::new();
    for (_, set_implementation) in mapping.set_implementations() {
        if let SetImplementationKind::Relational(relational) = &set_implementation.kind {
            operations.extend(relational.primary_key.iter());
        }
        for property_mapping in set_implementation.property_mappings() {
            if let PropertyMappingKind::Relational { operation } = &property_mapping.kind {
                operations.push(operation);
            }
        }
    }
    operations
}

fn main_tables(body: &ElementBody) -> Vec<&TablePointer> {
    let ElementBody::Mapping(mapping) = body else {
        return Vec::new();
    };
    mapping
        .set_implementations()
        .filter_map(|(_, set_implementation)| match &set_implementation.kind {
            SetImplementationKind::Relational(relational) => relational.main_table.as_ref(),
            _ => None,
        })
        .collect()
}

/// Databases reachable from `database` through store includes.
fn databases<'g>(graph: &'g Graph, database: &Reference<Database>) -> Vec<&'g Database> {
    let Some(target) = database.target() else {
        return Vec::new();
    };
    graph
        .store_closure(target)
        .into_iter()
        .filter_map(|id| match graph.element(id).body() {
            ElementBody::Database(database) => Some(database),
            _ => None,
        })
        .collect()
}

fn check_table(graph: &Graph, path: &str, pointer: &TablePointer, collector: &mut DiagnosticCollector) {
    if !pointer.database.is_resolved() {
        return;
    }
    let found = databases(graph, &pointer.database)
        .iter()
        .any(|database| database.table(&pointer.schema, &pointer.table).is_some());
    if !found {
        let database = graph.reference_path(&pointer.database);
        collector.emit(
            Diagnostic::error(format!(
                "can't find table `{}.{}` in database `{database}`",
                pointer.schema, pointer.table
            ))
            .with_code(ErrorCode::E203)
            .with_label(path, "table used here")
            .with_secondary_label(database.as_string(), "database"),
        );
    }
}

fn check_join(graph: &Graph, path: &str, pointer: &JoinPointer, collector: &mut DiagnosticCollector) {
    if !pointer.database.is_resolved() {
        return;
    }
    let found = databases(graph, &pointer.database)
        .iter()
        .any(|database| database.join(&pointer.name).is_some());
    if !found {
        let database = graph.reference_path(&pointer.database);
        collector.emit(
            Diagnostic::error(format!(
                "can't find join `{}` in database `{database}`",
                pointer.name
            ))
            .with_code(ErrorCode::E204)
            .with_label(path, "join used here")
            .with_secondary_label(database.as_string(), "database"),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meridian_core::element::{Class, Join, Schema, StereotypeReference, Table};

    fn database(tables: &[&str], includes: &[&str]) -> Database {
        Database {
            includes: includes.iter().map(|path| Reference::new(*path)).collect(),
            schemas: vec![Schema {
                name: "default".to_string(),
                tables: tables
                    .iter()
                    .map(|name| Table {
                        name: name.to_string(),
                        columns: Vec::new(),
                        primary_key: Vec::new(),
                    })
                    .collect(),
            }],
            joins: Vec::new(),
        }
    }

    fn column(database: &str, table: &str) -> RelationalOperation {
        RelationalOperation::Column {
            table: TablePointer {
                database: Reference::new(database),
                schema: "default".to_string(),
                table: table.to_string(),
            },
            table_alias: table.to_string(),
            column: "id".to_string(),
        }
    }

    fn codes(collector: DiagnosticCollector) -> Vec<ErrorCode> {
        match collector.finish() {
            Ok(()) => Vec::new(),
            Err(err) => err
                .diagnostics()
                .iter()
                .filter_map(Diagnostic::code)
                .collect(),
        }
    }

    #[test]
    fn test_unknown_stereotype() {
        let mut graph = Graph::default();
        graph
            .create_element(
                "model::Doc",
                ElementBody::Profile(Profile {
                    stereotypes: vec!["important".to_string()],
                    tags: vec!["doc".to_string()],
                }),
            )
            .unwrap();
        let mut class = Class::default();
        class
            .stereotypes
            .push(StereotypeReference::new(Reference::new("model::Doc"), "important"));
        class
            .stereotypes
            .push(StereotypeReference::new(Reference::new("model::Doc"), "deprecated"));
        graph
            .create_element("model::Person", ElementBody::Class(class))
            .unwrap();
        graph.resolve_references().unwrap();

        let mut collector = DiagnosticCollector::new();
        validate(&graph, &mut collector);
        assert_eq!(codes(collector), vec![ErrorCode::E201]);
    }

    #[test]
    fn test_table_found_through_include() {
        let mut graph = Graph::default();
        graph
            .create_element("store::Base", ElementBody::Database(database(&["person"], &[])))
            .unwrap();
        let mut main = database(&["firm"], &["store::Base"]);
        main.joins.push(Join {
            name: "FirmPerson".to_string(),
            operation: RelationalOperation::DynaFunction {
                name: "equal".to_string(),
                parameters: vec![column("store::Main", "firm"), column("store::Main", "person")],
            },
        });
        graph
            .create_element("store::Main", ElementBody::Database(main))
            .unwrap();
        graph.resolve_references().unwrap();

        let mut collector = DiagnosticCollector::new();
        validate(&graph, &mut collector);
        assert!(codes(collector).is_empty());
    }

    #[test]
    fn test_unknown_table_and_join() {
        let mut graph = Graph::default();
        let mut db = database(&["person"], &[]);
        db.joins.push(Join {
            name: "Broken".to_string(),
            operation: RelationalOperation::ElementWithJoins {
                joins: vec![JoinPointer {
                    database: Reference::new("store::DB"),
                    name: "Missing".to_string(),
                    join_type: None,
                }],
                element: Some(Box::new(column("store::DB", "address"))),
            },
        });
        graph
            .create_element("store::DB", ElementBody::Database(db))
            .unwrap();
        graph.resolve_references().unwrap();

        let mut collector = DiagnosticCollector::new();
        validate(&graph, &mut collector);
        let mut found = codes(collector);
        found.sort_by_key(|code| code.as_str());
        assert_eq!(found, vec![ErrorCode::E203, ErrorCode::E204]);
    }
}
