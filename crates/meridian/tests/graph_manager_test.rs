//! Integration tests for the GraphManager API with the built-in extension
//! presets installed.

use meridian::{
    Entity, ErrorCode, GraphManager, MeridianError,
    config::{AppConfig, BuildConfig, ExtensionName, ExtensionsConfig},
    extensions::{
        diagram::Diagram,
        serializer::{Schema, SchemaFormat},
        service_store::{HttpMethod, ServiceStore, ServiceStoreError, ServiceStoreSetImplementation},
        text::Text,
    },
    mapping::SetImplementationKind,
    parse_entities,
};

const EXTENSIONS: &str = include_str!("fixtures/extensions.json");

fn entities() -> Vec<Entity> {
    parse_entities(EXTENSIONS).expect("Failed to parse fixture")
}

fn manager() -> GraphManager {
    GraphManager::new(AppConfig::default()).expect("Failed to create manager")
}

fn build_codes(manager: &GraphManager, json: &str) -> Vec<ErrorCode> {
    match manager.build_graph_from_json(json) {
        Err(MeridianError::Build { err, .. }) => {
            err.diagnostics().iter().filter_map(|d| d.code()).collect()
        }
        other => panic!("Expected a build error, got {other:?}"),
    }
}

#[test]
fn test_extension_fixture_round_trips() {
    let mismatches = manager()
        .check_roundtrip(&entities())
        .expect("Failed to check round trip");

    assert!(mismatches.is_empty(), "Round trip mismatches: {mismatches:#?}");
}

#[test]
fn test_extension_elements_are_built() {
    let graph = manager()
        .build_graph_from_json(EXTENSIONS)
        .expect("Failed to build graph");

    let readme = graph
        .get_element("docs::README")
        .and_then(|element| element.extension::<Text>())
        .expect("README should be a text element");
    assert_eq!(readme.text_type, "markdown");
    assert!(readme.content.starts_with("# People"));

    let diagram = graph
        .get_element("model::PeopleDiagram")
        .and_then(|element| element.extension::<Diagram>())
        .expect("PeopleDiagram should be a diagram");
    assert_eq!(diagram.class_views.len(), 3);
    let firm_view = diagram.class_view("firm").expect("firm view");
    assert_eq!(firm_view.class.target(), graph.lookup("model::Firm"));
    assert_eq!(firm_view.position.x, 200.5);
}

#[test]
fn test_service_store_takes_part_in_store_closure() {
    let graph = manager()
        .build_graph_from_json(EXTENSIONS)
        .expect("Failed to build graph");
    let people = graph.lookup("store::PeopleStore").expect("PeopleStore");
    let base = graph.lookup("store::BaseStore").expect("BaseStore");

    assert_eq!(graph.store_closure(people), vec![people, base]);
}

#[test]
fn test_service_pointers_resolve() {
    let graph = manager()
        .build_graph_from_json(EXTENSIONS)
        .expect("Failed to build graph");
    let mapping = graph.lookup("model::ServiceMapping").expect("ServiceMapping");

    let handle = graph
        .class_mapping_by_id(mapping, "firm")
        .expect("firm class mapping");
    let set_implementation = graph.set_implementation(handle).expect("set implementation");
    let SetImplementationKind::Extension(extension) = &set_implementation.kind else {
        panic!("Expected an extension class mapping");
    };
    let services = &extension
        .as_any()
        .downcast_ref::<ServiceStoreSetImplementation>()
        .expect("service store class mapping")
        .services;

    let service = services[0].resolve(&graph).expect("Failed to resolve service");
    assert_eq!(service.method, HttpMethod::Post);
    assert!(service.parameter("id").unwrap().required);

    let store = graph
        .get_element("store::PeopleStore")
        .and_then(|element| element.extension::<ServiceStore>())
        .expect("PeopleStore should be a service store");
    assert_eq!(
        store.service_by_path("firms.people"),
        Err(ServiceStoreError::ServiceNotFound {
            id: "people".to_string()
        })
    );
}

#[test]
fn test_sweep_removes_views_of_deleted_classes() {
    let mut graph = manager()
        .build_graph_from_json(EXTENSIONS)
        .expect("Failed to build graph");
    let firm = graph.lookup("model::Firm").expect("Firm");

    graph.delete_element(firm).expect("Failed to delete Firm");
    graph.dead_reference_sweep();

    let diagram = graph
        .get_element("model::PeopleDiagram")
        .and_then(|element| element.extension::<Diagram>())
        .expect("PeopleDiagram should be a diagram");
    let views: Vec<&str> = diagram.class_views.iter().map(|view| view.id.as_str()).collect();
    assert_eq!(views, vec!["person", "entity"]);
    assert!(diagram.generalization_views.is_empty());
}

#[test]
fn test_schema_references_resolve_through_the_graph() {
    let graph = manager()
        .build_graph_from_json(EXTENSIONS)
        .expect("Failed to build graph");
    let person = graph.lookup("model::Person").expect("Person");
    let firm = graph.lookup("model::Firm").expect("Firm");

    let schema = graph
        .get_element("schema::PersonSchema")
        .and_then(|element| element.extension::<Schema>())
        .expect("PersonSchema should be a serializer schema");
    assert_eq!(schema.format, SchemaFormat::Json);
    assert_eq!(
        schema.store.as_ref().and_then(|store| store.target()),
        graph.lookup("store::PeopleStore")
    );
    assert!(schema.root_class.points_to(person));
    assert!(schema.covers(firm));
    assert_eq!(schema.serialized_name(person, "name"), "fullName");
    assert_eq!(schema.serialized_name(firm, "legalName"), "firmName");
}

#[test]
fn test_sweep_removes_deleted_classes_from_schemas() {
    let mut graph = manager()
        .build_graph_from_json(EXTENSIONS)
        .expect("Failed to build graph");
    let firm = graph.lookup("model::Firm").expect("Firm");
    let entity = graph.lookup("model::LegalEntity").expect("LegalEntity");

    graph.delete_element(firm).expect("Failed to delete Firm");
    graph.dead_reference_sweep();

    let schema = graph
        .get_element("schema::PersonSchema")
        .and_then(|element| element.extension::<Schema>())
        .expect("PersonSchema should be a serializer schema");
    assert_eq!(schema.included_classes.len(), 1);
    assert!(schema.included_classes[0].points_to(entity));
    assert_eq!(schema.field_names.len(), 1);
    assert_eq!(schema.field_names[0].serialized_name, "fullName");
}

#[test]
fn test_freeze_follows_config() {
    let config = AppConfig::new(BuildConfig::new(true), ExtensionsConfig::default());
    let frozen_manager = GraphManager::new(config).expect("Failed to create manager");

    let mut graph = frozen_manager
        .build_graph_from_json(EXTENSIONS)
        .expect("Failed to build graph");
    let firm = graph.lookup("model::Firm").expect("Firm");

    assert!(graph.is_frozen());
    assert!(graph.delete_element(firm).is_err());
    assert!(!manager().build_graph_from_json(EXTENSIONS).unwrap().is_frozen());
}

#[test]
fn test_disabled_presets_leave_classifiers_unknown() {
    let config = AppConfig::new(
        BuildConfig::default(),
        ExtensionsConfig::new(vec![ExtensionName::Text]),
    );
    let manager = GraphManager::new(config).expect("Failed to create manager");

    let codes = build_codes(&manager, EXTENSIONS);

    // The diagram, both service stores and the schema.
    assert_eq!(codes, vec![ErrorCode::E005; 4]);
}

#[test]
fn test_malformed_json_is_a_build_error() {
    let manager = manager();

    assert_eq!(build_codes(&manager, "{\"entities\": ["), vec![ErrorCode::E001]);

    let err = manager.build_graph_from_json("[1]").unwrap_err();
    let MeridianError::Build { src, .. } = err else {
        panic!("Expected a build error");
    };
    assert_eq!(src, "[1]");
}

#[test]
fn test_diff_reports_changed_text() {
    let before = entities();
    let mut after = before.clone();
    let readme = after
        .iter_mut()
        .find(|entity| entity.path == "docs::README")
        .expect("README entity");
    readme.content["content"] = "# People\n\nRewritten.".into();

    let diff = manager().diff(&before, &after).expect("Failed to diff");

    assert!(diff.added.is_empty());
    assert!(diff.removed.is_empty());
    assert_eq!(diff.modified, vec!["docs::README".to_string()]);
}

#[test]
fn test_hash_index_covers_extension_elements() {
    let manager = manager();
    let graph = manager
        .build_graph_from_json(EXTENSIONS)
        .expect("Failed to build graph");

    let index = manager.hash_index(&graph).expect("Failed to hash graph");

    for path in [
        "docs::README",
        "model::PeopleDiagram",
        "store::PeopleStore",
        "model::ServiceMapping",
        "schema::PersonSchema",
    ] {
        assert!(index.contains_key(path), "missing hash for `{path}`");
    }
}

#[test]
fn test_unknown_extension_members_are_malformed() {
    let mut entities = entities();
    for entity in &mut entities {
        match entity.path.as_str() {
            "docs::README" => entity.content["author"] = "ops".into(),
            "model::ServiceMapping" => entity.content["classMappings"][0]["cache"] = true.into(),
            _ => {}
        }
    }

    let codes: Vec<ErrorCode> = match manager().build_graph(&entities) {
        Err(MeridianError::Build { err, .. }) => {
            err.diagnostics().iter().filter_map(|d| d.code()).collect()
        }
        other => panic!("Expected a build error, got {other:?}"),
    };

    assert_eq!(codes, vec![ErrorCode::E006, ErrorCode::E006]);
}
