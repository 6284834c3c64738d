use std::rc::Rc;

use serde_json::{Value, json};

use meridian_core::{
    ElementBody, Graph, GraphDiff, GraphError,
    element::{Class, Database},
    mapping::{Mapping, SetImplementationHandle, SetImplementationKind, SourceValue},
    plugin::PluginRegistry,
};
use meridian_protocol::{
    Entity, GraphBuilder, canonical_entities, error::ErrorCode, parse_entities, serialize_graph,
};

const MODEL: &str = include_str!("fixtures/model.json");

fn entities() -> Vec<Entity> {
    parse_entities(MODEL).expect("Failed to parse fixture")
}

fn builder() -> GraphBuilder {
    GraphBuilder::new(Rc::new(PluginRegistry::new()))
}

fn build(entities: &[Entity]) -> Graph {
    builder().build(entities).expect("Failed to build graph")
}

fn codes(entities: &[Entity]) -> Vec<ErrorCode> {
    let err = builder()
        .build(entities)
        .expect_err("Expected the build to fail");
    err.diagnostics().iter().filter_map(|d| d.code()).collect()
}

fn content_mut<'a>(entities: &'a mut [Entity], path: &str) -> &'a mut Value {
    &mut entities
        .iter_mut()
        .find(|entity| entity.path == path)
        .unwrap_or_else(|| panic!("no entity `{path}` in fixture"))
        .content
}

fn ids(graph: &Graph, handles: &[SetImplementationHandle]) -> Vec<String> {
    handles
        .iter()
        .map(|handle| graph.set_implementation(*handle).unwrap().id.value().to_string())
        .collect()
}

#[test]
fn test_fixture_round_trips() {
    let entities = entities();
    let graph = build(&entities);

    let written = serialize_graph(&graph).expect("Failed to serialize graph");

    assert_eq!(written.len(), entities.len());
    assert_eq!(canonical_entities(&written), canonical_entities(&entities));
}

#[test]
fn test_serialized_entities_build_the_same_graph() {
    let graph = build(&entities());
    let written = serialize_graph(&graph).unwrap();
    let rebuilt = build(&written);

    assert!(GraphDiff::between(&graph, &rebuilt).unwrap().is_empty());
    assert_eq!(graph.hash_index().unwrap(), rebuilt.hash_index().unwrap());
}

#[test]
fn test_inferred_ids_are_not_written() {
    let graph = build(&entities());
    let written = serialize_graph(&graph).unwrap();

    let mapping = written
        .iter()
        .find(|entity| entity.path == "model::PersonMapping")
        .unwrap();
    let person = &mapping.content["classMappings"][0];
    assert_eq!(person["class"], json!("model::Person"));
    assert!(person.get("id").is_none());
    assert_eq!(mapping.content["classMappings"][1]["id"], json!("unionPerson"));
}

#[test]
fn test_association_property_targets_included_mapping() {
    let graph = build(&entities());
    let mapping = graph.lookup("model::PersonMapping").unwrap();
    let base = graph.lookup("model::BaseMapping").unwrap();

    let person = graph.class_mapping_by_id(mapping, "model_Person").unwrap();
    let firm = graph
        .set_implementation(person)
        .unwrap()
        .find_property_mapping("firm", None)
        .unwrap()
        .target_set_implementation()
        .expect("firm property mapping is not wired");

    assert_eq!(firm.mapping(), base);
    assert_eq!(graph.set_implementation(firm).unwrap().id.value(), "firm");
}

#[test]
fn test_relational_property_targets_root_mapping() {
    let graph = build(&entities());
    let mapping = graph.lookup("model::RelationalMapping").unwrap();

    let person = graph.class_mapping_by_id(mapping, "model_Person").unwrap();
    let person = graph.set_implementation(person).unwrap();

    let firm = person
        .find_property_mapping("firm", None)
        .unwrap()
        .target_set_implementation()
        .unwrap();
    assert_eq!(graph.set_implementation(firm).unwrap().id.value(), "model_Firm");

    let address = person
        .find_property_mapping("address", None)
        .unwrap()
        .target_set_implementation()
        .unwrap();
    assert_eq!(address, graph.class_mapping_by_id(mapping, "model_Person_address").unwrap());
    assert!(matches!(
        graph.set_implementation(address).unwrap().kind,
        SetImplementationKind::Embedded(_)
    ));
}

#[test]
fn test_class_mappings_flatten_includes() {
    let graph = build(&entities());
    let mapping = graph.lookup("model::PersonMapping").unwrap();

    assert_eq!(
        ids(&graph, &graph.all_class_mappings(mapping)),
        vec!["model_Person", "unionPerson", "p1", "p2", "firm"]
    );
    assert_eq!(
        ids(&graph, &graph.own_class_mappings(mapping)),
        vec!["model_Person", "unionPerson", "p1", "p2"]
    );

    let firm = graph.lookup("model::Firm").unwrap();
    assert_eq!(ids(&graph, &graph.class_mappings_by_class(mapping, firm)), vec!["firm"]);
    assert!(graph.own_class_mappings_by_class(mapping, firm).is_empty());
}

#[test]
fn test_union_parameters_are_bound() {
    let graph = build(&entities());
    let mapping = graph.lookup("model::PersonMapping").unwrap();

    let union = graph.class_mapping_by_id(mapping, "unionPerson").unwrap();
    let SetImplementationKind::Operation(operation) = &graph.set_implementation(union).unwrap().kind else {
        panic!("Expected an operation class mapping");
    };

    let bound: Vec<Option<SetImplementationHandle>> =
        operation.parameters.iter().map(|parameter| parameter.target()).collect();
    assert_eq!(
        bound,
        vec![
            Some(graph.class_mapping_by_id(mapping, "p1").unwrap()),
            Some(graph.class_mapping_by_id(mapping, "p2").unwrap()),
        ]
    );
}

#[test]
fn test_aggregate_set_implementations_are_found_by_id() {
    let graph = build(&entities());
    let mapping = graph.lookup("model::SalesMapping").unwrap();

    assert!(graph.class_mapping_by_id(mapping, "sales").is_ok());
    assert!(graph.class_mapping_by_id(mapping, "sales_Main").is_ok());
    assert!(graph.class_mapping_by_id(mapping, "sales_Aggregate_0").is_ok());

    // Extracted set implementations are not top-level class mappings.
    assert_eq!(ids(&graph, &graph.own_class_mappings(mapping)), vec!["sales"]);

    let body = graph.get::<Mapping>("model::SalesMapping").unwrap();
    assert_eq!(body.aggregation_extracted_class_mappings().len(), 2);
}

#[test]
fn test_enumeration_mapping_source_values() {
    let graph = build(&entities());
    let mapping = graph.lookup("model::PersonMapping").unwrap();

    let handle = graph.enumeration_mapping_by_id(mapping, "genderMapping").unwrap();
    let enumeration_mapping = graph.enumeration_mapping(handle).unwrap();

    let male = enumeration_mapping.value("MALE").unwrap();
    assert_eq!(male.source_values.len(), 2);
    assert!(matches!(
        enumeration_mapping.value("FEMALE").unwrap().source_values[0],
        SourceValue::EnumValue { .. }
    ));
    assert!(enumeration_mapping.value("OTHER").is_none());
}

#[test]
fn test_store_closure_follows_includes() {
    let graph = build(&entities());
    let people = graph.lookup("store::PeopleDB").unwrap();
    let base = graph.lookup("store::BaseDB").unwrap();

    assert_eq!(graph.store_closure(people), vec![people, base]);
    assert!(graph.get::<Database>("store::BaseDB").unwrap().table("default", "firm").is_some());
}

#[test]
fn test_frozen_graph_rejects_changes() {
    let mut graph = builder().with_freeze(true).build(&entities()).unwrap();

    assert!(graph.is_frozen());
    assert!(graph.elements().all(|(_, element)| element.is_immutable()));
    assert!(matches!(
        graph.create_element("model::Extra", ElementBody::Class(Class::default())),
        Err(GraphError::ImmutableElementMutation { .. })
    ));
}

#[test]
fn test_hash_index_is_stable() {
    let graph = build(&entities());

    let first = graph.hash_index().unwrap();
    let second = graph.hash_index().unwrap();

    assert_eq!(first, second);
    assert!(first.contains_key("model::Person"));
    assert!(!first.contains_key("model"));
    assert!(!first.contains_key("String"));
}

#[test]
fn test_diff_reports_modified_element() {
    let before = build(&entities());

    let mut changed = entities();
    content_mut(&mut changed, "model::Address")["properties"][0]["name"] = json!("line1");
    // Keep the relational mapping of `street` pointing at a live property.
    content_mut(&mut changed, "model::RelationalMapping")["classMappings"][0]["propertyMappings"][2]
        ["propertyMappings"][0]["property"]["property"] = json!("line1");
    let after = build(&changed);

    let diff = GraphDiff::between(&before, &after).unwrap();
    assert_eq!(diff.modified, vec!["model::Address", "model::RelationalMapping"]);
    assert!(diff.added.is_empty());
    assert!(diff.removed.is_empty());
}

#[test]
fn test_missing_store_is_unresolved() {
    let entities: Vec<Entity> = entities()
        .into_iter()
        .filter(|entity| entity.path != "store::BaseDB")
        .collect();

    let err = builder().build(&entities).unwrap_err();

    assert!(!err.diagnostics().is_empty());
    assert!(err.diagnostics().iter().all(|d| d.code() == Some(ErrorCode::E200)));
    assert!(err.diagnostics().iter().any(|d| {
        d.labels().iter().any(|label| label.path() == "store::PeopleDB")
    }));
}

#[test]
fn test_unknown_stereotype_and_table_are_reported() {
    let mut entities = entities();
    content_mut(&mut entities, "model::Gender")["values"][1]["stereotypes"][0]["value"] = json!("obsolete");
    content_mut(&mut entities, "model::RelationalMapping")["classMappings"][1]["mainTable"]["table"] =
        json!("company");

    let mut found = codes(&entities);
    found.sort_by_key(|code| code.as_str());

    assert_eq!(found, vec![ErrorCode::E201, ErrorCode::E203]);
}

#[test]
fn test_unknown_class_mapping_target_is_reported() {
    let mut entities = entities();
    content_mut(&mut entities, "model::PersonMapping")["classMappings"][0]["propertyMappings"][2]["target"] =
        json!("company");

    assert_eq!(codes(&entities), vec![ErrorCode::E300]);
}

#[test]
fn test_unknown_members_are_malformed() {
    let mut entities = entities();
    content_mut(&mut entities, "model::Person")["properties"][0]["defaultValue"] = json!("unknown");
    content_mut(&mut entities, "model::Firm")["isAbstract"] = json!(true);

    let err = builder().build(&entities).unwrap_err();

    let codes: Vec<_> = err.diagnostics().iter().filter_map(|d| d.code()).collect();
    assert_eq!(codes, vec![ErrorCode::E006, ErrorCode::E006]);
    assert!(err.diagnostics().iter().any(|d| d.message().contains("defaultValue")));
    assert!(err.diagnostics().iter().any(|d| d.message().contains("isAbstract")));
}

#[test]
fn test_parameter_without_type_round_trips() {
    let mut entities = entities();
    let parameter = &mut content_mut(&mut entities, "model::greeting")["parameters"][0];
    parameter
        .as_object_mut()
        .expect("parameter is an object")
        .remove("_type");

    let written = serialize_graph(&build(&entities)).unwrap();

    assert_eq!(canonical_entities(&written), canonical_entities(&entities));
}
