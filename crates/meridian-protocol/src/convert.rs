//! Conversion of protocol documents into element bodies.
//!
//! References are created unbound with the path written in the document;
//! the builder binds them in its resolve phase.

use serde::de::DeserializeOwned;
use serde_json::Value;

use meridian_core::{
    ElementBody,
    element::{
        Association, Class, ConcreteFunctionDefinition, Connection, ConnectionStore,
        ConnectionValue, Constraint, Database, DerivedProperty, EngineRuntime, EnumValue,
        Enumeration, IdentifiedConnection, Join, JoinPointer, Multiplicity, PackageableConnection,
        PackageableRuntime, Parameter, Profile, Property, PureSingleExecution,
        RelationalOperation, RuntimeValue, Schema, Service, StereotypeReference, StoreConnections,
        Table, TablePointer, TaggedValue,
    },
    identifier::Id,
    mapping::{
        AggregateSetImplementation, AggregateValue, AggregationAwareSetImplementation,
        AggregationSpecification, EmbeddedSetImplementation, EnumValueMapping, EnumerationMapping,
        Mapping, MappingElementId, OperationSetImplementation, OperationType, PropertyMapping,
        PropertyMappingKind, PropertyPointer, PureInstanceSetImplementation,
        RelationalSetImplementation, SetImplementation, SetImplementationContainer,
        SetImplementationKind, SourceValue,
    },
    plugin::PluginRegistry,
    reference::Reference,
};

use crate::{
    classifier::CoreClassifier,
    entity::{HEADER_MEMBERS, without_members},
    error::{Diagnostic, ErrorCode},
    protocol,
};

/// Members of a class mapping read by the core whatever its `_type`.
const CLASS_MAPPING_HEADER: [&str; 4] = ["_type", "id", "class", "root"];

/// Converts the content of a core entity into its element body.
///
/// The header members of `content` are left to the builder; every other
/// member must be known to the document of `classifier`.
///
/// # Errors
///
/// Returns an [`ErrorCode::E006`] diagnostic for malformed content, unknown
/// members included, and an [`ErrorCode::E303`] diagnostic for a class
/// mapping no extension handles.
pub(crate) fn element_body(
    classifier: CoreClassifier,
    path: &str,
    content: &Value,
    registry: &PluginRegistry,
) -> Result<ElementBody, Diagnostic> {
    let content = &without_members(content, &HEADER_MEMBERS);
    let body = match classifier {
        CoreClassifier::Profile => {
            let document: protocol::ProfileDocument = document(path, content)?;
            ElementBody::Profile(Profile {
                stereotypes: document.stereotypes,
                tags: document.tags,
            })
        }
        CoreClassifier::Enumeration => {
            ElementBody::Enumeration(enumeration(document(path, content)?))
        }
        CoreClassifier::Class => ElementBody::Class(class(document(path, content)?)),
        CoreClassifier::Association => {
            ElementBody::Association(association(document(path, content)?))
        }
        CoreClassifier::Function => ElementBody::Function(function(document(path, content)?)),
        CoreClassifier::Database => ElementBody::Database(database(document(path, content)?)),
        CoreClassifier::Mapping => {
            ElementBody::Mapping(mapping(path, document(path, content)?, registry)?)
        }
        CoreClassifier::Connection => {
            let document: protocol::ConnectionDocument = document(path, content)?;
            ElementBody::Connection(PackageableConnection {
                connection: connection(document.connection_value),
            })
        }
        CoreClassifier::Runtime => {
            let document: protocol::RuntimeDocument = document(path, content)?;
            ElementBody::Runtime(PackageableRuntime {
                runtime: engine_runtime(path, document.runtime_value)?,
            })
        }
        CoreClassifier::Service => ElementBody::Service(service(path, document(path, content)?)?),
    };
    Ok(body)
}

/// Reads `value` as the document type `T`, reporting failures against `path`.
pub(crate) fn document<T: DeserializeOwned>(path: &str, value: &Value) -> Result<T, Diagnostic> {
    T::deserialize(value).map_err(|err| malformed(path, err))
}

fn malformed(path: &str, err: impl std::fmt::Display) -> Diagnostic {
    Diagnostic::error(format!("malformed content of `{path}`: {err}"))
        .with_code(ErrorCode::E006)
        .with_label(path, "malformed content")
}

// =============================================================================
// Domain
// =============================================================================

fn multiplicity(multiplicity: protocol::Multiplicity) -> Multiplicity {
    Multiplicity::new(multiplicity.lower_bound, multiplicity.upper_bound)
}

fn stereotypes(stereotypes: Vec<protocol::StereotypePointer>) -> Vec<StereotypeReference> {
    stereotypes
        .into_iter()
        .map(|stereotype| StereotypeReference::new(Reference::new(&stereotype.profile), stereotype.value))
        .collect()
}

fn tagged_values(tagged_values: Vec<protocol::TaggedValue>) -> Vec<TaggedValue> {
    tagged_values
        .into_iter()
        .map(|tagged| TaggedValue::new(Reference::new(&tagged.tag.profile), tagged.tag.value, tagged.value))
        .collect()
}

fn property(document: protocol::Property) -> Property {
    let mut property = Property::new(
        document.name,
        multiplicity(document.multiplicity),
        Reference::new(&document.property_type),
    );
    property.stereotypes = stereotypes(document.stereotypes);
    property.tagged_values = tagged_values(document.tagged_values);
    property
}

fn derived_property(document: protocol::QualifiedProperty) -> DerivedProperty {
    DerivedProperty {
        name: document.name,
        return_type: Reference::new(&document.return_type),
        return_multiplicity: multiplicity(document.return_multiplicity),
        parameters: document.parameters,
        body: document.body,
        stereotypes: stereotypes(document.stereotypes),
        tagged_values: tagged_values(document.tagged_values),
    }
}

fn enumeration(document: protocol::EnumerationDocument) -> Enumeration {
    Enumeration {
        values: document
            .values
            .into_iter()
            .map(|value| EnumValue {
                name: value.value,
                stereotypes: stereotypes(value.stereotypes),
                tagged_values: tagged_values(value.tagged_values),
            })
            .collect(),
        stereotypes: stereotypes(document.stereotypes),
        tagged_values: tagged_values(document.tagged_values),
    }
}

fn class(document: protocol::ClassDocument) -> Class {
    Class {
        super_types: document
            .super_types
            .iter()
            .map(Reference::new)
            .collect(),
        properties: document.properties.into_iter().map(property).collect(),
        derived_properties: document
            .qualified_properties
            .into_iter()
            .map(derived_property)
            .collect(),
        constraints: document
            .constraints
            .into_iter()
            .map(|constraint| Constraint {
                name: constraint.name,
                function_definition: constraint.function_definition,
            })
            .collect(),
        stereotypes: stereotypes(document.stereotypes),
        tagged_values: tagged_values(document.tagged_values),
    }
}

fn association(document: protocol::AssociationDocument) -> Association {
    Association {
        properties: document.properties.into_iter().map(property).collect(),
        derived_properties: document
            .qualified_properties
            .into_iter()
            .map(derived_property)
            .collect(),
        stereotypes: stereotypes(document.stereotypes),
        tagged_values: tagged_values(document.tagged_values),
    }
}

fn function(document: protocol::FunctionDocument) -> ConcreteFunctionDefinition {
    let mut function = ConcreteFunctionDefinition::new(
        Reference::new(&document.return_type),
        multiplicity(document.return_multiplicity),
    );
    for parameter in document.parameters {
        function.add_parameter(
            Parameter::new(
                parameter.name,
                Reference::new(&parameter.class),
                multiplicity(parameter.multiplicity),
            )
            .with_kind(parameter.kind),
        );
    }
    function.set_body(document.body);
    function.stereotypes = stereotypes(document.stereotypes);
    function.tagged_values = tagged_values(document.tagged_values);
    function
}

// =============================================================================
// Store
// =============================================================================

fn database(document: protocol::DatabaseDocument) -> Database {
    Database {
        includes: document
            .included_stores
            .iter()
            .map(Reference::new)
            .collect(),
        schemas: document
            .schemas
            .into_iter()
            .map(|schema| Schema {
                name: schema.name,
                tables: schema.tables.into_iter().map(table).collect(),
            })
            .collect(),
        joins: document
            .joins
            .into_iter()
            .map(|join| Join {
                name: join.name,
                operation: relational_operation(join.operation),
            })
            .collect(),
    }
}

fn table(document: protocol::Table) -> Table {
    Table {
        name: document.name,
        columns: document
            .columns
            .into_iter()
            .map(|column| meridian_core::element::Column {
                name: column.name,
                data_type: column.column_type.to_data_type(),
                nullable: column.nullable,
            })
            .collect(),
        primary_key: document.primary_key,
    }
}

fn table_pointer(pointer: protocol::TablePointer) -> TablePointer {
    TablePointer {
        database: Reference::new(&pointer.database),
        schema: pointer.schema,
        table: pointer.table,
    }
}

fn relational_operation(operation: protocol::RelationalOperation) -> RelationalOperation {
    match operation {
        protocol::RelationalOperation::Column {
            table,
            table_alias,
            column,
        } => RelationalOperation::Column {
            table: table_pointer(table),
            table_alias,
            column,
        },
        protocol::RelationalOperation::DynaFunction {
            func_name,
            parameters,
        } => RelationalOperation::DynaFunction {
            name: func_name,
            parameters: parameters.into_iter().map(relational_operation).collect(),
        },
        protocol::RelationalOperation::Literal { value } => RelationalOperation::Literal(value),
        protocol::RelationalOperation::ElementWithJoins {
            joins,
            relational_element,
        } => RelationalOperation::ElementWithJoins {
            joins: joins
                .into_iter()
                .map(|join| JoinPointer {
                    database: Reference::new(&join.db),
                    name: join.name,
                    join_type: join.join_type,
                })
                .collect(),
            element: relational_element.map(|element| Box::new(relational_operation(*element))),
        },
    }
}

// =============================================================================
// Mapping
// =============================================================================

fn mapping_id(id: Option<String>, path: &str) -> MappingElementId {
    match id {
        Some(id) => MappingElementId::explicit(id),
        None => MappingElementId::inferred(Id::new(path)),
    }
}

fn mapping(
    path: &str,
    document: protocol::MappingDocument,
    registry: &PluginRegistry,
) -> Result<Mapping, Diagnostic> {
    let mut mapping = Mapping::default();
    mapping.includes = document
        .included_mappings
        .iter()
        .map(|include| Reference::new(&include.included_mapping))
        .collect();

    for class_mapping in &document.class_mappings {
        let set_implementation = class_mapping_value(path, class_mapping, &mut mapping, registry)?;
        mapping.add_class_mapping(set_implementation);
    }

    mapping.enumeration_mappings = document
        .enumeration_mappings
        .into_iter()
        .map(enumeration_mapping)
        .collect();
    Ok(mapping)
}

fn class_mapping_value(
    path: &str,
    value: &Value,
    mapping: &mut Mapping,
    registry: &PluginRegistry,
) -> Result<SetImplementation, Diagnostic> {
    let mapping_type = value.get("_type").and_then(Value::as_str).unwrap_or_default();
    if protocol::ClassMapping::TYPES.contains(&mapping_type) {
        let document: protocol::ClassMapping = document(path, value)?;
        return class_mapping(path, document, mapping);
    }

    let Some(extension) = registry.mapping_extension(mapping_type) else {
        return Err(Diagnostic::error(format!(
            "unknown class mapping type `{mapping_type}` in `{path}`"
        ))
        .with_code(ErrorCode::E303)
        .with_label(path, "in this mapping")
        .with_help("install the plugin providing this class mapping type"));
    };

    let header: protocol::ClassMappingHeader = document(path, value)?;
    let body = extension
        .build(&without_members(value, &CLASS_MAPPING_HEADER))
        .map_err(|err| malformed(path, err))?;
    Ok(SetImplementation::new(
        mapping_id(header.id, &header.class),
        Reference::new(&header.class),
        header.root,
        SetImplementationKind::Extension(body),
    ))
}

fn class_mapping(
    path: &str,
    document: protocol::ClassMapping,
    mapping: &mut Mapping,
) -> Result<SetImplementation, Diagnostic> {
    let set_implementation = match document {
        protocol::ClassMapping::PureInstance(pure) => {
            let property_mappings = property_mappings(pure.property_mappings, mapping);
            SetImplementation::new(
                mapping_id(pure.id, &pure.class),
                Reference::new(&pure.class),
                pure.root,
                SetImplementationKind::PureInstance(PureInstanceSetImplementation {
                    src_class: pure.src_class.as_ref().map(Reference::new),
                    filter: pure.filter,
                    property_mappings,
                }),
            )
        }
        protocol::ClassMapping::Relational(relational) => {
            let property_mappings = property_mappings(relational.property_mappings, mapping);
            SetImplementation::new(
                mapping_id(relational.id, &relational.class),
                Reference::new(&relational.class),
                relational.root,
                SetImplementationKind::Relational(RelationalSetImplementation {
                    distinct: relational.distinct,
                    main_table: relational.main_table.map(table_pointer),
                    primary_key: relational
                        .primary_key
                        .into_iter()
                        .map(relational_operation)
                        .collect(),
                    property_mappings,
                }),
            )
        }
        protocol::ClassMapping::AggregationAware(aware) => {
            let main = class_mapping(path, *aware.main_set_implementation, mapping)?;
            let main = mapping.add_set_implementation(main);

            let mut aggregates = Vec::with_capacity(aware.aggregate_set_implementations.len());
            for aggregate in aware.aggregate_set_implementations {
                let set_implementation = class_mapping(path, aggregate.set_implementation, mapping)?;
                let specification = aggregate.aggregate_specification;
                aggregates.push(AggregateSetImplementation {
                    index: aggregate.index,
                    specification: AggregationSpecification {
                        can_aggregate: specification.can_aggregate,
                        group_by_functions: specification.group_by_functions,
                        aggregate_values: specification
                            .aggregate_values
                            .into_iter()
                            .map(|value| AggregateValue {
                                map_fn: value.map_fn,
                                agg_fn: value.aggregate_fn,
                            })
                            .collect(),
                    },
                    set_implementation: mapping.add_set_implementation(set_implementation),
                });
            }

            let property_mappings = property_mappings(aware.property_mappings, mapping);
            SetImplementation::new(
                mapping_id(aware.id, &aware.class),
                Reference::new(&aware.class),
                aware.root,
                SetImplementationKind::AggregationAware(AggregationAwareSetImplementation {
                    main,
                    aggregates,
                    property_mappings,
                }),
            )
        }
        protocol::ClassMapping::Operation(operation) => {
            let Some(operation_type) = OperationType::parse(&operation.operation) else {
                return Err(Diagnostic::error(format!(
                    "unknown operation `{}` in `{path}`",
                    operation.operation
                ))
                .with_code(ErrorCode::E006)
                .with_label(path, "in this mapping")
                .with_help("expected STORE_UNION, ROUTER_UNION, INHERITANCE or MERGE"));
            };
            SetImplementation::new(
                mapping_id(operation.id, &operation.class),
                Reference::new(&operation.class),
                operation.root,
                SetImplementationKind::Operation(OperationSetImplementation {
                    operation: operation_type,
                    parameters: operation
                        .parameters
                        .into_iter()
                        .map(SetImplementationContainer::new)
                        .collect(),
                }),
            )
        }
    };
    Ok(set_implementation)
}

fn property_mappings(
    documents: Vec<protocol::PropertyMapping>,
    mapping: &mut Mapping,
) -> Vec<PropertyMapping> {
    documents
        .into_iter()
        .map(|document| property_mapping(document, mapping))
        .collect()
}

fn property_mapping(document: protocol::PropertyMapping, mapping: &mut Mapping) -> PropertyMapping {
    let pointer = |pointer: protocol::PropertyPointer| PropertyPointer::new(&pointer.class, pointer.property);

    match document {
        protocol::PropertyMapping::Pure(pure) => {
            let mut property_mapping = PropertyMapping::new(
                pointer(pure.property),
                PropertyMappingKind::Pure {
                    transform: pure.transform,
                    explode_property: pure.explode_property,
                },
            );
            property_mapping.source = pure.source;
            property_mapping.target = pure.target;
            property_mapping.enumeration_mapping = pure.enum_mapping_id;
            property_mapping
        }
        protocol::PropertyMapping::Relational(relational) => {
            let mut property_mapping = PropertyMapping::new(
                pointer(relational.property),
                PropertyMappingKind::Relational {
                    operation: relational_operation(relational.relational_operation),
                },
            );
            property_mapping.source = relational.source;
            property_mapping.target = relational.target;
            property_mapping.enumeration_mapping = relational.enum_mapping_id;
            property_mapping
        }
        protocol::PropertyMapping::Embedded(embedded) => {
            let nested = property_mappings(embedded.property_mappings, mapping);
            let index = mapping.add_set_implementation(SetImplementation::new(
                MappingElementId::explicit(embedded.id),
                Reference::new(&embedded.class),
                embedded.root,
                SetImplementationKind::Embedded(EmbeddedSetImplementation {
                    property_mappings: nested,
                }),
            ));
            let mut property_mapping = PropertyMapping::new(
                pointer(embedded.property),
                PropertyMappingKind::Embedded {
                    set_implementation: index,
                },
            );
            property_mapping.source = embedded.source;
            property_mapping
        }
    }
}

fn enumeration_mapping(document: protocol::EnumerationMapping) -> EnumerationMapping {
    let mut enumeration_mapping = EnumerationMapping::new(
        mapping_id(document.id, &document.enumeration),
        Reference::new(&document.enumeration),
    );
    enumeration_mapping.values = document
        .enum_value_mappings
        .into_iter()
        .map(|value| EnumValueMapping {
            enum_value: value.enum_value,
            source_values: value
                .source_values
                .into_iter()
                .map(|source| match source {
                    protocol::SourceValue::String { value } => SourceValue::String(value),
                    protocol::SourceValue::Integer { value } => SourceValue::Integer(value),
                    protocol::SourceValue::EnumValue { enumeration, value } => {
                        SourceValue::EnumValue {
                            enumeration: Reference::new(&enumeration),
                            value,
                        }
                    }
                })
                .collect(),
        })
        .collect();
    enumeration_mapping
}

// =============================================================================
// Connections, runtimes and services
// =============================================================================

fn connection_store(path: &str) -> ConnectionStore {
    if path == ConnectionStore::MODEL_STORE {
        ConnectionStore::Model
    } else {
        ConnectionStore::Store(Reference::new(path))
    }
}

fn connection(document: protocol::ConnectionValue) -> Connection {
    Connection {
        connection_type: document.connection_type,
        store: document.element.as_deref().map(connection_store),
        specification: document.specification,
    }
}

fn engine_runtime(path: &str, document: protocol::EngineRuntime) -> Result<EngineRuntime, Diagnostic> {
    let mut connections = Vec::with_capacity(document.connections.len());
    for group in document.connections {
        let mut identified = Vec::with_capacity(group.store_connections.len());
        for store_connection in group.store_connections {
            let connection = if store_connection.connection.get("_type").and_then(Value::as_str)
                == Some(protocol::ConnectionPointer::TYPE)
            {
                let pointer: protocol::ConnectionPointer =
                    self::document(path, &store_connection.connection)?;
                ConnectionValue::Pointer(Reference::new(&pointer.connection))
            } else {
                let value: protocol::ConnectionValue =
                    self::document(path, &store_connection.connection)?;
                ConnectionValue::Embedded(connection(value))
            };
            identified.push(IdentifiedConnection {
                id: store_connection.id,
                connection,
            });
        }
        connections.push(StoreConnections {
            store: connection_store(&group.store.path),
            connections: identified,
        });
    }

    Ok(EngineRuntime {
        mappings: document
            .mappings
            .iter()
            .map(|pointer| Reference::new(&pointer.path))
            .collect(),
        connections,
    })
}

fn service(path: &str, document: protocol::ServiceDocument) -> Result<Service, Diagnostic> {
    let execution = match document.execution {
        Some(execution) => {
            let runtime = if execution.runtime.get("_type").and_then(Value::as_str)
                == Some(protocol::RuntimePointer::TYPE)
            {
                let pointer: protocol::RuntimePointer = self::document(path, &execution.runtime)?;
                RuntimeValue::Pointer(Reference::new(&pointer.runtime))
            } else {
                let runtime: protocol::EngineRuntime = self::document(path, &execution.runtime)?;
                RuntimeValue::Embedded(engine_runtime(path, runtime)?)
            };
            Some(PureSingleExecution {
                func: execution.func,
                mapping: Reference::new(&execution.mapping),
                runtime,
            })
        }
        None => None,
    };

    Ok(Service {
        pattern: document.pattern,
        documentation: document.documentation,
        owners: document.owners,
        auto_activate_updates: document.auto_activate_updates,
        execution,
        stereotypes: stereotypes(document.stereotypes),
        tagged_values: tagged_values(document.tagged_values),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn registry() -> PluginRegistry {
        PluginRegistry::default()
    }

    #[test]
    fn test_class_body() {
        let body = element_body(
            CoreClassifier::Class,
            "model::Person",
            &json!({
                "_type": "class",
                "name": "Person",
                "package": "model",
                "superTypes": ["model::LegalEntity"],
                "properties": [{
                    "name": "firstName",
                    "type": "String",
                    "multiplicity": {"lowerBound": 1, "upperBound": 1},
                    "stereotypes": [{"profile": "model::Doc", "value": "important"}]
                }]
            }),
            &registry(),
        )
        .unwrap();

        let ElementBody::Class(class) = body else {
            panic!("expected a class body");
        };
        assert_eq!(class.super_types[0].path(), "model::LegalEntity");
        assert_eq!(class.properties[0].multiplicity, Multiplicity::ONE);
        assert_eq!(class.properties[0].stereotypes[0].value, "important");
        assert!(!class.properties[0].property_type.is_resolved());
    }

    #[test]
    fn test_malformed_content() {
        let diag = element_body(
            CoreClassifier::Class,
            "model::Person",
            &json!({"properties": [{"name": "age"}]}),
            &registry(),
        )
        .unwrap_err();

        assert_eq!(diag.code(), Some(ErrorCode::E006));
        assert_eq!(diag.labels()[0].path(), "model::Person");
    }

    #[test]
    fn test_unknown_member_is_malformed() {
        let diag = element_body(
            CoreClassifier::Class,
            "model::Person",
            &json!({
                "_type": "class",
                "name": "Person",
                "package": "model",
                "properties": [{
                    "name": "age",
                    "type": "Integer",
                    "multiplicity": {"lowerBound": 1, "upperBound": 1},
                    "defaultValue": 42
                }]
            }),
            &registry(),
        )
        .unwrap_err();

        assert_eq!(diag.code(), Some(ErrorCode::E006));
        assert!(diag.message().contains("defaultValue"));
    }

    #[test]
    fn test_mapping_ids_and_arena() {
        let body = element_body(
            CoreClassifier::Mapping,
            "model::M",
            &json!({
                "classMappings": [
                    {
                        "_type": "aggregationAware",
                        "id": "aware",
                        "class": "model::Sales",
                        "root": true,
                        "mainSetImplementation": {
                            "_type": "pureInstance", "id": "main", "class": "model::Sales", "root": false
                        },
                        "aggregateSetImplementations": [{
                            "index": 0,
                            "aggregateSpecification": {"canAggregate": true},
                            "setImplementation": {
                                "_type": "pureInstance", "id": "Y", "class": "model::Sales", "root": false
                            }
                        }]
                    },
                    {"_type": "pureInstance", "class": "model::Person", "root": true}
                ],
                "enumerationMappings": [{"enumeration": "model::Gender"}]
            }),
            &registry(),
        )
        .unwrap();

        let ElementBody::Mapping(mapping) = body else {
            panic!("expected a mapping body");
        };
        let ids: Vec<String> = mapping
            .class_mappings()
            .map(|(_, set_implementation)| set_implementation.id.to_string())
            .collect();
        assert_eq!(ids, vec!["aware", "model_Person"]);
        assert_eq!(mapping.set_implementations().count(), 4);
        assert_eq!(mapping.aggregation_extracted_class_mappings().len(), 2);
        assert!(mapping.enumeration_mappings[0].id.is_inferred());
    }

    #[test]
    fn test_unknown_class_mapping_type() {
        let diag = element_body(
            CoreClassifier::Mapping,
            "model::M",
            &json!({"classMappings": [{"_type": "flatData", "class": "model::Person"}]}),
            &registry(),
        )
        .unwrap_err();

        assert_eq!(diag.code(), Some(ErrorCode::E303));
    }

    #[test]
    fn test_unknown_operation() {
        let diag = element_body(
            CoreClassifier::Mapping,
            "model::M",
            &json!({"classMappings": [{
                "_type": "operation", "class": "model::Person", "operation": "SPLIT", "parameters": []
            }]}),
            &registry(),
        )
        .unwrap_err();

        assert_eq!(diag.code(), Some(ErrorCode::E006));
        assert!(diag.message().contains("SPLIT"));
    }

    #[test]
    fn test_runtime_connection_kinds() {
        let body = element_body(
            CoreClassifier::Runtime,
            "model::Runtime",
            &json!({"runtimeValue": {
                "_type": "engineRuntime",
                "mappings": [{"type": "MAPPING", "path": "model::M"}],
                "connections": [{
                    "store": {"type": "STORE", "path": "ModelStore"},
                    "storeConnections": [
                        {"id": "pointer", "connection": {"_type": "connectionPointer", "connection": "model::Conn"}},
                        {"id": "inline", "connection": {"_type": "JsonModelConnection", "element": "ModelStore", "url": "data:,"}}
                    ]
                }]
            }}),
            &registry(),
        )
        .unwrap();

        let ElementBody::Runtime(runtime) = body else {
            panic!("expected a runtime body");
        };
        let group = &runtime.runtime.connections[0];
        assert!(matches!(group.store, ConnectionStore::Model));
        assert!(matches!(group.connections[0].connection, ConnectionValue::Pointer(_)));
        assert!(matches!(
            &group.connections[1].connection,
            ConnectionValue::Embedded(connection) if matches!(connection.store, Some(ConnectionStore::Model))
        ));
    }
}
