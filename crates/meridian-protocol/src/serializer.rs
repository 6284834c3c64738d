//! Graph to entity serialization.
//!
//! # Overview
//!
//! [`ProtocolSerializer`] is an [`ElementVisitor`] producing one [`Entity`]
//! per model element. References are written with the current path of the
//! element they are bound to, so renamed targets serialize under their new
//! name. Packages and primitive types produce no entity.
//!
//! Extension element kinds and plugin class mappings are serialized by the
//! plugins registered for them; the serializer adds `_type`, `name` and
//! `package` (and for class mappings `id`, `class` and `root`).

use log::debug;
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use meridian_core::{
    Element, Graph,
    element::{
        Association, Class, ConcreteFunctionDefinition, Connection, ConnectionStore,
        ConnectionValue, Database, DerivedProperty, EngineRuntime, Enumeration, ExtensionElement,
        Multiplicity, Package, PackageableConnection, PackageableRuntime, PrimitiveType, Profile,
        Property, RelationalOperation, RuntimeValue, Service, StereotypeReference, TablePointer,
        TaggedValue,
    },
    mapping::{
        EnumerationMapping, Mapping, PropertyMapping, PropertyMappingKind,
        SetImplementationIndex, SetImplementationKind, SourceValue,
    },
    reference::Reference,
    visitor::ElementVisitor,
};

use crate::{classifier::CoreClassifier, entity::Entity, protocol};

/// Errors raised while serializing a graph.
#[derive(Debug, Error)]
pub enum SerializeError {
    #[error("no plugin is registered for element kind `{kind}` of `{path}`")]
    UnknownElementKind { path: String, kind: String },

    #[error("no mapping extension is registered for class mapping type `{kind}` in `{path}`")]
    UnknownMappingExtension { path: String, kind: String },

    #[error("invalid column type `{data_type}` in `{path}`")]
    InvalidColumnType { path: String, data_type: String },

    #[error("invalid mapping `{path}`: {reason}")]
    InvalidMapping { path: String, reason: String },

    #[error("content of `{path}` is not a JSON object")]
    NotAnObject { path: String },

    #[error("can't serialize `{path}`: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

type Result<T> = std::result::Result<T, SerializeError>;

/// Serializes every model element of `graph`, sorted by path.
///
/// # Errors
///
/// Returns the first [`SerializeError`] raised by an element.
///
/// # Examples
///
/// ```
/// use meridian_core::{Graph, element::{Class, ElementBody}};
///
/// let mut graph = Graph::default();
/// graph
///     .create_element("model::Person", ElementBody::Class(Class::default()))
///     .unwrap();
///
/// let entities = meridian_protocol::serialize_graph(&graph).unwrap();
/// assert_eq!(entities.len(), 1);
/// assert_eq!(entities[0].content["package"], "model");
/// ```
pub fn serialize_graph(graph: &Graph) -> Result<Vec<Entity>> {
    let mut serializer = ProtocolSerializer::new(graph);
    let mut entities = Vec::new();
    for (_, element) in graph.elements() {
        if let Some(entity) = element.accept(&mut serializer)? {
            entities.push(entity);
        }
    }
    entities.sort_by(|a, b| a.path.cmp(&b.path));

    debug!(entities = entities.len(); "Serialized graph");
    Ok(entities)
}

/// Visitor turning elements into entities.
pub struct ProtocolSerializer<'g> {
    graph: &'g Graph,
}

impl<'g> ProtocolSerializer<'g> {
    pub fn new(graph: &'g Graph) -> Self {
        Self { graph }
    }

    fn path<T: ?Sized>(&self, reference: &Reference<T>) -> String {
        self.graph.reference_path(reference).as_string()
    }

    fn entity(
        &self,
        element: &Element,
        classifier_path: &str,
        protocol_type: &str,
        document: Value,
    ) -> Result<Option<Entity>> {
        let path = element.path();
        let Value::Object(members) = document else {
            return Err(SerializeError::NotAnObject {
                path: path.as_string(),
            });
        };

        let mut content = Map::new();
        content.insert("_type".to_string(), Value::from(protocol_type));
        content.insert("name".to_string(), Value::from(element.name()));
        if let Some(package) = path.package_path() {
            content.insert("package".to_string(), Value::from(package.as_string()));
        }
        for (key, member) in members {
            if !content.contains_key(&key) {
                content.insert(key, member);
            }
        }

        Ok(Some(Entity::new(
            path.as_string(),
            classifier_path,
            Value::Object(content),
        )))
    }

    fn core_entity(
        &self,
        element: &Element,
        classifier: CoreClassifier,
        document: &impl Serialize,
    ) -> Result<Option<Entity>> {
        let document = to_value(&element.path().as_string(), document)?;
        self.entity(element, classifier.path(), classifier.protocol_type(), document)
    }

    // =========================================================================
    // Domain
    // =========================================================================

    fn stereotypes(&self, stereotypes: &[StereotypeReference]) -> Vec<protocol::StereotypePointer> {
        stereotypes
            .iter()
            .map(|stereotype| protocol::StereotypePointer {
                profile: self.path(&stereotype.profile),
                value: stereotype.value.clone(),
            })
            .collect()
    }

    fn tagged_values(&self, tagged_values: &[TaggedValue]) -> Vec<protocol::TaggedValue> {
        tagged_values
            .iter()
            .map(|tagged| protocol::TaggedValue {
                tag: protocol::TagPointer {
                    profile: self.path(&tagged.tag.profile),
                    value: tagged.tag.value.clone(),
                },
                value: tagged.value.clone(),
            })
            .collect()
    }

    fn property(&self, property: &Property) -> protocol::Property {
        protocol::Property {
            name: property.name.clone(),
            property_type: self.path(&property.property_type),
            multiplicity: multiplicity(property.multiplicity),
            stereotypes: self.stereotypes(&property.stereotypes),
            tagged_values: self.tagged_values(&property.tagged_values),
        }
    }

    fn qualified_property(&self, property: &DerivedProperty) -> protocol::QualifiedProperty {
        protocol::QualifiedProperty {
            name: property.name.clone(),
            parameters: property.parameters.clone(),
            return_type: self.path(&property.return_type),
            return_multiplicity: multiplicity(property.return_multiplicity),
            body: property.body.clone(),
            stereotypes: self.stereotypes(&property.stereotypes),
            tagged_values: self.tagged_values(&property.tagged_values),
        }
    }

    // =========================================================================
    // Store
    // =========================================================================

    fn table_pointer(&self, pointer: &TablePointer) -> protocol::TablePointer {
        protocol::TablePointer::new(
            self.path(&pointer.database),
            pointer.schema.clone(),
            pointer.table.clone(),
        )
    }

    fn relational_operation(&self, operation: &RelationalOperation) -> protocol::RelationalOperation {
        match operation {
            RelationalOperation::Column {
                table,
                table_alias,
                column,
            } => protocol::RelationalOperation::Column {
                table: self.table_pointer(table),
                table_alias: table_alias.clone(),
                column: column.clone(),
            },
            RelationalOperation::DynaFunction { name, parameters } => {
                protocol::RelationalOperation::DynaFunction {
                    func_name: name.clone(),
                    parameters: parameters
                        .iter()
                        .map(|parameter| self.relational_operation(parameter))
                        .collect(),
                }
            }
            RelationalOperation::Literal(value) => protocol::RelationalOperation::Literal {
                value: value.clone(),
            },
            RelationalOperation::ElementWithJoins { joins, element } => {
                protocol::RelationalOperation::ElementWithJoins {
                    joins: joins
                        .iter()
                        .map(|join| protocol::JoinPointer {
                            db: self.path(&join.database),
                            name: join.name.clone(),
                            join_type: join.join_type.clone(),
                        })
                        .collect(),
                    relational_element: element
                        .as_ref()
                        .map(|element| Box::new(self.relational_operation(element))),
                }
            }
        }
    }

    // =========================================================================
    // Mapping
    // =========================================================================

    /// Serializes a top-level class mapping, handing plugin class mappings to
    /// their extension.
    fn class_mapping_value(&self, path: &str, mapping: &Mapping, index: SetImplementationIndex) -> Result<Value> {
        let set_implementation = set_implementation(path, mapping, index)?;
        let SetImplementationKind::Extension(extension) = &set_implementation.kind else {
            return to_value(path, &self.class_mapping(path, mapping, index)?);
        };

        let kind = extension.kind();
        let Some(plugin) = self.graph.registry().mapping_extension(kind) else {
            return Err(SerializeError::UnknownMappingExtension {
                path: path.to_string(),
                kind: kind.to_string(),
            });
        };
        let value = plugin
            .serialize(extension.as_ref(), self.graph)
            .map_err(|source| SerializeError::Json {
                path: path.to_string(),
                source,
            })?;
        let Value::Object(mut members) = value else {
            return Err(SerializeError::NotAnObject {
                path: path.to_string(),
            });
        };

        members.insert("_type".to_string(), Value::from(kind));
        if let Some(id) = set_implementation.id.written() {
            members.insert("id".to_string(), Value::from(id));
        }
        members.insert("class".to_string(), Value::from(self.path(&set_implementation.class)));
        members.insert("root".to_string(), Value::from(set_implementation.root));
        Ok(Value::Object(members))
    }

    fn class_mapping(
        &self,
        path: &str,
        mapping: &Mapping,
        index: SetImplementationIndex,
    ) -> Result<protocol::ClassMapping> {
        let set_implementation = set_implementation(path, mapping, index)?;
        let id = set_implementation.id.written().map(str::to_string);
        let class = self.path(&set_implementation.class);
        let root = set_implementation.root;

        let class_mapping = match &set_implementation.kind {
            SetImplementationKind::PureInstance(pure) => {
                protocol::ClassMapping::PureInstance(protocol::PureInstanceClassMapping {
                    id,
                    class,
                    root,
                    src_class: pure.src_class.as_ref().map(|src| self.path(src)),
                    filter: pure.filter.clone(),
                    property_mappings: self.property_mappings(path, mapping, &pure.property_mappings)?,
                })
            }
            SetImplementationKind::Relational(relational) => {
                protocol::ClassMapping::Relational(protocol::RelationalClassMapping {
                    id,
                    class,
                    root,
                    distinct: relational.distinct,
                    main_table: relational
                        .main_table
                        .as_ref()
                        .map(|table| self.table_pointer(table)),
                    primary_key: relational
                        .primary_key
                        .iter()
                        .map(|operation| self.relational_operation(operation))
                        .collect(),
                    property_mappings: self.property_mappings(
                        path,
                        mapping,
                        &relational.property_mappings,
                    )?,
                })
            }
            SetImplementationKind::AggregationAware(aware) => {
                let mut aggregates = Vec::with_capacity(aware.aggregates.len());
                for aggregate in &aware.aggregates {
                    let specification = &aggregate.specification;
                    aggregates.push(protocol::AggregateSetImplementation {
                        index: aggregate.index,
                        aggregate_specification: protocol::AggregationSpecification {
                            can_aggregate: specification.can_aggregate,
                            group_by_functions: specification.group_by_functions.clone(),
                            aggregate_values: specification
                                .aggregate_values
                                .iter()
                                .map(|value| protocol::AggregateValue {
                                    map_fn: value.map_fn.clone(),
                                    aggregate_fn: value.agg_fn.clone(),
                                })
                                .collect(),
                        },
                        set_implementation: self.class_mapping(
                            path,
                            mapping,
                            aggregate.set_implementation,
                        )?,
                    });
                }
                protocol::ClassMapping::AggregationAware(protocol::AggregationAwareClassMapping {
                    id,
                    class,
                    root,
                    main_set_implementation: Box::new(self.class_mapping(path, mapping, aware.main)?),
                    aggregate_set_implementations: aggregates,
                    property_mappings: self.property_mappings(path, mapping, &aware.property_mappings)?,
                })
            }
            SetImplementationKind::Operation(operation) => {
                protocol::ClassMapping::Operation(protocol::OperationClassMapping {
                    id,
                    class,
                    root,
                    operation: operation.operation.as_str().to_string(),
                    parameters: operation
                        .parameters
                        .iter()
                        .map(|parameter| parameter.id.clone())
                        .collect(),
                })
            }
            SetImplementationKind::Embedded(_) => {
                return Err(SerializeError::InvalidMapping {
                    path: path.to_string(),
                    reason: format!(
                        "embedded set implementation `{}` used as a class mapping",
                        set_implementation.id
                    ),
                });
            }
            SetImplementationKind::Extension(extension) => {
                return Err(SerializeError::InvalidMapping {
                    path: path.to_string(),
                    reason: format!(
                        "`{}` class mapping `{}` nested in an aggregation-aware class mapping",
                        extension.kind(),
                        set_implementation.id
                    ),
                });
            }
        };
        Ok(class_mapping)
    }

    fn property_mappings(
        &self,
        path: &str,
        mapping: &Mapping,
        property_mappings: &[PropertyMapping],
    ) -> Result<Vec<protocol::PropertyMapping>> {
        property_mappings
            .iter()
            .map(|property_mapping| self.property_mapping(path, mapping, property_mapping))
            .collect()
    }

    fn property_mapping(
        &self,
        path: &str,
        mapping: &Mapping,
        property_mapping: &PropertyMapping,
    ) -> Result<protocol::PropertyMapping> {
        let property = protocol::PropertyPointer {
            class: self.path(&property_mapping.property.owner),
            property: property_mapping.property.property.clone(),
        };

        let document = match &property_mapping.kind {
            PropertyMappingKind::Pure {
                transform,
                explode_property,
            } => protocol::PropertyMapping::Pure(protocol::PurePropertyMapping {
                property,
                source: property_mapping.source.clone(),
                target: property_mapping.target.clone(),
                enum_mapping_id: property_mapping.enumeration_mapping.clone(),
                transform: transform.clone(),
                explode_property: *explode_property,
            }),
            PropertyMappingKind::Relational { operation } => {
                protocol::PropertyMapping::Relational(protocol::RelationalPropertyMapping {
                    property,
                    source: property_mapping.source.clone(),
                    target: property_mapping.target.clone(),
                    enum_mapping_id: property_mapping.enumeration_mapping.clone(),
                    relational_operation: self.relational_operation(operation),
                })
            }
            PropertyMappingKind::Embedded {
                set_implementation: index,
            } => {
                let embedded = set_implementation(path, mapping, *index)?;
                let SetImplementationKind::Embedded(body) = &embedded.kind else {
                    return Err(SerializeError::InvalidMapping {
                        path: path.to_string(),
                        reason: format!(
                            "property `{}` embeds the non-embedded set implementation `{}`",
                            property.property, embedded.id
                        ),
                    });
                };
                protocol::PropertyMapping::Embedded(protocol::EmbeddedPropertyMapping {
                    property,
                    source: property_mapping.source.clone(),
                    id: embedded.id.value().to_string(),
                    class: self.path(&embedded.class),
                    root: embedded.root,
                    property_mappings: self.property_mappings(path, mapping, &body.property_mappings)?,
                })
            }
        };
        Ok(document)
    }

    fn enumeration_mapping(&self, enumeration_mapping: &EnumerationMapping) -> protocol::EnumerationMapping {
        protocol::EnumerationMapping {
            id: enumeration_mapping.id.written().map(str::to_string),
            enumeration: self.path(&enumeration_mapping.enumeration),
            enum_value_mappings: enumeration_mapping
                .values
                .iter()
                .map(|value| protocol::EnumValueMapping {
                    enum_value: value.enum_value.clone(),
                    source_values: value
                        .source_values
                        .iter()
                        .map(|source| match source {
                            SourceValue::String(value) => protocol::SourceValue::String {
                                value: value.clone(),
                            },
                            SourceValue::Integer(value) => {
                                protocol::SourceValue::Integer { value: *value }
                            }
                            SourceValue::EnumValue { enumeration, value } => {
                                protocol::SourceValue::EnumValue {
                                    enumeration: self.path(enumeration),
                                    value: value.clone(),
                                }
                            }
                        })
                        .collect(),
                })
                .collect(),
        }
    }

    // =========================================================================
    // Connections, runtimes and services
    // =========================================================================

    fn connection_store(&self, store: &ConnectionStore) -> String {
        match store {
            ConnectionStore::Model => ConnectionStore::MODEL_STORE.to_string(),
            ConnectionStore::Store(store) => self.path(store),
        }
    }

    fn connection(&self, connection: &Connection) -> protocol::ConnectionValue {
        protocol::ConnectionValue {
            connection_type: connection.connection_type.clone(),
            element: connection
                .store
                .as_ref()
                .map(|store| self.connection_store(store)),
            specification: connection.specification.clone(),
        }
    }

    fn engine_runtime(&self, path: &str, runtime: &EngineRuntime) -> Result<protocol::EngineRuntime> {
        let mappings = runtime
            .mappings
            .iter()
            .map(|mapping| protocol::ElementPointer::new(protocol::ElementPointer::MAPPING, self.path(mapping)))
            .collect();

        let mut connections = Vec::with_capacity(runtime.connections.len());
        for group in &runtime.connections {
            let mut store_connections = Vec::with_capacity(group.connections.len());
            for identified in &group.connections {
                let connection = match &identified.connection {
                    ConnectionValue::Pointer(pointer) => {
                        to_value(path, &protocol::ConnectionPointer::new(self.path(pointer)))?
                    }
                    ConnectionValue::Embedded(connection) => {
                        to_value(path, &self.connection(connection))?
                    }
                };
                store_connections.push(protocol::IdentifiedConnection {
                    id: identified.id.clone(),
                    connection,
                });
            }
            connections.push(protocol::StoreConnections {
                store: protocol::ElementPointer::new(
                    protocol::ElementPointer::STORE,
                    self.connection_store(&group.store),
                ),
                store_connections,
            });
        }

        Ok(protocol::EngineRuntime::new(mappings, connections))
    }
}

impl ElementVisitor for ProtocolSerializer<'_> {
    type Output = Result<Option<Entity>>;

    fn visit_package(&mut self, _element: &Element, _package: &Package) -> Self::Output {
        Ok(None)
    }

    fn visit_primitive_type(&mut self, _element: &Element, _primitive: &PrimitiveType) -> Self::Output {
        Ok(None)
    }

    fn visit_profile(&mut self, element: &Element, profile: &Profile) -> Self::Output {
        let document = protocol::ProfileDocument {
            stereotypes: profile.stereotypes.clone(),
            tags: profile.tags.clone(),
        };
        self.core_entity(element, CoreClassifier::Profile, &document)
    }

    fn visit_enumeration(&mut self, element: &Element, enumeration: &Enumeration) -> Self::Output {
        let document = protocol::EnumerationDocument {
            values: enumeration
                .values
                .iter()
                .map(|value| protocol::EnumValue {
                    value: value.name.clone(),
                    stereotypes: self.stereotypes(&value.stereotypes),
                    tagged_values: self.tagged_values(&value.tagged_values),
                })
                .collect(),
            stereotypes: self.stereotypes(&enumeration.stereotypes),
            tagged_values: self.tagged_values(&enumeration.tagged_values),
        };
        self.core_entity(element, CoreClassifier::Enumeration, &document)
    }

    fn visit_class(&mut self, element: &Element, class: &Class) -> Self::Output {
        let document = protocol::ClassDocument {
            super_types: class
                .super_types
                .iter()
                .map(|super_type| self.path(super_type))
                .collect(),
            properties: class
                .properties
                .iter()
                .map(|property| self.property(property))
                .collect(),
            qualified_properties: class
                .derived_properties
                .iter()
                .map(|property| self.qualified_property(property))
                .collect(),
            constraints: class
                .constraints
                .iter()
                .map(|constraint| protocol::Constraint {
                    name: constraint.name.clone(),
                    function_definition: constraint.function_definition.clone(),
                })
                .collect(),
            stereotypes: self.stereotypes(&class.stereotypes),
            tagged_values: self.tagged_values(&class.tagged_values),
        };
        self.core_entity(element, CoreClassifier::Class, &document)
    }

    fn visit_association(&mut self, element: &Element, association: &Association) -> Self::Output {
        let document = protocol::AssociationDocument {
            properties: association
                .properties
                .iter()
                .map(|property| self.property(property))
                .collect(),
            qualified_properties: association
                .derived_properties
                .iter()
                .map(|property| self.qualified_property(property))
                .collect(),
            stereotypes: self.stereotypes(&association.stereotypes),
            tagged_values: self.tagged_values(&association.tagged_values),
        };
        self.core_entity(element, CoreClassifier::Association, &document)
    }

    fn visit_function(&mut self, element: &Element, function: &ConcreteFunctionDefinition) -> Self::Output {
        let document = protocol::FunctionDocument {
            parameters: function
                .parameters
                .iter()
                .map(|parameter| protocol::Parameter {
                    kind: parameter.kind.clone(),
                    name: parameter.name.clone(),
                    class: self.path(&parameter.parameter_type),
                    multiplicity: multiplicity(parameter.multiplicity),
                })
                .collect(),
            return_type: self.path(&function.return_type),
            return_multiplicity: multiplicity(function.return_multiplicity),
            body: function.body.clone(),
            stereotypes: self.stereotypes(&function.stereotypes),
            tagged_values: self.tagged_values(&function.tagged_values),
        };
        self.core_entity(element, CoreClassifier::Function, &document)
    }

    fn visit_database(&mut self, element: &Element, database: &Database) -> Self::Output {
        let path = element.path().as_string();
        let mut schemas = Vec::with_capacity(database.schemas.len());
        for schema in &database.schemas {
            let mut tables = Vec::with_capacity(schema.tables.len());
            for table in &schema.tables {
                let mut columns = Vec::with_capacity(table.columns.len());
                for column in &table.columns {
                    let Some(column_type) = protocol::ColumnType::from_data_type(&column.data_type)
                    else {
                        return Err(SerializeError::InvalidColumnType {
                            path,
                            data_type: column.data_type.clone(),
                        });
                    };
                    columns.push(protocol::Column {
                        name: column.name.clone(),
                        column_type,
                        nullable: column.nullable,
                    });
                }
                tables.push(protocol::Table {
                    name: table.name.clone(),
                    columns,
                    primary_key: table.primary_key.clone(),
                });
            }
            schemas.push(protocol::Schema {
                name: schema.name.clone(),
                tables,
            });
        }

        let document = protocol::DatabaseDocument {
            included_stores: database
                .includes
                .iter()
                .map(|include| self.path(include))
                .collect(),
            schemas,
            joins: database
                .joins
                .iter()
                .map(|join| protocol::Join {
                    name: join.name.clone(),
                    operation: self.relational_operation(&join.operation),
                })
                .collect(),
        };
        self.core_entity(element, CoreClassifier::Database, &document)
    }

    fn visit_mapping(&mut self, element: &Element, mapping: &Mapping) -> Self::Output {
        let path = element.path().as_string();
        let class_mappings = mapping
            .class_mapping_indices()
            .iter()
            .map(|index| self.class_mapping_value(&path, mapping, *index))
            .collect::<Result<Vec<Value>>>()?;

        let document = protocol::MappingDocument {
            included_mappings: mapping
                .includes
                .iter()
                .map(|include| protocol::MappingInclude::new(self.path(include)))
                .collect(),
            class_mappings,
            enumeration_mappings: mapping
                .enumeration_mappings
                .iter()
                .map(|enumeration_mapping| self.enumeration_mapping(enumeration_mapping))
                .collect(),
        };
        self.core_entity(element, CoreClassifier::Mapping, &document)
    }

    fn visit_connection(&mut self, element: &Element, connection: &PackageableConnection) -> Self::Output {
        let document = protocol::ConnectionDocument {
            connection_value: self.connection(&connection.connection),
        };
        self.core_entity(element, CoreClassifier::Connection, &document)
    }

    fn visit_runtime(&mut self, element: &Element, runtime: &PackageableRuntime) -> Self::Output {
        let document = protocol::RuntimeDocument {
            runtime_value: self.engine_runtime(&element.path().as_string(), &runtime.runtime)?,
        };
        self.core_entity(element, CoreClassifier::Runtime, &document)
    }

    fn visit_service(&mut self, element: &Element, service: &Service) -> Self::Output {
        let path = element.path().as_string();
        let execution = match &service.execution {
            Some(execution) => {
                let runtime = match &execution.runtime {
                    RuntimeValue::Pointer(pointer) => {
                        to_value(&path, &protocol::RuntimePointer::new(self.path(pointer)))?
                    }
                    RuntimeValue::Embedded(runtime) => {
                        to_value(&path, &self.engine_runtime(&path, runtime)?)?
                    }
                };
                Some(protocol::PureSingleExecution::new(
                    execution.func.clone(),
                    self.path(&execution.mapping),
                    runtime,
                ))
            }
            None => None,
        };

        let document = protocol::ServiceDocument {
            pattern: service.pattern.clone(),
            documentation: service.documentation.clone(),
            owners: service.owners.clone(),
            auto_activate_updates: service.auto_activate_updates,
            execution,
            stereotypes: self.stereotypes(&service.stereotypes),
            tagged_values: self.tagged_values(&service.tagged_values),
        };
        self.core_entity(element, CoreClassifier::Service, &document)
    }

    fn visit_extension(&mut self, element: &Element, extension: &dyn ExtensionElement) -> Self::Output {
        let path = element.path().as_string();
        let kind = extension.kind();
        let Some(plugin) = self.graph.registry().element_kind(kind) else {
            return Err(SerializeError::UnknownElementKind {
                path,
                kind: kind.as_string(),
            });
        };

        let document = plugin
            .serialize(extension, self.graph)
            .map_err(|source| SerializeError::Json {
                path: path.clone(),
                source,
            })?;
        self.entity(element, plugin.classifier_path(), plugin.protocol_type(), document)
    }
}

fn multiplicity(multiplicity: Multiplicity) -> protocol::Multiplicity {
    protocol::Multiplicity {
        lower_bound: multiplicity.lower_bound,
        upper_bound: multiplicity.upper_bound,
    }
}

fn set_implementation<'m>(
    path: &str,
    mapping: &'m Mapping,
    index: SetImplementationIndex,
) -> Result<&'m meridian_core::mapping::SetImplementation> {
    mapping
        .set_implementation(index)
        .ok_or_else(|| SerializeError::InvalidMapping {
            path: path.to_string(),
            reason: format!("set implementation {index:?} is missing from the arena"),
        })
}

fn to_value(path: &str, document: &impl Serialize) -> Result<Value> {
    serde_json::to_value(document).map_err(|source| SerializeError::Json {
        path: path.to_string(),
        source,
    })
}
