//! Protocol documents: the serde form of entity content.
//!
//! Every core element kind has a document type here. Documents carry only
//! the kind-specific members; `_type`, `name` and `package` are checked and
//! written by the builder and the serializer.
//!
//! Optional members are read with `#[serde(default)]` and skipped on output
//! when they hold nothing. Boolean flags are always written. Building and
//! serializing a document is lossless up to [`canonical`](crate::canonical)
//! form.

mod domain;
mod mapping;
mod runtime;
mod store;

pub use domain::{
    AssociationDocument, ClassDocument, Constraint, EnumValue, EnumerationDocument,
    FunctionDocument, Multiplicity, Parameter, ProfileDocument, Property, QualifiedProperty,
    StereotypePointer, TagPointer, TaggedValue,
};
pub use mapping::{
    AggregateSetImplementation, AggregateValue, AggregationAwareClassMapping,
    AggregationSpecification, ClassMapping, ClassMappingHeader, EmbeddedPropertyMapping,
    EnumValueMapping, EnumerationMapping, MappingDocument, MappingInclude,
    OperationClassMapping, PropertyMapping, PropertyPointer, PurePropertyMapping,
    PureInstanceClassMapping, RelationalClassMapping, RelationalPropertyMapping, SourceValue,
};
pub use runtime::{
    ConnectionDocument, ConnectionPointer, ConnectionValue, ElementPointer, EngineRuntime,
    IdentifiedConnection, PureSingleExecution, RuntimeDocument, RuntimePointer, ServiceDocument,
    StoreConnections,
};
pub use store::{
    Column, ColumnType, DatabaseDocument, Join, JoinPointer, RelationalOperation, Schema, Table,
    TablePointer,
};
