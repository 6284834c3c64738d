//! Set implementations (class mappings).

use std::{any::Any, cell::Cell, fmt};

use serde_json::Value;

use crate::{
    element::{Class, RelationalOperation, TablePointer},
    error::{GraphError, Result},
    hash::{HashBuilder, HashCode, HashStructure, Hashable},
    mapping::{MappingElementId, PropertyMapping, SetImplementationHandle, SetImplementationIndex},
    reference::{Reference, Resolvable},
};

/// A class mapping: how instances of one class are produced.
#[derive(Debug)]
pub struct SetImplementation {
    pub id: MappingElementId,
    pub class: Reference<Class>,
    /// Marks the canonical class mapping of the class within its mapping.
    pub root: bool,
    pub kind: SetImplementationKind,
}

impl SetImplementation {
    pub fn new(
        id: MappingElementId,
        class: Reference<Class>,
        root: bool,
        kind: SetImplementationKind,
    ) -> Self {
        Self {
            id,
            class,
            root,
            kind,
        }
    }

    /// Property mappings declared directly on this set implementation.
    pub fn property_mappings(&self) -> &[PropertyMapping] {
        match &self.kind {
            SetImplementationKind::PureInstance(pure) => &pure.property_mappings,
            SetImplementationKind::Relational(relational) => &relational.property_mappings,
            SetImplementationKind::Embedded(embedded) => &embedded.property_mappings,
            SetImplementationKind::AggregationAware(aware) => &aware.property_mappings,
            SetImplementationKind::Operation(_) => &[],
            SetImplementationKind::Extension(extension) => extension.property_mappings(),
        }
    }

    /// Finds the property mapping of `property`, optionally restricted to
    /// the one whose target set implementation id is `target`.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::PropertyMappingNotFound`] when no property
    /// mapping matches.
    pub fn find_property_mapping(&self, property: &str, target: Option<&str>) -> Result<&PropertyMapping> {
        self.property_mappings()
            .iter()
            .find(|property_mapping| {
                property_mapping.property.property == property
                    && target.is_none_or(|target| property_mapping.target.as_deref() == Some(target))
            })
            .ok_or_else(|| GraphError::PropertyMappingNotFound {
                property: property.to_string(),
                set_implementation: self.id.value().to_string(),
            })
    }

    pub(crate) fn references(&self) -> Vec<&dyn Resolvable> {
        let mut references: Vec<&dyn Resolvable> = vec![&self.class];
        match &self.kind {
            SetImplementationKind::PureInstance(pure) => {
                if let Some(src_class) = &pure.src_class {
                    references.push(src_class);
                }
            }
            SetImplementationKind::Relational(relational) => {
                if let Some(main_table) = &relational.main_table {
                    references.push(&main_table.database);
                }
                for operation in &relational.primary_key {
                    references.extend(operation.references());
                }
            }
            SetImplementationKind::Extension(extension) => {
                references.extend(extension.references());
            }
            SetImplementationKind::Embedded(_)
            | SetImplementationKind::AggregationAware(_)
            | SetImplementationKind::Operation(_) => {}
        }
        for property_mapping in self.property_mappings() {
            references.extend(property_mapping.references());
        }
        references
    }
}

/// Variant-specific content of a set implementation.
#[derive(Debug)]
pub enum SetImplementationKind {
    PureInstance(PureInstanceSetImplementation),
    Relational(RelationalSetImplementation),
    /// Owned by an embedded property mapping of another set implementation.
    Embedded(EmbeddedSetImplementation),
    AggregationAware(AggregationAwareSetImplementation),
    Operation(OperationSetImplementation),
    Extension(Box<dyn SetImplementationExtension>),
}

/// Maps a class from instances of another class (model-to-model).
#[derive(Debug, Default)]
pub struct PureInstanceSetImplementation {
    pub src_class: Option<Reference<Class>>,
    pub filter: Option<Value>,
    pub property_mappings: Vec<PropertyMapping>,
}

/// Maps a class from rows of a relational table.
#[derive(Debug, Default)]
pub struct RelationalSetImplementation {
    pub distinct: bool,
    pub main_table: Option<TablePointer>,
    pub primary_key: Vec<RelationalOperation>,
    pub property_mappings: Vec<PropertyMapping>,
}

#[derive(Debug, Default)]
pub struct EmbeddedSetImplementation {
    pub property_mappings: Vec<PropertyMapping>,
}

/// A class mapping with pre-aggregated alternatives.
///
/// The main set implementation and every aggregate set implementation live
/// in the owning mapping's arena.
#[derive(Debug)]
pub struct AggregationAwareSetImplementation {
    pub main: SetImplementationIndex,
    pub aggregates: Vec<AggregateSetImplementation>,
    pub property_mappings: Vec<PropertyMapping>,
}

#[derive(Debug)]
pub struct AggregateSetImplementation {
    pub index: u32,
    pub specification: AggregationSpecification,
    pub set_implementation: SetImplementationIndex,
}

/// Describes which queries an aggregate set implementation can answer.
#[derive(Debug, Clone, Default)]
pub struct AggregationSpecification {
    pub can_aggregate: bool,
    pub group_by_functions: Vec<Value>,
    pub aggregate_values: Vec<AggregateValue>,
}

#[derive(Debug, Clone)]
pub struct AggregateValue {
    pub map_fn: Value,
    pub agg_fn: Value,
}

impl Hashable for AggregationSpecification {
    fn hash_code(&self) -> HashCode {
        let mut builder = HashBuilder::new(HashStructure::AggregationSpecification);
        builder.bool(self.can_aggregate);
        for function in &self.group_by_functions {
            builder.json(function);
        }
        for value in &self.aggregate_values {
            builder.json(&value.map_fn).json(&value.agg_fn);
        }
        builder.finish()
    }
}

/// Combines other set implementations of the same class.
#[derive(Debug)]
pub struct OperationSetImplementation {
    pub operation: OperationType,
    pub parameters: Vec<SetImplementationContainer>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationType {
    StoreUnion,
    RouterUnion,
    Inheritance,
    Merge,
}

impl OperationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationType::StoreUnion => "STORE_UNION",
            OperationType::RouterUnion => "ROUTER_UNION",
            OperationType::Inheritance => "INHERITANCE",
            OperationType::Merge => "MERGE",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "STORE_UNION" => Some(OperationType::StoreUnion),
            "ROUTER_UNION" => Some(OperationType::RouterUnion),
            "INHERITANCE" => Some(OperationType::Inheritance),
            "MERGE" => Some(OperationType::Merge),
            _ => None,
        }
    }
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameter of an operation: a set implementation addressed by id, bound
/// to its handle during mapping wiring.
#[derive(Debug)]
pub struct SetImplementationContainer {
    pub id: String,
    target: Cell<Option<SetImplementationHandle>>,
}

impl SetImplementationContainer {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            target: Cell::new(None),
        }
    }

    pub fn target(&self) -> Option<SetImplementationHandle> {
        self.target.get()
    }

    pub(crate) fn bind(&self, handle: SetImplementationHandle) {
        self.target.set(Some(handle));
    }

    pub(crate) fn unbind(&self) {
        self.target.set(None);
    }
}

/// Plugin-contributed set implementation.
pub trait SetImplementationExtension: fmt::Debug + Any {
    /// Protocol `_type` of the class mapping.
    fn kind(&self) -> &str;

    fn hash_code(&self) -> HashCode;

    fn property_mappings(&self) -> &[PropertyMapping] {
        &[]
    }

    fn references(&self) -> Vec<&dyn Resolvable> {
        Vec::new()
    }

    fn as_any(&self) -> &dyn Any;
}
