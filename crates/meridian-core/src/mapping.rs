//! Mappings between stores and the class model.
//!
//! # Overview
//!
//! A [`Mapping`] owns the set implementations (class mappings) it declares in
//! a per-mapping arena addressed by [`SetImplementationIndex`]. Indices are
//! stable for the lifetime of the mapping, so nested set implementations
//! (embedded set implementations and the main/aggregate set implementations
//! of aggregation-aware class mappings) can be addressed both from their
//! owner and from flat id-based lookups. Across mappings a set implementation
//! is identified by a [`SetImplementationHandle`].
//!
//! The resolution engine (flattening, id and class lookups, wiring of
//! property-mapping targets) is implemented on [`Graph`](crate::Graph) in the
//! `resolve` submodule because it reads across included mappings.

mod enumeration_mapping;
mod property_mapping;
mod resolve;
mod set_implementation;

pub use enumeration_mapping::{EnumValueMapping, EnumerationMapping, SourceValue};
pub use property_mapping::{PropertyMapping, PropertyMappingKind, PropertyPointer};
pub use set_implementation::{
    AggregateSetImplementation, AggregateValue, AggregationAwareSetImplementation,
    AggregationSpecification, EmbeddedSetImplementation, OperationSetImplementation,
    OperationType, PureInstanceSetImplementation, RelationalSetImplementation, SetImplementation,
    SetImplementationContainer, SetImplementationExtension, SetImplementationKind,
};

use std::fmt;

use crate::{
    element::ElementId,
    hash::{HashBuilder, HashCode, HashStructure, Hashable},
    identifier::Id,
    reference::{Reference, Resolvable},
};

/// Stable index of a set implementation in its mapping's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SetImplementationIndex(u32);

impl SetImplementationIndex {
    fn new(index: usize) -> Self {
        Self(u32::try_from(index).expect("set implementation arena exceeds u32::MAX entries"))
    }

    fn index(self) -> usize {
        self.0 as usize
    }
}

/// Graph-wide identity of a set implementation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SetImplementationHandle {
    mapping: ElementId,
    index: SetImplementationIndex,
}

impl SetImplementationHandle {
    pub fn new(mapping: ElementId, index: SetImplementationIndex) -> Self {
        Self { mapping, index }
    }

    /// The mapping owning the set implementation.
    pub fn mapping(&self) -> ElementId {
        self.mapping
    }

    pub fn index(&self) -> SetImplementationIndex {
        self.index
    }
}

/// Graph-wide identity of an enumeration mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EnumerationMappingHandle {
    mapping: ElementId,
    index: usize,
}

impl EnumerationMappingHandle {
    pub fn new(mapping: ElementId, index: usize) -> Self {
        Self { mapping, index }
    }

    pub fn mapping(&self) -> ElementId {
        self.mapping
    }

    pub fn index(&self) -> usize {
        self.index
    }
}

/// Id of a mapping element, either written explicitly or inferred from the
/// path of the mapped class or enumeration.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MappingElementId {
    value: String,
    inferred: bool,
}

impl MappingElementId {
    pub fn explicit(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            inferred: false,
        }
    }

    /// Infers the id from an element path (`model::Person` → `model_Person`).
    pub fn inferred(path: Id) -> Self {
        Self {
            value: path.to_mapping_element_id(),
            inferred: true,
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn is_inferred(&self) -> bool {
        self.inferred
    }

    /// Returns the id as it should be written back, `None` when inferred.
    pub fn written(&self) -> Option<&str> {
        (!self.inferred).then_some(self.value.as_str())
    }
}

impl fmt::Display for MappingElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

/// A mapping: class mappings, enumeration mappings and included mappings.
#[derive(Debug, Default)]
pub struct Mapping {
    pub includes: Vec<Reference<Mapping>>,
    pub enumeration_mappings: Vec<EnumerationMapping>,
    set_implementations: Vec<SetImplementation>,
    class_mappings: Vec<SetImplementationIndex>,
}

impl Mapping {
    /// Adds a top-level class mapping.
    pub fn add_class_mapping(&mut self, set_implementation: SetImplementation) -> SetImplementationIndex {
        let index = self.add_set_implementation(set_implementation);
        self.class_mappings.push(index);
        index
    }

    /// Adds a nested set implementation to the arena without listing it as a
    /// top-level class mapping.
    pub fn add_set_implementation(
        &mut self,
        set_implementation: SetImplementation,
    ) -> SetImplementationIndex {
        let index = SetImplementationIndex::new(self.set_implementations.len());
        self.set_implementations.push(set_implementation);
        index
    }

    /// Removes a top-level class mapping. Its arena slot stays allocated so
    /// that other indices remain valid.
    pub fn remove_class_mapping(&mut self, index: SetImplementationIndex) -> bool {
        let before = self.class_mappings.len();
        self.class_mappings.retain(|candidate| *candidate != index);
        before != self.class_mappings.len()
    }

    pub fn set_implementation(&self, index: SetImplementationIndex) -> Option<&SetImplementation> {
        self.set_implementations.get(index.index())
    }

    pub fn set_implementation_mut(
        &mut self,
        index: SetImplementationIndex,
    ) -> Option<&mut SetImplementation> {
        self.set_implementations.get_mut(index.index())
    }

    /// Top-level class mappings in declaration order.
    pub fn class_mapping_indices(&self) -> &[SetImplementationIndex] {
        &self.class_mappings
    }

    /// Top-level class mappings in declaration order.
    pub fn class_mappings(&self) -> impl Iterator<Item = (SetImplementationIndex, &SetImplementation)> {
        self.class_mappings
            .iter()
            .filter_map(|index| Some((*index, self.set_implementation(*index)?)))
    }

    /// Top-level class mappings followed by the embedded set implementations
    /// reachable from them, depth-first.
    pub fn all_own_class_mappings(&self) -> Vec<SetImplementationIndex> {
        let mut result = self.class_mappings.clone();
        for index in &self.class_mappings {
            self.collect_embedded(*index, &mut result);
        }
        result
    }

    fn collect_embedded(&self, index: SetImplementationIndex, result: &mut Vec<SetImplementationIndex>) {
        let Some(set_implementation) = self.set_implementation(index) else {
            return;
        };
        for property_mapping in set_implementation.property_mappings() {
            if let PropertyMappingKind::Embedded { set_implementation } = &property_mapping.kind {
                if !result.contains(set_implementation) {
                    result.push(*set_implementation);
                    self.collect_embedded(*set_implementation, result);
                }
            }
        }
    }

    /// Main set implementations of the aggregation-aware class mappings,
    /// followed by all of their aggregate set implementations.
    pub fn aggregation_extracted_class_mappings(&self) -> Vec<SetImplementationIndex> {
        let aggregation_aware: Vec<&AggregationAwareSetImplementation> = self
            .class_mappings()
            .filter_map(|(_, set_implementation)| match &set_implementation.kind {
                SetImplementationKind::AggregationAware(aggregation_aware) => {
                    Some(aggregation_aware)
                }
                _ => None,
            })
            .collect();

        let mains = aggregation_aware.iter().map(|aware| aware.main);
        let aggregates = aggregation_aware
            .iter()
            .flat_map(|aware| aware.aggregates.iter().map(|aggregate| aggregate.set_implementation));
        mains.chain(aggregates).collect()
    }

    /// Every set implementation in the arena, including detached ones.
    pub fn set_implementations(&self) -> impl Iterator<Item = (SetImplementationIndex, &SetImplementation)> {
        self.set_implementations
            .iter()
            .enumerate()
            .map(|(index, set_implementation)| (SetImplementationIndex::new(index), set_implementation))
    }

    pub(crate) fn references(&self) -> Vec<&dyn Resolvable> {
        let mut references: Vec<&dyn Resolvable> = self
            .includes
            .iter()
            .map(|include| include as &dyn Resolvable)
            .collect();
        for set_implementation in &self.set_implementations {
            references.extend(set_implementation.references());
        }
        for enumeration_mapping in &self.enumeration_mappings {
            references.extend(enumeration_mapping.references());
        }
        references
    }

    pub(crate) fn prune_dead_references(&mut self, is_dead: &dyn Fn(ElementId) -> bool) -> usize {
        let before =
            self.includes.len() + self.class_mappings.len() + self.enumeration_mappings.len();

        self.includes
            .retain(|include| !include.target().is_some_and(is_dead));

        let set_implementations = &self.set_implementations;
        self.class_mappings.retain(|index| {
            set_implementations
                .get(index.index())
                .is_some_and(|set_implementation| {
                    !set_implementation.class.target().is_some_and(is_dead)
                })
        });

        self.enumeration_mappings.retain(|enumeration_mapping| {
            !enumeration_mapping.enumeration.target().is_some_and(is_dead)
        });

        before - self.includes.len() - self.class_mappings.len() - self.enumeration_mappings.len()
    }

    /// Drops the handles bound by mapping wiring.
    pub(crate) fn unbind_set_implementations(&self) {
        for set_implementation in &self.set_implementations {
            for property_mapping in set_implementation.property_mappings() {
                property_mapping.unbind_target();
            }
            if let SetImplementationKind::Operation(operation) = &set_implementation.kind {
                for parameter in &operation.parameters {
                    parameter.unbind();
                }
            }
        }
    }

    /// Structural hash of one set implementation, following nested indices.
    pub fn set_implementation_hash(&self, index: SetImplementationIndex) -> HashCode {
        let mut builder = HashBuilder::new(HashStructure::SetImplementation);
        let Some(set_implementation) = self.set_implementation(index) else {
            builder.str("<missing>");
            return builder.finish();
        };

        builder
            .opt_str(set_implementation.id.written())
            .str(&set_implementation.class.path().as_string())
            .bool(set_implementation.root);

        match &set_implementation.kind {
            SetImplementationKind::PureInstance(pure) => {
                builder
                    .str("pureInstance")
                    .opt_str(pure.src_class.as_ref().map(|src| src.path().as_string()).as_deref());
                match &pure.filter {
                    Some(filter) => builder.bool(true).json(filter),
                    None => builder.bool(false),
                };
                self.hash_property_mappings(&mut builder, &pure.property_mappings);
            }
            SetImplementationKind::Relational(relational) => {
                builder
                    .str("relational")
                    .bool(relational.distinct)
                    .opt_hashable(relational.main_table.as_ref())
                    .list(&relational.primary_key);
                self.hash_property_mappings(&mut builder, &relational.property_mappings);
            }
            SetImplementationKind::Embedded(embedded) => {
                builder.str("embedded");
                self.hash_property_mappings(&mut builder, &embedded.property_mappings);
            }
            SetImplementationKind::AggregationAware(aware) => {
                builder
                    .str("aggregationAware")
                    .code(self.set_implementation_hash(aware.main));
                for aggregate in &aware.aggregates {
                    builder
                        .u64(u64::from(aggregate.index))
                        .hashable(&aggregate.specification)
                        .code(self.set_implementation_hash(aggregate.set_implementation));
                }
                self.hash_property_mappings(&mut builder, &aware.property_mappings);
            }
            SetImplementationKind::Operation(operation) => {
                builder
                    .str("operation")
                    .str(operation.operation.as_str())
                    .strings(operation.parameters.iter().map(|parameter| parameter.id.as_str()));
            }
            SetImplementationKind::Extension(extension) => {
                builder.str(extension.kind()).code(extension.hash_code());
            }
        }
        builder.finish()
    }

    fn hash_property_mappings(&self, builder: &mut HashBuilder, property_mappings: &[PropertyMapping]) {
        let codes: Vec<HashCode> = property_mappings
            .iter()
            .map(|property_mapping| {
                let mut nested = HashBuilder::new(HashStructure::PropertyMapping);
                nested.code(property_mapping.hash_code());
                if let PropertyMappingKind::Embedded { set_implementation } = &property_mapping.kind {
                    nested.code(self.set_implementation_hash(*set_implementation));
                }
                nested.finish()
            })
            .collect();
        builder.codes(codes);
    }

    pub(crate) fn structural_hash(&self, path: &str) -> HashCode {
        let mut builder = HashBuilder::new(HashStructure::Mapping);
        builder
            .str(path)
            .list(&self.includes)
            .codes(
                self.class_mappings
                    .iter()
                    .map(|index| self.set_implementation_hash(*index)),
            )
            .list(&self.enumeration_mappings);
        builder.finish()
    }
}
