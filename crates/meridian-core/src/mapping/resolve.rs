//! Mapping resolution: inclusion, id and class lookups, and wiring of
//! property-mapping targets.

use log::{debug, trace};

use crate::{
    element::{Class, ElementId, ElementKind},
    error::{GraphError, Result},
    graph::Graph,
    mapping::{
        EnumerationMapping, EnumerationMappingHandle, Mapping, PropertyMappingKind,
        SetImplementation, SetImplementationHandle, SetImplementationKind,
    },
};

impl Graph {
    fn mapping_body(&self, mapping: ElementId) -> Option<&Mapping> {
        self.element(mapping).downcast_ref::<Mapping>()
    }

    fn mapping_path(&self, mapping: ElementId) -> String {
        self.element(mapping).path().as_string()
    }

    /// Mappings included by `mapping`, transitively, depth-first in
    /// declaration order. Each mapping appears once and `mapping` itself is
    /// never part of the result, even when an include cycle leads back to it.
    pub fn included_mappings(&self, mapping: ElementId) -> Vec<ElementId> {
        let mut visited = vec![mapping];
        self.collect_includes(mapping, &mut visited);
        visited.remove(0);
        visited
    }

    fn collect_includes(&self, mapping: ElementId, visited: &mut Vec<ElementId>) {
        let Some(body) = self.mapping_body(mapping) else {
            return;
        };
        for include in &body.includes {
            let Some(target) = include.target() else {
                continue;
            };
            if visited.contains(&target) || self.element(target).is_deleted() {
                continue;
            }
            visited.push(target);
            self.collect_includes(target, visited);
        }
    }

    /// Returns the set implementation behind `handle`.
    pub fn set_implementation(&self, handle: SetImplementationHandle) -> Option<&SetImplementation> {
        self.mapping_body(handle.mapping())?
            .set_implementation(handle.index())
    }

    /// Top-level class mappings of `mapping` followed by their embedded set
    /// implementations.
    pub fn own_class_mappings(&self, mapping: ElementId) -> Vec<SetImplementationHandle> {
        self.mapping_body(mapping)
            .map(|body| {
                body.all_own_class_mappings()
                    .into_iter()
                    .map(|index| SetImplementationHandle::new(mapping, index))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Own class mappings of `mapping`, then those of every included
    /// mapping, without duplicates.
    pub fn all_class_mappings(&self, mapping: ElementId) -> Vec<SetImplementationHandle> {
        let mut result: Vec<SetImplementationHandle> = Vec::new();
        for source in std::iter::once(mapping).chain(self.included_mappings(mapping)) {
            for handle in self.own_class_mappings(source) {
                if !result.contains(&handle) {
                    result.push(handle);
                }
            }
        }
        result
    }

    /// Own class mappings plus the set implementations extracted from
    /// aggregation-aware class mappings, as searched by id.
    fn searchable_class_mappings(&self, mapping: ElementId) -> Vec<SetImplementationHandle> {
        let Some(body) = self.mapping_body(mapping) else {
            return Vec::new();
        };
        body.all_own_class_mappings()
            .into_iter()
            .chain(body.aggregation_extracted_class_mappings())
            .map(|index| SetImplementationHandle::new(mapping, index))
            .collect()
    }

    /// Finds a class mapping by id.
    ///
    /// The search covers the own and aggregation-extracted class mappings of
    /// `mapping`, then those of each included mapping in inclusion order.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::ClassMappingNotFound`] when no class mapping
    /// carries `id`.
    pub fn class_mapping_by_id(&self, mapping: ElementId, id: &str) -> Result<SetImplementationHandle> {
        std::iter::once(mapping)
            .chain(self.included_mappings(mapping))
            .flat_map(|source| self.searchable_class_mappings(source))
            .find(|handle| {
                self.set_implementation(*handle)
                    .is_some_and(|set_implementation| set_implementation.id.value() == id)
            })
            .ok_or_else(|| GraphError::ClassMappingNotFound {
                id: id.to_string(),
                mapping_path: self.mapping_path(mapping),
            })
    }

    /// Class mappings of `class` across `mapping` and its includes, in
    /// declaration order. The first one is the canonical one.
    pub fn class_mappings_by_class(&self, mapping: ElementId, class: ElementId) -> Vec<SetImplementationHandle> {
        self.filter_by_class(self.all_class_mappings(mapping), class)
    }

    /// Class mappings of `class` declared by `mapping` itself.
    pub fn own_class_mappings_by_class(&self, mapping: ElementId, class: ElementId) -> Vec<SetImplementationHandle> {
        self.filter_by_class(self.own_class_mappings(mapping), class)
    }

    fn filter_by_class(
        &self,
        handles: Vec<SetImplementationHandle>,
        class: ElementId,
    ) -> Vec<SetImplementationHandle> {
        handles
            .into_iter()
            .filter(|handle| {
                self.set_implementation(*handle)
                    .is_some_and(|set_implementation| set_implementation.class.points_to(class))
            })
            .collect()
    }

    /// Returns the enumeration mapping behind `handle`.
    pub fn enumeration_mapping(&self, handle: EnumerationMappingHandle) -> Option<&EnumerationMapping> {
        self.mapping_body(handle.mapping())?
            .enumeration_mappings
            .get(handle.index())
    }

    fn own_enumeration_mappings(&self, mapping: ElementId) -> Vec<EnumerationMappingHandle> {
        self.mapping_body(mapping)
            .map(|body| {
                (0..body.enumeration_mappings.len())
                    .map(|index| EnumerationMappingHandle::new(mapping, index))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Enumeration mappings of `mapping` and its includes.
    pub fn all_enumeration_mappings(&self, mapping: ElementId) -> Vec<EnumerationMappingHandle> {
        std::iter::once(mapping)
            .chain(self.included_mappings(mapping))
            .flat_map(|source| self.own_enumeration_mappings(source))
            .collect()
    }

    /// Enumeration mappings of `enumeration` declared by `mapping` itself.
    ///
    /// Included mappings are not searched.
    pub fn enumeration_mappings_by_enumeration(
        &self,
        mapping: ElementId,
        enumeration: ElementId,
    ) -> Vec<EnumerationMappingHandle> {
        self.own_enumeration_mappings(mapping)
            .into_iter()
            .filter(|handle| {
                self.enumeration_mapping(*handle)
                    .is_some_and(|enumeration_mapping| enumeration_mapping.enumeration.points_to(enumeration))
            })
            .collect()
    }

    /// Finds an enumeration mapping by id across `mapping` and its includes.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::EnumerationMappingNotFound`] when no enumeration
    /// mapping carries `id`.
    pub fn enumeration_mapping_by_id(&self, mapping: ElementId, id: &str) -> Result<EnumerationMappingHandle> {
        self.all_enumeration_mappings(mapping)
            .into_iter()
            .find(|handle| {
                self.enumeration_mapping(*handle)
                    .is_some_and(|enumeration_mapping| enumeration_mapping.id.value() == id)
            })
            .ok_or_else(|| GraphError::EnumerationMappingNotFound {
                id: id.to_string(),
                mapping_path: self.mapping_path(mapping),
            })
    }

    // =========================================================================
    // Wiring
    // =========================================================================

    /// Wires every live mapping. See [`Graph::wire_mapping`].
    ///
    /// # Errors
    ///
    /// Returns every wiring failure of every mapping.
    pub fn wire_mappings(&self) -> std::result::Result<(), Vec<GraphError>> {
        let mappings: Vec<ElementId> = self
            .elements_of_kind(ElementKind::Mapping)
            .map(|(id, _)| id)
            .collect();
        let errors: Vec<GraphError> = mappings
            .iter()
            .flat_map(|mapping| self.wire_mapping(*mapping))
            .collect();

        debug!(mappings = mappings.len(), failed = errors.len(); "Wired mappings");
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Binds the operation parameters and property-mapping targets of every
    /// set implementation of `mapping`.
    ///
    /// A property mapping whose property is typed by a class targets the
    /// class mapping named by its explicit target id, otherwise the root
    /// class mapping of that class, otherwise the first one. Embedded
    /// property mappings target their own embedded set implementation.
    ///
    /// References must be resolved beforehand; unbound references are
    /// skipped. Returns the failures, wiring continues past them.
    pub fn wire_mapping(&self, mapping: ElementId) -> Vec<GraphError> {
        let Some(body) = self.mapping_body(mapping) else {
            return Vec::new();
        };

        let mut errors = Vec::new();
        for (index, set_implementation) in body.set_implementations() {
            trace!(
                mapping:% = self.element(mapping).path(),
                set_implementation = set_implementation.id.value(),
                index = index.index();
                "Wiring set implementation"
            );

            if let SetImplementationKind::Operation(operation) = &set_implementation.kind {
                for parameter in &operation.parameters {
                    match self.class_mapping_by_id(mapping, &parameter.id) {
                        Ok(handle) => parameter.bind(handle),
                        Err(err) => errors.push(err),
                    }
                }
            }

            for property_mapping in set_implementation.property_mappings() {
                if let PropertyMappingKind::Embedded { set_implementation } = &property_mapping.kind {
                    property_mapping.bind_target(SetImplementationHandle::new(mapping, *set_implementation));
                    continue;
                }

                let Some(owner) = property_mapping.property.owner.target() else {
                    continue;
                };
                let property = match self.find_property(owner, &property_mapping.property.property) {
                    Ok(property) => property,
                    Err(err) => {
                        errors.push(err);
                        continue;
                    }
                };
                let Some(target_class) = property
                    .property_type
                    .target()
                    .filter(|target| self.element(*target).downcast_ref::<Class>().is_some())
                else {
                    continue;
                };

                match property_mapping.target.as_deref().filter(|target| !target.is_empty()) {
                    Some(target) => match self.class_mapping_by_id(mapping, target) {
                        Ok(handle) => property_mapping.bind_target(handle),
                        Err(err) => errors.push(err),
                    },
                    None => {
                        if let Some(handle) = self.default_class_mapping(mapping, target_class) {
                            property_mapping.bind_target(handle);
                        }
                    }
                }
            }
        }
        errors
    }

    /// The root class mapping of `class`, or the first one.
    fn default_class_mapping(&self, mapping: ElementId, class: ElementId) -> Option<SetImplementationHandle> {
        let candidates = self.class_mappings_by_class(mapping, class);
        candidates
            .iter()
            .copied()
            .find(|handle| {
                self.set_implementation(*handle)
                    .is_some_and(|set_implementation| set_implementation.root)
            })
            .or_else(|| candidates.first().copied())
    }
}
