//! Property mappings.

use std::cell::Cell;

use serde_json::Value;

use crate::{
    element::{PropertyOwner, RelationalOperation},
    hash::{HashBuilder, HashCode, HashStructure, Hashable},
    identifier::Id,
    mapping::{SetImplementationHandle, SetImplementationIndex},
    reference::{Reference, Resolvable},
};

/// Pointer to a property of a class or association.
#[derive(Debug, Clone)]
pub struct PropertyPointer {
    pub owner: Reference<dyn PropertyOwner>,
    pub property: String,
}

impl PropertyPointer {
    pub fn new(owner: impl Into<Id>, property: impl Into<String>) -> Self {
        Self {
            owner: Reference::new(owner),
            property: property.into(),
        }
    }
}

impl Hashable for PropertyPointer {
    fn hash_code(&self) -> HashCode {
        let mut builder = HashBuilder::new(HashStructure::PropertyMapping);
        builder
            .str(&self.owner.path().as_string())
            .str(&self.property);
        builder.finish()
    }
}

/// How the value of a mapped property is produced.
#[derive(Debug)]
pub enum PropertyMappingKind {
    /// A lambda over the source instance.
    Pure {
        transform: Value,
        explode_property: Option<bool>,
    },
    Relational { operation: RelationalOperation },
    /// Inline set implementation, stored in the owning mapping's arena.
    Embedded {
        set_implementation: SetImplementationIndex,
    },
}

/// Maps one property of a set implementation.
///
/// `source` and `target` are set implementation ids as written. The target
/// set implementation handle is bound by mapping wiring.
#[derive(Debug)]
pub struct PropertyMapping {
    pub property: PropertyPointer,
    pub source: Option<String>,
    pub target: Option<String>,
    pub enumeration_mapping: Option<String>,
    pub kind: PropertyMappingKind,
    target_set_implementation: Cell<Option<SetImplementationHandle>>,
}

impl PropertyMapping {
    pub fn new(property: PropertyPointer, kind: PropertyMappingKind) -> Self {
        Self {
            property,
            source: None,
            target: None,
            enumeration_mapping: None,
            kind,
            target_set_implementation: Cell::new(None),
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn with_enumeration_mapping(mut self, id: impl Into<String>) -> Self {
        self.enumeration_mapping = Some(id.into());
        self
    }

    /// Set implementation producing the property values, once wired.
    pub fn target_set_implementation(&self) -> Option<SetImplementationHandle> {
        self.target_set_implementation.get()
    }

    pub(crate) fn bind_target(&self, handle: SetImplementationHandle) {
        self.target_set_implementation.set(Some(handle));
    }

    pub(crate) fn unbind_target(&self) {
        self.target_set_implementation.set(None);
    }

    pub(crate) fn references(&self) -> Vec<&dyn Resolvable> {
        let mut references: Vec<&dyn Resolvable> = vec![&self.property.owner];
        if let PropertyMappingKind::Relational { operation } = &self.kind {
            references.extend(operation.references());
        }
        references
    }
}

/// Hash of the property mapping itself. Embedded set implementations are
/// folded in by the owning mapping.
impl Hashable for PropertyMapping {
    fn hash_code(&self) -> HashCode {
        let mut builder = HashBuilder::new(HashStructure::PropertyMapping);
        builder
            .hashable(&self.property)
            .opt_str(self.source.as_deref())
            .opt_str(self.target.as_deref())
            .opt_str(self.enumeration_mapping.as_deref());
        match &self.kind {
            PropertyMappingKind::Pure {
                transform,
                explode_property,
            } => {
                builder
                    .str("pure")
                    .json(transform)
                    .opt_str(explode_property.map(|explode| if explode { "true" } else { "false" }));
            }
            PropertyMappingKind::Relational { operation } => {
                builder.str("relational").hashable(operation);
            }
            PropertyMappingKind::Embedded { .. } => {
                builder.str("embedded");
            }
        }
        builder.finish()
    }
}
