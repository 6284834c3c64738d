//! The element model.
//!
//! Every declaration of the model graph is an [`Element`]: a name, an optional
//! owning package, lifecycle flags and a kind-specific [`ElementBody`]. Core
//! kinds are the variants of the body enum; kinds contributed by plugins live
//! behind the [`ElementBody::Extension`] arm.
//!
//! # Change tracking
//!
//! Elements carry a revision counter. Any mutable access to the body goes
//! through [`Element::body_mut`] or [`Element::edit`], which bump the counter.
//! The memoized structural hash is keyed by revision, so [`Element::hash`]
//! recomputes only after a mutation, and a frozen element whose revision moved
//! past its freeze point is reported as mutated.

mod domain;
mod extension;
mod runtime;
mod store;

pub use domain::{
    Annotated, Association, Class, ConcreteFunctionDefinition, Constraint, DerivedProperty,
    EnumValue, Enumeration, Multiplicity, Package, Parameter, PrimitiveType, Profile, Property,
    PropertyOwner, StereotypeReference, TagReference, TaggedValue, Type,
};
pub use extension::ExtensionElement;
pub use runtime::{
    Connection, ConnectionStore, ConnectionValue, EngineRuntime, IdentifiedConnection,
    PackageableConnection, PackageableRuntime, PureSingleExecution, RuntimeValue, Service,
    StoreConnections,
};
pub use store::{
    Column, Database, Join, JoinPointer, RelationalOperation, Schema, Store, Table, TablePointer,
};

use std::{cell::Cell, fmt};

use crate::{
    error::{GraphError, Result},
    hash::{HashBuilder, HashCode, HashStructure},
    identifier::Id,
    mapping::Mapping,
    reference::{ElementType, Resolvable},
};

/// Stable handle of an element inside its graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(u32);

impl ElementId {
    pub fn new(index: usize) -> Self {
        Self(u32::try_from(index).expect("element arena exceeds u32::MAX entries"))
    }

    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Kind tag of an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    Package,
    PrimitiveType,
    Profile,
    Enumeration,
    Class,
    Association,
    Function,
    Database,
    Mapping,
    Connection,
    Runtime,
    Service,
    /// A kind contributed by a plugin, identified by its tag.
    Extension(Id),
}

impl ElementKind {
    /// Returns `true` for kinds that are part of the core model.
    pub fn is_core(&self) -> bool {
        !matches!(self, ElementKind::Extension(_))
    }
}

impl fmt::Display for ElementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElementKind::Package => write!(f, "Package"),
            ElementKind::PrimitiveType => write!(f, "PrimitiveType"),
            ElementKind::Profile => write!(f, "Profile"),
            ElementKind::Enumeration => write!(f, "Enumeration"),
            ElementKind::Class => write!(f, "Class"),
            ElementKind::Association => write!(f, "Association"),
            ElementKind::Function => write!(f, "Function"),
            ElementKind::Database => write!(f, "Database"),
            ElementKind::Mapping => write!(f, "Mapping"),
            ElementKind::Connection => write!(f, "Connection"),
            ElementKind::Runtime => write!(f, "Runtime"),
            ElementKind::Service => write!(f, "Service"),
            ElementKind::Extension(tag) => write!(f, "{tag}"),
        }
    }
}

/// Kind-specific content of an element.
#[derive(Debug)]
pub enum ElementBody {
    Package(Package),
    PrimitiveType(PrimitiveType),
    Profile(Profile),
    Enumeration(Enumeration),
    Class(Class),
    Association(Association),
    Function(ConcreteFunctionDefinition),
    Database(Database),
    Mapping(Mapping),
    Connection(PackageableConnection),
    Runtime(PackageableRuntime),
    Service(Service),
    Extension(Box<dyn ExtensionElement>),
}

impl ElementBody {
    /// Returns the kind tag of this body.
    pub fn kind(&self) -> ElementKind {
        match self {
            ElementBody::Package(_) => ElementKind::Package,
            ElementBody::PrimitiveType(_) => ElementKind::PrimitiveType,
            ElementBody::Profile(_) => ElementKind::Profile,
            ElementBody::Enumeration(_) => ElementKind::Enumeration,
            ElementBody::Class(_) => ElementKind::Class,
            ElementBody::Association(_) => ElementKind::Association,
            ElementBody::Function(_) => ElementKind::Function,
            ElementBody::Database(_) => ElementKind::Database,
            ElementBody::Mapping(_) => ElementKind::Mapping,
            ElementBody::Connection(_) => ElementKind::Connection,
            ElementBody::Runtime(_) => ElementKind::Runtime,
            ElementBody::Service(_) => ElementKind::Service,
            ElementBody::Extension(extension) => ElementKind::Extension(extension.kind()),
        }
    }

    /// Computes the structural hash of this body stored at `path`.
    fn structural_hash(&self, path: &str) -> HashCode {
        match self {
            ElementBody::Package(_) => {
                let mut builder = HashBuilder::new(HashStructure::Package);
                builder.str(path);
                builder.finish()
            }
            ElementBody::PrimitiveType(_) => {
                let mut builder = HashBuilder::new(HashStructure::PrimitiveType);
                builder.str(path);
                builder.finish()
            }
            ElementBody::Profile(profile) => profile.structural_hash(path),
            ElementBody::Enumeration(enumeration) => enumeration.structural_hash(path),
            ElementBody::Class(class) => class.structural_hash(path),
            ElementBody::Association(association) => association.structural_hash(path),
            ElementBody::Function(function) => function.structural_hash(path),
            ElementBody::Database(database) => database.structural_hash(path),
            ElementBody::Mapping(mapping) => mapping.structural_hash(path),
            ElementBody::Connection(connection) => connection.structural_hash(path),
            ElementBody::Runtime(runtime) => runtime.structural_hash(path),
            ElementBody::Service(service) => service.structural_hash(path),
            ElementBody::Extension(extension) => extension.hash_code(path),
        }
    }

    /// Returns every reference held by this body.
    pub fn references(&self) -> Vec<&dyn Resolvable> {
        match self {
            ElementBody::Package(_) | ElementBody::PrimitiveType(_) | ElementBody::Profile(_) => {
                Vec::new()
            }
            ElementBody::Enumeration(enumeration) => enumeration.references(),
            ElementBody::Class(class) => class.references(),
            ElementBody::Association(association) => association.references(),
            ElementBody::Function(function) => function.references(),
            ElementBody::Database(database) => database.references(),
            ElementBody::Mapping(mapping) => mapping.references(),
            ElementBody::Connection(connection) => connection.connection.references(),
            ElementBody::Runtime(runtime) => runtime.runtime.references(),
            ElementBody::Service(service) => service.references(),
            ElementBody::Extension(extension) => extension.references(),
        }
    }

    /// Removes list entries whose reference points at a dead element.
    ///
    /// Returns the number of removed entries. Single-valued references are
    /// left in place; they surface through [`Graph::dead_references`].
    ///
    /// [`Graph::dead_references`]: crate::Graph::dead_references
    pub(crate) fn prune_dead_references(&mut self, is_dead: &dyn Fn(ElementId) -> bool) -> usize {
        match self {
            ElementBody::Class(class) => {
                let before = class.super_types.len();
                class
                    .super_types
                    .retain(|super_type| !super_type.target().is_some_and(is_dead));
                before - class.super_types.len()
            }
            ElementBody::Database(database) => {
                let before = database.includes.len();
                database
                    .includes
                    .retain(|include| !include.target().is_some_and(is_dead));
                before - database.includes.len()
            }
            ElementBody::Mapping(mapping) => mapping.prune_dead_references(is_dead),
            ElementBody::Runtime(runtime) => runtime.runtime.prune_dead_references(is_dead),
            ElementBody::Service(service) => match &mut service.execution {
                Some(execution) => match &mut execution.runtime {
                    RuntimeValue::Embedded(runtime) => runtime.prune_dead_references(is_dead),
                    RuntimeValue::Pointer(_) => 0,
                },
                None => 0,
            },
            _ => 0,
        }
    }
}

/// An element of the model graph.
#[derive(Debug)]
pub struct Element {
    name: String,
    path: Id,
    package: Option<ElementId>,
    deleted: bool,
    immutable: bool,
    disposed: bool,
    revision: u64,
    frozen_revision: u64,
    hash_cache: Cell<Option<(u64, HashCode)>>,
    body: ElementBody,
}

impl Element {
    /// Creates a detached element.
    ///
    /// The element receives its package and full path when it is added to a
    /// [`Graph`](crate::Graph).
    pub fn new(name: impl Into<String>, body: ElementBody) -> Self {
        let name = name.into();
        let path = Id::new(&name);
        Self {
            name,
            path,
            package: None,
            deleted: false,
            immutable: false,
            disposed: false,
            revision: 0,
            frozen_revision: 0,
            hash_cache: Cell::new(None),
            body,
        }
    }

    /// Returns the simple name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the full `::` separated path.
    pub fn path(&self) -> Id {
        self.path
    }

    /// Returns the owning package.
    pub fn package(&self) -> Option<ElementId> {
        self.package
    }

    /// Returns the kind tag.
    pub fn kind(&self) -> ElementKind {
        self.body.kind()
    }

    /// Returns the kind-specific content.
    pub fn body(&self) -> &ElementBody {
        &self.body
    }

    /// Returns the kind-specific content for mutation and bumps the revision.
    pub fn body_mut(&mut self) -> &mut ElementBody {
        self.touch();
        &mut self.body
    }

    /// Views the body as `T`.
    pub fn downcast_ref<T: ElementType + ?Sized>(&self) -> Option<&T> {
        T::cast(&self.body)
    }

    /// Views the body as `T` for mutation.
    ///
    /// The revision is bumped only when the element is a `T`.
    pub fn edit<T: ElementType + ?Sized>(&mut self) -> Option<&mut T> {
        T::cast(&self.body)?;
        self.touch();
        T::cast_mut(&mut self.body)
    }

    /// Views a plugin-contributed body as its concrete type.
    pub fn extension<T: ExtensionElement>(&self) -> Option<&T> {
        match &self.body {
            ElementBody::Extension(extension) => extension.as_any().downcast_ref::<T>(),
            _ => None,
        }
    }

    /// Views a plugin-contributed body as its concrete type for mutation.
    pub fn extension_mut<T: ExtensionElement>(&mut self) -> Option<&mut T> {
        self.extension::<T>()?;
        self.touch();
        match &mut self.body {
            ElementBody::Extension(extension) => extension.as_any_mut().downcast_mut::<T>(),
            _ => None,
        }
    }

    /// Returns `true` once the element has been deleted from its graph.
    pub fn is_deleted(&self) -> bool {
        self.deleted
    }

    /// Returns `true` once the element has been frozen.
    pub fn is_immutable(&self) -> bool {
        self.immutable
    }

    /// Returns `true` once the element has been disposed.
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Returns `true` for an element without name and package.
    pub fn is_stub(&self) -> bool {
        self.name.is_empty() && self.package.is_none()
    }

    /// Returns the mutation counter.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Marks the element read-only.
    ///
    /// Mutations are still possible afterwards; they are reported by the next
    /// call to [`Element::hash`].
    pub fn freeze(&mut self) {
        self.immutable = true;
        self.frozen_revision = self.revision;
    }

    /// Releases the memoized hash. Any later [`Element::hash`] call fails.
    pub fn dispose(&mut self) {
        self.disposed = true;
        self.hash_cache.set(None);
    }

    /// Returns the memoized structural hash, recomputing it after mutation.
    ///
    /// # Errors
    ///
    /// - [`GraphError::DisposedElementAccess`] once the element is disposed.
    /// - [`GraphError::ImmutableElementMutation`] when a frozen element has
    ///   been mutated since it was frozen.
    pub fn hash(&self) -> Result<HashCode> {
        if self.disposed {
            return Err(GraphError::DisposedElementAccess {
                path: self.path.as_string(),
            });
        }
        if self.immutable && self.revision != self.frozen_revision {
            return Err(GraphError::ImmutableElementMutation {
                path: self.path.as_string(),
            });
        }
        if let Some((revision, code)) = self.hash_cache.get() {
            if revision == self.revision {
                return Ok(code);
            }
        }

        let code = self.body.structural_hash(&self.path.as_string());
        self.hash_cache.set(Some((self.revision, code)));
        Ok(code)
    }

    pub(crate) fn touch(&mut self) {
        self.revision += 1;
    }

    pub(crate) fn attach(&mut self, package: Option<ElementId>, path: Id) {
        self.package = package;
        self.path = path;
    }

    pub(crate) fn rename(&mut self, name: String, path: Id) {
        self.name = name;
        self.path = path;
        self.touch();
    }

    pub(crate) fn relocate(&mut self, path: Id) {
        self.path = path;
        self.touch();
    }

    pub(crate) fn mark_deleted(&mut self) {
        self.deleted = true;
    }

    /// Package children are not part of the package hash; the graph updates
    /// them without bumping the revision.
    pub(crate) fn package_children_mut(&mut self) -> Option<&mut Vec<ElementId>> {
        match &mut self.body {
            ElementBody::Package(package) => Some(&mut package.children),
            _ => None,
        }
    }

    pub(crate) fn prune_dead_references(&mut self, is_dead: &dyn Fn(ElementId) -> bool) -> usize {
        let removed = self.body.prune_dead_references(is_dead);
        if removed > 0 {
            self.touch();
        }
        removed
    }
}

// =============================================================================
// Reference targets
// =============================================================================

macro_rules! element_type {
    ($ty:ty, $variant:ident, $label:literal) => {
        impl ElementType for $ty {
            fn kind_label() -> &'static str {
                $label
            }

            fn cast(body: &ElementBody) -> Option<&Self> {
                match body {
                    ElementBody::$variant(value) => Some(value),
                    _ => None,
                }
            }

            fn cast_mut(body: &mut ElementBody) -> Option<&mut Self> {
                match body {
                    ElementBody::$variant(value) => Some(value),
                    _ => None,
                }
            }
        }
    };
}

element_type!(Package, Package, "package");
element_type!(PrimitiveType, PrimitiveType, "primitive type");
element_type!(Profile, Profile, "profile");
element_type!(Enumeration, Enumeration, "enumeration");
element_type!(Class, Class, "class");
element_type!(Association, Association, "association");
element_type!(ConcreteFunctionDefinition, Function, "function");
element_type!(Database, Database, "database");
element_type!(Mapping, Mapping, "mapping");
element_type!(PackageableConnection, Connection, "connection");
element_type!(PackageableRuntime, Runtime, "runtime");
element_type!(Service, Service, "service");

impl ElementType for dyn Type {
    fn kind_label() -> &'static str {
        "type"
    }

    fn cast(body: &ElementBody) -> Option<&Self> {
        match body {
            ElementBody::Class(class) => Some(class),
            ElementBody::Enumeration(enumeration) => Some(enumeration),
            ElementBody::PrimitiveType(primitive) => Some(primitive),
            _ => None,
        }
    }

    fn cast_mut(body: &mut ElementBody) -> Option<&mut Self> {
        match body {
            ElementBody::Class(class) => Some(class),
            ElementBody::Enumeration(enumeration) => Some(enumeration),
            ElementBody::PrimitiveType(primitive) => Some(primitive),
            _ => None,
        }
    }
}

impl ElementType for dyn PropertyOwner {
    fn kind_label() -> &'static str {
        "class or association"
    }

    fn cast(body: &ElementBody) -> Option<&Self> {
        match body {
            ElementBody::Class(class) => Some(class),
            ElementBody::Association(association) => Some(association),
            _ => None,
        }
    }

    fn cast_mut(body: &mut ElementBody) -> Option<&mut Self> {
        match body {
            ElementBody::Class(class) => Some(class),
            ElementBody::Association(association) => Some(association),
            _ => None,
        }
    }
}

impl ElementType for dyn Store {
    fn kind_label() -> &'static str {
        "store"
    }

    fn cast(body: &ElementBody) -> Option<&Self> {
        match body {
            ElementBody::Database(database) => Some(database),
            ElementBody::Extension(extension) => extension.as_store(),
            _ => None,
        }
    }

    fn cast_mut(body: &mut ElementBody) -> Option<&mut Self> {
        match body {
            ElementBody::Database(database) => Some(database),
            ElementBody::Extension(extension) => extension.as_store_mut(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::Reference;

    fn person() -> Element {
        let mut element = Element::new("Person", ElementBody::Class(Class::default()));
        element.attach(None, Id::new("model::Person"));
        element
    }

    #[test]
    fn test_new_element_defaults() {
        let element = person();
        assert_eq!(element.name(), "Person");
        assert_eq!(element.path(), "model::Person");
        assert_eq!(element.kind(), ElementKind::Class);
        assert!(!element.is_deleted());
        assert!(!element.is_immutable());
        assert!(!element.is_disposed());
        assert!(!element.is_stub());
    }

    #[test]
    fn test_stub() {
        let element = Element::new("", ElementBody::Class(Class::default()));
        assert!(element.is_stub());
    }

    #[test]
    fn test_hash_is_idempotent() {
        let element = person();
        assert_eq!(element.hash().unwrap(), element.hash().unwrap());
    }

    #[test]
    fn test_hash_changes_after_mutation() {
        let mut element = person();
        let before = element.hash().unwrap();

        element.edit::<Class>().unwrap().properties.push(Property::new(
            "name",
            Multiplicity::ONE,
            Reference::new("String"),
        ));

        assert_ne!(before, element.hash().unwrap());
    }

    #[test]
    fn test_edit_with_wrong_kind_keeps_revision() {
        let mut element = person();
        assert!(element.edit::<Enumeration>().is_none());
        assert_eq!(element.revision(), 0);
    }

    #[test]
    fn test_freeze_then_mutate_is_detected() {
        let mut element = person();
        element.freeze();
        assert!(element.hash().is_ok());

        element.edit::<Class>().unwrap().super_types.clear();

        assert_eq!(
            element.hash(),
            Err(GraphError::ImmutableElementMutation {
                path: "model::Person".to_string()
            })
        );
    }

    #[test]
    fn test_dispose_rejects_hash() {
        let mut element = person();
        element.hash().unwrap();
        element.dispose();

        assert_eq!(
            element.hash(),
            Err(GraphError::DisposedElementAccess {
                path: "model::Person".to_string()
            })
        );
    }

    #[test]
    fn test_rename_changes_hash() {
        let mut element = person();
        let before = element.hash().unwrap();
        element.rename("Human".to_string(), Id::new("model::Human"));
        assert_ne!(before, element.hash().unwrap());
    }

    #[test]
    fn test_kind_display() {
        assert_eq!(ElementKind::Mapping.to_string(), "Mapping");
        assert_eq!(ElementKind::Extension(Id::new("Text")).to_string(), "Text");
        assert!(!ElementKind::Extension(Id::new("Text")).is_core());
    }
}
