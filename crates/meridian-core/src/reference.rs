//! Deferred references between elements.
//!
//! A [`Reference<T>`] is created from the textual path written in the model
//! and bound to the live element later, once every element of the graph has
//! been registered. Binding stores the target's [`ElementId`], so forward
//! references and reference cycles (a store including itself through another
//! store, a join pointing back at its own database) need no special handling.
//!
//! The type parameter names the kind of element the reference must point to.
//! It is either a concrete element body (`Reference<Class>`) or a trait object
//! covering a family of kinds (`Reference<dyn Store>`, `Reference<dyn Type>`).

use std::{cell::Cell, fmt, marker::PhantomData};

use crate::{
    element::{Element, ElementBody, ElementId},
    error::{GraphError, Result},
    graph::Graph,
    hash::{HashBuilder, HashCode, HashStructure, Hashable},
    identifier::Id,
};

/// Element kinds (or families of kinds) a [`Reference`] can point to.
pub trait ElementType {
    /// Human readable label used in resolution errors.
    fn kind_label() -> &'static str;

    /// Views an element body as this type.
    fn cast(body: &ElementBody) -> Option<&Self>;

    /// Views an element body as this type, mutably.
    fn cast_mut(body: &mut ElementBody) -> Option<&mut Self>;
}

/// A typed, deferred pointer to another element of the graph.
///
/// # Examples
///
/// ```
/// use meridian_core::{Graph, element::{Class, ElementBody}, reference::Reference};
///
/// let mut graph = Graph::default();
/// let person = graph
///     .create_element("model::Person", ElementBody::Class(Class::default()))
///     .unwrap();
///
/// let reference: Reference<Class> = Reference::new("model::Person");
/// assert!(reference.value(&graph).is_err());
///
/// assert_eq!(reference.resolve(&graph).unwrap(), person);
/// assert!(reference.value(&graph).is_ok());
/// ```
pub struct Reference<T: ?Sized> {
    path: Cell<Id>,
    target: Cell<Option<ElementId>>,
    _marker: PhantomData<fn(&T)>,
}

impl<T: ?Sized> Reference<T> {
    /// Creates an unbound reference to `path`.
    pub fn new(path: impl Into<Id>) -> Self {
        Self {
            path: Cell::new(path.into()),
            target: Cell::new(None),
            _marker: PhantomData,
        }
    }

    /// Creates a reference already bound to `target`.
    pub fn bound(path: impl Into<Id>, target: ElementId) -> Self {
        let reference = Self::new(path);
        reference.target.set(Some(target));
        reference
    }

    /// Returns the path this reference was written with.
    pub fn path(&self) -> Id {
        self.path.get()
    }

    /// Returns the bound element, if any.
    pub fn target(&self) -> Option<ElementId> {
        self.target.get()
    }

    /// Returns `true` when the reference is bound.
    pub fn is_resolved(&self) -> bool {
        self.target.get().is_some()
    }

    /// Returns `true` when the reference is bound to `element`.
    pub fn points_to(&self, element: ElementId) -> bool {
        self.target.get() == Some(element)
    }

    /// Drops the binding.
    pub fn unbind(&self) {
        self.target.set(None);
    }

    /// Rebinds this reference to `target` stored at `path`.
    pub fn set_value(&mut self, path: Id, target: ElementId) {
        self.path.set(path);
        self.target.set(Some(target));
    }

    /// Rewrites the path of a bound reference whose target moved to `path`.
    /// The binding is kept.
    pub fn repoint(&self, path: Id) {
        self.path.set(path);
    }
}

impl<T: ElementType + ?Sized> Reference<T> {
    /// Looks up the path in `graph` and binds this reference.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::ReferenceResolution`] when no live element owns
    /// the path or the element found is not of the expected kind.
    pub fn resolve(&self, graph: &Graph) -> Result<ElementId> {
        let path = self.path().as_string();
        let Some(id) = graph.lookup(&path) else {
            return Err(GraphError::ReferenceResolution {
                path,
                expected_kind: T::kind_label().to_string(),
                found_kind: None,
            });
        };

        let element = graph.element(id);
        if T::cast(element.body()).is_none() {
            return Err(GraphError::ReferenceResolution {
                path,
                expected_kind: T::kind_label().to_string(),
                found_kind: Some(element.kind().to_string()),
            });
        }

        self.target.set(Some(id));
        Ok(id)
    }

    /// Returns the bound element.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::UnresolvedReference`] when the reference has not
    /// been bound.
    pub fn element<'g>(&self, graph: &'g Graph) -> Result<&'g Element> {
        match self.target.get() {
            Some(id) => Ok(graph.element(id)),
            None => Err(GraphError::UnresolvedReference {
                path: self.path().as_string(),
            }),
        }
    }

    /// Returns the bound element viewed as `T`.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::UnresolvedReference`] when the reference has not
    /// been bound, and [`GraphError::ReferenceResolution`] when the bound
    /// element is not a `T`.
    pub fn value<'g>(&self, graph: &'g Graph) -> Result<&'g T> {
        let element = self.element(graph)?;
        T::cast(element.body()).ok_or_else(|| GraphError::ReferenceResolution {
            path: self.path().as_string(),
            expected_kind: T::kind_label().to_string(),
            found_kind: Some(element.kind().to_string()),
        })
    }
}

impl<T: ?Sized> Clone for Reference<T> {
    fn clone(&self) -> Self {
        Self {
            path: Cell::new(self.path.get()),
            target: Cell::new(self.target.get()),
            _marker: PhantomData,
        }
    }
}

impl<T: ?Sized> fmt::Debug for Reference<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reference")
            .field("path", &self.path().as_string())
            .field("target", &self.target.get())
            .finish()
    }
}

impl<T: ?Sized> Hashable for Reference<T> {
    fn hash_code(&self) -> HashCode {
        let mut builder = HashBuilder::new(HashStructure::ElementPointer);
        builder.str(&self.path().as_string());
        builder.finish()
    }
}

/// Type-erased view of a [`Reference`], used by graph-wide passes.
pub trait Resolvable {
    /// Path the reference was written with.
    fn path(&self) -> Id;

    /// Label of the expected element kind.
    fn expected_kind(&self) -> &'static str;

    /// Bound element, if any.
    fn target(&self) -> Option<ElementId>;

    /// Binds the reference against `graph`.
    fn resolve(&self, graph: &Graph) -> Result<ElementId>;

    /// Drops the binding.
    fn unbind(&self);

    /// Rewrites the path after the bound element moved.
    fn repoint(&self, path: Id);
}

impl<T: ElementType + ?Sized> Resolvable for Reference<T> {
    fn path(&self) -> Id {
        Reference::path(self)
    }

    fn expected_kind(&self) -> &'static str {
        T::kind_label()
    }

    fn target(&self) -> Option<ElementId> {
        Reference::target(self)
    }

    fn resolve(&self, graph: &Graph) -> Result<ElementId> {
        Reference::resolve(self, graph)
    }

    fn unbind(&self) {
        Reference::unbind(self)
    }

    fn repoint(&self, path: Id) {
        Reference::repoint(self, path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::{Class, Enumeration, Type};

    fn graph_with_person() -> (Graph, ElementId) {
        let mut graph = Graph::default();
        let person = graph
            .create_element("model::Person", ElementBody::Class(Class::default()))
            .unwrap();
        (graph, person)
    }

    #[test]
    fn test_unresolved_value_fails() {
        let (graph, _) = graph_with_person();
        let reference: Reference<Class> = Reference::new("model::Person");

        let err = reference.value(&graph).unwrap_err();
        assert_eq!(
            err,
            GraphError::UnresolvedReference {
                path: "model::Person".to_string()
            }
        );
    }

    #[test]
    fn test_resolve_binds_target() {
        let (graph, person) = graph_with_person();
        let reference: Reference<Class> = Reference::new("model::Person");

        assert_eq!(reference.resolve(&graph).unwrap(), person);
        assert!(reference.points_to(person));
        assert!(reference.value(&graph).is_ok());
    }

    #[test]
    fn test_resolve_missing_path() {
        let (graph, _) = graph_with_person();
        let reference: Reference<Class> = Reference::new("x::y::Missing");

        match reference.resolve(&graph) {
            Err(GraphError::ReferenceResolution {
                path,
                expected_kind,
                found_kind,
            }) => {
                assert_eq!(path, "x::y::Missing");
                assert_eq!(expected_kind, "class");
                assert_eq!(found_kind, None);
            }
            other => panic!("unexpected result: {other:?}"),
        }
        assert!(!reference.is_resolved());
    }

    #[test]
    fn test_resolve_kind_mismatch() {
        let (graph, _) = graph_with_person();
        let reference: Reference<Enumeration> = Reference::new("model::Person");

        match reference.resolve(&graph) {
            Err(GraphError::ReferenceResolution { found_kind, .. }) => {
                assert_eq!(found_kind.as_deref(), Some("Class"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn test_trait_object_reference_accepts_family() {
        let (graph, person) = graph_with_person();
        let class_type: Reference<dyn Type> = Reference::new("model::Person");
        let primitive: Reference<dyn Type> = Reference::new("String");

        assert_eq!(class_type.resolve(&graph).unwrap(), person);
        assert!(primitive.resolve(&graph).is_ok());
    }

    #[test]
    fn test_unbind() {
        let (graph, _) = graph_with_person();
        let reference: Reference<Class> = Reference::new("model::Person");
        reference.resolve(&graph).unwrap();

        let erased: &dyn Resolvable = &reference;
        erased.unbind();
        assert!(!reference.is_resolved());
        assert_eq!(erased.expected_kind(), "class");
    }

    #[test]
    fn test_hash_depends_on_path_only() {
        let (graph, _) = graph_with_person();
        let bound: Reference<Class> = Reference::new("model::Person");
        bound.resolve(&graph).unwrap();
        let unbound: Reference<Class> = Reference::new("model::Person");

        assert_eq!(bound.hash_code(), unbound.hash_code());
    }
}
