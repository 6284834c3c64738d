//! The graph container.
//!
//! # Overview
//!
//! A [`Graph`] owns every element in an arena and indexes live elements by
//! path and by kind. Elements are registered first and their references are
//! bound afterwards in a single [`Graph::resolve_references`] pass, which is
//! what lets a model refer forward and in cycles.
//!
//! Every graph is seeded with the frozen primitive types (`String`,
//! `Integer`, ...), which live at the root and are never serialized.
//!
//! # Lifecycle
//!
//! 1. Populate with [`Graph::create_element`] / [`Graph::add_element`].
//! 2. Bind with [`Graph::resolve_references`] and wire mappings with
//!    [`Graph::wire_mappings`].
//! 3. Optionally [`Graph::freeze`]: every element becomes immutable and
//!    further additions are rejected.
//! 4. [`Graph::dispose`]: references are unbound and memoized hashes dropped.

use std::{
    collections::{HashMap, HashSet},
    fmt,
    rc::Rc,
};

use indexmap::IndexMap;
use log::{debug, info, trace};

use crate::{
    element::{
        Class, Element, ElementBody, ElementId, ElementKind, Package, PrimitiveType, Property,
        PropertyOwner, Store,
    },
    error::{GraphError, Result},
    hash::HashCode,
    identifier::{self, Id},
    plugin::PluginRegistry,
    reference::{ElementType, Reference},
};

/// A reference found by a graph-wide scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceReport {
    /// Element holding the reference.
    pub owner: ElementId,
    /// Path the reference was written with.
    pub path: Id,
    pub expected_kind: &'static str,
}

/// Arena of elements indexed by path and kind.
pub struct Graph {
    elements: Vec<Element>,
    index: IndexMap<Id, ElementId>,
    by_kind: IndexMap<ElementKind, Vec<ElementId>>,
    registry: Rc<PluginRegistry>,
    frozen: bool,
    disposed: bool,
}

impl Graph {
    /// Creates a graph using the extensions of `registry`.
    pub fn new(registry: Rc<PluginRegistry>) -> Self {
        let mut graph = Self {
            elements: Vec::new(),
            index: IndexMap::new(),
            by_kind: IndexMap::new(),
            registry,
            frozen: false,
            disposed: false,
        };
        for name in PrimitiveType::NAMES {
            let id = graph.push(
                Element::new(name, ElementBody::PrimitiveType(PrimitiveType)),
                None,
                Id::new(name),
            );
            graph.elements[id.index()].freeze();
        }
        graph
    }

    /// Returns the plugin registry shared by this graph.
    pub fn registry(&self) -> &Rc<PluginRegistry> {
        &self.registry
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    // =========================================================================
    // Registration
    // =========================================================================

    /// Adds `element` under `package`.
    ///
    /// # Errors
    ///
    /// - [`GraphError::ImmutableElementMutation`] when the graph is frozen.
    /// - [`GraphError::InvalidPath`] when the element name is not a simple
    ///   identifier or `package` is not a live package.
    /// - [`GraphError::DuplicatePath`] when a live element owns the path.
    pub fn add_element(&mut self, element: Element, package: Option<ElementId>) -> Result<ElementId> {
        let package_path = match package {
            Some(package) => {
                let owner = self.element(package);
                if owner.is_deleted() || owner.kind() != ElementKind::Package {
                    return Err(GraphError::InvalidPath {
                        path: owner.path().create_nested(element.name()).as_string(),
                        reason: format!("`{}` is not a package", owner.path()),
                    });
                }
                Some(owner.path())
            }
            None => None,
        };
        let path = Id::join(package_path, element.name());

        if self.frozen {
            return Err(GraphError::ImmutableElementMutation {
                path: path.as_string(),
            });
        }
        if element.name().is_empty() || element.name().contains(identifier::PATH_DELIMITER) {
            return Err(GraphError::InvalidPath {
                path: path.as_string(),
                reason: format!("`{}` is not a simple name", element.name()),
            });
        }
        if self.index.contains_key(&path) {
            return Err(GraphError::DuplicatePath {
                path: path.as_string(),
            });
        }

        Ok(self.push(element, package, path))
    }

    fn push(&mut self, mut element: Element, package: Option<ElementId>, path: Id) -> ElementId {
        let id = ElementId::new(self.elements.len());
        element.attach(package, path);
        trace!(path:% = path, kind:% = element.kind(); "Registered element");

        self.by_kind.entry(element.kind()).or_default().push(id);
        self.index.insert(path, id);
        self.elements.push(element);
        if let Some(children) = package.and_then(|package| self.elements[package.index()].package_children_mut()) {
            children.push(id);
        }
        id
    }

    /// Returns the package at `path`, creating it and its ancestors on demand.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::InvalidPath`] when an element along the path
    /// exists but is not a package.
    pub fn get_or_create_package(&mut self, path: Id) -> Result<ElementId> {
        if let Some(id) = self.index.get(&path).copied() {
            if self.elements[id.index()].kind() != ElementKind::Package {
                return Err(GraphError::InvalidPath {
                    path: path.as_string(),
                    reason: "an element other than a package owns this path".to_string(),
                });
            }
            return Ok(id);
        }

        let parent = match path.package_path() {
            Some(parent) => Some(self.get_or_create_package(parent)?),
            None => None,
        };
        self.add_element(
            Element::new(path.name(), ElementBody::Package(Package::default())),
            parent,
        )
    }

    /// Creates an element at the `::` separated `path`, creating missing
    /// packages along the way.
    ///
    /// # Errors
    ///
    /// [`GraphError::InvalidPath`] for a malformed path, plus every error of
    /// [`Graph::add_element`].
    ///
    /// # Examples
    ///
    /// ```
    /// use meridian_core::{Graph, element::{Class, ElementBody, ElementKind}};
    ///
    /// let mut graph = Graph::default();
    /// let id = graph
    ///     .create_element("model::domain::Person", ElementBody::Class(Class::default()))
    ///     .unwrap();
    ///
    /// assert_eq!(graph.element(id).path(), "model::domain::Person");
    /// assert_eq!(
    ///     graph.get_element("model::domain").unwrap().kind(),
    ///     ElementKind::Package
    /// );
    /// ```
    pub fn create_element(&mut self, path: &str, body: ElementBody) -> Result<ElementId> {
        identifier::validate_path(path).map_err(|reason| GraphError::InvalidPath {
            path: path.to_string(),
            reason,
        })?;

        let path = Id::new(path);
        let package = match path.package_path() {
            Some(package) => Some(self.get_or_create_package(package)?),
            None => None,
        };
        self.add_element(Element::new(path.name(), body), package)
    }

    // =========================================================================
    // Lookup
    // =========================================================================

    /// Returns the element with handle `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not issued by this graph.
    pub fn element(&self, id: ElementId) -> &Element {
        &self.elements[id.index()]
    }

    /// Returns the element with handle `id` for mutation.
    ///
    /// # Panics
    ///
    /// Panics if `id` was not issued by this graph.
    pub fn element_mut(&mut self, id: ElementId) -> &mut Element {
        &mut self.elements[id.index()]
    }

    /// Returns the live element owning `path`.
    pub fn lookup(&self, path: &str) -> Option<ElementId> {
        self.index.get(&Id::new(path)).copied()
    }

    pub fn get_element(&self, path: &str) -> Option<&Element> {
        self.lookup(path).map(|id| self.element(id))
    }

    /// Returns the live element of `kind` owning `path`.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::ElementNotFound`] when there is no such element
    /// or it is of another kind.
    pub fn get_element_or_fail(&self, path: &str, kind: ElementKind) -> Result<&Element> {
        self.get_element(path)
            .filter(|element| element.kind() == kind)
            .ok_or_else(|| GraphError::ElementNotFound {
                path: path.to_string(),
                expected_kind: kind.to_string(),
            })
    }

    /// Returns the live element owning `path` viewed as `T`.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::ElementNotFound`] when there is no such element
    /// or it is not a `T`.
    pub fn get<T: ElementType + ?Sized>(&self, path: &str) -> Result<&T> {
        self.get_element(path)
            .and_then(|element| element.downcast_ref::<T>())
            .ok_or_else(|| GraphError::ElementNotFound {
                path: path.to_string(),
                expected_kind: T::kind_label().to_string(),
            })
    }

    /// Mutable counterpart of [`Graph::get`].
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::ElementNotFound`] when there is no such element
    /// or it is not a `T`.
    pub fn get_mut<T: ElementType + ?Sized>(&mut self, path: &str) -> Result<&mut T> {
        let not_found = || GraphError::ElementNotFound {
            path: path.to_string(),
            expected_kind: T::kind_label().to_string(),
        };
        let id = self.lookup(path).ok_or_else(not_found)?;
        self.elements[id.index()].edit::<T>().ok_or_else(not_found)
    }

    /// Live elements in registration order.
    pub fn elements(&self) -> impl Iterator<Item = (ElementId, &Element)> {
        self.index
            .values()
            .map(|id| (*id, &self.elements[id.index()]))
    }

    /// Live elements of `kind` in registration order.
    pub fn elements_of_kind(&self, kind: ElementKind) -> impl Iterator<Item = (ElementId, &Element)> {
        self.by_kind
            .get(&kind)
            .into_iter()
            .flatten()
            .map(|id| (*id, &self.elements[id.index()]))
    }

    /// Number of live elements, including packages and primitive types.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Current path of the element `reference` is bound to, or the written
    /// path when it is unbound.
    pub fn reference_path<T: ?Sized>(&self, reference: &Reference<T>) -> Id {
        reference
            .target()
            .map_or(reference.path(), |id| self.element(id).path())
    }

    // =========================================================================
    // Mutation
    // =========================================================================

    /// Deletes an element. Deleting a package deletes its content.
    ///
    /// Deletion is idempotent. References to the deleted element stay bound
    /// until [`Graph::dead_reference_sweep`] prunes them.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::ImmutableElementMutation`] when the graph is
    /// frozen.
    pub fn delete_element(&mut self, id: ElementId) -> Result<()> {
        let element = self.element(id);
        if element.is_deleted() {
            return Ok(());
        }
        if self.frozen {
            return Err(GraphError::ImmutableElementMutation {
                path: element.path().as_string(),
            });
        }

        let children = match element.body() {
            ElementBody::Package(package) => package.children().to_vec(),
            _ => Vec::new(),
        };
        for child in children {
            self.delete_element(child)?;
        }

        let element = &mut self.elements[id.index()];
        let path = element.path();
        let kind = element.kind();
        let package = element.package();
        element.mark_deleted();

        self.index.shift_remove(&path);
        if let Some(ids) = self.by_kind.get_mut(&kind) {
            ids.retain(|candidate| *candidate != id);
        }
        if let Some(children) = package.and_then(|package| self.elements[package.index()].package_children_mut()) {
            children.retain(|child| *child != id);
        }

        debug!(path:% = path; "Deleted element");
        Ok(())
    }

    /// Renames an element and re-paths everything it contains.
    ///
    /// References bound to the moved elements keep their binding and are
    /// rewritten to the new paths; their owners get a new revision, so
    /// hashes and serialized output follow the rename.
    ///
    /// # Errors
    ///
    /// - [`GraphError::ImmutableElementMutation`] when the graph is frozen.
    /// - [`GraphError::InvalidPath`] when `name` is not a simple name.
    /// - [`GraphError::DuplicatePath`] when the new path is taken.
    pub fn rename_element(&mut self, id: ElementId, name: &str) -> Result<()> {
        let element = self.element(id);
        let path = Id::join(element.path().package_path(), name);
        if self.frozen {
            return Err(GraphError::ImmutableElementMutation {
                path: element.path().as_string(),
            });
        }
        if name.is_empty() || name.contains(identifier::PATH_DELIMITER) {
            return Err(GraphError::InvalidPath {
                path: path.as_string(),
                reason: format!("`{name}` is not a simple name"),
            });
        }
        if path == element.path() {
            return Ok(());
        }
        if self.index.contains_key(&path) {
            return Err(GraphError::DuplicatePath {
                path: path.as_string(),
            });
        }

        let old = element.path();
        self.index.shift_remove(&old);
        self.index.insert(path, id);
        self.elements[id.index()].rename(name.to_string(), path);

        let mut moved = HashMap::from([(id, path)]);
        self.relocate_children(id, path, &mut moved);
        let repointed = self.repoint_references(&moved);

        debug!(from:% = old, to:% = path, moved = moved.len(), repointed; "Renamed element");
        Ok(())
    }

    fn relocate_children(&mut self, id: ElementId, path: Id, moved: &mut HashMap<ElementId, Id>) {
        let children = match self.element(id).body() {
            ElementBody::Package(package) => package.children().to_vec(),
            _ => return,
        };
        for child in children {
            let element = &mut self.elements[child.index()];
            let old = element.path();
            let new = path.create_nested(element.name());
            element.relocate(new);
            self.index.shift_remove(&old);
            self.index.insert(new, child);
            moved.insert(child, new);
            self.relocate_children(child, new, moved);
        }
    }

    /// Rewrites the references bound to `moved` elements to their new paths
    /// and bumps the revision of every element owning one.
    ///
    /// Returns the number of rewritten references.
    fn repoint_references(&mut self, moved: &HashMap<ElementId, Id>) -> usize {
        let mut repointed = 0;
        let mut owners = Vec::new();
        for (owner, element) in self.elements() {
            let mut touched = false;
            for reference in element.body().references() {
                if let Some(path) = reference.target().and_then(|target| moved.get(&target)) {
                    reference.repoint(*path);
                    repointed += 1;
                    touched = true;
                }
            }
            if touched {
                owners.push(owner);
            }
        }

        for owner in owners {
            trace!(path:% = self.element(owner).path(); "Repointed references");
            self.elements[owner.index()].touch();
        }
        repointed
    }

    // =========================================================================
    // References
    // =========================================================================

    /// Binds every reference of every live element.
    ///
    /// All failures are collected; binding continues past them.
    ///
    /// # Errors
    ///
    /// Returns the [`GraphError::ReferenceResolution`] errors of the
    /// references that could not be bound.
    pub fn resolve_references(&self) -> std::result::Result<(), Vec<GraphError>> {
        let mut errors = Vec::new();
        let mut resolved = 0usize;
        for (_, element) in self.elements() {
            for reference in element.body().references() {
                match reference.resolve(self) {
                    Ok(_) => resolved += 1,
                    Err(err) => errors.push(err),
                }
            }
        }

        debug!(resolved, failed = errors.len(); "Resolved references");
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// References not bound to any element.
    pub fn unresolved_references(&self) -> Vec<ReferenceReport> {
        self.scan_references(|target| target.is_none())
    }

    /// References bound to a deleted element.
    pub fn dead_references(&self) -> Vec<ReferenceReport> {
        self.scan_references(|target| target.is_some_and(|id| self.element(id).is_deleted()))
    }

    fn scan_references(&self, matches: impl Fn(Option<ElementId>) -> bool) -> Vec<ReferenceReport> {
        let mut reports = Vec::new();
        for (owner, element) in self.elements() {
            for reference in element.body().references() {
                if matches(reference.target()) {
                    reports.push(ReferenceReport {
                        owner,
                        path: reference.path(),
                        expected_kind: reference.expected_kind(),
                    });
                }
            }
        }
        reports
    }

    /// Removes list entries referring to deleted elements, then runs every
    /// registered cleanup procedure.
    ///
    /// Returns the number of entries removed by the core sweep.
    pub fn dead_reference_sweep(&mut self) -> usize {
        let dead: HashSet<ElementId> = self
            .elements
            .iter()
            .enumerate()
            .filter(|(_, element)| element.is_deleted())
            .map(|(index, _)| ElementId::new(index))
            .collect();
        let is_dead = |id: ElementId| dead.contains(&id);

        let live: Vec<ElementId> = self.index.values().copied().collect();
        let removed: usize = live
            .into_iter()
            .map(|id| self.elements[id.index()].prune_dead_references(&is_dead))
            .sum();

        let registry = Rc::clone(&self.registry);
        for cleaner in registry.cleaners() {
            cleaner(self);
        }

        info!(removed, cleaners = registry.cleaners().len(); "Swept dead references");
        removed
    }

    /// Returns `store` and every store it includes, transitively.
    pub fn store_closure(&self, store: ElementId) -> Vec<ElementId> {
        let mut closure = vec![store];
        let mut cursor = 0;
        while let Some(current) = closure.get(cursor).copied() {
            cursor += 1;
            let Some(body) = self.element(current).downcast_ref::<dyn Store>() else {
                continue;
            };
            for include in body.includes() {
                if let Some(target) = include.target() {
                    if !closure.contains(&target) {
                        closure.push(target);
                    }
                }
            }
        }
        closure
    }

    /// Finds a property reachable from `owner`.
    ///
    /// For a class the lookup covers its own properties, its super types and
    /// the association ends navigable from it. For an association it covers
    /// the association's own properties.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::PropertyNotFound`] when no property matches.
    pub fn find_property(&self, owner: ElementId, name: &str) -> Result<&Property> {
        let element = self.element(owner);
        let found = match element.body() {
            ElementBody::Class(_) => self.find_class_property(owner, name, &mut Vec::new()),
            ElementBody::Association(association) => association.find_property(name),
            _ => None,
        };
        found.ok_or_else(|| GraphError::PropertyNotFound {
            owner: element.path().as_string(),
            property: name.to_string(),
        })
    }

    fn find_class_property(&self, class: ElementId, name: &str, visited: &mut Vec<ElementId>) -> Option<&Property> {
        if visited.contains(&class) {
            return None;
        }
        visited.push(class);

        let body = self.element(class).downcast_ref::<Class>()?;
        if let Some(property) = body.find_property(name) {
            return Some(property);
        }
        for super_type in &body.super_types {
            if let Some(property) = super_type
                .target()
                .and_then(|target| self.find_class_property(target, name, visited))
            {
                return Some(property);
            }
        }
        self.association_property(class, name)
    }

    fn association_property(&self, class: ElementId, name: &str) -> Option<&Property> {
        self.elements_of_kind(ElementKind::Association)
            .filter_map(|(_, element)| match element.body() {
                ElementBody::Association(association) => Some(association),
                _ => None,
            })
            .find_map(|association| {
                let property = association.find_property(name)?;
                let opposite = association.opposite(name)?;
                opposite
                    .property_type
                    .points_to(class)
                    .then_some(property)
            })
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Freezes every element and rejects further additions.
    pub fn freeze(&mut self) {
        for element in &mut self.elements {
            element.freeze();
        }
        self.frozen = true;
        info!(elements = self.len(); "Froze graph");
    }

    /// Unbinds every reference and drops memoized hashes.
    ///
    /// Hashing any element afterwards fails with
    /// [`GraphError::DisposedElementAccess`].
    pub fn dispose(&mut self) {
        for element in &self.elements {
            for reference in element.body().references() {
                reference.unbind();
            }
            if let ElementBody::Mapping(mapping) = element.body() {
                mapping.unbind_set_implementations();
            }
        }
        for element in &mut self.elements {
            element.dispose();
        }
        self.disposed = true;
        info!("Disposed graph");
    }

    // =========================================================================
    // Hashing
    // =========================================================================

    /// Returns the structural hash of the element at `path`.
    ///
    /// # Errors
    ///
    /// [`GraphError::ElementNotFound`] for an unknown path, plus every error
    /// of [`Element::hash`].
    pub fn hash(&self, path: &str) -> Result<HashCode> {
        self.get_element(path)
            .ok_or_else(|| GraphError::ElementNotFound {
                path: path.to_string(),
                expected_kind: "element".to_string(),
            })?
            .hash()
    }

    /// Hashes of every model element, sorted by path.
    ///
    /// Packages and primitive types are not part of the index.
    ///
    /// # Errors
    ///
    /// Returns the first [`Element::hash`] failure.
    pub fn hash_index(&self) -> Result<IndexMap<String, HashCode>> {
        let mut index = IndexMap::new();
        for (_, element) in self.elements() {
            if matches!(element.kind(), ElementKind::Package | ElementKind::PrimitiveType) {
                continue;
            }
            index.insert(element.path().as_string(), element.hash()?);
        }
        index.sort_keys();
        Ok(index)
    }
}

impl Default for Graph {
    fn default() -> Self {
        Self::new(Rc::new(PluginRegistry::default()))
    }
}

impl fmt::Debug for Graph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Graph")
            .field("elements", &self.len())
            .field("registry", &self.registry)
            .field("frozen", &self.frozen)
            .field("disposed", &self.disposed)
            .finish()
    }
}
