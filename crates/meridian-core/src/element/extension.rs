//! Plugin-contributed element kinds.

use std::{any::Any, fmt};

use crate::{
    element::Store,
    hash::HashCode,
    identifier::Id,
    reference::Resolvable,
};

/// Body of an element whose kind is contributed by a plugin.
///
/// Plugins register a matching [`ElementKindPlugin`] that builds and
/// serializes these bodies; the core only hashes, resolves and downcasts them.
///
/// [`ElementKindPlugin`]: crate::plugin::ElementKindPlugin
pub trait ExtensionElement: fmt::Debug + Any {
    /// Kind tag, unique across the registry.
    fn kind(&self) -> Id;

    /// Structural hash of the element stored at `path`.
    fn hash_code(&self, path: &str) -> HashCode;

    /// References held by the element.
    fn references(&self) -> Vec<&dyn Resolvable> {
        Vec::new()
    }

    /// Returns the element as a store, for kinds that are stores.
    fn as_store(&self) -> Option<&(dyn Store + 'static)> {
        None
    }

    /// Mutable counterpart of [`ExtensionElement::as_store`].
    fn as_store_mut(&mut self) -> Option<&mut (dyn Store + 'static)> {
        None
    }

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}
