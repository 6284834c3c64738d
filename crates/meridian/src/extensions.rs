//! Built-in extension presets.
//!
//! Each preset is a [`GraphPlugin`] contributing element kinds, dead-reference
//! cleaners or mapping extensions:
//!
//! - [`text`]: free-form text elements.
//! - [`diagram`]: class diagrams, with a cleaner for views of deleted classes.
//! - [`service_store`]: service stores and `serviceStore` class mappings.
//! - [`serializer`]: serialization schemas, with a cleaner for deleted
//!   included classes.

pub mod diagram;
pub mod serializer;
pub mod service_store;
pub mod text;

use log::debug;

use meridian_core::{GraphError, plugin::{GraphPlugin, PluginRegistry}};

use crate::config::ExtensionName;

pub use diagram::DiagramPlugin;
pub use serializer::SerializerPlugin;
pub use service_store::ServiceStorePlugin;
pub use text::TextPlugin;

/// Returns the plugin of a built-in preset.
pub fn plugin(name: ExtensionName) -> Box<dyn GraphPlugin> {
    match name {
        ExtensionName::Text => Box::new(TextPlugin),
        ExtensionName::Diagram => Box::new(DiagramPlugin),
        ExtensionName::ServiceStore => Box::new(ServiceStorePlugin),
        ExtensionName::Serializer => Box::new(SerializerPlugin),
    }
}

/// Creates a registry with the presets in `enabled` installed, in order.
///
/// # Errors
///
/// Returns [`GraphError::DuplicateExtension`] when a preset is listed twice.
pub fn registry(enabled: &[ExtensionName]) -> Result<PluginRegistry, GraphError> {
    let mut registry = PluginRegistry::new();
    for name in enabled {
        registry.install(plugin(*name).as_ref())?;
    }
    debug!(plugins = registry.plugins().len(); "Installed extension presets");
    Ok(registry)
}

/// Error returned by a plugin handed a body of another kind.
fn wrong_body(expected: &str) -> serde_json::Error {
    serde::ser::Error::custom(format!("element body is not a {expected}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_installs_every_preset() {
        let registry = registry(&ExtensionName::ALL).unwrap();

        assert_eq!(registry.plugins(), &["text", "diagram", "service-store", "serializer"]);
        assert!(registry.element_kind_by_classifier(text::CLASSIFIER_PATH).is_some());
        assert!(registry.element_kind_by_classifier(diagram::CLASSIFIER_PATH).is_some());
        assert!(registry.element_kind_by_protocol_type(service_store::PROTOCOL_TYPE).is_some());
        assert!(registry.mapping_extension(service_store::MAPPING_PROTOCOL_TYPE).is_some());
        assert!(registry.element_kind_by_protocol_type(serializer::PROTOCOL_TYPE).is_some());
        assert_eq!(registry.cleaners().len(), 2);
    }

    #[test]
    fn test_listing_a_preset_twice_fails() {
        let result = registry(&[ExtensionName::Text, ExtensionName::Text]);

        assert_eq!(
            result.unwrap_err(),
            GraphError::DuplicateExtension {
                name: "text".to_string()
            }
        );
    }
}
