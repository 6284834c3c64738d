//! Configuration types for Meridian graph building.
//!
//! All types implement [`serde::Deserialize`] so they can be loaded from
//! external sources; every field has a default.
//!
//! # Overview
//!
//! - [`AppConfig`] - Top-level configuration combining build and extension settings.
//! - [`BuildConfig`] - Controls what happens after a graph is built.
//! - [`ExtensionsConfig`] - Selects the built-in extension presets to install.
//!
//! # Example
//!
//! ```
//! # use meridian::config::{AppConfig, ExtensionName};
//! let config = AppConfig::default();
//! assert!(!config.build().freeze());
//! assert!(config.extensions().is_enabled(ExtensionName::Diagram));
//! ```

use std::fmt;

use serde::Deserialize;

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Build configuration section.
    #[serde(default)]
    build: BuildConfig,

    /// Extension configuration section.
    #[serde(default)]
    extensions: ExtensionsConfig,
}

impl AppConfig {
    /// Creates a new [`AppConfig`] from its sections.
    pub fn new(build: BuildConfig, extensions: ExtensionsConfig) -> Self {
        Self { build, extensions }
    }

    /// Returns the build configuration.
    pub fn build(&self) -> &BuildConfig {
        &self.build
    }

    /// Returns the extension configuration.
    pub fn extensions(&self) -> &ExtensionsConfig {
        &self.extensions
    }
}

/// Settings applied to every graph built by a [`GraphManager`](crate::GraphManager).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BuildConfig {
    /// Freeze the graph once it is built.
    #[serde(default)]
    freeze: bool,
}

impl BuildConfig {
    pub fn new(freeze: bool) -> Self {
        Self { freeze }
    }

    /// Returns `true` when built graphs are frozen.
    pub fn freeze(&self) -> bool {
        self.freeze
    }
}

/// A built-in extension preset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExtensionName {
    /// Free-form text elements.
    Text,
    /// Class diagrams, cleaned up when their classes are deleted.
    Diagram,
    /// Service stores and their class mappings.
    ServiceStore,
    /// Serialization schemas over a root class.
    Serializer,
}

impl ExtensionName {
    pub const ALL: [ExtensionName; 4] = [
        ExtensionName::Text,
        ExtensionName::Diagram,
        ExtensionName::ServiceStore,
        ExtensionName::Serializer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExtensionName::Text => "text",
            ExtensionName::Diagram => "diagram",
            ExtensionName::ServiceStore => "service-store",
            ExtensionName::Serializer => "serializer",
        }
    }
}

impl fmt::Display for ExtensionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Extension presets installed into the plugin registry.
///
/// Defaults to every built-in preset.
#[derive(Debug, Clone, Deserialize)]
pub struct ExtensionsConfig {
    #[serde(default = "ExtensionsConfig::all")]
    enabled: Vec<ExtensionName>,
}

impl ExtensionsConfig {
    pub fn new(enabled: Vec<ExtensionName>) -> Self {
        Self { enabled }
    }

    /// Enabled presets, in installation order.
    pub fn enabled(&self) -> &[ExtensionName] {
        &self.enabled
    }

    pub fn is_enabled(&self, name: ExtensionName) -> bool {
        self.enabled.contains(&name)
    }

    fn all() -> Vec<ExtensionName> {
        ExtensionName::ALL.to_vec()
    }
}

impl Default for ExtensionsConfig {
    fn default() -> Self {
        Self {
            enabled: Self::all(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();

        assert!(!config.build().freeze());
        assert_eq!(config.extensions().enabled(), &ExtensionName::ALL);
    }

    #[test]
    fn test_config_sections() {
        let config: AppConfig = toml::from_str(
            r#"
            [build]
            freeze = true

            [extensions]
            enabled = ["service-store", "text"]
            "#,
        )
        .unwrap();

        assert!(config.build().freeze());
        assert_eq!(
            config.extensions().enabled(),
            &[ExtensionName::ServiceStore, ExtensionName::Text]
        );
        assert!(!config.extensions().is_enabled(ExtensionName::Diagram));
    }

    #[test]
    fn test_unknown_extension_is_rejected() {
        let result: Result<AppConfig, _> = toml::from_str(
            r#"
            [extensions]
            enabled = ["data-space"]
            "#,
        );
        assert!(result.is_err());
    }
}
