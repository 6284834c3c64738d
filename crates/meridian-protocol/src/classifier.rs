//! Classifier paths of the core element kinds.

use meridian_core::ElementKind;

/// A core element kind as named in the exchange format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CoreClassifier {
    Class,
    Enumeration,
    Association,
    Profile,
    Function,
    Database,
    Mapping,
    Connection,
    Runtime,
    Service,
}

impl CoreClassifier {
    pub const ALL: [CoreClassifier; 10] = [
        CoreClassifier::Profile,
        CoreClassifier::Enumeration,
        CoreClassifier::Class,
        CoreClassifier::Association,
        CoreClassifier::Function,
        CoreClassifier::Database,
        CoreClassifier::Mapping,
        CoreClassifier::Connection,
        CoreClassifier::Runtime,
        CoreClassifier::Service,
    ];

    /// Looks up the classifier of an entity.
    pub fn from_path(classifier_path: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|classifier| classifier.path() == classifier_path)
    }

    /// Looks up the classifier of a graph element kind.
    pub fn from_kind(kind: ElementKind) -> Option<Self> {
        match kind {
            ElementKind::Class => Some(CoreClassifier::Class),
            ElementKind::Enumeration => Some(CoreClassifier::Enumeration),
            ElementKind::Association => Some(CoreClassifier::Association),
            ElementKind::Profile => Some(CoreClassifier::Profile),
            ElementKind::Function => Some(CoreClassifier::Function),
            ElementKind::Database => Some(CoreClassifier::Database),
            ElementKind::Mapping => Some(CoreClassifier::Mapping),
            ElementKind::Connection => Some(CoreClassifier::Connection),
            ElementKind::Runtime => Some(CoreClassifier::Runtime),
            ElementKind::Service => Some(CoreClassifier::Service),
            ElementKind::Package | ElementKind::PrimitiveType | ElementKind::Extension(_) => None,
        }
    }

    /// The classifier path written in entities.
    pub fn path(&self) -> &'static str {
        match self {
            CoreClassifier::Class => "meta::pure::metamodel::type::Class",
            CoreClassifier::Enumeration => "meta::pure::metamodel::type::Enumeration",
            CoreClassifier::Association => "meta::pure::metamodel::relationship::Association",
            CoreClassifier::Profile => "meta::pure::metamodel::extension::Profile",
            CoreClassifier::Function => {
                "meta::pure::metamodel::function::ConcreteFunctionDefinition"
            }
            CoreClassifier::Database => "meta::relational::metamodel::Database",
            CoreClassifier::Mapping => "meta::pure::mapping::Mapping",
            CoreClassifier::Connection => "meta::pure::runtime::PackageableConnection",
            CoreClassifier::Runtime => "meta::pure::runtime::PackageableRuntime",
            CoreClassifier::Service => "meta::legend::service::metamodel::Service",
        }
    }

    /// The `_type` of the entity content.
    pub fn protocol_type(&self) -> &'static str {
        match self {
            CoreClassifier::Class => "class",
            CoreClassifier::Enumeration => "Enumeration",
            CoreClassifier::Association => "association",
            CoreClassifier::Profile => "profile",
            CoreClassifier::Function => "function",
            CoreClassifier::Database => "relational",
            CoreClassifier::Mapping => "mapping",
            CoreClassifier::Connection => "connection",
            CoreClassifier::Runtime => "runtime",
            CoreClassifier::Service => "service",
        }
    }
}

#[cfg(test)]
mod tests {
    use meridian_core::plugin::{CORE_CLASSIFIER_PATHS, CORE_PROTOCOL_TYPES};

    use super::*;

    #[test]
    fn test_from_path() {
        assert_eq!(
            CoreClassifier::from_path("meta::pure::mapping::Mapping"),
            Some(CoreClassifier::Mapping)
        );
        assert_eq!(CoreClassifier::from_path("meta::pure::Unknown"), None);
    }

    #[test]
    fn test_every_classifier_matches_its_kind() {
        let kinds = [
            ElementKind::Class,
            ElementKind::Enumeration,
            ElementKind::Association,
            ElementKind::Profile,
            ElementKind::Function,
            ElementKind::Database,
            ElementKind::Mapping,
            ElementKind::Connection,
            ElementKind::Runtime,
            ElementKind::Service,
        ];
        for kind in kinds {
            let classifier = CoreClassifier::from_kind(kind).unwrap();
            assert_eq!(CoreClassifier::from_path(classifier.path()), Some(classifier));
        }
        assert_eq!(CoreClassifier::from_kind(ElementKind::Package), None);
    }

    #[test]
    fn test_core_keys_are_reserved_for_plugins() {
        let paths: Vec<&str> = CoreClassifier::ALL.iter().map(CoreClassifier::path).collect();
        let types: Vec<&str> = CoreClassifier::ALL
            .iter()
            .map(CoreClassifier::protocol_type)
            .collect();

        assert_eq!(paths, CORE_CLASSIFIER_PATHS);
        assert_eq!(types, CORE_PROTOCOL_TYPES);
    }
}
