//! Exhaustive dispatch over element kinds.
//!
//! An [`ElementVisitor`] has one method per core element kind plus
//! [`ElementVisitor::visit_extension`] for plugin kinds. None of the methods
//! has a default, so every visitor handles every core kind.

use crate::element::{
    Association, Class, ConcreteFunctionDefinition, Database, Element, ElementBody, Enumeration,
    ExtensionElement, Package, PackageableConnection, PackageableRuntime, PrimitiveType, Profile,
    Service,
};
use crate::mapping::Mapping;

/// Visitor over the element kinds.
///
/// Each method receives the element (name, path, lifecycle) and its body
/// already viewed as the concrete kind.
pub trait ElementVisitor {
    type Output;

    fn visit_package(&mut self, element: &Element, package: &Package) -> Self::Output;

    fn visit_primitive_type(&mut self, element: &Element, primitive: &PrimitiveType) -> Self::Output;

    fn visit_profile(&mut self, element: &Element, profile: &Profile) -> Self::Output;

    fn visit_enumeration(&mut self, element: &Element, enumeration: &Enumeration) -> Self::Output;

    fn visit_class(&mut self, element: &Element, class: &Class) -> Self::Output;

    fn visit_association(&mut self, element: &Element, association: &Association) -> Self::Output;

    fn visit_function(&mut self, element: &Element, function: &ConcreteFunctionDefinition) -> Self::Output;

    fn visit_database(&mut self, element: &Element, database: &Database) -> Self::Output;

    fn visit_mapping(&mut self, element: &Element, mapping: &Mapping) -> Self::Output;

    fn visit_connection(&mut self, element: &Element, connection: &PackageableConnection) -> Self::Output;

    fn visit_runtime(&mut self, element: &Element, runtime: &PackageableRuntime) -> Self::Output;

    fn visit_service(&mut self, element: &Element, service: &Service) -> Self::Output;

    /// Visits a plugin-contributed element. Implementations usually look the
    /// kind up in the [`PluginRegistry`](crate::plugin::PluginRegistry).
    fn visit_extension(&mut self, element: &Element, extension: &dyn ExtensionElement) -> Self::Output;
}

impl Element {
    /// Dispatches to the visitor method matching this element's kind.
    pub fn accept<V: ElementVisitor + ?Sized>(&self, visitor: &mut V) -> V::Output {
        match self.body() {
            ElementBody::Package(package) => visitor.visit_package(self, package),
            ElementBody::PrimitiveType(primitive) => visitor.visit_primitive_type(self, primitive),
            ElementBody::Profile(profile) => visitor.visit_profile(self, profile),
            ElementBody::Enumeration(enumeration) => visitor.visit_enumeration(self, enumeration),
            ElementBody::Class(class) => visitor.visit_class(self, class),
            ElementBody::Association(association) => visitor.visit_association(self, association),
            ElementBody::Function(function) => visitor.visit_function(self, function),
            ElementBody::Database(database) => visitor.visit_database(self, database),
            ElementBody::Mapping(mapping) => visitor.visit_mapping(self, mapping),
            ElementBody::Connection(connection) => visitor.visit_connection(self, connection),
            ElementBody::Runtime(runtime) => visitor.visit_runtime(self, runtime),
            ElementBody::Service(service) => visitor.visit_service(self, service),
            ElementBody::Extension(extension) => visitor.visit_extension(self, extension.as_ref()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{element::ElementKind, graph::Graph};

    /// Records the visited kind names.
    struct KindNames;

    impl ElementVisitor for KindNames {
        type Output = &'static str;

        fn visit_package(&mut self, _: &Element, _: &Package) -> &'static str {
            "package"
        }

        fn visit_primitive_type(&mut self, _: &Element, _: &PrimitiveType) -> &'static str {
            "primitive"
        }

        fn visit_profile(&mut self, _: &Element, _: &Profile) -> &'static str {
            "profile"
        }

        fn visit_enumeration(&mut self, _: &Element, _: &Enumeration) -> &'static str {
            "enumeration"
        }

        fn visit_class(&mut self, _: &Element, _: &Class) -> &'static str {
            "class"
        }

        fn visit_association(&mut self, _: &Element, _: &Association) -> &'static str {
            "association"
        }

        fn visit_function(&mut self, _: &Element, _: &ConcreteFunctionDefinition) -> &'static str {
            "function"
        }

        fn visit_database(&mut self, _: &Element, _: &Database) -> &'static str {
            "database"
        }

        fn visit_mapping(&mut self, _: &Element, _: &Mapping) -> &'static str {
            "mapping"
        }

        fn visit_connection(&mut self, _: &Element, _: &PackageableConnection) -> &'static str {
            "connection"
        }

        fn visit_runtime(&mut self, _: &Element, _: &PackageableRuntime) -> &'static str {
            "runtime"
        }

        fn visit_service(&mut self, _: &Element, _: &Service) -> &'static str {
            "service"
        }

        fn visit_extension(&mut self, _: &Element, _: &dyn ExtensionElement) -> &'static str {
            "extension"
        }
    }

    #[test]
    fn test_accept_dispatches_by_kind() {
        let mut graph = Graph::default();
        graph
            .create_element("model::Person", ElementBody::Class(Class::default()))
            .unwrap();
        graph
            .create_element("model::M", ElementBody::Mapping(Mapping::default()))
            .unwrap();

        let names: Vec<&str> = graph
            .elements()
            .filter(|(_, element)| element.kind() != ElementKind::PrimitiveType)
            .map(|(_, element)| element.accept(&mut KindNames))
            .collect();
        assert_eq!(names, vec!["package", "class", "mapping"]);

        let string = graph.get_element("String").unwrap();
        assert_eq!(string.accept(&mut KindNames), "primitive");
    }
}
