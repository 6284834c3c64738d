//! Domain model kinds: packages, types, profiles, associations and functions.

use std::fmt;

use crate::{
    element::ElementId,
    hash::{HashBuilder, HashCode, HashStructure, Hashable},
    reference::{Reference, Resolvable},
};

/// Elements that can be the type of a property or parameter.
pub trait Type: fmt::Debug {}

/// Elements that declare properties.
pub trait PropertyOwner: fmt::Debug {
    /// Returns the declared properties.
    fn properties(&self) -> &[Property];

    /// Finds a declared property by name.
    fn find_property(&self, name: &str) -> Option<&Property> {
        self.properties().iter().find(|property| property.name == name)
    }
}

/// Elements carrying stereotypes and tagged values.
pub trait Annotated {
    fn stereotypes(&self) -> &[StereotypeReference];

    fn tagged_values(&self) -> &[TaggedValue];

    fn stereotypes_mut(&mut self) -> &mut Vec<StereotypeReference>;

    fn tagged_values_mut(&mut self) -> &mut Vec<TaggedValue>;

    fn add_stereotype(&mut self, stereotype: StereotypeReference) {
        self.stereotypes_mut().push(stereotype);
    }

    /// Removes the stereotype at `index`, returning it.
    fn delete_stereotype(&mut self, index: usize) -> Option<StereotypeReference> {
        let stereotypes = self.stereotypes_mut();
        (index < stereotypes.len()).then(|| stereotypes.remove(index))
    }

    fn add_tagged_value(&mut self, tagged_value: TaggedValue) {
        self.tagged_values_mut().push(tagged_value);
    }

    /// Removes the tagged value at `index`, returning it.
    fn delete_tagged_value(&mut self, index: usize) -> Option<TaggedValue> {
        let tagged_values = self.tagged_values_mut();
        (index < tagged_values.len()).then(|| tagged_values.remove(index))
    }
}

macro_rules! annotated {
    ($ty:ty) => {
        impl Annotated for $ty {
            fn stereotypes(&self) -> &[StereotypeReference] {
                &self.stereotypes
            }

            fn tagged_values(&self) -> &[TaggedValue] {
                &self.tagged_values
            }

            fn stereotypes_mut(&mut self) -> &mut Vec<StereotypeReference> {
                &mut self.stereotypes
            }

            fn tagged_values_mut(&mut self) -> &mut Vec<TaggedValue> {
                &mut self.tagged_values
            }
        }
    };
}

pub(crate) use annotated;

pub(crate) fn annotation_references(annotated: &dyn Annotated) -> Vec<&dyn Resolvable> {
    let stereotypes = annotated
        .stereotypes()
        .iter()
        .map(|stereotype| &stereotype.profile as &dyn Resolvable);
    let tags = annotated
        .tagged_values()
        .iter()
        .map(|tagged_value| &tagged_value.tag.profile as &dyn Resolvable);
    stereotypes.chain(tags).collect()
}

fn hash_annotations(builder: &mut HashBuilder, annotated: &dyn Annotated) {
    builder
        .list(annotated.stereotypes())
        .list(annotated.tagged_values());
}

// =============================================================================
// Packages and primitive types
// =============================================================================

/// A namespace owning other elements.
#[derive(Debug, Clone, Default)]
pub struct Package {
    pub(crate) children: Vec<ElementId>,
}

impl Package {
    /// Returns the owned elements in insertion order.
    pub fn children(&self) -> &[ElementId] {
        &self.children
    }
}

/// A built-in scalar type (`String`, `Integer`, ...).
#[derive(Debug, Clone, Copy, Default)]
pub struct PrimitiveType;

impl PrimitiveType {
    /// Names of the primitive types seeded into every graph.
    pub const NAMES: [&'static str; 12] = [
        "String",
        "Boolean",
        "Binary",
        "Date",
        "StrictDate",
        "DateTime",
        "StrictTime",
        "Number",
        "Float",
        "Decimal",
        "Integer",
        "Byte",
    ];
}

impl Type for PrimitiveType {}

// =============================================================================
// Profiles and annotations
// =============================================================================

/// A profile declaring stereotypes and tags.
#[derive(Debug, Clone, Default)]
pub struct Profile {
    pub stereotypes: Vec<String>,
    pub tags: Vec<String>,
}

impl Profile {
    pub fn has_stereotype(&self, value: &str) -> bool {
        self.stereotypes.iter().any(|stereotype| stereotype == value)
    }

    pub fn has_tag(&self, value: &str) -> bool {
        self.tags.iter().any(|tag| tag == value)
    }

    pub(crate) fn structural_hash(&self, path: &str) -> HashCode {
        let mut builder = HashBuilder::new(HashStructure::Profile);
        builder
            .str(path)
            .strings(&self.stereotypes)
            .strings(&self.tags);
        builder.finish()
    }
}

/// A stereotype applied to an element: `profile.value`.
#[derive(Debug, Clone)]
pub struct StereotypeReference {
    pub profile: Reference<Profile>,
    pub value: String,
}

impl StereotypeReference {
    pub fn new(profile: Reference<Profile>, value: impl Into<String>) -> Self {
        Self {
            profile,
            value: value.into(),
        }
    }
}

impl Hashable for StereotypeReference {
    fn hash_code(&self) -> HashCode {
        let mut builder = HashBuilder::new(HashStructure::StereotypeReference);
        builder
            .str(&self.profile.path().as_string())
            .str(&self.value);
        builder.finish()
    }
}

/// A tag of a profile.
#[derive(Debug, Clone)]
pub struct TagReference {
    pub profile: Reference<Profile>,
    pub value: String,
}

/// A tag applied to an element together with its value.
#[derive(Debug, Clone)]
pub struct TaggedValue {
    pub tag: TagReference,
    pub value: String,
}

impl TaggedValue {
    pub fn new(profile: Reference<Profile>, tag: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            tag: TagReference {
                profile,
                value: tag.into(),
            },
            value: value.into(),
        }
    }
}

impl Hashable for TaggedValue {
    fn hash_code(&self) -> HashCode {
        let mut builder = HashBuilder::new(HashStructure::TaggedValue);
        builder
            .str(&self.tag.profile.path().as_string())
            .str(&self.tag.value)
            .str(&self.value);
        builder.finish()
    }
}

// =============================================================================
// Multiplicity and properties
// =============================================================================

/// Cardinality bounds; `upper_bound == None` means unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Multiplicity {
    pub lower_bound: u32,
    pub upper_bound: Option<u32>,
}

impl Multiplicity {
    pub const ONE: Multiplicity = Multiplicity::new(1, Some(1));
    pub const ZERO_ONE: Multiplicity = Multiplicity::new(0, Some(1));
    pub const ZERO_MANY: Multiplicity = Multiplicity::new(0, None);
    pub const ONE_MANY: Multiplicity = Multiplicity::new(1, None);

    pub const fn new(lower_bound: u32, upper_bound: Option<u32>) -> Self {
        Self {
            lower_bound,
            upper_bound,
        }
    }

    /// Returns `true` when more than one value is allowed.
    pub fn is_many(&self) -> bool {
        self.upper_bound.is_none_or(|upper| upper > 1)
    }
}

impl fmt::Display for Multiplicity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.upper_bound {
            Some(upper) if upper == self.lower_bound => write!(f, "[{upper}]"),
            Some(upper) => write!(f, "[{}..{upper}]", self.lower_bound),
            None if self.lower_bound == 0 => write!(f, "[*]"),
            None => write!(f, "[{}..*]", self.lower_bound),
        }
    }
}

impl Hashable for Multiplicity {
    fn hash_code(&self) -> HashCode {
        let mut builder = HashBuilder::new(HashStructure::Multiplicity);
        builder.u64(u64::from(self.lower_bound));
        match self.upper_bound {
            Some(upper) => builder.str(&upper.to_string()),
            None => builder.str("*"),
        };
        builder.finish()
    }
}

/// A property declared on a class or an association.
#[derive(Debug, Clone)]
pub struct Property {
    pub name: String,
    pub multiplicity: Multiplicity,
    pub property_type: Reference<dyn Type>,
    pub stereotypes: Vec<StereotypeReference>,
    pub tagged_values: Vec<TaggedValue>,
}

impl Property {
    pub fn new(
        name: impl Into<String>,
        multiplicity: Multiplicity,
        property_type: Reference<dyn Type>,
    ) -> Self {
        Self {
            name: name.into(),
            multiplicity,
            property_type,
            stereotypes: Vec::new(),
            tagged_values: Vec::new(),
        }
    }

    fn references(&self) -> Vec<&dyn Resolvable> {
        let mut references: Vec<&dyn Resolvable> = vec![&self.property_type];
        references.extend(annotation_references(self));
        references
    }
}

annotated!(Property);

impl Hashable for Property {
    fn hash_code(&self) -> HashCode {
        let mut builder = HashBuilder::new(HashStructure::Property);
        builder
            .str(&self.name)
            .hashable(&self.multiplicity)
            .str(&self.property_type.path().as_string());
        hash_annotations(&mut builder, self);
        builder.finish()
    }
}

/// A property whose value is computed by a lambda.
#[derive(Debug, Clone)]
pub struct DerivedProperty {
    pub name: String,
    pub return_type: Reference<dyn Type>,
    pub return_multiplicity: Multiplicity,
    pub parameters: serde_json::Value,
    pub body: serde_json::Value,
    pub stereotypes: Vec<StereotypeReference>,
    pub tagged_values: Vec<TaggedValue>,
}

annotated!(DerivedProperty);

impl Hashable for DerivedProperty {
    fn hash_code(&self) -> HashCode {
        let mut builder = HashBuilder::new(HashStructure::DerivedProperty);
        builder
            .str(&self.name)
            .str(&self.return_type.path().as_string())
            .hashable(&self.return_multiplicity)
            .json(&self.parameters)
            .json(&self.body);
        hash_annotations(&mut builder, self);
        builder.finish()
    }
}

/// A named boolean lambda that instances of a class must satisfy.
#[derive(Debug, Clone)]
pub struct Constraint {
    pub name: String,
    pub function_definition: serde_json::Value,
}

impl Hashable for Constraint {
    fn hash_code(&self) -> HashCode {
        let mut builder = HashBuilder::new(HashStructure::Constraint);
        builder.str(&self.name).json(&self.function_definition);
        builder.finish()
    }
}

// =============================================================================
// Enumerations
// =============================================================================

/// A closed set of named values.
#[derive(Debug, Clone, Default)]
pub struct Enumeration {
    pub values: Vec<EnumValue>,
    pub stereotypes: Vec<StereotypeReference>,
    pub tagged_values: Vec<TaggedValue>,
}

impl Enumeration {
    pub fn value(&self, name: &str) -> Option<&EnumValue> {
        self.values.iter().find(|value| value.name == name)
    }

    pub(crate) fn references(&self) -> Vec<&dyn Resolvable> {
        let mut references = annotation_references(self);
        for value in &self.values {
            references.extend(annotation_references(value));
        }
        references
    }

    pub(crate) fn structural_hash(&self, path: &str) -> HashCode {
        let mut builder = HashBuilder::new(HashStructure::Enumeration);
        builder.str(path).list(&self.values);
        hash_annotations(&mut builder, self);
        builder.finish()
    }
}

annotated!(Enumeration);

impl Type for Enumeration {}

/// A single value of an enumeration.
#[derive(Debug, Clone)]
pub struct EnumValue {
    pub name: String,
    pub stereotypes: Vec<StereotypeReference>,
    pub tagged_values: Vec<TaggedValue>,
}

impl EnumValue {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stereotypes: Vec::new(),
            tagged_values: Vec::new(),
        }
    }
}

annotated!(EnumValue);

impl Hashable for EnumValue {
    fn hash_code(&self) -> HashCode {
        let mut builder = HashBuilder::new(HashStructure::EnumValue);
        builder.str(&self.name);
        hash_annotations(&mut builder, self);
        builder.finish()
    }
}

// =============================================================================
// Classes and associations
// =============================================================================

/// A class with properties, super types and constraints.
#[derive(Debug, Clone, Default)]
pub struct Class {
    pub super_types: Vec<Reference<Class>>,
    pub properties: Vec<Property>,
    pub derived_properties: Vec<DerivedProperty>,
    pub constraints: Vec<Constraint>,
    pub stereotypes: Vec<StereotypeReference>,
    pub tagged_values: Vec<TaggedValue>,
}

impl Class {
    pub fn add_property(&mut self, property: Property) {
        self.properties.push(property);
    }

    /// Removes the property called `name`, returning it.
    pub fn delete_property(&mut self, name: &str) -> Option<Property> {
        let index = self
            .properties
            .iter()
            .position(|property| property.name == name)?;
        Some(self.properties.remove(index))
    }

    pub fn add_super_type(&mut self, super_type: Reference<Class>) {
        self.super_types.push(super_type);
    }

    pub(crate) fn references(&self) -> Vec<&dyn Resolvable> {
        let mut references: Vec<&dyn Resolvable> = Vec::new();
        references.extend(self.super_types.iter().map(|r| r as &dyn Resolvable));
        for property in &self.properties {
            references.extend(property.references());
        }
        for derived in &self.derived_properties {
            references.push(&derived.return_type);
            references.extend(annotation_references(derived));
        }
        references.extend(annotation_references(self));
        references
    }

    pub(crate) fn structural_hash(&self, path: &str) -> HashCode {
        let mut builder = HashBuilder::new(HashStructure::Class);
        builder
            .str(path)
            .list(&self.super_types)
            .list(&self.properties)
            .list(&self.derived_properties)
            .list(&self.constraints);
        hash_annotations(&mut builder, self);
        builder.finish()
    }
}

annotated!(Class);

impl Type for Class {}

impl PropertyOwner for Class {
    fn properties(&self) -> &[Property] {
        &self.properties
    }
}

/// A binary relationship between two classes.
///
/// Each of the two properties is navigable from the class typed by the
/// other property.
#[derive(Debug, Clone, Default)]
pub struct Association {
    pub properties: Vec<Property>,
    pub derived_properties: Vec<DerivedProperty>,
    pub stereotypes: Vec<StereotypeReference>,
    pub tagged_values: Vec<TaggedValue>,
}

impl Association {
    /// Returns the property on the opposite end of `name`.
    pub fn opposite(&self, name: &str) -> Option<&Property> {
        match self.properties.as_slice() {
            [first, second] if first.name == name => Some(second),
            [first, second] if second.name == name => Some(first),
            _ => None,
        }
    }

    pub(crate) fn references(&self) -> Vec<&dyn Resolvable> {
        let mut references: Vec<&dyn Resolvable> = Vec::new();
        for property in &self.properties {
            references.extend(property.references());
        }
        for derived in &self.derived_properties {
            references.push(&derived.return_type);
            references.extend(annotation_references(derived));
        }
        references.extend(annotation_references(self));
        references
    }

    pub(crate) fn structural_hash(&self, path: &str) -> HashCode {
        let mut builder = HashBuilder::new(HashStructure::Association);
        builder
            .str(path)
            .list(&self.properties)
            .list(&self.derived_properties);
        hash_annotations(&mut builder, self);
        builder.finish()
    }
}

annotated!(Association);

impl PropertyOwner for Association {
    fn properties(&self) -> &[Property] {
        &self.properties
    }
}

// =============================================================================
// Functions
// =============================================================================

/// A declared function parameter.
#[derive(Debug, Clone)]
pub struct Parameter {
    pub name: String,
    pub parameter_type: Reference<dyn Type>,
    pub multiplicity: Multiplicity,
    /// Protocol `_type` of the parameter, kept only when it was declared.
    pub kind: Option<String>,
}

impl Parameter {
    pub fn new(
        name: impl Into<String>,
        parameter_type: Reference<dyn Type>,
        multiplicity: Multiplicity,
    ) -> Self {
        Self {
            name: name.into(),
            parameter_type,
            multiplicity,
            kind: None,
        }
    }

    pub fn with_kind(mut self, kind: Option<String>) -> Self {
        self.kind = kind;
        self
    }
}

impl Hashable for Parameter {
    fn hash_code(&self) -> HashCode {
        let mut builder = HashBuilder::new(HashStructure::Parameter);
        builder
            .str(&self.name)
            .str(&self.parameter_type.path().as_string())
            .hashable(&self.multiplicity);
        builder.finish()
    }
}

/// A function with a declared signature and a lambda body.
#[derive(Debug, Clone)]
pub struct ConcreteFunctionDefinition {
    pub parameters: Vec<Parameter>,
    pub return_type: Reference<dyn Type>,
    pub return_multiplicity: Multiplicity,
    pub body: Vec<serde_json::Value>,
    pub stereotypes: Vec<StereotypeReference>,
    pub tagged_values: Vec<TaggedValue>,
}

impl ConcreteFunctionDefinition {
    pub fn new(return_type: Reference<dyn Type>, return_multiplicity: Multiplicity) -> Self {
        Self {
            parameters: Vec::new(),
            return_type,
            return_multiplicity,
            body: Vec::new(),
            stereotypes: Vec::new(),
            tagged_values: Vec::new(),
        }
    }

    pub fn add_parameter(&mut self, parameter: Parameter) {
        self.parameters.push(parameter);
    }

    /// Removes the parameter called `name`, returning it.
    pub fn delete_parameter(&mut self, name: &str) -> Option<Parameter> {
        let index = self
            .parameters
            .iter()
            .position(|parameter| parameter.name == name)?;
        Some(self.parameters.remove(index))
    }

    pub fn set_return_type(&mut self, return_type: Reference<dyn Type>) {
        self.return_type = return_type;
    }

    pub fn set_return_multiplicity(&mut self, multiplicity: Multiplicity) {
        self.return_multiplicity = multiplicity;
    }

    pub fn set_body(&mut self, body: Vec<serde_json::Value>) {
        self.body = body;
    }

    pub(crate) fn references(&self) -> Vec<&dyn Resolvable> {
        let mut references: Vec<&dyn Resolvable> = vec![&self.return_type];
        references.extend(
            self.parameters
                .iter()
                .map(|parameter| &parameter.parameter_type as &dyn Resolvable),
        );
        references.extend(annotation_references(self));
        references
    }

    pub(crate) fn structural_hash(&self, path: &str) -> HashCode {
        let mut builder = HashBuilder::new(HashStructure::Function);
        builder
            .str(path)
            .list(&self.parameters)
            .str(&self.return_type.path().as_string())
            .hashable(&self.return_multiplicity);
        hash_annotations(&mut builder, self);
        for statement in &self.body {
            builder.json(statement);
        }
        builder.finish()
    }
}

annotated!(ConcreteFunctionDefinition);

#[cfg(test)]
mod tests {
    use super::*;

    fn string_property(name: &str) -> Property {
        Property::new(name, Multiplicity::ONE, Reference::new("String"))
    }

    #[test]
    fn test_multiplicity_display() {
        assert_eq!(Multiplicity::ONE.to_string(), "[1]");
        assert_eq!(Multiplicity::ZERO_ONE.to_string(), "[0..1]");
        assert_eq!(Multiplicity::ZERO_MANY.to_string(), "[*]");
        assert_eq!(Multiplicity::ONE_MANY.to_string(), "[1..*]");
        assert!(Multiplicity::ZERO_MANY.is_many());
        assert!(!Multiplicity::ONE.is_many());
    }

    #[test]
    fn test_class_property_lookup() {
        let mut class = Class::default();
        class.add_property(string_property("name"));
        class.add_property(string_property("email"));

        assert!(class.find_property("email").is_some());
        assert!(class.find_property("age").is_none());
        assert!(class.delete_property("name").is_some());
        assert_eq!(class.properties.len(), 1);
    }

    #[test]
    fn test_association_opposite() {
        let association = Association {
            properties: vec![
                Property::new("employees", Multiplicity::ZERO_MANY, Reference::new("model::Person")),
                Property::new("firm", Multiplicity::ZERO_ONE, Reference::new("model::Firm")),
            ],
            ..Association::default()
        };

        let opposite = association.opposite("firm").unwrap();
        assert_eq!(opposite.name, "employees");
        assert!(association.opposite("missing").is_none());
    }

    #[test]
    fn test_function_mutators_change_hash() {
        let mut function =
            ConcreteFunctionDefinition::new(Reference::new("String"), Multiplicity::ONE);
        let before = function.structural_hash("model::f");

        function.add_parameter(Parameter::new(
            "input",
            Reference::new("Integer"),
            Multiplicity::ONE,
        ));
        let with_parameter = function.structural_hash("model::f");
        assert_ne!(before, with_parameter);

        assert!(function.delete_parameter("input").is_some());
        assert_eq!(before, function.structural_hash("model::f"));

        function.add_tagged_value(TaggedValue::new(Reference::new("meta::doc"), "doc", "text"));
        assert_ne!(before, function.structural_hash("model::f"));
        assert!(function.delete_tagged_value(0).is_some());
        assert!(function.delete_tagged_value(0).is_none());
    }

    #[test]
    fn test_function_body_is_hashed() {
        let mut function =
            ConcreteFunctionDefinition::new(Reference::new("String"), Multiplicity::ONE);
        let before = function.structural_hash("model::f");
        function.set_body(vec![serde_json::json!({"_type": "string", "value": "x"})]);
        assert_ne!(before, function.structural_hash("model::f"));
    }

    #[test]
    fn test_references_cover_annotations() {
        let mut class = Class::default();
        class.add_super_type(Reference::new("model::Base"));
        class.add_property(string_property("name"));
        class.add_stereotype(StereotypeReference::new(Reference::new("meta::Profile"), "tag"));

        let paths: Vec<String> = class
            .references()
            .iter()
            .map(|reference| reference.path().as_string())
            .collect();
        assert_eq!(paths, vec!["model::Base", "String", "meta::Profile"]);
    }

    #[test]
    fn test_profile_lookup() {
        let profile = Profile {
            stereotypes: vec!["deprecated".to_string()],
            tags: vec!["doc".to_string()],
        };
        assert!(profile.has_stereotype("deprecated"));
        assert!(!profile.has_stereotype("doc"));
        assert!(profile.has_tag("doc"));
    }
}
