//! Structural hashing of graph content.
//!
//! Every element of the graph exposes a [`HashCode`] computed from its
//! semantically significant fields only. Hashes are SHA-256 digests built with
//! a [`HashBuilder`]; each value written to the builder is length-prefixed so
//! that adjacent fields cannot collide by concatenation.
//!
//! # Example
//!
//! ```
//! use meridian_core::hash::{HashBuilder, HashStructure};
//!
//! let mut builder = HashBuilder::new(HashStructure::Profile);
//! builder.str("model::Tags").strings(["doc", "internal"]);
//! let first = builder.finish();
//!
//! let mut builder = HashBuilder::new(HashStructure::Profile);
//! builder.str("model::Tags").strings(["doc", "internal"]);
//! assert_eq!(first, builder.finish());
//! ```

use std::fmt;

use sha2::{Digest, Sha256};

/// A SHA-256 structural hash.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct HashCode([u8; 32]);

impl HashCode {
    /// Returns the raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Returns the lowercase hexadecimal digest.
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|byte| format!("{byte:02x}")).collect()
    }
}

impl fmt::Display for HashCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sha256:{}", self.to_hex())
    }
}

impl fmt::Debug for HashCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HashCode({})", self.to_hex())
    }
}

/// Tags that open every hash so that different structures never share a digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HashStructure {
    Package,
    PrimitiveType,
    Profile,
    StereotypeReference,
    TaggedValue,
    Multiplicity,
    Enumeration,
    EnumValue,
    Class,
    Property,
    DerivedProperty,
    Constraint,
    Association,
    Function,
    Parameter,
    Database,
    Schema,
    Table,
    Column,
    Join,
    RelationalOperation,
    TablePointer,
    Mapping,
    MappingInclude,
    SetImplementation,
    PropertyMapping,
    AggregationSpecification,
    EnumerationMapping,
    EnumValueMapping,
    Connection,
    Runtime,
    Service,
    ElementPointer,
    Extension,
}

impl HashStructure {
    /// Returns the tag written at the start of the hash.
    pub fn as_str(&self) -> &'static str {
        match self {
            HashStructure::Package => "PACKAGE",
            HashStructure::PrimitiveType => "PRIMITIVE_TYPE",
            HashStructure::Profile => "PROFILE",
            HashStructure::StereotypeReference => "STEREOTYPE_POINTER",
            HashStructure::TaggedValue => "TAGGED_VALUE",
            HashStructure::Multiplicity => "MULTIPLICITY",
            HashStructure::Enumeration => "ENUMERATION",
            HashStructure::EnumValue => "ENUM_VALUE",
            HashStructure::Class => "CLASS",
            HashStructure::Property => "PROPERTY",
            HashStructure::DerivedProperty => "DERIVED_PROPERTY",
            HashStructure::Constraint => "CONSTRAINT",
            HashStructure::Association => "ASSOCIATION",
            HashStructure::Function => "FUNCTION",
            HashStructure::Parameter => "PARAMETER",
            HashStructure::Database => "DATABASE",
            HashStructure::Schema => "SCHEMA",
            HashStructure::Table => "TABLE",
            HashStructure::Column => "COLUMN",
            HashStructure::Join => "JOIN",
            HashStructure::RelationalOperation => "RELATIONAL_OPERATION",
            HashStructure::TablePointer => "TABLE_POINTER",
            HashStructure::Mapping => "MAPPING",
            HashStructure::MappingInclude => "MAPPING_INCLUDE",
            HashStructure::SetImplementation => "SET_IMPLEMENTATION",
            HashStructure::PropertyMapping => "PROPERTY_MAPPING",
            HashStructure::AggregationSpecification => "AGGREGATION_SPECIFICATION",
            HashStructure::EnumerationMapping => "ENUMERATION_MAPPING",
            HashStructure::EnumValueMapping => "ENUM_VALUE_MAPPING",
            HashStructure::Connection => "CONNECTION",
            HashStructure::Runtime => "PACKAGEABLE_RUNTIME",
            HashStructure::Service => "SERVICE",
            HashStructure::ElementPointer => "PACKAGEABLE_ELEMENT_POINTER",
            HashStructure::Extension => "EXTENSION",
        }
    }
}

/// Values that contribute a structural hash to their owner.
pub trait Hashable {
    /// Returns the structural hash of this value.
    fn hash_code(&self) -> HashCode;
}

impl<T: Hashable + ?Sized> Hashable for Box<T> {
    fn hash_code(&self) -> HashCode {
        (**self).hash_code()
    }
}

/// Incremental builder for a [`HashCode`].
#[derive(Clone)]
pub struct HashBuilder {
    hasher: Sha256,
}

impl HashBuilder {
    /// Starts a hash for the given structure.
    pub fn new(structure: HashStructure) -> Self {
        let mut builder = Self {
            hasher: Sha256::new(),
        };
        builder.str(structure.as_str());
        builder
    }

    /// Starts a hash for an extension structure identified by `tag`.
    pub fn extension(tag: &str) -> Self {
        let mut builder = Self::new(HashStructure::Extension);
        builder.str(tag);
        builder
    }

    fn write(&mut self, bytes: &[u8]) {
        self.hasher.update((bytes.len() as u64).to_le_bytes());
        self.hasher.update(bytes);
    }

    /// Writes a string.
    pub fn str(&mut self, value: &str) -> &mut Self {
        self.write(value.as_bytes());
        self
    }

    /// Writes an optional string, distinguishing `None` from `""`.
    pub fn opt_str(&mut self, value: Option<&str>) -> &mut Self {
        match value {
            Some(value) => {
                self.hasher.update([1u8]);
                self.str(value)
            }
            None => {
                self.hasher.update([0u8]);
                self
            }
        }
    }

    /// Writes a list of strings.
    pub fn strings<I, S>(&mut self, values: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let values: Vec<S> = values.into_iter().collect();
        self.hasher.update((values.len() as u64).to_le_bytes());
        for value in &values {
            self.str(value.as_ref());
        }
        self
    }

    /// Writes a boolean.
    pub fn bool(&mut self, value: bool) -> &mut Self {
        self.hasher.update([u8::from(value)]);
        self
    }

    /// Writes an unsigned integer.
    pub fn u64(&mut self, value: u64) -> &mut Self {
        self.hasher.update(value.to_le_bytes());
        self
    }

    /// Writes a signed integer.
    pub fn i64(&mut self, value: i64) -> &mut Self {
        self.hasher.update(value.to_le_bytes());
        self
    }

    /// Writes a JSON value in its compact serialized form.
    ///
    /// Object keys are ordered, so equal values produce equal hashes.
    pub fn json(&mut self, value: &serde_json::Value) -> &mut Self {
        self.str(&value.to_string())
    }

    /// Writes an already computed hash.
    pub fn code(&mut self, code: HashCode) -> &mut Self {
        self.write(code.as_bytes());
        self
    }

    /// Writes the hash of a nested value.
    pub fn hashable(&mut self, value: &(impl Hashable + ?Sized)) -> &mut Self {
        self.code(value.hash_code())
    }

    /// Writes an optional nested value.
    pub fn opt_hashable<T: Hashable>(&mut self, value: Option<&T>) -> &mut Self {
        match value {
            Some(value) => {
                self.hasher.update([1u8]);
                self.hashable(value)
            }
            None => {
                self.hasher.update([0u8]);
                self
            }
        }
    }

    /// Writes a list of nested values, order-sensitive.
    pub fn list<'a, T, I>(&mut self, values: I) -> &mut Self
    where
        T: Hashable + 'a,
        I: IntoIterator<Item = &'a T>,
    {
        let codes: Vec<HashCode> = values.into_iter().map(Hashable::hash_code).collect();
        self.codes(codes)
    }

    /// Writes a list of precomputed hashes, order-sensitive.
    pub fn codes(&mut self, codes: impl IntoIterator<Item = HashCode>) -> &mut Self {
        let codes: Vec<HashCode> = codes.into_iter().collect();
        self.hasher.update((codes.len() as u64).to_le_bytes());
        for code in codes {
            self.code(code);
        }
        self
    }

    /// Returns the digest of everything written so far.
    pub fn finish(&self) -> HashCode {
        let digest = self.hasher.clone().finalize();
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&digest);
        HashCode(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Leaf(&'static str);

    impl Hashable for Leaf {
        fn hash_code(&self) -> HashCode {
            let mut builder = HashBuilder::new(HashStructure::Column);
            builder.str(self.0);
            builder.finish()
        }
    }

    #[test]
    fn test_same_input_same_hash() {
        let mut a = HashBuilder::new(HashStructure::Class);
        a.str("model::Person").bool(true);
        let mut b = HashBuilder::new(HashStructure::Class);
        b.str("model::Person").bool(true);
        assert_eq!(a.finish(), b.finish());
    }

    #[test]
    fn test_structure_tag_changes_hash() {
        let mut a = HashBuilder::new(HashStructure::Class);
        a.str("model::Person");
        let mut b = HashBuilder::new(HashStructure::Enumeration);
        b.str("model::Person");
        assert_ne!(a.finish(), b.finish());
    }

    #[test]
    fn test_length_prefix_prevents_concatenation_collision() {
        let mut a = HashBuilder::new(HashStructure::Class);
        a.str("ab").str("c");
        let mut b = HashBuilder::new(HashStructure::Class);
        b.str("a").str("bc");
        assert_ne!(a.finish(), b.finish());
    }

    #[test]
    fn test_optional_none_differs_from_empty() {
        let mut a = HashBuilder::new(HashStructure::Property);
        a.opt_str(None);
        let mut b = HashBuilder::new(HashStructure::Property);
        b.opt_str(Some(""));
        assert_ne!(a.finish(), b.finish());
    }

    #[test]
    fn test_list_order_matters() {
        let mut a = HashBuilder::new(HashStructure::Table);
        a.list([&Leaf("x"), &Leaf("y")]);
        let mut b = HashBuilder::new(HashStructure::Table);
        b.list([&Leaf("y"), &Leaf("x")]);
        assert_ne!(a.finish(), b.finish());
    }

    #[test]
    fn test_json_key_order_is_irrelevant() {
        let first: serde_json::Value = serde_json::from_str(r#"{"a":1,"b":2}"#).unwrap();
        let second: serde_json::Value = serde_json::from_str(r#"{"b":2,"a":1}"#).unwrap();
        let mut a = HashBuilder::new(HashStructure::Function);
        a.json(&first);
        let mut b = HashBuilder::new(HashStructure::Function);
        b.json(&second);
        assert_eq!(a.finish(), b.finish());
    }

    #[test]
    fn test_display_has_prefix() {
        let code = HashBuilder::new(HashStructure::Package).finish();
        let rendered = code.to_string();
        assert!(rendered.starts_with("sha256:"));
        assert_eq!(rendered.len(), "sha256:".len() + 64);
    }
}
