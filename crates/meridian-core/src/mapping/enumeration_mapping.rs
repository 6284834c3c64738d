//! Enumeration mappings.

use crate::{
    element::Enumeration,
    hash::{HashBuilder, HashCode, HashStructure, Hashable},
    mapping::MappingElementId,
    reference::{Reference, Resolvable},
};

/// Maps source values onto the values of an enumeration.
#[derive(Debug)]
pub struct EnumerationMapping {
    pub id: MappingElementId,
    pub enumeration: Reference<Enumeration>,
    pub values: Vec<EnumValueMapping>,
}

impl EnumerationMapping {
    pub fn new(id: MappingElementId, enumeration: Reference<Enumeration>) -> Self {
        Self {
            id,
            enumeration,
            values: Vec::new(),
        }
    }

    /// Returns the mapping of one enumeration value.
    pub fn value(&self, enum_value: &str) -> Option<&EnumValueMapping> {
        self.values
            .iter()
            .find(|mapping| mapping.enum_value == enum_value)
    }

    pub(crate) fn references(&self) -> Vec<&dyn Resolvable> {
        let mut references: Vec<&dyn Resolvable> = vec![&self.enumeration];
        for value in &self.values {
            for source in &value.source_values {
                if let SourceValue::EnumValue { enumeration, .. } = source {
                    references.push(enumeration);
                }
            }
        }
        references
    }
}

impl Hashable for EnumerationMapping {
    fn hash_code(&self) -> HashCode {
        let mut builder = HashBuilder::new(HashStructure::EnumerationMapping);
        builder
            .opt_str(self.id.written())
            .str(&self.enumeration.path().as_string())
            .list(&self.values);
        builder.finish()
    }
}

/// Source values mapped to one enumeration value.
#[derive(Debug, Clone)]
pub struct EnumValueMapping {
    pub enum_value: String,
    pub source_values: Vec<SourceValue>,
}

impl Hashable for EnumValueMapping {
    fn hash_code(&self) -> HashCode {
        let mut builder = HashBuilder::new(HashStructure::EnumValueMapping);
        builder.str(&self.enum_value);
        for source in &self.source_values {
            match source {
                SourceValue::String(value) => builder.str("string").str(value),
                SourceValue::Integer(value) => builder.str("integer").i64(*value),
                SourceValue::EnumValue { enumeration, value } => builder
                    .str("enum")
                    .str(&enumeration.path().as_string())
                    .str(value),
            };
        }
        builder.finish()
    }
}

#[derive(Debug, Clone)]
pub enum SourceValue {
    String(String),
    Integer(i64),
    EnumValue {
        enumeration: Reference<Enumeration>,
        value: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gender_mapping() -> EnumerationMapping {
        let mut mapping = EnumerationMapping::new(
            MappingElementId::explicit("gender"),
            Reference::new("model::Gender"),
        );
        mapping.values.push(EnumValueMapping {
            enum_value: "MALE".to_string(),
            source_values: vec![SourceValue::String("M".to_string()), SourceValue::Integer(1)],
        });
        mapping.values.push(EnumValueMapping {
            enum_value: "FEMALE".to_string(),
            source_values: vec![SourceValue::EnumValue {
                enumeration: Reference::new("source::Sex"),
                value: "F".to_string(),
            }],
        });
        mapping
    }

    #[test]
    fn test_value_lookup() {
        let mapping = gender_mapping();
        assert_eq!(mapping.value("MALE").unwrap().source_values.len(), 2);
        assert!(mapping.value("OTHER").is_none());
    }

    #[test]
    fn test_references_include_source_enumerations() {
        let mapping = gender_mapping();
        let paths: Vec<String> = mapping
            .references()
            .iter()
            .map(|reference| reference.path().as_string())
            .collect();
        assert_eq!(paths, vec!["model::Gender", "source::Sex"]);
    }

    #[test]
    fn test_string_and_integer_sources_hash_apart() {
        let string = EnumValueMapping {
            enum_value: "MALE".to_string(),
            source_values: vec![SourceValue::String("1".to_string())],
        };
        let integer = EnumValueMapping {
            enum_value: "MALE".to_string(),
            source_values: vec![SourceValue::Integer(1)],
        };
        assert_ne!(string.hash_code(), integer.hash_code());
    }
}
