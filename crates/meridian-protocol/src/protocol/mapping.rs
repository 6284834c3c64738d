//! Documents of mappings.
//!
//! Class mappings are kept as raw JSON in [`MappingDocument`] because their
//! `_type` is open: the core types are read into [`ClassMapping`], anything
//! else is handed to a mapping extension of the plugin registry.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::protocol::{RelationalOperation, TablePointer};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct MappingInclude {
    #[serde(rename = "_type", default = "MappingInclude::include_mapping")]
    pub kind: String,
    pub included_mapping: String,
}

impl MappingInclude {
    pub const INCLUDE_MAPPING: &'static str = "mappingIncludeMapping";

    pub fn new(included_mapping: String) -> Self {
        Self {
            kind: Self::include_mapping(),
            included_mapping,
        }
    }

    fn include_mapping() -> String {
        Self::INCLUDE_MAPPING.to_string()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct MappingDocument {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub included_mappings: Vec<MappingInclude>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub class_mappings: Vec<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub enumeration_mappings: Vec<EnumerationMapping>,
}

/// Members shared by every class mapping, whatever its `_type`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassMappingHeader {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub class: String,
    #[serde(default)]
    pub root: bool,
}

/// A class mapping of a core `_type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "_type")]
pub enum ClassMapping {
    #[serde(rename = "pureInstance")]
    PureInstance(PureInstanceClassMapping),
    #[serde(rename = "relational")]
    Relational(RelationalClassMapping),
    #[serde(rename = "aggregationAware")]
    AggregationAware(AggregationAwareClassMapping),
    #[serde(rename = "operation")]
    Operation(OperationClassMapping),
}

impl ClassMapping {
    pub const TYPES: [&'static str; 4] = meridian_core::plugin::CORE_CLASS_MAPPING_TYPES;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PureInstanceClassMapping {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub class: String,
    #[serde(default)]
    pub root: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub src_class: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filter: Option<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub property_mappings: Vec<PropertyMapping>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RelationalClassMapping {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub class: String,
    #[serde(default)]
    pub root: bool,
    #[serde(default)]
    pub distinct: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main_table: Option<TablePointer>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub primary_key: Vec<RelationalOperation>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub property_mappings: Vec<PropertyMapping>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AggregationAwareClassMapping {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub class: String,
    #[serde(default)]
    pub root: bool,
    pub main_set_implementation: Box<ClassMapping>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aggregate_set_implementations: Vec<AggregateSetImplementation>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub property_mappings: Vec<PropertyMapping>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AggregateSetImplementation {
    pub index: u32,
    pub aggregate_specification: AggregationSpecification,
    pub set_implementation: ClassMapping,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AggregationSpecification {
    #[serde(default)]
    pub can_aggregate: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub group_by_functions: Vec<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub aggregate_values: Vec<AggregateValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct AggregateValue {
    pub map_fn: Value,
    pub aggregate_fn: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OperationClassMapping {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub class: String,
    #[serde(default)]
    pub root: bool,
    pub operation: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PropertyPointer {
    pub class: String,
    pub property: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "_type")]
pub enum PropertyMapping {
    #[serde(rename = "purePropertyMapping")]
    Pure(PurePropertyMapping),
    #[serde(rename = "relationalPropertyMapping")]
    Relational(RelationalPropertyMapping),
    #[serde(rename = "embeddedPropertyMapping")]
    Embedded(EmbeddedPropertyMapping),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct PurePropertyMapping {
    pub property: PropertyPointer,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enum_mapping_id: Option<String>,
    pub transform: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explode_property: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RelationalPropertyMapping {
    pub property: PropertyPointer,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enum_mapping_id: Option<String>,
    pub relational_operation: RelationalOperation,
}

/// An inline class mapping of the property's class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct EmbeddedPropertyMapping {
    pub property: PropertyPointer,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    pub id: String,
    pub class: String,
    #[serde(default)]
    pub root: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub property_mappings: Vec<PropertyMapping>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct EnumerationMapping {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub enumeration: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub enum_value_mappings: Vec<EnumValueMapping>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct EnumValueMapping {
    pub enum_value: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub source_values: Vec<SourceValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "_type", deny_unknown_fields)]
pub enum SourceValue {
    #[serde(rename = "stringSourceValue")]
    String { value: String },
    #[serde(rename = "integerSourceValue")]
    Integer { value: i64 },
    #[serde(rename = "enumSourceValue")]
    EnumValue { enumeration: String, value: String },
}
