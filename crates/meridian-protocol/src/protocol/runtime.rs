//! Documents of connections, runtimes and services.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A connection specification. Members beyond `_type` and `element` are
/// connection-type specific and kept verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionValue {
    #[serde(rename = "_type")]
    pub connection_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub element: Option<String>,
    #[serde(flatten)]
    pub specification: Map<String, Value>,
}

impl ConnectionValue {
    /// `element` value of connections to the model store.
    pub const MODEL_STORE: &'static str = "ModelStore";
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ConnectionDocument {
    pub connection_value: ConnectionValue,
}

/// Pointer to a packageable connection (`_type: "connectionPointer"`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConnectionPointer {
    #[serde(rename = "_type")]
    pub kind: String,
    pub connection: String,
}

impl ConnectionPointer {
    pub const TYPE: &'static str = "connectionPointer";

    pub fn new(connection: String) -> Self {
        Self {
            kind: Self::TYPE.to_string(),
            connection,
        }
    }
}

/// `{"type": "MAPPING", "path": "..."}` style pointer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ElementPointer {
    #[serde(rename = "type")]
    pub pointer_type: String,
    pub path: String,
}

impl ElementPointer {
    pub const MAPPING: &'static str = "MAPPING";
    pub const STORE: &'static str = "STORE";

    pub fn new(pointer_type: &str, path: String) -> Self {
        Self {
            pointer_type: pointer_type.to_string(),
            path,
        }
    }
}

/// A connection of a runtime: a [`ConnectionPointer`] or an embedded
/// [`ConnectionValue`], told apart by `_type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IdentifiedConnection {
    pub id: String,
    pub connection: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct StoreConnections {
    pub store: ElementPointer,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub store_connections: Vec<IdentifiedConnection>,
}

/// An engine runtime (`_type: "engineRuntime"`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineRuntime {
    #[serde(rename = "_type", default = "EngineRuntime::engine_runtime")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mappings: Vec<ElementPointer>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub connections: Vec<StoreConnections>,
}

impl EngineRuntime {
    pub const TYPE: &'static str = "engineRuntime";

    pub fn new(mappings: Vec<ElementPointer>, connections: Vec<StoreConnections>) -> Self {
        Self {
            kind: Self::engine_runtime(),
            mappings,
            connections,
        }
    }

    fn engine_runtime() -> String {
        Self::TYPE.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct RuntimeDocument {
    pub runtime_value: EngineRuntime,
}

/// Pointer to a packageable runtime (`_type: "runtimePointer"`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RuntimePointer {
    #[serde(rename = "_type")]
    pub kind: String,
    pub runtime: String,
}

impl RuntimePointer {
    pub const TYPE: &'static str = "runtimePointer";

    pub fn new(runtime: String) -> Self {
        Self {
            kind: Self::TYPE.to_string(),
            runtime,
        }
    }
}

/// A single execution (`_type: "pureSingleExecution"`). The runtime is a
/// [`RuntimePointer`] or an embedded [`EngineRuntime`], told apart by `_type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PureSingleExecution {
    #[serde(rename = "_type", default = "PureSingleExecution::single_execution")]
    pub kind: String,
    pub func: Value,
    pub mapping: String,
    pub runtime: Value,
}

impl PureSingleExecution {
    pub const TYPE: &'static str = "pureSingleExecution";

    pub fn new(func: Value, mapping: String, runtime: Value) -> Self {
        Self {
            kind: Self::single_execution(),
            func,
            mapping,
            runtime,
        }
    }

    fn single_execution() -> String {
        Self::TYPE.to_string()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct ServiceDocument {
    #[serde(default)]
    pub pattern: String,
    #[serde(default)]
    pub documentation: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub owners: Vec<String>,
    #[serde(default)]
    pub auto_activate_updates: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution: Option<PureSingleExecution>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stereotypes: Vec<super::StereotypePointer>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tagged_values: Vec<super::TaggedValue>,
}
