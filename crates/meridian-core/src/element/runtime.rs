//! Connections, runtimes and services.

use serde_json::{Map, Value};

use crate::{
    element::{
        ElementId, Store,
        domain::{Annotated, StereotypeReference, TaggedValue, annotated, annotation_references},
    },
    hash::{HashBuilder, HashCode, HashStructure, Hashable},
    mapping::Mapping,
    reference::{Reference, Resolvable},
};

/// Store a connection is bound to.
#[derive(Debug, Clone)]
pub enum ConnectionStore {
    /// The in-memory model store (`ModelStore`).
    Model,
    Store(Reference<dyn Store>),
}

impl ConnectionStore {
    pub const MODEL_STORE: &'static str = "ModelStore";

    /// Path written for the store: `ModelStore` or the store element path.
    pub fn path(&self) -> String {
        match self {
            ConnectionStore::Model => Self::MODEL_STORE.to_string(),
            ConnectionStore::Store(store) => store.path().as_string(),
        }
    }

    /// The bound store element, `None` for the model store.
    pub fn target(&self) -> Option<ElementId> {
        match self {
            ConnectionStore::Model => None,
            ConnectionStore::Store(store) => store.target(),
        }
    }
}

impl Hashable for ConnectionStore {
    fn hash_code(&self) -> HashCode {
        let mut builder = HashBuilder::new(HashStructure::Connection);
        builder.str(&self.path());
        builder.finish()
    }
}

/// A connection to a store.
///
/// The connection-type specific settings are kept as an opaque JSON object.
#[derive(Debug, Clone)]
pub struct Connection {
    pub connection_type: String,
    pub store: Option<ConnectionStore>,
    pub specification: Map<String, Value>,
}

impl Connection {
    pub(crate) fn references(&self) -> Vec<&dyn Resolvable> {
        match &self.store {
            Some(ConnectionStore::Store(store)) => vec![store as &dyn Resolvable],
            _ => Vec::new(),
        }
    }
}

impl Hashable for Connection {
    fn hash_code(&self) -> HashCode {
        let mut builder = HashBuilder::new(HashStructure::Connection);
        builder.str(&self.connection_type);
        builder.opt_str(self.store.as_ref().map(ConnectionStore::path).as_deref());
        builder.json(&Value::Object(self.specification.clone()));
        builder.finish()
    }
}

/// A connection declared as a top-level element.
#[derive(Debug, Clone)]
pub struct PackageableConnection {
    pub connection: Connection,
}

impl PackageableConnection {
    pub(crate) fn structural_hash(&self, path: &str) -> HashCode {
        let mut builder = HashBuilder::new(HashStructure::Connection);
        builder.str(path).hashable(&self.connection);
        builder.finish()
    }
}

/// A connection value inside a runtime: either a pointer or inline.
#[derive(Debug, Clone)]
pub enum ConnectionValue {
    Pointer(Reference<PackageableConnection>),
    Embedded(Connection),
}

#[derive(Debug, Clone)]
pub struct IdentifiedConnection {
    pub id: String,
    pub connection: ConnectionValue,
}

impl Hashable for IdentifiedConnection {
    fn hash_code(&self) -> HashCode {
        let mut builder = HashBuilder::new(HashStructure::Connection);
        builder.str(&self.id);
        match &self.connection {
            ConnectionValue::Pointer(pointer) => builder.str("pointer").hashable(pointer),
            ConnectionValue::Embedded(connection) => builder.str("embedded").hashable(connection),
        };
        builder.finish()
    }
}

/// Connections grouped by the store they connect to.
#[derive(Debug, Clone)]
pub struct StoreConnections {
    pub store: ConnectionStore,
    pub connections: Vec<IdentifiedConnection>,
}

/// Mappings plus the connections needed to execute them.
#[derive(Debug, Clone, Default)]
pub struct EngineRuntime {
    pub mappings: Vec<Reference<Mapping>>,
    pub connections: Vec<StoreConnections>,
}

impl EngineRuntime {
    pub(crate) fn references(&self) -> Vec<&dyn Resolvable> {
        let mut references: Vec<&dyn Resolvable> = self
            .mappings
            .iter()
            .map(|mapping| mapping as &dyn Resolvable)
            .collect();
        for group in &self.connections {
            if let ConnectionStore::Store(store) = &group.store {
                references.push(store);
            }
            for identified in &group.connections {
                match &identified.connection {
                    ConnectionValue::Pointer(pointer) => references.push(pointer),
                    ConnectionValue::Embedded(connection) => {
                        references.extend(connection.references())
                    }
                }
            }
        }
        references
    }

    pub(crate) fn prune_dead_references(&mut self, is_dead: &dyn Fn(ElementId) -> bool) -> usize {
        let before = self.mappings.len() + self.connections.len();
        self.mappings
            .retain(|mapping| !mapping.target().is_some_and(is_dead));
        self.connections
            .retain(|group| !group.store.target().is_some_and(is_dead));
        before - self.mappings.len() - self.connections.len()
    }
}

impl Hashable for EngineRuntime {
    fn hash_code(&self) -> HashCode {
        let mut builder = HashBuilder::new(HashStructure::Runtime);
        builder.list(&self.mappings);
        for group in &self.connections {
            builder.hashable(&group.store).list(&group.connections);
        }
        builder.finish()
    }
}

/// A runtime declared as a top-level element.
#[derive(Debug, Clone, Default)]
pub struct PackageableRuntime {
    pub runtime: EngineRuntime,
}

impl PackageableRuntime {
    pub(crate) fn structural_hash(&self, path: &str) -> HashCode {
        let mut builder = HashBuilder::new(HashStructure::Runtime);
        builder.str(path).hashable(&self.runtime);
        builder.finish()
    }
}

/// Runtime used by a service execution.
#[derive(Debug, Clone)]
pub enum RuntimeValue {
    Pointer(Reference<PackageableRuntime>),
    Embedded(EngineRuntime),
}

/// A query executed against one mapping and runtime.
#[derive(Debug, Clone)]
pub struct PureSingleExecution {
    pub func: Value,
    pub mapping: Reference<Mapping>,
    pub runtime: RuntimeValue,
}

/// An executable, addressable query.
#[derive(Debug, Clone, Default)]
pub struct Service {
    pub pattern: String,
    pub documentation: String,
    pub owners: Vec<String>,
    pub auto_activate_updates: bool,
    pub execution: Option<PureSingleExecution>,
    pub stereotypes: Vec<StereotypeReference>,
    pub tagged_values: Vec<TaggedValue>,
}

impl Service {
    pub(crate) fn references(&self) -> Vec<&dyn Resolvable> {
        let mut references: Vec<&dyn Resolvable> = Vec::new();
        if let Some(execution) = &self.execution {
            references.push(&execution.mapping);
            match &execution.runtime {
                RuntimeValue::Pointer(pointer) => references.push(pointer),
                RuntimeValue::Embedded(runtime) => references.extend(runtime.references()),
            }
        }
        references.extend(annotation_references(self));
        references
    }

    pub(crate) fn structural_hash(&self, path: &str) -> HashCode {
        let mut builder = HashBuilder::new(HashStructure::Service);
        builder
            .str(path)
            .str(&self.pattern)
            .str(&self.documentation)
            .strings(&self.owners)
            .bool(self.auto_activate_updates);
        match &self.execution {
            Some(execution) => {
                builder
                    .bool(true)
                    .json(&execution.func)
                    .hashable(&execution.mapping);
                match &execution.runtime {
                    RuntimeValue::Pointer(pointer) => builder.hashable(pointer),
                    RuntimeValue::Embedded(runtime) => builder.hashable(runtime),
                };
            }
            None => {
                builder.bool(false);
            }
        }
        builder
            .list(&self.stereotypes)
            .list(&self.tagged_values);
        builder.finish()
    }
}

annotated!(Service);

#[cfg(test)]
mod tests {
    use super::*;

    fn runtime() -> EngineRuntime {
        EngineRuntime {
            mappings: vec![Reference::new("model::M")],
            connections: vec![StoreConnections {
                store: ConnectionStore::Store(Reference::new("store::DB")),
                connections: vec![IdentifiedConnection {
                    id: "connection_1".to_string(),
                    connection: ConnectionValue::Pointer(Reference::new("model::Conn")),
                }],
            }],
        }
    }

    #[test]
    fn test_runtime_references() {
        let runtime = runtime();
        let paths: Vec<String> = runtime
            .references()
            .iter()
            .map(|reference| reference.path().as_string())
            .collect();
        assert_eq!(paths, vec!["model::M", "store::DB", "model::Conn"]);
    }

    #[test]
    fn test_model_store_connection_has_no_reference() {
        let connection = Connection {
            connection_type: "JsonModelConnection".to_string(),
            store: Some(ConnectionStore::Model),
            specification: Map::new(),
        };
        assert!(connection.references().is_empty());
    }

    #[test]
    fn test_service_hash_tracks_pattern() {
        let mut service = Service {
            pattern: "/api/person".to_string(),
            ..Service::default()
        };
        let before = service.structural_hash("model::PersonService");
        service.pattern = "/api/people".to_string();
        assert_ne!(before, service.structural_hash("model::PersonService"));
    }
}
