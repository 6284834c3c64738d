//! Service stores (`_type: "serviceStore"`) and the class mappings that read
//! from them.
//!
//! # Overview
//!
//! A [`ServiceStore`] is a store whose content is a tree of HTTP services,
//! grouped by [`ServiceGroup`]s. It takes part in store inclusion like a
//! database. Class mappings of `_type: "serviceStore"` point at services by
//! store path and dotted service path (`group.service`); they are built by
//! the mapping extension of the [`ServiceStorePlugin`].

use std::any::Any;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use meridian_core::{
    Graph,
    element::{ExtensionElement, Store},
    hash::{HashBuilder, HashCode},
    identifier::Id,
    mapping::SetImplementationExtension,
    plugin::{ElementKindPlugin, GraphPlugin, MappingExtension},
    reference::{Reference, Resolvable},
};

use super::wrong_body;

pub const CLASSIFIER_PATH: &str = "meta::external::store::service::metamodel::ServiceStore";
pub const PROTOCOL_TYPE: &str = "serviceStore";
/// `_type` of class mappings reading from a service store.
pub const MAPPING_PROTOCOL_TYPE: &str = "serviceStore";

/// Separator of the segments of a service path.
const SERVICE_PATH_DELIMITER: char = '.';

/// Lookup failures of service store content.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceStoreError {
    #[error("can't find service `{id}`")]
    ServiceNotFound { id: String },

    #[error("can't find service group `{id}`")]
    ServiceGroupNotFound { id: String },

    #[error("can't find service parameter `{name}`")]
    ParameterNotFound { name: String },

    #[error("`{path}` is not a service store")]
    NotAServiceStore { path: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ParameterLocation {
    Query,
    Path,
    Header,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceParameter {
    pub name: String,
    pub location: ParameterLocation,
    #[serde(default)]
    pub required: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceStoreService {
    pub id: String,
    pub path: String,
    pub method: HttpMethod,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parameters: Vec<ServiceParameter>,
}

impl ServiceStoreService {
    /// Finds a parameter by name.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceStoreError::ParameterNotFound`] when the service has
    /// no such parameter.
    pub fn parameter(&self, name: &str) -> Result<&ServiceParameter, ServiceStoreError> {
        self.parameters
            .iter()
            .find(|parameter| parameter.name == name)
            .ok_or_else(|| ServiceStoreError::ParameterNotFound {
                name: name.to_string(),
            })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceGroup {
    pub id: String,
    pub path: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub elements: Vec<ServiceStoreElement>,
}

/// A node of the service tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "_type")]
pub enum ServiceStoreElement {
    #[serde(rename = "service")]
    Service(ServiceStoreService),
    #[serde(rename = "serviceGroup")]
    Group(ServiceGroup),
}

impl ServiceStoreElement {
    pub fn id(&self) -> &str {
        match self {
            ServiceStoreElement::Service(service) => &service.id,
            ServiceStoreElement::Group(group) => &group.id,
        }
    }
}

/// Finds the service with `id` among `elements`.
///
/// # Errors
///
/// Returns [`ServiceStoreError::ServiceNotFound`] when no element carries
/// `id` or the element is a group.
pub fn service<'a>(elements: &'a [ServiceStoreElement], id: &str) -> Result<&'a ServiceStoreService, ServiceStoreError> {
    match elements.iter().find(|element| element.id() == id) {
        Some(ServiceStoreElement::Service(service)) => Ok(service),
        _ => Err(ServiceStoreError::ServiceNotFound { id: id.to_string() }),
    }
}

/// Finds the service group with `id` among `elements`.
///
/// # Errors
///
/// Returns [`ServiceStoreError::ServiceGroupNotFound`] when no element
/// carries `id` or the element is a service.
pub fn service_group<'a>(elements: &'a [ServiceStoreElement], id: &str) -> Result<&'a ServiceGroup, ServiceStoreError> {
    match elements.iter().find(|element| element.id() == id) {
        Some(ServiceStoreElement::Group(group)) => Ok(group),
        _ => Err(ServiceStoreError::ServiceGroupNotFound { id: id.to_string() }),
    }
}

/// A store of HTTP services.
#[derive(Debug, Clone, Default)]
pub struct ServiceStore {
    pub includes: Vec<Reference<dyn Store>>,
    pub description: Option<String>,
    pub elements: Vec<ServiceStoreElement>,
}

impl ServiceStore {
    pub fn element_kind() -> Id {
        Id::new("ServiceStore")
    }

    /// Finds a service by dotted path, e.g. `firms.firm`: every segment but
    /// the last names a service group.
    ///
    /// # Errors
    ///
    /// Returns the first group or service lookup that fails.
    pub fn service_by_path(&self, path: &str) -> Result<&ServiceStoreService, ServiceStoreError> {
        let mut segments: Vec<&str> = path.split(SERVICE_PATH_DELIMITER).collect();
        let id = segments.pop().unwrap_or_default();

        let mut elements = self.elements.as_slice();
        for group in segments {
            elements = service_group(elements, group)?.elements.as_slice();
        }
        service(elements, id)
    }
}

impl Store for ServiceStore {
    fn includes(&self) -> &[Reference<dyn Store>] {
        &self.includes
    }
}

fn hash_elements(builder: &mut HashBuilder, elements: &[ServiceStoreElement]) {
    for element in elements {
        match element {
            ServiceStoreElement::Service(service) => {
                builder
                    .str("service")
                    .str(&service.id)
                    .str(&service.path)
                    .str(match service.method {
                        HttpMethod::Get => "GET",
                        HttpMethod::Post => "POST",
                    });
                for parameter in &service.parameters {
                    builder
                        .str(&parameter.name)
                        .str(match parameter.location {
                            ParameterLocation::Query => "QUERY",
                            ParameterLocation::Path => "PATH",
                            ParameterLocation::Header => "HEADER",
                        })
                        .bool(parameter.required);
                }
            }
            ServiceStoreElement::Group(group) => {
                builder.str("group").str(&group.id).str(&group.path);
                hash_elements(builder, &group.elements);
                builder.str("end");
            }
        }
    }
}

impl ExtensionElement for ServiceStore {
    fn kind(&self) -> Id {
        ServiceStore::element_kind()
    }

    fn hash_code(&self, path: &str) -> HashCode {
        let mut builder = HashBuilder::extension("SERVICE_STORE");
        builder
            .str(path)
            .list(&self.includes)
            .opt_str(self.description.as_deref());
        hash_elements(&mut builder, &self.elements);
        builder.finish()
    }

    fn references(&self) -> Vec<&dyn Resolvable> {
        self.includes
            .iter()
            .map(|include| include as &dyn Resolvable)
            .collect()
    }

    fn as_store(&self) -> Option<&(dyn Store + 'static)> {
        Some(self)
    }

    fn as_store_mut(&mut self) -> Option<&mut (dyn Store + 'static)> {
        Some(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

// =============================================================================
// Class mappings
// =============================================================================

/// Points at a service of a service store.
#[derive(Debug, Clone)]
pub struct ServicePointer {
    pub service_store: Reference<dyn Store>,
    /// Dotted service path within the store.
    pub service: String,
}

impl ServicePointer {
    /// Looks up the service in the bound store.
    ///
    /// # Errors
    ///
    /// - [`ServiceStoreError::NotAServiceStore`] when the reference is
    ///   unbound or bound to another kind of store.
    /// - The failure of [`ServiceStore::service_by_path`].
    pub fn resolve<'g>(&self, graph: &'g Graph) -> Result<&'g ServiceStoreService, ServiceStoreError> {
        let store = self
            .service_store
            .target()
            .and_then(|target| graph.element(target).extension::<ServiceStore>())
            .ok_or_else(|| ServiceStoreError::NotAServiceStore {
                path: graph.reference_path(&self.service_store).as_string(),
            })?;
        store.service_by_path(&self.service)
    }
}

/// A class mapping reading instances from services.
#[derive(Debug, Clone, Default)]
pub struct ServiceStoreSetImplementation {
    pub services: Vec<ServicePointer>,
}

impl SetImplementationExtension for ServiceStoreSetImplementation {
    fn kind(&self) -> &str {
        MAPPING_PROTOCOL_TYPE
    }

    fn hash_code(&self) -> HashCode {
        let mut builder = HashBuilder::extension("SERVICE_STORE_MAPPING");
        for pointer in &self.services {
            builder.hashable(&pointer.service_store).str(&pointer.service);
        }
        builder.finish()
    }

    fn references(&self) -> Vec<&dyn Resolvable> {
        self.services
            .iter()
            .map(|pointer| &pointer.service_store as &dyn Resolvable)
            .collect()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// =============================================================================
// Protocol
// =============================================================================

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct ServiceStoreDocument {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    included_stores: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    elements: Vec<ServiceStoreElement>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct ServicePointerDocument {
    service_store: String,
    service: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct ServiceMappingDocument {
    service: ServicePointerDocument,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct ServiceStoreClassMappingDocument {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    services_mapping: Vec<ServiceMappingDocument>,
}

struct ServiceStoreKind;

impl ElementKindPlugin for ServiceStoreKind {
    fn kind(&self) -> Id {
        ServiceStore::element_kind()
    }

    fn classifier_path(&self) -> &str {
        CLASSIFIER_PATH
    }

    fn protocol_type(&self) -> &str {
        PROTOCOL_TYPE
    }

    fn build(&self, content: &Value) -> serde_json::Result<Box<dyn ExtensionElement>> {
        let document = ServiceStoreDocument::deserialize(content)?;
        Ok(Box::new(ServiceStore {
            includes: document
                .included_stores
                .iter()
                .map(|path| Reference::new(path.as_str()))
                .collect(),
            description: document.description,
            elements: document.elements,
        }))
    }

    fn serialize(&self, element: &dyn ExtensionElement, graph: &Graph) -> serde_json::Result<Value> {
        let store = element
            .as_any()
            .downcast_ref::<ServiceStore>()
            .ok_or_else(|| wrong_body("ServiceStore"))?;
        serde_json::to_value(ServiceStoreDocument {
            included_stores: store
                .includes
                .iter()
                .map(|include| graph.reference_path(include).as_string())
                .collect(),
            description: store.description.clone(),
            elements: store.elements.clone(),
        })
    }
}

struct ServiceStoreMapping;

impl MappingExtension for ServiceStoreMapping {
    fn protocol_type(&self) -> &str {
        MAPPING_PROTOCOL_TYPE
    }

    fn build(&self, class_mapping: &Value) -> serde_json::Result<Box<dyn SetImplementationExtension>> {
        let document = ServiceStoreClassMappingDocument::deserialize(class_mapping)?;
        Ok(Box::new(ServiceStoreSetImplementation {
            services: document
                .services_mapping
                .into_iter()
                .map(|mapping| ServicePointer {
                    service_store: Reference::new(mapping.service.service_store.as_str()),
                    service: mapping.service.service,
                })
                .collect(),
        }))
    }

    fn serialize(
        &self,
        set_implementation: &dyn SetImplementationExtension,
        graph: &Graph,
    ) -> serde_json::Result<Value> {
        let mapping = set_implementation
            .as_any()
            .downcast_ref::<ServiceStoreSetImplementation>()
            .ok_or_else(|| wrong_body("ServiceStoreSetImplementation"))?;
        serde_json::to_value(ServiceStoreClassMappingDocument {
            services_mapping: mapping
                .services
                .iter()
                .map(|pointer| ServiceMappingDocument {
                    service: ServicePointerDocument {
                        service_store: graph.reference_path(&pointer.service_store).as_string(),
                        service: pointer.service.clone(),
                    },
                })
                .collect(),
        })
    }
}

/// Preset contributing the [`ServiceStore`] element kind and the
/// `serviceStore` class mapping extension.
#[derive(Debug, Default)]
pub struct ServiceStorePlugin;

impl GraphPlugin for ServiceStorePlugin {
    fn name(&self) -> &str {
        "service-store"
    }

    fn supported_element_kinds(&self) -> Vec<Box<dyn ElementKindPlugin>> {
        vec![Box::new(ServiceStoreKind)]
    }

    fn mapping_extensions(&self) -> Vec<Box<dyn MappingExtension>> {
        vec![Box::new(ServiceStoreMapping)]
    }
}
