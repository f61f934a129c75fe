//! Wire marshalling of SCIM objects.
//!
//! A [`Marshaller`] writes resources, query results and errors in one wire
//! format; an [`Unmarshaller`] reads them back, checking every attribute
//! against the resource descriptor. Both JSON and the SCIM 1.0 XML form are
//! provided:
//!
//! - [`JsonMarshaller`] / [`JsonUnmarshaller`] in [`json`]
//! - [`XmlMarshaller`] / [`XmlUnmarshaller`] in [`xml`]
//!
//! Core schema attributes are written at the top level of a resource and
//! each extension schema's attributes are grouped under that schema.
//!
//! # Example
//!
//! ```rust
//! use scim_directory::marshal::{ContentType, SchemaPolicy};
//! use scim_directory::schema::SchemaRegistry;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = SchemaRegistry::with_embedded_descriptors()?;
//! let user = registry.user_descriptor().expect("embedded");
//!
//! let payload = r#"{"schemas":["urn:scim:schemas:core:1.0"],"userName":"bjensen"}"#;
//! let object = ContentType::Json.unmarshaller(SchemaPolicy::Strict).unmarshal_resource(user, payload)?;
//! let written = ContentType::Json.marshaller().marshal_resource(user, &object)?;
//! assert!(written.contains("\"userName\":\"bjensen\""));
//! # Ok(())
//! # }
//! ```

pub mod json;
pub mod xml;

pub use json::{JsonMarshaller, JsonUnmarshaller};
pub use xml::{XmlMarshaller, XmlUnmarshaller};

use crate::error::{ScimError, ScimResult, ValidationError, ValidationResult};
use crate::resource::ScimObject;
use crate::schema::{AttributeDescriptor, ResourceDescriptor};

use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// How unknown attribute names and schema URIs in a payload are treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaPolicy {
    /// Reject the payload with a schema violation
    #[default]
    Strict,
    /// Skip the unknown element
    Tolerant,
}

/// Supported wire formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Json,
    Xml,
}

impl ContentType {
    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::Xml => "application/xml",
        }
    }

    /// Match a media type, ignoring parameters such as `charset`.
    pub fn from_mime_type(mime_type: &str) -> Option<Self> {
        let essence = mime_type.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
        match essence.as_str() {
            "application/json" | "application/scim+json" | "text/json" => Some(Self::Json),
            "application/xml" | "application/scim+xml" | "text/xml" => Some(Self::Xml),
            _ => None,
        }
    }

    pub fn marshaller(&self) -> Box<dyn Marshaller> {
        match self {
            Self::Json => Box::new(JsonMarshaller),
            Self::Xml => Box::new(XmlMarshaller),
        }
    }

    pub fn unmarshaller(&self, policy: SchemaPolicy) -> Box<dyn Unmarshaller> {
        match self {
            Self::Json => Box::new(JsonUnmarshaller::new(policy)),
            Self::Xml => Box::new(XmlUnmarshaller::new(policy)),
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mime_type())
    }
}

/// One page of query results.
#[derive(Debug, Clone, PartialEq)]
pub struct ListResponse {
    pub total_results: usize,
    /// 1-based index of the first resource
    pub start_index: usize,
    pub resources: Vec<ScimObject>,
}

impl ListResponse {
    pub fn new(total_results: usize, start_index: usize, resources: Vec<ScimObject>) -> Self {
        Self {
            total_results,
            start_index,
            resources,
        }
    }

    pub fn items_per_page(&self) -> usize {
        self.resources.len()
    }

    /// Union of the schema URIs of every resource, in lexical order.
    pub fn schemas(&self) -> Vec<String> {
        let mut schemas: Vec<String> = Vec::new();
        for resource in &self.resources {
            for uri in resource.schemas() {
                if !schemas.iter().any(|s| s.eq_ignore_ascii_case(uri)) {
                    schemas.push(uri.to_string());
                }
            }
        }
        schemas.sort_by_key(|s| s.to_ascii_lowercase());
        schemas
    }
}

/// One entry of an error payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub code: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// The `Errors` payload returned for failed requests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    #[serde(rename = "Errors")]
    pub errors: Vec<ErrorDetail>,
}

impl ErrorResponse {
    pub fn new(code: u16, description: Option<String>) -> Self {
        Self {
            errors: vec![ErrorDetail { code, description }],
        }
    }

    /// Status code of the first error; 500 when there is none.
    pub fn status_code(&self) -> u16 {
        self.errors.first().map(|e| e.code).unwrap_or(500)
    }
}

impl From<&ScimError> for ErrorResponse {
    fn from(error: &ScimError) -> Self {
        Self::new(error.status_code(), Some(error.to_string()))
    }
}

/// Writes SCIM objects in one wire format.
pub trait Marshaller: Send + Sync {
    fn content_type(&self) -> ContentType;

    /// A standalone resource, including its `schemas`.
    fn marshal_resource(
        &self,
        descriptor: &ResourceDescriptor,
        object: &ScimObject,
    ) -> ScimResult<String>;

    /// A page of query results of one resource type.
    fn marshal_list(
        &self,
        descriptor: &ResourceDescriptor,
        list: &ListResponse,
    ) -> ScimResult<String>;

    fn marshal_error(&self, error: &ErrorResponse) -> ScimResult<String>;
}

/// Reads SCIM objects from one wire format.
pub trait Unmarshaller: Send + Sync {
    fn content_type(&self) -> ContentType;

    fn unmarshal_resource(
        &self,
        descriptor: &ResourceDescriptor,
        payload: &str,
    ) -> ScimResult<ScimObject>;

    fn unmarshal_list(
        &self,
        descriptor: &ResourceDescriptor,
        payload: &str,
    ) -> ScimResult<ListResponse>;

    fn unmarshal_error(&self, payload: &str) -> ScimResult<ErrorResponse>;
}

/// Refuse to write an object under a descriptor with another core schema.
pub(crate) fn check_core_schema(
    descriptor: &ResourceDescriptor,
    object: &ScimObject,
) -> ScimResult<()> {
    if object.core_schema().eq_ignore_ascii_case(descriptor.core_schema()) {
        Ok(())
    } else {
        Err(ScimError::invalid_resource(format!(
            "{} resources use core schema '{}', not '{}'",
            descriptor.name,
            descriptor.core_schema(),
            object.core_schema()
        )))
    }
}

/// Descriptor lookups during unmarshalling, applying the schema policy to
/// names the descriptor does not know.
///
/// `Ok(None)` means the element is unknown and should be skipped.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SchemaResolver<'a> {
    descriptor: &'a ResourceDescriptor,
    policy: SchemaPolicy,
}

impl<'a> SchemaResolver<'a> {
    pub(crate) fn new(descriptor: &'a ResourceDescriptor, policy: SchemaPolicy) -> Self {
        Self { descriptor, policy }
    }

    pub(crate) fn core_schema(&self) -> &'a str {
        self.descriptor.core_schema()
    }

    /// The canonical form of a schema URI.
    pub(crate) fn schema(&self, uri: &str) -> ValidationResult<Option<&'a str>> {
        match self.descriptor.resolve_schema(uri) {
            Some(schema) => Ok(Some(schema)),
            None => self.unknown(ValidationError::UnknownSchemaUri {
                uri: uri.to_string(),
            }),
        }
    }

    pub(crate) fn attribute(
        &self,
        schema: &str,
        name: &str,
    ) -> ValidationResult<Option<&'a Arc<AttributeDescriptor>>> {
        match self.descriptor.attribute(schema, name) {
            Some(attribute) => Ok(Some(attribute)),
            None => self.unknown(ValidationError::UnknownAttribute {
                attribute: name.to_string(),
                schema_id: schema.to_string(),
            }),
        }
    }

    pub(crate) fn sub_attribute<'p>(
        &self,
        parent: &'p AttributeDescriptor,
        name: &str,
    ) -> ValidationResult<Option<&'p Arc<AttributeDescriptor>>> {
        match parent.sub_attribute(name) {
            Some(sub) => Ok(Some(sub)),
            None => self.unknown(ValidationError::UnknownSubAttribute {
                attribute: parent.name.clone(),
                sub_attribute: name.to_string(),
            }),
        }
    }

    fn unknown<T>(&self, error: ValidationError) -> ValidationResult<Option<T>> {
        match self.policy {
            SchemaPolicy::Strict => Err(error),
            SchemaPolicy::Tolerant => {
                debug!("Skipping unknown element: {}", error);
                Ok(None)
            }
        }
    }
}
