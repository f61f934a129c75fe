//! The SCIM 1.0 service provider configuration document.

use super::ServiceConfig;
use crate::marshal::{ContentType, SchemaPolicy};
use crate::schema::SCHEMA_URI_CORE;

use serde::{Deserialize, Serialize};

/// Service provider configuration as defined in SCIM 1.0.
///
/// Describes the capabilities of the service so clients can discover what
/// is supported. The document also carries the schema-violation policy the
/// unmarshaller applies to unknown attributes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ServiceProviderConfig {
    pub schemas: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documentation_url: Option<String>,

    pub patch: Supported,

    pub bulk: BulkSupport,

    pub filter: FilterSupport,

    pub change_password: Supported,

    pub sort: Supported,

    pub etag: Supported,

    pub xml_data_format: Supported,

    #[serde(default)]
    pub authentication_schemes: Vec<AuthenticationScheme>,

    /// How unknown attributes and schema URIs in requests are treated
    pub schema_policy: SchemaPolicy,
}

/// A capability that is either supported or not.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Supported {
    pub supported: bool,
}

impl Supported {
    pub fn new(supported: bool) -> Self {
        Self { supported }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BulkSupport {
    pub supported: bool,
    pub max_operations: u32,
    pub max_payload_size: u64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct FilterSupport {
    pub supported: bool,
    /// Maximum number of resources returned by one query
    pub max_results: usize,
}

/// Authentication scheme definition for service provider config.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticationScheme {
    pub name: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spec_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documentation_url: Option<String>,
}

impl ServiceProviderConfig {
    /// The document for a configured service. Patch, bulk and password
    /// changes are not offered.
    pub fn from_service_config(config: &ServiceConfig) -> Self {
        Self {
            schemas: vec![SCHEMA_URI_CORE.to_string()],
            documentation_url: None,
            patch: Supported::new(false),
            bulk: BulkSupport {
                supported: false,
                max_operations: 0,
                max_payload_size: 0,
            },
            filter: FilterSupport {
                supported: true,
                max_results: config.max_results,
            },
            change_password: Supported::new(false),
            sort: Supported::new(true),
            etag: Supported::new(true),
            xml_data_format: Supported::new(config.content_types.contains(&ContentType::Xml)),
            authentication_schemes: Vec::new(),
            schema_policy: config.schema_policy,
        }
    }
}

impl Default for ServiceProviderConfig {
    fn default() -> Self {
        Self::from_service_config(&ServiceConfig::default())
    }
}
