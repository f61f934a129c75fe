//! Service configuration.
//!
//! - [`ServiceConfig`] - base URL, result limits, schema policy and content
//!   types of the resource service
//! - [`MappingConfig`] - how each resource type maps onto directory entries
//! - [`ServiceProviderConfig`] - the capability document clients discover
//!
//! # Example
//!
//! ```rust
//! use scim_directory::config::ServiceConfig;
//! use scim_directory::marshal::SchemaPolicy;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ServiceConfig::builder()
//!     .with_base_url("https://scim.example.com/v1")
//!     .with_max_results(500)
//!     .with_schema_policy(SchemaPolicy::Tolerant)
//!     .build()?;
//! assert_eq!(config.max_results, 500);
//! # Ok(())
//! # }
//! ```

pub mod embedded;
pub mod mapping;
pub mod service_provider;

pub use mapping::{
    AttributeMapping, CanonicalValueMapping, Derivation, MappingConfig, MappingKind,
    ResourceMapping, SubAttributeMapping,
};
pub use service_provider::{AuthenticationScheme, ServiceProviderConfig};

use crate::error::{BuildError, BuildResult};
use crate::marshal::{ContentType, SchemaPolicy};

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Settings of the resource service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServiceConfig {
    /// Prefix of every `meta.location`, e.g. `https://scim.example.com/v1`
    pub base_url: String,
    /// Maximum number of resources a query returns
    pub max_results: usize,
    /// Page size applied when a query gives no `count`
    pub default_page_size: Option<usize>,
    pub schema_policy: SchemaPolicy,
    pub content_types: Vec<ContentType>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: "https://localhost/v1".to_string(),
            max_results: 100,
            default_page_size: None,
            schema_policy: SchemaPolicy::Strict,
            content_types: vec![ContentType::Json, ContentType::Xml],
        }
    }
}

impl ServiceConfig {
    pub fn builder() -> ServiceConfigBuilder {
        ServiceConfigBuilder::default()
    }

    /// Parse and validate a JSON document. Missing fields take defaults.
    pub fn from_json_str(content: &str) -> BuildResult<Self> {
        let config: Self = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> BuildResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Whether the service produces and accepts `content_type`.
    pub fn supports(&self, content_type: ContentType) -> bool {
        self.content_types.contains(&content_type)
    }

    pub fn validate(&self) -> BuildResult<()> {
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(BuildError::InvalidConfiguration {
                message: format!(
                    "base URL '{}' must start with http:// or https://",
                    self.base_url
                ),
            });
        }
        if self.max_results == 0 {
            return Err(BuildError::InvalidConfiguration {
                message: "maxResults must be at least 1".to_string(),
            });
        }
        if self.default_page_size == Some(0) {
            return Err(BuildError::InvalidConfiguration {
                message: "defaultPageSize must be at least 1".to_string(),
            });
        }
        if self.content_types.is_empty() {
            return Err(BuildError::InvalidConfiguration {
                message: "at least one content type must be supported".to_string(),
            });
        }
        Ok(())
    }
}

/// Builder for [`ServiceConfig`].
#[derive(Debug, Clone, Default)]
pub struct ServiceConfigBuilder {
    config: ServiceConfig,
}

impl ServiceConfigBuilder {
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.config.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.config.max_results = max_results;
        self
    }

    pub fn with_default_page_size(mut self, page_size: usize) -> Self {
        self.config.default_page_size = Some(page_size);
        self
    }

    pub fn with_schema_policy(mut self, policy: SchemaPolicy) -> Self {
        self.config.schema_policy = policy;
        self
    }

    pub fn with_content_types(mut self, content_types: Vec<ContentType>) -> Self {
        self.config.content_types = content_types;
        self
    }

    /// Validate and return the configuration.
    pub fn build(self) -> BuildResult<ServiceConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
