//! SCIM 1.0 resources over an LDAP-style directory.
//!
//! Maps a schema-driven SCIM resource model onto directory entries and back,
//! with JSON and XML wire formats.
//!
//! # Core Components
//!
//! - [`ScimObject`] - generic resource object, attributes grouped by schema
//! - [`marshal`] - JSON and XML marshallers and unmarshallers
//! - [`ResourceMapper`] - translation between SCIM objects, filters and
//!   sort parameters and their directory counterparts
//! - [`DirectoryResourceService`] - get, create, replace, delete and query
//!   against a [`directory`] backend
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use scim_directory::directory::InMemoryDirectory;
//! use scim_directory::service::{DirectoryResourceService, ServiceContext, ServiceRequest};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let context = Arc::new(ServiceContext::builder().build()?);
//! let service = DirectoryResourceService::new(context, InMemoryDirectory::new());
//!
//! let body = r#"{"schemas":["urn:scim:schemas:core:1.0"],"userName":"bjensen"}"#;
//! let response = service.handle(&ServiceRequest::create("Users", body)).await;
//! assert_eq!(response.status, 201);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod directory;
pub mod error;
pub mod mapper;
pub mod marshal;
pub mod query;
pub mod resource;
pub mod schema;
pub mod service;

// Re-export commonly used types for convenience
pub use config::{MappingConfig, ServiceConfig, ServiceProviderConfig};
pub use error::{BuildError, BuildResult, ScimError, ScimResult, ValidationError, ValidationResult};
pub use mapper::{MapperTable, ResourceMapper, TransformationRegistry};
pub use marshal::{ContentType, Marshaller, SchemaPolicy, Unmarshaller};
pub use resource::{ScimAttribute, ScimObject, SimpleValue};
pub use schema::{AttributeDescriptor, ResourceDescriptor, SchemaRegistry};
pub use service::{DirectoryResourceService, ScimResponse, ServiceContext, ServiceRequest};
