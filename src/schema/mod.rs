//! Resource descriptors for SCIM resources.
//!
//! Descriptors define the schema URI, data type, cardinality and
//! sub-attributes of every attribute a resource type may carry. They are
//! loaded once and shared read-only by the value model, the marshallers and
//! the resource mappers.
//!
//! # Key Types
//!
//! - [`ResourceDescriptor`] - a resource type with its core and extension attributes
//! - [`AttributeDescriptor`] - an individual attribute definition
//! - [`SchemaRegistry`] - registry for loading and accessing descriptors
//!
//! # Examples
//!
//! ```rust
//! use scim_directory::schema::{SchemaRegistry, SCHEMA_URI_CORE};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = SchemaRegistry::with_embedded_descriptors()?;
//! let user = registry.user_descriptor().expect("embedded");
//! assert!(user.attribute(SCHEMA_URI_CORE, "userName").is_some());
//! # Ok(())
//! # }
//! ```

pub mod embedded;
pub mod registry;
pub mod types;

pub use registry::SchemaRegistry;
pub use types::{AttributeDescriptor, AttributeType, ResourceDescriptor, SchemaExtension};

/// The SCIM 1.0 core schema URI shared by User and Group.
pub const SCHEMA_URI_CORE: &str = "urn:scim:schemas:core:1.0";

/// The SCIM 1.0 enterprise user extension schema URI.
pub const SCHEMA_URI_ENTERPRISE_EXTENSION: &str = "urn:scim:schemas:extension:enterprise:1.0";
