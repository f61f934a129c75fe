//! Error types for SCIM mapping, marshalling and resource operations.
//!
//! Every public operation of the crate returns a typed failure. Expected
//! outcomes such as "not found" or "conflict" are ordinary variants that the
//! caller matches on; nothing in the crate uses panics for control flow.

use crate::directory::DirectoryError;

/// Main error type for SCIM operations.
///
/// Each variant maps onto a stable HTTP status code through
/// [`ScimError::status_code`], which is what ends up in the `Errors`
/// envelope of a wire response.
#[derive(Debug, thiserror::Error)]
pub enum ScimError {
    /// The payload references attributes or schemas unknown to the active
    /// descriptors, or violates their cardinality/type rules
    #[error("Schema violation: {0}")]
    SchemaViolation(#[from] ValidationError),

    /// The resource violates structural constraints of the target entry type
    #[error("Invalid resource: {message}")]
    InvalidResource { message: String },

    /// Requested identifier has no corresponding directory entry
    #[error("Resource not found: {resource_type} with ID {id}")]
    ResourceNotFound { resource_type: String, id: String },

    /// Version mismatch or duplicate create
    #[error("Resource conflict: {message}")]
    ResourceConflict { message: String },

    /// Filter cannot be expressed in the directory query language
    #[error("Unsupported filter: {message}")]
    UnsupportedFilter { message: String },

    /// Sort attribute is not sortable
    #[error("Unsupported sort attribute: {attribute}")]
    UnsupportedSort { attribute: String },

    /// Unsupported operation for resource type
    #[error("Unsupported operation '{operation}' for resource type '{resource_type}'")]
    UnsupportedOperation {
        resource_type: String,
        operation: String,
    },

    /// Unsupported resource type
    #[error("Unsupported resource type: {0}")]
    UnsupportedResourceType(String),

    /// Failure reported by the directory collaborator
    #[error("Directory error: {0}")]
    Directory(#[from] DirectoryError),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Malformed request payload or parameters
    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    /// Internal errors
    #[error("Internal server error: {message}")]
    Internal { message: String },
}

/// Schema violations detected while building, unmarshalling or resolving
/// attributes against their descriptors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// Required attribute is missing
    #[error("Required attribute '{attribute}' is missing")]
    MissingRequiredAttribute { attribute: String },

    /// Unknown attribute in resource
    #[error("Unknown attribute '{attribute}' in schema '{schema_id}'")]
    UnknownAttribute {
        attribute: String,
        schema_id: String,
    },

    /// Unknown schema URI
    #[error("Unknown schema URI: {uri}")]
    UnknownSchemaUri { uri: String },

    /// Unknown sub-attribute in complex attribute
    #[error("Complex attribute '{attribute}' contains unknown sub-attribute '{sub_attribute}'")]
    UnknownSubAttribute {
        attribute: String,
        sub_attribute: String,
    },

    /// Single value provided for multi-valued attribute
    #[error("Attribute '{attribute}' must be multi-valued (array)")]
    ExpectedMultiValue { attribute: String },

    /// Array provided for single-valued attribute
    #[error("Attribute '{attribute}' must be single-valued (not array)")]
    ExpectedSingleValue { attribute: String },

    /// Simple value provided where a complex value is required
    #[error("Attribute '{attribute}' requires a complex value")]
    ExpectedComplexValue { attribute: String },

    /// Complex value provided where a simple value is required
    #[error("Attribute '{attribute}' requires a simple value")]
    ExpectedSimpleValue { attribute: String },

    /// Attribute value doesn't match the declared data type
    #[error("Attribute '{attribute}' has invalid type, expected {expected}, got {actual}")]
    InvalidDataType {
        attribute: String,
        expected: String,
        actual: String,
    },

    /// Invalid boolean value
    #[error("Attribute '{attribute}' has invalid boolean value: {value}")]
    InvalidBooleanValue { attribute: String, value: String },

    /// Invalid integer value
    #[error("Attribute '{attribute}' has invalid integer value: {value}")]
    InvalidIntegerValue { attribute: String, value: String },

    /// Invalid datetime format
    #[error("Attribute '{attribute}' has invalid datetime format: {value}")]
    InvalidDateTimeFormat { attribute: String, value: String },

    /// Invalid binary data
    #[error("Attribute '{attribute}' has invalid binary data: {details}")]
    InvalidBinaryData { attribute: String, details: String },

    /// Payload is not shaped like a resource at all
    #[error("Malformed resource structure: {details}")]
    MalformedStructure { details: String },

    /// General validation error with custom message
    #[error("Validation failed: {message}")]
    Custom { message: String },
}

/// Errors that can occur while building descriptors, transformations and
/// mappers at initialization time.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// Invalid configuration provided
    #[error("Invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    /// Schema loading failed
    #[error("Failed to load schema '{schema_id}': {message}")]
    SchemaLoadError { schema_id: String, message: String },

    /// No transformation registered under the configured key
    #[error("Unknown transformation '{key}'")]
    UnknownTransformation { key: String },

    /// Mapping configured for a resource type with no descriptor
    #[error("Unknown resource type '{name}'")]
    UnknownResourceType { name: String },

    /// Mapping references an attribute the descriptor does not define
    #[error("Resource '{resource}' has no attribute '{attribute}'")]
    UnknownAttribute { resource: String, attribute: String },

    /// Reading a configuration file failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Parsing a configuration document failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

// Convenience methods for creating common errors
impl ScimError {
    /// Create a resource not found error
    pub fn resource_not_found(resource_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self::ResourceNotFound {
            resource_type: resource_type.into(),
            id: id.into(),
        }
    }

    /// Create an invalid resource error
    pub fn invalid_resource(message: impl Into<String>) -> Self {
        Self::InvalidResource {
            message: message.into(),
        }
    }

    /// Create a resource conflict error
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::ResourceConflict {
            message: message.into(),
        }
    }

    /// Create an unsupported filter error
    pub fn unsupported_filter(message: impl Into<String>) -> Self {
        Self::UnsupportedFilter {
            message: message.into(),
        }
    }

    /// Create an unsupported sort error
    pub fn unsupported_sort(attribute: impl Into<String>) -> Self {
        Self::UnsupportedSort {
            attribute: attribute.into(),
        }
    }

    /// Create an unsupported operation error
    pub fn unsupported_operation(
        resource_type: impl Into<String>,
        operation: impl Into<String>,
    ) -> Self {
        Self::UnsupportedOperation {
            resource_type: resource_type.into(),
            operation: operation.into(),
        }
    }

    /// Create an internal server error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Create an invalid request error
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::InvalidRequest {
            message: message.into(),
        }
    }

    /// The HTTP status code surfaced in the error envelope.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::SchemaViolation(_)
            | Self::InvalidResource { .. }
            | Self::UnsupportedFilter { .. }
            | Self::UnsupportedSort { .. }
            | Self::Json(_)
            | Self::InvalidRequest { .. } => 400,
            Self::ResourceNotFound { .. } | Self::UnsupportedResourceType(_) => 404,
            Self::ResourceConflict { .. } => 409,
            Self::UnsupportedOperation { .. } => 501,
            Self::Directory(e) => e.status_code(),
            Self::Internal { .. } => 500,
        }
    }
}

impl ValidationError {
    /// Create a missing required attribute error
    pub fn missing_required(attribute: impl Into<String>) -> Self {
        Self::MissingRequiredAttribute {
            attribute: attribute.into(),
        }
    }

    /// Create an invalid type error
    pub fn invalid_type(
        attribute: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self::InvalidDataType {
            attribute: attribute.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// Create a malformed structure error
    pub fn malformed(details: impl Into<String>) -> Self {
        Self::MalformedStructure {
            details: details.into(),
        }
    }

    /// Create a custom validation error
    pub fn custom(message: impl Into<String>) -> Self {
        Self::Custom {
            message: message.into(),
        }
    }
}

// Result type aliases for convenience
pub type ScimResult<T> = Result<T, ScimError>;
pub type ValidationResult<T> = Result<T, ValidationError>;
pub type BuildResult<T> = Result<T, BuildError>;
