//! Core descriptor type definitions for SCIM resources.
//!
//! Descriptors are immutable once loaded and shared by reference (`Arc`)
//! between the registry, the value model and the mappers.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Definition of a SCIM attribute.
///
/// Defines the owning schema, data type, cardinality and the sub-attribute
/// descriptors of complex attributes. Plural attributes also carry the name
/// of the per-value child element used by the XML format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeDescriptor {
    /// Attribute name
    pub name: String,
    /// URI of the schema the attribute belongs to
    #[serde(default)]
    pub schema: String,
    /// Data type; `None` means the attribute is treated as a string
    #[serde(rename = "type", default)]
    pub data_type: Option<AttributeType>,
    /// Whether this attribute can have multiple values
    #[serde(default)]
    pub multi_valued: bool,
    /// Element name of each value of a plural attribute in XML
    #[serde(default)]
    pub multi_valued_child_name: Option<String>,
    /// Attribute description
    #[serde(default)]
    pub description: String,
    /// Whether this attribute is required
    #[serde(default)]
    pub required: bool,
    /// Whether the attribute is managed by the service provider
    #[serde(default)]
    pub read_only: bool,
    /// Whether string comparison is case-sensitive
    #[serde(default)]
    pub case_exact: bool,
    /// Allowed values for the `type` sub-attribute of plural attributes
    #[serde(default)]
    pub canonical_values: Vec<String>,
    /// Sub-attributes for complex types
    #[serde(default)]
    pub sub_attributes: Vec<Arc<AttributeDescriptor>>,
}

impl AttributeDescriptor {
    /// Create a singular string attribute descriptor.
    pub fn new(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            schema: schema.into(),
            data_type: Some(AttributeType::String),
            multi_valued: false,
            multi_valued_child_name: None,
            description: String::new(),
            required: false,
            read_only: false,
            case_exact: false,
            canonical_values: Vec::new(),
            sub_attributes: Vec::new(),
        }
    }

    /// Set the data type.
    pub fn with_type(mut self, data_type: AttributeType) -> Self {
        self.data_type = Some(data_type);
        self
    }

    /// Mark the attribute plural with the given XML child element name.
    pub fn plural(mut self, child_name: impl Into<String>) -> Self {
        self.multi_valued = true;
        self.multi_valued_child_name = Some(child_name.into());
        self
    }

    /// Attach sub-attributes, making the attribute complex.
    pub fn with_sub_attributes(mut self, sub_attributes: Vec<AttributeDescriptor>) -> Self {
        self.data_type = Some(AttributeType::Complex);
        self.sub_attributes = sub_attributes.into_iter().map(Arc::new).collect();
        self
    }

    /// Whether values of this attribute are complex.
    pub fn is_complex(&self) -> bool {
        self.data_type == Some(AttributeType::Complex) || !self.sub_attributes.is_empty()
    }

    /// Declared data type, falling back to string.
    pub fn effective_type(&self) -> AttributeType {
        self.data_type.unwrap_or(AttributeType::String)
    }

    /// Look up a sub-attribute descriptor by name, case-insensitively.
    pub fn sub_attribute(&self, name: &str) -> Option<&Arc<AttributeDescriptor>> {
        self.sub_attributes
            .iter()
            .find(|sub| sub.name.eq_ignore_ascii_case(name))
    }

    /// Element name for each value of a plural attribute.
    ///
    /// Falls back to the attribute name with a trailing `s` removed.
    pub fn child_name(&self) -> &str {
        match &self.multi_valued_child_name {
            Some(child) => child,
            None => self.name.strip_suffix('s').unwrap_or(&self.name),
        }
    }

    /// Whether this descriptor is the given attribute of the given schema.
    pub fn is(&self, schema: &str, name: &str) -> bool {
        self.schema.eq_ignore_ascii_case(schema) && self.name.eq_ignore_ascii_case(name)
    }

    pub(crate) fn inherit_schema(&mut self, schema: &str) {
        if self.schema.is_empty() {
            self.schema = schema.to_string();
        }
        let owner = self.schema.clone();
        for sub in &mut self.sub_attributes {
            Arc::make_mut(sub).inherit_schema(&owner);
        }
    }
}

/// SCIM attribute data types.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum AttributeType {
    /// String value
    String,
    /// Boolean value
    Boolean,
    /// Integer number
    Integer,
    /// DateTime in RFC3339 format
    DateTime,
    /// Binary data (base64 encoded on the wire)
    Binary,
    /// Complex attribute with sub-attributes
    Complex,
}

impl Default for AttributeType {
    fn default() -> Self {
        Self::String
    }
}

impl std::fmt::Display for AttributeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::String => "string",
            Self::Boolean => "boolean",
            Self::Integer => "integer",
            Self::DateTime => "dateTime",
            Self::Binary => "binary",
            Self::Complex => "complex",
        };
        f.write_str(name)
    }
}

/// A schema extension contributing attributes to a resource type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaExtension {
    /// Extension schema URI
    pub schema: String,
    /// Human-readable extension name
    #[serde(default)]
    pub name: String,
    /// Resource types the extension applies to
    #[serde(default)]
    pub resource_types: Vec<String>,
    /// Attributes contributed by the extension
    pub attributes: Vec<Arc<AttributeDescriptor>>,
}

/// Definition of a SCIM resource type.
///
/// Holds the core schema URI and the attribute descriptors of the core
/// schema and of every schema extension registered for the resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceDescriptor {
    /// Resource type name, e.g. `User`
    pub name: String,
    /// Resource description
    #[serde(default)]
    pub description: String,
    /// Endpoint the resource is served under, e.g. `Users`
    pub endpoint: String,
    /// Core schema URI
    pub schema: String,
    /// Attribute descriptors across core and extension schemas
    pub attributes: Vec<Arc<AttributeDescriptor>>,
}

impl ResourceDescriptor {
    /// Core schema URI.
    pub fn core_schema(&self) -> &str {
        &self.schema
    }

    /// Distinct schema URIs of the resource, core first.
    pub fn schemas(&self) -> Vec<&str> {
        let mut schemas = vec![self.schema.as_str()];
        for attribute in &self.attributes {
            if !schemas
                .iter()
                .any(|s| s.eq_ignore_ascii_case(&attribute.schema))
            {
                schemas.push(attribute.schema.as_str());
            }
        }
        schemas
    }

    /// Resolve a schema URI case-insensitively to the canonical URI.
    pub fn resolve_schema(&self, uri: &str) -> Option<&str> {
        self.schemas()
            .into_iter()
            .find(|schema| schema.eq_ignore_ascii_case(uri))
    }

    /// Look up an attribute descriptor by schema URI and name.
    pub fn attribute(&self, schema: &str, name: &str) -> Option<&Arc<AttributeDescriptor>> {
        self.attributes.iter().find(|attr| attr.is(schema, name))
    }

    /// Look up a core schema attribute descriptor by name.
    pub fn core_attribute(&self, name: &str) -> Option<&Arc<AttributeDescriptor>> {
        self.attribute(&self.schema, name)
    }

    /// Attribute descriptors belonging to the given schema.
    pub fn attributes_of<'a>(
        &'a self,
        schema: &'a str,
    ) -> impl Iterator<Item = &'a Arc<AttributeDescriptor>> + 'a {
        self.attributes
            .iter()
            .filter(move |attr| attr.schema.eq_ignore_ascii_case(schema))
    }

    /// Add the attributes of a schema extension.
    pub fn add_extension(&mut self, extension: &SchemaExtension) {
        for attribute in &extension.attributes {
            let mut attribute = attribute.as_ref().clone();
            attribute.inherit_schema(&extension.schema);
            if self.attribute(&attribute.schema, &attribute.name).is_none() {
                self.attributes.push(Arc::new(attribute));
            }
        }
    }

    pub(crate) fn normalize(&mut self) {
        let core = self.schema.clone();
        for attribute in &mut self.attributes {
            Arc::make_mut(attribute).inherit_schema(&core);
        }
    }
}
