//! The generic resource object.
//!
//! A [`ScimObject`] groups attributes by schema URI. Attribute names are
//! unique within a schema and compared case-insensitively. The core schema
//! is always present, even when it holds no attributes.

use super::attribute::ScimAttribute;

use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq)]
struct SchemaAttributes {
    uri: String,
    /// Keyed by lower-cased attribute name
    attributes: BTreeMap<String, ScimAttribute>,
}

impl SchemaAttributes {
    fn new(uri: &str) -> Self {
        Self {
            uri: uri.to_string(),
            attributes: BTreeMap::new(),
        }
    }
}

/// Attributes of one resource grouped by schema URI.
///
/// ```rust
/// use scim_directory::resource::{ScimAttribute, ScimObject};
/// use scim_directory::schema::{AttributeDescriptor, SCHEMA_URI_CORE};
/// use std::sync::Arc;
///
/// let descriptor = Arc::new(AttributeDescriptor::new(SCHEMA_URI_CORE, "userName"));
/// let mut object = ScimObject::new(SCHEMA_URI_CORE);
/// object.add_attribute(ScimAttribute::simple(descriptor, "bjensen").unwrap());
///
/// assert!(object.get_attribute(SCHEMA_URI_CORE, "USERNAME").is_some());
/// assert_eq!(object.schemas(), vec![SCHEMA_URI_CORE]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ScimObject {
    core_schema: String,
    /// Keyed by lower-cased schema URI
    schemas: BTreeMap<String, SchemaAttributes>,
}

impl ScimObject {
    /// Create an empty object with the given core schema.
    pub fn new(core_schema: impl Into<String>) -> Self {
        let core_schema = core_schema.into();
        let mut schemas = BTreeMap::new();
        schemas.insert(
            core_schema.to_ascii_lowercase(),
            SchemaAttributes::new(&core_schema),
        );
        Self {
            core_schema,
            schemas,
        }
    }

    pub fn core_schema(&self) -> &str {
        &self.core_schema
    }

    /// Schema URIs present on the object, in lexical order.
    pub fn schemas(&self) -> Vec<&str> {
        self.schemas.values().map(|s| s.uri.as_str()).collect()
    }

    pub fn has_schema(&self, uri: &str) -> bool {
        self.schemas.contains_key(&uri.to_ascii_lowercase())
    }

    /// Attributes of the given schema in name order.
    pub fn attributes<'a>(
        &'a self,
        schema: &str,
    ) -> impl Iterator<Item = &'a ScimAttribute> + use<'a> {
        self.schemas
            .get(&schema.to_ascii_lowercase())
            .into_iter()
            .flat_map(|s| s.attributes.values())
    }

    /// Every attribute across all schemas.
    pub fn all_attributes(&self) -> impl Iterator<Item = &ScimAttribute> {
        self.schemas.values().flat_map(|s| s.attributes.values())
    }

    /// Look up an attribute by schema URI and name.
    pub fn get_attribute(&self, schema: &str, name: &str) -> Option<&ScimAttribute> {
        self.schemas
            .get(&schema.to_ascii_lowercase())
            .and_then(|s| s.attributes.get(&name.to_ascii_lowercase()))
    }

    /// Add an attribute under its descriptor's schema, returning the
    /// attribute it replaced.
    pub fn add_attribute(&mut self, attribute: ScimAttribute) -> Option<ScimAttribute> {
        let schema = attribute.schema().to_string();
        self.schemas
            .entry(schema.to_ascii_lowercase())
            .or_insert_with(|| SchemaAttributes::new(&schema))
            .attributes
            .insert(attribute.name().to_ascii_lowercase(), attribute)
    }

    /// Remove an attribute. A non-core schema left empty is removed too.
    pub fn remove_attribute(&mut self, schema: &str, name: &str) -> Option<ScimAttribute> {
        let key = schema.to_ascii_lowercase();
        let schema_attributes = self.schemas.get_mut(&key)?;
        let removed = schema_attributes
            .attributes
            .remove(&name.to_ascii_lowercase());
        if schema_attributes.attributes.is_empty() && !self.core_schema.eq_ignore_ascii_case(schema)
        {
            self.schemas.remove(&key);
        }
        removed
    }

    pub fn attribute_count(&self) -> usize {
        self.schemas.values().map(|s| s.attributes.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.attribute_count() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::AttributeDescriptor;
    use std::sync::Arc;

    const CORE: &str = "urn:scim:schemas:core:1.0";
    const EXT: &str = "urn:scim:schemas:extension:enterprise:1.0";

    fn attr(schema: &str, name: &str, value: &str) -> ScimAttribute {
        ScimAttribute::simple(Arc::new(AttributeDescriptor::new(schema, name)), value).unwrap()
    }

    #[test]
    fn test_core_schema_always_present() {
        let mut object = ScimObject::new(CORE);
        assert_eq!(object.schemas(), vec![CORE]);
        assert!(object.is_empty());

        object.add_attribute(attr(CORE, "userName", "jdoe"));
        object.remove_attribute(CORE, "userName");
        assert_eq!(object.schemas(), vec![CORE]);
    }

    #[test]
    fn test_extension_schema_comes_and_goes_with_attributes() {
        let mut object = ScimObject::new(CORE);
        object.add_attribute(attr(EXT, "employeeNumber", "42"));
        assert!(object.has_schema(EXT));
        assert_eq!(object.attributes(EXT).count(), 1);

        object.remove_attribute(EXT, "EMPLOYEENUMBER");
        assert!(!object.has_schema(EXT));
    }

    #[test]
    fn test_add_replaces_same_name() {
        let mut object = ScimObject::new(CORE);
        assert!(object.add_attribute(attr(CORE, "title", "Tour Guide")).is_none());
        let previous = object.add_attribute(attr(CORE, "Title", "Manager"));
        assert!(previous.is_some());
        assert_eq!(object.attribute_count(), 1);
    }
}
