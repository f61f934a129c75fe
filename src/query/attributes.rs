//! Requested attributes of a read or query.
//!
//! When a request names no attributes, every attribute is returned. When it
//! names some, only those are returned: naming `name` returns the whole
//! complex value, naming `name.givenName` returns just that sub-attribute.

use super::filter::AttributePath;
use crate::error::{ScimResult, ValidationError};
use crate::resource::{ScimAttribute, ScimObject};
use crate::schema::{AttributeDescriptor, ResourceDescriptor};

/// The attributes a request asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryAttributes {
    core_schema: String,
    /// `None` requests every attribute
    paths: Option<Vec<AttributePath>>,
}

impl QueryAttributes {
    /// Request every attribute of a resource.
    pub fn all(descriptor: &ResourceDescriptor) -> Self {
        Self {
            core_schema: descriptor.core_schema().to_string(),
            paths: None,
        }
    }

    /// Parse a comma-separated attribute list, as sent in the `attributes`
    /// query parameter. A blank list requests every attribute.
    ///
    /// ```rust
    /// use scim_directory::query::QueryAttributes;
    /// use scim_directory::schema::{SchemaRegistry, SCHEMA_URI_CORE};
    ///
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let registry = SchemaRegistry::with_embedded_descriptors()?;
    /// let user = registry.user_descriptor().expect("embedded");
    /// let query = QueryAttributes::parse(user, "userName, name.familyName")?;
    /// assert!(query.is_attribute_requested(SCHEMA_URI_CORE, "name"));
    /// assert!(!query.is_sub_attribute_requested(SCHEMA_URI_CORE, "name", "givenName"));
    /// # Ok(())
    /// # }
    /// ```
    pub fn parse(descriptor: &ResourceDescriptor, attributes: &str) -> ScimResult<Self> {
        let paths = attributes
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(AttributePath::parse)
            .collect::<ScimResult<Vec<_>>>()?;
        if paths.is_empty() {
            return Ok(Self::all(descriptor));
        }
        Self::from_paths(descriptor, paths)
    }

    /// Request the given attribute paths, checking each against the
    /// descriptor.
    pub fn from_paths(
        descriptor: &ResourceDescriptor,
        paths: Vec<AttributePath>,
    ) -> ScimResult<Self> {
        let core_schema = descriptor.core_schema().to_string();
        for path in &paths {
            let schema = path.schema_or(&core_schema);
            let attribute = descriptor.attribute(schema, &path.attribute).ok_or_else(|| {
                ValidationError::UnknownAttribute {
                    attribute: path.attribute.clone(),
                    schema_id: schema.to_string(),
                }
            })?;
            if let Some(sub) = &path.sub_attribute {
                if attribute.sub_attribute(sub).is_none() {
                    return Err(ValidationError::UnknownSubAttribute {
                        attribute: attribute.name.clone(),
                        sub_attribute: sub.clone(),
                    }
                    .into());
                }
            }
        }
        Ok(Self {
            core_schema,
            paths: Some(paths),
        })
    }

    pub fn all_requested(&self) -> bool {
        self.paths.is_none()
    }

    pub fn paths(&self) -> &[AttributePath] {
        self.paths.as_deref().unwrap_or(&[])
    }

    /// Add an attribute to an explicit request. Requests for everything are
    /// unchanged.
    pub fn with_attribute(mut self, path: AttributePath) -> Self {
        if let Some(paths) = &mut self.paths {
            let core = &self.core_schema;
            let already = paths.iter().any(|p| {
                p.matches(
                    core,
                    path.schema_or(core),
                    &path.attribute,
                    path.sub_attribute.as_deref(),
                )
            });
            if !already {
                paths.push(path);
            }
        }
        self
    }

    /// Whether any part of the attribute was requested.
    pub fn is_attribute_requested(&self, schema: &str, name: &str) -> bool {
        match &self.paths {
            None => true,
            Some(paths) => paths.iter().any(|p| {
                p.schema_or(&self.core_schema).eq_ignore_ascii_case(schema)
                    && p.attribute.eq_ignore_ascii_case(name)
            }),
        }
    }

    /// Whether a sub-attribute was requested, either directly or by
    /// requesting its whole parent.
    pub fn is_sub_attribute_requested(
        &self,
        schema: &str,
        name: &str,
        sub_attribute: &str,
    ) -> bool {
        match &self.paths {
            None => true,
            Some(paths) => paths.iter().any(|p| {
                p.matches(&self.core_schema, schema, name, None)
                    || p.matches(&self.core_schema, schema, name, Some(sub_attribute))
            }),
        }
    }

    pub fn is_requested(&self, descriptor: &AttributeDescriptor) -> bool {
        self.is_attribute_requested(&descriptor.schema, &descriptor.name)
    }

    /// Copy of `object` holding only the requested attributes and
    /// sub-attributes.
    pub fn project(&self, object: &ScimObject) -> ScimObject {
        if self.all_requested() {
            return object.clone();
        }
        let mut projected = ScimObject::new(object.core_schema());
        for attribute in object.all_attributes() {
            if let Some(kept) = self.project_attribute(attribute) {
                projected.add_attribute(kept);
            }
        }
        projected
    }

    fn project_attribute(&self, attribute: &ScimAttribute) -> Option<ScimAttribute> {
        let (schema, name) = (attribute.schema(), attribute.name());
        if !self.is_attribute_requested(schema, name) {
            return None;
        }
        let whole = self
            .paths()
            .iter()
            .any(|p| p.matches(&self.core_schema, schema, name, None));
        if whole || !attribute.descriptor().is_complex() {
            return Some(attribute.clone());
        }
        attribute.retain_sub_attributes(|sub| {
            self.is_sub_attribute_requested(schema, name, sub.name())
        })
    }
}
