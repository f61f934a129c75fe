//! Descriptor-aware access to a resource object.
//!
//! [`BaseResource`] pairs a [`ScimObject`] with its [`ResourceDescriptor`]
//! and offers typed get/set of singular and plural attributes through
//! resolvers. The typed User and Group views are thin wrappers over it.

use super::attribute::ScimAttribute;
use super::object::ScimObject;
use super::resolver::{AttributeValueResolver, StringResolver};
use super::value_objects::{Meta, MetaResolver};
use crate::error::{ValidationError, ValidationResult};
use crate::schema::{AttributeDescriptor, ResourceDescriptor};

use std::sync::Arc;

/// A resource object together with the descriptor it conforms to.
#[derive(Debug, Clone, PartialEq)]
pub struct BaseResource {
    descriptor: Arc<ResourceDescriptor>,
    object: ScimObject,
}

impl BaseResource {
    /// Create an empty resource.
    pub fn new(descriptor: Arc<ResourceDescriptor>) -> Self {
        let object = ScimObject::new(descriptor.core_schema());
        Self { descriptor, object }
    }

    /// Wrap an existing object.
    pub fn from_object(descriptor: Arc<ResourceDescriptor>, object: ScimObject) -> Self {
        Self { descriptor, object }
    }

    pub fn descriptor(&self) -> &Arc<ResourceDescriptor> {
        &self.descriptor
    }

    pub fn object(&self) -> &ScimObject {
        &self.object
    }

    pub fn object_mut(&mut self) -> &mut ScimObject {
        &mut self.object
    }

    pub fn into_object(self) -> ScimObject {
        self.object
    }

    fn attribute_descriptor(
        &self,
        schema: &str,
        name: &str,
    ) -> ValidationResult<&Arc<AttributeDescriptor>> {
        self.descriptor
            .attribute(schema, name)
            .ok_or_else(|| ValidationError::UnknownAttribute {
                attribute: name.to_string(),
                schema_id: schema.to_string(),
            })
    }

    /// Resolve a singular attribute. Absent attributes yield `Ok(None)`.
    pub fn get_singular_attribute_value<T, R>(
        &self,
        schema: &str,
        name: &str,
        resolver: &R,
    ) -> ValidationResult<Option<T>>
    where
        R: AttributeValueResolver<T> + ?Sized,
    {
        match self.object.get_attribute(schema, name) {
            None => Ok(None),
            Some(attribute) => {
                let value = attribute.singular_value().ok_or_else(|| {
                    ValidationError::ExpectedSingleValue {
                        attribute: name.to_string(),
                    }
                })?;
                resolver.to_instance(value).map(Some)
            }
        }
    }

    /// Set a singular attribute, replacing any previous value.
    pub fn set_singular_attribute_value<T, R>(
        &mut self,
        schema: &str,
        name: &str,
        resolver: &R,
        instance: &T,
    ) -> ValidationResult<()>
    where
        R: AttributeValueResolver<T> + ?Sized,
    {
        let descriptor = self.attribute_descriptor(schema, name)?.clone();
        let value = resolver.from_instance(&descriptor, instance)?;
        self.object
            .add_attribute(ScimAttribute::singular(descriptor, value)?);
        Ok(())
    }

    /// Resolve every value of a plural attribute.
    pub fn get_plural_attribute_value<T, R>(
        &self,
        schema: &str,
        name: &str,
        resolver: &R,
    ) -> ValidationResult<Option<Vec<T>>>
    where
        R: AttributeValueResolver<T> + ?Sized,
    {
        match self.object.get_attribute(schema, name) {
            None => Ok(None),
            Some(attribute) if !attribute.is_plural() => Err(ValidationError::ExpectedMultiValue {
                attribute: name.to_string(),
            }),
            Some(attribute) => attribute
                .plural_values()
                .iter()
                .map(|value| resolver.to_instance(value))
                .collect::<ValidationResult<Vec<T>>>()
                .map(Some),
        }
    }

    /// Set a plural attribute, replacing any previous values.
    pub fn set_plural_attribute_value<T, R>(
        &mut self,
        schema: &str,
        name: &str,
        resolver: &R,
        instances: &[T],
    ) -> ValidationResult<()>
    where
        R: AttributeValueResolver<T> + ?Sized,
    {
        let descriptor = self.attribute_descriptor(schema, name)?.clone();
        let values = instances
            .iter()
            .map(|instance| resolver.from_instance(&descriptor, instance))
            .collect::<ValidationResult<Vec<_>>>()?;
        self.object
            .add_attribute(ScimAttribute::plural(descriptor, values)?);
        Ok(())
    }

    pub fn remove_attribute(&mut self, schema: &str, name: &str) -> Option<ScimAttribute> {
        self.object.remove_attribute(schema, name)
    }

    /// The `id` of the resource, if assigned.
    pub fn id(&self) -> ValidationResult<Option<String>> {
        let core = self.descriptor.core_schema().to_string();
        self.get_singular_attribute_value(&core, "id", &StringResolver)
    }

    pub fn set_id(&mut self, id: impl Into<String>) -> ValidationResult<()> {
        let core = self.descriptor.core_schema().to_string();
        self.set_singular_attribute_value(&core, "id", &StringResolver, &id.into())
    }

    pub fn external_id(&self) -> ValidationResult<Option<String>> {
        let core = self.descriptor.core_schema().to_string();
        self.get_singular_attribute_value(&core, "externalId", &StringResolver)
    }

    pub fn set_external_id(&mut self, external_id: impl Into<String>) -> ValidationResult<()> {
        let core = self.descriptor.core_schema().to_string();
        self.set_singular_attribute_value(&core, "externalId", &StringResolver, &external_id.into())
    }

    pub fn meta(&self) -> ValidationResult<Option<Meta>> {
        let core = self.descriptor.core_schema().to_string();
        self.get_singular_attribute_value(&core, "meta", &MetaResolver)
    }

    pub fn set_meta(&mut self, meta: &Meta) -> ValidationResult<()> {
        let core = self.descriptor.core_schema().to_string();
        self.set_singular_attribute_value(&core, "meta", &MetaResolver, meta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::value_objects::{Entry, EntryResolver};
    use crate::schema::{SCHEMA_URI_CORE, SchemaRegistry};

    fn user() -> BaseResource {
        let registry = SchemaRegistry::with_embedded_descriptors().unwrap();
        BaseResource::new(registry.user_descriptor().unwrap().clone())
    }

    #[test]
    fn test_resources_compare_by_descriptor_and_content() {
        let registry = SchemaRegistry::with_embedded_descriptors().unwrap();
        let mut resource = user();
        resource.set_id("uid=bjensen,dc=example,dc=com").unwrap();
        assert_eq!(resource.clone(), resource);
        assert_ne!(resource, user());

        let group = BaseResource::new(registry.group_descriptor().unwrap().clone());
        assert_ne!(group, BaseResource::new(registry.user_descriptor().unwrap().clone()));
    }

    #[test]
    fn test_singular_get_set() {
        let mut resource = user();
        assert_eq!(resource.id().unwrap(), None);
        resource.set_id("uid=bjensen,dc=example,dc=com").unwrap();
        assert_eq!(
            resource.id().unwrap().as_deref(),
            Some("uid=bjensen,dc=example,dc=com")
        );
    }

    #[test]
    fn test_singular_set_on_plural_descriptor_fails() {
        let mut resource = user();
        let result = resource.set_singular_attribute_value(
            SCHEMA_URI_CORE,
            "emails",
            &EntryResolver::strings(),
            &Entry::new("bjensen@example.com".to_string()),
        );
        assert!(matches!(
            result,
            Err(ValidationError::ExpectedMultiValue { .. })
        ));
    }

    #[test]
    fn test_unknown_attribute_fails() {
        let mut resource = user();
        let result = resource.set_singular_attribute_value(
            SCHEMA_URI_CORE,
            "shoeSize",
            &StringResolver,
            &"11".to_string(),
        );
        assert!(matches!(
            result,
            Err(ValidationError::UnknownAttribute { .. })
        ));
    }

    #[test]
    fn test_plural_get_set() {
        let mut resource = user();
        let emails = vec![
            Entry::new("bjensen@example.com".to_string()).with_type("work"),
            Entry::new("babs@jensen.org".to_string()).with_type("home"),
        ];
        resource
            .set_plural_attribute_value(
                SCHEMA_URI_CORE,
                "emails",
                &EntryResolver::strings(),
                &emails,
            )
            .unwrap();
        let read = resource
            .get_plural_attribute_value(SCHEMA_URI_CORE, "emails", &EntryResolver::strings())
            .unwrap();
        assert_eq!(read, Some(emails));
    }
}
