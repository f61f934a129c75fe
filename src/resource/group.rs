//! Typed view over a Group resource.

use super::base::BaseResource;
use super::object::ScimObject;
use super::resolver::StringResolver;
use super::value_objects::{Entry, EntryResolver};
use crate::error::ValidationResult;
use crate::schema::ResourceDescriptor;

use std::sync::Arc;

/// A Group resource: a display name and a list of member references.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupResource {
    base: BaseResource,
}

impl GroupResource {
    pub fn new(descriptor: Arc<ResourceDescriptor>) -> Self {
        Self {
            base: BaseResource::new(descriptor),
        }
    }

    pub fn from_object(descriptor: Arc<ResourceDescriptor>, object: ScimObject) -> Self {
        Self {
            base: BaseResource::from_object(descriptor, object),
        }
    }

    pub fn base(&self) -> &BaseResource {
        &self.base
    }

    pub fn base_mut(&mut self) -> &mut BaseResource {
        &mut self.base
    }

    pub fn into_object(self) -> ScimObject {
        self.base.into_object()
    }

    fn core(&self) -> String {
        self.base.descriptor().core_schema().to_string()
    }

    pub fn display_name(&self) -> ValidationResult<Option<String>> {
        let core = self.core();
        self.base
            .get_singular_attribute_value(&core, "displayName", &StringResolver)
    }

    pub fn set_display_name(&mut self, display_name: impl Into<String>) -> ValidationResult<()> {
        let core = self.core();
        self.base.set_singular_attribute_value(
            &core,
            "displayName",
            &StringResolver,
            &display_name.into(),
        )
    }

    /// Member references; each `value` is the member resource's id.
    pub fn members(&self) -> ValidationResult<Option<Vec<Entry<String>>>> {
        let core = self.core();
        self.base
            .get_plural_attribute_value(&core, "members", &EntryResolver::strings())
    }

    pub fn set_members(&mut self, members: &[Entry<String>]) -> ValidationResult<()> {
        let core = self.core();
        self.base
            .set_plural_attribute_value(&core, "members", &EntryResolver::strings(), members)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SchemaRegistry;

    #[test]
    fn test_group_members() {
        let registry = SchemaRegistry::with_embedded_descriptors().unwrap();
        let mut group = GroupResource::new(registry.group_descriptor().unwrap().clone());
        group.set_display_name("Tour Guides").unwrap();
        group
            .set_members(&[
                Entry::new("uid=bjensen,dc=example,dc=com".to_string()),
                Entry::new("uid=jsmith,dc=example,dc=com".to_string()).with_display("John"),
            ])
            .unwrap();

        let members = group.members().unwrap().unwrap();
        assert_eq!(members.len(), 2);
        assert_eq!(members[1].display.as_deref(), Some("John"));
        assert_eq!(group.display_name().unwrap().as_deref(), Some("Tour Guides"));
    }
}
