//! Manager value object of the enterprise user extension.

use crate::error::ValidationResult;
use crate::resource::attribute::AttributeValue;
use crate::resource::resolver::{AttributeValueResolver, ComplexValueBuilder, StringResolver};
use crate::schema::AttributeDescriptor;

/// A reference to a user's manager.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manager {
    /// Identifier of the manager's resource
    pub manager_id: Option<String>,
    pub display_name: Option<String>,
}

impl Manager {
    pub fn new(manager_id: impl Into<String>) -> Self {
        Self {
            manager_id: Some(manager_id.into()),
            display_name: None,
        }
    }
}

/// Resolves the enterprise `manager` attribute.
#[derive(Debug, Clone, Copy, Default)]
pub struct ManagerResolver;

impl AttributeValueResolver<Manager> for ManagerResolver {
    fn to_instance(&self, value: &AttributeValue) -> ValidationResult<Manager> {
        Ok(Manager {
            manager_id: value.sub_attribute_value("managerId", &StringResolver)?,
            display_name: value.sub_attribute_value("displayName", &StringResolver)?,
        })
    }

    fn from_instance(
        &self,
        descriptor: &AttributeDescriptor,
        manager: &Manager,
    ) -> ValidationResult<AttributeValue> {
        ComplexValueBuilder::new(descriptor)
            .add("managerId", &StringResolver, manager.manager_id.as_ref())?
            .add("displayName", &StringResolver, manager.display_name.as_ref())?
            .build()
    }
}
