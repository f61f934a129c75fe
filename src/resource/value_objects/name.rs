//! Name value object for the components of a user's real name.

use crate::error::ValidationResult;
use crate::resource::attribute::AttributeValue;
use crate::resource::resolver::{AttributeValueResolver, ComplexValueBuilder, StringResolver};
use crate::schema::AttributeDescriptor;

use std::fmt;

/// The components of a user's real name.
///
/// Every component is optional. A `Name` with no components set resolves
/// to an empty complex value.
///
/// ## Examples
///
/// ```rust
/// use scim_directory::resource::value_objects::Name;
///
/// let name = Name::new_simple("Barbara".to_string(), "Jensen".to_string());
/// assert_eq!(name.display_name(), Some("Barbara Jensen".to_string()));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Name {
    pub formatted: Option<String>,
    pub family_name: Option<String>,
    pub given_name: Option<String>,
    pub middle_name: Option<String>,
    pub honorific_prefix: Option<String>,
    pub honorific_suffix: Option<String>,
}

impl Name {
    /// Create a name from given and family name.
    pub fn new_simple(given_name: String, family_name: String) -> Self {
        Self {
            given_name: Some(given_name),
            family_name: Some(family_name),
            ..Self::default()
        }
    }

    /// Create a name with only the formatted component.
    pub fn new_formatted(formatted: String) -> Self {
        Self {
            formatted: Some(formatted),
            ..Self::default()
        }
    }

    /// The formatted name, or one assembled from the components.
    pub fn display_name(&self) -> Option<String> {
        if let Some(formatted) = &self.formatted {
            return Some(formatted.clone());
        }
        let parts: Vec<&str> = [
            &self.honorific_prefix,
            &self.given_name,
            &self.middle_name,
            &self.family_name,
            &self.honorific_suffix,
        ]
        .into_iter()
        .filter_map(|part| part.as_deref())
        .collect();
        (!parts.is_empty()).then(|| parts.join(" "))
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_name().unwrap_or_default())
    }
}

/// Resolves the `name` complex attribute.
#[derive(Debug, Clone, Copy, Default)]
pub struct NameResolver;

impl AttributeValueResolver<Name> for NameResolver {
    fn to_instance(&self, value: &AttributeValue) -> ValidationResult<Name> {
        Ok(Name {
            formatted: value.sub_attribute_value("formatted", &StringResolver)?,
            family_name: value.sub_attribute_value("familyName", &StringResolver)?,
            given_name: value.sub_attribute_value("givenName", &StringResolver)?,
            middle_name: value.sub_attribute_value("middleName", &StringResolver)?,
            honorific_prefix: value.sub_attribute_value("honorificPrefix", &StringResolver)?,
            honorific_suffix: value.sub_attribute_value("honorificSuffix", &StringResolver)?,
        })
    }

    fn from_instance(
        &self,
        descriptor: &AttributeDescriptor,
        name: &Name,
    ) -> ValidationResult<AttributeValue> {
        ComplexValueBuilder::new(descriptor)
            .add("formatted", &StringResolver, name.formatted.as_ref())?
            .add("familyName", &StringResolver, name.family_name.as_ref())?
            .add("givenName", &StringResolver, name.given_name.as_ref())?
            .add("middleName", &StringResolver, name.middle_name.as_ref())?
            .add("honorificPrefix", &StringResolver, name.honorific_prefix.as_ref())?
            .add("honorificSuffix", &StringResolver, name.honorific_suffix.as_ref())?
            .build()
    }
}
