//! Typed view over a User resource.

use super::base::BaseResource;
use super::object::ScimObject;
use super::resolver::{BooleanResolver, StringResolver};
use super::value_objects::{
    Address, AddressResolver, Entry, EntryResolver, Manager, ManagerResolver, Name, NameResolver,
};
use crate::error::ValidationResult;
use crate::schema::{ResourceDescriptor, SCHEMA_URI_ENTERPRISE_EXTENSION};

use std::sync::Arc;

/// A User resource with typed accessors for the core and enterprise
/// attributes.
///
/// ```rust
/// use scim_directory::resource::UserResource;
/// use scim_directory::resource::value_objects::Name;
/// use scim_directory::schema::SchemaRegistry;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let registry = SchemaRegistry::with_embedded_descriptors()?;
/// let mut user = UserResource::new(registry.user_descriptor().unwrap().clone());
/// user.set_user_name("bjensen")?;
/// user.set_name(&Name::new_formatted("Ms. Barbara J Jensen III".to_string()))?;
/// assert_eq!(user.user_name()?.as_deref(), Some("bjensen"));
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct UserResource {
    base: BaseResource,
}

macro_rules! core_string_accessors {
    ($($getter:ident, $setter:ident => $name:literal;)*) => {
        $(
            pub fn $getter(&self) -> ValidationResult<Option<String>> {
                let core = self.core();
                self.base.get_singular_attribute_value(&core, $name, &StringResolver)
            }

            pub fn $setter(&mut self, value: impl Into<String>) -> ValidationResult<()> {
                let core = self.core();
                self.base
                    .set_singular_attribute_value(&core, $name, &StringResolver, &value.into())
            }
        )*
    };
}

macro_rules! enterprise_string_accessors {
    ($($getter:ident, $setter:ident => $name:literal;)*) => {
        $(
            pub fn $getter(&self) -> ValidationResult<Option<String>> {
                self.base.get_singular_attribute_value(
                    SCHEMA_URI_ENTERPRISE_EXTENSION,
                    $name,
                    &StringResolver,
                )
            }

            pub fn $setter(&mut self, value: impl Into<String>) -> ValidationResult<()> {
                self.base.set_singular_attribute_value(
                    SCHEMA_URI_ENTERPRISE_EXTENSION,
                    $name,
                    &StringResolver,
                    &value.into(),
                )
            }
        )*
    };
}

impl UserResource {
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

    core_string_accessors! {
        user_name, set_user_name => "userName";
        display_name, set_display_name => "displayName";
        nick_name, set_nick_name => "nickName";
        title, set_title => "title";
        user_type, set_user_type => "userType";
        preferred_language, set_preferred_language => "preferredLanguage";
        locale, set_locale => "locale";
        timezone, set_timezone => "timezone";
        password, set_password => "password";
    }

    enterprise_string_accessors! {
        employee_number, set_employee_number => "employeeNumber";
        cost_center, set_cost_center => "costCenter";
        organization, set_organization => "organization";
        division, set_division => "division";
        department, set_department => "department";
    }

    pub fn name(&self) -> ValidationResult<Option<Name>> {
        let core = self.core();
        self.base.get_singular_attribute_value(&core, "name", &NameResolver)
    }

    pub fn set_name(&mut self, name: &Name) -> ValidationResult<()> {
        let core = self.core();
        self.base
            .set_singular_attribute_value(&core, "name", &NameResolver, name)
    }

    pub fn active(&self) -> ValidationResult<Option<bool>> {
        let core = self.core();
        self.base.get_singular_attribute_value(&core, "active", &BooleanResolver)
    }

    pub fn set_active(&mut self, active: bool) -> ValidationResult<()> {
        let core = self.core();
        self.base
            .set_singular_attribute_value(&core, "active", &BooleanResolver, &active)
    }

    pub fn emails(&self) -> ValidationResult<Option<Vec<Entry<String>>>> {
        self.string_entries("emails")
    }

    pub fn set_emails(&mut self, emails: &[Entry<String>]) -> ValidationResult<()> {
        self.set_string_entries("emails", emails)
    }

    pub fn phone_numbers(&self) -> ValidationResult<Option<Vec<Entry<String>>>> {
        self.string_entries("phoneNumbers")
    }

    pub fn set_phone_numbers(&mut self, numbers: &[Entry<String>]) -> ValidationResult<()> {
        self.set_string_entries("phoneNumbers", numbers)
    }

    pub fn ims(&self) -> ValidationResult<Option<Vec<Entry<String>>>> {
        self.string_entries("ims")
    }

    pub fn photos(&self) -> ValidationResult<Option<Vec<Entry<String>>>> {
        self.string_entries("photos")
    }

    /// Groups the user belongs to. Read-only; derived by the service provider.
    pub fn groups(&self) -> ValidationResult<Option<Vec<Entry<String>>>> {
        self.string_entries("groups")
    }

    pub fn x509_certificates(&self) -> ValidationResult<Option<Vec<Entry<Vec<u8>>>>> {
        let core = self.core();
        self.base
            .get_plural_attribute_value(&core, "x509Certificates", &EntryResolver::binary())
    }

    pub fn addresses(&self) -> ValidationResult<Option<Vec<Address>>> {
        let core = self.core();
        self.base
            .get_plural_attribute_value(&core, "addresses", &AddressResolver)
    }

    pub fn set_addresses(&mut self, addresses: &[Address]) -> ValidationResult<()> {
        let core = self.core();
        self.base
            .set_plural_attribute_value(&core, "addresses", &AddressResolver, addresses)
    }

    pub fn manager(&self) -> ValidationResult<Option<Manager>> {
        self.base.get_singular_attribute_value(
            SCHEMA_URI_ENTERPRISE_EXTENSION,
            "manager",
            &ManagerResolver,
        )
    }

    pub fn set_manager(&mut self, manager: &Manager) -> ValidationResult<()> {
        self.base.set_singular_attribute_value(
            SCHEMA_URI_ENTERPRISE_EXTENSION,
            "manager",
            &ManagerResolver,
            manager,
        )
    }

    fn string_entries(&self, name: &str) -> ValidationResult<Option<Vec<Entry<String>>>> {
        let core = self.core();
        self.base
            .get_plural_attribute_value(&core, name, &EntryResolver::strings())
    }

    fn set_string_entries(
        &mut self,
        name: &str,
        entries: &[Entry<String>],
    ) -> ValidationResult<()> {
        let core = self.core();
        self.base
            .set_plural_attribute_value(&core, name, &EntryResolver::strings(), entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SchemaRegistry;

    fn user() -> UserResource {
        let registry = SchemaRegistry::with_embedded_descriptors().unwrap();
        UserResource::new(registry.user_descriptor().unwrap().clone())
    }

    #[test]
    fn test_core_and_enterprise_accessors() {
        let mut user = user();
        user.set_user_name("bjensen").unwrap();
        user.set_title("Tour Guide").unwrap();
        user.set_active(true).unwrap();
        user.set_employee_number("701984").unwrap();
        user.set_manager(&Manager::new("uid=boss,dc=example,dc=com"))
            .unwrap();

        assert_eq!(user.title().unwrap().as_deref(), Some("Tour Guide"));
        assert_eq!(user.active().unwrap(), Some(true));
        assert_eq!(user.employee_number().unwrap().as_deref(), Some("701984"));
        assert_eq!(
            user.manager().unwrap().and_then(|m| m.manager_id).as_deref(),
            Some("uid=boss,dc=example,dc=com")
        );
        assert_eq!(user.base().object().schemas().len(), 2);
    }

    #[test]
    fn test_emails_and_addresses() {
        let mut user = user();
        user.set_emails(&[Entry::new("bjensen@example.com".to_string()).with_primary(true)])
            .unwrap();
        user.set_addresses(&[Address {
            locality: Some("Hollywood".to_string()),
            address_type: Some("work".to_string()),
            ..Address::default()
        }])
        .unwrap();

        let emails = user.emails().unwrap().unwrap();
        assert!(emails[0].is_primary());
        let addresses = user.addresses().unwrap().unwrap();
        assert_eq!(addresses[0].locality.as_deref(), Some("Hollywood"));
        assert_eq!(user.groups().unwrap(), None);
    }

    #[test]
    fn test_typed_entries_and_identifiers() {
        let mut user = user();
        user.set_phone_numbers(&[
            Entry::new("+1 555 555 5555".to_string()).with_type("work"),
            Entry::new("+1 555 555 4444".to_string()).with_type("mobile"),
        ])
        .unwrap();
        let phones = user.phone_numbers().unwrap().unwrap();
        assert!(phones[1].has_type("MOBILE"));
        assert!(!phones[0].has_type("home"));

        let core = user.base().descriptor().core_schema().to_string();
        user.base_mut()
            .set_plural_attribute_value(
                &core,
                "x509Certificates",
                &EntryResolver::binary(),
                &[Entry::new(vec![0x30, 0x82, 0x01])],
            )
            .unwrap();
        let certificates = user.x509_certificates().unwrap().unwrap();
        assert_eq!(certificates[0].value, Some(vec![0x30, 0x82, 0x01]));

        user.base_mut().set_external_id("701984").unwrap();
        assert_eq!(user.base().external_id().unwrap().as_deref(), Some("701984"));
        user.base_mut().object_mut().remove_attribute(&core, "externalId");
        assert_eq!(user.base().external_id().unwrap(), None);
    }
}
