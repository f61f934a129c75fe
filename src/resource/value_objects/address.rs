//! Address value object for SCIM user address components.

use crate::error::ValidationResult;
use crate::resource::attribute::AttributeValue;
use crate::resource::resolver::{
    AttributeValueResolver, BooleanResolver, ComplexValueBuilder, StringResolver,
};
use crate::schema::AttributeDescriptor;

/// A physical mailing address.
///
/// Each component is optional. `primary` is tri-state so that an address
/// read without a `primary` sub-attribute is written back without one.
///
/// ## Examples
///
/// ```rust
/// use scim_directory::resource::value_objects::Address;
///
/// let address = Address {
///     street_address: Some("100 Universal City Plaza".to_string()),
///     locality: Some("Hollywood".to_string()),
///     region: Some("CA".to_string()),
///     address_type: Some("work".to_string()),
///     ..Address::default()
/// };
/// assert!(!address.is_primary());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Address {
    pub formatted: Option<String>,
    pub street_address: Option<String>,
    pub locality: Option<String>,
    pub region: Option<String>,
    pub postal_code: Option<String>,
    pub country: Option<String>,
    pub address_type: Option<String>,
    pub primary: Option<bool>,
}

impl Address {
    pub fn is_primary(&self) -> bool {
        self.primary.unwrap_or(false)
    }

    /// Whether every component is absent.
    pub fn is_empty(&self) -> bool {
        self.formatted.is_none()
            && self.street_address.is_none()
            && self.locality.is_none()
            && self.region.is_none()
            && self.postal_code.is_none()
            && self.country.is_none()
    }
}

/// Resolves values of the plural `addresses` attribute.
#[derive(Debug, Clone, Copy, Default)]
pub struct AddressResolver;

impl AttributeValueResolver<Address> for AddressResolver {
    fn to_instance(&self, value: &AttributeValue) -> ValidationResult<Address> {
        Ok(Address {
            formatted: value.sub_attribute_value("formatted", &StringResolver)?,
            street_address: value.sub_attribute_value("streetAddress", &StringResolver)?,
            locality: value.sub_attribute_value("locality", &StringResolver)?,
            region: value.sub_attribute_value("region", &StringResolver)?,
            postal_code: value.sub_attribute_value("postalCode", &StringResolver)?,
            country: value.sub_attribute_value("country", &StringResolver)?,
            address_type: value.sub_attribute_value("type", &StringResolver)?,
            primary: value.sub_attribute_value("primary", &BooleanResolver)?,
        })
    }

    fn from_instance(
        &self,
        descriptor: &AttributeDescriptor,
        address: &Address,
    ) -> ValidationResult<AttributeValue> {
        ComplexValueBuilder::new(descriptor)
            .add("type", &StringResolver, address.address_type.as_ref())?
            .add("formatted", &StringResolver, address.formatted.as_ref())?
            .add("streetAddress", &StringResolver, address.street_address.as_ref())?
            .add("locality", &StringResolver, address.locality.as_ref())?
            .add("region", &StringResolver, address.region.as_ref())?
            .add("postalCode", &StringResolver, address.postal_code.as_ref())?
            .add("country", &StringResolver, address.country.as_ref())?
            .add("primary", &BooleanResolver, address.primary.as_ref())?
            .build()
    }
}
