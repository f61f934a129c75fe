//! Meta value object for SCIM resource metadata.

use crate::error::ValidationResult;
use crate::resource::attribute::AttributeValue;
use crate::resource::resolver::{
    AttributeValueResolver, ComplexValueBuilder, DateTimeResolver, StringResolver,
};
use crate::schema::AttributeDescriptor;

use chrono::{DateTime, Utc};

/// Resource metadata managed by the service provider.
///
/// `version` is an opaque entity tag; two reads of an unchanged resource
/// return the same version.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Meta {
    pub created: Option<DateTime<Utc>>,
    pub last_modified: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub version: Option<String>,
}

impl Meta {
    pub fn is_empty(&self) -> bool {
        self.created.is_none()
            && self.last_modified.is_none()
            && self.location.is_none()
            && self.version.is_none()
    }
}

/// Resolves the `meta` complex attribute.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetaResolver;

impl AttributeValueResolver<Meta> for MetaResolver {
    fn to_instance(&self, value: &AttributeValue) -> ValidationResult<Meta> {
        Ok(Meta {
            created: value.sub_attribute_value("created", &DateTimeResolver)?,
            last_modified: value.sub_attribute_value("lastModified", &DateTimeResolver)?,
            location: value.sub_attribute_value("location", &StringResolver)?,
            version: value.sub_attribute_value("version", &StringResolver)?,
        })
    }

    fn from_instance(
        &self,
        descriptor: &AttributeDescriptor,
        meta: &Meta,
    ) -> ValidationResult<AttributeValue> {
        ComplexValueBuilder::new(descriptor)
            .add("created", &DateTimeResolver, meta.created.as_ref())?
            .add("lastModified", &DateTimeResolver, meta.last_modified.as_ref())?
            .add("location", &StringResolver, meta.location.as_ref())?
            .add("version", &StringResolver, meta.version.as_ref())?
            .build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::SimpleValue;
    use crate::resource::resolver::assert_total_over_subsets;
    use crate::schema::SchemaRegistry;
    use chrono::TimeZone;

    #[test]
    fn test_meta_round_trip() {
        let registry = SchemaRegistry::with_embedded_descriptors().unwrap();
        let descriptor = registry
            .group_descriptor()
            .unwrap()
            .core_attribute("meta")
            .unwrap()
            .clone();

        let meta = Meta {
            created: Some(Utc.with_ymd_and_hms(2010, 1, 23, 4, 56, 22).unwrap()),
            version: Some("W/\"3694e05e9dff591\"".to_string()),
            ..Meta::default()
        };
        let value = MetaResolver.from_instance(&descriptor, &meta).unwrap();
        assert_eq!(value.sub_attributes().count(), 2);
        assert_eq!(MetaResolver.to_instance(&value).unwrap(), meta);
        assert!(!meta.is_empty());
    }

    #[test]
    fn test_every_sub_attribute_combination_round_trips() {
        let registry = SchemaRegistry::with_embedded_descriptors().unwrap();
        let descriptor = registry
            .user_descriptor()
            .unwrap()
            .core_attribute("meta")
            .unwrap()
            .clone();
        let at = |second| {
            SimpleValue::DateTime(Utc.with_ymd_and_hms(2011, 8, 1, 18, 29, second).unwrap())
        };
        assert_total_over_subsets(
            &MetaResolver,
            &descriptor,
            &[
                ("created", at(49)),
                ("lastModified", at(50)),
                (
                    "location",
                    SimpleValue::String("https://example.com/v1/Users/2819c223".to_string()),
                ),
                ("version", SimpleValue::String("W/\"f250dd84f0671c3\"".to_string())),
            ],
        );
    }
}
