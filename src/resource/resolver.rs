//! Conversions between attribute values and domain types.
//!
//! An [`AttributeValueResolver`] turns an [`AttributeValue`] into a typed
//! instance and back. The base resolvers below are stateless unit structs;
//! resolvers for domain objects live next to those objects in
//! [`value_objects`](super::value_objects) and are built from the base
//! resolvers and the sub-attribute helpers on [`AttributeValue`] and
//! [`ComplexValueBuilder`].

use super::attribute::{AttributeValue, ScimAttribute};
use super::value::SimpleValue;
use crate::error::{ValidationError, ValidationResult};
use crate::schema::AttributeDescriptor;

use chrono::{DateTime, Utc};

/// Bidirectional conversion between attribute values and `T`.
pub trait AttributeValueResolver<T> {
    /// Convert an attribute value into an instance.
    fn to_instance(&self, value: &AttributeValue) -> ValidationResult<T>;

    /// Convert an instance into an attribute value for `descriptor`.
    fn from_instance(
        &self,
        descriptor: &AttributeDescriptor,
        instance: &T,
    ) -> ValidationResult<AttributeValue>;
}

fn expect_simple<'a>(
    value: &'a AttributeValue,
    expected: &str,
) -> ValidationResult<&'a SimpleValue> {
    value
        .simple_value()
        .ok_or_else(|| ValidationError::invalid_type("value", expected, "complex"))
}

/// Resolves simple values to their canonical string form.
#[derive(Debug, Clone, Copy, Default)]
pub struct StringResolver;

impl AttributeValueResolver<String> for StringResolver {
    fn to_instance(&self, value: &AttributeValue) -> ValidationResult<String> {
        expect_simple(value, "string").map(SimpleValue::string_value)
    }

    fn from_instance(
        &self,
        _descriptor: &AttributeDescriptor,
        instance: &String,
    ) -> ValidationResult<AttributeValue> {
        Ok(AttributeValue::Simple(SimpleValue::String(instance.clone())))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BooleanResolver;

impl AttributeValueResolver<bool> for BooleanResolver {
    fn to_instance(&self, value: &AttributeValue) -> ValidationResult<bool> {
        let simple = expect_simple(value, "boolean")?;
        simple
            .boolean_value()
            .ok_or_else(|| ValidationError::InvalidBooleanValue {
                attribute: "value".to_string(),
                value: simple.string_value(),
            })
    }

    fn from_instance(
        &self,
        _descriptor: &AttributeDescriptor,
        instance: &bool,
    ) -> ValidationResult<AttributeValue> {
        Ok(AttributeValue::Simple(SimpleValue::Boolean(*instance)))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct IntegerResolver;

impl AttributeValueResolver<i64> for IntegerResolver {
    fn to_instance(&self, value: &AttributeValue) -> ValidationResult<i64> {
        let simple = expect_simple(value, "integer")?;
        simple
            .integer_value()
            .ok_or_else(|| ValidationError::InvalidIntegerValue {
                attribute: "value".to_string(),
                value: simple.string_value(),
            })
    }

    fn from_instance(
        &self,
        _descriptor: &AttributeDescriptor,
        instance: &i64,
    ) -> ValidationResult<AttributeValue> {
        Ok(AttributeValue::Simple(SimpleValue::Integer(*instance)))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DateTimeResolver;

impl AttributeValueResolver<DateTime<Utc>> for DateTimeResolver {
    fn to_instance(&self, value: &AttributeValue) -> ValidationResult<DateTime<Utc>> {
        let simple = expect_simple(value, "dateTime")?;
        simple
            .datetime_value()
            .ok_or_else(|| ValidationError::InvalidDateTimeFormat {
                attribute: "value".to_string(),
                value: simple.string_value(),
            })
    }

    fn from_instance(
        &self,
        _descriptor: &AttributeDescriptor,
        instance: &DateTime<Utc>,
    ) -> ValidationResult<AttributeValue> {
        Ok(AttributeValue::Simple(SimpleValue::DateTime(*instance)))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BinaryResolver;

impl AttributeValueResolver<Vec<u8>> for BinaryResolver {
    fn to_instance(&self, value: &AttributeValue) -> ValidationResult<Vec<u8>> {
        let simple = expect_simple(value, "binary")?;
        simple
            .binary_value()
            .ok_or_else(|| ValidationError::InvalidBinaryData {
                attribute: "value".to_string(),
                details: "not base64".to_string(),
            })
    }

    fn from_instance(
        &self,
        _descriptor: &AttributeDescriptor,
        instance: &Vec<u8>,
    ) -> ValidationResult<AttributeValue> {
        Ok(AttributeValue::Simple(SimpleValue::Binary(instance.clone())))
    }
}

/// Assembles a complex value sub-attribute by sub-attribute.
///
/// Absent fields are skipped, so a domain object with only some fields set
/// produces a complex value with only those sub-attributes.
#[derive(Debug)]
pub struct ComplexValueBuilder<'a> {
    descriptor: &'a AttributeDescriptor,
    sub_attributes: Vec<ScimAttribute>,
}

impl<'a> ComplexValueBuilder<'a> {
    pub fn new(descriptor: &'a AttributeDescriptor) -> Self {
        Self {
            descriptor,
            sub_attributes: Vec::new(),
        }
    }

    /// Add a sub-attribute when `instance` is present.
    pub fn add<T, R>(
        mut self,
        name: &str,
        resolver: &R,
        instance: Option<&T>,
    ) -> ValidationResult<Self>
    where
        R: AttributeValueResolver<T> + ?Sized,
    {
        if let Some(instance) = instance {
            let sub_descriptor = self.descriptor.sub_attribute(name).ok_or_else(|| {
                ValidationError::UnknownSubAttribute {
                    attribute: self.descriptor.name.clone(),
                    sub_attribute: name.to_string(),
                }
            })?;
            let value = resolver.from_instance(sub_descriptor, instance)?;
            self.sub_attributes
                .push(ScimAttribute::singular(sub_descriptor.clone(), value)?);
        }
        Ok(self)
    }

    pub fn build(self) -> ValidationResult<AttributeValue> {
        AttributeValue::complex(self.sub_attributes)
    }
}

/// Check `from_instance(to_instance(v)) == v` for every subset of `samples`
/// present as sub-attributes of a complex value.
#[cfg(test)]
pub(crate) fn assert_total_over_subsets<T, R>(
    resolver: &R,
    descriptor: &AttributeDescriptor,
    samples: &[(&str, SimpleValue)],
) where
    R: AttributeValueResolver<T>,
{
    for mask in 0..(1u32 << samples.len()) {
        let subs = samples
            .iter()
            .enumerate()
            .filter(|(i, _)| mask & (1 << i) != 0)
            .map(|(_, (name, value))| {
                let sub = descriptor.sub_attribute(name).unwrap().clone();
                ScimAttribute::simple(sub, value.clone()).unwrap()
            })
            .collect();
        let value = AttributeValue::complex(subs).unwrap();
        let instance = resolver.to_instance(&value).unwrap();
        assert_eq!(
            resolver.from_instance(descriptor, &instance).unwrap(),
            value,
            "{} with sub-attribute mask {:b}",
            descriptor.name,
            mask
        );
    }
}
