//! Attribute values and attributes.
//!
//! An [`AttributeValue`] is either a [`SimpleValue`] or a complex value made
//! of singular sub-attributes. A [`ScimAttribute`] binds a descriptor to
//! either exactly one value or an ordered list of complex values; the
//! constructors refuse any shape that disagrees with the descriptor.

use super::resolver::AttributeValueResolver;
use super::value::SimpleValue;
use crate::error::{ValidationError, ValidationResult};
use crate::schema::AttributeDescriptor;

use std::collections::BTreeMap;
use std::sync::Arc;

/// A simple or complex attribute value.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    Simple(SimpleValue),
    /// Sub-attributes keyed by lower-cased name
    Complex(BTreeMap<String, ScimAttribute>),
}

impl AttributeValue {
    /// Wrap a simple value.
    pub fn simple(value: impl Into<SimpleValue>) -> Self {
        Self::Simple(value.into())
    }

    /// Build a complex value from singular sub-attributes.
    ///
    /// Fails when a sub-attribute is plural or appears twice.
    pub fn complex(sub_attributes: Vec<ScimAttribute>) -> ValidationResult<Self> {
        let mut map = BTreeMap::new();
        for sub in sub_attributes {
            if sub.is_plural() {
                return Err(ValidationError::ExpectedSingleValue {
                    attribute: sub.name().to_string(),
                });
            }
            let key = sub.name().to_ascii_lowercase();
            if map.contains_key(&key) {
                return Err(ValidationError::custom(format!(
                    "Duplicate sub-attribute '{}'",
                    sub.name()
                )));
            }
            map.insert(key, sub);
        }
        Ok(Self::Complex(map))
    }

    pub fn is_complex(&self) -> bool {
        matches!(self, Self::Complex(_))
    }

    pub fn simple_value(&self) -> Option<&SimpleValue> {
        match self {
            Self::Simple(value) => Some(value),
            Self::Complex(_) => None,
        }
    }

    /// Look up a sub-attribute of a complex value by name, case-insensitively.
    pub fn sub_attribute(&self, name: &str) -> Option<&ScimAttribute> {
        match self {
            Self::Complex(subs) => subs.get(&name.to_ascii_lowercase()),
            Self::Simple(_) => None,
        }
    }

    /// Sub-attributes of a complex value in name order.
    pub fn sub_attributes(&self) -> impl Iterator<Item = &ScimAttribute> {
        let subs = match self {
            Self::Complex(subs) => Some(subs),
            Self::Simple(_) => None,
        };
        subs.into_iter().flat_map(|subs| subs.values())
    }

    /// Simple value of a singular sub-attribute.
    pub fn sub_attribute_simple_value(&self, name: &str) -> Option<&SimpleValue> {
        self.sub_attribute(name)
            .and_then(ScimAttribute::singular_value)
            .and_then(AttributeValue::simple_value)
    }

    /// Resolve a singular sub-attribute through a resolver.
    ///
    /// Returns `Ok(None)` when the sub-attribute is absent and fails when
    /// this value is not complex.
    pub fn sub_attribute_value<T, R>(&self, name: &str, resolver: &R) -> ValidationResult<Option<T>>
    where
        R: AttributeValueResolver<T> + ?Sized,
    {
        if !self.is_complex() {
            return Err(ValidationError::ExpectedComplexValue {
                attribute: name.to_string(),
            });
        }
        match self.sub_attribute(name) {
            None => Ok(None),
            Some(sub) => match sub.singular_value() {
                Some(value) => resolver.to_instance(value).map(Some),
                None => Err(ValidationError::ExpectedSingleValue {
                    attribute: sub.name().to_string(),
                }),
            },
        }
    }

    /// Copy of a complex value keeping only sub-attributes accepted by `keep`.
    pub fn retain_sub_attributes(&self, keep: impl Fn(&ScimAttribute) -> bool) -> Self {
        match self {
            Self::Complex(subs) => Self::Complex(
                subs.iter()
                    .filter(|(_, sub)| keep(sub))
                    .map(|(k, sub)| (k.clone(), sub.clone()))
                    .collect(),
            ),
            Self::Simple(_) => self.clone(),
        }
    }
}

/// The values held by an attribute.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValues {
    Singular(AttributeValue),
    Plural(Vec<AttributeValue>),
}

/// A named attribute bound to its descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct ScimAttribute {
    descriptor: Arc<AttributeDescriptor>,
    values: AttributeValues,
}

impl ScimAttribute {
    /// Create a singular attribute.
    ///
    /// Fails when the descriptor is plural, when the value shape or data type
    /// disagrees with the descriptor, or when a complex value carries a
    /// sub-attribute the descriptor does not define. An untyped descriptor
    /// only accepts strings.
    pub fn singular(
        descriptor: Arc<AttributeDescriptor>,
        value: AttributeValue,
    ) -> ValidationResult<Self> {
        if descriptor.multi_valued {
            return Err(ValidationError::ExpectedMultiValue {
                attribute: descriptor.name.clone(),
            });
        }
        check_value_shape(&descriptor, &value)?;
        Ok(Self {
            descriptor,
            values: AttributeValues::Singular(value),
        })
    }

    /// Create a singular attribute from a simple value.
    pub fn simple(
        descriptor: Arc<AttributeDescriptor>,
        value: impl Into<SimpleValue>,
    ) -> ValidationResult<Self> {
        Self::singular(descriptor, AttributeValue::Simple(value.into()))
    }

    /// Create a plural attribute. Every value must be complex.
    pub fn plural(
        descriptor: Arc<AttributeDescriptor>,
        values: Vec<AttributeValue>,
    ) -> ValidationResult<Self> {
        if !descriptor.multi_valued {
            return Err(ValidationError::ExpectedSingleValue {
                attribute: descriptor.name.clone(),
            });
        }
        for value in &values {
            if !value.is_complex() {
                return Err(ValidationError::ExpectedComplexValue {
                    attribute: descriptor.name.clone(),
                });
            }
            check_value_shape(&descriptor, value)?;
        }
        Ok(Self {
            descriptor,
            values: AttributeValues::Plural(values),
        })
    }

    pub fn name(&self) -> &str {
        &self.descriptor.name
    }

    /// URI of the owning schema.
    pub fn schema(&self) -> &str {
        &self.descriptor.schema
    }

    pub fn descriptor(&self) -> &Arc<AttributeDescriptor> {
        &self.descriptor
    }

    pub fn values(&self) -> &AttributeValues {
        &self.values
    }

    pub fn is_plural(&self) -> bool {
        matches!(self.values, AttributeValues::Plural(_))
    }

    /// The value of a singular attribute.
    pub fn singular_value(&self) -> Option<&AttributeValue> {
        match &self.values {
            AttributeValues::Singular(value) => Some(value),
            AttributeValues::Plural(_) => None,
        }
    }

    /// The values of a plural attribute; empty for singular attributes.
    pub fn plural_values(&self) -> &[AttributeValue] {
        match &self.values {
            AttributeValues::Plural(values) => values,
            AttributeValues::Singular(_) => &[],
        }
    }

    /// Copy of this attribute with complex values filtered by `keep`.
    ///
    /// Returns `None` when nothing is left.
    pub(crate) fn retain_sub_attributes(
        &self,
        keep: impl Fn(&ScimAttribute) -> bool,
    ) -> Option<Self> {
        let values = match &self.values {
            AttributeValues::Singular(value) => {
                let value = value.retain_sub_attributes(&keep);
                if value.sub_attributes().next().is_none() {
                    return None;
                }
                AttributeValues::Singular(value)
            }
            AttributeValues::Plural(values) => {
                let values: Vec<_> = values
                    .iter()
                    .map(|v| v.retain_sub_attributes(&keep))
                    .filter(|v| v.sub_attributes().next().is_some())
                    .collect();
                if values.is_empty() {
                    return None;
                }
                AttributeValues::Plural(values)
            }
        };
        Some(Self {
            descriptor: self.descriptor.clone(),
            values,
        })
    }
}

fn check_value_shape(
    descriptor: &AttributeDescriptor,
    value: &AttributeValue,
) -> ValidationResult<()> {
    match value {
        AttributeValue::Simple(_) if descriptor.is_complex() => {
            Err(ValidationError::ExpectedComplexValue {
                attribute: descriptor.name.clone(),
            })
        }
        AttributeValue::Complex(_) if !descriptor.is_complex() => {
            Err(ValidationError::ExpectedSimpleValue {
                attribute: descriptor.name.clone(),
            })
        }
        AttributeValue::Complex(subs) => {
            for sub in subs.values() {
                if descriptor.sub_attribute(sub.name()).is_none() {
                    return Err(ValidationError::UnknownSubAttribute {
                        attribute: descriptor.name.clone(),
                        sub_attribute: sub.name().to_string(),
                    });
                }
            }
            Ok(())
        }
        AttributeValue::Simple(simple) => {
            let expected = descriptor.effective_type();
            if simple.data_type() != expected {
                return Err(ValidationError::invalid_type(
                    descriptor.name.clone(),
                    expected.to_string(),
                    simple.data_type().to_string(),
                ));
            }
            Ok(())
        }
    }
}
