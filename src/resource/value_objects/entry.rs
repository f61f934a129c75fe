//! Generic value object for plural attribute values.
//!
//! Most plural attributes (`emails`, `phoneNumbers`, `ims`, `photos`,
//! `groups`, `members`, `x509Certificates`) share the same shape: a
//! `value` plus optional `display`, `type` and `primary`. [`Entry`] models
//! that shape over any value type, and [`EntryResolver`] composes a resolver
//! for the value type into a resolver for the whole entry.

use crate::error::ValidationResult;
use crate::resource::attribute::AttributeValue;
use crate::resource::resolver::{
    AttributeValueResolver, BinaryResolver, BooleanResolver, ComplexValueBuilder, StringResolver,
};
use crate::schema::AttributeDescriptor;

/// One value of a plural attribute.
///
/// ```rust
/// use scim_directory::resource::value_objects::Entry;
///
/// let email = Entry::new("bjensen@example.com".to_string())
///     .with_type("work")
///     .with_primary(true);
/// assert!(email.is_primary());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry<T> {
    pub value: Option<T>,
    pub display: Option<String>,
    pub entry_type: Option<String>,
    pub primary: Option<bool>,
}

impl<T> Default for Entry<T> {
    fn default() -> Self {
        Self {
            value: None,
            display: None,
            entry_type: None,
            primary: None,
        }
    }
}

impl<T> Entry<T> {
    pub fn new(value: T) -> Self {
        Self {
            value: Some(value),
            ..Self::default()
        }
    }

    pub fn with_type(mut self, entry_type: impl Into<String>) -> Self {
        self.entry_type = Some(entry_type.into());
        self
    }

    pub fn with_display(mut self, display: impl Into<String>) -> Self {
        self.display = Some(display.into());
        self
    }

    pub fn with_primary(mut self, primary: bool) -> Self {
        self.primary = Some(primary);
        self
    }

    pub fn is_primary(&self) -> bool {
        self.primary.unwrap_or(false)
    }

    /// Whether the entry's type matches, case-insensitively.
    pub fn has_type(&self, entry_type: &str) -> bool {
        self.entry_type
            .as_deref()
            .is_some_and(|t| t.eq_ignore_ascii_case(entry_type))
    }
}

/// Resolves [`Entry`] values using `R` for the `value` sub-attribute.
#[derive(Debug, Clone, Copy, Default)]
pub struct EntryResolver<R> {
    value_resolver: R,
}

impl<R> EntryResolver<R> {
    pub fn new(value_resolver: R) -> Self {
        Self { value_resolver }
    }
}

impl EntryResolver<StringResolver> {
    /// Resolver for entries with string values.
    pub fn strings() -> Self {
        Self::new(StringResolver)
    }
}

impl EntryResolver<BinaryResolver> {
    /// Resolver for entries with binary values.
    pub fn binary() -> Self {
        Self::new(BinaryResolver)
    }
}

impl<T, R> AttributeValueResolver<Entry<T>> for EntryResolver<R>
where
    R: AttributeValueResolver<T>,
{
    fn to_instance(&self, value: &AttributeValue) -> ValidationResult<Entry<T>> {
        Ok(Entry {
            value: value.sub_attribute_value("value", &self.value_resolver)?,
            display: value.sub_attribute_value("display", &StringResolver)?,
            entry_type: value.sub_attribute_value("type", &StringResolver)?,
            primary: value.sub_attribute_value("primary", &BooleanResolver)?,
        })
    }

    fn from_instance(
        &self,
        descriptor: &AttributeDescriptor,
        entry: &Entry<T>,
    ) -> ValidationResult<AttributeValue> {
        let mut builder = ComplexValueBuilder::new(descriptor)
            .add("value", &self.value_resolver, entry.value.as_ref())?
            .add("display", &StringResolver, entry.display.as_ref())?
            .add("type", &StringResolver, entry.entry_type.as_ref())?;
        // members and groups have no primary sub-attribute
        if descriptor.sub_attribute("primary").is_some() {
            builder = builder.add("primary", &BooleanResolver, entry.primary.as_ref())?;
        }
        builder.build()
    }
}
