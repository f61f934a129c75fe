//! Value transformations between SCIM values and directory values.
//!
//! A [`Transformation`] is attached to each mapped attribute and converts
//! values in both directions, plus filter literals on the way to the
//! directory. Transformations are looked up by key in a
//! [`TransformationRegistry`] when mappers are built.

use crate::directory::in_memory::format_generalized_time;
use crate::error::{BuildError, BuildResult, ScimError, ScimResult, ValidationError};
use crate::resource::SimpleValue;
use crate::schema::{AttributeDescriptor, AttributeType};

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;

/// Converts attribute values across the SCIM/directory boundary.
pub trait Transformation: Send + Sync + Debug {
    /// Convert a raw directory value into a SCIM value.
    fn to_scim_value(
        &self,
        descriptor: &AttributeDescriptor,
        raw: &[u8],
    ) -> ScimResult<SimpleValue>;

    /// Convert a SCIM value into a raw directory value.
    fn to_directory_value(
        &self,
        descriptor: &AttributeDescriptor,
        value: &SimpleValue,
    ) -> ScimResult<Vec<u8>>;

    /// Convert a SCIM filter literal into a directory filter literal.
    fn to_directory_filter_value(&self, value: &str) -> ScimResult<String>;
}

/// Pass-through conversion driven by the descriptor's data type.
///
/// Booleans are stored as `TRUE`/`FALSE`, date-times as RFC 3339 strings and
/// binary values as raw bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultTransformation;

impl Transformation for DefaultTransformation {
    fn to_scim_value(
        &self,
        descriptor: &AttributeDescriptor,
        raw: &[u8],
    ) -> ScimResult<SimpleValue> {
        match descriptor.effective_type() {
            AttributeType::Binary => Ok(SimpleValue::Binary(raw.to_vec())),
            data_type => {
                let text = String::from_utf8_lossy(raw);
                Ok(SimpleValue::parse(Some(data_type), &descriptor.name, &text)?)
            }
        }
    }

    fn to_directory_value(
        &self,
        descriptor: &AttributeDescriptor,
        value: &SimpleValue,
    ) -> ScimResult<Vec<u8>> {
        let raw = match (descriptor.effective_type(), value) {
            (AttributeType::Binary, value) => value.binary_value().ok_or_else(|| {
                ValidationError::InvalidBinaryData {
                    attribute: descriptor.name.clone(),
                    details: value.string_value(),
                }
            })?,
            (AttributeType::Boolean, value) => {
                let flag = value.boolean_value().ok_or_else(|| {
                    ValidationError::InvalidBooleanValue {
                        attribute: descriptor.name.clone(),
                        value: value.string_value(),
                    }
                })?;
                boolean_literal(flag).as_bytes().to_vec()
            }
            (_, value) => value.string_value().into_bytes(),
        };
        Ok(raw)
    }

    fn to_directory_filter_value(&self, value: &str) -> ScimResult<String> {
        Ok(value.to_string())
    }
}

/// Boolean attributes whose filter literals must also be upper-cased.
#[derive(Debug, Clone, Copy, Default)]
pub struct BooleanTransformation;

impl Transformation for BooleanTransformation {
    fn to_scim_value(
        &self,
        descriptor: &AttributeDescriptor,
        raw: &[u8],
    ) -> ScimResult<SimpleValue> {
        let text = String::from_utf8_lossy(raw);
        Ok(SimpleValue::parse(Some(AttributeType::Boolean), &descriptor.name, &text)?)
    }

    fn to_directory_value(
        &self,
        descriptor: &AttributeDescriptor,
        value: &SimpleValue,
    ) -> ScimResult<Vec<u8>> {
        let flag = value
            .boolean_value()
            .ok_or_else(|| ValidationError::InvalidBooleanValue {
                attribute: descriptor.name.clone(),
                value: value.string_value(),
            })?;
        Ok(boolean_literal(flag).as_bytes().to_vec())
    }

    fn to_directory_filter_value(&self, value: &str) -> ScimResult<String> {
        match value.trim().to_ascii_lowercase().as_str() {
            "true" => Ok(boolean_literal(true).to_string()),
            "false" => Ok(boolean_literal(false).to_string()),
            _ => Err(ScimError::invalid_request(format!(
                "'{}' is not a boolean",
                value
            ))),
        }
    }
}

/// SCIM date-times stored as LDAP generalized time.
#[derive(Debug, Clone, Copy, Default)]
pub struct GeneralizedTimeTransformation;

impl Transformation for GeneralizedTimeTransformation {
    fn to_scim_value(
        &self,
        descriptor: &AttributeDescriptor,
        raw: &[u8],
    ) -> ScimResult<SimpleValue> {
        let text = String::from_utf8_lossy(raw);
        parse_generalized_time(&text)
            .map(SimpleValue::DateTime)
            .ok_or_else(|| {
                ValidationError::InvalidDateTimeFormat {
                    attribute: descriptor.name.clone(),
                    value: text.into_owned(),
                }
                .into()
            })
    }

    fn to_directory_value(
        &self,
        descriptor: &AttributeDescriptor,
        value: &SimpleValue,
    ) -> ScimResult<Vec<u8>> {
        let at = value
            .datetime_value()
            .ok_or_else(|| ValidationError::InvalidDateTimeFormat {
                attribute: descriptor.name.clone(),
                value: value.string_value(),
            })?;
        Ok(format_generalized_time(&at).into_bytes())
    }

    fn to_directory_filter_value(&self, value: &str) -> ScimResult<String> {
        let at = DateTime::parse_from_rfc3339(value.trim())
            .map_err(|_| ScimError::invalid_request(format!("'{}' is not a dateTime", value)))?;
        Ok(format_generalized_time(&at.with_timezone(&Utc)))
    }
}

/// Multi-line SCIM strings stored in the `$`-separated postal address
/// syntax.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostalAddressTransformation;

impl PostalAddressTransformation {
    fn encode(value: &str) -> String {
        let mut encoded = String::with_capacity(value.len());
        for c in value.chars() {
            match c {
                '\\' => encoded.push_str("\\5C"),
                '$' => encoded.push_str("\\24"),
                '\n' => encoded.push('$'),
                '\r' => {}
                _ => encoded.push(c),
            }
        }
        encoded
    }

    fn decode(value: &str) -> String {
        let mut decoded = String::with_capacity(value.len());
        let mut chars = value.chars().peekable();
        while let Some(c) = chars.next() {
            match c {
                '$' => decoded.push('\n'),
                '\\' => {
                    let escape: String = chars.clone().take(2).collect();
                    match escape.to_ascii_uppercase().as_str() {
                        "24" => {
                            decoded.push('$');
                            chars.nth(1);
                        }
                        "5C" => {
                            decoded.push('\\');
                            chars.nth(1);
                        }
                        _ => decoded.push('\\'),
                    }
                }
                _ => decoded.push(c),
            }
        }
        decoded
    }
}

impl Transformation for PostalAddressTransformation {
    fn to_scim_value(
        &self,
        _descriptor: &AttributeDescriptor,
        raw: &[u8],
    ) -> ScimResult<SimpleValue> {
        Ok(SimpleValue::String(Self::decode(&String::from_utf8_lossy(raw))))
    }

    fn to_directory_value(
        &self,
        _descriptor: &AttributeDescriptor,
        value: &SimpleValue,
    ) -> ScimResult<Vec<u8>> {
        Ok(Self::encode(&value.string_value()).into_bytes())
    }

    fn to_directory_filter_value(&self, value: &str) -> ScimResult<String> {
        Ok(Self::encode(value))
    }
}

/// Telephone numbers; filter literals have their whitespace collapsed.
#[derive(Debug, Clone, Copy, Default)]
pub struct TelephoneNumberTransformation;

impl Transformation for TelephoneNumberTransformation {
    fn to_scim_value(
        &self,
        _descriptor: &AttributeDescriptor,
        raw: &[u8],
    ) -> ScimResult<SimpleValue> {
        Ok(SimpleValue::String(String::from_utf8_lossy(raw).into_owned()))
    }

    fn to_directory_value(
        &self,
        _descriptor: &AttributeDescriptor,
        value: &SimpleValue,
    ) -> ScimResult<Vec<u8>> {
        Ok(value.string_value().into_bytes())
    }

    fn to_directory_filter_value(&self, value: &str) -> ScimResult<String> {
        Ok(value.split_whitespace().collect::<Vec<_>>().join(" "))
    }
}

fn boolean_literal(flag: bool) -> &'static str {
    if flag { "TRUE" } else { "FALSE" }
}

/// Parse LDAP generalized time: `YYYYMMDDHHMMSS[.fff](Z|±HHMM)`. Minutes and
/// seconds may be omitted.
pub fn parse_generalized_time(text: &str) -> Option<DateTime<Utc>> {
    let text = text.trim();
    let (local, offset_seconds) = if let Some(local) = text.strip_suffix(['Z', 'z']) {
        (local, 0)
    } else {
        let split = text.rfind(['+', '-'])?;
        let (local, offset) = text.split_at(split);
        let sign = if offset.starts_with('-') { -1 } else { 1 };
        let digits = &offset[1..];
        if digits.len() != 4 && digits.len() != 2 {
            return None;
        }
        let hours: i32 = digits.get(..2)?.parse().ok()?;
        let minutes: i32 = digits
            .get(2..)
            .filter(|m| !m.is_empty())
            .map_or(Some(0), |m| m.parse().ok())?;
        (local, sign * (hours * 3600 + minutes * 60))
    };

    let (whole, fraction) = match local.split_once(['.', ',']) {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (local, None),
    };
    if !whole.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let padded = match whole.len() {
        10 => format!("{}0000", whole),
        12 => format!("{}00", whole),
        14 => whole.to_string(),
        _ => return None,
    };
    let naive = NaiveDateTime::parse_from_str(&padded, "%Y%m%d%H%M%S").ok()?;
    let mut at = Utc.from_utc_datetime(&naive) - chrono::Duration::seconds(offset_seconds as i64);
    if let Some(fraction) = fraction {
        if fraction.is_empty() || !fraction.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        let millis: String = fraction.chars().chain(std::iter::repeat('0')).take(3).collect();
        at += chrono::Duration::milliseconds(millis.parse().ok()?);
    }
    Some(at)
}

/// Creates a transformation instance.
pub type TransformationFactory = fn() -> Arc<dyn Transformation>;

/// Transformations available to mapping configuration, by key.
///
/// ```rust
/// use scim_directory::mapper::TransformationRegistry;
///
/// let registry = TransformationRegistry::with_builtins();
/// assert!(registry.create(Some("generalizedTime")).is_ok());
/// assert!(registry.create(None).is_ok());
/// assert!(registry.create(Some("rot13")).is_err());
/// ```
#[derive(Debug, Clone)]
pub struct TransformationRegistry {
    /// Keyed by lower-cased key
    factories: HashMap<String, TransformationFactory>,
}

impl Default for TransformationRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl TransformationRegistry {
    pub const DEFAULT: &'static str = "default";
    pub const BOOLEAN: &'static str = "boolean";
    pub const GENERALIZED_TIME: &'static str = "generalizedTime";
    pub const POSTAL_ADDRESS: &'static str = "postalAddress";
    pub const TELEPHONE_NUMBER: &'static str = "telephoneNumber";

    /// An empty registry.
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// A registry holding the built-in transformations.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(Self::DEFAULT, || Arc::new(DefaultTransformation));
        registry.register(Self::BOOLEAN, || Arc::new(BooleanTransformation));
        registry.register(Self::GENERALIZED_TIME, || Arc::new(GeneralizedTimeTransformation));
        registry.register(Self::POSTAL_ADDRESS, || Arc::new(PostalAddressTransformation));
        registry.register(Self::TELEPHONE_NUMBER, || Arc::new(TelephoneNumberTransformation));
        registry
    }

    /// Register a factory, replacing any previous one under the same key.
    pub fn register(&mut self, key: &str, factory: TransformationFactory) {
        self.factories.insert(key.to_ascii_lowercase(), factory);
    }

    pub fn contains(&self, key: &str) -> bool {
        self.factories.contains_key(&key.to_ascii_lowercase())
    }

    /// Create the transformation for `key`; no key means the default.
    pub fn create(&self, key: Option<&str>) -> BuildResult<Arc<dyn Transformation>> {
        let key = key.unwrap_or(Self::DEFAULT);
        self.factories
            .get(&key.to_ascii_lowercase())
            .map(|factory| factory())
            .ok_or_else(|| BuildError::UnknownTransformation {
                key: key.to_string(),
            })
    }

    /// Registered keys, sorted.
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }
}
