//! Simple attribute values.
//!
//! A [`SimpleValue`] is one of string, boolean, integer, binary or
//! date-time, and can always be rendered as a canonical string: date-times
//! as ISO-8601 with millisecond precision in UTC, binary as base64.

use crate::error::{ValidationError, ValidationResult};
use crate::schema::AttributeType;

use base64::{Engine as _, engine::general_purpose::STANDARD};
use chrono::{DateTime, SecondsFormat, Utc};
use std::fmt;

/// A typed scalar attribute value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SimpleValue {
    String(String),
    Boolean(bool),
    Integer(i64),
    Binary(Vec<u8>),
    DateTime(DateTime<Utc>),
}

impl SimpleValue {
    /// Parse a canonical string according to the declared data type.
    ///
    /// `attribute` is only used in error messages.
    ///
    /// ```rust
    /// use scim_directory::resource::SimpleValue;
    /// use scim_directory::schema::AttributeType;
    ///
    /// let value = SimpleValue::parse(Some(AttributeType::Boolean), "active", "TRUE").unwrap();
    /// assert_eq!(value, SimpleValue::Boolean(true));
    /// ```
    pub fn parse(
        data_type: Option<AttributeType>,
        attribute: &str,
        text: &str,
    ) -> ValidationResult<Self> {
        match data_type.unwrap_or(AttributeType::String) {
            AttributeType::Boolean => parse_boolean(text)
                .map(Self::Boolean)
                .ok_or_else(|| ValidationError::InvalidBooleanValue {
                    attribute: attribute.to_string(),
                    value: text.to_string(),
                }),
            AttributeType::Integer => text.trim().parse::<i64>().map(Self::Integer).map_err(|_| {
                ValidationError::InvalidIntegerValue {
                    attribute: attribute.to_string(),
                    value: text.to_string(),
                }
            }),
            AttributeType::DateTime => DateTime::parse_from_rfc3339(text.trim())
                .map(|dt| Self::DateTime(dt.with_timezone(&Utc)))
                .map_err(|_| ValidationError::InvalidDateTimeFormat {
                    attribute: attribute.to_string(),
                    value: text.to_string(),
                }),
            AttributeType::Binary => STANDARD.decode(text.trim()).map(Self::Binary).map_err(|e| {
                ValidationError::InvalidBinaryData {
                    attribute: attribute.to_string(),
                    details: e.to_string(),
                }
            }),
            AttributeType::String | AttributeType::Complex => Ok(Self::String(text.to_string())),
        }
    }

    /// The canonical string form of the value.
    pub fn string_value(&self) -> String {
        match self {
            Self::String(s) => s.clone(),
            Self::Boolean(b) => b.to_string(),
            Self::Integer(i) => i.to_string(),
            Self::Binary(bytes) => STANDARD.encode(bytes),
            Self::DateTime(dt) => format_datetime(dt),
        }
    }

    /// Borrow the string when the value is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Boolean value, parsing string values of `true`/`false`.
    pub fn boolean_value(&self) -> Option<bool> {
        match self {
            Self::Boolean(b) => Some(*b),
            Self::String(s) => parse_boolean(s),
            _ => None,
        }
    }

    /// Integer value, parsing string values.
    pub fn integer_value(&self) -> Option<i64> {
        match self {
            Self::Integer(i) => Some(*i),
            Self::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// Date-time value, parsing RFC 3339 string values.
    pub fn datetime_value(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::DateTime(dt) => Some(*dt),
            Self::String(s) => DateTime::parse_from_rfc3339(s)
                .ok()
                .map(|dt| dt.with_timezone(&Utc)),
            _ => None,
        }
    }

    /// Binary value, decoding base64 string values.
    pub fn binary_value(&self) -> Option<Vec<u8>> {
        match self {
            Self::Binary(bytes) => Some(bytes.clone()),
            Self::String(s) => STANDARD.decode(s).ok(),
            _ => None,
        }
    }

    /// The data type this value naturally carries.
    pub fn data_type(&self) -> AttributeType {
        match self {
            Self::String(_) => AttributeType::String,
            Self::Boolean(_) => AttributeType::Boolean,
            Self::Integer(_) => AttributeType::Integer,
            Self::Binary(_) => AttributeType::Binary,
            Self::DateTime(_) => AttributeType::DateTime,
        }
    }
}

impl fmt::Display for SimpleValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.string_value())
    }
}

impl From<&str> for SimpleValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for SimpleValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<bool> for SimpleValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<i64> for SimpleValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<DateTime<Utc>> for SimpleValue {
    fn from(value: DateTime<Utc>) -> Self {
        Self::DateTime(value)
    }
}

/// Format a date-time as ISO-8601 UTC with millisecond precision.
pub fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn parse_boolean(text: &str) -> Option<bool> {
    let text = text.trim();
    if text.eq_ignore_ascii_case("true") {
        Some(true)
    } else if text.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_datetime_canonical_form() {
        let dt = Utc.with_ymd_and_hms(2011, 8, 1, 18, 29, 49).unwrap()
            + chrono::Duration::milliseconds(793);
        let value = SimpleValue::DateTime(dt);
        assert_eq!(value.string_value(), "2011-08-01T18:29:49.793Z");

        let parsed = SimpleValue::parse(
            Some(AttributeType::DateTime),
            "created",
            "2011-08-01T20:29:49.793+02:00",
        )
        .unwrap();
        assert_eq!(parsed, value);
    }

    #[test]
    fn test_binary_is_base64() {
        let value = SimpleValue::Binary(b"cert".to_vec());
        assert_eq!(value.string_value(), "Y2VydA==");
        assert_eq!(
            SimpleValue::parse(Some(AttributeType::Binary), "value", "Y2VydA==").unwrap(),
            value
        );
    }

    #[test]
    fn test_parse_failures_name_the_attribute() {
        let err = SimpleValue::parse(Some(AttributeType::Integer), "count", "ten").unwrap_err();
        assert!(err.to_string().contains("count"));

        assert!(SimpleValue::parse(Some(AttributeType::DateTime), "created", "yesterday").is_err());
        assert!(SimpleValue::parse(Some(AttributeType::Boolean), "active", "yes").is_err());
        assert!(SimpleValue::parse(Some(AttributeType::Binary), "value", "***").is_err());
    }

    #[test]
    fn test_untyped_parses_as_string() {
        assert_eq!(
            SimpleValue::parse(None, "nickName", "Babs").unwrap(),
            SimpleValue::String("Babs".to_string())
        );
    }

    #[test]
    fn test_lenient_accessors() {
        assert_eq!(SimpleValue::from("FALSE").boolean_value(), Some(false));
        assert_eq!(SimpleValue::from(" 42").integer_value(), Some(42));
        assert_eq!(SimpleValue::Integer(7).boolean_value(), None);
    }
}
