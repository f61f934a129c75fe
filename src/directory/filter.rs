//! Directory search filters.
//!
//! [`DirectoryFilter`] renders to the RFC 4515 string representation with
//! value escaping, parses that representation back (used for `memberURL`
//! values of dynamic groups), and evaluates against an [`Entry`] with
//! case-insensitive matching.

use super::entry::Entry;
use super::errors::DirectoryError;

use std::cmp::Ordering;
use std::fmt;

/// A directory search filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectoryFilter {
    And(Vec<DirectoryFilter>),
    Or(Vec<DirectoryFilter>),
    Not(Box<DirectoryFilter>),
    Equality {
        attribute: String,
        value: String,
    },
    Substring {
        attribute: String,
        initial: Option<String>,
        any: Vec<String>,
        last: Option<String>,
    },
    GreaterOrEqual {
        attribute: String,
        value: String,
    },
    LessOrEqual {
        attribute: String,
        value: String,
    },
    Present {
        attribute: String,
    },
}

impl DirectoryFilter {
    pub fn equality(attribute: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Equality {
            attribute: attribute.into(),
            value: value.into(),
        }
    }

    pub fn present(attribute: impl Into<String>) -> Self {
        Self::Present {
            attribute: attribute.into(),
        }
    }

    pub fn contains(attribute: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Substring {
            attribute: attribute.into(),
            initial: None,
            any: vec![value.into()],
            last: None,
        }
    }

    pub fn starts_with(attribute: impl Into<String>, value: impl Into<String>) -> Self {
        Self::Substring {
            attribute: attribute.into(),
            initial: Some(value.into()),
            any: Vec::new(),
            last: None,
        }
    }

    /// Strictly greater: `(&(a>=v)(!(a=v)))`.
    pub fn greater_than(attribute: impl Into<String>, value: impl Into<String>) -> Self {
        let attribute = attribute.into();
        let value = value.into();
        Self::And(vec![
            Self::GreaterOrEqual {
                attribute: attribute.clone(),
                value: value.clone(),
            },
            Self::Not(Box::new(Self::equality(attribute, value))),
        ])
    }

    /// Strictly less: `(&(a<=v)(!(a=v)))`.
    pub fn less_than(attribute: impl Into<String>, value: impl Into<String>) -> Self {
        let attribute = attribute.into();
        let value = value.into();
        Self::And(vec![
            Self::LessOrEqual {
                attribute: attribute.clone(),
                value: value.clone(),
            },
            Self::Not(Box::new(Self::equality(attribute, value))),
        ])
    }

    /// Conjunction, flattening a single operand.
    pub fn and(mut filters: Vec<DirectoryFilter>) -> Self {
        if filters.len() == 1 {
            filters.remove(0)
        } else {
            Self::And(filters)
        }
    }

    /// Disjunction, flattening a single operand.
    pub fn or(mut filters: Vec<DirectoryFilter>) -> Self {
        if filters.len() == 1 {
            filters.remove(0)
        } else {
            Self::Or(filters)
        }
    }

    /// Parse the RFC 4515 string representation.
    pub fn parse(input: &str) -> Result<Self, DirectoryError> {
        let mut parser = FilterParser {
            input: input.trim().as_bytes(),
            source: input,
            pos: 0,
        };
        let filter = parser.parse_filter()?;
        if parser.pos != parser.input.len() {
            return Err(parser.error("trailing characters"));
        }
        Ok(filter)
    }

    /// Evaluate the filter against an entry.
    pub fn matches(&self, entry: &Entry) -> bool {
        match self {
            Self::And(filters) => filters.iter().all(|f| f.matches(entry)),
            Self::Or(filters) => filters.iter().any(|f| f.matches(entry)),
            Self::Not(filter) => !filter.matches(entry),
            Self::Present { attribute } => {
                attribute.eq_ignore_ascii_case("objectClass") || entry.has_attribute(attribute)
            }
            Self::Equality { attribute, value } => entry
                .attribute_values(attribute)
                .iter()
                .any(|v| v.eq_ignore_ascii_case(value)),
            Self::GreaterOrEqual { attribute, value } => entry
                .attribute_values(attribute)
                .iter()
                .any(|v| compare_values(v, value) != Ordering::Less),
            Self::LessOrEqual { attribute, value } => entry
                .attribute_values(attribute)
                .iter()
                .any(|v| compare_values(v, value) != Ordering::Greater),
            Self::Substring {
                attribute,
                initial,
                any,
                last,
            } => entry.attribute_values(attribute).iter().any(|v| {
                substring_matches(v, initial.as_deref(), any, last.as_deref())
            }),
        }
    }
}

impl fmt::Display for DirectoryFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::And(filters) => {
                f.write_str("(&")?;
                for filter in filters {
                    write!(f, "{}", filter)?;
                }
                f.write_str(")")
            }
            Self::Or(filters) => {
                f.write_str("(|")?;
                for filter in filters {
                    write!(f, "{}", filter)?;
                }
                f.write_str(")")
            }
            Self::Not(filter) => write!(f, "(!{})", filter),
            Self::Equality { attribute, value } => {
                write!(f, "({}={})", attribute, escape_filter_value(value))
            }
            Self::GreaterOrEqual { attribute, value } => {
                write!(f, "({}>={})", attribute, escape_filter_value(value))
            }
            Self::LessOrEqual { attribute, value } => {
                write!(f, "({}<={})", attribute, escape_filter_value(value))
            }
            Self::Present { attribute } => write!(f, "({}=*)", attribute),
            Self::Substring {
                attribute,
                initial,
                any,
                last,
            } => {
                write!(f, "({}=", attribute)?;
                if let Some(initial) = initial {
                    f.write_str(&escape_filter_value(initial))?;
                }
                f.write_str("*")?;
                for part in any {
                    write!(f, "{}*", escape_filter_value(part))?;
                }
                if let Some(last) = last {
                    f.write_str(&escape_filter_value(last))?;
                }
                f.write_str(")")
            }
        }
    }
}

/// Escape special characters in filter values (RFC 4515).
pub fn escape_filter_value(value: &str) -> String {
    value
        .replace('\\', "\\5c")
        .replace('*', "\\2a")
        .replace('(', "\\28")
        .replace(')', "\\29")
        .replace('\0', "\\00")
}

fn compare_values(left: &str, right: &str) -> Ordering {
    match (left.trim().parse::<i64>(), right.trim().parse::<i64>()) {
        (Ok(l), Ok(r)) => l.cmp(&r),
        _ => left.to_lowercase().cmp(&right.to_lowercase()),
    }
}

fn substring_matches(
    value: &str,
    initial: Option<&str>,
    any: &[String],
    last: Option<&str>,
) -> bool {
    let value = value.to_lowercase();
    let mut rest = value.as_str();
    if let Some(initial) = initial {
        let initial = initial.to_lowercase();
        match rest.strip_prefix(initial.as_str()) {
            Some(r) => rest = r,
            None => return false,
        }
    }
    for part in any {
        let part = part.to_lowercase();
        match rest.find(part.as_str()) {
            Some(i) => rest = &rest[i + part.len()..],
            None => return false,
        }
    }
    match last {
        Some(last) => rest.ends_with(last.to_lowercase().as_str()),
        None => true,
    }
}

struct FilterParser<'a> {
    input: &'a [u8],
    source: &'a str,
    pos: usize,
}

impl FilterParser<'_> {
    fn error(&self, message: &str) -> DirectoryError {
        DirectoryError::InvalidFilter {
            filter: self.source.to_string(),
            message: format!("{} at position {}", message, self.pos),
        }
    }

    fn peek(&self) -> Option<u8> {
        self.input.get(self.pos).copied()
    }

    fn expect(&mut self, c: u8) -> Result<(), DirectoryError> {
        if self.peek() == Some(c) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.error(&format!("expected '{}'", c as char)))
        }
    }

    fn parse_filter(&mut self) -> Result<DirectoryFilter, DirectoryError> {
        self.expect(b'(')?;
        let filter = match self.peek() {
            Some(b'&') => {
                self.pos += 1;
                DirectoryFilter::And(self.parse_filter_list()?)
            }
            Some(b'|') => {
                self.pos += 1;
                DirectoryFilter::Or(self.parse_filter_list()?)
            }
            Some(b'!') => {
                self.pos += 1;
                DirectoryFilter::Not(Box::new(self.parse_filter()?))
            }
            Some(_) => self.parse_item()?,
            None => return Err(self.error("unexpected end of filter")),
        };
        self.expect(b')')?;
        Ok(filter)
    }

    fn parse_filter_list(&mut self) -> Result<Vec<DirectoryFilter>, DirectoryError> {
        let mut filters = Vec::new();
        while self.peek() == Some(b'(') {
            filters.push(self.parse_filter()?);
        }
        if filters.is_empty() {
            return Err(self.error("empty filter list"));
        }
        Ok(filters)
    }

    fn parse_item(&mut self) -> Result<DirectoryFilter, DirectoryError> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || c == b'-' || c == b'.' || c == b';' {
                self.pos += 1;
            } else {
                break;
            }
        }
        if self.pos == start {
            return Err(self.error("expected attribute description"));
        }
        let attribute = String::from_utf8_lossy(&self.input[start..self.pos]).into_owned();

        let op = match (self.peek(), self.input.get(self.pos + 1).copied()) {
            (Some(b'>'), Some(b'=')) => {
                self.pos += 2;
                ">="
            }
            (Some(b'<'), Some(b'=')) => {
                self.pos += 2;
                "<="
            }
            (Some(b'~'), Some(b'=')) => {
                self.pos += 2;
                "~="
            }
            (Some(b'='), _) => {
                self.pos += 1;
                "="
            }
            _ => return Err(self.error("expected filter operator")),
        };

        let raw_start = self.pos;
        while let Some(c) = self.peek() {
            if c == b')' {
                break;
            }
            self.pos += 1;
        }
        let raw = &self.input[raw_start..self.pos];

        match op {
            ">=" => Ok(DirectoryFilter::GreaterOrEqual {
                attribute,
                value: self.unescape(raw)?,
            }),
            "<=" => Ok(DirectoryFilter::LessOrEqual {
                attribute,
                value: self.unescape(raw)?,
            }),
            // approximate match is evaluated as equality
            "~=" => Ok(DirectoryFilter::Equality {
                attribute,
                value: self.unescape(raw)?,
            }),
            _ if raw == b"*" => Ok(DirectoryFilter::Present { attribute }),
            _ if raw.contains(&b'*') => {
                let parts: Vec<&[u8]> = raw.split(|c| *c == b'*').collect();
                let initial = match parts[0] {
                    [] => None,
                    part => Some(self.unescape(part)?),
                };
                let last = match parts[parts.len() - 1] {
                    [] => None,
                    part => Some(self.unescape(part)?),
                };
                let any = parts[1..parts.len() - 1]
                    .iter()
                    .filter(|p| !p.is_empty())
                    .map(|p| self.unescape(p))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(DirectoryFilter::Substring {
                    attribute,
                    initial,
                    any,
                    last,
                })
            }
            _ => Ok(DirectoryFilter::Equality {
                attribute,
                value: self.unescape(raw)?,
            }),
        }
    }

    fn unescape(&self, raw: &[u8]) -> Result<String, DirectoryError> {
        let mut bytes = Vec::with_capacity(raw.len());
        let mut i = 0;
        while i < raw.len() {
            if raw[i] == b'\\' {
                let hex = raw
                    .get(i + 1..i + 3)
                    .and_then(|h| std::str::from_utf8(h).ok())
                    .and_then(|h| u8::from_str_radix(h, 16).ok())
                    .ok_or_else(|| self.error("invalid escape sequence"))?;
                bytes.push(hex);
                i += 3;
            } else {
                bytes.push(raw[i]);
                i += 1;
            }
        }
        String::from_utf8(bytes).map_err(|_| self.error("value is not UTF-8"))
    }
}
