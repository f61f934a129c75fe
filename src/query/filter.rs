//! SCIM filter expressions.
//!
//! Grammar accepted by [`ScimFilter::parse`]:
//!
//! ```text
//! filter     := or-expr
//! or-expr    := and-expr ("or" and-expr)*
//! and-expr   := primary ("and" primary)*
//! primary    := "(" filter ")" | comparison
//! comparison := path "pr" | path op value
//! op         := "eq" | "co" | "sw" | "gt" | "lt"
//! value      := quoted-string | "true" | "false" | number
//! ```
//!
//! Keywords, operators, attribute names and schema URNs are matched
//! case-insensitively. Comparison values keep their case; whether they are
//! compared exactly is decided by the directory attribute they end up on.

use crate::error::{ScimError, ScimResult};

use std::fmt;

/// A reference to an attribute, optionally qualified by schema URN and
/// narrowed to a sub-attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributePath {
    /// Schema URN; `None` means the resource's core schema
    pub schema: Option<String>,
    pub attribute: String,
    pub sub_attribute: Option<String>,
}

impl AttributePath {
    pub fn new(attribute: impl Into<String>) -> Self {
        Self {
            schema: None,
            attribute: attribute.into(),
            sub_attribute: None,
        }
    }

    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    pub fn with_sub_attribute(mut self, sub_attribute: impl Into<String>) -> Self {
        self.sub_attribute = Some(sub_attribute.into());
        self
    }

    /// Parse `[urn:...:]attribute[.subAttribute]`.
    ///
    /// The schema URN ends at the last `:`, so URNs containing dots (such as
    /// `urn:scim:schemas:core:1.0`) are kept whole.
    ///
    /// ```rust
    /// use scim_directory::query::AttributePath;
    ///
    /// let path = AttributePath::parse("urn:scim:schemas:core:1.0:name.givenName").unwrap();
    /// assert_eq!(path.schema.as_deref(), Some("urn:scim:schemas:core:1.0"));
    /// assert_eq!(path.attribute, "name");
    /// assert_eq!(path.sub_attribute.as_deref(), Some("givenName"));
    /// ```
    pub fn parse(text: &str) -> ScimResult<Self> {
        let text = text.trim();
        let (schema, local) = match text.rfind(':') {
            Some(pos) => (Some(&text[..pos]), &text[pos + 1..]),
            None => (None, text),
        };

        let (attribute, sub_attribute) = match local.split_once('.') {
            Some((attribute, sub)) => (attribute, Some(sub)),
            None => (local, None),
        };

        let valid = |s: &str| {
            !s.is_empty()
                && s.chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '$')
        };
        if !valid(attribute) || sub_attribute.is_some_and(|s| !valid(s)) {
            return Err(ScimError::invalid_request(format!(
                "Invalid attribute path '{}'",
                text
            )));
        }
        if schema.is_some_and(str::is_empty) {
            return Err(ScimError::invalid_request(format!(
                "Invalid attribute path '{}'",
                text
            )));
        }

        Ok(Self {
            schema: schema.map(str::to_string),
            attribute: attribute.to_string(),
            sub_attribute: sub_attribute.map(str::to_string),
        })
    }

    /// The schema URN, falling back to `core_schema`.
    pub fn schema_or<'a>(&'a self, core_schema: &'a str) -> &'a str {
        self.schema.as_deref().unwrap_or(core_schema)
    }

    /// Whether this path names `attribute` (and optionally `sub_attribute`)
    /// in `schema`, treating an unqualified path as core.
    pub fn matches(
        &self,
        core_schema: &str,
        schema: &str,
        attribute: &str,
        sub_attribute: Option<&str>,
    ) -> bool {
        self.schema_or(core_schema).eq_ignore_ascii_case(schema)
            && self.attribute.eq_ignore_ascii_case(attribute)
            && match (&self.sub_attribute, sub_attribute) {
                (Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
                (None, None) => true,
                _ => false,
            }
    }
}

impl fmt::Display for AttributePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(schema) = &self.schema {
            write!(f, "{}:", schema)?;
        }
        f.write_str(&self.attribute)?;
        if let Some(sub) = &self.sub_attribute {
            write!(f, ".{}", sub)?;
        }
        Ok(())
    }
}

/// Comparison operators of the filter language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterOperator {
    Equality,
    Contains,
    StartsWith,
    Present,
    GreaterThan,
    LessThan,
}

impl FilterOperator {
    /// Look up an operator keyword, ignoring case.
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword.to_ascii_lowercase().as_str() {
            "eq" => Some(Self::Equality),
            "co" => Some(Self::Contains),
            "sw" => Some(Self::StartsWith),
            "pr" => Some(Self::Present),
            "gt" => Some(Self::GreaterThan),
            "lt" => Some(Self::LessThan),
            _ => None,
        }
    }

    pub fn keyword(&self) -> &'static str {
        match self {
            Self::Equality => "eq",
            Self::Contains => "co",
            Self::StartsWith => "sw",
            Self::Present => "pr",
            Self::GreaterThan => "gt",
            Self::LessThan => "lt",
        }
    }
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// A parsed SCIM filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScimFilter {
    And(Box<ScimFilter>, Box<ScimFilter>),
    Or(Box<ScimFilter>, Box<ScimFilter>),
    Comparison {
        path: AttributePath,
        operator: FilterOperator,
        /// `None` only for `pr`
        value: Option<String>,
    },
}

impl ScimFilter {
    /// Parse a filter string.
    ///
    /// ```rust
    /// use scim_directory::query::{FilterOperator, ScimFilter};
    ///
    /// let filter = ScimFilter::parse(r#"userName eq "bjensen" and emails pr"#).unwrap();
    /// assert!(matches!(filter, ScimFilter::And(_, _)));
    /// ```
    pub fn parse(input: &str) -> ScimResult<Self> {
        FilterParser::new(input).parse()
    }

    pub fn comparison(
        path: AttributePath,
        operator: FilterOperator,
        value: impl Into<String>,
    ) -> Self {
        Self::Comparison {
            path,
            operator,
            value: Some(value.into()),
        }
    }

    pub fn present(path: AttributePath) -> Self {
        Self::Comparison {
            path,
            operator: FilterOperator::Present,
            value: None,
        }
    }

    pub fn and(left: ScimFilter, right: ScimFilter) -> Self {
        Self::And(Box::new(left), Box::new(right))
    }

    pub fn or(left: ScimFilter, right: ScimFilter) -> Self {
        Self::Or(Box::new(left), Box::new(right))
    }
}

impl fmt::Display for ScimFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::And(left, right) => write!(f, "({} and {})", left, right),
            Self::Or(left, right) => write!(f, "({} or {})", left, right),
            Self::Comparison {
                path,
                operator,
                value: None,
            } => write!(f, "{} {}", path, operator),
            Self::Comparison {
                path,
                operator,
                value: Some(value),
            } => {
                f.write_str(&format!("{} {} \"", path, operator))?;
                for c in value.chars() {
                    match c {
                        '"' | '\\' => write!(f, "\\{}", c)?,
                        _ => write!(f, "{}", c)?,
                    }
                }
                f.write_str("\"")
            }
        }
    }
}

/// Recursive-descent parser over the filter string.
struct FilterParser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> FilterParser<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn parse(&mut self) -> ScimResult<ScimFilter> {
        self.skip_whitespace();
        if self.pos >= self.input.len() {
            return Err(self.error("empty filter"));
        }
        let filter = self.parse_or()?;
        self.skip_whitespace();
        if self.pos < self.input.len() {
            return Err(self.error(&format!(
                "unexpected characters at position {}: '{}'",
                self.pos,
                &self.input[self.pos..]
            )));
        }
        Ok(filter)
    }

    fn parse_or(&mut self) -> ScimResult<ScimFilter> {
        let mut left = self.parse_and()?;
        loop {
            self.skip_whitespace();
            if !self.try_consume_keyword("or") {
                break;
            }
            let right = self.parse_and()?;
            left = ScimFilter::or(left, right);
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> ScimResult<ScimFilter> {
        let mut left = self.parse_primary()?;
        loop {
            self.skip_whitespace();
            if !self.try_consume_keyword("and") {
                break;
            }
            let right = self.parse_primary()?;
            left = ScimFilter::and(left, right);
        }
        Ok(left)
    }

    fn parse_primary(&mut self) -> ScimResult<ScimFilter> {
        self.skip_whitespace();
        if self.try_consume_char('(') {
            let filter = self.parse_or()?;
            self.skip_whitespace();
            if !self.try_consume_char(')') {
                return Err(self.error("expected ')' to close grouped expression"));
            }
            return Ok(filter);
        }
        self.parse_comparison()
    }

    fn parse_comparison(&mut self) -> ScimResult<ScimFilter> {
        let path = AttributePath::parse(self.parse_token(is_path_char, "attribute path")?)?;
        self.skip_whitespace();

        let keyword = self.parse_token(|c| c.is_ascii_alphabetic(), "operator")?;
        let operator = FilterOperator::from_keyword(keyword)
            .ok_or_else(|| self.error(&format!("unknown operator '{}'", keyword)))?;

        if operator == FilterOperator::Present {
            return Ok(ScimFilter::present(path));
        }

        self.skip_whitespace();
        let value = self.parse_value()?;
        Ok(ScimFilter::comparison(path, operator, value))
    }

    fn parse_token(&mut self, accept: impl Fn(char) -> bool, what: &str) -> ScimResult<&'a str> {
        let start = self.pos;
        while let Some(c) = self.current_char() {
            if !accept(c) {
                break;
            }
            self.pos += c.len_utf8();
        }
        if self.pos == start {
            return Err(self.error(&format!("expected {} at position {}", what, start)));
        }
        Ok(&self.input[start..self.pos])
    }

    fn parse_value(&mut self) -> ScimResult<String> {
        if !self.try_consume_char('"') {
            let token = self.parse_token(
                |c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '+'),
                "value",
            )?;
            let lower = token.to_ascii_lowercase();
            if lower == "true" || lower == "false" {
                return Ok(lower);
            }
            if token.parse::<f64>().is_err() {
                return Err(self.error(&format!(
                    "unquoted value '{}' must be a boolean or number",
                    token
                )));
            }
            return Ok(token.to_string());
        }

        let mut value = String::new();
        loop {
            let Some(c) = self.current_char() else {
                return Err(self.error("unterminated string"));
            };
            self.pos += c.len_utf8();
            match c {
                '"' => return Ok(value),
                '\\' => value.push(self.parse_escape()?),
                _ => value.push(c),
            }
        }
    }

    fn parse_escape(&mut self) -> ScimResult<char> {
        let Some(c) = self.current_char() else {
            return Err(self.error("unterminated escape sequence"));
        };
        self.pos += c.len_utf8();
        let unescaped = match c {
            '"' | '\\' | '/' => c,
            'b' => '\u{0008}',
            'f' => '\u{000c}',
            'n' => '\n',
            'r' => '\r',
            't' => '\t',
            'u' => {
                let hex = self
                    .input
                    .get(self.pos..self.pos + 4)
                    .ok_or_else(|| self.error("truncated unicode escape"))?;
                let code = u32::from_str_radix(hex, 16)
                    .ok()
                    .and_then(char::from_u32)
                    .ok_or_else(|| self.error(&format!("invalid unicode escape '\\u{}'", hex)))?;
                self.pos += 4;
                code
            }
            other => return Err(self.error(&format!("invalid escape '\\{}'", other))),
        };
        Ok(unescaped)
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.current_char() {
            if !c.is_whitespace() {
                break;
            }
            self.pos += c.len_utf8();
        }
    }

    fn current_char(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn try_consume_char(&mut self, c: char) -> bool {
        if self.current_char() == Some(c) {
            self.pos += c.len_utf8();
            true
        } else {
            false
        }
    }

    /// Consume `keyword` when it appears as a whole word.
    fn try_consume_keyword(&mut self, keyword: &str) -> bool {
        let remaining = &self.input[self.pos..];
        let Some(candidate) = remaining.get(..keyword.len()) else {
            return false;
        };
        if !candidate.eq_ignore_ascii_case(keyword) {
            return false;
        }
        let boundary = remaining[keyword.len()..]
            .chars()
            .next()
            .is_none_or(|c| c.is_whitespace() || c == '(');
        if boundary {
            self.pos += keyword.len();
        }
        boundary
    }

    fn error(&self, message: &str) -> ScimError {
        ScimError::invalid_request(format!("Invalid filter '{}': {}", self.input, message))
    }
}

fn is_path_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, ':' | '.' | '_' | '-' | '$')
}
