//! Directory entries, attributes and modifications.

use super::errors::DirectoryError;

use std::collections::BTreeMap;
use std::fmt;

/// A directory attribute: a type name and its raw values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryAttribute {
    name: String,
    values: Vec<Vec<u8>>,
}

impl DirectoryAttribute {
    pub fn new(name: impl Into<String>, values: Vec<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    /// Attribute with UTF-8 string values.
    pub fn from_strings<I, S>(name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::new(
            name,
            values
                .into_iter()
                .map(|v| v.as_ref().as_bytes().to_vec())
                .collect(),
        )
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn values(&self) -> &[Vec<u8>] {
        &self.values
    }

    /// Values decoded as UTF-8, replacing invalid sequences.
    pub fn string_values(&self) -> Vec<String> {
        self.values
            .iter()
            .map(|v| String::from_utf8_lossy(v).into_owned())
            .collect()
    }

    pub fn first_string(&self) -> Option<String> {
        self.values
            .first()
            .map(|v| String::from_utf8_lossy(v).into_owned())
    }

    pub fn has_value(&self, value: &[u8]) -> bool {
        self.values.iter().any(|v| v == value)
    }

    /// Whether both attributes hold the same set of values.
    pub fn same_values(&self, other: &DirectoryAttribute) -> bool {
        self.values.len() == other.values.len()
            && self.values.iter().all(|v| other.has_value(v))
            && other.values.iter().all(|v| self.has_value(v))
    }

    /// Add a value unless already present.
    pub fn push_value(&mut self, value: Vec<u8>) {
        if !self.has_value(&value) {
            self.values.push(value);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// A directory entry: a DN and attributes keyed case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    dn: String,
    attributes: BTreeMap<String, DirectoryAttribute>,
}

impl Entry {
    pub fn new(dn: impl Into<String>) -> Self {
        Self {
            dn: dn.into(),
            attributes: BTreeMap::new(),
        }
    }

    pub fn dn(&self) -> &str {
        &self.dn
    }

    pub fn attributes(&self) -> impl Iterator<Item = &DirectoryAttribute> {
        self.attributes.values()
    }

    pub fn attribute(&self, name: &str) -> Option<&DirectoryAttribute> {
        self.attributes.get(&name.to_ascii_lowercase())
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attribute(name).is_some()
    }

    /// First value of an attribute as a string.
    pub fn attribute_value(&self, name: &str) -> Option<String> {
        self.attribute(name).and_then(DirectoryAttribute::first_string)
    }

    /// All values of an attribute as strings; empty when absent.
    pub fn attribute_values(&self, name: &str) -> Vec<String> {
        self.attribute(name)
            .map(DirectoryAttribute::string_values)
            .unwrap_or_default()
    }

    /// Merge values into an attribute, creating it if needed.
    pub fn add_attribute(&mut self, attribute: DirectoryAttribute) {
        let key = attribute.name.to_ascii_lowercase();
        match self.attributes.get_mut(&key) {
            Some(existing) => {
                for value in attribute.values {
                    existing.push_value(value);
                }
            }
            None => {
                if !attribute.values.is_empty() {
                    self.attributes.insert(key, attribute);
                }
            }
        }
    }

    /// Replace all values of an attribute. Empty values remove it.
    pub fn set_attribute(&mut self, attribute: DirectoryAttribute) {
        let key = attribute.name.to_ascii_lowercase();
        if attribute.values.is_empty() {
            self.attributes.remove(&key);
        } else {
            self.attributes.insert(key, attribute);
        }
    }

    pub fn remove_attribute(&mut self, name: &str) -> Option<DirectoryAttribute> {
        self.attributes.remove(&name.to_ascii_lowercase())
    }

    pub fn object_classes(&self) -> Vec<String> {
        self.attribute_values("objectClass")
    }

    pub fn has_object_class(&self, object_class: &str) -> bool {
        self.object_classes()
            .iter()
            .any(|oc| oc.eq_ignore_ascii_case(object_class))
    }

    /// Copy of the entry with only the named attributes. An empty list keeps
    /// everything.
    pub fn select(&self, attribute_types: &[String]) -> Entry {
        if attribute_types.is_empty() || attribute_types.iter().any(|t| t == "*") {
            return self.clone();
        }
        let mut selected = Entry::new(self.dn.clone());
        for name in attribute_types {
            if let Some(attribute) = self.attribute(name) {
                selected.set_attribute(attribute.clone());
            }
        }
        selected
    }

    /// Apply modifications in order.
    pub fn apply_modifications(
        &mut self,
        modifications: &[Modification],
    ) -> Result<(), DirectoryError> {
        for modification in modifications {
            let attribute = &modification.attribute;
            match modification.mod_type {
                ModificationType::Add => self.add_attribute(attribute.clone()),
                ModificationType::Replace => self.set_attribute(attribute.clone()),
                ModificationType::Delete => {
                    if attribute.is_empty() {
                        self.remove_attribute(attribute.name());
                    } else {
                        let key = attribute.name().to_ascii_lowercase();
                        let existing = self.attributes.get_mut(&key).ok_or_else(|| {
                            DirectoryError::Other {
                                result_code: super::errors::result_code::OTHER,
                                message: format!("no such attribute '{}'", attribute.name()),
                            }
                        })?;
                        existing.values.retain(|v| !attribute.has_value(v));
                        if existing.values.is_empty() {
                            self.attributes.remove(&key);
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

/// Kind of change applied to one attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModificationType {
    Add,
    Replace,
    /// Removes the listed values, or the whole attribute when none are listed
    Delete,
}

/// A change to one attribute of an entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Modification {
    pub mod_type: ModificationType,
    pub attribute: DirectoryAttribute,
}

impl Modification {
    pub fn add(attribute: DirectoryAttribute) -> Self {
        Self {
            mod_type: ModificationType::Add,
            attribute,
        }
    }

    pub fn replace(attribute: DirectoryAttribute) -> Self {
        Self {
            mod_type: ModificationType::Replace,
            attribute,
        }
    }

    /// Delete every value of the attribute.
    pub fn delete_all(name: impl Into<String>) -> Self {
        Self {
            mod_type: ModificationType::Delete,
            attribute: DirectoryAttribute::new(name, Vec::new()),
        }
    }
}

impl fmt::Display for Modification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = match self.mod_type {
            ModificationType::Add => "add",
            ModificationType::Replace => "replace",
            ModificationType::Delete => "delete",
        };
        write!(f, "{}: {} ({} values)", op, self.attribute.name(), self.attribute.values().len())
    }
}

/// Normalize a DN for comparison: lower-case, no spaces around separators.
pub fn normalize_dn(dn: &str) -> String {
    dn.split(',')
        .map(|rdn| {
            rdn.split('=')
                .map(|part| part.trim())
                .collect::<Vec<_>>()
                .join("=")
        })
        .collect::<Vec<_>>()
        .join(",")
        .to_ascii_lowercase()
}

/// Whether `dn` is `base` or lies beneath it.
pub fn is_descendant_or_self(dn: &str, base: &str) -> bool {
    let dn = normalize_dn(dn);
    let base = normalize_dn(base);
    base.is_empty() || dn == base || dn.ends_with(&format!(",{}", base))
}

/// Escape a value for use in a DN component.
///
/// Escapes the characters special in RFC 4514, plus leading/trailing
/// spaces and a leading `#`.
pub fn escape_dn_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    let last = value.chars().count().saturating_sub(1);
    for (i, c) in value.chars().enumerate() {
        match c {
            ',' | '+' | '"' | '\\' | '<' | '>' | ';' | '=' => {
                escaped.push('\\');
                escaped.push(c);
            }
            '#' if i == 0 => escaped.push_str("\\23"),
            ' ' if i == 0 || i == last => escaped.push_str("\\20"),
            '\0' => escaped.push_str("\\00"),
            _ => escaped.push(c),
        }
    }
    escaped
}
