//! Declarative attribute mapping configuration.
//!
//! A [`MappingConfig`] says, for each resource type, where its entries live
//! in the directory, which object classes they carry and how each SCIM
//! attribute maps onto directory attributes. Documents are JSON:
//!
//! ```json
//! {
//!   "resources": [{
//!     "resource": "User",
//!     "searchBaseDn": "ou=People,dc=example,dc=com",
//!     "objectClasses": ["top", "person", "organizationalPerson", "inetOrgPerson"],
//!     "rdnAttribute": "uid",
//!     "attributes": [
//!       { "name": "userName", "kind": "simple", "ldapAttribute": "uid" },
//!       { "name": "title", "kind": "simple", "ldapAttribute": "title", "clearOnAbsence": true }
//!     ]
//!   }]
//! }
//! ```

use super::embedded;
use crate::error::{BuildError, BuildResult};

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Mappings for every resource type served from the directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingConfig {
    pub resources: Vec<ResourceMapping>,
}

impl MappingConfig {
    /// The built-in mapping of User and Group onto `inetOrgPerson` and
    /// `groupOfUniqueNames` entries below `dc=example,dc=com`.
    pub fn embedded_default() -> BuildResult<Self> {
        Self::from_json_str(embedded::default_mapping())
    }

    pub fn from_json_str(content: &str) -> BuildResult<Self> {
        let config: Self = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> BuildResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Mapping for a resource type, by case-insensitive name.
    pub fn resource(&self, name: &str) -> Option<&ResourceMapping> {
        self.resources
            .iter()
            .find(|r| r.resource.eq_ignore_ascii_case(name))
    }

    /// Replace the search and create base DNs of every resource whose base
    /// ends with `old_suffix`.
    pub fn with_base_dn_suffix(mut self, old_suffix: &str, new_suffix: &str) -> Self {
        let rebase = |dn: &str| match dn.strip_suffix(old_suffix) {
            Some(prefix) => format!("{}{}", prefix, new_suffix),
            None => dn.to_string(),
        };
        for resource in &mut self.resources {
            resource.search_base_dn = rebase(&resource.search_base_dn);
            resource.create_base_dn = resource.create_base_dn.as_deref().map(rebase);
            for attribute in &mut resource.attributes {
                if let MappingKind::Derived {
                    search_base_dn: Some(base),
                    ..
                } = &mut attribute.kind
                {
                    *base = rebase(base);
                }
            }
        }
        self
    }

    /// Structural checks that do not need descriptors.
    pub fn validate(&self) -> BuildResult<()> {
        for (i, resource) in self.resources.iter().enumerate() {
            if self.resources[..i]
                .iter()
                .any(|r| r.resource.eq_ignore_ascii_case(&resource.resource))
            {
                return Err(invalid(format!(
                    "resource '{}' is mapped more than once",
                    resource.resource
                )));
            }
            resource.validate()?;
        }
        Ok(())
    }
}

/// How one resource type is stored in the directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceMapping {
    /// Resource type name, matching a descriptor
    pub resource: String,
    pub search_base_dn: String,
    /// Parent of newly created entries; defaults to the search base
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_base_dn: Option<String>,
    /// Object classes written on create. Empty makes the resource read-only.
    #[serde(default)]
    pub object_classes: Vec<String>,
    /// Object classes that identify entries of this type on reads; any one
    /// suffices. Defaults to `objectClasses` without `top`.
    #[serde(default)]
    pub search_object_classes: Vec<String>,
    /// Directory attribute naming new entries
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rdn_attribute: Option<String>,
    #[serde(default = "default_true")]
    pub query_supported: bool,
    /// Directory attributes a new entry must carry
    #[serde(default)]
    pub required_directory_attributes: Vec<String>,
    pub attributes: Vec<AttributeMapping>,
}

impl ResourceMapping {
    pub fn create_base_dn(&self) -> &str {
        self.create_base_dn.as_deref().unwrap_or(&self.search_base_dn)
    }

    /// The object classes used to recognize entries of this type.
    pub fn effective_search_object_classes(&self) -> Vec<String> {
        if !self.search_object_classes.is_empty() {
            return self.search_object_classes.clone();
        }
        self.object_classes
            .iter()
            .filter(|oc| !oc.eq_ignore_ascii_case("top"))
            .cloned()
            .collect()
    }

    pub fn supports_create(&self) -> bool {
        !self.object_classes.is_empty() && self.rdn_attribute.is_some()
    }

    fn validate(&self) -> BuildResult<()> {
        if self.effective_search_object_classes().is_empty() {
            return Err(invalid(format!(
                "resource '{}' has no object classes to search for",
                self.resource
            )));
        }
        if !self.object_classes.is_empty() && self.rdn_attribute.is_none() {
            return Err(invalid(format!(
                "resource '{}' defines object classes but no rdnAttribute",
                self.resource
            )));
        }
        for attribute in &self.attributes {
            attribute.validate(&self.resource)?;
        }
        Ok(())
    }
}

/// Mapping of one SCIM attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributeMapping {
    /// Schema URI; defaults to the resource's core schema
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    pub name: String,
    /// Delete the directory attributes on replace when the SCIM attribute
    /// is absent
    #[serde(default)]
    pub clear_on_absence: bool,
    #[serde(flatten)]
    pub kind: MappingKind,
}

impl AttributeMapping {
    fn validate(&self, resource: &str) -> BuildResult<()> {
        let problem = match &self.kind {
            MappingKind::Simple { ldap_attribute, .. } if ldap_attribute.is_empty() => {
                Some("ldapAttribute is empty")
            }
            MappingKind::Complex { sub_attributes } if sub_attributes.is_empty() => {
                Some("no subAttributes")
            }
            MappingKind::Plural { canonical_values } if canonical_values.is_empty() => {
                Some("no canonicalValues")
            }
            MappingKind::Plural { canonical_values }
                if canonical_values.iter().any(|c| c.sub_attributes.is_empty()) =>
            {
                Some("a canonical value has no subAttributes")
            }
            MappingKind::References { ldap_attributes, .. } if ldap_attributes.is_empty() => {
                Some("no ldapAttributes")
            }
            _ => None,
        };
        match problem {
            Some(problem) => Err(invalid(format!(
                "mapping of {}.{}: {}",
                resource, self.name, problem
            ))),
            None => Ok(()),
        }
    }
}

/// The shapes of attribute mapping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum MappingKind {
    /// Singular simple attribute stored in one directory attribute
    Simple {
        ldap_attribute: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        transformation: Option<String>,
    },
    /// Singular complex attribute, one directory attribute per sub-attribute
    Complex {
        sub_attributes: Vec<SubAttributeMapping>,
    },
    /// Plural attribute whose canonical `type` values select directory
    /// attributes
    Plural {
        canonical_values: Vec<CanonicalValueMapping>,
    },
    /// Plural `{value}` references stored as DNs, e.g. group members
    References {
        ldap_attributes: Vec<String>,
        /// Attribute holding LDAP URLs of dynamic members
        #[serde(default, skip_serializing_if = "Option::is_none")]
        member_url_attribute: Option<String>,
    },
    /// Computed from other entries; never written
    Derived {
        derivation: Derivation,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        search_base_dn: Option<String>,
    },
}

/// Sub-attribute to directory attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubAttributeMapping {
    pub name: String,
    pub ldap_attribute: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transformation: Option<String>,
}

/// One canonical `type` value of a plural attribute. A missing type maps
/// untyped values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalValueMapping {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub type_value: Option<String>,
    pub sub_attributes: Vec<SubAttributeMapping>,
}

/// Computations available to derived attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Derivation {
    /// Groups whose `member`/`uniqueMember` name the entry, plus dynamic
    /// groups whose member URL selects it
    Groups,
}

fn default_true() -> bool {
    true
}

fn invalid(message: String) -> BuildError {
    BuildError::InvalidConfiguration { message }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_default_parses() {
        let config = MappingConfig::embedded_default().unwrap();
        let user = config.resource("user").unwrap();
        assert_eq!(user.rdn_attribute.as_deref(), Some("uid"));
        assert!(user.supports_create());
        assert_eq!(user.effective_search_object_classes(), vec!["inetOrgPerson"]);

        let group = config.resource("Group").unwrap();
        assert_eq!(group.search_object_classes.len(), 3);
    }

    #[test]
    fn test_kinds_deserialize() {
        let json = r#"{
          "resources": [{
            "resource": "User",
            "searchBaseDn": "ou=People,dc=example,dc=com",
            "objectClasses": ["top", "inetOrgPerson"],
            "rdnAttribute": "uid",
            "attributes": [
              { "name": "userName", "kind": "simple", "ldapAttribute": "uid" },
              { "name": "title", "kind": "simple", "ldapAttribute": "title", "clearOnAbsence": true },
              { "name": "emails", "kind": "plural", "canonicalValues": [
                  { "type": "work", "subAttributes": [ { "name": "value", "ldapAttribute": "mail" } ] }
              ] },
              { "name": "groups", "kind": "derived", "derivation": "groups" }
            ]
          }]
        }"#;
        let config = MappingConfig::from_json_str(json).unwrap();
        let user = &config.resources[0];
        assert!(user.query_supported);
        assert_eq!(user.create_base_dn(), "ou=People,dc=example,dc=com");
        assert!(user.attributes[1].clear_on_absence);
        assert!(!user.attributes[0].clear_on_absence);
        assert!(matches!(
            &user.attributes[2].kind,
            MappingKind::Plural { canonical_values }
                if canonical_values[0].type_value.as_deref() == Some("work")
        ));
        assert!(matches!(
            user.attributes[3].kind,
            MappingKind::Derived { derivation: Derivation::Groups, search_base_dn: None }
        ));
    }

    #[test]
    fn test_validation_failures() {
        let missing_rdn = r#"{ "resources": [{
            "resource": "User", "searchBaseDn": "dc=x",
            "objectClasses": ["inetOrgPerson"], "attributes": [] }] }"#;
        assert!(matches!(
            MappingConfig::from_json_str(missing_rdn),
            Err(BuildError::InvalidConfiguration { .. })
        ));

        let duplicate = r#"{ "resources": [
            { "resource": "User", "searchBaseDn": "dc=x", "searchObjectClasses": ["person"], "attributes": [] },
            { "resource": "user", "searchBaseDn": "dc=y", "searchObjectClasses": ["person"], "attributes": [] }
        ] }"#;
        assert!(MappingConfig::from_json_str(duplicate).is_err());

        let unknown_kind = r#"{ "resources": [{
            "resource": "User", "searchBaseDn": "dc=x", "searchObjectClasses": ["person"],
            "attributes": [ { "name": "userName", "kind": "magic" } ] }] }"#;
        assert!(matches!(
            MappingConfig::from_json_str(unknown_kind),
            Err(BuildError::Json(_))
        ));
    }

    #[test]
    fn test_rebase() {
        let config = MappingConfig::embedded_default()
            .unwrap()
            .with_base_dn_suffix("dc=example,dc=com", "o=test");
        assert_eq!(config.resource("User").unwrap().search_base_dn, "ou=People,o=test");
    }
}
