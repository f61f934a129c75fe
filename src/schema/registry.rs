//! Descriptor registry for loading, managing, and accessing SCIM resource
//! descriptors.
//!
//! The registry owns one [`ResourceDescriptor`] per resource type. Schema
//! extensions are folded into the descriptors of the resource types they
//! name, so lookups never have to consult more than one descriptor.

use super::{
    embedded,
    types::{ResourceDescriptor, SchemaExtension},
};
use crate::error::{BuildError, BuildResult};

use log::{debug, info};
use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

/// Registry of resource descriptors keyed by resource type name.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    resources: HashMap<String, Arc<ResourceDescriptor>>,
}

impl SchemaRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding the embedded User and Group descriptors
    /// with the enterprise extension applied to User.
    pub fn with_embedded_descriptors() -> BuildResult<Self> {
        let mut registry = Self::new();
        registry.add_resource(Self::load_descriptor_from_str(
            embedded::core_user_descriptor(),
        )?);
        registry.add_resource(Self::load_descriptor_from_str(
            embedded::core_group_descriptor(),
        )?);
        registry.add_extension(&Self::load_extension_from_str(
            embedded::enterprise_user_extension(),
        )?)?;
        Ok(registry)
    }

    /// Create a registry by loading every `*.json` document in a directory.
    ///
    /// Documents with an `endpoint` are resource descriptors; documents with
    /// `resourceTypes` are schema extensions applied after all resources
    /// are loaded.
    pub fn from_descriptor_dir<P: AsRef<Path>>(dir: P) -> BuildResult<Self> {
        let mut registry = Self::new();
        let mut extensions = Vec::new();

        let mut paths: Vec<_> = fs::read_dir(dir.as_ref())?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
            .collect();
        paths.sort();

        for path in paths {
            let content = fs::read_to_string(&path)?;
            let value: Value = serde_json::from_str(&content)?;
            if value.get("endpoint").is_some() {
                registry.add_resource(Self::load_descriptor_from_str(&content)?);
            } else if value.get("resourceTypes").is_some() {
                extensions.push(Self::load_extension_from_str(&content)?);
            } else {
                debug!("Skipping {}: not a descriptor document", path.display());
            }
        }

        for extension in &extensions {
            registry.add_extension(extension)?;
        }
        Ok(registry)
    }

    /// Parse a resource descriptor from a JSON string.
    pub fn load_descriptor_from_str(content: &str) -> BuildResult<ResourceDescriptor> {
        let mut descriptor: ResourceDescriptor =
            serde_json::from_str(content).map_err(|e| BuildError::SchemaLoadError {
                schema_id: "resource descriptor".to_string(),
                message: e.to_string(),
            })?;
        if descriptor.schema.is_empty() {
            return Err(BuildError::SchemaLoadError {
                schema_id: descriptor.name,
                message: "descriptor has no core schema URI".to_string(),
            });
        }
        descriptor.normalize();
        Ok(descriptor)
    }

    /// Parse a schema extension from a JSON string.
    pub fn load_extension_from_str(content: &str) -> BuildResult<SchemaExtension> {
        serde_json::from_str(content).map_err(|e| BuildError::SchemaLoadError {
            schema_id: "schema extension".to_string(),
            message: e.to_string(),
        })
    }

    /// Register a resource descriptor, replacing any with the same name.
    pub fn add_resource(&mut self, descriptor: ResourceDescriptor) {
        info!(
            "Registered resource descriptor '{}' ({} attributes)",
            descriptor.name,
            descriptor.attributes.len()
        );
        self.resources
            .insert(descriptor.name.to_ascii_lowercase(), Arc::new(descriptor));
    }

    /// Apply a schema extension to every resource type it names.
    pub fn add_extension(&mut self, extension: &SchemaExtension) -> BuildResult<()> {
        for resource_type in &extension.resource_types {
            let key = resource_type.to_ascii_lowercase();
            let descriptor = self.resources.get_mut(&key).ok_or_else(|| {
                BuildError::UnknownResourceType {
                    name: resource_type.clone(),
                }
            })?;
            Arc::make_mut(descriptor).add_extension(extension);
            debug!(
                "Applied extension '{}' to resource '{}'",
                extension.schema, resource_type
            );
        }
        Ok(())
    }

    /// Get a resource descriptor by resource type name, case-insensitively.
    pub fn get_resource(&self, name: &str) -> Option<&Arc<ResourceDescriptor>> {
        self.resources.get(&name.to_ascii_lowercase())
    }

    /// Get a resource descriptor by endpoint, case-insensitively.
    pub fn get_resource_by_endpoint(&self, endpoint: &str) -> Option<&Arc<ResourceDescriptor>> {
        self.resources
            .values()
            .find(|d| d.endpoint.eq_ignore_ascii_case(endpoint))
    }

    /// All registered resource descriptors, ordered by name.
    pub fn resources(&self) -> Vec<&Arc<ResourceDescriptor>> {
        let mut resources: Vec<_> = self.resources.values().collect();
        resources.sort_by(|a, b| a.name.cmp(&b.name));
        resources
    }

    /// The User descriptor, if registered.
    pub fn user_descriptor(&self) -> Option<&Arc<ResourceDescriptor>> {
        self.get_resource("User")
    }

    /// The Group descriptor, if registered.
    pub fn group_descriptor(&self) -> Option<&Arc<ResourceDescriptor>> {
        self.get_resource("Group")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{AttributeType, SCHEMA_URI_CORE, SCHEMA_URI_ENTERPRISE_EXTENSION};

    #[test]
    fn test_embedded_registry() {
        let registry = SchemaRegistry::with_embedded_descriptors().unwrap();
        let user = registry.get_resource("user").unwrap();
        assert_eq!(user.endpoint, "Users");
        assert_eq!(user.core_schema(), SCHEMA_URI_CORE);

        let manager = user
            .attribute(SCHEMA_URI_ENTERPRISE_EXTENSION, "manager")
            .unwrap();
        assert!(manager.is_complex());
        assert_eq!(
            manager.sub_attribute("managerId").unwrap().schema,
            SCHEMA_URI_ENTERPRISE_EXTENSION
        );

        let emails = user.core_attribute("emails").unwrap();
        assert!(emails.multi_valued);
        assert_eq!(emails.child_name(), "email");
        assert_eq!(
            emails.sub_attribute("primary").unwrap().data_type,
            Some(AttributeType::Boolean)
        );

        let group = registry.get_resource_by_endpoint("groups").unwrap();
        assert_eq!(group.name, "Group");
        assert!(group
            .attribute(SCHEMA_URI_ENTERPRISE_EXTENSION, "employeeNumber")
            .is_none());
    }

    #[test]
    fn test_extension_for_unknown_resource_fails() {
        let mut registry = SchemaRegistry::new();
        let extension = SchemaRegistry::load_extension_from_str(
            r#"{"schema": "urn:x", "resourceTypes": ["Device"], "attributes": []}"#,
        )
        .unwrap();
        assert!(matches!(
            registry.add_extension(&extension),
            Err(BuildError::UnknownResourceType { .. })
        ));
    }

    #[test]
    fn test_descriptor_without_schema_is_rejected() {
        let result = SchemaRegistry::load_descriptor_from_str(
            r#"{"name": "Device", "endpoint": "Devices", "schema": "", "attributes": []}"#,
        );
        assert!(result.is_err());
    }
}
