//! # Schema Validator
//!
//! A command-line utility for validating resource descriptor, schema
//! extension and mapping configuration files before they are loaded by a
//! resource service.
//!
//! ## Usage
//!
//! ### Validate a Single File
//!
//! ```bash
//! cargo run --bin schema-validator descriptors/User.json
//! cargo run --bin schema-validator mapping.json
//! ```
//!
//! The kind of document is detected from its content: an `endpoint` marks
//! a resource descriptor, `resourceTypes` a schema extension and
//! `resources` a mapping configuration. Mapping configurations are checked
//! against the embedded User and Group descriptors.
//!
//! ### Validate a Descriptor Directory
//!
//! ```bash
//! cargo run --bin schema-validator ./descriptors/
//! cargo run --bin schema-validator ./descriptors/ --mapping mapping.json
//! ```
//!
//! Every `*.json` file is validated on its own, then all of them are loaded
//! into one registry. With `--mapping`, the mapping configuration is built
//! against that registry.
//!
//! ## Output Example
//!
//! ```text
//! Validating descriptor file: descriptors/User.json
//! ✓ Descriptor is valid!
//!
//! Descriptor Summary:
//!   Name: User
//!   Endpoint: Users
//!   Schema: urn:scim:schemas:core:1.0
//!   Attributes: 21
//!   Required attributes: userName
//!   Plural attributes: 7
//! ```
//!
//! Set `RUST_LOG=debug` for details of registry and mapper construction.
//!
//! ## Exit Codes
//!
//! - `0`: All documents are valid
//! - `1`: One or more documents are invalid or could not be read

use scim_directory::config::MappingConfig;
use scim_directory::mapper::{MapperTable, TransformationRegistry};
use scim_directory::schema::{
    AttributeDescriptor, AttributeType, ResourceDescriptor, SchemaRegistry,
};

use serde_json::Value;
use std::env;
use std::fs;
use std::path::Path;
use std::process;
use std::sync::Arc;

type CheckResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Base URL used only to build mappers during validation.
const VALIDATION_BASE_URL: &str = "https://localhost/v1";

fn main() {
    env_logger::init();
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        eprintln!("Usage: {} <file-or-directory> [--mapping <mapping.json>]", args[0]);
        eprintln!();
        eprintln!("Examples:");
        eprintln!("  {} descriptors/User.json", args[0]);
        eprintln!("  {} mapping.json", args[0]);
        eprintln!("  {} ./descriptors/ --mapping mapping.json", args[0]);
        process::exit(1);
    }

    let path = Path::new(&args[1]);
    let mapping = match args.get(2).map(String::as_str) {
        Some("--mapping") => match args.get(3) {
            Some(mapping) => Some(Path::new(mapping)),
            None => {
                eprintln!("Error: --mapping needs a file");
                process::exit(1);
            }
        },
        Some(other) => {
            eprintln!("Error: unexpected argument '{}'", other);
            process::exit(1);
        }
        None => None,
    };

    let outcome = if path.is_file() {
        validate_single_file(path)
    } else if path.is_dir() {
        validate_directory(path, mapping)
    } else {
        Err(format!("'{}' is not a valid file or directory", path.display()).into())
    };

    if let Err(e) = outcome {
        eprintln!("❌ Validation failed: {}", e);
        process::exit(1);
    }
}

fn validate_single_file(file_path: &Path) -> CheckResult<()> {
    let content = fs::read_to_string(file_path)?;
    let value: Value = serde_json::from_str(&content)?;

    if value.get("endpoint").is_some() {
        println!("Validating descriptor file: {}", file_path.display());
        let descriptor = load_descriptor(&content)?;
        println!("✓ Descriptor is valid!");
        print_descriptor_summary(&descriptor);
    } else if value.get("resourceTypes").is_some() {
        println!("Validating extension file: {}", file_path.display());
        let extension = SchemaRegistry::load_extension_from_str(&content)?;
        check_schema_uri(&extension.schema)?;
        for (i, attribute) in extension.attributes.iter().enumerate() {
            validate_attribute(attribute, &format!("attributes[{}]", i))?;
        }
        println!(
            "✓ Extension is valid: {} ({} attributes for {})",
            extension.schema,
            extension.attributes.len(),
            extension.resource_types.join(", ")
        );
    } else if value.get("resources").is_some() {
        println!("Validating mapping file: {}", file_path.display());
        let registry = SchemaRegistry::with_embedded_descriptors()?;
        validate_mapping(&registry, &content)?;
    } else {
        return Err("document is neither a descriptor, an extension nor a mapping".into());
    }
    Ok(())
}

fn validate_directory(dir_path: &Path, mapping: Option<&Path>) -> CheckResult<()> {
    println!("Validating descriptors in directory: {}", dir_path.display());

    let mut paths: Vec<_> = fs::read_dir(dir_path)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.extension().and_then(|s| s.to_str()) == Some("json"))
        .collect();
    paths.sort();

    let mut valid_count = 0;
    let mut error_count = 0;
    for path in &paths {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        println!("\nValidating: {}", file_name);
        match validate_single_file(path) {
            Ok(()) => valid_count += 1,
            Err(e) => {
                eprintln!("  ❌ Invalid - {}", e);
                error_count += 1;
            }
        }
    }

    println!("\nValidation Summary:");
    println!("  Valid documents: {}", valid_count);
    println!("  Invalid documents: {}", error_count);
    if error_count > 0 {
        return Err(format!("{} invalid documents", error_count).into());
    }

    println!("\nTesting descriptor registry loading...");
    let registry = SchemaRegistry::from_descriptor_dir(dir_path)?;
    let resources = registry.resources();
    println!("✓ Descriptor registry loaded successfully");
    println!("  Total resources loaded: {}", resources.len());
    for descriptor in resources {
        println!("    - {} ({})", descriptor.name, descriptor.schemas().join(", "));
    }

    if let Some(mapping) = mapping {
        println!("\nValidating mapping file: {}", mapping.display());
        validate_mapping(&registry, &fs::read_to_string(mapping)?)?;
    }
    Ok(())
}

fn load_descriptor(content: &str) -> CheckResult<ResourceDescriptor> {
    let descriptor = SchemaRegistry::load_descriptor_from_str(content)?;
    if descriptor.name.is_empty() {
        return Err("Descriptor name cannot be empty".into());
    }
    if descriptor.endpoint.is_empty() {
        return Err("Descriptor endpoint cannot be empty".into());
    }
    check_schema_uri(&descriptor.schema)?;
    if descriptor.attributes.is_empty() {
        return Err("Descriptor must have at least one attribute".into());
    }
    for (i, attribute) in descriptor.attributes.iter().enumerate() {
        validate_attribute(attribute, &format!("attributes[{}]", i))?;
    }
    Ok(descriptor)
}

fn check_schema_uri(uri: &str) -> CheckResult<()> {
    if !uri.starts_with("urn:") && !uri.starts_with("http") {
        return Err(
            format!("Schema '{}' should be a URI (starting with 'urn:' or 'http')", uri).into(),
        );
    }
    Ok(())
}

fn validate_attribute(attribute: &AttributeDescriptor, context: &str) -> CheckResult<()> {
    if attribute.name.is_empty() {
        return Err(format!("{}: Attribute name cannot be empty", context).into());
    }

    if attribute.multi_valued_child_name.is_some() && !attribute.multi_valued {
        return Err(format!(
            "{} ({}): multiValuedChildName is only allowed on plural attributes",
            context, attribute.name
        )
        .into());
    }

    if attribute.data_type == Some(AttributeType::Complex) && attribute.sub_attributes.is_empty() {
        return Err(format!(
            "{} ({}): Complex attributes must have sub-attributes",
            context, attribute.name
        )
        .into());
    }
    if attribute.data_type.is_some_and(|t| t != AttributeType::Complex)
        && !attribute.sub_attributes.is_empty()
    {
        return Err(format!(
            "{} ({}): Non-complex attributes cannot have sub-attributes",
            context, attribute.name
        )
        .into());
    }

    for (i, sub) in attribute.sub_attributes.iter().enumerate() {
        if sub.multi_valued {
            return Err(format!(
                "{}.subAttributes[{}]: Sub-attributes must be singular",
                context, i
            )
            .into());
        }
        validate_attribute(sub, &format!("{}.subAttributes[{}]", context, i))?;
    }
    Ok(())
}

fn validate_mapping(registry: &SchemaRegistry, content: &str) -> CheckResult<()> {
    let mapping = MappingConfig::from_json_str(content)?;
    let table = MapperTable::build(
        registry,
        &mapping,
        Arc::new(TransformationRegistry::with_builtins()),
        VALIDATION_BASE_URL,
    )?;
    println!("✓ Mapping is valid!");
    for resource in &mapping.resources {
        let writable = table
            .get(&resource.resource)
            .is_some_and(|mapper| mapper.supports_create());
        println!(
            "  - {}: {} attribute mappings below {}{}",
            resource.resource,
            resource.attributes.len(),
            resource.search_base_dn,
            if writable { "" } else { " (read-only)" }
        );
    }
    Ok(())
}

fn print_descriptor_summary(descriptor: &ResourceDescriptor) {
    println!();
    println!("Descriptor Summary:");
    println!("  Name: {}", descriptor.name);
    println!("  Endpoint: {}", descriptor.endpoint);
    println!("  Schema: {}", descriptor.schema);
    println!("  Attributes: {}", descriptor.attributes.len());

    let required: Vec<&str> = descriptor
        .attributes
        .iter()
        .filter(|a| a.required)
        .map(|a| a.name.as_str())
        .collect();
    if !required.is_empty() {
        println!("  Required attributes: {}", required.join(", "));
    }
    let plural = descriptor.attributes.iter().filter(|a| a.multi_valued).count();
    println!("  Plural attributes: {}", plural);
}
