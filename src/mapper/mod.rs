//! Mapping between SCIM resources and directory entries.
//!
//! Mappers are built from a [`MappingConfig`](crate::config::MappingConfig)
//! into an immutable [`MapperTable`], one [`ResourceMapper`] per resource
//! type. A [`MapperTableHandle`] holds the active table and swaps in a new
//! one on reconfiguration.
//!
//! # Example
//!
//! ```rust
//! use scim_directory::config::MappingConfig;
//! use scim_directory::mapper::{MapperTable, TransformationRegistry};
//! use scim_directory::schema::SchemaRegistry;
//! use std::sync::Arc;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let table = MapperTable::build(
//!     &SchemaRegistry::with_embedded_descriptors()?,
//!     &MappingConfig::embedded_default()?,
//!     Arc::new(TransformationRegistry::with_builtins()),
//!     "https://example.com/v1",
//! )?;
//! assert!(table.get("user").is_some());
//! assert!(table.get_by_endpoint("Groups").is_some());
//! # Ok(())
//! # }
//! ```

pub mod attribute;
pub mod resource;
pub mod transformation;

pub use attribute::{AttributeMapper, build_attribute_mapper};
pub use resource::{ConfigurableResourceMapper, ResourceMapper};
pub use transformation::{Transformation, TransformationFactory, TransformationRegistry};

use crate::config::MappingConfig;
use crate::error::{BuildError, BuildResult};
use crate::schema::SchemaRegistry;

use log::{debug, info};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// Immutable lookup of resource mappers by resource name.
#[derive(Debug, Default)]
pub struct MapperTable {
    mappers: HashMap<String, Arc<dyn ResourceMapper>>,
}

impl MapperTable {
    /// Build and initialize a mapper for every resource in `config`.
    pub fn build(
        schemas: &SchemaRegistry,
        config: &MappingConfig,
        transformations: Arc<TransformationRegistry>,
        base_url: &str,
    ) -> BuildResult<Self> {
        let mut table = Self::default();
        for mapping in &config.resources {
            let descriptor = schemas.get_resource(&mapping.resource).ok_or_else(|| {
                BuildError::UnknownResourceType {
                    name: mapping.resource.clone(),
                }
            })?;
            let mut mapper = ConfigurableResourceMapper::new(
                descriptor.clone(),
                mapping.clone(),
                transformations.clone(),
                base_url,
            );
            mapper.initialize()?;
            table.insert(Arc::new(mapper));
        }
        debug!("Built mapper table for {:?}", table.resource_names());
        Ok(table)
    }

    /// Add a mapper that has already been initialized.
    pub fn insert(&mut self, mapper: Arc<dyn ResourceMapper>) {
        let key = mapper.resource_descriptor().name.to_lowercase();
        self.mappers.insert(key, mapper);
    }

    /// The mapper for a resource name, case-insensitively.
    pub fn get(&self, resource: &str) -> Option<&Arc<dyn ResourceMapper>> {
        self.mappers.get(&resource.to_lowercase())
    }

    /// The mapper serving an endpoint such as `Users`.
    pub fn get_by_endpoint(&self, endpoint: &str) -> Option<&Arc<dyn ResourceMapper>> {
        self.mappers
            .values()
            .find(|m| m.resource_descriptor().endpoint.eq_ignore_ascii_case(endpoint))
    }

    pub fn resource_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .mappers
            .values()
            .map(|m| m.resource_descriptor().name.clone())
            .collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.mappers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappers.is_empty()
    }

    fn finalize(&self) {
        for mapper in self.mappers.values() {
            mapper.finalize();
        }
    }
}

/// Shared handle to the active [`MapperTable`].
///
/// Readers [`load`](Self::load) the table once per request and keep the
/// `Arc` for the request's duration. [`swap`](Self::swap) installs a new
/// table, waits until no request holds the old one and then finalizes it.
#[derive(Debug)]
pub struct MapperTableHandle {
    current: RwLock<Arc<MapperTable>>,
    drain_interval: Duration,
}

impl MapperTableHandle {
    pub fn new(table: MapperTable) -> Self {
        Self {
            current: RwLock::new(Arc::new(table)),
            drain_interval: Duration::from_millis(10),
        }
    }

    /// The active table.
    pub async fn load(&self) -> Arc<MapperTable> {
        self.current.read().await.clone()
    }

    /// Replace the active table and finalize the previous one once it has
    /// drained.
    pub async fn swap(&self, table: MapperTable) {
        let previous = {
            let mut current = self.current.write().await;
            std::mem::replace(&mut *current, Arc::new(table))
        };
        info!("Mapper table replaced; draining previous table");

        while Arc::strong_count(&previous) > 1 {
            tokio::time::sleep(self.drain_interval).await;
        }
        previous.finalize();
        debug!("Previous mapper table finalized");
    }
}
