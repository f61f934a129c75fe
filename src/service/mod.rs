//! Resource service over a directory.
//!
//! [`DirectoryResourceService`] runs get, create, replace, delete and query
//! of SCIM resources against a directory: requests are mapped to directory
//! operations through the active [`MapperTable`] and the resulting entries
//! mapped back to SCIM objects. All shared configuration lives in a
//! [`ServiceContext`].
//!
//! [`handler`] adds the wire level on top: payloads are unmarshalled,
//! results and failures marshalled into a [`ScimResponse`].
//!
//! # Example
//!
//! ```rust
//! use scim_directory::directory::InMemoryDirectory;
//! use scim_directory::query::{PageParameters, ScimFilter};
//! use scim_directory::resource::UserResource;
//! use scim_directory::service::{DirectoryResourceService, QueryRequest, ServiceContext};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let context = Arc::new(ServiceContext::builder().build()?);
//! let service = DirectoryResourceService::new(context.clone(), InMemoryDirectory::new());
//!
//! let descriptor = context.schemas().user_descriptor().expect("embedded").clone();
//! let mut user = UserResource::new(descriptor);
//! user.set_user_name("bjensen")?;
//! let created = service.create("User", user.base().object()).await?;
//!
//! let request = QueryRequest::default()
//!     .with_filter(ScimFilter::parse("userName eq \"bjensen\"")?)
//!     .with_page(PageParameters::new(1, Some(10)));
//! let list = service.query("User", &request).await?;
//! assert_eq!(list.total_results, 1);
//! # let _ = created;
//! # Ok(())
//! # }
//! ```

pub mod handler;
pub mod response;

pub use handler::{OperationType, QueryParameters, ServiceRequest};
pub use response::ScimResponse;

use crate::config::{MappingConfig, ServiceConfig, ServiceProviderConfig};
use crate::directory::{DirectoryWriter, SearchRequest};
use crate::error::{BuildResult, ScimError, ScimResult};
use crate::mapper::{MapperTable, MapperTableHandle, ResourceMapper, TransformationRegistry};
use crate::marshal::ListResponse;
use crate::query::{AttributePath, PageParameters, QueryAttributes, ScimFilter, SortParameters};
use crate::resource::{BaseResource, ResourceVersion, ScimObject};
use crate::schema::SchemaRegistry;

use log::{debug, info, warn};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Shared, immutable configuration of a resource service.
///
/// The mapper table is the only part that changes after construction, and
/// only through [`reconfigure`](Self::reconfigure).
#[derive(Debug)]
pub struct ServiceContext {
    schemas: Arc<SchemaRegistry>,
    transformations: Arc<TransformationRegistry>,
    mappers: MapperTableHandle,
    config: ServiceConfig,
}

impl ServiceContext {
    pub fn builder() -> ServiceContextBuilder {
        ServiceContextBuilder::default()
    }

    pub fn schemas(&self) -> &Arc<SchemaRegistry> {
        &self.schemas
    }

    pub fn transformations(&self) -> &Arc<TransformationRegistry> {
        &self.transformations
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// The active mapper table. Hold it for the duration of one request.
    pub async fn mappers(&self) -> Arc<MapperTable> {
        self.mappers.load().await
    }

    /// Build mappers for `mapping` and swap them in. Requests already
    /// running finish against the previous table.
    pub async fn reconfigure(&self, mapping: &MappingConfig) -> BuildResult<()> {
        let table = MapperTable::build(
            &self.schemas,
            mapping,
            self.transformations.clone(),
            &self.config.base_url,
        )?;
        info!("Reconfiguring mappers for {:?}", table.resource_names());
        self.mappers.swap(table).await;
        Ok(())
    }

    /// The capability document of this service.
    pub fn service_provider_config(&self) -> ServiceProviderConfig {
        ServiceProviderConfig::from_service_config(&self.config)
    }
}

/// Builder for [`ServiceContext`].
///
/// Anything not supplied defaults to the embedded descriptors, the
/// embedded mapping, the built-in transformations and
/// [`ServiceConfig::default`].
#[derive(Debug, Default)]
pub struct ServiceContextBuilder {
    schemas: Option<SchemaRegistry>,
    mapping: Option<MappingConfig>,
    transformations: Option<TransformationRegistry>,
    config: Option<ServiceConfig>,
}

impl ServiceContextBuilder {
    pub fn with_schemas(mut self, schemas: SchemaRegistry) -> Self {
        self.schemas = Some(schemas);
        self
    }

    pub fn with_mapping(mut self, mapping: MappingConfig) -> Self {
        self.mapping = Some(mapping);
        self
    }

    pub fn with_transformations(mut self, transformations: TransformationRegistry) -> Self {
        self.transformations = Some(transformations);
        self
    }

    pub fn with_config(mut self, config: ServiceConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn build(self) -> BuildResult<ServiceContext> {
        let config = self.config.unwrap_or_default();
        config.validate()?;
        let schemas = match self.schemas {
            Some(schemas) => schemas,
            None => SchemaRegistry::with_embedded_descriptors()?,
        };
        let mapping = match self.mapping {
            Some(mapping) => mapping,
            None => MappingConfig::embedded_default()?,
        };
        let transformations = Arc::new(
            self.transformations
                .unwrap_or_else(TransformationRegistry::with_builtins),
        );

        let table =
            MapperTable::build(&schemas, &mapping, transformations.clone(), &config.base_url)?;
        debug!("Service context ready for {:?}", table.resource_names());
        Ok(ServiceContext {
            schemas: Arc::new(schemas),
            transformations,
            mappers: MapperTableHandle::new(table),
            config,
        })
    }
}

/// Parameters of a query.
#[derive(Debug, Clone, Default)]
pub struct QueryRequest {
    pub filter: Option<ScimFilter>,
    pub sort: Option<SortParameters>,
    pub page: PageParameters,
    /// `None` returns every attribute
    pub attributes: Option<QueryAttributes>,
}

impl QueryRequest {
    pub fn with_filter(mut self, filter: ScimFilter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn with_sort(mut self, sort: SortParameters) -> Self {
        self.sort = Some(sort);
        self
    }

    pub fn with_page(mut self, page: PageParameters) -> Self {
        self.page = page;
        self
    }

    pub fn with_attributes(mut self, attributes: QueryAttributes) -> Self {
        self.attributes = Some(attributes);
        self
    }
}

/// Resource service backed by a directory.
///
/// Resource ids are entry DNs. Clones share one write lock, so a versioned
/// replace and the modify it guards are not interleaved with another write
/// through the same service.
#[derive(Debug, Clone)]
pub struct DirectoryResourceService<D: DirectoryWriter> {
    context: Arc<ServiceContext>,
    directory: D,
    write_lock: Arc<Mutex<()>>,
}

fn lookup<'t>(table: &'t MapperTable, resource: &str) -> ScimResult<&'t Arc<dyn ResourceMapper>> {
    table
        .get(resource)
        .ok_or_else(|| ScimError::UnsupportedResourceType(resource.to_string()))
}

fn check_writable(mapper: &dyn ResourceMapper, operation: &str) -> ScimResult<()> {
    if mapper.supports_create() {
        Ok(())
    } else {
        Err(ScimError::unsupported_operation(
            mapper.resource_descriptor().name.clone(),
            operation,
        ))
    }
}

impl<D: DirectoryWriter> DirectoryResourceService<D> {
    pub fn new(context: Arc<ServiceContext>, directory: D) -> Self {
        Self {
            context,
            directory,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn context(&self) -> &Arc<ServiceContext> {
        &self.context
    }

    pub fn directory(&self) -> &D {
        &self.directory
    }

    /// Read one resource. `attributes` of `None` returns every attribute.
    pub async fn get(
        &self,
        resource: &str,
        id: &str,
        attributes: Option<&QueryAttributes>,
    ) -> ScimResult<ScimObject> {
        let table = self.context.mappers().await;
        let mapper = lookup(&table, resource)?;
        debug!("Getting {} {}", resource, id);
        match attributes {
            Some(query) => self.read(mapper.as_ref(), id, query).await,
            None => {
                let all = QueryAttributes::all(mapper.resource_descriptor());
                self.read(mapper.as_ref(), id, &all).await
            }
        }
    }

    /// Create a resource and return it as stored.
    pub async fn create(&self, resource: &str, object: &ScimObject) -> ScimResult<ScimObject> {
        let table = self.context.mappers().await;
        let mapper = lookup(&table, resource)?;
        check_writable(mapper.as_ref(), "create")?;

        let entry = mapper.to_directory_entry(object)?;
        let dn = entry.dn().to_string();
        self.directory.add(entry).await?;
        info!("Created {} {}", resource, dn);

        let all = QueryAttributes::all(mapper.resource_descriptor());
        self.read(mapper.as_ref(), &dn, &all).await
    }

    /// Replace the mapped attributes of a resource.
    ///
    /// When `expected_version` is given and differs from the current
    /// version, nothing is changed and a conflict is returned.
    pub async fn replace(
        &self,
        resource: &str,
        id: &str,
        object: &ScimObject,
        expected_version: Option<&ResourceVersion>,
    ) -> ScimResult<ScimObject> {
        let table = self.context.mappers().await;
        let mapper = lookup(&table, resource)?;
        check_writable(mapper.as_ref(), "replace")?;

        let _guard = self.write_lock.lock().await;
        let entry = self
            .directory
            .get_entry(id, &[])
            .await?
            .filter(|entry| mapper.matches_entry(entry))
            .ok_or_else(|| ScimError::resource_not_found(resource, id))?;

        if let Some(expected) = expected_version {
            let current = self.current_version(mapper.as_ref(), &entry).await?;
            if current.as_ref() != Some(expected) {
                return Err(ScimError::conflict(format!(
                    "Version mismatch for {} {}: expected {}, current {}",
                    resource,
                    id,
                    expected,
                    current.map(|v| v.to_string()).unwrap_or_else(|| "none".to_string())
                )));
            }
        }

        let modifications = mapper.to_directory_modifications(&entry, object)?;
        if modifications.is_empty() {
            debug!("No changes for {} {}", resource, id);
        } else {
            self.directory.modify(id, &modifications).await?;
            info!("Replaced {} {} ({} modifications)", resource, id, modifications.len());
        }

        let all = QueryAttributes::all(mapper.resource_descriptor());
        self.read(mapper.as_ref(), id, &all).await
    }

    pub async fn delete(&self, resource: &str, id: &str) -> ScimResult<()> {
        let table = self.context.mappers().await;
        let mapper = lookup(&table, resource)?;
        check_writable(mapper.as_ref(), "delete")?;

        let _guard = self.write_lock.lock().await;
        let entry = self
            .directory
            .get_entry(id, &["objectClass".to_string()])
            .await?;
        if !entry.is_some_and(|entry| mapper.matches_entry(&entry)) {
            return Err(ScimError::resource_not_found(resource, id));
        }
        self.directory.delete(id).await?;
        info!("Deleted {} {}", resource, id);
        Ok(())
    }

    /// Run a query and return the requested page.
    ///
    /// At most `maxResults` entries are considered. A start index past the
    /// last result gives an empty page with the total unchanged.
    pub async fn query(&self, resource: &str, request: &QueryRequest) -> ScimResult<ListResponse> {
        let table = self.context.mappers().await;
        let mapper = lookup(&table, resource)?;
        if !mapper.supports_query() {
            return Err(ScimError::unsupported_operation(resource, "query"));
        }

        let descriptor = mapper.resource_descriptor();
        let all = QueryAttributes::all(descriptor);
        let query = request.attributes.as_ref().unwrap_or(&all);

        let filter = mapper.search_filter(request.filter.as_ref())?;
        let sort = request
            .sort
            .as_ref()
            .map(|sort| mapper.to_directory_sort(sort))
            .transpose()?;
        let search = SearchRequest::new(mapper.search_base_dn(), filter)
            .with_attributes(mapper.required_directory_attribute_types(query).into_iter().collect())
            .with_sort(sort)
            .with_size_limit(Some(self.context.config().max_results));
        debug!("Querying {} with {}", resource, search.filter);

        let entries: Vec<_> = self
            .directory
            .search(&search)
            .await?
            .into_iter()
            .filter(|entry| {
                let matches = mapper.matches_entry(entry);
                if !matches {
                    warn!("Skipping {}: not a {}", entry.dn(), descriptor.name);
                }
                matches
            })
            .collect();
        let page = request.page.with_default_count(self.context.config().default_page_size);

        let mut resources = Vec::new();
        for entry in page.slice(&entries) {
            match mapper.to_scim_object(entry, query, &self.directory).await? {
                Some(object) => resources.push(object),
                None => warn!("Skipping {}: not a {}", entry.dn(), descriptor.name),
            }
        }
        debug!(
            "Query on {} matched {} entries, returning {}",
            resource,
            entries.len(),
            resources.len()
        );
        Ok(ListResponse::new(entries.len(), page.start_index, resources))
    }

    async fn read(
        &self,
        mapper: &dyn ResourceMapper,
        id: &str,
        query: &QueryAttributes,
    ) -> ScimResult<ScimObject> {
        let name = &mapper.resource_descriptor().name;
        let types: Vec<String> = mapper
            .required_directory_attribute_types(query)
            .into_iter()
            .collect();
        let entry = self
            .directory
            .get_entry(id, &types)
            .await?
            .ok_or_else(|| ScimError::resource_not_found(name.clone(), id))?;
        mapper
            .to_scim_object(&entry, query, &self.directory)
            .await?
            .ok_or_else(|| ScimError::resource_not_found(name.clone(), id))
    }

    async fn current_version(
        &self,
        mapper: &dyn ResourceMapper,
        entry: &crate::directory::Entry,
    ) -> ScimResult<Option<ResourceVersion>> {
        let descriptor = mapper.resource_descriptor();
        let query = QueryAttributes::from_paths(descriptor, vec![AttributePath::new("meta")])?;
        let Some(object) = mapper.to_scim_object(entry, &query, &self.directory).await? else {
            return Ok(None);
        };
        let meta = BaseResource::from_object(descriptor.clone(), object).meta()?;
        Ok(meta
            .and_then(|m| m.version)
            .and_then(|v| v.parse::<ResourceVersion>().ok()))
    }
}
