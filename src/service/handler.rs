//! Transport-agnostic request handling.
//!
//! A [`ServiceRequest`] carries what a transport extracted from a request:
//! the operation, endpoint, resource id, raw body and query parameters.
//! [`DirectoryResourceService::handle`] unmarshals the body, runs the
//! operation and marshals the outcome. Failures become error payloads in
//! the request's content type, never Rust errors.

use super::response::ScimResponse;
use super::{DirectoryResourceService, QueryRequest};
use crate::directory::DirectoryWriter;
use crate::error::{ScimError, ScimResult};
use crate::marshal::ContentType;
use crate::query::{PageParameters, QueryAttributes, ScimFilter, SortParameters};
use crate::resource::ResourceVersion;
use crate::schema::ResourceDescriptor;

use log::debug;
use serde::{Deserialize, Serialize};

/// Operations a request can ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperationType {
    Get,
    Create,
    Replace,
    Delete,
    Query,
}

/// Raw query parameters as received.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParameters {
    pub filter: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    pub start_index: Option<i64>,
    pub count: Option<i64>,
    /// Comma-separated attribute paths
    pub attributes: Option<String>,
}

impl QueryParameters {
    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    pub fn with_sort(mut self, sort_by: impl Into<String>, sort_order: Option<&str>) -> Self {
        self.sort_by = Some(sort_by.into());
        self.sort_order = sort_order.map(str::to_string);
        self
    }

    pub fn with_page(mut self, start_index: i64, count: i64) -> Self {
        self.start_index = Some(start_index);
        self.count = Some(count);
        self
    }

    pub fn with_attributes(mut self, attributes: impl Into<String>) -> Self {
        self.attributes = Some(attributes.into());
        self
    }

    /// The requested attributes, `None` meaning all.
    pub fn query_attributes(
        &self,
        descriptor: &ResourceDescriptor,
    ) -> ScimResult<Option<QueryAttributes>> {
        match self.attributes.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(attributes) => QueryAttributes::parse(descriptor, attributes).map(Some),
        }
    }

    /// Parse into a [`QueryRequest`]. A `sortOrder` without `sortBy` is
    /// ignored.
    pub fn to_query_request(&self, descriptor: &ResourceDescriptor) -> ScimResult<QueryRequest> {
        let filter = match self.filter.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(filter) => Some(ScimFilter::parse(filter)?),
        };
        let sort = self
            .sort_by
            .as_deref()
            .map(|sort_by| SortParameters::parse(sort_by, self.sort_order.as_deref()))
            .transpose()?;
        Ok(QueryRequest {
            filter,
            sort,
            page: PageParameters::from_request(self.start_index, self.count),
            attributes: self.query_attributes(descriptor)?,
        })
    }
}

/// A request addressed to an endpoint such as `Users`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceRequest {
    pub operation: OperationType,
    pub endpoint: String,
    pub resource_id: Option<String>,
    pub body: Option<String>,
    pub query: QueryParameters,
    /// Format of the body and of the response
    pub content_type: ContentType,
    /// Version the client expects the resource to have
    pub expected_version: Option<String>,
}

impl ServiceRequest {
    fn new(operation: OperationType, endpoint: impl Into<String>) -> Self {
        Self {
            operation,
            endpoint: endpoint.into(),
            resource_id: None,
            body: None,
            query: QueryParameters::default(),
            content_type: ContentType::Json,
            expected_version: None,
        }
    }

    pub fn get(endpoint: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            resource_id: Some(id.into()),
            ..Self::new(OperationType::Get, endpoint)
        }
    }

    pub fn create(endpoint: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            body: Some(body.into()),
            ..Self::new(OperationType::Create, endpoint)
        }
    }

    pub fn replace(
        endpoint: impl Into<String>,
        id: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            resource_id: Some(id.into()),
            body: Some(body.into()),
            ..Self::new(OperationType::Replace, endpoint)
        }
    }

    pub fn delete(endpoint: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            resource_id: Some(id.into()),
            ..Self::new(OperationType::Delete, endpoint)
        }
    }

    pub fn query(endpoint: impl Into<String>, query: QueryParameters) -> Self {
        Self {
            query,
            ..Self::new(OperationType::Query, endpoint)
        }
    }

    pub fn with_content_type(mut self, content_type: ContentType) -> Self {
        self.content_type = content_type;
        self
    }

    pub fn with_expected_version(mut self, version: impl Into<String>) -> Self {
        self.expected_version = Some(version.into());
        self
    }

    pub fn with_attributes(mut self, attributes: impl Into<String>) -> Self {
        self.query.attributes = Some(attributes.into());
        self
    }

    fn id(&self) -> ScimResult<&str> {
        self.resource_id
            .as_deref()
            .ok_or_else(|| ScimError::invalid_request("A resource id is required"))
    }

    fn body(&self) -> ScimResult<&str> {
        self.body
            .as_deref()
            .ok_or_else(|| ScimError::invalid_request("A request body is required"))
    }
}

impl<D: DirectoryWriter> DirectoryResourceService<D> {
    /// Run a wire-level request.
    pub async fn handle(&self, request: &ServiceRequest) -> ScimResponse {
        let config = self.context().config();
        if !config.supports(request.content_type) {
            let fallback = config.content_types.first().copied().unwrap_or(ContentType::Json);
            let error = ScimError::invalid_request(format!(
                "Content type {} is not supported",
                request.content_type
            ));
            return ScimResponse::error(fallback, &error);
        }

        match self.dispatch(request).await {
            Ok(response) => response,
            Err(error) => {
                debug!(
                    "{:?} on {} failed: {}",
                    request.operation, request.endpoint, error
                );
                ScimResponse::error(request.content_type, &error)
            }
        }
    }

    async fn dispatch(&self, request: &ServiceRequest) -> ScimResult<ScimResponse> {
        let descriptor = {
            let table = self.context().mappers().await;
            table
                .get_by_endpoint(&request.endpoint)
                .map(|mapper| mapper.resource_descriptor().clone())
                .ok_or_else(|| ScimError::UnsupportedResourceType(request.endpoint.clone()))?
        };
        let resource = descriptor.name.as_str();
        let marshaller = request.content_type.marshaller();
        let unmarshaller = request
            .content_type
            .unmarshaller(self.context().config().schema_policy);

        match request.operation {
            OperationType::Get => {
                let attributes = request.query.query_attributes(&descriptor)?;
                let object = self.get(resource, request.id()?, attributes.as_ref()).await?;
                ScimResponse::resource(200, marshaller.as_ref(), &descriptor, &object)
            }
            OperationType::Create => {
                let object = unmarshaller.unmarshal_resource(&descriptor, request.body()?)?;
                let created = self.create(resource, &object).await?;
                ScimResponse::resource(201, marshaller.as_ref(), &descriptor, &created)
            }
            OperationType::Replace => {
                let object = unmarshaller.unmarshal_resource(&descriptor, request.body()?)?;
                let expected = request
                    .expected_version
                    .as_deref()
                    .and_then(|v| v.parse::<ResourceVersion>().ok());
                let replaced = self
                    .replace(resource, request.id()?, &object, expected.as_ref())
                    .await?;
                ScimResponse::resource(200, marshaller.as_ref(), &descriptor, &replaced)
            }
            OperationType::Delete => {
                self.delete(resource, request.id()?).await?;
                Ok(ScimResponse::empty(200, request.content_type))
            }
            OperationType::Query => {
                let query = request.query.to_query_request(&descriptor)?;
                let list = self.query(resource, &query).await?;
                ScimResponse::list(marshaller.as_ref(), &descriptor, &list)
            }
        }
    }
}
