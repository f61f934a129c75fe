//! Wire responses.

use crate::error::{ScimError, ScimResult};
use crate::marshal::{ContentType, ErrorResponse, ListResponse, Marshaller};
use crate::resource::ScimObject;
use crate::schema::ResourceDescriptor;

use log::warn;

/// A marshalled result: status code, content type and body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScimResponse {
    pub status: u16,
    pub content_type: ContentType,
    pub body: String,
    /// `meta.version` of a returned resource
    pub etag: Option<String>,
}

impl ScimResponse {
    /// A single resource.
    pub fn resource(
        status: u16,
        marshaller: &dyn Marshaller,
        descriptor: &ResourceDescriptor,
        object: &ScimObject,
    ) -> ScimResult<Self> {
        let etag = object
            .get_attribute(descriptor.core_schema(), "meta")
            .and_then(|meta| meta.singular_value())
            .and_then(|meta| meta.sub_attribute_simple_value("version"))
            .map(|version| version.string_value());
        Ok(Self {
            status,
            content_type: marshaller.content_type(),
            body: marshaller.marshal_resource(descriptor, object)?,
            etag,
        })
    }

    /// A page of query results.
    pub fn list(
        marshaller: &dyn Marshaller,
        descriptor: &ResourceDescriptor,
        list: &ListResponse,
    ) -> ScimResult<Self> {
        Ok(Self {
            status: 200,
            content_type: marshaller.content_type(),
            body: marshaller.marshal_list(descriptor, list)?,
            etag: None,
        })
    }

    /// A success without a body.
    pub fn empty(status: u16, content_type: ContentType) -> Self {
        Self {
            status,
            content_type,
            body: String::new(),
            etag: None,
        }
    }

    /// The error payload for a failure.
    pub fn error(content_type: ContentType, error: &ScimError) -> Self {
        let payload = ErrorResponse::from(error);
        let body = match content_type.marshaller().marshal_error(&payload) {
            Ok(body) => body,
            Err(e) => {
                warn!("Failed to marshal error payload: {}", e);
                String::new()
            }
        };
        Self {
            status: payload.status_code(),
            content_type,
            body,
            etag: None,
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}
