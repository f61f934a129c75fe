//! Common test utilities for the directory-backed SCIM service.
//!
//! This module provides builders, fixtures and helpers for driving a
//! [`DirectoryResourceService`] over an in-memory directory through its
//! wire-level interface.

use scim_directory::config::ServiceConfig;
use scim_directory::directory::InMemoryDirectory;
use scim_directory::marshal::ContentType;
use scim_directory::service::{
    DirectoryResourceService, QueryParameters, ScimResponse, ServiceContext, ServiceRequest,
};
use serde_json::Value;
use std::sync::Arc;

pub mod builders;
pub mod fixtures;

/// DN under which the default mapping creates users.
pub const PEOPLE_DN: &str = "ou=People,dc=example,dc=com";

/// DN under which the default mapping creates groups.
pub const GROUPS_DN: &str = "ou=Groups,dc=example,dc=com";

pub type TestService = DirectoryResourceService<InMemoryDirectory>;

/// A service over an empty directory with the default configuration.
pub fn create_test_service() -> TestService {
    create_test_service_with_config(ServiceConfig::default())
}

pub fn create_test_service_with_config(config: ServiceConfig) -> TestService {
    let context = ServiceContext::builder()
        .with_config(config)
        .build()
        .expect("default service context should build");
    DirectoryResourceService::new(Arc::new(context), InMemoryDirectory::new())
}

/// The DN the default mapping gives a user.
pub fn user_dn(user_name: &str) -> String {
    format!("uid={},{}", user_name, PEOPLE_DN)
}

/// The DN the default mapping gives a group.
pub fn group_dn(name: &str) -> String {
    format!("cn={},{}", name, GROUPS_DN)
}

/// Create a resource from a JSON document and return the parsed response.
pub async fn create_json(service: &TestService, endpoint: &str, body: &Value) -> Value {
    let response = service
        .handle(&ServiceRequest::create(endpoint, body.to_string()))
        .await;
    assert_eq!(response.status, 201, "create failed: {}", response.body);
    parse_body(&response)
}

/// Run a JSON query and return the parsed list response.
pub async fn query_json(service: &TestService, endpoint: &str, query: QueryParameters) -> Value {
    let response = service.handle(&ServiceRequest::query(endpoint, query)).await;
    assert_eq!(response.status, 200, "query failed: {}", response.body);
    parse_body(&response)
}

pub fn parse_body(response: &ScimResponse) -> Value {
    assert_eq!(response.content_type, ContentType::Json);
    serde_json::from_str(&response.body).expect("response body should be JSON")
}

/// The `userName` of every resource in a JSON list response, in order.
pub fn user_names(list: &Value) -> Vec<String> {
    list["Resources"]
        .as_array()
        .map(|resources| {
            resources
                .iter()
                .filter_map(|r| r["userName"].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default()
}

/// Assert that a response carries the error payload for `status`.
#[macro_export]
macro_rules! assert_error_status {
    ($response:expr, $status:expr) => {{
        let response = &$response;
        assert_eq!(response.status, $status, "unexpected response: {}", response.body);
        let payload: serde_json::Value =
            serde_json::from_str(&response.body).expect("error payload should be JSON");
        assert_eq!(payload["Errors"][0]["code"], $status);
        assert!(payload["Errors"][0]["description"].is_string());
    }};
}
