//! Strict and tolerant handling of undeclared schemas and attributes.

use crate::assert_error_status;
use crate::common::builders::UserBuilder;
use crate::common::{create_test_service, create_test_service_with_config, parse_body};
use scim_directory::config::ServiceConfig;
use scim_directory::marshal::{ContentType, SchemaPolicy};
use scim_directory::schema::SchemaRegistry;
use scim_directory::service::ServiceRequest;
use serde_json::json;

fn tolerant() -> ServiceConfig {
    ServiceConfig::builder()
        .with_schema_policy(SchemaPolicy::Tolerant)
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_unknown_attribute() {
    let body = UserBuilder::new("bjensen")
        .with_attribute("favouriteColour", json!("teal"))
        .build()
        .to_string();

    let strict = create_test_service();
    let response = strict.handle(&ServiceRequest::create("Users", body.clone())).await;
    assert_error_status!(response, 400);
    assert!(strict.directory().is_empty().await);

    let tolerant = create_test_service_with_config(tolerant());
    let response = tolerant.handle(&ServiceRequest::create("Users", body)).await;
    assert_eq!(response.status, 201, "{}", response.body);
    let user = parse_body(&response);
    assert_eq!(user["userName"], "bjensen");
    assert!(user.get("favouriteColour").is_none());
}

#[tokio::test]
async fn test_unknown_schema() {
    let body = json!({
        "schemas": ["urn:scim:schemas:core:1.0", "urn:example:custom:1.0"],
        "userName": "bjensen",
        "urn:example:custom:1.0": { "badge": "42" }
    })
    .to_string();

    let strict = create_test_service();
    let response = strict.handle(&ServiceRequest::create("Users", body.clone())).await;
    assert_error_status!(response, 400);

    let tolerant = create_test_service_with_config(tolerant());
    let response = tolerant.handle(&ServiceRequest::create("Users", body)).await;
    assert_eq!(response.status, 201, "{}", response.body);
    let user = parse_body(&response);
    assert_eq!(user["schemas"], json!(["urn:scim:schemas:core:1.0"]));
}

#[tokio::test]
async fn test_unknown_xml_namespace() {
    let body = r#"<scim:User xmlns:scim="urn:scim:schemas:core:1.0" xmlns:x="urn:example:custom:1.0">
        <scim:userName>bjensen</scim:userName>
        <x:badge>42</x:badge>
    </scim:User>"#;

    let strict = create_test_service();
    let response = strict
        .handle(&ServiceRequest::create("Users", body).with_content_type(ContentType::Xml))
        .await;
    assert_eq!(response.status, 400);

    let tolerant = create_test_service_with_config(tolerant());
    let response = tolerant
        .handle(&ServiceRequest::create("Users", body).with_content_type(ContentType::Xml))
        .await;
    assert_eq!(response.status, 201, "{}", response.body);
    assert!(!response.body.contains("badge"));
}

#[test]
fn test_policy_applies_to_sub_attributes() {
    let registry = SchemaRegistry::with_embedded_descriptors().unwrap();
    let descriptor = registry.user_descriptor().unwrap();
    let body = json!({
        "schemas": ["urn:scim:schemas:core:1.0"],
        "userName": "bjensen",
        "name": { "familyName": "Jensen", "nickname": "Babs" }
    })
    .to_string();

    let strict = ContentType::Json.unmarshaller(SchemaPolicy::Strict);
    assert!(strict.unmarshal_resource(descriptor, &body).is_err());

    let tolerant = ContentType::Json.unmarshaller(SchemaPolicy::Tolerant);
    let object = tolerant.unmarshal_resource(descriptor, &body).unwrap();
    let name = object
        .get_attribute("urn:scim:schemas:core:1.0", "name")
        .and_then(|a| a.singular_value())
        .unwrap();
    assert!(name.sub_attribute("familyName").is_some());
    assert!(name.sub_attribute("nickname").is_none());
}

#[test]
fn test_service_provider_config_advertises_policy() {
    let strict = create_test_service();
    assert_eq!(
        strict.context().service_provider_config().schema_policy,
        SchemaPolicy::Strict
    );

    let tolerant = create_test_service_with_config(tolerant());
    let document = serde_json::to_value(tolerant.context().service_provider_config()).unwrap();
    assert_eq!(document["schemaPolicy"], "tolerant");
    assert_eq!(document["filter"]["maxResults"], 100);
    assert_eq!(document["sort"]["supported"], true);
}
