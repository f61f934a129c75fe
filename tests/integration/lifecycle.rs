//! Create, read, replace and delete through the wire-level interface.

use crate::assert_error_status;
use crate::common::builders::{ENTERPRISE_SCHEMA, UserBuilder};
use crate::common::fixtures::scim_examples;
use crate::common::{create_json, create_test_service, parse_body, user_dn};
use futures::future::join_all;
use scim_directory::directory::DirectoryReader;
use scim_directory::service::ServiceRequest;
use serde_json::json;

#[tokio::test]
async fn test_create_user_writes_directory_entry() {
    let service = create_test_service();
    let body = UserBuilder::new("jdoe")
        .with_name("John C. Doe", "Doe", "John")
        .with_email("jdoe@example.com", None, true)
        .build();

    let created = create_json(&service, "Users", &body).await;
    assert_eq!(created["id"], user_dn("jdoe"));
    assert_eq!(created["userName"], "jdoe");
    assert_eq!(created["name"]["formatted"], "John C. Doe");
    assert_eq!(created["emails"][0]["value"], "jdoe@example.com");
    assert!(created["meta"]["created"].is_string());
    assert!(created["meta"]["version"].is_string());
    assert_eq!(
        created["meta"]["location"],
        format!("https://localhost/v1/Users/{}", user_dn("jdoe"))
    );

    let entry = service
        .directory()
        .get_entry(&user_dn("jdoe"), &[])
        .await
        .unwrap()
        .expect("entry should exist");
    assert_eq!(entry.attribute_value("cn").as_deref(), Some("John C. Doe"));
    assert_eq!(entry.attribute_value("sn").as_deref(), Some("Doe"));
    assert_eq!(entry.attribute_value("givenName").as_deref(), Some("John"));
    assert_eq!(entry.attribute_value("mail").as_deref(), Some("jdoe@example.com"));
    assert!(entry.has_object_class("inetOrgPerson"));
}

#[tokio::test]
async fn test_create_full_user_round_trips() {
    let service = create_test_service();
    let created = create_json(&service, "Users", &scim_examples::user_full()).await;

    assert_eq!(created["displayName"], "Babs Jensen");
    assert_eq!(created["title"], "Tour Guide");
    assert_eq!(created[ENTERPRISE_SCHEMA]["employeeNumber"], "701984");
    assert_eq!(created[ENTERPRISE_SCHEMA]["department"], "Tour Operations");
    assert_eq!(created["addresses"][0]["locality"], "Hollywood");

    // Only the work email has a directory attribute.
    let emails = created["emails"].as_array().unwrap();
    assert_eq!(emails.len(), 1);
    assert_eq!(emails[0]["value"], "bjensen@example.com");
    assert_eq!(emails[0]["type"], "work");

    let phones = created["phoneNumbers"].as_array().unwrap();
    assert_eq!(phones.len(), 2);

    let entry = service
        .directory()
        .get_entry(&user_dn("bjensen"), &[])
        .await
        .unwrap()
        .unwrap();
    assert_eq!(entry.attribute_value("departmentNumber").as_deref(), Some("Tour Operations"));
    assert_eq!(entry.attribute_value("o").as_deref(), Some("Universal Studios"));
    assert_eq!(entry.attribute_value("mobile").as_deref(), Some("+1 555 555 4444"));
    assert!(!entry.attribute_values("mail").contains(&"babs@jensen.org".to_string()));
}

#[tokio::test]
async fn test_partial_read_returns_requested_attributes() {
    let service = create_test_service();
    create_json(&service, "Users", &scim_examples::user_full()).await;

    let response = service
        .handle(
            &ServiceRequest::get("Users", user_dn("bjensen"))
                .with_attributes("name.familyName,emails"),
        )
        .await;
    assert_eq!(response.status, 200);
    let user = parse_body(&response);

    assert_eq!(user["name"]["familyName"], "Jensen");
    assert!(user["name"].get("givenName").is_none());
    assert_eq!(user["emails"][0]["value"], "bjensen@example.com");
    assert!(user.get("userName").is_none());
    assert!(user.get("id").is_none());
    assert!(user.get("meta").is_none());
}

#[tokio::test]
async fn test_create_duplicate_is_conflict() {
    let service = create_test_service();
    let body = scim_examples::user_minimal();
    create_json(&service, "Users", &body).await;

    let response = service.handle(&ServiceRequest::create("Users", body.to_string())).await;
    assert_error_status!(response, 409);
}

#[tokio::test]
async fn test_create_without_user_name_is_rejected() {
    let service = create_test_service();
    let body = UserBuilder::new("ignored").without("userName").with_display_name("Nobody").build();

    let response = service.handle(&ServiceRequest::create("Users", body.to_string())).await;
    assert_error_status!(response, 400);
    assert!(service.directory().is_empty().await);
}

#[tokio::test]
async fn test_missing_resources() {
    let service = create_test_service();

    let response = service.handle(&ServiceRequest::get("Users", user_dn("nobody"))).await;
    assert_error_status!(response, 404);

    let response = service.handle(&ServiceRequest::delete("Users", user_dn("nobody"))).await;
    assert_error_status!(response, 404);

    let body = scim_examples::user_minimal().to_string();
    let response = service
        .handle(&ServiceRequest::replace("Users", user_dn("bjensen"), body))
        .await;
    assert_error_status!(response, 404);
}

#[tokio::test]
async fn test_group_id_is_not_a_user() {
    let service = create_test_service();
    let group = create_json(&service, "Groups", &scim_examples::group_basic()).await;
    let group_id = group["id"].as_str().unwrap();

    let response = service.handle(&ServiceRequest::get("Users", group_id)).await;
    assert_error_status!(response, 404);
}

#[tokio::test]
async fn test_replace_updates_and_clears_attributes() {
    let service = create_test_service();
    let created = create_json(&service, "Users", &scim_examples::user_full()).await;
    let id = created["id"].as_str().unwrap();

    let replacement = UserBuilder::new("bjensen")
        .with_name("Barbara Jensen", "Jensen", "Barbara")
        .with_email("barbara@example.com", Some("work"), true)
        .with_employee_number("701984")
        .build();
    let response = service
        .handle(&ServiceRequest::replace("Users", id, replacement.to_string()))
        .await;
    assert_eq!(response.status, 200, "{}", response.body);
    let replaced = parse_body(&response);
    assert_eq!(replaced["name"]["formatted"], "Barbara Jensen");
    assert_eq!(replaced["emails"][0]["value"], "barbara@example.com");
    assert!(replaced.get("displayName").is_none());
    assert!(replaced.get("phoneNumbers").is_none());
    assert!(replaced[ENTERPRISE_SCHEMA].get("department").is_none());

    let entry = service.directory().get_entry(id, &[]).await.unwrap().unwrap();
    assert_eq!(entry.attribute_values("mail"), vec!["barbara@example.com".to_string()]);
    assert!(!entry.has_attribute("displayName"));
    assert!(!entry.has_attribute("telephoneNumber"));
    assert!(!entry.has_attribute("departmentNumber"));
}

#[tokio::test]
async fn test_replace_with_same_content_is_idempotent() {
    let service = create_test_service();
    let body = scim_examples::user_full();
    let created = create_json(&service, "Users", &body).await;
    let id = created["id"].as_str().unwrap();
    let before = service.directory().get_entry(id, &[]).await.unwrap().unwrap();

    let response = service
        .handle(&ServiceRequest::replace("Users", id, body.to_string()))
        .await;
    assert_eq!(response.status, 200);
    assert_eq!(response.etag.as_deref(), created["meta"]["version"].as_str());

    let after = service.directory().get_entry(id, &[]).await.unwrap().unwrap();
    assert_eq!(before, after);
}

#[tokio::test]
async fn test_replace_checks_expected_version() {
    let service = create_test_service();
    let created = create_json(&service, "Users", &scim_examples::user_minimal()).await;
    let id = created["id"].as_str().unwrap();
    let version = created["meta"]["version"].as_str().unwrap().to_string();

    let changed = UserBuilder::new("bjensen").with_display_name("Babs").build().to_string();
    let response = service
        .handle(
            &ServiceRequest::replace("Users", id, changed.clone())
                .with_expected_version("W/\"stale\""),
        )
        .await;
    assert_error_status!(response, 409);

    let response = service
        .handle(
            &ServiceRequest::replace("Users", id, changed.clone())
                .with_expected_version(version.clone()),
        )
        .await;
    assert_eq!(response.status, 200);
    let new_version = response.etag.clone().unwrap();
    assert_ne!(new_version, version);

    // The old version is now stale.
    let response = service
        .handle(&ServiceRequest::replace("Users", id, changed).with_expected_version(version))
        .await;
    assert_error_status!(response, 409);
}

#[tokio::test]
async fn test_rename_is_rejected() {
    let service = create_test_service();
    let created = create_json(&service, "Users", &scim_examples::user_minimal()).await;
    let id = created["id"].as_str().unwrap();

    let renamed = json!({ "schemas": ["urn:scim:schemas:core:1.0"], "userName": "babs" });
    let response = service
        .handle(&ServiceRequest::replace("Users", id, renamed.to_string()))
        .await;
    assert_error_status!(response, 400);
    assert!(service.directory().get_entry(id, &[]).await.unwrap().is_some());
}

#[tokio::test]
async fn test_delete_removes_entry() {
    let service = create_test_service();
    let created = create_json(&service, "Users", &scim_examples::user_minimal()).await;
    let id = created["id"].as_str().unwrap();

    let response = service.handle(&ServiceRequest::delete("Users", id)).await;
    assert_eq!(response.status, 200);
    assert!(response.body.is_empty());
    assert!(service.directory().get_entry(id, &[]).await.unwrap().is_none());

    let response = service.handle(&ServiceRequest::get("Users", id)).await;
    assert_error_status!(response, 404);
}

#[tokio::test]
async fn test_concurrent_creates() {
    let service = create_test_service();

    let distinct = (0..20).map(|i| UserBuilder::new(&format!("user{}", i)).build().to_string());
    let requests: Vec<ServiceRequest> = distinct
        .map(|body| ServiceRequest::create("Users", body))
        .collect();
    let responses = join_all(requests.iter().map(|r| service.handle(r))).await;
    assert!(responses.iter().all(|r| r.status == 201));
    assert_eq!(service.directory().len().await, 20);

    let body = UserBuilder::new("contested").build().to_string();
    let requests: Vec<ServiceRequest> = (0..5)
        .map(|_| ServiceRequest::create("Users", body.clone()))
        .collect();
    let responses = join_all(requests.iter().map(|r| service.handle(r))).await;
    assert_eq!(responses.iter().filter(|r| r.status == 201).count(), 1);
    assert_eq!(responses.iter().filter(|r| r.status == 409).count(), 4);
}
