//! Replacing the mapping configuration of a running service.

use crate::assert_error_status;
use crate::common::builders::UserBuilder;
use crate::common::fixtures::read_only_mapping;
use crate::common::{create_json, create_test_service, query_json, user_dn};
use scim_directory::config::MappingConfig;
use scim_directory::service::{QueryParameters, ServiceRequest};
use std::time::Duration;

#[tokio::test]
async fn test_read_only_mapping() {
    let service = create_test_service();
    let body = UserBuilder::new("bjensen").with_name("Barbara Jensen", "Jensen", "Barbara").build();
    create_json(&service, "Users", &body).await;

    let mapping = MappingConfig::from_json_str(read_only_mapping()).unwrap();
    service.context().reconfigure(&mapping).await.unwrap();

    let list = query_json(&service, "Users", QueryParameters::default()).await;
    assert_eq!(list["totalResults"], 1);
    assert_eq!(list["Resources"][0]["displayName"], "Barbara Jensen");
    assert!(list["Resources"][0].get("name").is_none());

    let response = service
        .handle(&ServiceRequest::create("Users", UserBuilder::new("other").build().to_string()))
        .await;
    assert_error_status!(response, 501);

    let response = service.handle(&ServiceRequest::delete("Users", user_dn("bjensen"))).await;
    assert_error_status!(response, 501);

    let response = service
        .handle(&ServiceRequest::query("Groups", QueryParameters::default()))
        .await;
    assert_error_status!(response, 404);
}

#[tokio::test]
async fn test_invalid_mapping_keeps_current_table() {
    let service = create_test_service();
    let empty = MappingConfig { resources: vec![] };
    let broken = r#"{ "resources": [ { "resource": "Device", "searchBaseDn": "ou=Devices,dc=example,dc=com", "searchObjectClasses": ["device"], "attributes": [] } ] }"#;
    let broken = MappingConfig::from_json_str(broken).unwrap();

    assert!(service.context().reconfigure(&broken).await.is_err());
    create_json(&service, "Users", &UserBuilder::new("bjensen").build()).await;

    service.context().reconfigure(&empty).await.unwrap();
    let response = service.handle(&ServiceRequest::get("Users", user_dn("bjensen"))).await;
    assert_error_status!(response, 404);
}

#[tokio::test]
async fn test_new_base_dn_applies_to_new_requests() {
    let service = create_test_service();
    let mapping = MappingConfig::embedded_default()
        .unwrap()
        .with_base_dn_suffix("dc=example,dc=com", "dc=acme,dc=org");
    service.context().reconfigure(&mapping).await.unwrap();

    let created = create_json(&service, "Users", &UserBuilder::new("wile").build()).await;
    assert_eq!(created["id"], "uid=wile,ou=People,dc=acme,dc=org");
}

#[tokio::test]
async fn test_reconfigure_waits_for_running_requests() {
    let service = create_test_service();
    let context = service.context().clone();

    // A request in flight holds the current table.
    let in_flight = context.mappers().await;

    let swapping = {
        let context = context.clone();
        tokio::spawn(async move {
            let mapping = MappingConfig::from_json_str(read_only_mapping()).unwrap();
            context.reconfigure(&mapping).await
        })
    };

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!swapping.is_finished());
    // New requests already see the new table.
    let current = context.mappers().await;
    assert!(current.get("Group").is_none());
    drop(current);

    assert!(in_flight.get("Group").is_some());
    drop(in_flight);

    tokio::time::timeout(Duration::from_secs(5), swapping)
        .await
        .expect("reconfigure should finish once the old table is released")
        .unwrap()
        .unwrap();
}
