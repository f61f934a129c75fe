//! Filtering, sorting, pagination and result limits.

use crate::assert_error_status;
use crate::common::builders::UserBuilder;
use crate::common::{
    TestService, create_json, create_test_service, create_test_service_with_config, query_json,
    user_names,
};
use scim_directory::config::ServiceConfig;
use scim_directory::service::{QueryParameters, ServiceRequest};
use serde_json::Value;

/// Ten users `user01`..`user10`. Odd-numbered users have a work email and
/// belong to the `eng` department.
async fn seed_users(service: &TestService) -> Vec<Value> {
    let mut created = Vec::new();
    for i in 1..=10 {
        let user_name = format!("user{:02}", i);
        let mut builder = UserBuilder::new(&user_name)
            .with_name(&format!("User {}", i), &format!("Family{:02}", 11 - i), "User");
        if i % 2 == 1 {
            builder = builder
                .with_email(&format!("{}@example.com", user_name), Some("work"), true)
                .with_department("eng");
        } else {
            builder = builder.with_department("ops");
        }
        created.push(create_json(service, "Users", &builder.build()).await);
    }
    created
}

#[tokio::test]
async fn test_query_without_filter_returns_all() {
    let service = create_test_service();
    seed_users(&service).await;

    let list = query_json(&service, "Users", QueryParameters::default()).await;
    assert_eq!(list["totalResults"], 10);
    assert_eq!(list["startIndex"], 1);
    assert_eq!(list["itemsPerPage"], 10);
    assert_eq!(list["schemas"][0], "urn:scim:schemas:core:1.0");
    assert_eq!(list["Resources"].as_array().unwrap().len(), 10);
}

#[tokio::test]
async fn test_pagination() {
    let service = create_test_service();
    seed_users(&service).await;

    let query = QueryParameters::default().with_sort("userName", None).with_page(1, 3);
    let list = query_json(&service, "Users", query).await;
    assert_eq!(list["totalResults"], 10);
    assert_eq!(list["itemsPerPage"], 3);
    assert_eq!(user_names(&list), vec!["user01", "user02", "user03"]);

    let query = QueryParameters::default().with_sort("userName", None).with_page(10, 3);
    let list = query_json(&service, "Users", query).await;
    assert_eq!(user_names(&list), vec!["user10"]);
    assert_eq!(list["startIndex"], 10);

    let query = QueryParameters::default().with_sort("userName", None).with_page(11, 3);
    let list = query_json(&service, "Users", query).await;
    assert_eq!(list["totalResults"], 10);
    assert_eq!(list["itemsPerPage"], 0);
    assert!(user_names(&list).is_empty());
}

#[tokio::test]
async fn test_default_page_size() {
    let config = ServiceConfig::builder().with_default_page_size(4).build().unwrap();
    let service = create_test_service_with_config(config);
    seed_users(&service).await;

    let list = query_json(
        &service,
        "Users",
        QueryParameters::default().with_sort("userName", None),
    )
    .await;
    assert_eq!(list["totalResults"], 10);
    assert_eq!(user_names(&list), vec!["user01", "user02", "user03", "user04"]);

    // An explicit count wins over the default.
    let query = QueryParameters::default().with_sort("userName", None).with_page(1, 6);
    let list = query_json(&service, "Users", query).await;
    assert_eq!(list["itemsPerPage"], 6);
}

#[tokio::test]
async fn test_max_results_truncates() {
    let config = ServiceConfig::builder().with_max_results(3).build().unwrap();
    let service = create_test_service_with_config(config);
    seed_users(&service).await;

    let list = query_json(&service, "Users", QueryParameters::default()).await;
    assert_eq!(list["totalResults"], 3);
    assert_eq!(list["Resources"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_filter_present_on_plural_attribute() {
    let service = create_test_service();
    seed_users(&service).await;

    let query = QueryParameters::default().with_filter("emails pr").with_sort("userName", None);
    let list = query_json(&service, "Users", query).await;
    assert_eq!(list["totalResults"], 5);
    assert_eq!(
        user_names(&list),
        vec!["user01", "user03", "user05", "user07", "user09"]
    );
}

#[tokio::test]
async fn test_filter_operators() {
    let service = create_test_service();
    seed_users(&service).await;

    let cases = [
        (r#"userName eq "USER04""#, 1),
        (r#"userName sw "user0""#, 9),
        (r#"emails co "03@""#, 1),
        (r#"name.familyName gt "Family05""#, 5),
        (r#"name.familyName le "Family05""#, 5),
        (r#"userName eq "user01" or userName eq "user02""#, 2),
        (r#"emails pr and name.familyName lt "Family05""#, 2),
        (r#"urn:scim:schemas:extension:enterprise:1.0:department eq "ops""#, 5),
    ];
    for (filter, expected) in cases {
        let list =
            query_json(&service, "Users", QueryParameters::default().with_filter(filter)).await;
        assert_eq!(list["totalResults"], expected, "filter: {}", filter);
    }
}

#[tokio::test]
async fn test_filter_on_meta_created() {
    let service = create_test_service();
    let created = seed_users(&service).await;
    let cutoff = created[6]["meta"]["created"].as_str().unwrap();

    let query = QueryParameters::default()
        .with_filter(format!(r#"meta.created gt "{}""#, cutoff))
        .with_sort("meta.created", None);
    let list = query_json(&service, "Users", query).await;
    assert_eq!(user_names(&list), vec!["user08", "user09", "user10"]);

    let query = QueryParameters::default().with_filter(r#"meta.created gt "2999-01-01T00:00:00Z""#);
    let list = query_json(&service, "Users", query).await;
    assert_eq!(list["totalResults"], 0);
}

#[tokio::test]
async fn test_sort_descending() {
    let service = create_test_service();
    seed_users(&service).await;

    let query = QueryParameters::default()
        .with_sort("name.familyName", Some("descending"))
        .with_page(1, 2);
    let list = query_json(&service, "Users", query).await;
    // familyName runs opposite to userName
    assert_eq!(user_names(&list), vec!["user01", "user02"]);
}

#[tokio::test]
async fn test_query_attributes() {
    let service = create_test_service();
    seed_users(&service).await;

    let query = QueryParameters::default()
        .with_filter(r#"userName eq "user03""#)
        .with_attributes("userName,emails.value");
    let list = query_json(&service, "Users", query).await;
    let user = &list["Resources"][0];
    assert_eq!(user["userName"], "user03");
    assert_eq!(user["emails"][0]["value"], "user03@example.com");
    assert!(user["emails"][0].get("type").is_none());
    assert!(user.get("name").is_none());
    assert!(user.get("id").is_none());
}

#[tokio::test]
async fn test_invalid_queries() {
    let service = create_test_service();
    seed_users(&service).await;

    let invalid = [
        QueryParameters::default().with_filter("userName eq"),
        QueryParameters::default().with_filter(r#"userName zz "x""#),
        QueryParameters::default().with_filter(r#"nickName eq "x""#),
        QueryParameters::default().with_filter(r#"groups.value eq "cn=x""#),
        QueryParameters::default().with_filter(r#"meta.created gt "yesterday""#),
        QueryParameters::default().with_sort("userName", Some("sideways")),
        QueryParameters::default().with_sort("emails", None),
    ];
    for query in invalid {
        let response = service.handle(&ServiceRequest::query("Users", query.clone())).await;
        assert_error_status!(response, 400);
    }
}
