//! Group membership: static members, dynamic (member URL) groups and the
//! derived `groups` attribute of users.

use crate::common::builders::{GroupBuilder, UserBuilder};
use crate::common::{
    TestService, create_json, create_test_service, group_dn, parse_body, query_json, user_dn,
};
use scim_directory::directory::{DirectoryAttribute, DirectoryReader, DirectoryWriter, Entry};
use scim_directory::service::{QueryParameters, ServiceRequest};
use serde_json::Value;

async fn seed_people(service: &TestService) {
    let alice = UserBuilder::new("alice").with_department("eng").build();
    let bob = UserBuilder::new("bob").with_department("ops").build();
    create_json(service, "Users", &alice).await;
    create_json(service, "Users", &bob).await;
}

async fn add_dynamic_group(service: &TestService, name: &str, member_url: &str) {
    let mut entry = Entry::new(group_dn(name));
    entry.add_attribute(DirectoryAttribute::from_strings("objectClass", ["top", "groupOfURLs"]));
    entry.add_attribute(DirectoryAttribute::from_strings("cn", [name]));
    entry.add_attribute(DirectoryAttribute::from_strings("memberURL", [member_url]));
    service.directory().add(entry).await.unwrap();
}

fn member_ids(resource: &Value, attribute: &str) -> Vec<String> {
    let mut ids: Vec<String> = resource[attribute]
        .as_array()
        .map(|values| {
            values
                .iter()
                .filter_map(|v| v["value"].as_str().map(str::to_string))
                .collect()
        })
        .unwrap_or_default();
    ids.sort();
    ids
}

#[tokio::test]
async fn test_group_members_are_unique_members() {
    let service = create_test_service();
    seed_people(&service).await;

    let body = GroupBuilder::new("admins")
        .with_member(&user_dn("alice"))
        .with_member(&user_dn("bob"))
        .build();
    let group = create_json(&service, "Groups", &body).await;
    assert_eq!(group["id"], group_dn("admins"));
    assert_eq!(member_ids(&group, "members"), vec![user_dn("alice"), user_dn("bob")]);

    let entry = service
        .directory()
        .get_entry(&group_dn("admins"), &[])
        .await
        .unwrap()
        .unwrap();
    assert!(entry.has_object_class("groupOfUniqueNames"));
    assert_eq!(entry.attribute_values("uniqueMember").len(), 2);
    assert!(!entry.has_attribute("member"));
}

#[tokio::test]
async fn test_replace_group_members() {
    let service = create_test_service();
    seed_people(&service).await;
    let body = GroupBuilder::new("admins")
        .with_member(&user_dn("alice"))
        .with_member(&user_dn("bob"))
        .build();
    create_json(&service, "Groups", &body).await;

    let body = GroupBuilder::new("admins").with_member(&user_dn("alice")).build();
    let response = service
        .handle(&ServiceRequest::replace("Groups", group_dn("admins"), body.to_string()))
        .await;
    assert_eq!(response.status, 200, "{}", response.body);
    assert_eq!(member_ids(&parse_body(&response), "members"), vec![user_dn("alice")]);

    let body = GroupBuilder::new("admins").build();
    let response = service
        .handle(&ServiceRequest::replace("Groups", group_dn("admins"), body.to_string()))
        .await;
    assert_eq!(response.status, 200);
    assert!(parse_body(&response).get("members").is_none());

    let entry = service
        .directory()
        .get_entry(&group_dn("admins"), &[])
        .await
        .unwrap()
        .unwrap();
    assert!(!entry.has_attribute("uniqueMember"));
}

#[tokio::test]
async fn test_group_of_names_members_are_read() {
    let service = create_test_service();
    seed_people(&service).await;

    let mut entry = Entry::new(group_dn("legacy"));
    entry.add_attribute(DirectoryAttribute::from_strings("objectClass", ["top", "groupOfNames"]));
    entry.add_attribute(DirectoryAttribute::from_strings("cn", ["legacy"]));
    entry.add_attribute(DirectoryAttribute::from_strings("member", [user_dn("bob")]));
    service.directory().add(entry).await.unwrap();

    let response = service.handle(&ServiceRequest::get("Groups", group_dn("legacy"))).await;
    assert_eq!(response.status, 200);
    let group = parse_body(&response);
    assert_eq!(group["displayName"], "legacy");
    assert_eq!(member_ids(&group, "members"), vec![user_dn("bob")]);
}

#[tokio::test]
async fn test_dynamic_group_members() {
    let service = create_test_service();
    seed_people(&service).await;
    add_dynamic_group(
        &service,
        "engineers",
        "ldap:///ou=People,dc=example,dc=com??sub?(departmentNumber=eng)",
    )
    .await;

    let response = service.handle(&ServiceRequest::get("Groups", group_dn("engineers"))).await;
    assert_eq!(response.status, 200, "{}", response.body);
    assert_eq!(member_ids(&parse_body(&response), "members"), vec![user_dn("alice")]);
}

#[tokio::test]
async fn test_user_groups_are_derived() {
    let service = create_test_service();
    seed_people(&service).await;
    let body = GroupBuilder::new("admins").with_member(&user_dn("bob")).build();
    create_json(&service, "Groups", &body).await;
    add_dynamic_group(
        &service,
        "engineers",
        "ldap:///ou=People,dc=example,dc=com??sub?(departmentNumber=eng)",
    )
    .await;
    add_dynamic_group(&service, "everyone", "ldap:///ou=People,dc=example,dc=com??one").await;

    let response = service.handle(&ServiceRequest::get("Users", user_dn("alice"))).await;
    let alice = parse_body(&response);
    assert_eq!(
        member_ids(&alice, "groups"),
        vec![group_dn("engineers"), group_dn("everyone")]
    );

    let response = service.handle(&ServiceRequest::get("Users", user_dn("bob"))).await;
    let bob = parse_body(&response);
    assert_eq!(member_ids(&bob, "groups"), vec![group_dn("admins"), group_dn("everyone")]);
    let admins = bob["groups"]
        .as_array()
        .unwrap()
        .iter()
        .find(|g| g["value"] == group_dn("admins"))
        .unwrap();
    assert_eq!(admins["display"], "admins");
}

#[tokio::test]
async fn test_derived_groups_are_not_written() {
    let service = create_test_service();
    let body = UserBuilder::new("carol")
        .with_attribute(
            "groups",
            serde_json::json!([{ "value": "cn=admins,ou=Groups,dc=example,dc=com" }]),
        )
        .build();
    create_json(&service, "Users", &body).await;

    let entry = service
        .directory()
        .get_entry(&user_dn("carol"), &[])
        .await
        .unwrap()
        .unwrap();
    assert!(!entry.has_attribute("memberOf"));
    assert!(!entry.has_attribute("groups"));
}

#[tokio::test]
async fn test_query_groups() {
    let service = create_test_service();
    seed_people(&service).await;
    let body = GroupBuilder::new("admins").with_member(&user_dn("alice")).build();
    create_json(&service, "Groups", &body).await;
    create_json(&service, "Groups", &GroupBuilder::new("auditors").build()).await;
    add_dynamic_group(&service, "everyone", "ldap:///ou=People,dc=example,dc=com??sub").await;

    let list = query_json(&service, "Groups", QueryParameters::default()).await;
    assert_eq!(list["totalResults"], 3);

    let query =
        QueryParameters::default().with_filter(format!(r#"members eq "{}""#, user_dn("alice")));
    let list = query_json(&service, "Groups", query).await;
    assert_eq!(list["totalResults"], 1);
    assert_eq!(list["Resources"][0]["displayName"], "admins");

    let query = QueryParameters::default()
        .with_filter(r#"displayName sw "a""#)
        .with_sort("displayName", Some("descending"));
    let list = query_json(&service, "Groups", query).await;
    assert_eq!(list["Resources"][0]["displayName"], "auditors");
    assert_eq!(list["Resources"][1]["displayName"], "admins");
}
