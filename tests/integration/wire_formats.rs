//! JSON and XML documents through the service, and marshalling round trips.

use crate::common::fixtures::scim_examples;
use crate::common::{create_json, create_test_service, parse_body, user_dn};
use proptest::prelude::*;
use scim_directory::marshal::{ContentType, JsonMarshaller, Marshaller, SchemaPolicy, XmlMarshaller};
use scim_directory::resource::UserResource;
use scim_directory::resource::value_objects::{Entry, Name};
use scim_directory::schema::SchemaRegistry;
use scim_directory::service::{QueryParameters, ServiceRequest};

#[tokio::test]
async fn test_xml_create_then_json_read() {
    let service = create_test_service();
    let response = service
        .handle(
            &ServiceRequest::create("Users", scim_examples::user_xml())
                .with_content_type(ContentType::Xml),
        )
        .await;
    assert_eq!(response.status, 201, "{}", response.body);
    assert_eq!(response.content_type, ContentType::Xml);
    assert!(response.body.starts_with("<?xml"));
    assert!(response.body.contains("<scim:userName>bjensen</scim:userName>"));
    assert!(response.body.contains(r#"xmlns:ns1="urn:scim:schemas:extension:enterprise:1.0""#));
    assert!(response.body.contains("<ns1:employeeNumber>701984</ns1:employeeNumber>"));
    assert!(response.body.contains("<scim:emails><scim:email>"));

    let response = service.handle(&ServiceRequest::get("Users", user_dn("bjensen"))).await;
    let user = parse_body(&response);
    assert_eq!(user["name"]["formatted"], "Ms. Barbara J Jensen III");
    assert_eq!(user["emails"][0]["value"], "bjensen@example.com");
    assert_eq!(user["urn:scim:schemas:extension:enterprise:1.0"]["employeeNumber"], "701984");
    assert_eq!(
        user["schemas"],
        serde_json::json!([
            "urn:scim:schemas:core:1.0",
            "urn:scim:schemas:extension:enterprise:1.0"
        ])
    );
}

#[tokio::test]
async fn test_xml_query_list() {
    let service = create_test_service();
    create_json(&service, "Users", &scim_examples::user_full()).await;

    let request = ServiceRequest::query(
        "Users",
        QueryParameters::default().with_filter(r#"userName eq "bjensen""#),
    )
    .with_content_type(ContentType::Xml);
    let response = service.handle(&request).await;
    assert_eq!(response.status, 200);

    let descriptor = service.context().schemas().user_descriptor().unwrap().clone();
    let list = ContentType::Xml
        .unmarshaller(SchemaPolicy::Strict)
        .unmarshal_list(&descriptor, &response.body)
        .unwrap();
    assert_eq!(list.total_results, 1);
    assert_eq!(list.start_index, 1);
    assert_eq!(list.resources.len(), 1);
    let user = UserResource::from_object(descriptor, list.resources[0].clone());
    assert_eq!(user.user_name().unwrap().as_deref(), Some("bjensen"));
}

#[tokio::test]
async fn test_error_payloads_in_both_formats() {
    let service = create_test_service();

    let response = service.handle(&ServiceRequest::get("Users", user_dn("ghost"))).await;
    let payload = ContentType::Json
        .unmarshaller(SchemaPolicy::Strict)
        .unmarshal_error(&response.body)
        .unwrap();
    assert_eq!(payload.status_code(), 404);
    assert!(payload.errors[0].description.as_deref().unwrap().contains("ghost"));

    let response = service
        .handle(&ServiceRequest::create("Users", "<scim:User").with_content_type(ContentType::Xml))
        .await;
    assert_eq!(response.status, 400);
    assert_eq!(response.content_type, ContentType::Xml);
    let payload = ContentType::Xml
        .unmarshaller(SchemaPolicy::Strict)
        .unmarshal_error(&response.body)
        .unwrap();
    assert_eq!(payload.status_code(), 400);
}

#[tokio::test]
async fn test_resource_type_mismatch_in_xml() {
    let service = create_test_service();
    let body = r#"<scim:Group xmlns:scim="urn:scim:schemas:core:1.0">
        <scim:displayName>admins</scim:displayName>
    </scim:Group>"#;
    let response = service
        .handle(&ServiceRequest::create("Users", body).with_content_type(ContentType::Xml))
        .await;
    assert_eq!(response.status, 400);
    assert!(service.directory().is_empty().await);
}

fn sample_user(user_name: &str, formatted: &str, emails: &[String]) -> UserResource {
    let registry = SchemaRegistry::with_embedded_descriptors().unwrap();
    let mut user = UserResource::new(registry.user_descriptor().unwrap().clone());
    user.set_user_name(user_name).unwrap();
    user.set_name(&Name {
        formatted: Some(formatted.to_string()),
        ..Name::default()
    })
    .unwrap();
    if !emails.is_empty() {
        let entries: Vec<Entry<String>> = emails
            .iter()
            .map(|e| Entry::new(e.clone()).with_type("work"))
            .collect();
        user.set_emails(&entries).unwrap();
    }
    user
}

proptest! {
    #[test]
    fn test_marshalling_round_trips(
        user_name in "[a-z][a-z0-9._-]{0,15}",
        formatted in " {0,2}[ A-Za-z0-9&<>'\".,-]{1,20} {0,2}",
        emails in proptest::collection::vec("[a-z]{1,8}@[a-z]{1,8}\\.com", 0..4),
    ) {
        let user = sample_user(&user_name, &formatted, &emails);
        let descriptor = user.base().descriptor().clone();
        let object = user.base().object();

        let marshallers: [(&dyn Marshaller, ContentType); 2] =
            [(&JsonMarshaller, ContentType::Json), (&XmlMarshaller, ContentType::Xml)];
        for (marshaller, content_type) in marshallers {
            let document = marshaller.marshal_resource(&descriptor, object).unwrap();
            let decoded = content_type
                .unmarshaller(SchemaPolicy::Strict)
                .unmarshal_resource(&descriptor, &document)
                .unwrap();
            prop_assert_eq!(&decoded, object, "{} document: {}", content_type, document);
        }
    }
}
