//! Values that do not fit the shape their descriptor declares.

use scim_directory::marshal::{ContentType, SchemaPolicy};
use scim_directory::schema::SchemaRegistry;
use serde_json::json;

fn rejects_json(document: serde_json::Value) -> bool {
    let registry = SchemaRegistry::with_embedded_descriptors().unwrap();
    let descriptor = registry.user_descriptor().unwrap();
    ContentType::Json
        .unmarshaller(SchemaPolicy::Tolerant)
        .unmarshal_resource(descriptor, &document.to_string())
        .is_err()
}

fn rejects_xml(document: &str) -> bool {
    let registry = SchemaRegistry::with_embedded_descriptors().unwrap();
    let descriptor = registry.user_descriptor().unwrap();
    ContentType::Xml
        .unmarshaller(SchemaPolicy::Tolerant)
        .unmarshal_resource(descriptor, document)
        .is_err()
}

fn user(attribute: &str, value: serde_json::Value) -> serde_json::Value {
    let mut document = json!({ "schemas": ["urn:scim:schemas:core:1.0"], "userName": "bjensen" });
    document[attribute] = value;
    document
}

#[test]
fn test_json_shapes() {
    assert!(!rejects_json(user("active", json!(true))));

    // plural attribute given a single value
    assert!(rejects_json(user("emails", json!({ "value": "a@example.com" }))));
    // singular attribute given an array
    assert!(rejects_json(user("displayName", json!(["Babs", "Barbara"]))));
    // complex attribute given a simple value
    assert!(rejects_json(user("name", json!("Barbara Jensen"))));
    // plural complex values given as bare strings
    assert!(rejects_json(user("emails", json!(["a@example.com"]))));
    // simple attribute given an object
    assert!(rejects_json(user("title", json!({ "value": "Tour Guide" }))));
    // wrong simple types
    assert!(rejects_json(user("active", json!("maybe"))));
    assert!(rejects_json(user("active", json!(1))));
    // sub-attribute given an array
    assert!(rejects_json(user("name", json!({ "familyName": ["Jensen"] }))));
}

#[test]
fn test_json_documents() {
    let registry = SchemaRegistry::with_embedded_descriptors().unwrap();
    let descriptor = registry.user_descriptor().unwrap();
    let unmarshaller = ContentType::Json.unmarshaller(SchemaPolicy::Strict);

    for document in ["", "[]", "not json", r#"{"schemas": "urn:scim:schemas:core:1.0"}"#] {
        assert!(
            unmarshaller.unmarshal_resource(descriptor, document).is_err(),
            "accepted: {}",
            document
        );
    }
}

#[test]
fn test_xml_shapes() {
    let wrap = |inner: &str| {
        format!(
            r#"<scim:User xmlns:scim="urn:scim:schemas:core:1.0"><scim:userName>bjensen</scim:userName>{}</scim:User>"#,
            inner
        )
    };

    assert!(!rejects_xml(&wrap("<scim:active>true</scim:active>")));
    assert!(!rejects_xml(&wrap(
        "<scim:emails><scim:email><scim:value>a@example.com</scim:value></scim:email></scim:emails>"
    )));

    // singular attribute repeated
    assert!(rejects_xml(&wrap("<scim:title>a</scim:title><scim:title>b</scim:title>")));
    // complex attribute given text
    assert!(rejects_xml(&wrap("<scim:name>Barbara Jensen</scim:name>")));
    // simple attribute given child elements
    assert!(rejects_xml(&wrap("<scim:title><scim:value>a</scim:value></scim:title>")));
    // wrong simple type
    assert!(rejects_xml(&wrap("<scim:active>maybe</scim:active>")));
}
