//! JSON wire format.

use super::{
    ContentType, ErrorResponse, ListResponse, Marshaller, SchemaPolicy, SchemaResolver,
    Unmarshaller, check_core_schema,
};
use crate::error::{ScimResult, ValidationError, ValidationResult};
use crate::resource::{AttributeValue, AttributeValues, ScimAttribute, ScimObject, SimpleValue};
use crate::schema::{AttributeDescriptor, AttributeType, ResourceDescriptor};

use log::trace;
use serde::ser::{SerializeMap, SerializeSeq, Serializer};
use serde::Serialize;
use serde_json::{Map, Value};

/// Writes SCIM objects as JSON.
///
/// Keys are written in a fixed order: `schemas`, then core attributes by
/// name, then one object per extension schema.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonMarshaller;

impl Marshaller for JsonMarshaller {
    fn content_type(&self) -> ContentType {
        ContentType::Json
    }

    fn marshal_resource(
        &self,
        descriptor: &ResourceDescriptor,
        object: &ScimObject,
    ) -> ScimResult<String> {
        check_core_schema(descriptor, object)?;
        let json = serde_json::to_string(&ResourceJson {
            object,
            include_schemas: true,
        })?;
        trace!("Marshalled resource: {}", json);
        Ok(json)
    }

    fn marshal_list(
        &self,
        descriptor: &ResourceDescriptor,
        list: &ListResponse,
    ) -> ScimResult<String> {
        for object in &list.resources {
            check_core_schema(descriptor, object)?;
        }
        Ok(serde_json::to_string(&ListJson(list))?)
    }

    fn marshal_error(&self, error: &ErrorResponse) -> ScimResult<String> {
        Ok(serde_json::to_string(error)?)
    }
}

struct ResourceJson<'a> {
    object: &'a ScimObject,
    include_schemas: bool,
}

impl Serialize for ResourceJson<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        if self.include_schemas {
            map.serialize_entry("schemas", &self.object.schemas())?;
        }
        let core = self.object.core_schema();
        for attribute in self.object.attributes(core) {
            map.serialize_entry(attribute.name(), &AttributeJson(attribute))?;
        }
        for schema in self.object.schemas() {
            if schema.eq_ignore_ascii_case(core)
                || self.object.attributes(schema).next().is_none()
            {
                continue;
            }
            map.serialize_entry(
                schema,
                &SchemaJson {
                    object: self.object,
                    schema,
                },
            )?;
        }
        map.end()
    }
}

struct SchemaJson<'a> {
    object: &'a ScimObject,
    schema: &'a str,
}

impl Serialize for SchemaJson<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        for attribute in self.object.attributes(self.schema) {
            map.serialize_entry(attribute.name(), &AttributeJson(attribute))?;
        }
        map.end()
    }
}

struct AttributeJson<'a>(&'a ScimAttribute);

impl Serialize for AttributeJson<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let descriptor = self.0.descriptor();
        match self.0.values() {
            AttributeValues::Singular(value) => {
                ValueJson { descriptor, value }.serialize(serializer)
            }
            AttributeValues::Plural(values) => {
                let mut seq = serializer.serialize_seq(Some(values.len()))?;
                for value in values {
                    seq.serialize_element(&ValueJson { descriptor, value })?;
                }
                seq.end()
            }
        }
    }
}

struct ValueJson<'a> {
    descriptor: &'a AttributeDescriptor,
    value: &'a AttributeValue,
}

impl Serialize for ValueJson<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.value {
            AttributeValue::Simple(simple) => match (self.descriptor.effective_type(), simple) {
                (AttributeType::Boolean, SimpleValue::Boolean(b)) => serializer.serialize_bool(*b),
                (AttributeType::Integer, SimpleValue::Integer(i)) => serializer.serialize_i64(*i),
                _ => serializer.serialize_str(&simple.string_value()),
            },
            AttributeValue::Complex(_) => {
                let mut map = serializer.serialize_map(None)?;
                for sub in self.value.sub_attributes() {
                    map.serialize_entry(sub.name(), &AttributeJson(sub))?;
                }
                map.end()
            }
        }
    }
}

struct ListJson<'a>(&'a ListResponse);

impl Serialize for ListJson<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let list = self.0;
        let mut map = serializer.serialize_map(Some(5))?;
        map.serialize_entry("totalResults", &list.total_results)?;
        map.serialize_entry("itemsPerPage", &list.items_per_page())?;
        map.serialize_entry("startIndex", &list.start_index)?;
        map.serialize_entry("schemas", &list.schemas())?;
        let resources: Vec<ResourceJson<'_>> = list
            .resources
            .iter()
            .map(|object| ResourceJson {
                object,
                include_schemas: false,
            })
            .collect();
        map.serialize_entry("Resources", &resources)?;
        map.end()
    }
}

/// Reads SCIM objects from JSON.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonUnmarshaller {
    policy: SchemaPolicy,
}

impl JsonUnmarshaller {
    pub fn new(policy: SchemaPolicy) -> Self {
        Self { policy }
    }

    fn decode_object(
        &self,
        resolver: &SchemaResolver<'_>,
        map: &Map<String, Value>,
    ) -> ValidationResult<ScimObject> {
        let core = resolver.core_schema();
        let mut object = ScimObject::new(core);

        if let Some(schemas) = map.get("schemas") {
            let uris = schemas
                .as_array()
                .ok_or_else(|| ValidationError::malformed("'schemas' must be an array"))?;
            for uri in uris {
                let uri = uri
                    .as_str()
                    .ok_or_else(|| ValidationError::malformed("'schemas' must hold strings"))?;
                resolver.schema(uri)?;
            }
        }

        for (key, value) in map {
            if key == "schemas" || value.is_null() {
                continue;
            }
            if key.contains(':') {
                let Some(schema) = resolver.schema(key)? else {
                    continue;
                };
                let attributes = value.as_object().ok_or_else(|| {
                    ValidationError::malformed(format!("'{}' must be an object of attributes", key))
                })?;
                for (name, value) in attributes {
                    if let Some(attribute) = decode_attribute(resolver, schema, name, value)? {
                        object.add_attribute(attribute);
                    }
                }
            } else if let Some(attribute) = decode_attribute(resolver, core, key, value)? {
                object.add_attribute(attribute);
            }
        }
        Ok(object)
    }
}

impl Unmarshaller for JsonUnmarshaller {
    fn content_type(&self) -> ContentType {
        ContentType::Json
    }

    fn unmarshal_resource(
        &self,
        descriptor: &ResourceDescriptor,
        payload: &str,
    ) -> ScimResult<ScimObject> {
        trace!("Unmarshalling {} from {}", descriptor.name, payload);
        let value: Value = serde_json::from_str(payload)?;
        let map = value
            .as_object()
            .ok_or_else(|| ValidationError::malformed("expected a JSON object"))?;
        let resolver = SchemaResolver::new(descriptor, self.policy);
        Ok(self.decode_object(&resolver, map)?)
    }

    fn unmarshal_list(
        &self,
        descriptor: &ResourceDescriptor,
        payload: &str,
    ) -> ScimResult<ListResponse> {
        let value: Value = serde_json::from_str(payload)?;
        let count = |key: &str| -> ValidationResult<Option<usize>> {
            match value.get(key) {
                None | Some(Value::Null) => Ok(None),
                Some(v) => v
                    .as_u64()
                    .map(|n| Some(n as usize))
                    .ok_or_else(|| {
                        ValidationError::malformed(format!("'{}' must be a number", key))
                    }),
            }
        };
        let resolver = SchemaResolver::new(descriptor, self.policy);

        let mut resources = Vec::new();
        if let Some(items) = value.get("Resources") {
            let items = items
                .as_array()
                .ok_or_else(|| ValidationError::malformed("'Resources' must be an array"))?;
            for item in items {
                let map = item
                    .as_object()
                    .ok_or_else(|| ValidationError::malformed("each resource must be an object"))?;
                resources.push(self.decode_object(&resolver, map)?);
            }
        }

        Ok(ListResponse {
            total_results: count("totalResults")?.unwrap_or(resources.len()),
            start_index: count("startIndex")?.unwrap_or(1),
            resources,
        })
    }

    fn unmarshal_error(&self, payload: &str) -> ScimResult<ErrorResponse> {
        Ok(serde_json::from_str(payload)?)
    }
}

fn decode_attribute(
    resolver: &SchemaResolver<'_>,
    schema: &str,
    name: &str,
    value: &Value,
) -> ValidationResult<Option<ScimAttribute>> {
    let Some(descriptor) = resolver.attribute(schema, name)? else {
        return Ok(None);
    };
    if value.is_null() {
        return Ok(None);
    }

    let attribute = if descriptor.multi_valued {
        let items = value.as_array().ok_or_else(|| ValidationError::ExpectedMultiValue {
            attribute: descriptor.name.clone(),
        })?;
        let values = items
            .iter()
            .map(|item| decode_complex(resolver, descriptor, item))
            .collect::<ValidationResult<Vec<_>>>()?;
        ScimAttribute::plural(descriptor.clone(), values)?
    } else if value.is_array() {
        return Err(ValidationError::ExpectedSingleValue {
            attribute: descriptor.name.clone(),
        });
    } else if descriptor.is_complex() {
        ScimAttribute::singular(descriptor.clone(), decode_complex(resolver, descriptor, value)?)?
    } else {
        ScimAttribute::simple(descriptor.clone(), decode_simple(descriptor, value)?)?
    };
    Ok(Some(attribute))
}

fn decode_complex(
    resolver: &SchemaResolver<'_>,
    descriptor: &AttributeDescriptor,
    value: &Value,
) -> ValidationResult<AttributeValue> {
    let map = value.as_object().ok_or_else(|| ValidationError::ExpectedComplexValue {
        attribute: descriptor.name.clone(),
    })?;
    let mut subs = Vec::new();
    for (name, value) in map {
        let Some(sub) = resolver.sub_attribute(descriptor, name)? else {
            continue;
        };
        if value.is_null() {
            continue;
        }
        if value.is_array() {
            return Err(ValidationError::ExpectedSingleValue {
                attribute: format!("{}.{}", descriptor.name, sub.name),
            });
        }
        let attribute = if sub.is_complex() {
            ScimAttribute::singular(sub.clone(), decode_complex(resolver, sub, value)?)?
        } else {
            ScimAttribute::simple(sub.clone(), decode_simple(sub, value)?)?
        };
        subs.push(attribute);
    }
    AttributeValue::complex(subs)
}

fn decode_simple(descriptor: &AttributeDescriptor, value: &Value) -> ValidationResult<SimpleValue> {
    let data_type = descriptor.effective_type();
    match (data_type, value) {
        (AttributeType::Boolean, Value::Bool(b)) => Ok(SimpleValue::Boolean(*b)),
        (AttributeType::Integer, Value::Number(n)) => {
            n.as_i64()
                .map(SimpleValue::Integer)
                .ok_or_else(|| ValidationError::InvalidIntegerValue {
                    attribute: descriptor.name.clone(),
                    value: n.to_string(),
                })
        }
        (_, Value::String(text)) => {
            SimpleValue::parse(descriptor.data_type, &descriptor.name, text)
        }
        (_, Value::Object(_)) => Err(ValidationError::ExpectedSimpleValue {
            attribute: descriptor.name.clone(),
        }),
        (expected, other) => Err(ValidationError::invalid_type(
            descriptor.name.clone(),
            expected.to_string(),
            json_kind(other),
        )),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ScimError;
    use crate::resource::value_objects::{Entry, Manager, Name};
    use crate::resource::{IntegerResolver, UserResource};
    use crate::schema::{SCHEMA_URI_CORE, SCHEMA_URI_ENTERPRISE_EXTENSION, SchemaRegistry};
    use std::sync::Arc;

    fn user_descriptor() -> Arc<ResourceDescriptor> {
        SchemaRegistry::with_embedded_descriptors()
            .unwrap()
            .user_descriptor()
            .unwrap()
            .clone()
    }

    fn sample_user() -> UserResource {
        let mut user = UserResource::new(user_descriptor());
        user.set_user_name("jdoe").unwrap();
        user.set_name(&Name {
            formatted: Some("John Doe".to_string()),
            family_name: Some("Doe".to_string()),
            given_name: Some("John".to_string()),
            ..Name::default()
        })
        .unwrap();
        user.set_active(true).unwrap();
        user.set_emails(&[Entry::new("j@x.com".to_string())
            .with_type("work")
            .with_primary(true)])
        .unwrap();
        user.set_manager(&Manager {
            manager_id: Some("uid=boss".to_string()),
            display_name: Some("The Boss".to_string()),
        })
        .unwrap();
        user
    }

    #[test]
    fn test_marshal_layout() {
        let descriptor = user_descriptor();
        let json = JsonMarshaller
            .marshal_resource(&descriptor, sample_user().base().object())
            .unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();

        assert_eq!(
            value["schemas"],
            serde_json::json!([SCHEMA_URI_CORE, SCHEMA_URI_ENTERPRISE_EXTENSION])
        );
        assert_eq!(value["userName"], "jdoe");
        assert_eq!(value["active"], true);
        assert_eq!(value["emails"][0]["primary"], true);
        assert_eq!(value["name"]["familyName"], "Doe");
        assert_eq!(value[SCHEMA_URI_ENTERPRISE_EXTENSION]["manager"]["managerId"], "uid=boss");
        assert!(json.starts_with("{\"schemas\""));
    }

    #[test]
    fn test_round_trip() {
        let descriptor = user_descriptor();
        let object = sample_user().into_object();
        let json = JsonMarshaller.marshal_resource(&descriptor, &object).unwrap();
        let read = JsonUnmarshaller::new(SchemaPolicy::Strict)
            .unmarshal_resource(&descriptor, &json)
            .unwrap();
        assert_eq!(read, object);
    }

    #[test]
    fn test_literals_follow_declared_type() {
        let descriptor = user_descriptor();
        let mut user = sample_user();
        let err = user
            .base_mut()
            .set_singular_attribute_value(SCHEMA_URI_CORE, "title", &IntegerResolver, &42)
            .unwrap_err();
        assert!(matches!(err, ValidationError::InvalidDataType { .. }));

        user.set_title("42").unwrap();
        user.set_user_name("true").unwrap();
        let json = JsonMarshaller
            .marshal_resource(&descriptor, user.base().object())
            .unwrap();
        assert!(json.contains(r#""title":"42""#));
        assert!(json.contains(r#""userName":"true""#));
        assert!(json.contains(r#""active":true"#));

        let read = JsonUnmarshaller::new(SchemaPolicy::Strict)
            .unmarshal_resource(&descriptor, &json)
            .unwrap();
        assert_eq!(&read, user.base().object());
    }

    #[test]
    fn test_object_of_other_core_schema_is_refused() {
        let descriptor = user_descriptor();
        let object = ScimObject::new("urn:example:core:2.0");
        assert!(JsonMarshaller.marshal_resource(&descriptor, &object).is_err());
    }

    #[test]
    fn test_strict_and_tolerant_policies() {
        let descriptor = user_descriptor();
        let payload = r#"{
            "schemas": ["urn:scim:schemas:core:1.0"],
            "userName": "jdoe",
            "shoeSize": 11,
            "name": { "givenName": "John", "nickname": "JJ" },
            "urn:example:unknown:1.0": { "x": 1 }
        }"#;

        let err = JsonUnmarshaller::new(SchemaPolicy::Strict)
            .unmarshal_resource(&descriptor, payload)
            .unwrap_err();
        assert!(matches!(err, ScimError::SchemaViolation(_)));
        assert_eq!(err.status_code(), 400);

        let object = JsonUnmarshaller::new(SchemaPolicy::Tolerant)
            .unmarshal_resource(&descriptor, payload)
            .unwrap();
        assert_eq!(object.attribute_count(), 2);
        let name = object.get_attribute(SCHEMA_URI_CORE, "name").unwrap();
        assert_eq!(name.singular_value().unwrap().sub_attributes().count(), 1);
    }

    #[test]
    fn test_cardinality_mismatches() {
        let descriptor = user_descriptor();
        let unmarshaller = JsonUnmarshaller::new(SchemaPolicy::Strict);

        for payload in [
            r#"{"emails": {"value": "j@x.com"}}"#,
            r#"{"userName": ["a", "b"]}"#,
            r#"{"name": "John Doe"}"#,
            r#"{"userName": {"value": "jdoe"}}"#,
            r#"{"active": 1}"#,
        ] {
            let err = unmarshaller.unmarshal_resource(&descriptor, payload).unwrap_err();
            assert!(
                matches!(err, ScimError::SchemaViolation(_)),
                "{} gave {:?}",
                payload,
                err
            );
        }
    }

    #[test]
    fn test_list_layout() {
        let descriptor = user_descriptor();
        let list = ListResponse::new(10, 4, vec![sample_user().into_object()]);
        let json = JsonMarshaller.marshal_list(&descriptor, &list).unwrap();
        assert!(json.starts_with(
            "{\"totalResults\":10,\"itemsPerPage\":1,\"startIndex\":4,\"schemas\":"
        ));

        let value: Value = serde_json::from_str(&json).unwrap();
        assert!(value["Resources"][0].get("schemas").is_none());
        assert_eq!(value["schemas"].as_array().unwrap().len(), 2);

        let read = JsonUnmarshaller::new(SchemaPolicy::Strict)
            .unmarshal_list(&descriptor, &json)
            .unwrap();
        assert_eq!(read, list);
    }

    #[test]
    fn test_error_payload() {
        let error = ErrorResponse::new(409, Some("version mismatch".to_string()));
        let json = JsonMarshaller.marshal_error(&error).unwrap();
        assert_eq!(json, r#"{"Errors":[{"code":409,"description":"version mismatch"}]}"#);
        assert_eq!(
            JsonUnmarshaller::new(SchemaPolicy::Strict).unmarshal_error(&json).unwrap(),
            error
        );
    }
}
