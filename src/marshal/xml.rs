//! SCIM 1.0 XML wire format.
//!
//! The core schema is bound to the `scim` prefix and extension schemas to
//! `ns1`, `ns2`, ... in lexical order of their URIs. A plural attribute is
//! written as a wrapper element holding one child element per value, named
//! by the descriptor's child name:
//!
//! ```xml
//! <scim:emails>
//!   <scim:email><scim:value>bjensen@example.com</scim:value></scim:email>
//! </scim:emails>
//! ```

use super::{
    ContentType, ErrorDetail, ErrorResponse, ListResponse, Marshaller, SchemaPolicy, SchemaResolver,
    Unmarshaller, check_core_schema,
};
use crate::error::{ScimError, ScimResult, ValidationError, ValidationResult};
use crate::resource::{AttributeValue, AttributeValues, ScimAttribute, ScimObject, SimpleValue};
use crate::schema::{AttributeDescriptor, ResourceDescriptor};

use log::trace;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::name::{Namespace, ResolveResult};
use quick_xml::reader::NsReader;
use quick_xml::writer::Writer;
use std::fmt;

const CORE_PREFIX: &str = "scim";

/// Writes SCIM objects as XML.
#[derive(Debug, Clone, Copy, Default)]
pub struct XmlMarshaller;

impl Marshaller for XmlMarshaller {
    fn content_type(&self) -> ContentType {
        ContentType::Xml
    }

    fn marshal_resource(
        &self,
        descriptor: &ResourceDescriptor,
        object: &ScimObject,
    ) -> ScimResult<String> {
        check_core_schema(descriptor, object)?;
        let mut out = XmlOutput::new(descriptor.core_schema(), object.schemas())?;
        let root = out.qualified(descriptor.core_schema(), &descriptor.name);
        out.start_root(&root)?;
        out.write_attributes(object)?;
        out.end(&root)?;
        let xml = out.finish()?;
        trace!("Marshalled resource: {}", xml);
        Ok(xml)
    }

    fn marshal_list(
        &self,
        descriptor: &ResourceDescriptor,
        list: &ListResponse,
    ) -> ScimResult<String> {
        for object in &list.resources {
            check_core_schema(descriptor, object)?;
        }
        let schemas = list.schemas();
        let mut out = XmlOutput::new(descriptor.core_schema(), schemas.iter().map(String::as_str))?;
        let root = out.core("Response");
        out.start_root(&root)?;
        out.text_element(&out.core("totalResults"), &list.total_results.to_string())?;
        out.text_element(&out.core("itemsPerPage"), &list.items_per_page().to_string())?;
        out.text_element(&out.core("startIndex"), &list.start_index.to_string())?;

        let resources = out.core("Resources");
        let resource = out.core("Resource");
        out.start(&resources)?;
        for object in &list.resources {
            out.start(&resource)?;
            out.write_attributes(object)?;
            out.end(&resource)?;
        }
        out.end(&resources)?;
        out.end(&root)?;
        out.finish()
    }

    fn marshal_error(&self, error: &ErrorResponse) -> ScimResult<String> {
        let mut out = XmlOutput::new(crate::schema::SCHEMA_URI_CORE, std::iter::empty())?;
        let root = out.core("Response");
        let errors = out.core("Errors");
        let entry = out.core("Error");
        out.start_root(&root)?;
        out.start(&errors)?;
        for detail in &error.errors {
            out.start(&entry)?;
            out.text_element(&out.core("code"), &detail.code.to_string())?;
            if let Some(description) = &detail.description {
                out.text_element(&out.core("description"), description)?;
            }
            out.end(&entry)?;
        }
        out.end(&errors)?;
        out.end(&root)?;
        out.finish()
    }
}

fn write_error(error: impl fmt::Display) -> ScimError {
    ScimError::internal(format!("Failed to write XML: {}", error))
}

/// An XML document under construction with its namespace prefixes.
struct XmlOutput {
    writer: Writer<Vec<u8>>,
    /// (schema URI, prefix), core schema first
    prefixes: Vec<(String, String)>,
}

impl XmlOutput {
    fn new<'s>(core_schema: &str, schemas: impl IntoIterator<Item = &'s str>) -> ScimResult<Self> {
        let mut prefixes = vec![(core_schema.to_string(), CORE_PREFIX.to_string())];
        let mut extensions: Vec<&str> = schemas
            .into_iter()
            .filter(|s| !s.eq_ignore_ascii_case(core_schema))
            .collect();
        extensions.sort_by_key(|s| s.to_ascii_lowercase());
        extensions.dedup_by(|a, b| a.eq_ignore_ascii_case(b));
        for (i, uri) in extensions.into_iter().enumerate() {
            prefixes.push((uri.to_string(), format!("ns{}", i + 1)));
        }

        let mut writer = Writer::new(Vec::new());
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .map_err(write_error)?;
        Ok(Self { writer, prefixes })
    }

    fn prefix(&self, schema: &str) -> String {
        self.prefixes
            .iter()
            .find(|(uri, _)| uri.eq_ignore_ascii_case(schema))
            .map(|(_, prefix)| prefix.clone())
            .unwrap_or_else(|| CORE_PREFIX.to_string())
    }

    fn qualified(&self, schema: &str, name: &str) -> String {
        format!("{}:{}", self.prefix(schema), name)
    }

    fn core(&self, name: &str) -> String {
        format!("{}:{}", CORE_PREFIX, name)
    }

    fn start_root(&mut self, name: &str) -> ScimResult<()> {
        let mut start = BytesStart::new(name);
        for (uri, prefix) in &self.prefixes {
            start.push_attribute((format!("xmlns:{}", prefix).as_str(), uri.as_str()));
        }
        self.writer.write_event(Event::Start(start)).map_err(write_error)
    }

    fn start(&mut self, name: &str) -> ScimResult<()> {
        self.writer
            .write_event(Event::Start(BytesStart::new(name)))
            .map_err(write_error)
    }

    fn end(&mut self, name: &str) -> ScimResult<()> {
        self.writer
            .write_event(Event::End(BytesEnd::new(name)))
            .map_err(write_error)
    }

    fn text_element(&mut self, name: &str, text: &str) -> ScimResult<()> {
        self.start(name)?;
        self.writer
            .write_event(Event::Text(BytesText::new(text)))
            .map_err(write_error)?;
        self.end(name)
    }

    /// Core attributes first, then each extension schema.
    fn write_attributes(&mut self, object: &ScimObject) -> ScimResult<()> {
        let core = object.core_schema();
        for attribute in object.attributes(core) {
            self.write_attribute(attribute)?;
        }
        for schema in object.schemas() {
            if schema.eq_ignore_ascii_case(core) {
                continue;
            }
            for attribute in object.attributes(schema) {
                self.write_attribute(attribute)?;
            }
        }
        Ok(())
    }

    fn write_attribute(&mut self, attribute: &ScimAttribute) -> ScimResult<()> {
        let prefix = self.prefix(attribute.schema());
        let name = format!("{}:{}", prefix, attribute.name());
        match attribute.values() {
            AttributeValues::Singular(value) => self.write_value(&name, &prefix, value),
            AttributeValues::Plural(values) => {
                let child = format!("{}:{}", prefix, attribute.descriptor().child_name());
                self.start(&name)?;
                for value in values {
                    self.write_value(&child, &prefix, value)?;
                }
                self.end(&name)
            }
        }
    }

    fn write_value(&mut self, name: &str, prefix: &str, value: &AttributeValue) -> ScimResult<()> {
        match value {
            AttributeValue::Simple(simple) => self.text_element(name, &simple.string_value()),
            AttributeValue::Complex(_) => {
                self.start(name)?;
                for sub in value.sub_attributes() {
                    if let Some(sub_value) = sub.singular_value() {
                        self.write_value(&format!("{}:{}", prefix, sub.name()), prefix, sub_value)?;
                    }
                }
                self.end(name)
            }
        }
    }

    fn finish(self) -> ScimResult<String> {
        String::from_utf8(self.writer.into_inner()).map_err(write_error)
    }
}

/// Reads SCIM objects from XML.
#[derive(Debug, Clone, Copy, Default)]
pub struct XmlUnmarshaller {
    policy: SchemaPolicy,
}

impl XmlUnmarshaller {
    pub fn new(policy: SchemaPolicy) -> Self {
        Self { policy }
    }
}

impl Unmarshaller for XmlUnmarshaller {
    fn content_type(&self) -> ContentType {
        ContentType::Xml
    }

    fn unmarshal_resource(
        &self,
        descriptor: &ResourceDescriptor,
        payload: &str,
    ) -> ScimResult<ScimObject> {
        trace!("Unmarshalling {} from {}", descriptor.name, payload);
        let root = parse_document(payload)?;
        if !root.name.eq_ignore_ascii_case(&descriptor.name) {
            return Err(ValidationError::malformed(format!(
                "expected a '{}' element but found '{}'",
                descriptor.name, root.name
            ))
            .into());
        }
        let resolver = SchemaResolver::new(descriptor, self.policy);
        Ok(decode_object(&resolver, &root)?)
    }

    fn unmarshal_list(
        &self,
        descriptor: &ResourceDescriptor,
        payload: &str,
    ) -> ScimResult<ListResponse> {
        let root = expect_response(parse_document(payload)?)?;
        let resolver = SchemaResolver::new(descriptor, self.policy);

        let mut resources = Vec::new();
        if let Some(items) = root.child("Resources") {
            for item in &items.children {
                resources.push(decode_object(&resolver, item)?);
            }
        }
        let total_results = match root.child("totalResults") {
            Some(e) => parse_count(e)?,
            None => resources.len(),
        };
        let start_index = match root.child("startIndex") {
            Some(e) => parse_count(e)?,
            None => 1,
        };
        Ok(ListResponse {
            total_results,
            start_index,
            resources,
        })
    }

    fn unmarshal_error(&self, payload: &str) -> ScimResult<ErrorResponse> {
        let root = expect_response(parse_document(payload)?)?;
        let mut errors = Vec::new();
        if let Some(list) = root.child("Errors") {
            for entry in &list.children {
                let code = entry
                    .child("code")
                    .and_then(|c| c.text.trim().parse::<u16>().ok())
                    .ok_or_else(|| ValidationError::malformed("error without a numeric code"))?;
                let description = entry.child("description").map(|d| d.text.clone());
                errors.push(ErrorDetail { code, description });
            }
        }
        Ok(ErrorResponse { errors })
    }
}

/// A parsed element with its resolved namespace.
#[derive(Debug, Default)]
struct XmlElement {
    namespace: Option<String>,
    name: String,
    text: String,
    children: Vec<XmlElement>,
}

impl XmlElement {
    fn new(namespace: ResolveResult<'_>, start: &BytesStart<'_>) -> ValidationResult<Self> {
        let name = String::from_utf8_lossy(start.local_name().as_ref()).into_owned();
        let namespace = match namespace {
            ResolveResult::Bound(Namespace(uri)) => Some(String::from_utf8_lossy(uri).into_owned()),
            ResolveResult::Unbound => None,
            ResolveResult::Unknown(prefix) => {
                return Err(ValidationError::malformed(format!(
                    "undeclared namespace prefix '{}'",
                    String::from_utf8_lossy(&prefix)
                )));
            }
        };
        Ok(Self {
            namespace,
            name,
            ..Self::default()
        })
    }

    fn child(&self, name: &str) -> Option<&XmlElement> {
        self.children.iter().find(|c| c.name == name)
    }
}

fn parse_document(payload: &str) -> ValidationResult<XmlElement> {
    // Text is kept verbatim; whitespace between child elements is dropped
    // when the parent closes.
    let mut reader = NsReader::from_str(payload);

    let mut stack: Vec<XmlElement> = Vec::new();
    let mut root = None;
    loop {
        match reader.read_resolved_event() {
            Ok((ns, Event::Start(e))) => stack.push(XmlElement::new(ns, &e)?),
            Ok((ns, Event::Empty(e))) => attach(&mut stack, &mut root, XmlElement::new(ns, &e)?)?,
            Ok((_, Event::Text(t))) => {
                let text = t
                    .unescape()
                    .map_err(|e| ValidationError::malformed(format!("invalid XML text: {}", e)))?;
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(&text);
                }
            }
            Ok((_, Event::CData(c))) => {
                if let Some(top) = stack.last_mut() {
                    top.text.push_str(&String::from_utf8_lossy(&c));
                }
            }
            Ok((_, Event::End(_))) => {
                let mut element = stack
                    .pop()
                    .ok_or_else(|| ValidationError::malformed("unbalanced end tag"))?;
                if !element.children.is_empty() {
                    element.text.clear();
                }
                attach(&mut stack, &mut root, element)?;
            }
            Ok((_, Event::Eof)) => break,
            Ok(_) => {}
            Err(e) => return Err(ValidationError::malformed(format!("invalid XML: {}", e))),
        }
    }

    if !stack.is_empty() {
        return Err(ValidationError::malformed("unclosed XML element"));
    }
    root.ok_or_else(|| ValidationError::malformed("empty XML document"))
}

fn attach(
    stack: &mut [XmlElement],
    root: &mut Option<XmlElement>,
    element: XmlElement,
) -> ValidationResult<()> {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None if root.is_none() => *root = Some(element),
        None => return Err(ValidationError::malformed("more than one root element")),
    }
    Ok(())
}

fn expect_response(root: XmlElement) -> ValidationResult<XmlElement> {
    if root.name != "Response" {
        return Err(ValidationError::malformed(format!(
            "expected a 'Response' element but found '{}'",
            root.name
        )));
    }
    Ok(root)
}

fn parse_count(element: &XmlElement) -> ValidationResult<usize> {
    element.text.trim().parse().map_err(|_| {
        ValidationError::malformed(format!("'{}' must be a number", element.name))
    })
}

fn decode_object(
    resolver: &SchemaResolver<'_>,
    element: &XmlElement,
) -> ValidationResult<ScimObject> {
    let core = resolver.core_schema();
    let mut object = ScimObject::new(core);
    for child in &element.children {
        let schema = match &child.namespace {
            Some(uri) => match resolver.schema(uri)? {
                Some(schema) => schema,
                None => continue,
            },
            None => core,
        };
        let Some(attribute) = decode_attribute(resolver, schema, child)? else {
            continue;
        };
        if object.get_attribute(schema, attribute.name()).is_some() {
            return Err(ValidationError::ExpectedSingleValue {
                attribute: attribute.name().to_string(),
            });
        }
        object.add_attribute(attribute);
    }
    Ok(object)
}

fn decode_attribute(
    resolver: &SchemaResolver<'_>,
    schema: &str,
    element: &XmlElement,
) -> ValidationResult<Option<ScimAttribute>> {
    let Some(descriptor) = resolver.attribute(schema, &element.name)? else {
        return Ok(None);
    };

    let attribute = if descriptor.multi_valued {
        if element.children.is_empty() && !element.text.trim().is_empty() {
            return Err(ValidationError::ExpectedMultiValue {
                attribute: descriptor.name.clone(),
            });
        }
        let values = element
            .children
            .iter()
            .map(|child| decode_plural_value(resolver, descriptor, child))
            .collect::<ValidationResult<Vec<_>>>()?;
        ScimAttribute::plural(descriptor.clone(), values)?
    } else if descriptor.is_complex() {
        ScimAttribute::singular(descriptor.clone(), decode_complex(resolver, descriptor, element)?)?
    } else {
        ScimAttribute::simple(descriptor.clone(), decode_simple(descriptor, element)?)?
    };
    Ok(Some(attribute))
}

/// A plural value given as bare text stands for its `value` sub-attribute.
fn decode_plural_value(
    resolver: &SchemaResolver<'_>,
    descriptor: &AttributeDescriptor,
    element: &XmlElement,
) -> ValidationResult<AttributeValue> {
    if !element.children.is_empty() {
        return decode_complex(resolver, descriptor, element);
    }
    let value = descriptor
        .sub_attribute("value")
        .ok_or_else(|| ValidationError::ExpectedComplexValue {
            attribute: descriptor.name.clone(),
        })?;
    let simple = decode_simple(value, element)?;
    AttributeValue::complex(vec![ScimAttribute::simple(value.clone(), simple)?])
}

fn decode_complex(
    resolver: &SchemaResolver<'_>,
    descriptor: &AttributeDescriptor,
    element: &XmlElement,
) -> ValidationResult<AttributeValue> {
    if element.children.is_empty() && !element.text.trim().is_empty() {
        return Err(ValidationError::ExpectedComplexValue {
            attribute: descriptor.name.clone(),
        });
    }
    let mut subs: Vec<ScimAttribute> = Vec::new();
    for child in &element.children {
        let Some(sub) = resolver.sub_attribute(descriptor, &child.name)? else {
            continue;
        };
        let attribute = if sub.is_complex() {
            ScimAttribute::singular(sub.clone(), decode_complex(resolver, sub, child)?)?
        } else {
            ScimAttribute::simple(sub.clone(), decode_simple(sub, child)?)?
        };
        subs.push(attribute);
    }
    AttributeValue::complex(subs)
}

fn decode_simple(
    descriptor: &AttributeDescriptor,
    element: &XmlElement,
) -> ValidationResult<SimpleValue> {
    if !element.children.is_empty() {
        return Err(ValidationError::ExpectedSimpleValue {
            attribute: descriptor.name.clone(),
        });
    }
    SimpleValue::parse(descriptor.data_type, &descriptor.name, &element.text)
}
