//! Attribute mappers.
//!
//! Each mapped SCIM attribute is handled by one [`AttributeMapper`], which
//! knows the directory attribute types behind it and converts values,
//! filter comparisons and sort keys. A resource mapper is little more than
//! an ordered list of these.

use super::transformation::{
    GeneralizedTimeTransformation, Transformation, TransformationRegistry,
};
use crate::config::mapping::{
    AttributeMapping, CanonicalValueMapping, Derivation, MappingKind, SubAttributeMapping,
};
use crate::directory::{
    CREATE_TIMESTAMP, DirectoryAttribute, DirectoryFilter, DirectoryReader, ENTRY_UUID, Entry,
    LdapUrl, MODIFY_TIMESTAMP, SearchRequest, normalize_dn,
};
use crate::error::{BuildError, BuildResult, ScimError, ScimResult, ValidationError};
use crate::query::FilterOperator;
use crate::resource::value_objects::{Meta, MetaResolver};
use crate::resource::{
    AttributeValue, AttributeValueResolver, ResourceVersion, ScimAttribute, ScimObject,
    SimpleValue,
};
use crate::schema::{AttributeDescriptor, AttributeType, ResourceDescriptor};

use async_trait::async_trait;
use log::{debug, warn};
use std::fmt::Debug;
use std::sync::Arc;

/// Maps one SCIM attribute to and from directory attributes.
#[async_trait]
pub trait AttributeMapper: Send + Sync + Debug {
    /// The SCIM attribute this mapper produces.
    fn descriptor(&self) -> &Arc<AttributeDescriptor>;

    /// Directory attribute types needed to produce the SCIM attribute.
    fn directory_attribute_types(&self) -> Vec<String>;

    /// Directory attribute types this mapper writes.
    fn written_attribute_types(&self) -> Vec<String> {
        Vec::new()
    }

    /// Whether written attribute types are deleted when the SCIM attribute
    /// is absent from a replacement.
    fn clear_on_absence(&self) -> bool {
        false
    }

    /// Append the directory attributes for this SCIM attribute, if present.
    fn to_directory_attributes(
        &self,
        object: &ScimObject,
        attributes: &mut Vec<DirectoryAttribute>,
    ) -> ScimResult<()>;

    /// Translate one filter comparison on this attribute.
    fn to_directory_filter(
        &self,
        sub_attribute: Option<&str>,
        operator: FilterOperator,
        value: Option<&str>,
    ) -> ScimResult<DirectoryFilter>;

    /// The directory attribute to sort on.
    fn sort_attribute(&self, sub_attribute: Option<&str>) -> ScimResult<String> {
        Err(ScimError::unsupported_sort(path_name(self.descriptor(), sub_attribute)))
    }

    /// Produce the SCIM attribute from an entry. Derived attributes read
    /// further entries through `reader`.
    async fn to_scim_attribute(
        &self,
        entry: &Entry,
        reader: &dyn DirectoryReader,
    ) -> ScimResult<Option<ScimAttribute>>;
}

/// Build the mapper for one configured attribute.
pub fn build_attribute_mapper(
    resource: &ResourceDescriptor,
    mapping: &AttributeMapping,
    transformations: &TransformationRegistry,
) -> BuildResult<Box<dyn AttributeMapper>> {
    let schema = mapping.schema.as_deref().unwrap_or(resource.core_schema());
    let descriptor = resource
        .attribute(schema, &mapping.name)
        .cloned()
        .ok_or_else(|| BuildError::UnknownAttribute {
            resource: resource.name.clone(),
            attribute: format!("{}:{}", schema, mapping.name),
        })?;

    let shape_error = |expected: &str| BuildError::InvalidConfiguration {
        message: format!(
            "{}.{} cannot use a {} mapping",
            resource.name, descriptor.name, expected
        ),
    };

    let mapper: Box<dyn AttributeMapper> = match &mapping.kind {
        MappingKind::Simple {
            ldap_attribute,
            transformation,
        } => {
            if descriptor.multi_valued || descriptor.is_complex() {
                return Err(shape_error("simple"));
            }
            Box::new(SimpleAttributeMapper {
                descriptor,
                ldap_attribute: ldap_attribute.clone(),
                transformation: transformations.create(transformation.as_deref())?,
                clear_on_absence: mapping.clear_on_absence,
            })
        }
        MappingKind::Complex { sub_attributes } => {
            if descriptor.multi_valued || !descriptor.is_complex() {
                return Err(shape_error("complex"));
            }
            let sub_mappings =
                build_sub_mappings(resource, &descriptor, sub_attributes, transformations)?;
            Box::new(ComplexAttributeMapper {
                descriptor,
                sub_mappings,
                clear_on_absence: mapping.clear_on_absence,
            })
        }
        MappingKind::Plural { canonical_values } => {
            if !descriptor.multi_valued {
                return Err(shape_error("plural"));
            }
            let canonical_values = canonical_values
                .iter()
                .map(|c| build_canonical(resource, &descriptor, c, transformations))
                .collect::<BuildResult<Vec<_>>>()?;
            Box::new(PluralAttributeMapper {
                descriptor,
                canonical_values,
                clear_on_absence: mapping.clear_on_absence,
            })
        }
        MappingKind::References {
            ldap_attributes,
            member_url_attribute,
        } => {
            if !descriptor.multi_valued || descriptor.sub_attribute("value").is_none() {
                return Err(shape_error("references"));
            }
            Box::new(ReferencesAttributeMapper {
                descriptor,
                ldap_attributes: ldap_attributes.clone(),
                member_url_attribute: member_url_attribute.clone(),
                clear_on_absence: mapping.clear_on_absence,
            })
        }
        MappingKind::Derived {
            derivation: Derivation::Groups,
            search_base_dn,
        } => {
            if !descriptor.multi_valued || descriptor.sub_attribute("value").is_none() {
                return Err(shape_error("derived groups"));
            }
            Box::new(DerivedGroupsMapper {
                descriptor,
                search_base_dn: search_base_dn.clone().unwrap_or_default(),
            })
        }
    };
    Ok(mapper)
}

fn build_sub_mappings(
    resource: &ResourceDescriptor,
    descriptor: &AttributeDescriptor,
    sub_attributes: &[SubAttributeMapping],
    transformations: &TransformationRegistry,
) -> BuildResult<Vec<SubMapping>> {
    sub_attributes
        .iter()
        .map(|sub| {
            let sub_descriptor = descriptor.sub_attribute(&sub.name).cloned().ok_or_else(|| {
                BuildError::UnknownAttribute {
                    resource: resource.name.clone(),
                    attribute: format!("{}.{}", descriptor.name, sub.name),
                }
            })?;
            Ok(SubMapping {
                descriptor: sub_descriptor,
                ldap_attribute: sub.ldap_attribute.clone(),
                transformation: transformations.create(sub.transformation.as_deref())?,
            })
        })
        .collect()
}

fn build_canonical(
    resource: &ResourceDescriptor,
    descriptor: &AttributeDescriptor,
    canonical: &CanonicalValueMapping,
    transformations: &TransformationRegistry,
) -> BuildResult<CanonicalMapping> {
    Ok(CanonicalMapping {
        type_value: canonical.type_value.clone(),
        sub_mappings: build_sub_mappings(
            resource,
            descriptor,
            &canonical.sub_attributes,
            transformations,
        )?,
    })
}

/// A sub-attribute stored in one directory attribute.
#[derive(Debug, Clone)]
struct SubMapping {
    descriptor: Arc<AttributeDescriptor>,
    ldap_attribute: String,
    transformation: Arc<dyn Transformation>,
}

impl SubMapping {
    fn to_directory_value(&self, value: &SimpleValue) -> ScimResult<Vec<u8>> {
        self.transformation.to_directory_value(&self.descriptor, value)
    }

    fn first_scim_value(&self, entry: &Entry) -> ScimResult<Option<ScimAttribute>> {
        match entry.attribute(&self.ldap_attribute).and_then(|a| a.values().first()) {
            None => Ok(None),
            Some(raw) => self.scim_value(raw).map(Some),
        }
    }

    fn scim_value(&self, raw: &[u8]) -> ScimResult<ScimAttribute> {
        let value = self.transformation.to_scim_value(&self.descriptor, raw)?;
        Ok(ScimAttribute::simple(self.descriptor.clone(), value)?)
    }

    fn filter(&self, operator: FilterOperator, value: Option<&str>) -> ScimResult<DirectoryFilter> {
        comparison_filter(
            &self.descriptor,
            &self.ldap_attribute,
            self.transformation.as_ref(),
            operator,
            value,
        )
    }
}

/// Singular simple attribute stored in one directory attribute.
#[derive(Debug)]
pub struct SimpleAttributeMapper {
    descriptor: Arc<AttributeDescriptor>,
    ldap_attribute: String,
    transformation: Arc<dyn Transformation>,
    clear_on_absence: bool,
}

#[async_trait]
impl AttributeMapper for SimpleAttributeMapper {
    fn descriptor(&self) -> &Arc<AttributeDescriptor> {
        &self.descriptor
    }

    fn directory_attribute_types(&self) -> Vec<String> {
        vec![self.ldap_attribute.clone()]
    }

    fn written_attribute_types(&self) -> Vec<String> {
        vec![self.ldap_attribute.clone()]
    }

    fn clear_on_absence(&self) -> bool {
        self.clear_on_absence
    }

    fn to_directory_attributes(
        &self,
        object: &ScimObject,
        attributes: &mut Vec<DirectoryAttribute>,
    ) -> ScimResult<()> {
        if let Some(value) = singular_value(object, &self.descriptor)? {
            let simple = value.simple_value().ok_or_else(|| ValidationError::ExpectedSimpleValue {
                attribute: self.descriptor.name.clone(),
            })?;
            let raw = self.transformation.to_directory_value(&self.descriptor, simple)?;
            attributes.push(DirectoryAttribute::new(self.ldap_attribute.clone(), vec![raw]));
        }
        Ok(())
    }

    fn to_directory_filter(
        &self,
        sub_attribute: Option<&str>,
        operator: FilterOperator,
        value: Option<&str>,
    ) -> ScimResult<DirectoryFilter> {
        if let Some(sub) = sub_attribute {
            return Err(ScimError::unsupported_filter(format!(
                "'{}' has no sub-attribute '{}'",
                self.descriptor.name, sub
            )));
        }
        comparison_filter(
            &self.descriptor,
            &self.ldap_attribute,
            self.transformation.as_ref(),
            operator,
            value,
        )
    }

    fn sort_attribute(&self, sub_attribute: Option<&str>) -> ScimResult<String> {
        match sub_attribute {
            None => Ok(self.ldap_attribute.clone()),
            Some(_) => Err(ScimError::unsupported_sort(path_name(&self.descriptor, sub_attribute))),
        }
    }

    async fn to_scim_attribute(
        &self,
        entry: &Entry,
        _reader: &dyn DirectoryReader,
    ) -> ScimResult<Option<ScimAttribute>> {
        let Some(raw) = entry
            .attribute(&self.ldap_attribute)
            .and_then(|a| a.values().first())
        else {
            return Ok(None);
        };
        let value = self.transformation.to_scim_value(&self.descriptor, raw)?;
        Ok(Some(ScimAttribute::simple(self.descriptor.clone(), value)?))
    }
}

/// Singular complex attribute with one directory attribute per
/// sub-attribute.
#[derive(Debug)]
pub struct ComplexAttributeMapper {
    descriptor: Arc<AttributeDescriptor>,
    sub_mappings: Vec<SubMapping>,
    clear_on_absence: bool,
}

impl ComplexAttributeMapper {
    fn sub_mapping(&self, sub_attribute: Option<&str>) -> Option<&SubMapping> {
        let name = sub_attribute?;
        self.sub_mappings
            .iter()
            .find(|m| m.descriptor.name.eq_ignore_ascii_case(name))
    }
}

#[async_trait]
impl AttributeMapper for ComplexAttributeMapper {
    fn descriptor(&self) -> &Arc<AttributeDescriptor> {
        &self.descriptor
    }

    fn directory_attribute_types(&self) -> Vec<String> {
        self.sub_mappings.iter().map(|m| m.ldap_attribute.clone()).collect()
    }

    fn written_attribute_types(&self) -> Vec<String> {
        self.directory_attribute_types()
    }

    fn clear_on_absence(&self) -> bool {
        self.clear_on_absence
    }

    fn to_directory_attributes(
        &self,
        object: &ScimObject,
        attributes: &mut Vec<DirectoryAttribute>,
    ) -> ScimResult<()> {
        let Some(value) = singular_value(object, &self.descriptor)? else {
            return Ok(());
        };
        for mapping in &self.sub_mappings {
            if let Some(simple) = value.sub_attribute_simple_value(&mapping.descriptor.name) {
                let raw = mapping.to_directory_value(simple)?;
                push_value(attributes, &mapping.ldap_attribute, raw);
            }
        }
        Ok(())
    }

    fn to_directory_filter(
        &self,
        sub_attribute: Option<&str>,
        operator: FilterOperator,
        value: Option<&str>,
    ) -> ScimResult<DirectoryFilter> {
        if sub_attribute.is_none() && operator == FilterOperator::Present {
            return Ok(DirectoryFilter::or(
                self.sub_mappings
                    .iter()
                    .map(|m| DirectoryFilter::present(m.ldap_attribute.clone()))
                    .collect(),
            ));
        }
        match self.sub_mapping(sub_attribute) {
            Some(mapping) => mapping.filter(operator, value),
            None => Err(ScimError::unsupported_filter(format!(
                "Cannot filter on '{}'",
                path_name(&self.descriptor, sub_attribute)
            ))),
        }
    }

    fn sort_attribute(&self, sub_attribute: Option<&str>) -> ScimResult<String> {
        self.sub_mapping(sub_attribute)
            .map(|m| m.ldap_attribute.clone())
            .ok_or_else(|| ScimError::unsupported_sort(path_name(&self.descriptor, sub_attribute)))
    }

    async fn to_scim_attribute(
        &self,
        entry: &Entry,
        _reader: &dyn DirectoryReader,
    ) -> ScimResult<Option<ScimAttribute>> {
        let mut subs = Vec::new();
        for mapping in &self.sub_mappings {
            if let Some(sub) = mapping.first_scim_value(entry)? {
                subs.push(sub);
            }
        }
        if subs.is_empty() {
            return Ok(None);
        }
        let value = AttributeValue::complex(subs)?;
        Ok(Some(ScimAttribute::singular(self.descriptor.clone(), value)?))
    }
}

#[derive(Debug)]
struct CanonicalMapping {
    type_value: Option<String>,
    sub_mappings: Vec<SubMapping>,
}

/// Plural attribute whose canonical `type` values select directory
/// attributes.
///
/// A canonical value mapped through a single sub-attribute yields one SCIM
/// value per directory value; one mapped through several sub-attributes
/// yields a single SCIM value assembled from the first value of each.
#[derive(Debug)]
pub struct PluralAttributeMapper {
    descriptor: Arc<AttributeDescriptor>,
    canonical_values: Vec<CanonicalMapping>,
    clear_on_absence: bool,
}

impl PluralAttributeMapper {
    /// The canonical mapping for a value of the given type. Untyped values
    /// use the untyped mapping when there is one, otherwise the first.
    fn canonical_for(&self, value_type: Option<&str>) -> Option<&CanonicalMapping> {
        let untyped = || self.canonical_values.iter().find(|c| c.type_value.is_none());
        match value_type {
            Some(t) => self
                .canonical_values
                .iter()
                .find(|c| c.type_value.as_deref().is_some_and(|ct| ct.eq_ignore_ascii_case(t)))
                .or_else(untyped),
            None => untyped().or_else(|| self.canonical_values.first()),
        }
    }

    fn with_type(
        &self,
        mut subs: Vec<ScimAttribute>,
        canonical: &CanonicalMapping,
    ) -> ScimResult<Vec<ScimAttribute>> {
        if let (Some(type_value), Some(type_descriptor)) =
            (&canonical.type_value, self.descriptor.sub_attribute("type"))
        {
            subs.push(ScimAttribute::simple(type_descriptor.clone(), type_value.as_str())?);
        }
        Ok(subs)
    }

    fn all_ldap_attributes(&self) -> Vec<String> {
        let mut types: Vec<String> = Vec::new();
        for canonical in &self.canonical_values {
            for mapping in &canonical.sub_mappings {
                if !types.iter().any(|t| t.eq_ignore_ascii_case(&mapping.ldap_attribute)) {
                    types.push(mapping.ldap_attribute.clone());
                }
            }
        }
        types
    }
}

#[async_trait]
impl AttributeMapper for PluralAttributeMapper {
    fn descriptor(&self) -> &Arc<AttributeDescriptor> {
        &self.descriptor
    }

    fn directory_attribute_types(&self) -> Vec<String> {
        self.all_ldap_attributes()
    }

    fn written_attribute_types(&self) -> Vec<String> {
        self.all_ldap_attributes()
    }

    fn clear_on_absence(&self) -> bool {
        self.clear_on_absence
    }

    fn to_directory_attributes(
        &self,
        object: &ScimObject,
        attributes: &mut Vec<DirectoryAttribute>,
    ) -> ScimResult<()> {
        let Some(attribute) = object.get_attribute(&self.descriptor.schema, &self.descriptor.name)
        else {
            return Ok(());
        };
        for value in attribute.plural_values() {
            let value_type = value
                .sub_attribute_simple_value("type")
                .map(SimpleValue::string_value);
            let Some(canonical) = self.canonical_for(value_type.as_deref()) else {
                debug!(
                    "No directory mapping for {} of type {:?}; value skipped",
                    self.descriptor.name, value_type
                );
                continue;
            };
            for mapping in &canonical.sub_mappings {
                if let Some(simple) = value.sub_attribute_simple_value(&mapping.descriptor.name) {
                    let raw = mapping.to_directory_value(simple)?;
                    push_value(attributes, &mapping.ldap_attribute, raw);
                }
            }
        }
        Ok(())
    }

    fn to_directory_filter(
        &self,
        sub_attribute: Option<&str>,
        operator: FilterOperator,
        value: Option<&str>,
    ) -> ScimResult<DirectoryFilter> {
        let sub = sub_attribute.map(str::to_ascii_lowercase);
        match sub.as_deref() {
            None if operator == FilterOperator::Present => Ok(DirectoryFilter::or(
                self.all_ldap_attributes()
                    .into_iter()
                    .map(DirectoryFilter::present)
                    .collect(),
            )),
            Some("type") => {
                let wanted = match (operator, value) {
                    (FilterOperator::Equality, Some(wanted)) => wanted,
                    _ => {
                        return Err(ScimError::unsupported_filter(format!(
                            "'{}.type' only supports eq",
                            self.descriptor.name
                        )));
                    }
                };
                let filters: Vec<DirectoryFilter> = self
                    .canonical_values
                    .iter()
                    .filter(|c| {
                        c.type_value
                            .as_deref()
                            .is_some_and(|t| t.eq_ignore_ascii_case(wanted))
                    })
                    .flat_map(|c| &c.sub_mappings)
                    .map(|m| DirectoryFilter::present(m.ldap_attribute.clone()))
                    .collect();
                if filters.is_empty() {
                    return Ok(DirectoryFilter::Not(Box::new(DirectoryFilter::present(
                        "objectClass",
                    ))));
                }
                Ok(DirectoryFilter::or(filters))
            }
            Some("primary") => Err(ScimError::unsupported_filter(format!(
                "'{}.primary' is not stored in the directory",
                self.descriptor.name
            ))),
            _ => {
                let target = sub.as_deref().unwrap_or("value");
                let filters = self
                    .canonical_values
                    .iter()
                    .flat_map(|c| &c.sub_mappings)
                    .filter(|m| m.descriptor.name.eq_ignore_ascii_case(target))
                    .map(|m| m.filter(operator, value))
                    .collect::<ScimResult<Vec<_>>>()?;
                if filters.is_empty() {
                    return Err(ScimError::unsupported_filter(format!(
                        "Cannot filter on '{}'",
                        path_name(&self.descriptor, Some(target))
                    )));
                }
                Ok(DirectoryFilter::or(filters))
            }
        }
    }

    async fn to_scim_attribute(
        &self,
        entry: &Entry,
        _reader: &dyn DirectoryReader,
    ) -> ScimResult<Option<ScimAttribute>> {
        let mut values = Vec::new();
        for canonical in &self.canonical_values {
            if let [mapping] = canonical.sub_mappings.as_slice() {
                let Some(attribute) = entry.attribute(&mapping.ldap_attribute) else {
                    continue;
                };
                for raw in attribute.values() {
                    let subs = self.with_type(vec![mapping.scim_value(raw)?], canonical)?;
                    values.push(AttributeValue::complex(subs)?);
                }
            } else {
                let mut subs = Vec::new();
                for mapping in &canonical.sub_mappings {
                    if let Some(sub) = mapping.first_scim_value(entry)? {
                        subs.push(sub);
                    }
                }
                if !subs.is_empty() {
                    values.push(AttributeValue::complex(self.with_type(subs, canonical)?)?);
                }
            }
        }
        if values.is_empty() {
            return Ok(None);
        }
        Ok(Some(ScimAttribute::plural(self.descriptor.clone(), values)?))
    }
}

/// Plural `{value}` references held as DNs, such as group members.
///
/// Values are written to the first configured directory attribute and read
/// from all of them. Dynamic members selected by LDAP URLs in the member URL
/// attribute are included on reads.
#[derive(Debug)]
pub struct ReferencesAttributeMapper {
    descriptor: Arc<AttributeDescriptor>,
    ldap_attributes: Vec<String>,
    member_url_attribute: Option<String>,
    clear_on_absence: bool,
}

impl ReferencesAttributeMapper {
    fn value_descriptor(&self) -> ScimResult<&Arc<AttributeDescriptor>> {
        self.descriptor.sub_attribute("value").ok_or_else(|| {
            ScimError::internal(format!("'{}' has no value sub-attribute", self.descriptor.name))
        })
    }

    async fn dynamic_members(
        &self,
        entry: &Entry,
        reader: &dyn DirectoryReader,
    ) -> ScimResult<Vec<String>> {
        let Some(url_attribute) = &self.member_url_attribute else {
            return Ok(Vec::new());
        };
        let mut members = Vec::new();
        for url in entry.attribute_values(url_attribute) {
            let url = match LdapUrl::parse(&url) {
                Ok(url) => url,
                Err(e) => {
                    warn!("Ignoring member URL of {}: {}", entry.dn(), e);
                    continue;
                }
            };
            let request = SearchRequest::new(url.base_dn.clone(), url.filter.clone())
                .with_attributes(vec!["1.1".to_string()]);
            for member in reader.search(&request).await? {
                if url.in_scope(member.dn()) {
                    members.push(member.dn().to_string());
                }
            }
        }
        Ok(members)
    }
}

#[async_trait]
impl AttributeMapper for ReferencesAttributeMapper {
    fn descriptor(&self) -> &Arc<AttributeDescriptor> {
        &self.descriptor
    }

    fn directory_attribute_types(&self) -> Vec<String> {
        let mut types = self.ldap_attributes.clone();
        types.extend(self.member_url_attribute.iter().cloned());
        types
    }

    fn written_attribute_types(&self) -> Vec<String> {
        self.ldap_attributes.iter().take(1).cloned().collect()
    }

    fn clear_on_absence(&self) -> bool {
        self.clear_on_absence
    }

    fn to_directory_attributes(
        &self,
        object: &ScimObject,
        attributes: &mut Vec<DirectoryAttribute>,
    ) -> ScimResult<()> {
        let (Some(attribute), Some(target)) = (
            object.get_attribute(&self.descriptor.schema, &self.descriptor.name),
            self.ldap_attributes.first(),
        ) else {
            return Ok(());
        };
        for value in attribute.plural_values() {
            if let Some(reference) = value.sub_attribute_simple_value("value") {
                push_value(attributes, target, reference.string_value().into_bytes());
            }
        }
        Ok(())
    }

    fn to_directory_filter(
        &self,
        sub_attribute: Option<&str>,
        operator: FilterOperator,
        value: Option<&str>,
    ) -> ScimResult<DirectoryFilter> {
        if sub_attribute.is_some_and(|s| !s.eq_ignore_ascii_case("value")) {
            return Err(ScimError::unsupported_filter(format!(
                "Cannot filter on '{}'",
                path_name(&self.descriptor, sub_attribute)
            )));
        }
        match (operator, value) {
            (FilterOperator::Present, _) => Ok(DirectoryFilter::or(
                self.directory_attribute_types()
                    .into_iter()
                    .map(DirectoryFilter::present)
                    .collect(),
            )),
            (FilterOperator::Equality, Some(dn)) => Ok(DirectoryFilter::or(
                self.ldap_attributes
                    .iter()
                    .map(|a| DirectoryFilter::equality(a.clone(), dn))
                    .collect(),
            )),
            _ => Err(ScimError::unsupported_filter(format!(
                "'{}' only supports eq and pr",
                self.descriptor.name
            ))),
        }
    }

    async fn to_scim_attribute(
        &self,
        entry: &Entry,
        reader: &dyn DirectoryReader,
    ) -> ScimResult<Option<ScimAttribute>> {
        let value_descriptor = self.value_descriptor()?;
        let mut seen = Vec::new();
        let mut values = Vec::new();

        let static_members = self
            .ldap_attributes
            .iter()
            .flat_map(|a| entry.attribute_values(a));
        let dynamic_members = self.dynamic_members(entry, reader).await?;

        for dn in static_members.chain(dynamic_members) {
            let normalized = normalize_dn(&dn);
            if seen.contains(&normalized) {
                continue;
            }
            seen.push(normalized);
            let sub = ScimAttribute::simple(value_descriptor.clone(), dn)?;
            values.push(AttributeValue::complex(vec![sub])?);
        }

        if values.is_empty() {
            return Ok(None);
        }
        Ok(Some(ScimAttribute::plural(self.descriptor.clone(), values)?))
    }
}

/// The read-only `groups` of a user, found by searching group entries that
/// reference the user statically or through a member URL.
#[derive(Debug)]
pub struct DerivedGroupsMapper {
    descriptor: Arc<AttributeDescriptor>,
    search_base_dn: String,
}

impl DerivedGroupsMapper {
    const GROUP_NAME: &'static str = "cn";
    const MEMBER_URL: &'static str = "memberURL";

    fn group_value(&self, group: &Entry) -> ScimResult<AttributeValue> {
        let mut subs = Vec::new();
        if let Some(value) = self.descriptor.sub_attribute("value") {
            subs.push(ScimAttribute::simple(value.clone(), group.dn())?);
        }
        if let (Some(display), Some(name)) = (
            self.descriptor.sub_attribute("display"),
            group.attribute_value(Self::GROUP_NAME),
        ) {
            subs.push(ScimAttribute::simple(display.clone(), name)?);
        }
        Ok(AttributeValue::complex(subs)?)
    }
}

#[async_trait]
impl AttributeMapper for DerivedGroupsMapper {
    fn descriptor(&self) -> &Arc<AttributeDescriptor> {
        &self.descriptor
    }

    fn directory_attribute_types(&self) -> Vec<String> {
        Vec::new()
    }

    fn to_directory_attributes(
        &self,
        _object: &ScimObject,
        _attributes: &mut Vec<DirectoryAttribute>,
    ) -> ScimResult<()> {
        Ok(())
    }

    fn to_directory_filter(
        &self,
        sub_attribute: Option<&str>,
        _operator: FilterOperator,
        _value: Option<&str>,
    ) -> ScimResult<DirectoryFilter> {
        Err(ScimError::unsupported_filter(format!(
            "Cannot filter on derived attribute '{}'",
            path_name(&self.descriptor, sub_attribute)
        )))
    }

    async fn to_scim_attribute(
        &self,
        entry: &Entry,
        reader: &dyn DirectoryReader,
    ) -> ScimResult<Option<ScimAttribute>> {
        let dn = entry.dn();
        let static_filter = DirectoryFilter::or(vec![
            DirectoryFilter::equality("member", dn),
            DirectoryFilter::equality("uniqueMember", dn),
        ]);
        let request = SearchRequest::new(self.search_base_dn.clone(), static_filter)
            .with_attributes(vec![Self::GROUP_NAME.to_string()]);
        let mut groups = reader.search(&request).await?;

        let request = SearchRequest::new(
            self.search_base_dn.clone(),
            DirectoryFilter::equality("objectClass", "groupOfURLs"),
        )
        .with_attributes(vec![Self::GROUP_NAME.to_string(), Self::MEMBER_URL.to_string()]);
        let dynamic_groups = reader.search(&request).await?;

        if !dynamic_groups.is_empty() {
            let full_entry = match reader.get_entry(dn, &[]).await? {
                Some(full) => full,
                None => entry.clone(),
            };
            for group in dynamic_groups {
                let selected = group.attribute_values(Self::MEMBER_URL).iter().any(|url| {
                    match LdapUrl::parse(url) {
                        Ok(url) => url.matches(&full_entry),
                        Err(e) => {
                            warn!("Ignoring member URL of {}: {}", group.dn(), e);
                            false
                        }
                    }
                });
                let known = groups
                    .iter()
                    .any(|g| normalize_dn(g.dn()) == normalize_dn(group.dn()));
                if selected && !known {
                    groups.push(group);
                }
            }
        }

        if groups.is_empty() {
            return Ok(None);
        }
        let values = groups
            .iter()
            .map(|group| self.group_value(group))
            .collect::<ScimResult<Vec<_>>>()?;
        Ok(Some(ScimAttribute::plural(self.descriptor.clone(), values)?))
    }
}

/// The resource `id`: the entry DN.
#[derive(Debug)]
pub struct IdMapper {
    descriptor: Arc<AttributeDescriptor>,
}

impl IdMapper {
    pub fn new(descriptor: Arc<AttributeDescriptor>) -> Self {
        Self { descriptor }
    }
}

#[async_trait]
impl AttributeMapper for IdMapper {
    fn descriptor(&self) -> &Arc<AttributeDescriptor> {
        &self.descriptor
    }

    fn directory_attribute_types(&self) -> Vec<String> {
        Vec::new()
    }

    fn to_directory_attributes(
        &self,
        _object: &ScimObject,
        _attributes: &mut Vec<DirectoryAttribute>,
    ) -> ScimResult<()> {
        Ok(())
    }

    fn to_directory_filter(
        &self,
        _sub_attribute: Option<&str>,
        _operator: FilterOperator,
        _value: Option<&str>,
    ) -> ScimResult<DirectoryFilter> {
        Err(ScimError::unsupported_filter(
            "Cannot filter on 'id'; read the resource directly",
        ))
    }

    async fn to_scim_attribute(
        &self,
        entry: &Entry,
        _reader: &dyn DirectoryReader,
    ) -> ScimResult<Option<ScimAttribute>> {
        Ok(Some(ScimAttribute::simple(self.descriptor.clone(), entry.dn())?))
    }
}

/// The resource `meta`, computed from operational attributes.
#[derive(Debug)]
pub struct MetaMapper {
    descriptor: Arc<AttributeDescriptor>,
    /// `<baseUrl>/<endpoint>`
    location_prefix: String,
}

impl MetaMapper {
    pub fn new(descriptor: Arc<AttributeDescriptor>, base_url: &str, endpoint: &str) -> Self {
        Self {
            descriptor,
            location_prefix: format!("{}/{}", base_url.trim_end_matches('/'), endpoint),
        }
    }

    fn operational_attribute(sub_attribute: Option<&str>) -> Option<&'static str> {
        match sub_attribute?.to_ascii_lowercase().as_str() {
            "created" => Some(CREATE_TIMESTAMP),
            "lastmodified" => Some(MODIFY_TIMESTAMP),
            _ => None,
        }
    }

    fn timestamp(entry: &Entry, name: &str) -> Option<chrono::DateTime<chrono::Utc>> {
        entry
            .attribute_value(name)
            .and_then(|value| super::transformation::parse_generalized_time(&value))
    }
}

#[async_trait]
impl AttributeMapper for MetaMapper {
    fn descriptor(&self) -> &Arc<AttributeDescriptor> {
        &self.descriptor
    }

    fn directory_attribute_types(&self) -> Vec<String> {
        vec![
            CREATE_TIMESTAMP.to_string(),
            MODIFY_TIMESTAMP.to_string(),
            ENTRY_UUID.to_string(),
        ]
    }

    fn to_directory_attributes(
        &self,
        _object: &ScimObject,
        _attributes: &mut Vec<DirectoryAttribute>,
    ) -> ScimResult<()> {
        Ok(())
    }

    fn to_directory_filter(
        &self,
        sub_attribute: Option<&str>,
        operator: FilterOperator,
        value: Option<&str>,
    ) -> ScimResult<DirectoryFilter> {
        let (Some(ldap_attribute), Some(sub)) = (
            Self::operational_attribute(sub_attribute),
            sub_attribute.and_then(|s| self.descriptor.sub_attribute(s)),
        ) else {
            return Err(ScimError::unsupported_filter(format!(
                "Cannot filter on '{}'",
                path_name(&self.descriptor, sub_attribute)
            )));
        };
        comparison_filter(sub, ldap_attribute, &GeneralizedTimeTransformation, operator, value)
    }

    fn sort_attribute(&self, sub_attribute: Option<&str>) -> ScimResult<String> {
        Self::operational_attribute(sub_attribute)
            .map(str::to_string)
            .ok_or_else(|| ScimError::unsupported_sort(path_name(&self.descriptor, sub_attribute)))
    }

    async fn to_scim_attribute(
        &self,
        entry: &Entry,
        _reader: &dyn DirectoryReader,
    ) -> ScimResult<Option<ScimAttribute>> {
        let modify_timestamp = entry.attribute_value(MODIFY_TIMESTAMP).unwrap_or_default();
        let entry_uuid = entry.attribute_value(ENTRY_UUID).unwrap_or_default();
        let fingerprint = format!(
            "{}\n{}\n{}",
            normalize_dn(entry.dn()),
            modify_timestamp,
            entry_uuid
        );

        let meta = Meta {
            created: Self::timestamp(entry, CREATE_TIMESTAMP),
            last_modified: Self::timestamp(entry, MODIFY_TIMESTAMP),
            location: Some(format!("{}/{}", self.location_prefix, entry.dn())),
            version: Some(ResourceVersion::from_content(fingerprint.as_bytes()).to_string()),
        };
        let value = MetaResolver.from_instance(&self.descriptor, &meta)?;
        Ok(Some(ScimAttribute::singular(self.descriptor.clone(), value)?))
    }
}

/// The singular value of the attribute described by `descriptor`, if the
/// object carries it.
fn singular_value<'a>(
    object: &'a ScimObject,
    descriptor: &AttributeDescriptor,
) -> ScimResult<Option<&'a AttributeValue>> {
    match object.get_attribute(&descriptor.schema, &descriptor.name) {
        None => Ok(None),
        Some(attribute) => attribute.singular_value().map(Some).ok_or_else(|| {
            ValidationError::ExpectedSingleValue {
                attribute: descriptor.name.clone(),
            }
            .into()
        }),
    }
}

/// Append a value to the named attribute in `attributes`, creating it as
/// needed.
fn push_value(attributes: &mut Vec<DirectoryAttribute>, name: &str, raw: Vec<u8>) {
    match attributes.iter_mut().find(|a| a.name().eq_ignore_ascii_case(name)) {
        Some(existing) => existing.push_value(raw),
        None => attributes.push(DirectoryAttribute::new(name.to_string(), vec![raw])),
    }
}

fn path_name(descriptor: &AttributeDescriptor, sub_attribute: Option<&str>) -> String {
    match sub_attribute {
        Some(sub) => format!("{}.{}", descriptor.name, sub),
        None => descriptor.name.clone(),
    }
}

/// Translate one comparison against a directory attribute.
///
/// `co` and `sw` apply to strings only; `gt` and `lt` do not apply to
/// booleans or binary values, and binary values can only be tested for
/// presence.
fn comparison_filter(
    descriptor: &AttributeDescriptor,
    ldap_attribute: &str,
    transformation: &dyn Transformation,
    operator: FilterOperator,
    value: Option<&str>,
) -> ScimResult<DirectoryFilter> {
    if operator == FilterOperator::Present {
        return Ok(DirectoryFilter::present(ldap_attribute));
    }
    let data_type = descriptor.effective_type();
    let supported = match operator {
        FilterOperator::Contains | FilterOperator::StartsWith => data_type == AttributeType::String,
        FilterOperator::GreaterThan | FilterOperator::LessThan => {
            !matches!(data_type, AttributeType::Boolean | AttributeType::Binary)
        }
        _ => data_type != AttributeType::Binary,
    };
    if !supported {
        return Err(ScimError::unsupported_filter(format!(
            "Operator '{}' is not supported for {} attribute '{}'",
            operator, data_type, descriptor.name
        )));
    }

    let value = value.ok_or_else(|| {
        ScimError::invalid_request(format!("Operator '{}' requires a value", operator))
    })?;
    let literal = if data_type == AttributeType::Boolean {
        match value.to_ascii_lowercase().as_str() {
            "true" => "TRUE".to_string(),
            "false" => "FALSE".to_string(),
            _ => {
                return Err(ScimError::invalid_request(format!(
                    "'{}' is not a boolean value for '{}'",
                    value, descriptor.name
                )));
            }
        }
    } else {
        value.to_string()
    };
    let literal = transformation.to_directory_filter_value(&literal)?;

    Ok(match operator {
        FilterOperator::Equality => DirectoryFilter::equality(ldap_attribute, literal),
        FilterOperator::Contains => DirectoryFilter::contains(ldap_attribute, literal),
        FilterOperator::StartsWith => DirectoryFilter::starts_with(ldap_attribute, literal),
        FilterOperator::GreaterThan => DirectoryFilter::greater_than(ldap_attribute, literal),
        FilterOperator::LessThan => DirectoryFilter::less_than(ldap_attribute, literal),
        FilterOperator::Present => DirectoryFilter::present(ldap_attribute),
    })
}
