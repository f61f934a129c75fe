//! Resource mappers.
//!
//! A [`ResourceMapper`] translates one resource type between SCIM objects
//! and directory entries: whole entries for create, modification lists for
//! replace, filters and sort keys for queries, and SCIM objects for reads.

use super::attribute::{AttributeMapper, IdMapper, MetaMapper, build_attribute_mapper};
use super::transformation::TransformationRegistry;
use crate::config::mapping::ResourceMapping;
use crate::directory::{
    DirectoryAttribute, DirectoryFilter, DirectoryReader, DirectorySort, Entry, Modification,
    escape_dn_value,
};
use crate::error::{BuildError, BuildResult, ScimError, ScimResult, ValidationError};
use crate::query::{QueryAttributes, ScimFilter, SortParameters};
use crate::resource::{ScimAttribute, ScimObject};
use crate::schema::ResourceDescriptor;

use async_trait::async_trait;
use log::{debug, trace};
use std::collections::BTreeSet;
use std::fmt::Debug;
use std::sync::Arc;

/// Maps one resource type to and from the directory.
///
/// Mappers are configured once with [`initialize`](Self::initialize) and
/// released with [`finalize`](Self::finalize); between the two every method
/// takes `&self` and may be called concurrently.
#[async_trait]
pub trait ResourceMapper: Send + Sync + Debug {
    fn initialize(&mut self) -> BuildResult<()>;

    fn finalize(&self);

    fn resource_descriptor(&self) -> &Arc<ResourceDescriptor>;

    fn supports_query(&self) -> bool;

    fn supports_create(&self) -> bool;

    fn search_base_dn(&self) -> &str;

    /// Filter selecting every entry of this resource type.
    fn object_class_filter(&self) -> DirectoryFilter;

    /// Whether an entry belongs to this resource type.
    fn matches_entry(&self, entry: &Entry) -> bool;

    /// Directory attribute types needed to return the requested attributes.
    fn required_directory_attribute_types(&self, query: &QueryAttributes) -> BTreeSet<String>;

    /// A complete entry for a new resource.
    fn to_directory_entry(&self, object: &ScimObject) -> ScimResult<Entry>;

    /// The directory attributes for the mapped attributes of `object`.
    fn to_directory_attributes(&self, object: &ScimObject) -> ScimResult<Vec<DirectoryAttribute>>;

    /// The changes that make `entry` hold `object`.
    fn to_directory_modifications(
        &self,
        entry: &Entry,
        object: &ScimObject,
    ) -> ScimResult<Vec<Modification>>;

    /// Translate a SCIM filter, restricted to this resource type.
    fn to_directory_filter(&self, filter: &ScimFilter) -> ScimResult<DirectoryFilter>;

    /// The search filter for an optional SCIM filter.
    fn search_filter(&self, filter: Option<&ScimFilter>) -> ScimResult<DirectoryFilter> {
        match filter {
            Some(filter) => self.to_directory_filter(filter),
            None => Ok(self.object_class_filter()),
        }
    }

    fn to_directory_sort(&self, sort: &SortParameters) -> ScimResult<DirectorySort>;

    /// The requested SCIM attributes of an entry.
    async fn to_scim_attributes(
        &self,
        entry: &Entry,
        query: &QueryAttributes,
        reader: &dyn DirectoryReader,
    ) -> ScimResult<Vec<ScimAttribute>>;

    /// The SCIM object for an entry, or `None` when the entry is not of this
    /// resource type.
    async fn to_scim_object(
        &self,
        entry: &Entry,
        query: &QueryAttributes,
        reader: &dyn DirectoryReader,
    ) -> ScimResult<Option<ScimObject>> {
        if !self.matches_entry(entry) {
            debug!(
                "Entry {} is not a {}",
                entry.dn(),
                self.resource_descriptor().name
            );
            return Ok(None);
        }
        let mut object = ScimObject::new(self.resource_descriptor().core_schema());
        for attribute in self.to_scim_attributes(entry, query, reader).await? {
            object.add_attribute(attribute);
        }
        Ok(Some(query.project(&object)))
    }
}

/// Resource mapper driven by a [`ResourceMapping`].
#[derive(Debug)]
pub struct ConfigurableResourceMapper {
    descriptor: Arc<ResourceDescriptor>,
    mapping: ResourceMapping,
    transformations: Arc<TransformationRegistry>,
    base_url: String,
    attribute_mappers: Vec<Box<dyn AttributeMapper>>,
}

impl ConfigurableResourceMapper {
    pub fn new(
        descriptor: Arc<ResourceDescriptor>,
        mapping: ResourceMapping,
        transformations: Arc<TransformationRegistry>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            descriptor,
            mapping,
            transformations,
            base_url: base_url.into(),
            attribute_mappers: Vec::new(),
        }
    }

    pub fn mapping(&self) -> &ResourceMapping {
        &self.mapping
    }

    fn rdn_attribute(&self) -> Option<&str> {
        self.mapping.rdn_attribute.as_deref()
    }

    fn is_rdn(&self, attribute_type: &str) -> bool {
        self.rdn_attribute()
            .is_some_and(|rdn| rdn.eq_ignore_ascii_case(attribute_type))
    }

    fn mapper_for(&self, schema: Option<&str>, name: &str) -> Option<&dyn AttributeMapper> {
        let schema = schema.unwrap_or(self.descriptor.core_schema());
        self.attribute_mappers
            .iter()
            .find(|m| m.descriptor().is(schema, name))
            .map(Box::as_ref)
    }

    fn translate(&self, filter: &ScimFilter) -> ScimResult<DirectoryFilter> {
        match filter {
            ScimFilter::And(left, right) => Ok(DirectoryFilter::And(vec![
                self.translate(left)?,
                self.translate(right)?,
            ])),
            ScimFilter::Or(left, right) => Ok(DirectoryFilter::Or(vec![
                self.translate(left)?,
                self.translate(right)?,
            ])),
            ScimFilter::Comparison {
                path,
                operator,
                value,
            } => {
                let mapper = self
                    .mapper_for(path.schema.as_deref(), &path.attribute)
                    .ok_or_else(|| {
                        ScimError::unsupported_filter(format!(
                            "Attribute '{}' of {} is not mapped to the directory",
                            path, self.descriptor.name
                        ))
                    })?;
                mapper.to_directory_filter(
                    path.sub_attribute.as_deref(),
                    *operator,
                    value.as_deref(),
                )
            }
        }
    }

    fn check_required(&self, object: &ScimObject) -> ScimResult<()> {
        for attribute in self.descriptor.attributes.iter().filter(|a| a.required && !a.read_only) {
            if object.get_attribute(&attribute.schema, &attribute.name).is_none() {
                return Err(ValidationError::missing_required(&attribute.name).into());
            }
        }
        Ok(())
    }
}

#[async_trait]
impl ResourceMapper for ConfigurableResourceMapper {
    fn initialize(&mut self) -> BuildResult<()> {
        let mut mappers: Vec<Box<dyn AttributeMapper>> = Vec::new();

        let core = self.descriptor.core_schema().to_string();
        let configured = |name: &str| {
            self.mapping
                .attributes
                .iter()
                .any(|a| {
                    a.schema.as_deref().unwrap_or(&core).eq_ignore_ascii_case(&core)
                        && a.name.eq_ignore_ascii_case(name)
                })
        };
        if let (Some(id), false) = (self.descriptor.core_attribute("id"), configured("id")) {
            mappers.push(Box::new(IdMapper::new(id.clone())));
        }
        if let (Some(meta), false) = (self.descriptor.core_attribute("meta"), configured("meta")) {
            mappers.push(Box::new(MetaMapper::new(
                meta.clone(),
                &self.base_url,
                &self.descriptor.endpoint,
            )));
        }

        for mapping in &self.mapping.attributes {
            let mapper = build_attribute_mapper(&self.descriptor, mapping, &self.transformations)?;
            let descriptor = mapper.descriptor();
            if mappers.iter().any(|m| m.descriptor().is(&descriptor.schema, &descriptor.name)) {
                return Err(BuildError::InvalidConfiguration {
                    message: format!(
                        "{}.{} is mapped more than once",
                        self.descriptor.name, descriptor.name
                    ),
                });
            }
            mappers.push(mapper);
        }

        if let Some(rdn) = self.mapping.rdn_attribute.as_deref() {
            let written = mappers
                .iter()
                .flat_map(|m| m.written_attribute_types())
                .any(|t| t.eq_ignore_ascii_case(rdn));
            if !written {
                return Err(BuildError::InvalidConfiguration {
                    message: format!(
                        "{}: no attribute mapping writes the RDN attribute '{}'",
                        self.descriptor.name, rdn
                    ),
                });
            }
        }

        debug!(
            "Initialized {} mapper with {} attribute mappers below {}",
            self.descriptor.name,
            mappers.len(),
            self.mapping.search_base_dn
        );
        self.attribute_mappers = mappers;
        Ok(())
    }

    fn finalize(&self) {
        debug!("Finalized {} mapper", self.descriptor.name);
    }

    fn resource_descriptor(&self) -> &Arc<ResourceDescriptor> {
        &self.descriptor
    }

    fn supports_query(&self) -> bool {
        self.mapping.query_supported
    }

    fn supports_create(&self) -> bool {
        self.mapping.supports_create()
    }

    fn search_base_dn(&self) -> &str {
        &self.mapping.search_base_dn
    }

    fn object_class_filter(&self) -> DirectoryFilter {
        DirectoryFilter::or(
            self.mapping
                .effective_search_object_classes()
                .into_iter()
                .map(|oc| DirectoryFilter::equality("objectClass", oc))
                .collect(),
        )
    }

    fn matches_entry(&self, entry: &Entry) -> bool {
        self.mapping
            .effective_search_object_classes()
            .iter()
            .any(|oc| entry.has_object_class(oc))
    }

    fn required_directory_attribute_types(&self, query: &QueryAttributes) -> BTreeSet<String> {
        let mut types = BTreeSet::from(["objectClass".to_string()]);
        for mapper in &self.attribute_mappers {
            if query.is_requested(mapper.descriptor()) {
                types.extend(mapper.directory_attribute_types());
            }
        }
        types
    }

    fn to_directory_entry(&self, object: &ScimObject) -> ScimResult<Entry> {
        let rdn_attribute = match (self.supports_create(), self.rdn_attribute()) {
            (true, Some(rdn)) => rdn,
            _ => {
                return Err(ScimError::unsupported_operation(
                    self.descriptor.name.clone(),
                    "create",
                ));
            }
        };
        self.check_required(object)?;

        let attributes = self.to_directory_attributes(object)?;
        let rdn_value = attributes
            .iter()
            .find(|a| a.name().eq_ignore_ascii_case(rdn_attribute))
            .and_then(DirectoryAttribute::first_string)
            .ok_or_else(|| {
                ScimError::invalid_resource(format!(
                    "{} has no value for the naming attribute '{}'",
                    self.descriptor.name, rdn_attribute
                ))
            })?;

        let dn = format!(
            "{}={},{}",
            rdn_attribute,
            escape_dn_value(&rdn_value),
            self.mapping.create_base_dn()
        );
        let mut entry = Entry::new(dn);
        entry.add_attribute(DirectoryAttribute::from_strings(
            "objectClass",
            self.mapping.object_classes.iter(),
        ));
        for attribute in attributes {
            entry.add_attribute(attribute);
        }

        for required in &self.mapping.required_directory_attributes {
            if !entry.has_attribute(required) {
                return Err(ScimError::invalid_resource(format!(
                    "{} entry requires directory attribute '{}'",
                    self.descriptor.name, required
                )));
            }
        }

        trace!("Mapped {} to entry {}", self.descriptor.name, entry.dn());
        Ok(entry)
    }

    fn to_directory_attributes(&self, object: &ScimObject) -> ScimResult<Vec<DirectoryAttribute>> {
        let mut attributes = Vec::new();
        for mapper in &self.attribute_mappers {
            mapper.to_directory_attributes(object, &mut attributes)?;
        }
        Ok(attributes)
    }

    fn to_directory_modifications(
        &self,
        entry: &Entry,
        object: &ScimObject,
    ) -> ScimResult<Vec<Modification>> {
        let desired = self.to_directory_attributes(object)?;
        let mut modifications = Vec::new();

        for attribute in &desired {
            let current = entry.attribute(attribute.name());
            if self.is_rdn(attribute.name()) {
                if current.is_some_and(|c| !c.same_values(attribute)) {
                    return Err(ScimError::invalid_resource(format!(
                        "Cannot change the naming attribute '{}' of {}",
                        attribute.name(),
                        entry.dn()
                    )));
                }
                continue;
            }
            match current {
                None => modifications.push(Modification::add(attribute.clone())),
                Some(current) if !current.same_values(attribute) => {
                    modifications.push(Modification::replace(attribute.clone()))
                }
                Some(_) => {}
            }
        }

        for mapper in self.attribute_mappers.iter().filter(|m| m.clear_on_absence()) {
            for attribute_type in mapper.written_attribute_types() {
                let absent = !desired
                    .iter()
                    .any(|a| a.name().eq_ignore_ascii_case(&attribute_type));
                let already = modifications
                    .iter()
                    .any(|m| m.attribute.name().eq_ignore_ascii_case(&attribute_type));
                if absent
                    && !already
                    && !self.is_rdn(&attribute_type)
                    && entry.has_attribute(&attribute_type)
                {
                    modifications.push(Modification::delete_all(attribute_type));
                }
            }
        }

        debug!("{} modifications for {}", modifications.len(), entry.dn());
        Ok(modifications)
    }

    fn to_directory_filter(&self, filter: &ScimFilter) -> ScimResult<DirectoryFilter> {
        let translated = self.translate(filter)?;
        debug!("Filter '{}' translated to {}", filter, translated);
        Ok(DirectoryFilter::And(vec![self.object_class_filter(), translated]))
    }

    fn to_directory_sort(&self, sort: &SortParameters) -> ScimResult<DirectorySort> {
        let path = &sort.sort_by;
        let mapper = self
            .mapper_for(path.schema.as_deref(), &path.attribute)
            .ok_or_else(|| ScimError::unsupported_sort(path.to_string()))?;
        let attribute = mapper.sort_attribute(path.sub_attribute.as_deref())?;
        Ok(if sort.is_descending() {
            DirectorySort::descending(attribute)
        } else {
            DirectorySort::ascending(attribute)
        })
    }

    async fn to_scim_attributes(
        &self,
        entry: &Entry,
        query: &QueryAttributes,
        reader: &dyn DirectoryReader,
    ) -> ScimResult<Vec<ScimAttribute>> {
        let mut attributes = Vec::new();
        for mapper in &self.attribute_mappers {
            if !query.is_requested(mapper.descriptor()) {
                continue;
            }
            if let Some(attribute) = mapper.to_scim_attribute(entry, reader).await? {
                attributes.push(attribute);
            }
        }
        Ok(attributes)
    }
}
