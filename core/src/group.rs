//! Group specs: named containers of attributes, datasets, links and nested
//! groups.
//!
//! A group built with `neurodata_type_def` acts as the template for a new
//! container type; its children describe what every instance holds.

use std::sync::Arc;

use parking_lot::RwLock;
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value;
use tracing::debug;

use crate::attribute::AttributeSpec;
use crate::codec::{self, Document, entry_opt};
use crate::dataset::DatasetSpec;
use crate::error::{Result, SpecError};
use crate::field::{
    FieldValue, Quantity, SpecField, SpecFields, SpecKind, optional_text,
};
use crate::link::LinkSpec;
use crate::parent::{
    Child, Parent, ParentLink, WeakParent, adopt, is_self_or_ancestor, join_path, weak_group,
};

/// Spec for a group.
///
/// Children passed to the builder are attached in input order, per kind.
/// The `set_*` methods attach more children later; every attach points the
/// child's [`parent`](GroupSpec::parent) at this group and appends it to the
/// end of the matching sequence.
///
/// # Examples
///
/// ```
/// use nwb_schema_core::*;
///
/// let subgroup = GroupSpec::builder("A test subgroup")
///     .with_name("subgroup1")
///     .with_linkable(false)
///     .build()
///     .unwrap();
/// let root = GroupSpec::builder("A test group")
///     .with_name("root")
///     .with_neurodata_type_def("EphysData")
///     .build()
///     .unwrap();
///
/// root.set_group(subgroup.clone()).unwrap();
/// assert!(subgroup.parent().unwrap().is_group(&root));
/// assert_eq!(subgroup.path(), "root/subgroup1");
/// assert_eq!(root.neurodata_type_def(), Some("EphysData"));
/// ```
#[derive(Debug)]
pub struct GroupSpec {
    doc: String,
    name: Option<String>,
    quantity: Option<Quantity>,
    linkable: Option<bool>,
    neurodata_type: Option<String>,
    neurodata_type_def: Option<String>,
    attributes: RwLock<Vec<Arc<AttributeSpec>>>,
    datasets: RwLock<Vec<Arc<DatasetSpec>>>,
    groups: RwLock<Vec<Arc<GroupSpec>>>,
    links: RwLock<Vec<Arc<LinkSpec>>>,
    parent: ParentLink,
}

impl GroupSpec {
    /// Starts building a group.
    pub fn builder(doc: impl Into<String>) -> GroupSpecBuilder {
        GroupSpecBuilder {
            doc: doc.into(),
            name: None,
            quantity: None,
            linkable: None,
            neurodata_type: None,
            neurodata_type_def: None,
            attributes: Vec::new(),
            datasets: Vec::new(),
            groups: Vec::new(),
            links: Vec::new(),
        }
    }

    pub fn doc(&self) -> &str {
        &self.doc
    }

    /// Fixed name, if one was given.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn quantity(&self) -> Option<Quantity> {
        self.quantity
    }

    pub fn linkable(&self) -> Option<bool> {
        self.linkable
    }

    /// Type this group extends or references.
    pub fn neurodata_type(&self) -> Option<&str> {
        self.neurodata_type.as_deref()
    }

    /// Type this group defines.
    pub fn neurodata_type_def(&self) -> Option<&str> {
        self.neurodata_type_def.as_deref()
    }

    /// The defined type if any, otherwise the referenced type.
    pub fn data_type(&self) -> Option<&str> {
        self.neurodata_type_def().or(self.neurodata_type())
    }

    pub fn attributes(&self) -> Vec<Arc<AttributeSpec>> {
        self.attributes.read().clone()
    }

    pub fn datasets(&self) -> Vec<Arc<DatasetSpec>> {
        self.datasets.read().clone()
    }

    pub fn groups(&self) -> Vec<Arc<GroupSpec>> {
        self.groups.read().clone()
    }

    pub fn links(&self) -> Vec<Arc<LinkSpec>> {
        self.links.read().clone()
    }

    /// Finds an attribute by name.
    pub fn get_attribute(&self, name: &str) -> Option<Arc<AttributeSpec>> {
        self.attributes
            .read()
            .iter()
            .find(|a| a.name() == name)
            .cloned()
    }

    /// Finds a dataset by its fixed name.
    pub fn get_dataset(&self, name: &str) -> Option<Arc<DatasetSpec>> {
        self.datasets
            .read()
            .iter()
            .find(|d| d.name() == Some(name))
            .cloned()
    }

    /// Finds a nested group by its fixed name.
    pub fn get_group(&self, name: &str) -> Option<Arc<GroupSpec>> {
        self.groups
            .read()
            .iter()
            .find(|g| g.name() == Some(name))
            .cloned()
    }

    /// Finds a link by its fixed name.
    pub fn get_link(&self, name: &str) -> Option<Arc<LinkSpec>> {
        self.links
            .read()
            .iter()
            .find(|l| l.name() == Some(name))
            .cloned()
    }

    /// Attaches `attribute` at the end of this group's attributes.
    pub fn set_attribute(self: &Arc<Self>, attribute: Arc<AttributeSpec>) {
        debug!(group = %self.path(), attribute = attribute.name(), "attaching attribute");
        adopt(&mut self.attributes.write(), attribute, self.weak());
    }

    /// Attaches `dataset` at the end of this group's datasets.
    pub fn set_dataset(self: &Arc<Self>, dataset: Arc<DatasetSpec>) {
        debug!(group = %self.path(), dataset = %dataset.label(), "attaching dataset");
        adopt(&mut self.datasets.write(), dataset, self.weak());
    }

    /// Attaches `link` at the end of this group's links.
    pub fn set_link(self: &Arc<Self>, link: Arc<LinkSpec>) {
        debug!(group = %self.path(), link = %link.label(), "attaching link");
        adopt(&mut self.links.write(), link, self.weak());
    }

    /// Attaches `group` at the end of this group's nested groups.
    ///
    /// # Errors
    ///
    /// Returns [`SpecError::InvalidField`] if `group` is this group or one of
    /// its ancestors, since the tree would then own itself.
    pub fn set_group(self: &Arc<Self>, group: Arc<GroupSpec>) -> Result<()> {
        if is_self_or_ancestor(self, &group) {
            return Err(SpecError::InvalidField {
                field: SpecField::Groups.key(),
                reason: format!("cannot nest {} inside its own subtree", group.path()),
            });
        }
        debug!(group = %self.path(), child = %group.label(), "attaching group");
        adopt(&mut self.groups.write(), group, self.weak());
        Ok(())
    }

    /// The group holding this group.
    pub fn parent(&self) -> Option<Parent> {
        self.parent.get()
    }

    /// `/`-joined names from the top-most group down to this group.
    ///
    /// Unnamed groups contribute their data type, or `*`.
    pub fn path(&self) -> String {
        let segment = self.name().or(self.data_type()).unwrap_or("*");
        join_path(self.parent(), segment)
    }

    fn weak(self: &Arc<Self>) -> WeakParent {
        weak_group(&Arc::downgrade(self))
    }

    pub(crate) fn release_attribute(&self, attribute: &Arc<AttributeSpec>) {
        self.attributes
            .write()
            .retain(|a| !Arc::ptr_eq(a, attribute));
    }

    pub(crate) fn release_dataset(&self, dataset: &Arc<DatasetSpec>) {
        self.datasets.write().retain(|d| !Arc::ptr_eq(d, dataset));
    }

    pub(crate) fn release_group(&self, group: &Arc<GroupSpec>) {
        self.groups.write().retain(|g| !Arc::ptr_eq(g, group));
    }

    pub(crate) fn release_link(&self, link: &Arc<LinkSpec>) {
        self.links.write().retain(|l| !Arc::ptr_eq(l, link));
    }

    /// Rebuilds a group and its whole subtree from a parsed interchange
    /// document.
    ///
    /// # Errors
    ///
    /// Returns a field error naming the first unknown, missing or malformed
    /// field found anywhere in the subtree.
    pub fn from_value(value: &Value) -> Result<Arc<Self>> {
        let doc = Document::new(SpecKind::Group, value)?;
        let mut builder = Self::builder(doc.required_text(SpecField::Doc)?);
        builder.name = doc.text(SpecField::Name)?;
        builder.quantity = doc.parse(SpecField::Quantity)?;
        builder.linkable = doc.parse(SpecField::Linkable)?;
        builder.neurodata_type = doc.text(SpecField::NeurodataType)?;
        builder.neurodata_type_def = doc.text(SpecField::NeurodataTypeDef)?;
        for item in doc.children(SpecField::Attributes)? {
            builder.attributes.push(AttributeSpec::from_value(item)?);
        }
        for item in doc.children(SpecField::Datasets)? {
            builder.datasets.push(DatasetSpec::from_value(item)?);
        }
        for item in doc.children(SpecField::Groups)? {
            builder.groups.push(GroupSpec::from_value(item)?);
        }
        for item in doc.children(SpecField::Links)? {
            builder.links.push(LinkSpec::from_value(item)?);
        }
        builder.build()
    }

    /// Parses a group from JSON text.
    pub fn from_json(text: &str) -> Result<Arc<Self>> {
        Self::from_value(&codec::parse_json(text)?)
    }

    /// Parses a group from YAML text.
    pub fn from_yaml(text: &str) -> Result<Arc<Self>> {
        Self::from_value(&codec::parse_yaml(text)?)
    }
}

impl SpecFields for GroupSpec {
    fn kind(&self) -> SpecKind {
        SpecKind::Group
    }

    fn get(&self, field: SpecField) -> Option<FieldValue> {
        match field {
            SpecField::Doc => FieldValue::text(Some(&self.doc)),
            SpecField::Name => FieldValue::text(self.name()),
            SpecField::NeurodataTypeDef => FieldValue::text(self.neurodata_type_def()),
            SpecField::NeurodataType => FieldValue::text(self.neurodata_type()),
            SpecField::Quantity => self.quantity.map(FieldValue::Quantity),
            SpecField::Linkable => self.linkable.map(FieldValue::Bool),
            SpecField::Attributes => Some(FieldValue::Attributes(self.attributes())),
            SpecField::Datasets => Some(FieldValue::Datasets(self.datasets())),
            SpecField::Groups => Some(FieldValue::Groups(self.groups())),
            SpecField::Links => Some(FieldValue::Links(self.links())),
            _ => None,
        }
    }
}

impl PartialEq for GroupSpec {
    fn eq(&self, other: &Self) -> bool {
        if std::ptr::eq(self, other) {
            return true;
        }
        self.doc == other.doc
            && self.name == other.name
            && self.quantity == other.quantity
            && self.linkable == other.linkable
            && self.neurodata_type == other.neurodata_type
            && self.neurodata_type_def == other.neurodata_type_def
            && *self.attributes.read() == *other.attributes.read()
            && *self.datasets.read() == *other.datasets.read()
            && *self.groups.read() == *other.groups.read()
            && *self.links.read() == *other.links.read()
    }
}

impl Serialize for GroupSpec {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry(SpecField::Doc.key(), &self.doc)?;
        entry_opt(&mut map, SpecField::Name, &self.name)?;
        entry_opt(&mut map, SpecField::NeurodataTypeDef, &self.neurodata_type_def)?;
        entry_opt(&mut map, SpecField::NeurodataType, &self.neurodata_type)?;
        entry_opt(&mut map, SpecField::Quantity, &self.quantity)?;
        entry_opt(&mut map, SpecField::Linkable, &self.linkable)?;
        map.serialize_entry(SpecField::Attributes.key(), &*self.attributes.read())?;
        map.serialize_entry(SpecField::Datasets.key(), &*self.datasets.read())?;
        map.serialize_entry(SpecField::Groups.key(), &*self.groups.read())?;
        map.serialize_entry(SpecField::Links.key(), &*self.links.read())?;
        map.end()
    }
}

impl Child for GroupSpec {
    fn parent_link(&self) -> &ParentLink {
        &self.parent
    }

    fn label(&self) -> String {
        format!("group {}", self.name().or(self.data_type()).unwrap_or("*"))
    }

    fn detach_from(child: &Arc<Self>, parent: &Parent) {
        if let Parent::Group(g) = parent {
            g.release_group(child);
        }
    }
}

/// Builder for [`GroupSpec`].
#[derive(Debug, Clone)]
pub struct GroupSpecBuilder {
    doc: String,
    name: Option<String>,
    quantity: Option<Quantity>,
    linkable: Option<bool>,
    neurodata_type: Option<String>,
    neurodata_type_def: Option<String>,
    attributes: Vec<Arc<AttributeSpec>>,
    datasets: Vec<Arc<DatasetSpec>>,
    groups: Vec<Arc<GroupSpec>>,
    links: Vec<Arc<LinkSpec>>,
}

impl GroupSpecBuilder {
    /// Fixes the group name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_quantity(mut self, quantity: Quantity) -> Self {
        self.quantity = Some(quantity);
        self
    }

    /// States whether instances may be links.
    pub fn with_linkable(mut self, linkable: bool) -> Self {
        self.linkable = Some(linkable);
        self
    }

    /// Names the type this group extends.
    pub fn with_neurodata_type(mut self, type_name: impl Into<String>) -> Self {
        self.neurodata_type = Some(type_name.into());
        self
    }

    /// Names the type this group defines.
    pub fn with_neurodata_type_def(mut self, type_name: impl Into<String>) -> Self {
        self.neurodata_type_def = Some(type_name.into());
        self
    }

    pub fn with_attribute(mut self, attribute: Arc<AttributeSpec>) -> Self {
        self.attributes.push(attribute);
        self
    }

    pub fn with_attributes(mut self, attributes: impl IntoIterator<Item = Arc<AttributeSpec>>) -> Self {
        self.attributes.extend(attributes);
        self
    }

    pub fn with_dataset(mut self, dataset: Arc<DatasetSpec>) -> Self {
        self.datasets.push(dataset);
        self
    }

    pub fn with_datasets(mut self, datasets: impl IntoIterator<Item = Arc<DatasetSpec>>) -> Self {
        self.datasets.extend(datasets);
        self
    }

    pub fn with_group(mut self, group: Arc<GroupSpec>) -> Self {
        self.groups.push(group);
        self
    }

    pub fn with_groups(mut self, groups: impl IntoIterator<Item = Arc<GroupSpec>>) -> Self {
        self.groups.extend(groups);
        self
    }

    pub fn with_link(mut self, link: Arc<LinkSpec>) -> Self {
        self.links.push(link);
        self
    }

    /// Validates the fields, creates the group and attaches every child.
    ///
    /// # Errors
    ///
    /// Returns [`SpecError::InvalidField`] for an empty name or type name, or
    /// a zero exact `quantity`. Nothing is attached when validation fails.
    pub fn build(self) -> Result<Arc<GroupSpec>> {
        optional_text(SpecField::Name, self.name.as_deref())?;
        optional_text(SpecField::NeurodataType, self.neurodata_type.as_deref())?;
        optional_text(SpecField::NeurodataTypeDef, self.neurodata_type_def.as_deref())?;
        if let Some(quantity) = self.quantity {
            quantity.validate()?;
        }

        let spec = Arc::new_cyclic(|weak| {
            let mut attributes = Vec::with_capacity(self.attributes.len());
            for attribute in self.attributes {
                adopt(&mut attributes, attribute, weak_group(weak));
            }
            let mut datasets = Vec::with_capacity(self.datasets.len());
            for dataset in self.datasets {
                adopt(&mut datasets, dataset, weak_group(weak));
            }
            let mut groups = Vec::with_capacity(self.groups.len());
            for group in self.groups {
                adopt(&mut groups, group, weak_group(weak));
            }
            let mut links = Vec::with_capacity(self.links.len());
            for link in self.links {
                adopt(&mut links, link, weak_group(weak));
            }
            GroupSpec {
                doc: self.doc,
                name: self.name,
                quantity: self.quantity,
                linkable: self.linkable,
                neurodata_type: self.neurodata_type,
                neurodata_type_def: self.neurodata_type_def,
                attributes: RwLock::new(attributes),
                datasets: RwLock::new(datasets),
                groups: RwLock::new(groups),
                links: RwLock::new(links),
                parent: ParentLink::default(),
            }
        });
        debug!(group = %spec.path(), "built group spec");
        Ok(spec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Dimension;

    struct Fixture {
        attributes: Vec<Arc<AttributeSpec>>,
        datasets: Vec<Arc<DatasetSpec>>,
        subgroups: Vec<Arc<GroupSpec>>,
    }

    fn attribute(name: &str, doc: &str) -> Arc<AttributeSpec> {
        AttributeSpec::builder(name, "str", doc).build().unwrap()
    }

    fn fixture() -> Fixture {
        let attributes = vec![
            attribute("attribute1", "my first attribute"),
            attribute("attribute2", "my second attribute"),
        ];
        let datasets = vec![
            DatasetSpec::builder("my first dataset", "int")
                .with_name("dataset1")
                .with_attributes([
                    attribute("attribute3", "my third attribute"),
                    attribute("attribute4", "my fourth attribute"),
                ])
                .with_linkable(true)
                .build()
                .unwrap(),
            DatasetSpec::builder("my second dataset", "int")
                .with_name("dataset2")
                .with_dimension(Dimension::unconstrained(2))
                .with_attributes([
                    attribute("attribute5", "my fifth attribute"),
                    attribute("attribute6", "my sixth attribute"),
                ])
                .with_linkable(true)
                .with_neurodata_type_def("EphysData")
                .build()
                .unwrap(),
        ];
        let subgroups = vec![
            GroupSpec::builder("A test subgroup")
                .with_name("subgroup1")
                .with_linkable(false)
                .build()
                .unwrap(),
            GroupSpec::builder("A test subgroup")
                .with_name("subgroup2")
                .with_linkable(false)
                .build()
                .unwrap(),
        ];
        Fixture {
            attributes,
            datasets,
            subgroups,
        }
    }

    #[test]
    fn test_constructor() {
        let f = fixture();
        let spec = GroupSpec::builder("A test group")
            .with_name("root_constructor")
            .with_groups(f.subgroups.clone())
            .with_datasets(f.datasets.clone())
            .with_attributes(f.attributes.clone())
            .with_linkable(false)
            .build()
            .unwrap();

        assert_eq!(spec.lookup("linkable").unwrap(), Some(FieldValue::Bool(false)));
        assert_eq!(spec.attributes(), f.attributes);
        assert_eq!(spec.datasets(), f.datasets);
        assert!(!spec.contains("neurodata_type_def"));
        for group in &f.subgroups {
            assert!(group.parent().unwrap().is_group(&spec));
        }
        for attribute in &f.attributes {
            assert!(attribute.parent().unwrap().is_group(&spec));
        }
        for dataset in &f.datasets {
            assert!(dataset.parent().unwrap().is_group(&spec));
        }
        assert!(serde_json::to_string(&*spec).is_ok());
    }

    #[test]
    fn test_constructor_nwbtype() {
        let f = fixture();
        let spec = GroupSpec::builder("A test group")
            .with_name("root_constructor_nwbtype")
            .with_datasets(f.datasets.clone())
            .with_attributes(f.attributes.clone())
            .with_linkable(false)
            .with_neurodata_type_def("EphysData")
            .build()
            .unwrap();

        assert_eq!(spec.neurodata_type_def(), Some("EphysData"));
        assert_eq!(spec.datasets(), f.datasets);
        assert!(f.datasets[1].parent().unwrap().is_group(&spec));
        assert!(spec.groups().is_empty());
        assert!(spec.contains("groups"));
    }

    #[test]
    fn test_set_dataset() {
        let f = fixture();
        let spec = GroupSpec::builder("A test group")
            .with_name("root_test_set_dataset")
            .with_linkable(false)
            .with_neurodata_type_def("EphysData")
            .build()
            .unwrap();

        spec.set_dataset(f.datasets[0].clone());
        assert!(f.datasets[0].parent().unwrap().is_group(&spec));
        assert_eq!(spec.get_dataset("dataset1").unwrap().doc(), "my first dataset");
    }

    #[test]
    fn test_set_group() {
        let f = fixture();
        let spec = GroupSpec::builder("A test group")
            .with_name("root_test_set_group")
            .with_linkable(false)
            .with_neurodata_type_def("EphysData")
            .build()
            .unwrap();

        spec.set_group(f.subgroups[0].clone()).unwrap();
        spec.set_group(f.subgroups[1].clone()).unwrap();
        assert_eq!(spec.groups(), f.subgroups);
        assert!(f.subgroups[0].parent().unwrap().is_group(&spec));
        assert!(f.subgroups[1].parent().unwrap().is_group(&spec));
        assert!(serde_json::to_string(&*spec).is_ok());
    }

    #[test]
    fn test_set_group_moves_child_between_parents() {
        let f = fixture();
        let first = GroupSpec::builder("first")
            .with_name("first")
            .with_group(f.subgroups[0].clone())
            .build()
            .unwrap();
        let second = GroupSpec::builder("second").with_name("second").build().unwrap();

        second.set_group(f.subgroups[0].clone()).unwrap();

        assert!(first.groups().is_empty());
        assert_eq!(second.groups().len(), 1);
        assert!(f.subgroups[0].parent().unwrap().is_group(&second));
    }

    #[test]
    fn test_reattach_moves_child_to_end() {
        let f = fixture();
        let spec = GroupSpec::builder("g")
            .with_attributes(f.attributes.clone())
            .build()
            .unwrap();

        spec.set_attribute(f.attributes[0].clone());

        let names: Vec<_> = spec.attributes().iter().map(|a| a.name().to_string()).collect();
        assert_eq!(names, vec!["attribute2", "attribute1"]);
    }

    #[test]
    fn test_set_group_rejects_ancestor() {
        let inner = GroupSpec::builder("inner").with_name("inner").build().unwrap();
        let outer = GroupSpec::builder("outer")
            .with_name("outer")
            .with_group(inner.clone())
            .build()
            .unwrap();

        assert!(inner.set_group(outer.clone()).is_err());
        assert!(outer.set_group(outer.clone()).is_err());
        assert!(outer.parent().is_none());
    }

    #[test]
    fn test_dropping_parent_clears_back_reference() {
        let f = fixture();
        let spec = GroupSpec::builder("g")
            .with_groups(f.subgroups.clone())
            .build()
            .unwrap();
        assert!(f.subgroups[0].parent().is_some());

        drop(spec);
        assert!(f.subgroups[0].parent().is_none());
    }

    #[test]
    fn test_links_attach_and_lookup() {
        let link = LinkSpec::builder("electrodes", "DynamicTable")
            .with_name("electrodes")
            .build()
            .unwrap();
        let spec = GroupSpec::builder("g").with_name("g").build().unwrap();

        spec.set_link(link.clone());
        assert!(link.parent().unwrap().is_group(&spec));
        assert_eq!(link.path(), "g/electrodes");
        assert!(Arc::ptr_eq(&spec.get_link("electrodes").unwrap(), &link));
    }
}
