//! Dataset specs: named, typed blocks of data that own attributes.

use std::sync::Arc;

use parking_lot::RwLock;
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value;
use tracing::debug;

use crate::attribute::AttributeSpec;
use crate::codec::{self, Document, entry_opt};
use crate::error::Result;
use crate::field::{
    Dimension, FieldValue, Quantity, SpecField, SpecFields, SpecKind, optional_text,
    require_text,
};
use crate::parent::{Child, Parent, ParentLink, adopt, join_path, weak_dataset};

/// Spec for a dataset.
///
/// A dataset may define a new type (`neurodata_type_def`) and/or extend an
/// existing one (`neurodata_type`). Attributes passed to the builder are
/// attached in order; more can be attached later with
/// [`set_attribute`](DatasetSpec::set_attribute).
///
/// # Examples
///
/// ```
/// use nwb_schema_core::*;
///
/// let attr = AttributeSpec::builder("unit", "str", "unit of measurement")
///     .build()
///     .unwrap();
/// let spec = DatasetSpec::builder("my first dataset", "int")
///     .with_name("dataset1")
///     .with_attribute(attr.clone())
///     .build()
///     .unwrap();
///
/// assert!(attr.parent().unwrap().is_dataset(&spec));
/// assert!(!spec.contains("linkable"));
/// assert!(!spec.contains("neurodata_type_def"));
/// assert!(spec.contains("attributes"));
/// ```
#[derive(Debug)]
pub struct DatasetSpec {
    doc: String,
    dtype: String,
    name: Option<String>,
    dimension: Option<Dimension>,
    quantity: Option<Quantity>,
    linkable: Option<bool>,
    neurodata_type: Option<String>,
    neurodata_type_def: Option<String>,
    attributes: RwLock<Vec<Arc<AttributeSpec>>>,
    parent: ParentLink,
}

impl DatasetSpec {
    /// Starts building a dataset with its required fields.
    pub fn builder(doc: impl Into<String>, dtype: impl Into<String>) -> DatasetSpecBuilder {
        DatasetSpecBuilder {
            doc: doc.into(),
            dtype: dtype.into(),
            name: None,
            dimension: None,
            quantity: None,
            linkable: None,
            neurodata_type: None,
            neurodata_type_def: None,
            attributes: Vec::new(),
        }
    }

    pub fn doc(&self) -> &str {
        &self.doc
    }

    pub fn dtype(&self) -> &str {
        &self.dtype
    }

    /// Fixed name, if one was given.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn dimension(&self) -> Option<&Dimension> {
        self.dimension.as_ref()
    }

    pub fn quantity(&self) -> Option<Quantity> {
        self.quantity
    }

    pub fn linkable(&self) -> Option<bool> {
        self.linkable
    }

    /// Type this dataset extends or references.
    pub fn neurodata_type(&self) -> Option<&str> {
        self.neurodata_type.as_deref()
    }

    /// Type this dataset defines.
    pub fn neurodata_type_def(&self) -> Option<&str> {
        self.neurodata_type_def.as_deref()
    }

    /// The defined type if any, otherwise the referenced type.
    pub fn data_type(&self) -> Option<&str> {
        self.neurodata_type_def().or(self.neurodata_type())
    }

    /// Attributes in attach order.
    pub fn attributes(&self) -> Vec<Arc<AttributeSpec>> {
        self.attributes.read().clone()
    }

    /// Finds an attribute by name.
    pub fn get_attribute(&self, name: &str) -> Option<Arc<AttributeSpec>> {
        self.attributes
            .read()
            .iter()
            .find(|a| a.name() == name)
            .cloned()
    }

    /// Attaches `attribute` at the end of this dataset's attributes.
    ///
    /// The attribute's parent becomes this dataset. If another live container
    /// held it, it is removed from there first.
    pub fn set_attribute(self: &Arc<Self>, attribute: Arc<AttributeSpec>) {
        debug!(dataset = %self.path(), attribute = attribute.name(), "attaching attribute");
        adopt(
            &mut self.attributes.write(),
            attribute,
            weak_dataset(&Arc::downgrade(self)),
        );
    }

    /// The group holding this dataset.
    pub fn parent(&self) -> Option<Parent> {
        self.parent.get()
    }

    /// `/`-joined names from the top-most group down to this dataset.
    ///
    /// Unnamed datasets contribute their data type, or `*`.
    pub fn path(&self) -> String {
        let segment = self.name().or(self.data_type()).unwrap_or("*");
        join_path(self.parent(), segment)
    }

    pub(crate) fn release_attribute(&self, attribute: &Arc<AttributeSpec>) {
        self.attributes
            .write()
            .retain(|a| !Arc::ptr_eq(a, attribute));
    }

    /// Rebuilds a dataset and its attributes from a parsed interchange
    /// document.
    ///
    /// # Errors
    ///
    /// Returns a field error naming the first unknown, missing or malformed
    /// field found in the dataset or any of its attributes.
    pub fn from_value(value: &Value) -> Result<Arc<Self>> {
        let doc = Document::new(SpecKind::Dataset, value)?;
        let mut builder = Self::builder(
            doc.required_text(SpecField::Doc)?,
            doc.required_text(SpecField::Dtype)?,
        );
        builder.name = doc.text(SpecField::Name)?;
        builder.dimension = doc.parse(SpecField::Dimension)?;
        builder.quantity = doc.parse(SpecField::Quantity)?;
        builder.linkable = doc.parse(SpecField::Linkable)?;
        builder.neurodata_type = doc.text(SpecField::NeurodataType)?;
        builder.neurodata_type_def = doc.text(SpecField::NeurodataTypeDef)?;
        for item in doc.children(SpecField::Attributes)? {
            builder.attributes.push(AttributeSpec::from_value(item)?);
        }
        builder.build()
    }

    /// Parses a dataset from JSON text.
    pub fn from_json(text: &str) -> Result<Arc<Self>> {
        Self::from_value(&codec::parse_json(text)?)
    }

    /// Parses a dataset from YAML text.
    pub fn from_yaml(text: &str) -> Result<Arc<Self>> {
        Self::from_value(&codec::parse_yaml(text)?)
    }
}

impl SpecFields for DatasetSpec {
    fn kind(&self) -> SpecKind {
        SpecKind::Dataset
    }

    fn get(&self, field: SpecField) -> Option<FieldValue> {
        match field {
            SpecField::Doc => FieldValue::text(Some(&self.doc)),
            SpecField::Name => FieldValue::text(self.name()),
            SpecField::NeurodataTypeDef => FieldValue::text(self.neurodata_type_def()),
            SpecField::NeurodataType => FieldValue::text(self.neurodata_type()),
            SpecField::Dtype => FieldValue::text(Some(&self.dtype)),
            SpecField::Dimension => self.dimension.clone().map(FieldValue::Dimension),
            SpecField::Quantity => self.quantity.map(FieldValue::Quantity),
            SpecField::Linkable => self.linkable.map(FieldValue::Bool),
            SpecField::Attributes => Some(FieldValue::Attributes(self.attributes())),
            _ => None,
        }
    }
}

impl PartialEq for DatasetSpec {
    fn eq(&self, other: &Self) -> bool {
        if std::ptr::eq(self, other) {
            return true;
        }
        self.doc == other.doc
            && self.dtype == other.dtype
            && self.name == other.name
            && self.dimension == other.dimension
            && self.quantity == other.quantity
            && self.linkable == other.linkable
            && self.neurodata_type == other.neurodata_type
            && self.neurodata_type_def == other.neurodata_type_def
            && *self.attributes.read() == *other.attributes.read()
    }
}

impl Serialize for DatasetSpec {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry(SpecField::Doc.key(), &self.doc)?;
        entry_opt(&mut map, SpecField::Name, &self.name)?;
        entry_opt(&mut map, SpecField::NeurodataTypeDef, &self.neurodata_type_def)?;
        entry_opt(&mut map, SpecField::NeurodataType, &self.neurodata_type)?;
        map.serialize_entry(SpecField::Dtype.key(), &self.dtype)?;
        entry_opt(&mut map, SpecField::Dimension, &self.dimension)?;
        entry_opt(&mut map, SpecField::Quantity, &self.quantity)?;
        entry_opt(&mut map, SpecField::Linkable, &self.linkable)?;
        map.serialize_entry(SpecField::Attributes.key(), &*self.attributes.read())?;
        map.end()
    }
}

impl Child for DatasetSpec {
    fn parent_link(&self) -> &ParentLink {
        &self.parent
    }

    fn label(&self) -> String {
        format!("dataset {}", self.name().or(self.data_type()).unwrap_or("*"))
    }

    fn detach_from(child: &Arc<Self>, parent: &Parent) {
        if let Parent::Group(g) = parent {
            g.release_dataset(child);
        }
    }
}

/// Builder for [`DatasetSpec`].
#[derive(Debug, Clone)]
pub struct DatasetSpecBuilder {
    doc: String,
    dtype: String,
    name: Option<String>,
    dimension: Option<Dimension>,
    quantity: Option<Quantity>,
    linkable: Option<bool>,
    neurodata_type: Option<String>,
    neurodata_type_def: Option<String>,
    attributes: Vec<Arc<AttributeSpec>>,
}

impl DatasetSpecBuilder {
    /// Fixes the dataset name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Adds a shape constraint.
    pub fn with_dimension(mut self, dimension: impl Into<Dimension>) -> Self {
        self.dimension = Some(dimension.into());
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

    /// Names the type this dataset extends.
    pub fn with_neurodata_type(mut self, type_name: impl Into<String>) -> Self {
        self.neurodata_type = Some(type_name.into());
        self
    }

    /// Names the type this dataset defines.
    pub fn with_neurodata_type_def(mut self, type_name: impl Into<String>) -> Self {
        self.neurodata_type_def = Some(type_name.into());
        self
    }

    pub fn with_attribute(mut self, attribute: Arc<AttributeSpec>) -> Self {
        self.attributes.push(attribute);
        self
    }

    /// Adds attributes in iteration order.
    pub fn with_attributes(mut self, attributes: impl IntoIterator<Item = Arc<AttributeSpec>>) -> Self {
        self.attributes.extend(attributes);
        self
    }

    /// Validates the fields, creates the dataset and attaches its attributes.
    ///
    /// # Errors
    ///
    /// Returns [`SpecError::InvalidField`](crate::SpecError::InvalidField) for
    /// an empty `dtype`, name or type name, a zero extent in `dimension`, or a
    /// zero exact `quantity`. Nothing is attached when validation fails.
    pub fn build(self) -> Result<Arc<DatasetSpec>> {
        require_text(SpecField::Dtype, &self.dtype)?;
        optional_text(SpecField::Name, self.name.as_deref())?;
        optional_text(SpecField::NeurodataType, self.neurodata_type.as_deref())?;
        optional_text(SpecField::NeurodataTypeDef, self.neurodata_type_def.as_deref())?;
        if let Some(dimension) = &self.dimension {
            dimension.validate()?;
        }
        if let Some(quantity) = self.quantity {
            quantity.validate()?;
        }

        let spec = Arc::new_cyclic(|weak| {
            let mut attributes = Vec::with_capacity(self.attributes.len());
            for attribute in self.attributes {
                adopt(&mut attributes, attribute, weak_dataset(weak));
            }
            DatasetSpec {
                doc: self.doc,
                dtype: self.dtype,
                name: self.name,
                dimension: self.dimension,
                quantity: self.quantity,
                linkable: self.linkable,
                neurodata_type: self.neurodata_type,
                neurodata_type_def: self.neurodata_type_def,
                attributes: RwLock::new(attributes),
                parent: ParentLink::default(),
            }
        });
        debug!(dataset = %spec.path(), "built dataset spec");
        Ok(spec)
    }
}
