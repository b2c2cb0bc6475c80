//! Type-carrying spec handle stored in the catalog.

use std::sync::Arc;

use serde::{Serialize, Serializer};
use serde_json::Value;

use crate::codec;
use crate::error::Result;
use crate::field::{FieldValue, SpecField, SpecFields, SpecKind};
use crate::{DatasetSpec, GroupSpec, Parent};

/// A dataset or group spec, the node kinds that can define types.
///
/// Cloning a `Spec` clones the handle, not the node.
#[derive(Debug, Clone, PartialEq)]
pub enum Spec {
    /// A group spec.
    Group(Arc<GroupSpec>),
    /// A dataset spec.
    Dataset(Arc<DatasetSpec>),
}

impl Spec {
    /// Type the spec extends or references.
    pub fn neurodata_type(&self) -> Option<&str> {
        match self {
            Spec::Group(g) => g.neurodata_type(),
            Spec::Dataset(d) => d.neurodata_type(),
        }
    }

    /// Type the spec defines.
    pub fn neurodata_type_def(&self) -> Option<&str> {
        match self {
            Spec::Group(g) => g.neurodata_type_def(),
            Spec::Dataset(d) => d.neurodata_type_def(),
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Spec::Group(g) => g.name(),
            Spec::Dataset(d) => d.name(),
        }
    }

    pub fn doc(&self) -> &str {
        match self {
            Spec::Group(g) => g.doc(),
            Spec::Dataset(d) => d.doc(),
        }
    }

    pub fn parent(&self) -> Option<Parent> {
        match self {
            Spec::Group(g) => g.parent(),
            Spec::Dataset(d) => d.parent(),
        }
    }

    pub fn as_group(&self) -> Option<&Arc<GroupSpec>> {
        match self {
            Spec::Group(g) => Some(g),
            Spec::Dataset(_) => None,
        }
    }

    pub fn as_dataset(&self) -> Option<&Arc<DatasetSpec>> {
        match self {
            Spec::Dataset(d) => Some(d),
            Spec::Group(_) => None,
        }
    }

    /// Whether both handles point at the same node.
    pub fn ptr_eq(&self, other: &Spec) -> bool {
        match (self, other) {
            (Spec::Group(a), Spec::Group(b)) => Arc::ptr_eq(a, b),
            (Spec::Dataset(a), Spec::Dataset(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Rebuilds a dataset or group from a parsed interchange document.
    ///
    /// Documents carrying a `dtype` key are datasets; all others are groups.
    ///
    /// # Examples
    ///
    /// ```
    /// use nwb_schema_core::Spec;
    ///
    /// let spec = Spec::from_json(r#"{"doc": "raw data", "dtype": "int16"}"#).unwrap();
    /// assert!(spec.as_dataset().is_some());
    ///
    /// let spec = Spec::from_yaml("doc: a container\nneurodata_type_def: Module\n").unwrap();
    /// assert_eq!(spec.neurodata_type_def(), Some("Module"));
    /// ```
    pub fn from_value(value: &Value) -> Result<Self> {
        if value.get(SpecField::Dtype.key()).is_some() {
            DatasetSpec::from_value(value).map(Spec::Dataset)
        } else {
            GroupSpec::from_value(value).map(Spec::Group)
        }
    }

    /// Parses a dataset or group from JSON text.
    pub fn from_json(text: &str) -> Result<Self> {
        Self::from_value(&codec::parse_json(text)?)
    }

    /// Parses a dataset or group from YAML text.
    pub fn from_yaml(text: &str) -> Result<Self> {
        Self::from_value(&codec::parse_yaml(text)?)
    }
}

impl From<Arc<GroupSpec>> for Spec {
    fn from(group: Arc<GroupSpec>) -> Self {
        Spec::Group(group)
    }
}

impl From<Arc<DatasetSpec>> for Spec {
    fn from(dataset: Arc<DatasetSpec>) -> Self {
        Spec::Dataset(dataset)
    }
}

impl SpecFields for Spec {
    fn kind(&self) -> SpecKind {
        match self {
            Spec::Group(_) => SpecKind::Group,
            Spec::Dataset(_) => SpecKind::Dataset,
        }
    }

    fn get(&self, field: SpecField) -> Option<FieldValue> {
        match self {
            Spec::Group(g) => g.get(field),
            Spec::Dataset(d) => d.get(field),
        }
    }
}

impl Serialize for Spec {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Spec::Group(g) => g.serialize(serializer),
            Spec::Dataset(d) => d.serialize(serializer),
        }
    }
}
