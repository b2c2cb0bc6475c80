//! Link specs: references from a group to an instance of another type.

use std::sync::Arc;

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value;

use crate::codec::{self, Document, entry_opt};
use crate::error::Result;
use crate::field::{FieldValue, Quantity, SpecField, SpecFields, SpecKind, optional_text, require_text};
use crate::parent::{Child, Parent, ParentLink, join_path};

/// Spec for a link held by a group.
///
/// # Examples
///
/// ```
/// use nwb_schema_core::*;
///
/// let link = LinkSpec::builder("the electrode table", "DynamicTable")
///     .with_name("electrodes")
///     .build()
///     .unwrap();
/// assert_eq!(link.target_type(), "DynamicTable");
/// assert!(!link.contains("quantity"));
/// ```
#[derive(Debug)]
pub struct LinkSpec {
    doc: String,
    target_type: String,
    name: Option<String>,
    quantity: Option<Quantity>,
    parent: ParentLink,
}

impl LinkSpec {
    /// Starts building a link to instances of `target_type`.
    pub fn builder(doc: impl Into<String>, target_type: impl Into<String>) -> LinkSpecBuilder {
        LinkSpecBuilder {
            doc: doc.into(),
            target_type: target_type.into(),
            name: None,
            quantity: None,
        }
    }

    pub fn doc(&self) -> &str {
        &self.doc
    }

    /// Type of the linked instance.
    pub fn target_type(&self) -> &str {
        &self.target_type
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn quantity(&self) -> Option<Quantity> {
        self.quantity
    }

    /// The group holding this link.
    pub fn parent(&self) -> Option<Parent> {
        self.parent.get()
    }

    pub fn path(&self) -> String {
        join_path(self.parent(), self.name().unwrap_or(&self.target_type))
    }

    /// Rebuilds a link from a parsed interchange document.
    pub fn from_value(value: &Value) -> Result<Arc<Self>> {
        let doc = Document::new(SpecKind::Link, value)?;
        let mut builder = Self::builder(
            doc.required_text(SpecField::Doc)?,
            doc.required_text(SpecField::TargetType)?,
        );
        builder.name = doc.text(SpecField::Name)?;
        builder.quantity = doc.parse(SpecField::Quantity)?;
        builder.build()
    }

    /// Parses a link from JSON text.
    pub fn from_json(text: &str) -> Result<Arc<Self>> {
        Self::from_value(&codec::parse_json(text)?)
    }

    /// Parses a link from YAML text.
    pub fn from_yaml(text: &str) -> Result<Arc<Self>> {
        Self::from_value(&codec::parse_yaml(text)?)
    }
}

impl SpecFields for LinkSpec {
    fn kind(&self) -> SpecKind {
        SpecKind::Link
    }

    fn get(&self, field: SpecField) -> Option<FieldValue> {
        match field {
            SpecField::Doc => FieldValue::text(Some(&self.doc)),
            SpecField::Name => FieldValue::text(self.name()),
            SpecField::Quantity => self.quantity.map(FieldValue::Quantity),
            SpecField::TargetType => FieldValue::text(Some(&self.target_type)),
            _ => None,
        }
    }
}

impl PartialEq for LinkSpec {
    fn eq(&self, other: &Self) -> bool {
        self.doc == other.doc
            && self.target_type == other.target_type
            && self.name == other.name
            && self.quantity == other.quantity
    }
}

impl Serialize for LinkSpec {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry(SpecField::Doc.key(), &self.doc)?;
        entry_opt(&mut map, SpecField::Name, &self.name)?;
        entry_opt(&mut map, SpecField::Quantity, &self.quantity)?;
        map.serialize_entry(SpecField::TargetType.key(), &self.target_type)?;
        map.end()
    }
}

impl Child for LinkSpec {
    fn parent_link(&self) -> &ParentLink {
        &self.parent
    }

    fn label(&self) -> String {
        format!("link {}", self.name().unwrap_or(&self.target_type))
    }

    fn detach_from(child: &Arc<Self>, parent: &Parent) {
        if let Parent::Group(g) = parent {
            g.release_link(child);
        }
    }
}

/// Builder for [`LinkSpec`].
#[derive(Debug, Clone)]
pub struct LinkSpecBuilder {
    doc: String,
    target_type: String,
    name: Option<String>,
    quantity: Option<Quantity>,
}

impl LinkSpecBuilder {
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_quantity(mut self, quantity: Quantity) -> Self {
        self.quantity = Some(quantity);
        self
    }

    /// Validates the fields and creates the link.
    pub fn build(self) -> Result<Arc<LinkSpec>> {
        require_text(SpecField::TargetType, &self.target_type)?;
        optional_text(SpecField::Name, self.name.as_deref())?;
        if let Some(quantity) = self.quantity {
            quantity.validate()?;
        }
        Ok(Arc::new(LinkSpec {
            doc: self.doc,
            target_type: self.target_type,
            name: self.name,
            quantity: self.quantity,
            parent: ParentLink::default(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SpecError;

    #[test]
    fn test_serializes_present_fields_only() {
        let link = LinkSpec::builder("d", "ElectrodeGroup")
            .with_quantity(Quantity::ZeroOrOne)
            .build()
            .unwrap();

        let json = serde_json::to_value(&*link).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"doc": "d", "quantity": "?", "target_type": "ElectrodeGroup"})
        );
        assert_eq!(link.path(), "ElectrodeGroup");
    }

    #[test]
    fn test_from_yaml_requires_target_type() {
        let err = LinkSpec::from_yaml("doc: d\nname: x\n").unwrap_err();
        assert!(matches!(err, SpecError::MissingField { field: "target_type", .. }));
    }
}
