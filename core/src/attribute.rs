//! Attribute specs: named scalar or array properties of a dataset or group.

use std::sync::Arc;

use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::Value;

use crate::codec::{self, Document, entry_opt};
use crate::error::Result;
use crate::field::{
    Dimension, FieldValue, SpecField, SpecFields, SpecKind, require_text,
};
use crate::parent::{Child, Parent, ParentLink, join_path};

/// Spec for a single named attribute.
///
/// Attributes are leaves. They are built once through
/// [`AttributeSpec::builder`] and then attached to a [`DatasetSpec`] or
/// [`GroupSpec`], which sets the [`parent`](AttributeSpec::parent)
/// back-reference.
///
/// [`DatasetSpec`]: crate::DatasetSpec
/// [`GroupSpec`]: crate::GroupSpec
///
/// # Examples
///
/// ```
/// use nwb_schema_core::*;
///
/// let spec = AttributeSpec::builder("attribute1", "str", "my first attribute")
///     .build()
///     .unwrap();
///
/// assert_eq!(spec.name(), "attribute1");
/// assert_eq!(spec.dtype(), "str");
/// assert!(spec.parent().is_none());
/// assert!(!spec.contains("dimension"));
/// ```
#[derive(Debug)]
pub struct AttributeSpec {
    name: String,
    dtype: String,
    doc: String,
    dimension: Option<Dimension>,
    required: Option<bool>,
    parent: ParentLink,
}

impl AttributeSpec {
    /// Starts building an attribute with its required fields.
    pub fn builder(
        name: impl Into<String>,
        dtype: impl Into<String>,
        doc: impl Into<String>,
    ) -> AttributeSpecBuilder {
        AttributeSpecBuilder {
            name: name.into(),
            dtype: dtype.into(),
            doc: doc.into(),
            dimension: None,
            required: None,
        }
    }

    /// Attribute name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Data type of the attribute value.
    pub fn dtype(&self) -> &str {
        &self.dtype
    }

    /// Descriptive text.
    pub fn doc(&self) -> &str {
        &self.doc
    }

    /// Shape constraint, if one was given.
    pub fn dimension(&self) -> Option<&Dimension> {
        self.dimension.as_ref()
    }

    /// Whether the attribute must be present, if stated.
    pub fn required(&self) -> Option<bool> {
        self.required
    }

    /// The dataset or group holding this attribute.
    pub fn parent(&self) -> Option<Parent> {
        self.parent.get()
    }

    /// `/`-joined names from the top-most container down to this attribute.
    pub fn path(&self) -> String {
        join_path(self.parent(), &self.name)
    }

    /// Rebuilds an attribute from a parsed interchange document.
    ///
    /// # Errors
    ///
    /// Returns [`SpecError::UnknownField`](crate::SpecError::UnknownField) for
    /// keys outside the attribute vocabulary, and
    /// [`SpecError::MissingField`](crate::SpecError::MissingField) or
    /// [`SpecError::InvalidField`](crate::SpecError::InvalidField) for absent
    /// or malformed values.
    pub fn from_value(value: &Value) -> Result<Arc<Self>> {
        let doc = Document::new(SpecKind::Attribute, value)?;
        let mut builder = Self::builder(
            doc.required_text(SpecField::Name)?,
            doc.required_text(SpecField::Dtype)?,
            doc.required_text(SpecField::Doc)?,
        );
        builder.dimension = doc.parse(SpecField::Dimension)?;
        builder.required = doc.parse(SpecField::Required)?;
        builder.build()
    }

    /// Parses an attribute from JSON text.
    pub fn from_json(text: &str) -> Result<Arc<Self>> {
        Self::from_value(&codec::parse_json(text)?)
    }

    /// Parses an attribute from YAML text.
    pub fn from_yaml(text: &str) -> Result<Arc<Self>> {
        Self::from_value(&codec::parse_yaml(text)?)
    }
}

impl SpecFields for AttributeSpec {
    fn kind(&self) -> SpecKind {
        SpecKind::Attribute
    }

    fn get(&self, field: SpecField) -> Option<FieldValue> {
        match field {
            SpecField::Doc => FieldValue::text(Some(&self.doc)),
            SpecField::Name => FieldValue::text(Some(&self.name)),
            SpecField::Dtype => FieldValue::text(Some(&self.dtype)),
            SpecField::Dimension => self.dimension.clone().map(FieldValue::Dimension),
            SpecField::Required => self.required.map(FieldValue::Bool),
            _ => None,
        }
    }
}

impl PartialEq for AttributeSpec {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.dtype == other.dtype
            && self.doc == other.doc
            && self.dimension == other.dimension
            && self.required == other.required
    }
}

impl Serialize for AttributeSpec {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry(SpecField::Doc.key(), &self.doc)?;
        map.serialize_entry(SpecField::Name.key(), &self.name)?;
        map.serialize_entry(SpecField::Dtype.key(), &self.dtype)?;
        entry_opt(&mut map, SpecField::Dimension, &self.dimension)?;
        entry_opt(&mut map, SpecField::Required, &self.required)?;
        map.end()
    }
}

impl Child for AttributeSpec {
    fn parent_link(&self) -> &ParentLink {
        &self.parent
    }

    fn label(&self) -> String {
        format!("attribute {}", self.name)
    }

    fn detach_from(child: &Arc<Self>, parent: &Parent) {
        match parent {
            Parent::Group(g) => g.release_attribute(child),
            Parent::Dataset(d) => d.release_attribute(child),
        }
    }
}

/// Builder for [`AttributeSpec`].
#[derive(Debug, Clone)]
pub struct AttributeSpecBuilder {
    name: String,
    dtype: String,
    doc: String,
    dimension: Option<Dimension>,
    required: Option<bool>,
}

impl AttributeSpecBuilder {
    /// Adds a shape constraint.
    pub fn with_dimension(mut self, dimension: impl Into<Dimension>) -> Self {
        self.dimension = Some(dimension.into());
        self
    }

    /// States whether the attribute must be present.
    pub fn with_required(mut self, required: bool) -> Self {
        self.required = Some(required);
        self
    }

    /// Validates the fields and creates the attribute.
    ///
    /// # Errors
    ///
    /// Returns [`SpecError::InvalidField`](crate::SpecError::InvalidField) if
    /// `name` or `dtype` is empty or `dimension` has a zero extent.
    pub fn build(self) -> Result<Arc<AttributeSpec>> {
        require_text(SpecField::Name, &self.name)?;
        require_text(SpecField::Dtype, &self.dtype)?;
        if let Some(dimension) = &self.dimension {
            dimension.validate()?;
        }
        Ok(Arc::new(AttributeSpec {
            name: self.name,
            dtype: self.dtype,
            doc: self.doc,
            dimension: self.dimension,
            required: self.required,
            parent: ParentLink::default(),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SpecError;

    #[test]
    fn test_constructor() {
        let spec = AttributeSpec::builder("attribute1", "str", "my first attribute")
            .build()
            .unwrap();

        assert_eq!(spec.lookup("name").unwrap(), Some(FieldValue::Text("attribute1".into())));
        assert_eq!(spec.lookup("dtype").unwrap(), Some(FieldValue::Text("str".into())));
        assert_eq!(
            spec.lookup("doc").unwrap(),
            Some(FieldValue::Text("my first attribute".into()))
        );
        assert!(spec.parent().is_none());
        assert!(serde_json::to_string(&*spec).is_ok());
    }

    #[test]
    fn test_omitted_optionals_are_absent() {
        let spec = AttributeSpec::builder("unit", "text", "unit").build().unwrap();

        assert_eq!(
            spec.keys(),
            vec![SpecField::Doc, SpecField::Name, SpecField::Dtype]
        );
        let json = serde_json::to_value(&*spec).unwrap();
        assert!(json.get("dimension").is_none());
        assert!(json.get("required").is_none());
    }

    #[test]
    fn test_required_false_is_present() {
        let spec = AttributeSpec::builder("unit", "text", "unit")
            .with_required(false)
            .build()
            .unwrap();

        assert!(spec.contains("required"));
        assert_eq!(spec.required(), Some(false));
    }

    #[test]
    fn test_rejects_empty_dtype() {
        let err = AttributeSpec::builder("unit", " ", "unit").build().unwrap_err();
        assert!(matches!(err, SpecError::InvalidField { field: "dtype", .. }));
    }

    #[test]
    fn test_from_json_rejects_unknown_key() {
        let err = AttributeSpec::from_json(
            r#"{"doc": "d", "name": "a", "dtype": "int", "linkable": true}"#,
        )
        .unwrap_err();
        assert!(matches!(err, SpecError::UnknownField { ref field, .. } if field == "linkable"));
    }

    #[test]
    fn test_from_json_requires_name() {
        let err = AttributeSpec::from_json(r#"{"doc": "d", "dtype": "int"}"#).unwrap_err();
        assert!(matches!(err, SpecError::MissingField { field: "name", .. }));
    }
}
