//! Interchange text for spec trees.
//!
//! Specs serialize to a tree of key/value pairs with child sequences nested
//! under their field name; only present fields are written. The same shape
//! is read back by each node kind's `from_value`, which re-attaches every
//! child so parent back-references are correct in the rebuilt tree.
//!
//! # Examples
//!
//! ```
//! use nwb_schema_core::*;
//!
//! let dataset = DatasetSpec::builder("spike times", "float")
//!     .with_name("times")
//!     .build()
//!     .unwrap();
//!
//! let yaml = to_yaml(&*dataset).unwrap();
//! let rebuilt = DatasetSpec::from_yaml(&yaml).unwrap();
//! assert_eq!(*rebuilt, *dataset);
//! ```

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde::ser::SerializeMap;
use serde_json::{Map, Value};

use crate::error::{Result, SpecError};
use crate::field::{SpecField, SpecKind};

/// Serializes a spec to compact JSON.
pub fn to_json<T: Serialize + ?Sized>(spec: &T) -> Result<String> {
    Ok(serde_json::to_string(spec)?)
}

/// Serializes a spec to indented JSON.
pub fn to_json_pretty<T: Serialize + ?Sized>(spec: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(spec)?)
}

/// Serializes a spec to YAML.
pub fn to_yaml<T: Serialize + ?Sized>(spec: &T) -> Result<String> {
    Ok(serde_yaml::to_string(spec)?)
}

pub(crate) fn parse_json(text: &str) -> Result<Value> {
    Ok(serde_json::from_str(text)?)
}

pub(crate) fn parse_yaml(text: &str) -> Result<Value> {
    Ok(serde_yaml::from_str(text)?)
}

/// Writes `field` only when `value` is present.
pub(crate) fn entry_opt<M, T>(map: &mut M, field: SpecField, value: &Option<T>) -> std::result::Result<(), M::Error>
where
    M: SerializeMap,
    T: Serialize,
{
    match value {
        Some(value) => map.serialize_entry(field.key(), value),
        None => Ok(()),
    }
}

/// A parsed interchange mapping checked against one node kind's vocabulary.
pub(crate) struct Document<'a> {
    kind: SpecKind,
    map: &'a Map<String, Value>,
}

impl<'a> Document<'a> {
    pub(crate) fn new(kind: SpecKind, value: &'a Value) -> Result<Self> {
        let map = value.as_object().ok_or_else(|| SpecError::InvalidField {
            field: "spec",
            reason: format!("expected a mapping for a {kind} spec"),
        })?;
        for key in map.keys() {
            kind.field(key)?;
        }
        Ok(Self { kind, map })
    }

    /// `null` counts as absent.
    fn value(&self, field: SpecField) -> Option<&'a Value> {
        self.map.get(field.key()).filter(|v| !v.is_null())
    }

    pub(crate) fn text(&self, field: SpecField) -> Result<Option<String>> {
        self.parse(field)
    }

    pub(crate) fn required_text(&self, field: SpecField) -> Result<String> {
        self.text(field)?.ok_or(SpecError::MissingField {
            kind: self.kind,
            field: field.key(),
        })
    }

    pub(crate) fn parse<T: DeserializeOwned>(&self, field: SpecField) -> Result<Option<T>> {
        self.value(field)
            .map(|v| {
                serde_json::from_value(v.clone()).map_err(|e| SpecError::InvalidField {
                    field: field.key(),
                    reason: e.to_string(),
                })
            })
            .transpose()
    }

    pub(crate) fn children(&self, field: SpecField) -> Result<&'a [Value]> {
        match self.value(field) {
            None => Ok(&[]),
            Some(Value::Array(items)) => Ok(items),
            Some(_) => Err(SpecError::InvalidField {
                field: field.key(),
                reason: "expected a sequence of specs".to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_document_rejects_non_mapping() {
        let value = json!(["doc"]);
        assert!(matches!(
            Document::new(SpecKind::Group, &value),
            Err(SpecError::InvalidField { field: "spec", .. })
        ));
    }

    #[test]
    fn test_document_treats_null_as_absent() {
        let value = json!({"doc": "d", "name": null});
        let doc = Document::new(SpecKind::Group, &value).unwrap();
        assert_eq!(doc.text(SpecField::Name).unwrap(), None);
        assert_eq!(doc.required_text(SpecField::Doc).unwrap(), "d");
    }

    #[test]
    fn test_document_reports_malformed_value() {
        let value = json!({"doc": "d", "linkable": "yes"});
        let doc = Document::new(SpecKind::Group, &value).unwrap();
        let err = doc.parse::<bool>(SpecField::Linkable).unwrap_err();
        assert!(matches!(err, SpecError::InvalidField { field: "linkable", .. }));
    }

    #[test]
    fn test_children_must_be_sequence() {
        let value = json!({"doc": "d", "groups": {"doc": "x"}});
        let doc = Document::new(SpecKind::Group, &value).unwrap();
        assert!(doc.children(SpecField::Groups).is_err());
        assert!(doc.children(SpecField::Datasets).unwrap().is_empty());
    }
}
