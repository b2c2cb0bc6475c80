//! Closed field vocabulary shared by every spec node.
//!
//! Spec nodes behave like mappings from field name to value, but only a fixed
//! set of names is meaningful for each [`SpecKind`]. [`SpecField`] enumerates
//! that vocabulary, [`FieldValue`] carries a typed value out of a node, and the
//! [`SpecFields`] trait gives generic, reflection-free inspection.
//!
//! # Examples
//!
//! ```
//! use nwb_schema_core::*;
//!
//! let attr = AttributeSpec::builder("unit", "text", "unit of measurement")
//!     .build()
//!     .unwrap();
//!
//! assert!(attr.contains("dtype"));
//! assert!(!attr.contains("dimension"));
//! assert_eq!(
//!     attr.lookup("dtype").unwrap(),
//!     Some(FieldValue::Text("text".into())),
//! );
//! assert!(attr.lookup("linkabel").is_err());
//! ```

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{Result, SpecError};
use crate::{AttributeSpec, DatasetSpec, GroupSpec, LinkSpec};

/// Kind of spec node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpecKind {
    /// A named scalar/array property ([`AttributeSpec`]).
    Attribute,
    /// A typed block of data ([`DatasetSpec`]).
    Dataset,
    /// A named container ([`GroupSpec`]).
    Group,
    /// A link to an instance of another type ([`LinkSpec`]).
    Link,
}

impl SpecKind {
    /// Legal fields for this kind, in serialization order.
    pub fn fields(self) -> &'static [SpecField] {
        use SpecField as F;
        match self {
            SpecKind::Attribute => &[F::Doc, F::Name, F::Dtype, F::Dimension, F::Required],
            SpecKind::Dataset => &[
                F::Doc,
                F::Name,
                F::NeurodataTypeDef,
                F::NeurodataType,
                F::Dtype,
                F::Dimension,
                F::Quantity,
                F::Linkable,
                F::Attributes,
            ],
            SpecKind::Group => &[
                F::Doc,
                F::Name,
                F::NeurodataTypeDef,
                F::NeurodataType,
                F::Quantity,
                F::Linkable,
                F::Attributes,
                F::Datasets,
                F::Groups,
                F::Links,
            ],
            SpecKind::Link => &[F::Doc, F::Name, F::Quantity, F::TargetType],
        }
    }

    /// Resolves a field name against this kind's vocabulary.
    ///
    /// # Errors
    ///
    /// Returns [`SpecError::UnknownField`] if `key` is not a legal field for
    /// this kind.
    pub fn field(self, key: &str) -> Result<SpecField> {
        SpecField::from_key(key)
            .filter(|field| self.fields().contains(field))
            .ok_or_else(|| SpecError::UnknownField {
                kind: self,
                field: key.to_string(),
            })
    }

    /// Lowercase name used in messages.
    pub fn as_str(self) -> &'static str {
        match self {
            SpecKind::Attribute => "attribute",
            SpecKind::Dataset => "dataset",
            SpecKind::Group => "group",
            SpecKind::Link => "link",
        }
    }
}

impl fmt::Display for SpecKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A field name from the closed spec vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpecField {
    /// Descriptive text (always present).
    Doc,
    /// Exact name; absent means the container names the instance.
    Name,
    /// Type name this node defines.
    NeurodataTypeDef,
    /// Type name this node extends or references.
    NeurodataType,
    /// Data type of a dataset or attribute.
    Dtype,
    /// Shape constraint.
    Dimension,
    /// Multiplicity of instances inside the container.
    Quantity,
    /// Whether an attribute must be present.
    Required,
    /// Whether instances may be links instead of concrete copies.
    Linkable,
    /// Target type of a link.
    TargetType,
    /// Child attributes.
    Attributes,
    /// Child datasets.
    Datasets,
    /// Child groups.
    Groups,
    /// Child links.
    Links,
}

impl SpecField {
    /// Every field, in serialization order.
    pub const ALL: [SpecField; 14] = [
        SpecField::Doc,
        SpecField::Name,
        SpecField::NeurodataTypeDef,
        SpecField::NeurodataType,
        SpecField::Dtype,
        SpecField::Dimension,
        SpecField::Quantity,
        SpecField::Required,
        SpecField::Linkable,
        SpecField::TargetType,
        SpecField::Attributes,
        SpecField::Datasets,
        SpecField::Groups,
        SpecField::Links,
    ];

    /// Key used in mappings and interchange documents.
    pub const fn key(self) -> &'static str {
        match self {
            SpecField::Doc => "doc",
            SpecField::Name => "name",
            SpecField::NeurodataTypeDef => "neurodata_type_def",
            SpecField::NeurodataType => "neurodata_type",
            SpecField::Dtype => "dtype",
            SpecField::Dimension => "dimension",
            SpecField::Quantity => "quantity",
            SpecField::Required => "required",
            SpecField::Linkable => "linkable",
            SpecField::TargetType => "target_type",
            SpecField::Attributes => "attributes",
            SpecField::Datasets => "datasets",
            SpecField::Groups => "groups",
            SpecField::Links => "links",
        }
    }

    /// Parses a key, returning `None` for names outside the vocabulary.
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.key() == key)
    }

    /// Whether this field holds a sequence of child specs.
    pub fn is_children(self) -> bool {
        matches!(
            self,
            SpecField::Attributes | SpecField::Datasets | SpecField::Groups | SpecField::Links
        )
    }
}

impl fmt::Display for SpecField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Shape constraint: one entry per axis, `None` for an unconstrained extent.
///
/// # Examples
///
/// ```
/// use nwb_schema_core::Dimension;
///
/// let shape = Dimension::unconstrained(2);
/// assert_eq!(shape.rank(), 2);
/// assert_eq!(serde_json::to_string(&shape).unwrap(), "[null,null]");
///
/// let fixed = Dimension::from(vec![Some(3), None]);
/// assert_eq!(fixed.axes(), &[Some(3), None]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Dimension(Vec<Option<u64>>);

impl Dimension {
    /// A shape of `rank` axes with no extent constraints.
    pub fn unconstrained(rank: usize) -> Self {
        Self(vec![None; rank])
    }

    /// Per-axis extents.
    pub fn axes(&self) -> &[Option<u64>] {
        &self.0
    }

    /// Number of axes.
    pub fn rank(&self) -> usize {
        self.0.len()
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if let Some(axis) = self.0.iter().position(|extent| *extent == Some(0)) {
            return Err(SpecError::InvalidField {
                field: SpecField::Dimension.key(),
                reason: format!("axis {axis} has extent 0; extents must be positive"),
            });
        }
        Ok(())
    }
}

impl From<Vec<Option<u64>>> for Dimension {
    fn from(axes: Vec<Option<u64>>) -> Self {
        Self(axes)
    }
}

impl FromIterator<Option<u64>> for Dimension {
    fn from_iter<I: IntoIterator<Item = Option<u64>>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// How many instances of a dataset, group or link a container may hold.
///
/// Serializes as `"?"`, `"*"`, `"+"` or a positive integer.
///
/// # Examples
///
/// ```
/// use nwb_schema_core::Quantity;
///
/// assert_eq!(serde_json::to_string(&Quantity::ZeroOrMany).unwrap(), "\"*\"");
/// assert_eq!(serde_json::to_string(&Quantity::Exactly(2)).unwrap(), "2");
/// let q: Quantity = serde_json::from_str("\"+\"").unwrap();
/// assert_eq!(q, Quantity::OneOrMany);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "QuantityRepr", into = "QuantityRepr")]
pub enum Quantity {
    /// `?`
    ZeroOrOne,
    /// `*`
    ZeroOrMany,
    /// `+`
    OneOrMany,
    /// A fixed, positive count.
    Exactly(u64),
}

impl Quantity {
    pub(crate) fn validate(self) -> Result<()> {
        if self == Quantity::Exactly(0) {
            return Err(SpecError::InvalidField {
                field: SpecField::Quantity.key(),
                reason: "exact quantity must be positive".to_string(),
            });
        }
        Ok(())
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum QuantityRepr {
    Count(u64),
    Symbol(String),
}

impl From<Quantity> for QuantityRepr {
    fn from(quantity: Quantity) -> Self {
        match quantity {
            Quantity::ZeroOrOne => QuantityRepr::Symbol("?".into()),
            Quantity::ZeroOrMany => QuantityRepr::Symbol("*".into()),
            Quantity::OneOrMany => QuantityRepr::Symbol("+".into()),
            Quantity::Exactly(n) => QuantityRepr::Count(n),
        }
    }
}

impl TryFrom<QuantityRepr> for Quantity {
    type Error = SpecError;

    fn try_from(repr: QuantityRepr) -> Result<Self> {
        let quantity = match repr {
            QuantityRepr::Count(n) => Quantity::Exactly(n),
            QuantityRepr::Symbol(symbol) => match symbol.as_str() {
                "?" | "zero_or_one" => Quantity::ZeroOrOne,
                "*" | "zero_or_many" => Quantity::ZeroOrMany,
                "+" | "one_or_many" => Quantity::OneOrMany,
                other => {
                    return Err(SpecError::InvalidField {
                        field: SpecField::Quantity.key(),
                        reason: format!("unrecognized quantity `{other}`"),
                    });
                }
            },
        };
        quantity.validate()?;
        Ok(quantity)
    }
}

/// Typed value of one field, as returned by [`SpecFields::get`].
///
/// Child sequences hold shared handles to the very nodes owned by the
/// container, in attach order.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// `doc`, `name`, `dtype`, type names, `target_type`.
    Text(String),
    /// `linkable`, `required`.
    Bool(bool),
    /// `dimension`.
    Dimension(Dimension),
    /// `quantity`.
    Quantity(Quantity),
    /// `attributes`.
    Attributes(Vec<Arc<AttributeSpec>>),
    /// `datasets`.
    Datasets(Vec<Arc<DatasetSpec>>),
    /// `groups`.
    Groups(Vec<Arc<GroupSpec>>),
    /// `links`.
    Links(Vec<Arc<LinkSpec>>),
}

impl FieldValue {
    /// Returns the text if this is a [`FieldValue::Text`].
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Text(text) => Some(text),
            _ => None,
        }
    }

    /// Returns the flag if this is a [`FieldValue::Bool`].
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Bool(flag) => Some(*flag),
            _ => None,
        }
    }

    pub(crate) fn text(value: Option<&str>) -> Option<Self> {
        value.map(|v| FieldValue::Text(v.to_string()))
    }
}

/// Mapping-like inspection shared by every spec node.
///
/// Implementors only provide [`kind`](SpecFields::kind) and
/// [`get`](SpecFields::get); a field the caller never supplied is reported as
/// absent, never as an empty or false value.
pub trait SpecFields {
    /// Kind of this node.
    fn kind(&self) -> SpecKind;

    /// Value of `field`, or `None` when the field is absent.
    fn get(&self, field: SpecField) -> Option<FieldValue>;

    /// Whether `field` is present on this node.
    fn has(&self, field: SpecField) -> bool {
        self.get(field).is_some()
    }

    /// Membership test by key; unknown keys are simply not present.
    fn contains(&self, key: &str) -> bool {
        self.kind()
            .field(key)
            .is_ok_and(|field| self.has(field))
    }

    /// Present fields, in serialization order.
    fn keys(&self) -> Vec<SpecField> {
        self.kind()
            .fields()
            .iter()
            .copied()
            .filter(|field| self.has(*field))
            .collect()
    }

    /// Lookup by key.
    ///
    /// # Errors
    ///
    /// Returns [`SpecError::UnknownField`] if `key` is not legal for this
    /// node kind.
    fn lookup(&self, key: &str) -> Result<Option<FieldValue>> {
        let field = self.kind().field(key)?;
        Ok(self.get(field))
    }
}

pub(crate) fn require_text(field: SpecField, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(SpecError::InvalidField {
            field: field.key(),
            reason: "value cannot be empty".to_string(),
        });
    }
    Ok(())
}

pub(crate) fn optional_text(field: SpecField, value: Option<&str>) -> Result<()> {
    value.map_or(Ok(()), |v| require_text(field, v))
}
