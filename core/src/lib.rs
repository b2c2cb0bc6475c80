//! Schema specification nodes and a type-hierarchy catalog.
//!
//! This crate describes the structure of hierarchical, typed containers:
//!
//! - [`AttributeSpec`] — a named scalar or array property.
//! - [`DatasetSpec`] — a typed block of data owning attributes.
//! - [`GroupSpec`] — a container owning attributes, datasets, links and
//!   nested groups.
//! - [`LinkSpec`] — a reference from a group to an instance of another type.
//! - [`SpecCatalog`] — a registry from type name to defining [`Spec`], with
//!   resolution of extension chains.
//!
//! Containers own their children; each child keeps a non-owning back-reference
//! to its container, readable through `parent()`. Every node can be inspected
//! generically through [`SpecFields`] and serialized with serde, emitting only
//! the fields that were actually supplied.
//!
//! # Example
//!
//! ```
//! use nwb_schema_core::*;
//!
//! let timestamps = DatasetSpec::builder("sample times", "float64")
//!     .with_name("timestamps")
//!     .with_attribute(
//!         AttributeSpec::builder("unit", "text", "time unit").build().unwrap(),
//!     )
//!     .build()
//!     .unwrap();
//! let series = GroupSpec::builder("a time series")
//!     .with_neurodata_type_def("TimeSeries")
//!     .with_dataset(timestamps.clone())
//!     .build()
//!     .unwrap();
//!
//! assert!(timestamps.parent().unwrap().is_group(&series));
//! assert!(!series.contains("linkable"));
//!
//! let mut catalog = SpecCatalog::new();
//! catalog.register_type(series.clone()).unwrap();
//! assert_eq!(catalog.get_hierarchy("TimeSeries").unwrap(), vec!["TimeSeries"]);
//! ```

mod attribute;
mod catalog;
mod codec;
mod dataset;
mod error;
mod field;
mod group;
mod link;
mod parent;
mod spec;

pub use attribute::{AttributeSpec, AttributeSpecBuilder};
pub use catalog::SpecCatalog;
pub use codec::{to_json, to_json_pretty, to_yaml};
pub use dataset::{DatasetSpec, DatasetSpecBuilder};
pub use error::{Result, SpecError};
pub use field::{Dimension, FieldValue, Quantity, SpecField, SpecFields, SpecKind};
pub use group::{GroupSpec, GroupSpecBuilder};
pub use link::{LinkSpec, LinkSpecBuilder};
pub use parent::Parent;
pub use spec::Spec;
