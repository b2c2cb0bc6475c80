//! Registry of named types and their extension chains.
//!
//! [`SpecCatalog`] maps a type name to the spec that defines it. Type
//! extension is plain data: each spec may name the type it extends through
//! `neurodata_type`, and [`get_hierarchy`](SpecCatalog::get_hierarchy) walks
//! those names through the catalog.
//!
//! Registration takes `&mut self` and lookups take `&self`, so a catalog is
//! populated by a single writer and can then be shared read-only across
//! threads.
//!
//! # Examples
//!
//! ```
//! use nwb_schema_core::*;
//!
//! let ephys = DatasetSpec::builder("ephys", "int")
//!     .with_neurodata_type_def("EphysData")
//!     .build()
//!     .unwrap();
//! let spikes = DatasetSpec::builder("spikes", "int")
//!     .with_neurodata_type("EphysData")
//!     .with_neurodata_type_def("SpikeData")
//!     .build()
//!     .unwrap();
//!
//! let mut catalog = SpecCatalog::new();
//! catalog.register_spec("EphysData", ephys);
//! catalog.register_spec("SpikeData", spikes);
//!
//! assert_eq!(
//!     catalog.get_hierarchy("SpikeData").unwrap(),
//!     vec!["SpikeData", "EphysData"],
//! );
//! ```

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::Spec;
use crate::error::{Result, SpecError};
use crate::field::SpecField;

/// Name-keyed registry of type-defining specs.
///
/// Entries are only ever added or overwritten; there is no removal.
#[derive(Debug, Default, Clone)]
pub struct SpecCatalog {
    specs: HashMap<String, Spec>,
}

impl SpecCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `spec` under `type_name`, replacing any previous entry.
    ///
    /// The catalog does not check that `spec` actually defines `type_name`.
    /// Handles to a replaced spec held elsewhere stay valid.
    pub fn register_spec(&mut self, type_name: impl Into<String>, spec: impl Into<Spec>) {
        let type_name = type_name.into();
        let spec = spec.into();
        debug!(type_name = %type_name, "registering spec");
        if let Some(previous) = self.specs.insert(type_name.clone(), spec) {
            warn!(
                type_name = %type_name,
                previous_doc = previous.doc(),
                "replaced registered spec"
            );
        }
    }

    /// Registers `spec` under the type name it defines.
    ///
    /// # Errors
    ///
    /// Returns [`SpecError::InvalidField`] if the spec has no
    /// `neurodata_type_def`.
    ///
    /// # Examples
    ///
    /// ```
    /// use nwb_schema_core::*;
    ///
    /// let mut catalog = SpecCatalog::new();
    /// let module = GroupSpec::builder("a module")
    ///     .with_neurodata_type_def("Module")
    ///     .build()
    ///     .unwrap();
    /// catalog.register_type(module).unwrap();
    /// assert!(catalog.contains("Module"));
    ///
    /// let untyped = GroupSpec::builder("plain").build().unwrap();
    /// assert!(catalog.register_type(untyped).is_err());
    /// ```
    pub fn register_type(&mut self, spec: impl Into<Spec>) -> Result<()> {
        let spec = spec.into();
        let type_name = spec
            .neurodata_type_def()
            .ok_or_else(|| SpecError::InvalidField {
                field: SpecField::NeurodataTypeDef.key(),
                reason: "spec does not define a type".to_string(),
            })?
            .to_string();
        self.register_spec(type_name, spec);
        Ok(())
    }

    /// Returns the spec registered under `type_name`.
    ///
    /// # Errors
    ///
    /// Returns [`SpecError::SpecNotFound`] if the name was never registered.
    pub fn get_spec(&self, type_name: &str) -> Result<&Spec> {
        self.specs
            .get(type_name)
            .ok_or_else(|| SpecError::SpecNotFound(type_name.to_string()))
    }

    /// Returns `true` if `type_name` is registered.
    pub fn contains(&self, type_name: &str) -> bool {
        self.specs.contains_key(type_name)
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// Registered type names, sorted.
    pub fn registered_types(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.specs.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Returns the chain of type names from `type_name` up through the types
    /// it extends.
    ///
    /// The walk stops at a spec with no `neurodata_type`. An extended type
    /// that is not registered ends the chain as its last entry.
    ///
    /// # Errors
    ///
    /// Returns [`SpecError::SpecNotFound`] if `type_name` itself is not
    /// registered, or [`SpecError::CyclicHierarchy`] if the chain revisits a
    /// type.
    pub fn get_hierarchy(&self, type_name: &str) -> Result<Vec<String>> {
        let mut chain = vec![type_name.to_string()];
        let mut current = self.get_spec(type_name)?;

        while let Some(extends) = current.neurodata_type() {
            let repeated = chain.iter().any(|name| name == extends);
            chain.push(extends.to_string());
            if repeated {
                return Err(SpecError::CyclicHierarchy {
                    chain: chain.join(" -> "),
                });
            }
            match self.specs.get(extends) {
                Some(next) => current = next,
                None => {
                    debug!(type_name, extends, "hierarchy ends at unregistered type");
                    break;
                }
            }
        }

        Ok(chain)
    }
}
