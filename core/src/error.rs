//! Error types for spec construction, inspection and catalog lookups.
//!
//! Field errors are raised while a node is being built or reconstructed from
//! an interchange document, so a node either exists fully valid or not at
//! all. Catalog errors name the type that could not be resolved.

use thiserror::Error;

use crate::field::SpecKind;

/// Errors raised by spec nodes and the [`SpecCatalog`](crate::SpecCatalog).
#[derive(Debug, Error)]
pub enum SpecError {
    /// A field name that is not legal for this node kind.
    #[error("unknown field `{field}` for {kind} spec")]
    UnknownField {
        /// Kind of node the field was supplied to.
        kind: SpecKind,
        /// The offending field name.
        field: String,
    },

    /// A required field is missing from an interchange document.
    #[error("missing required field `{field}` for {kind} spec")]
    MissingField {
        /// Kind of node being reconstructed.
        kind: SpecKind,
        /// The missing field name.
        field: &'static str,
    },

    /// A legal field carrying a malformed value.
    #[error("invalid value for field `{field}`: {reason}")]
    InvalidField {
        /// The field name.
        field: &'static str,
        /// Why the value was rejected.
        reason: String,
    },

    /// Catalog lookup of a type name that was never registered.
    #[error("no spec registered for type `{0}`")]
    SpecNotFound(String),

    /// The extends-chain of a type revisits a type already on the chain.
    #[error("cyclic type hierarchy: {chain}")]
    CyclicHierarchy {
        /// The chain walked so far, ending with the repeated type.
        chain: String,
    },

    /// JSON parsing or serialization failure.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing or serialization failure.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Convenience alias for results with [`SpecError`].
pub type Result<T> = std::result::Result<T, SpecError>;
