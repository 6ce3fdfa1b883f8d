//! Template composition and variable resolution.
//!
//! Everything in here is a pure function over a [`Snapshot`]: reads return
//! derived views, writes return a new snapshot for the caller to swap in.

pub mod catalog;
pub mod compositor;
pub mod extractor;
pub mod membership;
pub mod resolution;
pub mod validation;

use thiserror::Error;

#[cfg(doc)]
use crate::models::Snapshot;

pub type EngineResult<T> = Result<T, EngineError>;

/// Errors raised by mutating operations. Read paths never fail.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("{resource} not found: {id}")]
    NotFound { resource: &'static str, id: String },

    #[error("variable {name} is already defined in template {template}")]
    DuplicateVariable { template: String, name: String },

    #[error("invalid variable name {0:?}: must be '$' followed by a name without whitespace")]
    InvalidVariableName(String),

    #[error("default value {value:?} for {name} is not a valid {var_type}")]
    InvalidDefaultValue {
        name: String,
        var_type: String,
        value: String,
    },

    #[error("value {value:?} for {name} is not a valid {var_type}")]
    InvalidMappingValue {
        name: String,
        var_type: String,
        value: String,
    },

    #[error("{object} belongs to {owner} and is read-only from {context}")]
    ReadOnly {
        object: String,
        owner: String,
        context: String,
    },

    #[error("{0}")]
    Conflict(String),

    #[error("{resource} {id} referenced by {by} does not exist")]
    InvalidReference {
        resource: &'static str,
        id: String,
        by: String,
    },

    #[error("{0} is required")]
    MissingField(&'static str),
}

impl EngineError {
    pub fn not_found(resource: &'static str, id: &str) -> Self {
        Self::NotFound {
            resource,
            id: id.to_string(),
        }
    }
}
