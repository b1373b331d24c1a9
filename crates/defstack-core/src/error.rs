//! Error types for defstack-core

use thiserror::Error;

/// Core error type
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Unresolved parent: {child} inherits from missing definition {parent}")]
    UnresolvedParent { child: String, parent: String },

    #[error("Cyclic inheritance: {}", chain.join(" -> "))]
    CyclicInheritance { chain: Vec<String> },

    #[error("Unknown type: {0}")]
    UnknownType(String),

    #[error("Malformed record: {0}")]
    MalformedRecord(String),

    #[error("Definition not found: {0}")]
    NotFound(String),

    #[error("Unknown field {field} on {type_name}")]
    UnknownField { type_name: String, field: String },

    #[error("Invalid value for {path}: {message}")]
    InvalidValue { path: String, message: String },

    #[error("Type mismatch: expected {expected}, got {got}")]
    TypeMismatch { expected: String, got: String },
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
