//! Error types for defstack-index

use thiserror::Error;

/// Index error type
#[derive(Debug, Error)]
pub enum Error {
    /// Materialization or encoding failure
    #[error(transparent)]
    Core(#[from] defstack_core::Error),

    /// Name or path already taken in its scope
    #[error("Duplicate definition: {0}")]
    DuplicateDefinition(String),

    /// Record has no usable name
    #[error("Malformed record: {0}")]
    MalformedRecord(String),

    /// No record with this name
    #[error("Definition not found: {0}")]
    NotFound(String),

    /// Configuration could not be parsed
    #[error("Config error: {0}")]
    Config(#[from] ron::error::SpannedError),
}

/// Result type for index operations
pub type Result<T> = std::result::Result<T, Error>;
