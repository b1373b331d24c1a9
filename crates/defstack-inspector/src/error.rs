//! Error types for defstack-inspector

use thiserror::Error;

/// Inspector error type
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Error {
    /// Edited text could not be parsed for the field's shape
    #[error("Invalid edit at {path}: {message}")]
    InvalidEdit { path: String, message: String },
}

/// Result type for inspector operations
pub type Result<T> = std::result::Result<T, Error>;
