//! Error types for defstack-markup

use quick_xml::events::attributes::AttrError;
use thiserror::Error;

/// Markup error type
#[derive(Debug, Error)]
pub enum Error {
    /// XML syntax error
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    /// Malformed attribute
    #[error("Attribute error: {0}")]
    Attr(#[from] AttrError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Document parsed but does not describe a definition
    #[error(transparent)]
    Core(#[from] defstack_core::Error),

    /// Written output was not valid UTF-8
    #[error("Encoding error: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),

    /// Scene-local records have no file of their own
    #[error("Definition {0} has no source path")]
    NoSourcePath(String),

    /// Configuration could not be parsed
    #[error("Config error: {0}")]
    Config(#[from] ron::error::SpannedError),
}

/// Result type for markup operations
pub type Result<T> = std::result::Result<T, Error>;
