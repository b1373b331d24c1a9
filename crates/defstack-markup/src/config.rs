//! Markup configuration

use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Configuration for reading and writing definition documents
///
/// # Example
///
/// ```
/// use defstack_markup::MarkupConfig;
///
/// let config = MarkupConfig::from_ron_str("(indent: 4)").unwrap();
/// assert_eq!(config.indent, 4);
/// assert_eq!(config.extension, "xml");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkupConfig {
    /// Namespace prefix stripped from root tags on read
    pub type_prefix: String,
    /// File extension picked up by directory loading
    pub extension: String,
    /// Spaces per nesting level in written documents
    pub indent: usize,
}

impl MarkupConfig {
    /// Parse a configuration from RON text; missing keys take defaults
    pub fn from_ron_str(text: &str) -> Result<Self> {
        Ok(ron::from_str(text)?)
    }

    /// Set the type prefix (builder style)
    pub fn with_type_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.type_prefix = prefix.into();
        self
    }

    /// Set the file extension (builder style)
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    /// Set the indent width (builder style)
    pub fn with_indent(mut self, indent: usize) -> Self {
        self.indent = indent;
        self
    }

    /// Root tag for a stored type name, namespace prefix included
    pub fn tag(&self, type_name: &str) -> String {
        format!("{}{}", self.type_prefix, type_name)
    }

    /// Strip the namespace prefix from a root tag
    pub fn type_name<'t>(&self, tag: &'t str) -> &'t str {
        if self.type_prefix.is_empty() {
            return tag;
        }
        tag.strip_prefix(self.type_prefix.as_str()).unwrap_or(tag)
    }
}

impl Default for MarkupConfig {
    fn default() -> Self {
        Self {
            type_prefix: "Defs.".to_string(),
            extension: "xml".to_string(),
            indent: 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = MarkupConfig::default();
        assert_eq!(config.type_prefix, "Defs.");
        assert_eq!(config.extension, "xml");
        assert_eq!(config.indent, 2);
    }

    #[test]
    fn test_type_name_strips_prefix() {
        let config = MarkupConfig::default();
        assert_eq!(config.type_name("Defs.ThingDef"), "ThingDef");
        assert_eq!(config.type_name("ThingDef"), "ThingDef");

        let bare = MarkupConfig::default().with_type_prefix("");
        assert_eq!(bare.type_name("Defs.ThingDef"), "Defs.ThingDef");
    }

    #[test]
    fn test_from_ron() {
        let config = MarkupConfig::from_ron_str("(extension: \"def\", type_prefix: \"Game.\")").unwrap();
        assert_eq!(config.extension, "def");
        assert_eq!(config.type_name("Game.ItemDef"), "ItemDef");
        assert_eq!(config.indent, 2);
        assert!(MarkupConfig::from_ron_str("(indent: \"wide\")").is_err());
    }
}
