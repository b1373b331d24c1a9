//! Markup front end

use crate::config::MarkupConfig;
use defstack_core::DefRecord;

/// Reads and writes definition documents with one configuration
#[derive(Debug, Clone, Default)]
pub struct Markup {
    pub(crate) config: MarkupConfig,
}

impl Markup {
    /// Create a markup front end
    pub fn new(config: MarkupConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &MarkupConfig {
        &self.config
    }
}

/// A scene document's embedded definitions
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SceneDocument {
    /// Scene name from the root element
    pub name: String,
    /// Scene-local records, in document order
    pub records: Vec<DefRecord>,
}
