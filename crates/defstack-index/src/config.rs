//! Index configuration
//!
//! Controls how the index hands out slots and which list policy is used when
//! committed objects are diffed and when records are materialized.

use crate::error::Result;
use defstack_core::ListPolicy;
use serde::{Deserialize, Serialize};

/// Configuration for a [`DefIndex`](crate::DefIndex)
///
/// # Example
///
/// ```
/// use defstack_core::ListPolicy;
/// use defstack_index::IndexConfig;
///
/// let config = IndexConfig::default();
/// assert!(config.reuse_slots());
/// assert_eq!(config.list_policy(), ListPolicy::AppendOnly);
///
/// let config = IndexConfig::from_ron_str("(reuse_slots: false)").unwrap();
/// assert!(!config.reuse_slots());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Fill slots left by removed records before appending new ones
    ///
    /// Keeps slot numbers stable for code that addresses records by slot.
    reuse_slots: bool,
    /// List diff and application policy
    list_policy: ListPolicy,
}

impl IndexConfig {
    /// Parse a configuration from RON text; missing keys take defaults
    pub fn from_ron_str(text: &str) -> Result<Self> {
        Ok(ron::from_str(text)?)
    }

    /// Set slot reuse (builder style)
    pub fn with_reuse_slots(mut self, reuse: bool) -> Self {
        self.reuse_slots = reuse;
        self
    }

    /// Set the list policy (builder style)
    pub fn with_list_policy(mut self, policy: ListPolicy) -> Self {
        self.list_policy = policy;
        self
    }

    pub fn reuse_slots(&self) -> bool {
        self.reuse_slots
    }

    pub fn list_policy(&self) -> ListPolicy {
        self.list_policy
    }

    pub fn set_reuse_slots(&mut self, reuse: bool) {
        self.reuse_slots = reuse;
    }

    pub fn set_list_policy(&mut self, policy: ListPolicy) {
        self.list_policy = policy;
    }
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            reuse_slots: true,
            list_policy: ListPolicy::AppendOnly,
        }
    }
}
