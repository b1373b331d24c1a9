//! Identity types for definitions and index slots

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;

/// Unique instance name of a definition record
///
/// Used for parent links and for cross-definition reference fields.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(transparent)]
pub struct DefName(pub String);

impl DefName {
    /// Create a new definition name
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Get the name as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// A record without a usable name is a tombstone
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for DefName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Borrow<str> for DefName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for DefName {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for DefName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Stable position of a record inside the index arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SlotId(pub usize);

impl SlotId {
    /// Create a slot id from an arena position
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    /// Get the arena position
    pub fn index(&self) -> usize {
        self.0
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "slot:{}", self.0)
    }
}
