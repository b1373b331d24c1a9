//! Definition records

use crate::identity::DefName;
use crate::node::Node;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::hash::BuildHasher;
use std::path::{Path, PathBuf};

/// A stored definition: identity, inheritance link and differential body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefRecord {
    /// Stored type name (namespace prefix already stripped)
    pub type_name: String,
    /// Unique instance name within its scope
    pub name: DefName,
    /// Parent definition to inherit from
    pub parent: Option<DefName>,
    /// File the record was loaded from; `None` for scene-local records
    pub source_path: Option<PathBuf>,
    /// Only exists to be inherited from
    pub is_abstract: bool,
    /// Lives inside a scene document instead of its own file
    pub scene_local: bool,
    /// Fields that differ from the parent or the type default
    pub body: Node,
}

impl DefRecord {
    /// Create a record with an empty body
    pub fn new(type_name: impl Into<String>, name: impl Into<DefName>) -> Self {
        let type_name = type_name.into();
        Self {
            body: Node::empty(type_name.clone()),
            type_name,
            name: name.into(),
            parent: None,
            source_path: None,
            is_abstract: false,
            scene_local: false,
        }
    }

    /// Set the parent definition
    pub fn with_parent(mut self, parent: impl Into<DefName>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    /// Set the source file
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.source_path = Some(path.into());
        self
    }

    /// Mark as abstract
    pub fn abstract_only(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    /// Mark as scene-local; scene-local records never own a file
    pub fn in_scene(mut self) -> Self {
        self.scene_local = true;
        self.source_path = None;
        self
    }

    /// Replace the body
    pub fn with_body(mut self, body: Node) -> Self {
        self.body = body;
        self
    }

    /// A record with no usable name; occupies an empty slot
    pub fn is_tombstone(&self) -> bool {
        self.name.is_empty()
    }

    pub fn path(&self) -> Option<&Path> {
        self.source_path.as_deref()
    }
}

/// Name lookup over a set of loaded records
pub trait RecordLookup {
    fn find(&self, name: &str) -> Option<&DefRecord>;

    /// Record that `child` inherits from
    ///
    /// Lookups that span several scopes override this to resolve the parent
    /// from the child's own scope.
    fn find_parent(&self, child: &DefRecord) -> Option<&DefRecord> {
        child.parent.as_ref().and_then(|parent| self.find(parent.as_str()))
    }
}

impl RecordLookup for [DefRecord] {
    fn find(&self, name: &str) -> Option<&DefRecord> {
        self.iter()
            .find(|r| !r.is_tombstone() && r.name.as_str() == name)
    }
}

impl RecordLookup for Vec<DefRecord> {
    fn find(&self, name: &str) -> Option<&DefRecord> {
        self.as_slice().find(name)
    }
}

impl<S: BuildHasher> RecordLookup for HashMap<DefName, DefRecord, S> {
    fn find(&self, name: &str) -> Option<&DefRecord> {
        self.get(name)
    }
}

impl RecordLookup for IndexMap<DefName, DefRecord> {
    fn find(&self, name: &str) -> Option<&DefRecord> {
        self.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_builder() {
        let record = DefRecord::new("ThingDef", "Steel")
            .with_parent("BaseMetal")
            .with_path("Defs/Steel.xml");
        assert_eq!(record.body.name, "ThingDef");
        assert!(record.body.is_absent());
        assert_eq!(record.parent.as_ref().map(DefName::as_str), Some("BaseMetal"));
        assert_eq!(record.path(), Some(Path::new("Defs/Steel.xml")));

        let local = record.in_scene();
        assert!(local.scene_local);
        assert!(local.path().is_none());
    }

    #[test]
    fn test_lookup_skips_tombstones() {
        let records = vec![
            DefRecord::new("ThingDef", ""),
            DefRecord::new("ThingDef", "Steel"),
        ];
        assert!(records.find("Steel").is_some());
        assert!(records.find("").is_none());
        assert!(records[0].is_tombstone());

        let map: HashMap<DefName, DefRecord> = records
            .into_iter()
            .map(|r| (r.name.clone(), r))
            .collect();
        assert!(map.find("Steel").is_some());
    }
}
