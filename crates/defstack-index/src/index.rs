//! Definition index
//!
//! Records live in an arena of slots. Three tables map into it: source path,
//! global name, and scene-local name. A name may exist in both the global and
//! the scene scope at the same time. Removing a record leaves its slot empty;
//! empty slots are filled before the arena grows, so slot numbers held by
//! other code stay valid.

use crate::config::IndexConfig;
use crate::error::{Error, Result};
use defstack_core::{
    Def, DefName, DefRecord, Encoder, Materializer, RecordLookup, Reflect, SlotId, TypeResolver,
};
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

/// Which name table a lookup targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Definitions loaded from their own files
    Global,
    /// Definitions embedded in the current scene
    Scene,
}

/// Where a new record goes in the arena
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Placement {
    /// Fill the lowest empty slot first
    Reuse,
    /// Always grow the arena
    Append,
}

/// Index over every loaded definition record
#[derive(Debug, Default)]
pub struct DefIndex {
    config: IndexConfig,
    /// Record arena; `None` marks an empty slot
    slots: Vec<Option<DefRecord>>,
    /// Empty slots available for reuse
    free: BTreeSet<SlotId>,
    by_path: HashMap<PathBuf, SlotId>,
    by_name: HashMap<DefName, SlotId>,
    scene: HashMap<DefName, SlotId>,
}

impl DefIndex {
    /// Create an empty index
    pub fn new(config: IndexConfig) -> Self {
        Self {
            config,
            ..Default::default()
        }
    }

    /// Reset the index with a new configuration
    pub fn init(&mut self, config: IndexConfig) {
        self.clear();
        self.config = config;
    }

    /// Drop every record in both scopes
    pub fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
        self.by_path.clear();
        self.by_name.clear();
        self.scene.clear();
    }

    pub fn config(&self) -> &IndexConfig {
        &self.config
    }

    // ========================================================================
    // Mutation
    // ========================================================================

    /// Add a batch of records, returning how many were indexed
    ///
    /// Records take consecutive slots in batch order, and a nameless record
    /// keeps its position as an empty slot. Duplicates are skipped. Empty
    /// slots left by the batch become reusable once the batch is in.
    pub fn load(&mut self, records: impl IntoIterator<Item = DefRecord>) -> usize {
        let mut added = 0;
        let mut vacant = Vec::new();
        for record in records {
            if record.is_tombstone() {
                log::warn!(
                    "{} record without a name in {:?}, leaving an empty slot",
                    record.type_name,
                    record.source_path
                );
                vacant.push(SlotId::new(self.slots.len()));
                self.slots.push(None);
                continue;
            }
            match self.insert(record, Placement::Append) {
                Ok(_) => added += 1,
                Err(e) => log::warn!("not indexing record: {}", e),
            }
        }
        self.free.extend(vacant);
        added
    }

    /// Add one record; returns false if it was rejected
    pub fn add(&mut self, record: DefRecord) -> bool {
        match self.try_add(record) {
            Ok(_) => true,
            Err(e) => {
                log::warn!("not indexing record: {}", e);
                false
            }
        }
    }

    /// Add one record, returning the slot it was placed in
    pub fn try_add(&mut self, record: DefRecord) -> Result<SlotId> {
        self.insert(record, Placement::Reuse)
    }

    fn insert(&mut self, record: DefRecord, placement: Placement) -> Result<SlotId> {
        if record.is_tombstone() {
            return Err(Error::MalformedRecord(format!(
                "{} record has no name",
                record.type_name
            )));
        }
        if record.scene_local {
            if self.scene.contains_key(&record.name) {
                return Err(Error::DuplicateDefinition(record.name.to_string()));
            }
        } else {
            if self.by_name.contains_key(&record.name) {
                return Err(Error::DuplicateDefinition(record.name.to_string()));
            }
            if let Some(path) = record.path() {
                if self.by_path.contains_key(path) {
                    return Err(Error::DuplicateDefinition(path.display().to_string()));
                }
            }
        }

        let slot = self.allocate(placement);
        if record.scene_local {
            self.scene.insert(record.name.clone(), slot);
        } else {
            if let Some(path) = &record.source_path {
                self.by_path.insert(path.clone(), slot);
            }
            self.by_name.insert(record.name.clone(), slot);
        }
        self.slots[slot.index()] = Some(record);
        Ok(slot)
    }

    fn allocate(&mut self, placement: Placement) -> SlotId {
        if placement == Placement::Reuse && self.config.reuse_slots() {
            if let Some(slot) = self.free.pop_first() {
                return slot;
            }
        }
        let slot = SlotId::new(self.slots.len());
        self.slots.push(None);
        slot
    }

    fn release(&mut self, slot: SlotId) -> Option<DefRecord> {
        let record = self.slots.get_mut(slot.index())?.take()?;
        self.free.insert(slot);
        Some(record)
    }

    /// Remove a global record (its file was deleted)
    pub fn remove(&mut self, name: &str) -> Option<DefRecord> {
        let slot = self.by_name.remove(name)?;
        let record = self.release(slot)?;
        if let Some(path) = record.path() {
            self.by_path.remove(path);
        }
        Some(record)
    }

    /// Remove the global record loaded from `path`
    pub fn remove_path(&mut self, path: &Path) -> Option<DefRecord> {
        let slot = *self.by_path.get(path)?;
        let name = self.slots.get(slot.index())?.as_ref()?.name.clone();
        self.remove(name.as_str())
    }

    /// Remove a scene-local record (its owning scene object was deleted)
    pub fn remove_scene(&mut self, name: &str) -> bool {
        match self.scene.remove(name) {
            Some(slot) => self.release(slot).is_some(),
            None => false,
        }
    }

    /// Drop every scene-local record
    pub fn clear_scene(&mut self) {
        let slots: Vec<SlotId> = self.scene.drain().map(|(_, slot)| slot).collect();
        for slot in slots {
            self.release(slot);
        }
    }

    /// Replace the scene scope with `records`, returning how many were indexed
    pub fn load_scene(&mut self, records: impl IntoIterator<Item = DefRecord>) -> usize {
        self.clear_scene();
        records
            .into_iter()
            .map(DefRecord::in_scene)
            .filter(|r| !r.is_tombstone())
            .map(|r| self.add(r))
            .filter(|added| *added)
            .count()
    }

    // ========================================================================
    // Lookup
    // ========================================================================

    /// Get a global record by name
    pub fn get(&self, name: &str) -> Option<&DefRecord> {
        self.by_name.get(name).and_then(|slot| self.slot(*slot))
    }

    /// Get a scene-local record by name
    pub fn get_scene(&self, name: &str) -> Option<&DefRecord> {
        self.scene.get(name).and_then(|slot| self.slot(*slot))
    }

    /// Get a record by name in the given scope
    pub fn get_in(&self, scope: Scope, name: &str) -> Option<&DefRecord> {
        match scope {
            Scope::Global => self.get(name),
            Scope::Scene => self.get_scene(name),
        }
    }

    /// Get the global record loaded from `path`
    pub fn get_by_path(&self, path: &Path) -> Option<&DefRecord> {
        self.by_path.get(path).and_then(|slot| self.slot(*slot))
    }

    /// Get the record occupying a slot
    pub fn slot(&self, slot: SlotId) -> Option<&DefRecord> {
        self.slots.get(slot.index()).and_then(Option::as_ref)
    }

    /// Slot of a record in the given scope
    pub fn slot_of(&self, scope: Scope, name: &str) -> Option<SlotId> {
        match scope {
            Scope::Global => self.by_name.get(name).copied(),
            Scope::Scene => self.scene.get(name).copied(),
        }
    }

    /// Occupied slots in slot order
    pub fn records(&self) -> impl Iterator<Item = (SlotId, &DefRecord)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, r)| r.as_ref().map(|r| (SlotId::new(i), r)))
    }

    /// Scene-local records in slot order
    pub fn scene_records(&self) -> impl Iterator<Item = &DefRecord> {
        self.records()
            .map(|(_, r)| r)
            .filter(|r| r.scene_local)
    }

    /// Number of occupied slots
    pub fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Size of the arena including empty slots
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// Record lookup used to resolve parents and references from `scope`
    ///
    /// Global records only see global records. Scene records see the scene
    /// first, then fall back to global names.
    pub fn view(&self, scope: Scope) -> ScopeView<'_> {
        ScopeView { index: self, scope }
    }

    // ========================================================================
    // Materialization and commit
    // ========================================================================

    /// Materialize a record in the given scope
    pub fn materialize(
        &self,
        scope: Scope,
        name: &str,
        types: &dyn TypeResolver,
    ) -> Result<Box<dyn Reflect>> {
        let record = self
            .get_in(scope, name)
            .ok_or_else(|| Error::NotFound(name.to_string()))?;
        let view = self.view(scope);
        Ok(Materializer::new(&view, types)
            .with_policy(self.config.list_policy())
            .materialize(record)?)
    }

    /// Materialize a record as a concrete definition type
    pub fn materialize_as<T: Def>(
        &self,
        scope: Scope,
        name: &str,
        types: &dyn TypeResolver,
    ) -> Result<T> {
        let value = self.materialize(scope, name, types)?;
        value
            .into_any()
            .downcast::<T>()
            .map(|boxed| *boxed)
            .map_err(|_| {
                Error::Core(defstack_core::Error::TypeMismatch {
                    expected: T::TYPE_NAME.to_string(),
                    got: self
                        .get_in(scope, name)
                        .map(|r| r.type_name.clone())
                        .unwrap_or_default(),
                })
            })
    }

    /// Re-diff an edited object and store the result as the record's body
    ///
    /// The object is compared against its resolved parent, or against a
    /// default instance of the record's type when it has no parent.
    pub fn commit(
        &mut self,
        scope: Scope,
        name: &str,
        value: &dyn Reflect,
        types: &dyn TypeResolver,
    ) -> Result<()> {
        let record = self
            .get_in(scope, name)
            .ok_or_else(|| Error::NotFound(name.to_string()))?;
        let type_name = record.type_name.clone();

        let comparison = match &record.parent {
            Some(parent) => {
                let view = self.view(scope);
                let parent_record = view.find_parent(record).ok_or_else(|| {
                    defstack_core::Error::UnresolvedParent {
                        child: name.to_string(),
                        parent: parent.to_string(),
                    }
                })?;
                Materializer::new(&view, types)
                    .with_policy(self.config.list_policy())
                    .materialize(parent_record)?
            }
            None => types
                .resolve(&type_name)
                .ok_or_else(|| defstack_core::Error::UnknownType(type_name.clone()))?
                .construct(),
        };

        let body = Encoder::with_policy(self.config.list_policy()).encode_body(
            &type_name,
            value,
            comparison.as_ref(),
        );
        let slot = self
            .slot_of(scope, name)
            .ok_or_else(|| Error::NotFound(name.to_string()))?;
        if let Some(record) = self.slots.get_mut(slot.index()).and_then(Option::as_mut) {
            record.body = body;
        }
        Ok(())
    }
}

impl RecordLookup for DefIndex {
    fn find(&self, name: &str) -> Option<&DefRecord> {
        self.get(name)
    }
}

/// Record lookup seen from one scope; scene names shadow global names
#[derive(Debug, Clone, Copy)]
pub struct ScopeView<'a> {
    index: &'a DefIndex,
    scope: Scope,
}

impl ScopeView<'_> {
    pub fn scope(&self) -> Scope {
        self.scope
    }
}

impl RecordLookup for ScopeView<'_> {
    fn find(&self, name: &str) -> Option<&DefRecord> {
        match self.scope {
            Scope::Global => self.index.get(name),
            Scope::Scene => self
                .index
                .get_scene(name)
                .or_else(|| self.index.get(name)),
        }
    }

    /// Global records inherit from global records only. A scene record never
    /// resolves to itself, so a scene `Crate` with parent `Crate` inherits
    /// from the global `Crate`.
    fn find_parent(&self, child: &DefRecord) -> Option<&DefRecord> {
        let parent = child.parent.as_ref()?.as_str();
        if self.scope == Scope::Global || !child.scene_local {
            return self.index.get(parent);
        }
        self.index
            .get_scene(parent)
            .filter(|found| !std::ptr::eq(*found, child))
            .or_else(|| self.index.get(parent))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use defstack_core::{reflect_record, Node, TypeRegistry};

    #[derive(Debug, Default, Clone, PartialEq)]
    struct Prop {
        label: String,
        size: i32,
        tags: Vec<String>,
    }

    reflect_record!(Prop { label, size, tags });

    impl Def for Prop {
        const TYPE_NAME: &'static str = "PropDef";
    }

    fn prop(name: &str) -> DefRecord {
        DefRecord::new("PropDef", name).with_path(format!("Defs/{}.xml", name))
    }

    fn prop_with(name: &str, fields: Vec<Node>) -> DefRecord {
        prop(name).with_body(Node::interior("PropDef", fields))
    }

    fn types() -> TypeRegistry {
        TypeRegistry::new().with::<Prop>()
    }

    #[test]
    fn test_add_and_lookup() {
        let mut index = DefIndex::default();
        assert!(index.add(prop("Crate")));
        assert!(index.get("Crate").is_some());
        assert!(index.get_by_path(Path::new("Defs/Crate.xml")).is_some());
        assert_eq!(index.slot_of(Scope::Global, "Crate"), Some(SlotId::new(0)));
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_duplicates_rejected() {
        let mut index = DefIndex::default();
        assert!(index.add(prop("Crate")));
        assert!(!index.add(prop("Crate")));
        assert!(matches!(
            index.try_add(prop("Crate")),
            Err(Error::DuplicateDefinition(_))
        ));

        let same_path = DefRecord::new("PropDef", "Other").with_path("Defs/Crate.xml");
        assert!(!index.add(same_path));
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_scene_and_global_names_coexist() {
        let mut index = DefIndex::default();
        assert!(index.add(prop("Crate")));
        assert!(index.add(DefRecord::new("PropDef", "Crate").in_scene()));
        assert!(!index.add(DefRecord::new("PropDef", "Crate").in_scene()));

        assert!(!index.get("Crate").unwrap().scene_local);
        assert!(index.get_scene("Crate").unwrap().scene_local);
        assert_eq!(index.scene_records().count(), 1);

        assert!(index.remove_scene("Crate"));
        assert!(!index.remove_scene("Crate"));
        assert!(index.get("Crate").is_some());
    }

    #[test]
    fn test_slot_reuse() {
        let mut index = DefIndex::default();
        index.load((0..5).map(|i| prop(&format!("P{}", i))));
        assert_eq!(index.slot_of(Scope::Global, "P3"), Some(SlotId::new(3)));

        let removed = index.remove("P3").unwrap();
        assert_eq!(removed.name.as_str(), "P3");
        assert!(index.get("P3").is_none());
        assert!(index.get_by_path(Path::new("Defs/P3.xml")).is_none());
        assert!(index.slot(SlotId::new(3)).is_none());

        assert!(index.add(prop("Fresh")));
        assert_eq!(index.slot_of(Scope::Global, "Fresh"), Some(SlotId::new(3)));
        assert_eq!(
            index.get_by_path(Path::new("Defs/Fresh.xml")).map(|r| r.name.as_str()),
            Some("Fresh")
        );
        assert_eq!(index.slot(SlotId::new(3)).map(|r| r.name.as_str()), Some("Fresh"));
        assert_eq!(index.slot_count(), 5);
    }

    #[test]
    fn test_no_slot_reuse_when_disabled() {
        let mut index = DefIndex::new(IndexConfig::default().with_reuse_slots(false));
        index.load(vec![prop("A"), prop("B")]);
        index.remove("A");
        index.add(prop("C"));
        assert_eq!(index.slot_of(Scope::Global, "C"), Some(SlotId::new(2)));
    }

    #[test]
    fn test_scene_removal_frees_slot() {
        let mut index = DefIndex::default();
        index.load(vec![prop("A")]);
        index.load_scene(vec![DefRecord::new("PropDef", "Local")]);
        assert_eq!(index.slot_of(Scope::Scene, "Local"), Some(SlotId::new(1)));
        assert!(index.remove_scene("Local"));
        assert!(index.add(prop("B")));
        assert_eq!(index.slot_of(Scope::Global, "B"), Some(SlotId::new(1)));
    }

    #[test]
    fn test_tombstones_occupy_empty_slots() {
        let mut index = DefIndex::default();
        let added = index.load(vec![prop("A"), DefRecord::new("PropDef", ""), prop("B")]);
        assert_eq!(added, 2);
        assert_eq!(index.slot_of(Scope::Global, "B"), Some(SlotId::new(2)));
        assert!(index.slot(SlotId::new(1)).is_none());

        assert!(index.add(prop("C")));
        assert_eq!(index.slot_of(Scope::Global, "C"), Some(SlotId::new(1)));
    }

    #[test]
    fn test_batch_load_is_positional() {
        let mut index = DefIndex::default();
        index.load(vec![prop("A"), prop("B")]);
        index.remove("A");

        // a later batch appends even while slot 0 is free
        index.load(vec![prop("C"), DefRecord::new("PropDef", ""), prop("D")]);
        assert_eq!(index.slot_of(Scope::Global, "C"), Some(SlotId::new(2)));
        assert_eq!(index.slot_of(Scope::Global, "D"), Some(SlotId::new(4)));
        assert!(index.slot(SlotId::new(3)).is_none());

        assert!(index.add(prop("E")));
        assert!(index.add(prop("F")));
        assert_eq!(index.slot_of(Scope::Global, "E"), Some(SlotId::new(0)));
        assert_eq!(index.slot_of(Scope::Global, "F"), Some(SlotId::new(3)));
        assert_eq!(index.slot_count(), 5);
    }

    #[test]
    fn test_remove_path() {
        let mut index = DefIndex::default();
        index.load(vec![prop("A")]);
        assert!(index.remove_path(Path::new("Defs/A.xml")).is_some());
        assert!(index.get("A").is_none());
        assert!(index.is_empty());
    }

    #[test]
    fn test_load_scene_replaces_previous_scene() {
        let mut index = DefIndex::default();
        index.load_scene(vec![DefRecord::new("PropDef", "One")]);
        let added = index.load_scene(vec![
            DefRecord::new("PropDef", "Two"),
            DefRecord::new("PropDef", "Three").with_path("ignored.xml"),
        ]);
        assert_eq!(added, 2);
        assert!(index.get_scene("One").is_none());
        assert!(index.get_scene("Three").unwrap().path().is_none());
        assert!(index.get_by_path(Path::new("ignored.xml")).is_none());
    }

    #[test]
    fn test_scene_record_inherits_from_global() {
        let types = types();
        let mut index = DefIndex::default();
        index.load(vec![prop_with("Base", vec![Node::leaf("size", "4")])]);
        index.load_scene(vec![DefRecord::new("PropDef", "Local")
            .with_parent("Base")
            .with_body(Node::interior("PropDef", vec![Node::leaf("label", "l")]))]);

        let value: Prop = index.materialize_as(Scope::Scene, "Local", &types).unwrap();
        assert_eq!(value.size, 4);
        assert_eq!(value.label, "l");
        assert!(matches!(
            index.materialize(Scope::Global, "Local", &types),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_commit_rediffs_against_parent() {
        let types = types();
        let mut index = DefIndex::default();
        index.load(vec![
            prop_with("Base", vec![Node::leaf("size", "4")]),
            prop("Child").with_parent("Base"),
        ]);

        let mut value: Prop = index.materialize_as(Scope::Global, "Child", &types).unwrap();
        value.size = 9;
        // the index is untouched until commit
        assert!(index.get("Child").unwrap().body.is_absent());

        index.commit(Scope::Global, "Child", &value, &types).unwrap();
        let body = &index.get("Child").unwrap().body;
        assert_eq!(body.child("size").and_then(Node::text), Some("9"));

        value.size = 4;
        index.commit(Scope::Global, "Child", &value, &types).unwrap();
        assert!(index.get("Child").unwrap().body.is_absent());
    }

    #[test]
    fn test_commit_without_parent_uses_default() {
        let types = types();
        let mut index = DefIndex::default();
        index.load(vec![prop("Solo")]);
        let value = Prop {
            label: "solo".into(),
            tags: vec!["x".into()],
            ..Default::default()
        };
        index.commit(Scope::Global, "Solo", &value, &types).unwrap();
        let body = &index.get("Solo").unwrap().body;
        assert_eq!(body.child("label").and_then(Node::text), Some("solo"));
        assert!(body.child("size").is_none());
        assert_eq!(body.child("tags").map(|t| t.elements().count()), Some(1));

        assert!(matches!(
            index.commit(Scope::Global, "Missing", &value, &types),
            Err(Error::NotFound(_))
        ));
    }

    #[test]
    fn test_round_trip_through_index() {
        let types = types();
        let original = Prop {
            label: "crate".into(),
            size: 3,
            tags: vec!["wood".into(), "storage".into()],
        };
        let mut index = DefIndex::default();
        let body = Encoder::new().encode_def(&original, None);
        assert!(index.add(prop("Crate").with_body(body)));

        let back: Prop = index.materialize_as(Scope::Global, "Crate", &types).unwrap();
        assert_eq!(back, original);
    }

    #[test]
    fn test_cycle_rejected() {
        let types = types();
        let mut index = DefIndex::default();
        index.load(vec![prop("A").with_parent("B"), prop("B").with_parent("A")]);
        assert!(matches!(
            index.materialize(Scope::Global, "A", &types),
            Err(Error::Core(defstack_core::Error::CyclicInheritance { .. }))
        ));
    }

    #[test]
    fn test_global_records_do_not_see_scene() {
        let types = types();
        let mut index = DefIndex::default();
        index.load(vec![prop("Child").with_parent("SceneOnly")]);
        index.load_scene(vec![DefRecord::new("PropDef", "SceneOnly")]);
        assert!(index.view(Scope::Global).find("SceneOnly").is_none());
        assert!(index.view(Scope::Scene).find("SceneOnly").is_some());
        assert!(matches!(
            index.materialize(Scope::Global, "Child", &types),
            Err(Error::Core(defstack_core::Error::UnresolvedParent { .. }))
        ));
    }

    #[test]
    fn test_scene_record_inherits_same_named_global() {
        let types = types();
        let mut index = DefIndex::default();
        index.load(vec![prop_with(
            "Crate",
            vec![Node::leaf("label", "global"), Node::leaf("size", "4")],
        )]);
        index.load_scene(vec![DefRecord::new("PropDef", "Crate")
            .with_parent("Crate")
            .with_body(Node::interior("PropDef", vec![Node::leaf("size", "7")]))]);

        let local: Prop = index.materialize_as(Scope::Scene, "Crate", &types).unwrap();
        assert_eq!(local.label, "global");
        assert_eq!(local.size, 7);
        let global: Prop = index.materialize_as(Scope::Global, "Crate", &types).unwrap();
        assert_eq!(global.size, 4);

        let mut edited = local.clone();
        edited.label = "local".into();
        index.commit(Scope::Scene, "Crate", &edited, &types).unwrap();
        let body = &index.get_scene("Crate").unwrap().body;
        assert_eq!(body.child("label").and_then(Node::text), Some("local"));
        assert_eq!(body.child("size").and_then(Node::text), Some("7"));
        assert!(index.get("Crate").unwrap().body.child("label").is_some());
    }

    #[test]
    fn test_scene_self_parent_without_global_is_unresolved() {
        let types = types();
        let mut index = DefIndex::default();
        index.load_scene(vec![DefRecord::new("PropDef", "Loop").with_parent("Loop")]);
        assert!(matches!(
            index.materialize(Scope::Scene, "Loop", &types),
            Err(Error::Core(defstack_core::Error::UnresolvedParent { .. }))
        ));
    }

    #[test]
    fn test_init_resets() {
        let mut index = DefIndex::default();
        index.load(vec![prop("A")]);
        index.init(IndexConfig::default().with_reuse_slots(false));
        assert!(index.is_empty());
        assert_eq!(index.slot_count(), 0);
        assert!(!index.config().reuse_slots());
    }
}
