//! Common query patterns over the index.

use crate::error::Result;
use crate::index::{DefIndex, Scope};
use defstack_core::{Def, DefName, DefRecord, Materializer, SlotId, TypeResolver};
use std::marker::PhantomData;

/// A materialized definition together with where it came from
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved<T> {
    pub name: DefName,
    pub slot: SlotId,
    pub def: T,
}

/// Lazy enumeration of every global definition of type `T`
///
/// Records are materialized one at a time as the iterator advances.
/// Abstract records and records of other types are skipped. A record whose
/// stored type cannot be resolved is logged and skipped without ending the
/// enumeration; every other materialization error is yielded.
pub struct AllOfType<'a, T> {
    index: &'a DefIndex,
    types: &'a dyn TypeResolver,
    next: usize,
    _marker: PhantomData<fn() -> T>,
}

impl<'a, T: Def> AllOfType<'a, T> {
    fn new(index: &'a DefIndex, types: &'a dyn TypeResolver) -> Self {
        Self {
            index,
            types,
            next: 0,
            _marker: PhantomData,
        }
    }

    /// Start again from the first slot
    pub fn restart(&mut self) {
        self.next = 0;
    }

    fn wants(&self, record: &DefRecord) -> bool {
        if record.is_abstract || record.scene_local {
            return false;
        }
        match self.types.resolve(&record.type_name) {
            Some(def_type) => def_type.is::<T>(),
            None => {
                log::warn!(
                    "skipping {}: unknown definition type {}",
                    record.name,
                    record.type_name
                );
                false
            }
        }
    }
}

impl<T> Clone for AllOfType<'_, T> {
    fn clone(&self) -> Self {
        Self {
            index: self.index,
            types: self.types,
            next: self.next,
            _marker: PhantomData,
        }
    }
}

impl<T: Def> Iterator for AllOfType<'_, T> {
    type Item = Result<Resolved<T>>;

    fn next(&mut self) -> Option<Self::Item> {
        while self.next < self.index.slot_count() {
            let slot = SlotId::new(self.next);
            self.next += 1;

            let Some(record) = self.index.slot(slot) else {
                continue;
            };
            if !self.wants(record) {
                continue;
            }

            let view = self.index.view(Scope::Global);
            let result = Materializer::new(&view, self.types)
                .with_policy(self.index.config().list_policy())
                .materialize_as::<T>(record);
            match result {
                Ok(def) => {
                    return Some(Ok(Resolved {
                        name: record.name.clone(),
                        slot,
                        def,
                    }))
                }
                // a referenced definition may still have an unknown type
                Err(defstack_core::Error::UnknownType(type_name)) => {
                    log::warn!(
                        "skipping {}: refers to unknown definition type {}",
                        record.name,
                        type_name
                    );
                }
                Err(e) => return Some(Err(e.into())),
            }
        }
        None
    }
}

impl DefIndex {
    /// Lazily materialize every global definition of type `T`
    pub fn all_of_type<'a, T: Def>(&'a self, types: &'a dyn TypeResolver) -> AllOfType<'a, T> {
        AllOfType::new(self, types)
    }

    /// Global, non-abstract records whose stored type name is `type_name`
    pub fn records_of_type<'a>(
        &'a self,
        type_name: &'a str,
    ) -> impl Iterator<Item = &'a DefRecord> + 'a {
        self.records()
            .map(|(_, r)| r)
            .filter(move |r| !r.scene_local && !r.is_abstract && r.type_name == type_name)
    }

    /// Count global, non-abstract records of a type without materializing them
    pub fn count_of_type(&self, type_name: &str) -> usize {
        self.records_of_type(type_name).count()
    }
}
