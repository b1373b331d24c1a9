//! Inheritance resolution and materialization
//!
//! A record is materialized by walking its parent chain to the root,
//! constructing a default instance of the record's type, and applying every
//! body from the root down to the record itself. Fields absent from a body
//! keep whatever an earlier body set.
//!
//! Materialization never touches the record set. Reference fields are
//! resolved by materializing the referenced record, at most once per call.

use crate::encode::ListPolicy;
use crate::error::{Error, Result};
use crate::identity::DefName;
use crate::node::{Node, LIST_ELEMENT};
use crate::record::{DefRecord, RecordLookup};
use crate::reflect::{RefSlot, Reflect, ReflectMut, Sequence};
use crate::registry::{Def, TypeResolver};
use std::any::Any;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

/// Collect a record and its ancestors, leaf first
///
/// Fails with `UnresolvedParent` when a parent is missing and with
/// `CyclicInheritance` when the chain revisits a record. Records are compared
/// by identity, so a scene record may inherit from a global one of the same
/// name.
pub fn ancestor_chain<'r>(
    record: &'r DefRecord,
    records: &'r dyn RecordLookup,
) -> Result<Vec<&'r DefRecord>> {
    let mut chain = vec![record];
    let mut current = record;
    while let Some(parent) = &current.parent {
        let next = records
            .find_parent(current)
            .ok_or_else(|| Error::UnresolvedParent {
                child: current.name.to_string(),
                parent: parent.to_string(),
            })?;
        if chain.iter().any(|seen| std::ptr::eq(*seen, next)) {
            let mut names: Vec<String> = chain.iter().map(|r| r.name.to_string()).collect();
            names.push(parent.to_string());
            return Err(Error::CyclicInheritance { chain: names });
        }
        chain.push(next);
        current = next;
    }
    Ok(chain)
}

#[derive(Clone)]
struct Resolved {
    value: Rc<dyn Any>,
    type_name: String,
}

/// Rebuilds typed values from records and their ancestors
pub struct Materializer<'a> {
    records: &'a dyn RecordLookup,
    types: &'a dyn TypeResolver,
    policy: ListPolicy,
    resolved: HashMap<DefName, Resolved>,
    in_progress: HashSet<DefName>,
}

impl<'a> Materializer<'a> {
    /// Create a materializer over a record set and a type resolver
    pub fn new(records: &'a dyn RecordLookup, types: &'a dyn TypeResolver) -> Self {
        Self {
            records,
            types,
            policy: ListPolicy::default(),
            resolved: HashMap::new(),
            in_progress: HashSet::new(),
        }
    }

    /// Use a list policy matching the one the bodies were encoded with
    pub fn with_policy(mut self, policy: ListPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Materialize a record into a freshly constructed value
    pub fn materialize(&mut self, record: &DefRecord) -> Result<Box<dyn Reflect>> {
        self.resolved.clear();
        self.in_progress.clear();
        let result = self.build(record);
        self.resolved.clear();
        result
    }

    /// Materialize a record by name
    pub fn materialize_named(&mut self, name: &str) -> Result<Box<dyn Reflect>> {
        let records = self.records;
        let record = records
            .find(name)
            .ok_or_else(|| Error::NotFound(name.to_string()))?;
        self.materialize(record)
    }

    /// Materialize a record as a concrete definition type
    pub fn materialize_as<T: Def>(&mut self, record: &DefRecord) -> Result<T> {
        let value = self.materialize(record)?;
        value
            .into_any()
            .downcast::<T>()
            .map(|boxed| *boxed)
            .map_err(|_| Error::TypeMismatch {
                expected: T::TYPE_NAME.to_string(),
                got: record.type_name.clone(),
            })
    }

    fn build(&mut self, record: &DefRecord) -> Result<Box<dyn Reflect>> {
        if record.is_tombstone() {
            return Err(Error::MalformedRecord(format!(
                "{} record has no name",
                record.type_name
            )));
        }
        let records = self.records;
        let chain = ancestor_chain(record, records)?;
        let def_type = self
            .types
            .resolve(&record.type_name)
            .ok_or_else(|| Error::UnknownType(record.type_name.clone()))?;

        let mut value = def_type.construct();
        self.in_progress.insert(record.name.clone());
        let mut result = Ok(());
        for ancestor in chain.iter().rev() {
            result = self.apply(value.as_mut(), &ancestor.body, ancestor.name.as_str());
            if result.is_err() {
                break;
            }
        }
        self.in_progress.remove(&record.name);
        result.map(|()| value)
    }

    /// Apply one tree node onto a value
    fn apply(&mut self, target: &mut dyn Reflect, node: &Node, path: &str) -> Result<()> {
        match target.reflect_mut() {
            ReflectMut::Scalar(leaf) | ReflectMut::Text(leaf) | ReflectMut::Enum(leaf) => {
                let Some(text) = leaf_text(node, path)? else {
                    return Ok(());
                };
                leaf.set_text(text).map_err(|message| Error::InvalidValue {
                    path: path.to_string(),
                    message,
                })
            }
            ReflectMut::DefRef(slot) => {
                let Some(text) = leaf_text(node, path)? else {
                    return Ok(());
                };
                self.bind_reference(slot, text.trim(), path)
            }
            ReflectMut::List(seq) | ReflectMut::Array(seq) => self.apply_sequence(seq, node, path),
            ReflectMut::Record(record) => {
                if !holds_fields(node, path)? {
                    return Ok(());
                }
                let type_name = record.record_type_name();
                for child in node.children() {
                    let field = record.field_mut(&child.name).ok_or_else(|| {
                        Error::UnknownField {
                            type_name: type_name.to_string(),
                            field: child.name.clone(),
                        }
                    })?;
                    self.apply(field, child, &format!("{}.{}", path, child.name))?;
                }
                Ok(())
            }
        }
    }

    fn apply_sequence(&mut self, seq: &mut dyn Sequence, node: &Node, path: &str) -> Result<()> {
        if !holds_fields(node, path)? {
            return Ok(());
        }
        if node.children().iter().any(|c| c.name != LIST_ELEMENT) {
            log::warn!("{}: ignoring non-element children in list", path);
        }
        let elements: Vec<&Node> = node.elements().collect();
        let start = match self.policy {
            ListPolicy::AppendOnly => seq.len(),
            ListPolicy::Replace => {
                seq.resize(0);
                0
            }
        };
        seq.resize(start + elements.len());
        for (offset, element) in elements.into_iter().enumerate() {
            let index = start + offset;
            let item = seq.element_mut(index).ok_or_else(|| Error::InvalidValue {
                path: path.to_string(),
                message: format!("element {} out of range", index),
            })?;
            self.apply(item, element, &format!("{}[{}]", path, index))?;
        }
        Ok(())
    }

    fn bind_reference(&mut self, slot: &mut dyn RefSlot, text: &str, path: &str) -> Result<()> {
        if text.is_empty() {
            slot.set_name(None);
            return Ok(());
        }
        let name = DefName::new(text);
        match self.resolve_reference(&name)? {
            Some(resolved) => slot
                .bind(name, resolved.value)
                .map_err(|_| Error::TypeMismatch {
                    expected: slot.target_type_name().to_string(),
                    got: format!("{} ({})", resolved.type_name, path),
                }),
            None => {
                slot.set_name(Some(name));
                Ok(())
            }
        }
    }

    fn resolve_reference(&mut self, name: &DefName) -> Result<Option<Resolved>> {
        if let Some(hit) = self.resolved.get(name) {
            return Ok(Some(hit.clone()));
        }
        if self.in_progress.contains(name) {
            log::debug!("reference cycle through {}, leaving it unresolved", name);
            return Ok(None);
        }
        let records = self.records;
        let Some(record) = records.find(name.as_str()) else {
            log::warn!("reference to unknown definition {}", name);
            return Ok(None);
        };
        let value = self.build(record)?;
        let resolved = Resolved {
            value: Rc::from(value.into_any()),
            type_name: record.type_name.clone(),
        };
        self.resolved.insert(name.clone(), resolved.clone());
        Ok(Some(resolved))
    }
}

/// Text of a leaf node, `None` for an absent interior node
fn leaf_text<'n>(node: &'n Node, path: &str) -> Result<Option<&'n str>> {
    match node.text() {
        Some(text) => Ok(Some(text)),
        None if node.is_absent() => Ok(None),
        None => Err(Error::InvalidValue {
            path: path.to_string(),
            message: "expected a value, found nested fields".to_string(),
        }),
    }
}

/// Interior nodes hold fields, blank leaves hold nothing, other leaves are errors
fn holds_fields(node: &Node, path: &str) -> Result<bool> {
    match node.text() {
        None => Ok(true),
        Some(text) if text.trim().is_empty() => Ok(false),
        Some(text) => Err(Error::InvalidValue {
            path: path.to_string(),
            message: format!("expected nested fields, found {:?}", text),
        }),
    }
}

/// Materialize one record against a record set
pub fn materialize(
    record: &DefRecord,
    records: &dyn RecordLookup,
    types: &dyn TypeResolver,
) -> Result<Box<dyn Reflect>> {
    Materializer::new(records, types).materialize(record)
}
