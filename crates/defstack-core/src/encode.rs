//! Reflective diff encoder
//!
//! Walks a value and its comparison value in lock-step and produces a
//! differential tree holding only what differs. Fields are emitted in
//! declaration order, so encoding an unchanged value twice gives identical
//! trees.

use crate::node::{Node, LIST_ELEMENT};
use crate::reflect::{reflect_eq, sequence_eq, Reflect, ReflectRef, Sequence};
use crate::registry::Def;
use serde::{Deserialize, Serialize};
use std::ops::Range;

/// How list and array fields are diffed against their comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ListPolicy {
    /// Only elements past the comparison's length are written, and applied
    /// by appending to the inherited list. Edits to elements inside the
    /// comparison's range are not recorded.
    #[default]
    AppendOnly,
    /// Any difference rewrites the whole list, and applying it replaces the
    /// inherited list. An emptied list cannot be expressed and is dropped.
    Replace,
}

impl ListPolicy {
    /// Indices of `value` that must be written, or `None` to omit the field
    pub fn emitted_range(
        &self,
        value: &dyn Sequence,
        comparison: Option<&dyn Sequence>,
    ) -> Option<Range<usize>> {
        let len = value.len();
        match self {
            ListPolicy::AppendOnly => {
                let base = comparison.map_or(0, |c| c.len());
                (len > base).then_some(base..len)
            }
            ListPolicy::Replace => match comparison {
                Some(c) if sequence_eq(value, c) => None,
                Some(_) if len == 0 => {
                    log::debug!("list emptied relative to parent, not representable");
                    None
                }
                _ => (len > 0).then_some(0..len),
            },
        }
    }
}

/// Produces differential trees from reflected values
#[derive(Debug, Clone, Copy, Default)]
pub struct Encoder {
    policy: ListPolicy,
}

impl Encoder {
    /// Create an encoder with the default list policy
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an encoder with a specific list policy
    pub fn with_policy(policy: ListPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> ListPolicy {
        self.policy
    }

    /// Encode `value` under `name`
    ///
    /// Returns `None` when the value equals its comparison. Without a
    /// comparison the value is written in full.
    pub fn encode(
        &self,
        name: &str,
        value: &dyn Reflect,
        comparison: Option<&dyn Reflect>,
    ) -> Option<Node> {
        let view = value.reflect_ref();
        match view {
            ReflectRef::Scalar(_)
            | ReflectRef::Text(_)
            | ReflectRef::DefRef(_)
            | ReflectRef::Enum(_) => {
                if comparison.is_some_and(|c| reflect_eq(value, c)) {
                    return None;
                }
                view.leaf_text().map(|text| Node::leaf(name, text))
            }
            ReflectRef::List(seq) | ReflectRef::Array(seq) => {
                let base = comparison.and_then(|c| match c.reflect_ref() {
                    ReflectRef::List(s) | ReflectRef::Array(s) => Some(s),
                    _ => None,
                });
                let range = self.policy.emitted_range(seq, base)?;
                let elements = range
                    .filter_map(|i| seq.element(i))
                    .map(|element| {
                        // keep positions stable even when an element has nothing to write
                        self.encode(LIST_ELEMENT, element, None)
                            .unwrap_or_else(|| Node::leaf(LIST_ELEMENT, ""))
                    })
                    .collect();
                Node::interior_or_absent(name, elements)
            }
            ReflectRef::Record(record) => {
                let base = comparison.and_then(|c| match c.reflect_ref() {
                    ReflectRef::Record(r) => Some(r),
                    _ => None,
                });
                let children = record
                    .field_names()
                    .iter()
                    .filter_map(|field| {
                        let current = record.field(field)?;
                        let previous = base.and_then(|b| b.field(field));
                        self.encode(field, current, previous)
                    })
                    .collect();
                Node::interior_or_absent(name, children)
            }
        }
    }

    /// Encode a record body against its comparison
    ///
    /// Always returns a body root named `type_name`, empty when nothing
    /// differs.
    pub fn encode_body(
        &self,
        type_name: &str,
        value: &dyn Reflect,
        comparison: &dyn Reflect,
    ) -> Node {
        self.encode(type_name, value, Some(comparison))
            .unwrap_or_else(|| Node::empty(type_name))
    }

    /// Encode a typed definition against its resolved parent, or against the
    /// type default when it has none
    pub fn encode_def<T: Def>(&self, value: &T, parent: Option<&T>) -> Node {
        match parent {
            Some(parent) => self.encode_body(T::TYPE_NAME, value, parent),
            None => self.encode_body(T::TYPE_NAME, value, &T::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{reflect_enum, reflect_record, DefRef};

    #[derive(Debug, Default, Clone, Copy, PartialEq)]
    enum Tech {
        #[default]
        Neolithic,
        Industrial,
    }

    reflect_enum!(Tech { Neolithic, Industrial });

    #[derive(Debug, Default, Clone, PartialEq)]
    struct Stats {
        mass: f32,
        beauty: i32,
    }

    reflect_record!(Stats { mass, beauty });

    #[derive(Debug, Default, Clone)]
    struct Thing {
        label: String,
        tech: Tech,
        stats: Stats,
        stuff: DefRef<Thing>,
        tags: Vec<String>,
        cached: u32,
    }

    reflect_record!(Thing {
        label,
        tech,
        stats,
        stuff,
        tags,
    });

    impl Def for Thing {
        const TYPE_NAME: &'static str = "ThingDef";
    }

    fn child_names(node: &Node) -> Vec<&str> {
        node.children().iter().map(|c| c.name.as_str()).collect()
    }

    #[test]
    fn test_default_value_encodes_empty() {
        let body = Encoder::new().encode_def(&Thing::default(), None);
        assert_eq!(body.name, "ThingDef");
        assert!(body.is_absent());
    }

    #[test]
    fn test_only_changed_fields_in_declaration_order() {
        let thing = Thing {
            tags: vec!["a".into()],
            stats: Stats {
                mass: 2.5,
                beauty: 0,
            },
            label: "gear".into(),
            tech: Tech::Industrial,
            stuff: DefRef::to("Steel"),
            cached: 7,
        };
        let body = Encoder::new().encode_def(&thing, None);
        assert_eq!(child_names(&body), vec!["label", "tech", "stats", "stuff", "tags"]);
        assert_eq!(body.get_path(&["tech"]).and_then(Node::text), Some("Industrial"));
        assert_eq!(body.get_path(&["stats", "mass"]).and_then(Node::text), Some("2.5"));
        assert!(body.get_path(&["stats", "beauty"]).is_none());
        assert_eq!(body.get_path(&["stuff"]).and_then(Node::text), Some("Steel"));
    }

    #[test]
    fn test_parent_override() {
        let parent = Thing {
            stats: Stats {
                mass: 1.0,
                beauty: 0,
            },
            ..Default::default()
        };
        let mut child = parent.clone();
        let encoder = Encoder::new();
        assert!(encoder.encode_def(&child, Some(&parent)).is_absent());

        child.stats.mass = 2.0;
        let body = encoder.encode_def(&child, Some(&parent));
        assert_eq!(body.get_path(&["stats", "mass"]).and_then(Node::text), Some("2"));
    }

    #[test]
    fn test_reference_compared_by_name() {
        let parent = Thing {
            stuff: DefRef::to("Steel"),
            ..Default::default()
        };
        let child = parent.clone();
        assert!(Encoder::new().encode_def(&child, Some(&parent)).is_absent());

        let cleared = Thing::default();
        let body = Encoder::new().encode_def(&cleared, Some(&parent));
        assert_eq!(body.child("stuff").and_then(Node::text), Some(""));
    }

    #[test]
    fn test_append_only_lists() {
        let parent = Thing {
            tags: vec!["a".into(), "b".into()],
            ..Default::default()
        };
        let mut child = parent.clone();
        child.tags.push("c".into());

        let encoder = Encoder::new();
        let body = encoder.encode_def(&child, Some(&parent));
        let elements: Vec<_> = body
            .child("tags")
            .map(|t| t.elements().filter_map(Node::text).collect())
            .unwrap_or_default();
        assert_eq!(elements, vec!["c"]);

        child.tags.truncate(1);
        assert!(encoder.encode_def(&child, Some(&parent)).child("tags").is_none());

        // edits inside the inherited range are not recorded
        let mut edited = parent.clone();
        edited.tags[0] = "z".into();
        assert!(encoder.encode_def(&edited, Some(&parent)).is_absent());
    }

    #[test]
    fn test_replace_lists() {
        let parent = Thing {
            tags: vec!["a".into(), "b".into()],
            ..Default::default()
        };
        let mut edited = parent.clone();
        edited.tags[0] = "z".into();

        let encoder = Encoder::with_policy(ListPolicy::Replace);
        let body = encoder.encode_def(&edited, Some(&parent));
        let elements: Vec<_> = body
            .child("tags")
            .map(|t| t.elements().filter_map(Node::text).collect())
            .unwrap_or_default();
        assert_eq!(elements, vec!["z", "b"]);
        assert!(encoder.encode_def(&parent, Some(&parent)).is_absent());

        edited.tags.clear();
        assert!(encoder.encode_def(&edited, Some(&parent)).child("tags").is_none());
    }

    #[test]
    fn test_list_elements_written_in_full() {
        let things = vec![Stats::default(), Stats { mass: 1.0, beauty: 2 }];
        let node = Encoder::new().encode("parts", &things, None).unwrap();
        let elements: Vec<_> = node.elements().collect();
        assert_eq!(elements.len(), 2);
        assert_eq!(child_names(elements[0]), vec!["mass", "beauty"]);
        assert_eq!(elements[1].child("beauty").and_then(Node::text), Some("2"));
    }

    #[test]
    fn test_encoding_is_deterministic() {
        let thing = Thing {
            label: "gear".into(),
            tags: vec!["x".into(), "y".into()],
            ..Default::default()
        };
        let encoder = Encoder::new();
        let first = encoder.encode_def(&thing, None);
        let second = encoder.encode_def(&thing, None);
        assert_eq!(first, second);
        assert_eq!(first.to_string(), second.to_string());
    }
}
