//! Defstack Core - Definition hierarchy and differential serialization
//!
//! This crate provides the engine behind inheritable game-content definitions:
//! - Reflection surface over typed values (`Reflect`, `ReflectRef`, `ReflectMut`)
//! - Shape classification that every other component dispatches on
//! - Differential tree model (`Node`) holding only what differs from a parent
//! - Diff encoder (`Encoder`) producing minimal, deterministic trees
//! - Materializer stacking a record's ancestor chain into a typed value
//! - Type registry resolving stored type names to constructible types
//!
//! ## Example
//!
//! ```
//! use defstack_core::{reflect_record, Def, DefRecord, Encoder, Materializer, TypeRegistry};
//!
//! #[derive(Debug, Default, Clone, PartialEq)]
//! struct ThingDef {
//!     label: String,
//!     mass: f32,
//! }
//!
//! reflect_record!(ThingDef { label, mass });
//!
//! impl Def for ThingDef {
//!     const TYPE_NAME: &'static str = "ThingDef";
//! }
//!
//! let types = TypeRegistry::new().with::<ThingDef>();
//! let parent = ThingDef { label: "chunk".into(), mass: 1.0 };
//! let child = ThingDef { mass: 2.0, ..parent.clone() };
//!
//! let records = vec![
//!     DefRecord::new("ThingDef", "Chunk").with_body(Encoder::new().encode_def(&parent, None)),
//!     DefRecord::new("ThingDef", "HeavyChunk")
//!         .with_parent("Chunk")
//!         .with_body(Encoder::new().encode_def(&child, Some(&parent))),
//! ];
//!
//! let value: ThingDef = Materializer::new(&records, &types)
//!     .materialize_as(&records[1])
//!     .unwrap();
//! assert_eq!(value, child);
//! ```

mod def_ref;
mod encode;
mod error;
mod identity;
mod materialize;
mod node;
mod record;
mod reflect;
mod registry;
mod shape;

pub use def_ref::DefRef;
pub use encode::{Encoder, ListPolicy};
pub use error::{Error, Result};
pub use identity::{DefName, SlotId};
pub use materialize::{ancestor_chain, materialize, Materializer};
pub use node::{Node, NodeKind, LIST_ELEMENT};
pub use record::{DefRecord, RecordLookup};
pub use reflect::{
    reflect_eq, sequence_eq, Leaf, Record, RefSlot, Reflect, ReflectMut, ReflectRef, Scalar,
    Sequence,
};
pub use registry::{Def, DefType, TypeRegistry, TypeResolver};
pub use shape::{classify, Shape};
