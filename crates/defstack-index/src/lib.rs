//! Defstack Index - Lookup tables over loaded definition records
//!
//! The index is the explicit context object every content operation runs
//! against. It owns the records and keeps three lookup tables into them:
//!
//! ```text
//! DefIndex
//!  │
//!  ├── slots[]     ← record arena, empty slots reused first
//!  ├── by_path     ← source file → slot
//!  ├── by_name     ← global name → slot
//!  └── scene       ← scene-local name → slot
//! ```
//!
//! ## Key Components
//!
//! - [`DefIndex`]: record storage, lookup, materialization and commit-back
//! - [`AllOfType`]: lazy, restartable enumeration of one definition type
//! - [`IndexConfig`]: slot reuse and list policy
//!
//! The index has no internal locking; all calls must come from one thread.

mod config;
mod error;
mod index;
mod queries;

pub use config::IndexConfig;
pub use error::{Error, Result};
pub use index::{DefIndex, Scope, ScopeView};
pub use queries::{AllOfType, Resolved};
