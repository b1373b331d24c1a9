//! Defstack Inspector - Editor view over reflected definitions
//!
//! Shows a definition field by field next to its parent, marking which
//! fields override the inherited value, and writes the user's edits back
//! into the value. Committing the edited value to the index is the caller's
//! job.
//!
//! The inspector only talks to a [`Widgets`] implementation supplied by the
//! host UI.

mod error;
mod inspector;
mod widgets;

pub use error::{Error, Result};
pub use inspector::{collect_rows, FieldRow, Inspector};
pub use widgets::{FieldInfo, ListAction, Widgets};
