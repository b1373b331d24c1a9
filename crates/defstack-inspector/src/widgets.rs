//! Widget collaborator
//!
//! The inspector never draws anything itself. It asks the host UI for one
//! widget per field and receives the user's response in the same call.

use defstack_core::Shape;

/// Response of the per-list controls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ListAction {
    /// Leave the list as it is
    #[default]
    None,
    /// Append a default element
    Append,
    /// Drop the last element
    RemoveLast,
}

/// What the inspector knows about a field when it asks for a widget
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldInfo<'a> {
    /// Dotted path from the inspected root, e.g. `stats.mass` or `tags[2]`
    pub path: &'a str,
    /// Field name or element index
    pub label: &'a str,
    pub shape: Shape,
    /// Differs from the comparison value
    pub overridden: bool,
}

/// Host UI widgets, one request/response call each
pub trait Widgets {
    /// Show a leaf field; return new text when the user edited it
    fn field(&mut self, info: FieldInfo<'_>, text: &str) -> Option<String>;

    /// Open a group for a record, list or array; return false to collapse it
    fn begin_group(&mut self, info: FieldInfo<'_>) -> bool;

    /// Close the group opened by the matching `begin_group`
    fn end_group(&mut self);

    /// Show the add/remove controls of an expanded list or array
    fn list_controls(&mut self, info: FieldInfo<'_>, len: usize) -> ListAction;
}
