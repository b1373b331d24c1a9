//! Field-by-field inspector
//!
//! Walks a value against a comparison value the same way the encoder does,
//! so a field is shown as overridden exactly when the encoder would write it
//! (lists follow element-by-element comparison here). Edits returned by the
//! widgets are applied to the value in place.

use crate::error::{Error, Result};
use crate::widgets::{FieldInfo, ListAction, Widgets};
use defstack_core::{reflect_eq, DefName, Leaf, Reflect, ReflectMut, ReflectRef, Shape};

/// A flattened, read-only view of one field
#[derive(Debug, Clone, PartialEq)]
pub struct FieldRow {
    pub path: String,
    pub shape: Shape,
    /// Canonical text for leaves, `None` for records, lists and arrays
    pub text: Option<String>,
    pub overridden: bool,
}

/// Drives a [`Widgets`] implementation over a reflected value
#[derive(Debug, Default)]
pub struct Inspector {
    rejected: Vec<Error>,
}

impl Inspector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Show `value` and apply the user's edits
    ///
    /// Without a comparison every field counts as overridden. Returns true
    /// when at least one edit was applied. Edits that fail to parse leave the
    /// field unchanged and are kept in [`rejected`](Self::rejected).
    pub fn show(
        &mut self,
        widgets: &mut dyn Widgets,
        value: &mut dyn Reflect,
        comparison: Option<&dyn Reflect>,
    ) -> bool {
        self.rejected.clear();
        let label = value.type_name();
        self.walk(widgets, "", label, value, comparison)
    }

    /// Edits rejected by the last [`show`](Self::show)
    pub fn rejected(&self) -> &[Error] {
        &self.rejected
    }

    pub fn take_rejected(&mut self) -> Vec<Error> {
        std::mem::take(&mut self.rejected)
    }

    fn reject(&mut self, error: Error) {
        log::warn!("{}", error);
        self.rejected.push(error);
    }

    fn walk(
        &mut self,
        widgets: &mut dyn Widgets,
        path: &str,
        label: &str,
        value: &mut dyn Reflect,
        comparison: Option<&dyn Reflect>,
    ) -> bool {
        let overridden = comparison.map_or(true, |c| !reflect_eq(value, c));
        let view = value.reflect_mut();
        let info = FieldInfo {
            path,
            label,
            shape: view.shape(),
            overridden,
        };

        match view {
            ReflectMut::Scalar(leaf) | ReflectMut::Text(leaf) | ReflectMut::Enum(leaf) => {
                let text = leaf.to_text();
                let Some(edited) = widgets.field(info, &text) else {
                    return false;
                };
                if edited == text {
                    return false;
                }
                match apply_edit(leaf, path, &edited) {
                    Ok(()) => true,
                    Err(e) => {
                        self.reject(e);
                        false
                    }
                }
            }
            ReflectMut::DefRef(slot) => {
                let text = slot.name().map(DefName::to_string).unwrap_or_default();
                let Some(edited) = widgets.field(info, &text) else {
                    return false;
                };
                let edited = edited.trim();
                if edited == text {
                    return false;
                }
                // the new target is bound on the next materialization
                slot.set_name((!edited.is_empty()).then(|| DefName::new(edited)));
                true
            }
            ReflectMut::List(seq) | ReflectMut::Array(seq) => {
                let base = comparison.and_then(|c| match c.reflect_ref() {
                    ReflectRef::List(s) | ReflectRef::Array(s) => Some(s),
                    _ => None,
                });
                let mut changed = false;
                if widgets.begin_group(info) {
                    for i in 0..seq.len() {
                        let element_path = format!("{}[{}]", path, i);
                        let element_label = i.to_string();
                        let previous = base.and_then(|b| b.element(i));
                        if let Some(element) = seq.element_mut(i) {
                            changed |=
                                self.walk(widgets, &element_path, &element_label, element, previous);
                        }
                    }
                    let len = seq.len();
                    match widgets.list_controls(info, len) {
                        ListAction::Append => {
                            seq.resize(len + 1);
                            changed = true;
                        }
                        ListAction::RemoveLast if len > 0 => {
                            seq.resize(len - 1);
                            changed = true;
                        }
                        ListAction::RemoveLast | ListAction::None => {}
                    }
                }
                widgets.end_group();
                changed
            }
            ReflectMut::Record(record) => {
                let base = comparison.and_then(|c| match c.reflect_ref() {
                    ReflectRef::Record(r) => Some(r),
                    _ => None,
                });
                let mut changed = false;
                if widgets.begin_group(info) {
                    for field in record.field_names() {
                        let field_path = join(path, field);
                        let previous = base.and_then(|b| b.field(field));
                        if let Some(current) = record.field_mut(field) {
                            changed |= self.walk(widgets, &field_path, field, current, previous);
                        }
                    }
                }
                widgets.end_group();
                changed
            }
        }
    }
}

fn apply_edit(leaf: &mut dyn Leaf, path: &str, text: &str) -> Result<()> {
    leaf.set_text(text).map_err(|message| Error::InvalidEdit {
        path: path.to_string(),
        message,
    })
}

/// Flatten `value` into rows, comparing against `comparison`
pub fn collect_rows(value: &dyn Reflect, comparison: Option<&dyn Reflect>) -> Vec<FieldRow> {
    let mut rows = Vec::new();
    collect_into(&mut rows, "", value, comparison);
    rows
}

fn collect_into(
    rows: &mut Vec<FieldRow>,
    path: &str,
    value: &dyn Reflect,
    comparison: Option<&dyn Reflect>,
) {
    let view = value.reflect_ref();
    if !path.is_empty() {
        rows.push(FieldRow {
            path: path.to_string(),
            shape: view.shape(),
            text: view.leaf_text(),
            overridden: comparison.map_or(true, |c| !reflect_eq(value, c)),
        });
    }
    match view {
        ReflectRef::Scalar(_) | ReflectRef::Text(_) | ReflectRef::DefRef(_) | ReflectRef::Enum(_) => {}
        ReflectRef::List(seq) | ReflectRef::Array(seq) => {
            let base = comparison.and_then(|c| match c.reflect_ref() {
                ReflectRef::List(s) | ReflectRef::Array(s) => Some(s),
                _ => None,
            });
            for i in 0..seq.len() {
                if let Some(element) = seq.element(i) {
                    let previous = base.and_then(|b| b.element(i));
                    collect_into(rows, &format!("{}[{}]", path, i), element, previous);
                }
            }
        }
        ReflectRef::Record(record) => {
            let base = comparison.and_then(|c| match c.reflect_ref() {
                ReflectRef::Record(r) => Some(r),
                _ => None,
            });
            for field in record.field_names() {
                if let Some(current) = record.field(field) {
                    let previous = base.and_then(|b| b.field(field));
                    collect_into(rows, &join(path, field), current, previous);
                }
            }
        }
    }
}

fn join(path: &str, field: &str) -> String {
    if path.is_empty() {
        field.to_string()
    } else {
        format!("{}.{}", path, field)
    }
}
