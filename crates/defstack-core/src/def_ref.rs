//! Cross-definition reference fields

use crate::identity::DefName;
use crate::reflect::{RefSlot, Reflect, ReflectMut, ReflectRef};
use std::any::{Any, TypeId};
use std::fmt;
use std::rc::Rc;

/// A field pointing at another definition by name
///
/// The name is the persisted identity. After materialization the resolved
/// target is attached as a shared, read-only value. Two references are equal
/// when they name the same definition, whether resolved or not.
pub struct DefRef<T> {
    name: Option<DefName>,
    target: Option<Rc<T>>,
}

impl<T> DefRef<T> {
    /// A reference to nothing
    pub fn none() -> Self {
        Self {
            name: None,
            target: None,
        }
    }

    /// An unresolved reference to `name`
    pub fn to(name: impl Into<DefName>) -> Self {
        Self {
            name: Some(name.into()),
            target: None,
        }
    }

    /// Name of the referenced definition
    pub fn name(&self) -> Option<&DefName> {
        self.name.as_ref()
    }

    /// Check if this reference names nothing
    pub fn is_none(&self) -> bool {
        self.name.is_none()
    }

    /// Check if the target has been resolved
    pub fn is_resolved(&self) -> bool {
        self.target.is_some()
    }

    /// Resolved target, if materialized
    pub fn get(&self) -> Option<&T> {
        self.target.as_deref()
    }

    /// Shared handle to the resolved target
    pub fn target(&self) -> Option<&Rc<T>> {
        self.target.as_ref()
    }
}

impl<T> Default for DefRef<T> {
    fn default() -> Self {
        Self::none()
    }
}

impl<T> Clone for DefRef<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            target: self.target.clone(),
        }
    }
}

impl<T> PartialEq for DefRef<T> {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl<T> fmt::Debug for DefRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DefRef")
            .field("name", &self.name)
            .field("resolved", &self.target.is_some())
            .finish()
    }
}

impl<T: Reflect> RefSlot for DefRef<T> {
    fn name(&self) -> Option<&DefName> {
        self.name.as_ref()
    }

    fn target_type(&self) -> TypeId {
        TypeId::of::<T>()
    }

    fn target_type_name(&self) -> &'static str {
        std::any::type_name::<T>()
    }

    fn set_name(&mut self, name: Option<DefName>) {
        self.name = name;
        self.target = None;
    }

    fn bind(&mut self, name: DefName, target: Rc<dyn Any>) -> Result<(), Rc<dyn Any>> {
        let target = target.downcast::<T>()?;
        self.name = Some(name);
        self.target = Some(target);
        Ok(())
    }
}

impl<T: Reflect> Reflect for DefRef<T> {
    fn type_name(&self) -> &'static str {
        "DefRef"
    }

    fn reflect_ref(&self) -> ReflectRef<'_> {
        ReflectRef::DefRef(self.name.as_ref())
    }

    fn reflect_mut(&mut self) -> ReflectMut<'_> {
        ReflectMut::DefRef(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}
