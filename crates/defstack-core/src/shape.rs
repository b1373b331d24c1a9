//! Value shape classification
//!
//! Every component keys its recursion on [`Shape`]. The classification comes
//! from the value's `Reflect` impl, which is fixed per declared type, so the
//! same `(value, type)` pair always gets the same answer.

use crate::reflect::{Reflect, ReflectMut, ReflectRef};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Structural kind of a value, in dispatch priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Shape {
    /// Boolean, integer or float of any width
    Scalar,
    Text,
    /// Reference to another definition by name
    DefRef,
    Enum,
    /// Homogeneous growable list
    List,
    /// Homogeneous array, grown only by replacement
    Array,
    /// Named fields recursed one by one
    Record,
}

impl Shape {
    /// Shapes stored as a single leaf
    pub fn is_leaf(&self) -> bool {
        matches!(self, Shape::Scalar | Shape::Text | Shape::DefRef | Shape::Enum)
    }

    /// Shapes stored as `lv` element children
    pub fn is_sequence(&self) -> bool {
        matches!(self, Shape::List | Shape::Array)
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Shape::Scalar => "scalar",
            Shape::Text => "text",
            Shape::DefRef => "def_ref",
            Shape::Enum => "enum",
            Shape::List => "list",
            Shape::Array => "array",
            Shape::Record => "record",
        };
        f.write_str(name)
    }
}

impl ReflectRef<'_> {
    pub fn shape(&self) -> Shape {
        match self {
            ReflectRef::Scalar(_) => Shape::Scalar,
            ReflectRef::Text(_) => Shape::Text,
            ReflectRef::DefRef(_) => Shape::DefRef,
            ReflectRef::Enum(_) => Shape::Enum,
            ReflectRef::List(_) => Shape::List,
            ReflectRef::Array(_) => Shape::Array,
            ReflectRef::Record(_) => Shape::Record,
        }
    }
}

impl ReflectMut<'_> {
    pub fn shape(&self) -> Shape {
        match self {
            ReflectMut::Scalar(_) => Shape::Scalar,
            ReflectMut::Text(_) => Shape::Text,
            ReflectMut::DefRef(_) => Shape::DefRef,
            ReflectMut::Enum(_) => Shape::Enum,
            ReflectMut::List(_) => Shape::List,
            ReflectMut::Array(_) => Shape::Array,
            ReflectMut::Record(_) => Shape::Record,
        }
    }
}

/// Classify a value
pub fn classify(value: &dyn Reflect) -> Shape {
    value.reflect_ref().shape()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{reflect_enum, reflect_record, DefRef};

    #[derive(Debug, Default, Clone, Copy)]
    enum Size {
        #[default]
        Small,
        Large,
    }

    reflect_enum!(Size { Small, Large });

    #[derive(Debug, Default)]
    struct Target {
        size: Size,
    }

    reflect_record!(Target { size });

    impl crate::Def for Target {
        const TYPE_NAME: &'static str = "Target";
    }

    #[test]
    fn test_classify_every_shape() {
        assert_eq!(classify(&true), Shape::Scalar);
        assert_eq!(classify(&7u16), Shape::Scalar);
        assert_eq!(classify(&-3i64), Shape::Scalar);
        assert_eq!(classify(&2.5f32), Shape::Scalar);
        assert_eq!(classify(&String::from("x")), Shape::Text);
        assert_eq!(classify(&DefRef::<Target>::to("T")), Shape::DefRef);
        assert_eq!(classify(&Size::Large), Shape::Enum);
        assert_eq!(classify(&vec![1i32]), Shape::List);
        assert_eq!(classify(&vec![1i32].into_boxed_slice()), Shape::Array);
        assert_eq!(classify(&Target::default()), Shape::Record);
    }

    #[test]
    fn test_classify_is_stable() {
        let value = vec![Size::Small];
        assert_eq!(classify(&value), classify(&value));
        let mut value = value;
        assert_eq!(value.reflect_mut().shape(), Shape::List);
    }

    #[test]
    fn test_shape_groups() {
        assert!(Shape::DefRef.is_leaf());
        assert!(!Shape::Record.is_leaf());
        assert!(Shape::Array.is_sequence());
        assert_eq!(Shape::DefRef.to_string(), "def_ref");
    }
}
