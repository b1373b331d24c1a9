//! Reflection surface for definition values
//!
//! Every value that takes part in diffing, materialization or inspection
//! implements [`Reflect`]. A value exposes itself through a closed borrowed
//! view ([`ReflectRef`] / [`ReflectMut`]) with one variant per shape, so every
//! consumer matches exhaustively instead of probing concrete types.
//!
//! Records and enumerations opt in with the [`reflect_record!`] and
//! [`reflect_enum!`] macros.
//!
//! [`reflect_record!`]: crate::reflect_record
//! [`reflect_enum!`]: crate::reflect_enum

use crate::identity::DefName;
use std::any::{Any, TypeId};
use std::fmt;
use std::rc::Rc;

/// A primitive scalar value, widened for comparison
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scalar {
    Bool(bool),
    Int(i64),
    UInt(u64),
    F32(f32),
    F64(f64),
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Bool(b) => write!(f, "{}", b),
            Scalar::Int(i) => write!(f, "{}", i),
            Scalar::UInt(u) => write!(f, "{}", u),
            Scalar::F32(x) => write!(f, "{}", x),
            Scalar::F64(x) => write!(f, "{}", x),
        }
    }
}

/// Read-only view of a value, one variant per shape
pub enum ReflectRef<'a> {
    Scalar(Scalar),
    Text(&'a str),
    /// Name of the referenced definition, if any
    DefRef(Option<&'a DefName>),
    /// Variant name
    Enum(&'static str),
    List(&'a dyn Sequence),
    Array(&'a dyn Sequence),
    Record(&'a dyn Record),
}

impl ReflectRef<'_> {
    /// Canonical text of a leaf value, `None` for lists, arrays and records
    pub fn leaf_text(&self) -> Option<String> {
        match self {
            ReflectRef::Scalar(s) => Some(s.to_string()),
            ReflectRef::Text(t) => Some((*t).to_string()),
            ReflectRef::DefRef(name) => Some(name.map(|n| n.to_string()).unwrap_or_default()),
            ReflectRef::Enum(v) => Some((*v).to_string()),
            ReflectRef::List(_) | ReflectRef::Array(_) | ReflectRef::Record(_) => None,
        }
    }
}

/// Mutable view of a value, one variant per shape
pub enum ReflectMut<'a> {
    Scalar(&'a mut dyn Leaf),
    Text(&'a mut dyn Leaf),
    DefRef(&'a mut dyn RefSlot),
    Enum(&'a mut dyn Leaf),
    List(&'a mut dyn Sequence),
    Array(&'a mut dyn Sequence),
    Record(&'a mut dyn Record),
}

/// A reflectable value
pub trait Reflect: Any {
    /// Short type name used in diagnostics
    fn type_name(&self) -> &'static str;

    fn reflect_ref(&self) -> ReflectRef<'_>;

    fn reflect_mut(&mut self) -> ReflectMut<'_>;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;

    fn into_any(self: Box<Self>) -> Box<dyn Any>;
}

/// A value that round-trips through its canonical text
pub trait Leaf {
    fn to_text(&self) -> String;

    /// Parse `text` and overwrite the value
    fn set_text(&mut self, text: &str) -> Result<(), String>;
}

/// Homogeneous ordered collection
pub trait Sequence {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn element(&self, index: usize) -> Option<&dyn Reflect>;

    fn element_mut(&mut self, index: usize) -> Option<&mut dyn Reflect>;

    /// Truncate or pad with default elements
    fn resize(&mut self, len: usize);
}

/// Fixed set of named fields in declaration order
pub trait Record {
    fn record_type_name(&self) -> &'static str;

    /// Serialized field names, in declaration order
    fn field_names(&self) -> &'static [&'static str];

    fn field(&self, name: &str) -> Option<&dyn Reflect>;

    fn field_mut(&mut self, name: &str) -> Option<&mut dyn Reflect>;
}

/// Slot holding a reference to another definition
pub trait RefSlot {
    fn name(&self) -> Option<&DefName>;

    /// Type the reference expects its target to materialize as
    fn target_type(&self) -> TypeId;

    fn target_type_name(&self) -> &'static str;

    /// Point at `name` without a resolved target
    fn set_name(&mut self, name: Option<DefName>);

    /// Point at `name` and attach its resolved target
    ///
    /// Returns the target back when it is not of the expected type.
    fn bind(&mut self, name: DefName, target: Rc<dyn Any>) -> Result<(), Rc<dyn Any>>;
}

/// Structural equality over reflected values
///
/// Scalars compare numerically, text by string, enumerations by variant
/// name and references by the referenced name only.
pub fn reflect_eq(a: &dyn Reflect, b: &dyn Reflect) -> bool {
    match (a.reflect_ref(), b.reflect_ref()) {
        (ReflectRef::Scalar(x), ReflectRef::Scalar(y)) => x == y,
        (ReflectRef::Text(x), ReflectRef::Text(y)) => x == y,
        (ReflectRef::DefRef(x), ReflectRef::DefRef(y)) => x == y,
        (ReflectRef::Enum(x), ReflectRef::Enum(y)) => x == y,
        (ReflectRef::List(x), ReflectRef::List(y)) | (ReflectRef::Array(x), ReflectRef::Array(y)) => {
            sequence_eq(x, y)
        }
        (ReflectRef::Record(x), ReflectRef::Record(y)) => {
            let names = x.field_names();
            names.len() == y.field_names().len()
                && names.iter().all(|name| match (x.field(name), y.field(name)) {
                    (Some(fx), Some(fy)) => reflect_eq(fx, fy),
                    _ => false,
                })
        }
        _ => false,
    }
}

/// Element-wise equality of two sequences
pub fn sequence_eq(a: &dyn Sequence, b: &dyn Sequence) -> bool {
    a.len() == b.len()
        && (0..a.len()).all(|i| match (a.element(i), b.element(i)) {
            (Some(x), Some(y)) => reflect_eq(x, y),
            _ => false,
        })
}

// ============================================================================
// Scalars and text
// ============================================================================

macro_rules! reflect_scalar {
    ($($ty:ty => $variant:ident($wide:ty)),* $(,)?) => {
        $(
            impl Leaf for $ty {
                fn to_text(&self) -> String {
                    self.to_string()
                }

                fn set_text(&mut self, text: &str) -> Result<(), String> {
                    *self = text.trim().parse::<$ty>().map_err(|e| e.to_string())?;
                    Ok(())
                }
            }

            impl Reflect for $ty {
                fn type_name(&self) -> &'static str {
                    stringify!($ty)
                }

                fn reflect_ref(&self) -> ReflectRef<'_> {
                    ReflectRef::Scalar(Scalar::$variant(*self as $wide))
                }

                fn reflect_mut(&mut self) -> ReflectMut<'_> {
                    ReflectMut::Scalar(self)
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
        )*
    };
}

reflect_scalar!(
    i8 => Int(i64),
    i16 => Int(i64),
    i32 => Int(i64),
    i64 => Int(i64),
    isize => Int(i64),
    u8 => UInt(u64),
    u16 => UInt(u64),
    u32 => UInt(u64),
    u64 => UInt(u64),
    usize => UInt(u64),
    f32 => F32(f32),
    f64 => F64(f64),
);

impl Leaf for bool {
    fn to_text(&self) -> String {
        self.to_string()
    }

    fn set_text(&mut self, text: &str) -> Result<(), String> {
        let text = text.trim();
        if text.eq_ignore_ascii_case("true") {
            *self = true;
        } else if text.eq_ignore_ascii_case("false") {
            *self = false;
        } else {
            return Err(format!("invalid bool: {:?}", text));
        }
        Ok(())
    }
}

impl Reflect for bool {
    fn type_name(&self) -> &'static str {
        "bool"
    }

    fn reflect_ref(&self) -> ReflectRef<'_> {
        ReflectRef::Scalar(Scalar::Bool(*self))
    }

    fn reflect_mut(&mut self) -> ReflectMut<'_> {
        ReflectMut::Scalar(self)
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

impl Leaf for String {
    fn to_text(&self) -> String {
        self.clone()
    }

    fn set_text(&mut self, text: &str) -> Result<(), String> {
        self.clear();
        self.push_str(text);
        Ok(())
    }
}

impl Reflect for String {
    fn type_name(&self) -> &'static str {
        "String"
    }

    fn reflect_ref(&self) -> ReflectRef<'_> {
        ReflectRef::Text(self)
    }

    fn reflect_mut(&mut self) -> ReflectMut<'_> {
        ReflectMut::Text(self)
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

// ============================================================================
// Lists and arrays
// ============================================================================

impl<T: Reflect + Default> Sequence for Vec<T> {
    fn len(&self) -> usize {
        Vec::len(self)
    }

    fn element(&self, index: usize) -> Option<&dyn Reflect> {
        self.as_slice().get(index).map(|e| e as &dyn Reflect)
    }

    fn element_mut(&mut self, index: usize) -> Option<&mut dyn Reflect> {
        self.as_mut_slice().get_mut(index).map(|e| e as &mut dyn Reflect)
    }

    fn resize(&mut self, len: usize) {
        self.resize_with(len, T::default);
    }
}

impl<T: Reflect + Default> Reflect for Vec<T> {
    fn type_name(&self) -> &'static str {
        "Vec"
    }

    fn reflect_ref(&self) -> ReflectRef<'_> {
        ReflectRef::List(self)
    }

    fn reflect_mut(&mut self) -> ReflectMut<'_> {
        ReflectMut::List(self)
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

// A boxed slice never grows in place; resizing replaces the whole slice.
impl<T: Reflect + Default> Sequence for Box<[T]> {
    fn len(&self) -> usize {
        <[T]>::len(self)
    }

    fn element(&self, index: usize) -> Option<&dyn Reflect> {
        <[T]>::get(self, index).map(|e| e as &dyn Reflect)
    }

    fn element_mut(&mut self, index: usize) -> Option<&mut dyn Reflect> {
        <[T]>::get_mut(self, index).map(|e| e as &mut dyn Reflect)
    }

    fn resize(&mut self, len: usize) {
        if len == <[T]>::len(self) {
            return;
        }
        let mut items = std::mem::take(self).into_vec();
        items.resize_with(len, T::default);
        *self = items.into_boxed_slice();
    }
}

impl<T: Reflect + Default> Reflect for Box<[T]> {
    fn type_name(&self) -> &'static str {
        "Array"
    }

    fn reflect_ref(&self) -> ReflectRef<'_> {
        ReflectRef::Array(self)
    }

    fn reflect_mut(&mut self) -> ReflectMut<'_> {
        ReflectMut::Array(self)
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

// ============================================================================
// Opt-in macros
// ============================================================================

#[doc(hidden)]
#[macro_export]
macro_rules! __reflect_field_name {
    ($field:ident) => {
        stringify!($field)
    };
    ($field:ident, $alias:literal) => {
        $alias
    };
}

/// Implement [`Reflect`] for a struct as a record
///
/// List the serialized fields in declaration order. Fields that are not
/// listed are never serialized, diffed or inspected. A field can be stored
/// under another name with `field as "storedName"`.
///
/// ```
/// use defstack_core::reflect_record;
///
/// #[derive(Debug, Default)]
/// struct Stats {
///     mass: f32,
///     max_hit_points: i32,
///     cached_score: f32,
/// }
///
/// reflect_record!(Stats { mass, max_hit_points as "maxHitPoints" });
/// ```
#[macro_export]
macro_rules! reflect_record {
    ($ty:ident { $($field:ident $(as $alias:literal)?),* $(,)? }) => {
        impl $crate::Record for $ty {
            fn record_type_name(&self) -> &'static str {
                stringify!($ty)
            }

            fn field_names(&self) -> &'static [&'static str] {
                &[$($crate::__reflect_field_name!($field $(, $alias)?)),*]
            }

            #[allow(unused_variables)]
            fn field(&self, name: &str) -> ::std::option::Option<&dyn $crate::Reflect> {
                $(
                    if name == $crate::__reflect_field_name!($field $(, $alias)?) {
                        return ::std::option::Option::Some(&self.$field as &dyn $crate::Reflect);
                    }
                )*
                ::std::option::Option::None
            }

            #[allow(unused_variables)]
            fn field_mut(&mut self, name: &str) -> ::std::option::Option<&mut dyn $crate::Reflect> {
                $(
                    if name == $crate::__reflect_field_name!($field $(, $alias)?) {
                        return ::std::option::Option::Some(&mut self.$field as &mut dyn $crate::Reflect);
                    }
                )*
                ::std::option::Option::None
            }
        }

        impl $crate::Reflect for $ty {
            fn type_name(&self) -> &'static str {
                stringify!($ty)
            }

            fn reflect_ref(&self) -> $crate::ReflectRef<'_> {
                $crate::ReflectRef::Record(self)
            }

            fn reflect_mut(&mut self) -> $crate::ReflectMut<'_> {
                $crate::ReflectMut::Record(self)
            }

            fn as_any(&self) -> &dyn ::std::any::Any {
                self
            }

            fn as_any_mut(&mut self) -> &mut dyn ::std::any::Any {
                self
            }

            fn into_any(self: ::std::boxed::Box<Self>) -> ::std::boxed::Box<dyn ::std::any::Any> {
                self
            }
        }
    };
}

/// Implement [`Reflect`] for a fieldless enum
///
/// The variant name is the canonical text.
///
/// ```
/// use defstack_core::reflect_enum;
///
/// #[derive(Debug, Default, Clone, Copy, PartialEq)]
/// enum Category {
///     #[default]
///     Item,
///     Building,
/// }
///
/// reflect_enum!(Category { Item, Building });
/// ```
#[macro_export]
macro_rules! reflect_enum {
    ($ty:ident { $($variant:ident),* $(,)? }) => {
        impl $ty {
            #[allow(dead_code)]
            fn reflect_variant_name(&self) -> &'static str {
                match self {
                    $($ty::$variant => stringify!($variant),)*
                }
            }
        }

        impl $crate::Leaf for $ty {
            fn to_text(&self) -> ::std::string::String {
                ::std::string::ToString::to_string(self.reflect_variant_name())
            }

            fn set_text(&mut self, text: &str) -> ::std::result::Result<(), ::std::string::String> {
                let text = text.trim();
                $(
                    if text == stringify!($variant) {
                        *self = $ty::$variant;
                        return ::std::result::Result::Ok(());
                    }
                )*
                ::std::result::Result::Err(::std::format!(
                    "unknown {} variant: {:?}",
                    stringify!($ty),
                    text
                ))
            }
        }

        impl $crate::Reflect for $ty {
            fn type_name(&self) -> &'static str {
                stringify!($ty)
            }

            fn reflect_ref(&self) -> $crate::ReflectRef<'_> {
                $crate::ReflectRef::Enum(self.reflect_variant_name())
            }

            fn reflect_mut(&mut self) -> $crate::ReflectMut<'_> {
                $crate::ReflectMut::Enum(self)
            }

            fn as_any(&self) -> &dyn ::std::any::Any {
                self
            }

            fn as_any_mut(&mut self) -> &mut dyn ::std::any::Any {
                self
            }

            fn into_any(self: ::std::boxed::Box<Self>) -> ::std::boxed::Box<dyn ::std::any::Any> {
                self
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default, Clone, Copy, PartialEq)]
    enum Quality {
        #[default]
        Normal,
        Masterwork,
    }

    reflect_enum!(Quality { Normal, Masterwork });

    #[derive(Debug, Default, Clone, PartialEq)]
    struct Part {
        label: String,
        weight: f32,
        quality: Quality,
        tags: Vec<String>,
        slots: Box<[u8]>,
        scratch: i32,
    }

    reflect_record!(Part {
        label,
        weight,
        quality,
        tags as "tagList",
        slots,
    });

    #[test]
    fn test_record_fields() {
        let part = Part::default();
        assert_eq!(
            part.field_names(),
            &["label", "weight", "quality", "tagList", "slots"]
        );
        assert!(part.field("scratch").is_none());
        assert!(part.field("tags").is_none());
        assert!(part.field("tagList").is_some());
        assert_eq!(Reflect::type_name(&part), "Part");
    }

    #[test]
    fn test_leaf_text() {
        let mut quality = Quality::Normal;
        quality.set_text("Masterwork").unwrap();
        assert_eq!(quality, Quality::Masterwork);
        assert!(quality.set_text("Legendary").is_err());
        assert_eq!(quality.reflect_ref().leaf_text().as_deref(), Some("Masterwork"));

        let mut flag = false;
        flag.set_text("True").unwrap();
        assert!(flag);

        let mut weight = 0.0f32;
        weight.set_text(" 0.1 ").unwrap();
        assert_eq!(weight.reflect_ref().leaf_text().as_deref(), Some("0.1"));

        let mut count = 0u8;
        assert!(count.set_text("300").is_err());
        assert!(count.set_text("-1").is_err());
    }

    #[test]
    fn test_reflect_eq() {
        let a = Part {
            label: "gear".into(),
            tags: vec!["metal".into()],
            ..Default::default()
        };
        let mut b = a.clone();
        assert!(reflect_eq(&a, &b));

        b.tags.push("small".into());
        assert!(!reflect_eq(&a, &b));

        b = a.clone();
        b.scratch = 99;
        assert!(reflect_eq(&a, &b), "unlisted fields are ignored");

        assert!(!reflect_eq(&1i32, &"1".to_string()));
        assert!(reflect_eq(&1.5f64, &1.5f64));
    }

    #[test]
    fn test_boxed_slice_resize_replaces() {
        let mut slots: Box<[u8]> = vec![1, 2].into_boxed_slice();
        Sequence::resize(&mut slots, 4);
        assert_eq!(&*slots, &[1, 2, 0, 0]);
        Sequence::resize(&mut slots, 1);
        assert_eq!(&*slots, &[1]);
    }

    #[test]
    fn test_sequence_access() {
        let mut tags: Vec<String> = vec!["a".into()];
        Sequence::resize(&mut tags, 2);
        assert_eq!(Sequence::len(&tags), 2);
        if let Some(ReflectMut::Text(leaf)) = tags.element_mut(1).map(|e| e.reflect_mut()) {
            leaf.set_text("b").unwrap();
        }
        assert_eq!(tags, vec!["a".to_string(), "b".to_string()]);
    }

    mod aliased {
        use crate::error::Result;

        #[derive(Debug, Default, Clone, Copy, PartialEq)]
        pub enum Grade {
            #[default]
            Low,
            High,
        }

        crate::reflect_enum!(Grade { Low, High });

        #[derive(Debug, Default)]
        pub struct Tier {
            pub grade: Grade,
        }

        crate::reflect_record!(Tier { grade });

        pub fn parse(text: &str) -> Result<Grade> {
            let mut grade = Grade::Low;
            crate::Leaf::set_text(&mut grade, text).map_err(|message| {
                crate::Error::InvalidValue {
                    path: "grade".into(),
                    message,
                }
            })?;
            Ok(grade)
        }
    }

    #[test]
    fn test_macros_with_result_alias_in_scope() {
        assert_eq!(aliased::parse("High").unwrap(), aliased::Grade::High);
        assert!(aliased::parse("Mid").is_err());

        let tier = aliased::Tier::default();
        assert_eq!(tier.field_names(), &["grade"]);
        assert_eq!(
            tier.field("grade").and_then(|g| g.reflect_ref().leaf_text()).as_deref(),
            Some("Low")
        );
    }
}
