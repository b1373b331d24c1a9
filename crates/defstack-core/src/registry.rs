//! Definition types and the type resolver

use crate::reflect::Reflect;
use indexmap::IndexMap;
use std::any::TypeId;
use std::fmt;

/// A typed definition that can be stored as a record
pub trait Def: Reflect + Default {
    /// Name stored as the record's type name
    const TYPE_NAME: &'static str;
}

/// A constructible definition type
#[derive(Clone, Copy)]
pub struct DefType {
    name: &'static str,
    type_id: TypeId,
    construct: fn() -> Box<dyn Reflect>,
}

fn construct_default<T: Def>() -> Box<dyn Reflect> {
    Box::new(T::default())
}

impl DefType {
    /// Describe a definition type
    pub fn of<T: Def>() -> Self {
        Self {
            name: T::TYPE_NAME,
            type_id: TypeId::of::<T>(),
            construct: construct_default::<T>,
        }
    }

    /// Stored type name
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Check if this describes `T`
    pub fn is<T: Def>(&self) -> bool {
        self.type_id == TypeId::of::<T>()
    }

    /// Build a default-valued instance
    pub fn construct(&self) -> Box<dyn Reflect> {
        (self.construct)()
    }
}

impl fmt::Debug for DefType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DefType").field("name", &self.name).finish()
    }
}

/// Maps stored type names back to constructible types
///
/// Unknown names resolve to `None`, never to an error.
pub trait TypeResolver {
    fn resolve(&self, type_name: &str) -> Option<&DefType>;
}

/// Registry of definition types, in registration order
#[derive(Debug, Default, Clone)]
pub struct TypeRegistry {
    types: IndexMap<&'static str, DefType>,
}

impl TypeRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a definition type
    pub fn register<T: Def>(&mut self) -> &mut Self {
        let def_type = DefType::of::<T>();
        if let Some(previous) = self.types.insert(T::TYPE_NAME, def_type) {
            if previous.type_id != def_type.type_id {
                log::warn!("type name {} registered twice, replacing", T::TYPE_NAME);
            }
        }
        self
    }

    /// Register a definition type (builder style)
    pub fn with<T: Def>(mut self) -> Self {
        self.register::<T>();
        self
    }

    /// Look up a type by stored name
    pub fn get(&self, type_name: &str) -> Option<&DefType> {
        self.types.get(type_name)
    }

    /// Look up the stored name of `T`, if registered
    pub fn name_of<T: Def>(&self) -> Option<&'static str> {
        self.types.values().find(|t| t.is::<T>()).map(DefType::name)
    }

    /// Registered type names in registration order
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.types.keys().copied()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl TypeResolver for TypeRegistry {
    fn resolve(&self, type_name: &str) -> Option<&DefType> {
        self.get(type_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{reflect_record, ReflectRef};

    #[derive(Debug, Default)]
    struct Material {
        hardness: f32,
    }

    reflect_record!(Material { hardness });

    impl Def for Material {
        const TYPE_NAME: &'static str = "MaterialDef";
    }

    #[derive(Debug, Default)]
    struct Sound {
        volume: f32,
    }

    reflect_record!(Sound { volume });

    impl Def for Sound {
        const TYPE_NAME: &'static str = "SoundDef";
    }

    #[test]
    fn test_register_and_resolve() {
        let registry = TypeRegistry::new().with::<Material>().with::<Sound>();
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["MaterialDef", "SoundDef"]);

        let ty = registry.resolve("MaterialDef").unwrap();
        assert!(ty.is::<Material>());
        assert!(!ty.is::<Sound>());
        assert_eq!(registry.name_of::<Sound>(), Some("SoundDef"));
        assert!(registry.resolve("Missing").is_none());
    }

    #[test]
    fn test_construct_default() {
        let registry = TypeRegistry::new().with::<Material>();
        let value = registry.resolve("MaterialDef").unwrap().construct();
        assert!(matches!(value.reflect_ref(), ReflectRef::Record(_)));
        assert!(value.as_any().downcast_ref::<Material>().is_some());
    }
}
