use super::TableMapping;
use crate::{Entity, Error, Result};

use std::{
    any::TypeId,
    collections::HashMap,
    fmt,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

/// Identifies a registered mapping. Ids increase monotonically across the
/// process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MappingId(pub usize);

/// The immutable result of registering a domain type with its mapping.
pub struct TypeDescriptor {
    pub id: MappingId,
    pub mapping: TableMapping,
    pub type_id: TypeId,
    pub type_name: &'static str,
    constructor: fn() -> Box<dyn Entity>,
}

/// Registry of mapped domain types, keyed by Rust type.
#[derive(Default, Clone)]
pub struct Mappings {
    types: HashMap<TypeId, Arc<TypeDescriptor>>,
}

impl MappingId {
    fn next() -> Self {
        static NEXT_ID: AtomicUsize = AtomicUsize::new(1);
        Self(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl TypeDescriptor {
    /// A fresh, default-initialized instance of the mapped type.
    pub fn new_instance(&self) -> Box<dyn Entity> {
        (self.constructor)()
    }

    pub fn is<T: 'static>(&self) -> bool {
        self.type_id == TypeId::of::<T>()
    }
}

impl Mappings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Associates `T` with `mapping`.
    ///
    /// Fails if the mapping carries validation errors. Registering a type a
    /// second time returns the descriptor from the first registration.
    pub fn register<T: Entity + Default>(
        &mut self,
        mapping: TableMapping,
    ) -> Result<Arc<TypeDescriptor>> {
        let type_id = TypeId::of::<T>();

        if let Some(descriptor) = self.types.get(&type_id) {
            return Ok(descriptor.clone());
        }

        if !mapping.is_valid() {
            return Err(Error::mapping(mapping.error()).context(crate::err!(
                "cannot register `{}`",
                std::any::type_name::<T>()
            )));
        }

        let descriptor = Arc::new(TypeDescriptor {
            id: MappingId::next(),
            mapping,
            type_id,
            type_name: std::any::type_name::<T>(),
            constructor: || Box::new(T::default()),
        });

        tracing::debug!(
            type_name = descriptor.type_name,
            mapping_id = descriptor.id.0,
            table = %descriptor.mapping.qualified_name(),
            "registered table mapping"
        );

        self.types.insert(type_id, descriptor.clone());
        Ok(descriptor)
    }

    pub fn get<T: 'static>(&self) -> Option<&Arc<TypeDescriptor>> {
        self.types.get(&TypeId::of::<T>())
    }

    pub fn by_type_id(&self, type_id: TypeId) -> Option<&Arc<TypeDescriptor>> {
        self.types.get(&type_id)
    }

    pub fn by_id(&self, id: MappingId) -> Option<&Arc<TypeDescriptor>> {
        self.types.values().find(|descriptor| descriptor.id == id)
    }

    /// The descriptor for the concrete type of `entity`, if it is mapped.
    pub fn for_entity(&self, entity: &dyn Entity) -> Option<&Arc<TypeDescriptor>> {
        self.types.get(&entity.as_any().type_id())
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<TypeDescriptor>> {
        self.types.values()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("id", &self.id)
            .field("type_name", &self.type_name)
            .field("mapping", &self.mapping)
            .finish()
    }
}

impl fmt::Debug for Mappings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.types.values().map(|descriptor| descriptor.type_name))
            .finish()
    }
}
