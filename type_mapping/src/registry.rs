//! Serializer registry
//!
//! Maps every (value type, dialect) pair to exactly one [`TypeSerializer`]. The registry is
//! filled during setup and read-only afterwards; registration takes `&mut self`, so sharing
//! a registry across threads after setup needs no locking.

use std::collections::HashMap;
use std::sync::LazyLock;

use crate::builtin;
use crate::dialect::Dialect;
use crate::errors::TypeMappingError;
use crate::serializer::{TypeSerializer, ValueType};

static BUILTIN: LazyLock<SerializerRegistry> = LazyLock::new(SerializerRegistry::with_builtins);

#[derive(Debug, Clone, Default)]
pub struct SerializerRegistry {
    serializers: HashMap<(ValueType, Dialect), TypeSerializer>,
}

impl SerializerRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide registry holding only the built-in serializers
    pub fn builtin() -> &'static SerializerRegistry {
        &BUILTIN
    }

    /// Owned registry pre-filled with the built-in serializers of every dialect
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for dialect in Dialect::ALL {
            for serializer in builtin::serializers(dialect) {
                registry.insert(serializer);
            }
        }
        registry
    }

    /// Register a serializer for its (value type, dialect) pair
    pub fn register(&mut self, serializer: TypeSerializer) -> Result<(), TypeMappingError> {
        let key = (serializer.value_type(), serializer.dialect());
        if self.serializers.contains_key(&key) {
            return Err(TypeMappingError::DuplicateSerializer {
                value_type: key.0.name(),
                dialect: key.1,
            });
        }
        debug_log!("Registering serializer {}", serializer);
        self.insert(serializer);
        Ok(())
    }

    /// Resolve by exact value-type identity; a miss is always an error
    pub fn resolve(
        &self,
        value_type: ValueType,
        dialect: Dialect,
    ) -> Result<&TypeSerializer, TypeMappingError> {
        self.serializers
            .get(&(value_type, dialect))
            .ok_or(TypeMappingError::UnknownType {
                value_type: value_type.name(),
                dialect,
            })
    }

    pub fn contains(&self, value_type: ValueType, dialect: Dialect) -> bool {
        self.serializers.contains_key(&(value_type, dialect))
    }

    /// All serializers registered for `dialect`, in no particular order
    pub fn for_dialect(&self, dialect: Dialect) -> impl Iterator<Item = &TypeSerializer> {
        self.serializers
            .iter()
            .filter(move |((_, d), _)| *d == dialect)
            .map(|(_, serializer)| serializer)
    }

    pub fn len(&self) -> usize {
        self.serializers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.serializers.is_empty()
    }

    fn insert(&mut self, serializer: TypeSerializer) {
        self.serializers
            .insert((serializer.value_type(), serializer.dialect()), serializer);
    }
}
