//! Entity declarations
//!
//! An [`Entity`] lists its properties explicitly, in column order, through [`Property`]
//! values. `#[derive(Entity)]` writes this list from the struct definition; it can also be
//! written by hand.

use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use type_mapping::{ColumnType, Value, ValueType};

use crate::errors::MappingError;

/// Application record type mapped to a table, a procedure or a query input
pub trait Entity: Sized + 'static {
    /// Type name, used as the default table name
    fn entity_name() -> &'static str;

    /// Declared properties in column order
    fn properties() -> Vec<Property<Self>>;

    /// Declared primary key property, if any
    fn primary_key() -> Option<&'static str> {
        None
    }

    /// Table name override
    fn table_name() -> Option<&'static str> {
        None
    }

    fn entity_type() -> EntityType {
        EntityType::of::<Self>()
    }
}

/// Identity of an entity type
#[derive(Clone, Copy)]
pub struct EntityType {
    id: TypeId,
    name: &'static str,
}

impl EntityType {
    pub fn of<E: Entity>() -> Self {
        Self {
            id: TypeId::of::<E>(),
            name: E::entity_name(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn type_id(&self) -> TypeId {
        self.id
    }
}

impl PartialEq for EntityType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for EntityType {}

impl Hash for EntityType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityType({})", self.name)
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// One declared property of entity `E`
pub struct Property<E> {
    name: &'static str,
    value_type: ValueType,
    nullable: bool,
    unique: bool,
    references: Option<EntityType>,
    getter: fn(&E) -> Value,
}

impl<E: Entity> Property<E> {
    /// Property with declared type `T`; `Option<T>` makes it nullable
    pub fn of<T: ColumnType>(name: &'static str, getter: fn(&E) -> Value) -> Self {
        Self {
            name,
            value_type: T::value_type(),
            nullable: T::NULLABLE,
            unique: false,
            references: None,
            getter,
        }
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Mark the property as a foreign key into the table of `R`
    pub fn references<R: Entity>(mut self) -> Self {
        self.references = Some(EntityType::of::<R>());
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    pub fn is_unique(&self) -> bool {
        self.unique
    }

    pub fn referenced_entity(&self) -> Option<EntityType> {
        self.references
    }

    pub fn read(&self, entity: &E) -> Value {
        (self.getter)(entity)
    }

    /// Drop the static owner type so tables of different entities can live side by side
    pub fn erase(self) -> PropertyDescriptor {
        PropertyDescriptor {
            owner: EntityType::of::<E>(),
            name: self.name,
            value_type: self.value_type,
            nullable: self.nullable,
            unique: self.unique,
            references: self.references,
            accessor: Accessor::new(self.getter),
        }
    }
}

impl<E> fmt::Debug for Property<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Property")
            .field("name", &self.name)
            .field("value_type", &self.value_type)
            .field("nullable", &self.nullable)
            .field("unique", &self.unique)
            .finish()
    }
}

/// Type-erased property, the input for columns and procedure arguments
#[derive(Debug, Clone)]
pub struct PropertyDescriptor {
    owner: EntityType,
    name: &'static str,
    value_type: ValueType,
    nullable: bool,
    unique: bool,
    references: Option<EntityType>,
    accessor: Accessor,
}

impl PropertyDescriptor {
    pub fn owner(&self) -> EntityType {
        self.owner
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    pub fn is_unique(&self) -> bool {
        self.unique
    }

    pub fn references(&self) -> Option<EntityType> {
        self.references
    }

    pub fn accessor(&self) -> &Accessor {
        &self.accessor
    }

    pub fn read(&self, instance: &dyn Any) -> Result<Value, MappingError> {
        self.accessor.read(instance, self.name)
    }
}

pub(crate) fn descriptors<E: Entity>() -> Vec<PropertyDescriptor> {
    E::properties().into_iter().map(Property::erase).collect()
}

type ReadFn = dyn Fn(&dyn Any) -> Option<Value> + Send + Sync;

/// Reads one property from an instance whose concrete type is only known at runtime
#[derive(Clone)]
pub struct Accessor {
    owner: EntityType,
    read: Arc<ReadFn>,
}

impl Accessor {
    pub fn new<E: Entity>(getter: fn(&E) -> Value) -> Self {
        Self {
            owner: EntityType::of::<E>(),
            read: Arc::new(move |instance: &dyn Any| instance.downcast_ref::<E>().map(getter)),
        }
    }

    pub fn owner(&self) -> EntityType {
        self.owner
    }

    /// Fails with [`MappingError::PropertyAccess`] when `instance` is not of the owner type
    pub fn read(&self, instance: &dyn Any, property: &str) -> Result<Value, MappingError> {
        (self.read)(instance).ok_or_else(|| MappingError::PropertyAccess {
            expected: self.owner.name(),
            property: property.to_string(),
        })
    }
}

impl fmt::Debug for Accessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Accessor({})", self.owner)
    }
}
