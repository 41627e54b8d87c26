//! Column metadata

use std::any::Any;
use std::fmt;
use std::sync::{Arc, OnceLock, Weak};

use type_mapping::{DbValue, TypeSerializer, Value, ValueType, WireType};

use crate::entity::{Accessor, EntityType, PropertyDescriptor};
use crate::errors::MappingError;
use crate::query::QueryValue;
use crate::table::Table;

/// Role of a column within its table
#[derive(Debug)]
pub enum ColumnKind {
    Plain,
    Primary {
        auto_increment: bool,
    },
    /// The referenced table is linked once the owning schema is assembled
    Foreign {
        references: EntityType,
        table: OnceLock<Weak<Table>>,
    },
}

#[derive(Debug)]
pub struct Column {
    name: String,
    owner: EntityType,
    value_type: ValueType,
    unique: bool,
    not_null: bool,
    kind: ColumnKind,
    serializer: TypeSerializer,
    accessor: Accessor,
}

impl Column {
    pub(crate) fn plain(property: PropertyDescriptor, serializer: TypeSerializer) -> Self {
        let kind = match property.references() {
            Some(references) => ColumnKind::Foreign {
                references,
                table: OnceLock::new(),
            },
            None => ColumnKind::Plain,
        };
        Self::build(property, serializer, kind, false)
    }

    /// Primary columns are unique and never null in the database. A nullable integer
    /// primary key is left for the database to generate.
    pub(crate) fn primary(property: PropertyDescriptor, serializer: TypeSerializer) -> Self {
        let auto_increment = property.is_nullable() && serializer.wire_type().is_integer();
        Self::build(
            property,
            serializer,
            ColumnKind::Primary { auto_increment },
            true,
        )
    }

    fn build(
        property: PropertyDescriptor,
        serializer: TypeSerializer,
        kind: ColumnKind,
        primary: bool,
    ) -> Self {
        Self {
            name: property.name().to_string(),
            owner: property.owner(),
            value_type: property.value_type(),
            unique: primary || property.is_unique(),
            not_null: primary || !property.is_nullable(),
            kind,
            serializer,
            accessor: property.accessor().clone(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn owner(&self) -> EntityType {
        self.owner
    }

    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    pub fn db_type(&self) -> &str {
        self.serializer.db_type()
    }

    pub fn wire_type(&self) -> WireType {
        self.serializer.wire_type()
    }

    pub fn serializer(&self) -> &TypeSerializer {
        &self.serializer
    }

    pub fn is_unique(&self) -> bool {
        self.unique
    }

    pub fn is_not_null(&self) -> bool {
        self.not_null
    }

    pub fn kind(&self) -> &ColumnKind {
        &self.kind
    }

    pub fn is_primary(&self) -> bool {
        matches!(self.kind, ColumnKind::Primary { .. })
    }

    pub fn is_foreign(&self) -> bool {
        matches!(self.kind, ColumnKind::Foreign { .. })
    }

    pub fn is_auto_increment(&self) -> bool {
        matches!(
            self.kind,
            ColumnKind::Primary {
                auto_increment: true
            }
        )
    }

    pub fn references(&self) -> Option<EntityType> {
        match &self.kind {
            ColumnKind::Foreign { references, .. } => Some(*references),
            _ => None,
        }
    }

    /// Table this foreign column points to
    pub fn foreign_table(&self) -> Result<Arc<Table>, MappingError> {
        let ColumnKind::Foreign { references, table } = &self.kind else {
            return Err(MappingError::NotForeignKey {
                table: self.owner.name().to_string(),
                column: self.name.clone(),
            });
        };
        table
            .get()
            .ok_or_else(|| {
                MappingError::Internal(format!(
                    "foreign column {}.{} was never linked to {}",
                    self.owner, self.name, references
                ))
            })?
            .upgrade()
            .ok_or_else(|| {
                MappingError::Internal(format!(
                    "table {} referenced by {}.{} was dropped",
                    references, self.owner, self.name
                ))
            })
    }

    pub(crate) fn link(&self, target: &Arc<Table>) -> Result<(), MappingError> {
        match &self.kind {
            ColumnKind::Foreign { table, .. } => table.set(Arc::downgrade(target)).map_err(|_| {
                MappingError::Internal(format!("column {}.{} linked twice", self.owner, self.name))
            }),
            _ => Err(MappingError::NotForeignKey {
                table: self.owner.name().to_string(),
                column: self.name.clone(),
            }),
        }
    }

    /// Current value of this column's property on `instance`
    pub fn value(&self, instance: &dyn Any) -> Result<Value, MappingError> {
        self.accessor.read(instance, &self.name)
    }

    pub fn query_value(&self, instance: &dyn Any) -> Result<QueryValue, MappingError> {
        Ok(self.bind(self.value(instance)?))
    }

    /// Bind an arbitrary value with this column's serializer
    pub fn bind(&self, value: Value) -> QueryValue {
        QueryValue::new(self.name.clone(), value, &self.serializer)
    }

    pub fn decode(&self, value: &DbValue) -> Result<Value, MappingError> {
        Ok(self.serializer.decode(value)?)
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.db_type())?;
        match &self.kind {
            ColumnKind::Primary { auto_increment: true } => f.write_str(" PK AUTO"),
            ColumnKind::Primary { .. } => f.write_str(" PK"),
            ColumnKind::Foreign { references, .. } => write!(f, " FK -> {}", references),
            ColumnKind::Plain => Ok(()),
        }
    }
}
