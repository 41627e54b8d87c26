//! Table metadata built from entity declarations

use std::any::Any;
use std::fmt;
use std::sync::OnceLock;

use type_mapping::{DbValue, TypeSerializer, Value};

use crate::column::Column;
use crate::entity::{descriptors, Entity, EntityType, PropertyDescriptor};
use crate::errors::MappingError;
use crate::mapper::Mapper;
use crate::query::QueryValue;
use crate::validation::validate_identifier;

#[derive(Debug)]
pub struct Table {
    entity: EntityType,
    name: String,
    columns: Vec<Column>,
    primary: usize,
    schema: OnceLock<String>,
}

impl Table {
    /// Table for `E` keyed by `primary_key`, named after the entity unless `name` is given
    pub fn from_type<E: Entity>(
        mapper: &Mapper,
        primary_key: &str,
        name: Option<&str>,
    ) -> Result<Self, MappingError> {
        Self::build(mapper, &[], descriptors::<E>(), E::entity_type(), primary_key, name)
    }

    /// Table for `E` using its declared primary key and table name
    pub fn from_entity<E: Entity>(mapper: &Mapper) -> Result<Self, MappingError> {
        let primary_key = E::primary_key().ok_or_else(|| MappingError::MissingPrimaryKey {
            entity: E::entity_name(),
            primary_key: String::new(),
        })?;
        Self::from_type::<E>(mapper, primary_key, E::table_name())
    }

    pub(crate) fn build(
        mapper: &Mapper,
        scope: &[TypeSerializer],
        properties: Vec<PropertyDescriptor>,
        entity: EntityType,
        primary_key: &str,
        name: Option<&str>,
    ) -> Result<Self, MappingError> {
        if properties.is_empty() {
            return Err(MappingError::EmptyEntity {
                entity: entity.name(),
            });
        }

        let name = name.unwrap_or(entity.name());
        validate_identifier(name)?;

        let duplicates = not_unique(properties.iter().map(|p| p.name()));
        if !duplicates.is_empty() {
            return Err(MappingError::NotUniqueName {
                scope: name.to_string(),
                names: duplicates,
            });
        }

        let primary = properties
            .iter()
            .position(|p| p.name() == primary_key)
            .ok_or_else(|| MappingError::MissingPrimaryKey {
                entity: entity.name(),
                primary_key: primary_key.to_string(),
            })?;
        if let Some(references) = properties[primary].references() {
            return Err(MappingError::ReferencingPrimaryKey {
                table: name.to_string(),
                column: primary_key.to_string(),
                references: references.name(),
            });
        }

        let columns = properties
            .into_iter()
            .enumerate()
            .map(|(i, property)| {
                validate_identifier(property.name())?;
                let serializer = mapper.resolve_property(&property, scope)?;
                Ok(if i == primary {
                    Column::primary(property, serializer)
                } else {
                    Column::plain(property, serializer)
                })
            })
            .collect::<Result<Vec<_>, MappingError>>()?;

        debug_log!(
            "Mapped table {} for {} with {} columns",
            name,
            entity,
            columns.len()
        );

        Ok(Self {
            entity,
            name: name.to_string(),
            columns,
            primary,
            schema: OnceLock::new(),
        })
    }

    pub fn entity(&self) -> EntityType {
        self.entity
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Name of the owning schema once the table is part of one
    pub fn schema_name(&self) -> Option<&str> {
        self.schema.get().map(String::as_str)
    }

    /// `schema.table`, or the bare name outside a schema
    pub fn path(&self) -> String {
        match self.schema_name() {
            Some(schema) => format!("{}.{}", schema, self.name),
            None => self.name.clone(),
        }
    }

    pub(crate) fn attach(&self, schema: &str) -> Result<(), MappingError> {
        self.schema.set(schema.to_string()).map_err(|_| {
            MappingError::Internal(format!("table {} attached to a second schema", self.name))
        })
    }

    /// All columns in declaration order
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name() == name)
    }

    pub fn primary_column(&self) -> &Column {
        &self.columns[self.primary]
    }

    pub fn foreign_columns(&self) -> impl Iterator<Item = &Column> {
        self.columns.iter().filter(|c| c.is_foreign())
    }

    /// Columns that are neither primary nor foreign
    pub fn plain_columns(&self) -> impl Iterator<Item = &Column> {
        self.columns
            .iter()
            .filter(|c| !c.is_primary() && !c.is_foreign())
    }

    /// Bound values of every column for `instance`, optionally without the primary key
    pub fn query_values(
        &self,
        instance: &dyn Any,
        with_primary: bool,
    ) -> Result<Vec<QueryValue>, MappingError> {
        self.columns
            .iter()
            .filter(|c| with_primary || !c.is_primary())
            .map(|c| c.query_value(instance))
            .collect()
    }

    /// Decode one driver row laid out in column order
    pub fn decode_row(&self, row: &[DbValue]) -> Result<Vec<Value>, MappingError> {
        if row.len() != self.columns.len() {
            return Err(MappingError::RowWidth {
                table: self.name.clone(),
                expected: self.columns.len(),
                found: row.len(),
            });
        }
        self.columns
            .iter()
            .zip(row)
            .map(|(column, value)| column.decode(value))
            .collect()
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.path())?;
        for (i, column) in self.columns.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", column)?;
        }
        f.write_str(")")
    }
}

/// Names occurring more than once, in order of first repetition
pub(crate) fn not_unique<'a>(names: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = Vec::new();
    let mut repeated: Vec<String> = Vec::new();
    for name in names {
        if seen.contains(&name) {
            if !repeated.iter().any(|r| r == name) {
                repeated.push(name.to_string());
            }
        } else {
            seen.push(name);
        }
    }
    repeated
}
