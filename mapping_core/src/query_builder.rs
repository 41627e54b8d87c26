//! Build parameterized queries from a registered input entity
//!
//! The builder borrows its input for its whole lifetime, so the values read at bind time
//! are the values of the finished query.

use type_mapping::{ColumnType, ToValue};

use crate::entity::{Entity, Property};
use crate::errors::MappingError;
use crate::mapper::Mapper;
use crate::query::{Query, QueryValue, PLACEHOLDER};

pub struct QueryBuilder<'a, E: Entity> {
    input: &'a E,
    mapper: &'a Mapper,
    properties: Vec<Property<E>>,
    values: Vec<QueryValue>,
}

impl<'a, E: Entity> QueryBuilder<'a, E> {
    /// Fails unless `E` was registered with [`Mapper::register_input`]
    pub fn new(input: &'a E, mapper: &'a Mapper) -> Result<Self, MappingError> {
        if !mapper.is_registered(E::entity_type()) {
            return Err(MappingError::UnregisteredInput {
                entity: E::entity_name(),
            });
        }
        Ok(Self {
            input,
            mapper,
            properties: E::properties(),
            values: Vec::new(),
        })
    }

    pub fn input(&self) -> &E {
        self.input
    }

    /// Append the current value of `property` and return the placeholder to splice into
    /// the query text
    pub fn bind(&mut self, property: &str) -> Result<&'static str, MappingError> {
        let declared = self
            .properties
            .iter()
            .find(|p| p.name() == property)
            .ok_or_else(|| MappingError::UnknownProperty {
                entity: E::entity_name(),
                property: property.to_string(),
            })?;
        let serializer = self
            .mapper
            .get_serializer(E::entity_type(), declared.value_type())?;
        let value = QueryValue::new(declared.name(), declared.read(self.input), serializer);
        trace_log!("Bound {} as value {}", value, self.values.len() + 1);
        self.values.push(value);
        Ok(PLACEHOLDER)
    }

    /// Append a value that is not a property of the input
    pub fn bind_value<T: ColumnType>(
        &mut self,
        name: &str,
        value: T,
    ) -> Result<&'static str, MappingError> {
        let serializer = self.mapper.get_serializer(E::entity_type(), T::value_type())?;
        self.values
            .push(QueryValue::new(name, value.to_value(), serializer));
        Ok(PLACEHOLDER)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Finish with `sql`, whose placeholders must follow bind order
    pub fn build(self, sql: impl Into<String>) -> Query {
        Query::new(sql, self.values)
    }
}
