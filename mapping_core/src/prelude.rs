//! Convenience re-exports for common mapping-core usage

pub use crate::column::{Column, ColumnKind};
pub use crate::entity::{Entity, EntityType, Property};
pub use crate::errors::{MappingError, Severity};
pub use crate::mapper::Mapper;
pub use crate::procedure::{Procedure, ProcedureArg};
pub use crate::query::{Query, QueryValue};
pub use crate::query_builder::QueryBuilder;
pub use crate::schema::{Schema, SchemaBuilder};
pub use crate::sql::SqlGenerator;
pub use crate::table::Table;

pub use type_mapping::{
    ColumnType, DbValue, Dialect, SerializerRegistry, ToValue, TypeSerializer, Value, ValueType,
    WireType,
};
