//! Mapping Core - metadata layer of Tablemap
//!
//! Builds table, schema and procedure metadata from [`Entity`] declarations, resolves the
//! serializer of every column through the [`Mapper`], and assembles parameterized queries.
//! Everything here is built once during setup and read-only afterwards.

#[cfg(feature = "debug-logging")]
macro_rules! debug_log {
    ($($arg:tt)*) => {
        tracing::debug!($($arg)*)
    };
}

#[cfg(not(feature = "debug-logging"))]
macro_rules! debug_log {
    ($($arg:tt)*) => {};
}

#[cfg(feature = "debug-logging")]
macro_rules! trace_log {
    ($($arg:tt)*) => {
        tracing::trace!($($arg)*)
    };
}

#[cfg(not(feature = "debug-logging"))]
macro_rules! trace_log {
    ($($arg:tt)*) => {};
}

pub mod column;
pub mod entity;
pub mod errors;
pub mod mapper;
pub mod prelude;
pub mod procedure;
pub mod query;
pub mod query_builder;
pub mod schema;
pub mod sql;
pub mod table;
pub mod validation;

pub use type_mapping;

pub use column::{Column, ColumnKind};
pub use entity::{Accessor, Entity, EntityType, Property, PropertyDescriptor};
pub use errors::{MappingError, Severity};
pub use mapper::Mapper;
pub use procedure::{Procedure, ProcedureArg};
pub use query::{Query, QueryValue, PLACEHOLDER};
pub use query_builder::QueryBuilder;
pub use schema::{Schema, SchemaBuilder};
pub use sql::SqlGenerator;
pub use table::Table;
pub use validation::{ValidationError, MAX_IDENTIFIER_LENGTH};
