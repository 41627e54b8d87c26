//! Core Tablemap functionality
//!
//! This module contains the main Tablemap struct, which owns the database connection, the
//! shared mapper and the registered schemas, and runs entity operations against them.

use std::sync::Arc;

use config::AppConfig;
use mapping_core::{Entity, Mapper, Query, Schema, SqlGenerator, Table};
use type_mapping::{ToValue, Value};

use crate::driver::Database;
use crate::errors::TablemapError;

/// Main Tablemap coordinator that manages the database connection and mapping metadata
pub struct Tablemap {
    database: Database,
    mapper: Arc<Mapper>,
    schemas: Vec<Schema>,
    default_schema: String,
    sql: SqlGenerator,
    log_queries: bool,
}

impl Tablemap {
    /// Connect with a mapper holding only the built-in serializers
    pub async fn new(config: &AppConfig) -> Result<Self, TablemapError> {
        Self::with_mapper(config, Mapper::new(config.mapper.dialect)).await
    }

    /// Connect with a mapper that was configured beforehand
    pub async fn with_mapper(config: &AppConfig, mapper: Mapper) -> Result<Self, TablemapError> {
        config.validate()?;
        if mapper.dialect() != config.database.dialect {
            return Err(TablemapError::DialectMismatch {
                mapper: mapper.dialect(),
                database: config.database.dialect,
            });
        }
        let database = Database::connect(&config.database).await?;
        Ok(Self {
            database,
            sql: SqlGenerator::new(mapper.dialect()),
            mapper: Arc::new(mapper),
            schemas: Vec::new(),
            default_schema: config.mapper.default_schema.clone(),
            log_queries: config.mapper.log_queries,
        })
    }

    pub fn database(&self) -> &Database {
        &self.database
    }

    pub fn mapper(&self) -> &Arc<Mapper> {
        &self.mapper
    }

    /// Mutable mapper access, available until the mapper has been shared
    pub fn mapper_mut(&mut self) -> Result<&mut Mapper, TablemapError> {
        Arc::get_mut(&mut self.mapper).ok_or(TablemapError::MapperShared)
    }

    pub fn sql(&self) -> &SqlGenerator {
        &self.sql
    }

    /// Register a schema under its name. Every serializer of the schema must target the
    /// database dialect.
    pub fn register_schema(&mut self, schema: Schema) -> Result<(), TablemapError> {
        if self.schemas.iter().any(|s| s.name() == schema.name()) {
            return Err(TablemapError::SchemaAlreadyRegistered(schema.name().to_string()));
        }
        let database = self.database.dialect();
        let columns = schema
            .tables()
            .iter()
            .flat_map(|t| t.columns())
            .map(|c| c.serializer().dialect());
        let args = schema
            .procedures()
            .iter()
            .flat_map(|p| p.args())
            .map(|a| a.serializer().dialect());
        if let Some(mapper) = columns.chain(args).find(|d| *d != database) {
            return Err(TablemapError::DialectMismatch { mapper, database });
        }
        debug_log!("Registering schema {}", schema.name());
        self.schemas.push(schema);
        Ok(())
    }

    pub fn schema(&self, name: &str) -> Result<&Schema, TablemapError> {
        self.schemas
            .iter()
            .find(|s| s.name() == name)
            .ok_or_else(|| TablemapError::SchemaNotFound(name.to_string()))
    }

    /// List all registered schema names
    pub fn list_schemas(&self) -> Vec<&str> {
        self.schemas.iter().map(|s| s.name()).collect()
    }

    /// Schema searched first by entity lookups
    pub fn default_schema(&self) -> &str {
        &self.default_schema
    }

    /// Table mapped for `E`, from the default schema if it maps `E`, otherwise from the first
    /// registered schema that does
    pub fn table<E: Entity>(&self) -> Result<&Arc<Table>, TablemapError> {
        let entity = E::entity_type();
        self.schemas
            .iter()
            .find(|s| s.name() == self.default_schema)
            .and_then(|s| s.table_for(entity))
            .or_else(|| self.schemas.iter().find_map(|s| s.table_for(entity)))
            .ok_or_else(|| {
                mapping_core::MappingError::UnknownTable {
                    entity: E::entity_name(),
                }
                .into()
            })
    }

    fn log(&self, query: &Query) {
        if self.log_queries {
            tracing::info!("{}", query);
        }
    }

    pub async fn execute(&self, query: &Query) -> Result<u64, TablemapError> {
        self.log(query);
        self.database.execute(query).await
    }

    pub async fn fetch_all(
        &self,
        query: &Query,
        table: &Table,
    ) -> Result<Vec<Vec<Value>>, TablemapError> {
        self.log(query);
        self.database.fetch_all(query, table).await
    }

    /// Create the schema (where the dialect has schemas) and all of its tables, in
    /// registration order
    pub async fn create_tables(&self, schema: &str) -> Result<(), TablemapError> {
        let schema = self.schema(schema)?;
        if let Some(query) = self.sql.create_schema(schema) {
            self.execute(&query).await?;
        }
        for table in schema.tables() {
            let query = self.sql.create_table(table)?;
            self.execute(&query).await?;
        }
        Ok(())
    }

    /// Drop all tables of a schema, in reverse registration order
    pub async fn drop_tables(&self, schema: &str) -> Result<(), TablemapError> {
        let schema = self.schema(schema)?;
        for table in schema.tables().iter().rev() {
            self.execute(&self.sql.drop_table(table)).await?;
        }
        Ok(())
    }

    /// Insert `entity`, returning the generated primary key if the database made one
    pub async fn insert<E: Entity>(&self, entity: &E) -> Result<Option<Value>, TablemapError> {
        let table = self.table::<E>()?;
        let query = self.sql.insert(table, entity)?;
        self.log(&query);
        self.database.insert(&query, table).await
    }

    pub async fn update<E: Entity>(&self, entity: &E) -> Result<u64, TablemapError> {
        let table = self.table::<E>()?;
        let query = self.sql.update(table, entity)?;
        self.execute(&query).await
    }

    pub async fn delete<E: Entity>(&self, entity: &E) -> Result<u64, TablemapError> {
        let table = self.table::<E>()?;
        let query = self.sql.delete(table, entity)?;
        self.execute(&query).await
    }

    /// All rows of the table of `E`, one value per column
    pub async fn find_all<E: Entity>(&self) -> Result<Vec<Vec<Value>>, TablemapError> {
        let table = self.table::<E>()?;
        self.fetch_all(&self.sql.select_all(table), table).await
    }

    pub async fn find_by_id<E: Entity>(
        &self,
        id: impl ToValue,
    ) -> Result<Option<Vec<Value>>, TablemapError> {
        let table = self.table::<E>()?;
        let query = self.sql.select_by_id(table, id.to_value());
        Ok(self.fetch_all(&query, table).await?.into_iter().next())
    }

    /// Call the procedure declared by `P` in `schema` with the argument values of `procedure`
    pub async fn call<P: Entity>(&self, schema: &str, procedure: &P) -> Result<u64, TablemapError> {
        let declared = self
            .schema(schema)?
            .procedures()
            .iter()
            .find(|p| p.procedure_type() == P::entity_type())
            .ok_or_else(|| TablemapError::UnknownProcedure(P::entity_name(), schema.to_string()))?;
        let query = declared.call_query(procedure)?;
        self.execute(&query).await
    }

    /// Check database connection health
    pub async fn health_check(&self) -> Result<(), TablemapError> {
        self.database.health_check().await
    }
}
