//! Schemas: named groups of tables, scoped serializers and procedures
//!
//! Building a schema runs a linking pass that resolves every foreign column to the table of
//! the entity it references. After that, the schema and its tables are read-only.

use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use type_mapping::{TypeMappingError, TypeSerializer};

use crate::entity::{descriptors, Entity, EntityType};
use crate::errors::MappingError;
use crate::mapper::Mapper;
use crate::procedure::Procedure;
use crate::table::{not_unique, Table};
use crate::validation::validate_identifier;

#[derive(Debug)]
pub struct Schema {
    name: String,
    tables: Vec<Arc<Table>>,
    serializers: Vec<TypeSerializer>,
    procedures: Vec<Arc<Procedure>>,
}

impl Schema {
    /// Assemble a schema and link its foreign columns
    pub fn new(
        name: &str,
        tables: Vec<Table>,
        serializers: Vec<TypeSerializer>,
    ) -> Result<Self, MappingError> {
        validate_identifier(name)?;

        let duplicates = not_unique(tables.iter().map(|t| t.name()));
        if !duplicates.is_empty() {
            return Err(MappingError::NotUniqueName {
                scope: name.to_string(),
                names: duplicates,
            });
        }
        let duplicates = not_unique(tables.iter().map(|t| t.entity().name()));
        if !duplicates.is_empty() {
            return Err(MappingError::NotUniqueName {
                scope: name.to_string(),
                names: duplicates,
            });
        }

        let mut keys = HashSet::new();
        for serializer in &serializers {
            if !keys.insert((serializer.value_type(), serializer.dialect())) {
                return Err(TypeMappingError::DuplicateSerializer {
                    value_type: serializer.value_type().name(),
                    dialect: serializer.dialect(),
                }
                .into());
            }
        }

        let tables: Vec<Arc<Table>> = tables.into_iter().map(Arc::new).collect();
        for table in &tables {
            table.attach(name)?;
        }
        link(name, &tables)?;

        debug_log!("Built schema {} with {} tables", name, tables.len());

        Ok(Self {
            name: name.to_string(),
            tables,
            serializers,
            procedures: Vec::new(),
        })
    }

    pub fn builder(name: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder::new(name)
    }

    /// Add procedures declared for this schema; their paths must be unique within it
    pub fn with_procedures(
        mut self,
        procedures: impl IntoIterator<Item = Arc<Procedure>>,
    ) -> Result<Self, MappingError> {
        for procedure in procedures {
            if procedure.schema() != Some(self.name.as_str()) {
                return Err(MappingError::ProcedureSchemaMismatch {
                    schema: self.name.clone(),
                    procedure: procedure.path().to_string(),
                    declared: procedure.schema().map(str::to_string),
                });
            }
            self.procedures.push(procedure);
        }
        let duplicates = not_unique(self.procedures.iter().map(|p| p.path()));
        if !duplicates.is_empty() {
            return Err(MappingError::NotUniqueName {
                scope: self.name.clone(),
                names: duplicates,
            });
        }
        Ok(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tables(&self) -> &[Arc<Table>] {
        &self.tables
    }

    /// Serializers scoped to this schema
    pub fn serializers(&self) -> &[TypeSerializer] {
        &self.serializers
    }

    pub fn procedures(&self) -> &[Arc<Procedure>] {
        &self.procedures
    }

    pub fn procedure(&self, path: &str) -> Option<&Arc<Procedure>> {
        self.procedures.iter().find(|p| p.path() == path)
    }

    pub fn table_for(&self, entity: EntityType) -> Option<&Arc<Table>> {
        self.tables.iter().find(|t| t.entity() == entity)
    }

    pub fn table<E: Entity>(&self) -> Result<&Arc<Table>, MappingError> {
        self.table_for(E::entity_type())
            .ok_or(MappingError::UnknownTable {
                entity: E::entity_name(),
            })
    }

    pub fn table_named(&self, name: &str) -> Option<&Arc<Table>> {
        self.tables.iter().find(|t| t.name() == name)
    }
}

fn link(schema: &str, tables: &[Arc<Table>]) -> Result<(), MappingError> {
    for table in tables {
        for column in table.foreign_columns() {
            let Some(references) = column.references() else {
                continue;
            };
            let target = tables
                .iter()
                .find(|t| t.entity() == references)
                .ok_or_else(|| MappingError::UnknownForeignTable {
                    schema: schema.to_string(),
                    table: table.name().to_string(),
                    column: column.name().to_string(),
                    references: references.name(),
                })?;
            let primary = target.primary_column();
            if primary.value_type() != column.value_type() {
                return Err(MappingError::ForeignKeyMismatch {
                    table: table.name().to_string(),
                    column: column.name().to_string(),
                    column_type: column.value_type().name(),
                    primary_key_type: primary.value_type().name(),
                });
            }
            column.link(target)?;
            trace_log!("Linked {}.{} to {}", table.name(), column.name(), target.name());
        }
    }
    Ok(())
}

impl PartialEq for Schema {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for Schema {}

impl Hash for Schema {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Schema({})", self.name)
    }
}

type TableFactory = Box<dyn FnOnce(&Mapper, &[TypeSerializer]) -> Result<Table, MappingError>>;

/// Collects table declarations and scoped serializers, then builds them in one go so scoped
/// serializers apply to every table of the schema
pub struct SchemaBuilder {
    name: String,
    serializers: Vec<TypeSerializer>,
    tables: Vec<TableFactory>,
}

impl SchemaBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            serializers: Vec::new(),
            tables: Vec::new(),
        }
    }

    pub fn serializer(mut self, serializer: TypeSerializer) -> Self {
        self.serializers.push(serializer);
        self
    }

    /// Table for `E` named after the entity
    pub fn table<E: Entity>(self, primary_key: impl Into<String>) -> Self {
        self.declare::<E>(primary_key.into(), None)
    }

    pub fn table_named<E: Entity>(
        self,
        primary_key: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        self.declare::<E>(primary_key.into(), Some(name.into()))
    }

    /// Table for `E` using its declared primary key and table name
    pub fn entity<E: Entity>(self) -> Self {
        let primary_key = E::primary_key().unwrap_or_default().to_string();
        self.declare::<E>(primary_key, E::table_name().map(str::to_string))
    }

    fn declare<E: Entity>(mut self, primary_key: String, name: Option<String>) -> Self {
        self.tables.push(Box::new(move |mapper: &Mapper, scope: &[TypeSerializer]| {
            Table::build(
                mapper,
                scope,
                descriptors::<E>(),
                E::entity_type(),
                &primary_key,
                name.as_deref(),
            )
        }));
        self
    }

    pub fn build(self, mapper: &Mapper) -> Result<Schema, MappingError> {
        let tables = self
            .tables
            .into_iter()
            .map(|factory| factory(mapper, &self.serializers))
            .collect::<Result<Vec<_>, MappingError>>()?;
        Schema::new(&self.name, tables, self.serializers)
    }
}
