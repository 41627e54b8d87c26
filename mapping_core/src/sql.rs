//! SQL statements generated from table metadata
//!
//! Identifiers are validated when tables are built and quoted here. Values are never
//! written into statement text; they are bound through `?` placeholders.

use std::any::Any;

use type_mapping::{Dialect, Value, WireType};

use crate::column::Column;
use crate::errors::MappingError;
use crate::query::{Query, PLACEHOLDER};
use crate::schema::Schema;
use crate::table::Table;

#[derive(Debug, Clone, Copy)]
pub struct SqlGenerator {
    dialect: Dialect,
}

impl SqlGenerator {
    pub fn new(dialect: Dialect) -> Self {
        Self { dialect }
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    fn quote(&self, name: &str) -> String {
        self.dialect.quote_identifier(name)
    }

    /// Quoted table reference; SQLite has no schemas, so only PostgreSQL qualifies it
    pub fn table_path(&self, table: &Table) -> String {
        match (self.dialect, table.schema_name()) {
            (Dialect::Postgres, Some(schema)) => {
                format!("{}.{}", self.quote(schema), self.quote(table.name()))
            }
            _ => self.quote(table.name()),
        }
    }

    /// `CREATE SCHEMA` for dialects that have schemas
    pub fn create_schema(&self, schema: &Schema) -> Option<Query> {
        match self.dialect {
            Dialect::Postgres => Some(Query::raw(format!(
                "CREATE SCHEMA IF NOT EXISTS {}",
                self.quote(schema.name())
            ))),
            Dialect::Sqlite => None,
        }
    }

    fn column_definition(&self, column: &Column) -> String {
        let name = self.quote(column.name());
        if column.is_auto_increment() {
            return match self.dialect {
                // AUTOINCREMENT is only accepted on the exact type INTEGER
                Dialect::Sqlite => format!("{} INTEGER PRIMARY KEY AUTOINCREMENT", name),
                Dialect::Postgres => {
                    let serial = match column.wire_type() {
                        WireType::SmallInt => "SMALLSERIAL",
                        WireType::Integer => "SERIAL",
                        _ => "BIGSERIAL",
                    };
                    format!("{} {} PRIMARY KEY", name, serial)
                }
            };
        }
        if column.is_primary() {
            return format!("{} {} PRIMARY KEY", name, column.db_type());
        }
        let mut definition = format!("{} {}", name, column.db_type());
        if column.is_not_null() {
            definition.push_str(" NOT NULL");
        }
        if column.is_unique() {
            definition.push_str(" UNIQUE");
        }
        definition
    }

    /// Foreign columns must be linked, which happens when the table joins a schema
    pub fn create_table(&self, table: &Table) -> Result<Query, MappingError> {
        let mut parts: Vec<String> = table
            .columns()
            .iter()
            .map(|c| self.column_definition(c))
            .collect();
        for column in table.foreign_columns() {
            let target = column.foreign_table()?;
            parts.push(format!(
                "FOREIGN KEY ({}) REFERENCES {} ({})",
                self.quote(column.name()),
                self.table_path(&target),
                self.quote(target.primary_column().name())
            ));
        }
        Ok(Query::raw(format!(
            "CREATE TABLE IF NOT EXISTS {} ({})",
            self.table_path(table),
            parts.join(", ")
        )))
    }

    pub fn drop_table(&self, table: &Table) -> Query {
        Query::raw(format!("DROP TABLE IF EXISTS {}", self.table_path(table)))
    }

    /// Insert `instance`; a generated primary key is left out and, on PostgreSQL, returned
    pub fn insert(&self, table: &Table, instance: &dyn Any) -> Result<Query, MappingError> {
        let generated = table.primary_column().is_auto_increment();
        let values = table.query_values(instance, !generated)?;
        let mut sql = if values.is_empty() {
            format!("INSERT INTO {} DEFAULT VALUES", self.table_path(table))
        } else {
            let names: Vec<_> = values.iter().map(|v| self.quote(v.name())).collect();
            format!(
                "INSERT INTO {} ({}) VALUES ({})",
                self.table_path(table),
                names.join(", "),
                vec![PLACEHOLDER; values.len()].join(", ")
            )
        };
        if generated && self.dialect == Dialect::Postgres {
            sql.push_str(&format!(
                " RETURNING {}",
                self.quote(table.primary_column().name())
            ));
        }
        Ok(Query::new(sql, values))
    }

    /// Update every non-key column of the row identified by the primary key of `instance`
    pub fn update(&self, table: &Table, instance: &dyn Any) -> Result<Query, MappingError> {
        let mut values = table.query_values(instance, false)?;
        if values.is_empty() {
            return Err(MappingError::EmptyEntity {
                entity: table.entity().name(),
            });
        }
        let assignments: Vec<_> = values
            .iter()
            .map(|v| format!("{} = {}", self.quote(v.name()), PLACEHOLDER))
            .collect();
        let primary = table.primary_column();
        values.push(primary.query_value(instance)?);
        let sql = format!(
            "UPDATE {} SET {} WHERE {} = {}",
            self.table_path(table),
            assignments.join(", "),
            self.quote(primary.name()),
            PLACEHOLDER
        );
        Ok(Query::new(sql, values))
    }

    pub fn delete(&self, table: &Table, instance: &dyn Any) -> Result<Query, MappingError> {
        let id = table.primary_column().value(instance)?;
        Ok(self.delete_by_id(table, id))
    }

    pub fn delete_by_id(&self, table: &Table, id: Value) -> Query {
        let primary = table.primary_column();
        let sql = format!(
            "DELETE FROM {} WHERE {} = {}",
            self.table_path(table),
            self.quote(primary.name()),
            PLACEHOLDER
        );
        Query::new(sql, vec![primary.bind(id)])
    }

    fn select_columns(&self, table: &Table) -> String {
        table
            .columns()
            .iter()
            .map(|c| self.quote(c.name()))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// All rows, columns in declaration order
    pub fn select_all(&self, table: &Table) -> Query {
        Query::raw(format!(
            "SELECT {} FROM {}",
            self.select_columns(table),
            self.table_path(table)
        ))
    }

    pub fn select_by_id(&self, table: &Table, id: Value) -> Query {
        let primary = table.primary_column();
        let sql = format!(
            "SELECT {} FROM {} WHERE {} = {}",
            self.select_columns(table),
            self.table_path(table),
            self.quote(primary.name()),
            PLACEHOLDER
        );
        Query::new(sql, vec![primary.bind(id)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::fixtures::*;
    use crate::mapper::Mapper;

    fn schema(dialect: Dialect) -> Schema {
        Schema::builder("music")
            .table::<Artist>("id")
            .entity::<Album>()
            .build(&Mapper::new(dialect))
            .unwrap()
    }

    fn album() -> Album {
        Album {
            id: Some(2),
            artist_id: 1,
            title: "News of the World".into(),
            year: Some(1977),
        }
    }

    #[test]
    fn test_create_table_sqlite() {
        let schema = schema(Dialect::Sqlite);
        let sql = SqlGenerator::new(Dialect::Sqlite);
        let albums = schema.table::<Album>().unwrap();
        assert_eq!(
            sql.create_table(albums).unwrap().sql(),
            "CREATE TABLE IF NOT EXISTS \"albums\" (\"id\" INTEGER PRIMARY KEY AUTOINCREMENT, \
             \"artist_id\" INTEGER NOT NULL, \"title\" TEXT NOT NULL UNIQUE, \"year\" SMALLINT, \
             FOREIGN KEY (\"artist_id\") REFERENCES \"Artist\" (\"id\"))"
        );
        assert!(sql.create_schema(&schema).is_none());
    }

    #[test]
    fn test_create_table_postgres() {
        let schema = schema(Dialect::Postgres);
        let sql = SqlGenerator::new(Dialect::Postgres);
        let artists = schema.table::<Artist>().unwrap();
        assert_eq!(
            sql.create_table(artists).unwrap().sql(),
            "CREATE TABLE IF NOT EXISTS \"music\".\"Artist\" (\"id\" SERIAL PRIMARY KEY, \"name\" VARCHAR NOT NULL)"
        );
        assert_eq!(
            sql.create_schema(&schema).unwrap().sql(),
            "CREATE SCHEMA IF NOT EXISTS \"music\""
        );
    }

    #[test]
    fn test_create_table_requires_linked_columns() {
        let table = Table::from_entity::<Album>(&Mapper::new(Dialect::Sqlite)).unwrap();
        let err = SqlGenerator::new(Dialect::Sqlite)
            .create_table(&table)
            .unwrap_err();
        assert!(err.is_internal());
    }

    #[test]
    fn test_insert_skips_generated_key() {
        let schema = schema(Dialect::Sqlite);
        let query = SqlGenerator::new(Dialect::Sqlite)
            .insert(schema.table::<Album>().unwrap(), &album())
            .unwrap();
        assert_eq!(
            query.sql(),
            "INSERT INTO \"albums\" (\"artist_id\", \"title\", \"year\") VALUES (?, ?, ?)"
        );
        assert_eq!(query.values().len(), 3);
        assert!(query.check_placeholders().is_ok());
    }

    #[test]
    fn test_insert_returning_on_postgres() {
        let schema = schema(Dialect::Postgres);
        let artist = Artist {
            id: None,
            name: "Queen".into(),
        };
        let query = SqlGenerator::new(Dialect::Postgres)
            .insert(schema.table::<Artist>().unwrap(), &artist)
            .unwrap();
        assert_eq!(
            query.dialect_sql(Dialect::Postgres),
            "INSERT INTO \"music\".\"Artist\" (\"name\") VALUES ($1) RETURNING \"id\""
        );
    }

    #[test]
    fn test_update_binds_key_last() {
        let schema = schema(Dialect::Sqlite);
        let query = SqlGenerator::new(Dialect::Sqlite)
            .update(schema.table::<Album>().unwrap(), &album())
            .unwrap();
        assert_eq!(
            query.sql(),
            "UPDATE \"albums\" SET \"artist_id\" = ?, \"title\" = ?, \"year\" = ? WHERE \"id\" = ?"
        );
        assert_eq!(query.values()[3].value(), &Value::I32(2));
    }

    #[test]
    fn test_delete_and_select() {
        let schema = schema(Dialect::Sqlite);
        let sql = SqlGenerator::new(Dialect::Sqlite);
        let albums = schema.table::<Album>().unwrap();

        let delete = sql.delete(albums, &album()).unwrap();
        assert_eq!(delete.sql(), "DELETE FROM \"albums\" WHERE \"id\" = ?");
        assert_eq!(delete.values()[0].value(), &Value::I32(2));

        assert_eq!(
            sql.select_all(albums).sql(),
            "SELECT \"id\", \"artist_id\", \"title\", \"year\" FROM \"albums\""
        );
        let by_id = sql.select_by_id(albums, Value::I32(2));
        assert!(by_id.sql().ends_with("WHERE \"id\" = ?"));
        assert_eq!(by_id.values().len(), 1);
    }
}
