//! sqlx driver adapter
//!
//! Executes [`Query`] values against SQLite or PostgreSQL. Placeholders are rewritten for the
//! dialect and values are bound positionally in stored order. Each null is bound with a
//! type taken from its wire type so the driver never has to guess.

use std::time::Duration;

use chrono::{DateTime, NaiveDate, Utc};
use config::DatabaseConfig;
use mapping_core::{MappingError, Query, Table};
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::types::Json;
use sqlx::Row;
use type_mapping::{DbValue, Dialect, Value, WireType};
use uuid::Uuid;

use crate::errors::TablemapError;

/// Bind encoded values to a sqlx query in order
macro_rules! bind_values {
    ($query:expr, $values:expr) => {{
        let mut query = $query;
        for (wire_type, value) in $values {
            query = match value {
                DbValue::Null => match wire_type {
                    WireType::Boolean => query.bind(None::<bool>),
                    WireType::SmallInt => query.bind(None::<i16>),
                    WireType::Integer => query.bind(None::<i32>),
                    WireType::BigInt => query.bind(None::<i64>),
                    WireType::Real => query.bind(None::<f32>),
                    WireType::Double => query.bind(None::<f64>),
                    WireType::Char | WireType::Varchar => query.bind(None::<String>),
                    WireType::Binary => query.bind(None::<Vec<u8>>),
                    WireType::Uuid => query.bind(None::<Uuid>),
                    WireType::Timestamp => query.bind(None::<DateTime<Utc>>),
                    WireType::Date => query.bind(None::<NaiveDate>),
                    WireType::Json => query.bind(None::<Json<serde_json::Value>>),
                },
                DbValue::Boolean(v) => query.bind(v),
                DbValue::SmallInt(v) => query.bind(v),
                DbValue::Integer(v) => query.bind(v),
                DbValue::BigInt(v) => query.bind(v),
                DbValue::Real(v) => query.bind(v),
                DbValue::Double(v) => query.bind(v),
                DbValue::Text(v) => query.bind(v),
                DbValue::Blob(v) => query.bind(v),
                DbValue::Uuid(v) => query.bind(v),
                DbValue::Timestamp(v) => query.bind(v),
                DbValue::Date(v) => query.bind(v),
                DbValue::Json(v) => query.bind(Json(v)),
            };
        }
        query
    }};
}

/// Connection pool for one of the supported dialects
#[derive(Debug, Clone)]
pub enum Database {
    Sqlite(SqlitePool),
    Postgres(PgPool),
}

impl Database {
    /// Open a pool as described by `config`
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, TablemapError> {
        config.validate()?;
        let connection_string = config.connection_string();
        let (min_connections, max_connections) = config.pool_bounds();
        let acquire_timeout = Duration::from_secs(config.connection_timeout_seconds);
        let idle_timeout = Duration::from_secs(config.idle_timeout_seconds);
        let max_lifetime =
            (config.max_lifetime_seconds > 0).then(|| Duration::from_secs(config.max_lifetime_seconds));

        debug_log!("Connecting to {} database", config.dialect);

        let database = match config.dialect {
            Dialect::Sqlite => {
                let pool = SqlitePoolOptions::new()
                    .max_connections(max_connections)
                    .min_connections(min_connections)
                    .acquire_timeout(acquire_timeout)
                    .idle_timeout(idle_timeout)
                    .max_lifetime(max_lifetime)
                    .connect(&connection_string)
                    .await?;
                Database::Sqlite(pool)
            }
            Dialect::Postgres => {
                let pool = PgPoolOptions::new()
                    .max_connections(max_connections)
                    .min_connections(min_connections)
                    .acquire_timeout(acquire_timeout)
                    .idle_timeout(idle_timeout)
                    .max_lifetime(max_lifetime)
                    .connect(&connection_string)
                    .await?;
                Database::Postgres(pool)
            }
        };
        Ok(database)
    }

    pub fn dialect(&self) -> Dialect {
        match self {
            Database::Sqlite(_) => Dialect::Sqlite,
            Database::Postgres(_) => Dialect::Postgres,
        }
    }

    /// Execute a statement and return the number of affected rows
    pub async fn execute(&self, query: &Query) -> Result<u64, TablemapError> {
        query.check_placeholders()?;
        let values = query.encoded_values()?;
        let sql = query.dialect_sql(self.dialect());
        trace_log!("Executing {}", query);

        let affected = match self {
            Database::Sqlite(pool) => bind_values!(sqlx::query(&sql), values)
                .execute(pool)
                .await?
                .rows_affected(),
            Database::Postgres(pool) => bind_values!(sqlx::query(&sql), values)
                .execute(pool)
                .await?
                .rows_affected(),
        };
        Ok(affected)
    }

    /// Run a query selecting the columns of `table` in declaration order and decode every
    /// row through the column serializers
    pub async fn fetch_all(
        &self,
        query: &Query,
        table: &Table,
    ) -> Result<Vec<Vec<Value>>, TablemapError> {
        query.check_placeholders()?;
        let values = query.encoded_values()?;
        let sql = query.dialect_sql(self.dialect());
        trace_log!("Fetching {}", query);

        let rows = match self {
            Database::Sqlite(pool) => {
                let rows = bind_values!(sqlx::query(&sql), values)
                    .fetch_all(pool)
                    .await?;
                rows.iter()
                    .map(|row| sqlite_row(row, table))
                    .collect::<Result<Vec<_>, _>>()?
            }
            Database::Postgres(pool) => {
                let rows = bind_values!(sqlx::query(&sql), values)
                    .fetch_all(pool)
                    .await?;
                rows.iter()
                    .map(|row| postgres_row(row, table))
                    .collect::<Result<Vec<_>, _>>()?
            }
        };

        rows.iter()
            .map(|row| table.decode_row(row).map_err(TablemapError::from))
            .collect()
    }

    /// Execute an insert built for `table` and return the generated primary key, if the
    /// key is generated by the database
    pub async fn insert(&self, query: &Query, table: &Table) -> Result<Option<Value>, TablemapError> {
        let primary = table.primary_column();
        if !primary.is_auto_increment() {
            self.execute(query).await?;
            return Ok(None);
        }

        query.check_placeholders()?;
        let values = query.encoded_values()?;
        let sql = query.dialect_sql(self.dialect());
        trace_log!("Inserting {}", query);

        let key = match self {
            Database::Sqlite(pool) => {
                let result = bind_values!(sqlx::query(&sql), values)
                    .execute(pool)
                    .await?;
                DbValue::BigInt(result.last_insert_rowid())
            }
            Database::Postgres(pool) => {
                let row = bind_values!(sqlx::query(&sql), values)
                    .fetch_one(pool)
                    .await?;
                postgres_cell(&row, 0, primary.wire_type())?
            }
        };
        Ok(Some(primary.decode(&key)?))
    }

    /// Check database connection health
    pub async fn health_check(&self) -> Result<(), TablemapError> {
        match self {
            Database::Sqlite(pool) => {
                sqlx::query("SELECT 1").fetch_one(pool).await?;
            }
            Database::Postgres(pool) => {
                sqlx::query("SELECT 1").fetch_one(pool).await?;
            }
        }
        Ok(())
    }

    pub async fn close(&self) {
        match self {
            Database::Sqlite(pool) => pool.close().await,
            Database::Postgres(pool) => pool.close().await,
        }
    }
}

fn check_width(found: usize, table: &Table) -> Result<(), TablemapError> {
    if found != table.columns().len() {
        return Err(MappingError::RowWidth {
            table: table.name().to_string(),
            expected: table.columns().len(),
            found,
        }
        .into());
    }
    Ok(())
}

fn sqlite_row(row: &SqliteRow, table: &Table) -> Result<Vec<DbValue>, TablemapError> {
    check_width(row.len(), table)?;
    table
        .columns()
        .iter()
        .enumerate()
        .map(|(index, column)| sqlite_cell(row, index, column.wire_type()))
        .collect()
}

/// SQLite values come back as storage classes: integers, reals, text and blobs
fn sqlite_cell(row: &SqliteRow, index: usize, wire_type: WireType) -> Result<DbValue, TablemapError> {
    let value = match wire_type {
        WireType::Boolean | WireType::SmallInt | WireType::Integer | WireType::BigInt => row
            .try_get_unchecked::<Option<i64>, _>(index)?
            .map(DbValue::BigInt),
        WireType::Real | WireType::Double => row
            .try_get_unchecked::<Option<f64>, _>(index)?
            .map(DbValue::Double),
        WireType::Binary => row
            .try_get_unchecked::<Option<Vec<u8>>, _>(index)?
            .map(DbValue::Blob),
        WireType::Char
        | WireType::Varchar
        | WireType::Uuid
        | WireType::Timestamp
        | WireType::Date
        | WireType::Json => row
            .try_get_unchecked::<Option<String>, _>(index)?
            .map(DbValue::Text),
    };
    Ok(value.unwrap_or(DbValue::Null))
}

fn postgres_row(row: &PgRow, table: &Table) -> Result<Vec<DbValue>, TablemapError> {
    check_width(row.len(), table)?;
    table
        .columns()
        .iter()
        .enumerate()
        .map(|(index, column)| postgres_cell(row, index, column.wire_type()))
        .collect()
}

fn postgres_cell(row: &PgRow, index: usize, wire_type: WireType) -> Result<DbValue, TablemapError> {
    let value = match wire_type {
        WireType::Boolean => row.try_get::<Option<bool>, _>(index)?.map(DbValue::Boolean),
        WireType::SmallInt => row.try_get::<Option<i16>, _>(index)?.map(DbValue::SmallInt),
        WireType::Integer => row.try_get::<Option<i32>, _>(index)?.map(DbValue::Integer),
        WireType::BigInt => row.try_get::<Option<i64>, _>(index)?.map(DbValue::BigInt),
        WireType::Real => row.try_get::<Option<f32>, _>(index)?.map(DbValue::Real),
        WireType::Double => row.try_get::<Option<f64>, _>(index)?.map(DbValue::Double),
        WireType::Char | WireType::Varchar => {
            row.try_get::<Option<String>, _>(index)?.map(DbValue::Text)
        }
        WireType::Binary => row.try_get::<Option<Vec<u8>>, _>(index)?.map(DbValue::Blob),
        WireType::Uuid => row.try_get::<Option<Uuid>, _>(index)?.map(DbValue::Uuid),
        WireType::Timestamp => row
            .try_get::<Option<DateTime<Utc>>, _>(index)?
            .map(DbValue::Timestamp),
        WireType::Date => row.try_get::<Option<NaiveDate>, _>(index)?.map(DbValue::Date),
        WireType::Json => row
            .try_get::<Option<Json<serde_json::Value>>, _>(index)?
            .map(|json| DbValue::Json(json.0)),
    };
    Ok(value.unwrap_or(DbValue::Null))
}
