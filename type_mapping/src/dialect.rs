//! SQL dialects and wire-type tags
//!
//! A [`Dialect`] selects the serializer set and the placeholder/identifier conventions of a
//! database engine. A [`WireType`] is the type identifier sent alongside every bound value.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Supported database engines
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// Embedded single-file engine
    Sqlite,
    /// Client/server engine
    Postgres,
}

impl Dialect {
    pub const ALL: [Dialect; 2] = [Dialect::Sqlite, Dialect::Postgres];

    pub fn name(&self) -> &'static str {
        match self {
            Dialect::Sqlite => "sqlite",
            Dialect::Postgres => "postgres",
        }
    }

    /// Positional placeholder for the 1-based parameter `index`
    pub fn placeholder(&self, index: usize) -> String {
        match self {
            Dialect::Sqlite => "?".to_string(),
            Dialect::Postgres => format!("${}", index),
        }
    }

    /// Quote an identifier so keywords and mixed case survive
    pub fn quote_identifier(&self, name: &str) -> String {
        format!("\"{}\"", name.replace('"', "\"\""))
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Dialect {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqlite" => Ok(Dialect::Sqlite),
            "postgres" | "postgresql" | "pg" => Ok(Dialect::Postgres),
            other => Err(format!("Unknown dialect '{}'", other)),
        }
    }
}

/// Dialect-independent type tag carried by every bound value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WireType {
    Boolean,
    SmallInt,
    Integer,
    BigInt,
    Real,
    Double,
    Char,
    Varchar,
    Binary,
    Uuid,
    Timestamp,
    Date,
    Json,
}

impl WireType {
    pub fn name(&self) -> &'static str {
        match self {
            WireType::Boolean => "BOOLEAN",
            WireType::SmallInt => "SMALLINT",
            WireType::Integer => "INTEGER",
            WireType::BigInt => "BIGINT",
            WireType::Real => "REAL",
            WireType::Double => "DOUBLE",
            WireType::Char => "CHAR",
            WireType::Varchar => "VARCHAR",
            WireType::Binary => "BINARY",
            WireType::Uuid => "UUID",
            WireType::Timestamp => "TIMESTAMP",
            WireType::Date => "DATE",
            WireType::Json => "JSON",
        }
    }

    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            WireType::SmallInt | WireType::Integer | WireType::BigInt
        )
    }
}

impl fmt::Display for WireType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
