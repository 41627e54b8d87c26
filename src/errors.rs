//! Error types for the Tablemap crate
//!
//! This module contains all error types that can be returned by Tablemap operations.

use config::ConfigError;
use mapping_core::MappingError;
use thiserror::Error;
use type_mapping::Dialect;

#[derive(Error, Debug)]
pub enum TablemapError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Mapping(#[from] MappingError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Mapper dialect {mapper} does not match database dialect {database}")]
    DialectMismatch { mapper: Dialect, database: Dialect },

    #[error("Schema not found: {0}")]
    SchemaNotFound(String),

    #[error("Schema already registered: {0}")]
    SchemaAlreadyRegistered(String),

    #[error("Procedure '{0}' is not registered in schema '{1}'")]
    UnknownProcedure(&'static str, String),

    #[error("Mapper is shared and can no longer be configured")]
    MapperShared,
}

impl From<type_mapping::TypeMappingError> for TablemapError {
    fn from(error: type_mapping::TypeMappingError) -> Self {
        TablemapError::Mapping(error.into())
    }
}
