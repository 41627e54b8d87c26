//! Convenience re-exports for common Tablemap usage
//!
//! This prelude module re-exports the most commonly used items from the Tablemap crates,
//! making it easier to import everything you need with a single use statement.
//!
//! # Example
//!
//! ```rust
//! use tablemap::prelude::*;
//!
//! let mapper = Mapper::new(Dialect::Sqlite);
//! assert_eq!(mapper.dialect(), Dialect::Sqlite);
//! ```

// Core Tablemap components
pub use crate::core::Tablemap;
pub use crate::driver::Database;
pub use crate::errors::TablemapError;

// Re-export centralized config
pub use config::{AppConfig, DatabaseConfig, MapperConfig};

// Re-export commonly used mapping types for convenience
pub use mapping_core::prelude::*;

// Re-export mapping_core module for macro-generated code
pub use mapping_core;

// Re-export entity derive for model creation
pub use table_derive::{entity, Entity};

// Common external dependencies
pub use anyhow;
pub use sqlx;
pub use tokio;
