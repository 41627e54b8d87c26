//! # Tablemap
//!
//! An object-relational mapping layer for SQLite and PostgreSQL. Entity types declare their
//! properties once; Tablemap derives table, schema and procedure metadata from them, resolves
//! a serializer for every declared type and builds parameterized queries whose values are
//! always bound, never spliced into SQL text.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tablemap::prelude::*;
//!
//! #[entity]
//! pub struct Artist {
//!     #[primary_key]
//!     pub id: Option<i32>,
//!     pub name: String,
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig::in_memory();
//!
//!     let mut mapper = Mapper::new(Dialect::Sqlite);
//!     mapper.register_input::<Artist>()?;
//!
//!     let mut tablemap = Tablemap::with_mapper(&config, mapper).await?;
//!     let schema = Schema::builder("main")
//!         .entity::<Artist>()
//!         .build(tablemap.mapper())?;
//!     tablemap.register_schema(schema)?;
//!     tablemap.create_tables("main").await?;
//!
//!     let queen = Artist { id: None, name: "Queen".to_string() };
//!     tablemap.insert(&queen).await?;
//!
//!     let mut builder = QueryBuilder::new(&queen, tablemap.mapper())?;
//!     let sql = format!("SELECT id, name FROM Artist WHERE name = {}", builder.bind("name")?);
//!     let query = builder.build(sql);
//!     let rows = tablemap.fetch_all(&query, tablemap.table::<Artist>()?).await?;
//!     println!("{:?}", rows);
//!
//!     Ok(())
//! }
//! ```

/// Conditional debug logging macros
/// These macros only compile in code when the `debug-logging` feature is enabled
#[cfg(feature = "debug-logging")]
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {
        tracing::debug!($($arg)*)
    };
}

#[cfg(not(feature = "debug-logging"))]
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {};
}

#[cfg(feature = "debug-logging")]
#[macro_export]
macro_rules! trace_log {
    ($($arg:tt)*) => {
        tracing::trace!($($arg)*)
    };
}

#[cfg(not(feature = "debug-logging"))]
#[macro_export]
macro_rules! trace_log {
    ($($arg:tt)*) => {};
}

pub mod core;
pub mod driver;
pub mod errors;
pub mod prelude;

// Re-export the main public types for convenience
pub use core::Tablemap;
pub use driver::Database;
pub use errors::TablemapError;

// Re-export centralized config
pub use config::{AppConfig, ConfigError, DatabaseConfig, MapperConfig};

// Re-export internal crates used by macros and public API
// These MUST be public for the generated macro code to work correctly
pub use mapping_core;
pub use table_derive;
pub use type_mapping;

// Re-export external dependencies used in public API
pub use sqlx;
