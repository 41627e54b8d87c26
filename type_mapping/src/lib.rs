//! Type mapping between Rust values and the wire formats of the supported SQL dialects
//!
//! This crate owns the serializer registry: for every (value type, dialect) pair there is
//! exactly one [`TypeSerializer`] describing how the value is encoded for the driver and
//! decoded back. Lookups never fall back to a guessed encoding.

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

pub mod builtin;
pub mod dialect;
pub mod errors;
pub mod registry;
pub mod serializer;
pub mod types;

pub use dialect::{Dialect, WireType};
pub use errors::TypeMappingError;
pub use registry::SerializerRegistry;
pub use serializer::{Decoder, Encoder, TypeSerializer, ValueType};
pub use types::{ColumnType, DbValue, ToValue, Value};
