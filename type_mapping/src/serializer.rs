//! Serializer definitions
//!
//! A [`TypeSerializer`] pairs an encoder and a decoder with the wire-type tag and the
//! dialect-specific column type for one (value type, dialect) combination.

use std::any::TypeId;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::dialect::{Dialect, WireType};
use crate::errors::TypeMappingError;
use crate::types::{DbValue, Value};

/// Converts a non-null runtime value into its driver-native form
pub type Encoder = fn(&Value) -> Result<DbValue, TypeMappingError>;

/// Converts a non-null driver value back into a runtime value
pub type Decoder = fn(&DbValue) -> Result<Value, TypeMappingError>;

/// Identity of a Rust value type
///
/// Equality is exact type identity; the name is only carried for messages.
#[derive(Clone, Copy)]
pub struct ValueType {
    id: TypeId,
    name: &'static str,
}

impl ValueType {
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn type_id(&self) -> TypeId {
        self.id
    }
}

impl PartialEq for ValueType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ValueType {}

impl Hash for ValueType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ValueType({})", self.name)
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

#[derive(Clone)]
pub struct TypeSerializer {
    value_type: ValueType,
    dialect: Dialect,
    db_type: String,
    wire_type: WireType,
    encoder: Encoder,
    decoder: Decoder,
}

impl TypeSerializer {
    pub fn new<T: ?Sized + 'static>(
        dialect: Dialect,
        db_type: impl Into<String>,
        wire_type: WireType,
        encoder: Encoder,
        decoder: Decoder,
    ) -> Self {
        Self {
            value_type: ValueType::of::<T>(),
            dialect,
            db_type: db_type.into(),
            wire_type,
            encoder,
            decoder,
        }
    }

    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Column type name used in DDL for this dialect
    pub fn db_type(&self) -> &str {
        &self.db_type
    }

    pub fn wire_type(&self) -> WireType {
        self.wire_type
    }

    pub fn encoder(&self) -> Encoder {
        self.encoder
    }

    pub fn decoder(&self) -> Decoder {
        self.decoder
    }

    /// Encode a value; null is passed through without calling the encoder
    pub fn encode(&self, value: &Value) -> Result<DbValue, TypeMappingError> {
        if value.is_null() {
            return Ok(DbValue::Null);
        }
        (self.encoder)(value)
    }

    /// Decode a driver value; null is passed through without calling the decoder
    pub fn decode(&self, value: &DbValue) -> Result<Value, TypeMappingError> {
        if value.is_null() {
            return Ok(Value::Null);
        }
        (self.decoder)(value)
    }
}

impl fmt::Debug for TypeSerializer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeSerializer")
            .field("value_type", &self.value_type.name())
            .field("dialect", &self.dialect)
            .field("db_type", &self.db_type)
            .field("wire_type", &self.wire_type)
            .finish()
    }
}

impl fmt::Display for TypeSerializer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TS<{}@{}>", self.value_type.name(), self.dialect)
    }
}
