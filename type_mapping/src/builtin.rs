//! Built-in serializers for the supported dialects
//!
//! SQLite has only a handful of storage classes, so integers and booleans travel as 64-bit
//! integers and uuids, timestamps, dates and json as text. PostgreSQL receives native types.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use uuid::Uuid;

use crate::dialect::{Dialect, WireType};
use crate::errors::TypeMappingError;
use crate::serializer::TypeSerializer;
use crate::types::{DbValue, Value};

type Result<T> = std::result::Result<T, TypeMappingError>;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// All built-in serializers for `dialect`
pub fn serializers(dialect: Dialect) -> Vec<TypeSerializer> {
    match dialect {
        Dialect::Sqlite => sqlite(),
        Dialect::Postgres => postgres(),
    }
}

pub fn sqlite() -> Vec<TypeSerializer> {
    let d = Dialect::Sqlite;
    vec![
        TypeSerializer::new::<bool>(d, "BOOLEAN", WireType::Boolean, sqlite::encode_bool, sqlite::decode_bool),
        TypeSerializer::new::<i16>(d, "SMALLINT", WireType::SmallInt, sqlite::encode_int, sqlite::decode_i16),
        TypeSerializer::new::<i32>(d, "INTEGER", WireType::Integer, sqlite::encode_int, sqlite::decode_i32),
        TypeSerializer::new::<i64>(d, "BIGINT", WireType::BigInt, sqlite::encode_int, sqlite::decode_i64),
        TypeSerializer::new::<f32>(d, "REAL", WireType::Real, sqlite::encode_float, sqlite::decode_f32),
        TypeSerializer::new::<f64>(d, "DOUBLE", WireType::Double, sqlite::encode_float, sqlite::decode_f64),
        TypeSerializer::new::<char>(d, "CHAR(1)", WireType::Char, encode_char, decode_char),
        TypeSerializer::new::<String>(d, "TEXT", WireType::Varchar, encode_text, decode_text),
        TypeSerializer::new::<Vec<u8>>(d, "BLOB", WireType::Binary, encode_bytes, decode_bytes),
        TypeSerializer::new::<Uuid>(d, "CHAR(36)", WireType::Uuid, sqlite::encode_uuid, sqlite::decode_uuid),
        TypeSerializer::new::<DateTime<Utc>>(d, "TEXT", WireType::Timestamp, sqlite::encode_timestamp, sqlite::decode_timestamp),
        TypeSerializer::new::<NaiveDate>(d, "DATE", WireType::Date, sqlite::encode_date, sqlite::decode_date),
        TypeSerializer::new::<serde_json::Value>(d, "JSON", WireType::Json, sqlite::encode_json, sqlite::decode_json),
    ]
}

pub fn postgres() -> Vec<TypeSerializer> {
    let d = Dialect::Postgres;
    vec![
        TypeSerializer::new::<bool>(d, "BOOLEAN", WireType::Boolean, postgres::encode_bool, postgres::decode_bool),
        TypeSerializer::new::<i16>(d, "SMALLINT", WireType::SmallInt, postgres::encode_i16, postgres::decode_i16),
        TypeSerializer::new::<i32>(d, "INTEGER", WireType::Integer, postgres::encode_i32, postgres::decode_i32),
        TypeSerializer::new::<i64>(d, "BIGINT", WireType::BigInt, postgres::encode_i64, postgres::decode_i64),
        TypeSerializer::new::<f32>(d, "REAL", WireType::Real, postgres::encode_f32, postgres::decode_f32),
        TypeSerializer::new::<f64>(d, "DOUBLE PRECISION", WireType::Double, postgres::encode_f64, postgres::decode_f64),
        TypeSerializer::new::<char>(d, "VARCHAR(1)", WireType::Char, encode_char, decode_char),
        TypeSerializer::new::<String>(d, "VARCHAR", WireType::Varchar, encode_text, decode_text),
        TypeSerializer::new::<Vec<u8>>(d, "BYTEA", WireType::Binary, encode_bytes, decode_bytes),
        TypeSerializer::new::<Uuid>(d, "UUID", WireType::Uuid, postgres::encode_uuid, postgres::decode_uuid),
        TypeSerializer::new::<DateTime<Utc>>(d, "TIMESTAMP WITH TIME ZONE", WireType::Timestamp, postgres::encode_timestamp, postgres::decode_timestamp),
        TypeSerializer::new::<NaiveDate>(d, "DATE", WireType::Date, postgres::encode_date, postgres::decode_date),
        TypeSerializer::new::<serde_json::Value>(d, "JSONB", WireType::Json, postgres::encode_json, postgres::decode_json),
    ]
}

fn encode_char(value: &Value) -> Result<DbValue> {
    match value {
        Value::Char(c) => Ok(DbValue::Text(c.to_string())),
        other => Err(TypeMappingError::encode("Char", other)),
    }
}

fn decode_char(value: &DbValue) -> Result<Value> {
    if let DbValue::Text(s) = value {
        let mut chars = s.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            return Ok(Value::Char(c));
        }
    }
    Err(TypeMappingError::decode("Char", value))
}

fn encode_text(value: &Value) -> Result<DbValue> {
    match value {
        Value::Text(s) => Ok(DbValue::Text(s.clone())),
        other => Err(TypeMappingError::encode("Text", other)),
    }
}

fn decode_text(value: &DbValue) -> Result<Value> {
    match value {
        DbValue::Text(s) => Ok(Value::Text(s.clone())),
        other => Err(TypeMappingError::decode("Text", other)),
    }
}

fn encode_bytes(value: &Value) -> Result<DbValue> {
    match value {
        Value::Bytes(bytes) => Ok(DbValue::Blob(bytes.clone())),
        other => Err(TypeMappingError::encode("Bytes", other)),
    }
}

fn decode_bytes(value: &DbValue) -> Result<Value> {
    match value {
        DbValue::Blob(bytes) => Ok(Value::Bytes(bytes.clone())),
        other => Err(TypeMappingError::decode("Bytes", other)),
    }
}

mod sqlite {
    use super::*;

    pub fn encode_bool(value: &Value) -> Result<DbValue> {
        match value {
            Value::Bool(b) => Ok(DbValue::BigInt(i64::from(*b))),
            other => Err(TypeMappingError::encode("Bool", other)),
        }
    }

    pub fn decode_bool(value: &DbValue) -> Result<Value> {
        match value {
            DbValue::BigInt(0) => Ok(Value::Bool(false)),
            DbValue::BigInt(1) => Ok(Value::Bool(true)),
            DbValue::Boolean(b) => Ok(Value::Bool(*b)),
            other => Err(TypeMappingError::decode("Bool", other)),
        }
    }

    pub fn encode_int(value: &Value) -> Result<DbValue> {
        match value {
            Value::I16(n) => Ok(DbValue::BigInt(i64::from(*n))),
            Value::I32(n) => Ok(DbValue::BigInt(i64::from(*n))),
            Value::I64(n) => Ok(DbValue::BigInt(*n)),
            other => Err(TypeMappingError::encode("integer", other)),
        }
    }

    fn integer(value: &DbValue, expected: &'static str) -> Result<i64> {
        match value {
            DbValue::BigInt(n) => Ok(*n),
            DbValue::Integer(n) => Ok(i64::from(*n)),
            DbValue::SmallInt(n) => Ok(i64::from(*n)),
            other => Err(TypeMappingError::decode(expected, other)),
        }
    }

    pub fn decode_i16(value: &DbValue) -> Result<Value> {
        let n = integer(value, "I16")?;
        i16::try_from(n)
            .map(Value::I16)
            .map_err(|_| TypeMappingError::decode("I16", value))
    }

    pub fn decode_i32(value: &DbValue) -> Result<Value> {
        let n = integer(value, "I32")?;
        i32::try_from(n)
            .map(Value::I32)
            .map_err(|_| TypeMappingError::decode("I32", value))
    }

    pub fn decode_i64(value: &DbValue) -> Result<Value> {
        integer(value, "I64").map(Value::I64)
    }

    pub fn encode_float(value: &Value) -> Result<DbValue> {
        match value {
            Value::F32(n) => Ok(DbValue::Double(f64::from(*n))),
            Value::F64(n) => Ok(DbValue::Double(*n)),
            other => Err(TypeMappingError::encode("float", other)),
        }
    }

    pub fn decode_f32(value: &DbValue) -> Result<Value> {
        match value {
            DbValue::Double(n) => Ok(Value::F32(*n as f32)),
            DbValue::Real(n) => Ok(Value::F32(*n)),
            other => Err(TypeMappingError::decode("F32", other)),
        }
    }

    pub fn decode_f64(value: &DbValue) -> Result<Value> {
        match value {
            DbValue::Double(n) => Ok(Value::F64(*n)),
            DbValue::Real(n) => Ok(Value::F64(f64::from(*n))),
            other => Err(TypeMappingError::decode("F64", other)),
        }
    }

    pub fn encode_uuid(value: &Value) -> Result<DbValue> {
        match value {
            Value::Uuid(id) => Ok(DbValue::Text(id.hyphenated().to_string())),
            other => Err(TypeMappingError::encode("Uuid", other)),
        }
    }

    pub fn decode_uuid(value: &DbValue) -> Result<Value> {
        match value {
            DbValue::Text(s) => Uuid::parse_str(s)
                .map(Value::Uuid)
                .map_err(|_| TypeMappingError::decode("Uuid", value)),
            DbValue::Blob(bytes) => Uuid::from_slice(bytes)
                .map(Value::Uuid)
                .map_err(|_| TypeMappingError::decode("Uuid", value)),
            other => Err(TypeMappingError::decode("Uuid", other)),
        }
    }

    pub fn encode_timestamp(value: &Value) -> Result<DbValue> {
        match value {
            Value::Timestamp(ts) => Ok(DbValue::Text(
                ts.to_rfc3339_opts(SecondsFormat::AutoSi, true),
            )),
            other => Err(TypeMappingError::encode("Timestamp", other)),
        }
    }

    pub fn decode_timestamp(value: &DbValue) -> Result<Value> {
        match value {
            DbValue::Text(s) => DateTime::parse_from_rfc3339(s)
                .map(|dt| Value::Timestamp(dt.with_timezone(&Utc)))
                .map_err(|_| TypeMappingError::decode("Timestamp", value)),
            other => Err(TypeMappingError::decode("Timestamp", other)),
        }
    }

    pub fn encode_date(value: &Value) -> Result<DbValue> {
        match value {
            Value::Date(date) => Ok(DbValue::Text(date.format(DATE_FORMAT).to_string())),
            other => Err(TypeMappingError::encode("Date", other)),
        }
    }

    pub fn decode_date(value: &DbValue) -> Result<Value> {
        match value {
            DbValue::Text(s) => NaiveDate::parse_from_str(s, DATE_FORMAT)
                .map(Value::Date)
                .map_err(|_| TypeMappingError::decode("Date", value)),
            other => Err(TypeMappingError::decode("Date", other)),
        }
    }

    pub fn encode_json(value: &Value) -> Result<DbValue> {
        match value {
            Value::Json(json) => Ok(DbValue::Text(json.to_string())),
            other => Err(TypeMappingError::encode("Json", other)),
        }
    }

    pub fn decode_json(value: &DbValue) -> Result<Value> {
        match value {
            DbValue::Text(s) => serde_json::from_str(s)
                .map(Value::Json)
                .map_err(|_| TypeMappingError::decode("Json", value)),
            other => Err(TypeMappingError::decode("Json", other)),
        }
    }
}

mod postgres {
    use super::*;

    macro_rules! native {
        ($encode:ident, $decode:ident, $value:ident => $db:ident, $expected:literal) => {
            pub fn $encode(value: &Value) -> Result<DbValue> {
                match value {
                    Value::$value(v) => Ok(DbValue::$db(v.clone())),
                    other => Err(TypeMappingError::encode($expected, other)),
                }
            }

            pub fn $decode(value: &DbValue) -> Result<Value> {
                match value {
                    DbValue::$db(v) => Ok(Value::$value(v.clone())),
                    other => Err(TypeMappingError::decode($expected, other)),
                }
            }
        };
    }

    native!(encode_bool, decode_bool, Bool => Boolean, "Bool");
    native!(encode_i16, decode_i16, I16 => SmallInt, "I16");
    native!(encode_i32, decode_i32, I32 => Integer, "I32");
    native!(encode_i64, decode_i64, I64 => BigInt, "I64");
    native!(encode_f32, decode_f32, F32 => Real, "F32");
    native!(encode_f64, decode_f64, F64 => Double, "F64");
    native!(encode_uuid, decode_uuid, Uuid => Uuid, "Uuid");
    native!(encode_timestamp, decode_timestamp, Timestamp => Timestamp, "Timestamp");
    native!(encode_date, decode_date, Date => Date, "Date");
    native!(encode_json, decode_json, Json => Json, "Json");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serializer::ValueType;
    use chrono::TimeZone;
    use serde_json::json;

    fn find(dialect: Dialect, value_type: ValueType) -> TypeSerializer {
        serializers(dialect)
            .into_iter()
            .find(|s| s.value_type() == value_type)
            .expect("builtin serializer")
    }

    fn assert_round_trip<T: 'static>(samples: Vec<Value>) {
        for dialect in Dialect::ALL {
            let serializer = find(dialect, ValueType::of::<T>());
            for sample in &samples {
                let encoded = serializer.encode(sample).expect("encode");
                let decoded = serializer.decode(&encoded).expect("decode");
                assert_eq!(&decoded, sample, "{} round trip in {}", sample, dialect);
            }
        }
    }

    #[test]
    fn test_integer_round_trips_with_boundaries() {
        assert_round_trip::<i16>(vec![Value::I16(0), Value::I16(-1), Value::I16(i16::MIN), Value::I16(i16::MAX)]);
        assert_round_trip::<i32>(vec![Value::I32(0), Value::I32(-42), Value::I32(i32::MIN), Value::I32(i32::MAX)]);
        assert_round_trip::<i64>(vec![Value::I64(0), Value::I64(-42), Value::I64(i64::MIN), Value::I64(i64::MAX)]);
    }

    #[test]
    fn test_float_round_trips_with_boundaries() {
        assert_round_trip::<f32>(vec![Value::F32(0.0), Value::F32(-1.5), Value::F32(f32::MAX), Value::F32(f32::MIN_POSITIVE)]);
        assert_round_trip::<f64>(vec![Value::F64(0.0), Value::F64(-1.5), Value::F64(f64::MAX), Value::F64(f64::MIN)]);
    }

    #[test]
    fn test_text_like_round_trips() {
        assert_round_trip::<String>(vec![
            Value::from(""),
            Value::from("Queen"),
            Value::from("'; DROP TABLE Artist; --"),
            Value::from("测试数据"),
        ]);
        assert_round_trip::<char>(vec![Value::Char('a'), Value::Char(' '), Value::Char('\''), Value::Char('ž')]);
        assert_round_trip::<bool>(vec![Value::Bool(true), Value::Bool(false)]);
        assert_round_trip::<Vec<u8>>(vec![Value::Bytes(vec![]), Value::Bytes(vec![0, 255, 7])]);
    }

    #[test]
    fn test_structured_round_trips() {
        let ts = Utc.with_ymd_and_hms(2024, 2, 29, 23, 59, 59).unwrap()
            + chrono::Duration::nanoseconds(123_456_789);
        assert_round_trip::<Uuid>(vec![Value::Uuid(Uuid::nil()), Value::Uuid(Uuid::new_v4())]);
        assert_round_trip::<DateTime<Utc>>(vec![Value::Timestamp(ts), Value::Timestamp(Utc.timestamp_opt(0, 0).unwrap())]);
        assert_round_trip::<NaiveDate>(vec![Value::Date(NaiveDate::from_ymd_opt(1970, 1, 1).unwrap())]);
        assert_round_trip::<serde_json::Value>(vec![
            Value::Json(json!({"a": [1, 2, 3], "b": null})),
            Value::Json(json!("")),
        ]);
    }

    #[test]
    fn test_null_passes_through() {
        for serializer in sqlite().into_iter().chain(postgres()) {
            assert_eq!(serializer.encode(&Value::Null), Ok(DbValue::Null));
            assert_eq!(serializer.decode(&DbValue::Null), Ok(Value::Null));
        }
    }

    #[test]
    fn test_postgres_char_is_not_blank_padded() {
        let char_ser = find(Dialect::Postgres, ValueType::of::<char>());
        assert_eq!(char_ser.db_type(), "VARCHAR(1)");
        assert_eq!(char_ser.encode(&Value::Char(' ')), Ok(DbValue::Text(" ".to_string())));
        assert!(matches!(
            char_ser.decode(&DbValue::Text(String::new())),
            Err(TypeMappingError::Decode { .. })
        ));
    }

    #[test]
    fn test_sqlite_storage_classes() {
        let bool_ser = find(Dialect::Sqlite, ValueType::of::<bool>());
        assert_eq!(bool_ser.encode(&Value::Bool(true)), Ok(DbValue::BigInt(1)));

        let uuid_ser = find(Dialect::Sqlite, ValueType::of::<Uuid>());
        assert!(matches!(uuid_ser.encode(&Value::Uuid(Uuid::nil())), Ok(DbValue::Text(_))));
    }

    #[test]
    fn test_mismatched_values_are_rejected() {
        let int_ser = find(Dialect::Postgres, ValueType::of::<i32>());
        assert!(matches!(
            int_ser.encode(&Value::from("nope")),
            Err(TypeMappingError::Encode { .. })
        ));

        let small = find(Dialect::Sqlite, ValueType::of::<i16>());
        assert!(matches!(
            small.decode(&DbValue::BigInt(i64::from(i16::MAX) + 1)),
            Err(TypeMappingError::Decode { .. })
        ));
    }

    #[test]
    fn test_every_dialect_covers_the_same_types() {
        let sqlite_types: Vec<_> = sqlite().iter().map(|s| s.value_type()).collect();
        let postgres_types: Vec<_> = postgres().iter().map(|s| s.value_type()).collect();
        assert_eq!(sqlite_types, postgres_types);
    }
}
