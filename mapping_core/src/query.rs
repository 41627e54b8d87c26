//! Parameterized queries
//!
//! A [`Query`] is SQL text with `?` placeholders plus the ordered [`QueryValue`]s bound to
//! them. Both are immutable after construction and hash their content once, up front.

use std::borrow::Cow;
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};

use type_mapping::{DbValue, Dialect, Encoder, TypeSerializer, Value, WireType};

use crate::errors::MappingError;

/// Placeholder written into query text for every bound value
pub const PLACEHOLDER: &str = "?";

/// One bound value with the serializer it was resolved with
#[derive(Clone)]
pub struct QueryValue {
    name: String,
    value: Value,
    wire_type: WireType,
    encoder: Encoder,
    hash: u64,
}

impl QueryValue {
    pub fn new(name: impl Into<String>, value: Value, serializer: &TypeSerializer) -> Self {
        Self::from_parts(name.into(), value, serializer.wire_type(), serializer.encoder())
    }

    pub fn from_parts(name: String, value: Value, wire_type: WireType, encoder: Encoder) -> Self {
        let mut hasher = DefaultHasher::new();
        name.hash(&mut hasher);
        value.hash(&mut hasher);
        wire_type.hash(&mut hasher);
        Self {
            name,
            value,
            wire_type,
            encoder,
            hash: hasher.finish(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn wire_type(&self) -> WireType {
        self.wire_type
    }

    /// Driver value; null is passed through without calling the encoder
    pub fn encode(&self) -> Result<DbValue, MappingError> {
        if self.value.is_null() {
            return Ok(DbValue::Null);
        }
        Ok((self.encoder)(&self.value)?)
    }
}

impl PartialEq for QueryValue {
    fn eq(&self, other: &Self) -> bool {
        self.hash == other.hash
            && self.name == other.name
            && self.value == other.value
            && self.wire_type == other.wire_type
    }
}

impl Eq for QueryValue {}

impl Hash for QueryValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash);
    }
}

impl fmt::Debug for QueryValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryValue")
            .field("name", &self.name)
            .field("value", &self.value)
            .field("wire_type", &self.wire_type)
            .finish()
    }
}

impl fmt::Display for QueryValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} = {}", self.name, self.wire_type, self.value.escaped())
    }
}

#[derive(Clone)]
pub struct Query {
    sql: String,
    values: Vec<QueryValue>,
    hash: u64,
}

impl Query {
    pub fn new(sql: impl Into<String>, values: Vec<QueryValue>) -> Self {
        let sql = sql.into();
        let mut hasher = DefaultHasher::new();
        sql.hash(&mut hasher);
        values.hash(&mut hasher);
        Self {
            sql,
            values,
            hash: hasher.finish(),
        }
    }

    /// Query without bound values
    pub fn raw(sql: impl Into<String>) -> Self {
        Self::new(sql, Vec::new())
    }

    pub fn sql(&self) -> &str {
        &self.sql
    }

    pub fn values(&self) -> &[QueryValue] {
        &self.values
    }

    /// Number of `?` placeholders outside quoted text
    pub fn placeholder_count(&self) -> usize {
        let mut count = 0;
        scan_placeholders(&self.sql, |_| count += 1);
        count
    }

    /// Fail unless every placeholder has exactly one bound value
    pub fn check_placeholders(&self) -> Result<(), MappingError> {
        let placeholders = self.placeholder_count();
        if placeholders != self.values.len() {
            return Err(MappingError::PlaceholderCount {
                placeholders,
                values: self.values.len(),
            });
        }
        Ok(())
    }

    /// Query text with placeholders in the style of `dialect`
    pub fn dialect_sql(&self, dialect: Dialect) -> Cow<'_, str> {
        if dialect == Dialect::Sqlite {
            return Cow::Borrowed(&self.sql);
        }
        let mut out = String::with_capacity(self.sql.len() + self.values.len() * 2);
        let mut last = 0;
        let mut index = 0;
        scan_placeholders(&self.sql, |at| {
            index += 1;
            out.push_str(&self.sql[last..at]);
            out.push_str(&dialect.placeholder(index));
            last = at + 1;
        });
        out.push_str(&self.sql[last..]);
        Cow::Owned(out)
    }

    /// Bound values encoded for the driver, in placeholder order
    pub fn encoded_values(&self) -> Result<Vec<(WireType, DbValue)>, MappingError> {
        self.values
            .iter()
            .map(|v| Ok((v.wire_type(), v.encode()?)))
            .collect()
    }
}

/// Calls `found` with the byte offset of each placeholder outside quotes
fn scan_placeholders(sql: &str, mut found: impl FnMut(usize)) {
    let mut quote: Option<char> = None;
    for (at, c) in sql.char_indices() {
        match (quote, c) {
            (None, '\'' | '"') => quote = Some(c),
            (Some(open), _) if c == open => quote = None,
            (None, '?') => found(at),
            _ => {}
        }
    }
}

impl PartialEq for Query {
    fn eq(&self, other: &Self) -> bool {
        self.hash == other.hash && self.sql == other.sql && self.values == other.values
    }
}

impl Eq for Query {}

impl Hash for Query {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.hash);
    }
}

impl fmt::Debug for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Query")
            .field("sql", &self.sql)
            .field("values", &self.values)
            .finish()
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql)?;
        for (i, value) in self.values.iter().enumerate() {
            write!(f, "\n  {}) {}", i + 1, value)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use type_mapping::{SerializerRegistry, ValueType};

    fn text(dialect: Dialect) -> &'static TypeSerializer {
        SerializerRegistry::builtin()
            .resolve(ValueType::of::<String>(), dialect)
            .unwrap()
    }

    fn name_value(name: &str) -> QueryValue {
        QueryValue::new("name", Value::from(name), text(Dialect::Postgres))
    }

    #[test]
    fn test_equal_content_is_equal_and_hashes_alike() {
        let a = Query::new("SELECT * FROM Artist WHERE name = ?", vec![name_value("Queen")]);
        let b = Query::new("SELECT * FROM Artist WHERE name = ?", vec![name_value("Queen")]);
        assert_eq!(a, b);

        let mut set = HashSet::new();
        set.insert(a);
        assert!(!set.insert(b));
    }

    #[test]
    fn test_value_or_order_changes_identity() {
        let sql = "SELECT * FROM t WHERE a = ? AND b = ?";
        let ab = Query::new(sql, vec![name_value("a"), name_value("b")]);
        let ba = Query::new(sql, vec![name_value("b"), name_value("a")]);
        let other = Query::new(sql, vec![name_value("a"), name_value("c")]);
        assert_ne!(ab, ba);
        assert_ne!(ab, other);
    }

    #[test]
    fn test_null_bypasses_encoder() {
        let value = QueryValue::new("name", Value::Null, text(Dialect::Sqlite));
        assert_eq!(value.encode().unwrap(), DbValue::Null);
    }

    #[test]
    fn test_encode_uses_resolved_serializer() {
        let value = name_value("Queen");
        assert_eq!(value.encode().unwrap(), DbValue::Text("Queen".into()));
        assert_eq!(value.wire_type(), WireType::Varchar);
    }

    #[test]
    fn test_display_lists_values_in_order() {
        let query = Query::new(
            "SELECT * FROM Artist WHERE name = ? OR name = ?",
            vec![name_value("Queen"), name_value("Guns N' Roses")],
        );
        assert_eq!(
            query.to_string(),
            "SELECT * FROM Artist WHERE name = ? OR name = ?\n  1) name: VARCHAR = 'Queen'\n  2) name: VARCHAR = 'Guns N'' Roses'"
        );
    }

    #[test]
    fn test_postgres_placeholders_are_numbered() {
        let query = Query::new(
            "UPDATE \"t?\" SET a = ?, b = '?' WHERE c = ?",
            vec![name_value("x"), name_value("y")],
        );
        assert_eq!(
            query.dialect_sql(Dialect::Postgres),
            "UPDATE \"t?\" SET a = $1, b = '?' WHERE c = $2"
        );
        assert_eq!(query.dialect_sql(Dialect::Sqlite), query.sql());
        assert_eq!(query.placeholder_count(), 2);
        assert!(query.check_placeholders().is_ok());
    }

    #[test]
    fn test_placeholder_mismatch_detected() {
        let query = Query::new("SELECT ?, ?", vec![name_value("x")]);
        assert_eq!(
            query.check_placeholders().unwrap_err(),
            MappingError::PlaceholderCount {
                placeholders: 2,
                values: 1
            }
        );
    }
}
