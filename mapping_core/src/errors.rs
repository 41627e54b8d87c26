use thiserror::Error;
use type_mapping::TypeMappingError;

use crate::validation::ValidationError;

/// Who has to act on an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Misconfiguration or misuse by the caller; fix the configuration
    User,
    /// Broken invariant inside the mapping layer itself; worth reporting
    Internal,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MappingError {
    #[error("Entity '{entity}' declares no properties")]
    EmptyEntity { entity: &'static str },

    #[error("Entity '{entity}' has no property '{primary_key}' to use as primary key")]
    MissingPrimaryKey {
        entity: &'static str,
        primary_key: String,
    },

    #[error("'{scope}' has names registered multiple times: {names:?}")]
    NotUniqueName { scope: String, names: Vec<String> },

    #[error("Could not find serializer for property '{entity}.{property}' of type '{value_type}'")]
    SerializerNotFound {
        entity: &'static str,
        property: String,
        value_type: &'static str,
    },

    #[error("Serializer for '{owner}' value of type '{value_type}' could not be resolved: {source}")]
    Serializer {
        owner: &'static str,
        value_type: &'static str,
        #[source]
        source: TypeMappingError,
    },

    #[error("Type mapping error: {0}")]
    TypeMapping(#[from] TypeMappingError),

    #[error("Invalid name: {0}")]
    InvalidName(#[from] ValidationError),

    #[error("Input type '{entity}' is not registered in global inputs")]
    UnregisteredInput { entity: &'static str },

    #[error("Entity '{entity}' has no property '{property}'")]
    UnknownProperty {
        entity: &'static str,
        property: String,
    },

    #[error("Property '{property}' can only be read from '{expected}' instances")]
    PropertyAccess {
        expected: &'static str,
        property: String,
    },

    #[error("No table is mapped for entity '{entity}'")]
    UnknownTable { entity: &'static str },

    #[error("Column '{table}.{column}' references '{references}' which is not a table in schema '{schema}'")]
    UnknownForeignTable {
        schema: String,
        table: String,
        column: String,
        references: &'static str,
    },

    #[error("Column '{table}.{column}' of type '{column_type}' cannot reference primary key of type '{primary_key_type}'")]
    ForeignKeyMismatch {
        table: String,
        column: String,
        column_type: &'static str,
        primary_key_type: &'static str,
    },

    #[error("Primary key '{table}.{column}' cannot also reference '{references}'")]
    ReferencingPrimaryKey {
        table: String,
        column: String,
        references: &'static str,
    },

    #[error("Procedure '{procedure}' belongs to schema {declared:?}, not '{schema}'")]
    ProcedureSchemaMismatch {
        schema: String,
        procedure: String,
        declared: Option<String>,
    },

    #[error("Column '{table}.{column}' is not a foreign key")]
    NotForeignKey { table: String, column: String },

    #[error("Table '{table}' has {expected} columns but the row holds {found} values")]
    RowWidth {
        table: String,
        expected: usize,
        found: usize,
    },

    #[error("Query has {placeholders} placeholders but {values} bound values")]
    PlaceholderCount { placeholders: usize, values: usize },

    #[error("Internal mapping error (please report): {0}")]
    Internal(String),
}

impl MappingError {
    pub fn severity(&self) -> Severity {
        match self {
            MappingError::Internal(_) => Severity::Internal,
            // A serializer that cannot encode values of its own declared type breaks its
            // contract. Decode failures come from what is stored in the database.
            MappingError::TypeMapping(TypeMappingError::Encode { .. }) => Severity::Internal,
            _ => Severity::User,
        }
    }

    pub fn is_internal(&self) -> bool {
        self.severity() == Severity::Internal
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use type_mapping::Dialect;

    #[test]
    fn test_severity_split() {
        assert_eq!(
            MappingError::Internal("unlinked".into()).severity(),
            Severity::Internal
        );
        assert_eq!(
            MappingError::UnregisteredInput { entity: "Artist" }.severity(),
            Severity::User
        );
        let unknown = MappingError::Serializer {
            owner: "Artist",
            value_type: "Money",
            source: TypeMappingError::UnknownType {
                value_type: "Money",
                dialect: Dialect::Sqlite,
            },
        };
        assert!(!unknown.is_internal());

        let encode = MappingError::TypeMapping(TypeMappingError::Encode {
            expected: "Char",
            found: "Text(\"ab\")".into(),
        });
        assert!(encode.is_internal());
        let decode = MappingError::TypeMapping(TypeMappingError::Decode {
            expected: "SmallInt",
            found: "BigInt(40000)".into(),
        });
        assert_eq!(decode.severity(), Severity::User);
    }

    #[test]
    fn test_messages_name_the_offender() {
        let err = MappingError::NotUniqueName {
            scope: "Artist".into(),
            names: vec!["name".into()],
        };
        assert!(err.to_string().contains("\"name\""));
    }
}
