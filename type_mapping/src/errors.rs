use thiserror::Error;

use crate::dialect::Dialect;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum TypeMappingError {
    #[error("Serializer for type '{value_type}' is already registered for dialect {dialect}")]
    DuplicateSerializer {
        value_type: &'static str,
        dialect: Dialect,
    },

    #[error("Unknown type '{value_type}' for dialect {dialect}: no serializer registered")]
    UnknownType {
        value_type: &'static str,
        dialect: Dialect,
    },

    #[error("Cannot encode value {found} as {expected}")]
    Encode {
        expected: &'static str,
        found: String,
    },

    #[error("Cannot decode driver value {found} as {expected}")]
    Decode {
        expected: &'static str,
        found: String,
    },
}

impl TypeMappingError {
    pub(crate) fn encode(expected: &'static str, found: impl std::fmt::Debug) -> Self {
        Self::Encode {
            expected,
            found: format!("{:?}", found),
        }
    }

    pub(crate) fn decode(expected: &'static str, found: impl std::fmt::Debug) -> Self {
        Self::Decode {
            expected,
            found: format!("{:?}", found),
        }
    }
}
