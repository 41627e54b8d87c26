//! Identifier validation
//!
//! Table, schema, column and procedure names end up inside SQL text, so they are checked
//! before any metadata is built. Values never go through here; they are always bound.

use thiserror::Error;

/// PostgreSQL identifier length limit
pub const MAX_IDENTIFIER_LENGTH: usize = 63;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Name cannot be empty")]
    Empty,

    #[error("Name '{name}' is too long: {length} characters (max {max_length})")]
    TooLong {
        name: String,
        length: usize,
        max_length: usize,
    },

    #[error("Name '{0}' must start with a letter or underscore")]
    InvalidStartCharacter(String),

    #[error("Invalid characters in name '{0}': only alphanumeric characters and underscores are allowed")]
    InvalidCharacters(String),
}

/// Checks a name before it is quoted into SQL text.
///
/// SQL keywords such as `end` or `from` pass: generated statements always quote identifiers.
pub fn validate_identifier(name: &str) -> Result<(), ValidationError> {
    let first_char = name.chars().next().ok_or(ValidationError::Empty)?;

    if name.len() > MAX_IDENTIFIER_LENGTH {
        return Err(ValidationError::TooLong {
            name: name.to_string(),
            length: name.len(),
            max_length: MAX_IDENTIFIER_LENGTH,
        });
    }

    if !first_char.is_ascii_alphabetic() && first_char != '_' {
        return Err(ValidationError::InvalidStartCharacter(name.to_string()));
    }

    if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(ValidationError::InvalidCharacters(name.to_string()));
    }

    Ok(())
}

pub fn is_valid_identifier(name: &str) -> bool {
    validate_identifier(name).is_ok()
}
