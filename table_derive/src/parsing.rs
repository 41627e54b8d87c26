//! Parsing utilities for entity, table and column attributes
//!
//! Handles `#[table(name = "..")]` on the struct and `#[primary_key]`, `#[unique]`,
//! `#[foreign_key(Type)]` and `#[column(name = "..")]` on fields. Table and column names
//! are validated here so bad names fail at compile time.

use syn::{Attribute, Data, Error, Fields, Ident, LitStr, Path, Result, Type};

/// Validate table name and return syn::Error for better proc macro error handling
pub fn validate_table_name_syn(name: &str, span: proc_macro2::Span) -> Result<()> {
    validate_identifier(name)
        .map_err(|e| Error::new(span, format!("Invalid table name '{}': {}", name, e)))
}

/// Validate column name and return syn::Error for better proc macro error handling
pub fn validate_column_name_syn(name: &str, span: proc_macro2::Span) -> Result<()> {
    validate_identifier(name)
        .map_err(|e| Error::new(span, format!("Invalid column name '{}': {}", name, e)))
}

/// Mirrors mapping_core::validation so compile-time and runtime checks agree.
/// Keywords are accepted since generated SQL quotes every identifier.
fn validate_identifier(name: &str) -> std::result::Result<(), String> {
    if name.is_empty() {
        return Err("Name cannot be empty".to_string());
    }

    if name.len() > 63 {
        return Err(format!(
            "Name '{}' is too long: {} characters (max 63)",
            name,
            name.len()
        ));
    }

    let first_char = name
        .chars()
        .next()
        .ok_or_else(|| "Name cannot be empty".to_string())?;
    if !first_char.is_ascii_alphabetic() && first_char != '_' {
        return Err(format!(
            "Name '{}' must start with a letter or underscore",
            name
        ));
    }

    if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(format!("Name '{}' contains invalid characters: only alphanumeric characters and underscores are allowed", name));
    }

    Ok(())
}

#[derive(Debug, Default)]
pub struct TableInfo {
    /// Explicit table name; the struct name is used otherwise
    pub name: Option<String>,
}

pub struct FieldInfo {
    pub ident: Ident,
    pub column: String,
    pub ty: Type,
    pub unique: bool,
    pub references: Option<Path>,
}

pub struct EntityFields {
    pub fields: Vec<FieldInfo>,
    pub primary_key: Option<String>,
}

pub fn parse_table_attributes(attrs: &[Attribute]) -> Result<TableInfo> {
    let mut info = TableInfo::default();

    for attr in attrs {
        if attr.path().is_ident("table") {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("name") {
                    let value: LitStr = meta.value()?.parse()?;
                    validate_table_name_syn(&value.value(), value.span())?;
                    info.name = Some(value.value());
                    Ok(())
                } else {
                    Err(meta.error("unsupported table attribute, expected `name = \"..\"`"))
                }
            })?;
        }
    }

    Ok(info)
}

pub fn parse_field_attributes(data: &Data) -> Result<EntityFields> {
    let Data::Struct(data_struct) = data else {
        return Err(Error::new(
            proc_macro2::Span::call_site(),
            "Entity can only be derived for structs with named fields",
        ));
    };
    let Fields::Named(fields_named) = &data_struct.fields else {
        return Err(Error::new(
            proc_macro2::Span::call_site(),
            "Entity can only be derived for structs with named fields",
        ));
    };

    let mut fields = Vec::new();
    let mut primary_key: Option<String> = None;

    for field in &fields_named.named {
        let ident = field
            .ident
            .as_ref()
            .ok_or_else(|| Error::new_spanned(field, "Field must have a name"))?;

        let column = match parse_column_name(&field.attrs)? {
            Some(lit) => {
                validate_column_name_syn(&lit.value(), lit.span())?;
                lit.value()
            }
            None => {
                let name = ident.to_string();
                validate_column_name_syn(&name, ident.span())?;
                name
            }
        };

        if has_attribute(&field.attrs, "primary_key") {
            if let Some(existing) = &primary_key {
                return Err(Error::new_spanned(
                    ident,
                    format!("Entity already has primary key '{}'", existing),
                ));
            }
            primary_key = Some(column.clone());
        }

        let references = match field.attrs.iter().find(|a| a.path().is_ident("foreign_key")) {
            Some(attr) => Some(attr.parse_args::<Path>()?),
            None => None,
        };
        if references.is_some() && primary_key.as_deref() == Some(column.as_str()) {
            return Err(Error::new_spanned(
                ident,
                "A primary key cannot also be a foreign key",
            ));
        }

        fields.push(FieldInfo {
            ident: ident.clone(),
            column,
            ty: field.ty.clone(),
            unique: has_attribute(&field.attrs, "unique"),
            references,
        });
    }

    Ok(EntityFields {
        fields,
        primary_key,
    })
}

fn parse_column_name(attrs: &[Attribute]) -> Result<Option<LitStr>> {
    let mut name = None;
    for attr in attrs {
        if attr.path().is_ident("column") {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("name") {
                    name = Some(meta.value()?.parse::<LitStr>()?);
                    Ok(())
                } else {
                    Err(meta.error("unsupported column attribute, expected `name = \"..\"`"))
                }
            })?;
        }
    }
    Ok(name)
}

pub fn has_attribute(attrs: &[Attribute], name: &str) -> bool {
    attrs.iter().any(|attr| attr.path().is_ident(name))
}

#[cfg(test)]
mod validation_tests {
    use super::*;
    use syn::{parse_quote, DeriveInput};

    // Helper functions for tests - these call the _syn versions but panic on error
    fn validate_table_name(name: &str) {
        if let Err(e) = validate_table_name_syn(name, proc_macro2::Span::call_site()) {
            panic!("Invalid table name: {}", e);
        }
    }

    fn validate_column_name(name: &str) {
        if let Err(e) = validate_column_name_syn(name, proc_macro2::Span::call_site()) {
            panic!("Invalid column name: {}", e);
        }
    }

    #[test]
    fn test_valid_table_names() {
        validate_table_name("artists");
        validate_table_name("album_tracks");
        validate_table_name("_private");
        validate_table_name("table123");
        validate_table_name("a");
    }

    #[test]
    fn test_keywords_are_valid_names() {
        validate_table_name("order");
        validate_table_name("SELECT");
        validate_column_name("end");
        validate_column_name("from");
        validate_column_name("default");
    }

    #[test]
    #[should_panic(expected = "Invalid table name")]
    fn test_invalid_start() {
        validate_table_name("123table");
    }

    #[test]
    #[should_panic(expected = "Invalid table name")]
    fn test_invalid_chars() {
        validate_table_name("artist-table");
    }

    #[test]
    #[should_panic(expected = "Invalid table name")]
    fn test_empty_name() {
        validate_table_name("");
    }

    #[test]
    fn test_column_validation() {
        validate_column_name("id");
        validate_column_name("artist_id");
        validate_column_name("name");
        validate_column_name("date");
    }

    #[test]
    #[should_panic(expected = "Invalid column name")]
    fn test_invalid_column() {
        validate_column_name("release year");
    }

    #[test]
    fn test_sql_injection_prevention() {
        let malicious_names = [
            "artists; DROP TABLE artists; --",
            "artists' OR '1'='1",
            "artists/**/UNION/**/SELECT",
            "artists\"; DELETE FROM artists; --",
        ];

        for name in malicious_names {
            let result = std::panic::catch_unwind(|| {
                validate_table_name(name);
            });
            assert!(result.is_err(), "Should panic for malicious name: {}", name);
        }
    }

    #[test]
    fn test_parse_entity_attributes() {
        let input: DeriveInput = parse_quote! {
            #[table(name = "albums")]
            struct Album {
                #[primary_key]
                id: Option<i32>,
                #[foreign_key(Artist)]
                artist_id: i32,
                #[unique]
                #[column(name = "album_title")]
                title: String,
            }
        };

        let table = parse_table_attributes(&input.attrs).unwrap();
        assert_eq!(table.name.as_deref(), Some("albums"));

        let entity = parse_field_attributes(&input.data).unwrap();
        assert_eq!(entity.primary_key.as_deref(), Some("id"));
        let columns: Vec<_> = entity.fields.iter().map(|f| f.column.as_str()).collect();
        assert_eq!(columns, ["id", "artist_id", "album_title"]);
        assert!(entity.fields[1].references.is_some());
        assert!(entity.fields[2].unique);
        assert_eq!(entity.fields[2].ident, "title");
    }

    #[test]
    fn test_second_primary_key_rejected() {
        let input: DeriveInput = parse_quote! {
            struct Twice {
                #[primary_key]
                a: i32,
                #[primary_key]
                b: i32,
            }
        };
        let Err(err) = parse_field_attributes(&input.data) else {
            panic!("second primary key accepted");
        };
        assert!(err.to_string().contains("already has primary key"));
    }

    #[test]
    fn test_invalid_column_rename_rejected() {
        let input: DeriveInput = parse_quote! {
            struct Bad {
                #[column(name = "release-year")]
                a: i32,
            }
        };
        assert!(parse_field_attributes(&input.data).is_err());
    }

    #[test]
    fn test_keyword_field_names_accepted() {
        let input: DeriveInput = parse_quote! {
            struct Shift {
                #[primary_key]
                id: i64,
                start: i64,
                end: i64,
                #[column(name = "default")]
                fallback: bool,
            }
        };
        let Ok(parsed) = parse_field_attributes(&input.data) else {
            panic!("keyword column names rejected");
        };
        let columns: Vec<_> = parsed.fields.iter().map(|f| f.column.as_str()).collect();
        assert_eq!(columns, ["id", "start", "end", "default"]);
    }

    #[test]
    fn test_primary_key_cannot_reference() {
        let input: DeriveInput = parse_quote! {
            struct Profile {
                #[primary_key]
                #[foreign_key(Artist)]
                artist_id: i32,
            }
        };
        let Err(err) = parse_field_attributes(&input.data) else {
            panic!("referencing primary key accepted");
        };
        assert!(err.to_string().contains("cannot also be a foreign key"));
    }

    #[test]
    fn test_tuple_struct_rejected() {
        let input: DeriveInput = parse_quote! {
            struct Pair(i32, i32);
        };
        assert!(parse_field_attributes(&input.data).is_err());
    }
}
