//! Procedural macros for declaring mapped entities
//!
//! This crate provides the `Entity` derive and the `#[entity]` attribute macro, which
//! generate the property list a struct contributes to table, procedure and query metadata.

use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput, Error};

mod entity_generation;
mod model_macro;
mod parsing;

use entity_generation::generate_entity_impl;
use model_macro::entity_attribute;
use parsing::{parse_field_attributes, parse_table_attributes};

/// Derive macro for the `Entity` trait
///
/// Fields become properties in declaration order. The field type is the declared property
/// type; `Option<T>` declares a nullable property of type `T`.
///
/// ```rust,ignore
/// #[derive(Debug, Clone, Entity)]
/// #[table(name = "albums")]
/// pub struct Album {
///     #[primary_key]
///     pub id: Option<i32>,
///
///     #[foreign_key(Artist)]
///     pub artist_id: i32,
///
///     #[unique]
///     pub title: String,
///
///     #[column(name = "release_year")]
///     pub year: Option<i16>,
/// }
/// ```
#[proc_macro_derive(Entity, attributes(table, primary_key, unique, foreign_key, column))]
pub fn derive_entity(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    let name = &input.ident;

    if !input.generics.params.is_empty() {
        return Error::new_spanned(&input.generics, "Entity cannot be derived for generic structs")
            .to_compile_error()
            .into();
    }

    let table_info = match parse_table_attributes(&input.attrs) {
        Ok(info) => info,
        Err(e) => return e.to_compile_error().into(),
    };

    let entity_fields = match parse_field_attributes(&input.data) {
        Ok(fields) => fields,
        Err(e) => return e.to_compile_error().into(),
    };

    TokenStream::from(generate_entity_impl(name, &table_info, &entity_fields))
}

/// Convenience attribute macro that adds `Debug`, `Clone` and `Entity` derives
///
/// Usage:
/// ```rust,ignore
/// #[entity]
/// #[table(name = "artists")]
/// pub struct Artist {
///     #[primary_key]
///     pub id: Option<i32>,
///     pub name: String,
/// }
/// ```
#[proc_macro_attribute]
pub fn entity(attr: TokenStream, item: TokenStream) -> TokenStream {
    entity_attribute(attr, item)
}
