//! Code generation for `Entity` implementations
//!
//! Generated code names `mapping_core` by path, so the using crate must have it in scope,
//! either as a dependency or through `tablemap::prelude`.

use proc_macro2::TokenStream;
use quote::quote;
use syn::Ident;

use crate::parsing::{EntityFields, FieldInfo, TableInfo};

fn generate_property(name: &Ident, field: &FieldInfo) -> TokenStream {
    let ident = &field.ident;
    let column = &field.column;
    let ty = &field.ty;

    let unique = field.unique.then(|| quote! { .unique() });
    let references = field
        .references
        .as_ref()
        .map(|path| quote! { .references::<#path>() });

    quote! {
        mapping_core::entity::Property::of::<#ty>(
            #column,
            |entity: &#name| mapping_core::type_mapping::ToValue::to_value(&entity.#ident),
        )
        #unique
        #references
    }
}

pub fn generate_entity_impl(
    name: &Ident,
    table_info: &TableInfo,
    entity_fields: &EntityFields,
) -> TokenStream {
    let entity_name = name.to_string();
    let properties: Vec<_> = entity_fields
        .fields
        .iter()
        .map(|field| generate_property(name, field))
        .collect();

    let primary_key = match &entity_fields.primary_key {
        Some(pk) => quote! { ::std::option::Option::Some(#pk) },
        None => quote! { ::std::option::Option::None },
    };
    let table_name = match &table_info.name {
        Some(table) => quote! { ::std::option::Option::Some(#table) },
        None => quote! { ::std::option::Option::None },
    };

    quote! {
        impl mapping_core::entity::Entity for #name {
            fn entity_name() -> &'static str {
                #entity_name
            }

            fn properties() -> ::std::vec::Vec<mapping_core::entity::Property<Self>> {
                ::std::vec![#(#properties),*]
            }

            fn primary_key() -> ::std::option::Option<&'static str> {
                #primary_key
            }

            fn table_name() -> ::std::option::Option<&'static str> {
                #table_name
            }
        }
    }
}
