use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, Data, DeriveInput, Error};

/// Convenience attribute macro that adds the derives every entity needs
///
/// Usage:
/// ```rust,ignore
/// use tablemap::prelude::*;
///
/// #[entity]
/// #[table(name = "artists")]
/// pub struct Artist {
///     #[primary_key]
///     pub id: Option<i32>,
///     pub name: String,
/// }
/// ```
pub fn entity_attribute(_attr: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as DeriveInput);

    let name = &input.ident;
    let attrs = &input.attrs;
    let vis = &input.vis;
    let generics = &input.generics;

    let fields = match &input.data {
        Data::Struct(data) => &data.fields,
        _ => {
            return Error::new_spanned(name, "entity can only be used on structs")
                .to_compile_error()
                .into()
        }
    };

    let expanded = quote! {
        #[derive(Debug, Clone, Entity)]
        #(#attrs)*
        #vis struct #name #generics #fields
    };

    TokenStream::from(expanded)
}
