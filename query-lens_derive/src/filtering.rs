use proc_macro2 as pm2;

use crate::attributes::{field_meta, LensFiltering};

pub fn derive_filterable(input: syn::DeriveInput) -> pm2::TokenStream {
    let syn::DeriveInput {
        ident,
        data,
        generics,
        ..
    } = input;

    let mut configs = pm2::TokenStream::new();
    let mut sorts = pm2::TokenStream::new();

    let (generics, ty_generics, wc) = generics.split_for_impl();

    let named = match data {
        syn::Data::Struct(syn::DataStruct {
            fields: syn::Fields::Named(syn::FieldsNamed { named, .. }),
            ..
        }) => named,
        _ => {
            return syn::Error::new(
                ident.span(),
                "Filterable can only be derived for structs with named fields.",
            )
            .to_compile_error();
        }
    };

    for field in named.iter() {
        let fieldid = match field.ident.as_ref() {
            Some(fieldid) => fieldid,
            None => continue,
        };
        let meta = match field_meta(field) {
            Ok(meta) => meta,
            Err(e) => return syn::Error::into_compile_error(e),
        };
        let fieldname = meta
            .name
            .clone()
            .unwrap_or_else(|| syn::LitStr::new(&fieldid.to_string(), fieldid.span()));

        if meta.sort {
            sorts.extend(quote::quote! {
                ::std::string::String::from(#fieldname),
            });
        }

        if let LensFiltering::Included {
            default_operator,
            mut operators,
        } = meta.filtering
        {
            // The default operator always comes first.
            if let Some(default_operator) = default_operator {
                operators.retain(|op| *op != default_operator);
                operators.insert(0, default_operator);
            }
            configs.extend(quote::quote! {
                ::query_lens::FieldConfig::new(#fieldname, ::std::vec![#(#operators),*]),
            });
        }
    }

    quote::quote! {
        const _: () = {
            #[automatically_derived]
            impl #generics ::query_lens::Filterable for #ident #ty_generics #wc {
                fn field_configs() -> ::std::vec::Vec<::query_lens::FieldConfig> {
                    ::std::vec![#configs]
                }
                fn sort_fields() -> ::std::vec::Vec<::std::string::String> {
                    ::std::vec![#sorts]
                }
            }
        };
    }
}
