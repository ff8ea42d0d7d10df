use proc_macro2 as pm2;

use crate::attributes::field_meta;

pub fn derive_into_row(input: syn::DeriveInput) -> pm2::TokenStream {
    let syn::DeriveInput {
        ident,
        data,
        generics,
        ..
    } = input;

    let mut cells = pm2::TokenStream::new();
    let mut cols = pm2::TokenStream::new();

    let (generics, ty_generics, wc) = generics.split_for_impl();

    let named = match data {
        syn::Data::Struct(syn::DataStruct {
            fields: syn::Fields::Named(syn::FieldsNamed { named, .. }),
            ..
        }) => named,
        _ => {
            return syn::Error::new(
                ident.span(),
                "IntoRow can only be derived for structs with named fields.",
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
        if meta.excluded() {
            continue;
        }
        let fieldname = meta
            .name
            .unwrap_or_else(|| syn::LitStr::new(&fieldid.to_string(), fieldid.span()));
        let fieldtype = &field.ty;

        cells.extend(quote::quote! {
            visitor.visit_value(#fieldname, <#fieldtype as ::query_lens::row::IntoCellValue>::to_cell_value(&self.#fieldid));
        });
        cols.extend(quote::quote! {
            visitor.visit_column(#fieldname);
        });
    }

    quote::quote! {
        const _: () = {
            #[automatically_derived]
            impl #generics ::query_lens::IntoRow for #ident #ty_generics #wc {
                fn accept_cell_visitor<V: ::query_lens::row::CellVisitor>(&self, visitor: &mut V)
                {
                    #cells
                }
                fn accept_column_visitor<V: ::query_lens::row::ColumnVisitor>(visitor: &mut V)
                {
                    #cols
                }
            }
        };
    }
}
