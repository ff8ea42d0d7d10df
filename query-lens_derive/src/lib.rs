use proc_macro::{self, TokenStream};

use proc_macro2 as pm2;

mod attributes;
mod filtering;
mod row;

/// Derive the `Filterable` trait, listing which fields may be
/// filtered and sorted on.
///
/// This is only implemented for structs with named fields. All fields
/// can be filtered on, with only the `eq` operator, unless annotated
/// to indicate otherwise. No fields can be sorted on unless
/// annotated. The annotations use the `lens` attribute, which has the
/// following options:
///
/// - `#[lens(rename="new_name")]` Expose the annotated member as
///   `new_name` instead of using its name in the source code.
///
/// - `#[lens(op(in, starts_with))]` This field can be filtered with
///   `in` and `starts-with`. Operators are written with underscores
///   in place of hyphens. The first one listed is the default.
///
/// - `#[lens(default_op=like)]` Make `like` the default operator for
///   this field. It is allowed even if not listed in `op(...)`.
///
/// - `#[lens(sort)]` The field can appear in a sort expression.
///
/// - `#[lens(exclude)]` Do not expose this field at all.
#[proc_macro_derive(Filterable, attributes(lens))]
pub fn filterable(input: TokenStream) -> TokenStream {
    let derive: syn::DeriveInput = syn::parse_macro_input!(input);

    let res: pm2::TokenStream = filtering::derive_filterable(derive);

    res.into()
}

/// Derive the `IntoRow` trait, so values can be loaded into an
/// in-memory query.
///
/// This is only implemented for structs with named fields. All fields
/// will be included in the output by default, which means they must
/// have types which implement `IntoCellValue`. The annotations for
/// this derive macro use the `lens` attribute, which has the
/// following significant options here:
///
/// - `#[lens(rename="new_name")]` Expose the annotated member in
///    the output as `new_name` instead of using its name in the
///    source code.
///
/// - `#[lens(exclude)]` Do not include the annotated member in any
///   output.
#[proc_macro_derive(IntoRow, attributes(lens))]
pub fn into_row(input: TokenStream) -> TokenStream {
    let derive: syn::DeriveInput = syn::parse_macro_input!(input);

    let res: pm2::TokenStream = row::derive_into_row(derive);

    res.into()
}
