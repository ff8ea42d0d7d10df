use syn::ext::IdentExt;

const OPERATORS: &[(&str, &str)] = &[
    ("eq", "Eq"),
    ("ne", "Ne"),
    ("like", "Like"),
    ("not_like", "NotLike"),
    ("starts_with", "StartsWith"),
    ("ends_with", "EndsWith"),
    ("gt", "Gt"),
    ("gte", "Gte"),
    ("lt", "Lt"),
    ("lte", "Lte"),
    ("in", "In"),
    ("not_in", "NotIn"),
    ("null", "Null"),
    ("not_null", "NotNull"),
    ("between", "Between"),
    ("not_between", "NotBetween"),
];

/// An operator named in an attribute, resolved to its variant of
/// `query_lens::Operator`.
#[derive(Debug, Clone)]
pub struct LensOperator {
    pub variant: syn::Ident,
}

impl PartialEq for LensOperator {
    fn eq(&self, other: &Self) -> bool {
        self.variant == other.variant
    }
}

impl syn::parse::Parse for LensOperator {
    fn parse(input: syn::parse::ParseStream<'_>) -> syn::Result<Self> {
        // `in` is a keyword, so accept any identifier
        let op = input.call(syn::Ident::parse_any)?;
        let name = op.to_string();
        match OPERATORS.iter().find(|(token, _)| *token == name) {
            Some((_, variant)) => Ok(LensOperator {
                variant: syn::Ident::new(variant, op.span()),
            }),
            None => Err(syn::Error::new_spanned(op, "unknown filter operator")),
        }
    }
}

impl quote::ToTokens for LensOperator {
    fn to_tokens(&self, tokens: &mut proc_macro2::TokenStream) {
        let variant = &self.variant;
        tokens.extend(quote::quote! { ::query_lens::Operator::#variant });
    }
}

#[derive(Debug)]
pub enum LensItem {
    Rename(syn::LitStr),
    Operators(Vec<LensOperator>),
    DefaultOperator(LensOperator),
    Ignored,
    Sort,
}

impl syn::parse::Parse for LensItem {
    fn parse(input: syn::parse::ParseStream<'_>) -> syn::Result<Self> {
        let attr: syn::Ident = input.parse()?;
        match attr.to_string().as_str() {
            "rename" => {
                // rename = "MyString"
                let _: syn::Token![=] = input.parse()?;
                let new_name: syn::LitStr = input.parse()?;
                Ok(LensItem::Rename(new_name))
            }
            "default_op" => {
                let _: syn::Token![=] = input.parse()?;
                let op = input.parse()?;
                Ok(LensItem::DefaultOperator(op))
            }
            "exclude" => Ok(LensItem::Ignored),
            "op" => {
                // op(in, starts_with)
                let content;
                let _: syn::token::Paren = syn::parenthesized!(content in input);
                let punc =
                    syn::punctuated::Punctuated::<LensOperator, syn::Token![,]>::parse_terminated(
                        &content,
                    )?;
                Ok(LensItem::Operators(punc.into_iter().collect()))
            }
            "sort" => Ok(LensItem::Sort),
            _ => Err(syn::Error::new_spanned(attr, "unsupported lens attribute")),
        }
    }
}

#[derive(Debug)]
pub enum LensFiltering {
    Included {
        default_operator: Option<LensOperator>,
        operators: Vec<LensOperator>,
    },
    Excluded,
}

#[derive(Debug)]
pub struct LensMeta {
    pub name: Option<syn::LitStr>,
    pub filtering: LensFiltering,
    pub sort: bool,
}

impl Default for LensMeta {
    fn default() -> Self {
        Self {
            name: None,
            filtering: LensFiltering::Included {
                default_operator: None,
                operators: Vec::new(),
            },
            sort: false,
        }
    }
}

impl LensMeta {
    pub fn excluded(&self) -> bool {
        matches!(self.filtering, LensFiltering::Excluded)
    }
}

impl syn::parse::Parse for LensMeta {
    fn parse(input: syn::parse::ParseStream<'_>) -> syn::Result<Self> {
        let mut field_name = None;
        let mut operators: Vec<LensOperator> = Vec::new();
        let mut defop = None;
        let mut excluded = false;
        let mut sort = false;
        let punc = syn::punctuated::Punctuated::<LensItem, syn::Token![,]>::parse_terminated(input)?;

        for item in punc {
            match item {
                LensItem::Rename(new_name) => {
                    field_name = Some(new_name);
                }
                LensItem::Operators(ops) => {
                    for op in ops {
                        if !operators.contains(&op) {
                            operators.push(op);
                        }
                    }
                }
                LensItem::DefaultOperator(op) => {
                    defop = Some(op);
                }
                LensItem::Ignored => {
                    excluded = true;
                }
                LensItem::Sort => sort = true,
            }
        }
        let filtering = if excluded {
            LensFiltering::Excluded
        } else {
            LensFiltering::Included {
                default_operator: defop,
                operators,
            }
        };

        Ok(Self {
            filtering,
            sort: sort && !excluded,
            name: field_name,
        })
    }
}

/// Read the `lens` attributes of a field. Later attributes override
/// earlier ones.
pub fn field_meta(field: &syn::Field) -> syn::Result<LensMeta> {
    let mut meta = LensMeta::default();
    for attr in field.attrs.iter() {
        if attr.path.is_ident("lens") {
            let parsed = attr.parse_args::<LensMeta>()?;
            if parsed.name.is_some() {
                meta.name = parsed.name;
            }
            meta.sort |= parsed.sort;
            meta.filtering = match (meta.filtering, parsed.filtering) {
                (LensFiltering::Excluded, _) | (_, LensFiltering::Excluded) => {
                    LensFiltering::Excluded
                }
                (
                    LensFiltering::Included {
                        default_operator: d1,
                        operators: mut o1,
                    },
                    LensFiltering::Included {
                        default_operator: d2,
                        operators: o2,
                    },
                ) => {
                    for op in o2 {
                        if !o1.contains(&op) {
                            o1.push(op);
                        }
                    }
                    LensFiltering::Included {
                        default_operator: d2.or(d1),
                        operators: o1,
                    }
                }
            };
        }
    }
    if meta.excluded() {
        meta.sort = false;
    }
    Ok(meta)
}
