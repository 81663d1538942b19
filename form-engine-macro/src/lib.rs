//! Procedural macro for deriving `FormRecord` implementations.
//!
//! This crate provides the `#[derive(FormRecord)]` macro which generates:
//! - `FormRecord` trait implementation (record <-> `FormData`)
//! - `IntoFieldValue` / `FromFieldValue`, so records nest as repeater items
//! - A `<Type>Field` enum naming every field, for typed field configuration

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::{Attribute, Data, DeriveInput, Fields, Ident, LitStr, Meta, parse_macro_input};

/// Derive the `FormRecord` trait for a struct with named fields.
///
/// # Attributes
///
/// ## On fields
/// - `#[rename("...")]` - Key used in the form data (defaults to the field name)
/// - `#[skip]` - Not part of the form; filled with `Default::default()` when read back
#[proc_macro_derive(FormRecord, attributes(rename, skip))]
pub fn derive_form_record(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    implement_form_record(&input)
        .unwrap_or_else(|err| err.to_compile_error())
        .into()
}

fn implement_form_record(input: &DeriveInput) -> syn::Result<TokenStream2> {
    let name = &input.ident;
    let vis = &input.vis;
    let field_enum = format_ident!("{}Field", name);

    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "FormRecord cannot be derived for generic types",
        ));
    }

    let fields = record_fields(input)?;
    let keys: Vec<&String> = fields.iter().filter(|f| !f.skip).map(|f| &f.key).collect();
    let count = keys.len();

    let inserts = fields.iter().filter(|f| !f.skip).map(|f| {
        let ident = &f.ident;
        let key = &f.key;
        quote! {
            data.insert(
                #key,
                form_engine::IntoFieldValue::into_field_value(
                    ::core::clone::Clone::clone(&self.#ident),
                ),
            );
        }
    });

    let reads = fields.iter().map(|f| {
        let ident = &f.ident;
        let key = &f.key;
        if f.skip {
            quote! { #ident: ::core::default::Default::default() }
        } else {
            quote! { #ident: data.get_as(#key)? }
        }
    });

    let variants: Vec<Ident> = fields
        .iter()
        .filter(|f| !f.skip)
        .map(|f| format_ident!("{}", upper_camel_case(&f.key)))
        .collect();

    Ok(quote! {
        impl form_engine::FormRecord for #name {
            fn field_names() -> &'static [&'static str] {
                &[#(#keys),*]
            }

            fn to_form_data(&self) -> form_engine::FormData {
                let mut data = form_engine::FormData::new();
                #(#inserts)*
                data
            }

            fn from_form_data(
                data: &form_engine::FormData,
            ) -> ::core::result::Result<Self, form_engine::FieldValueError> {
                ::core::result::Result::Ok(Self {
                    #(#reads),*
                })
            }
        }

        impl form_engine::IntoFieldValue for #name {
            fn into_field_value(self) -> form_engine::FieldValue {
                form_engine::FieldValue::Record(form_engine::FormRecord::to_form_data(&self))
            }
        }

        impl form_engine::FromFieldValue for #name {
            fn from_field_value(
                value: &form_engine::FieldValue,
            ) -> ::core::result::Result<Self, form_engine::FieldValueError> {
                match value {
                    form_engine::FieldValue::Record(data) => {
                        <Self as form_engine::FormRecord>::from_form_data(data)
                    }
                    form_engine::FieldValue::Null => {
                        ::core::result::Result::Err(form_engine::FieldValueError::Missing)
                    }
                    other => ::core::result::Result::Err(form_engine::FieldValueError::TypeMismatch {
                        expected: "Record",
                        actual: other.type_name(),
                    }),
                }
            }
        }

        /// Field names of the record, usable wherever a field name is expected.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        #vis enum #field_enum {
            #(#variants),*
        }

        impl #field_enum {
            /// Every field, in declaration order.
            pub const ALL: [Self; #count] = [#(Self::#variants),*];

            /// The key of this field in the form data.
            pub fn as_str(self) -> &'static str {
                match self {
                    #(Self::#variants => #keys),*
                }
            }
        }

        impl ::core::convert::AsRef<str> for #field_enum {
            fn as_ref(&self) -> &str {
                self.as_str()
            }
        }

        impl ::core::convert::From<#field_enum> for ::std::string::String {
            fn from(field: #field_enum) -> Self {
                field.as_str().to_string()
            }
        }

        impl ::core::fmt::Display for #field_enum {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    })
}

// ============================================================================
// Attribute Extraction
// ============================================================================

struct RecordField {
    ident: Ident,
    key: String,
    skip: bool,
}

fn record_fields(input: &DeriveInput) -> syn::Result<Vec<RecordField>> {
    let Data::Struct(data) = &input.data else {
        return Err(syn::Error::new_spanned(
            input,
            "FormRecord can only be derived for structs",
        ));
    };

    let Fields::Named(fields) = &data.fields else {
        return Err(syn::Error::new_spanned(
            &data.fields,
            "FormRecord requires named fields",
        ));
    };

    let mut result = Vec::new();
    for field in &fields.named {
        let Some(ident) = field.ident.clone() else {
            continue;
        };
        let (rename, skip) = extract_field_attrs(&field.attrs)?;
        let key = rename.unwrap_or_else(|| ident.to_string().trim_start_matches("r#").to_string());
        result.push(RecordField { ident, key, skip });
    }
    Ok(result)
}

fn extract_field_attrs(attrs: &[Attribute]) -> syn::Result<(Option<String>, bool)> {
    let mut rename = None;
    let mut skip = false;

    for attr in attrs {
        if attr.path().is_ident("rename") {
            rename = Some(extract_string_attr(attr)?);
        } else if attr.path().is_ident("skip") {
            skip = true;
        }
    }

    Ok((rename, skip))
}

fn extract_string_attr(attr: &Attribute) -> syn::Result<String> {
    match &attr.meta {
        Meta::List(list) => {
            let lit: LitStr = list.parse_args()?;
            Ok(lit.value())
        }
        _ => Err(syn::Error::new_spanned(
            attr,
            "expected #[attr(\"string\")]",
        )),
    }
}

/// Convert a snake_case key to an UpperCamelCase variant name.
fn upper_camel_case(key: &str) -> String {
    key.split(|c: char| c == '_' || c == '-' || c == '.')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                None => String::new(),
                Some(first) => first.to_uppercase().chain(chars).collect(),
            }
        })
        .collect()
}
