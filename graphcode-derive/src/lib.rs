//! # Graphcode Derive Macros
//!
//! This crate provides the procedural macro for `graphcode`. It generates the field
//! descriptor table and accessors (`GraphObject`) and the `Encode`/`Decode` impls
//! that route a struct through the object graph walker.
//!
//! Compatible with `syn 2.0`.

use proc_macro::TokenStream;
use quote::quote;
use syn::{Attribute, Data, DeriveInput, Fields, LitStr, parse_macro_input, parse_quote};

/// Field identifiers are a single byte and `0` is the terminator.
const MAX_FIELDS: usize = 255;

/// Derives `GraphObject`, `Encode` and `Decode`.
///
/// Supported field attributes:
/// * `#[graphcode(skip)]`: the field is not persisted and decodes as `Default`.
/// * `#[graphcode(rename = "name")]`: the field's wire name.
#[proc_macro_derive(GraphObject, attributes(graphcode))]
pub fn derive_graph_object(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand(input) {
        Ok(tokens) => tokens.into(),
        Err(e) => e.to_compile_error().into(),
    }
}

// --- Internal Data Structures ---
struct PersistedField {
    ident: syn::Ident,
    wire_name: String,
}

fn expand(mut input: DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let name = input.ident.clone();

    let data_struct = match &input.data {
        Data::Struct(ds) => ds,
        _ => {
            return Err(syn::Error::new(
                name.span(),
                "GraphObject only supports structs with named fields",
            ));
        }
    };

    let named = match &data_struct.fields {
        Fields::Named(named) => named.named.iter().collect::<Vec<_>>(),
        Fields::Unit => Vec::new(),
        Fields::Unnamed(_) => {
            return Err(syn::Error::new(
                name.span(),
                "GraphObject does not support tuple structs",
            ));
        }
    };

    let mut fields: Vec<PersistedField> = Vec::new();
    for field in named {
        let Some(ident) = field.ident.clone() else {
            continue;
        };
        let attrs = parse_attributes(&field.attrs)?;
        if attrs.skip {
            continue;
        }
        let wire_name = attrs.rename.unwrap_or_else(|| unraw(&ident));
        if fields.iter().any(|f| f.wire_name == wire_name) {
            return Err(syn::Error::new(
                ident.span(),
                format!("duplicate wire name '{wire_name}'"),
            ));
        }
        fields.push(PersistedField { ident, wire_name });
    }

    if fields.len() > MAX_FIELDS {
        return Err(syn::Error::new(
            name.span(),
            format!(
                "GraphObject supports at most {MAX_FIELDS} persisted fields, found {}",
                fields.len()
            ),
        ));
    }

    // Every type parameter travels through the walker itself.
    let type_params: Vec<syn::Ident> = input
        .generics
        .type_params()
        .map(|p| p.ident.clone())
        .collect();
    let self_ty = {
        let (_, ty_generics, _) = input.generics.split_for_impl();
        quote! { #name #ty_generics }
    };
    let where_clause = input.generics.make_where_clause();
    for param in &type_params {
        where_clause.predicates.push(parse_quote! {
            #param: graphcode::Encode + graphcode::Decode + 'static
        });
    }
    if !type_params.is_empty() {
        where_clause
            .predicates
            .push(parse_quote! { #self_ty: ::core::default::Default });
    }

    let impl_object = generate_graph_object(&name, &input.generics, &fields);
    let impl_codec = generate_codec(&name, &input.generics);

    Ok(quote! {
        #impl_object
        #impl_codec
    })
}

struct FieldAttributes {
    skip: bool,
    rename: Option<String>,
}

/// Parses `#[graphcode(...)]` attributes on a field.
fn parse_attributes(attrs: &[Attribute]) -> syn::Result<FieldAttributes> {
    let mut parsed = FieldAttributes {
        skip: false,
        rename: None,
    };

    for attr in attrs {
        if attr.path().is_ident("graphcode") {
            attr.parse_nested_meta(|meta| {
                if meta.path.is_ident("skip") {
                    parsed.skip = true;
                    return Ok(());
                }

                if meta.path.is_ident("rename") {
                    let value = meta.value()?;
                    let s: LitStr = value.parse()?;
                    if s.value().is_empty() {
                        return Err(meta.error("wire name must not be empty"));
                    }
                    parsed.rename = Some(s.value());
                    return Ok(());
                }
                Err(meta.error("Unknown graphcode attribute key. Supported: skip, rename"))
            })?;
        }
    }
    Ok(parsed)
}

/// Strips the `r#` prefix of raw identifiers.
fn unraw(ident: &syn::Ident) -> String {
    let s = ident.to_string();
    s.strip_prefix("r#").map(str::to_owned).unwrap_or(s)
}

// --- Generator: GraphObject ---

fn generate_graph_object(
    name: &syn::Ident,
    generics: &syn::Generics,
    fields: &[PersistedField],
) -> proc_macro2::TokenStream {
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    let wire_names = fields.iter().map(|f| &f.wire_name);

    let encode_stmts = fields.iter().enumerate().map(|(index, f)| {
        let fname = &f.ident;
        quote! { fields.field(#index, &self.#fname)?; }
    });

    let decode_arms = fields.iter().enumerate().map(|(index, f)| {
        let fname = &f.ident;
        quote! {
            #index => {
                self.#fname = graphcode::Decode::decode_present(decoder)?;
            }
        }
    });

    quote! {
        impl #impl_generics graphcode::GraphObject for #name #ty_generics #where_clause {
            const TYPE_NAME: &'static str = stringify!(#name);
            const FIELDS: &'static [&'static str] = &[#(#wire_names),*];

            fn encode_fields<__W: std::io::Write + Send + 'static>(
                &self,
                fields: &mut graphcode::rt::FieldEncoder<'_, __W>,
            ) -> graphcode::Result<()> {
                let _ = &fields;
                #(#encode_stmts)*
                Ok(())
            }

            #[allow(unreachable_code)]
            fn decode_field<__R: std::io::Read>(
                &mut self,
                index: usize,
                decoder: &mut graphcode::rt::Decoder<__R>,
            ) -> graphcode::Result<()> {
                let _ = &decoder;
                match index {
                    #(#decode_arms)*
                    _ => {
                        return Err(graphcode::rt::unknown_local_field(
                            <Self as graphcode::GraphObject>::TYPE_NAME,
                            index,
                        ));
                    }
                }
                Ok(())
            }
        }
    }
}

// --- Generator: Encode / Decode ---

fn generate_codec(name: &syn::Ident, generics: &syn::Generics) -> proc_macro2::TokenStream {
    let (impl_generics, ty_generics, where_clause) = generics.split_for_impl();

    quote! {
        impl #impl_generics graphcode::Encode for #name #ty_generics #where_clause {
            fn encode<__W: std::io::Write + Send + 'static>(
                &self,
                encoder: &mut graphcode::rt::Encoder<__W>,
            ) -> graphcode::Result<()> {
                encoder.encode_object(self)
            }
        }

        impl #impl_generics graphcode::Decode for #name #ty_generics #where_clause {
            fn decode<__R: std::io::Read>(
                decoder: &mut graphcode::rt::Decoder<__R>,
            ) -> graphcode::Result<Self> {
                decoder.decode_object::<Self>()
            }
        }
    }
}
