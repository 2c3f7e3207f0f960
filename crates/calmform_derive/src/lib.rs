use proc_macro::TokenStream;
use proc_macro2::{Ident, Span, TokenStream as TokenStream2};
use proc_macro_crate::{FoundCrate, crate_name};
use quote::{format_ident, quote};
use syn::{Data, DeriveInput, Fields, parse_macro_input};

/// Derives `calmform::form::FormModel` for a struct of named `String` fields.
///
/// Every field becomes a form field keyed by its name. The derive also emits a
/// zero-sized `<Model>Fields` accessor and one `<Model><Field>Lens` per field.
#[proc_macro_derive(FormModel)]
pub fn derive_form_model(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);

    if !input.generics.params.is_empty() {
        return syn::Error::new_spanned(
            input.ident,
            "FormModel derive currently supports only non-generic structs",
        )
        .to_compile_error()
        .into();
    }

    let model_ident = input.ident;
    let fields_struct_ident = format_ident!("{model_ident}Fields");

    let named_fields = match input.data {
        Data::Struct(data) => match data.fields {
            Fields::Named(fields) => fields.named,
            _ => {
                return syn::Error::new(
                    Span::call_site(),
                    "FormModel derive requires a struct with named fields",
                )
                .to_compile_error()
                .into();
            }
        },
        _ => {
            return syn::Error::new(
                Span::call_site(),
                "FormModel derive is only supported on structs",
            )
            .to_compile_error()
            .into();
        }
    };

    let calmform = calmform_path();
    let mut lens_defs = Vec::new();
    let mut fields_methods = Vec::new();
    let mut key_literals = Vec::new();
    let mut blank_inits = Vec::new();
    let mut value_arms = Vec::new();
    let mut value_mut_arms = Vec::new();

    for field in named_fields {
        let Some(field_ident) = field.ident else {
            continue;
        };
        let raw_name = field_ident.to_string();
        let field_name = raw_name.trim_start_matches("r#").to_string();
        let lens_ident = format_ident!("{model_ident}{}Lens", to_pascal_case(&field_name));

        lens_defs.push(quote! {
            #[derive(Clone, Copy, Debug, Default)]
            pub struct #lens_ident;

            impl #calmform::form::FieldLens<#model_ident> for #lens_ident {
                fn key(self) -> #calmform::form::FieldKey {
                    #calmform::form::FieldKey::new(#field_name)
                }

                fn get<'a>(self, model: &'a #model_ident) -> &'a str {
                    model.#field_ident.as_str()
                }

                fn set(self, model: &mut #model_ident, value: ::std::string::String) {
                    model.#field_ident = value;
                }
            }

            impl ::std::convert::From<#lens_ident> for #calmform::form::FieldKey {
                fn from(_: #lens_ident) -> Self {
                    #calmform::form::FieldKey::new(#field_name)
                }
            }
        });

        fields_methods.push(quote! {
            pub const fn #field_ident(&self) -> #lens_ident {
                #lens_ident
            }
        });

        key_literals.push(quote! { #calmform::form::FieldKey::new(#field_name) });
        blank_inits.push(quote! { #field_ident: ::std::string::String::new() });
        value_arms.push(quote! { #field_name => Some(self.#field_ident.as_str()) });
        value_mut_arms.push(quote! { #field_name => Some(&mut self.#field_ident) });
    }

    quote! {
        #[derive(Clone, Copy, Debug, Default)]
        pub struct #fields_struct_ident;

        impl #fields_struct_ident {
            #(#fields_methods)*
        }

        impl #calmform::form::FormModel for #model_ident {
            type Fields = #fields_struct_ident;

            fn fields() -> Self::Fields {
                #fields_struct_ident
            }

            fn field_keys() -> &'static [#calmform::form::FieldKey] {
                const KEYS: &[#calmform::form::FieldKey] = &[#(#key_literals),*];
                KEYS
            }

            fn blank() -> Self {
                Self {
                    #(#blank_inits),*
                }
            }

            fn value(&self, key: #calmform::form::FieldKey) -> ::std::option::Option<&str> {
                match key.as_str() {
                    #(#value_arms,)*
                    _ => None,
                }
            }

            fn value_mut(
                &mut self,
                key: #calmform::form::FieldKey,
            ) -> ::std::option::Option<&mut ::std::string::String> {
                match key.as_str() {
                    #(#value_mut_arms,)*
                    _ => None,
                }
            }
        }

        #(#lens_defs)*
    }
    .into()
}

fn calmform_path() -> TokenStream2 {
    match crate_name("calmform") {
        Ok(FoundCrate::Name(name)) => {
            let ident = Ident::new(&name, Span::call_site());
            quote!(::#ident)
        }
        Ok(FoundCrate::Itself) | Err(_) => quote!(::calmform),
    }
}

fn to_pascal_case(input: &str) -> String {
    let mut out = String::new();
    for segment in input.split('_') {
        if segment.is_empty() {
            continue;
        }
        let mut chars = segment.chars();
        if let Some(first) = chars.next() {
            out.push(first.to_ascii_uppercase());
            out.push_str(chars.as_str());
        }
    }
    out
}
