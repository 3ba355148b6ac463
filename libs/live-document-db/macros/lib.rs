use proc_macro::TokenStream;
use quote::{format_ident, quote};
use syn::{parse_macro_input, Data, DeriveInput, Fields, Meta};

/// Derives the `Document` trait. The field marked `#[document(id)]` is the
/// document key: it is omitted from the serialized body and re-injected by
/// the store when a document is read back.
#[proc_macro_derive(Document, attributes(document))]
pub fn document_derive(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let name = &input.ident;

    let fields = match input.data {
        Data::Struct(data) => match data.fields {
            Fields::Named(fields) => fields.named,
            _ => unimplemented!(),
        },
        _ => unimplemented!(),
    };

    let mut id_field_name = None;
    let mut body_idents = Vec::new();
    let mut body_types = Vec::new();

    for field in fields.iter() {
        let id_attr = field
            .attrs
            .iter()
            .find(|a| a.path.is_ident("document") && a.tokens.to_string().contains("id"));

        match id_attr {
            None => {
                body_idents.push(field.ident.clone());
                body_types.push(field.ty.clone());
            }
            Some(attr) => {
                let meta = attr.parse_meta().unwrap();
                if let Meta::List(meta_list) = meta {
                    for nested_meta in meta_list.nested {
                        if let syn::NestedMeta::Meta(Meta::Path(word)) = nested_meta {
                            if word.is_ident("id") {
                                id_field_name.clone_from(&field.ident);
                                break;
                            }
                        }
                    }
                };
            }
        }
    }

    let id_field_name = id_field_name.unwrap_or_else(|| {
        panic!("Document derive requires one field marked with #[document(id)]")
    });

    // Shadow structs deriving serde keep the expansion small: the borrowed
    // one serializes the body without the id, the owned one deserializes it
    // back, and the id slot is filled in by the store afterwards.
    let ser_shadow = format_ident!("__{}SerBody", name);
    let de_shadow = format_ident!("__{}DeBody", name);

    let gen = quote! {
        const _: () = {
            #[derive(::serde_derive::Serialize)]
            #[doc(hidden)]
            struct #ser_shadow<'a> {
                #(#body_idents: &'a #body_types,)*
            }

            #[derive(::serde_derive::Deserialize)]
            #[doc(hidden)]
            struct #de_shadow {
                #(#body_idents: #body_types,)*
            }

            impl ::serde::Serialize for #name {
                fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
                where
                    S: ::serde::Serializer,
                {
                    let body = #ser_shadow {
                        #(#body_idents: &self.#body_idents,)*
                    };
                    ::serde::Serialize::serialize(&body, serializer)
                }
            }

            impl<'de> ::serde::Deserialize<'de> for #name {
                fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
                where
                    D: ::serde::Deserializer<'de>,
                {
                    let body = #de_shadow::deserialize(deserializer)?;
                    Ok(#name {
                        #id_field_name: String::new(),
                        #(#body_idents: body.#body_idents,)*
                    })
                }
            }

            impl Document for #name {
                fn get_document_id(&self) -> String {
                    self.#id_field_name.clone()
                }

                fn set_document_id(&mut self, v: &str) {
                    self.#id_field_name = v.to_string();
                }
            }
        };
    };

    TokenStream::from(gen)
}
