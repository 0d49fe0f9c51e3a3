use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{parse_macro_input, Data, DeriveInput, Fields, Index, Member};

use crate::attribute_helpers::{
    extract_arc_type, get_provides, get_request_mapping, get_tags, is_autowired, to_camel_case,
};

pub(crate) fn derive_component_impl(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    expand_component(&input, quote! { ::sprig_core::COMPONENT })
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

pub(crate) fn derive_controller_impl(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let name = &input.ident;

    let expanded = (|| {
        let component = expand_component(&input, quote! { ::sprig_core::CONTROLLER })?;
        let base_path = get_request_mapping(&input.attrs)?;
        Ok::<_, syn::Error>(quote! {
            #component

            impl #name {
                #[doc(hidden)]
                pub fn __base_path() -> &'static str {
                    #base_path
                }
            }
        })
    })();

    expanded.unwrap_or_else(syn::Error::into_compile_error).into()
}

/// 生成 Component 实现和 inventory 注册
///
/// `#[autowired]` 字段必须是 `Arc<T>`，按声明顺序作为构造参数；
/// 其余字段使用 `Default::default()`
fn expand_component(input: &DeriveInput, stereotype: TokenStream2) -> syn::Result<TokenStream2> {
    let name = &input.ident;
    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "generic types cannot be registered as components",
        ));
    }

    let fields = match &input.data {
        Data::Struct(data) => &data.fields,
        _ => {
            return Err(syn::Error::new_spanned(
                name,
                "components must be structs",
            ))
        }
    };

    let mut dependencies = Vec::new();
    let mut initializers = Vec::new();
    for (index, field) in fields.iter().enumerate() {
        let member = match &field.ident {
            Some(ident) => Member::Named(ident.clone()),
            None => Member::Unnamed(Index::from(index)),
        };

        if is_autowired(&field.attrs) {
            let inner = extract_arc_type(&field.ty).ok_or_else(|| {
                syn::Error::new_spanned(&field.ty, "#[autowired] fields must be Arc<T>")
            })?;
            dependencies.push(quote! { .depends_on::<#inner>() });
            initializers.push(quote! { #member: __sprig_args.next::<#inner>()? });
        } else {
            initializers.push(quote! { #member: ::core::default::Default::default() });
        }
    }

    let construct = match fields {
        Fields::Unit => quote! { #name },
        _ => quote! { #name { #(#initializers),* } },
    };

    let mut tags = vec![stereotype];
    tags.extend(get_tags(&input.attrs)?);

    let exposures = get_provides(&input.attrs)?.into_iter().map(|provided| {
        quote! {
            .provides::<#provided>(|it: ::std::sync::Arc<#name>| it as ::std::sync::Arc<#provided>)
        }
    });

    let bean_name = to_camel_case(&name.to_string());

    Ok(quote! {
        impl ::sprig_core::Component for #name {
            fn candidate() -> ::sprig_core::CandidateType {
                ::sprig_core::CandidateType::builder::<#name>()
                    #(#dependencies)*
                    #(.tag(#tags))*
                    #(#exposures)*
                    .constructor(|__sprig_args: &mut ::sprig_core::Arguments| {
                        ::std::result::Result::Ok(#construct)
                    })
            }
        }

        ::sprig_core::inventory::submit! {
            ::sprig_core::ComponentRegistration {
                name: #bean_name,
                candidate: <#name as ::sprig_core::Component>::candidate,
            }
        }
    })
}
