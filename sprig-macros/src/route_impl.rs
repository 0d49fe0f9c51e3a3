//! 路由相关宏实现

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::{parse_macro_input, FnArg, ImplItem, ImplItemFn, ItemImpl, LitStr};

/// 方法级映射属性及其 HTTP 方法
const MAPPINGS: &[(&str, &str)] = &[
    ("get_mapping", "GET"),
    ("post_mapping", "POST"),
    ("put_mapping", "PUT"),
    ("delete_mapping", "DELETE"),
    ("patch_mapping", "PATCH"),
];

/// controller 宏实现
///
/// 扫描实现块中带映射属性的方法，生成 `Controller` 实现并注册到 inventory。
/// 映射属性会从输出中移除。
pub(crate) fn controller_impl(_attr: TokenStream, item: TokenStream) -> TokenStream {
    let mut input = parse_macro_input!(item as ItemImpl);
    expand(&mut input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}

fn expand(input: &mut ItemImpl) -> syn::Result<TokenStream2> {
    if let Some((_, trait_path, _)) = &input.trait_ {
        return Err(syn::Error::new_spanned(
            trait_path,
            "#[controller] must be placed on an inherent impl block",
        ));
    }

    let self_ty = input.self_ty.clone();
    let mut mappings = Vec::new();

    for item in &mut input.items {
        if let ImplItem::Fn(method) = item {
            for (verb, path) in take_mappings(method)? {
                validate_signature(method)?;
                let method_ident = &method.sig.ident;
                let method_name = method_ident.to_string();
                mappings.push(quote! {
                    ::sprig_web::RequestMapping::new(
                        #verb,
                        ::sprig_web::controller::join_path(<#self_ty>::__base_path(), #path),
                        #method_name,
                        |this: &#self_ty| ::sprig_web::IntoReply::into_reply(this.#method_ident()),
                    )
                });
            }
        }
    }

    let type_name = quote!(#self_ty).to_string().replace(' ', "");

    Ok(quote! {
        #input

        impl ::sprig_web::Controller for #self_ty {
            fn request_mappings() -> ::std::vec::Vec<::sprig_web::RequestMapping<Self>> {
                ::std::vec![#(#mappings),*]
            }
        }

        ::sprig_web::inventory::submit! {
            ::sprig_web::ControllerRegistration {
                type_name: #type_name,
                type_ref: ::sprig_web::sprig_core::TypeRef::of::<#self_ty>,
                handlers: <#self_ty as ::sprig_web::Controller>::handler_methods,
            }
        }
    })
}

/// 取出并移除方法上的映射属性
fn take_mappings(method: &mut ImplItemFn) -> syn::Result<Vec<(&'static str, LitStr)>> {
    let mut found = Vec::new();
    let mut kept = Vec::with_capacity(method.attrs.len());

    for attr in method.attrs.drain(..) {
        let verb = MAPPINGS
            .iter()
            .find(|(name, _)| attr.path().is_ident(name))
            .map(|(_, verb)| *verb);
        match verb {
            Some(verb) => found.push((verb, attr.parse_args::<LitStr>()?)),
            None => kept.push(attr),
        }
    }

    method.attrs = kept;
    Ok(found)
}

/// 处理方法只能是 `fn name(&self) -> R`
fn validate_signature(method: &ImplItemFn) -> syn::Result<()> {
    let sig = &method.sig;
    if let Some(asyncness) = &sig.asyncness {
        return Err(syn::Error::new_spanned(
            asyncness,
            "handler methods must be synchronous",
        ));
    }
    if !sig.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &sig.generics,
            "handler methods cannot be generic",
        ));
    }

    let mut inputs = sig.inputs.iter();
    match inputs.next() {
        Some(FnArg::Receiver(receiver))
            if receiver.reference.is_some() && receiver.mutability.is_none() => {}
        _ => {
            return Err(syn::Error::new_spanned(
                &sig.ident,
                "handler methods must take &self",
            ))
        }
    }
    if let Some(extra) = inputs.next() {
        return Err(syn::Error::new_spanned(
            extra,
            "handler methods cannot take arguments",
        ));
    }
    Ok(())
}
