use proc_macro2::TokenStream as TokenStream2;
use quote::quote;
use syn::punctuated::Punctuated;
use syn::{Attribute, LitStr, Path, Token, Type};

/// 将 PascalCase 转换为 camelCase
///
/// 与 sprig_core::utils::naming::to_camel_case 保持一致
pub(crate) fn to_camel_case(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_lowercase().collect::<String>() + chars.as_str(),
    }
}

/// 字段是否带有 #[autowired]
pub(crate) fn is_autowired(attrs: &[Attribute]) -> bool {
    attrs.iter().any(|attr| attr.path().is_ident("autowired"))
}

/// 从属性中提取标记
///
/// 支持内置名称 `#[tag(service)]`，也支持任意 Tag 常量路径 `#[tag(crate::API)]`
pub(crate) fn get_tags(attrs: &[Attribute]) -> syn::Result<Vec<TokenStream2>> {
    let mut tags = Vec::new();
    for attr in attrs.iter().filter(|attr| attr.path().is_ident("tag")) {
        let paths = attr.parse_args_with(Punctuated::<Path, Token![,]>::parse_terminated)?;
        for path in paths {
            tags.push(builtin_tag(&path).unwrap_or_else(|| quote! { #path }));
        }
    }
    Ok(tags)
}

fn builtin_tag(path: &Path) -> Option<TokenStream2> {
    let ident = path.get_ident()?.to_string();
    let tag = match ident.as_str() {
        "component" => quote! { ::sprig_core::COMPONENT },
        "service" => quote! { ::sprig_core::SERVICE },
        "repository" => quote! { ::sprig_core::REPOSITORY },
        "controller" => quote! { ::sprig_core::CONTROLLER },
        _ => return None,
    };
    Some(tag)
}

/// 从 #[provides(dyn A, dyn B)] 中提取暴露的类型
pub(crate) fn get_provides(attrs: &[Attribute]) -> syn::Result<Vec<Type>> {
    let mut provided = Vec::new();
    for attr in attrs.iter().filter(|attr| attr.path().is_ident("provides")) {
        let types = attr.parse_args_with(Punctuated::<Type, Token![,]>::parse_terminated)?;
        provided.extend(types);
    }
    Ok(provided)
}

/// 从 #[request_mapping("/api")] 中提取基础路径
pub(crate) fn get_request_mapping(attrs: &[Attribute]) -> syn::Result<String> {
    match attrs.iter().find(|attr| attr.path().is_ident("request_mapping")) {
        Some(attr) => Ok(attr.parse_args::<LitStr>()?.value()),
        None => Ok(String::new()),
    }
}

/// 从 Arc<T> 类型中提取 T
pub(crate) fn extract_arc_type(ty: &Type) -> Option<&Type> {
    if let Type::Path(type_path) = ty {
        if let Some(segment) = type_path.path.segments.last() {
            if segment.ident == "Arc" {
                if let syn::PathArguments::AngleBracketed(args) = &segment.arguments {
                    if let Some(syn::GenericArgument::Type(inner_ty)) = args.args.first() {
                        return Some(inner_ty);
                    }
                }
            }
        }
    }
    None
}
