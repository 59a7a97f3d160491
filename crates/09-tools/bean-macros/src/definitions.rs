//! 全局目录注册宏实现

use proc_macro::TokenStream;
use proc_macro2::Span;
use quote::quote;
use syn::{
    parse::Parse, parse::ParseStream, parse_macro_input, punctuated::Punctuated, Expr, Ident, ItemFn, Lit, Meta,
    Result, ReturnType, Token,
};

/// 注册参数
#[derive(Debug, Clone, Default)]
pub struct DefinitionArgs {
    /// 命名空间
    pub scope: Option<String>,
}

impl Parse for DefinitionArgs {
    fn parse(input: ParseStream<'_>) -> Result<Self> {
        let mut args = Self::default();

        let parsed = Punctuated::<Meta, Token![,]>::parse_terminated(input)?;

        for meta in parsed {
            match meta {
                Meta::NameValue(nv) if nv.path.is_ident("scope") => {
                    if let Expr::Lit(expr_lit) = &nv.value {
                        if let Lit::Str(lit_str) = &expr_lit.lit {
                            args.scope = Some(lit_str.value());
                            continue;
                        }
                    }
                    return Err(syn::Error::new_spanned(nv.value, "scope 必须是字符串字面量"));
                }
                other => {
                    return Err(syn::Error::new_spanned(other, "未知参数，只支持 scope = \"...\""));
                }
            }
        }

        Ok(args)
    }
}

/// 实现 #[bean_definitions] 宏
pub fn bean_definitions_impl(args: TokenStream, input: TokenStream) -> TokenStream {
    let definition_args = if args.is_empty() {
        DefinitionArgs::default()
    } else {
        match syn::parse::<DefinitionArgs>(args) {
            Ok(args) => args,
            Err(e) => return e.to_compile_error().into(),
        }
    };

    let input_fn = parse_macro_input!(input as ItemFn);

    if let Err(e) = check_signature(&input_fn) {
        return e.to_compile_error().into();
    }

    let registration_code = generate_registration_code(&input_fn.sig.ident, definition_args.scope.as_deref());

    let expanded = quote! {
        #input_fn

        #registration_code
    };

    TokenStream::from(expanded)
}

fn check_signature(input_fn: &ItemFn) -> Result<()> {
    let sig = &input_fn.sig;
    if !sig.inputs.is_empty() {
        return Err(syn::Error::new_spanned(&sig.inputs, "声明函数不能有参数"));
    }
    if !sig.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(&sig.generics, "声明函数不能是泛型函数"));
    }
    if sig.asyncness.is_some() {
        return Err(syn::Error::new_spanned(sig.asyncness, "声明函数不能是 async"));
    }
    if matches!(sig.output, ReturnType::Default) {
        return Err(syn::Error::new_spanned(sig, "声明函数需要返回 Vec<Definition>"));
    }
    Ok(())
}

/// 生成启动时登记代码
fn generate_registration_code(fn_name: &Ident, scope: Option<&str>) -> proc_macro2::TokenStream {
    let registration_fn_name = Ident::new(
        &format!("__register_bean_definitions_{}", fn_name.to_string().to_lowercase()),
        Span::call_site(),
    );

    let scope = scope.map_or_else(|| quote! { ::std::module_path!() }, |scope| quote! { #scope });

    quote! {
        // 使用 ctor 在程序启动时登记声明
        #[ctor::ctor]
        fn #registration_fn_name() {
            ::bean_container::register_global(#scope, #fn_name());
        }
    }
}
