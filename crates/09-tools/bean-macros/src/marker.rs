//! 标记派生宏实现

use proc_macro::TokenStream;
use quote::quote;
use syn::DeriveInput;

/// 实现 #[derive(Marker)] 宏
pub fn derive_marker_impl(input: &DeriveInput) -> TokenStream {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let expanded = quote! {
        impl #impl_generics ::bean_container::Marker for #name #ty_generics #where_clause {}
    };

    TokenStream::from(expanded)
}
