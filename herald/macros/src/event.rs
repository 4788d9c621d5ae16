use proc_macro::TokenStream;
use quote::quote;
use syn::{DeriveInput, parse_macro_input, parse_quote};

pub fn derive_event(input: TokenStream) -> TokenStream {
    // Parse the input tokens into a syntax tree
    let mut ast = parse_macro_input!(input as DeriveInput);

    // Get the type name we are annotating
    let name = &ast.ident;

    // Every type parameter has to satisfy the same bounds as the event itself.
    for param in ast.generics.type_params_mut() {
        param.bounds.push(parse_quote!(::core::marker::Send));
        param.bounds.push(parse_quote!(::core::marker::Sync));
        param.bounds.push(parse_quote!(::core::fmt::Debug));
        param.bounds.push(parse_quote!('static));
    }
    let (impl_generics, ty_generics, where_clause) = ast.generics.split_for_impl();

    // Use ::herald::Event which works both inside and outside the crate.
    // Inside the crate, this works because of `extern crate self as herald;` in lib.rs
    // Outside the crate, this naturally resolves to the herald dependency.
    TokenStream::from(quote! {
        impl #impl_generics ::herald::Event for #name #ty_generics #where_clause {
        }
    })
}
