mod event;

use proc_macro::TokenStream;

#[proc_macro_derive(Event)]
pub fn derive_event(item: TokenStream) -> TokenStream {
    event::derive_event(item)
}
