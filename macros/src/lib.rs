//! Procedural macros for store-backed tests

mod test;

use proc_macro::TokenStream;

/// Attribute macro for test functions that need a store backend
///
/// Provisions a fresh store, binds it as `store: Box<dyn FullStore>`, and
/// runs the test body against it inside a tokio test.
///
/// # Basic usage
///
/// ```ignore
/// #[store_macros::store_test]
/// async fn my_test() {
///     store.begin_writing().await.unwrap();
///     // ...
/// }
/// ```
///
/// # Choosing a backend
///
/// ```ignore
/// #[store_macros::store_test(backend = slate)]
/// async fn my_test() {
///     // runs against a SlateDB store over an in-memory object store
/// }
/// ```
#[proc_macro_attribute]
pub fn store_test(args: TokenStream, input: TokenStream) -> TokenStream {
    test::store::test_impl(args.into(), input.into()).into()
}
