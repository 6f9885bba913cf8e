/// Macro to define error boundaries with automatic `From` implementation.
///
/// Each engine crate in the workspace reports failures through its own error
/// enum. At the facade those enums are folded into one error type; this macro
/// declares how, so that `?` works across the crate boundary without
/// `map_err()` chains.
///
/// # Syntax
///
/// ```ignore
/// error_boundary!(SourceError => TargetError, |err_var| {
///     // conversion logic returning TargetError
/// });
/// ```
///
/// # Example
///
/// ```
/// use mixforge_core::{error_boundary, ModelError, NodeId, Heap};
///
/// #[derive(Debug, thiserror::Error)]
/// enum AppError {
///     #[error("model: {0}")]
///     Model(String),
/// }
///
/// error_boundary!(ModelError => AppError, |e| {
///     AppError::Model(e.to_string())
/// });
///
/// fn first_item(heap: &Heap, id: NodeId) -> Result<(), AppError> {
///     heap.node(id)?; // auto-converts ModelError
///     Ok(())
/// }
/// ```
#[macro_export]
macro_rules! error_boundary {
    ($inner:ty => $outer:ty, |$err:ident| $body:expr) => {
        // The From impl is what enables `?` operator
        impl ::std::convert::From<$inner> for $outer {
            fn from($err: $inner) -> $outer {
                $body
            }
        }
    };
}
