//! Error types for traversal and transformation

use mixforge_core::{ModelError, error_boundary};
use thiserror::Error;

/// Result type for traversal operations
pub type Result<T> = std::result::Result<T, TraversalError>;

/// Errors that can occur while walking or rebuilding an object graph
#[derive(Debug, Error)]
pub enum TraversalError {
    /// The root handed to `flatten` cannot be iterated
    #[error("Object of type {0} is not iterable")]
    NotIterable(String),

    /// A classinfo that is not a type, tuple of types, or union
    #[error("classinfo must be a type, tuple of types, or union type: {0}")]
    InvalidClassInfo(String),

    /// The user transform function failed
    #[error("Transform function failed: {0}")]
    Transform(#[source] anyhow::Error),

    /// Object-model failure (dangling ids, attribute assignment, hooks)
    #[error(transparent)]
    Model(ModelError),
}

error_boundary!(ModelError => TraversalError, |e| match e {
    ModelError::InvalidClassInfo(reason) => TraversalError::InvalidClassInfo(reason),
    other => TraversalError::Model(other),
});

#[cfg(test)]
mod tests {
    use super::*;
    use mixforge_core::TypeKey;

    #[test]
    fn test_model_errors_fold_into_traversal_errors() {
        let err: TraversalError = ModelError::InvalidClassInfo("empty union".into()).into();
        assert!(matches!(err, TraversalError::InvalidClassInfo(ref r) if r == "empty union"));

        let err: TraversalError = ModelError::UnknownType(TypeKey::new("pkg", "Gone")).into();
        assert!(matches!(err, TraversalError::Model(_)));
        assert!(err.to_string().contains("Gone"));
    }

    #[test]
    fn test_transform_error_keeps_source() {
        let err = TraversalError::Transform(anyhow::anyhow!("boom"));
        assert_eq!(err.to_string(), "Transform function failed: boom");
        assert!(std::error::Error::source(&err).is_some());
    }
}
