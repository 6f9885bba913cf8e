//! Error types for serialization and reconstruction

use mixforge_core::{ModelError, TypeKey, error_boundary};
use thiserror::Error;

/// Result type for codec operations
pub type Result<T> = std::result::Result<T, CodecError>;

/// Errors that can occur while encoding or decoding object graphs
#[derive(Debug, Error)]
pub enum CodecError {
    // Encoding errors
    /// Value shape no serialization branch handles
    #[error("Unsupported type: {0}")]
    Unsupported(String),

    /// An object reappeared on the active serialization path
    #[error("Cyclic reference detected while serializing object of type {0}")]
    Cycle(String),

    /// Mapping key that cannot become a JSON object key
    #[error("Unsupported mapping key {key} in {container}: only string keys can be serialized")]
    UnsupportedKey {
        /// Rendering of the offending key
        key: String,
        /// Type name of the mapping
        container: String,
    },

    /// NaN or infinity
    #[error("Cannot serialize non-finite float {0}")]
    NonFiniteFloat(f64),

    // Decoding errors
    /// Marker record with the wrong shape
    #[error("Malformed record: {0}")]
    Malformed(String),

    /// A type tag that is not registered
    #[error("Could not import {} from {}", .0.name(), .0.module())]
    UnknownType(TypeKey),

    /// Slot state length differs from the class's slot schema
    #[error(
        "Tuple state length {found} does not match slots length {expected} for class {class}"
    )]
    SlotMismatch {
        /// Class name
        class: String,
        /// Number of slots the class declares
        expected: usize,
        /// Number of values in the blob
        found: usize,
    },

    /// A class without a keyword constructor received a PARAMS record
    #[error("Class {0} has no keyword constructor")]
    NotConstructible(String),

    /// Parameter lookup failure
    #[error("Key error: {0}")]
    MissingKey(String),

    // Wrapped errors
    /// JSON text parse or render failure
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Object-model failure (attribute assignment, hooks, dangling ids)
    #[error(transparent)]
    Model(ModelError),
}

impl CodecError {
    /// Create a new `Malformed` error
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self::Malformed(reason.into())
    }

    /// Create a new `MissingKey` error
    pub fn missing_key(reason: impl Into<String>) -> Self {
        Self::MissingKey(reason.into())
    }
}

error_boundary!(ModelError => CodecError, |e| {
    match e {
        ModelError::UnknownType(key) => CodecError::UnknownType(key),
        other => CodecError::Model(other),
    }
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_type_is_lifted_out_of_model_errors() {
        let err: CodecError = ModelError::UnknownType(TypeKey::new("app", "Ghost")).into();
        assert!(matches!(err, CodecError::UnknownType(_)));
        assert_eq!(err.to_string(), "Could not import Ghost from app");

        let err: CodecError = ModelError::attribute("Point", "z").into();
        assert!(matches!(err, CodecError::Model(_)));
    }

    #[test]
    fn test_slot_mismatch_message() {
        let err = CodecError::SlotMismatch {
            class: "Point".to_string(),
            expected: 2,
            found: 3,
        };
        assert_eq!(
            err.to_string(),
            "Tuple state length 3 does not match slots length 2 for class Point"
        );
    }
}
