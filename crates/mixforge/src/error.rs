//! Error types for the mixforge facade
//!
//! Each engine reports failures through its own error enum; this module folds
//! them into a single [`Error`] so that `?` works across all of them.

use mixforge_core::{ModelError, error_boundary};
use mixforge_json::CodecError;
use mixforge_traverse::TraversalError;
use thiserror::Error;

/// Result type alias for facade operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for mixforge.
#[derive(Debug, Error)]
pub enum Error {
    /// Object-model failure (dangling ids, attribute assignment, class
    /// definitions, registration conflicts).
    #[error(transparent)]
    Model(ModelError),

    /// Serialization or reconstruction failure.
    #[error(transparent)]
    Codec(CodecError),

    /// Traversal, search or transformation failure.
    #[error(transparent)]
    Traversal(TraversalError),

    /// Invalid engine configuration.
    #[error("Invalid configuration: {0}")]
    Config(String),
}

error_boundary!(ModelError => Error, |e| Error::Model(e));
error_boundary!(CodecError => Error, |e| Error::Codec(e));
error_boundary!(TraversalError => Error, |e| Error::Traversal(e));

impl Error {
    /// Whether an object reappeared on the active serialization path.
    pub fn is_cycle(&self) -> bool {
        matches!(self, Error::Codec(CodecError::Cycle(_)))
    }

    /// Whether a value shape is not handled by the serializer or the root
    /// handed to `flatten` cannot be iterated.
    pub fn is_unsupported(&self) -> bool {
        matches!(
            self,
            Error::Codec(CodecError::Unsupported(_) | CodecError::UnsupportedKey { .. })
                | Error::Traversal(TraversalError::NotIterable(_))
        )
    }

    /// Whether a blob could not be turned back into objects.
    pub fn is_reconstruction(&self) -> bool {
        matches!(
            self,
            Error::Codec(
                CodecError::Malformed(_)
                    | CodecError::UnknownType(_)
                    | CodecError::SlotMismatch { .. }
                    | CodecError::NotConstructible(_)
            )
        )
    }

    /// Whether an argument was rejected before any work started.
    pub fn is_invalid_argument(&self) -> bool {
        matches!(
            self,
            Error::Traversal(TraversalError::InvalidClassInfo(_)) | Error::Config(_)
        )
    }

    /// Whether a named parameter or key was missing.
    pub fn is_key_error(&self) -> bool {
        matches!(
            self,
            Error::Codec(CodecError::MissingKey(_)) | Error::Model(ModelError::MissingKey(_))
        )
    }
}
