//! Error types for object-model operations.
//!
//! Heap access, attribute assignment, class definition and type resolution
//! all report failures through [`ModelError`]. The [`error_boundary!`] macro
//! lets downstream crates fold these errors into their own error enums.
//!
//! [`error_boundary!`]: crate::error_boundary

mod boundary;

use thiserror::Error;

use crate::types::TypeKey;
use crate::value::NodeId;

/// Result type for object-model operations.
pub type Result<T> = std::result::Result<T, ModelError>;

/// Errors that can occur while building or inspecting an object graph.
#[derive(Debug, Error)]
pub enum ModelError {
    /// A node id that does not belong to this heap.
    #[error("Dangling reference: {0} does not exist in this heap")]
    DanglingRef(NodeId),

    /// Every node id is taken.
    #[error("Heap is full: {0} nodes allocated")]
    HeapFull(usize),

    /// Attribute lookup or assignment on a name the class does not support.
    #[error("'{class}' object has no attribute '{name}'")]
    Attribute {
        /// Qualified class name
        class: String,
        /// Attribute name
        name: String,
    },

    /// A slot declared by the class was never assigned on this instance.
    #[error("'{class}' object slot '{name}' is not initialized")]
    UninitializedSlot {
        /// Qualified class name
        class: String,
        /// Slot name
        name: String,
    },

    /// A `module:name` pair that is not registered.
    #[error("Could not resolve {} from {}", .0.name(), .0.module())]
    UnknownType(TypeKey),

    /// A different class is already registered under this tag.
    #[error("Duplicate type registration: {0}")]
    DuplicateType(TypeKey),

    /// A classinfo value that cannot be used as a type-membership test.
    #[error("classinfo must be a type, tuple of types, or union type: {0}")]
    InvalidClassInfo(String),

    /// A module path, class name, slot or parameter name that is not an identifier.
    #[error("Invalid identifier: '{0}'")]
    InvalidIdentifier(String),

    /// A class definition that contradicts itself.
    #[error("Invalid class definition for {class}: {reason}")]
    InvalidClass {
        /// Qualified class name
        class: String,
        /// What is wrong with it
        reason: String,
    },

    /// An enumeration has no member with this name.
    #[error("{class} has no member '{member}'")]
    UnknownEnumMember {
        /// Enumeration class name
        class: String,
        /// Requested member name
        member: String,
    },

    /// Mapping lookup for a key that is absent.
    #[error("Key not found: {0}")]
    MissingKey(String),

    /// An operation applied to a node of the wrong kind.
    #[error("Expected {expected}, got {found}")]
    WrongKind {
        /// The kind the operation needs
        expected: &'static str,
        /// The kind actually found
        found: String,
    },

    /// A user-supplied class hook or callable failed.
    #[error("{context} failed: {source}")]
    Hook {
        /// Which hook, on which class
        context: String,
        /// Underlying failure
        #[source]
        source: anyhow::Error,
    },
}

impl ModelError {
    /// Create a new `Attribute` error
    pub fn attribute(class: impl Into<String>, name: impl Into<String>) -> Self {
        Self::Attribute {
            class: class.into(),
            name: name.into(),
        }
    }

    /// Create a new `InvalidClass` error
    pub fn invalid_class(class: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidClass {
            class: class.into(),
            reason: reason.into(),
        }
    }

    /// Create a new `WrongKind` error
    pub fn wrong_kind(expected: &'static str, found: impl Into<String>) -> Self {
        Self::WrongKind {
            expected,
            found: found.into(),
        }
    }

    /// Wrap a hook failure with the hook's description
    pub fn hook(context: impl Into<String>, source: anyhow::Error) -> Self {
        Self::Hook {
            context: context.into(),
            source,
        }
    }
}
