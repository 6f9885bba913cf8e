#![deny(unsafe_code)]
#![warn(missing_docs)]

//! Core object model for the mixforge ecosystem.
//!
//! This crate provides the foundation shared by the serialization and
//! traversal engines:
//!
//! - **Heap arena** via [`Heap`]: compound values (lists, tuples, sets, dicts,
//!   objects) live in an arena and are referenced by [`NodeId`]. A node id is
//!   the identity of a value; inline scalars carry no identity.
//! - **Class descriptors** via [`ClassDef`]: a per-type schema (slots,
//!   dynamic field storage, dataclass fields, container protocol, enum members)
//!   built once, plus capability hooks (parameters, state, constructors).
//! - **Atomic-type classifier** via [`AtomicTypes`]: the explicit registry of
//!   "never decompose this value" types, memoized per concrete type.
//! - **Type registry** via [`TypeRegistry`]: stable `module:name` tags mapped to
//!   class descriptors, the only types deserialization may construct.
//! - **Classinfo** via [`ClassInfo`]: `isinstance`-like match targets.
//! - **Declarative error boundaries** via the [`error_boundary!`] macro.
//!
//! # Examples
//!
//! ```rust
//! use mixforge_core::prelude::*;
//!
//! let point = ClassDef::builder("geometry", "Point")
//!     .slots(["x", "y"])
//!     .build()
//!     .unwrap();
//!
//! let mut heap = Heap::new();
//! let p = heap
//!     .object(&point, [("x", Value::Int(1)), ("y", Value::Int(2))])
//!     .unwrap();
//! let pair = heap.list(vec![p.clone(), p.clone()]);
//!
//! assert!(heap.deep_eq(&pair, &pair));
//! assert_eq!(heap.type_of(&p).unwrap().key(), point.key().clone());
//! ```

pub mod atomics;
pub mod class;
pub mod classinfo;
pub mod error;
pub mod heap;
pub mod ident;
pub mod introspect;
mod keys;
pub mod kind;
pub mod registry;
pub mod types;
pub mod value;

pub use atomics::AtomicTypes;
pub use class::{ClassBuilder, ClassDef, ClassHooks, ContainerProtocol, Fields, SequenceFlavor};
pub use classinfo::{ClassInfo, TypeMatcher};
pub use error::{ModelError, Result};
pub use heap::{DictNode, Heap, Items, Node, ObjectNode};
pub use kind::ContainerKind;
pub use registry::TypeRegistry;
pub use types::{BuiltinKind, TypeKey, ValueType};
pub use value::{Callable, EnumMember, NodeId, Value};

/// Convenient re-exports of commonly used items.
///
/// Import all core abstractions with:
///
/// ```rust
/// use mixforge_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::atomics::AtomicTypes;
    pub use crate::class::{ClassDef, ContainerProtocol, Fields, SequenceFlavor};
    pub use crate::classinfo::ClassInfo;
    pub use crate::error::ModelError;
    pub use crate::error_boundary;
    pub use crate::heap::Heap;
    pub use crate::kind::ContainerKind;
    pub use crate::registry::TypeRegistry;
    pub use crate::types::{BuiltinKind, TypeKey, ValueType};
    pub use crate::value::{Callable, NodeId, Value};
}
