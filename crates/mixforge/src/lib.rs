#![deny(unsafe_code)]
#![warn(missing_docs)]

//! # mixforge
//!
//! JSON-only serialization and type-directed traversal of dynamic object
//! graphs.
//!
//! Object graphs live in a [`Heap`]: lists, tuples, sets, dicts and class
//! instances are heap nodes with identity, scalars are inline values. On top
//! of that model this crate offers two engines behind one [`Forge`]:
//!
//! - **Serialization**: [`Forge::dumps`] / [`Forge::loads`] encode a graph as
//!   plain JSON with marker records for tuples, sets, dicts and objects.
//!   Objects are rebuilt through their constructor parameters when they have
//!   any, otherwise from their state. Only registered classes can be rebuilt.
//! - **Traversal**: [`Forge::flatten`], [`Forge::find`] and
//!   [`Forge::transform`] walk graphs depth first, visit shared and cyclic
//!   nodes once, and never decompose values whose type is registered as
//!   atomic.
//!
//! ## Quick Start
//!
//! ```rust
//! use mixforge::prelude::*;
//!
//! let forge = Forge::builder().build().unwrap();
//! let mut heap = Heap::new();
//!
//! let shared = heap.str_dict([("k", Value::Int(1))]);
//! let root = heap.list(vec![shared.clone(), shared]);
//!
//! let bumped = forge
//!     .transform(&mut heap, &root, &BuiltinKind::Int.into(), |_, v| {
//!         Ok(Value::Int(v.as_int().unwrap_or_default() + 1))
//!     })
//!     .unwrap();
//!
//! let items = heap.elements(bumped.node_id().unwrap()).unwrap().to_vec();
//! assert!(items[0].is_same(&items[1]));
//! ```
//!
//! ## Features
//!
//! - `env` (default): [`ForgeConfig::from_env`]
//! - `trace`: [`observability::init_tracing`]

pub mod config;
pub mod error;
pub mod forge;
pub mod observability;


pub use config::ForgeConfig;
pub use error::{Error, Result};
pub use forge::{Forge, ForgeBuilder};

pub use mixforge_core::{
    AtomicTypes, BuiltinKind, Callable, ClassDef, ClassInfo, ContainerKind, Fields, Heap,
    ModelError, NodeId, SequenceFlavor, TypeKey, TypeRegistry, Value, ValueType,
};
pub use mixforge_json::{CodecError, DumpOptions, JsonSerializedObject};
pub use mixforge_traverse::TraversalError;

/// The engine crates, for lower-level entry points.
pub mod engines {
    pub use mixforge_core as core;
    pub use mixforge_json as json;
    pub use mixforge_traverse as traverse;
}

/// Convenient re-exports of commonly used items.
///
/// ```rust
/// use mixforge::prelude::*;
/// ```
pub mod prelude {
    pub use crate::config::ForgeConfig;
    pub use crate::error::{Error, Result};
    pub use crate::forge::{Forge, ForgeBuilder};
    pub use mixforge_core::prelude::*;
    pub use mixforge_json::JsonSerializedObject;
}
