#![deny(unsafe_code)]
#![warn(missing_docs)]

//! Traversal, search and reconstruction of object graphs.
//!
//! All walkers are depth first, treat values registered in [`AtomicTypes`]
//! as leaves, and visit every heap node at most once, so shared and cyclic
//! graphs are safe:
//!
//! - [`flatten`] yields the leaves of nested iterables;
//! - [`find_instances_of_type`] yields every instance of a classinfo, looking
//!   through containers, mappings and object attributes;
//! - [`transform_instances_of_type`] rebuilds a graph with those instances
//!   replaced, leaving the original untouched.
//!
//! # Examples
//!
//! ```rust
//! use mixforge_core::{AtomicTypes, BuiltinKind, Heap, TypeRegistry, Value};
//! use mixforge_traverse::{flatten, transform_instances_of_type};
//!
//! let mut heap = Heap::new();
//! let inner = heap.tuple(vec![Value::Int(2), Value::Int(3)]);
//! let root = heap.list(vec![Value::Int(1), inner]);
//! let atomics = AtomicTypes::default();
//!
//! let leaves: Vec<Value> = flatten(&heap, &atomics, &root)
//!     .unwrap()
//!     .collect::<Result<_, _>>()
//!     .unwrap();
//! assert_eq!(leaves, vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
//!
//! let doubled = transform_instances_of_type(
//!     &mut heap,
//!     &atomics,
//!     &TypeRegistry::new(),
//!     &root,
//!     &BuiltinKind::Int.into(),
//!     |_, v| Ok(Value::Int(v.as_int().unwrap_or_default() * 2)),
//!     false,
//! )
//! .unwrap();
//! let expected_inner = heap.tuple(vec![Value::Int(4), Value::Int(6)]);
//! let expected = heap.list(vec![Value::Int(2), expected_inner]);
//! assert!(heap.deep_eq(&doubled, &expected));
//! ```
//!
//! [`AtomicTypes`]: mixforge_core::AtomicTypes

pub mod children;
mod error;
mod find;
mod flatten;
pub mod rebuild;
mod transform;
pub mod walk;

pub use error::{Result, TraversalError};
pub use find::find_instances_of_type;
pub use flatten::flatten;
pub use rebuild::RebuildStrategy;
pub use transform::transform_instances_of_type;
pub use walk::Walk;
