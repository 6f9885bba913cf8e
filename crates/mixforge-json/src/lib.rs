#![deny(unsafe_code)]
#![warn(missing_docs)]

//! JSON-only serialization of arbitrary object graphs.
//!
//! The serializer turns a value from a [`Heap`] into a tree made of nothing
//! but JSON nulls, booleans, numbers, strings, arrays and objects. Values
//! JSON cannot express natively are written as *marker records*:
//!
//! | value | encoding |
//! |---|---|
//! | list | JSON array |
//! | tuple | `{"..tuple..": [...]}` |
//! | set / frozenset | `{"..set..": [...]}` |
//! | dict | `{"..dict..": {...}}` (string keys only) |
//! | enum member | `{"..enum..": name, "..class..": ..., "..module..": ...}` |
//! | parameterizable object | `{"..class..", "..module..", "..params..": {"..dict..": ...}}` |
//! | other object | `{"..class..", "..module..", "..state..": ...}` |
//!
//! Deserialization is the inverse and only constructs classes present in a
//! [`TypeRegistry`].
//!
//! # Examples
//!
//! ```rust
//! use mixforge_core::{ClassDef, Heap, TypeRegistry, Value};
//! use mixforge_json::{DumpOptions, dumpjs, loadjs};
//!
//! let point = ClassDef::builder("geometry", "Point").slots(["x", "y"]).build().unwrap();
//! let mut registry = TypeRegistry::new();
//! registry.register(&point).unwrap();
//!
//! let mut heap = Heap::new();
//! let p = heap.object(&point, [("x", 1), ("y", 2)]).unwrap();
//! let text = dumpjs(&heap, &p, DumpOptions::compact()).unwrap();
//!
//! let back = loadjs(&mut heap, &registry, text.as_str()).unwrap();
//! assert!(heap.deep_eq(&p, &back));
//! ```
//!
//! [`Heap`]: mixforge_core::Heap
//! [`TypeRegistry`]: mixforge_core::TypeRegistry

mod blob;
pub mod builtins;
mod decode;
mod encode;
mod error;
pub mod markers;
mod params;

pub use blob::{DumpOptions, JsonSerializedObject, dumpjs, loadjs};
pub use decode::{Decoder, deserialize};
pub use encode::{Encoder, serialize, serialize_fields};
pub use error::{CodecError, Result};
pub use params::{
    access_jsparams, auxiliary_param_names, essential_param_names, get_auxiliary_jsparams,
    get_auxiliary_params, get_default_jsparams, get_default_params, get_essential_jsparams,
    get_essential_params, get_jsparams, get_params, update_jsparams,
};
