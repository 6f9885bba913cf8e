//! Atomic-type classification.
//!
//! An atomic type is never decomposed into children, even when it could be
//! (a string is a sequence of characters, but always a leaf). The classifier
//! is an explicit configuration object owned by whichever engine needs it;
//! there is no process-wide registry.
//!
//! # Examples
//!
//! ```rust
//! use mixforge_core::{AtomicTypes, BuiltinKind, TypeKey, ValueType};
//!
//! let mut atomics = AtomicTypes::with_builtins();
//! assert!(atomics.is_atomic(&ValueType::Builtin(BuiltinKind::Str)));
//! assert!(!atomics.is_atomic(&ValueType::Builtin(BuiltinKind::List)));
//!
//! // Classes can be registered by key before their descriptor exists.
//! atomics.register(TypeKey::new("numpy", "ndarray"));
//! assert!(atomics.is_registered(&TypeKey::new("numpy", "ndarray")));
//! ```

use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use tracing::trace;

use crate::error::Result;
use crate::heap::Heap;
use crate::types::{BuiltinKind, TypeKey, ValueType};
use crate::value::Value;

/// Builtin kinds that are leaves out of the box.
const BUILTIN_ATOMICS: [BuiltinKind; 13] = [
    BuiltinKind::NoneType,
    BuiltinKind::Bool,
    BuiltinKind::Int,
    BuiltinKind::Float,
    BuiltinKind::Str,
    BuiltinKind::Bytes,
    BuiltinKind::Date,
    BuiltinKind::DateTime,
    BuiltinKind::Uuid,
    BuiltinKind::Path,
    BuiltinKind::Enum,
    BuiltinKind::Type,
    BuiltinKind::Callable,
];

/// Registry of types that are never decomposed, with a per-type memo.
#[derive(Debug)]
pub struct AtomicTypes {
    registered: HashSet<TypeKey>,
    cache: RwLock<HashMap<TypeKey, bool>>,
}

impl AtomicTypes {
    /// Registry with the builtin scalar kinds.
    pub fn with_builtins() -> Self {
        let mut atomics = Self::empty();
        atomics.register_many(BUILTIN_ATOMICS.iter().map(|k| k.key()));
        atomics
    }

    /// Registry with nothing registered.
    pub fn empty() -> Self {
        Self {
            registered: HashSet::new(),
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Register a type key as atomic. Subclasses of it become atomic too.
    pub fn register(&mut self, key: TypeKey) {
        trace!(key = %key, "registering atomic type");
        if self.registered.insert(key) {
            self.reset_cache();
        }
    }

    /// Register several type keys.
    pub fn register_many<I>(&mut self, keys: I)
    where
        I: IntoIterator<Item = TypeKey>,
    {
        for key in keys {
            self.register(key);
        }
    }

    /// Whether this exact key was registered.
    pub fn is_registered(&self, key: &TypeKey) -> bool {
        self.registered.contains(key)
    }

    /// Number of registered keys.
    pub fn len(&self) -> usize {
        self.registered.len()
    }

    /// Whether nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.registered.is_empty()
    }

    /// Whether values of this type are leaves.
    ///
    /// True when the concrete type or any ancestor is registered. The answer
    /// is memoized per concrete type.
    pub fn is_atomic(&self, ty: &ValueType) -> bool {
        let key = ty.key();
        if let Ok(cache) = self.cache.read() {
            if let Some(&hit) = cache.get(&key) {
                return hit;
            }
        }
        let atomic = ty.ancestry().iter().any(|k| self.registered.contains(k));
        if let Ok(mut cache) = self.cache.write() {
            cache.insert(key, atomic);
        }
        atomic
    }

    /// Whether a value is a leaf: [`AtomicTypes::is_atomic`] on its type.
    pub fn is_atomic_value(&self, heap: &Heap, value: &Value) -> Result<bool> {
        Ok(self.is_atomic(&heap.type_of(value)?))
    }

    /// Forget memoized answers.
    pub fn reset_cache(&self) {
        if let Ok(mut cache) = self.cache.write() {
            cache.clear();
        }
    }

    /// Number of memoized answers.
    pub fn cached_len(&self) -> usize {
        self.cache.read().map(|c| c.len()).unwrap_or(0)
    }
}

impl Default for AtomicTypes {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl Clone for AtomicTypes {
    fn clone(&self) -> Self {
        Self {
            registered: self.registered.clone(),
            cache: RwLock::new(HashMap::new()),
        }
    }
}
