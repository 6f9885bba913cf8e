//! Type-membership targets for search and transformation.
//!
//! A [`ClassInfo`] is a single type, a tuple of targets (nested arbitrarily)
//! or a union. It is resolved once, before any traversal starts, into a
//! [`TypeMatcher`]; an unresolvable target is rejected up front.

use std::collections::HashSet;
use std::sync::Arc;

use crate::class::ClassDef;
use crate::error::{ModelError, Result};
use crate::heap::Heap;
use crate::registry::TypeRegistry;
use crate::types::{BuiltinKind, TypeKey, ValueType};
use crate::value::Value;

/// A search target.
#[derive(Debug, Clone)]
pub enum ClassInfo {
    /// A builtin kind
    Builtin(BuiltinKind),
    /// A class descriptor
    Class(Arc<ClassDef>),
    /// A class by tag, resolved against a registry
    Named(TypeKey),
    /// Any of the nested targets
    Tuple(Vec<ClassInfo>),
    /// Any of the nested targets; must not be empty
    Union(Vec<ClassInfo>),
}

impl ClassInfo {
    /// Resolve into a matcher.
    ///
    /// # Errors
    ///
    /// Returns `ModelError::InvalidClassInfo` for an empty union or a `Named`
    /// tag that is neither a builtin kind nor registered.
    pub fn resolve(&self, registry: &TypeRegistry) -> Result<TypeMatcher> {
        let mut keys = HashSet::new();
        self.collect(registry, &mut keys)?;
        Ok(TypeMatcher { keys })
    }

    fn collect(&self, registry: &TypeRegistry, keys: &mut HashSet<TypeKey>) -> Result<()> {
        match self {
            Self::Builtin(kind) => {
                keys.insert(kind.key());
            }
            Self::Class(class) => {
                keys.insert(class.key().clone());
            }
            Self::Named(key) => {
                if key.as_builtin().is_none() && !registry.contains(key) {
                    return Err(ModelError::InvalidClassInfo(format!(
                        "unknown type {key}"
                    )));
                }
                keys.insert(key.clone());
            }
            Self::Tuple(items) => {
                for item in items {
                    item.collect(registry, keys)?;
                }
            }
            Self::Union(items) => {
                if items.is_empty() {
                    return Err(ModelError::InvalidClassInfo("empty union".to_string()));
                }
                for item in items {
                    item.collect(registry, keys)?;
                }
            }
        }
        Ok(())
    }
}

impl From<BuiltinKind> for ClassInfo {
    fn from(kind: BuiltinKind) -> Self {
        Self::Builtin(kind)
    }
}

impl From<&Arc<ClassDef>> for ClassInfo {
    fn from(class: &Arc<ClassDef>) -> Self {
        Self::Class(Arc::clone(class))
    }
}

impl From<Arc<ClassDef>> for ClassInfo {
    fn from(class: Arc<ClassDef>) -> Self {
        Self::Class(class)
    }
}

impl From<TypeKey> for ClassInfo {
    fn from(key: TypeKey) -> Self {
        Self::Named(key)
    }
}

/// Resolved type-membership test.
#[derive(Debug, Clone)]
pub struct TypeMatcher {
    keys: HashSet<TypeKey>,
}

impl TypeMatcher {
    /// Whether the type or any of its ancestors is a target.
    pub fn matches_type(&self, ty: &ValueType) -> bool {
        ty.ancestry().iter().any(|k| self.keys.contains(k))
    }

    /// Whether a value is an instance of a target.
    pub fn matches(&self, heap: &Heap, value: &Value) -> Result<bool> {
        Ok(self.matches_type(&heap.type_of(value)?))
    }

    /// Resolved target keys.
    pub fn keys(&self) -> impl Iterator<Item = &TypeKey> {
        self.keys.iter()
    }
}
