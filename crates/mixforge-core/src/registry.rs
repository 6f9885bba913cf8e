//! Registry of constructible classes.
//!
//! Deserialization can only rebuild types registered here: a blob names its
//! type by `module:name` tag, and an unregistered tag is a resolution error
//! rather than an open symbol lookup.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::class::ClassDef;
use crate::error::{ModelError, Result};
use crate::types::TypeKey;

/// Maps type tags to class descriptors.
#[derive(Debug, Clone, Default)]
pub struct TypeRegistry {
    classes: HashMap<TypeKey, Arc<ClassDef>>,
}

impl TypeRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a class and, recursively, its bases.
    ///
    /// Registering the same descriptor twice is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `ModelError::DuplicateType` if a different descriptor is
    /// already registered under the same tag.
    pub fn register(&mut self, class: &Arc<ClassDef>) -> Result<()> {
        if let Some(existing) = self.classes.get(class.key()) {
            if Arc::ptr_eq(existing, class) {
                return Ok(());
            }
            return Err(ModelError::DuplicateType(class.key().clone()));
        }
        debug!(tag = %class.key(), "registering class");
        self.classes.insert(class.key().clone(), Arc::clone(class));
        for base in class.bases() {
            self.register(base)?;
        }
        Ok(())
    }

    /// Look up a class by tag.
    pub fn get(&self, key: &TypeKey) -> Option<&Arc<ClassDef>> {
        self.classes.get(key)
    }

    /// Look up a class by module and name.
    ///
    /// # Errors
    ///
    /// Returns `ModelError::UnknownType` for unregistered tags.
    pub fn resolve(&self, module: &str, name: &str) -> Result<Arc<ClassDef>> {
        let key = TypeKey::new(module, name);
        self.classes
            .get(&key)
            .cloned()
            .ok_or(ModelError::UnknownType(key))
    }

    /// Whether a tag is registered.
    pub fn contains(&self, key: &TypeKey) -> bool {
        self.classes.contains_key(key)
    }

    /// Number of registered classes.
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    /// Iterate over registered classes (unordered).
    pub fn iter(&self) -> impl Iterator<Item = &Arc<ClassDef>> {
        self.classes.values()
    }
}
