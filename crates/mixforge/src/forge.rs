//! The [`Forge`] engine: configuration plus the type and atomic registries,
//! in front of the serialization and traversal engines.

use std::sync::Arc;

use mixforge_core::{AtomicTypes, ClassDef, ClassInfo, Fields, Heap, TypeKey, TypeRegistry, Value};
use mixforge_json::{DumpOptions, JsonSerializedObject};
use serde_json::Value as Json;
use tracing::debug;

use crate::config::ForgeConfig;
use crate::error::Result;
use crate::observability::OperationTimer;

/// Serialization and traversal engine.
///
/// A `Forge` is immutable once built and can be shared across threads; all
/// graph state lives in the [`Heap`] passed to each call.
///
/// # Examples
///
/// ```rust
/// use mixforge::prelude::*;
///
/// let point = ClassDef::builder("geometry", "Point").slots(["x", "y"]).build().unwrap();
/// let forge = Forge::builder().register(&point).build().unwrap();
///
/// let mut heap = Heap::new();
/// let p = heap.object(&point, [("x", 1), ("y", 2)]).unwrap();
/// let root = heap.list(vec![p.clone(), Value::Int(3)]);
///
/// let ints = forge.find(&heap, &root, &BuiltinKind::Int.into()).unwrap();
/// assert_eq!(ints, vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
///
/// let text = forge.dumps(&heap, &root).unwrap();
/// let back = forge.loads(&mut heap, text.as_str()).unwrap();
/// assert!(heap.deep_eq(&root, &back));
/// ```
#[derive(Debug, Clone)]
pub struct Forge {
    config: ForgeConfig,
    atomics: AtomicTypes,
    registry: TypeRegistry,
}

impl Default for Forge {
    fn default() -> Self {
        Self {
            config: ForgeConfig::default(),
            atomics: AtomicTypes::with_builtins(),
            registry: TypeRegistry::new(),
        }
    }
}

impl Forge {
    /// Start building an engine.
    pub fn builder() -> ForgeBuilder {
        ForgeBuilder::default()
    }

    /// Active configuration
    pub fn config(&self) -> &ForgeConfig {
        &self.config
    }

    /// Atomic-type classifier
    pub fn atomics(&self) -> &AtomicTypes {
        &self.atomics
    }

    /// Classes that deserialization may construct
    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    /// Register a class (and its bases) for deserialization and `Named`
    /// classinfo lookups.
    pub fn register_class(&mut self, class: &Arc<ClassDef>) -> Result<()> {
        self.registry.register(class)?;
        Ok(())
    }

    /// Treat instances of `key` (and its subclasses) as leaves.
    pub fn register_atomic(&mut self, key: TypeKey) {
        self.atomics.register(key);
    }

    /// Whether a value is never decomposed by the walkers.
    pub fn is_atomic(&self, heap: &Heap, value: &Value) -> Result<bool> {
        Ok(self.atomics.is_atomic_value(heap, value)?)
    }

    // --- serialization ------------------------------------------------

    /// Encode a value into a JSON tree.
    pub fn to_json(&self, heap: &Heap, value: &Value) -> Result<Json> {
        timed("to_json", || Ok(mixforge_json::serialize(heap, value)?))
    }

    /// Rebuild a value from a JSON tree.
    pub fn from_json(&self, heap: &mut Heap, tree: &Json) -> Result<Value> {
        timed("from_json", || Ok(mixforge_json::deserialize(heap, &self.registry, tree)?))
    }

    /// Encode a value as JSON text, indented if `pretty_json` is set.
    pub fn dumps(&self, heap: &Heap, value: &Value) -> Result<JsonSerializedObject> {
        let options = DumpOptions {
            pretty: self.config.pretty_json,
        };
        timed("dumps", || Ok(mixforge_json::dumpjs(heap, value, options)?))
    }

    /// Rebuild a value from JSON text.
    pub fn loads(&self, heap: &mut Heap, text: &str) -> Result<Value> {
        timed("loads", || Ok(mixforge_json::loadjs(heap, &self.registry, text)?))
    }

    /// Patch parameters inside a serialized `PARAMS` record.
    pub fn update_params(
        &self,
        heap: &Heap,
        blob: &str,
        updates: &[(&str, Value)],
    ) -> Result<JsonSerializedObject> {
        timed("update_params", || Ok(mixforge_json::update_jsparams(heap, blob, updates)?))
    }

    /// Read selected parameters from a serialized `PARAMS` record.
    pub fn access_params(&self, heap: &mut Heap, blob: &str, names: &[&str]) -> Result<Fields> {
        timed("access_params", || {
            Ok(mixforge_json::access_jsparams(heap, &self.registry, blob, names)?)
        })
    }

    // --- traversal ----------------------------------------------------

    /// Leaves of a nested iterable, depth first.
    pub fn flatten(&self, heap: &Heap, root: &Value) -> Result<Vec<Value>> {
        timed("flatten", || {
            let leaves = mixforge_traverse::flatten(heap, &self.atomics, root)?
                .collect::<mixforge_traverse::Result<Vec<_>>>()?;
            debug!(leaves = leaves.len(), "flattened collection");
            Ok(leaves)
        })
    }

    /// Instances of `classinfo`, using the configured `deep_search`.
    pub fn find(&self, heap: &Heap, root: &Value, classinfo: &ClassInfo) -> Result<Vec<Value>> {
        self.find_with(heap, root, classinfo, self.config.deep_search)
    }

    /// Instances of `classinfo` with an explicit `deep_search`.
    pub fn find_with(
        &self,
        heap: &Heap,
        root: &Value,
        classinfo: &ClassInfo,
        deep_search: bool,
    ) -> Result<Vec<Value>> {
        timed("find", || {
            let found = mixforge_traverse::find_instances_of_type(
                heap,
                &self.atomics,
                &self.registry,
                root,
                classinfo,
                deep_search,
            )?
            .collect::<mixforge_traverse::Result<Vec<_>>>()?;
            debug!(found = found.len(), deep_search, "searched object graph");
            Ok(found)
        })
    }

    /// Rebuild `root` with instances of `classinfo` replaced, using the
    /// configured `deep_transformation`.
    pub fn transform<F>(
        &self,
        heap: &mut Heap,
        root: &Value,
        classinfo: &ClassInfo,
        transform_fn: F,
    ) -> Result<Value>
    where
        F: FnMut(&mut Heap, &Value) -> anyhow::Result<Value>,
    {
        self.transform_with(heap, root, classinfo, transform_fn, self.config.deep_transformation)
    }

    /// Rebuild `root` with an explicit `deep_transformation`.
    pub fn transform_with<F>(
        &self,
        heap: &mut Heap,
        root: &Value,
        classinfo: &ClassInfo,
        transform_fn: F,
        deep_transformation: bool,
    ) -> Result<Value>
    where
        F: FnMut(&mut Heap, &Value) -> anyhow::Result<Value>,
    {
        timed("transform", || {
            Ok(mixforge_traverse::transform_instances_of_type(
                heap,
                &self.atomics,
                &self.registry,
                root,
                classinfo,
                transform_fn,
                deep_transformation,
            )?)
        })
    }
}

fn timed<T>(operation: &'static str, body: impl FnOnce() -> Result<T>) -> Result<T> {
    OperationTimer::start(operation).finish(body())
}

/// Builder for configuring a [`Forge`]
#[derive(Debug, Default)]
pub struct ForgeBuilder {
    config: ForgeConfig,
    classes: Vec<Arc<ClassDef>>,
    atomic_types: Vec<TypeKey>,
}

impl ForgeBuilder {
    /// Create a new builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the configuration.
    pub fn config(mut self, config: ForgeConfig) -> Self {
        self.config = config;
        self
    }

    /// Set pretty JSON output.
    pub fn pretty_json(mut self, pretty: bool) -> Self {
        self.config.pretty_json = pretty;
        self
    }

    /// Set the default `deep_search`.
    pub fn deep_search(mut self, deep: bool) -> Self {
        self.config.deep_search = deep;
        self
    }

    /// Set the default `deep_transformation`.
    pub fn deep_transformation(mut self, deep: bool) -> Self {
        self.config.deep_transformation = deep;
        self
    }

    /// Register a class for deserialization.
    pub fn register(mut self, class: &Arc<ClassDef>) -> Self {
        self.classes.push(Arc::clone(class));
        self
    }

    /// Treat instances of `key` as atomic.
    pub fn atomic_type(mut self, key: TypeKey) -> Self {
        self.atomic_types.push(key);
        self
    }

    /// Treat instances of `class` as atomic.
    pub fn atomic_class(self, class: &Arc<ClassDef>) -> Self {
        self.atomic_type(class.key().clone())
    }

    /// Build the engine.
    ///
    /// # Errors
    ///
    /// Returns `Error::Model` if two different classes share a type tag.
    pub fn build(self) -> Result<Forge> {
        let mut atomics = if self.config.register_builtin_atomics {
            AtomicTypes::with_builtins()
        } else {
            AtomicTypes::empty()
        };
        atomics.register_many(self.config.extra_atomic_types.iter().cloned());
        atomics.register_many(self.atomic_types);

        let mut registry = TypeRegistry::new();
        for class in &self.classes {
            registry.register(class)?;
        }
        debug!(
            classes = registry.len(),
            atomic_types = atomics.len(),
            "built forge"
        );

        Ok(Forge {
            config: self.config,
            atomics,
            registry,
        })
    }
}
