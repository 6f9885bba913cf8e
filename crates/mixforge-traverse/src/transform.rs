//! Rebuilding a graph with instances of given types replaced.
//!
//! The original graph is never mutated. Containers on a path to a replaced
//! value are rebuilt; everything else is returned as is, so a call that
//! replaces nothing hands back the root unchanged. Shared nodes stay shared
//! in the result and cycles are rebuilt as cycles:
//!
//! - mutable containers (lists, dicts, objects) are allocated empty before
//!   their children are visited and filled afterwards, so a back-reference
//!   resolves to the new node;
//! - immutable ones (tuples, sets, dataclasses, container-like objects) are
//!   rebuilt bottom-up, and a back-reference met while rebuilding them
//!   resolves to the original.

use std::collections::HashMap;
use std::sync::Arc;

use mixforge_core::introspect::{dataclass_fields, stored_attributes};
use mixforge_core::{
    AtomicTypes, ClassDef, ClassInfo, ContainerKind, DictNode, Fields, Heap, Items, ModelError,
    Node, NodeId, SequenceFlavor, TypeMatcher, TypeRegistry, Value,
};
use tracing::debug;

use crate::error::{Result, TraversalError};
use crate::rebuild::rebuild_sequence;

/// Rebuild `root` with every instance of `classinfo` replaced by
/// `transform_fn(instance)`.
///
/// A matched value is not descended into unless `deep_transformation` is set;
/// then the children of the *replacement* are reconstructed in turn. Atomic
/// values are matched but never descended into.
///
/// # Errors
///
/// Returns `TraversalError::InvalidClassInfo` for a classinfo that does not
/// resolve, `TraversalError::Transform` if `transform_fn` fails, and
/// `TraversalError::Model` if a rebuilt object rejects its attributes.
pub fn transform_instances_of_type<F>(
    heap: &mut Heap,
    atomics: &AtomicTypes,
    registry: &TypeRegistry,
    root: &Value,
    classinfo: &ClassInfo,
    transform_fn: F,
    deep_transformation: bool,
) -> Result<Value>
where
    F: FnMut(&mut Heap, &Value) -> anyhow::Result<Value>,
{
    let matcher = classinfo.resolve(registry)?;
    let mut reconstructor = Reconstructor {
        heap,
        atomics,
        matcher,
        transform_fn,
        deep: deep_transformation,
        seen: HashMap::new(),
        replacements: 0,
    };
    let result = reconstructor.reconstruct(root)?;
    debug!(
        replacements = reconstructor.replacements,
        nodes = reconstructor.seen.len(),
        "transformed object graph"
    );
    if reconstructor.replacements == 0 {
        return Ok(root.clone());
    }
    Ok(result)
}

struct Reconstructor<'a, F> {
    heap: &'a mut Heap,
    atomics: &'a AtomicTypes,
    matcher: TypeMatcher,
    transform_fn: F,
    deep: bool,
    /// Original node → its (possibly still incomplete) reconstruction
    seen: HashMap<NodeId, Value>,
    replacements: usize,
}

impl<F> Reconstructor<'_, F>
where
    F: FnMut(&mut Heap, &Value) -> anyhow::Result<Value>,
{
    fn reconstruct(&mut self, original: &Value) -> Result<Value> {
        if let Some(done) = self.lookup(original) {
            return Ok(done);
        }
        if self.matcher.matches(self.heap, original)? {
            return self.replace(original);
        }
        self.rebuild(original)
    }

    fn lookup(&self, value: &Value) -> Option<Value> {
        value.node_id().and_then(|id| self.seen.get(&id).cloned())
    }

    fn record(&mut self, id: NodeId, value: Value) -> Value {
        self.seen.insert(id, value.clone());
        value
    }

    fn replace(&mut self, original: &Value) -> Result<Value> {
        if let Some(id) = original.node_id() {
            self.seen.insert(id, original.clone());
        }
        self.replacements += 1;
        let transformed = (self.transform_fn)(&mut *self.heap, original).map_err(TraversalError::Transform)?;

        let result = if !self.deep {
            transformed
        } else if transformed.is_same(original) {
            self.rebuild(&transformed)?
        } else {
            match self.lookup(&transformed) {
                Some(done) => done,
                None => self.rebuild(&transformed)?,
            }
        };
        if let Some(id) = original.node_id() {
            self.seen.insert(id, result.clone());
        }
        Ok(result)
    }

    /// Reconstruct the children of a value that is not itself replaced.
    fn rebuild(&mut self, value: &Value) -> Result<Value> {
        let Value::Ref(id) = value else {
            return Ok(value.clone());
        };
        let id = *id;
        if self.atomics.is_atomic_value(self.heap, value)? {
            return Ok(self.record(id, value.clone()));
        }
        match self.heap.kind(value)? {
            ContainerKind::List => self.rebuild_list(id),
            ContainerKind::Dict => self.rebuild_dict(id),
            ContainerKind::Tuple | ContainerKind::Set | ContainerKind::FrozenSet => {
                self.rebuild_frozen(id)
            }
            ContainerKind::SequenceObject(flavor) => self.rebuild_sequence_object(id, flavor),
            ContainerKind::PlainObject if self.class_of(id)?.is_dataclass() => {
                self.rebuild_dataclass(id)
            }
            ContainerKind::PlainObject | ContainerKind::MappingObject => self.rebuild_object(id),
            ContainerKind::Scalar => Ok(value.clone()),
        }
    }

    fn rebuild_list(&mut self, id: NodeId) -> Result<Value> {
        let items = self.heap.elements(id)?.to_vec();
        let placeholder = self.heap.alloc(Node::List(Vec::new()));
        self.seen.insert(id, Value::Ref(placeholder));

        let (items, changed) = self.reconstruct_all(&items)?;
        if !changed {
            return Ok(self.record(id, Value::Ref(id)));
        }
        *self.heap.node_mut(placeholder)? = Node::List(items);
        Ok(Value::Ref(placeholder))
    }

    fn rebuild_dict(&mut self, id: NodeId) -> Result<Value> {
        let (entries, default_factory) = match self.heap.node(id)? {
            Node::Dict(dict) => (dict.entries.clone(), dict.default_factory.clone()),
            other => return Err(ModelError::wrong_kind("dict", other.kind_name()).into()),
        };
        let placeholder = self.heap.alloc(Node::Dict(DictNode {
            entries: Vec::new(),
            default_factory,
        }));
        self.seen.insert(id, Value::Ref(placeholder));

        let (entries, changed) = self.reconstruct_entries(&entries)?;
        if !changed {
            return Ok(self.record(id, Value::Ref(id)));
        }
        self.heap.dict_extend(placeholder, entries)?;
        Ok(Value::Ref(placeholder))
    }

    fn rebuild_frozen(&mut self, id: NodeId) -> Result<Value> {
        let (items, build): (Vec<Value>, fn(&mut Heap, Vec<Value>) -> Value) =
            match self.heap.node(id)? {
                Node::Tuple(items) => (items.clone(), Heap::tuple),
                Node::Set(items) => (items.clone(), Heap::set),
                Node::FrozenSet(items) => (items.clone(), Heap::frozenset),
                other => return Err(ModelError::wrong_kind("tuple or set", other.kind_name()).into()),
            };
        self.seen.insert(id, Value::Ref(id));

        let (items, changed) = self.reconstruct_all(&items)?;
        if !changed {
            return Ok(Value::Ref(id));
        }
        let rebuilt = build(&mut *self.heap, items);
        Ok(self.record(id, rebuilt))
    }

    fn rebuild_sequence_object(&mut self, id: NodeId, flavor: SequenceFlavor) -> Result<Value> {
        let obj = self.heap.object_node(id)?;
        let class = Arc::clone(&obj.class);
        let items = match &obj.items {
            Some(Items::Sequence(items)) => items.clone(),
            _ => Vec::new(),
        };
        self.seen.insert(id, Value::Ref(id));

        let (items, changed) = self.reconstruct_all(&items)?;
        if !changed {
            return Ok(Value::Ref(id));
        }
        let (rebuilt, _) = rebuild_sequence(self.heap, &class, flavor, &items)?;
        Ok(self.record(id, rebuilt))
    }

    fn rebuild_dataclass(&mut self, id: NodeId) -> Result<Value> {
        let class = self.class_of(id)?;
        let fields = dataclass_fields(self.heap, id)?;
        self.seen.insert(id, Value::Ref(id));

        let (fields, changed) = self.reconstruct_fields(&fields)?;
        if !changed {
            return Ok(Value::Ref(id));
        }
        let rebuilt = if class.has_constructor() {
            class.construct(self.heap, fields)?
        } else {
            let copy = self.bare_instance(&class)?;
            for (name, value) in stored_attributes(self.heap, id)?.into_iter().chain(fields) {
                self.heap.set_attr(copy, &name, value)?;
            }
            Value::Ref(copy)
        };
        Ok(self.record(id, rebuilt))
    }

    fn rebuild_object(&mut self, id: NodeId) -> Result<Value> {
        let obj = self.heap.object_node(id)?;
        let class = Arc::clone(&obj.class);
        let entries = match &obj.items {
            Some(Items::Mapping(entries)) => entries.clone(),
            _ => Vec::new(),
        };
        let attrs = stored_attributes(self.heap, id)?;
        let placeholder = self.bare_instance(&class)?;
        self.seen.insert(id, Value::Ref(placeholder));

        let (attrs, attrs_changed) = self.reconstruct_fields(&attrs)?;
        let (entries, entries_changed) = self.reconstruct_entries(&entries)?;
        if !attrs_changed && !entries_changed {
            return Ok(self.record(id, Value::Ref(id)));
        }
        for (name, value) in attrs {
            self.heap.set_attr(placeholder, &name, value)?;
        }
        self.heap.dict_extend(placeholder, entries)?;
        Ok(Value::Ref(placeholder))
    }

    fn reconstruct_all(&mut self, items: &[Value]) -> Result<(Vec<Value>, bool)> {
        let mut changed = false;
        let mut out = Vec::with_capacity(items.len());
        for item in items {
            let new = self.reconstruct(item)?;
            changed |= !new.is_same(item);
            out.push(new);
        }
        Ok((out, changed))
    }

    fn reconstruct_entries(&mut self, entries: &[(Value, Value)]) -> Result<(Vec<(Value, Value)>, bool)> {
        let mut changed = false;
        let mut out = Vec::with_capacity(entries.len());
        for (key, value) in entries {
            let new_key = self.reconstruct(key)?;
            let new_value = self.reconstruct(value)?;
            changed |= !new_key.is_same(key) || !new_value.is_same(value);
            out.push((new_key, new_value));
        }
        Ok((out, changed))
    }

    fn reconstruct_fields(&mut self, fields: &Fields) -> Result<(Fields, bool)> {
        let mut changed = false;
        let mut out = Fields::with_capacity(fields.len());
        for (name, value) in fields {
            let new = self.reconstruct(value)?;
            changed |= !new.is_same(value);
            out.push((name.clone(), new));
        }
        Ok((out, changed))
    }

    fn class_of(&self, id: NodeId) -> Result<Arc<ClassDef>> {
        Ok(Arc::clone(&self.heap.object_node(id)?.class))
    }

    fn bare_instance(&mut self, class: &Arc<ClassDef>) -> Result<NodeId> {
        let instance = self.heap.instantiate(class)?;
        instance
            .node_id()
            .ok_or_else(|| ModelError::wrong_kind("object", class.name()).into())
    }
}
