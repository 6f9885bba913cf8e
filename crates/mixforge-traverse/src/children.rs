//! Child-expansion policies used by the walkers.

use mixforge_core::introspect::attribute_values;
use mixforge_core::{AtomicTypes, Heap, Items, Node, NodeId, Value};

use crate::error::Result;

/// Everything reachable from `value` in one step: container elements,
/// mapping keys then values, and object attributes followed by an object's
/// own items. Atomic values and inline scalars have no children.
pub fn all_children(heap: &Heap, atomics: &AtomicTypes, value: &Value) -> Result<Option<Vec<Value>>> {
    let Value::Ref(id) = value else {
        return Ok(None);
    };
    if atomics.is_atomic_value(heap, value)? {
        return Ok(None);
    }
    let mut children = Vec::new();
    if heap.kind(value)?.is_object() {
        children.extend(attribute_values(heap, *id)?);
    }
    push_items(heap, *id, &mut children)?;
    Ok(Some(children))
}

/// Whether `flatten` descends into `value`: it is neither atomic nor a plain
/// object, and it can be iterated.
pub fn is_traversable(heap: &Heap, atomics: &AtomicTypes, value: &Value) -> Result<bool> {
    Ok(heap.kind(value)?.is_iterable() && !atomics.is_atomic_value(heap, value)?)
}

/// What iterating `value` produces: elements, or keys then values for a
/// mapping. Object attributes are never part of it.
pub fn iteration_children(
    heap: &Heap,
    atomics: &AtomicTypes,
    value: &Value,
) -> Result<Option<Vec<Value>>> {
    let Value::Ref(id) = value else {
        return Ok(None);
    };
    if !is_traversable(heap, atomics, value)? {
        return Ok(None);
    }
    let mut children = Vec::new();
    push_items(heap, *id, &mut children)?;
    Ok(Some(children))
}

fn push_items(heap: &Heap, id: NodeId, out: &mut Vec<Value>) -> Result<()> {
    match heap.node(id)? {
        Node::List(items) | Node::Tuple(items) | Node::Set(items) | Node::FrozenSet(items) => {
            out.extend(items.iter().cloned());
        }
        Node::Dict(dict) => push_entries(&dict.entries, out),
        Node::Object(obj) => match &obj.items {
            Some(Items::Sequence(items)) => out.extend(items.iter().cloned()),
            Some(Items::Mapping(entries)) => push_entries(entries, out),
            None => {}
        },
    }
    Ok(())
}

fn push_entries(entries: &[(Value, Value)], out: &mut Vec<Value>) {
    out.extend(entries.iter().map(|(k, _)| k.clone()));
    out.extend(entries.iter().map(|(_, v)| v.clone()));
}
