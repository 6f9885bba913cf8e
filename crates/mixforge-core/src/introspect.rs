//! Attribute introspection across both storage strategies.
//!
//! An object may keep fields in a dynamic mapping, in fixed slots declared
//! across its class ancestry, or both. [`attributes`] reads them uniformly:
//! field-mapping entries first (in insertion order), then assigned slots in
//! schema order. Unassigned slots, `__`-prefixed slot names and class-level
//! computed attributes are skipped; [`stored_attributes`] skips nothing but
//! unassigned slots.

use crate::class::Fields;
use crate::error::{ModelError, Result};
use crate::heap::{Heap, ObjectNode};
use crate::value::{NodeId, Value};

/// Named attributes of an object.
///
/// # Errors
///
/// Returns `ModelError::WrongKind` if `id` is not an object node.
pub fn attributes(heap: &Heap, id: NodeId) -> Result<Fields> {
    let obj = heap.object_node(id)?;
    Ok(collect(obj))
}

/// Every stored attribute, including `__`-prefixed slots.
///
/// This is what an identical copy of the object needs.
pub fn stored_attributes(heap: &Heap, id: NodeId) -> Result<Fields> {
    let obj = heap.object_node(id)?;
    let mut out: Fields = obj.dict.clone().unwrap_or_default();
    for (name, slot) in obj.class.slots().iter().zip(&obj.slots) {
        if let Some(value) = slot {
            out.push((name.clone(), value.clone()));
        }
    }
    Ok(out)
}

/// Attribute values only, in the same order as [`attributes`].
pub fn attribute_values(heap: &Heap, id: NodeId) -> Result<Vec<Value>> {
    Ok(attributes(heap, id)?.into_iter().map(|(_, v)| v).collect())
}

/// Dataclass fields of an object, by field name.
///
/// # Errors
///
/// Returns `ModelError::WrongKind` for objects without dataclass semantics
/// and `ModelError::UninitializedSlot` / `ModelError::Attribute` for a field
/// with no value.
pub fn dataclass_fields(heap: &Heap, id: NodeId) -> Result<Fields> {
    let obj = heap.object_node(id)?;
    let fields = obj
        .class
        .dataclass_fields()
        .ok_or_else(|| ModelError::wrong_kind("dataclass", obj.class.name()))?;
    fields
        .iter()
        .map(|name| Ok((name.clone(), heap.get_attr(id, name)?)))
        .collect()
}

fn collect(obj: &ObjectNode) -> Fields {
    let mut out: Fields = obj.dict.clone().unwrap_or_default();
    for (name, slot) in obj.class.slots().iter().zip(&obj.slots) {
        let Some(value) = slot else { continue };
        if name.starts_with("__") || obj.class.computed().contains(name) {
            continue;
        }
        out.push((name.clone(), value.clone()));
    }
    out
}
