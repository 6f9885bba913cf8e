//! Leaf enumeration of nested iterables.

use mixforge_core::{AtomicTypes, Heap, Value};

use crate::children::{is_traversable, iteration_children};
use crate::error::{Result, TraversalError};
use crate::walk::Walk;

/// Every non-traversable item reachable from `root` by iteration, depth first.
///
/// Mappings contribute their keys, then their values. Atomic values and plain
/// objects are yielded whole. A node reached twice (shared or cyclic) is
/// visited once; inline values are yielded on every occurrence.
///
/// # Errors
///
/// Returns `TraversalError::NotIterable` if `root` is atomic or cannot be
/// iterated. Errors met during the walk are yielded by the iterator.
pub fn flatten<'h>(
    heap: &'h Heap,
    atomics: &'h AtomicTypes,
    root: &Value,
) -> Result<impl Iterator<Item = Result<Value>> + use<'h>> {
    if !is_traversable(heap, atomics, root)? {
        return Err(TraversalError::NotIterable(heap.type_name(root)));
    }
    let walk = Walk::new(root.clone(), move |value: &Value| {
        iteration_children(heap, atomics, value)
    });
    Ok(walk.filter_map(move |item| match item {
        Ok(value) => match is_traversable(heap, atomics, &value) {
            Ok(true) => None,
            Ok(false) => Some(Ok(value)),
            Err(e) => Some(Err(e)),
        },
        Err(e) => Some(Err(e)),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mixforge_core::{ClassDef, SequenceFlavor};
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn collect(heap: &Heap, atomics: &AtomicTypes, root: &Value) -> Vec<Value> {
        flatten(heap, atomics, root)
            .unwrap()
            .collect::<Result<_>>()
            .unwrap()
    }

    #[test]
    fn test_nested_lists_and_tuples() {
        let mut heap = Heap::new();
        let t = heap.tuple(vec![Value::Int(2), Value::Int(3)]);
        let inner = heap.list(vec![t]);
        let root = heap.list(vec![Value::Int(1), inner, Value::Int(4)]);

        let atomics = AtomicTypes::default();
        assert_eq!(
            collect(&heap, &atomics, &root),
            vec![Value::Int(1), Value::Int(2), Value::Int(3), Value::Int(4)]
        );
    }

    #[test]
    fn test_dict_keys_before_values() {
        let mut heap = Heap::new();
        let inner = heap.list(vec![Value::Int(1), Value::Int(2)]);
        let root = heap.str_dict([("a", inner), ("b", Value::Int(3))]);

        let atomics = AtomicTypes::default();
        assert_eq!(
            collect(&heap, &atomics, &root),
            vec![Value::str("a"), Value::str("b"), Value::Int(1), Value::Int(2), Value::Int(3)]
        );
    }

    #[test]
    fn test_strings_are_not_split() {
        let mut heap = Heap::new();
        let root = heap.list(vec![Value::str("hello"), Value::Bytes(b"ab".to_vec())]);
        let atomics = AtomicTypes::default();
        assert_eq!(collect(&heap, &atomics, &root).len(), 2);
    }

    #[test]
    fn test_shared_list_is_visited_once() {
        let mut heap = Heap::new();
        let shared = heap.list(vec![Value::Int(1), Value::Int(2)]);
        let root = heap.list(vec![shared.clone(), shared]);
        let atomics = AtomicTypes::default();
        assert_eq!(collect(&heap, &atomics, &root), vec![Value::Int(1), Value::Int(2)]);
    }

    #[test]
    fn test_equal_but_distinct_lists_are_both_visited() {
        let mut heap = Heap::new();
        let a = heap.list(vec![Value::Int(1), Value::Int(2)]);
        let b = heap.list(vec![Value::Int(1), Value::Int(2)]);
        let root = heap.list(vec![a, b]);
        let atomics = AtomicTypes::default();
        assert_eq!(collect(&heap, &atomics, &root).len(), 4);
    }

    #[test]
    fn test_self_containing_list_terminates() {
        let mut heap = Heap::new();
        let root = heap.list(vec![Value::Int(1)]);
        heap.list_push(root.node_id().unwrap(), root.clone()).unwrap();
        let atomics = AtomicTypes::default();
        assert_eq!(collect(&heap, &atomics, &root), vec![Value::Int(1)]);
    }

    #[test]
    fn test_plain_objects_are_leaves() {
        let plain = ClassDef::builder("app", "Plain").build().unwrap();
        let mut heap = Heap::new();
        let p = heap.object(&plain, [("hidden", 9)]).unwrap();
        let root = heap.list(vec![p.clone()]);
        let atomics = AtomicTypes::default();
        assert_eq!(collect(&heap, &atomics, &root), vec![p]);
    }

    #[test]
    fn test_sequence_objects_are_iterated() {
        let bag = ClassDef::builder("app", "Bag")
            .sequence(SequenceFlavor::List)
            .build()
            .unwrap();
        let mut heap = Heap::new();
        let b = heap.object(&bag, [("label", "ignored")]).unwrap();
        heap.items_push(b.node_id().unwrap(), Value::Int(8)).unwrap();
        let root = heap.list(vec![b]);
        let atomics = AtomicTypes::default();
        assert_eq!(collect(&heap, &atomics, &root), vec![Value::Int(8)]);
    }

    #[rstest]
    #[case::int(Value::Int(42))]
    #[case::string(Value::str("abc"))]
    #[case::none(Value::None)]
    fn test_atomic_root_is_rejected(#[case] root: Value) {
        let heap = Heap::new();
        let atomics = AtomicTypes::default();
        assert!(matches!(
            flatten(&heap, &atomics, &root),
            Err(TraversalError::NotIterable(_))
        ));
    }

    #[test]
    fn test_plain_object_root_is_rejected() {
        let plain = ClassDef::builder("app", "Plain").build().unwrap();
        let mut heap = Heap::new();
        let p = heap.instantiate(&plain).unwrap();
        let atomics = AtomicTypes::default();
        let err = flatten(&heap, &atomics, &p).err().unwrap();
        assert_eq!(err.to_string(), "Object of type Plain is not iterable");
    }
}
