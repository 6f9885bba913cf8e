//! Search for instances of given types.

use mixforge_core::{AtomicTypes, ClassInfo, Heap, TypeRegistry, Value};

use crate::children::all_children;
use crate::error::Result;
use crate::walk::Walk;

/// Every value reachable from `root` (root included) whose type matches
/// `classinfo`, depth first.
///
/// Containers, mappings (keys and values) and object attributes are all
/// searched. With `deep_search` off, the walk does not descend into a match;
/// with it on, matches nested inside matches are reported too. Atomic values
/// are matched but never descended into.
///
/// # Errors
///
/// Returns `TraversalError::InvalidClassInfo` up front for a classinfo that
/// does not resolve. Errors met during the walk are yielded by the iterator.
pub fn find_instances_of_type<'h>(
    heap: &'h Heap,
    atomics: &'h AtomicTypes,
    registry: &TypeRegistry,
    root: &Value,
    classinfo: &ClassInfo,
    deep_search: bool,
) -> Result<impl Iterator<Item = Result<Value>> + use<'h>> {
    let matcher = classinfo.resolve(registry)?;
    let expand_matcher = matcher.clone();
    let walk = Walk::new(root.clone(), move |value: &Value| {
        if !deep_search && expand_matcher.matches(heap, value)? {
            return Ok(None);
        }
        all_children(heap, atomics, value)
    });
    Ok(walk.filter_map(move |item| match item {
        Ok(value) => match matcher.matches(heap, &value) {
            Ok(true) => Some(Ok(value)),
            Ok(false) => None,
            Err(e) => Some(Err(e.into())),
        },
        Err(e) => Some(Err(e)),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TraversalError;
    use mixforge_core::{BuiltinKind, ClassDef, TypeKey};
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use std::sync::Arc;

    fn node() -> Arc<ClassDef> {
        ClassDef::builder("tree", "Node").slots(["value", "child"]).build().unwrap()
    }

    fn find(
        heap: &Heap,
        registry: &TypeRegistry,
        root: &Value,
        classinfo: &ClassInfo,
        deep: bool,
    ) -> Vec<Value> {
        let atomics = AtomicTypes::default();
        find_instances_of_type(heap, &atomics, registry, root, classinfo, deep)
            .unwrap()
            .collect::<Result<_>>()
            .unwrap()
    }

    #[test]
    fn test_ints_in_nested_containers() {
        let mut heap = Heap::new();
        let t = heap.tuple(vec![Value::Int(2), Value::str("x")]);
        let root = heap.list(vec![Value::Int(1), t, Value::Float(2.5)]);

        let found = find(&heap, &TypeRegistry::new(), &root, &BuiltinKind::Int.into(), true);
        assert_eq!(found, vec![Value::Int(1), Value::Int(2)]);
    }

    #[test]
    fn test_dict_keys_and_values_are_searched() {
        let mut heap = Heap::new();
        let root = heap.dict(vec![(Value::Int(1), Value::str("a")), (Value::str("b"), Value::Int(2))]);

        let found = find(&heap, &TypeRegistry::new(), &root, &BuiltinKind::Int.into(), true);
        assert_eq!(found, vec![Value::Int(1), Value::Int(2)]);
    }

    #[rstest]
    #[case::shallow(false, 1)]
    #[case::deep(true, 2)]
    fn test_nested_matches(#[case] deep: bool, #[case] expected: usize) {
        let class = node();
        let mut heap = Heap::new();
        let inner = heap.object(&class, [("value", 2)]).unwrap();
        let outer = heap
            .object(&class, [("value", Value::Int(1)), ("child", inner)])
            .unwrap();
        let root = heap.list(vec![outer.clone()]);

        let found = find(&heap, &TypeRegistry::new(), &root, &(&class).into(), deep);
        assert_eq!(found.len(), expected);
        assert!(found[0].is_same(&outer));
    }

    #[test]
    fn test_root_itself_can_match() {
        let class = node();
        let mut heap = Heap::new();
        let root = heap.object(&class, [("value", 1)]).unwrap();

        let found = find(&heap, &TypeRegistry::new(), &root, &(&class).into(), false);
        assert_eq!(found.len(), 1);
    }

    #[test]
    fn test_subclass_instances_match_base() {
        let base = node();
        let leaf = ClassDef::builder("tree", "Leaf").base(&base).build().unwrap();
        let mut registry = TypeRegistry::new();
        registry.register(&leaf).unwrap();

        let mut heap = Heap::new();
        let l = heap.object(&leaf, [("value", 3)]).unwrap();
        let root = heap.list(vec![l]);

        let named = ClassInfo::Named(TypeKey::new("tree", "Node"));
        assert_eq!(find(&heap, &registry, &root, &named, false).len(), 1);
    }

    #[test]
    fn test_union_classinfo() {
        let mut heap = Heap::new();
        let root = heap.list(vec![Value::Int(1), Value::str("s"), Value::None]);
        let classinfo = ClassInfo::Union(vec![BuiltinKind::Int.into(), BuiltinKind::Str.into()]);

        let found = find(&heap, &TypeRegistry::new(), &root, &classinfo, false);
        assert_eq!(found, vec![Value::Int(1), Value::str("s")]);
    }

    #[test]
    fn test_cycle_through_attributes_terminates() {
        let class = node();
        let mut heap = Heap::new();
        let a = heap.object(&class, [("value", 1)]).unwrap();
        let b = heap.object(&class, [("value", Value::Int(2)), ("child", a.clone())]).unwrap();
        heap.set_attr(a.node_id().unwrap(), "child", b).unwrap();

        let found = find(&heap, &TypeRegistry::new(), &a, &(&class).into(), true);
        assert_eq!(found.len(), 2);
    }

    #[test]
    fn test_invalid_classinfo_fails_eagerly() {
        let heap = Heap::new();
        let atomics = AtomicTypes::default();
        let result = find_instances_of_type(
            &heap,
            &atomics,
            &TypeRegistry::new(),
            &Value::None,
            &ClassInfo::Union(vec![]),
            true,
        );
        assert!(matches!(result, Err(TraversalError::InvalidClassInfo(_))));
    }
}
