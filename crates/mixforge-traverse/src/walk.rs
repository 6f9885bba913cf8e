//! Depth-first, cycle-safe walking of an object graph.
//!
//! [`Walk`] keeps its own stack of child iterators, so arbitrarily deep graphs
//! never grow the call stack. Every heap node is visited at most once per
//! walk; inline values (numbers, strings, enum members) have no identity and
//! are yielded every time they occur.

use std::collections::HashSet;

use mixforge_core::{NodeId, Value};

use crate::error::Result;

/// Pre-order iterator over a graph.
///
/// The `expand` policy decides which values have children and what they are;
/// returning `Ok(None)` makes the value a leaf. The root itself is yielded
/// first.
pub struct Walk<F> {
    stack: Vec<std::vec::IntoIter<Value>>,
    seen: HashSet<NodeId>,
    expand: F,
}

impl<F> Walk<F>
where
    F: FnMut(&Value) -> Result<Option<Vec<Value>>>,
{
    /// Start a walk at `root`.
    pub fn new(root: Value, expand: F) -> Self {
        Self {
            stack: vec![vec![root].into_iter()],
            seen: HashSet::new(),
            expand,
        }
    }

    /// Number of distinct nodes visited so far.
    pub fn visited(&self) -> usize {
        self.seen.len()
    }
}

impl<F> Iterator for Walk<F>
where
    F: FnMut(&Value) -> Result<Option<Vec<Value>>>,
{
    type Item = Result<Value>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let frame = self.stack.last_mut()?;
            let Some(value) = frame.next() else {
                self.stack.pop();
                continue;
            };
            if let Some(id) = value.node_id() {
                if !self.seen.insert(id) {
                    continue;
                }
            }
            match (self.expand)(&value) {
                Ok(Some(children)) => self.stack.push(children.into_iter()),
                Ok(None) => {}
                Err(e) => {
                    // A failed walk yields nothing further.
                    self.stack.clear();
                    return Some(Err(e));
                }
            }
            return Some(Ok(value));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TraversalError;
    use mixforge_core::{Heap, ModelError};
    use pretty_assertions::assert_eq;

    fn elements(heap: &Heap) -> impl FnMut(&Value) -> Result<Option<Vec<Value>>> + '_ {
        |value| match value.node_id() {
            Some(id) => Ok(Some(heap.elements(id)?.to_vec())),
            None => Ok(None),
        }
    }

    #[test]
    fn test_pre_order_with_root_first() {
        let mut heap = Heap::new();
        let inner = heap.list(vec![Value::Int(2), Value::Int(3)]);
        let root = heap.list(vec![Value::Int(1), inner.clone(), Value::Int(4)]);

        let visited: Vec<Value> = Walk::new(root.clone(), elements(&heap))
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(
            visited,
            vec![root, Value::Int(1), inner, Value::Int(2), Value::Int(3), Value::Int(4)]
        );
    }

    #[test]
    fn test_shared_and_cyclic_nodes_visited_once() {
        let mut heap = Heap::new();
        let shared = heap.list(vec![Value::Int(7)]);
        let root = heap.list(vec![shared.clone(), shared.clone()]);
        let id = root.node_id().unwrap();
        heap.list_push(id, root.clone()).unwrap();

        let mut walk = Walk::new(root, elements(&heap));
        let visited: Vec<Value> = walk.by_ref().collect::<Result<_>>().unwrap();
        assert_eq!(visited.len(), 3);
        assert_eq!(walk.visited(), 2);
    }

    #[test]
    fn test_deep_nesting_does_not_recurse() {
        let mut heap = Heap::new();
        let mut value = Value::Int(0);
        for _ in 0..50_000 {
            value = heap.list(vec![value]);
        }
        assert_eq!(Walk::new(value, elements(&heap)).count(), 50_001);
    }

    #[test]
    fn test_error_ends_the_walk() {
        let mut heap = Heap::new();
        let root = heap.list(vec![Value::Int(1), Value::Int(2)]);
        let mut calls = 0;
        let mut walk = Walk::new(root, |_: &Value| {
            calls += 1;
            if calls == 2 {
                return Err(TraversalError::from(ModelError::attribute("X", "y")));
            }
            Ok(Some(vec![Value::Int(1), Value::Int(2)]))
        });

        assert!(walk.next().unwrap().is_ok());
        assert!(walk.next().unwrap().is_err());
        assert!(walk.next().is_none());
    }
}
