//! Arena storage for compound values.
//!
//! Every list, tuple, set, dict and object lives in a [`Heap`] and is referred
//! to by [`NodeId`]. Nodes are never freed while the heap lives, so an id is a
//! stable identity for the duration of any traversal or serialization pass.
//!
//! # Examples
//!
//! ```rust
//! use mixforge_core::{Heap, Value};
//!
//! let mut heap = Heap::new();
//! let inner = heap.list(vec![Value::Int(1)]);
//! let outer = heap.list(vec![inner.clone(), inner.clone()]);
//!
//! // Both slots refer to the same node.
//! let id = outer.node_id().unwrap();
//! let items = heap.elements(id).unwrap();
//! assert!(items[0].is_same(&items[1]));
//! ```

use std::collections::HashSet;
use std::sync::Arc;

use crate::class::{ClassDef, ContainerProtocol};
use crate::error::{ModelError, Result};
use crate::keys::{KeyIndex, key_hash};
use crate::types::{BuiltinKind, ValueType};
use crate::value::{Callable, NodeId, Value};

/// A mapping node: insertion-ordered entries with unique keys.
#[derive(Debug, Clone, Default)]
pub struct DictNode {
    /// Key/value pairs in insertion order
    pub entries: Vec<(Value, Value)>,
    /// Produces the value for a missing key, if set
    pub default_factory: Option<Callable>,
}

/// Item storage of a container-like object.
#[derive(Debug, Clone)]
pub enum Items {
    /// Sequence items
    Sequence(Vec<Value>),
    /// Mapping entries
    Mapping(Vec<(Value, Value)>),
}

impl Items {
    fn empty_for(protocol: ContainerProtocol) -> Self {
        match protocol {
            ContainerProtocol::Sequence(_) => Self::Sequence(Vec::new()),
            ContainerProtocol::Mapping => Self::Mapping(Vec::new()),
        }
    }

    /// Number of items or entries.
    pub fn len(&self) -> usize {
        match self {
            Self::Sequence(items) => items.len(),
            Self::Mapping(entries) => entries.len(),
        }
    }

    /// Whether there are no items.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// An instance of a user class.
///
/// `slots` always has one entry per name in [`ClassDef::slots`]; `dict` is
/// present exactly when [`ClassDef::has_dict`] is true.
#[derive(Debug, Clone)]
pub struct ObjectNode {
    /// Class descriptor
    pub class: Arc<ClassDef>,
    /// Slot values, `None` when unassigned
    pub slots: Vec<Option<Value>>,
    /// Dynamic field mapping
    pub dict: Option<Vec<(String, Value)>>,
    /// Container items, when the class declares a container protocol
    pub items: Option<Items>,
}

impl ObjectNode {
    /// Value of an assigned slot.
    pub fn slot(&self, name: &str) -> Option<&Value> {
        self.class
            .slot_index(name)
            .and_then(|i| self.slots.get(i))
            .and_then(Option::as_ref)
    }

    /// Value of a dynamic field.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.dict
            .as_ref()
            .and_then(|d| d.iter().find(|(n, _)| n == name))
            .map(|(_, v)| v)
    }
}

/// A heap node.
#[derive(Debug, Clone)]
pub enum Node {
    /// Mutable ordered sequence
    List(Vec<Value>),
    /// Immutable ordered sequence
    Tuple(Vec<Value>),
    /// Mutable unordered collection of distinct values
    Set(Vec<Value>),
    /// Immutable unordered collection of distinct values
    FrozenSet(Vec<Value>),
    /// Mapping
    Dict(DictNode),
    /// Class instance
    Object(ObjectNode),
}

impl Node {
    /// Short kind name for diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::List(_) => "list",
            Self::Tuple(_) => "tuple",
            Self::Set(_) => "set",
            Self::FrozenSet(_) => "frozenset",
            Self::Dict(_) => "dict",
            Self::Object(_) => "object",
        }
    }

    /// Elements of a list, tuple, set or frozenset.
    pub fn elements(&self) -> Option<&[Value]> {
        match self {
            Self::List(v) | Self::Tuple(v) | Self::Set(v) | Self::FrozenSet(v) => Some(v),
            _ => None,
        }
    }
}

/// Arena of compound values.
#[derive(Debug, Clone, Default)]
pub struct Heap {
    nodes: Vec<Node>,
}

impl Heap {
    /// Create an empty heap.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty heap with room for `capacity` nodes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity),
        }
    }

    /// Number of allocated nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether no node was allocated yet.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Store a node and return its identity.
    ///
    /// # Panics
    ///
    /// Panics once every `u32` node id is taken; use [`Heap::try_alloc`] to
    /// get an error instead.
    pub fn alloc(&mut self, node: Node) -> NodeId {
        match self.try_alloc(node) {
            Ok(id) => id,
            Err(err) => panic!("{err}"),
        }
    }

    /// Store a node, failing once node ids are exhausted.
    ///
    /// # Errors
    ///
    /// Returns `ModelError::HeapFull` when every `u32` node id is taken.
    pub fn try_alloc(&mut self, node: Node) -> Result<NodeId> {
        let id = next_id(self.nodes.len())?;
        self.nodes.push(node);
        Ok(id)
    }

    /// Node by id.
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    /// Mutable node by id.
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.index())
    }

    /// Node by id, failing on ids from another heap.
    pub fn node(&self, id: NodeId) -> Result<&Node> {
        self.get(id).ok_or(ModelError::DanglingRef(id))
    }

    /// Mutable node by id, failing on ids from another heap.
    pub fn node_mut(&mut self, id: NodeId) -> Result<&mut Node> {
        self.get_mut(id).ok_or(ModelError::DanglingRef(id))
    }

    /// Object node by id.
    pub fn object_node(&self, id: NodeId) -> Result<&ObjectNode> {
        match self.node(id)? {
            Node::Object(obj) => Ok(obj),
            other => Err(ModelError::wrong_kind("object", other.kind_name())),
        }
    }

    /// Elements of a list, tuple, set or frozenset node.
    pub fn elements(&self, id: NodeId) -> Result<&[Value]> {
        let node = self.node(id)?;
        node.elements()
            .ok_or_else(|| ModelError::wrong_kind("sequence or set", node.kind_name()))
    }

    // --- constructors -------------------------------------------------

    /// Allocate a list.
    pub fn list(&mut self, items: Vec<Value>) -> Value {
        Value::Ref(self.alloc(Node::List(items)))
    }

    /// Allocate a tuple.
    pub fn tuple(&mut self, items: Vec<Value>) -> Value {
        Value::Ref(self.alloc(Node::Tuple(items)))
    }

    /// Allocate a set, dropping structurally equal duplicates.
    pub fn set(&mut self, items: Vec<Value>) -> Value {
        let items = self.distinct(items);
        Value::Ref(self.alloc(Node::Set(items)))
    }

    /// Allocate a frozenset, dropping structurally equal duplicates.
    pub fn frozenset(&mut self, items: Vec<Value>) -> Value {
        let items = self.distinct(items);
        Value::Ref(self.alloc(Node::FrozenSet(items)))
    }

    /// Allocate a dict; a later entry replaces an earlier one with an equal key.
    pub fn dict(&mut self, entries: Vec<(Value, Value)>) -> Value {
        let entries = self.distinct_entries(entries);
        Value::Ref(self.alloc(Node::Dict(DictNode {
            entries,
            default_factory: None,
        })))
    }

    /// Allocate a dict whose missing keys are produced by `factory`.
    pub fn default_dict(&mut self, factory: Callable, entries: Vec<(Value, Value)>) -> Value {
        let entries = self.distinct_entries(entries);
        Value::Ref(self.alloc(Node::Dict(DictNode {
            entries,
            default_factory: Some(factory),
        })))
    }

    /// Allocate a dict with string keys.
    pub fn str_dict<I, K>(&mut self, entries: I) -> Value
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        let entries = entries
            .into_iter()
            .map(|(k, v)| (Value::Str(k.into()), v))
            .collect();
        self.dict(entries)
    }

    /// Allocate a bare instance: no slot assigned, empty field mapping, no items.
    ///
    /// # Errors
    ///
    /// Returns `ModelError::InvalidClass` for enumeration classes, whose
    /// members are obtained with [`ClassDef::member`].
    pub fn instantiate(&mut self, class: &Arc<ClassDef>) -> Result<Value> {
        if class.is_enum() {
            return Err(ModelError::invalid_class(
                class.key().tag(),
                "enumeration classes cannot be instantiated",
            ));
        }
        let node = ObjectNode {
            class: Arc::clone(class),
            slots: vec![None; class.slots().len()],
            dict: class.has_dict().then(Vec::new),
            items: class.container().map(Items::empty_for),
        };
        Ok(Value::Ref(self.alloc(Node::Object(node))))
    }

    /// Allocate an instance and assign the given attributes.
    pub fn object<I, K, V>(&mut self, class: &Arc<ClassDef>, attrs: I) -> Result<Value>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let obj = self.instantiate(class)?;
        if let Value::Ref(id) = obj {
            for (name, value) in attrs {
                self.set_attr(id, &name.into(), value.into())?;
            }
        }
        Ok(obj)
    }

    // --- mutation -----------------------------------------------------

    /// Append to a list.
    pub fn list_push(&mut self, id: NodeId, value: Value) -> Result<()> {
        match self.node_mut(id)? {
            Node::List(items) => {
                items.push(value);
                Ok(())
            }
            other => Err(ModelError::wrong_kind("list", other.kind_name())),
        }
    }

    /// Add to a set unless a structurally equal element is present.
    pub fn set_add(&mut self, id: NodeId, value: Value) -> Result<()> {
        let present = match self.node(id)? {
            Node::Set(items) => self.position_in(items.iter(), &value).is_some(),
            other => return Err(ModelError::wrong_kind("set", other.kind_name())),
        };
        if !present {
            if let Node::Set(items) = self.node_mut(id)? {
                items.push(value);
            }
        }
        Ok(())
    }

    /// Insert or replace an entry of a dict or a mapping object.
    pub fn dict_insert(&mut self, id: NodeId, key: Value, value: Value) -> Result<()> {
        let position = self.position_in(self.entries(id)?.iter().map(|(k, _)| k), &key);
        let entries = self.entries_mut(id)?;
        match position {
            Some(i) => entries[i].1 = value,
            None => entries.push((key, value)),
        }
        Ok(())
    }

    /// Insert or replace many entries of a dict or a mapping object.
    ///
    /// Later entries win over earlier ones with an equal key, as with
    /// repeated [`Heap::dict_insert`].
    pub fn dict_extend(&mut self, id: NodeId, entries: Vec<(Value, Value)>) -> Result<()> {
        let mut merged = self.entries(id)?.to_vec();
        self.merge_entries(&mut merged, entries);
        *self.entries_mut(id)? = merged;
        Ok(())
    }

    /// Entry of a dict or a mapping object.
    pub fn dict_get(&self, id: NodeId, key: &Value) -> Result<Option<Value>> {
        let entries = self.entries(id)?;
        Ok(self
            .position_in(entries.iter().map(|(k, _)| k), key)
            .map(|i| entries[i].1.clone()))
    }

    /// Entry of a dict; a missing key is filled from the default factory.
    ///
    /// # Errors
    ///
    /// Returns `ModelError::MissingKey` when the key is absent and the dict
    /// has no default factory.
    pub fn dict_get_or_default(&mut self, id: NodeId, key: Value) -> Result<Value> {
        if let Some(value) = self.dict_get(id, &key)? {
            return Ok(value);
        }
        let factory = match self.node(id)? {
            Node::Dict(dict) => dict.default_factory.clone(),
            _ => None,
        };
        let factory = factory.ok_or_else(|| ModelError::MissingKey(self.describe(&key)))?;
        let value = factory
            .call(self, &[])
            .map_err(|e| ModelError::hook(format!("default factory {}", factory.name()), e))?;
        self.dict_insert(id, key, value.clone())?;
        Ok(value)
    }

    /// Append an item to a sequence-like object.
    pub fn items_push(&mut self, id: NodeId, value: Value) -> Result<()> {
        match self.node_mut(id)? {
            Node::Object(ObjectNode {
                items: Some(Items::Sequence(items)),
                ..
            }) => {
                items.push(value);
                Ok(())
            }
            other => Err(ModelError::wrong_kind("sequence object", other.kind_name())),
        }
    }

    fn entries(&self, id: NodeId) -> Result<&[(Value, Value)]> {
        match self.node(id)? {
            Node::Dict(dict) => Ok(&dict.entries),
            Node::Object(ObjectNode {
                items: Some(Items::Mapping(entries)),
                ..
            }) => Ok(entries),
            other => Err(ModelError::wrong_kind("mapping", other.kind_name())),
        }
    }

    fn entries_mut(&mut self, id: NodeId) -> Result<&mut Vec<(Value, Value)>> {
        match self.node_mut(id)? {
            Node::Dict(dict) => Ok(&mut dict.entries),
            Node::Object(ObjectNode {
                items: Some(Items::Mapping(entries)),
                ..
            }) => Ok(entries),
            other => Err(ModelError::wrong_kind("mapping", other.kind_name())),
        }
    }

    // --- attributes ---------------------------------------------------

    /// Read an attribute: a declared slot first, then the field mapping.
    pub fn get_attr(&self, id: NodeId, name: &str) -> Result<Value> {
        let obj = self.object_node(id)?;
        if let Some(index) = obj.class.slot_index(name) {
            return obj.slots[index].clone().ok_or_else(|| ModelError::UninitializedSlot {
                class: obj.class.name().to_string(),
                name: name.to_string(),
            });
        }
        obj.field(name)
            .cloned()
            .ok_or_else(|| ModelError::attribute(obj.class.name(), name))
    }

    /// Assign an attribute: a declared slot if the schema has one, else the
    /// field mapping if the class has one.
    ///
    /// # Errors
    ///
    /// Returns `ModelError::Attribute` for computed names and for names that
    /// have no storage on this class.
    pub fn set_attr(&mut self, id: NodeId, name: &str, value: Value) -> Result<()> {
        let obj = match self.node_mut(id)? {
            Node::Object(obj) => obj,
            other => return Err(ModelError::wrong_kind("object", other.kind_name())),
        };
        if obj.class.computed().iter().any(|c| c == name) {
            return Err(ModelError::attribute(obj.class.name(), name));
        }
        if let Some(index) = obj.class.slot_index(name) {
            obj.slots[index] = Some(value);
            return Ok(());
        }
        match obj.dict.as_mut() {
            Some(dict) => {
                match dict.iter_mut().find(|(n, _)| n == name) {
                    Some(entry) => entry.1 = value,
                    None => dict.push((name.to_string(), value)),
                }
                Ok(())
            }
            None => Err(ModelError::attribute(obj.class.name(), name)),
        }
    }

    // --- typing -------------------------------------------------------

    /// Type of a value.
    pub fn type_of(&self, value: &Value) -> Result<ValueType> {
        let kind = match value {
            Value::None => BuiltinKind::NoneType,
            Value::Bool(_) => BuiltinKind::Bool,
            Value::Int(_) => BuiltinKind::Int,
            Value::Float(_) => BuiltinKind::Float,
            Value::Str(_) => BuiltinKind::Str,
            Value::Bytes(_) => BuiltinKind::Bytes,
            Value::Date(_) => BuiltinKind::Date,
            Value::DateTime(_) => BuiltinKind::DateTime,
            Value::Uuid(_) => BuiltinKind::Uuid,
            Value::Path(_) => BuiltinKind::Path,
            Value::Type(_) => BuiltinKind::Type,
            Value::Callable(_) => BuiltinKind::Callable,
            Value::Enum(member) => return Ok(ValueType::Class(Arc::clone(member.class()))),
            Value::Ref(id) => match self.node(*id)? {
                Node::List(_) => BuiltinKind::List,
                Node::Tuple(_) => BuiltinKind::Tuple,
                Node::Set(_) => BuiltinKind::Set,
                Node::FrozenSet(_) => BuiltinKind::FrozenSet,
                Node::Dict(_) => BuiltinKind::Dict,
                Node::Object(obj) => return Ok(ValueType::Class(Arc::clone(&obj.class))),
            },
        };
        Ok(ValueType::Builtin(kind))
    }

    /// Type name for diagnostics; `<dangling>` for foreign references.
    pub fn type_name(&self, value: &Value) -> String {
        self.type_of(value)
            .map(|t| t.name().to_string())
            .unwrap_or_else(|_| "<dangling>".to_string())
    }

    /// Short rendering of a value for error messages.
    pub fn describe(&self, value: &Value) -> String {
        match value {
            Value::Str(s) => format!("'{s}'"),
            Value::Int(i) => i.to_string(),
            Value::Bool(b) => b.to_string(),
            Value::None => "None".to_string(),
            other => format!("<{}>", self.type_name(other)),
        }
    }

    // --- structural equality ------------------------------------------

    /// Structural equality.
    ///
    /// Identical references are equal without inspection; sets and dicts
    /// compare without regard to order; object comparison requires the same
    /// class. Cyclic graphs terminate: a pair of nodes already under
    /// comparison is assumed equal.
    pub fn deep_eq(&self, a: &Value, b: &Value) -> bool {
        let mut assumed = HashSet::new();
        self.values_eq(a, b, &mut assumed)
    }

    fn values_eq(&self, a: &Value, b: &Value, assumed: &mut HashSet<(NodeId, NodeId)>) -> bool {
        match (a, b) {
            (Value::Ref(x), Value::Ref(y)) => {
                if x == y || !assumed.insert((*x, *y)) {
                    return true;
                }
                match (self.get(*x), self.get(*y)) {
                    (Some(left), Some(right)) => self.nodes_eq(left, right, assumed),
                    _ => false,
                }
            }
            (Value::Ref(_), _) | (_, Value::Ref(_)) => false,
            _ => a == b,
        }
    }

    fn nodes_eq(&self, a: &Node, b: &Node, assumed: &mut HashSet<(NodeId, NodeId)>) -> bool {
        match (a, b) {
            (Node::List(x), Node::List(y)) | (Node::Tuple(x), Node::Tuple(y)) => {
                self.seq_eq(x, y, assumed)
            }
            (Node::Set(x) | Node::FrozenSet(x), Node::Set(y) | Node::FrozenSet(y)) => {
                self.unordered_eq(x, y, assumed)
            }
            (Node::Dict(x), Node::Dict(y)) => self.entries_eq(&x.entries, &y.entries, assumed),
            (Node::Object(x), Node::Object(y)) => self.objects_eq(x, y, assumed),
            _ => false,
        }
    }

    fn objects_eq(
        &self,
        a: &ObjectNode,
        b: &ObjectNode,
        assumed: &mut HashSet<(NodeId, NodeId)>,
    ) -> bool {
        if a.class.key() != b.class.key() || a.slots.len() != b.slots.len() {
            return false;
        }
        let slots_eq = a.slots.iter().zip(&b.slots).all(|pair| match pair {
            (Some(x), Some(y)) => self.values_eq(x, y, assumed),
            (None, None) => true,
            _ => false,
        });
        if !slots_eq {
            return false;
        }
        let dict_eq = match (&a.dict, &b.dict) {
            (Some(x), Some(y)) => {
                x.len() == y.len()
                    && x.iter().all(|(name, value)| {
                        y.iter()
                            .find(|(n, _)| n == name)
                            .is_some_and(|(_, other)| self.values_eq(value, other, assumed))
                    })
            }
            (None, None) => true,
            _ => false,
        };
        dict_eq
            && match (&a.items, &b.items) {
                (Some(Items::Sequence(x)), Some(Items::Sequence(y))) => self.seq_eq(x, y, assumed),
                (Some(Items::Mapping(x)), Some(Items::Mapping(y))) => {
                    self.entries_eq(x, y, assumed)
                }
                (None, None) => true,
                _ => false,
            }
    }

    fn seq_eq(&self, a: &[Value], b: &[Value], assumed: &mut HashSet<(NodeId, NodeId)>) -> bool {
        a.len() == b.len() && a.iter().zip(b).all(|(x, y)| self.values_eq(x, y, assumed))
    }

    fn unordered_eq(
        &self,
        a: &[Value],
        b: &[Value],
        assumed: &mut HashSet<(NodeId, NodeId)>,
    ) -> bool {
        if a.len() != b.len() {
            return false;
        }
        let index = KeyIndex::from_keys(b);
        let mut used = vec![false; b.len()];
        'outer: for x in a {
            let candidates = index.candidates(x);
            if key_hash(x).is_some() {
                // inline values never touch `assumed`
                match candidates.iter().copied().find(|&i| !used[i] && b[i] == *x) {
                    Some(i) => {
                        used[i] = true;
                        continue 'outer;
                    }
                    None => return false,
                }
            }
            for &i in candidates {
                if used[i] {
                    continue;
                }
                let mut trial = assumed.clone();
                if self.values_eq(x, &b[i], &mut trial) {
                    *assumed = trial;
                    used[i] = true;
                    continue 'outer;
                }
            }
            return false;
        }
        true
    }

    fn entries_eq(
        &self,
        a: &[(Value, Value)],
        b: &[(Value, Value)],
        assumed: &mut HashSet<(NodeId, NodeId)>,
    ) -> bool {
        if a.len() != b.len() {
            return false;
        }
        let index = KeyIndex::from_keys(b.iter().map(|(k, _)| k));
        a.iter().all(|(key, value)| {
            let candidates = index.candidates(key);
            if key_hash(key).is_some() {
                let mut hits = candidates.iter().copied().filter(|&i| b[i].0 == *key);
                match (hits.next(), hits.next()) {
                    (None, _) => return false,
                    (Some(i), None) => return self.values_eq(value, &b[i].1, assumed),
                    _ => {}
                }
            }
            candidates.iter().any(|&i| {
                let (k, v) = &b[i];
                let mut trial = assumed.clone();
                if self.values_eq(key, k, &mut trial) && self.values_eq(value, v, &mut trial) {
                    *assumed = trial;
                    true
                } else {
                    false
                }
            })
        })
    }

    /// Position of the first value structurally equal to `needle`.
    fn position_in<'a>(
        &self,
        mut haystack: impl Iterator<Item = &'a Value>,
        needle: &Value,
    ) -> Option<usize> {
        if key_hash(needle).is_some() {
            haystack.position(|v| v == needle)
        } else {
            haystack.position(|v| self.deep_eq(v, needle))
        }
    }

    fn distinct(&self, items: Vec<Value>) -> Vec<Value> {
        let mut out: Vec<Value> = Vec::with_capacity(items.len());
        let mut index = KeyIndex::with_capacity(items.len());
        for item in items {
            let present = index
                .candidates(&item)
                .iter()
                .any(|&i| self.deep_eq(&out[i], &item));
            if !present {
                index.insert(&item, out.len());
                out.push(item);
            }
        }
        out
    }

    fn distinct_entries(&self, entries: Vec<(Value, Value)>) -> Vec<(Value, Value)> {
        let mut out = Vec::with_capacity(entries.len());
        self.merge_entries(&mut out, entries);
        out
    }

    /// Merge `entries` into `out`; an equal key replaces the stored value.
    fn merge_entries(&self, out: &mut Vec<(Value, Value)>, entries: Vec<(Value, Value)>) {
        let mut index = KeyIndex::from_keys(out.iter().map(|(k, _)| k));
        for (key, value) in entries {
            let found = index
                .candidates(&key)
                .iter()
                .copied()
                .find(|&i| self.deep_eq(&out[i].0, &key));
            match found {
                Some(i) => out[i].1 = value,
                None => {
                    index.insert(&key, out.len());
                    out.push((key, value));
                }
            }
        }
    }
}

/// Id of the node stored after `len` existing ones.
fn next_id(len: usize) -> Result<NodeId> {
    u32::try_from(len)
        .map(NodeId::new)
        .map_err(|_| ModelError::HeapFull(len))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point_class() -> Arc<ClassDef> {
        ClassDef::builder("geometry", "Point").slots(["x", "y"]).build().unwrap()
    }

    #[test]
    fn test_set_and_dict_deduplicate() {
        let mut heap = Heap::new();
        let set = heap.set(vec![Value::Int(1), Value::Float(1.0), Value::Int(2)]);
        assert_eq!(heap.elements(set.node_id().unwrap()).unwrap().len(), 2);

        let dict = heap.dict(vec![
            (Value::str("a"), Value::Int(1)),
            (Value::str("a"), Value::Int(2)),
        ]);
        let id = dict.node_id().unwrap();
        assert_eq!(heap.dict_get(id, &Value::str("a")).unwrap(), Some(Value::Int(2)));
    }

    #[test]
    fn test_structural_keys_deduplicate_alongside_scalars() {
        let mut heap = Heap::new();
        let k1 = heap.tuple(vec![Value::Int(1), Value::str("x")]);
        let k2 = heap.tuple(vec![Value::Int(1), Value::str("x")]);
        let dict = heap.dict(vec![
            (k1.clone(), Value::Int(1)),
            (Value::Int(1), Value::str("int")),
            (k2, Value::Int(2)),
            (Value::Float(1.0), Value::str("float")),
        ]);
        let id = dict.node_id().unwrap();

        let entries = heap.entries(id).unwrap();
        assert_eq!(entries.len(), 2);
        assert!(entries[0].0.is_same(&k1));
        assert_eq!(entries[0].1, Value::Int(2));
        assert_eq!(entries[1], (Value::Int(1), Value::str("float")));
    }

    #[test]
    fn test_dict_extend_replaces_equal_keys() {
        let mut heap = Heap::new();
        let dict = heap.dict(vec![(Value::str("a"), Value::Int(1))]);
        let id = dict.node_id().unwrap();

        heap.dict_extend(
            id,
            vec![
                (Value::str("b"), Value::Int(2)),
                (Value::str("a"), Value::Int(3)),
                (Value::str("b"), Value::Int(4)),
            ],
        )
        .unwrap();
        assert_eq!(
            heap.entries(id).unwrap(),
            &[(Value::str("a"), Value::Int(3)), (Value::str("b"), Value::Int(4))]
        );
    }

    #[test]
    fn test_large_dicts_build_and_compare_in_bounded_time() {
        let n = 50_000;
        let mut heap = Heap::new();
        let started = std::time::Instant::now();
        let forward: Vec<_> = (0..n).map(|i| (Value::str(format!("k{i}")), Value::Int(i))).collect();
        let mut backward = forward.clone();
        backward.reverse();

        let a = heap.dict(forward);
        let b = heap.dict(backward);
        let s = heap.set((0..n).map(Value::Int).collect());
        let t = heap.set((0..n).rev().map(Value::Int).collect());

        assert!(heap.deep_eq(&a, &b));
        assert!(heap.deep_eq(&s, &t));
        assert_eq!(heap.elements(s.node_id().unwrap()).unwrap().len(), n as usize);
        let elapsed = started.elapsed();
        assert!(elapsed < std::time::Duration::from_secs(3), "took {elapsed:?}");
    }

    #[test]
    fn test_nan_keys_never_collapse() {
        let mut heap = Heap::new();
        let set = heap.set(vec![Value::Float(f64::NAN), Value::Float(f64::NAN)]);
        assert_eq!(heap.elements(set.node_id().unwrap()).unwrap().len(), 2);
    }

    #[cfg(target_pointer_width = "64")]
    #[test]
    fn test_node_ids_do_not_wrap() {
        let last = u32::MAX as usize;
        assert_eq!(next_id(last).unwrap(), NodeId::new(u32::MAX));
        assert!(matches!(next_id(last + 1), Err(ModelError::HeapFull(n)) if n == last + 1));
    }

    #[test]
    fn test_deep_eq_is_order_insensitive_for_sets_and_dicts() {
        let mut heap = Heap::new();
        let a = heap.set(vec![Value::Int(1), Value::Int(2)]);
        let b = heap.frozenset(vec![Value::Int(2), Value::Int(1)]);
        assert!(heap.deep_eq(&a, &b));

        let d1 = heap.str_dict([("x", Value::Int(1)), ("y", Value::Int(2))]);
        let d2 = heap.str_dict([("y", Value::Int(2)), ("x", Value::Int(1))]);
        assert!(heap.deep_eq(&d1, &d2));

        let l = heap.list(vec![Value::Int(1)]);
        let t = heap.tuple(vec![Value::Int(1)]);
        assert!(!heap.deep_eq(&l, &t));
    }

    #[test]
    fn test_deep_eq_terminates_on_cycles() {
        let mut heap = Heap::new();
        let a = heap.list(vec![Value::Int(1)]);
        let b = heap.list(vec![Value::Int(1)]);
        heap.list_push(a.node_id().unwrap(), a.clone()).unwrap();
        heap.list_push(b.node_id().unwrap(), b.clone()).unwrap();
        assert!(heap.deep_eq(&a, &b));
    }

    #[test]
    fn test_attribute_storage() {
        let point = point_class();
        let mut heap = Heap::new();
        let p = heap.object(&point, [("x", 1)]).unwrap();
        let id = p.node_id().unwrap();

        assert_eq!(heap.get_attr(id, "x").unwrap(), Value::Int(1));
        assert!(matches!(
            heap.get_attr(id, "y"),
            Err(ModelError::UninitializedSlot { .. })
        ));
        assert!(matches!(
            heap.set_attr(id, "z", Value::Int(3)),
            Err(ModelError::Attribute { .. })
        ));

        let plain = ClassDef::builder("app", "Plain").build().unwrap();
        let obj = heap.object(&plain, [("anything", "goes")]).unwrap();
        assert_eq!(
            heap.get_attr(obj.node_id().unwrap(), "anything").unwrap(),
            Value::str("goes")
        );
    }

    #[test]
    fn test_default_dict_fills_missing_keys() {
        let mut heap = Heap::new();
        let counts = heap.default_dict(Callable::constant("int", Value::Int(0)), vec![]);
        let id = counts.node_id().unwrap();

        assert_eq!(heap.dict_get_or_default(id, Value::str("a")).unwrap(), Value::Int(0));
        assert_eq!(heap.dict_get(id, &Value::str("a")).unwrap(), Some(Value::Int(0)));

        let plain = heap.dict(vec![]);
        assert!(matches!(
            heap.dict_get_or_default(plain.node_id().unwrap(), Value::str("a")),
            Err(ModelError::MissingKey(_))
        ));
    }

    #[test]
    fn test_type_of() {
        let point = point_class();
        let mut heap = Heap::new();
        let p = heap.instantiate(&point).unwrap();
        let l = heap.list(vec![]);

        assert_eq!(heap.type_of(&p).unwrap().key(), point.key().clone());
        assert_eq!(heap.type_of(&l).unwrap().name(), "list");
        assert_eq!(heap.type_of(&Value::Bool(true)).unwrap().name(), "bool");
        assert!(heap.type_of(&Value::Ref(NodeId::new(99))).is_err());
    }

    #[test]
    fn test_enum_classes_cannot_be_instantiated() {
        let color = ClassDef::enumeration("palette", "Color", ["RED"]).unwrap();
        let mut heap = Heap::new();
        assert!(heap.instantiate(&color).is_err());
    }

    #[test]
    fn test_objects_compare_by_class_and_content() {
        let point = point_class();
        let other = ClassDef::builder("geometry", "Vector").slots(["x", "y"]).build().unwrap();
        let mut heap = Heap::new();
        let a = heap.object(&point, [("x", 1), ("y", 2)]).unwrap();
        let b = heap.object(&point, [("x", 1), ("y", 2)]).unwrap();
        let c = heap.object(&other, [("x", 1), ("y", 2)]).unwrap();

        assert!(heap.deep_eq(&a, &b));
        assert!(!heap.deep_eq(&a, &c));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn prop_set_equality_ignores_order(mut items in prop::collection::vec(-50i64..50, 0..12)) {
            let mut heap = Heap::new();
            let a = heap.set(items.iter().copied().map(Value::Int).collect());
            items.reverse();
            let b = heap.set(items.into_iter().map(Value::Int).collect());
            prop_assert!(heap.deep_eq(&a, &b));
        }

        #[test]
        fn prop_dict_equality_ignores_order(keys in prop::collection::hash_set(-500i64..500, 0..40)) {
            let mut heap = Heap::new();
            let entries: Vec<_> = keys.iter().map(|&k| (Value::Int(k), Value::str(k.to_string()))).collect();
            let mut shuffled = entries.clone();
            shuffled.reverse();
            let a = heap.dict(entries);
            let b = heap.dict(shuffled.clone());
            prop_assert!(heap.deep_eq(&a, &b));

            if let Some((key, _)) = shuffled.first().cloned() {
                shuffled[0] = (key, Value::None);
                let c = heap.dict(shuffled);
                prop_assert!(!heap.deep_eq(&a, &c));
            }
        }

        #[test]
        fn prop_list_equality_is_positional(items in prop::collection::vec(any::<i64>(), 2..10)) {
            let mut heap = Heap::new();
            let a = heap.list(items.iter().copied().map(Value::Int).collect());
            let mut rotated = items.clone();
            rotated.rotate_left(1);
            let b = heap.list(rotated.iter().copied().map(Value::Int).collect());
            prop_assert_eq!(heap.deep_eq(&a, &b), items == rotated);
        }
    }
}
