//! Object graph → JSON tree.
//!
//! The encoder walks the graph recursively, keeping the set of node ids on
//! the active path. A node that reappears while still on the path is a cycle
//! and fails the whole call; a node reachable through two separate paths is
//! simply encoded twice.
//!
//! Dispatch order for an object node:
//!
//! 1. `params` hook → `(MODULE, CLASS, PARAMS)` record
//! 2. declared container protocol → array / `TUPLE` / `SET` / `DICT`
//!    (lossy: the class is not recorded, as for builtin container subclasses)
//! 3. `get_state` hook → `(MODULE, CLASS, STATE)` record
//! 4. declared slots → `STATE` of `(slot values, field mapping | null)`
//! 5. field mapping → `STATE` of the mapping
//! 6. anything else is unsupported

use std::collections::HashSet;

use mixforge_core::{
    ContainerProtocol, Fields, Heap, Items, ModelError, Node, NodeId, ObjectNode, SequenceFlavor,
    Value,
};
use serde_json::{Map, Number, Value as Json};
use tracing::trace;

use crate::builtins;
use crate::error::{CodecError, Result};
use crate::markers;

/// Encode a value into a JSON tree.
///
/// # Errors
///
/// Returns `CodecError::Cycle` if the value contains itself,
/// `CodecError::Unsupported` for types and callables or objects with no
/// storage, and `CodecError::UnsupportedKey` for non-string mapping keys.
pub fn serialize(heap: &Heap, value: &Value) -> Result<Json> {
    Encoder::new(heap).encode(value)
}

/// Encode named fields as a `DICT` record.
pub fn serialize_fields(heap: &Heap, fields: &Fields) -> Result<Json> {
    let payload = Encoder::new(heap).encode_fields(fields)?;
    Ok(tagged(markers::DICT, payload))
}

/// Recursive encoder with an active-path cycle guard.
pub struct Encoder<'h> {
    heap: &'h Heap,
    path: HashSet<NodeId>,
}

impl<'h> Encoder<'h> {
    /// Create an encoder over a heap.
    pub fn new(heap: &'h Heap) -> Self {
        Self {
            heap,
            path: HashSet::new(),
        }
    }

    /// Encode one value.
    pub fn encode(&mut self, value: &Value) -> Result<Json> {
        match value {
            Value::None => Ok(Json::Null),
            Value::Bool(b) => Ok(Json::Bool(*b)),
            Value::Int(i) => Ok(Json::from(*i)),
            Value::Float(f) => Number::from_f64(*f)
                .map(Json::Number)
                .ok_or(CodecError::NonFiniteFloat(*f)),
            Value::Str(s) => Ok(Json::String(s.clone())),
            Value::Type(_) | Value::Callable(_) => {
                Err(CodecError::Unsupported(self.heap.type_name(value)))
            }
            Value::Enum(member) => {
                let mut record = class_record(member.class().name(), member.class().module());
                record.insert(markers::ENUM.to_string(), Json::from(member.name()));
                Ok(Json::Object(record))
            }
            Value::Bytes(_) | Value::Date(_) | Value::DateTime(_) | Value::Uuid(_) | Value::Path(_) => {
                builtins::encode(value).ok_or_else(|| CodecError::Unsupported(self.heap.type_name(value)))
            }
            Value::Ref(id) => self.encode_ref(*id),
        }
    }

    fn encode_ref(&mut self, id: NodeId) -> Result<Json> {
        let heap = self.heap;
        let node = heap.node(id)?;
        if !self.path.insert(id) {
            let type_name = match node {
                Node::Object(obj) => obj.class.name().to_string(),
                other => other.kind_name().to_string(),
            };
            return Err(CodecError::Cycle(type_name));
        }
        let result = self.encode_node(id, node);
        self.path.remove(&id);
        result
    }

    fn encode_node(&mut self, id: NodeId, node: &Node) -> Result<Json> {
        match node {
            Node::List(items) => self.encode_array(items),
            Node::Tuple(items) => Ok(tagged(markers::TUPLE, self.encode_array(items)?)),
            Node::Set(items) | Node::FrozenSet(items) => {
                Ok(tagged(markers::SET, self.encode_array(items)?))
            }
            Node::Dict(dict) => Ok(tagged(
                markers::DICT,
                self.encode_entries(&dict.entries, "dict")?,
            )),
            Node::Object(obj) => self.encode_object(id, obj),
        }
    }

    fn encode_object(&mut self, id: NodeId, obj: &ObjectNode) -> Result<Json> {
        let class = &obj.class;
        let hooks = class.hooks();

        if let Some(params) = &hooks.params {
            trace!(class = %class.key(), "encoding via params");
            let fields = params(self.heap, id)
                .map_err(|e| ModelError::hook(format!("params of {}", class.key()), e))?;
            let payload = tagged(markers::DICT, self.encode_fields(&fields)?);
            return Ok(self.instance_record(obj, markers::PARAMS, payload));
        }

        if let (Some(protocol), Some(items)) = (class.container(), &obj.items) {
            return self.encode_items(protocol, items, class.name());
        }

        if let Some(get_state) = &hooks.get_state {
            trace!(class = %class.key(), "encoding via get_state");
            let fields = get_state(self.heap, id)
                .map_err(|e| ModelError::hook(format!("get_state of {}", class.key()), e))?;
            let payload = tagged(markers::DICT, self.encode_fields(&fields)?);
            return Ok(self.instance_record(obj, markers::STATE, payload));
        }

        if class.declares_slots() {
            let mut slot_values = Vec::with_capacity(obj.slots.len());
            for (name, slot) in class.slots().iter().zip(&obj.slots) {
                let value = slot.as_ref().ok_or_else(|| ModelError::UninitializedSlot {
                    class: class.name().to_string(),
                    name: name.clone(),
                })?;
                slot_values.push(self.encode(value)?);
            }
            let dict_part = match &obj.dict {
                Some(dict) => tagged(markers::DICT, self.encode_fields(dict)?),
                None => Json::Null,
            };
            let state = tagged(
                markers::TUPLE,
                Json::Array(vec![tagged(markers::TUPLE, Json::Array(slot_values)), dict_part]),
            );
            return Ok(self.instance_record(obj, markers::STATE, state));
        }

        if let Some(dict) = &obj.dict {
            let payload = tagged(markers::DICT, self.encode_fields(dict)?);
            return Ok(self.instance_record(obj, markers::STATE, payload));
        }

        Err(CodecError::Unsupported(class.name().to_string()))
    }

    fn encode_items(
        &mut self,
        protocol: ContainerProtocol,
        items: &Items,
        type_name: &str,
    ) -> Result<Json> {
        match (protocol, items) {
            (ContainerProtocol::Mapping, Items::Mapping(entries)) => {
                Ok(tagged(markers::DICT, self.encode_entries(entries, type_name)?))
            }
            (ContainerProtocol::Sequence(flavor), Items::Sequence(items)) => {
                let array = self.encode_array(items)?;
                Ok(match flavor {
                    SequenceFlavor::List => array,
                    SequenceFlavor::Tuple => tagged(markers::TUPLE, array),
                    SequenceFlavor::Set => tagged(markers::SET, array),
                })
            }
            _ => Err(CodecError::Unsupported(type_name.to_string())),
        }
    }

    fn encode_array(&mut self, items: &[Value]) -> Result<Json> {
        items
            .iter()
            .map(|item| self.encode(item))
            .collect::<Result<Vec<_>>>()
            .map(Json::Array)
    }

    fn encode_entries(&mut self, entries: &[(Value, Value)], container: &str) -> Result<Json> {
        let mut map = Map::new();
        for (key, value) in entries {
            let Value::Str(key) = key else {
                return Err(CodecError::UnsupportedKey {
                    key: self.heap.describe(key),
                    container: container.to_string(),
                });
            };
            map.insert(key.clone(), self.encode(value)?);
        }
        Ok(Json::Object(map))
    }

    fn encode_fields(&mut self, fields: &Fields) -> Result<Json> {
        let mut map = Map::new();
        for (name, value) in fields {
            map.insert(name.clone(), self.encode(value)?);
        }
        Ok(Json::Object(map))
    }

    fn instance_record(&self, obj: &ObjectNode, marker: &str, payload: Json) -> Json {
        let mut record = class_record(obj.class.name(), obj.class.module());
        record.insert(marker.to_string(), payload);
        Json::Object(record)
    }
}

fn class_record(class: &str, module: &str) -> Map<String, Json> {
    let mut record = Map::new();
    record.insert(markers::CLASS.to_string(), Json::from(class));
    record.insert(markers::MODULE.to_string(), Json::from(module));
    record
}

/// Single-key marker object.
pub(crate) fn tagged(marker: &str, payload: Json) -> Json {
    let mut map = Map::new();
    map.insert(marker.to_string(), payload);
    Json::Object(map)
}
