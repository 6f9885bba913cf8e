//! JSON tree → object graph.
//!
//! Reconstruction dispatches on structural shape. Instance records resolve
//! their `module:name` tag through a [`TypeRegistry`]; only registered
//! classes (and the builtin leaf codec) can be produced, so decoding an
//! untrusted blob cannot reach arbitrary types.

use mixforge_core::{ClassDef, Fields, Heap, ModelError, Node, NodeId, TypeRegistry, Value};
use serde_json::{Map, Value as Json};
use std::sync::Arc;
use tracing::trace;

use crate::builtins::{self, BUILTINS_MODULE};
use crate::error::{CodecError, Result};
use crate::markers;

/// Rebuild a value from a JSON tree, allocating into `heap`.
///
/// # Errors
///
/// Returns `CodecError::Malformed` for marker records of the wrong shape,
/// `CodecError::UnknownType` for unregistered tags and
/// `CodecError::SlotMismatch` when slot state does not fit the class.
pub fn deserialize(heap: &mut Heap, registry: &TypeRegistry, json: &Json) -> Result<Value> {
    Decoder::new(heap, registry).decode(json)
}

/// Recursive decoder.
pub struct Decoder<'a> {
    heap: &'a mut Heap,
    registry: &'a TypeRegistry,
}

/// How a two-part state tuple splits into slot and field data.
struct StateParts {
    slot_values: Option<Vec<Value>>,
    slot_mapping: Option<Value>,
    fields: Option<Value>,
}

impl<'a> Decoder<'a> {
    /// Create a decoder allocating into `heap`.
    pub fn new(heap: &'a mut Heap, registry: &'a TypeRegistry) -> Self {
        Self { heap, registry }
    }

    /// Decode one JSON value.
    pub fn decode(&mut self, json: &Json) -> Result<Value> {
        match json {
            Json::Null => Ok(Value::None),
            Json::Bool(b) => Ok(Value::Bool(*b)),
            Json::Number(n) => match n.as_i64() {
                Some(i) => Ok(Value::Int(i)),
                None => n
                    .as_f64()
                    .map(Value::Float)
                    .ok_or_else(|| CodecError::malformed(format!("unrepresentable number {n}"))),
            },
            Json::String(s) => Ok(Value::Str(s.clone())),
            Json::Array(items) => {
                let items = self.decode_all(items)?;
                Ok(self.heap.list(items))
            }
            Json::Object(map) => self.decode_record(map),
        }
    }

    fn decode_all(&mut self, items: &[Json]) -> Result<Vec<Value>> {
        items.iter().map(|item| self.decode(item)).collect()
    }

    fn decode_record(&mut self, map: &Map<String, Json>) -> Result<Value> {
        if let Some(payload) = map.get(markers::TUPLE) {
            let items = self.sole_array(map, "TUPLE", payload)?;
            return Ok(self.heap.tuple(items));
        }
        if let Some(payload) = map.get(markers::SET) {
            let items = self.sole_array(map, "SET", payload)?;
            return Ok(self.heap.set(items));
        }
        if let Some(payload) = map.get(markers::DICT) {
            if map.len() != 1 {
                return Err(CodecError::malformed("DICT marker must be the only key"));
            }
            let Json::Object(entries) = payload else {
                return Err(CodecError::malformed("DICT marker must map to a dict"));
            };
            let mut decoded = Vec::with_capacity(entries.len());
            for (key, value) in entries {
                decoded.push((Value::Str(key.clone()), self.decode(value)?));
            }
            return Ok(self.heap.dict(decoded));
        }
        if map.contains_key(markers::MODULE) || map.contains_key(markers::CLASS) {
            return self.recreate(map);
        }
        Err(CodecError::malformed(
            "JSON object without marker keys cannot be reconstructed",
        ))
    }

    fn sole_array(&mut self, map: &Map<String, Json>, name: &str, payload: &Json) -> Result<Vec<Value>> {
        if map.len() != 1 {
            return Err(CodecError::malformed(format!("{name} marker must be the only key")));
        }
        let Json::Array(items) = payload else {
            return Err(CodecError::malformed(format!("{name} marker must map to a list")));
        };
        self.decode_all(items)
    }

    fn recreate(&mut self, map: &Map<String, Json>) -> Result<Value> {
        let (Some(Json::String(module)), Some(Json::String(class_name))) =
            (map.get(markers::MODULE), map.get(markers::CLASS))
        else {
            return Err(CodecError::malformed(
                "Object metadata missing required markers MODULE and CLASS",
            ));
        };

        let present: Vec<&str> = markers::PAYLOADS
            .into_iter()
            .filter(|m| map.contains_key(*m))
            .collect();
        let [payload_marker] = present[..] else {
            return Err(CodecError::malformed(format!(
                "record for {module}.{class_name} must carry exactly one of PARAMS, STATE, ENUM"
            )));
        };
        if map.len() != 3 {
            return Err(CodecError::malformed(format!(
                "record for {module}.{class_name} has unexpected keys"
            )));
        }
        let payload = &map[payload_marker];

        if module == BUILTINS_MODULE {
            if payload_marker != markers::STATE {
                return Err(CodecError::malformed("builtin leaf records carry STATE"));
            }
            return builtins::decode(class_name, payload);
        }

        let class = self.registry.resolve(module, class_name)?;
        trace!(class = %class.key(), marker = payload_marker, "recreating instance");
        match payload_marker {
            markers::PARAMS => self.from_params(&class, payload),
            markers::ENUM => {
                let Json::String(member) = payload else {
                    return Err(CodecError::malformed("ENUM marker must map to a string"));
                };
                if !class.is_enum() {
                    return Err(CodecError::malformed(format!("Class {class_name} is not an Enum")));
                }
                Ok(class.member(member)?)
            }
            _ => self.from_state(&class, payload),
        }
    }

    fn from_params(&mut self, class: &Arc<ClassDef>, payload: &Json) -> Result<Value> {
        if !class.has_constructor() {
            return Err(CodecError::NotConstructible(class.key().tag()));
        }
        let params = self.decode(payload)?;
        let kwargs = self.string_fields(&params, "PARAMS")?;
        Ok(class.construct(self.heap, kwargs)?)
    }

    fn from_state(&mut self, class: &Arc<ClassDef>, payload: &Json) -> Result<Value> {
        let state = self.decode(payload)?;
        let obj = self.heap.instantiate(class)?;
        let Value::Ref(id) = obj else {
            return Err(CodecError::malformed("instance allocation produced no node"));
        };

        if let Some(set_state) = class.hooks().set_state.clone() {
            let fields = self.string_fields(&state, "STATE")?;
            set_state(self.heap, id, fields)
                .map_err(|e| ModelError::hook(format!("set_state of {}", class.key()), e))?;
            return Ok(obj);
        }

        let tuple = match &state {
            Value::Ref(sid) => match self.heap.node(*sid)? {
                Node::Tuple(items) => Some(items.clone()),
                _ => None,
            },
            _ => None,
        };

        match tuple {
            Some(items) => {
                let parts = self.split_state(items);
                self.apply_parts(class, id, parts)?;
            }
            None => {
                for (name, value) in self.string_fields(&state, "STATE")? {
                    self.heap.set_attr(id, &name, value)?;
                }
            }
        }
        Ok(obj)
    }

    fn split_state(&self, items: Vec<Value>) -> StateParts {
        let mut parts = StateParts {
            slot_values: None,
            slot_mapping: None,
            fields: None,
        };
        if let [a, b] = &items[..] {
            match (self.shape(a), self.shape(b)) {
                (Shape::Dict, Shape::Dict) => {
                    parts.fields = Some(a.clone());
                    parts.slot_mapping = Some(b.clone());
                }
                (Shape::Seq(seq), Shape::Dict | Shape::None) => {
                    parts.slot_values = self.heap.elements(seq).ok().map(<[Value]>::to_vec);
                    parts.fields = (!b.is_none()).then(|| b.clone());
                }
                (Shape::Dict, Shape::Seq(seq)) => {
                    parts.fields = Some(a.clone());
                    parts.slot_values = self.heap.elements(seq).ok().map(<[Value]>::to_vec);
                }
                (Shape::None, Shape::Dict) => parts.fields = Some(b.clone()),
                _ => parts.slot_values = Some(items),
            }
        } else {
            parts.slot_values = Some(items);
        }
        parts
    }

    fn apply_parts(&mut self, class: &Arc<ClassDef>, id: NodeId, parts: StateParts) -> Result<()> {
        if let Some(mapping) = parts.slot_mapping {
            for (name, value) in self.string_fields(&mapping, "slot state")? {
                self.heap.set_attr(id, &name, value)?;
            }
        } else if let Some(values) = parts.slot_values.filter(|v| !v.is_empty()) {
            let slots = class.slots();
            if values.len() != slots.len() {
                return Err(CodecError::SlotMismatch {
                    class: class.name().to_string(),
                    expected: slots.len(),
                    found: values.len(),
                });
            }
            for (name, value) in slots.iter().zip(values) {
                self.heap.set_attr(id, name, value)?;
            }
        }
        if let Some(fields) = parts.fields {
            for (name, value) in self.string_fields(&fields, "field state")? {
                self.heap.set_attr(id, &name, value)?;
            }
        }
        Ok(())
    }

    fn shape(&self, value: &Value) -> Shape {
        match value {
            Value::None => Shape::None,
            Value::Ref(id) => match self.heap.get(*id) {
                Some(Node::Dict(_)) => Shape::Dict,
                Some(Node::List(_) | Node::Tuple(_)) => Shape::Seq(*id),
                _ => Shape::Other,
            },
            _ => Shape::Other,
        }
    }

    /// Entries of a decoded dict with string keys.
    fn string_fields(&self, value: &Value, what: &str) -> Result<Fields> {
        let malformed = || CodecError::malformed(format!("{what} must be a mapping with string keys"));
        let Value::Ref(id) = value else {
            return Err(malformed());
        };
        let Node::Dict(dict) = self.heap.node(*id)? else {
            return Err(malformed());
        };
        dict.entries
            .iter()
            .map(|(k, v)| match k {
                Value::Str(name) => Ok((name.clone(), v.clone())),
                _ => Err(malformed()),
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shape {
    None,
    Dict,
    Seq(NodeId),
    Other,
}

#[cfg(test)]
mod tests {
    use super::*;
    use mixforge_core::ClassDef;
    use serde_json::json;

    fn registry_with(classes: &[&Arc<ClassDef>]) -> TypeRegistry {
        let mut registry = TypeRegistry::new();
        for class in classes {
            registry.register(class).unwrap();
        }
        registry
    }

    #[test]
    fn test_large_dict_decodes_in_bounded_time() {
        let entries: serde_json::Map<String, Json> =
            (0..40_000).map(|i| (format!("k{i}"), json!(i))).collect();
        let mut heap = Heap::new();
        let started = std::time::Instant::now();
        let value = deserialize(&mut heap, &TypeRegistry::new(), &json!({"..dict..": entries})).unwrap();
        let elapsed = started.elapsed();

        let id = value.node_id().unwrap();
        assert_eq!(heap.dict_get(id, &Value::str("k39999")).unwrap(), Some(Value::Int(39_999)));
        assert!(elapsed < std::time::Duration::from_secs(3), "took {elapsed:?}");
    }

    #[test]
    fn test_containers() {
        let mut heap = Heap::new();
        let value = deserialize(
            &mut heap,
            &TypeRegistry::new(),
            &json!([{"..tuple..": [1, 2.5]}, {"..set..": ["a", "a"]}, {"..dict..": {"k": null}}]),
        )
        .unwrap();

        let tuple = heap.tuple(vec![Value::Int(1), Value::Float(2.5)]);
        let set = heap.set(vec![Value::str("a")]);
        let dict = heap.str_dict([("k", Value::None)]);
        let expected = heap.list(vec![tuple, set, dict]);
        assert!(heap.deep_eq(&value, &expected));
    }

    #[test]
    fn test_malformed_markers() {
        let mut heap = Heap::new();
        let registry = TypeRegistry::new();
        for bad in [
            json!({"..tuple..": [1], "extra": 2}),
            json!({"..set..": {"a": 1}}),
            json!({"..dict..": [1]}),
            json!({"plain": "object"}),
            json!({"..module..": "app"}),
        ] {
            assert!(
                matches!(deserialize(&mut heap, &registry, &bad), Err(CodecError::Malformed(_))),
                "expected malformed for {bad}"
            );
        }
    }

    #[test]
    fn test_record_needs_exactly_one_payload() {
        let config = ClassDef::builder("app", "Config").build().unwrap();
        let registry = registry_with(&[&config]);
        let mut heap = Heap::new();
        let two = json!({
            "..module..": "app", "..class..": "Config",
            "..state..": {"..dict..": {}}, "..params..": {"..dict..": {}}
        });
        assert!(matches!(
            deserialize(&mut heap, &registry, &two),
            Err(CodecError::Malformed(_))
        ));
    }

    #[test]
    fn test_unknown_type() {
        let mut heap = Heap::new();
        let blob = json!({"..module..": "app", "..class..": "Ghost", "..state..": {"..dict..": {}}});
        assert!(matches!(
            deserialize(&mut heap, &TypeRegistry::new(), &blob),
            Err(CodecError::UnknownType(_))
        ));
    }

    #[test]
    fn test_tolerant_slot_state_orderings() {
        let point = ClassDef::builder("geometry", "Point")
            .slots(["x", "y"])
            .with_dict()
            .build()
            .unwrap();
        let registry = registry_with(&[&point]);

        let blobs = [
            json!({"..tuple..": [{"..tuple..": [1, 2]}, {"..dict..": {"tag": "a"}}]}),
            json!({"..tuple..": [{"..dict..": {"tag": "a"}}, {"..dict..": {"x": 1, "y": 2}}]}),
            json!({"..tuple..": [{"..dict..": {"tag": "a"}}, [1, 2]]}),
        ];
        for state in blobs {
            let mut heap = Heap::new();
            let blob = json!({"..module..": "geometry", "..class..": "Point", "..state..": state});
            let p = deserialize(&mut heap, &registry, &blob).unwrap();
            let id = p.node_id().unwrap();
            assert_eq!(heap.get_attr(id, "x").unwrap(), Value::Int(1));
            assert_eq!(heap.get_attr(id, "y").unwrap(), Value::Int(2));
            assert_eq!(heap.get_attr(id, "tag").unwrap(), Value::str("a"));
        }
    }

    #[test]
    fn test_slot_count_mismatch() {
        let point = ClassDef::builder("geometry", "Point").slots(["x", "y"]).build().unwrap();
        let registry = registry_with(&[&point]);
        let mut heap = Heap::new();
        let blob = json!({
            "..module..": "geometry", "..class..": "Point",
            "..state..": {"..tuple..": [{"..tuple..": [1, 2, 3]}, null]}
        });
        assert!(matches!(
            deserialize(&mut heap, &registry, &blob),
            Err(CodecError::SlotMismatch { expected: 2, found: 3, .. })
        ));
    }

    #[test]
    fn test_params_without_constructor() {
        let config = ClassDef::builder("app", "Config").build().unwrap();
        let registry = registry_with(&[&config]);
        let mut heap = Heap::new();
        let blob = json!({"..module..": "app", "..class..": "Config", "..params..": {"..dict..": {}}});
        assert!(matches!(
            deserialize(&mut heap, &registry, &blob),
            Err(CodecError::NotConstructible(_))
        ));
    }

    #[test]
    fn test_enum_member_lookup() {
        let color = ClassDef::enumeration("palette", "Color", ["RED"]).unwrap();
        let plain = ClassDef::builder("palette", "Plain").build().unwrap();
        let registry = registry_with(&[&color, &plain]);
        let mut heap = Heap::new();

        let red = deserialize(
            &mut heap,
            &registry,
            &json!({"..module..": "palette", "..class..": "Color", "..enum..": "RED"}),
        )
        .unwrap();
        assert_eq!(red, color.member("RED").unwrap());

        assert!(deserialize(
            &mut heap,
            &registry,
            &json!({"..module..": "palette", "..class..": "Color", "..enum..": "BLUE"}),
        )
        .is_err());
        assert!(matches!(
            deserialize(
                &mut heap,
                &registry,
                &json!({"..module..": "palette", "..class..": "Plain", "..enum..": "RED"}),
            ),
            Err(CodecError::Malformed(_))
        ));
    }
}
