//! Configuration-parameter helpers.
//!
//! Objects whose class sets a `params` hook expose a name → value mapping
//! that defines their configuration. These helpers read that mapping, split
//! it into essential and auxiliary parameters, and edit the `PARAMS` payload
//! of a serialized blob directly, without rebuilding the object.
//!
//! # Examples
//!
//! ```rust
//! use mixforge_core::{Heap, TypeRegistry, Value};
//! use mixforge_json::{access_jsparams, update_jsparams};
//!
//! let blob = r#"{"..class..":"Model","..module..":"app","..params..":{"..dict..":{"depth":3}}}"#;
//! let heap = Heap::new();
//! let patched = update_jsparams(&heap, blob, &[("depth", Value::Int(5))]).unwrap();
//!
//! let mut heap = Heap::new();
//! let params = access_jsparams(&mut heap, &TypeRegistry::new(), patched.as_str(), &["depth"]).unwrap();
//! assert_eq!(params, vec![("depth".to_string(), Value::Int(5))]);
//! ```

use std::sync::Arc;

use mixforge_core::{ClassDef, Fields, Heap, ModelError, NodeId, TypeRegistry};
use serde_json::{Map, Value as Json};

use crate::blob::JsonSerializedObject;
use crate::decode::deserialize;
use crate::encode::{serialize, serialize_fields};
use crate::error::{CodecError, Result};
use crate::markers;

/// Configuration parameters of an object, sorted by name.
///
/// # Errors
///
/// Returns `CodecError::Model` if the object's class has no `params` hook or
/// the hook fails.
pub fn get_params(heap: &Heap, id: NodeId) -> Result<Fields> {
    let class = Arc::clone(&heap.object_node(id)?.class);
    let hook = class
        .hooks()
        .params
        .as_ref()
        .ok_or_else(|| ModelError::wrong_kind("parameterizable object", class.name()))?;
    let mut params =
        hook(heap, id).map_err(|e| ModelError::hook(format!("params of {}", class.key()), e))?;
    params.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(params)
}

/// Parameters encoded as JSON text (a `DICT` record with sorted keys).
pub fn get_jsparams(heap: &Heap, id: NodeId) -> Result<JsonSerializedObject> {
    render(&serialize_fields(heap, &get_params(heap, id)?)?)
}

/// Class-declared default parameters, sorted by name.
pub fn get_default_params(class: &ClassDef) -> Fields {
    class.default_params().clone()
}

/// Default parameters encoded as JSON text.
///
/// Defaults are inline values; a default that refers to a heap node cannot be
/// encoded.
pub fn get_default_jsparams(class: &ClassDef) -> Result<JsonSerializedObject> {
    render(&serialize_fields(&Heap::new(), &get_default_params(class))?)
}

/// Names of the parameters that define the object's identity: every
/// parameter not declared auxiliary by its class.
pub fn essential_param_names(heap: &Heap, id: NodeId) -> Result<Vec<String>> {
    Ok(split_params(heap, id)?.0.into_iter().map(|(n, _)| n).collect())
}

/// Names of the object's auxiliary parameters.
pub fn auxiliary_param_names(heap: &Heap, id: NodeId) -> Result<Vec<String>> {
    Ok(split_params(heap, id)?.1.into_iter().map(|(n, _)| n).collect())
}

/// Essential parameters only.
pub fn get_essential_params(heap: &Heap, id: NodeId) -> Result<Fields> {
    Ok(split_params(heap, id)?.0)
}

/// Auxiliary parameters only.
pub fn get_auxiliary_params(heap: &Heap, id: NodeId) -> Result<Fields> {
    Ok(split_params(heap, id)?.1)
}

/// Essential parameters encoded as JSON text.
pub fn get_essential_jsparams(heap: &Heap, id: NodeId) -> Result<JsonSerializedObject> {
    render(&serialize_fields(heap, &get_essential_params(heap, id)?)?)
}

/// Auxiliary parameters encoded as JSON text.
pub fn get_auxiliary_jsparams(heap: &Heap, id: NodeId) -> Result<JsonSerializedObject> {
    render(&serialize_fields(heap, &get_auxiliary_params(heap, id)?)?)
}

fn split_params(heap: &Heap, id: NodeId) -> Result<(Fields, Fields)> {
    let params = get_params(heap, id)?;
    let class = &heap.object_node(id)?.class;
    Ok(params
        .into_iter()
        .partition(|(name, _)| !class.auxiliary_params().contains(name)))
}

/// Patch or add parameters inside a serialized `PARAMS` record.
///
/// Values in `updates` are serialized against `heap`. The output has its
/// object keys sorted.
///
/// # Errors
///
/// Returns `CodecError::MissingKey` if the blob is not a JSON object or has
/// no `DICT` mapping at the top level or inside `PARAMS`.
pub fn update_jsparams(
    heap: &Heap,
    blob: &str,
    updates: &[(&str, mixforge_core::Value)],
) -> Result<JsonSerializedObject> {
    let mut root: Json = serde_json::from_str(blob)?;
    let Json::Object(container) = &mut root else {
        return Err(CodecError::missing_key("Invalid structure: JSON root must be a dictionary"));
    };
    let target = params_dict_mut(container)?;
    for (name, value) in updates {
        target.insert((*name).to_string(), serialize(heap, value)?);
    }
    render(&root)
}

/// Read and rebuild selected parameters from a serialized `PARAMS` record.
///
/// Results come back in the order of `names`.
///
/// # Errors
///
/// Returns `CodecError::MissingKey` for an invalid structure or a name that
/// is not present.
pub fn access_jsparams(
    heap: &mut Heap,
    registry: &TypeRegistry,
    blob: &str,
    names: &[&str],
) -> Result<Fields> {
    let mut root: Json = serde_json::from_str(blob)?;
    let Json::Object(container) = &mut root else {
        return Err(CodecError::missing_key("Invalid structure: JSON root must be a dictionary"));
    };
    let source = params_dict_mut(container)?;
    let mut out = Fields::with_capacity(names.len());
    for name in names {
        let raw = source.get(*name).ok_or_else(|| {
            CodecError::missing_key(format!("Parameter '{name}' not found in serialized object"))
        })?;
        out.push(((*name).to_string(), deserialize(heap, registry, raw)?));
    }
    Ok(out)
}

/// The `DICT` mapping inside `PARAMS`, or at the top level.
fn params_dict_mut(container: &mut Map<String, Json>) -> Result<&mut Map<String, Json>> {
    fn pick(block: &mut Json) -> Option<&mut Map<String, Json>> {
        match block {
            Json::Object(map) => match map.get_mut(markers::DICT) {
                Some(Json::Object(inner)) => Some(inner),
                _ => None,
            },
            _ => None,
        }
    }

    if container.contains_key(markers::PARAMS) {
        return container
            .get_mut(markers::PARAMS)
            .and_then(pick)
            .ok_or_else(|| {
                CodecError::missing_key(format!(
                    "Invalid structure: {} missing {} mapping",
                    markers::PARAMS,
                    markers::DICT
                ))
            });
    }
    match container.get_mut(markers::DICT) {
        Some(Json::Object(inner)) => Ok(inner),
        _ => Err(CodecError::missing_key(format!(
            "Invalid structure: missing {} mapping in JSON object",
            markers::DICT
        ))),
    }
}

fn render(tree: &Json) -> Result<JsonSerializedObject> {
    Ok(JsonSerializedObject::new(serde_json::to_string(tree)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mixforge_core::Value;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn forest() -> Arc<ClassDef> {
        ClassDef::builder("ml", "Forest")
            .default_param("n_trees", 100)
            .default_param("max_depth", 8)
            .auxiliary_params(["verbose"])
            .params(|heap, id| {
                Ok(vec![
                    ("verbose".to_string(), heap.get_attr(id, "verbose")?),
                    ("n_trees".to_string(), heap.get_attr(id, "n_trees")?),
                ])
            })
            .build()
            .unwrap()
    }

    #[test]
    fn test_params_are_sorted_and_split() {
        let class = forest();
        let mut heap = Heap::new();
        let f = heap
            .object(&class, [("n_trees", Value::Int(10)), ("verbose", Value::Bool(true))])
            .unwrap();
        let id = f.node_id().unwrap();

        let names: Vec<String> = get_params(&heap, id).unwrap().into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, ["n_trees", "verbose"]);
        assert_eq!(essential_param_names(&heap, id).unwrap(), ["n_trees"]);
        assert_eq!(auxiliary_param_names(&heap, id).unwrap(), ["verbose"]);
        assert_eq!(
            get_auxiliary_jsparams(&heap, id).unwrap().as_str(),
            r#"{"..dict..":{"verbose":true}}"#
        );
        assert_eq!(
            get_jsparams(&heap, id).unwrap().as_str(),
            r#"{"..dict..":{"n_trees":10,"verbose":true}}"#
        );
    }

    #[test]
    fn test_default_params() {
        let class = forest();
        assert_eq!(
            get_default_jsparams(&class).unwrap().as_str(),
            r#"{"..dict..":{"max_depth":8,"n_trees":100}}"#
        );
    }

    #[test]
    fn test_update_inside_params_wrapper() {
        let heap = Heap::new();
        let blob = json!({
            "..module..": "ml", "..class..": "Forest",
            "..params..": {"..dict..": {"n_trees": 10}}
        })
        .to_string();

        let patched = update_jsparams(&heap, &blob, &[("n_trees", Value::Int(20)), ("seed", Value::Int(7))])
            .unwrap();
        let tree: Json = serde_json::from_str(patched.as_str()).unwrap();
        assert_eq!(tree["..params.."]["..dict.."], json!({"n_trees": 20, "seed": 7}));
    }

    #[test]
    fn test_update_top_level_dict() {
        let heap = Heap::new();
        let patched = update_jsparams(&heap, r#"{"..dict..":{"b":1}}"#, &[("a", Value::str("x"))]).unwrap();
        assert_eq!(patched.as_str(), r#"{"..dict..":{"a":"x","b":1}}"#);
    }

    #[test]
    fn test_invalid_structures_are_key_errors() {
        let heap = Heap::new();
        for blob in ["[1, 2]", r#"{"..params..": {"x": 1}}"#, r#"{"plain": 1}"#] {
            assert!(
                matches!(update_jsparams(&heap, blob, &[]), Err(CodecError::MissingKey(_))),
                "blob {blob}"
            );
        }
    }

    #[test]
    fn test_access_missing_parameter() {
        let mut heap = Heap::new();
        let registry = TypeRegistry::new();
        let blob = r#"{"..dict..":{"a":{"..tuple..":[1]}}}"#;

        let found = access_jsparams(&mut heap, &registry, blob, &["a"]).unwrap();
        let expected = heap.tuple(vec![Value::Int(1)]);
        assert!(heap.deep_eq(&found[0].1, &expected));

        assert!(matches!(
            access_jsparams(&mut heap, &registry, blob, &["a", "b"]),
            Err(CodecError::MissingKey(_))
        ));
    }
}
