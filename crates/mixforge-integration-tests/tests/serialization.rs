//! Serialization Tests: JSON round trips over the fixture class zoo
//!
//! These tests validate:
//! - Every reconstruction path (params, slots, state hooks, field mappings, enums)
//! - The marker-record shape of serializer output
//! - Rejection of cycles and unsupported value shapes
//! - Rejection of malformed, unknown and mismatched blobs
//!
//! Run with: cargo test --test serialization

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use mixforge::prelude::*;
    use mixforge::{Callable, CodecError, Error};
    use mixforge_integration_tests::fixtures::{Fixtures, release_date};
    use mixforge_integration_tests::wire::check_records;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use serde_json::json;

    fn setup() -> (Fixtures, Forge, Heap) {
        let fixtures = Fixtures::new().unwrap();
        let forge = fixtures.forge().unwrap();
        (fixtures, forge, Heap::new())
    }

    fn round_trip(forge: &Forge, heap: &mut Heap, value: &Value) -> Value {
        let text = forge.dumps(heap, value).unwrap();
        forge.loads(heap, text.as_str()).unwrap()
    }

    /// A graph touching every reconstruction path survives a round trip
    #[test]
    fn test_mixed_graph_round_trip() {
        let (fx, forge, mut heap) = setup();
        let point = fx.point(&mut heap, 1, 2).unwrap();
        let forest = fx.forest(&mut heap, 10, 7).unwrap();
        let interval = fx.interval(&mut heap, 0.5, 1.5).unwrap();
        let record = heap.object(&fx.record, [("name", "r1")]).unwrap();
        let tags = heap.frozenset(vec![Value::str("a"), Value::str("b")]);
        let pair = heap.tuple(vec![point, interval]);
        let root = heap.str_dict([
            ("pair", pair),
            ("forest", forest),
            ("record", record),
            ("color", fx.color("Green").unwrap()),
            ("tags", tags),
            ("released", release_date()),
            ("missing", Value::None),
        ]);

        let back = round_trip(&forge, &mut heap, &root);
        assert!(heap.deep_eq(&root, &back), "{}", heap.describe(&back));
    }

    /// Parameterizable objects serialize their parameters, sorted by name
    #[test]
    fn test_params_record_shape() {
        let (fx, forge, mut heap) = setup();
        let forest = fx.forest(&mut heap, 10, 7).unwrap();

        assert_eq!(
            forge.to_json(&heap, &forest).unwrap(),
            json!({
                "..class..": "Forest",
                "..module..": "ml",
                "..params..": {"..dict..": {"depth": 7, "n_trees": 10, "verbose": false}}
            })
        );
    }

    /// Slot-only objects serialize as a (slot values, no mapping) pair
    #[test]
    fn test_slots_record_shape() {
        let (fx, forge, mut heap) = setup();
        let point = fx.point(&mut heap, 1, 2).unwrap();

        assert_eq!(
            forge.to_json(&heap, &point).unwrap(),
            json!({
                "..class..": "Point",
                "..module..": "geometry",
                "..state..": {"..tuple..": [{"..tuple..": [1, 2]}, null]}
            })
        );
    }

    #[test]
    fn test_enum_record_shape() {
        let (fx, forge, heap) = setup();
        assert_eq!(
            forge.to_json(&heap, &fx.color("Red").unwrap()).unwrap(),
            json!({"..class..": "Color", "..module..": "palette", "..enum..": "Red"})
        );
    }

    /// Explicit state hooks drive both directions
    #[test]
    fn test_state_hooks_round_trip() {
        let (fx, forge, mut heap) = setup();
        let counter = fx.counter(&mut heap, 41).unwrap();

        let tree = forge.to_json(&heap, &counter).unwrap();
        assert_eq!(tree["..state.."], json!({"..dict..": {"count": 41}}));

        let back = forge.from_json(&mut heap, &tree).unwrap();
        let id = back.node_id().unwrap();
        assert_eq!(heap.get_attr(id, "count").unwrap(), Value::Int(41));
        assert_eq!(heap.get_attr(id, "restored").unwrap(), Value::Bool(true));
    }

    /// Serializer output only ever contains well-formed marker records
    #[test]
    fn test_output_is_marker_records_only() {
        let (fx, forge, mut heap) = setup();
        let wrapped = fx.wrap(&mut heap, Value::str("..dict..")).unwrap();
        let tricky = heap.str_dict([
            ("..class..", Value::str("Point")),
            ("..module..", Value::Int(1)),
            ("w", wrapped),
        ]);
        let counter = fx.counter(&mut heap, 1).unwrap();
        let stack = fx.stack(&mut heap, vec![Value::Int(1)]).unwrap();
        let root = heap.list(vec![tricky, counter, stack, release_date()]);

        let tree = forge.to_json(&heap, &root).unwrap();
        assert_eq!(check_records(&tree), Ok(()));

        // User keys that look like markers survive because they stay inside DICT.
        let back = forge.from_json(&mut heap, &tree).unwrap();
        let first = heap.elements(back.node_id().unwrap()).unwrap()[0].clone();
        let module = heap
            .dict_get(first.node_id().unwrap(), &Value::str("..module.."))
            .unwrap();
        assert_eq!(module, Some(Value::Int(1)));
    }

    /// Shared references are written twice and come back as distinct copies
    #[test]
    fn test_shared_references_are_duplicated() {
        let (_, forge, mut heap) = setup();
        let shared = heap.list(vec![Value::Int(1)]);
        let root = heap.list(vec![shared.clone(), shared]);

        let back = round_trip(&forge, &mut heap, &root);
        assert!(heap.deep_eq(&root, &back));
        let items = heap.elements(back.node_id().unwrap()).unwrap();
        assert!(!items[0].is_same(&items[1]));
    }

    #[test]
    fn test_cycle_is_rejected() {
        let (fx, forge, mut heap) = setup();
        let record = heap.object(&fx.record, Vec::<(String, Value)>::new()).unwrap();
        let list = heap.list(vec![record.clone()]);
        heap.set_attr(record.node_id().unwrap(), "items", list).unwrap();

        let err = forge.dumps(&heap, &record).unwrap_err();
        assert!(err.is_cycle());
        assert_eq!(
            err.to_string(),
            "Cyclic reference detected while serializing object of type Record"
        );
    }

    #[test]
    fn test_self_containing_list_is_rejected() {
        let (_, forge, mut heap) = setup();
        let list = heap.list(Vec::new());
        heap.list_push(list.node_id().unwrap(), list.clone()).unwrap();
        assert_matches!(forge.dumps(&heap, &list), Err(Error::Codec(CodecError::Cycle(_))));
    }

    #[rstest]
    #[case::callable(Value::Callable(Callable::constant("zero", Value::Int(0))))]
    #[case::type_value(Value::Type(ValueType::Builtin(BuiltinKind::Int)))]
    #[case::nan(Value::Float(f64::NAN))]
    #[case::infinity(Value::Float(f64::INFINITY))]
    fn test_unsupported_leaves(#[case] leaf: Value) {
        let (_, forge, mut heap) = setup();
        let root = heap.list(vec![leaf]);
        let err = forge.dumps(&heap, &root).unwrap_err();
        assert_matches!(err, Error::Codec(CodecError::Unsupported(_) | CodecError::NonFiniteFloat(_)));
    }

    #[test]
    fn test_non_string_key_is_rejected() {
        let (_, forge, mut heap) = setup();
        let root = heap.dict(vec![(Value::Int(1), Value::str("one"))]);
        let err = forge.dumps(&heap, &root).unwrap_err();
        assert!(err.is_unsupported());
        assert_matches!(err, Error::Codec(CodecError::UnsupportedKey { .. }));
    }

    /// Container-like objects serialize as their builtin counterpart
    #[test]
    fn test_container_objects_are_lossy() {
        let (fx, forge, mut heap) = setup();
        let bag = fx.bag(&mut heap, vec![Value::Int(1), Value::Int(2)]).unwrap();
        let catalog = fx
            .catalog(&mut heap, "winter", vec![(Value::str("k"), Value::Int(3))])
            .unwrap();
        let stack = fx.stack(&mut heap, vec![Value::Int(4)]).unwrap();
        let root = heap.list(vec![bag, catalog, stack]);

        assert_eq!(
            forge.to_json(&heap, &root).unwrap(),
            json!([{"..tuple..": [1, 2]}, {"..dict..": {"k": 3}}, [4]])
        );
    }

    #[test]
    fn test_pretty_output_parses_identically() {
        let fixtures = Fixtures::new().unwrap();
        let pretty = fixtures.forge_builder().pretty_json(true).build().unwrap();
        let compact = fixtures.forge().unwrap();
        let mut heap = Heap::new();
        let root = fixtures.point(&mut heap, 3, 4).unwrap();

        let a: serde_json::Value =
            serde_json::from_str(pretty.dumps(&heap, &root).unwrap().as_str()).unwrap();
        let b: serde_json::Value =
            serde_json::from_str(compact.dumps(&heap, &root).unwrap().as_str()).unwrap();
        assert_eq!(a, b);
    }

    #[rstest]
    #[case::bare_object(r#"{"a": 1}"#)]
    #[case::dict_with_extra_key(r#"{"..dict..": {}, "x": 1}"#)]
    #[case::tuple_not_list(r#"{"..tuple..": 3}"#)]
    #[case::two_payloads(
        r#"{"..class..": "Point", "..module..": "geometry", "..state..": null, "..params..": {}}"#
    )]
    #[case::missing_module(r#"{"..class..": "Point", "..state..": null}"#)]
    #[case::enum_member_not_string(r#"{"..class..": "Color", "..module..": "palette", "..enum..": 1}"#)]
    fn test_malformed_blobs(#[case] blob: &str) {
        let (_, forge, mut heap) = setup();
        let err = forge.loads(&mut heap, blob).unwrap_err();
        assert!(err.is_reconstruction(), "{err}");
    }

    #[test]
    fn test_unknown_type_message() {
        let (_, forge, mut heap) = setup();
        let blob = r#"{"..class..": "Ghost", "..module..": "haunted", "..state..": {"..dict..": {}}}"#;
        let err = forge.loads(&mut heap, blob).unwrap_err();
        assert_matches!(err, Error::Codec(CodecError::UnknownType(_)));
        assert_eq!(err.to_string(), "Could not import Ghost from haunted");
    }

    #[test]
    fn test_slot_count_mismatch() {
        let (_, forge, mut heap) = setup();
        let blob = r#"{
            "..class..": "Point",
            "..module..": "geometry",
            "..state..": {"..tuple..": [{"..tuple..": [1, 2, 3]}, null]}
        }"#;
        let err = forge.loads(&mut heap, blob).unwrap_err();
        assert_matches!(
            err,
            Error::Codec(CodecError::SlotMismatch { expected: 2, found: 3, .. })
        );
    }

    #[test]
    fn test_params_for_class_without_constructor() {
        let (_, forge, mut heap) = setup();
        let blob = r#"{"..class..": "Record", "..module..": "app", "..params..": {"..dict..": {}}}"#;
        assert_matches!(
            forge.loads(&mut heap, blob),
            Err(Error::Codec(CodecError::NotConstructible(_)))
        );
    }

    /// Parameters missing from the blob fall back to the class defaults
    #[test]
    fn test_params_blob_uses_defaults() {
        let (_, forge, mut heap) = setup();
        let blob = r#"{"..class..": "Forest", "..module..": "ml", "..params..": {"..dict..": {"depth": 9}}}"#;
        let forest = forge.loads(&mut heap, blob).unwrap();
        let id = forest.node_id().unwrap();
        assert_eq!(heap.get_attr(id, "depth").unwrap(), Value::Int(9));
        assert_eq!(heap.get_attr(id, "n_trees").unwrap(), Value::Int(100));
        assert_eq!(heap.get_attr(id, "verbose").unwrap(), Value::Bool(false));
    }

    #[test]
    fn test_unregistered_class_in_fresh_engine() {
        let (fx, forge, mut heap) = setup();
        let point = fx.point(&mut heap, 0, 0).unwrap();
        let text = forge.dumps(&heap, &point).unwrap();

        let bare = Forge::default();
        let err = bare.loads(&mut heap, text.as_str()).unwrap_err();
        assert_eq!(err.to_string(), "Could not import Point from geometry");
    }
}
