//! Structural checks on serializer output

use mixforge::engines::json::markers;
use serde_json::{Map, Value as Json};

/// Check that every JSON object in `tree` is a well-formed marker record.
///
/// A record is either a sole `DICT`, `TUPLE` or `SET` marker, or an instance
/// record with `CLASS`, `MODULE` and exactly one of `PARAMS`, `STATE`,
/// `ENUM`. User keys are only allowed inside a `DICT` payload. Returns the
/// JSON path of the first offending object.
pub fn check_records(tree: &Json) -> Result<(), String> {
    check(tree, "$")
}

fn check(tree: &Json, path: &str) -> Result<(), String> {
    match tree {
        Json::Array(items) => items
            .iter()
            .enumerate()
            .try_for_each(|(i, item)| check(item, &format!("{path}[{i}]"))),
        Json::Object(map) => check_record(map, path),
        _ => Ok(()),
    }
}

fn check_record(map: &Map<String, Json>, path: &str) -> Result<(), String> {
    if map.len() == 1 {
        if let Some(Json::Object(entries)) = map.get(markers::DICT) {
            return entries
                .iter()
                .try_for_each(|(key, value)| check(value, &format!("{path}.{key}")));
        }
        for marker in [markers::TUPLE, markers::SET] {
            if let Some(payload) = map.get(marker) {
                return match payload {
                    Json::Array(_) => check(payload, &format!("{path}.{marker}")),
                    _ => Err(format!("{path}: {marker} must hold a list")),
                };
            }
        }
    }

    let has_tag = map.get(markers::CLASS).is_some_and(Json::is_string)
        && map.get(markers::MODULE).is_some_and(Json::is_string);
    let payloads: Vec<&str> = markers::PAYLOADS
        .into_iter()
        .filter(|m| map.contains_key(*m))
        .collect();
    match (has_tag, payloads.as_slice(), map.len()) {
        (true, [marker], 3) => check(&map[*marker], &format!("{path}.{marker}")),
        _ => Err(format!("{path}: not a marker record: {:?}", map.keys().collect::<Vec<_>>())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_accepts_nested_records() {
        let tree = json!([
            {"..tuple..": [1, {"..set..": []}]},
            {"..dict..": {"..class..": {"..class..": "A", "..module..": "m", "..enum..": "X"}}}
        ]);
        assert_eq!(check_records(&tree), Ok(()));
    }

    #[test]
    fn test_rejects_bare_objects() {
        let tree = json!({"..dict..": {"a": {"plain": 1}}});
        let err = check_records(&tree).unwrap_err();
        assert!(err.starts_with("$.a"), "{err}");
    }

    #[test]
    fn test_rejects_two_payloads() {
        let tree = json!({"..class..": "A", "..module..": "m", "..state..": 1, "..params..": 2});
        assert!(check_records(&tree).is_err());
    }
}
