// merge.rs — Deterministic structural merge of state deltas.
//
// Rules, applied recursively:
// - object + object: key-wise union; delta keys win, recursing when both
//   sides hold objects.
// - a `null` delta value removes the key from the base object.
// - any other pairing (scalar, array, type mismatch): the delta replaces
//   the base value entirely.
//
// The base is never modified; a new value is returned.
//
// Constraints only describe what changed, so the union rule is what keeps
// other agents' entries (and caller keys the engine does not model) intact
// in the next state. Null deletion exists for RELEASE: dropping a lease is
// a delta of `{agent: {auth_id: null}}`, not a rewrite of the lease map.
// Arrays are replaced because the constraints that own them (replay nonces,
// tool calls) already prune and emit the full list.

use serde_json::{Map, Value};

/// Merge `delta` over `base`, returning the combined value.
pub fn merge(base: &Value, delta: &Value) -> Value {
    match (base, delta) {
        (Value::Object(base_map), Value::Object(delta_map)) => {
            Value::Object(merge_maps(base_map, delta_map))
        }
        _ => delta.clone(),
    }
}

fn merge_maps(base: &Map<String, Value>, delta: &Map<String, Value>) -> Map<String, Value> {
    let mut out = base.clone();
    for (key, delta_value) in delta {
        if delta_value.is_null() {
            out.remove(key);
            continue;
        }
        let merged = match out.get(key) {
            Some(base_value) => merge(base_value, delta_value),
            None => strip_nulls(delta_value),
        };
        out.insert(key.clone(), merged);
    }
    out
}

// A delta subtree landing on a missing key must not leave tombstones behind.
fn strip_nulls(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| (k.clone(), strip_nulls(v)))
                .collect(),
        ),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn union_of_disjoint_keys() {
        let merged = merge(&json!({"a": 1}), &json!({"b": 2}));
        assert_eq!(merged, json!({"a": 1, "b": 2}));
    }

    #[test]
    fn nested_objects_recurse() {
        let base = json!({"budget": {"limit": {"a1": "10"}, "spent": {"a1": "1", "a2": "5"}}});
        let delta = json!({"budget": {"spent": {"a1": "4"}}});
        assert_eq!(
            merge(&base, &delta),
            json!({"budget": {"limit": {"a1": "10"}, "spent": {"a1": "4", "a2": "5"}}})
        );
    }

    #[test]
    fn arrays_are_replaced_not_concatenated() {
        let merged = merge(&json!({"n": [1, 2, 3]}), &json!({"n": [9]}));
        assert_eq!(merged, json!({"n": [9]}));
    }

    #[test]
    fn type_mismatch_takes_delta() {
        assert_eq!(merge(&json!({"x": {"y": 1}}), &json!({"x": 5})), json!({"x": 5}));
        assert_eq!(merge(&json!({"x": 5}), &json!({"x": {"y": 1}})), json!({"x": {"y": 1}}));
        assert_eq!(merge(&json!(1), &json!({"k": true})), json!({"k": true}));
    }

    #[test]
    fn null_removes_key() {
        let base = json!({"auths": {"a1": {"id-1": {"expires_at": 5}, "id-2": {"expires_at": 6}}}});
        let delta = json!({"auths": {"a1": {"id-1": null}}});
        assert_eq!(
            merge(&base, &delta),
            json!({"auths": {"a1": {"id-2": {"expires_at": 6}}}})
        );
    }

    #[test]
    fn null_on_missing_key_leaves_no_tombstone() {
        let merged = merge(&json!({}), &json!({"a": {"b": null, "c": 1}}));
        assert_eq!(merged, json!({"a": {"c": 1}}));
    }

    #[test]
    fn base_is_untouched() {
        let base = json!({"a": {"b": 1}});
        let snapshot = base.clone();
        let _ = merge(&base, &json!({"a": {"b": 2, "c": 3}}));
        assert_eq!(base, snapshot);
    }

    #[test]
    fn later_delta_builds_on_earlier_merge() {
        let base = json!({"s": {"a": 1}});
        let first = merge(&base, &json!({"s": {"b": 2}}));
        let second = merge(&first, &json!({"s": {"a": 3}}));
        assert_eq!(second, json!({"s": {"a": 3, "b": 2}}));
    }
}
