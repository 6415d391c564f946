// hasher.rs — SHA-256 hashing over canonical JSON.
//
// All hashes in Tollgate are SHA-256, lowercase hex. Structured values are
// hashed over their canonical JSON encoding: object keys sorted, no
// whitespace. Two values that differ only in key insertion order hash
// identically.

use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};

/// Hash arbitrary bytes, returning a lowercase hex-encoded SHA-256 string.
pub fn hash_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    format!("{:x}", hasher.finalize())
}

/// Hash a UTF-8 string, returning a lowercase hex-encoded SHA-256 string.
pub fn hash_str(s: &str) -> String {
    hash_bytes(s.as_bytes())
}

/// Render a JSON value canonically: keys sorted at every depth, compact.
pub fn canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            out.push('{');
            for (i, (key, val)) in entries.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                // Serializing a plain string cannot fail.
                out.push_str(&Value::String(key.clone()).to_string());
                out.push(':');
                write_canonical(val, out);
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}

/// Serialize `value` and render it canonically.
pub fn to_canonical_string<T: Serialize + ?Sized>(value: &T) -> Result<String, serde_json::Error> {
    Ok(canonical_json(&serde_json::to_value(value)?))
}

/// Hash the canonical JSON encoding of `value`.
pub fn hash_canonical<T: Serialize + ?Sized>(value: &T) -> Result<String, serde_json::Error> {
    Ok(hash_str(&to_canonical_string(value)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn hash_known_value() {
        // SHA-256("") = e3b0c442...
        assert_eq!(
            hash_str(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn hash_is_lowercase_hex() {
        let hash = hash_str("tollgate");
        assert_eq!(hash.len(), 64);
        assert!(hash
            .chars()
            .all(|c| c.is_ascii_hexdigit() && !c.is_uppercase()));
    }

    #[test]
    fn canonical_json_sorts_nested_keys() {
        let value = json!({"b": 1, "a": {"z": [3, {"y": true, "x": null}], "c": "s"}});
        assert_eq!(
            canonical_json(&value),
            r#"{"a":{"c":"s","z":[3,{"x":null,"y":true}]},"b":1}"#
        );
    }

    #[test]
    fn insertion_order_does_not_change_hash() {
        let mut first = serde_json::Map::new();
        first.insert("alpha".into(), json!(1));
        first.insert("beta".into(), json!("two"));
        let mut second = serde_json::Map::new();
        second.insert("beta".into(), json!("two"));
        second.insert("alpha".into(), json!(1));

        assert_eq!(
            hash_canonical(&Value::Object(first)).unwrap(),
            hash_canonical(&Value::Object(second)).unwrap()
        );
    }

    #[test]
    fn canonical_json_escapes_keys_and_strings() {
        let value = json!({"quo\"te": "line\nbreak"});
        assert_eq!(canonical_json(&value), r#"{"quo\"te":"line\nbreak"}"#);
    }

    #[test]
    fn different_values_hash_differently() {
        assert_ne!(
            hash_canonical(&json!({"n": 1})).unwrap(),
            hash_canonical(&json!({"n": 2})).unwrap()
        );
    }
}
