//! Canonical-JSON hashing used to key cache entries on node config.

use sha2::{Digest, Sha256};
use serde_json::Value;

/// Renders `value` with object keys sorted at every level, so that two
/// structurally equal configs always hash the same regardless of the
/// original field order.
fn canonicalize(value: &Value) -> Value {
  match value {
    Value::Object(map) => {
      let mut sorted: Vec<(&String, &Value)> = map.iter().collect();
      sorted.sort_by_key(|(k, _)| k.as_str());
      let mut out = serde_json::Map::new();
      for (k, v) in sorted {
        out.insert(k.clone(), canonicalize(v));
      }
      Value::Object(out)
    }
    Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
    other => other.clone(),
  }
}

/// Hashes `value`'s canonical JSON form to a hex-encoded SHA-256 digest.
pub fn config_hash(value: &Value) -> String {
  let canonical = canonicalize(value);
  let bytes = serde_json::to_vec(&canonical).expect("canonicalized JSON always serializes");
  let digest = Sha256::digest(&bytes);
  format!("{digest:x}")
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn field_order_does_not_affect_hash() {
    let a = serde_json::json!({ "path": "x", "limit": 5 });
    let b = serde_json::json!({ "limit": 5, "path": "x" });
    assert_eq!(config_hash(&a), config_hash(&b));
  }

  #[test]
  fn different_values_hash_differently() {
    let a = serde_json::json!({ "path": "x" });
    let b = serde_json::json!({ "path": "y" });
    assert_ne!(config_hash(&a), config_hash(&b));
  }

  #[test]
  fn nested_object_order_is_also_canonicalized() {
    let a = serde_json::json!({ "outer": { "b": 1, "a": 2 } });
    let b = serde_json::json!({ "outer": { "a": 2, "b": 1 } });
    assert_eq!(config_hash(&a), config_hash(&b));
  }
}
