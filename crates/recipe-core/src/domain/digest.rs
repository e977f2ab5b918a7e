//! Canonical JSON digests used as memoization keys.
//!
//! Object keys are sorted recursively before hashing so that two maps with
//! the same content always produce the same SHA-256 hex digest.

use serde::Serialize;
use sha2::{Digest, Sha256};

use super::error::Result;
use super::knob::KnobCatalog;
use crate::overrides::OverrideMap;

fn sort_keys(value: &serde_json::Value) -> serde_json::Value {
    match value {
        serde_json::Value::Object(map) => {
            let mut keys: Vec<_> = map.keys().collect();
            keys.sort();
            let mut sorted = serde_json::Map::new();
            for key in keys {
                if let Some(v) = map.get(key) {
                    sorted.insert(key.clone(), sort_keys(v));
                }
            }
            serde_json::Value::Object(sorted)
        }
        serde_json::Value::Array(items) => {
            serde_json::Value::Array(items.iter().map(sort_keys).collect())
        }
        other => other.clone(),
    }
}

/// Compact JSON with recursively sorted object keys.
pub fn canonical_json<T: Serialize>(value: &T) -> Result<String> {
    let value = serde_json::to_value(value)?;
    Ok(serde_json::to_string(&sort_keys(&value))?)
}

/// SHA-256 hex digest of the canonical JSON form of `value`.
pub fn compute_digest<T: Serialize>(value: &T) -> Result<String> {
    let canonical = canonical_json(value)?;
    Ok(hex::encode(Sha256::digest(canonical.as_bytes())))
}

/// Content key for derived override counts: any change to the override
/// map, the catalog, or the baseline map changes the key.
pub fn override_summary_digest(
    overrides: &OverrideMap,
    catalog: &KnobCatalog,
    baseline: &OverrideMap,
) -> Result<String> {
    #[derive(Serialize)]
    struct SummaryKey<'a> {
        overrides: &'a OverrideMap,
        catalog: &'a KnobCatalog,
        baseline: &'a OverrideMap,
    }

    compute_digest(&SummaryKey {
        overrides,
        catalog,
        baseline,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_json_sorts_nested_keys() {
        let value = serde_json::json!({"b": {"z": 1, "a": 2}, "a": [ {"y": 1, "x": 2} ]});
        let out = canonical_json(&value).expect("canonical");
        assert_eq!(out, r#"{"a":[{"x":2,"y":1}],"b":{"a":2,"z":1}}"#);
    }

    #[test]
    fn digest_is_64_char_hex() {
        let digest = compute_digest(&serde_json::json!({"k": "v"})).expect("digest");
        assert_eq!(digest.len(), 64);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn summary_digest_tracks_override_content() {
        let catalog = KnobCatalog::default();
        let baseline = OverrideMap::new();
        let mut overrides = OverrideMap::new();
        overrides.insert("A".to_string(), "1".to_string());
        let first = override_summary_digest(&overrides, &catalog, &baseline).expect("digest");
        let again = override_summary_digest(&overrides, &catalog, &baseline).expect("digest");
        assert_eq!(first, again);

        overrides.insert("A".to_string(), "2".to_string());
        let changed = override_summary_digest(&overrides, &catalog, &baseline).expect("digest");
        assert_ne!(first, changed);
    }
}
