//! Response normalization into mapping-shaped output records.
//!
//! The upstream API is inconsistent: some endpoints wrap results in an array
//! under `data`, some nest the array one level deeper, others return a flat
//! object. Sequences are re-keyed by index (`"0"`, `"1"`, …) so every record
//! is a mapping.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::types::OutputRecord;

/// How a raw response body is reshaped before it is returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NormalizeMode {
    /// Re-key `R.data` when it is an array.
    ArrayIndexed,
    /// Re-key `R.data.data` when it is an array.
    NestedArrayIndexed,
    /// Return `R` verbatim.
    Passthrough,
}

/// Apply a normalization mode to a parsed response body.
pub fn normalize(response: Value, mode: NormalizeMode) -> Vec<OutputRecord> {
    let indexed = match mode {
        NormalizeMode::ArrayIndexed => response
            .get("data")
            .and_then(Value::as_array)
            .map(|items| index_sequence(items)),
        NormalizeMode::NestedArrayIndexed => response
            .get("data")
            .and_then(|data| data.get("data"))
            .and_then(Value::as_array)
            .map(|items| index_sequence(items)),
        NormalizeMode::Passthrough => None,
    };

    vec![OutputRecord::new(indexed.unwrap_or(response))]
}

/// Re-key a sequence into a mapping whose keys are the decimal indices.
pub fn index_sequence(items: &[Value]) -> Value {
    let map: Map<String, Value> = items
        .iter()
        .enumerate()
        .map(|(idx, item)| (idx.to_string(), item.clone()))
        .collect();
    Value::Object(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_array_indexed_rekeys_data() {
        let records = normalize(
            json!({ "data": ["a", "b", "c"], "requestId": "r1" }),
            NormalizeMode::ArrayIndexed,
        );
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].json, json!({ "0": "a", "1": "b", "2": "c" }));
    }

    #[test]
    fn test_array_indexed_without_array_keeps_response() {
        let raw = json!({ "foo": "bar" });
        let records = normalize(raw.clone(), NormalizeMode::ArrayIndexed);
        assert_eq!(records[0].json, raw);

        let raw = json!({ "data": { "total": 3 } });
        let records = normalize(raw.clone(), NormalizeMode::ArrayIndexed);
        assert_eq!(records[0].json, raw);
    }

    #[test]
    fn test_array_indexed_empty_array() {
        let records = normalize(json!({ "data": [] }), NormalizeMode::ArrayIndexed);
        assert_eq!(records[0].json, json!({}));
    }

    #[test]
    fn test_nested_array_indexed() {
        let records = normalize(
            json!({ "data": { "data": [{ "x": 1 }, { "y": 2 }], "total": 2 } }),
            NormalizeMode::NestedArrayIndexed,
        );
        assert_eq!(records[0].json, json!({ "0": { "x": 1 }, "1": { "y": 2 } }));
    }

    #[test]
    fn test_nested_ignores_flat_array() {
        let raw = json!({ "data": [1, 2] });
        let records = normalize(raw.clone(), NormalizeMode::NestedArrayIndexed);
        assert_eq!(records[0].json, raw);
    }

    #[test]
    fn test_passthrough_never_reshapes() {
        let raw = json!({ "data": [1, 2, 3] });
        let records = normalize(raw.clone(), NormalizeMode::Passthrough);
        assert_eq!(records[0].json, raw);
    }

    #[test]
    fn test_index_order_preserved_past_ten() {
        let items: Vec<Value> = (0..12).map(|i| json!(i)).collect();
        let indexed = index_sequence(&items);
        let keys: Vec<&String> = indexed.as_object().unwrap().keys().collect();
        let expected: Vec<String> = (0..12).map(|i| i.to_string()).collect();
        assert_eq!(keys, expected.iter().collect::<Vec<_>>());
    }
}
