//! Query-string normalisation

use serde_json::{Map, Value};

/// Query parameters as ordered `(key, value)` pairs
pub type QueryParams = Vec<(String, String)>;

/// Flatten JSON parameters into query pairs
///
/// Booleans become `0`/`1`, objects are JSON-encoded, arrays repeat the key
/// once per element and nulls are dropped.
pub fn format_params(params: &Map<String, Value>) -> QueryParams {
    let mut pairs = Vec::with_capacity(params.len());
    for (key, value) in params {
        match value {
            Value::Array(items) => {
                for item in items {
                    if let Some(item) = format_value(item) {
                        pairs.push((key.clone(), item));
                    }
                }
            }
            other => {
                if let Some(value) = format_value(other) {
                    pairs.push((key.clone(), value));
                }
            }
        }
    }
    pairs
}

fn format_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::Bool(b) => Some(if *b { "1" } else { "0" }.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) => Some(s.clone()),
        Value::Object(_) | Value::Array(_) => Some(value.to_string()),
    }
}
