//! Dotted-path lookup into the most recent step result.
//!
//! Tool configs address prior output with paths like `$json.input` or
//! `$json.aiOutput`. The resolver only sees the latest entry in the
//! accumulator; addressing an arbitrary earlier step is not supported.

use serde_json::Value;

/// Resolve a dotted path against a result payload. A leading `$json` (with
/// or without a trailing dot) refers to the payload root. Missing segments
/// resolve to null.
pub fn resolve(result: &Value, path: &str) -> Value {
    let trimmed = path
        .strip_prefix("$json.")
        .or_else(|| path.strip_prefix("$json"))
        .unwrap_or(path);
    if trimmed.is_empty() {
        return result.clone();
    }
    let mut current = result;
    for segment in trimmed.split('.') {
        match current.get(segment) {
            Some(next) => current = next,
            None => return Value::Null,
        }
    }
    current.clone()
}

/// Pull the conventional output of a result payload: `aiOutput` first, then
/// `content`, then `output`.
pub fn conventional_output(result: &Value) -> Value {
    for key in ["aiOutput", "content", "output"] {
        if let Some(v) = result.get(key) {
            if !v.is_null() {
                return v.clone();
            }
        }
    }
    Value::Null
}

/// Render a value as prompt/body text: strings stay bare, everything else is
/// serialized as JSON.
pub fn as_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
