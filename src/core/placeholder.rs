use serde_json::Value;

/// Shown in a table cell that has no data.
pub const PLACEHOLDER: &str = "/";

/// Replaces `null` and `""` with [`PLACEHOLDER`]; every other value is returned unchanged.
///
/// `None` stands for a value that was never set and is passed through as `None`.
/// The check is intentionally narrower than "falsy": `0`, `false` and
/// whitespace-only strings are kept.
pub fn normalize_placeholder(value: Option<&Value>) -> Option<Value> {
    match value {
        None => None,
        Some(v) if is_blank(v) => Some(Value::String(PLACEHOLDER.to_string())),
        Some(v) => Some(v.clone()),
    }
}

/// `null` or the empty string.
pub fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

pub fn is_placeholder(value: &Value) -> bool {
    value.as_str() == Some(PLACEHOLDER)
}
