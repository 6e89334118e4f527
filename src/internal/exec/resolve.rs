use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

// A reference token must be the entire string value. Partial interpolation
// inside a larger string is not supported; a string with a `prev:` literal
// that does not match is left untouched.
static REFERENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\{\{prev:(\d+)\.([^{}]+)\}\}$").expect("reference pattern compiles"));

// One path segment: a property name with an optional trailing array index,
// e.g. `meetings` or `meetings[0]`.
static SEGMENT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([^\[\]]+)(?:\[(\d+)\])?$").expect("segment pattern compiles"));

/// Recursively replace `{{prev:N.path}}` tokens with values from the
/// result history.
///
/// Containers keep their shape; keys are never renamed or dropped here.
/// A reference into a missing history index or a missing path resolves to
/// `Null` rather than an error: the executor decides whether a gap is fatal.
pub fn resolve(value: &Value, history: &[Value]) -> Value {
    match value {
        Value::String(text) => resolve_string(text, history),
        Value::Array(items) => Value::Array(items.iter().map(|item| resolve(item, history)).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, item)| (key.clone(), resolve(item, history)))
                .collect(),
        ),
        other => other.clone(),
    }
}

fn resolve_string(text: &str, history: &[Value]) -> Value {
    let Some(caps) = REFERENCE.captures(text) else {
        return Value::String(text.to_string());
    };

    let index: usize = match caps[1].parse() {
        Ok(index) => index,
        Err(_) => return Value::Null,
    };
    let Some(entry) = history.get(index) else {
        return Value::Null;
    };

    walk_path(entry, &caps[2])
}

fn walk_path(root: &Value, path: &str) -> Value {
    let mut current = root;

    for segment in path.split('.') {
        let Some(caps) = SEGMENT.captures(segment) else {
            return Value::Null;
        };

        let Some(next) = current.get(&caps[1]) else {
            return Value::Null;
        };
        current = next;

        if let Some(index) = caps.get(2) {
            let index: usize = match index.as_str().parse() {
                Ok(index) => index,
                Err(_) => return Value::Null,
            };
            let Some(element) = current.as_array().and_then(|items| items.get(index)) else {
                return Value::Null;
            };
            current = element;
        }
    }

    current.clone()
}
