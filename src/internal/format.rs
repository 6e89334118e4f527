use serde_json::{Map, Value};

// Object keys that carry a single displayable value, checked in order.
const PRIMARY_FIELDS: &[&str] = &["date", "day"];

// Object keys holding an array of record-like items worth listing.
const LIST_FIELDS: &[&str] = &["meetings", "actions"];

// Human-facing fields of a record, in display order.
const RECORD_FIELDS: &[&str] = &["subject", "title", "summary", "startTime", "endTime"];

/// Convert a tool result into a single displayable string.
///
/// Ordered fallback, most specific rule first; the last resort is the
/// value's structural JSON, so formatting always yields some text no matter
/// how far a tool's result shape has drifted.
pub fn format_result(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        Value::Number(number) => number.to_string(),
        Value::Bool(flag) => flag.to_string(),
        Value::Array(items) => items
            .iter()
            .map(format_result)
            .collect::<Vec<String>>()
            .join(", "),
        Value::Object(map) => format_object(map),
    }
}

fn format_object(map: &Map<String, Value>) -> String {
    for field in PRIMARY_FIELDS {
        if let Some(value) = map.get(*field) {
            return format_result(value);
        }
    }

    for field in LIST_FIELDS {
        if let Some(Value::Array(items)) = map.get(*field) {
            return format_records(items);
        }
    }

    Value::Object(map.clone()).to_string()
}

fn format_records(items: &[Value]) -> String {
    items
        .iter()
        .enumerate()
        .map(|(index, item)| format!("{}. {}", index + 1, format_record(item)))
        .collect::<Vec<String>>()
        .join("\n")
}

fn format_record(item: &Value) -> String {
    let Some(map) = item.as_object() else {
        return format_result(item);
    };

    let parts: Vec<String> = RECORD_FIELDS
        .iter()
        .filter_map(|field| map.get(*field))
        .map(format_result)
        .collect();

    if parts.is_empty() {
        Value::Object(map.clone()).to_string()
    } else {
        parts.join(", ")
    }
}
