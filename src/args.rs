use serde_json::{json, Map, Value};

use crate::error::DaisyconError;

/// Turn CLI call arguments into positional resolver arguments.
///
/// `key=value` and `key:value` pairs, as well as inline JSON objects, are
/// merged into a single payload object appended last. Every other argument
/// is passed positionally, in order, as the raw string; the resolver parses
/// the entity id itself.
pub fn parse_call_args(args: &[String]) -> Result<Vec<Value>, DaisyconError> {
    let mut positional = Vec::new();
    let mut payload = Map::new();

    for arg in args {
        if let Some(obj) = inline_object(arg) {
            payload.extend(obj);
        } else if let Some((key, raw)) = split_pair(arg) {
            payload.insert(key.to_string(), coerce_value(raw));
        } else {
            positional.push(Value::String(arg.clone()));
        }
    }

    if !payload.is_empty() {
        positional.push(Value::Object(payload));
    }
    Ok(positional)
}

/// Parse `key=value` / `key:value` pairs into a payload object.
pub fn parse_pairs(args: &[String]) -> Result<Map<String, Value>, DaisyconError> {
    let mut payload = Map::new();
    for arg in args {
        if let Some(obj) = inline_object(arg) {
            payload.extend(obj);
            continue;
        }
        let (key, raw) = split_pair(arg).ok_or_else(|| DaisyconError::ConfigError {
            path: "<args>".into(),
            detail: format!("Cannot parse argument '{arg}': expected 'key=value' or 'key:value'"),
        })?;
        payload.insert(key.to_string(), coerce_value(raw));
    }
    Ok(payload)
}

fn inline_object(arg: &str) -> Option<Map<String, Value>> {
    let trimmed = arg.trim();
    if !(trimmed.starts_with('{') && trimmed.ends_with('}')) {
        return None;
    }
    match serde_json::from_str(trimmed) {
        Ok(Value::Object(map)) => Some(map),
        _ => None,
    }
}

/// Split on the first `=` or `:`, whichever comes first. Keys may contain
/// brackets for nested query parameters (`filter[status]=open`).
fn split_pair(arg: &str) -> Option<(&str, &str)> {
    let pos = arg.find(['=', ':'])?;
    let key = &arg[..pos];
    let valid_key = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '[' | ']' | '.'));
    valid_key.then(|| (key, &arg[pos + 1..]))
}

/// Coerce a raw string value into a JSON value.
fn coerce_value(raw: &str) -> Value {
    if raw.len() >= 2
        && ((raw.starts_with('"') && raw.ends_with('"'))
            || (raw.starts_with('\'') && raw.ends_with('\'')))
    {
        return Value::String(raw[1..raw.len() - 1].to_string());
    }

    if raw.eq_ignore_ascii_case("true") {
        return Value::Bool(true);
    }
    if raw.eq_ignore_ascii_case("false") {
        return Value::Bool(false);
    }
    if raw == "null" {
        return Value::Null;
    }

    if let Ok(n) = raw.parse::<i64>() {
        return json!(n);
    }
    if let Ok(f) = raw.parse::<f64>() {
        if f.is_finite() {
            return json!(f);
        }
    }

    if (raw.starts_with('{') && raw.ends_with('}')) || (raw.starts_with('[') && raw.ends_with(']'))
    {
        if let Ok(v) = serde_json::from_str::<Value>(raw) {
            return v;
        }
    }

    Value::String(raw.to_string())
}
