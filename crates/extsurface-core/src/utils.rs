//! Stateless helpers exposed to extensions.

use crate::value::Value;

/// Parse JSON text into a [`Value`], returning `None` on malformed input.
pub fn try_parse_json(text: &str) -> Option<Value> {
    serde_json::from_str::<serde_json::Value>(text)
        .ok()
        .map(Value::from)
}

/// Convert `snake_case`, `kebab-case` or space separated words to `camelCase`.
pub fn to_camel_case(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut upper_next = false;

    for ch in input.chars() {
        if matches!(ch, '_' | '-' | ' ') {
            upper_next = !out.is_empty();
            continue;
        }
        if upper_next {
            out.extend(ch.to_uppercase());
            upper_next = false;
        } else if out.is_empty() {
            out.extend(ch.to_lowercase());
        } else {
            out.push(ch);
        }
    }

    out
}

/// Structural comparison that treats integers and floats with equal value as equal.
pub fn deep_compare(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Integer(x), Value::Float(y)) | (Value::Float(y), Value::Integer(x)) => {
            (*x as f64) == *y
        }
        (Value::Array(x), Value::Array(y)) => {
            x.len() == y.len() && x.iter().zip(y).all(|(l, r)| deep_compare(l, r))
        }
        (Value::Object(x), Value::Object(y)) => {
            x.len() == y.len()
                && x
                    .iter()
                    .all(|(k, v)| y.get(k).is_some_and(|other| deep_compare(v, other)))
        }
        _ => a == b,
    }
}

/// Remove the first occurrence of `item`. Returns whether anything was removed.
pub fn remove_from_vec<T: PartialEq>(items: &mut Vec<T>, item: &T) -> bool {
    match items.iter().position(|candidate| candidate == item) {
        Some(index) => {
            items.remove(index);
            true
        }
        None => false,
    }
}
