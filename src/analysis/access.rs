//! Resilient field extraction from the loosely-shaped trees the reporting
//! API returns. Every other analysis module reads upstream values through
//! these helpers; nothing past this boundary sees a raw `serde_json::Value`
//! surprise (missing key, null, stringified number, "inf").

use serde_json::Value;

/// Walks `path` through nested objects. `None` if any intermediate node is
/// not an object, a key is absent, or the resolved value is JSON null.
pub fn safe_get<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Value> {
    let mut current = value;
    for key in path {
        current = current.as_object()?.get(*key)?;
    }
    if current.is_null() {
        return None;
    }
    Some(current)
}

/// Numeric coercion: accepts numbers and numeric strings, rejects NaN and
/// infinities. `None` means "no usable number here".
pub fn try_f64(value: Option<&Value>) -> Option<f64> {
    let parsed = match value? {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    parsed.is_finite().then_some(parsed)
}

pub fn convert_f64(value: Option<&Value>, fallback: f64) -> f64 {
    try_f64(value).unwrap_or(fallback)
}

/// Integer coercion. Fractional numbers truncate toward zero; strings must
/// parse as plain integers.
pub fn try_i64(value: Option<&Value>) -> Option<i64> {
    match value? {
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().filter(|f| f.is_finite()).map(|f| f as i64)),
        Value::String(text) => text.trim().parse::<i64>().ok(),
        _ => None,
    }
}

pub fn convert_i64(value: Option<&Value>, fallback: i64) -> i64 {
    try_i64(value).unwrap_or(fallback)
}

/// True when upstream encoded an unbounded ratio: a string that parses to
/// an infinite float ("inf", "Infinity", ...).
pub fn is_unbounded(value: &Value) -> bool {
    match value {
        Value::String(text) => text
            .trim()
            .parse::<f64>()
            .map(|f| f.is_infinite())
            .unwrap_or(false),
        _ => false,
    }
}
