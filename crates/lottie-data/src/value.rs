//! Pattern-matched accessors over untyped Lottie JSON.
//!
//! Lottie stores most properties either bare (`[x, y]`, `45`) or wrapped in a
//! keyed object (`{"a": 0, "k": [x, y]}`). These helpers read both forms and
//! fall back to caller-supplied defaults when a value cannot be coerced.

use serde_json::{Number, Value};

/// Coerces a scalar JSON value to `f64`.
///
/// Numbers, booleans and numeric strings coerce; everything else is `None`.
pub fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        Value::String(s) => s.trim().parse::<f64>().ok().filter(|v| v.is_finite()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Unwraps a keyed `{ "k": ... }` object, returning any other value unchanged.
pub fn keyed(value: &Value) -> &Value {
    match value {
        Value::Object(map) => map.get("k").unwrap_or(value),
        _ => value,
    }
}

/// Mutable counterpart of [`keyed`].
pub fn keyed_mut(value: &mut Value) -> &mut Value {
    if value.get("k").is_some() {
        // Checked above; the index cannot insert.
        return &mut value["k"];
    }
    value
}

/// True when the (unwrapped) value is a keyframe list rather than a static value.
pub fn is_animated(value: &Value) -> bool {
    match keyed(value) {
        Value::Array(items) => items.first().is_some_and(Value::is_object),
        _ => false,
    }
}

/// Reads every element of a numeric array. A lone number reads as one element.
pub fn numbers(value: &Value) -> Option<Vec<f64>> {
    match value {
        Value::Array(items) => items.iter().map(number).collect(),
        other => number(other).map(|n| vec![n]),
    }
}

/// Reads a scalar property, unwrapping keyed objects and single-element arrays.
pub fn number_or(value: Option<&Value>, default: f64) -> f64 {
    let Some(value) = value else {
        return default;
    };
    match keyed(value) {
        Value::Array(items) => items.first().and_then(number).unwrap_or(default),
        other => number(other).unwrap_or(default),
    }
}

/// Reads a two-component property (position, scale).
///
/// Each component defaults independently. A bare scalar applies to both axes.
pub fn pair_or(value: Option<&Value>, default: [f64; 2]) -> [f64; 2] {
    let Some(value) = value else {
        return default;
    };
    match keyed(value) {
        Value::Array(items) => [
            items.first().and_then(number).unwrap_or(default[0]),
            items.get(1).and_then(number).unwrap_or(default[1]),
        ],
        other => match number(other) {
            Some(n) => [n, n],
            None => default,
        },
    }
}

/// Converts an `f64` into a JSON number. Non-finite input becomes `0`.
pub fn json_number(value: f64) -> Value {
    Number::from_f64(value)
        .map(Value::Number)
        .unwrap_or_else(|| Value::Number(Number::from(0)))
}

/// Writes `new` into `slot`, keeping the stored number when it is already equal.
///
/// Keeping the original representation (`1` vs `1.0`) makes no-op edits
/// byte-stable under re-serialization.
pub fn write_number(slot: &mut Value, new: f64) {
    if slot.is_number() && number(slot) == Some(new) {
        return;
    }
    *slot = json_number(new);
}
