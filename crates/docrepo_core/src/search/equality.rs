//! Equality matching with optional fuzzy tolerance.

use super::fuzzy::is_similar;
use serde_json::Value;

/// Compares a stored value against an expected one.
///
/// - Strings compare case-insensitively, or by similarity when `fuzzy` is set.
/// - Numbers compare numerically (`1` equals `1.0`).
/// - A stored array matches when any element matches a scalar expectation.
pub fn values_match(actual: &Value, expected: &Value, fuzzy: Option<f64>) -> bool {
    match (actual, expected) {
        (Value::Array(items), expected) if !expected.is_array() => {
            items.iter().any(|item| values_match(item, expected, fuzzy))
        }
        (Value::String(actual), Value::String(expected)) => match fuzzy {
            Some(threshold) => is_similar(expected, actual, threshold),
            None => actual.to_lowercase() == expected.to_lowercase(),
        },
        (Value::Number(actual), Value::Number(expected)) => {
            match (actual.as_f64(), expected.as_f64()) {
                (Some(a), Some(b)) => a == b,
                _ => actual == expected,
            }
        }
        (actual, expected) => actual == expected,
    }
}
