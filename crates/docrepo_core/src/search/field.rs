//! Field path resolution over JSON document bodies.

use serde_json::Value;

/// Resolves `field` inside `body`, descending into objects on `.` separators.
///
/// Returns `None` when any segment is missing or a non-object is traversed.
pub fn lookup<'a>(body: &'a Value, field: &str) -> Option<&'a Value> {
    if let Some(value) = body.get(field) {
        return Some(value);
    }

    let mut current = body;
    for segment in field.split('.') {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

/// Reads a numeric field, accepting JSON numbers and numeric strings.
pub fn lookup_f64(body: &Value, field: &str) -> Option<f64> {
    match lookup(body, field)? {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|value| value.is_finite())
}

#[cfg(test)]
mod tests {
    use super::{lookup, lookup_f64};
    use serde_json::json;

    #[test]
    fn lookup_prefers_literal_key_then_walks_dotted_path() {
        let body = json!({"a.b": 1, "a": {"b": 2, "c": {"d": "x"}}});
        assert_eq!(lookup(&body, "a.b"), Some(&json!(1)));
        assert_eq!(lookup(&body, "a.c.d"), Some(&json!("x")));
        assert_eq!(lookup(&body, "a.z"), None);
    }

    #[test]
    fn lookup_f64_accepts_numeric_strings() {
        let body = json!({"lat": "10.5", "lon": 3, "bad": "north"});
        assert_eq!(lookup_f64(&body, "lat"), Some(10.5));
        assert_eq!(lookup_f64(&body, "lon"), Some(3.0));
        assert_eq!(lookup_f64(&body, "bad"), None);
    }
}
