//! Null-safe nested-JSON access.
//!
//! Every accessor in the extraction layer goes through `pluck`, so the
//! degrade-to-default policy lives in exactly one place: a missing key, an
//! out-of-range index, or a wrong-typed node yields `Value::Null`, and the
//! typed views map that to a documented zero-value.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

static NULL: Value = Value::Null;

static LEADING_INT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+)").unwrap());

/// Walk a fixed path of object keys and array indices. Numeric segments index
/// arrays. Any miss returns `Null`; this never panics.
pub fn pluck<'a>(data: &'a Value, path: &[&str]) -> &'a Value {
    let mut current = data;
    for seg in path {
        current = match current {
            Value::Object(map) => map.get(*seg).unwrap_or(&NULL),
            Value::Array(arr) => match seg.parse::<usize>() {
                Ok(idx) => arr.get(idx).unwrap_or(&NULL),
                Err(_) => &NULL,
            },
            _ => &NULL,
        };
    }
    current
}

/// String at path, trimmed. Default: `""`.
pub fn str_at<'a>(data: &'a Value, path: &[&str]) -> &'a str {
    pluck(data, path).as_str().unwrap_or("").trim()
}

/// Number at path, accepting numeric strings too. Default: `0.0`.
pub fn f64_at(data: &Value, path: &[&str]) -> f64 {
    match pluck(data, path) {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    }
}

/// Integer at path, accepting numeric strings too. Default: `0`.
pub fn i64_at(data: &Value, path: &[&str]) -> i64 {
    match pluck(data, path) {
        Value::Number(n) => n.as_i64().unwrap_or(0),
        Value::String(s) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

static EMPTY: Vec<Value> = Vec::new();

/// Array at path. Default: empty slice.
pub fn arr_at<'a>(data: &'a Value, path: &[&str]) -> &'a [Value] {
    pluck(data, path).as_array().unwrap_or(&EMPTY)
}

/// Reduce a formatted currency string to its numeric value: drop any
/// `x <count> nights` multiplier suffix, strip every non-digit non-period
/// character, parse as float. `"$45.00 x 3 nights"` → `45.0`,
/// `"$312 total"` → `312.0`. Default: `0.0`.
pub fn money(text: &str) -> f64 {
    let head = text.split(['x', 'X']).next().unwrap_or(text);
    let cleaned: String = head
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect();
    cleaned.parse().unwrap_or(0.0)
}

/// Leading integer token of a string (`"8+ bedrooms"` → `8`). Default: `0`.
pub fn leading_int(text: &str) -> i64 {
    LEADING_INT_RE
        .captures(text)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse().ok())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn pluck_walks_objects_and_arrays() {
        let v = json!({"a": {"b": [{"c": 7}]}});
        assert_eq!(pluck(&v, &["a", "b", "0", "c"]), &json!(7));
    }

    #[test]
    fn pluck_is_total_on_arbitrary_shapes() {
        let cases = [
            json!({}),
            json!([]),
            json!(null),
            json!("text"),
            json!(3.5),
            json!({"a": 1}),
        ];
        for v in &cases {
            assert!(pluck(v, &["a", "deep", "2", "path"]).is_null());
        }
    }

    #[test]
    fn typed_views_default_on_wrong_types() {
        let v = json!({"s": 12, "f": "oops", "i": [], "a": "not-an-array"});
        assert_eq!(str_at(&v, &["s"]), "");
        assert_eq!(f64_at(&v, &["f"]), 0.0);
        assert_eq!(i64_at(&v, &["i"]), 0);
        assert!(arr_at(&v, &["a"]).is_empty());
    }

    #[test]
    fn typed_views_parse_numeric_strings() {
        let v = json!({"f": "4.92", "i": "128"});
        assert_eq!(f64_at(&v, &["f"]), 4.92);
        assert_eq!(i64_at(&v, &["i"]), 128);
    }

    #[test]
    fn money_strips_currency_noise() {
        assert_eq!(money("$45.00 x 3 nights"), 45.0);
        assert_eq!(money("$312 total"), 312.0);
        assert_eq!(money("$1,024"), 1024.0);
        assert_eq!(money(""), 0.0);
        assert_eq!(money("free"), 0.0);
    }

    #[test]
    fn leading_int_takes_first_token() {
        assert_eq!(leading_int("8+ bedrooms"), 8);
        assert_eq!(leading_int("3 beds"), 3);
        assert_eq!(leading_int("no beds"), 0);
    }
}
