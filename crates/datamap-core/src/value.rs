//! Value model helpers
//!
//! Documents are represented with [`serde_json::Value`]. This module collects
//! the exhaustive helpers every consumer needs: type names for diagnostics,
//! truthiness, display strings and number construction.
//!
//! Numbers carry no integer/float distinction across the engine boundary.
//! Arithmetic results that are integral are written back as JSON integers so
//! that `100 * 1.2` serializes as `120`.
//!
//! Copyright (c) 2025 Datamap Team
//! Licensed under the Apache-2.0 license

use serde_json::{Number, Value};

/// Object node of a value tree
pub type Map = serde_json::Map<String, Value>;

/// Largest float magnitude that still converts to `i64` exactly
const I64_SAFE_BOUND: f64 = 9_007_199_254_740_992.0;

/// Name of the value's variant, used in error messages
pub fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "map",
    }
}

/// Truthiness used by logical operators and conditionals
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

/// Render a value as plain text
///
/// Strings are returned without quotes; containers render as compact JSON.
pub fn display_string(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => format_number(n),
        Value::String(s) => s.clone(),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

/// Numeric view of a value, if it is a number
pub fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        _ => None,
    }
}

/// Build a JSON number from a float, preferring the integer form when exact
///
/// Non-finite results have no JSON representation and become `null`.
pub fn number(f: f64) -> Value {
    if !f.is_finite() {
        return Value::Null;
    }
    if f.fract() == 0.0 && f.abs() < I64_SAFE_BOUND {
        return Value::Number(Number::from(f as i64));
    }
    Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null)
}

/// Build a JSON integer
pub fn integer(i: i64) -> Value {
    Value::Number(Number::from(i))
}

fn format_number(n: &Number) -> String {
    if let Some(i) = n.as_i64() {
        return i.to_string();
    }
    if let Some(u) = n.as_u64() {
        return u.to_string();
    }
    match n.as_f64() {
        Some(f) if f.fract() == 0.0 && f.abs() < I64_SAFE_BOUND => (f as i64).to_string(),
        Some(f) => f.to_string(),
        None => n.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_number_prefers_integers() {
        assert_eq!(number(120.0), json!(120));
        assert_eq!(number(-3.0), json!(-3));
        assert_eq!(number(3.14), json!(3.14));
        assert_eq!(number(f64::NAN), Value::Null);
        assert_eq!(number(f64::INFINITY), Value::Null);
    }

    #[test]
    fn test_display_string() {
        assert_eq!(display_string(&json!("abc")), "abc");
        assert_eq!(display_string(&json!(42)), "42");
        assert_eq!(display_string(&json!(2.5)), "2.5");
        assert_eq!(display_string(&json!(true)), "true");
        assert_eq!(display_string(&Value::Null), "null");
        assert_eq!(display_string(&json!({"a": [1, 2]})), r#"{"a":[1,2]}"#);
    }

    #[test]
    fn test_truthiness() {
        assert!(!is_truthy(&Value::Null));
        assert!(!is_truthy(&json!("")));
        assert!(!is_truthy(&json!(0)));
        assert!(!is_truthy(&json!([])));
        assert!(is_truthy(&json!("x")));
        assert!(is_truthy(&json!(0.5)));
        assert!(is_truthy(&json!({"k": null})));
    }

    #[test]
    fn test_type_names() {
        assert_eq!(type_name(&json!([])), "list");
        assert_eq!(type_name(&json!({})), "map");
        assert_eq!(type_name(&json!(1)), "number");
    }
}
