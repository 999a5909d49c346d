//! Values written for required rules whose source is absent
//!
//! Copyright (c) 2025 Datamap Team
//! Licensed under the Apache-2.0 license

use crate::rules::MappingRule;
use crate::value;
use serde_json::Value;

/// Value to write for a required rule with no source value
pub fn default_for(rule: &MappingRule) -> Value {
    match rule.default_value.as_deref() {
        Some(text) if !text.is_empty() => coerce_default(text),
        _ => infer_placeholder(rule.destination_path.last()),
    }
}

/// Coerce a textual default: bool, then integer, then float, then string
///
/// Only the exact strings `true` and `false` become booleans. A float that
/// parses to infinity or NaN has no JSON form and stays a string.
pub fn coerce_default(text: &str) -> Value {
    match text {
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        _ => {}
    }
    if let Ok(i) = text.parse::<i64>() {
        return value::integer(i);
    }
    match text.parse::<f64>() {
        Ok(f) if f.is_finite() => value::number(f),
        _ => Value::String(text.to_string()),
    }
}

/// Guess an empty value from the destination's final segment
///
/// Matching is a case-insensitive substring test, so names like `video` or
/// `this` also hit the `id` / `is` branches.
pub fn infer_placeholder(field: &str) -> Value {
    let field = field.to_lowercase();
    if ["count", "number", "id"].iter().any(|hint| field.contains(hint)) {
        value::integer(0)
    } else if ["is", "has"].iter().any(|hint| field.contains(hint)) {
        Value::Bool(false)
    } else {
        Value::String(String::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_coerce_default_priority() {
        assert_eq!(coerce_default("true"), json!(true));
        assert_eq!(coerce_default("false"), json!(false));
        assert_eq!(coerce_default("True"), json!("True"));
        assert_eq!(coerce_default("42"), json!(42));
        assert_eq!(coerce_default("-7"), json!(-7));
        assert_eq!(coerce_default("3.14"), json!(3.14));
        assert_eq!(coerce_default("1e3"), json!(1000));
        assert_eq!(coerce_default("N/A"), json!("N/A"));
        assert_eq!(coerce_default("inf"), json!("inf"));
    }

    #[test]
    fn test_infer_placeholder() {
        assert_eq!(infer_placeholder("userId"), json!(0));
        assert_eq!(infer_placeholder("itemCount"), json!(0));
        assert_eq!(infer_placeholder("phoneNumber"), json!(0));
        assert_eq!(infer_placeholder("isActive"), json!(false));
        assert_eq!(infer_placeholder("hasChildren"), json!(false));
        assert_eq!(infer_placeholder("label"), json!(""));
        // plain substring matching
        assert_eq!(infer_placeholder("video"), json!(0));
        assert_eq!(infer_placeholder("this"), json!(false));
    }
}
