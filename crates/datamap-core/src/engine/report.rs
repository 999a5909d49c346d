//! Missing-required-field report for buffered transforms
//!
//! Copyright (c) 2025 Datamap Team
//! Licensed under the Apache-2.0 license

use crate::path;
use crate::rules::MappingRule;
use crate::value::Map;
use serde_json::Value;

/// Dot-joined destinations of required rules absent from `output`
///
/// Paths are deduplicated and kept in rule order. When the output holds a
/// top-level `applicants` list, destinations are looked up in its first
/// element instead of the root; an empty list or a non-map first element
/// reports nothing.
pub fn missing_required_fields(output: &Map, rules: &[MappingRule]) -> Vec<String> {
    let root = match output.get("applicants") {
        Some(Value::Array(items)) => match items.first() {
            Some(Value::Object(first)) => first,
            _ => return Vec::new(),
        },
        _ => output,
    };

    let mut missing: Vec<String> = Vec::new();
    for rule in rules.iter().filter(|rule| rule.required) {
        if path::get_in(root, &rule.destination_path).is_some() {
            continue;
        }
        let dotted = rule.destination_path.to_string();
        if !missing.contains(&dotted) {
            missing.push(dotted);
        }
    }
    missing
}
