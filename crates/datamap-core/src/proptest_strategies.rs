//! Property-based testing strategies for generating test data
//!
//! This module provides proptest strategies for generating random
//! but valid documents, paths, rules and expressions.

#![cfg(test)]

use crate::path::Path;
use crate::rules::{MappingRule, TransformKind};
use crate::value::Map;
use proptest::collection::{hash_map, vec};
use proptest::option;
use proptest::prelude::*;
use serde_json::Value;

/// Strategy for generating map keys
pub fn key_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z_][a-zA-Z0-9_]{0,12}"
}

/// Strategy for generating simple JSON values with controlled depth
pub fn json_value_strategy() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(|n| Value::Number(n.into())),
        "[a-zA-Z0-9 ]{0,50}".prop_map(Value::String),
    ];

    leaf.prop_recursive(
        3,  // max depth
        10, // max size
        5,  // items per collection
        |inner| {
            prop_oneof![
                vec(inner.clone(), 0..5).prop_map(Value::Array),
                hash_map(key_strategy(), inner, 0..5)
                    .prop_map(|m| Value::Object(m.into_iter().collect())),
            ]
        },
    )
}

/// Strategy for generating top-level documents
pub fn document_strategy() -> impl Strategy<Value = Map> {
    hash_map(key_strategy(), json_value_strategy(), 0..6).prop_map(|m| m.into_iter().collect())
}

/// Strategy for generating map-key paths
pub fn path_strategy() -> impl Strategy<Value = Path> {
    vec(key_strategy(), 1..5).prop_map(|segments| match Path::new(segments) {
        Ok(path) => path,
        Err(err) => panic!("generated an invalid path: {}", err),
    })
}

/// Strategy for generating named transform kinds
pub fn named_kind_strategy() -> impl Strategy<Value = TransformKind> {
    prop_oneof![
        Just(TransformKind::Copy),
        Just(TransformKind::ToString),
        Just(TransformKind::MapGender),
        Just(TransformKind::ToBool),
        Just(TransformKind::FormatDate),
        Just(TransformKind::ToUpperCase),
        Just(TransformKind::ToLowerCase),
        Just(TransformKind::Capitalize),
    ]
}

/// Strategy for generating rules with named transforms
pub fn rule_strategy() -> impl Strategy<Value = MappingRule> {
    (
        path_strategy(),
        path_strategy(),
        named_kind_strategy(),
        any::<bool>(),
        option::of(prop_oneof![
            Just("true".to_string()),
            Just("42".to_string()),
            Just("3.5".to_string()),
            "[a-z]{1,8}",
        ]),
    )
        .prop_map(|(source, destination, kind, required, default_value)| {
            let mut rule = MappingRule::new(source, destination, kind);
            rule.required = required;
            rule.default_value = default_value;
            rule
        })
}

/// Strategy for generating well-formed expressions
pub fn expression_strategy() -> impl Strategy<Value = String> {
    let leaf = prop_oneof![
        Just("value".to_string()),
        (-1000i64..1000).prop_map(|n| n.to_string()),
        "[a-z ]{0,10}".prop_map(|s| format!("'{}'", s)),
        Just("nil".to_string()),
        Just("true".to_string()),
    ];

    leaf.prop_recursive(3, 16, 3, |inner| {
        prop_oneof![
            (inner.clone(), inner.clone()).prop_map(|(a, b)| format!("({} + {})", a, b)),
            (inner.clone(), inner.clone()).prop_map(|(a, b)| format!("{} == {}", a, b)),
            (inner.clone(), inner.clone(), inner.clone())
                .prop_map(|(c, a, b)| format!("{} ? {} : {}", c, a, b)),
            inner.clone().prop_map(|a| format!("toString({})", a)),
            (inner.clone(), inner).prop_map(|(a, b)| format!("coalesce({}, {})", a, b)),
        ]
    })
}

/// Strategy for generating arbitrary, usually malformed, expression text
pub fn expression_noise_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        any::<String>(),
        "[a-z0-9_ .()\\[\\]{}'\"+\\-*/%!=<>&|?:,]{0,40}",
    ]
}
