//! Named transforms and post-processing of expression results
//!
//! Copyright (c) 2025 Datamap Team
//! Licensed under the Apache-2.0 license

use crate::expression::functions::{self, DEFAULT_DATE_FORMAT};
use crate::rules::TransformKind;
use crate::value;
use serde_json::Value;

/// Apply a parameterless named transform to a present source value
///
/// String transforms leave non-string values untouched. `expression` is
/// handled by the engine and is the identity here.
pub fn apply_named(kind: TransformKind, value: Value) -> Value {
    match kind {
        TransformKind::Copy | TransformKind::Expression => value,
        TransformKind::ToString => match value {
            Value::String(_) => value,
            other => Value::String(value::display_string(&other)),
        },
        TransformKind::MapGender => functions::map_gender(value),
        TransformKind::ToBool => Value::Bool(functions::to_bool(&value)),
        TransformKind::FormatDate => match &value {
            Value::String(s) => functions::format_date(s, DEFAULT_DATE_FORMAT)
                .map(Value::String)
                .unwrap_or(value),
            _ => value,
        },
        TransformKind::ToUpperCase => map_string(value, |s| s.to_uppercase()),
        TransformKind::ToLowerCase => map_string(value, |s| s.to_lowercase()),
        TransformKind::Capitalize => map_string(value, functions::capitalize),
    }
}

fn map_string(value: Value, f: impl FnOnce(&str) -> String) -> Value {
    match value {
        Value::String(s) => Value::String(f(&s)),
        other => other,
    }
}

/// Replace a string result that holds embedded JSON with the parsed value
///
/// Only strings starting with `[` or `{` are candidates; anything that
/// fails to parse is kept as the original string.
pub fn parse_embedded_json(value: Value) -> Value {
    match value {
        Value::String(s) if s.starts_with('[') || s.starts_with('{') => {
            serde_json::from_str(&s).unwrap_or(Value::String(s))
        }
        other => other,
    }
}
