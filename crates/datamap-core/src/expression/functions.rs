//! Helper function catalogue available to expressions
//!
//! Every helper is a plain function over already-evaluated arguments. Helpers
//! see the evaluation [`Clock`] and nothing else.
//!
//! The pure transforms behind the named rule kinds (`mapGender`, `toBool`,
//! `formatDate`, `capitalize`) live here too, so the engine and the
//! expression language agree on their behaviour.
//!
//! Copyright (c) 2025 Datamap Team
//! Licensed under the Apache-2.0 license

use super::error::ExpressionError;
use super::Clock;
use crate::path;
use crate::value::{self, type_name};
use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone};
use serde_json::Value;
use std::fmt::Write;

/// Signature shared by every helper
pub type Function = fn(&[Value], &Clock) -> Result<Value, ExpressionError>;

/// Output format of the parameterless `formatDate` transform kind
pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d";

/// Input layouts tried in order by [`format_date`]; the flag marks
/// four-digit-year layouts
const DATE_LAYOUTS: &[(&str, bool)] = &[
    ("%d-%B-%Y", true),
    ("%d-%b-%Y", true),
    ("%d/%B/%Y", true),
    ("%d-%B-%y", false),
    ("%Y-%m-%d", true),
];

/// Resolve a helper by name
pub fn lookup(name: &str) -> Option<Function> {
    let function: Function = match name {
        "formatDate" => format_date_fn,
        "getCurrentDate" => current_date_fn,
        "toUpper" | "upper" => to_upper_fn,
        "toLower" | "lower" => to_lower_fn,
        "trim" => trim_fn,
        "replace" => replace_fn,
        "contains" => contains_fn,
        "startsWith" => starts_with_fn,
        "endsWith" => ends_with_fn,
        "capitalize" => capitalize_fn,
        "substr" => substr_fn,
        "toInt" => to_int_fn,
        "toFloat" => to_float_fn,
        "toString" => to_string_fn,
        "toBool" => to_bool_fn,
        "join" => join_fn,
        "split" => split_fn,
        "length" | "len" => length_fn,
        "getPath" => get_path_fn,
        "ifThen" => if_then_fn,
        "coalesce" => coalesce_fn,
        "add" => add_fn,
        "subtract" => subtract_fn,
        "multiply" => multiply_fn,
        "divide" => divide_fn,
        "round" => round_fn,
        _ => return None,
    };
    Some(function)
}

/// Reformat a date string, trying each known input layout in order
///
/// Returns `None` when no layout matches or `output_format` is not a valid
/// strftime string.
pub fn format_date(input: &str, output_format: &str) -> Option<String> {
    let items = strftime_items(output_format)?;
    let parsed = parse_date(input.trim())?;
    let mut out = String::new();
    write!(out, "{}", parsed.format_with_items(items.iter())).ok()?;
    Some(out)
}

fn strftime_items(format: &str) -> Option<Vec<Item<'_>>> {
    let items: Vec<Item<'_>> = StrftimeItems::new(format).collect();
    if items.iter().any(|item| matches!(item, Item::Error)) {
        return None;
    }
    Some(items)
}

fn parse_date(input: &str) -> Option<DateTime<FixedOffset>> {
    let utc = FixedOffset::east_opt(0)?;
    for (layout, four_digit_year) in DATE_LAYOUTS {
        let Ok(date) = NaiveDate::parse_from_str(input, layout) else {
            continue;
        };
        if *four_digit_year && !(1000..=9999).contains(&chrono::Datelike::year(&date)) {
            continue;
        }
        let midnight = date.and_hms_opt(0, 0, 0)?;
        return Some(utc.from_utc_datetime(&midnight));
    }
    DateTime::parse_from_rfc3339(input).ok()
}

/// Normalise a gender code to `M`, `F` or `O`; anything else passes through
pub fn map_gender(value: Value) -> Value {
    let code = match &value {
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "m" | "male" => "M",
            "f" | "female" => "F",
            "o" | "other" => "O",
            _ => return value,
        },
        _ => return value,
    };
    Value::String(code.to_string())
}

/// Lenient boolean conversion
pub fn to_bool(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::String(s) => matches!(s.to_lowercase().as_str(), "true" | "yes" | "1" | "y"),
        Value::Number(n) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
        _ => false,
    }
}

/// First character upper-cased, the rest lower-cased
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first
            .to_uppercase()
            .chain(chars.as_str().to_lowercase().chars())
            .collect(),
        None => String::new(),
    }
}

fn expect_args(function: &str, args: &[Value], expected: usize) -> Result<(), ExpressionError> {
    if args.len() != expected {
        return Err(ExpressionError::arity(function, expected.to_string(), args.len()));
    }
    Ok(())
}

fn expect_arg_range(
    function: &str,
    args: &[Value],
    min: usize,
    max: usize,
) -> Result<(), ExpressionError> {
    if args.len() < min || args.len() > max {
        return Err(ExpressionError::arity(
            function,
            format!("{} to {}", min, max),
            args.len(),
        ));
    }
    Ok(())
}

fn string_arg<'v>(function: &str, value: &'v Value) -> Result<&'v str, ExpressionError> {
    value.as_str().ok_or_else(|| {
        ExpressionError::type_mismatch(format!("{}()", function), "string", type_name(value))
    })
}

fn number_arg(function: &str, value: &Value) -> Result<f64, ExpressionError> {
    value::as_f64(value).ok_or_else(|| {
        ExpressionError::type_mismatch(format!("{}()", function), "number", type_name(value))
    })
}

fn integer_arg(function: &str, value: &Value) -> Result<i64, ExpressionError> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.fract() == 0.0).map(|f| f as i64))
            .ok_or_else(|| {
                ExpressionError::invalid_argument(function, format!("{} is not an integer", n))
            }),
        other => Err(ExpressionError::type_mismatch(
            format!("{}()", function),
            "integer",
            type_name(other),
        )),
    }
}

fn format_date_fn(args: &[Value], _clock: &Clock) -> Result<Value, ExpressionError> {
    expect_args("formatDate", args, 2)?;
    let input = string_arg("formatDate", &args[0])?;
    let format = string_arg("formatDate", &args[1])?;
    if strftime_items(format).is_none() {
        return Err(ExpressionError::invalid_argument(
            "formatDate",
            format!("invalid date format '{}'", format),
        ));
    }
    Ok(Value::String(
        format_date(input, format).unwrap_or_else(|| input.to_string()),
    ))
}

fn current_date_fn(args: &[Value], clock: &Clock) -> Result<Value, ExpressionError> {
    expect_args("getCurrentDate", args, 0)?;
    Ok(Value::String(clock.today()))
}

fn to_upper_fn(args: &[Value], _clock: &Clock) -> Result<Value, ExpressionError> {
    expect_args("toUpper", args, 1)?;
    Ok(Value::String(string_arg("toUpper", &args[0])?.to_uppercase()))
}

fn to_lower_fn(args: &[Value], _clock: &Clock) -> Result<Value, ExpressionError> {
    expect_args("toLower", args, 1)?;
    Ok(Value::String(string_arg("toLower", &args[0])?.to_lowercase()))
}

fn trim_fn(args: &[Value], _clock: &Clock) -> Result<Value, ExpressionError> {
    expect_args("trim", args, 1)?;
    Ok(Value::String(string_arg("trim", &args[0])?.trim().to_string()))
}

/// `replace(s, old, new[, n])`; a negative or missing `n` replaces every match
fn replace_fn(args: &[Value], _clock: &Clock) -> Result<Value, ExpressionError> {
    expect_arg_range("replace", args, 3, 4)?;
    let s = string_arg("replace", &args[0])?;
    let old = string_arg("replace", &args[1])?;
    let new = string_arg("replace", &args[2])?;
    let limit = match args.get(3) {
        Some(n) => integer_arg("replace", n)?,
        None => -1,
    };
    let replaced = match usize::try_from(limit) {
        Ok(n) => s.replacen(old, new, n),
        Err(_) => s.replace(old, new),
    };
    Ok(Value::String(replaced))
}

fn contains_fn(args: &[Value], _clock: &Clock) -> Result<Value, ExpressionError> {
    expect_args("contains", args, 2)?;
    let s = string_arg("contains", &args[0])?;
    let fragment = string_arg("contains", &args[1])?;
    Ok(Value::Bool(s.contains(fragment)))
}

fn starts_with_fn(args: &[Value], _clock: &Clock) -> Result<Value, ExpressionError> {
    expect_args("startsWith", args, 2)?;
    let s = string_arg("startsWith", &args[0])?;
    let prefix = string_arg("startsWith", &args[1])?;
    Ok(Value::Bool(s.starts_with(prefix)))
}

fn ends_with_fn(args: &[Value], _clock: &Clock) -> Result<Value, ExpressionError> {
    expect_args("endsWith", args, 2)?;
    let s = string_arg("endsWith", &args[0])?;
    let suffix = string_arg("endsWith", &args[1])?;
    Ok(Value::Bool(s.ends_with(suffix)))
}

fn capitalize_fn(args: &[Value], _clock: &Clock) -> Result<Value, ExpressionError> {
    expect_args("capitalize", args, 1)?;
    Ok(Value::String(capitalize(string_arg("capitalize", &args[0])?)))
}

/// `substr(s, start[, len])` over characters, clamped to the string
fn substr_fn(args: &[Value], _clock: &Clock) -> Result<Value, ExpressionError> {
    expect_arg_range("substr", args, 2, 3)?;
    let s = string_arg("substr", &args[0])?;
    let start = integer_arg("substr", &args[1])?;
    if start < 0 {
        return Err(ExpressionError::invalid_argument(
            "substr",
            "start must not be negative",
        ));
    }
    let take = match args.get(2) {
        Some(len) => {
            let len = integer_arg("substr", len)?;
            usize::try_from(len).map_err(|_| {
                ExpressionError::invalid_argument("substr", "length must not be negative")
            })?
        }
        None => usize::MAX,
    };
    let start = usize::try_from(start).unwrap_or(usize::MAX);
    Ok(Value::String(s.chars().skip(start).take(take).collect()))
}

/// Unparseable strings convert to 0
fn to_int_fn(args: &[Value], _clock: &Clock) -> Result<Value, ExpressionError> {
    expect_args("toInt", args, 1)?;
    let converted = match &args[0] {
        Value::Number(n) => match n.as_i64() {
            Some(i) => i,
            None => n.as_f64().map(|f| f.trunc() as i64).unwrap_or(0),
        },
        Value::String(s) => s.trim().parse::<i64>().unwrap_or(0),
        Value::Bool(b) => i64::from(*b),
        _ => 0,
    };
    Ok(value::integer(converted))
}

/// Unparseable strings convert to 0
fn to_float_fn(args: &[Value], _clock: &Clock) -> Result<Value, ExpressionError> {
    expect_args("toFloat", args, 1)?;
    let converted = match &args[0] {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse::<f64>().unwrap_or(0.0),
        _ => 0.0,
    };
    Ok(value::number(converted))
}

fn to_string_fn(args: &[Value], _clock: &Clock) -> Result<Value, ExpressionError> {
    expect_args("toString", args, 1)?;
    Ok(Value::String(value::display_string(&args[0])))
}

fn to_bool_fn(args: &[Value], _clock: &Clock) -> Result<Value, ExpressionError> {
    expect_args("toBool", args, 1)?;
    Ok(Value::Bool(to_bool(&args[0])))
}

fn join_fn(args: &[Value], _clock: &Clock) -> Result<Value, ExpressionError> {
    expect_args("join", args, 2)?;
    let separator = string_arg("join", &args[1])?;
    match &args[0] {
        Value::Array(items) => Ok(Value::String(
            items
                .iter()
                .map(value::display_string)
                .collect::<Vec<_>>()
                .join(separator),
        )),
        other => Err(ExpressionError::type_mismatch(
            "join()",
            "list",
            type_name(other),
        )),
    }
}

/// An empty separator splits into characters
fn split_fn(args: &[Value], _clock: &Clock) -> Result<Value, ExpressionError> {
    expect_args("split", args, 2)?;
    let s = string_arg("split", &args[0])?;
    let separator = string_arg("split", &args[1])?;
    let parts: Vec<Value> = if separator.is_empty() {
        s.chars().map(|c| Value::String(c.to_string())).collect()
    } else {
        s.split(separator)
            .map(|part| Value::String(part.to_string()))
            .collect()
    };
    Ok(Value::Array(parts))
}

fn length_fn(args: &[Value], _clock: &Clock) -> Result<Value, ExpressionError> {
    expect_args("length", args, 1)?;
    let len = match &args[0] {
        Value::String(s) => s.chars().count(),
        Value::Array(items) => items.len(),
        Value::Object(map) => map.len(),
        _ => 0,
    };
    Ok(value::integer(i64::try_from(len).unwrap_or(i64::MAX)))
}

/// `getPath(tree, seg, ...)`; segments may be strings or integers
fn get_path_fn(args: &[Value], _clock: &Clock) -> Result<Value, ExpressionError> {
    let Some((tree, segments)) = args.split_first() else {
        return Err(ExpressionError::arity("getPath", "at least 1", 0));
    };
    let segments = segments
        .iter()
        .map(|segment| match segment {
            Value::String(s) => Ok(s.clone()),
            Value::Number(n) if n.is_i64() || n.is_u64() => Ok(n.to_string()),
            other => Err(ExpressionError::type_mismatch(
                "getPath()",
                "string or integer segment",
                type_name(other),
            )),
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(path::get_segments(tree, &segments)
        .cloned()
        .unwrap_or(Value::Null))
}

fn if_then_fn(args: &[Value], _clock: &Clock) -> Result<Value, ExpressionError> {
    expect_args("ifThen", args, 3)?;
    let chosen = if value::is_truthy(&args[0]) {
        &args[1]
    } else {
        &args[2]
    };
    Ok(chosen.clone())
}

fn coalesce_fn(args: &[Value], _clock: &Clock) -> Result<Value, ExpressionError> {
    expect_args("coalesce", args, 2)?;
    let chosen = if args[0].is_null() { &args[1] } else { &args[0] };
    Ok(chosen.clone())
}

fn numeric_pair(function: &str, args: &[Value]) -> Result<(f64, f64), ExpressionError> {
    expect_args(function, args, 2)?;
    Ok((number_arg(function, &args[0])?, number_arg(function, &args[1])?))
}

fn add_fn(args: &[Value], _clock: &Clock) -> Result<Value, ExpressionError> {
    let (a, b) = numeric_pair("add", args)?;
    Ok(value::number(a + b))
}

fn subtract_fn(args: &[Value], _clock: &Clock) -> Result<Value, ExpressionError> {
    let (a, b) = numeric_pair("subtract", args)?;
    Ok(value::number(a - b))
}

fn multiply_fn(args: &[Value], _clock: &Clock) -> Result<Value, ExpressionError> {
    let (a, b) = numeric_pair("multiply", args)?;
    Ok(value::number(a * b))
}

/// Division by zero yields 0
fn divide_fn(args: &[Value], _clock: &Clock) -> Result<Value, ExpressionError> {
    let (a, b) = numeric_pair("divide", args)?;
    if b == 0.0 {
        return Ok(value::integer(0));
    }
    Ok(value::number(a / b))
}

fn round_fn(args: &[Value], _clock: &Clock) -> Result<Value, ExpressionError> {
    expect_arg_range("round", args, 1, 2)?;
    let n = number_arg("round", &args[0])?;
    let precision = match args.get(1) {
        Some(p) => integer_arg("round", p)?,
        None => 0,
    };
    let precision = i32::try_from(precision.clamp(-308, 308)).unwrap_or(0);
    let factor = 10f64.powi(precision);
    Ok(value::number((n * factor).round() / factor))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    fn call(name: &str, args: Vec<Value>) -> Result<Value, ExpressionError> {
        let function = lookup(name).unwrap();
        function(&args, &Clock::system())
    }

    #[test]
    fn test_format_date_layouts() {
        assert_eq!(format_date("05-March-2024", "%d/%m/%Y").unwrap(), "05/03/2024");
        assert_eq!(format_date("05-Mar-2024", "%Y-%m-%d").unwrap(), "2024-03-05");
        assert_eq!(format_date("05/March/2024", "%Y-%m-%d").unwrap(), "2024-03-05");
        assert_eq!(format_date("05-March-24", "%Y-%m-%d").unwrap(), "2024-03-05");
        assert_eq!(format_date("2024-03-05", "%d %B %Y").unwrap(), "05 March 2024");
        assert_eq!(
            format_date("2024-03-05T10:15:00+02:00", "%Y-%m-%d %H:%M").unwrap(),
            "2024-03-05 10:15"
        );
        assert!(format_date("not a date", "%Y").is_none());
        assert!(format_date("2024-03-05", "%Q").is_none());
    }

    #[test]
    fn test_format_date_helper_returns_input_on_failure() {
        assert_eq!(
            call("formatDate", vec![json!("someday"), json!("%Y")]).unwrap(),
            json!("someday")
        );
        assert!(matches!(
            call("formatDate", vec![json!("2024-03-05"), json!("%Q")]),
            Err(ExpressionError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_current_date_uses_clock() {
        let clock = Clock::fixed(Utc.with_ymd_and_hms(2024, 2, 29, 23, 59, 59).unwrap());
        let function = lookup("getCurrentDate").unwrap();
        assert_eq!(function(&[], &clock).unwrap(), json!("2024-02-29"));
    }

    #[test]
    fn test_string_helpers() {
        assert_eq!(call("toUpper", vec![json!("abc")]).unwrap(), json!("ABC"));
        assert_eq!(call("lower", vec![json!("ABC")]).unwrap(), json!("abc"));
        assert_eq!(call("trim", vec![json!("  x ")]).unwrap(), json!("x"));
        assert_eq!(
            call("replace", vec![json!("a-b-c"), json!("-"), json!("+")]).unwrap(),
            json!("a+b+c")
        );
        assert_eq!(
            call("replace", vec![json!("a-b-c"), json!("-"), json!("+"), json!(1)]).unwrap(),
            json!("a+b-c")
        );
        assert_eq!(call("contains", vec![json!("hello"), json!("ell")]).unwrap(), json!(true));
        assert_eq!(call("startsWith", vec![json!("hello"), json!("he")]).unwrap(), json!(true));
        assert_eq!(call("endsWith", vec![json!("hello"), json!("x")]).unwrap(), json!(false));
        assert_eq!(call("capitalize", vec![json!("jOHN")]).unwrap(), json!("John"));
        assert_eq!(call("capitalize", vec![json!("")]).unwrap(), json!(""));
        assert_eq!(call("substr", vec![json!("héllo"), json!(1), json!(3)]).unwrap(), json!("éll"));
        assert_eq!(call("substr", vec![json!("abc"), json!(5)]).unwrap(), json!(""));
        assert!(call("toUpper", vec![json!(1)]).is_err());
    }

    #[test]
    fn test_conversions() {
        assert_eq!(call("toInt", vec![json!("42")]).unwrap(), json!(42));
        assert_eq!(call("toInt", vec![json!(3.9)]).unwrap(), json!(3));
        assert_eq!(call("toInt", vec![json!("abc")]).unwrap(), json!(0));
        assert_eq!(call("toFloat", vec![json!("2.5")]).unwrap(), json!(2.5));
        assert_eq!(call("toString", vec![json!(12)]).unwrap(), json!("12"));
        assert_eq!(call("toBool", vec![json!("Yes")]).unwrap(), json!(true));
        assert_eq!(call("toBool", vec![json!("no")]).unwrap(), json!(false));
        assert_eq!(call("toBool", vec![json!(0)]).unwrap(), json!(false));
        assert_eq!(call("toBool", vec![json!(-1.5)]).unwrap(), json!(true));
    }

    #[test]
    fn test_collections() {
        assert_eq!(call("join", vec![json!(["a", 1, true]), json!(",")]).unwrap(), json!("a,1,true"));
        assert_eq!(call("split", vec![json!("a,b"), json!(",")]).unwrap(), json!(["a", "b"]));
        assert_eq!(call("split", vec![json!("ab"), json!("")]).unwrap(), json!(["a", "b"]));
        assert_eq!(call("length", vec![json!("héllo")]).unwrap(), json!(5));
        assert_eq!(call("len", vec![json!([1, 2])]).unwrap(), json!(2));
        assert_eq!(call("length", vec![json!(7)]).unwrap(), json!(0));
    }

    #[test]
    fn test_get_path() {
        let tree = json!({"a": {"b": [10, {"c": "deep"}]}});
        assert_eq!(
            call("getPath", vec![tree.clone(), json!("a"), json!("b"), json!(1), json!("c")]).unwrap(),
            json!("deep")
        );
        assert_eq!(call("getPath", vec![tree.clone(), json!("a"), json!("x")]).unwrap(), Value::Null);
        assert_eq!(call("getPath", vec![tree]).unwrap(), Value::Null);
    }

    #[test]
    fn test_conditionals() {
        assert_eq!(call("ifThen", vec![json!(true), json!("a"), json!("b")]).unwrap(), json!("a"));
        assert_eq!(call("ifThen", vec![json!(""), json!("a"), json!("b")]).unwrap(), json!("b"));
        assert_eq!(call("coalesce", vec![Value::Null, json!("b")]).unwrap(), json!("b"));
        assert_eq!(call("coalesce", vec![json!(false), json!("b")]).unwrap(), json!(false));
    }

    #[test]
    fn test_numeric_helpers() {
        assert_eq!(call("add", vec![json!(1), json!(2.5)]).unwrap(), json!(3.5));
        assert_eq!(call("subtract", vec![json!(5), json!(2)]).unwrap(), json!(3));
        assert_eq!(call("multiply", vec![json!(4), json!(2.5)]).unwrap(), json!(10));
        assert_eq!(call("divide", vec![json!(10), json!(4)]).unwrap(), json!(2.5));
        assert_eq!(call("divide", vec![json!(10), json!(0)]).unwrap(), json!(0));
        assert_eq!(call("round", vec![json!(3.14159), json!(2)]).unwrap(), json!(3.14));
        assert_eq!(call("round", vec![json!(2.5)]).unwrap(), json!(3));
        assert!(matches!(
            call("add", vec![json!(1)]),
            Err(ExpressionError::Arity { .. })
        ));
    }

    #[test]
    fn test_map_gender() {
        assert_eq!(map_gender(json!(" Male ")), json!("M"));
        assert_eq!(map_gender(json!("f")), json!("F"));
        assert_eq!(map_gender(json!("OTHER")), json!("O"));
        assert_eq!(map_gender(json!("unknown")), json!("unknown"));
        assert_eq!(map_gender(json!(1)), json!(1));
    }

    #[test]
    fn test_unknown_helper() {
        assert!(lookup("eval").is_none());
    }
}
