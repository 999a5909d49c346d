//! Embedded expression sublanguage for `expression` mapping rules
//!
//! Expressions are small, side-effect free programs evaluated against an
//! [`Environment`] that exposes the rule context (`value`, `input`, `output`,
//! `sourcePath`, `destPath`, `rule`), the clock bindings (`now`, `today`,
//! `isoDate`) and the helper catalogue in [`functions`]. Nothing inside an
//! expression can reach the engine, the filesystem or the network.
//!
//! The engine talks to the language only through the [`Evaluator`] trait, so
//! another evaluator can be substituted without touching rule handling.
//!
//! # Module Organization
//!
//! - [`lexer`] - tokenizer
//! - [`parser`] - recursive descent parser producing [`ast::Expr`]
//! - [`interpreter`] - tree-walking evaluator, the default [`Evaluator`]
//! - [`functions`] - helper function catalogue
//! - [`error`] - [`ExpressionError`]
//!
//! # Examples
//!
//! ```
//! use datamap_core::expression::{evaluate, Clock, Environment};
//! use serde_json::json;
//!
//! let mut env = Environment::new(Clock::system());
//! env.bind("value", json!("abc"));
//!
//! assert_eq!(evaluate("toUpper(value) + '!'", &env).unwrap(), json!("ABC!"));
//! ```
//!
//! Copyright (c) 2025 Datamap Team
//! Licensed under the Apache-2.0 license

pub mod ast;
pub mod error;
pub mod functions;
pub mod interpreter;
pub mod lexer;
pub mod parser;


pub use error::ExpressionError;
pub use interpreter::{CompiledExpression, Interpreter};

use crate::value::Map;
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;
use std::borrow::Cow;
use std::collections::HashMap;

/// Narrow contract between the rule engine and an expression language
pub trait Evaluator {
    /// Checked, ready-to-run form of an expression
    type Compiled;

    /// Check syntax and prepare `source` for evaluation
    fn compile(&self, source: &str) -> Result<Self::Compiled, ExpressionError>;

    /// Evaluate a compiled expression against `env`
    fn eval(
        &self,
        compiled: &Self::Compiled,
        env: &Environment<'_>,
    ) -> Result<Value, ExpressionError>;
}

/// Wall-clock snapshot taken once per evaluation
///
/// Every clock read inside one expression observes the same instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Clock {
    now: DateTime<Utc>,
}

impl Clock {
    /// Snapshot the system clock
    pub fn system() -> Self {
        Self { now: Utc::now() }
    }

    /// Use a fixed instant
    pub fn fixed(now: DateTime<Utc>) -> Self {
        Self { now }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    /// Calendar date, `YYYY-MM-DD`
    pub fn today(&self) -> String {
        self.now.format("%Y-%m-%d").to_string()
    }

    /// RFC 3339 timestamp at second precision
    pub fn iso_date(&self) -> String {
        self.now.to_rfc3339_opts(SecondsFormat::Secs, true)
    }

    /// RFC 3339 timestamp at millisecond precision, bound as `now`
    pub fn timestamp(&self) -> String {
        self.now.to_rfc3339_opts(SecondsFormat::Millis, true)
    }
}

/// A value reachable from an environment, borrowed where possible
///
/// Rule evaluation binds the whole input and output trees; borrowing them
/// avoids copying a document per rule when an expression only reads a field.
#[derive(Debug, Clone)]
pub enum Slot<'a> {
    Borrowed(&'a Value),
    Map(&'a Map),
    Owned(Value),
}

impl<'a> Slot<'a> {
    /// Take ownership of the value, cloning borrowed data
    pub fn into_value(self) -> Value {
        match self {
            Slot::Borrowed(value) => value.clone(),
            Slot::Map(map) => Value::Object(map.clone()),
            Slot::Owned(value) => value,
        }
    }

    /// View the slot as a value reference, cloning only bare maps
    pub fn to_cow(&self) -> Cow<'_, Value> {
        match self {
            Slot::Borrowed(value) => Cow::Borrowed(*value),
            Slot::Map(map) => Cow::Owned(Value::Object((*map).clone())),
            Slot::Owned(value) => Cow::Borrowed(value),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Slot::Borrowed(Value::Null) | Slot::Owned(Value::Null))
    }
}

/// Variable bindings and clock visible to one evaluation
#[derive(Debug, Clone)]
pub struct Environment<'a> {
    variables: HashMap<String, Slot<'a>>,
    clock: Clock,
}

impl<'a> Environment<'a> {
    /// Create an environment with the clock bindings in place
    pub fn new(clock: Clock) -> Self {
        let mut env = Self {
            variables: HashMap::new(),
            clock,
        };
        env.bind("now", Value::String(clock.timestamp()))
            .bind("today", Value::String(clock.today()))
            .bind("isoDate", Value::String(clock.iso_date()));
        env
    }

    /// Bind an owned value
    pub fn bind(&mut self, name: impl Into<String>, value: Value) -> &mut Self {
        self.variables.insert(name.into(), Slot::Owned(value));
        self
    }

    /// Bind a borrowed value
    pub fn bind_ref(&mut self, name: impl Into<String>, value: &'a Value) -> &mut Self {
        self.variables.insert(name.into(), Slot::Borrowed(value));
        self
    }

    /// Bind a borrowed map as an object value
    pub fn bind_map(&mut self, name: impl Into<String>, map: &'a Map) -> &mut Self {
        self.variables.insert(name.into(), Slot::Map(map));
        self
    }

    /// Resolve a variable
    pub fn lookup(&self, name: &str) -> Option<Slot<'_>> {
        self.variables.get(name).map(|slot| match slot {
            Slot::Borrowed(value) => Slot::Borrowed(*value),
            Slot::Map(map) => Slot::Map(*map),
            Slot::Owned(value) => Slot::Borrowed(value),
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.variables.contains_key(name)
    }

    pub fn clock(&self) -> &Clock {
        &self.clock
    }
}

/// Compile `source` with the built-in interpreter
pub fn compile(source: &str) -> Result<CompiledExpression, ExpressionError> {
    Interpreter.compile(source)
}

/// Compile and evaluate `source` in one step
pub fn evaluate(source: &str, env: &Environment<'_>) -> Result<Value, ExpressionError> {
    let interpreter = Interpreter;
    let compiled = interpreter.compile(source)?;
    interpreter.eval(&compiled, env)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn fixed_clock() -> Clock {
        Clock::fixed(Utc.with_ymd_and_hms(2025, 7, 10, 8, 30, 0).unwrap())
    }

    #[test]
    fn test_clock_bindings() {
        let env = Environment::new(fixed_clock());
        assert_eq!(evaluate("today", &env).unwrap(), json!("2025-07-10"));
        assert_eq!(evaluate("isoDate", &env).unwrap(), json!("2025-07-10T08:30:00Z"));
        assert_eq!(evaluate("now", &env).unwrap(), json!("2025-07-10T08:30:00.000Z"));
        assert_eq!(evaluate("getCurrentDate()", &env).unwrap(), json!("2025-07-10"));
    }

    #[test]
    fn test_borrowed_bindings() {
        let input = json!({"a": {"b": [1, 2, 3]}});
        let output = json!({"total": 5}).as_object().unwrap().clone();
        let mut env = Environment::new(fixed_clock());
        env.bind_ref("input", &input).bind_map("output", &output);

        assert_eq!(evaluate("input.a.b[2]", &env).unwrap(), json!(3));
        assert_eq!(evaluate(r#"output["total"] * 2"#, &env).unwrap(), json!(10));
        assert_eq!(evaluate("output", &env).unwrap(), json!({"total": 5}));
    }

    #[test]
    fn test_compile_rejects_bad_syntax() {
        let err = compile("toUpper(").unwrap_err();
        assert!(err.is_compile_error());
        assert!(compile("value != '' ? toUpper(value) : 'UNKNOWN'").is_ok());
    }
}
