//! Tree-walking evaluator for parsed expressions
//!
//! Copyright (c) 2025 Datamap Team
//! Licensed under the Apache-2.0 license

use super::ast::{BinaryOperator, Expr, UnaryOperator};
use super::error::ExpressionError;
use super::functions;
use super::parser;
use super::{Environment, Evaluator, Slot};
use crate::value::{self, type_name, Map};
use serde_json::Value;
use std::cmp::Ordering;

/// A syntactically valid expression together with its source text
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledExpression {
    source: String,
    root: Expr,
}

impl CompiledExpression {
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn root(&self) -> &Expr {
        &self.root
    }
}

/// The built-in evaluator
#[derive(Debug, Clone, Copy, Default)]
pub struct Interpreter;

impl Evaluator for Interpreter {
    type Compiled = CompiledExpression;

    fn compile(&self, source: &str) -> Result<CompiledExpression, ExpressionError> {
        Ok(CompiledExpression {
            source: source.to_string(),
            root: parser::parse(source)?,
        })
    }

    fn eval(
        &self,
        compiled: &CompiledExpression,
        env: &Environment<'_>,
    ) -> Result<Value, ExpressionError> {
        self.evaluate(&compiled.root, env).map(Slot::into_value)
    }
}

impl Interpreter {
    fn evaluate<'s>(
        &self,
        expr: &Expr,
        env: &'s Environment<'_>,
    ) -> Result<Slot<'s>, ExpressionError> {
        match expr {
            Expr::Literal(value) => Ok(Slot::Owned(value.clone())),
            Expr::Ident(name) => env
                .lookup(name)
                .ok_or_else(|| ExpressionError::UnknownIdentifier { name: name.clone() }),
            Expr::Array(items) => {
                let values = items
                    .iter()
                    .map(|item| self.evaluate(item, env).map(Slot::into_value))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(Slot::Owned(Value::Array(values)))
            }
            Expr::Object(entries) => {
                let mut map = Map::new();
                for (key, item) in entries {
                    map.insert(key.clone(), self.evaluate(item, env)?.into_value());
                }
                Ok(Slot::Owned(Value::Object(map)))
            }
            Expr::Member { object, property } => {
                let base = self.evaluate(object, env)?;
                member(base, property)
            }
            Expr::Index { object, index } => {
                let base = self.evaluate(object, env)?;
                let index = self.evaluate(index, env)?;
                index_into(base, &index.to_cow())
            }
            Expr::Call { function, args } => self.call(function, args, env),
            Expr::Unary { operator, operand } => {
                let operand = self.evaluate(operand, env)?;
                unary(*operator, &operand.to_cow()).map(Slot::Owned)
            }
            Expr::Binary {
                left,
                operator,
                right,
            } => self.binary(left, *operator, right, env),
            Expr::Conditional {
                condition,
                then_branch,
                else_branch,
            } => {
                let condition = self.evaluate(condition, env)?;
                if value::is_truthy(&condition.to_cow()) {
                    self.evaluate(then_branch, env)
                } else {
                    self.evaluate(else_branch, env)
                }
            }
        }
    }

    fn call<'s>(
        &self,
        name: &str,
        args: &[Expr],
        env: &'s Environment<'_>,
    ) -> Result<Slot<'s>, ExpressionError> {
        let Some(function) = functions::lookup(name) else {
            if env.contains(name) {
                return Err(ExpressionError::NotCallable {
                    callee: name.to_string(),
                });
            }
            return Err(ExpressionError::UnknownFunction {
                name: name.to_string(),
            });
        };

        let values = args
            .iter()
            .map(|arg| self.evaluate(arg, env).map(Slot::into_value))
            .collect::<Result<Vec<_>, _>>()?;
        function(&values, env.clock()).map(Slot::Owned)
    }

    fn binary<'s>(
        &self,
        left: &Expr,
        operator: BinaryOperator,
        right: &Expr,
        env: &'s Environment<'_>,
    ) -> Result<Slot<'s>, ExpressionError> {
        match operator {
            BinaryOperator::And => {
                let left = self.evaluate(left, env)?;
                if !value::is_truthy(&left.to_cow()) {
                    return Ok(Slot::Owned(Value::Bool(false)));
                }
                let right = self.evaluate(right, env)?;
                Ok(Slot::Owned(Value::Bool(value::is_truthy(&right.to_cow()))))
            }
            BinaryOperator::Or => {
                let left = self.evaluate(left, env)?;
                if value::is_truthy(&left.to_cow()) {
                    return Ok(Slot::Owned(Value::Bool(true)));
                }
                let right = self.evaluate(right, env)?;
                Ok(Slot::Owned(Value::Bool(value::is_truthy(&right.to_cow()))))
            }
            BinaryOperator::Coalesce => {
                let left = self.evaluate(left, env)?;
                if left.is_null() {
                    self.evaluate(right, env)
                } else {
                    Ok(left)
                }
            }
            _ => {
                let left = self.evaluate(left, env)?;
                let right = self.evaluate(right, env)?;
                apply_binary(&left.to_cow(), operator, &right.to_cow()).map(Slot::Owned)
            }
        }
    }
}

/// `base.property`; absent keys and nil bases read as nil
fn member<'s>(base: Slot<'s>, property: &str) -> Result<Slot<'s>, ExpressionError> {
    match base {
        Slot::Map(map) => Ok(map.get(property).map(Slot::Borrowed).unwrap_or(NIL)),
        Slot::Borrowed(Value::Object(map)) => {
            Ok(map.get(property).map(Slot::Borrowed).unwrap_or(NIL))
        }
        Slot::Borrowed(Value::Array(items)) => Ok(property
            .parse::<usize>()
            .ok()
            .and_then(move |i| items.get(i))
            .map(Slot::Borrowed)
            .unwrap_or(NIL)),
        Slot::Owned(Value::Object(mut map)) => {
            Ok(Slot::Owned(map.remove(property).unwrap_or(Value::Null)))
        }
        Slot::Owned(Value::Array(mut items)) => Ok(property
            .parse::<usize>()
            .ok()
            .filter(|&i| i < items.len())
            .map(|i| Slot::Owned(items.swap_remove(i)))
            .unwrap_or(NIL)),
        Slot::Borrowed(Value::Null) | Slot::Owned(Value::Null) => Ok(NIL),
        other => Err(ExpressionError::type_mismatch(
            format!("member access '.{}'", property),
            "map or list",
            type_name(&other.to_cow()),
        )),
    }
}

const NIL: Slot<'static> = Slot::Owned(Value::Null);

/// `base[index]`; string indices address map keys, integers address list
/// positions and may count from the end when negative
fn index_into<'s>(base: Slot<'s>, index: &Value) -> Result<Slot<'s>, ExpressionError> {
    match index {
        Value::String(key) => match base {
            Slot::Map(_) | Slot::Borrowed(Value::Object(_)) | Slot::Owned(Value::Object(_)) => {
                member(base, key)
            }
            Slot::Borrowed(Value::Null) | Slot::Owned(Value::Null) => Ok(NIL),
            other => Err(ExpressionError::type_mismatch(
                "string index",
                "map",
                type_name(&other.to_cow()),
            )),
        },
        Value::Number(n) => {
            let Some(i) = n.as_i64() else {
                return Err(ExpressionError::type_mismatch(
                    "list index",
                    "integer",
                    n.to_string(),
                ));
            };
            match base {
                Slot::Borrowed(Value::Array(items)) => Ok(resolve_index(i, items.len())
                    .and_then(move |i| items.get(i))
                    .map(Slot::Borrowed)
                    .unwrap_or(NIL)),
                Slot::Owned(Value::Array(mut items)) => Ok(resolve_index(i, items.len())
                    .map(|i| Slot::Owned(items.swap_remove(i)))
                    .unwrap_or(NIL)),
                Slot::Map(_) | Slot::Borrowed(Value::Object(_)) | Slot::Owned(Value::Object(_)) => {
                    member(base, &i.to_string())
                }
                Slot::Borrowed(Value::Null) | Slot::Owned(Value::Null) => Ok(NIL),
                other => Err(ExpressionError::type_mismatch(
                    "integer index",
                    "list",
                    type_name(&other.to_cow()),
                )),
            }
        }
        other => Err(ExpressionError::type_mismatch(
            "index",
            "string or integer",
            type_name(other),
        )),
    }
}

fn resolve_index(index: i64, len: usize) -> Option<usize> {
    let resolved = if index < 0 {
        (len as i64).checked_add(index)?
    } else {
        index
    };
    usize::try_from(resolved).ok().filter(|&i| i < len)
}

fn unary(operator: UnaryOperator, operand: &Value) -> Result<Value, ExpressionError> {
    match operator {
        UnaryOperator::Not => Ok(Value::Bool(!value::is_truthy(operand))),
        UnaryOperator::Negate => match operand {
            Value::Number(n) => match n.as_i64().and_then(i64::checked_neg) {
                Some(i) => Ok(value::integer(i)),
                None => Ok(value::number(-n.as_f64().unwrap_or(0.0))),
            },
            other => Err(ExpressionError::type_mismatch(
                "negation",
                "number",
                type_name(other),
            )),
        },
    }
}

fn apply_binary(
    left: &Value,
    operator: BinaryOperator,
    right: &Value,
) -> Result<Value, ExpressionError> {
    match operator {
        BinaryOperator::Add => add(left, right),
        BinaryOperator::Subtract => arithmetic(left, right, operator, i64::checked_sub, |a, b| a - b),
        BinaryOperator::Multiply => arithmetic(left, right, operator, i64::checked_mul, |a, b| a * b),
        BinaryOperator::Divide => {
            let (a, b) = numeric_operands(left, right, operator)?;
            if b == 0.0 {
                return Err(ExpressionError::invalid_argument("/", "division by zero"));
            }
            Ok(value::number(a / b))
        }
        BinaryOperator::Modulo => match (left.as_i64(), right.as_i64()) {
            (Some(_), Some(0)) => Err(ExpressionError::invalid_argument("%", "modulo by zero")),
            (Some(a), Some(b)) => Ok(value::integer(a.wrapping_rem(b))),
            _ => Err(ExpressionError::type_mismatch(
                "%",
                "integers",
                format!("{} and {}", type_name(left), type_name(right)),
            )),
        },
        BinaryOperator::Equal => Ok(Value::Bool(values_equal(left, right))),
        BinaryOperator::NotEqual => Ok(Value::Bool(!values_equal(left, right))),
        BinaryOperator::LessThan => compare(left, right, operator, |o| o == Ordering::Less),
        BinaryOperator::LessThanOrEqual => compare(left, right, operator, |o| o != Ordering::Greater),
        BinaryOperator::GreaterThan => compare(left, right, operator, |o| o == Ordering::Greater),
        BinaryOperator::GreaterThanOrEqual => compare(left, right, operator, |o| o != Ordering::Less),
        BinaryOperator::In => contains(right, left).map(Value::Bool),
        BinaryOperator::And | BinaryOperator::Or | BinaryOperator::Coalesce => {
            // short-circuit operators never reach here
            Err(ExpressionError::type_mismatch(
                operator.symbol(),
                "short-circuit evaluation",
                "eager operands",
            ))
        }
    }
}

/// `+` adds numbers, concatenates when either side is a string, and joins lists
fn add(left: &Value, right: &Value) -> Result<Value, ExpressionError> {
    match (left, right) {
        (Value::String(_), _) | (_, Value::String(_)) => Ok(Value::String(format!(
            "{}{}",
            value::display_string(left),
            value::display_string(right)
        ))),
        (Value::Array(a), Value::Array(b)) => {
            Ok(Value::Array(a.iter().chain(b.iter()).cloned().collect()))
        }
        _ => arithmetic(left, right, BinaryOperator::Add, i64::checked_add, |a, b| a + b),
    }
}

fn arithmetic(
    left: &Value,
    right: &Value,
    operator: BinaryOperator,
    integer_op: fn(i64, i64) -> Option<i64>,
    float_op: fn(f64, f64) -> f64,
) -> Result<Value, ExpressionError> {
    if let (Some(a), Some(b)) = (left.as_i64(), right.as_i64()) {
        if let Some(result) = integer_op(a, b) {
            return Ok(value::integer(result));
        }
    }
    let (a, b) = numeric_operands(left, right, operator)?;
    Ok(value::number(float_op(a, b)))
}

fn numeric_operands(
    left: &Value,
    right: &Value,
    operator: BinaryOperator,
) -> Result<(f64, f64), ExpressionError> {
    match (value::as_f64(left), value::as_f64(right)) {
        (Some(a), Some(b)) => Ok((a, b)),
        _ => Err(ExpressionError::type_mismatch(
            operator.symbol(),
            "numbers",
            format!("{} and {}", type_name(left), type_name(right)),
        )),
    }
}

/// Equality with numbers compared by value, so `1 == 1.0`
pub fn values_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => match (a.as_i64(), b.as_i64()) {
            (Some(x), Some(y)) => x == y,
            _ => a.as_f64() == b.as_f64(),
        },
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| values_equal(x, y))
        }
        (Value::Object(a), Value::Object(b)) => {
            a.len() == b.len()
                && a.iter()
                    .all(|(k, v)| b.get(k).map(|w| values_equal(v, w)).unwrap_or(false))
        }
        _ => left == right,
    }
}

fn compare(
    left: &Value,
    right: &Value,
    operator: BinaryOperator,
    accept: fn(Ordering) -> bool,
) -> Result<Value, ExpressionError> {
    let ordering = match (left, right) {
        (Value::Number(_), Value::Number(_)) => {
            let (a, b) = numeric_operands(left, right, operator)?;
            a.partial_cmp(&b).unwrap_or(Ordering::Equal)
        }
        (Value::String(a), Value::String(b)) => a.cmp(b),
        _ => {
            return Err(ExpressionError::type_mismatch(
                operator.symbol(),
                "two numbers or two strings",
                format!("{} and {}", type_name(left), type_name(right)),
            ));
        }
    };
    Ok(Value::Bool(accept(ordering)))
}

/// Membership test behind `needle in haystack`
fn contains(haystack: &Value, needle: &Value) -> Result<bool, ExpressionError> {
    match haystack {
        Value::Array(items) => Ok(items.iter().any(|item| values_equal(item, needle))),
        Value::Object(map) => match needle {
            Value::String(key) => Ok(map.contains_key(key)),
            other => Err(ExpressionError::type_mismatch(
                "in",
                "string key",
                type_name(other),
            )),
        },
        Value::String(text) => match needle {
            Value::String(fragment) => Ok(text.contains(fragment.as_str())),
            other => Err(ExpressionError::type_mismatch(
                "in",
                "string",
                type_name(other),
            )),
        },
        Value::Null => Ok(false),
        other => Err(ExpressionError::type_mismatch(
            "in",
            "list, map or string",
            type_name(other),
        )),
    }
}
