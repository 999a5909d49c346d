//! Rule engine: applies an ordered rule list to one input document
//!
//! Rules run strictly in list order against a fresh output map. Each rule
//! reads its source path from the input, then either writes a default (when
//! the source is absent and the rule is required), evaluates its expression,
//! or applies its named transform, and finally writes the result to its
//! destination path. Later rules observe earlier writes through the `output`
//! binding.
//!
//! Per-rule failures never abort the document: an expression that fails to
//! compile or evaluate skips that rule's write and is logged.
//!
//! # Module Organization
//!
//! - [`defaults`] - default coercion and placeholder inference
//! - [`transforms`] - named transforms and embedded-JSON handling
//! - [`report`] - missing-required-field report
//!
//! # Examples
//!
//! ```
//! use datamap_core::engine::apply_rules;
//! use datamap_core::rules::MappingRuleBuilder;
//! use serde_json::json;
//!
//! let rules = vec![
//!     MappingRuleBuilder::new("user.name")
//!         .destination("customer.name")
//!         .expression("toUpper(value)")
//!         .build()
//!         .unwrap(),
//!     MappingRuleBuilder::new("user.active")
//!         .destination("customer.isActive")
//!         .required()
//!         .build()
//!         .unwrap(),
//! ];
//!
//! let input = json!({"user": {"name": "ada"}});
//! let output = apply_rules(input.as_object().unwrap(), &rules);
//!
//! assert_eq!(
//!     serde_json::Value::Object(output),
//!     json!({"customer": {"name": "ADA", "isActive": false}})
//! );
//! ```
//!
//! Copyright (c) 2025 Datamap Team
//! Licensed under the Apache-2.0 license

pub mod defaults;
pub mod report;
pub mod transforms;


pub use report::missing_required_fields;

use crate::expression::{Clock, Environment, Evaluator, ExpressionError, Interpreter};
use crate::path;
use crate::rules::MappingRule;
use crate::value::Map;
use crate::Result;
use serde_json::Value;

/// Applies mapping rules using an expression evaluator
#[derive(Debug, Clone, Default)]
pub struct RuleEngine<E: Evaluator = Interpreter> {
    evaluator: E,
    clock: Option<Clock>,
}

impl RuleEngine<Interpreter> {
    /// Engine backed by the built-in interpreter and the system clock
    pub fn new() -> Self {
        Self::default()
    }
}

impl<E: Evaluator> RuleEngine<E> {
    /// Engine backed by a custom evaluator
    pub fn with_evaluator(evaluator: E) -> Self {
        Self {
            evaluator,
            clock: None,
        }
    }

    /// Pin every evaluation to a fixed clock
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn evaluator(&self) -> &E {
        &self.evaluator
    }

    /// Apply `rules` in order to `input`, producing a fresh output map
    ///
    /// Never fails; rules whose expression errors are skipped.
    pub fn apply_rules(&self, input: &Map, rules: &[MappingRule]) -> Map {
        let mut output = Map::new();
        for rule in rules {
            self.apply_rule(input, rule, &mut output);
        }
        output
    }

    /// Fallible-signature wrapper around [`RuleEngine::apply_rules`]
    pub fn transform(&self, input: &Map, rules: &[MappingRule]) -> Result<Map> {
        Ok(self.apply_rules(input, rules))
    }

    fn apply_rule(&self, input: &Map, rule: &MappingRule, output: &mut Map) {
        let Some(value) = path::get_in(input, &rule.source_path) else {
            if rule.required {
                let fallback = defaults::default_for(rule);
                if rule.default_value.is_none() {
                    log::debug!(
                        "Rule {}: source absent, writing inferred placeholder {}",
                        rule.label(),
                        fallback
                    );
                }
                path::set(output, &rule.destination_path, fallback);
            }
            return;
        };

        let transformed = match rule.expression_source() {
            Some(source) => match self.evaluate(source, value, input, output, rule) {
                Ok(result) => transforms::parse_embedded_json(result),
                Err(err) => {
                    log::warn!(
                        "Rule {} skipped: expression '{}' failed: {}",
                        rule.label(),
                        source,
                        err
                    );
                    return;
                }
            },
            None => transforms::apply_named(rule.transform_kind, value.clone()),
        };

        path::set(output, &rule.destination_path, transformed);
    }

    fn evaluate(
        &self,
        source: &str,
        value: &Value,
        input: &Map,
        output: &Map,
        rule: &MappingRule,
    ) -> std::result::Result<Value, ExpressionError> {
        let compiled = self.evaluator.compile(source)?;

        let mut env = Environment::new(self.clock.unwrap_or_else(Clock::system));
        env.bind_ref("value", value)
            .bind_map("input", input)
            .bind_map("output", output)
            .bind("sourcePath", rule.source_path.to_value())
            .bind("destPath", rule.destination_path.to_value())
            .bind("rule", serde_json::to_value(rule).unwrap_or(Value::Null));

        self.evaluator.eval(&compiled, &env)
    }
}

/// Apply `rules` to `input` with the default engine
pub fn apply_rules(input: &Map, rules: &[MappingRule]) -> Map {
    RuleEngine::new().apply_rules(input, rules)
}

/// Fallible-signature form of [`apply_rules`]
pub fn transform(input: &Map, rules: &[MappingRule]) -> Result<Map> {
    RuleEngine::new().transform(input, rules)
}
