//! Ingestion-time rule validation
//!
//! Validation is stateless: it takes a rule and the set of transform kinds
//! the caller accepts. Expression logic is compiled here so syntax errors are
//! caught when rules are loaded rather than when documents are transformed.
//!
//! Copyright (c) 2025 Datamap Team
//! Licensed under the Apache-2.0 license

use super::types::{MappingRule, TransformCapabilities, TransformKind};
use crate::expression::{Evaluator, ExpressionError, Interpreter};
use crate::path::Path;
use std::fmt;
use thiserror::Error;

/// Reasons a rule is rejected
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Path with an empty segment, such as `a..b` or `[""]`
    #[error("{field} contains an empty segment: '{path}'")]
    EmptySegment { field: &'static str, path: String },

    /// Kind outside the accepted capability set
    #[error("transform type '{kind}' is not supported")]
    UnsupportedKind { kind: TransformKind },

    /// `expression` rule with no logic
    #[error("transform_logic is required when transform_type is 'expression'")]
    MissingLogic,

    /// Logic that does not compile
    #[error("transform_logic '{logic}' is invalid: {source}")]
    InvalidLogic {
        logic: String,
        #[source]
        source: ExpressionError,
    },
}

impl From<ValidationError> for crate::Error {
    fn from(err: ValidationError) -> Self {
        crate::Error::validation(err.to_string())
    }
}

/// A validation failure tagged with the rule's position in its list
#[derive(Debug, Clone, PartialEq)]
pub struct RuleError {
    pub index: usize,
    pub rule_id: Option<u64>,
    pub error: ValidationError,
}

impl fmt::Display for RuleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.rule_id {
            Some(id) => write!(f, "rule {} (id {}): {}", self.index, id, self.error),
            None => write!(f, "rule {}: {}", self.index, self.error),
        }
    }
}

impl std::error::Error for RuleError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

impl From<RuleError> for crate::Error {
    fn from(err: RuleError) -> Self {
        crate::Error::Validation {
            message: err.error.to_string(),
            rule_index: Some(err.index),
        }
    }
}

/// Validate one rule with the built-in expression language
pub fn validate_rule(
    rule: &MappingRule,
    capabilities: &TransformCapabilities,
) -> Result<(), ValidationError> {
    validate_rule_with(rule, capabilities, &Interpreter)
}

/// Validate one rule, compiling logic with `evaluator`
pub fn validate_rule_with<E: Evaluator>(
    rule: &MappingRule,
    capabilities: &TransformCapabilities,
    evaluator: &E,
) -> Result<(), ValidationError> {
    check_path("source_path", &rule.source_path)?;
    check_path("destination_path", &rule.destination_path)?;

    if !capabilities.allows(rule.transform_kind) {
        return Err(ValidationError::UnsupportedKind {
            kind: rule.transform_kind,
        });
    }

    let logic = rule.transform_logic.as_deref().filter(|l| !l.trim().is_empty());
    if rule.transform_kind == TransformKind::Expression && logic.is_none() {
        return Err(ValidationError::MissingLogic);
    }
    if let Some(logic) = logic {
        evaluator
            .compile(logic)
            .map_err(|source| ValidationError::InvalidLogic {
                logic: logic.to_string(),
                source,
            })?;
    }

    if rule.required && rule.default_value.is_none() {
        log::warn!(
            "Required rule {} has no default value; a placeholder will be inferred from '{}'",
            rule.label(),
            rule.destination_path.last()
        );
    }

    Ok(())
}

/// Validate every rule, collecting all failures
pub fn validate_rules(
    rules: &[MappingRule],
    capabilities: &TransformCapabilities,
) -> Result<(), Vec<RuleError>> {
    let errors: Vec<RuleError> = rules
        .iter()
        .enumerate()
        .filter_map(|(index, rule)| {
            validate_rule(rule, capabilities)
                .err()
                .map(|error| RuleError {
                    index,
                    rule_id: rule.id,
                    error,
                })
        })
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_path(field: &'static str, path: &Path) -> Result<(), ValidationError> {
    if path.segments().iter().any(|segment| segment.is_empty()) {
        return Err(ValidationError::EmptySegment {
            field,
            path: path.to_string(),
        });
    }
    Ok(())
}
