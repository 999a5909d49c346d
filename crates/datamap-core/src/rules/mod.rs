//! Mapping rules: model, builder and ingestion validation
//!
//! - `types`: [`MappingRule`], [`TransformKind`], [`RuleSet`], [`TransformCapabilities`]
//! - `builder`: fluent [`MappingRuleBuilder`]
//! - `validator`: [`validate_rule`] / [`validate_rules`]
//!
//! Copyright (c) 2025 Datamap Team
//! Licensed under the Apache-2.0 license

pub mod builder;
pub mod types;
pub mod validator;

pub use builder::MappingRuleBuilder;
pub use types::{Client, MappingRule, RuleSet, TransformCapabilities, TransformKind};
pub use validator::{validate_rule, validate_rule_with, validate_rules, RuleError, ValidationError};
