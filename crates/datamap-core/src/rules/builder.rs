//! Builder for creating mapping rules
//!
//! This module provides a fluent builder API for constructing mapping rules
//! from dot-joined paths.
//!
//! Copyright (c) 2025 Datamap Team
//! Licensed under the Apache-2.0 license

use super::types::{MappingRule, TransformKind};
use crate::path::Path;
use crate::{Error, Result};

/// Builder for creating mapping rules
#[derive(Debug, Clone)]
pub struct MappingRuleBuilder {
    id: Option<u64>,
    client_id: Option<u64>,
    source_path: String,
    destination_path: Option<String>,
    transform_kind: TransformKind,
    transform_logic: Option<String>,
    required: bool,
    default_value: Option<String>,
}

impl MappingRuleBuilder {
    /// Create a new rule builder reading from `source_path`
    pub fn new(source_path: impl Into<String>) -> Self {
        Self {
            id: None,
            client_id: None,
            source_path: source_path.into(),
            destination_path: None,
            transform_kind: TransformKind::Copy,
            transform_logic: None,
            required: false,
            default_value: None,
        }
    }

    pub fn id(mut self, id: u64) -> Self {
        self.id = Some(id);
        self
    }

    pub fn client_id(mut self, client_id: u64) -> Self {
        self.client_id = Some(client_id);
        self
    }

    /// Set the destination path
    pub fn destination(mut self, path: impl Into<String>) -> Self {
        self.destination_path = Some(path.into());
        self
    }

    /// Set a named transform
    pub fn transform(mut self, kind: TransformKind) -> Self {
        self.transform_kind = kind;
        self
    }

    /// Use an expression as the transform
    pub fn expression(mut self, logic: impl Into<String>) -> Self {
        self.transform_kind = TransformKind::Expression;
        self.transform_logic = Some(logic.into());
        self
    }

    /// Make the rule required
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Make the rule required with a fallback value
    pub fn default_value(mut self, value: impl Into<String>) -> Self {
        self.required = true;
        self.default_value = Some(value.into());
        self
    }

    /// Build the mapping rule
    pub fn build(self) -> Result<MappingRule> {
        let destination = self.destination_path.ok_or_else(|| {
            Error::validation(format!(
                "destination path is required for rule reading '{}'",
                self.source_path
            ))
        })?;

        Ok(MappingRule {
            id: self.id,
            client_id: self.client_id,
            source_path: Path::parse(&self.source_path)?,
            destination_path: Path::parse(&destination)?,
            transform_kind: self.transform_kind,
            transform_logic: self.transform_logic.filter(|logic| !logic.is_empty()),
            required: self.required,
            default_value: self.default_value.filter(|value| !value.is_empty()),
        })
    }
}
