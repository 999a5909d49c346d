//! Mapping rule model
//!
//! Rules are plain data: they are loaded from a rules file (or handed over by
//! whatever owns persistence), validated once, and then read by the engine
//! without modification.
//!
//! Copyright (c) 2025 Datamap Team
//! Licensed under the Apache-2.0 license

use crate::path::Path;
use crate::Error;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Closed set of transforms a rule may name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TransformKind {
    /// Identity
    Copy,
    ToString,
    MapGender,
    ToBool,
    /// Reformat a date string to `YYYY-MM-DD`
    FormatDate,
    ToUpperCase,
    ToLowerCase,
    Capitalize,
    /// Evaluate `transform_logic`
    Expression,
}

impl TransformKind {
    pub const ALL: [TransformKind; 9] = [
        TransformKind::Copy,
        TransformKind::ToString,
        TransformKind::MapGender,
        TransformKind::ToBool,
        TransformKind::FormatDate,
        TransformKind::ToUpperCase,
        TransformKind::ToLowerCase,
        TransformKind::Capitalize,
        TransformKind::Expression,
    ];

    /// Wire name of the kind
    pub fn as_str(self) -> &'static str {
        match self {
            TransformKind::Copy => "copy",
            TransformKind::ToString => "toString",
            TransformKind::MapGender => "mapGender",
            TransformKind::ToBool => "toBool",
            TransformKind::FormatDate => "formatDate",
            TransformKind::ToUpperCase => "toUpperCase",
            TransformKind::ToLowerCase => "toLowerCase",
            TransformKind::Capitalize => "capitalize",
            TransformKind::Expression => "expression",
        }
    }
}

impl fmt::Display for TransformKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransformKind {
    type Err = Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        TransformKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| Error::validation(format!("unknown transform type '{}'", s)))
    }
}

/// Declarative instruction binding a source path to a destination path
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MappingRule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<u64>,

    pub source_path: Path,

    pub destination_path: Path,

    #[serde(rename = "transform_type")]
    pub transform_kind: TransformKind,

    #[serde(
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub transform_logic: Option<String>,

    #[serde(default)]
    pub required: bool,

    #[serde(
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub default_value: Option<String>,
}

impl MappingRule {
    /// Create a rule with no logic, not required, no default
    pub fn new(source_path: Path, destination_path: Path, transform_kind: TransformKind) -> Self {
        Self {
            id: None,
            client_id: None,
            source_path,
            destination_path,
            transform_kind,
            transform_logic: None,
            required: false,
            default_value: None,
        }
    }

    /// Logic to evaluate, if the rule is expression-driven
    ///
    /// A rule is expression-driven when its kind is `expression` or it carries
    /// logic that is not blank under any kind. Blank logic under `expression`
    /// means `value`.
    pub fn expression_source(&self) -> Option<&str> {
        match (self.transform_kind, self.transform_logic.as_deref()) {
            (_, Some(logic)) if !logic.trim().is_empty() => Some(logic),
            (TransformKind::Expression, _) => Some("value"),
            _ => None,
        }
    }

    /// Label for log lines: the id when known, otherwise the paths
    pub fn label(&self) -> String {
        match self.id {
            Some(id) => format!("#{} {} -> {}", id, self.source_path, self.destination_path),
            None => format!("{} -> {}", self.source_path, self.destination_path),
        }
    }
}

fn empty_as_none<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.is_empty()))
}

/// Owner of a rule set
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub name: String,
}

/// Ordered rules for one client, as stored in a rules file
///
/// A bare JSON array of rules is accepted as a rule set without a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RuleSetRepr")]
pub struct RuleSet {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client: Option<Client>,
    pub rules: Vec<MappingRule>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RuleSetRepr {
    Bare(Vec<MappingRule>),
    Full {
        #[serde(default)]
        client: Option<Client>,
        rules: Vec<MappingRule>,
    },
}

impl From<RuleSetRepr> for RuleSet {
    fn from(repr: RuleSetRepr) -> Self {
        match repr {
            RuleSetRepr::Bare(rules) => RuleSet {
                client: None,
                rules,
            },
            RuleSetRepr::Full { client, rules } => RuleSet { client, rules },
        }
    }
}

impl RuleSet {
    /// Parse a rule set from JSON text
    pub fn from_json(text: &str) -> crate::Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

/// Transform kinds a validator accepts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformCapabilities {
    kinds: BTreeSet<TransformKind>,
}

impl TransformCapabilities {
    /// Every known kind
    pub fn all() -> Self {
        Self::only(TransformKind::ALL)
    }

    /// Exactly the given kinds
    pub fn only(kinds: impl IntoIterator<Item = TransformKind>) -> Self {
        Self {
            kinds: kinds.into_iter().collect(),
        }
    }

    pub fn allows(&self, kind: TransformKind) -> bool {
        self.kinds.contains(&kind)
    }

    pub fn kinds(&self) -> impl Iterator<Item = TransformKind> + '_ {
        self.kinds.iter().copied()
    }
}

impl Default for TransformCapabilities {
    fn default() -> Self {
        Self::all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_rule_wire_format() {
        let rule: MappingRule = serde_json::from_value(json!({
            "id": 7,
            "client_id": 1,
            "source_path": ["applicant", "gender"],
            "destination_path": "person.gender",
            "transform_type": "mapGender",
            "transform_logic": "",
            "required": true,
            "default_value": ""
        }))
        .unwrap();

        assert_eq!(rule.id, Some(7));
        assert_eq!(rule.source_path.segments(), ["applicant", "gender"]);
        assert_eq!(rule.destination_path.segments(), ["person", "gender"]);
        assert_eq!(rule.transform_kind, TransformKind::MapGender);
        assert_eq!(rule.transform_logic, None);
        assert_eq!(rule.default_value, None);
        assert!(rule.required);

        let back = serde_json::to_value(&rule).unwrap();
        assert_eq!(back["transform_type"], json!("mapGender"));
        assert_eq!(back["destination_path"], json!(["person", "gender"]));
        assert!(back.get("transform_logic").is_none());
    }

    #[test]
    fn test_unknown_kind_rejected() {
        let result = serde_json::from_value::<MappingRule>(json!({
            "source_path": ["a"],
            "destination_path": ["b"],
            "transform_type": "reverse"
        }));
        assert!(result.is_err());
        assert!("reverse".parse::<TransformKind>().is_err());
        assert_eq!("toUpperCase".parse::<TransformKind>().unwrap(), TransformKind::ToUpperCase);
    }

    #[test]
    fn test_expression_source() {
        let mut rule = MappingRule::new(
            Path::parse("a").unwrap(),
            Path::parse("b").unwrap(),
            TransformKind::Expression,
        );
        assert_eq!(rule.expression_source(), Some("value"));

        rule.transform_logic = Some("toUpper(value)".into());
        assert_eq!(rule.expression_source(), Some("toUpper(value)"));

        rule.transform_kind = TransformKind::Copy;
        assert_eq!(rule.expression_source(), Some("toUpper(value)"));

        rule.transform_logic = None;
        assert_eq!(rule.expression_source(), None);

        rule.transform_logic = Some("   ".into());
        assert_eq!(rule.expression_source(), None);

        rule.transform_kind = TransformKind::Expression;
        assert_eq!(rule.expression_source(), Some("value"));
    }

    #[test]
    fn test_rule_set_forms() {
        let bare = RuleSet::from_json(
            r#"[{"source_path": "a", "destination_path": "b", "transform_type": "copy"}]"#,
        )
        .unwrap();
        assert!(bare.client.is_none());
        assert_eq!(bare.rules.len(), 1);

        let full = RuleSet::from_json(
            r#"{"client": {"name": "acme"}, "rules": [
                {"source_path": "a", "destination_path": "b", "transform_type": "copy"}
            ]}"#,
        )
        .unwrap();
        assert_eq!(full.client.unwrap().name, "acme");
        assert_eq!(full.rules.len(), 1);
    }

    #[test]
    fn test_capabilities() {
        let caps = TransformCapabilities::only([TransformKind::Copy]);
        assert!(caps.allows(TransformKind::Copy));
        assert!(!caps.allows(TransformKind::Expression));
        assert!(TransformCapabilities::default().allows(TransformKind::Expression));
    }
}
