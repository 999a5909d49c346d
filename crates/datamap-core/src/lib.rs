//! Datamap Core - Rule-based JSON-to-JSON transformation engine
//!
//! This crate maps arbitrary input JSON documents into arbitrary output JSON
//! documents according to an ordered list of declarative mapping rules.
//!
//! # Main Components
//!
//! - **Error Handling**: Error types using `thiserror`
//! - **Path Addressing**: Nested get/set over `serde_json::Value` trees
//! - **Expression Language**: Sandboxed expressions with a helper catalogue
//! - **Rules**: Rule model, builder and ingestion-time validation
//! - **Rule Engine**: Ordered rule application with required/default handling
//! - **Streaming**: Per-entry transformation of large top-level objects
//!
//! # Example
//!
//! ```
//! use datamap_core::{apply_rules, MappingRuleBuilder, Result};
//! use serde_json::json;
//!
//! fn example() -> Result<()> {
//!     let rules = vec![
//!         MappingRuleBuilder::new("applicant.gender")
//!             .destination("person.sex")
//!             .expression("value == 'male' ? 'M' : 'F'")
//!             .build()?,
//!     ];
//!     let input = json!({"applicant": {"gender": "male"}});
//!     let output = apply_rules(input.as_object().unwrap(), &rules);
//!     assert_eq!(output["person"]["sex"], json!("M"));
//!     Ok(())
//! }
//! # example().unwrap();
//! ```

pub mod engine;
pub mod error;
pub mod expression;
pub mod mode;
pub mod path;
pub mod rules;
pub mod streaming;
pub mod value;

#[cfg(test)]
mod proptest_strategies;

// Re-export main types for convenience
pub use engine::{apply_rules, missing_required_fields, transform, RuleEngine};
pub use error::{Error, Result};
pub use expression::{Clock, Environment, Evaluator, ExpressionError, Interpreter};
pub use mode::{TransformLimits, TransformMode};
pub use path::Path;
pub use rules::{
    validate_rule, validate_rules, Client, MappingRule, MappingRuleBuilder, RuleSet,
    TransformCapabilities, TransformKind, ValidationError,
};
pub use streaming::{stream_transform, stream_transform_with, StreamError};
pub use value::Map;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
