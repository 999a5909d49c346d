// Tests for output formatting
//
// These tests cover the transform envelope rendering, validation
// reports and the quiet/human gating of status messages.

use super::*;
use datamap_core::rules::ValidationError;
use serde_json::json;
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Clone, Default)]
struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

impl SharedBuffer {
    fn contents(&self) -> String {
        String::from_utf8(self.0.borrow().clone()).unwrap()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn writer(format: OutputFormat, quiet: bool) -> (OutputWriter, SharedBuffer) {
    let buffer = SharedBuffer::default();
    let writer = OutputWriter::with_writer(format, false, quiet, 0, Box::new(buffer.clone()));
    (writer, buffer)
}

fn invalid_report() -> ValidationReport {
    let errors = vec![
        RuleError {
            index: 1,
            rule_id: Some(42),
            error: ValidationError::MissingLogic,
        },
        RuleError {
            index: 4,
            rule_id: None,
            error: ValidationError::EmptySegment {
                field: "source_path",
                path: "a..b".to_string(),
            },
        },
    ];
    ValidationReport {
        file: "rules.json".to_string(),
        client: Some("acme-lending".to_string()),
        rule_count: 5,
        valid: false,
        errors: errors.iter().map(RuleIssue::from).collect(),
    }
}

#[test]
fn test_document_compact_and_pretty() {
    let value = json!({"success": true, "data": {"a": 1}});

    let (mut out, buffer) = writer(OutputFormat::Human, false);
    out.document(&value, false).unwrap();
    assert_eq!(buffer.contents(), "{\"success\":true,\"data\":{\"a\":1}}\n");

    let (mut out, buffer) = writer(OutputFormat::Json, false);
    out.document(&value, true).unwrap();
    assert!(buffer.contents().contains("\n  \"success\": true"));

    let (mut out, buffer) = writer(OutputFormat::JsonPretty, false);
    out.document(&value, false).unwrap();
    assert!(buffer.contents().contains("\n  \"data\": {"));
}

#[test]
fn test_document_yaml() {
    let (mut out, buffer) = writer(OutputFormat::Yaml, false);
    out.document(&json!({"success": true}), false).unwrap();
    assert_eq!(buffer.contents(), "success: true\n");
}

#[test]
fn test_validation_report_human_valid() {
    let report = ValidationReport {
        file: "rules.json".to_string(),
        client: None,
        rule_count: 9,
        valid: true,
        errors: vec![],
    };
    let (mut out, buffer) = writer(OutputFormat::Human, false);
    out.validation_report(&report).unwrap();
    assert_eq!(buffer.contents(), "✓ rules.json: 9 rule(s) valid\n");
}

#[test]
fn test_validation_report_human_invalid() {
    let formatted = format_validation_report_human(&invalid_report());
    assert!(formatted.starts_with("✗ rules.json (client acme-lending): 2 of 5 rule(s) rejected"));
    assert!(formatted.contains("• rule 1 (id 42): transform_logic is required"));
    assert!(formatted.contains("• rule 4: source_path contains an empty segment: 'a..b'"));
}

#[test]
fn test_validation_report_json() {
    let (mut out, buffer) = writer(OutputFormat::Json, false);
    out.validation_report(&invalid_report()).unwrap();

    let parsed: Value = serde_json::from_str(buffer.contents().trim()).unwrap();
    assert_eq!(parsed["ruleCount"], 5);
    assert_eq!(parsed["valid"], false);
    assert_eq!(parsed["errors"][0]["ruleId"], 42);
    assert!(parsed["errors"][1].get("ruleId").is_none());
}

#[test]
fn test_status_messages_respect_quiet_and_format() {
    let (mut out, buffer) = writer(OutputFormat::Human, true);
    out.info("hidden").unwrap();
    out.success("hidden").unwrap();
    assert_eq!(buffer.contents(), "");

    let (mut out, buffer) = writer(OutputFormat::Json, false);
    out.info("hidden").unwrap();
    out.success("hidden").unwrap();
    assert_eq!(buffer.contents(), "");

    let (mut out, buffer) = writer(OutputFormat::Human, false);
    out.info("loaded").unwrap();
    out.success("done").unwrap();
    assert_eq!(buffer.contents(), "INFO: loaded\ndone\n");
}

#[test]
fn test_colorize_report_headline_only() {
    colored::control::set_override(true);
    let colored = colorize_report("✗ bad\n  • rule 0: x", false);
    colored::control::unset_override();
    assert!(colored.ends_with("\n  • rule 0: x"));
    assert!(colored.starts_with("\u{1b}["));
}
