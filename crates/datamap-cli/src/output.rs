//! Output formatting and writing utilities
//!
//! This module provides utilities for formatting and writing output
//! in various formats (JSON, YAML, human-readable), including the
//! transform envelope and rule validation reports.

use crate::cli::OutputFormat;
use crate::error::Result;
use crate::logging::redaction;
use colored::Colorize;
use datamap_core::rules::RuleError;
use serde::Serialize;
use serde_json::Value;
use std::io::{self, Write};
use tracing::{debug, trace};

/// Result of validating one rules file
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub file: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client: Option<String>,
    pub rule_count: usize,
    pub valid: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<RuleIssue>,
}

/// One rejected rule in a [`ValidationReport`]
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleIssue {
    pub index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rule_id: Option<u64>,
    pub message: String,
}

impl From<&RuleError> for RuleIssue {
    fn from(error: &RuleError) -> Self {
        Self {
            index: error.index,
            rule_id: error.rule_id,
            message: error.error.to_string(),
        }
    }
}

/// Trait for formatting output with specialized support for common types
pub trait OutputFormatter {
    /// Format a serializable value
    fn format<T: Serialize>(&self, value: &T) -> Result<String>;

    /// Format a rules-file validation report
    fn format_validation_report(&self, report: &ValidationReport) -> Result<String>;
}

impl OutputFormatter for OutputFormat {
    fn format<T: Serialize>(&self, value: &T) -> Result<String> {
        match self {
            OutputFormat::Json => Ok(serde_json::to_string(value)?),
            OutputFormat::JsonPretty => Ok(serde_json::to_string_pretty(value)?),
            OutputFormat::Yaml => Ok(serde_yaml::to_string(value)?),
            // Human format falls back to pretty JSON
            OutputFormat::Human => Ok(serde_json::to_string_pretty(value)?),
        }
    }

    fn format_validation_report(&self, report: &ValidationReport) -> Result<String> {
        match self {
            OutputFormat::Human => Ok(format_validation_report_human(report)),
            _ => self.format(report),
        }
    }
}

/// Output writer that handles different output formats and colors
pub struct OutputWriter {
    format: OutputFormat,
    use_color: bool,
    quiet: bool,
    verbose: u8,
    writer: Box<dyn Write>,
}

impl OutputWriter {
    /// Create a new output writer on stdout
    pub fn new(format: OutputFormat, use_color: bool, quiet: bool, verbose: u8) -> Self {
        Self::with_writer(format, use_color, quiet, verbose, Box::new(io::stdout()))
    }

    /// Create an output writer with a custom writer
    pub fn with_writer(
        format: OutputFormat,
        use_color: bool,
        quiet: bool,
        verbose: u8,
        writer: Box<dyn Write>,
    ) -> Self {
        Self {
            format,
            use_color,
            quiet,
            verbose,
            writer,
        }
    }

    /// Whether status messages are printed at all
    pub fn is_human(&self) -> bool {
        self.format == OutputFormat::Human && !self.quiet
    }

    /// Borrow the underlying sink, for streaming output
    pub fn sink(&mut self) -> &mut dyn Write {
        self.writer.as_mut()
    }

    /// Write a line of output
    pub fn writeln(&mut self, content: &str) -> Result<()> {
        writeln!(self.writer, "{}", content)?;
        self.writer.flush()?;
        Ok(())
    }

    /// Write an info message
    pub fn info(&mut self, message: &str) -> Result<()> {
        debug!("Output info: {}", message);

        if !self.is_human() {
            return Ok(());
        }
        if self.use_color {
            self.writeln(&format!("{} {}", "ℹ".blue(), message))
        } else {
            self.writeln(&format!("INFO: {}", message))
        }
    }

    /// Write a success message
    pub fn success(&mut self, message: &str) -> Result<()> {
        if !self.is_human() {
            return Ok(());
        }
        if self.use_color {
            self.writeln(&message.green().to_string())
        } else {
            self.writeln(message)
        }
    }

    /// Write a JSON document produced by a transform
    ///
    /// YAML and pretty JSON follow `-o`; otherwise `pretty` decides.
    pub fn document(&mut self, value: &Value, pretty: bool) -> Result<()> {
        if self.verbose > 1 {
            trace!("Outputting document: {}", redaction::redacted_json(value));
        }

        let formatted = match self.format {
            OutputFormat::Yaml => serde_yaml::to_string(value)?,
            OutputFormat::JsonPretty => serde_json::to_string_pretty(value)?,
            OutputFormat::Json | OutputFormat::Human if pretty => serde_json::to_string_pretty(value)?,
            OutputFormat::Json | OutputFormat::Human => serde_json::to_string(value)?,
        };
        self.writeln(formatted.trim_end())
    }

    /// Write a validation report with specialized formatting
    pub fn validation_report(&mut self, report: &ValidationReport) -> Result<()> {
        let formatted = self.format.format_validation_report(report)?;
        let formatted = if self.use_color && self.format == OutputFormat::Human {
            colorize_report(&formatted, report.valid)
        } else {
            formatted
        };
        self.writeln(formatted.trim_end())
    }
}

fn colorize_report(formatted: &str, valid: bool) -> String {
    let mut lines = formatted.lines();
    let Some(headline) = lines.next() else {
        return String::new();
    };
    let headline = if valid {
        headline.green().bold().to_string()
    } else {
        headline.red().bold().to_string()
    };
    std::iter::once(headline)
        .chain(lines.map(str::to_string))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format a validation report for human consumption
fn format_validation_report_human(report: &ValidationReport) -> String {
    let mut output = String::new();

    let subject = match &report.client {
        Some(client) => format!("{} (client {})", report.file, client),
        None => report.file.clone(),
    };

    if report.valid {
        output.push_str(&format!("✓ {}: {} rule(s) valid\n", subject, report.rule_count));
        return output;
    }

    output.push_str(&format!(
        "✗ {}: {} of {} rule(s) rejected\n",
        subject,
        report.errors.len(),
        report.rule_count
    ));
    for issue in &report.errors {
        match issue.rule_id {
            Some(id) => output.push_str(&format!("  • rule {} (id {}): {}\n", issue.index, id, issue.message)),
            None => output.push_str(&format!("  • rule {}: {}\n", issue.index, issue.message)),
        }
    }

    output
}
