//! Validate command handler

use super::utils::load_rule_set;
use crate::cli::ValidateArgs;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::logging::timing::Timer;
use crate::output::{OutputWriter, RuleIssue, ValidationReport};
use datamap_core::{validate_rules, TransformCapabilities, TransformKind};
use tracing::{debug, info, instrument, warn};

/// Handle the validate command
#[instrument(skip(_config, output), fields(file = %args.rules.display()))]
pub fn handle_validate(args: ValidateArgs, _config: &Config, output: &mut OutputWriter) -> Result<()> {
    let _timer = Timer::with_details("validate_command", &format!("file: {}", args.rules.display()));
    info!("Starting validation process");

    let capabilities = capabilities(&args.allow)?;
    debug!(kinds = ?capabilities.kinds().collect::<Vec<_>>(), "Accepted transform types");

    let rule_set = load_rule_set(&args.rules)?;
    output.info(&format!(
        "Validating {} rule(s) from {}",
        rule_set.rules.len(),
        args.rules.display()
    ))?;

    let errors = match validate_rules(&rule_set.rules, &capabilities) {
        Ok(()) => Vec::new(),
        Err(errors) => errors,
    };

    let report = ValidationReport {
        file: args.rules.display().to_string(),
        client: rule_set.client.map(|client| client.name),
        rule_count: rule_set.rules.len(),
        valid: errors.is_empty(),
        errors: errors.iter().map(RuleIssue::from).collect(),
    };
    output.validation_report(&report)?;

    if errors.is_empty() {
        info!("Validation completed successfully");
        Ok(())
    } else {
        warn!("Validation failed with {} rejected rule(s)", errors.len());
        Err(Error::ValidationFailed { count: errors.len() })
    }
}

/// Capability set from `--allow` flags; every kind when none are given
fn capabilities(allow: &[String]) -> Result<TransformCapabilities> {
    if allow.is_empty() {
        return Ok(TransformCapabilities::all());
    }
    let kinds = allow
        .iter()
        .map(|name| {
            name.parse::<TransformKind>()
                .map_err(|_| Error::invalid_args(format!("unknown transform type '{}'", name)))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(TransformCapabilities::only(kinds))
}
