//! Transform command handler

use super::utils::{create_output, finish, input_size, load_rule_set, open_input, read_limited};
use crate::cli::TransformArgs;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::logging::{redaction, timing::Timer};
use crate::output::OutputWriter;
use datamap_core::mode::unwrap_envelope;
use datamap_core::{
    missing_required_fields, validate_rules, Map, MappingRule, RuleEngine, TransformCapabilities,
    TransformMode,
};
use serde_json::Value;
use std::io::{Read, Write};
use tracing::{debug, info, instrument, warn};

/// Handle the transform command
#[instrument(skip_all, fields(rules = %args.rules.display(), stream = args.stream))]
pub fn handle_transform(args: TransformArgs, config: &Config, output: &mut OutputWriter) -> Result<()> {
    let _timer = Timer::with_details("transform_command", &format!("rules: {}", args.rules.display()));

    if args.stream && args.pretty {
        return Err(Error::invalid_args(
            "--pretty cannot be combined with --stream; streamed output is written as read",
        ));
    }

    let rule_set = load_rule_set(&args.rules)?;
    validate_rules(&rule_set.rules, &TransformCapabilities::all())
        .map_err(|errors| Error::RulesRejected { errors })?;
    info!(rules = rule_set.rules.len(), "Rules loaded");

    let size = input_size(args.input.as_deref())?;
    let mode = TransformMode::select(size, args.stream, &config.limits)?;
    info!(mode = ?mode, size = ?size, "Transform mode selected");

    let engine = RuleEngine::new();
    let input = open_input(args.input.as_deref())?;

    match mode {
        TransformMode::Streaming => {
            if args.pretty {
                warn!("Input exceeds the streaming threshold; --pretty is ignored");
            }
            stream(&engine, input, &rule_set.rules, &args, output)
        }
        TransformMode::Buffered => {
            let body = read_limited(input, config.limits.max_payload_bytes)?;
            let result = buffered(&engine, &body, &rule_set.rules, config)?;

            let pretty = args.pretty || config.output.pretty;
            match &args.save_to {
                Some(path) => {
                    let mut file = create_output(path)?;
                    if pretty {
                        serde_json::to_writer_pretty(&mut file, &result)?;
                    } else {
                        serde_json::to_writer(&mut file, &result)?;
                    }
                    finish(file)?;
                    output.success(&format!("✓ Wrote result to {}", path.display()))
                }
                None => output.document(&result, pretty),
            }
        }
    }
}

fn stream(
    engine: &RuleEngine,
    input: impl Read,
    rules: &[MappingRule],
    args: &TransformArgs,
    output: &mut OutputWriter,
) -> Result<()> {
    match &args.save_to {
        Some(path) => {
            let mut file = create_output(path)?;
            engine.stream(input, &mut file, rules)?;
            finish(file)?;
            output.success(&format!("✓ Streamed result to {}", path.display()))
        }
        None => {
            let sink = output.sink();
            engine.stream(input, &mut *sink, rules)?;
            writeln!(sink)?;
            finish(sink)
        }
    }
}

/// Transform a buffered request body into the response envelope
pub(crate) fn buffered(engine: &RuleEngine, body: &str, rules: &[MappingRule], config: &Config) -> Result<Value> {
    let parsed: Value = serde_json::from_str(body).map_err(datamap_core::Error::from)?;
    let document = unwrap_envelope(parsed, config.output.allow_bare_input)?;

    if tracing::enabled!(tracing::Level::DEBUG) {
        let rendered = Value::Object(document.clone());
        if config.logging.redact {
            debug!(input = %redaction::redacted_json(&rendered), "Transforming document");
        } else {
            debug!(input = %rendered, "Transforming document");
        }
    }

    let data = engine.apply_rules(&document, rules);
    let missing = missing_required_fields(&data, rules);
    if !missing.is_empty() {
        warn!(fields = ?missing, "Required fields missing from output");
    }

    Ok(envelope(data, missing))
}

fn envelope(data: Map, missing: Vec<String>) -> Value {
    let mut body = Map::new();
    body.insert("success".to_string(), Value::Bool(true));
    body.insert("data".to_string(), Value::Object(data));
    if !missing.is_empty() {
        let mut warnings = Map::new();
        warnings.insert(
            "missingRequiredFields".to_string(),
            Value::Array(missing.into_iter().map(Value::String).collect()),
        );
        body.insert("warnings".to_string(), Value::Object(warnings));
    }
    Value::Object(body)
}
