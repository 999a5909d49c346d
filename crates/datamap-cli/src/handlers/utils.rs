//! Shared utilities for command handlers

use crate::error::{Error, Result};
use datamap_core::RuleSet;
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

/// Whether a path names a YAML file
pub fn is_yaml(path: &Path) -> bool {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|s| s == "yaml" || s == "yml")
        .unwrap_or(false)
}

/// Load a rule set from a JSON or YAML rules file
///
/// Both a `{ "client": …, "rules": [...] }` object and a bare array of
/// rules are accepted.
pub fn load_rule_set(path: &Path) -> Result<RuleSet> {
    if !path.exists() {
        return Err(Error::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let content = fs::read_to_string(path)?;
    tracing::debug!(path = %path.display(), bytes = content.len(), "Read rules file");

    let parsed = if is_yaml(path) {
        serde_yaml::from_str(&content).map_err(|e| {
            tracing::debug!("YAML rules parse failed: {}", e);
            "YAML rule set"
        })
    } else {
        RuleSet::from_json(&content).map_err(|e| {
            tracing::debug!("JSON rules parse failed: {}", e);
            "JSON rule set"
        })
    };

    parsed.map_err(|expected| Error::InvalidFormat {
        path: path.to_path_buf(),
        expected: expected.to_string(),
    })
}

/// Size of the input file, or `None` for stdin
pub fn input_size(input: Option<&Path>) -> Result<Option<u64>> {
    match input {
        Some(path) => match fs::metadata(path) {
            Ok(metadata) => Ok(Some(metadata.len())),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(Error::FileNotFound {
                path: path.to_path_buf(),
            }),
            Err(e) => Err(e.into()),
        },
        None => Ok(None),
    }
}

/// Open the input file, or stdin
pub fn open_input(input: Option<&Path>) -> Result<Box<dyn Read>> {
    match input {
        Some(path) => Ok(Box::new(BufReader::new(File::open(path)?))),
        None => Ok(Box::new(BufReader::new(io::stdin()))),
    }
}

/// Create the output file, including missing parent directories
pub fn create_output(path: &Path) -> Result<BufWriter<File>> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    Ok(BufWriter::new(File::create(path)?))
}

/// Read at most `limit` bytes, failing if the input is longer
pub fn read_limited(reader: impl Read, limit: u64) -> Result<String> {
    let mut content = String::new();
    reader.take(limit.saturating_add(1)).read_to_string(&mut content)?;
    let size = content.len() as u64;
    if size > limit {
        return Err(datamap_core::Error::PayloadTooLarge { size, limit }.into());
    }
    Ok(content)
}

/// Flush a writer, surfacing errors a drop would swallow
pub fn finish(mut writer: impl Write) -> Result<()> {
    writer.flush()?;
    Ok(())
}
