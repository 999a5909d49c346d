//! Configuration management for the CLI
//!
//! This module handles loading and merging configuration from:
//! - Default values
//! - Configuration files (YAML/JSON/TOML)
//! - Environment variables

use crate::error::{Error, Result};
use datamap_core::TransformLimits;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Overrides `limits.max_payload_bytes`
pub const ENV_MAX_PAYLOAD_BYTES: &str = "DATAMAP_MAX_PAYLOAD_BYTES";
/// Overrides `limits.stream_threshold_bytes`
pub const ENV_STREAM_THRESHOLD_BYTES: &str = "DATAMAP_STREAM_THRESHOLD_BYTES";

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Payload size limits for transforms
    pub limits: TransformLimits,

    /// Logging settings
    pub logging: LoggingConfig,

    /// Output settings
    pub output: OutputConfig,
}

/// Output configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Pretty-print buffered transform results by default
    pub pretty: bool,

    /// Accept input documents without the `input_data` envelope
    pub allow_bare_input: bool,
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (compact, full, json)
    pub format: String,

    /// Redact sensitive keys when documents are logged
    pub redact: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            pretty: false,
            allow_bare_input: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            format: "compact".to_string(),
            redact: true,
        }
    }
}

/// Configuration file formats, chosen by extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FileFormat {
    Json,
    Yaml,
    Toml,
}

impl FileFormat {
    fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|s| s.to_str()) {
            Some("yaml") | Some("yml") => FileFormat::Yaml,
            Some("toml") => FileFormat::Toml,
            _ => FileFormat::Json,
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::FileNotFound {
                path: path.to_path_buf(),
            });
        }

        let content = std::fs::read_to_string(path)?;

        let config = match FileFormat::from_path(path) {
            FileFormat::Yaml => serde_yaml::from_str(&content)?,
            FileFormat::Toml => toml::from_str(&content)
                .map_err(|e| Error::config(format!("{}: {}", path.display(), e)))?,
            FileFormat::Json => serde_json::from_str(&content)?,
        };

        Ok(config)
    }

    /// Load configuration from default locations
    pub fn load() -> Result<Self> {
        for path in Self::default_config_paths() {
            if path.exists() {
                match Self::from_file(&path) {
                    Ok(config) => {
                        tracing::debug!(path = %path.display(), "Loaded configuration");
                        return Ok(config);
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", path.display(), e);
                    }
                }
            }
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file or default locations,
    /// then apply environment overrides
    pub fn load_with_file(file: Option<&Path>) -> Result<Self> {
        let mut config = match file {
            Some(path) => Self::from_file(path)?,
            None => Self::load()?,
        };
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `DATAMAP_*` overrides read through `lookup`
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(raw) = lookup(ENV_MAX_PAYLOAD_BYTES) {
            self.limits.max_payload_bytes = parse_bytes(ENV_MAX_PAYLOAD_BYTES, &raw)?;
        }
        if let Some(raw) = lookup(ENV_STREAM_THRESHOLD_BYTES) {
            self.limits.stream_threshold_bytes = parse_bytes(ENV_STREAM_THRESHOLD_BYTES, &raw)?;
        }
        Ok(())
    }

    /// Reject limits that can never be satisfied
    pub fn validate(&self) -> Result<()> {
        if self.limits.max_payload_bytes == 0 {
            return Err(Error::config("limits.max_payload_bytes must be greater than zero"));
        }
        if self.limits.stream_threshold_bytes > self.limits.max_payload_bytes {
            tracing::warn!(
                "limits.stream_threshold_bytes ({}) exceeds limits.max_payload_bytes ({}); size-based streaming is disabled",
                self.limits.stream_threshold_bytes,
                self.limits.max_payload_bytes
            );
        }
        Ok(())
    }

    /// Get default configuration file paths to check
    fn default_config_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();

        for name in [".datamap", "datamap"] {
            for ext in ["yaml", "json", "toml"] {
                paths.push(PathBuf::from(format!("{}.{}", name, ext)));
            }
        }

        if let Some(config_dir) = dirs::config_dir() {
            let datamap_dir = config_dir.join("datamap");
            for ext in ["yaml", "json", "toml"] {
                paths.push(datamap_dir.join(format!("config.{}", ext)));
            }
        }

        if let Some(home_dir) = dirs::home_dir() {
            paths.push(home_dir.join(".datamap.yaml"));
            paths.push(home_dir.join(".datamap.json"));
        }

        paths
    }
}

fn parse_bytes(key: &str, raw: &str) -> Result<u64> {
    raw.trim()
        .parse()
        .map_err(|_| Error::config(format!("{} must be a byte count, got '{}'", key, raw)))
}
