//! Error types for the Datamap core library
//!
//! This module defines the crate-wide error type. Component modules keep their
//! own detailed error enums (expression, streaming, validation) and convert
//! into [`Error`] at the public boundary.

use thiserror::Error;

/// Main error type for Datamap operations
#[derive(Error, Debug)]
pub enum Error {
    /// Rule rejected at ingestion time
    #[error("Rule validation failed: {message}")]
    Validation {
        message: String,
        rule_index: Option<usize>,
    },

    /// Expression compile or runtime failure
    #[error("Expression error: {message}")]
    Expression {
        message: String,
        expression: Option<String>,
    },

    /// Malformed top-level JSON in streaming mode
    #[error("Stream framing error: {message}")]
    Stream {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    /// Payload rejected before transformation
    #[error("Payload too large: {size} bytes exceeds the {limit} byte limit")]
    PayloadTooLarge { size: u64, limit: u64 },

    /// JSON parsing and serialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: serde_json::Error,
    },

    /// IO errors
    #[error("IO error: {message}")]
    Io {
        message: String,
        #[source]
        source: std::io::Error,
    },
}

/// Convenience type alias for Results using our Error type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a validation error that is not tied to a rule position
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
            rule_index: None,
        }
    }

    /// Whether the error was raised by malformed input rather than by the environment
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::Validation { .. }
                | Self::Expression { .. }
                | Self::Stream { .. }
                | Self::PayloadTooLarge { .. }
                | Self::Json { .. }
        )
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Json {
            message: err.to_string(),
            source: err,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io {
            message: err.to_string(),
            source: err,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::validation("source_path must not be empty");
        assert_eq!(
            err.to_string(),
            "Rule validation failed: source_path must not be empty"
        );

        let err = Error::PayloadTooLarge {
            size: 11,
            limit: 10,
        };
        assert_eq!(
            err.to_string(),
            "Payload too large: 11 bytes exceeds the 10 byte limit"
        );
    }

    #[test]
    fn test_json_conversion() {
        let parse_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err: Error = parse_err.into();
        assert!(matches!(err, Error::Json { .. }));
        assert!(err.is_input_error());
    }

    #[test]
    fn test_io_is_not_input_error() {
        let err: Error = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed").into();
        assert!(!err.is_input_error());
    }
}
