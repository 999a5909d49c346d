//! Choosing between buffered and streaming transforms
//!
//! Copyright (c) 2025 Datamap Team
//! Licensed under the Apache-2.0 license

use crate::value::Map;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Size limits applied before a document is transformed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformLimits {
    /// Payloads larger than this are rejected outright
    pub max_payload_bytes: u64,
    /// Payloads larger than this are streamed instead of buffered
    pub stream_threshold_bytes: u64,
}

impl TransformLimits {
    pub const DEFAULT_MAX_PAYLOAD_BYTES: u64 = 10 * 1024 * 1024;
    pub const DEFAULT_STREAM_THRESHOLD_BYTES: u64 = 5 * 1024 * 1024;
}

impl Default for TransformLimits {
    fn default() -> Self {
        Self {
            max_payload_bytes: Self::DEFAULT_MAX_PAYLOAD_BYTES,
            stream_threshold_bytes: Self::DEFAULT_STREAM_THRESHOLD_BYTES,
        }
    }
}

/// How a document will be transformed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransformMode {
    /// Parse the whole document, then apply rules once
    Buffered,
    /// Apply rules per top-level entry while reading
    Streaming,
}

impl TransformMode {
    /// Pick a mode from the declared payload length and an explicit request
    ///
    /// An unknown length never triggers streaming on its own.
    pub fn select(
        content_length: Option<u64>,
        stream_requested: bool,
        limits: &TransformLimits,
    ) -> Result<Self> {
        if let Some(size) = content_length {
            if size > limits.max_payload_bytes {
                return Err(Error::PayloadTooLarge {
                    size,
                    limit: limits.max_payload_bytes,
                });
            }
            if size > limits.stream_threshold_bytes {
                return Ok(TransformMode::Streaming);
            }
        }
        if stream_requested {
            Ok(TransformMode::Streaming)
        } else {
            Ok(TransformMode::Buffered)
        }
    }
}

/// Extract the document from a buffered request body
///
/// The body is normally an envelope `{"input_data": {...}}`; when
/// `allow_bare` is set, an object without that member is taken as the
/// document itself.
pub fn unwrap_envelope(body: Value, allow_bare: bool) -> Result<Map> {
    let Value::Object(mut envelope) = body else {
        return Err(Error::validation("request body must be a JSON object"));
    };
    match envelope.remove("input_data") {
        Some(Value::Object(document)) => Ok(document),
        Some(_) => Err(Error::validation("input_data must be a JSON object")),
        None if allow_bare => Ok(envelope),
        None => Err(Error::validation("input_data is required")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_select_mode() {
        let limits = TransformLimits::default();
        assert_eq!(TransformMode::select(Some(10), false, &limits).unwrap(), TransformMode::Buffered);
        assert_eq!(TransformMode::select(None, false, &limits).unwrap(), TransformMode::Buffered);
        assert_eq!(TransformMode::select(Some(10), true, &limits).unwrap(), TransformMode::Streaming);
        assert_eq!(
            TransformMode::select(Some(6 * 1024 * 1024), false, &limits).unwrap(),
            TransformMode::Streaming
        );
        assert_eq!(
            TransformMode::select(Some(5 * 1024 * 1024), false, &limits).unwrap(),
            TransformMode::Buffered
        );
    }

    #[test]
    fn test_select_rejects_oversized() {
        let limits = TransformLimits::default();
        let err = TransformMode::select(Some(11 * 1024 * 1024), true, &limits).unwrap_err();
        assert!(matches!(err, Error::PayloadTooLarge { limit, .. } if limit == 10 * 1024 * 1024));
    }

    #[test]
    fn test_limits_partial_config() {
        let limits: TransformLimits = serde_json::from_value(json!({"max_payload_bytes": 100})).unwrap();
        assert_eq!(limits.max_payload_bytes, 100);
        assert_eq!(limits.stream_threshold_bytes, TransformLimits::DEFAULT_STREAM_THRESHOLD_BYTES);
    }

    #[test]
    fn test_unwrap_envelope() {
        assert_eq!(
            Value::Object(unwrap_envelope(json!({"input_data": {"a": 1}}), false).unwrap()),
            json!({"a": 1})
        );
        assert_eq!(
            Value::Object(unwrap_envelope(json!({"a": 1}), true).unwrap()),
            json!({"a": 1})
        );
        assert!(unwrap_envelope(json!({"a": 1}), false).is_err());
        assert!(unwrap_envelope(json!({"input_data": 3}), true).is_err());
        assert!(unwrap_envelope(json!([1]), true).is_err());
    }
}
