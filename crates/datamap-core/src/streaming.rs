//! Constant-memory transformation of large documents
//!
//! The input must be a single top-level JSON object. Entries are read one at
//! a time straight from the reader, transformed, and written to the sink
//! before the next entry is parsed, so only the current top-level pair is
//! ever held in memory.
//!
//! With rules, every top-level value that is an object is run through the
//! rule engine on its own; every other value passes through unchanged.
//!
//! ```
//! use datamap_core::rules::MappingRuleBuilder;
//! use datamap_core::streaming::stream_transform;
//!
//! let rules = vec![MappingRuleBuilder::new("x").destination("y").build().unwrap()];
//! let mut out = Vec::new();
//! stream_transform(&br#"{"a": {"x": 1}, "b": 5}"#[..], &mut out, &rules).unwrap();
//!
//! assert_eq!(String::from_utf8(out).unwrap(), r#"{"a":{"y":1},"b":5}"#);
//! ```
//!
//! Copyright (c) 2025 Datamap Team
//! Licensed under the Apache-2.0 license

use crate::engine::RuleEngine;
use crate::expression::Evaluator;
use crate::rules::MappingRule;
use serde::de::{self, Deserializer as _, MapAccess, Visitor};
use serde_json::Value;
use std::fmt;
use std::io::{self, Read, Write};
use thiserror::Error;

/// Errors that abort a streaming transform
#[derive(Error, Debug)]
pub enum StreamError {
    /// Input is not a single well-formed JSON object
    #[error("Malformed JSON stream: {source}")]
    Framing {
        #[source]
        source: serde_json::Error,
    },

    /// Writing to the sink failed
    #[error("Failed to write transformed stream: {source}")]
    Io {
        #[source]
        source: io::Error,
    },
}

impl StreamError {
    /// Line and column of a framing error in the input
    pub fn position(&self) -> Option<(usize, usize)> {
        match self {
            StreamError::Framing { source } => Some((source.line(), source.column())),
            StreamError::Io { .. } => None,
        }
    }
}

impl From<StreamError> for crate::Error {
    fn from(err: StreamError) -> Self {
        match err {
            StreamError::Framing { source } => crate::Error::Stream {
                message: source.to_string(),
                source: Some(source),
            },
            StreamError::Io { source } => crate::Error::Io {
                message: source.to_string(),
                source,
            },
        }
    }
}

/// Stream `reader` to `writer`, applying `rules` to each top-level object value
pub fn stream_transform<R: Read, W: Write>(
    reader: R,
    writer: W,
    rules: &[MappingRule],
) -> Result<(), StreamError> {
    RuleEngine::new().stream(reader, writer, rules)
}

impl<E: Evaluator> RuleEngine<E> {
    /// Streaming counterpart of [`RuleEngine::apply_rules`]
    pub fn stream<R: Read, W: Write>(
        &self,
        reader: R,
        writer: W,
        rules: &[MappingRule],
    ) -> Result<(), StreamError> {
        stream_transform_with(reader, writer, |key, value| match value {
            Value::Object(entry) => (key, Value::Object(self.apply_rules(&entry, rules))),
            other => (key, other),
        })
    }
}

/// Stream `reader` to `writer`, mapping each top-level entry with `transform`
///
/// Output is emitted incrementally as `{`, comma-separated `"key":value`
/// pairs, then `}`. Anything other than whitespace after the closing brace
/// is a framing error.
pub fn stream_transform_with<R, W, F>(reader: R, mut writer: W, transform: F) -> Result<(), StreamError>
where
    R: Read,
    W: Write,
    F: FnMut(String, Value) -> (String, Value),
{
    let mut deserializer = serde_json::Deserializer::from_reader(reader);
    let mut sink_error = None;

    let visitor = EntryVisitor {
        writer: &mut writer,
        transform,
        sink_error: &mut sink_error,
    };
    let result = (&mut deserializer).deserialize_map(visitor);

    if let Some(source) = sink_error {
        return Err(StreamError::Io { source });
    }
    let entries = result.map_err(|source| StreamError::Framing { source })?;
    deserializer
        .end()
        .map_err(|source| StreamError::Framing { source })?;
    writer.flush().map_err(|source| StreamError::Io { source })?;

    tracing::debug!(entries, "stream transform complete");
    Ok(())
}

struct EntryVisitor<'a, W, F> {
    writer: &'a mut W,
    transform: F,
    sink_error: &'a mut Option<io::Error>,
}

impl<W: Write, F> EntryVisitor<'_, W, F> {
    fn emit<T: serde::Serialize + ?Sized>(&mut self, value: &T) -> io::Result<()> {
        serde_json::to_writer(&mut *self.writer, value).map_err(io::Error::from)
    }

    fn emit_entry(&mut self, first: bool, key: &str, value: &Value) -> io::Result<()> {
        if !first {
            self.writer.write_all(b",")?;
        }
        self.emit(key)?;
        self.writer.write_all(b":")?;
        self.emit(value)
    }

    /// Park the sink error and hand the deserializer an error that stops it
    fn fail<E: de::Error>(&mut self, err: io::Error) -> E {
        *self.sink_error = Some(err);
        E::custom("output sink failed")
    }
}

impl<'de, W, F> Visitor<'de> for EntryVisitor<'_, W, F>
where
    W: Write,
    F: FnMut(String, Value) -> (String, Value),
{
    type Value = usize;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("a top-level JSON object")
    }

    fn visit_map<A>(mut self, mut access: A) -> Result<usize, A::Error>
    where
        A: MapAccess<'de>,
    {
        if let Err(err) = self.writer.write_all(b"{") {
            return Err(self.fail(err));
        }

        let mut entries = 0usize;
        while let Some(key) = access.next_key::<String>()? {
            let value = access.next_value::<Value>()?;
            let (key, value) = (self.transform)(key, value);
            if let Err(err) = self.emit_entry(entries == 0, &key, &value) {
                return Err(self.fail(err));
            }
            entries += 1;
        }

        if let Err(err) = self.writer.write_all(b"}") {
            return Err(self.fail(err));
        }
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::MappingRuleBuilder;
    use serde_json::json;

    fn rules() -> Vec<MappingRule> {
        vec![MappingRuleBuilder::new("x").destination("y").build().unwrap()]
    }

    fn stream(input: &str) -> Result<String, StreamError> {
        let mut out = Vec::new();
        stream_transform(input.as_bytes(), &mut out, &rules())?;
        Ok(String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_objects_transformed_scalars_passed_through() {
        let out = stream(r#"{"a": {"x": 1}, "b": 5, "c": [1, {"x": 2}], "d": {"z": 0}}"#).unwrap();
        assert_eq!(out, r#"{"a":{"y":1},"b":5,"c":[1,{"x":2}],"d":{}}"#);
    }

    #[test]
    fn test_output_matches_buffered_per_entry() {
        let input = json!({"first": {"x": "one"}, "second": {"x": {"deep": true}}});
        let out = stream(&input.to_string()).unwrap();
        let parsed: Value = serde_json::from_str(&out).unwrap();

        let rules = rules();
        for (key, value) in input.as_object().unwrap() {
            let expected = crate::engine::apply_rules(value.as_object().unwrap(), &rules);
            assert_eq!(parsed[key], Value::Object(expected));
        }
    }

    #[test]
    fn test_empty_object() {
        assert_eq!(stream("  {}  \n").unwrap(), "{}");
    }

    #[test]
    fn test_framing_errors() {
        for bad in ["", "[1, 2]", "42", r#"{"a": 1"#, r#"{"a" 1}"#, r#"{"a": 1} {"b": 2}"#, r#"{"a": 1} x"#] {
            let err = stream(bad).unwrap_err();
            assert!(matches!(err, StreamError::Framing { .. }), "{:?} gave {:?}", bad, err);
        }
    }

    #[test]
    fn test_custom_entry_transform() {
        let mut out = Vec::new();
        stream_transform_with(&br#"{"a": 1, "b": "two"}"#[..], &mut out, |key, value| {
            (key.to_uppercase(), json!([value]))
        })
        .unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), r#"{"A":[1],"B":["two"]}"#);
    }

    struct FailingSink;

    impl Write for FailingSink {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_sink_errors_are_io_errors() {
        let err = stream_transform(&br#"{"a": {"x": 1}}"#[..], FailingSink, &rules()).unwrap_err();
        match err {
            StreamError::Io { source } => assert_eq!(source.kind(), io::ErrorKind::BrokenPipe),
            other => panic!("expected an I/O error, got {:?}", other),
        }
    }

    #[test]
    fn test_error_conversion() {
        let err = stream("{").unwrap_err();
        assert!(err.position().is_some());
        let err: crate::Error = err.into();
        assert!(matches!(err, crate::Error::Stream { .. }));
    }
}
