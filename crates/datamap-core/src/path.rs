//! Path addressing over value trees
//!
//! A [`Path`] is a non-empty sequence of string segments. While walking a
//! tree, a segment addresses a map key, or a list index when the current
//! node is a list. Reads treat every mismatch as absence; writes create
//! intermediate maps and overwrite intermediates that are not maps.
//!
//! Copyright (c) 2025 Datamap Team
//! Licensed under the Apache-2.0 license

use crate::value::Map;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Ordered, non-empty sequence of segments addressing a node
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "PathRepr", into = "Vec<String>")]
pub struct Path {
    segments: Vec<String>,
}

/// Accepted wire forms: `["a", "0", "b"]` or `"a.0.b"`
#[derive(Deserialize)]
#[serde(untagged)]
enum PathRepr {
    Segments(Vec<String>),
    Dotted(String),
}

impl Path {
    /// Create a path from explicit segments
    pub fn new<I, S>(segments: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let segments: Vec<String> = segments.into_iter().map(Into::into).collect();
        if segments.is_empty() {
            return Err(Error::validation("path must contain at least one segment"));
        }
        Ok(Self { segments })
    }

    /// Parse a dot-joined path such as `applicantDetails.0.gender`
    pub fn parse(dotted: &str) -> Result<Self> {
        if dotted.is_empty() {
            return Err(Error::validation("path must not be empty"));
        }
        Self::new(dotted.split('.'))
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Final segment, used for placeholder inference
    pub fn last(&self) -> &str {
        // non-empty by construction
        &self.segments[self.segments.len() - 1]
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Segments as a JSON list, as exposed to expressions
    pub fn to_value(&self) -> Value {
        Value::Array(self.segments.iter().cloned().map(Value::String).collect())
    }
}

impl TryFrom<PathRepr> for Path {
    type Error = Error;

    fn try_from(repr: PathRepr) -> Result<Self> {
        match repr {
            PathRepr::Segments(segments) => Path::new(segments),
            PathRepr::Dotted(dotted) => Path::parse(&dotted),
        }
    }
}

impl From<Path> for Vec<String> {
    fn from(path: Path) -> Self {
        path.segments
    }
}

impl FromStr for Path {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Path::parse(s)
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("."))
    }
}

/// Read the node at `path`, or `None` when any segment fails to resolve
pub fn get<'a>(tree: &'a Value, path: &Path) -> Option<&'a Value> {
    get_segments(tree, path.segments())
}

/// Read from a map root without wrapping it in a [`Value`]
pub fn get_in<'a>(root: &'a Map, path: &Path) -> Option<&'a Value> {
    let (first, rest) = path.segments().split_first()?;
    get_segments(root.get(first)?, rest)
}

/// Segment walk shared by [`get`] and the `getPath` helper
///
/// An empty segment list addresses nothing.
pub fn get_segments<'a, S: AsRef<str>>(tree: &'a Value, segments: &[S]) -> Option<&'a Value> {
    if segments.is_empty() {
        return None;
    }
    descend(tree, segments)
}

fn descend<'a, S: AsRef<str>>(mut current: &'a Value, segments: &[S]) -> Option<&'a Value> {
    for segment in segments {
        let segment = segment.as_ref();
        current = match current {
            Value::Array(items) => items.get(parse_index(segment)?)?,
            Value::Object(map) => map.get(segment)?,
            Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_) => return None,
        };
    }
    Some(current)
}

fn parse_index(segment: &str) -> Option<usize> {
    segment.parse::<usize>().ok()
}

/// Write `value` at `path`, creating or replacing intermediate maps
pub fn set(tree: &mut Map, path: &Path, value: Value) {
    let Some((last, parents)) = path.segments().split_last() else {
        return;
    };

    let mut current = tree;
    for segment in parents {
        let slot = current
            .entry(segment.clone())
            .or_insert_with(|| Value::Object(Map::new()));
        if !slot.is_object() {
            *slot = Value::Object(Map::new());
        }
        current = match slot {
            Value::Object(map) => map,
            _ => return,
        };
    }
    current.insert(last.clone(), value);
}
