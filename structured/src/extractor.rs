//! Tolerant recovery of JSON payloads embedded in free text.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Whether a JSON payload is expected to be an object or an array.
///
/// The shape decides which delimiter pair [`extract`] searches for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Shape {
    /// `{ ... }`
    #[default]
    Object,
    /// `[ ... ]`
    Array,
}

impl Shape {
    /// Opening and closing delimiters for this shape.
    #[must_use]
    pub const fn delimiters(self) -> (char, char) {
        match self {
            Self::Object => ('{', '}'),
            Self::Array => ('[', ']'),
        }
    }

    /// Shape of an already parsed value: arrays are `Array`, everything else `Object`.
    #[must_use]
    pub const fn of(value: &Value) -> Self {
        match value {
            Value::Array(_) => Self::Array,
            _ => Self::Object,
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Object => f.write_str("object"),
            Self::Array => f.write_str("array"),
        }
    }
}

/// Recovers the first parseable JSON value of the given shape from `text`.
///
/// The search starts with the span between the first opening delimiter and the
/// last closing delimiter. On a parse failure the closing boundary moves to the
/// previous closing delimiter; once it is no longer after the opening boundary,
/// the opening boundary advances to the next opening delimiter and the closing
/// boundary resets to the last one in the whole text. The first span that parses
/// wins.
///
/// Returns `None` when no span parses.
///
/// # Examples
///
/// ```
/// use rig_guard_structured::{extract, Shape};
/// use serde_json::json;
///
/// let noisy = r#"{"a":1} and then garbage {broken"#;
/// assert_eq!(extract(noisy, Shape::Object), Some(json!({"a": 1})));
/// assert_eq!(extract("no braces here", Shape::Object), None);
/// ```
#[must_use]
pub fn extract(text: &str, shape: Shape) -> Option<Value> {
    let (open, close) = shape.delimiters();
    let mut start = text.find(open);
    let mut end = text.rfind(close);

    while let (Some(s), Some(e)) = (start, end) {
        if e <= s {
            break;
        }

        // Delimiters are ASCII, so both boundaries sit on char boundaries.
        if let Ok(value) = serde_json::from_str::<Value>(&text[s..=e]) {
            return Some(value);
        }

        end = text[..e].rfind(close);
        if end.is_none_or(|e| e <= s) {
            start = text[s + 1..].find(open).map(|i| i + s + 1);
            end = text.rfind(close);
        }
    }

    None
}
