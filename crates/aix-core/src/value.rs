//! Document tree primitives
//!
//! Provides the tagged [`Value`] union produced by every parser, the ordered
//! [`Mapping`] used for records, and [`Document`], the parsed root together
//! with the format it was read from.

use crate::format::Format;
use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use std::borrow::Cow;
use std::fmt::{self, Display, Formatter};

/// Ordered record: keys keep the order in which the author wrote them
pub type Mapping = IndexMap<String, Value>;

/// Numeric scalar
///
/// Keeps the lexeme it was read from, so text-oriented checks (a version
/// written as `1.10`, say) see what the author wrote rather than a
/// re-rendered float.
#[derive(Debug, Clone)]
pub struct Number {
    value: f64,
    lexeme: String,
}

impl Number {
    /// Create from a source lexeme that is already known to be numeric
    #[inline]
    #[must_use]
    pub(crate) fn from_parts(value: f64, lexeme: impl Into<String>) -> Self {
        Self {
            value,
            lexeme: lexeme.into(),
        }
    }

    /// Create from a float, rendering the lexeme with Rust's shortest form
    #[inline]
    #[must_use]
    pub fn from_f64(value: f64) -> Self {
        Self {
            value,
            lexeme: value.to_string(),
        }
    }

    /// Numeric value
    #[inline]
    #[must_use]
    pub fn as_f64(&self) -> f64 {
        self.value
    }

    /// Integer value, when the number is integral and fits
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    pub fn as_i64(&self) -> Option<i64> {
        if self.value.fract() == 0.0 && self.value.abs() < i64::MAX as f64 {
            Some(self.value as i64)
        } else {
            None
        }
    }

    /// Source text of the number
    #[inline]
    #[must_use]
    pub fn lexeme(&self) -> &str {
        &self.lexeme
    }

    fn is_integer_lexeme(&self) -> bool {
        !self.lexeme.contains(['.', 'e', 'E'])
    }
}

impl PartialEq for Number {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl Display for Number {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.lexeme)
    }
}

impl From<i64> for Number {
    #[allow(clippy::cast_precision_loss)]
    fn from(value: i64) -> Self {
        Self::from_parts(value as f64, value.to_string())
    }
}

impl From<&serde_json::Number> for Number {
    fn from(number: &serde_json::Number) -> Self {
        Self::from_parts(number.as_f64().unwrap_or_default(), number.to_string())
    }
}

impl Serialize for Number {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.as_i64() {
            Some(int) if self.is_integer_lexeme() => serializer.serialize_i64(int),
            _ => serializer.serialize_f64(self.value),
        }
    }
}

/// A node of the document tree
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// Explicit `null`
    #[default]
    Null,
    /// `true` / `false`
    Bool(bool),
    /// Numeric scalar
    Number(Number),
    /// Text scalar
    String(String),
    /// Ordered list of values
    Sequence(Vec<Value>),
    /// Nested record
    Mapping(Mapping),
}

impl Value {
    /// Human-readable name of the variant, used in diagnostics
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Number(_) => "number",
            Self::String(_) => "string",
            Self::Sequence(_) => "sequence",
            Self::Mapping(_) => "mapping",
        }
    }

    /// Check for `null`
    #[inline]
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Absent-equivalent: `null` or a string with no visible characters
    #[must_use]
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Null => true,
            Self::String(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    /// Borrow as string (string variant only)
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Scalar rendered as text: strings as-is, numbers by lexeme, booleans by name
    #[must_use]
    pub fn as_text(&self) -> Option<Cow<'_, str>> {
        match self {
            Self::String(s) => Some(Cow::Borrowed(s)),
            Self::Number(n) => Some(Cow::Borrowed(n.lexeme())),
            Self::Bool(b) => Some(Cow::Owned(b.to_string())),
            _ => None,
        }
    }

    /// Boolean value
    #[inline]
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Numeric value
    #[inline]
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(n.as_f64()),
            _ => None,
        }
    }

    /// Borrow as sequence
    #[inline]
    #[must_use]
    pub fn as_sequence(&self) -> Option<&[Value]> {
        match self {
            Self::Sequence(items) => Some(items),
            _ => None,
        }
    }

    /// Borrow as mutable sequence
    #[inline]
    pub fn as_sequence_mut(&mut self) -> Option<&mut Vec<Value>> {
        match self {
            Self::Sequence(items) => Some(items),
            _ => None,
        }
    }

    /// Borrow as mapping
    #[inline]
    #[must_use]
    pub fn as_mapping(&self) -> Option<&Mapping> {
        match self {
            Self::Mapping(map) => Some(map),
            _ => None,
        }
    }

    /// Borrow as mutable mapping
    #[inline]
    pub fn as_mapping_mut(&mut self) -> Option<&mut Mapping> {
        match self {
            Self::Mapping(map) => Some(map),
            _ => None,
        }
    }

    /// Look up a key when this value is a mapping
    #[inline]
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_mapping().and_then(|map| map.get(key))
    }

    /// Look up a dotted path (`semantic.similarity_threshold`) through nested mappings
    #[must_use]
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        path.split('.')
            .try_fold(self, |current, segment| current.get(segment))
    }

    /// Strings of a sequence, skipping non-string items
    #[must_use]
    pub fn string_items(&self) -> Vec<&str> {
        self.as_sequence()
            .map(|items| items.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default()
    }

    /// Convert to a `serde_json::Value`
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Null => serde_json::Value::Null,
            Self::Bool(b) => serde_json::Value::Bool(*b),
            Self::Number(n) => match n.as_i64() {
                Some(int) if n.is_integer_lexeme() => serde_json::Value::from(int),
                _ => serde_json::Number::from_f64(n.as_f64())
                    .map_or(serde_json::Value::Null, serde_json::Value::Number),
            },
            Self::String(s) => serde_json::Value::String(s.clone()),
            Self::Sequence(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
            Self::Mapping(map) => serde_json::Value::Object(
                map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
        }
    }
}

impl From<&serde_json::Value> for Value {
    fn from(json: &serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(*b),
            serde_json::Value::Number(n) => Self::Number(Number::from(n)),
            serde_json::Value::String(s) => Self::String(s.clone()),
            serde_json::Value::Array(items) => Self::Sequence(items.iter().map(Value::from).collect()),
            serde_json::Value::Object(map) => Self::Mapping(
                map.iter().map(|(k, v)| (k.clone(), Value::from(v))).collect(),
            ),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Self::Number(Number::from_f64(n))
    }
}

impl From<Mapping> for Value {
    fn from(map: Mapping) -> Self {
        Self::Mapping(map)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Self::Sequence(items)
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Number(n) => n.serialize(serializer),
            Self::String(s) => serializer.serialize_str(s),
            Self::Sequence(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Self::Mapping(map) => {
                let mut out = serializer.serialize_map(Some(map.len()))?;
                for (k, v) in map {
                    out.serialize_entry(k, v)?;
                }
                out.end()
            }
        }
    }
}

/// Parsed document: the root record plus the syntax it came from
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    root: Mapping,
    format: Format,
}

impl Document {
    /// Wrap a parsed root
    #[inline]
    #[must_use]
    pub fn new(root: Mapping, format: Format) -> Self {
        Self { root, format }
    }

    /// Root record
    #[inline]
    #[must_use]
    pub fn root(&self) -> &Mapping {
        &self.root
    }

    /// Syntax the document was parsed from
    #[inline]
    #[must_use]
    pub fn format(&self) -> Format {
        self.format
    }

    /// Top-level section by name
    #[inline]
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.root.get(key)
    }

    /// Check whether a top-level section exists
    #[inline]
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.root.contains_key(key)
    }

    /// Value at a dotted path from the root (`security.checksum.value`)
    #[must_use]
    pub fn get_path(&self, path: &str) -> Option<&Value> {
        let (head, rest) = match path.split_once('.') {
            Some((head, rest)) => (head, Some(rest)),
            None => (path, None),
        };
        let section = self.root.get(head)?;
        match rest {
            Some(rest) => section.get_path(rest),
            None => Some(section),
        }
    }

    /// Consume into the root record
    #[inline]
    #[must_use]
    pub fn into_root(self) -> Mapping {
        self.root
    }

    /// JSON rendering of the whole tree
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::Value::Object(
            self.root
                .iter()
                .map(|(k, v)| (k.clone(), v.to_json()))
                .collect(),
        )
    }
}

impl Serialize for Document {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.root.serialize(serializer)
    }
}
