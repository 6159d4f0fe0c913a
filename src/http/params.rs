//! Ordered request parameter values.
//!
//! `Params` preserves insertion order so query strings and form bodies are
//! emitted deterministically. `ParamValue` is the closed set of value shapes
//! the query/form codecs know how to serialize; nesting is only ever
//! flattened by an explicit [`flatten_nested`](crate::http::url::flatten_nested)
//! call, never implicitly.

use std::fmt;

/// A single parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    /// Text value, emitted as-is (percent-encoded on the wire).
    Str(String),
    /// Integer value.
    Int(i64),
    /// Float value.
    Float(f64),
    /// Boolean value, emitted as `true`/`false`.
    Bool(bool),
    /// Sequence value, expanded per the configured array style.
    Seq(Vec<ParamValue>),
    /// Nested mapping, flattened to `parent[child]` keys when flattening
    /// is enabled, otherwise serialized as one opaque JSON value.
    Nested(Params),
}

impl ParamValue {
    /// Renders a scalar value to its wire text. Sequences and nested maps
    /// have no scalar rendering and are handled by the encoders.
    pub(crate) fn scalar_text(&self) -> Option<String> {
        match self {
            ParamValue::Str(s) => Some(s.clone()),
            ParamValue::Int(i) => Some(i.to_string()),
            ParamValue::Float(v) => Some(v.to_string()),
            ParamValue::Bool(b) => Some(b.to_string()),
            ParamValue::Seq(_) | ParamValue::Nested(_) => None,
        }
    }

    /// Serializes any value shape to text, falling back to compact JSON
    /// for sequences and nested maps left unflattened.
    pub(crate) fn opaque_text(&self) -> String {
        match self.scalar_text() {
            Some(text) => text,
            None => self.to_json().to_string(),
        }
    }

    fn to_json(&self) -> serde_json::Value {
        match self {
            ParamValue::Str(s) => serde_json::Value::String(s.clone()),
            ParamValue::Int(i) => serde_json::Value::from(*i),
            ParamValue::Float(v) => serde_json::Value::from(*v),
            ParamValue::Bool(b) => serde_json::Value::from(*b),
            ParamValue::Seq(items) => {
                serde_json::Value::Array(items.iter().map(ParamValue::to_json).collect())
            }
            ParamValue::Nested(params) => serde_json::Value::Object(
                params
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Str(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Str(value)
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        ParamValue::Int(value)
    }
}

impl From<i32> for ParamValue {
    fn from(value: i32) -> Self {
        ParamValue::Int(i64::from(value))
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        ParamValue::Bool(value)
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        ParamValue::Float(value)
    }
}

impl<V: Into<ParamValue>> From<Vec<V>> for ParamValue {
    fn from(values: Vec<V>) -> Self {
        ParamValue::Seq(values.into_iter().map(Into::into).collect())
    }
}

impl From<Params> for ParamValue {
    fn from(params: Params) -> Self {
        ParamValue::Nested(params)
    }
}

/// An ordered mapping of parameter names to values.
#[derive(Default, Clone, PartialEq)]
pub struct Params {
    entries: Vec<(String, ParamValue)>,
}

impl Params {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an entry, builder style.
    #[must_use]
    pub fn add(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.entries.push((key.into(), value.into()));
        self
    }

    pub fn push(&mut self, key: impl Into<String>, value: impl Into<ParamValue>) {
        self.entries.push((key.into(), value.into()));
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &(String, ParamValue)> {
        self.entries.iter()
    }

    /// True when any value is a nested mapping.
    #[must_use]
    pub fn has_nested(&self) -> bool {
        self.entries
            .iter()
            .any(|(_, v)| matches!(v, ParamValue::Nested(_)))
    }
}

impl fmt::Debug for Params {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.entries.iter().map(|(k, v)| (k, v)))
            .finish()
    }
}

impl<K: Into<String>, V: Into<ParamValue>> FromIterator<(K, V)> for Params {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Params {
            entries: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl IntoIterator for Params {
    type Item = (String, ParamValue);
    type IntoIter = std::vec::IntoIter<(String, ParamValue)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
