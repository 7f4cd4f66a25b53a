//! The flat feature row produced for each match.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::age::Seconds;
use crate::replay::Position;

/// One cell of a feature row.
///
/// Serialized untagged, so `Missing` becomes JSON `null`. Deserializing
/// reads every non-integral number back as `Float`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureValue {
    /// Not applicable or unknown.
    Missing,
    /// Flag.
    Bool(bool),
    /// Count.
    Int(i64),
    /// Measurement.
    Float(f64),
    /// Label.
    Text(String),
    /// Timestamp in seconds since match start.
    Seconds(Seconds),
    /// Map position.
    Point(Position),
}

impl FeatureValue {
    /// A timestamp, or `Missing` if it was never reached.
    #[must_use]
    pub fn seconds(value: Option<Seconds>) -> Self {
        value.map_or(Self::Missing, Self::Seconds)
    }

    /// A label, or `Missing`.
    #[must_use]
    pub fn text(value: Option<&str>) -> Self {
        value.map_or(Self::Missing, |t| Self::Text(t.to_string()))
    }

    /// Whether the value is `Missing`.
    #[must_use]
    pub const fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }

    /// Numeric view of the value.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(v) => Some(*v as f64),
            Self::Float(v) | Self::Seconds(v) => Some(*v),
            _ => None,
        }
    }

    /// Text view of the value.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(t) => Some(t),
            _ => None,
        }
    }

    /// Render as a CSV cell. `Missing` is empty.
    #[must_use]
    pub fn to_cell(&self) -> String {
        match self {
            Self::Missing => String::new(),
            Self::Bool(b) => b.to_string(),
            Self::Int(v) => v.to_string(),
            Self::Float(v) | Self::Seconds(v) => format!("{v:.3}"),
            Self::Text(t) => t.clone(),
            Self::Point(p) => format!("({}, {})", p.x, p.y),
        }
    }
}

impl From<bool> for FeatureValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<usize> for FeatureValue {
    fn from(v: usize) -> Self {
        Self::Int(i64::try_from(v).unwrap_or(i64::MAX))
    }
}

impl From<u32> for FeatureValue {
    fn from(v: u32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<i64> for FeatureValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<&str> for FeatureValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_string())
    }
}

impl From<String> for FeatureValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<Position> for FeatureValue {
    fn from(p: Position) -> Self {
        Self::Point(p)
    }
}

/// Ordered `key -> value` map describing one match.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FeatureRow {
    values: BTreeMap<String, FeatureValue>,
}

impl FeatureRow {
    /// Create an empty row.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<FeatureValue>) {
        self.values.insert(key.into(), value.into());
    }

    /// Look up a value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&FeatureValue> {
        self.values.get(key)
    }

    /// Move every value of `other` into this row under `prefix`.
    pub fn extend_prefixed(&mut self, prefix: &str, other: Self) {
        for (key, value) in other.values {
            self.values.insert(format!("{prefix}{key}"), value);
        }
    }

    /// Iterate in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FeatureValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Keys in order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// Number of values.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Whether the row is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
