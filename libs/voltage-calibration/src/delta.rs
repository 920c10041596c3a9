//! Delta batches
//!
//! A delta carries one or more updates; each update is tagged with the data
//! source it came from and holds a list of `(path, value)` samples. Fields
//! not used by calibration are kept in `extra` so they pass through the
//! pipeline unchanged.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One batch of updates
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Delta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,

    /// Missing `updates` is treated as an empty batch
    #[serde(default)]
    pub updates: Vec<Update>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Samples from a single source
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Update {
    /// Source identifier (`$source` on the wire)
    #[serde(rename = "$source", default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,

    /// Missing `values` is treated as no samples
    #[serde(default)]
    pub values: Vec<PathValue>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One sample
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathValue {
    pub path: String,
    pub value: Value,
}

impl Delta {
    pub fn new(updates: Vec<Update>) -> Self {
        Self {
            updates,
            ..Default::default()
        }
    }

    /// Total number of samples across all updates
    pub fn sample_count(&self) -> usize {
        self.updates.iter().map(|u| u.values.len()).sum()
    }
}

impl Update {
    pub fn new(source: Option<&str>, values: Vec<PathValue>) -> Self {
        Self {
            source: source.map(str::to_string),
            values,
            ..Default::default()
        }
    }
}

impl PathValue {
    pub fn new(path: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            path: path.into(),
            value: value.into(),
        }
    }

    /// Numeric view of the value, if it is a number
    pub fn as_f64(&self) -> Option<f64> {
        self.value.as_f64()
    }
}
