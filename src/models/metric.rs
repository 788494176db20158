// Metric values and mappings shared by the system collector, scrapers and the aggregator

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One metric keyed by name. Ordered so the JSON document is stable between requests.
pub type MetricMap = BTreeMap<String, MetricValue>;

/// A single metric value; serializes untagged (plain JSON number, string or array).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricValue {
    /// Unsigned counter or count (bytes, packets, processes). Never rounded.
    Count(u64),
    Number(f64),
    Text(String),
    List(Vec<f64>),
}

impl MetricValue {
    /// Numeric view used by `calculate` transforms. Numeric strings count as numbers.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            MetricValue::Count(c) => Some(*c as f64),
            MetricValue::Number(n) => Some(*n),
            MetricValue::Text(s) => s.trim().parse::<f64>().ok(),
            MetricValue::List(_) => None,
        }
    }

    /// Convert a resolved JSON value. Booleans, nulls, objects and non-numeric arrays
    /// have no metric form and yield `None`.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Number(n) => match n.as_u64() {
                Some(c) => Some(MetricValue::Count(c)),
                None => n.as_f64().map(MetricValue::Number),
            },
            serde_json::Value::String(s) => Some(MetricValue::Text(s.clone())),
            serde_json::Value::Array(items) => items
                .iter()
                .map(|v| v.as_f64())
                .collect::<Option<Vec<f64>>>()
                .map(MetricValue::List),
            _ => None,
        }
    }
}

impl From<u64> for MetricValue {
    fn from(v: u64) -> Self {
        MetricValue::Count(v)
    }
}

impl From<f64> for MetricValue {
    fn from(v: f64) -> Self {
        MetricValue::Number(v)
    }
}

impl From<String> for MetricValue {
    fn from(v: String) -> Self {
        MetricValue::Text(v)
    }
}

impl From<Vec<f64>> for MetricValue {
    fn from(v: Vec<f64>) -> Self {
        MetricValue::List(v)
    }
}

/// Round half-up to `precision` decimals.
pub fn round_to(value: f64, precision: u32) -> f64 {
    let ratio = 10f64.powi(precision as i32);
    (value * ratio + 0.5).floor() / ratio
}

pub const BYTES_PER_MB: f64 = 1_048_576.0;
pub const BYTES_PER_GB: f64 = 1_073_741_824.0;

/// Bytes to megabytes, rounded to 2 decimals after conversion.
pub fn bytes_to_mb(bytes: u64) -> f64 {
    round_to(bytes as f64 / BYTES_PER_MB, 2)
}

/// Bytes to gigabytes, rounded to 2 decimals after conversion.
pub fn bytes_to_gb(bytes: u64) -> f64 {
    round_to(bytes as f64 / BYTES_PER_GB, 2)
}
