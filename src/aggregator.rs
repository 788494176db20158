// Merges the system snapshot and scraper outputs into one response document

use crate::models::{MetricMap, MetricValue};
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;
use tracing::warn;

/// A top-level response entry: a flattened metric or a namespaced group.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum OutputValue {
    Metric(MetricValue),
    Group(MetricMap),
}

/// The merged response. Serializes as the plain key/value document; collisions and
/// failures are bookkeeping and never appear in the output.
#[derive(Debug, Default)]
pub struct Aggregate {
    values: BTreeMap<String, OutputValue>,
    collisions: Vec<String>,
    failed: Vec<String>,
}

impl Aggregate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `metrics` under `source`, or each metric at the top level when `flatten`.
    /// The later insertion wins on a key collision.
    pub fn insert(&mut self, source: &str, metrics: MetricMap, flatten: bool) {
        if flatten {
            for (key, value) in metrics {
                self.put(source, key, OutputValue::Metric(value));
            }
        } else {
            self.put(source, source.to_string(), OutputValue::Group(metrics));
        }
    }

    /// Record a source that produced nothing. It contributes no keys.
    pub fn record_failure(&mut self, source: &str) {
        self.failed.push(source.to_string());
    }

    fn put(&mut self, source: &str, key: String, value: OutputValue) {
        if self.values.contains_key(&key) {
            warn!(
                operation = "merge",
                key = %key,
                source,
                "metric key collision, later value wins"
            );
            self.collisions.push(key.clone());
        }
        self.values.insert(key, value);
    }

    pub fn get(&self, key: &str) -> Option<&OutputValue> {
        self.values.get(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Keys that were overwritten, once per collision, in insertion order.
    pub fn collisions(&self) -> &[String] {
        &self.collisions
    }

    pub fn failed(&self) -> &[String] {
        &self.failed
    }
}

impl Serialize for Aggregate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.values.serialize(serializer)
    }
}
