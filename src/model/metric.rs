// src/model/metric.rs
use serde::{Deserialize, Serialize};

use super::meta::MetricSpec;

/// Calculation method marking a metric composed from other metrics.
pub const DERIVED_CALCULATION_METHOD: &str = "derived";

/// A metric in the legacy standalone format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DbtMetric {
    #[serde(default)]
    pub unique_id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub calculation_method: String,
    #[serde(default)]
    pub expression: Option<String>,
    #[serde(default)]
    pub filters: Vec<DbtMetricFilter>,
    /// Referenced metrics, each `[name, ...]`.
    #[serde(default)]
    pub metrics: Vec<Vec<String>>,
    #[serde(default)]
    pub refs: Vec<MetricRef>,
    #[serde(default)]
    pub meta: MetricSpec,
}

impl DbtMetric {
    pub fn is_derived(&self) -> bool {
        self.calculation_method == DERIVED_CALCULATION_METHOD
    }

    /// Names of the metrics this one is composed from, deduplicated in order.
    pub fn referenced_metric_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for name in self.metrics.iter().filter_map(|m| m.first()) {
            if !names.contains(&name.as_str()) {
                names.push(name);
            }
        }
        names
    }

    /// Model named by the first declared ref, if any.
    pub fn model_ref(&self) -> Option<&str> {
        self.refs.first().and_then(MetricRef::model_name)
    }

    pub fn display_id(&self) -> &str {
        self.unique_id.as_deref().unwrap_or(&self.name)
    }
}

/// A `WHERE`-style predicate on a legacy metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DbtMetricFilter {
    pub field: String,
    pub operator: String,
    pub value: String,
}

/// Reference from a metric to the model it is defined on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetricRef {
    Named {
        name: String,
        #[serde(default)]
        package: Option<String>,
        #[serde(default)]
        version: Option<serde_json::Value>,
    },
    Legacy(Vec<String>),
}

impl MetricRef {
    pub fn model_name(&self) -> Option<&str> {
        match self {
            MetricRef::Named { name, .. } => Some(name),
            MetricRef::Legacy(parts) => parts.first().map(|s| s.as_str()),
        }
    }
}
