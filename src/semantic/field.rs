//! Selectable fields: dimensions and metrics, raw and compiled.

use indexmap::IndexMap;
use inflector::Inflector;
use serde::Serialize;
use std::ops::{Deref, DerefMut};

use super::filter::MetricFilterRule;
use crate::model::meta::{FieldUrl, RequiredAttributes};
use crate::model::types::{DimensionType, MetricType, Visibility};
use crate::sql::time_frames::TimeFrame;

/// Placeholder for the owning table in field SQL.
pub const TABLE_PLACEHOLDER: &str = "${TABLE}";

/// `snake_case` / `camelCase` identifier as a sentence-cased label.
pub fn friendly_name(name: &str) -> String {
    name.to_sentence_case()
}

/// SQL of a field reading the physical column of its own table.
pub fn default_sql(column: &str) -> String {
    format!("{}.{}", TABLE_PLACEHOLDER, column)
}

/// Operations shared by dimensions and metrics.
pub trait Field {
    fn name(&self) -> &str;
    fn table(&self) -> &str;
    fn required_attributes(&self) -> Option<&RequiredAttributes>;
    /// Move the field onto another table, as done for aliased joins.
    fn reown(&mut self, table: &str, table_label: &str);
    fn hide(&mut self);
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dimension {
    pub index: usize,
    pub name: String,
    pub label: String,
    pub table: String,
    pub table_label: String,
    pub sql: String,
    #[serde(rename = "type")]
    pub type_: DimensionType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub hidden: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub round: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compact: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_interval: Option<TimeFrame>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_interval_base_dimension_name: Option<String>,
    pub is_interval_base: bool,
    pub is_additional_dimension: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub colors: Option<IndexMap<String, String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub urls: Option<Vec<FieldUrl>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_hint: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required_attributes: Option<RequiredAttributes>,
}

/// Spotlight placement of a metric or explore.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Spotlight {
    pub visibility: Visibility,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metric {
    pub index: usize,
    pub name: String,
    pub label: String,
    pub table: String,
    pub table_label: String,
    pub sql: String,
    #[serde(rename = "type")]
    pub type_: MetricType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub hidden: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub round: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compact: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percentile: Option<f64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub filters: Vec<MetricFilterRule>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_underlying_values: Option<Vec<String>>,
    /// Dimension the metric was declared on, for column-level metrics.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimension_reference: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub urls: Option<Vec<FieldUrl>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_hint: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required_attributes: Option<RequiredAttributes>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spotlight: Option<Spotlight>,
}

impl Field for Dimension {
    fn name(&self) -> &str {
        &self.name
    }

    fn table(&self) -> &str {
        &self.table
    }

    fn required_attributes(&self) -> Option<&RequiredAttributes> {
        self.required_attributes.as_ref()
    }

    fn reown(&mut self, table: &str, table_label: &str) {
        self.table = table.to_string();
        self.table_label = table_label.to_string();
    }

    fn hide(&mut self) {
        self.hidden = true;
    }
}

impl Field for Metric {
    fn name(&self) -> &str {
        &self.name
    }

    fn table(&self) -> &str {
        &self.table
    }

    fn required_attributes(&self) -> Option<&RequiredAttributes> {
        self.required_attributes.as_ref()
    }

    fn reown(&mut self, table: &str, table_label: &str) {
        self.table = table.to_string();
        self.table_label = table_label.to_string();
    }

    fn hide(&mut self) {
        self.hidden = true;
    }
}

// ============================================================================
// Compiled fields
// ============================================================================

/// A field with its SQL template resolved against an explore.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Compiled<F> {
    #[serde(flatten)]
    pub field: F,
    pub compiled_sql: String,
    /// Tables the compiled SQL reads from, own table first.
    pub tables_references: Vec<String>,
}

pub type CompiledDimension = Compiled<Dimension>;
pub type CompiledMetric = Compiled<Metric>;

impl<F> Deref for Compiled<F> {
    type Target = F;

    fn deref(&self) -> &F {
        &self.field
    }
}

impl<F> DerefMut for Compiled<F> {
    fn deref_mut(&mut self) -> &mut F {
        &mut self.field
    }
}

impl<F: Field> Field for Compiled<F> {
    fn name(&self) -> &str {
        self.field.name()
    }

    fn table(&self) -> &str {
        self.field.table()
    }

    fn required_attributes(&self) -> Option<&RequiredAttributes> {
        self.field.required_attributes()
    }

    fn reown(&mut self, table: &str, table_label: &str) {
        self.field.reown(table, table_label)
    }

    fn hide(&mut self) {
        self.field.hide()
    }
}
