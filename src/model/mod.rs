//! Input shape: models, columns and legacy metrics as materialized from the
//! transformation-project manifest.

pub mod column;
pub mod meta;
pub mod metric;
pub mod types;

pub use column::{Column, ColumnConfig};
pub use meta::{
    ColumnMeta, DefaultTimeDimensionSpec, DimensionMeta, ExploreSpec, FieldUrl, GroupDetail,
    JoinSpec, MetricSpec, ModelMeta, Overlay, RequiredAttributes, SpotlightMeta,
    TimeIntervalsSpec,
};
pub use metric::{DbtMetric, DbtMetricFilter, MetricRef};
pub use types::{
    DimensionType, JoinRelationship, JoinType, MetricType, OrderFieldsBy, StringOrVec,
    Visibility, Weekday,
};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// One model of the project; maps to a physical relation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Model {
    /// Graph identifier (e.g. `model.shop.orders`). Defaults to `model.<name>`.
    #[serde(default)]
    pub unique_id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub alias: Option<String>,
    #[serde(default)]
    pub database: String,
    #[serde(default)]
    pub schema: String,
    #[serde(default)]
    pub relation_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub columns: IndexMap<String, Column>,
    #[serde(default)]
    pub meta: ModelMeta,
    #[serde(default)]
    pub config: ModelConfig,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub depends_on: DependsOn,
    #[serde(default)]
    pub patch_path: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
}

/// `config` block of a model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub meta: ModelMeta,
    pub tags: Option<StringOrVec>,
    pub snowflake_warehouse: Option<String>,
    pub databricks_compute: Option<String>,
}

/// Declared upstream references.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DependsOn {
    pub nodes: Vec<String>,
}

impl Model {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Identifier of this model in the lineage graph.
    pub fn node_id(&self) -> String {
        self.unique_id
            .clone()
            .unwrap_or_else(|| format!("model.{}", self.name))
    }

    /// Relation name as it appears in the warehouse catalog.
    pub fn warehouse_table_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }

    /// `meta` overlaid by `config.meta`.
    pub fn resolved_meta(&self) -> ModelMeta {
        self.meta.clone().overlay(self.config.meta.clone())
    }

    /// `config.tags` when non-empty, otherwise the model tags.
    pub fn resolved_tags(&self) -> Vec<String> {
        match &self.config.tags {
            Some(tags) if !tags.is_empty() => tags.to_vec(),
            _ => self.tags.clone(),
        }
    }

    /// Path of the YAML patch, without its `project://` prefix.
    pub fn yml_path(&self) -> Option<String> {
        self.patch_path
            .as_deref()
            .and_then(|p| p.split("://").nth(1))
            .map(|p| p.to_string())
    }
}
