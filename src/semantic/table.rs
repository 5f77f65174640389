//! Tables: one per model, holding its dimensions, metrics and lineage.

use indexmap::IndexMap;
use serde::Serialize;

use super::field::{CompiledDimension, CompiledMetric, Dimension, Metric};
use super::filter::ModelFilterRule;
use super::model_graph::LineageGraph;
use crate::model::meta::{GroupDetail, RequiredAttributes};
use crate::model::types::OrderFieldsBy;
use crate::sql::time_frames::TimeFrame;

/// Time dimension a table is charted against by default.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DefaultTimeDimension {
    pub field: String,
    pub interval: TimeFrame,
}

/// A table, generic over its field representation.
///
/// [`Table`] holds fields as converted from model metadata; [`CompiledTable`]
/// holds them with SQL resolved against an explore.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableOf<D, M> {
    pub name: String,
    pub label: String,
    pub database: String,
    pub schema: String,
    pub sql_table: String,
    pub description: String,
    pub dimensions: IndexMap<String, D>,
    pub metrics: IndexMap<String, M>,
    pub lineage_graph: LineageGraph,
    pub order_fields_by: OrderFieldsBy,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_label: Option<String>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub group_details: IndexMap<String, GroupDetail>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sql_where: Option<String>,
    /// `sql_where` as declared, kept once `sql_where` is compiled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uncompiled_sql_where: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_key: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub required_filters: Vec<ModelFilterRule>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub required_attributes: Option<RequiredAttributes>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_time_dimension: Option<DefaultTimeDimension>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_hint: Option<Vec<String>>,
}

pub type Table = TableOf<Dimension, Metric>;
pub type CompiledTable = TableOf<CompiledDimension, CompiledMetric>;

impl<D, M> TableOf<D, M> {
    /// Same table with its fields replaced.
    pub fn with_fields<D2, M2>(
        self,
        dimensions: IndexMap<String, D2>,
        metrics: IndexMap<String, M2>,
    ) -> TableOf<D2, M2> {
        TableOf {
            name: self.name,
            label: self.label,
            database: self.database,
            schema: self.schema,
            sql_table: self.sql_table,
            description: self.description,
            dimensions,
            metrics,
            lineage_graph: self.lineage_graph,
            order_fields_by: self.order_fields_by,
            group_label: self.group_label,
            group_details: self.group_details,
            sql_where: self.sql_where,
            uncompiled_sql_where: self.uncompiled_sql_where,
            primary_key: self.primary_key,
            required_filters: self.required_filters,
            required_attributes: self.required_attributes,
            default_time_dimension: self.default_time_dimension,
            ai_hint: self.ai_hint,
        }
    }

    pub fn field_count(&self) -> usize {
        self.dimensions.len() + self.metrics.len()
    }
}
