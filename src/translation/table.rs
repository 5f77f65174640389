//! TableCompiler: one model into one table.

use indexmap::IndexMap;

use super::dimension::convert_column_dimensions;
use super::metric::{convert_column_metric, convert_dbt_metric, convert_model_metric};
use super::{to_list, TableContext};
use crate::config::SpotlightConfig;
use crate::model::metric::DbtMetric;
use crate::model::types::OrderFieldsBy;
use crate::model::Model;
use crate::semantic::error::{CollisionKind, CompileError, CompileResult};
use crate::semantic::field::{friendly_name, Dimension, Metric};
use crate::semantic::filter::parse_model_filters;
use crate::semantic::model_graph::ModelGraph;
use crate::semantic::table::{DefaultTimeDimension, Table};
use crate::sql::builder::WarehouseSqlBuilder;
use crate::sql::time_frames::TimeFrame;

/// Label of a model's table: declared label, else its friendly name.
pub fn table_label(model: &Model) -> String {
    model
        .resolved_meta()
        .label
        .unwrap_or_else(|| friendly_name(&model.name))
}

/// Convert a model, without lineage.
///
/// `legacy_metrics` are the standalone metrics usable by this model.
pub fn convert_table(
    model: &Model,
    legacy_metrics: &[&DbtMetric],
    builder: &dyn WarehouseSqlBuilder,
    spotlight: &SpotlightConfig,
) -> CompileResult<Table> {
    let meta = model.resolved_meta();
    let label = meta
        .label
        .clone()
        .unwrap_or_else(|| friendly_name(&model.name));
    let ctx = TableContext {
        name: &model.name,
        label: &label,
        builder,
        spotlight,
    };
    let model_spotlight = meta.spotlight.as_ref();

    let mut dimensions: IndexMap<String, Dimension> = IndexMap::new();
    let mut column_metrics: IndexMap<String, Metric> = IndexMap::new();
    for (index, column) in model.columns.values().enumerate() {
        let base = convert_column_dimensions(&ctx, index, column, &mut dimensions)?;
        for (name, spec) in &column.resolved_meta().metrics {
            let metric = convert_column_metric(&ctx, &base, name, spec, model_spotlight)?;
            column_metrics.insert(name.clone(), metric);
        }
    }

    let mut metrics: IndexMap<String, Metric> = IndexMap::new();
    for metric in legacy_metrics {
        let converted = convert_dbt_metric(&ctx, metric, model_spotlight)?;
        metrics.insert(converted.name.clone(), converted);
    }
    for (name, spec) in &meta.metrics {
        let converted = convert_model_metric(&ctx, name, spec, model_spotlight)?;
        metrics.insert(name.clone(), converted);
    }
    metrics.extend(column_metrics);
    for (index, metric) in metrics.values_mut().enumerate() {
        metric.index = index;
    }

    let duplicated: Vec<String> = metrics
        .keys()
        .filter(|name| dimensions.contains_key(*name))
        .cloned()
        .collect();
    if !duplicated.is_empty() {
        return Err(CompileError::NameCollision {
            table: model.name.clone(),
            kind: CollisionKind::MetricAndDimension,
            names: duplicated,
        });
    }

    let Some(relation_name) = model.relation_name.clone() else {
        return Err(CompileError::NoDimensionsFound(format!(
            "Model \"{}\" has no table relation",
            model.name
        )));
    };
    if dimensions.is_empty() {
        return Err(CompileError::NoDimensionsFound(format!(
            "Model \"{}\" has no dimensions",
            model.name
        )));
    }

    let default_time_dimension = match &meta.default_time_dimension {
        Some(declared) => Some(DefaultTimeDimension {
            field: declared.field.clone(),
            interval: declared.interval.parse::<TimeFrame>().map_err(|_| {
                CompileError::MetadataParse(format!(
                    "Invalid default time dimension interval \"{}\" in model \"{}\". Valid intervals are: {}",
                    declared.interval,
                    model.name,
                    TimeFrame::valid_values()
                ))
            })?,
        }),
        None => None,
    };

    Ok(Table {
        name: model.name.clone(),
        label,
        database: model.database.clone(),
        schema: model.schema.clone(),
        sql_table: meta.sql_from.clone().unwrap_or(relation_name),
        description: model
            .description
            .clone()
            .unwrap_or_else(|| format!("{} table", model.name)),
        dimensions,
        metrics,
        lineage_graph: IndexMap::new(),
        order_fields_by: OrderFieldsBy::parse_or_default(meta.order_fields_by.as_deref()),
        group_label: meta.group_label.clone(),
        group_details: meta.group_details.clone(),
        sql_where: meta.sql_filter.clone().or_else(|| meta.sql_where.clone()),
        uncompiled_sql_where: None,
        primary_key: to_list(meta.primary_key.as_ref()),
        required_filters: parse_model_filters(
            meta.required_filters.as_deref(),
            meta.default_filters.as_deref(),
        )?,
        required_attributes: meta.required_attributes.clone(),
        default_time_dimension,
        ai_hint: to_list(meta.ai_hint.as_ref()),
    })
}

/// Convert a model and attach its lineage from the project graph.
pub fn compile_table(
    model: &Model,
    legacy_metrics: &[&DbtMetric],
    graph: &ModelGraph,
    builder: &dyn WarehouseSqlBuilder,
    spotlight: &SpotlightConfig,
) -> CompileResult<Table> {
    let mut table = convert_table(model, legacy_metrics, builder, spotlight)?;
    table.lineage_graph = graph.lineage_for(model);
    tracing::debug!(
        table = %table.name,
        dimensions = table.dimensions.len(),
        metrics = table.metrics.len(),
        "compiled table"
    );
    Ok(table)
}
