//! MetricConverter: column-level, model-level and legacy metrics.
//!
//! The three sources are merged into one map in the order legacy, model,
//! column (see `table::convert_table`); this module converts one metric of
//! each kind.

use std::collections::HashSet;

use regex::Regex;

use super::spotlight::metric_spotlight;
use super::{to_groups, to_list, TableContext};
use crate::model::meta::{MetricSpec, SpotlightMeta};
use crate::model::metric::DbtMetric;
use crate::model::types::MetricType;
use crate::semantic::error::{CompileError, CompileResult};
use crate::semantic::field::{default_sql, friendly_name, Dimension, Metric};
use crate::semantic::filter::parse_filters;

fn parse_metric_type(name: &str, table: &str, declared: Option<&str>) -> CompileResult<MetricType> {
    let Some(declared) = declared else {
        return Err(CompileError::MetadataParse(format!(
            "Metric \"{}\" in model \"{}\" has no type",
            name, table
        )));
    };
    declared.parse().map_err(|_| {
        CompileError::MetadataParse(format!(
            "Cannot parse metric \"{}\" in model \"{}\": type \"{}\" is not a valid metric type",
            name, table, declared
        ))
    })
}

/// Shared conversion of a declared metric block.
fn convert_spec(
    ctx: &TableContext<'_>,
    name: &str,
    spec: &MetricSpec,
    type_: MetricType,
    sql: String,
    model_spotlight: Option<&SpotlightMeta>,
) -> CompileResult<Metric> {
    let filters = match &spec.filters {
        Some(filters) => parse_filters(filters)?,
        None => Vec::new(),
    };
    Ok(Metric {
        index: 0,
        name: name.to_string(),
        label: spec.label.clone().unwrap_or_else(|| friendly_name(name)),
        table: ctx.name.to_string(),
        table_label: ctx.label.to_string(),
        sql,
        type_,
        description: spec.description.clone(),
        hidden: spec.hidden.unwrap_or(false),
        format: spec.format.clone(),
        round: spec.round,
        compact: spec.compact.clone(),
        groups: to_groups(spec.groups.as_ref(), spec.group_label.as_deref()),
        percentile: spec.percentile,
        filters,
        show_underlying_values: spec.show_underlying_values.clone(),
        dimension_reference: None,
        urls: spec.urls.clone(),
        tags: to_list(spec.tags.as_ref()),
        ai_hint: to_list(spec.ai_hint.as_ref()),
        required_attributes: spec.required_attributes.clone(),
        spotlight: Some(metric_spotlight(
            name,
            spec.spotlight.as_ref(),
            model_spotlight,
            ctx.spotlight,
        )?),
    })
}

/// A metric declared under a column; reads the column's base dimension
/// unless it declares its own SQL.
pub fn convert_column_metric(
    ctx: &TableContext<'_>,
    dimension: &Dimension,
    name: &str,
    spec: &MetricSpec,
    model_spotlight: Option<&SpotlightMeta>,
) -> CompileResult<Metric> {
    let type_ = parse_metric_type(name, ctx.name, spec.type_.as_deref())?;
    let sql = spec.sql.clone().unwrap_or_else(|| dimension.sql.clone());
    let mut metric = convert_spec(ctx, name, spec, type_, sql, model_spotlight)?;
    metric.dimension_reference = Some(dimension.name.clone());
    if metric.required_attributes.is_none() {
        metric.required_attributes = dimension.required_attributes.clone();
    }
    Ok(metric)
}

/// A metric declared on the model itself.
///
/// Model-level metrics must declare SQL, except `count`, which counts rows.
pub fn convert_model_metric(
    ctx: &TableContext<'_>,
    name: &str,
    spec: &MetricSpec,
    model_spotlight: Option<&SpotlightMeta>,
) -> CompileResult<Metric> {
    let type_ = parse_metric_type(name, ctx.name, spec.type_.as_deref())?;
    let sql = match (&spec.sql, type_) {
        (Some(sql), _) => sql.clone(),
        (None, MetricType::Count) => "*".to_string(),
        (None, _) => {
            return Err(CompileError::MetadataParse(format!(
                "Metric \"{}\" in model \"{}\" must declare sql",
                name, ctx.name
            )))
        }
    };
    convert_spec(ctx, name, spec, type_, sql, model_spotlight)
}

/// Replace every whole-word occurrence of each name with `${name}`.
fn substitute_metric_names(expression: &str, names: &[&str]) -> CompileResult<String> {
    let mut sql = expression.to_string();
    for name in names {
        let pattern = Regex::new(&format!(r"\b{}\b", regex::escape(name)))
            .map_err(|e| CompileError::MetadataParse(e.to_string()))?;
        let replacement = format!("${{{}}}", name);
        sql = pattern
            .replace_all(&sql, regex::NoExpand(&replacement))
            .into_owned();
    }
    Ok(sql)
}

fn is_single_column(expression: &str) -> bool {
    !expression.is_empty()
        && expression
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_')
}

/// A metric in the legacy standalone format.
pub fn convert_dbt_metric(
    ctx: &TableContext<'_>,
    metric: &DbtMetric,
    model_spotlight: Option<&SpotlightMeta>,
) -> CompileResult<Metric> {
    let (type_, mut sql) = if metric.is_derived() {
        let Some(expression) = metric.expression.as_deref() else {
            return Err(CompileError::MetadataParse(format!(
                "Derived metric \"{}\" must have the expression field set",
                metric.name
            )));
        };
        let sql = substitute_metric_names(expression, &metric.referenced_metric_names())?;
        (MetricType::Number, sql)
    } else {
        let type_: MetricType = metric.calculation_method.parse().map_err(|_| {
            CompileError::MetadataParse(format!(
                "Cannot parse metric \"{}\": type {} is not a valid metric type",
                metric.display_id(),
                metric.calculation_method
            ))
        })?;
        let sql = match metric.expression.as_deref() {
            Some(expression) if is_single_column(expression) => default_sql(expression),
            Some(expression) => expression.to_string(),
            None => default_sql(&metric.name),
        };
        (type_, sql)
    };

    if !metric.filters.is_empty() {
        let conditions: Vec<String> = metric
            .filters
            .iter()
            .map(|f| format!("(${{TABLE}}.{} {} {})", f.field, f.operator, f.value))
            .collect();
        sql = format!(
            "CASE WHEN {} THEN {} ELSE NULL END",
            conditions.join(" AND "),
            sql
        );
    }

    let spec = MetricSpec {
        label: metric.label.clone().or_else(|| metric.meta.label.clone()),
        description: metric.description.clone(),
        spotlight: None,
        ..metric.meta.clone()
    };
    convert_spec(ctx, &metric.name, &spec, type_, sql, model_spotlight)
}

/// Whether a legacy metric can be attached to `model_name`.
///
/// A metric is usable when its first ref names the model, or when it is
/// derived and every metric it is composed from is usable. A metric reached
/// again while its own derivation is being checked is not usable.
pub fn model_can_use_metric(metric_name: &str, model_name: &str, metrics: &[DbtMetric]) -> bool {
    fn visit<'a>(
        metric_name: &'a str,
        model_name: &str,
        metrics: &'a [DbtMetric],
        visiting: &mut HashSet<&'a str>,
    ) -> bool {
        let Some(metric) = metrics.iter().find(|m| m.name == metric_name) else {
            return false;
        };
        if metric.model_ref() == Some(model_name) {
            return true;
        }
        if !metric.is_derived() || !visiting.insert(metric.name.as_str()) {
            return false;
        }
        let usable = metric
            .referenced_metric_names()
            .into_iter()
            .all(|name| visit(name, model_name, metrics, visiting));
        visiting.remove(metric.name.as_str());
        usable
    }

    visit(metric_name, model_name, metrics, &mut HashSet::new())
}

/// Legacy metrics usable by a model, in declaration order.
pub fn usable_metrics<'a>(model_name: &str, metrics: &'a [DbtMetric]) -> Vec<&'a DbtMetric> {
    metrics
        .iter()
        .filter(|metric| model_can_use_metric(&metric.name, model_name, metrics))
        .collect()
}
