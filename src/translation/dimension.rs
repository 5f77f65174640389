//! DimensionConverter: one annotated column into its dimensions.
//!
//! A column yields its base dimension, one dimension per time interval when
//! the base is an interval base, and every additional dimension declared
//! under `additional_dimensions` (again with interval expansions).

use indexmap::IndexMap;

use super::{to_groups, to_list, TableContext};
use crate::model::meta::{DimensionMeta, TimeIntervalsSpec};
use crate::model::types::DimensionType;
use crate::model::Column;
use crate::semantic::error::{CollisionKind, CompileError, CompileResult};
use crate::semantic::field::{default_sql, friendly_name, Dimension};
use crate::sql::time_frames::TimeFrame;

/// Timezone every timestamp is normalised from and to.
const DEFAULT_TIMEZONE: &str = "UTC";

/// Convert one column into one dimension.
///
/// `meta` is the column's resolved `dimension` block. With `time_interval`
/// set, the dimension is the interval expansion of the column.
pub fn convert_dimension(
    ctx: &TableContext<'_>,
    index: usize,
    column: &Column,
    meta: &DimensionMeta,
    time_interval: Option<TimeFrame>,
    is_additional_dimension: bool,
) -> CompileResult<Dimension> {
    let declared = meta
        .type_
        .as_deref()
        .or(column.data_type.as_deref())
        .unwrap_or(DimensionType::String.as_str());
    let mut type_: DimensionType = declared.parse().map_err(|_| {
        CompileError::MetadataParse(format!(
            "Could not recognise type \"{}\" for dimension \"{}\" in model \"{}\". Valid types are: {}",
            declared,
            column.name,
            ctx.name,
            DimensionType::valid_values()
        ))
    })?;

    let mut name = meta.name.clone().unwrap_or_else(|| column.name.clone());
    let mut sql = meta.sql.clone().unwrap_or_else(|| default_sql(&column.name));
    let mut label = meta.label.clone().unwrap_or_else(|| friendly_name(&name));
    if type_ == DimensionType::Timestamp {
        sql = ctx
            .builder
            .convert_timezone(&sql, DEFAULT_TIMEZONE, DEFAULT_TIMEZONE);
    }

    let disabled = meta.time_intervals.as_ref().is_some_and(TimeIntervalsSpec::is_off);
    let is_interval_base = time_interval.is_none() && type_.is_temporal() && !disabled;

    let mut groups = to_groups(meta.groups.as_ref(), meta.group_label.as_deref());
    let mut time_interval_base_dimension_name = None;

    if let Some(frame) = time_interval {
        let builder = ctx.builder;
        sql = builder.time_interval_sql(frame, &sql, type_, builder.start_of_week());
        groups.push(meta.label.clone().unwrap_or_else(|| friendly_name(&name)));
        label = format!("{} {}", label, frame.label().to_lowercase());
        type_ = builder.time_interval_output_type(frame, type_);
        time_interval_base_dimension_name = Some(name);
        name = format!("{}_{}", column.name, frame.suffix());
    }

    Ok(Dimension {
        index,
        name,
        label,
        table: ctx.name.to_string(),
        table_label: ctx.label.to_string(),
        sql,
        type_,
        description: meta.description.clone().or_else(|| column.description.clone()),
        hidden: meta.hidden.unwrap_or(false),
        format: meta.format.clone(),
        round: meta.round,
        compact: meta.compact.clone(),
        groups,
        time_interval,
        time_interval_base_dimension_name,
        is_interval_base,
        is_additional_dimension,
        colors: meta.colors.clone(),
        urls: meta.urls.clone(),
        tags: to_list(meta.tags.as_ref()),
        ai_hint: to_list(meta.ai_hint.as_ref()),
        required_attributes: meta.required_attributes.clone(),
    })
}

/// Intervals generated for an interval base.
///
/// A declared list is validated and used as is; otherwise the builder's
/// default set for the dimension type applies.
pub fn resolve_time_intervals(
    ctx: &TableContext<'_>,
    dimension: &Dimension,
    spec: Option<&TimeIntervalsSpec>,
) -> CompileResult<Vec<TimeFrame>> {
    let invalid = |value: &str| {
        CompileError::MetadataParse(format!(
            "Invalid time interval \"{}\" for dimension \"{}\" in model \"{}\". Valid intervals are: {}",
            value,
            dimension.name,
            ctx.name,
            TimeFrame::valid_values()
        ))
    };

    match spec {
        Some(TimeIntervalsSpec::List(values)) => values
            .iter()
            .map(|value| value.parse::<TimeFrame>().map_err(|_| invalid(value)))
            .collect(),
        Some(TimeIntervalsSpec::Keyword(keyword)) if !keyword.eq_ignore_ascii_case("default") => {
            Err(invalid(keyword))
        }
        _ => Ok(ctx.builder.default_time_intervals(dimension.type_)),
    }
}

fn insert_unique(
    ctx: &TableContext<'_>,
    dimensions: &mut IndexMap<String, Dimension>,
    dimension: Dimension,
) -> CompileResult<()> {
    if dimensions.contains_key(&dimension.name) {
        return Err(CompileError::NameCollision {
            table: ctx.name.to_string(),
            kind: CollisionKind::Dimensions,
            names: vec![dimension.name],
        });
    }
    dimensions.insert(dimension.name.clone(), dimension);
    Ok(())
}

/// Base dimension plus its interval expansions.
fn convert_with_intervals(
    ctx: &TableContext<'_>,
    index: usize,
    column: &Column,
    meta: &DimensionMeta,
    is_additional_dimension: bool,
    dimensions: &mut IndexMap<String, Dimension>,
) -> CompileResult<Dimension> {
    let base = convert_dimension(ctx, index, column, meta, None, is_additional_dimension)?;
    let intervals = if base.is_interval_base {
        resolve_time_intervals(ctx, &base, meta.time_intervals.as_ref())?
    } else {
        Vec::new()
    };

    insert_unique(ctx, dimensions, base.clone())?;
    for frame in intervals {
        let expanded =
            convert_dimension(ctx, index, column, meta, Some(frame), is_additional_dimension)?;
        insert_unique(ctx, dimensions, expanded)?;
    }
    Ok(base)
}

/// Every dimension a column produces, keyed by name.
///
/// Returns the base dimension separately so column-level metrics can read
/// from it.
pub fn convert_column_dimensions(
    ctx: &TableContext<'_>,
    index: usize,
    column: &Column,
    dimensions: &mut IndexMap<String, Dimension>,
) -> CompileResult<Dimension> {
    let column_meta = column.resolved_meta();
    let meta = column_meta.dimension.unwrap_or_default();
    let base = convert_with_intervals(ctx, index, column, &meta, false, dimensions)?;

    for (name, additional) in &column_meta.additional_dimensions {
        let synthetic = Column {
            name: name.clone(),
            ..column.clone()
        };
        convert_with_intervals(ctx, index, &synthetic, additional, true, dimensions)?;
    }

    tracing::trace!(
        table = ctx.name,
        column = %column.name,
        total = dimensions.len(),
        "converted column dimensions"
    );
    Ok(base)
}
