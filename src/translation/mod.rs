//! Translation of model metadata into tables and explores.
//!
//! ```text
//! Column ──[dimension]──► Dimension (+ interval expansions, additional dims)
//! Column / Model / DbtMetric ──[metric]──► Metric
//! Model ──[table]──► Table ──[explore]──► Explore
//! ```
//!
//! - [`template`] - `${...}` reference grammar used by field and join SQL
//! - [`dimension`] - DimensionConverter
//! - [`metric`] - MetricConverter and legacy metric reachability
//! - [`table`] - TableCompiler
//! - [`explore`] - ExploreCompiler
//! - [`spotlight`] - spotlight visibility and category resolution

pub mod dimension;
pub mod explore;
pub mod metric;
pub mod spotlight;
pub mod table;
pub mod template;

pub use dimension::{convert_column_dimensions, convert_dimension, resolve_time_intervals};
pub use explore::{ExploreCompiler, ExploreDefinition, ExploreSource};
pub use metric::{
    convert_column_metric, convert_dbt_metric, convert_model_metric, model_can_use_metric,
    usable_metrics,
};
pub use table::{compile_table, convert_table, table_label};
pub use template::{Segment, Template, TemplateError};

use crate::config::SpotlightConfig;
use crate::model::types::StringOrVec;
use crate::sql::builder::WarehouseSqlBuilder;

/// What every converter needs to know about the table being built.
#[derive(Debug, Clone, Copy)]
pub struct TableContext<'a> {
    /// Model (and table) name.
    pub name: &'a str,
    pub label: &'a str,
    pub builder: &'a dyn WarehouseSqlBuilder,
    pub spotlight: &'a SpotlightConfig,
}

/// `groups` when declared, else the single `group_label`.
pub(crate) fn to_groups(groups: Option<&StringOrVec>, group_label: Option<&str>) -> Vec<String> {
    match (groups, group_label) {
        (Some(groups), _) => groups.to_vec(),
        (None, Some(label)) => vec![label.to_string()],
        (None, None) => Vec::new(),
    }
}

/// Optional string-or-list normalised to a list.
pub(crate) fn to_list(value: Option<&StringOrVec>) -> Option<Vec<String>> {
    value.map(StringOrVec::to_vec)
}
