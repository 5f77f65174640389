//! Warehouse SQL builder consumed by the compiler.
//!
//! The compiler never talks to a [`Dialect`] directly; it goes through a
//! [`WarehouseSqlBuilder`], which pairs a dialect with project settings such
//! as the first day of the week. [`DialectSqlBuilder`] is the stock
//! implementation; tests and embedders can supply their own.

use crate::model::types::{DimensionType, MetricType, Weekday};
use crate::sql::dialect::{Dialect, SqlDialect};
use crate::sql::time_frames::TimeFrame;

/// Dialect-specific SQL generation as seen by the compiler.
pub trait WarehouseSqlBuilder: std::fmt::Debug + Send + Sync {
    fn adapter_kind(&self) -> Dialect;

    /// Identifier quote character(s) applied to table references.
    fn quote_identifier(&self, ident: &str) -> String {
        self.adapter_kind().quote_identifier(ident)
    }

    fn metric_sql(&self, sql: &str, metric_type: MetricType, percentile: Option<f64>) -> String {
        self.adapter_kind().metric_sql(sql, metric_type, percentile)
    }

    fn escape_string(&self, value: &str) -> String {
        self.adapter_kind().escape_string(value)
    }

    fn start_of_week(&self) -> Option<Weekday>;

    fn convert_timezone(&self, sql: &str, source_tz: &str, target_tz: &str) -> String {
        self.adapter_kind().convert_timezone(sql, source_tz, target_tz)
    }

    fn time_interval_sql(
        &self,
        frame: TimeFrame,
        sql: &str,
        source: DimensionType,
        start_of_week: Option<Weekday>,
    ) -> String {
        self.adapter_kind()
            .time_interval_sql(frame, sql, source, start_of_week)
    }

    fn time_interval_output_type(&self, frame: TimeFrame, source: DimensionType) -> DimensionType {
        frame.output_type(source)
    }

    fn default_time_intervals(&self, dimension_type: DimensionType) -> Vec<TimeFrame> {
        TimeFrame::defaults_for(dimension_type)
    }
}

/// A [`WarehouseSqlBuilder`] backed by one of the built-in dialects.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DialectSqlBuilder {
    pub dialect: Dialect,
    pub start_of_week: Option<Weekday>,
}

impl DialectSqlBuilder {
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            start_of_week: None,
        }
    }

    pub fn with_start_of_week(mut self, start_of_week: Option<Weekday>) -> Self {
        self.start_of_week = start_of_week;
        self
    }
}

impl WarehouseSqlBuilder for DialectSqlBuilder {
    fn adapter_kind(&self) -> Dialect {
        self.dialect
    }

    fn start_of_week(&self) -> Option<Weekday> {
        self.start_of_week
    }
}
