//! BigQuery dialect.
//!
//! BigQuery features:
//! - Backtick identifier quoting
//! - Backslash escapes in string literals
//! - Type-specific truncation (`DATE_TRUNC` vs `TIMESTAMP_TRUNC`) with the unit unquoted
//! - Week starts are expressed as `WEEK(<WEEKDAY>)`
//! - Approximate quantiles instead of ordered-set percentiles

use super::helpers;
use super::SqlDialect;
use crate::model::types::{DimensionType, Weekday};
use crate::sql::time_frames::{DatePart, TimeFrame};

/// BigQuery dialect.
#[derive(Debug, Clone, Copy)]
pub struct BigQuery;

impl SqlDialect for BigQuery {
    fn name(&self) -> &'static str {
        "bigquery"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        helpers::quote_backtick(ident)
    }

    fn escape_string(&self, value: &str) -> String {
        helpers::escape_backslash_quotes(value)
    }

    fn percentile_sql(&self, sql: &str, percentile: f64) -> String {
        format!(
            "APPROX_QUANTILES({}, 100)[OFFSET({})]",
            sql,
            percentile.round() as i64
        )
    }

    fn truncate_sql(
        &self,
        frame: TimeFrame,
        sql: &str,
        source: DimensionType,
        start_of_week: Option<Weekday>,
    ) -> String {
        let function = match source {
            DimensionType::Date => "DATE_TRUNC",
            _ => "TIMESTAMP_TRUNC",
        };
        let unit = match (frame, start_of_week) {
            (TimeFrame::Week, Some(day)) => format!("WEEK({})", day.as_upper()),
            _ => frame.as_str().to_string(),
        };
        format!("{}({}, {})", function, sql, unit)
    }

    fn date_part_sql(&self, part: DatePart, sql: &str) -> String {
        let name = match part {
            DatePart::Year => "YEAR",
            DatePart::Quarter => "QUARTER",
            DatePart::Month => "MONTH",
            DatePart::Week => "WEEK",
            DatePart::DayOfWeek => "DAYOFWEEK",
            DatePart::DayOfMonth => "DAY",
            DatePart::DayOfYear => "DAYOFYEAR",
            DatePart::Hour => "HOUR",
            DatePart::Minute => "MINUTE",
        };
        format!("EXTRACT({} FROM {})", name, sql)
    }

    fn date_name_sql(&self, frame: TimeFrame, sql: &str) -> String {
        match frame {
            TimeFrame::DayOfWeekName => format!("FORMAT_DATETIME('%A', {})", sql),
            TimeFrame::MonthName => format!("FORMAT_DATETIME('%B', {})", sql),
            _ => format!("FORMAT_DATETIME('Q%Q', {})", sql),
        }
    }
}
