//! Databricks (Spark SQL) dialect.
//!
//! Databricks features:
//! - Backtick identifier quoting
//! - Backslash escapes in string literals
//! - `PERCENTILE(x, p)` aggregate
//! - `DATE_FORMAT` patterns for names

use super::helpers;
use super::SqlDialect;
use crate::model::types::{DimensionType, Weekday};
use crate::sql::time_frames::{DatePart, TimeFrame};

/// Databricks (Spark SQL) dialect.
#[derive(Debug, Clone, Copy)]
pub struct Databricks;

impl SqlDialect for Databricks {
    fn name(&self) -> &'static str {
        "databricks"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        helpers::quote_backtick(ident)
    }

    fn escape_string(&self, value: &str) -> String {
        helpers::escape_backslash_quotes(value)
    }

    fn percentile_sql(&self, sql: &str, percentile: f64) -> String {
        format!("PERCENTILE({}, {})", sql, helpers::percentile_fraction(percentile))
    }

    fn truncate_sql(
        &self,
        frame: TimeFrame,
        sql: &str,
        _source: DimensionType,
        start_of_week: Option<Weekday>,
    ) -> String {
        match (frame, helpers::week_shift(start_of_week)) {
            (TimeFrame::Week, Some(shift)) => format!(
                "DATEADD(DAY, {}, DATE_TRUNC('WEEK', DATEADD(DAY, -{}, {})))",
                shift, shift, sql
            ),
            _ => helpers::date_trunc_quoted(frame, sql),
        }
    }

    fn date_part_sql(&self, part: DatePart, sql: &str) -> String {
        let name = match part {
            DatePart::Year => "YEAR",
            DatePart::Quarter => "QUARTER",
            DatePart::Month => "MONTH",
            DatePart::Week => "WEEK",
            DatePart::DayOfWeek => "DAYOFWEEK",
            DatePart::DayOfMonth => "DAY",
            DatePart::DayOfYear => "DOY",
            DatePart::Hour => "HOUR",
            DatePart::Minute => "MINUTE",
        };
        format!("DATE_PART('{}', {})", name, sql)
    }

    fn date_name_sql(&self, frame: TimeFrame, sql: &str) -> String {
        match frame {
            TimeFrame::DayOfWeekName => format!("DATE_FORMAT({}, 'EEEE')", sql),
            TimeFrame::MonthName => format!("DATE_FORMAT({}, 'MMMM')", sql),
            _ => format!("CONCAT('Q', QUARTER({}))", sql),
        }
    }
}
