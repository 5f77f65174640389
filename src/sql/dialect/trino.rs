//! Trino dialect.
//!
//! Trino features:
//! - ANSI identifier quoting (`"`)
//! - Standard string escaping (backslashes are literal)
//! - `APPROX_PERCENTILE(x, p)` aggregate
//! - `DATE_ADD('unit', n, x)` for week-start shifts
//! - `EXTRACT(... FROM x)` for date parts

use super::helpers;
use super::SqlDialect;
use crate::model::types::{DimensionType, Weekday};
use crate::sql::time_frames::{DatePart, TimeFrame};

/// Trino dialect.
#[derive(Debug, Clone, Copy)]
pub struct Trino;

impl SqlDialect for Trino {
    fn name(&self) -> &'static str {
        "trino"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        helpers::quote_double(ident)
    }

    fn escape_string(&self, value: &str) -> String {
        helpers::escape_standard(value)
    }

    fn percentile_sql(&self, sql: &str, percentile: f64) -> String {
        format!(
            "APPROX_PERCENTILE({}, {})",
            sql,
            helpers::percentile_fraction(percentile)
        )
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
                "DATE_ADD('day', {}, DATE_TRUNC('WEEK', DATE_ADD('day', -{}, {})))",
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
            DatePart::DayOfWeek => "DAY_OF_WEEK",
            DatePart::DayOfMonth => "DAY",
            DatePart::DayOfYear => "DAY_OF_YEAR",
            DatePart::Hour => "HOUR",
            DatePart::Minute => "MINUTE",
        };
        format!("EXTRACT({} FROM {})", name, sql)
    }

    fn date_name_sql(&self, frame: TimeFrame, sql: &str) -> String {
        match frame {
            TimeFrame::DayOfWeekName => format!("FORMAT_DATETIME({}, 'EEEE')", sql),
            TimeFrame::MonthName => format!("FORMAT_DATETIME({}, 'MMMM')", sql),
            _ => format!("CONCAT('Q', CAST(QUARTER({}) AS VARCHAR))", sql),
        }
    }
}
