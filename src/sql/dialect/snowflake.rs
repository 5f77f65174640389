//! Snowflake dialect.
//!
//! Snowflake features:
//! - ANSI identifier quoting (`"`)
//! - Timestamps are normalised to UTC (`TIMESTAMP_NTZ`) before bucketing
//! - `DATEADD` for week-start shifts
//! - `DAYNAME` / `MONTHNAME` name functions

use super::helpers;
use super::SqlDialect;
use crate::model::types::{DimensionType, Weekday};
use crate::sql::time_frames::{DatePart, TimeFrame};

/// Snowflake dialect.
#[derive(Debug, Clone, Copy)]
pub struct Snowflake;

impl SqlDialect for Snowflake {
    fn name(&self) -> &'static str {
        "snowflake"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        helpers::quote_double(ident)
    }

    /// Always normalises to UTC regardless of the requested zones.
    fn convert_timezone(&self, sql: &str, _source_tz: &str, _target_tz: &str) -> String {
        format!("TO_TIMESTAMP_NTZ(CONVERT_TIMEZONE('UTC', {}))", sql)
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
            DatePart::DayOfYear => "DAYOFYEAR",
            DatePart::Hour => "HOUR",
            DatePart::Minute => "MINUTE",
        };
        format!("DATE_PART('{}', {})", name, sql)
    }

    fn date_name_sql(&self, frame: TimeFrame, sql: &str) -> String {
        match frame {
            TimeFrame::DayOfWeekName => format!("DAYNAME({})", sql),
            TimeFrame::MonthName => format!("MONTHNAME({})", sql),
            _ => format!("'Q' || QUARTER({})", sql),
        }
    }
}
