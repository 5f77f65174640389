//! Warehouse SQL dialects.
//!
//! This module provides a trait-based abstraction for the warehouse-specific
//! SQL fragments the compiler emits. Each dialect implements `SqlDialect`:
//!
//! - Identifier quoting: `"` (Postgres/Redshift/Snowflake/Trino), `` ` `` (BigQuery/Databricks)
//! - String escaping: doubled quotes vs backslash escapes
//! - Metric aggregates: AVG, percentiles and medians
//! - Time intervals: truncation, date parts and names
//! - Timezone normalisation of timestamp columns
//!
//! # Usage
//!
//! ```ignore
//! use canopy::sql::dialect::{Dialect, SqlDialect};
//!
//! let dialect = Dialect::Snowflake;
//! let quoted = dialect.quote_identifier("orders");  // "orders"
//! ```
//!
//! # Percentiles
//!
//! | Dialect    | Percentile SQL                                   |
//! |------------|--------------------------------------------------|
//! | Postgres   | `PERCENTILE_CONT(p) WITHIN GROUP (ORDER BY x)`   |
//! | Redshift   | `PERCENTILE_CONT(p) WITHIN GROUP (ORDER BY x)`   |
//! | Snowflake  | `PERCENTILE_CONT(p) WITHIN GROUP (ORDER BY x)`   |
//! | BigQuery   | `APPROX_QUANTILES(x, 100)[OFFSET(n)]`            |
//! | Databricks | `PERCENTILE(x, p)`                               |
//! | Trino      | `APPROX_PERCENTILE(x, p)`                        |

mod bigquery;
mod databricks;
pub mod helpers;
mod postgres;
mod redshift;
mod snowflake;
mod trino;

pub use bigquery::BigQuery;
pub use databricks::Databricks;
pub use postgres::Postgres;
pub use redshift::Redshift;
pub use snowflake::Snowflake;
pub use trino::Trino;

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::model::types::{DimensionType, MetricType, Weekday};
use crate::sql::time_frames::{DatePart, TimeFrame, TimeFrameKind};

/// SQL dialect trait - defines how warehouse fragments are rendered.
///
/// The default implementations follow Postgres where possible.
pub trait SqlDialect: std::fmt::Debug + Send + Sync {
    /// Dialect name for display/logging.
    fn name(&self) -> &'static str;

    // =========================================================================
    // Identifier and Literal Quoting
    // =========================================================================

    /// Quote an identifier (table, alias).
    fn quote_identifier(&self, ident: &str) -> String;

    /// Escape the contents of a string literal. Quotes are not added.
    fn escape_string(&self, value: &str) -> String {
        helpers::escape_doubled_quotes(value)
    }

    /// Quote a string literal.
    fn quote_string(&self, value: &str) -> String {
        format!("'{}'", self.escape_string(value))
    }

    // =========================================================================
    // Metrics
    // =========================================================================

    /// Aggregate `sql` according to the metric type.
    ///
    /// Non-aggregate types return the expression unchanged.
    fn metric_sql(&self, sql: &str, metric_type: MetricType, percentile: Option<f64>) -> String {
        match metric_type {
            MetricType::Sum => format!("SUM({})", sql),
            MetricType::Count => format!("COUNT({})", sql),
            MetricType::CountDistinct => format!("COUNT(DISTINCT {})", sql),
            MetricType::Min => format!("MIN({})", sql),
            MetricType::Max => format!("MAX({})", sql),
            MetricType::Average => self.average_sql(sql),
            MetricType::Percentile => self.percentile_sql(sql, percentile.unwrap_or(50.0)),
            MetricType::Median => self.percentile_sql(sql, 50.0),
            MetricType::Number
            | MetricType::String
            | MetricType::Date
            | MetricType::Timestamp
            | MetricType::Boolean => sql.to_string(),
        }
    }

    fn average_sql(&self, sql: &str) -> String {
        format!("AVG({})", sql)
    }

    /// Continuous percentile; `percentile` is in `0..=100`.
    fn percentile_sql(&self, sql: &str, percentile: f64) -> String {
        format!(
            "PERCENTILE_CONT({}) WITHIN GROUP (ORDER BY {})",
            helpers::percentile_fraction(percentile),
            sql
        )
    }

    // =========================================================================
    // Date/Time
    // =========================================================================

    /// Normalise a timestamp expression between timezones.
    ///
    /// Most warehouses already store timestamps normalised, so the default
    /// leaves the expression untouched.
    fn convert_timezone(&self, sql: &str, _source_tz: &str, _target_tz: &str) -> String {
        sql.to_string()
    }

    /// Truncate `sql` to the start of the interval.
    fn truncate_sql(
        &self,
        frame: TimeFrame,
        sql: &str,
        _source: DimensionType,
        start_of_week: Option<Weekday>,
    ) -> String {
        match (frame, helpers::week_shift(start_of_week)) {
            (TimeFrame::Week, Some(shift)) => format!(
                "(DATE_TRUNC('WEEK', ({} - INTERVAL '{} days')) + INTERVAL '{} days')",
                sql, shift, shift
            ),
            _ => helpers::date_trunc_quoted(frame, sql),
        }
    }

    /// Extract a numeric date part.
    fn date_part_sql(&self, part: DatePart, sql: &str) -> String {
        let name = match part {
            DatePart::Year => "year",
            DatePart::Quarter => "quarter",
            DatePart::Month => "month",
            DatePart::Week => "week",
            DatePart::DayOfWeek => "dow",
            DatePart::DayOfMonth => "day",
            DatePart::DayOfYear => "doy",
            DatePart::Hour => "hour",
            DatePart::Minute => "minute",
        };
        format!("DATE_PART('{}', {})", name, sql)
    }

    /// Render a day, month or quarter name.
    fn date_name_sql(&self, frame: TimeFrame, sql: &str) -> String {
        match frame {
            TimeFrame::DayOfWeekName => format!("TO_CHAR({}, 'FMDay')", sql),
            TimeFrame::MonthName => format!("TO_CHAR({}, 'FMMonth')", sql),
            _ => format!("'Q' || TO_CHAR({}, 'Q')", sql),
        }
    }

    /// SQL for a dimension bucketed to `frame`.
    fn time_interval_sql(
        &self,
        frame: TimeFrame,
        sql: &str,
        source: DimensionType,
        start_of_week: Option<Weekday>,
    ) -> String {
        match frame.kind() {
            TimeFrameKind::Raw => sql.to_string(),
            TimeFrameKind::Truncation => self.truncate_sql(frame, sql, source, start_of_week),
            TimeFrameKind::Part(part) => self.date_part_sql(part, sql),
            TimeFrameKind::Name => self.date_name_sql(frame, sql),
        }
    }
}

// =============================================================================
// Dialect Enum
// =============================================================================

/// Supported warehouse kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    #[default]
    Postgres,
    Snowflake,
    BigQuery,
    Redshift,
    Databricks,
    Trino,
}

impl Dialect {
    pub const ALL: [Dialect; 6] = [
        Dialect::Postgres,
        Dialect::Snowflake,
        Dialect::BigQuery,
        Dialect::Redshift,
        Dialect::Databricks,
        Dialect::Trino,
    ];

    /// Get the dialect implementation.
    pub fn dialect(&self) -> &'static dyn SqlDialect {
        match self {
            Dialect::Postgres => &Postgres,
            Dialect::Snowflake => &Snowflake,
            Dialect::BigQuery => &BigQuery,
            Dialect::Redshift => &Redshift,
            Dialect::Databricks => &Databricks,
            Dialect::Trino => &Trino,
        }
    }
}

impl SqlDialect for Dialect {
    fn name(&self) -> &'static str {
        self.dialect().name()
    }

    fn quote_identifier(&self, ident: &str) -> String {
        self.dialect().quote_identifier(ident)
    }

    fn escape_string(&self, value: &str) -> String {
        self.dialect().escape_string(value)
    }

    fn quote_string(&self, value: &str) -> String {
        self.dialect().quote_string(value)
    }

    fn metric_sql(&self, sql: &str, metric_type: MetricType, percentile: Option<f64>) -> String {
        self.dialect().metric_sql(sql, metric_type, percentile)
    }

    fn average_sql(&self, sql: &str) -> String {
        self.dialect().average_sql(sql)
    }

    fn percentile_sql(&self, sql: &str, percentile: f64) -> String {
        self.dialect().percentile_sql(sql, percentile)
    }

    fn convert_timezone(&self, sql: &str, source_tz: &str, target_tz: &str) -> String {
        self.dialect().convert_timezone(sql, source_tz, target_tz)
    }

    fn truncate_sql(
        &self,
        frame: TimeFrame,
        sql: &str,
        source: DimensionType,
        start_of_week: Option<Weekday>,
    ) -> String {
        self.dialect().truncate_sql(frame, sql, source, start_of_week)
    }

    fn date_part_sql(&self, part: DatePart, sql: &str) -> String {
        self.dialect().date_part_sql(part, sql)
    }

    fn date_name_sql(&self, frame: TimeFrame, sql: &str) -> String {
        self.dialect().date_name_sql(frame, sql)
    }

    fn time_interval_sql(
        &self,
        frame: TimeFrame,
        sql: &str,
        source: DimensionType,
        start_of_week: Option<Weekday>,
    ) -> String {
        self.dialect()
            .time_interval_sql(frame, sql, source, start_of_week)
    }
}

impl std::fmt::Display for Dialect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Dialect {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|d| d.name() == lowered)
            .ok_or_else(|| {
                let names: Vec<_> = Self::ALL.iter().map(|d| d.name()).collect();
                format!("unknown dialect '{}', expected one of: {}", s, names.join(", "))
            })
    }
}
