//! Time intervals a date or timestamp dimension can be bucketed into.
//!
//! Each interval falls into one of four families, which decides both the SQL
//! shape (see `SqlDialect::time_interval_sql`) and the type of the resulting
//! dimension:
//!
//! | Family     | Intervals                              | Output type        |
//! |------------|----------------------------------------|--------------------|
//! | raw        | RAW                                    | source type        |
//! | truncation | YEAR .. DAY                            | date               |
//! | truncation | HOUR .. MILLISECOND                    | timestamp          |
//! | date part  | YEAR_NUM, .., DAY_OF_WEEK_INDEX, ..    | number             |
//! | name       | DAY_OF_WEEK_NAME, MONTH_NAME, ..       | string             |

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::model::types::DimensionType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TimeFrame {
    Raw,
    Year,
    Quarter,
    Month,
    Week,
    Day,
    Hour,
    Minute,
    Second,
    Millisecond,
    YearNum,
    QuarterNum,
    MonthNum,
    WeekNum,
    DayOfWeekIndex,
    DayOfMonthNum,
    DayOfYearNum,
    HourOfDayNum,
    MinuteOfHourNum,
    DayOfWeekName,
    MonthName,
    QuarterName,
}

/// Component extracted by a date-part interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DatePart {
    Year,
    Quarter,
    Month,
    Week,
    DayOfWeek,
    DayOfMonth,
    DayOfYear,
    Hour,
    Minute,
}

/// Family of an interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeFrameKind {
    Raw,
    Truncation,
    Part(DatePart),
    Name,
}

impl TimeFrame {
    pub const ALL: [TimeFrame; 22] = [
        TimeFrame::Raw,
        TimeFrame::Year,
        TimeFrame::Quarter,
        TimeFrame::Month,
        TimeFrame::Week,
        TimeFrame::Day,
        TimeFrame::Hour,
        TimeFrame::Minute,
        TimeFrame::Second,
        TimeFrame::Millisecond,
        TimeFrame::YearNum,
        TimeFrame::QuarterNum,
        TimeFrame::MonthNum,
        TimeFrame::WeekNum,
        TimeFrame::DayOfWeekIndex,
        TimeFrame::DayOfMonthNum,
        TimeFrame::DayOfYearNum,
        TimeFrame::HourOfDayNum,
        TimeFrame::MinuteOfHourNum,
        TimeFrame::DayOfWeekName,
        TimeFrame::MonthName,
        TimeFrame::QuarterName,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TimeFrame::Raw => "RAW",
            TimeFrame::Year => "YEAR",
            TimeFrame::Quarter => "QUARTER",
            TimeFrame::Month => "MONTH",
            TimeFrame::Week => "WEEK",
            TimeFrame::Day => "DAY",
            TimeFrame::Hour => "HOUR",
            TimeFrame::Minute => "MINUTE",
            TimeFrame::Second => "SECOND",
            TimeFrame::Millisecond => "MILLISECOND",
            TimeFrame::YearNum => "YEAR_NUM",
            TimeFrame::QuarterNum => "QUARTER_NUM",
            TimeFrame::MonthNum => "MONTH_NUM",
            TimeFrame::WeekNum => "WEEK_NUM",
            TimeFrame::DayOfWeekIndex => "DAY_OF_WEEK_INDEX",
            TimeFrame::DayOfMonthNum => "DAY_OF_MONTH_NUM",
            TimeFrame::DayOfYearNum => "DAY_OF_YEAR_NUM",
            TimeFrame::HourOfDayNum => "HOUR_OF_DAY_NUM",
            TimeFrame::MinuteOfHourNum => "MINUTE_OF_HOUR_NUM",
            TimeFrame::DayOfWeekName => "DAY_OF_WEEK_NAME",
            TimeFrame::MonthName => "MONTH_NAME",
            TimeFrame::QuarterName => "QUARTER_NAME",
        }
    }

    /// Suffix used in generated dimension names (`created_at_day`).
    pub fn suffix(&self) -> String {
        self.as_str().to_lowercase()
    }

    /// Human readable label appended to the base dimension label.
    pub fn label(&self) -> &'static str {
        match self {
            TimeFrame::Raw => "Raw",
            TimeFrame::Year => "Year",
            TimeFrame::Quarter => "Quarter",
            TimeFrame::Month => "Month",
            TimeFrame::Week => "Week",
            TimeFrame::Day => "Day",
            TimeFrame::Hour => "Hour",
            TimeFrame::Minute => "Minute",
            TimeFrame::Second => "Second",
            TimeFrame::Millisecond => "Millisecond",
            TimeFrame::YearNum => "Year (number)",
            TimeFrame::QuarterNum => "Quarter (number)",
            TimeFrame::MonthNum => "Month (number)",
            TimeFrame::WeekNum => "Week (number)",
            TimeFrame::DayOfWeekIndex => "Day of week (index)",
            TimeFrame::DayOfMonthNum => "Day of month (number)",
            TimeFrame::DayOfYearNum => "Day of year (number)",
            TimeFrame::HourOfDayNum => "Hour of day (number)",
            TimeFrame::MinuteOfHourNum => "Minute of hour (number)",
            TimeFrame::DayOfWeekName => "Day of week (name)",
            TimeFrame::MonthName => "Month (name)",
            TimeFrame::QuarterName => "Quarter (name)",
        }
    }

    pub fn kind(&self) -> TimeFrameKind {
        match self {
            TimeFrame::Raw => TimeFrameKind::Raw,
            TimeFrame::Year
            | TimeFrame::Quarter
            | TimeFrame::Month
            | TimeFrame::Week
            | TimeFrame::Day
            | TimeFrame::Hour
            | TimeFrame::Minute
            | TimeFrame::Second
            | TimeFrame::Millisecond => TimeFrameKind::Truncation,
            TimeFrame::YearNum => TimeFrameKind::Part(DatePart::Year),
            TimeFrame::QuarterNum => TimeFrameKind::Part(DatePart::Quarter),
            TimeFrame::MonthNum => TimeFrameKind::Part(DatePart::Month),
            TimeFrame::WeekNum => TimeFrameKind::Part(DatePart::Week),
            TimeFrame::DayOfWeekIndex => TimeFrameKind::Part(DatePart::DayOfWeek),
            TimeFrame::DayOfMonthNum => TimeFrameKind::Part(DatePart::DayOfMonth),
            TimeFrame::DayOfYearNum => TimeFrameKind::Part(DatePart::DayOfYear),
            TimeFrame::HourOfDayNum => TimeFrameKind::Part(DatePart::Hour),
            TimeFrame::MinuteOfHourNum => TimeFrameKind::Part(DatePart::Minute),
            TimeFrame::DayOfWeekName | TimeFrame::MonthName | TimeFrame::QuarterName => {
                TimeFrameKind::Name
            }
        }
    }

    /// Type of a dimension bucketed to this interval.
    pub fn output_type(&self, source: DimensionType) -> DimensionType {
        match self.kind() {
            TimeFrameKind::Raw => source,
            TimeFrameKind::Truncation => match self {
                TimeFrame::Hour | TimeFrame::Minute | TimeFrame::Second | TimeFrame::Millisecond => {
                    DimensionType::Timestamp
                }
                _ => DimensionType::Date,
            },
            TimeFrameKind::Part(_) => DimensionType::Number,
            TimeFrameKind::Name => DimensionType::String,
        }
    }

    /// Intervals generated when a dimension does not restrict them.
    pub fn defaults_for(dimension_type: DimensionType) -> Vec<TimeFrame> {
        match dimension_type {
            DimensionType::Timestamp => vec![
                TimeFrame::Raw,
                TimeFrame::Day,
                TimeFrame::Week,
                TimeFrame::Month,
                TimeFrame::Quarter,
                TimeFrame::Year,
            ],
            DimensionType::Date => vec![
                TimeFrame::Day,
                TimeFrame::Week,
                TimeFrame::Month,
                TimeFrame::Quarter,
                TimeFrame::Year,
            ],
            _ => Vec::new(),
        }
    }

    pub fn valid_values() -> String {
        Self::ALL
            .iter()
            .map(|t| t.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for TimeFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TimeFrame {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_uppercase();
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == upper)
            .ok_or(())
    }
}
