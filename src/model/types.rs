//! Closed vocabularies shared by the input model and the compiled output.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Semantic type of a dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DimensionType {
    String,
    Number,
    Timestamp,
    Date,
    Boolean,
}

impl DimensionType {
    pub const ALL: [DimensionType; 5] = [
        DimensionType::String,
        DimensionType::Number,
        DimensionType::Timestamp,
        DimensionType::Date,
        DimensionType::Boolean,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DimensionType::String => "string",
            DimensionType::Number => "number",
            DimensionType::Timestamp => "timestamp",
            DimensionType::Date => "date",
            DimensionType::Boolean => "boolean",
        }
    }

    /// Date and timestamp dimensions can be bucketed into time intervals.
    pub fn is_temporal(&self) -> bool {
        matches!(self, DimensionType::Date | DimensionType::Timestamp)
    }

    /// Comma separated list of every accepted value, for error messages.
    pub fn valid_values() -> String {
        Self::ALL
            .iter()
            .map(|t| t.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for DimensionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for DimensionType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL.into_iter().find(|t| t.as_str() == s).ok_or(())
    }
}

/// Aggregation kind of a metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricType {
    Percentile,
    Average,
    Count,
    CountDistinct,
    Sum,
    Min,
    Max,
    Number,
    Median,
    String,
    Date,
    Timestamp,
    Boolean,
}

impl MetricType {
    pub const ALL: [MetricType; 13] = [
        MetricType::Percentile,
        MetricType::Average,
        MetricType::Count,
        MetricType::CountDistinct,
        MetricType::Sum,
        MetricType::Min,
        MetricType::Max,
        MetricType::Number,
        MetricType::Median,
        MetricType::String,
        MetricType::Date,
        MetricType::Timestamp,
        MetricType::Boolean,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MetricType::Percentile => "percentile",
            MetricType::Average => "average",
            MetricType::Count => "count",
            MetricType::CountDistinct => "count_distinct",
            MetricType::Sum => "sum",
            MetricType::Min => "min",
            MetricType::Max => "max",
            MetricType::Number => "number",
            MetricType::Median => "median",
            MetricType::String => "string",
            MetricType::Date => "date",
            MetricType::Timestamp => "timestamp",
            MetricType::Boolean => "boolean",
        }
    }

    /// Non-aggregate metrics are plain expressions over other metrics.
    pub fn is_aggregate(&self) -> bool {
        !matches!(
            self,
            MetricType::Number
                | MetricType::String
                | MetricType::Date
                | MetricType::Timestamp
                | MetricType::Boolean
        )
    }
}

impl fmt::Display for MetricType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for MetricType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.to_lowercase();
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == lowered)
            .ok_or(())
    }
}

/// First day of the week, Monday = 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Weekday {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Weekday {
    /// Days after Monday.
    pub fn offset(&self) -> u32 {
        match self {
            Weekday::Monday => 0,
            Weekday::Tuesday => 1,
            Weekday::Wednesday => 2,
            Weekday::Thursday => 3,
            Weekday::Friday => 4,
            Weekday::Saturday => 5,
            Weekday::Sunday => 6,
        }
    }

    pub fn as_upper(&self) -> &'static str {
        match self {
            Weekday::Monday => "MONDAY",
            Weekday::Tuesday => "TUESDAY",
            Weekday::Wednesday => "WEDNESDAY",
            Weekday::Thursday => "THURSDAY",
            Weekday::Friday => "FRIDAY",
            Weekday::Saturday => "SATURDAY",
            Weekday::Sunday => "SUNDAY",
        }
    }
}

/// SQL join type declared on a model join.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JoinType {
    Inner,
    #[default]
    Left,
    Right,
    Full,
}

/// Cardinality between the base table and a joined table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum JoinRelationship {
    OneToMany,
    ManyToOne,
    OneToOne,
    ManyToMany,
}

/// How fields of a table are ordered for presentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderFieldsBy {
    #[default]
    Label,
    Index,
}

impl OrderFieldsBy {
    /// Case-insensitive parse; unknown strategies fall back to `Label`.
    pub fn parse_or_default(value: Option<&str>) -> Self {
        match value.map(|v| v.to_uppercase()).as_deref() {
            Some("INDEX") => OrderFieldsBy::Index,
            _ => OrderFieldsBy::Label,
        }
    }
}

/// Spotlight visibility of a field or explore.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Show,
    Hide,
}

/// Manifest fields that accept either a single string or a list of strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StringOrVec {
    One(String),
    Many(Vec<String>),
}

impl StringOrVec {
    pub fn into_vec(self) -> Vec<String> {
        match self {
            StringOrVec::One(s) => vec![s],
            StringOrVec::Many(v) => v,
        }
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.clone().into_vec()
    }

    pub fn is_empty(&self) -> bool {
        match self {
            StringOrVec::One(_) => false,
            StringOrVec::Many(v) => v.is_empty(),
        }
    }
}
