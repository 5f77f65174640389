//! Declarative filter rules on metrics and tables.
//!
//! Filters are written as one-key maps `field -> value` where a string value
//! carries its operator as a prefix or suffix:
//!
//! | Value        | Operator             |
//! |--------------|----------------------|
//! | `null`       | is null              |
//! | `!null`      | is not null          |
//! | `!x`         | not equals           |
//! | `>x`, `>=x`  | greater than (or eq) |
//! | `<x`, `<=x`  | less than (or eq)    |
//! | `%x%`        | includes             |
//! | `x%`         | starts with          |
//! | `%x`         | ends with            |
//! | anything else, lists, numbers, booleans | equals |

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::{CompileError, CompileResult};
use crate::sql::builder::WarehouseSqlBuilder;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FilterOperator {
    IsNull,
    NotNull,
    Equals,
    NotEquals,
    StartsWith,
    EndsWith,
    Include,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterTarget {
    pub field_ref: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricFilterRule {
    pub target: FilterTarget,
    pub operator: FilterOperator,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<Value>,
}

/// A filter a table applies to every query, or offers as a default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelFilterRule {
    #[serde(flatten)]
    pub rule: MetricFilterRule,
    pub required: bool,
}

impl MetricFilterRule {
    pub fn new(field: impl Into<String>, operator: FilterOperator, values: Vec<Value>) -> Self {
        Self {
            target: FilterTarget {
                field_ref: field.into(),
            },
            operator,
            values,
        }
    }

    /// Parse one `field -> value` entry.
    pub fn parse(field: &str, value: &Value) -> CompileResult<Self> {
        match value {
            Value::Null => Ok(Self::new(field, FilterOperator::IsNull, vec![])),
            Value::Bool(_) | Value::Number(_) => {
                Ok(Self::new(field, FilterOperator::Equals, vec![value.clone()]))
            }
            Value::Array(values) => Ok(Self::new(field, FilterOperator::Equals, values.clone())),
            Value::String(s) => Ok(parse_string_rule(field, s)),
            Value::Object(_) => Err(CompileError::MetadataParse(format!(
                "Invalid filter value for field \"{}\": expected a string, number, boolean or list",
                field
            ))),
        }
    }

    /// Boolean SQL condition applying this rule to `field_sql`.
    pub fn to_sql(&self, field_sql: &str, builder: &dyn WarehouseSqlBuilder) -> String {
        let literal = |value: &Value| render_literal(value, builder);
        let first = || self.values.first().map(literal).unwrap_or_else(|| "NULL".into());
        let pattern = |prefix: &str, suffix: &str| {
            let raw = match self.values.first() {
                Some(Value::String(s)) => s.clone(),
                Some(other) => other.to_string(),
                None => String::new(),
            };
            format!("'{}{}{}'", prefix, builder.escape_string(&raw), suffix)
        };

        match self.operator {
            FilterOperator::IsNull => format!("({}) IS NULL", field_sql),
            FilterOperator::NotNull => format!("({}) IS NOT NULL", field_sql),
            FilterOperator::Equals if self.values.is_empty() => "TRUE".into(),
            FilterOperator::Equals if self.values.len() == 1 => {
                format!("({}) = {}", field_sql, first())
            }
            FilterOperator::Equals => {
                let values: Vec<_> = self.values.iter().map(literal).collect();
                format!("({}) IN ({})", field_sql, values.join(", "))
            }
            FilterOperator::NotEquals => format!(
                "(({}) <> {} OR ({}) IS NULL)",
                field_sql,
                first(),
                field_sql
            ),
            FilterOperator::StartsWith => format!("({}) LIKE {}", field_sql, pattern("", "%")),
            FilterOperator::EndsWith => format!("({}) LIKE {}", field_sql, pattern("%", "")),
            FilterOperator::Include => format!("({}) LIKE {}", field_sql, pattern("%", "%")),
            FilterOperator::LessThan => format!("({}) < {}", field_sql, first()),
            FilterOperator::LessThanOrEqual => format!("({}) <= {}", field_sql, first()),
            FilterOperator::GreaterThan => format!("({}) > {}", field_sql, first()),
            FilterOperator::GreaterThanOrEqual => format!("({}) >= {}", field_sql, first()),
        }
    }
}

fn parse_string_rule(field: &str, raw: &str) -> MetricFilterRule {
    let text = |s: &str| Value::String(s.to_string());
    let comparable = |s: &str| {
        let trimmed = s.trim();
        if let Ok(n) = trimmed.parse::<i64>() {
            return Value::from(n);
        }
        match trimmed.parse::<f64>() {
            Ok(n) => serde_json::Number::from_f64(n)
                .map(Value::Number)
                .unwrap_or_else(|| text(s)),
            Err(_) => text(s),
        }
    };

    let (operator, values) = if raw == "null" {
        (FilterOperator::IsNull, vec![])
    } else if raw == "!null" {
        (FilterOperator::NotNull, vec![])
    } else if let Some(rest) = raw.strip_prefix('!') {
        (FilterOperator::NotEquals, vec![text(rest)])
    } else if let Some(rest) = raw.strip_prefix(">=") {
        (FilterOperator::GreaterThanOrEqual, vec![comparable(rest)])
    } else if let Some(rest) = raw.strip_prefix('>') {
        (FilterOperator::GreaterThan, vec![comparable(rest)])
    } else if let Some(rest) = raw.strip_prefix("<=") {
        (FilterOperator::LessThanOrEqual, vec![comparable(rest)])
    } else if let Some(rest) = raw.strip_prefix('<') {
        (FilterOperator::LessThan, vec![comparable(rest)])
    } else if raw.len() >= 2 && raw.starts_with('%') && raw.ends_with('%') {
        (FilterOperator::Include, vec![text(&raw[1..raw.len() - 1])])
    } else if let Some(rest) = raw.strip_suffix('%') {
        (FilterOperator::StartsWith, vec![text(rest)])
    } else if let Some(rest) = raw.strip_prefix('%') {
        (FilterOperator::EndsWith, vec![text(rest)])
    } else {
        (FilterOperator::Equals, vec![text(raw)])
    };

    MetricFilterRule::new(field, operator, values)
}

fn render_literal(value: &Value, builder: &dyn WarehouseSqlBuilder) -> String {
    match value {
        Value::Null => "NULL".into(),
        Value::Bool(b) => (if *b { "TRUE" } else { "FALSE" }).into(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => format!("'{}'", builder.escape_string(s)),
        other => format!("'{}'", builder.escape_string(&other.to_string())),
    }
}

/// Parse a list of filter maps, one rule per key.
pub fn parse_filters(filters: &[IndexMap<String, Value>]) -> CompileResult<Vec<MetricFilterRule>> {
    filters
        .iter()
        .flat_map(|entry| entry.iter())
        .map(|(field, value)| MetricFilterRule::parse(field, value))
        .collect()
}

/// Required filters first, then default (optional) filters.
pub fn parse_model_filters(
    required: Option<&[IndexMap<String, Value>]>,
    defaults: Option<&[IndexMap<String, Value>]>,
) -> CompileResult<Vec<ModelFilterRule>> {
    let mut rules = Vec::new();
    for (filters, is_required) in [(required, true), (defaults, false)] {
        for rule in parse_filters(filters.unwrap_or_default())? {
            rules.push(ModelFilterRule {
                rule,
                required: is_required,
            });
        }
    }
    Ok(rules)
}
