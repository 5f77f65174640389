//! Tests for metric conversion from the three declaration sites.

#[path = "../common/mod.rs"]
mod common;

use canopy::config::{SpotlightCategory, SpotlightConfig};
use canopy::model::{DimensionMeta, MetricSpec, SpotlightMeta, Visibility};
use canopy::model::{Column, MetricType};
use canopy::semantic::{CompileError, FilterOperator};
use canopy::sql::{Dialect, DialectSqlBuilder};
use canopy::translation::{
    convert_column_metric, convert_dbt_metric, convert_dimension, convert_model_metric,
    usable_metrics, TableContext,
};
use common::metric;
use serde_json::json;

fn spec(value: serde_json::Value) -> MetricSpec {
    serde_json::from_value(value).expect("valid metric spec")
}

fn with_context<T>(spotlight: &SpotlightConfig, f: impl FnOnce(&TableContext<'_>) -> T) -> T {
    let builder = DialectSqlBuilder::new(Dialect::Postgres);
    let ctx = TableContext {
        name: "payments",
        label: "Payments",
        builder: &builder,
        spotlight,
    };
    f(&ctx)
}

fn categories(names: &[&str]) -> SpotlightConfig {
    let mut config = SpotlightConfig::default();
    for name in names {
        config.categories.insert(
            name.to_string(),
            SpotlightCategory {
                label: name.to_string(),
                color: None,
            },
        );
    }
    config
}

#[test]
fn test_column_metric_reads_base_dimension() {
    let spotlight = SpotlightConfig::default();
    let metric = with_context(&spotlight, |ctx| {
        let column = Column::new("amount").with_data_type("number");
        let meta = DimensionMeta {
            sql: Some("${TABLE}.amount_cents / 100".into()),
            required_attributes: Some(
                [("team".to_string(), canopy::model::StringOrVec::One("finance".into()))]
                    .into_iter()
                    .collect(),
            ),
            ..Default::default()
        };
        let dimension = convert_dimension(ctx, 2, &column, &meta, None, false).unwrap();
        convert_column_metric(ctx, &dimension, "total", &spec(json!({ "type": "sum" })), None)
            .unwrap()
    });
    assert_eq!(metric.sql, "${TABLE}.amount_cents / 100");
    assert_eq!(metric.type_, MetricType::Sum);
    assert_eq!(metric.label, "Total");
    assert_eq!(metric.dimension_reference.as_deref(), Some("amount"));
    assert!(metric.required_attributes.is_some_and(|attrs| attrs.contains_key("team")));
}

#[test]
fn test_column_metric_without_type() {
    let spotlight = SpotlightConfig::default();
    let err = with_context(&spotlight, |ctx| {
        let column = Column::new("amount").with_data_type("number");
        let dimension =
            convert_dimension(ctx, 0, &column, &DimensionMeta::default(), None, false).unwrap();
        convert_column_metric(ctx, &dimension, "total", &MetricSpec::default(), None).unwrap_err()
    });
    assert_eq!(
        err.to_string(),
        "Metric \"total\" in model \"payments\" has no type"
    );
}

#[test]
fn test_model_metric_count_defaults_to_rows() {
    let spotlight = SpotlightConfig::default();
    let metric = with_context(&spotlight, |ctx| {
        convert_model_metric(ctx, "payment_count", &spec(json!({ "type": "count" })), None)
            .unwrap()
    });
    assert_eq!(metric.sql, "*");
    assert!(metric.dimension_reference.is_none());
}

#[test]
fn test_model_metric_requires_sql() {
    let spotlight = SpotlightConfig::default();
    let err = with_context(&spotlight, |ctx| {
        convert_model_metric(ctx, "total", &spec(json!({ "type": "sum" })), None).unwrap_err()
    });
    assert!(matches!(err, CompileError::MetadataParse(_)));
    assert!(err.to_string().contains("must declare sql"));
}

#[test]
fn test_invalid_metric_type() {
    let spotlight = SpotlightConfig::default();
    let err = with_context(&spotlight, |ctx| {
        convert_model_metric(ctx, "total", &spec(json!({ "type": "mode", "sql": "x" })), None)
            .unwrap_err()
    });
    assert!(err.to_string().contains("type \"mode\" is not a valid metric type"));
}

#[test]
fn test_metric_filters_parse_operators() {
    let spotlight = SpotlightConfig::default();
    let metric = with_context(&spotlight, |ctx| {
        let declared = spec(json!({
            "type": "sum",
            "sql": "${amount}",
            "filters": [
                { "method": "card" },
                { "amount": ">=10" },
                { "refunded_at": "null" },
                { "status": ["paid", "settled"] }
            ]
        }));
        convert_model_metric(ctx, "card_amount", &declared, None).unwrap()
    });
    let operators: Vec<FilterOperator> = metric.filters.iter().map(|f| f.operator).collect();
    assert_eq!(
        operators,
        vec![
            FilterOperator::Equals,
            FilterOperator::GreaterThanOrEqual,
            FilterOperator::IsNull,
            FilterOperator::Equals,
        ]
    );
    assert_eq!(metric.filters[0].target.field_ref, "method");
    assert_eq!(metric.filters[3].values.len(), 2);
}

#[test]
fn test_spotlight_inherits_model_visibility_and_merges_categories() {
    let spotlight = categories(&["sales", "finance"]);
    let model_spotlight = SpotlightMeta {
        visibility: Some(Visibility::Hide),
        categories: Some(vec!["sales".into()]),
    };
    let metric = with_context(&spotlight, |ctx| {
        let declared = spec(json!({
            "type": "count",
            "spotlight": { "categories": ["finance", "sales"] }
        }));
        convert_model_metric(ctx, "payment_count", &declared, Some(&model_spotlight)).unwrap()
    });
    let resolved = metric.spotlight.unwrap();
    assert_eq!(resolved.visibility, Visibility::Hide);
    assert_eq!(resolved.categories, vec!["sales", "finance"]);
}

#[test]
fn test_unknown_spotlight_category() {
    let spotlight = categories(&["sales"]);
    let err = with_context(&spotlight, |ctx| {
        let declared = spec(json!({ "type": "count", "spotlight": { "categories": ["ops"] } }));
        convert_model_metric(ctx, "payment_count", &declared, None).unwrap_err()
    });
    assert!(matches!(err, CompileError::MetadataParse(_)));
    assert!(err.to_string().contains("metric \"payment_count\": ops"));
}

#[test]
fn test_legacy_single_column_expression() {
    let spotlight = SpotlightConfig::default();
    let legacy = metric(json!({
        "name": "revenue",
        "label": "Revenue",
        "calculation_method": "sum",
        "expression": "amount",
        "refs": [{ "name": "payments" }]
    }));
    let converted = with_context(&spotlight, |ctx| convert_dbt_metric(ctx, &legacy, None).unwrap());
    assert_eq!(converted.sql, "${TABLE}.amount");
    assert_eq!(converted.type_, MetricType::Sum);
    assert_eq!(converted.label, "Revenue");
}

#[test]
fn test_legacy_expression_and_filters() {
    let spotlight = SpotlightConfig::default();
    let legacy = metric(json!({
        "name": "net_revenue",
        "calculation_method": "sum",
        "expression": "amount - refunds",
        "filters": [
            { "field": "status", "operator": "=", "value": "'paid'" },
            { "field": "amount", "operator": ">", "value": "0" }
        ],
        "refs": [["payments"]]
    }));
    let converted = with_context(&spotlight, |ctx| convert_dbt_metric(ctx, &legacy, None).unwrap());
    insta::assert_snapshot!(
        converted.sql,
        @"CASE WHEN (${TABLE}.status = 'paid') AND (${TABLE}.amount > 0) THEN amount - refunds ELSE NULL END"
    );
}

#[test]
fn test_legacy_derived_metric_references_metrics() {
    let spotlight = SpotlightConfig::default();
    let legacy = metric(json!({
        "name": "average_order",
        "calculation_method": "derived",
        "expression": "revenue / order_count",
        "metrics": [["revenue"], ["order_count"]]
    }));
    let converted = with_context(&spotlight, |ctx| convert_dbt_metric(ctx, &legacy, None).unwrap());
    assert_eq!(converted.type_, MetricType::Number);
    assert_eq!(converted.sql, "${revenue} / ${order_count}");
}

#[test]
fn test_legacy_derived_without_expression() {
    let spotlight = SpotlightConfig::default();
    let legacy = metric(json!({
        "name": "average_order",
        "calculation_method": "derived",
        "metrics": [["revenue"]]
    }));
    let err = with_context(&spotlight, |ctx| convert_dbt_metric(ctx, &legacy, None).unwrap_err());
    assert_eq!(
        err.to_string(),
        "Derived metric \"average_order\" must have the expression field set"
    );
}

#[test]
fn test_legacy_unknown_method_uses_unique_id() {
    let spotlight = SpotlightConfig::default();
    let legacy = metric(json!({
        "unique_id": "metric.shop.revenue",
        "name": "revenue",
        "calculation_method": "expression"
    }));
    let err = with_context(&spotlight, |ctx| convert_dbt_metric(ctx, &legacy, None).unwrap_err());
    assert!(err.to_string().starts_with("Cannot parse metric \"metric.shop.revenue\""));
}

#[test]
fn test_usable_metrics_follow_derivations() {
    let metrics = vec![
        metric(json!({ "name": "revenue", "calculation_method": "sum", "refs": [{ "name": "payments" }] })),
        metric(json!({ "name": "orders", "calculation_method": "count", "refs": [{ "name": "orders" }] })),
        metric(json!({
            "name": "doubled",
            "calculation_method": "derived",
            "expression": "revenue * 2",
            "metrics": [["revenue"]]
        })),
        metric(json!({
            "name": "per_order",
            "calculation_method": "derived",
            "expression": "revenue / orders",
            "metrics": [["revenue"], ["orders"]]
        })),
        metric(json!({
            "name": "per_order_doubled",
            "calculation_method": "derived",
            "expression": "doubled",
            "metrics": [["doubled"]]
        })),
    ];
    let names: Vec<&str> = usable_metrics("payments", &metrics)
        .into_iter()
        .map(|m| m.name.as_str())
        .collect();
    assert_eq!(names, vec!["revenue", "doubled", "per_order_doubled"]);

    let names: Vec<&str> = usable_metrics("orders", &metrics)
        .into_iter()
        .map(|m| m.name.as_str())
        .collect();
    assert_eq!(names, vec!["orders"]);
}
