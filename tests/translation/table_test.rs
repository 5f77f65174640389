//! Tests for compiling one model into one table.

#[path = "../common/mod.rs"]
mod common;

use canopy::config::SpotlightConfig;
use canopy::model::{DbtMetric, Model, OrderFieldsBy};
use canopy::semantic::{
    CollisionKind, CompileError, FilterOperator, LineageNode, LineageNodeKind, ModelGraph, Table,
};
use canopy::sql::{Dialect, TimeFrame};
use canopy::translation::{compile_table, convert_table, usable_metrics};
use common::{builder, metric, model, orders, payments};
use serde_json::json;

fn convert(model: &Model, legacy: &[DbtMetric]) -> Result<Table, CompileError> {
    let usable = usable_metrics(&model.name, legacy);
    convert_table(
        model,
        &usable,
        &builder(Dialect::Postgres),
        &SpotlightConfig::default(),
    )
}

#[test]
fn test_metric_merge_order_and_indexes() {
    let legacy = vec![metric(json!({
        "name": "revenue",
        "calculation_method": "sum",
        "expression": "amount",
        "refs": [{ "name": "payments" }]
    }))];
    let table = convert(&payments(), &legacy).unwrap();
    let names: Vec<&str> = table.metrics.keys().map(String::as_str).collect();
    assert_eq!(
        names,
        vec!["revenue", "payment_count", "card_amount", "total_amount", "average_amount"]
    );
    let indexes: Vec<usize> = table.metrics.values().map(|m| m.index).collect();
    assert_eq!(indexes, vec![0, 1, 2, 3, 4]);
}

#[test]
fn test_column_metric_overrides_model_metric_position() {
    let mut model = payments();
    model.meta.metrics.insert(
        "total_amount".into(),
        serde_json::from_value(json!({ "type": "max", "sql": "${amount}" })).unwrap(),
    );
    let table = convert(&model, &[]).unwrap();
    let names: Vec<&str> = table.metrics.keys().map(String::as_str).collect();
    assert_eq!(names, vec!["payment_count", "card_amount", "total_amount", "average_amount"]);
    assert_eq!(
        table.metrics["total_amount"].type_,
        canopy::model::MetricType::Sum
    );
}

#[test]
fn test_metric_and_dimension_collision() {
    let mut model = payments();
    model.meta.metrics.insert(
        "method".into(),
        serde_json::from_value(json!({ "type": "count_distinct", "sql": "${method}" })).unwrap(),
    );
    let err = convert(&model, &[]).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Found a metric and a dimension with the same name: method"
    );
    assert!(matches!(
        err,
        CompileError::NameCollision {
            kind: CollisionKind::MetricAndDimension,
            ..
        }
    ));
}

#[test]
fn test_multiple_collisions_listed() {
    let mut model = payments();
    for name in ["method", "amount"] {
        model.meta.metrics.insert(
            name.into(),
            serde_json::from_value(json!({ "type": "count" })).unwrap(),
        );
    }
    let err = convert(&model, &[]).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Found multiple metrics and a dimensions with the same name: method, amount"
    );
}

#[test]
fn test_interval_name_collision() {
    let model = model(json!({
        "name": "events",
        "relation_name": "events",
        "columns": {
            "created_at": { "name": "created_at", "data_type": "date" },
            "created_at_day": { "name": "created_at_day", "data_type": "date" }
        }
    }));
    let err = convert(&model, &[]).unwrap_err();
    assert_eq!(
        err.to_string(),
        "Found multiple dimensions with the same name: created_at_day"
    );
}

#[test]
fn test_model_without_columns() {
    let model = model(json!({ "name": "empty", "relation_name": "empty" }));
    let err = convert(&model, &[]).unwrap_err();
    assert!(matches!(err, CompileError::NoDimensionsFound(_)));
    assert_eq!(err.to_string(), "Model \"empty\" has no dimensions");
}

#[test]
fn test_model_meta_shapes_table() {
    let model = model(json!({
        "name": "orders",
        "relation_name": "\"db\".\"public\".\"orders\"",
        "description": "All orders",
        "columns": {
            "order_id": { "name": "order_id", "data_type": "number" },
            "status": { "name": "status" },
            "created_at": { "name": "created_at", "data_type": "date" }
        },
        "meta": {
            "label": "Sales orders",
            "sql_from": "analytics.orders_v2",
            "primary_key": "order_id",
            "order_fields_by": "index",
            "group_label": "Sales",
            "required_filters": [{ "created_at": ">=2024-01-01" }],
            "default_filters": [{ "status": "!cancelled" }],
            "default_time_dimension": { "field": "created_at", "interval": "month" },
            "ai_hint": ["Orders placed online"]
        },
        "config": {
            "meta": { "group_label": "Commerce" }
        }
    }));
    let table = convert(&model, &[]).unwrap();
    assert_eq!(table.label, "Sales orders");
    assert_eq!(table.description, "All orders");
    assert_eq!(table.sql_table, "analytics.orders_v2");
    assert_eq!(table.primary_key, Some(vec!["order_id".to_string()]));
    assert_eq!(table.order_fields_by, OrderFieldsBy::Index);
    assert_eq!(table.group_label.as_deref(), Some("Commerce"));
    assert_eq!(table.ai_hint, Some(vec!["Orders placed online".to_string()]));

    let default_time = table.default_time_dimension.unwrap();
    assert_eq!(default_time.field, "created_at");
    assert_eq!(default_time.interval, TimeFrame::Month);

    assert_eq!(table.required_filters.len(), 2);
    assert!(table.required_filters[0].required);
    assert_eq!(
        table.required_filters[0].rule.operator,
        FilterOperator::GreaterThanOrEqual
    );
    assert!(!table.required_filters[1].required);
    assert_eq!(table.required_filters[1].rule.operator, FilterOperator::NotEquals);
}

#[test]
fn test_invalid_default_time_interval() {
    let mut model = orders();
    model.meta.default_time_dimension = Some(canopy::model::DefaultTimeDimensionSpec {
        field: "created_at".into(),
        interval: "fortnight".into(),
    });
    let err = convert(&model, &[]).unwrap_err();
    assert!(matches!(err, CompileError::MetadataParse(_)));
    assert!(err.to_string().contains("\"fortnight\""));
}

#[test]
fn test_dimension_indexes_follow_columns() {
    let table = convert(&orders(), &[]).unwrap();
    assert_eq!(table.dimensions["order_id"].index, 0);
    assert_eq!(table.dimensions["amount"].index, 1);
    assert_eq!(table.dimensions["created_at"].index, 2);
    assert_eq!(table.dimensions["created_at_week"].index, 2);
}

#[test]
fn test_compile_table_attaches_lineage() {
    let models = vec![orders(), payments()];
    let graph = ModelGraph::build(&models);
    let table = compile_table(
        &models[0],
        &[],
        &graph,
        &builder(Dialect::Snowflake),
        &SpotlightConfig::default(),
    )
    .unwrap();
    let keys: Vec<&str> = table.lineage_graph.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["orders", "stg_orders"]);
    assert_eq!(
        table.lineage_graph["orders"],
        vec![LineageNode {
            name: "stg_orders".into(),
            kind: LineageNodeKind::Model,
        }]
    );
    assert_eq!(
        table.dimensions["created_at"].sql,
        "TO_TIMESTAMP_NTZ(CONVERT_TIMEZONE('UTC', ${TABLE}.created_at))"
    );
}
