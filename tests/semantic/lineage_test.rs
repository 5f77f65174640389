//! Tests for project lineage.

#[path = "../common/mod.rs"]
mod common;

use canopy::model::Model;
use canopy::semantic::{LineageNode, LineageNodeKind, ModelGraph};
use common::model;
use serde_json::json;

fn node(name: &str, kind: LineageNodeKind) -> LineageNode {
    LineageNode {
        name: name.to_string(),
        kind,
    }
}

/// raw_orders (seed) -> stg_orders -> orders -> revenue
///                      stripe.charges (source) -> payments -> revenue
///                      customers (unrelated)
fn project() -> Vec<Model> {
    vec![
        model(json!({
            "unique_id": "model.shop.stg_orders",
            "name": "stg_orders",
            "depends_on": { "nodes": ["seed.shop.raw_orders"] }
        })),
        model(json!({
            "unique_id": "model.shop.orders",
            "name": "orders",
            "depends_on": { "nodes": ["model.shop.stg_orders"] }
        })),
        model(json!({
            "unique_id": "model.shop.payments",
            "name": "payments",
            "depends_on": { "nodes": ["source.stripe.charges"] }
        })),
        model(json!({
            "unique_id": "model.shop.revenue",
            "name": "revenue",
            "depends_on": { "nodes": ["model.shop.orders", "model.shop.payments"] }
        })),
        model(json!({ "unique_id": "model.shop.customers", "name": "customers" })),
    ]
}

#[test]
fn test_family_covers_ancestors_and_descendants() {
    let models = project();
    let graph = ModelGraph::build(&models);
    let lineage = graph.lineage_for(&models[1]);

    let keys: Vec<&str> = lineage.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["stg_orders", "orders", "revenue", "raw_orders"]);
    assert!(lineage["raw_orders"].is_empty());
    assert_eq!(lineage["stg_orders"], vec![node("raw_orders", LineageNodeKind::Seed)]);
    assert_eq!(lineage["orders"], vec![node("stg_orders", LineageNodeKind::Model)]);
}

#[test]
fn test_dependencies_keep_declaration_order() {
    let models = project();
    let graph = ModelGraph::build(&models);
    let lineage = graph.lineage_for(&models[3]);
    assert_eq!(
        lineage["revenue"],
        vec![
            node("orders", LineageNodeKind::Model),
            node("payments", LineageNodeKind::Model),
        ]
    );
    assert_eq!(lineage["payments"], vec![node("charges", LineageNodeKind::Source)]);
    assert!(!lineage.contains_key("customers"));
}

#[test]
fn test_unrelated_model_stands_alone() {
    let models = project();
    let graph = ModelGraph::build(&models);
    let lineage = graph.lineage_for(&models[4]);
    assert_eq!(lineage.len(), 1);
    assert!(lineage["customers"].is_empty());
}

#[test]
fn test_shared_dependency_is_one_node() {
    let models = project();
    let graph = ModelGraph::build(&models);
    assert_eq!(graph.node_count(), 7);
}

#[test]
fn test_model_outside_batch() {
    let models = project();
    let graph = ModelGraph::build(&models);
    let stranger = model(json!({ "name": "forecasts" }));
    let lineage = graph.lineage_for(&stranger);
    assert_eq!(lineage.keys().collect::<Vec<_>>(), vec!["forecasts"]);
}

#[test]
fn test_lineage_serializes_with_type() {
    let models = project();
    let graph = ModelGraph::build(&models);
    let lineage = graph.lineage_for(&models[0]);
    let value = serde_json::to_value(&lineage["stg_orders"]).unwrap();
    assert_eq!(value, json!([{ "name": "raw_orders", "type": "seed" }]));
}
