//! ModelGraph - dependency graph across all models of a project.
//!
//! Nodes are models (and the non-model nodes they depend on, such as seeds
//! and sources); an edge `a -> b` means `b` depends on `a`. The graph is built
//! once per compilation call and only read afterwards.
//!
//! The externally visible shape is [`LineageGraph`]: for one model, every
//! node of its family (ancestors, descendants and itself) mapped to that
//! node's *direct* dependencies.

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::{Dfs, EdgeRef, Reversed};
use petgraph::Direction;
use serde::{Deserialize, Serialize};

use crate::model::Model;

/// Kind of node in the project graph, taken from the id prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineageNodeKind {
    Model,
    Seed,
    Source,
    Snapshot,
}

impl LineageNodeKind {
    fn from_unique_id(id: &str) -> Self {
        match id.split('.').next() {
            Some("seed") => LineageNodeKind::Seed,
            Some("source") => LineageNodeKind::Source,
            Some("snapshot") => LineageNodeKind::Snapshot,
            _ => LineageNodeKind::Model,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineageNode {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: LineageNodeKind,
}

/// Node name -> direct dependencies, restricted to one model's family.
pub type LineageGraph = IndexMap<String, Vec<LineageNode>>;

/// Dependency graph over a batch of models.
#[derive(Debug, Clone, Default)]
pub struct ModelGraph {
    graph: DiGraph<LineageNode, ()>,
    index_by_id: HashMap<String, NodeIndex>,
}

impl ModelGraph {
    /// Build the graph from every model's declared dependencies.
    pub fn build(models: &[Model]) -> Self {
        let mut graph = ModelGraph::default();

        for model in models {
            graph.add_node(
                model.node_id(),
                LineageNode {
                    name: model.name.clone(),
                    kind: LineageNodeKind::Model,
                },
            );
        }

        for model in models {
            let Some(&target) = graph.index_by_id.get(&model.node_id()) else {
                continue;
            };
            for dependency in &model.depends_on.nodes {
                let source = match graph.index_by_id.get(dependency) {
                    Some(&index) => index,
                    None => graph.add_node(
                        dependency.clone(),
                        LineageNode {
                            name: dependency
                                .rsplit('.')
                                .next()
                                .unwrap_or(dependency.as_str())
                                .to_string(),
                            kind: LineageNodeKind::from_unique_id(dependency),
                        },
                    ),
                };
                if graph.graph.find_edge(source, target).is_none() {
                    graph.graph.add_edge(source, target, ());
                }
            }
        }

        tracing::debug!(
            nodes = graph.graph.node_count(),
            edges = graph.graph.edge_count(),
            "built model graph"
        );
        graph
    }

    fn add_node(&mut self, id: String, node: LineageNode) -> NodeIndex {
        *self
            .index_by_id
            .entry(id)
            .or_insert_with(|| self.graph.add_node(node))
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Ancestors, descendants and the node itself.
    fn family(&self, start: NodeIndex) -> HashSet<NodeIndex> {
        let mut family = HashSet::new();

        let mut descendants = Dfs::new(&self.graph, start);
        while let Some(node) = descendants.next(&self.graph) {
            family.insert(node);
        }

        let reversed = Reversed(&self.graph);
        let mut ancestors = Dfs::new(reversed, start);
        while let Some(node) = ancestors.next(reversed) {
            family.insert(node);
        }

        family
    }

    /// Direct dependencies of a node, in declaration order.
    fn direct_dependencies(&self, node: NodeIndex) -> Vec<LineageNode> {
        let mut edges: Vec<_> = self
            .graph
            .edges_directed(node, Direction::Incoming)
            .collect();
        edges.sort_by_key(|edge| edge.id());
        edges
            .into_iter()
            .map(|edge| self.graph[edge.source()].clone())
            .collect()
    }

    /// Lineage subgraph for one model; only the model itself when unknown.
    pub fn lineage_for(&self, model: &Model) -> LineageGraph {
        let Some(&start) = self.index_by_id.get(&model.node_id()) else {
            return IndexMap::from([(model.name.clone(), Vec::new())]);
        };

        let family = self.family(start);
        self.graph
            .node_indices()
            .filter(|index| family.contains(index))
            .map(|index| (self.graph[index].name.clone(), self.direct_dependencies(index)))
            .collect()
    }
}
