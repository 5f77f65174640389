//! Semantic layer - tables, fields, explores and lineage.
//!
//! This module holds the compiled output of the pipeline and the project
//! dependency graph:
//!
//! - [`field`] - dimensions and metrics, raw and compiled
//! - [`filter`] - declarative filter rules
//! - [`table`] - one table per model
//! - [`explore`] - compiled explores and contained failures
//! - [`model_graph`] - dependency graph used for per-table lineage
//! - [`error`] - compile errors and their inline classification

pub mod error;
pub mod explore;
pub mod field;
pub mod filter;
pub mod model_graph;
pub mod table;

// Re-export error types
pub use error::{
    AtStage, CollisionKind, CompileError, CompileResult, CompileStage, InlineError,
    InlineErrorKind, InlineErrorType, StagedError,
};

// Re-export output types
pub use explore::{
    satisfies_required_attributes, CompiledJoin, Explore, ExploreError, ExploreOutcome,
    UserAttributes,
};
pub use field::{
    default_sql, friendly_name, Compiled, CompiledDimension, CompiledMetric, Dimension, Field,
    Metric, Spotlight,
};
pub use filter::{FilterOperator, MetricFilterRule, ModelFilterRule};
pub use model_graph::{LineageGraph, LineageNode, LineageNodeKind, ModelGraph};
pub use table::{CompiledTable, DefaultTimeDimension, Table, TableOf};
