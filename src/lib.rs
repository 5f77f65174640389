//! # Canopy
//!
//! A semantic-model compiler that turns annotated warehouse models into
//! query-ready explores with dialect-specific SQL.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │        Models + legacy metrics (manifest JSON)          │
//! │  (columns, dimension/metric meta, joins, explores)      │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [catalog]
//! ┌─────────────────────────────────────────────────────────┐
//! │           Models with warehouse column types            │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [semantic::model_graph]
//! ┌─────────────────────────────────────────────────────────┐
//! │      ModelGraph (project-wide dependency lineage)       │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [translation: dimension, metric, table]
//! ┌─────────────────────────────────────────────────────────┐
//! │        Tables (dimensions, metrics, lineage)            │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [translation::explore]
//! ┌─────────────────────────────────────────────────────────┐
//! │    Vec<ExploreOutcome> (Explore | ExploreError)         │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! Warehouse-specific SQL is produced through [`sql::WarehouseSqlBuilder`];
//! [`compile`] holds the batch entry points.

pub mod catalog;
pub mod compile;
pub mod config;
pub mod model;
pub mod semantic;
pub mod sql;
pub mod translation;

/// Re-exports for convenient usage.
pub mod prelude {
    pub use crate::catalog::{attach_types_to_models, WarehouseCatalog};
    pub use crate::compile::{compile_explores, compile_project, compile_values, CompileOptions};
    pub use crate::config::{CatalogSettings, Settings, SpotlightConfig};
    pub use crate::model::{Column, DbtMetric, Model};
    pub use crate::semantic::{
        CompileError, CompileResult, CompileStage, Dimension, Explore, ExploreError,
        ExploreOutcome, InlineError, InlineErrorKind, InlineErrorType, Metric, Table,
    };
    pub use crate::sql::{Dialect, DialectSqlBuilder, SqlDialect, TimeFrame, WarehouseSqlBuilder};
}

pub use compile::{compile_explores, compile_project, compile_values, CompileOptions};
pub use semantic::{Explore, ExploreError, ExploreOutcome};
pub use sql::Dialect;
