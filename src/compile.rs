//! Batch compilation from annotated models to explores.
//!
//! This module provides the entry points of the compiler:
//!
//! ```text
//! Models ─► [attach catalog types] ─► Build ModelGraph
//!        ─► per model: TableCompiler (+ lineage)   ─┐
//!        ─► per model: ExploreCompiler over tables ◄┘ ─► Vec<ExploreOutcome>
//! ```
//!
//! Per-model work is independent once the model graph is built and runs on
//! rayon when [`CompileOptions::parallel`] is set. Every failure is contained:
//! a model that cannot be compiled becomes one [`ExploreError`], and the rest
//! of the batch proceeds.
//!
//! # Example
//!
//! ```ignore
//! use canopy::compile::{compile_explores, CompileOptions};
//! use canopy::sql::{Dialect, DialectSqlBuilder};
//!
//! let builder = DialectSqlBuilder::new(Dialect::Postgres);
//! let outcomes = compile_explores(&models, &[], &builder, &CompileOptions::default());
//! for outcome in &outcomes {
//!     println!("{}: {}", outcome.name(), outcome.is_success());
//! }
//! ```

use std::borrow::Cow;

use indexmap::IndexMap;
use rayon::prelude::*;
use serde_json::Value;

use crate::catalog::{attach_types_to_model, WarehouseCatalog};
use crate::config::{CatalogSettings, Settings, SpotlightConfig};
use crate::model::metric::DbtMetric;
use crate::model::Model;
use crate::semantic::error::{CompileError, CompileResult, CompileStage};
use crate::semantic::explore::{ExploreError, ExploreOutcome};
use crate::semantic::model_graph::ModelGraph;
use crate::semantic::table::Table;
use crate::sql::builder::WarehouseSqlBuilder;
use crate::translation::{compile_table, table_label, usable_metrics, ExploreCompiler};

pub use crate::catalog::attach_types_to_models;

// ============================================================================
// Options
// ============================================================================

/// Options for compilation.
#[derive(Debug, Clone, PartialEq)]
pub struct CompileOptions {
    /// Catalog lookup mode used by [`compile_project`].
    pub catalog: CatalogSettings,
    /// Spotlight defaults and the allowed category set.
    pub spotlight: SpotlightConfig,
    /// Compile models on the rayon thread pool.
    pub parallel: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            catalog: CatalogSettings::default(),
            spotlight: SpotlightConfig::default(),
            parallel: true,
        }
    }
}

impl CompileOptions {
    /// Options taken from loaded project settings.
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            catalog: settings.catalog,
            spotlight: settings.spotlight.clone(),
            ..Self::default()
        }
    }

    pub fn with_catalog(mut self, catalog: CatalogSettings) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn with_spotlight(mut self, spotlight: SpotlightConfig) -> Self {
        self.spotlight = spotlight;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }
}

// ============================================================================
// Raw Input
// ============================================================================

/// Models read one entry at a time from manifest JSON.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedModels {
    pub models: Vec<Model>,
    /// One `PENDING` failure per entry that is not a valid model.
    pub rejected: Vec<ExploreOutcome>,
}

/// Failure record for a manifest entry that does not deserialize.
fn rejected_entry(index: usize, value: &Value, error: &serde_json::Error) -> ExploreOutcome {
    let text = |key: &str| value.get(key).and_then(Value::as_str).map(str::to_string);
    let mut stub = Model::new(text("name").unwrap_or_else(|| format!("model_{}", index)));
    stub.patch_path = text("patch_path");
    stub.path = text("path");
    stub.tags = value
        .get("tags")
        .and_then(Value::as_array)
        .map(|tags| tags.iter().filter_map(Value::as_str).map(str::to_string).collect())
        .unwrap_or_default();

    let error = CompileError::MetadataParse(format!(
        "Could not parse model \"{}\": {}",
        stub.name, error
    ));
    tracing::warn!(model = %stub.name, error = %error, "model entry rejected");
    ExploreOutcome::Failure(ExploreError {
        name: stub.name.clone(),
        label: table_label(&stub),
        group_label: None,
        base_table: None,
        tags: stub.tags.clone(),
        yml_path: stub.yml_path(),
        sql_path: stub.path.clone(),
        stage: CompileStage::Pending,
        errors: vec![error.to_inline()],
    })
}

/// Deserialize each manifest entry on its own so one malformed entry only
/// rejects itself.
pub fn parse_models(values: Vec<Value>) -> ParsedModels {
    let mut parsed = ParsedModels::default();
    for (index, value) in values.into_iter().enumerate() {
        match serde_json::from_value::<Model>(value.clone()) {
            Ok(model) => parsed.models.push(model),
            Err(error) => parsed.rejected.push(rejected_entry(index, &value, &error)),
        }
    }
    parsed
}

// ============================================================================
// Compilation Functions
// ============================================================================

/// Apply `f` to every model, in input order.
fn map_models<'m, T, F>(models: &'m [Model], parallel: bool, f: F) -> Vec<T>
where
    T: Send,
    F: Fn(&'m Model) -> T + Sync + Send,
{
    if parallel {
        models.par_iter().map(f).collect()
    } else {
        models.iter().map(f).collect()
    }
}

/// Failure record for a model whose table did not compile.
fn table_failure(model: &Model, error: &CompileError) -> ExploreOutcome {
    tracing::warn!(model = %model.name, error = %error, "table failed to compile");
    ExploreOutcome::Failure(ExploreError {
        name: model.name.clone(),
        label: table_label(model),
        group_label: model.resolved_meta().group_label,
        base_table: None,
        tags: model.resolved_tags(),
        yml_path: model.yml_path(),
        sql_path: model.path.clone(),
        stage: CompileStage::Pending,
        errors: vec![error.to_inline()],
    })
}

/// Shared pipeline; `prepare` turns each input model into the one compiled.
fn compile_models<'m, P>(
    models: &'m [Model],
    metrics: &[DbtMetric],
    builder: &dyn WarehouseSqlBuilder,
    options: &CompileOptions,
    prepare: P,
) -> Vec<ExploreOutcome>
where
    P: Fn(&'m Model) -> CompileResult<Cow<'m, Model>> + Sync + Send,
{
    let graph = ModelGraph::build(models);

    let units = map_models(
        models,
        options.parallel,
        |model| -> CompileResult<(Cow<'m, Model>, Table)> {
            let prepared = prepare(model)?;
            let legacy = usable_metrics(&prepared.name, metrics);
            let table = compile_table(&prepared, &legacy, &graph, builder, &options.spotlight)?;
            Ok((prepared, table))
        },
    );

    let mut tables: IndexMap<String, Table> = IndexMap::new();
    let mut compiled: Vec<Cow<'m, Model>> = Vec::new();
    let mut table_errors: Vec<ExploreOutcome> = Vec::new();
    for (model, unit) in models.iter().zip(units) {
        match unit {
            Ok((prepared, table)) => {
                tables.insert(table.name.clone(), table);
                compiled.push(prepared);
            }
            Err(error) => table_errors.push(table_failure(model, &error)),
        }
    }

    let compiler = ExploreCompiler::new(builder, &options.spotlight);
    let mut outcomes: Vec<ExploreOutcome> = if options.parallel {
        compiled
            .par_iter()
            .flat_map_iter(|model| compiler.compile_model_explores(model, &tables))
            .collect()
    } else {
        compiled
            .iter()
            .flat_map(|model| compiler.compile_model_explores(model, &tables))
            .collect()
    };

    let explores = outcomes.iter().filter(|outcome| outcome.is_success()).count();
    tracing::info!(
        models = models.len(),
        tables = tables.len(),
        explores,
        failures = outcomes.len() - explores + table_errors.len(),
        "compiled explores"
    );
    outcomes.extend(table_errors);
    outcomes
}

/// Compile a batch of models whose column types are already attached.
///
/// Returns every explore in model order (base explore, then additional
/// explores), followed by one error per model whose table failed.
pub fn compile_explores(
    models: &[Model],
    metrics: &[DbtMetric],
    builder: &dyn WarehouseSqlBuilder,
    options: &CompileOptions,
) -> Vec<ExploreOutcome> {
    let _span = tracing::info_span!("compile_explores", models = models.len()).entered();
    compile_models(models, metrics, builder, options, |model| Ok(Cow::Borrowed(model)))
}

/// Attach catalog types and compile, per model.
///
/// A model missing from the catalog fails on its own instead of aborting the
/// batch as [`attach_types_to_models`] does.
pub fn compile_project(
    models: &[Model],
    catalog: &WarehouseCatalog,
    metrics: &[DbtMetric],
    builder: &dyn WarehouseSqlBuilder,
    options: &CompileOptions,
) -> Vec<ExploreOutcome> {
    let _span = tracing::info_span!(
        "compile_project",
        models = models.len(),
        catalog_tables = catalog.table_count()
    )
    .entered();
    compile_models(models, metrics, builder, options, |model| {
        attach_types_to_model(model, catalog, &options.catalog).map(Cow::Owned)
    })
}

/// Parse raw manifest entries, then compile them with or without a catalog.
///
/// Rejected entries are reported after every other outcome.
pub fn compile_values(
    values: Vec<Value>,
    catalog: Option<&WarehouseCatalog>,
    metrics: &[DbtMetric],
    builder: &dyn WarehouseSqlBuilder,
    options: &CompileOptions,
) -> Vec<ExploreOutcome> {
    let ParsedModels { models, rejected } = parse_models(values);
    let mut outcomes = match catalog {
        Some(catalog) => compile_project(&models, catalog, metrics, builder, options),
        None => compile_explores(&models, metrics, builder, options),
    };
    outcomes.extend(rejected);
    outcomes
}
