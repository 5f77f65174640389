//! ExploreCompiler: tables and joins into compiled explores.
//!
//! Every explore of a model compiles independently:
//!
//! ```text
//! TableCompiled ──[include joined tables, resolve join SQL]──► JoinsResolved
//! JoinsResolved ──[resolve field and sql_where templates]──► Explore
//! ```
//!
//! A failure is reported with the stage it interrupted and never affects a
//! sibling explore.

use std::cell::RefCell;
use std::collections::HashMap;

use indexmap::IndexMap;

use super::spotlight::explore_spotlight;
use super::template::{FieldRef, Rendered, Segment, Template};
use super::to_list;
use crate::config::SpotlightConfig;
use crate::model::meta::{JoinSpec, SpotlightMeta};
use crate::model::Model;
use crate::semantic::error::{AtStage, CompileError, CompileResult, CompileStage, StagedError};
use crate::semantic::explore::{CompiledJoin, Explore, ExploreError, ExploreOutcome};
use crate::semantic::field::{friendly_name, Compiled, Dimension, Field, Metric};
use crate::semantic::table::{CompiledTable, Table};
use crate::sql::builder::WarehouseSqlBuilder;

/// One explore to create from a model: its own or an additional one.
#[derive(Debug, Clone, PartialEq)]
pub struct ExploreDefinition {
    pub name: String,
    pub label: String,
    pub group_label: Option<String>,
    pub joins: Vec<JoinSpec>,
    pub description: Option<String>,
}

impl ExploreDefinition {
    /// The model's base explore followed by its additional explores.
    pub fn for_model(model: &Model) -> Vec<ExploreDefinition> {
        let meta = model.resolved_meta();
        let mut definitions = vec![ExploreDefinition {
            name: model.name.clone(),
            label: meta
                .label
                .clone()
                .unwrap_or_else(|| friendly_name(&model.name)),
            group_label: meta.group_label.clone(),
            joins: meta.joins.clone().unwrap_or_default(),
            description: meta.description.clone(),
        }];
        for (name, explore) in &meta.explores {
            definitions.push(ExploreDefinition {
                name: name.clone(),
                label: explore.label.clone().unwrap_or_else(|| friendly_name(name)),
                group_label: explore.group_label.clone().or_else(|| meta.group_label.clone()),
                joins: explore.joins.clone().unwrap_or_default(),
                description: explore.description.clone(),
            });
        }
        definitions
    }

    fn is_additional(&self, source: &ExploreSource) -> bool {
        self.name != source.base_table
    }
}

/// Properties every explore of one model shares.
#[derive(Debug, Clone, PartialEq)]
pub struct ExploreSource {
    pub base_table: String,
    pub tags: Vec<String>,
    pub warehouse: Option<String>,
    pub databricks_compute: Option<String>,
    pub yml_path: Option<String>,
    pub sql_path: Option<String>,
    pub ai_hint: Option<Vec<String>>,
    pub description: Option<String>,
    pub spotlight: Option<SpotlightMeta>,
}

impl ExploreSource {
    pub fn from_model(model: &Model) -> Self {
        let meta = model.resolved_meta();
        Self {
            base_table: model.name.clone(),
            tags: model.resolved_tags(),
            warehouse: model.config.snowflake_warehouse.clone(),
            databricks_compute: model.config.databricks_compute.clone(),
            yml_path: model.yml_path(),
            sql_path: model.path.clone(),
            ai_hint: to_list(meta.ai_hint.as_ref()),
            description: meta.description,
            spotlight: meta.spotlight,
        }
    }
}

// ============================================================================
// Field SQL resolution
// ============================================================================

/// Resolves field templates against the tables of one explore.
///
/// Rendered dimensions are memoised by `table.field` for the lifetime of the
/// resolver, so shared sub-references render once.
struct FieldResolver<'t> {
    tables: &'t IndexMap<String, Table>,
    builder: &'t dyn WarehouseSqlBuilder,
    rendered: RefCell<HashMap<String, Rendered>>,
}

fn missing_reference(current: &str, kind: &str, reference: FieldRef<'_>) -> CompileError {
    CompileError::FieldReference {
        table: current.to_string(),
        message: format!(
            "Model \"{}\" has a {} reference: {} which matches no {}",
            current, kind, reference, kind
        ),
    }
}

fn template_error(table: &str, error: impl std::fmt::Display) -> CompileError {
    CompileError::FieldReference {
        table: table.to_string(),
        message: error.to_string(),
    }
}

impl<'t> FieldResolver<'t> {
    fn new(tables: &'t IndexMap<String, Table>, builder: &'t dyn WarehouseSqlBuilder) -> Self {
        Self {
            tables,
            builder,
            rendered: RefCell::new(HashMap::new()),
        }
    }

    fn quoted_table(&self, table: &str) -> Rendered {
        Rendered::new(self.builder.quote_identifier(table)).with_tables([table.to_string()])
    }

    fn find_dimension(&self, current: &str, reference: FieldRef<'_>) -> CompileResult<&'t Dimension> {
        self.tables
            .get(reference.table.unwrap_or(current))
            .and_then(|table| table.dimensions.get(reference.name))
            .ok_or_else(|| missing_reference(current, "dimension", reference))
    }

    fn find_metric(&self, current: &str, reference: FieldRef<'_>) -> Option<&'t Metric> {
        self.tables
            .get(reference.table.unwrap_or(current))
            .and_then(|table| table.metrics.get(reference.name))
    }

    /// Enter a field, failing when it is already being resolved.
    fn enter(&self, table: &str, name: &str, stack: &mut Vec<String>) -> CompileResult<()> {
        let id = format!("{}.{}", table, name);
        if stack.contains(&id) {
            let mut path = stack.clone();
            path.push(id.clone());
            return Err(CompileError::FieldReference {
                table: table.to_string(),
                message: format!(
                    "Field \"{}\" has a cyclic reference: {}",
                    id,
                    path.join(" -> ")
                ),
            });
        }
        stack.push(id);
        Ok(())
    }

    fn dimension(&self, dimension: &Dimension, stack: &mut Vec<String>) -> CompileResult<Rendered> {
        let id = format!("{}.{}", dimension.table, dimension.name);
        if let Some(done) = self.rendered.borrow().get(&id) {
            return Ok(done.clone());
        }
        self.enter(&dimension.table, &dimension.name, stack)?;
        let template =
            Template::parse(&dimension.sql).map_err(|e| template_error(&dimension.table, e))?;
        let rendered = template.render(|segment| match segment {
            Segment::Table => Ok(self.quoted_table(&dimension.table)),
            Segment::Field(reference) => {
                let target = self.find_dimension(&dimension.table, reference)?;
                self.dimension(target, stack)
            }
            Segment::Text(text) => Ok(Rendered::new(text)),
        })?;
        stack.pop();
        let rendered = Rendered::new(rendered.sql)
            .with_tables([dimension.table.clone()])
            .with_tables(rendered.tables);
        self.rendered.borrow_mut().insert(id, rendered.clone());
        Ok(rendered)
    }

    fn metric(&self, metric: &Metric, stack: &mut Vec<String>) -> CompileResult<Rendered> {
        self.enter(&metric.table, &metric.name, stack)?;
        let template = Template::parse(&metric.sql).map_err(|e| template_error(&metric.table, e))?;
        let mut rendered = template.render(|segment| match segment {
            Segment::Table => Ok(self.quoted_table(&metric.table)),
            Segment::Field(reference) => {
                if !metric.type_.is_aggregate() {
                    if let Some(target) = self.find_metric(&metric.table, reference) {
                        let inner = self.metric(target, stack)?;
                        return Ok(Rendered {
                            sql: format!("({})", inner.sql),
                            tables: inner.tables,
                        });
                    }
                }
                let target = self.find_dimension(&metric.table, reference)?;
                self.dimension(target, stack)
            }
            Segment::Text(text) => Ok(Rendered::new(text)),
        })?;

        if !metric.filters.is_empty() {
            let mut conditions = Vec::with_capacity(metric.filters.len());
            for rule in &metric.filters {
                let reference = match rule.target.field_ref.split_once('.') {
                    Some((table, name)) => FieldRef {
                        table: Some(table),
                        name,
                    },
                    None => FieldRef {
                        table: None,
                        name: &rule.target.field_ref,
                    },
                };
                let target = self.find_dimension(&metric.table, reference)?;
                let field = self.dimension(target, stack)?;
                conditions.push(rule.to_sql(&field.sql, self.builder));
                rendered.add_tables(field.tables);
            }
            rendered.sql = format!(
                "CASE WHEN ({}) THEN {} ELSE NULL END",
                conditions.join(" AND "),
                rendered.sql
            );
        }
        stack.pop();

        let sql = self
            .builder
            .metric_sql(&rendered.sql, metric.type_, metric.percentile);
        Ok(Rendered::new(sql)
            .with_tables([metric.table.clone()])
            .with_tables(rendered.tables))
    }

    fn compile_table(&self, table: &Table) -> CompileResult<CompiledTable> {
        let mut dimensions = IndexMap::with_capacity(table.dimensions.len());
        for (name, dimension) in &table.dimensions {
            let rendered = self.dimension(dimension, &mut Vec::new())?;
            dimensions.insert(
                name.clone(),
                Compiled {
                    field: dimension.clone(),
                    compiled_sql: rendered.sql,
                    tables_references: rendered.tables,
                },
            );
        }

        let mut metrics = IndexMap::with_capacity(table.metrics.len());
        for (name, metric) in &table.metrics {
            let rendered = self.metric(metric, &mut Vec::new())?;
            metrics.insert(
                name.clone(),
                Compiled {
                    field: metric.clone(),
                    compiled_sql: rendered.sql,
                    tables_references: rendered.tables,
                },
            );
        }

        let mut compiled = table.clone().with_fields(dimensions, metrics);
        if let Some(sql_where) = &table.sql_where {
            compiled.sql_where = Some(self.sql_where(&table.name, sql_where)?);
            compiled.uncompiled_sql_where = Some(sql_where.clone());
        }
        Ok(compiled)
    }

    fn sql_where(&self, table: &str, sql: &str) -> CompileResult<String> {
        let template = Template::parse(sql).map_err(|e| template_error(table, e))?;
        let rendered = template.render(|segment| match segment {
            Segment::Table => Ok(self.quoted_table(table)),
            Segment::Field(reference) => {
                let target = self.find_dimension(table, reference)?;
                self.dimension(target, &mut Vec::new())
            }
            Segment::Text(text) => Ok(Rendered::new(text)),
        })?;
        Ok(rendered.sql)
    }

    fn join(&self, explore: &str, key: &str, join: &JoinSpec) -> CompileResult<CompiledJoin> {
        let failure = |message: String| CompileError::JoinResolution {
            explore: explore.to_string(),
            message,
        };
        let template = Template::parse(&join.sql_on)
            .map_err(|e| failure(format!("Failed to compile join sql: {}", e)))?;
        let rendered = template.render(|segment| match segment {
            Segment::Table => Ok(self.quoted_table(key)),
            Segment::Field(reference) => {
                let table_name = reference.table.unwrap_or(key);
                let Some(table) = self.tables.get(table_name) else {
                    return Err(failure(format!(
                        "Failed to compile join sql. Table \"{}\" not found",
                        table_name
                    )));
                };
                let Some(dimension) = table.dimensions.get(reference.name) else {
                    return Err(failure(format!(
                        "Failed to compile join sql. Dimension \"{}\" not found in table \"{}\"",
                        reference.name, table_name
                    )));
                };
                let inner = self.dimension(dimension, &mut Vec::new())?;
                Ok(Rendered {
                    sql: format!("({})", inner.sql),
                    tables: vec![table_name.to_string()],
                })
            }
            Segment::Text(text) => Ok(Rendered::new(text)),
        })?;

        Ok(CompiledJoin {
            table: key.to_string(),
            sql_on: join.sql_on.clone(),
            compiled_sql_on: rendered.sql,
            type_: join.type_,
            hidden: join.hidden.unwrap_or(false),
            always: join.always.unwrap_or(false),
            relationship: join.relationship,
            tables_references: Rendered::default()
                .with_tables([key.to_string()])
                .with_tables(rendered.tables)
                .tables,
        })
    }
}

// ============================================================================
// Explore assembly
// ============================================================================

/// Copy of a joined table under its key in the explore.
fn joined_table(source: &Table, key: &str, join: &JoinSpec) -> Table {
    let label = join
        .label
        .clone()
        .or_else(|| join.alias.as_deref().map(friendly_name))
        .unwrap_or_else(|| source.label.clone());
    let hidden = join.hidden.unwrap_or(false);
    let allowed = |name: &str| match &join.fields {
        Some(fields) => fields.iter().any(|field| field == name),
        None => true,
    };

    let mut table = source.clone();
    table.name = key.to_string();
    table.label = label.clone();
    table.dimensions.retain(|name, dimension| {
        allowed(name.as_str())
            || dimension
                .time_interval_base_dimension_name
                .as_deref()
                .is_some_and(allowed)
    });
    table.metrics.retain(|name, _| allowed(name.as_str()));

    for dimension in table.dimensions.values_mut() {
        dimension.reown(key, &label);
        if hidden {
            dimension.hide();
        }
    }
    for metric in table.metrics.values_mut() {
        metric.reown(key, &label);
        if hidden {
            metric.hide();
        }
    }
    table
}

/// Compiles the explores of one model against the batch's tables.
#[derive(Debug, Clone, Copy)]
pub struct ExploreCompiler<'a> {
    builder: &'a dyn WarehouseSqlBuilder,
    spotlight: &'a SpotlightConfig,
}

impl<'a> ExploreCompiler<'a> {
    pub fn new(builder: &'a dyn WarehouseSqlBuilder, spotlight: &'a SpotlightConfig) -> Self {
        Self { builder, spotlight }
    }

    /// Tables of the explore keyed by name or alias, base table first.
    fn include_tables(
        &self,
        definition: &ExploreDefinition,
        source: &ExploreSource,
        tables: &IndexMap<String, Table>,
    ) -> CompileResult<IndexMap<String, Table>> {
        let base = tables
            .get(&source.base_table)
            .ok_or_else(|| CompileError::JoinResolution {
                explore: definition.name.clone(),
                message: format!(
                    "Failed to compile explore \"{}\". Base table \"{}\" is missing",
                    definition.name, source.base_table
                ),
            })?;

        let mut included = IndexMap::from([(source.base_table.clone(), base.clone())]);
        for join in &definition.joins {
            let Some(joined) = tables.get(&join.join) else {
                return Err(CompileError::JoinResolution {
                    explore: definition.name.clone(),
                    message: format!(
                        "Failed to compile explore \"{}\". Tried to join table \"{}\" to \"{}\" but \"{}\" is missing",
                        definition.name, join.join, source.base_table, join.join
                    ),
                });
            };
            let key = join.alias.clone().unwrap_or_else(|| join.join.clone());
            if included.contains_key(&key) {
                return Err(CompileError::JoinResolution {
                    explore: definition.name.clone(),
                    message: format!(
                        "Failed to compile explore \"{}\". Table \"{}\" is joined more than once, use an alias",
                        definition.name, key
                    ),
                });
            }
            included.insert(key.clone(), joined_table(joined, &key, join));
        }
        Ok(included)
    }

    /// Compile one explore.
    pub fn compile_explore(
        &self,
        definition: &ExploreDefinition,
        source: &ExploreSource,
        tables: &IndexMap<String, Table>,
    ) -> Result<Explore, StagedError> {
        let included = self
            .include_tables(definition, source, tables)
            .at_stage(CompileStage::TableCompiled)?;
        let resolver = FieldResolver::new(&included, self.builder);

        let joined_tables = definition
            .joins
            .iter()
            .map(|join| {
                let key = join.alias.as_deref().unwrap_or(&join.join);
                resolver.join(&definition.name, key, join)
            })
            .collect::<CompileResult<Vec<_>>>()
            .at_stage(CompileStage::TableCompiled)?;

        let compiled_tables = included
            .iter()
            .map(|(key, table)| {
                resolver
                    .compile_table(table)
                    .map(|compiled| (key.clone(), compiled))
            })
            .collect::<CompileResult<IndexMap<_, _>>>()
            .at_stage(CompileStage::JoinsResolved)?;
        let spotlight = explore_spotlight(&definition.name, source.spotlight.as_ref(), self.spotlight)
            .at_stage(CompileStage::JoinsResolved)?;

        Ok(Explore {
            name: definition.name.clone(),
            label: definition.label.clone(),
            tags: source.tags.clone(),
            group_label: definition.group_label.clone(),
            base_table: source.base_table.clone(),
            joined_tables,
            tables: compiled_tables,
            unfiltered_tables: None,
            target_database: self.builder.adapter_kind(),
            warehouse: source.warehouse.clone(),
            databricks_compute: source.databricks_compute.clone(),
            yml_path: source.yml_path.clone(),
            sql_path: source.sql_path.clone(),
            spotlight: Some(spotlight),
            ai_hint: source.ai_hint.clone(),
            description: definition
                .description
                .clone()
                .or_else(|| source.description.clone()),
        })
    }

    /// Compile every explore of a model; failures become [`ExploreError`]s.
    pub fn compile_model_explores(
        &self,
        model: &Model,
        tables: &IndexMap<String, Table>,
    ) -> Vec<ExploreOutcome> {
        let source = ExploreSource::from_model(model);
        ExploreDefinition::for_model(model)
            .into_iter()
            .map(|definition| match self.compile_explore(&definition, &source, tables) {
                Ok(explore) => ExploreOutcome::Success(explore),
                Err(failure) => {
                    let message = |error: &str| {
                        if definition.is_additional(&source) {
                            format!(
                                "Could not convert additional explore \"{}\" from model \"{}\": {}",
                                definition.name, source.base_table, error
                            )
                        } else {
                            format!("Could not convert model \"{}\": {}", definition.name, error)
                        }
                    };
                    tracing::warn!(
                        explore = %definition.name,
                        model = %source.base_table,
                        stage = ?failure.stage,
                        error = %failure.error,
                        "explore failed to compile"
                    );
                    ExploreOutcome::Failure(ExploreError {
                        name: definition.name.clone(),
                        label: definition.label.clone(),
                        group_label: definition.group_label.clone(),
                        base_table: Some(source.base_table.clone()),
                        tags: source.tags.clone(),
                        yml_path: source.yml_path.clone(),
                        sql_path: source.sql_path.clone(),
                        stage: failure.stage,
                        errors: vec![failure.error.to_inline_with(message)],
                    })
                }
            })
            .collect()
    }
}
