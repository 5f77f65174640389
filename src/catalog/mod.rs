//! Warehouse catalog and column type attachment.
//!
//! The catalog is a pre-fetched, in-memory snapshot of the target warehouse:
//!
//! ```text
//! database -> schema -> table -> column -> dimension type
//! ```
//!
//! [`attach_types_to_models`] checks every model against it and fills in each
//! column's `data_type`. Matching is exact or case-insensitive per
//! [`CatalogSettings::case_sensitive`]; a missing entry fails in strict mode
//! and leaves the type unset otherwise.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::config::CatalogSettings;
use crate::model::types::DimensionType;
use crate::model::Model;
use crate::semantic::error::{CompileError, CompileResult};

/// Column name -> type for one table.
pub type ColumnTypes = IndexMap<String, DimensionType>;

/// Three-level warehouse catalog.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WarehouseCatalog {
    databases: IndexMap<String, IndexMap<String, IndexMap<String, ColumnTypes>>>,
}

fn find_key<'a, V>(map: &'a IndexMap<String, V>, key: &str, case_sensitive: bool) -> Option<&'a V> {
    if case_sensitive {
        return map.get(key);
    }
    map.iter()
        .find(|(candidate, _)| candidate.eq_ignore_ascii_case(key))
        .map(|(_, value)| value)
}

impl WarehouseCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a table with its column types, replacing any previous entry.
    pub fn insert_table(
        &mut self,
        database: impl Into<String>,
        schema: impl Into<String>,
        table: impl Into<String>,
        columns: ColumnTypes,
    ) {
        self.databases
            .entry(database.into())
            .or_default()
            .entry(schema.into())
            .or_default()
            .insert(table.into(), columns);
    }

    pub fn table(
        &self,
        database: &str,
        schema: &str,
        table: &str,
        case_sensitive: bool,
    ) -> Option<&ColumnTypes> {
        let schemas = find_key(&self.databases, database, case_sensitive)?;
        let tables = find_key(schemas, schema, case_sensitive)?;
        find_key(tables, table, case_sensitive)
    }

    pub fn column_type(
        &self,
        database: &str,
        schema: &str,
        table: &str,
        column: &str,
        case_sensitive: bool,
    ) -> Option<DimensionType> {
        let columns = self.table(database, schema, table, case_sensitive)?;
        find_key(columns, column, case_sensitive).copied()
    }

    pub fn table_count(&self) -> usize {
        self.databases
            .values()
            .flat_map(|schemas| schemas.values())
            .map(|tables| tables.len())
            .sum()
    }
}

fn missing_table(model: &Model) -> CompileError {
    let table = model.warehouse_table_name();
    let path = format!("{}.{}.{}", model.database, model.schema, table);
    CompileError::CatalogMismatch {
        message: format!(
            "Model \"{}\" was expected in your target warehouse at \"{}\". Does the table exist in your target data warehouse?",
            model.name, path
        ),
        path,
    }
}

fn missing_column(model: &Model, column: &str) -> CompileError {
    let table = model.warehouse_table_name();
    let table_path = format!("{}.{}.{}", model.database, model.schema, table);
    CompileError::CatalogMismatch {
        message: format!(
            "Column \"{column}\" from model \"{table}\" does not exist.\n \"{table}.{column}\" was not found in your target warehouse at {table_path}. Try rebuilding the project to update your warehouse.",
        ),
        path: format!("{}.{}", table_path, column),
    }
}

/// Check that a model's relation exists in the catalog.
pub fn check_model_exists(
    model: &Model,
    catalog: &WarehouseCatalog,
    settings: &CatalogSettings,
) -> CompileResult<()> {
    let found = catalog
        .table(
            &model.database,
            &model.schema,
            model.warehouse_table_name(),
            settings.case_sensitive,
        )
        .is_some();
    if !found && settings.strict {
        return Err(missing_table(model));
    }
    Ok(())
}

/// Copy of `model` with every column's type taken from the catalog.
pub fn attach_types_to_model(
    model: &Model,
    catalog: &WarehouseCatalog,
    settings: &CatalogSettings,
) -> CompileResult<Model> {
    check_model_exists(model, catalog, settings)?;

    let mut typed = model.clone();
    for (name, column) in typed.columns.iter_mut() {
        let data_type = catalog.column_type(
            &model.database,
            &model.schema,
            model.warehouse_table_name(),
            name,
            settings.case_sensitive,
        );
        if data_type.is_none() && settings.strict {
            return Err(missing_column(model, name));
        }
        if data_type.is_none() {
            tracing::debug!(model = %model.name, column = %name, "column missing from catalog");
        }
        column.data_type = data_type.map(|t| t.as_str().to_string());
    }
    Ok(typed)
}

/// Attach catalog types to a whole batch.
///
/// Every model's relation is checked before any column is looked at, so in
/// strict mode a missing table is reported ahead of a missing column.
pub fn attach_types_to_models(
    models: &[Model],
    catalog: &WarehouseCatalog,
    settings: &CatalogSettings,
) -> CompileResult<Vec<Model>> {
    for model in models {
        check_model_exists(model, catalog, settings)?;
    }
    models
        .iter()
        .map(|model| attach_types_to_model(model, catalog, settings))
        .collect()
}
