// src/model/column.rs
use serde::{Deserialize, Serialize};

use super::meta::{ColumnMeta, Overlay};

/// A column of a model, as declared in the manifest.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    /// Declared or catalog-attached type, as a dimension type name.
    #[serde(default)]
    pub data_type: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub meta: ColumnMeta,
    #[serde(default)]
    pub config: ColumnConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnConfig {
    pub meta: ColumnMeta,
}

impl Column {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_data_type(mut self, data_type: impl Into<String>) -> Self {
        self.data_type = Some(data_type.into());
        self
    }

    /// `meta` overlaid by `config.meta`.
    pub fn resolved_meta(&self) -> ColumnMeta {
        self.meta.clone().overlay(self.config.meta.clone())
    }
}
