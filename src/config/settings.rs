//! Settings file parsing.
//!
//! Supports TOML configuration files with sections for catalog matching,
//! the target warehouse and spotlight defaults:
//!
//! ```toml
//! [catalog]
//! case_sensitive = false
//! strict = true
//!
//! [warehouse]
//! dialect = "snowflake"
//! start_of_week = "sunday"
//!
//! [spotlight]
//! default_visibility = "show"
//!
//! [spotlight.categories.finance]
//! label = "Finance"
//! color = "blue"
//! ```

use std::collections::HashSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::model::types::{Visibility, Weekday};
use crate::sql::builder::DialectSqlBuilder;
use crate::sql::dialect::Dialect;

/// Settings file name looked up in the working directory.
pub const DEFAULT_SETTINGS_FILE: &str = "canopy.toml";

/// Error type for settings operations.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Root settings structure.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    pub catalog: CatalogSettings,
    pub warehouse: WarehouseSettings,
    pub spotlight: SpotlightConfig,
}

/// How models and columns are matched against the warehouse catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct CatalogSettings {
    /// Compare database, schema, table and column names exactly.
    pub case_sensitive: bool,

    /// Fail on a missing catalog entry instead of leaving the type unset.
    pub strict: bool,
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            case_sensitive: true,
            strict: true,
        }
    }
}

/// Target warehouse.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct WarehouseSettings {
    pub dialect: Dialect,

    /// First day of the week for week truncation. Unset uses the warehouse default.
    pub start_of_week: Option<Weekday>,
}

impl WarehouseSettings {
    pub fn sql_builder(&self) -> DialectSqlBuilder {
        DialectSqlBuilder::new(self.dialect).with_start_of_week(self.start_of_week)
    }
}

/// A spotlight category metrics and explores can be filed under.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct SpotlightCategory {
    pub label: String,
    pub color: Option<String>,
}

/// Default visibility and the known categories.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SpotlightConfig {
    pub default_visibility: Visibility,
    pub categories: IndexMap<String, SpotlightCategory>,
}

impl SpotlightConfig {
    pub fn has_category(&self, reference: &str) -> bool {
        self.categories.contains_key(reference)
    }
}

impl Settings {
    /// Parse settings from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, SettingsError> {
        let settings: Settings = toml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SettingsError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Load settings from the default locations.
    ///
    /// Searches in order:
    /// 1. Environment variable `CANOPY_CONFIG`
    /// 2. `./canopy.toml`
    ///
    /// Falls back to defaults when neither exists.
    pub fn discover() -> Result<Self, SettingsError> {
        if let Ok(path) = env::var("CANOPY_CONFIG") {
            return Self::load(&path);
        }

        let local_config = PathBuf::from(DEFAULT_SETTINGS_FILE);
        if local_config.exists() {
            return Self::load(&local_config);
        }

        Ok(Settings::default())
    }

    fn validate(&self) -> Result<(), SettingsError> {
        let mut seen = HashSet::new();
        for (reference, category) in &self.spotlight.categories {
            if category.label.trim().is_empty() {
                return Err(SettingsError::InvalidConfig(format!(
                    "spotlight category \"{}\" has no label",
                    reference
                )));
            }
            if !seen.insert(category.label.to_lowercase()) {
                return Err(SettingsError::InvalidConfig(format!(
                    "duplicate spotlight category label \"{}\"",
                    category.label
                )));
            }
        }
        Ok(())
    }
}
