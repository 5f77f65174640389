//! Configuration module for Canopy.
//!
//! Handles catalog matching, warehouse and spotlight settings.

mod settings;

pub use settings::{
    CatalogSettings, Settings, SettingsError, SpotlightCategory, SpotlightConfig,
    WarehouseSettings, DEFAULT_SETTINGS_FILE,
};
