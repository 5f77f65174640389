//! Spotlight visibility and categories for metrics and explores.

use crate::config::SpotlightConfig;
use crate::model::meta::SpotlightMeta;
use crate::model::types::Visibility;
use crate::semantic::error::{CompileError, CompileResult};
use crate::semantic::field::Spotlight;

/// Check every category against the configured set, keeping the first
/// occurrence of each.
pub fn resolve_categories(
    resource_kind: &str,
    resource_name: &str,
    config: &SpotlightConfig,
    categories: &[String],
) -> CompileResult<Vec<String>> {
    let mut resolved: Vec<String> = Vec::new();
    for category in categories {
        if !resolved.contains(category) {
            resolved.push(category.clone());
        }
    }

    let invalid: Vec<&str> = resolved
        .iter()
        .filter(|category| !config.has_category(category))
        .map(String::as_str)
        .collect();
    if !invalid.is_empty() {
        return Err(CompileError::MetadataParse(format!(
            "Invalid spotlight categories found in {} \"{}\": {}. Categories must be defined in the project config",
            resource_kind,
            resource_name,
            invalid.join(", ")
        )));
    }
    Ok(resolved)
}

/// Visibility declared on the model, else the configured default.
pub fn model_visibility(model: Option<&SpotlightMeta>, config: &SpotlightConfig) -> Visibility {
    model
        .and_then(|spotlight| spotlight.visibility)
        .unwrap_or(config.default_visibility)
}

/// Spotlight of a metric: its own visibility over the model's, and the union
/// of model and metric categories.
pub fn metric_spotlight(
    name: &str,
    own: Option<&SpotlightMeta>,
    model: Option<&SpotlightMeta>,
    config: &SpotlightConfig,
) -> CompileResult<Spotlight> {
    let visibility = own
        .and_then(|spotlight| spotlight.visibility)
        .unwrap_or_else(|| model_visibility(model, config));

    let categories: Vec<String> = [model, own]
        .into_iter()
        .flatten()
        .flat_map(|spotlight| spotlight.categories.iter().flatten().cloned())
        .collect();

    Ok(Spotlight {
        visibility,
        categories: resolve_categories("metric", name, config, &categories)?,
    })
}

/// Spotlight of an explore, taken from its model.
pub fn explore_spotlight(
    name: &str,
    model: Option<&SpotlightMeta>,
    config: &SpotlightConfig,
) -> CompileResult<Spotlight> {
    let categories = model
        .and_then(|spotlight| spotlight.categories.clone())
        .unwrap_or_default();
    Ok(Spotlight {
        visibility: model_visibility(model, config),
        categories: resolve_categories("explore", name, config, &categories)?,
    })
}
