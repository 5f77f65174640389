//! Annotation blocks attached to models and columns.
//!
//! Every block exists twice in a manifest: under `meta` and under
//! `config.meta`. The `config` layer wins field by field. Merging is done by
//! [`Overlay`], implemented per record kind so that every mergeable field is
//! listed explicitly; nested blocks merge recursively and keyed maps merge
//! entry by entry. Lists and scalar maps (colors, required attributes) are
//! replaced wholesale.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::types::{JoinRelationship, JoinType, StringOrVec, Visibility};

/// Field-wise merge of two annotation layers.
pub trait Overlay: Sized {
    /// Returns `self` with every field that is present in `over` taken from `over`.
    fn overlay(self, over: Self) -> Self;
}

/// Merge two optional nested blocks.
pub fn overlay_option<T: Overlay>(base: Option<T>, over: Option<T>) -> Option<T> {
    match (base, over) {
        (Some(base), Some(over)) => Some(base.overlay(over)),
        (base, over) => over.or(base),
    }
}

/// Merge keyed blocks entry by entry, keeping the position of existing keys.
pub fn overlay_map<T: Overlay + Default>(
    mut base: IndexMap<String, T>,
    over: IndexMap<String, T>,
) -> IndexMap<String, T> {
    for (key, value) in over {
        match base.get_mut(&key) {
            Some(slot) => {
                let current = std::mem::take(slot);
                *slot = current.overlay(value);
            }
            None => {
                base.insert(key, value);
            }
        }
    }
    base
}

macro_rules! impl_overlay {
    (
        $ty:ident {
            replace: [$($r:ident),* $(,)?],
            nested: [$($n:ident),* $(,)?],
            maps: [$($m:ident),* $(,)?] $(,)?
        }
    ) => {
        impl Overlay for $ty {
            fn overlay(self, over: Self) -> Self {
                Self {
                    $($r: over.$r.or(self.$r),)*
                    $($n: overlay_option(self.$n, over.$n),)*
                    $($m: overlay_map(self.$m, over.$m),)*
                }
            }
        }
    };
}

/// Attribute name -> accepted value(s) gating access to a field or table.
pub type RequiredAttributes = IndexMap<String, StringOrVec>;

/// A link rendered next to a field value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldUrl {
    pub label: String,
    pub url: String,
}

/// `time_intervals` as written in the manifest.
///
/// `false` or `"OFF"` disables expansion, `"default"` (or `true`) asks for the
/// default set, a list restricts the generated intervals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TimeIntervalsSpec {
    Flag(bool),
    Keyword(String),
    List(Vec<String>),
}

impl TimeIntervalsSpec {
    pub fn is_off(&self) -> bool {
        match self {
            TimeIntervalsSpec::Flag(enabled) => !enabled,
            TimeIntervalsSpec::Keyword(k) => k.eq_ignore_ascii_case("off"),
            TimeIntervalsSpec::List(_) => false,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            TimeIntervalsSpec::List(list) => Some(list),
            _ => None,
        }
    }
}

/// Dimension overrides declared on a column (also used for additional dimensions).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DimensionMeta {
    #[serde(rename = "type")]
    pub type_: Option<String>,
    pub name: Option<String>,
    pub sql: Option<String>,
    pub label: Option<String>,
    pub description: Option<String>,
    pub hidden: Option<bool>,
    pub format: Option<String>,
    pub round: Option<u32>,
    pub compact: Option<String>,
    pub groups: Option<StringOrVec>,
    pub group_label: Option<String>,
    pub time_intervals: Option<TimeIntervalsSpec>,
    pub required_attributes: Option<RequiredAttributes>,
    pub colors: Option<IndexMap<String, String>>,
    pub urls: Option<Vec<FieldUrl>>,
    pub tags: Option<StringOrVec>,
    pub ai_hint: Option<StringOrVec>,
}

impl_overlay!(DimensionMeta {
    replace: [
        type_,
        name,
        sql,
        label,
        description,
        hidden,
        format,
        round,
        compact,
        groups,
        group_label,
        time_intervals,
        required_attributes,
        colors,
        urls,
        tags,
        ai_hint,
    ],
    nested: [],
    maps: [],
});

/// Spotlight annotations on a model or metric.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpotlightMeta {
    pub visibility: Option<Visibility>,
    pub categories: Option<Vec<String>>,
}

impl_overlay!(SpotlightMeta {
    replace: [visibility, categories],
    nested: [],
    maps: [],
});

/// A metric declared on a column or on a model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricSpec {
    #[serde(rename = "type")]
    pub type_: Option<String>,
    pub sql: Option<String>,
    pub label: Option<String>,
    pub description: Option<String>,
    pub hidden: Option<bool>,
    pub round: Option<u32>,
    pub compact: Option<String>,
    pub format: Option<String>,
    pub groups: Option<StringOrVec>,
    pub group_label: Option<String>,
    pub percentile: Option<f64>,
    pub show_underlying_values: Option<Vec<String>>,
    pub filters: Option<Vec<IndexMap<String, serde_json::Value>>>,
    pub urls: Option<Vec<FieldUrl>>,
    pub tags: Option<StringOrVec>,
    pub required_attributes: Option<RequiredAttributes>,
    pub ai_hint: Option<StringOrVec>,
    pub spotlight: Option<SpotlightMeta>,
}

impl_overlay!(MetricSpec {
    replace: [
        type_,
        sql,
        label,
        description,
        hidden,
        round,
        compact,
        format,
        groups,
        group_label,
        percentile,
        show_underlying_values,
        filters,
        urls,
        tags,
        required_attributes,
        ai_hint,
    ],
    nested: [spotlight],
    maps: [],
});

/// Column-level annotations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnMeta {
    pub dimension: Option<DimensionMeta>,
    pub metrics: IndexMap<String, MetricSpec>,
    pub additional_dimensions: IndexMap<String, DimensionMeta>,
}

impl_overlay!(ColumnMeta {
    replace: [],
    nested: [dimension],
    maps: [metrics, additional_dimensions],
});

/// A join declared on a model or an additional explore.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinSpec {
    /// Name of the joined model.
    pub join: String,
    pub sql_on: String,
    #[serde(rename = "type", default)]
    pub type_: Option<JoinType>,
    #[serde(default)]
    pub alias: Option<String>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub fields: Option<Vec<String>>,
    #[serde(default)]
    pub hidden: Option<bool>,
    #[serde(default)]
    pub always: Option<bool>,
    #[serde(default)]
    pub relationship: Option<JoinRelationship>,
}

/// An additional named explore sharing the model's base table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExploreSpec {
    pub label: Option<String>,
    pub group_label: Option<String>,
    pub description: Option<String>,
    pub joins: Option<Vec<JoinSpec>>,
}

impl_overlay!(ExploreSpec {
    replace: [label, group_label, description, joins],
    nested: [],
    maps: [],
});

/// Label and description of a field group.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupDetail {
    pub label: String,
    pub description: Option<String>,
}

impl Overlay for GroupDetail {
    fn overlay(self, over: Self) -> Self {
        Self {
            label: if over.label.is_empty() { self.label } else { over.label },
            description: over.description.or(self.description),
        }
    }
}

/// Default time dimension of a model, as declared.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefaultTimeDimensionSpec {
    pub field: String,
    pub interval: String,
}

/// Model-level annotations.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelMeta {
    pub label: Option<String>,
    pub description: Option<String>,
    pub group_label: Option<String>,
    pub joins: Option<Vec<JoinSpec>>,
    pub explores: IndexMap<String, ExploreSpec>,
    pub metrics: IndexMap<String, MetricSpec>,
    pub sql_from: Option<String>,
    pub sql_filter: Option<String>,
    pub sql_where: Option<String>,
    pub primary_key: Option<StringOrVec>,
    pub required_filters: Option<Vec<IndexMap<String, serde_json::Value>>>,
    pub default_filters: Option<Vec<IndexMap<String, serde_json::Value>>>,
    pub required_attributes: Option<RequiredAttributes>,
    pub group_details: IndexMap<String, GroupDetail>,
    pub default_time_dimension: Option<DefaultTimeDimensionSpec>,
    pub order_fields_by: Option<String>,
    pub ai_hint: Option<StringOrVec>,
    pub spotlight: Option<SpotlightMeta>,
}

impl_overlay!(ModelMeta {
    replace: [
        label,
        description,
        group_label,
        joins,
        sql_from,
        sql_filter,
        sql_where,
        primary_key,
        required_filters,
        default_filters,
        required_attributes,
        default_time_dimension,
        order_fields_by,
        ai_hint,
    ],
    nested: [spotlight],
    maps: [explores, metrics, group_details],
});
