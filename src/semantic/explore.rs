//! Explores: query-ready views over a base table and its joins.
//!
//! Compilation of one model yields one [`ExploreOutcome`] per explore it
//! declares. Success and failure are explicit variants rather than being
//! inferred from which fields are present.

use std::collections::HashSet;

use indexmap::IndexMap;
use serde::Serialize;

use super::error::{CompileStage, InlineError};
use super::field::{Field, Spotlight};
use super::table::CompiledTable;
use crate::model::meta::RequiredAttributes;
use crate::model::types::{JoinRelationship, JoinType};
use crate::sql::dialect::Dialect;

/// Attribute name -> values held by the querying user.
pub type UserAttributes = IndexMap<String, Vec<String>>;

/// Whether `user` holds at least one accepted value of every required attribute.
pub fn satisfies_required_attributes(
    required: Option<&RequiredAttributes>,
    user: &UserAttributes,
) -> bool {
    let Some(required) = required else {
        return true;
    };
    required.iter().all(|(attribute, accepted)| {
        let accepted = accepted.to_vec();
        user.get(attribute)
            .is_some_and(|values| values.iter().any(|value| accepted.contains(value)))
    })
}

/// A join with its `ON` clause resolved.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompiledJoin {
    /// Key of the joined table in the explore (alias if one was given).
    pub table: String,
    pub sql_on: String,
    pub compiled_sql_on: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub type_: Option<JoinType>,
    pub hidden: bool,
    pub always: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relationship: Option<JoinRelationship>,
    pub tables_references: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Explore {
    pub name: String,
    pub label: String,
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_label: Option<String>,
    pub base_table: String,
    pub joined_tables: Vec<CompiledJoin>,
    pub tables: IndexMap<String, CompiledTable>,
    /// Every table before user-attribute filtering, for diagnostics.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unfiltered_tables: Option<IndexMap<String, CompiledTable>>,
    pub target_database: Dialect,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warehouse: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub databricks_compute: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yml_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sql_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spotlight: Option<Spotlight>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ai_hint: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Explore {
    /// Drop everything `user` may not see.
    ///
    /// Tables and fields whose required attributes are not satisfied are
    /// removed, as are fields reading from a removed table and joins to a
    /// removed table. The original tables are kept in `unfiltered_tables`.
    pub fn filtered_by_user_attributes(&self, user: &UserAttributes) -> Explore {
        let visible: HashSet<&str> = self
            .tables
            .iter()
            .filter(|(_, table)| {
                satisfies_required_attributes(table.required_attributes.as_ref(), user)
            })
            .map(|(name, _)| name.as_str())
            .collect();

        let tables: IndexMap<String, CompiledTable> = self
            .tables
            .iter()
            .filter(|(name, _)| visible.contains(name.as_str()))
            .map(|(name, table)| {
                let mut table = table.clone();
                table.dimensions.retain(|_, dimension| {
                    satisfies_required_attributes(dimension.required_attributes(), user)
                        && dimension
                            .tables_references
                            .iter()
                            .all(|t| visible.contains(t.as_str()))
                });
                table.metrics.retain(|_, metric| {
                    satisfies_required_attributes(metric.required_attributes(), user)
                        && metric
                            .tables_references
                            .iter()
                            .all(|t| visible.contains(t.as_str()))
                });
                (name.clone(), table)
            })
            .collect();

        let joined_tables = self
            .joined_tables
            .iter()
            .filter(|join| tables.contains_key(&join.table))
            .cloned()
            .collect();

        Explore {
            tables,
            joined_tables,
            unfiltered_tables: Some(self.tables.clone()),
            ..self.clone()
        }
    }
}

/// A failed explore: identity fields plus the errors that stopped it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExploreError {
    pub name: String,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_table: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yml_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sql_path: Option<String>,
    pub stage: CompileStage,
    pub errors: Vec<InlineError>,
}

/// Result of compiling one explore.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ExploreOutcome {
    Success(Explore),
    Failure(ExploreError),
}

impl ExploreOutcome {
    pub fn name(&self) -> &str {
        match self {
            ExploreOutcome::Success(explore) => &explore.name,
            ExploreOutcome::Failure(error) => &error.name,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ExploreOutcome::Success(_))
    }

    pub fn as_explore(&self) -> Option<&Explore> {
        match self {
            ExploreOutcome::Success(explore) => Some(explore),
            ExploreOutcome::Failure(_) => None,
        }
    }

    pub fn as_error(&self) -> Option<&ExploreError> {
        match self {
            ExploreOutcome::Success(_) => None,
            ExploreOutcome::Failure(error) => Some(error),
        }
    }
}
