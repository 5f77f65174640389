//! Unified error types for the semantic compiler.
//!
//! This module provides the single error type raised while compiling tables
//! and explores, and the inline error records those failures are turned into
//! so that one bad model never aborts a batch.

use serde::{Deserialize, Serialize};

/// Result type for compiler operations.
pub type CompileResult<T> = Result<T, CompileError>;

/// What collided inside a table's field namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollisionKind {
    /// A metric shares its name with a dimension.
    MetricAndDimension,
    /// Two dimensions (base, interval or additional) share a name.
    Dimensions,
}

/// Error raised while compiling one model or explore.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CompileError {
    /// A model or column is missing from the warehouse catalog (strict mode).
    #[error("{message}")]
    CatalogMismatch { path: String, message: String },

    /// A declared value is outside its closed vocabulary or malformed.
    #[error("{0}")]
    MetadataParse(String),

    /// Field names collide within one table.
    #[error("{}", collision_message(.kind, .names))]
    NameCollision {
        table: String,
        kind: CollisionKind,
        names: Vec<String>,
    },

    /// Catch-all table failure, including a model without a relation.
    #[error("{0}")]
    NoDimensionsFound(String),

    /// A join references a table that is not part of the explore.
    #[error("{message}")]
    JoinResolution { explore: String, message: String },

    /// A SQL template references a missing field, or fields reference each other cyclically.
    #[error("{message}")]
    FieldReference { table: String, message: String },
}

fn collision_message(kind: &CollisionKind, names: &[String]) -> String {
    match (kind, names) {
        (CollisionKind::MetricAndDimension, [name]) => {
            format!("Found a metric and a dimension with the same name: {}", name)
        }
        (CollisionKind::MetricAndDimension, _) => format!(
            "Found multiple metrics and a dimensions with the same name: {}",
            names.join(", ")
        ),
        (CollisionKind::Dimensions, _) => format!(
            "Found multiple dimensions with the same name: {}",
            names.join(", ")
        ),
    }
}

impl CompileError {
    pub fn kind(&self) -> InlineErrorKind {
        match self {
            CompileError::CatalogMismatch { .. } => InlineErrorKind::CatalogMismatch,
            CompileError::MetadataParse(_) => InlineErrorKind::MetadataParse,
            CompileError::NameCollision { .. } => InlineErrorKind::NameCollision,
            CompileError::JoinResolution { .. } => InlineErrorKind::JoinResolutionFailure,
            CompileError::NoDimensionsFound(_) | CompileError::FieldReference { .. } => {
                InlineErrorKind::NoDimensionsFound
            }
        }
    }

    /// Inline record carrying this error's kind and message.
    pub fn to_inline(&self) -> InlineError {
        InlineError::new(self.kind(), self.to_string())
    }

    /// Same kind and payload, message replaced by `f(message)`.
    pub fn to_inline_with(&self, f: impl FnOnce(&str) -> String) -> InlineError {
        InlineError::new(self.kind(), f(&self.to_string()))
    }
}

// ============================================================================
// Inline errors
// ============================================================================

/// Fine-grained classification of a contained failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InlineErrorKind {
    CatalogMismatch,
    MetadataParse,
    NameCollision,
    NoDimensionsFound,
    JoinResolutionFailure,
}

impl InlineErrorKind {
    /// Coarse wire category for this kind.
    pub fn error_type(&self) -> InlineErrorType {
        match self {
            InlineErrorKind::MetadataParse | InlineErrorKind::NameCollision => {
                InlineErrorType::MetadataParseError
            }
            _ => InlineErrorType::NoDimensionsFound,
        }
    }
}

/// Two-value category understood by downstream consumers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InlineErrorType {
    MetadataParseError,
    NoDimensionsFound,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InlineError {
    pub kind: InlineErrorKind,
    #[serde(rename = "type")]
    pub error_type: InlineErrorType,
    pub message: String,
}

impl InlineError {
    pub fn new(kind: InlineErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            error_type: kind.error_type(),
            message: message.into(),
        }
    }
}

/// Last stage an explore reached before failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CompileStage {
    /// The base table itself did not compile.
    Pending,
    /// Tables compiled; a join could not be resolved.
    TableCompiled,
    /// Joins resolved; field SQL could not be assembled.
    JoinsResolved,
}

/// A compile error together with the stage it interrupted.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("{error}")]
pub struct StagedError {
    pub stage: CompileStage,
    #[source]
    pub error: CompileError,
}

/// Tag a [`CompileResult`] with the stage it belongs to.
pub trait AtStage<T> {
    fn at_stage(self, stage: CompileStage) -> Result<T, StagedError>;
}

impl<T> AtStage<T> for CompileResult<T> {
    fn at_stage(self, stage: CompileStage) -> Result<T, StagedError> {
        self.map_err(|error| StagedError { stage, error })
    }
}
