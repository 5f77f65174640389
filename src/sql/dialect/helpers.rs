//! Shared helper functions for SQL dialect implementations.
//!
//! This module provides reusable building blocks that dialects can compose
//! to implement the `SqlDialect` trait with minimal duplication.

use regex::Regex;
use std::sync::LazyLock;

use crate::model::types::Weekday;
use crate::sql::time_frames::TimeFrame;

// =============================================================================
// Identifier Quoting
// =============================================================================

/// Quote identifier with double quotes (ANSI style).
/// Used by: Postgres, Snowflake, Redshift, Trino
pub fn quote_double(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// Quote identifier with backticks.
/// Used by: BigQuery, Databricks
pub fn quote_backtick(ident: &str) -> String {
    format!("`{}`", ident.replace('`', "``"))
}

// =============================================================================
// String Escaping
// =============================================================================

static LINE_COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"--[^\n]*").expect("valid regex"));
static BLOCK_COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)/\*.*?\*/").expect("valid regex"));

/// Remove SQL comments and NUL bytes from a user-supplied value.
pub fn strip_comments(value: &str) -> String {
    let without_lines = LINE_COMMENT.replace_all(value, "");
    let without_blocks = BLOCK_COMMENT.replace_all(&without_lines, "");
    without_blocks.replace('\0', "")
}

/// Escape string contents for dialects that double single quotes.
/// Used by: Postgres, Redshift, Snowflake
pub fn escape_doubled_quotes(value: &str) -> String {
    strip_comments(&value.replace('\'', "''").replace('\\', "\\\\"))
}

/// Escape string contents for dialects that only double single quotes and
/// treat backslashes literally.
/// Used by: Trino
pub fn escape_standard(value: &str) -> String {
    strip_comments(&value.replace('\'', "''"))
}

/// Escape string contents for dialects that backslash-escape quotes.
/// Used by: BigQuery, Databricks
pub fn escape_backslash_quotes(value: &str) -> String {
    strip_comments(&value.replace('\\', "\\\\").replace('\'', "\\'"))
}

// =============================================================================
// Time Intervals
// =============================================================================

/// `DATE_TRUNC('UNIT', sql)`.
/// Used by: Postgres, Redshift, Snowflake, Databricks, Trino
pub fn date_trunc_quoted(frame: TimeFrame, sql: &str) -> String {
    format!("DATE_TRUNC('{}', {})", frame.as_str(), sql)
}

/// Days a week start is shifted from the warehouse's Monday default.
pub fn week_shift(start_of_week: Option<Weekday>) -> Option<u32> {
    start_of_week.map(|day| day.offset()).filter(|offset| *offset > 0)
}

/// Render a percentile (0..=100) as the fraction most warehouses expect.
pub fn percentile_fraction(percentile: f64) -> String {
    format!("{}", percentile / 100.0)
}
