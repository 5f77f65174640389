//! PostgreSQL dialect.
//!
//! PostgreSQL features:
//! - ANSI identifier quoting (`"`)
//! - `DATE_TRUNC` / `DATE_PART` with quoted units
//! - Ordered-set aggregates (`PERCENTILE_CONT ... WITHIN GROUP`)
//! - Integer averages truncate unless cast

use super::helpers;
use super::SqlDialect;

/// PostgreSQL dialect.
#[derive(Debug, Clone, Copy)]
pub struct Postgres;

impl SqlDialect for Postgres {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        helpers::quote_double(ident)
    }

    fn average_sql(&self, sql: &str) -> String {
        format!("AVG({}::DOUBLE PRECISION)", sql)
    }

    // Uses default percentile_sql (PERCENTILE_CONT ... WITHIN GROUP)
    // Uses default time interval SQL (DATE_TRUNC / DATE_PART / TO_CHAR)
}
