//! Amazon Redshift dialect.
//!
//! Redshift features:
//! - PostgreSQL-based syntax
//! - ANSI identifier quoting (`"`)
//! - Integer averages truncate unless cast

use super::helpers;
use super::SqlDialect;

/// Amazon Redshift dialect.
#[derive(Debug, Clone, Copy)]
pub struct Redshift;

impl SqlDialect for Redshift {
    fn name(&self) -> &'static str {
        "redshift"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        helpers::quote_double(ident)
    }

    fn average_sql(&self, sql: &str) -> String {
        format!("AVG({}::DOUBLE PRECISION)", sql)
    }
}
