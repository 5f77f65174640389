//! Warehouse SQL generation.
//!
//! This module provides the warehouse-specific SQL fragments the compiler
//! emits. It includes:
//!
//! - [`dialect`] - per-warehouse dialect implementations
//! - [`time_frames`] - time intervals dimensions can be bucketed into
//! - [`builder`] - the builder capability consumed by the compiler

pub mod builder;
pub mod dialect;
pub mod time_frames;

// Re-export commonly used types at the sql module level
pub use builder::{DialectSqlBuilder, WarehouseSqlBuilder};
pub use dialect::{Dialect, SqlDialect};
pub use time_frames::{DatePart, TimeFrame, TimeFrameKind};
