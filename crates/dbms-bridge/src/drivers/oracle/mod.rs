//! Oracle driver.
//!
//! - [`OracleDialect`]: SQL phrasing and data dictionary introspection for Oracle

mod dialect;

pub use dialect::OracleDialect;
