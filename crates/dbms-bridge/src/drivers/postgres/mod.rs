//! PostgreSQL driver.
//!
//! - [`PostgresDialect`]: SQL phrasing and catalog introspection for PostgreSQL

mod dialect;

pub use dialect::PostgresDialect;
