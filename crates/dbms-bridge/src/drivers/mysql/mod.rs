//! MySQL driver.
//!
//! - [`MysqlDialect`]: version-aware locking reads and MySQL fragments

mod dialect;

pub use dialect::MysqlDialect;
