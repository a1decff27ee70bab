//! Microsoft SQL Server driver.
//!
//! - [`MssqlDialect`]: table-hint based locking and SQL Server fragments

mod dialect;

pub use dialect::MssqlDialect;
