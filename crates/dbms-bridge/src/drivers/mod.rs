//! Per-database capability implementations.
//!
//! This module provides one [`DbmsCapability`](crate::core::DbmsCapability)
//! implementation per supported database:
//!
//! - [`generic`]: fallback for unrecognized databases
//! - [`oracle`]: Oracle
//! - [`mssql`]: Microsoft SQL Server
//! - [`db2`]: IBM DB2
//! - [`h2`]: H2
//! - [`mysql`]: MySQL (version aware)
//! - [`mariadb`]: MariaDB (version aware)
//! - [`postgres`]: PostgreSQL
//! - [`common`]: shared SQL text helpers
//!
//! # Adding New Databases
//!
//! 1. Create a new module under `drivers/` with a `dialect.rs`
//! 2. Implement `DbmsCapability`, overriding only what differs from generic
//! 3. Add a variant to [`Dbms`](crate::core::Dbms)
//! 4. Register the constructor in `DbmsSelector::with_builtins()`

pub mod common;
pub mod db2;
pub mod generic;
pub mod h2;
pub mod mariadb;
pub mod mssql;
pub mod mysql;
pub mod oracle;
pub mod postgres;

pub use db2::Db2Dialect;
pub use generic::GenericDialect;
pub use h2::H2Dialect;
pub use mariadb::MariadbDialect;
pub use mssql::MssqlDialect;
pub use mysql::MysqlDialect;
pub use oracle::OracleDialect;
pub use postgres::PostgresDialect;
