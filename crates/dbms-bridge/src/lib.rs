//! # dbms-bridge
//!
//! Per-database SQL capabilities and dialect translation.
//!
//! This library lets one integration pipeline emit dialect-neutral SQL and
//! run it on Oracle, SQL Server, DB2, H2, MySQL/MariaDB and PostgreSQL:
//!
//! - **Capabilities** phrase locking reads, pagination, LOB access, schema
//!   introspection and DDL idioms per database
//! - **Selection** picks the capability from the product a driver reports
//! - **Splitting** cuts scripts into statements, respecting literals and blocks
//! - **Translation** rewrites whole statements from one dialect to another
//!
//! ## Example
//!
//! ```rust
//! use dbms_bridge::{Dbms, DbmsCapability, DbmsSelector, LockWait, TranslatorRegistry};
//!
//! let selector = DbmsSelector::with_builtins();
//! let capability = selector.select("Microsoft SQL Server", "16.0").unwrap();
//! let sql = capability
//!     .locking_read_query("SELECT * FROM t WHERE x=1", 10, LockWait::new(-1))
//!     .unwrap();
//! assert!(sql.starts_with("SELECT TOP 10"));
//!
//! let registry = TranslatorRegistry::new();
//! let converted = capability.convert_query("SELECT NEXTSEQ.NEXTVAL FROM DUAL", Dbms::Oracle, &registry);
//! assert_eq!(converted, "SELECT NEXT VALUE FOR NEXTSEQ");
//! ```

pub mod config;
pub mod core;
pub mod drivers;
pub mod error;
pub mod script;
pub mod translate;

// Re-exports for convenient access
pub use crate::config::{Config, LockingConfig, SelectorConfig, TranslationConfig};
pub use crate::core::{
    Dbms, DbConnection, DbmsCapability, DbmsSelector, LobStrategy, LockWait, LockWaitMode,
    ServerInfo,
};
pub use crate::error::{BoxError, DbmsError, Result};
pub use crate::script::split_statements;
pub use crate::translate::{QueryTranslator, RuleSource, TranslatorRegistry};
