//! Core abstractions of the capability layer.
//!
//! - [`dbms`]: the closed set of database identities
//! - [`traits`]: the [`DbmsCapability`] trait, whose default methods are the
//!   generic behavior
//! - [`selector`]: maps driver-reported products to capabilities
//! - [`connection`]: the driver boundary consumed by introspection
//! - [`introspect`]: catalog queries shared by the dialects
//! - [`lock`]: lock-wait values for locking reads
//! - [`lob`]: BLOB/CLOB update strategies
//! - [`identifier`]: identifier validation and literal quoting
//!
//! # Design Patterns
//!
//! - **Strategy**: one `DbmsCapability` per database, chosen once
//! - **Template Method**: dialects override only what differs from generic
//! - **Registry**: `DbmsSelector` holds constructors instead of reflection

pub mod connection;
pub mod dbms;
pub mod identifier;
pub mod introspect;
pub mod lob;
pub mod lock;
pub mod selector;
pub mod traits;

// Re-export commonly used types for convenience
pub use connection::{ColumnMeta, DbConnection, DriverResult, IndexColumn, ServerInfo, TableRef};
pub use dbms::Dbms;
pub use lob::{DriverLob, LobColumns, LobHandle, LobKind, LobStrategy, LobWriter};
pub use lock::{LockWait, LockWaitMode};
pub use selector::{CapabilityCtor, DbmsSelector};
pub use traits::{DbmsCapability, DATETIME_FORMAT};
