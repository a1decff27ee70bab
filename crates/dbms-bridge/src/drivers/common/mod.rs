//! Common utilities shared across dialect implementations.
//!
//! - [`sql`]: select-shape checks and table hint placement
//! - [`version`]: server version parsing for version-dependent dialects

pub mod sql;
pub mod version;

pub use sql::{after_select, insert_table_hint, require_select, table_hint_position, with_limit};
pub use version::ServerVersion;
