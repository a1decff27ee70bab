//! Generic driver.
//!
//! - [`GenericDialect`]: fallback capability for unrecognized databases

mod dialect;

pub use dialect::GenericDialect;
