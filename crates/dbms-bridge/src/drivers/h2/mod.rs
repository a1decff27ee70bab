//! H2 driver.

mod dialect;

pub use dialect::H2Dialect;
