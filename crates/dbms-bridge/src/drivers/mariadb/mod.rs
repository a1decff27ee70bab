//! MariaDB driver.

mod dialect;

pub use dialect::MariadbDialect;
