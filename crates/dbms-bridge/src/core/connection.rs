//! Boundary to the caller-supplied database connection.
//!
//! The capability layer never opens, pools or closes connections. Drivers
//! adapt their connection type to [`DbConnection`]; introspection methods
//! on [`DbmsCapability`](super::DbmsCapability) run their queries through
//! it on the caller's task.

use async_trait::async_trait;

use crate::error::BoxError;

/// Result type returned by driver adapters.
pub type DriverResult<T> = std::result::Result<T, BoxError>;

/// Product identification reported by a driver.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ServerInfo {
    pub product_name: String,
    pub product_version: String,
}

impl ServerInfo {
    pub fn new(product_name: impl Into<String>, product_version: impl Into<String>) -> Self {
        Self {
            product_name: product_name.into(),
            product_version: product_version.into(),
        }
    }
}

/// A table found through catalog metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRef {
    pub schema: Option<String>,
    pub name: String,
}

/// A column found through catalog metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMeta {
    pub schema: Option<String>,
    pub table: String,
    pub name: String,
    pub type_name: String,
    pub nullable: bool,
    /// 1-based ordinal position in the table.
    pub position: u32,
}

/// One column of one index, as enumerated by catalog metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexColumn {
    pub table: String,
    pub index_name: String,
    pub column: String,
    /// 1-based position of the column within the index.
    pub ordinal_position: u32,
}

/// Connection-like object supplied by the driver layer.
///
/// String parameters are bound positionally to `?` markers.
#[async_trait]
pub trait DbConnection: Send + Sync {
    /// Product name and version from driver metadata.
    fn server_info(&self) -> ServerInfo;

    /// Execute a query returning a single integer.
    async fn query_int(&self, sql: &str, params: &[&str]) -> DriverResult<i64>;

    /// Execute a query returning a single (nullable) string.
    async fn query_string(&self, sql: &str, params: &[&str]) -> DriverResult<Option<String>>;

    /// Enumerate tables matching `table` (exact name) in `schema`.
    async fn tables(&self, schema: Option<&str>, table: &str) -> DriverResult<Vec<TableRef>>;

    /// Enumerate columns of a table, optionally restricted to one column name.
    async fn columns(
        &self,
        schema: Option<&str>,
        table: &str,
        column: Option<&str>,
    ) -> DriverResult<Vec<ColumnMeta>>;

    /// Enumerate index columns of a table.
    async fn index_columns(&self, schema: Option<&str>, table: &str)
        -> DriverResult<Vec<IndexColumn>>;
}
