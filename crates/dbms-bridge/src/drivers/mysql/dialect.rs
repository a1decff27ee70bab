//! MySQL SQL dialect (Strategy pattern).
//!
//! `SKIP LOCKED` and `NOWAIT` arrived in MySQL 8.0. The server version is
//! parsed once per instance; older servers only get a plain `FOR UPDATE`.

use std::sync::OnceLock;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use tracing::warn;

use crate::core::connection::DbConnection;
use crate::core::dbms::Dbms;
use crate::core::introspect::{
    column_present_in_catalog, table_present_in_catalog, ColumnsCatalog, TablesCatalog,
};
use crate::core::lob::LobStrategy;
use crate::core::lock::{LockWait, LockWaitMode};
use crate::core::traits::{DbmsCapability, DATETIME_FORMAT};
use crate::drivers::common::{require_select, with_limit, ServerVersion};
use crate::error::{DbmsError, Result};

const TABLES: TablesCatalog = TablesCatalog {
    view: "information_schema.tables",
    schema_column: Some("table_schema"),
    table_column: "table_name",
};

const COLUMNS: ColumnsCatalog = ColumnsCatalog {
    view: "information_schema.columns",
    schema_column: Some("table_schema"),
    table_column: "table_name",
    column_column: "column_name",
};

const SKIP_LOCKED_SINCE: ServerVersion = ServerVersion::new(8, 0);

/// MySQL dialect implementation.
#[derive(Debug, Clone, Default)]
pub struct MysqlDialect {
    server_version: String,
    parsed_version: OnceLock<Option<ServerVersion>>,
}

impl MysqlDialect {
    /// Create a MySQL dialect for a server of unknown version.
    ///
    /// Without a version the server is assumed to support `SKIP LOCKED`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a MySQL dialect for a server reporting `version`.
    pub fn with_server_version(version: impl Into<String>) -> Self {
        Self {
            server_version: version.into(),
            parsed_version: OnceLock::new(),
        }
    }

    pub(crate) fn server_version(&self) -> Option<ServerVersion> {
        *self.parsed_version.get_or_init(|| {
            let parsed = ServerVersion::parse(&self.server_version);
            if parsed.is_none() && !self.server_version.trim().is_empty() {
                warn!(
                    "could not parse server version [{}], assuming a current release",
                    self.server_version
                );
            }
            parsed
        })
    }

    pub(crate) fn version_at_least(&self, required: ServerVersion) -> bool {
        self.server_version().map_or(true, |v| v.at_least(required))
    }
}

#[async_trait]
impl DbmsCapability for MysqlDialect {
    fn dbms(&self) -> Dbms {
        Dbms::Mysql
    }

    fn has_skip_locked(&self) -> bool {
        self.version_at_least(SKIP_LOCKED_SINCE)
    }

    fn date_and_offset(&self, value: &str, days: i32) -> String {
        format!("DATE_ADD({}, INTERVAL {} DAY)", value, days)
    }

    fn auto_increment_column_ddl(&self) -> String {
        "INT AUTO_INCREMENT".to_string()
    }

    fn inserted_auto_increment_query(&self, _sequence: &str) -> Option<String> {
        Some("SELECT LAST_INSERT_ID()".to_string())
    }

    fn timestamp_field_type(&self) -> String {
        "DATETIME".to_string()
    }

    fn datetime_literal(&self, value: NaiveDateTime) -> String {
        format!("TIMESTAMP '{}'", value.format(DATETIME_FORMAT))
    }

    fn timestamp_as_date(&self, column: &str) -> String {
        format!("DATE_FORMAT({},'%Y-%m-%d')", column)
    }

    fn blob_field_type(&self) -> String {
        "LONGBLOB".to_string()
    }

    fn clob_field_type(&self) -> String {
        "LONGTEXT".to_string()
    }

    fn first_record_query(&self, table: &str) -> String {
        format!("SELECT * FROM {} LIMIT 1", table)
    }

    fn locking_read_query(&self, query: &str, batch_size: u32, wait: LockWait) -> Result<String> {
        require_select(query)?;
        let query_with_limit = with_limit(query, batch_size);
        if self.has_skip_locked() {
            return match wait.mode() {
                LockWaitMode::SkipLocked => Ok(format!("{} FOR UPDATE SKIP LOCKED", query_with_limit)),
                LockWaitMode::NoWait => Ok(format!("{} FOR UPDATE NOWAIT", query_with_limit)),
                mode => Err(DbmsError::unsupported(self.dbms(), mode.to_string(), query)),
            };
        }
        match wait.mode() {
            LockWaitMode::SkipLocked => {
                warn!(
                    "server version [{}] cannot skip locked rows, claiming rows with a blocking FOR UPDATE",
                    self.server_version
                );
                Ok(format!("{} FOR UPDATE", query_with_limit))
            }
            mode => Err(DbmsError::unsupported(self.dbms(), mode.to_string(), query)),
        }
    }

    fn peek_query(&self, query: &str, batch_size: u32, _wait: LockWait) -> Result<String> {
        require_select(query)?;
        Ok(with_limit(query, batch_size))
    }

    fn lob_strategy(&self) -> LobStrategy {
        LobStrategy::Buffered
    }

    async fn schema(&self, conn: &dyn DbConnection) -> Option<String> {
        match conn.query_string("SELECT DATABASE()", &[]).await {
            Ok(schema) => schema,
            Err(e) => {
                warn!("could not determine current schema: {}", e);
                None
            }
        }
    }

    async fn table_present(&self, conn: &dyn DbConnection, schema: Option<&str>, table: &str) -> bool {
        table_present_in_catalog(conn, &TABLES, schema, table).await
    }

    async fn column_present(
        &self,
        conn: &dyn DbConnection,
        schema: Option<&str>,
        table: &str,
        column: &str,
    ) -> bool {
        column_present_in_catalog(conn, &COLUMNS, schema, table, column).await
    }
}
