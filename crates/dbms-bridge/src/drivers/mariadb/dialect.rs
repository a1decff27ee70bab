//! MariaDB SQL dialect (Strategy pattern).
//!
//! MariaDB shares its SQL fragments with MySQL but has its own locking
//! grammar: `WAIT n` and `NOWAIT` are available on all supported versions,
//! `SKIP LOCKED` only since 10.6.

use async_trait::async_trait;
use chrono::NaiveDateTime;
use tracing::warn;

use crate::core::connection::DbConnection;
use crate::core::dbms::Dbms;
use crate::core::lob::LobStrategy;
use crate::core::lock::{LockWait, LockWaitMode};
use crate::core::traits::DbmsCapability;
use crate::drivers::common::{require_select, with_limit, ServerVersion};
use crate::drivers::mysql::MysqlDialect;
use crate::error::Result;

const SKIP_LOCKED_SINCE: ServerVersion = ServerVersion::new(10, 6);

/// MariaDB dialect implementation.
#[derive(Debug, Clone, Default)]
pub struct MariadbDialect {
    mysql: MysqlDialect,
}

impl MariadbDialect {
    /// Create a MariaDB dialect for a server of unknown version.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a MariaDB dialect for a server reporting `version`.
    pub fn with_server_version(version: impl Into<String>) -> Self {
        Self {
            mysql: MysqlDialect::with_server_version(version),
        }
    }
}

#[async_trait]
impl DbmsCapability for MariadbDialect {
    fn dbms(&self) -> Dbms {
        Dbms::Mariadb
    }

    fn has_skip_locked(&self) -> bool {
        self.mysql.version_at_least(SKIP_LOCKED_SINCE)
    }

    fn date_and_offset(&self, value: &str, days: i32) -> String {
        self.mysql.date_and_offset(value, days)
    }

    fn auto_increment_column_ddl(&self) -> String {
        self.mysql.auto_increment_column_ddl()
    }

    fn inserted_auto_increment_query(&self, sequence: &str) -> Option<String> {
        self.mysql.inserted_auto_increment_query(sequence)
    }

    fn timestamp_field_type(&self) -> String {
        self.mysql.timestamp_field_type()
    }

    fn datetime_literal(&self, value: NaiveDateTime) -> String {
        self.mysql.datetime_literal(value)
    }

    fn timestamp_as_date(&self, column: &str) -> String {
        self.mysql.timestamp_as_date(column)
    }

    fn blob_field_type(&self) -> String {
        self.mysql.blob_field_type()
    }

    fn clob_field_type(&self) -> String {
        self.mysql.clob_field_type()
    }

    fn first_record_query(&self, table: &str) -> String {
        self.mysql.first_record_query(table)
    }

    fn locking_read_query(&self, query: &str, batch_size: u32, wait: LockWait) -> Result<String> {
        require_select(query)?;
        let query = with_limit(query, batch_size);
        Ok(match wait.mode() {
            LockWaitMode::SkipLocked if self.has_skip_locked() => {
                format!("{} FOR UPDATE SKIP LOCKED", query)
            }
            LockWaitMode::SkipLocked => {
                warn!(
                    "server version [{}] cannot skip locked rows, waiting the minimum of 1 second instead",
                    self.mysql
                        .server_version()
                        .map(|v| v.to_string())
                        .unwrap_or_default()
                );
                format!("{} FOR UPDATE WAIT 1", query)
            }
            LockWaitMode::NoWait => format!("{} FOR UPDATE NOWAIT", query),
            LockWaitMode::Seconds(n) => format!("{} FOR UPDATE WAIT {}", query, n),
        })
    }

    fn peek_query(&self, query: &str, batch_size: u32, wait: LockWait) -> Result<String> {
        self.mysql.peek_query(query, batch_size, wait)
    }

    fn lob_strategy(&self) -> LobStrategy {
        self.mysql.lob_strategy()
    }

    async fn schema(&self, conn: &dyn DbConnection) -> Option<String> {
        self.mysql.schema(conn).await
    }

    async fn table_present(&self, conn: &dyn DbConnection, schema: Option<&str>, table: &str) -> bool {
        self.mysql.table_present(conn, schema, table).await
    }

    async fn column_present(
        &self,
        conn: &dyn DbConnection,
        schema: Option<&str>,
        table: &str,
        column: &str,
    ) -> bool {
        self.mysql.column_present(conn, schema, table, column).await
    }
}
