//! PostgreSQL SQL dialect (Strategy pattern).
//!
//! PostgreSQL supports `SKIP LOCKED` and `NOWAIT` but has no per-statement
//! lock timeout, so an explicit wait is rejected.

use async_trait::async_trait;
use tracing::warn;

use crate::core::connection::DbConnection;
use crate::core::dbms::Dbms;
use crate::core::introspect::{
    column_present_in_catalog, count_present, table_present_in_catalog, ColumnsCatalog,
    TablesCatalog,
};
use crate::core::lob::LobStrategy;
use crate::core::lock::{LockWait, LockWaitMode};
use crate::core::traits::DbmsCapability;
use crate::drivers::common::{require_select, with_limit};
use crate::error::{DbmsError, Result};

const TABLES: TablesCatalog = TablesCatalog {
    view: "pg_catalog.pg_tables",
    schema_column: Some("schemaname"),
    table_column: "tablename",
};

const COLUMNS: ColumnsCatalog = ColumnsCatalog {
    view: "information_schema.columns",
    schema_column: Some("table_schema"),
    table_column: "table_name",
    column_column: "column_name",
};

/// PostgreSQL dialect implementation.
#[derive(Debug, Clone, Default)]
pub struct PostgresDialect;

impl PostgresDialect {
    /// Create a new PostgreSQL dialect instance.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl DbmsCapability for PostgresDialect {
    fn dbms(&self) -> Dbms {
        Dbms::Postgresql
    }

    fn has_skip_locked(&self) -> bool {
        true
    }

    // PostgreSQL does not cast implicitly between text and numeric parameters
    fn is_parameter_type_match_required(&self) -> bool {
        true
    }

    fn sys_date(&self) -> String {
        "CURRENT_TIMESTAMP".to_string()
    }

    fn date_and_offset(&self, value: &str, days: i32) -> String {
        format!("{} + INTERVAL '{} DAY'", value, days)
    }

    fn auto_increment_column_ddl(&self) -> String {
        "SERIAL".to_string()
    }

    fn inserted_auto_increment_query(&self, sequence: &str) -> Option<String> {
        Some(format!("SELECT currval('{}')", sequence))
    }

    fn blob_field_type(&self) -> String {
        "BYTEA".to_string()
    }

    fn clob_field_type(&self) -> String {
        "TEXT".to_string()
    }

    fn first_record_query(&self, table: &str) -> String {
        format!("SELECT * FROM {} LIMIT 1", table)
    }

    fn locking_read_query(&self, query: &str, batch_size: u32, wait: LockWait) -> Result<String> {
        require_select(query)?;
        let query_with_limit = with_limit(query, batch_size);
        match wait.mode() {
            LockWaitMode::SkipLocked => Ok(format!("{} FOR UPDATE SKIP LOCKED", query_with_limit)),
            LockWaitMode::NoWait => Ok(format!("{} FOR UPDATE NOWAIT", query_with_limit)),
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
        match conn.query_string("SELECT CURRENT_SCHEMA()", &[]).await {
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

    async fn sequence_present(
        &self,
        conn: &dyn DbConnection,
        schema: Option<&str>,
        _table: &str,
        sequence: &str,
    ) -> bool {
        let what = format!("sequence [{}]", sequence);
        match schema.filter(|s| !s.is_empty()) {
            Some(schema) => {
                count_present(
                    conn,
                    "select count(*) from information_schema.sequences where upper(sequence_schema)=upper(?) and upper(sequence_name)=upper(?)",
                    &[schema, sequence],
                    &what,
                )
                .await
            }
            None => {
                count_present(
                    conn,
                    "select count(*) from information_schema.sequences where upper(sequence_name)=upper(?)",
                    &[sequence],
                    &what,
                )
                .await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::connection::mock::MockConnection;

    #[test]
    fn test_locking_read() {
        let d = PostgresDialect::new();
        assert_eq!(
            d.locking_read_query("SELECT id FROM t", 20, LockWait::SKIP_LOCKED)
                .unwrap(),
            "SELECT id FROM t LIMIT 20 FOR UPDATE SKIP LOCKED"
        );
        assert_eq!(
            d.locking_read_query("SELECT id FROM t", 0, LockWait::NO_WAIT).unwrap(),
            "SELECT id FROM t FOR UPDATE NOWAIT"
        );
    }

    #[test]
    fn test_positive_wait_is_unsupported() {
        let err = PostgresDialect::new()
            .locking_read_query("SELECT id FROM t", 20, LockWait::seconds(3))
            .unwrap_err();
        match err {
            DbmsError::Unsupported { dbms, query, .. } => {
                assert_eq!(dbms, Dbms::Postgresql);
                assert_eq!(query, "SELECT id FROM t");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_rejects_non_select_for_every_wait() {
        for wait in [-1, 0, 3] {
            assert!(matches!(
                PostgresDialect::new().locking_read_query("WITH x AS (SELECT 1) SELECT * FROM x", 1, LockWait::new(wait)),
                Err(DbmsError::InvalidQuery { .. })
            ));
        }
    }

    #[test]
    fn test_fragments() {
        let d = PostgresDialect::new();
        assert!(d.is_parameter_type_match_required());
        assert_eq!(d.blob_field_type(), "BYTEA");
        assert_eq!(d.lob_strategy(), LobStrategy::Buffered);
        assert_eq!(
            d.peek_query("SELECT id FROM t", 1, LockWait::default()).unwrap(),
            "SELECT id FROM t LIMIT 1"
        );
    }

    #[tokio::test]
    async fn test_table_present() {
        let sql = "select count(*) from pg_catalog.pg_tables where upper(tablename)=? and upper(schemaname)='PUBLIC'";
        let conn = MockConnection::new("PostgreSQL", "16.2").with_int(sql, 1);
        assert!(PostgresDialect::new().table_present(&conn, Some("public"), "ibisstore").await);
    }
}
