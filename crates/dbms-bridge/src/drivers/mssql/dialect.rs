//! MSSQL SQL dialect (Strategy pattern).
//!
//! SQL Server expresses row locking through table hints rather than a
//! trailing `FOR UPDATE` clause, and limits rows with `TOP n` directly
//! after the `SELECT` keyword.

use async_trait::async_trait;
use chrono::NaiveDateTime;
use tracing::warn;

use crate::core::connection::DbConnection;
use crate::core::dbms::Dbms;
use crate::core::introspect::count_present;
use crate::core::lob::LobStrategy;
use crate::core::lock::{LockWait, LockWaitMode};
use crate::core::traits::{DbmsCapability, DATETIME_FORMAT};
use crate::drivers::common::{after_select, insert_table_hint, require_select};
use crate::error::{DbmsError, Result};

const HINT_SKIP_LOCKED: &str = "WITH (rowlock,updlock,readpast)";
const HINT_NO_WAIT: &str = "WITH (rowlock,updlock,nowait)";
const HINT_READPAST: &str = "WITH (readpast)";
const HINT_NOLOCK: &str = "WITH (nolock)";

/// Microsoft SQL Server dialect implementation.
#[derive(Debug, Clone, Default)]
pub struct MssqlDialect;

impl MssqlDialect {
    /// Create a new MSSQL dialect instance.
    pub fn new() -> Self {
        Self
    }
}

/// Prefix the select list with `TOP n`; zero leaves the query unlimited.
fn with_top(query: &str, batch_size: u32) -> String {
    if batch_size > 0 {
        format!("SELECT TOP {} {}", batch_size, after_select(query))
    } else {
        query.trim().to_string()
    }
}

#[async_trait]
impl DbmsCapability for MssqlDialect {
    fn dbms(&self) -> Dbms {
        Dbms::Mssql
    }

    fn has_skip_locked(&self) -> bool {
        true
    }

    fn sys_date(&self) -> String {
        "GETDATE()".to_string()
    }

    fn date_and_offset(&self, value: &str, days: i32) -> String {
        format!("DATEADD(day, {}, {})", days, value)
    }

    fn auto_increment_column_ddl(&self) -> String {
        "INT IDENTITY".to_string()
    }

    fn inserted_auto_increment_query(&self, _sequence: &str) -> Option<String> {
        Some("SELECT @@IDENTITY".to_string())
    }

    fn timestamp_field_type(&self) -> String {
        "DATETIME".to_string()
    }

    fn datetime_literal(&self, value: NaiveDateTime) -> String {
        format!("CONVERT(datetime, '{}', 120)", value.format(DATETIME_FORMAT))
    }

    fn timestamp_as_date(&self, column: &str) -> String {
        format!("CONVERT(VARCHAR(10), {}, 120)", column)
    }

    fn blob_field_type(&self) -> String {
        "VARBINARY(MAX)".to_string()
    }

    fn clob_field_type(&self) -> String {
        "VARCHAR(MAX)".to_string()
    }

    fn length(&self, column: &str) -> String {
        format!("LEN({})", column)
    }

    fn boolean_literal(&self, value: bool) -> String {
        if value { "1" } else { "0" }.to_string()
    }

    fn first_record_query(&self, table: &str) -> String {
        format!("SELECT TOP(1) * FROM {}", table)
    }

    fn trailing_first_rows_hint(&self, rows: u32) -> String {
        format!(" OPTION (FAST {})", rows)
    }

    fn locking_read_query(&self, query: &str, batch_size: u32, wait: LockWait) -> Result<String> {
        require_select(query)?;
        let hint = match wait.mode() {
            LockWaitMode::SkipLocked => HINT_SKIP_LOCKED,
            LockWaitMode::NoWait => HINT_NO_WAIT,
            mode => return Err(DbmsError::unsupported(self.dbms(), mode.to_string(), query)),
        };
        Ok(insert_table_hint(&with_top(query, batch_size), hint))
    }

    fn peek_query(&self, query: &str, batch_size: u32, _wait: LockWait) -> Result<String> {
        require_select(query)?;
        Ok(insert_table_hint(&with_top(query, batch_size), HINT_READPAST))
    }

    fn non_locking_read_query(&self, query: &str) -> Result<String> {
        require_select(query)?;
        Ok(insert_table_hint(query, HINT_NOLOCK))
    }

    fn lob_strategy(&self) -> LobStrategy {
        LobStrategy::CreateUpFront
    }

    async fn schema(&self, conn: &dyn DbConnection) -> Option<String> {
        match conn.query_string("SELECT SCHEMA_NAME()", &[]).await {
            Ok(schema) => schema,
            Err(e) => {
                warn!("could not determine current schema: {}", e);
                None
            }
        }
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
                    "select count(*) from sys.sequences seq join sys.schemas sch on seq.schema_id=sch.schema_id where sch.name=? and seq.name=?",
                    &[schema, sequence],
                    &what,
                )
                .await
            }
            None => {
                count_present(
                    conn,
                    "select count(*) from sys.sequences where name=?",
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
    fn test_locking_read_skip_locked() {
        let sql = MssqlDialect::new()
            .locking_read_query("SELECT * FROM t WHERE x=1", 10, LockWait::SKIP_LOCKED)
            .unwrap();
        assert!(sql.starts_with("SELECT TOP 10 *"));
        assert_eq!(sql, "SELECT TOP 10 * FROM t WITH (rowlock,updlock,readpast) WHERE x=1");
    }

    #[test]
    fn test_locking_read_no_wait_and_unlimited() {
        let sql = MssqlDialect::new()
            .locking_read_query("SELECT id FROM t ORDER BY id", 0, LockWait::NO_WAIT)
            .unwrap();
        assert_eq!(sql, "SELECT id FROM t WITH (rowlock,updlock,nowait) ORDER BY id");
    }

    #[test]
    fn test_locking_read_rejects_positive_wait() {
        let err = MssqlDialect::new()
            .locking_read_query("SELECT id FROM t", 1, LockWait::seconds(5))
            .unwrap_err();
        assert!(matches!(err, DbmsError::Unsupported { dbms: Dbms::Mssql, .. }));
    }

    #[test]
    fn test_rejects_non_select_for_every_wait() {
        for wait in [-1, 0, 5] {
            assert!(matches!(
                MssqlDialect::new().locking_read_query("INSERT INTO t VALUES (1)", 1, LockWait::new(wait)),
                Err(DbmsError::InvalidQuery { .. })
            ));
        }
    }

    #[test]
    fn test_peek_and_non_locking() {
        let d = MssqlDialect::new();
        assert_eq!(
            d.peek_query("SELECT id FROM t WHERE a=1", 1, LockWait::default()).unwrap(),
            "SELECT TOP 1 id FROM t WITH (readpast) WHERE a=1"
        );
        assert_eq!(
            d.non_locking_read_query("SELECT id FROM t").unwrap(),
            "SELECT id FROM t WITH (nolock)"
        );
    }

    #[test]
    fn test_fragments() {
        let d = MssqlDialect::new();
        assert_eq!(d.date_and_offset("GETDATE()", 2), "DATEADD(day, 2, GETDATE())");
        assert_eq!(d.length("c"), "LEN(c)");
        assert_eq!(d.first_record_query("t"), "SELECT TOP(1) * FROM t");
        assert_eq!(d.trailing_first_rows_hint(5), " OPTION (FAST 5)");
        assert_eq!(d.lob_strategy(), LobStrategy::CreateUpFront);
    }

    #[tokio::test]
    async fn test_sequence_present() {
        let sql = "select count(*) from sys.sequences where name=?";
        let conn = MockConnection::new("Microsoft SQL Server", "16").with_int(sql, 1);
        assert!(MssqlDialect::new().sequence_present(&conn, None, "t", "seq_t").await);
    }
}
