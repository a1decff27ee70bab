//! H2 SQL dialect (Strategy pattern).
//!
//! H2 is mostly used as an embedded test database, running scripts written
//! for Oracle through the translation layer.

use async_trait::async_trait;
use tracing::warn;

use crate::core::connection::DbConnection;
use crate::core::dbms::Dbms;
use crate::core::introspect::count_present;
use crate::core::lob::LobStrategy;
use crate::core::lock::{LockWait, LockWaitMode};
use crate::core::traits::DbmsCapability;
use crate::drivers::common::{require_select, with_limit};
use crate::error::Result;

/// H2 dialect implementation.
#[derive(Debug, Clone, Default)]
pub struct H2Dialect;

impl H2Dialect {
    /// Create a new H2 dialect instance.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl DbmsCapability for H2Dialect {
    fn dbms(&self) -> Dbms {
        Dbms::H2
    }

    fn has_skip_locked(&self) -> bool {
        true
    }

    fn date_and_offset(&self, value: &str, days: i32) -> String {
        format!("DATEADD('DAY', {}, {})", days, value)
    }

    fn auto_increment_column_ddl(&self) -> String {
        "INT AUTO_INCREMENT".to_string()
    }

    fn timestamp_as_date(&self, column: &str) -> String {
        format!("FORMATDATETIME({},'yyyy-MM-dd')", column)
    }

    fn first_record_query(&self, table: &str) -> String {
        format!("SELECT * FROM {} LIMIT 1", table)
    }

    fn locking_read_query(&self, query: &str, batch_size: u32, wait: LockWait) -> Result<String> {
        require_select(query)?;
        let query = with_limit(query, batch_size);
        Ok(match wait.mode() {
            LockWaitMode::SkipLocked => format!("{} FOR UPDATE SKIP LOCKED", query),
            LockWaitMode::NoWait => format!("{} FOR UPDATE NOWAIT", query),
            LockWaitMode::Seconds(n) => format!("{} FOR UPDATE WAIT {}", query, n),
        })
    }

    fn peek_query(&self, query: &str, batch_size: u32, _wait: LockWait) -> Result<String> {
        require_select(query)?;
        Ok(with_limit(query, batch_size))
    }

    fn lob_strategy(&self) -> LobStrategy {
        LobStrategy::CreateUpFront
    }

    async fn schema(&self, conn: &dyn DbConnection) -> Option<String> {
        match conn.query_string("SELECT CURRENT_SCHEMA", &[]).await {
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
                    "select count(*) from information_schema.sequences where sequence_schema=upper(?) and sequence_name=upper(?)",
                    &[schema, sequence],
                    &what,
                )
                .await
            }
            None => {
                count_present(
                    conn,
                    "select count(*) from information_schema.sequences where sequence_name=upper(?)",
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
    use crate::error::DbmsError;

    #[test]
    fn test_locking_read_modes() {
        let d = H2Dialect::new();
        let q = "SELECT id FROM t WHERE a=1";
        assert_eq!(
            d.locking_read_query(q, 10, LockWait::SKIP_LOCKED).unwrap(),
            "SELECT id FROM t WHERE a=1 LIMIT 10 FOR UPDATE SKIP LOCKED"
        );
        assert_eq!(
            d.locking_read_query(q, 0, LockWait::NO_WAIT).unwrap(),
            "SELECT id FROM t WHERE a=1 FOR UPDATE NOWAIT"
        );
        assert_eq!(
            d.locking_read_query(q, 0, LockWait::seconds(2)).unwrap(),
            "SELECT id FROM t WHERE a=1 FOR UPDATE WAIT 2"
        );
    }

    #[test]
    fn test_rejects_non_select_for_every_wait() {
        for wait in [-1, 0, 2] {
            assert!(matches!(
                H2Dialect::new().locking_read_query("MERGE INTO t", 1, LockWait::new(wait)),
                Err(DbmsError::InvalidQuery { .. })
            ));
        }
    }

    #[tokio::test]
    async fn test_sequence_present() {
        let conn = MockConnection::new("H2", "2.2.224").with_int(
            "select count(*) from information_schema.sequences where sequence_name=upper(?)",
            1,
        );
        assert!(H2Dialect::new().sequence_present(&conn, None, "t", "seq_t").await);
        assert!(!H2Dialect::new().sequence_present(&conn, Some("PUBLIC"), "t", "seq_t").await);
    }
}
