//! DB2 SQL dialect (Strategy pattern).

use async_trait::async_trait;
use tracing::warn;

use crate::core::connection::DbConnection;
use crate::core::dbms::Dbms;
use crate::core::introspect::count_present;
use crate::core::lob::LobStrategy;
use crate::core::lock::{LockWait, LockWaitMode};
use crate::core::traits::DbmsCapability;
use crate::drivers::common::require_select;
use crate::error::{DbmsError, Result};

/// DB2 dialect implementation.
#[derive(Debug, Clone, Default)]
pub struct Db2Dialect;

impl Db2Dialect {
    /// Create a new DB2 dialect instance.
    pub fn new() -> Self {
        Self
    }
}

fn fetch_first(query: &str, batch_size: u32) -> String {
    if batch_size > 0 {
        format!("{} FETCH FIRST {} ROWS ONLY", query, batch_size)
    } else {
        query.to_string()
    }
}

#[async_trait]
impl DbmsCapability for Db2Dialect {
    fn dbms(&self) -> Dbms {
        Dbms::Db2
    }

    fn has_skip_locked(&self) -> bool {
        true
    }

    fn sys_date(&self) -> String {
        "CURRENT TIMESTAMP".to_string()
    }

    fn date_and_offset(&self, value: &str, days: i32) -> String {
        format!("{} + {} DAYS", value, days)
    }

    fn from_for_tableless_select(&self) -> String {
        " FROM SYSIBM.SYSDUMMY1".to_string()
    }

    fn auto_increment_column_ddl(&self) -> String {
        "INT GENERATED ALWAYS AS IDENTITY".to_string()
    }

    fn inserted_auto_increment_query(&self, _sequence: &str) -> Option<String> {
        Some("SELECT IDENTITY_VAL_LOCAL() FROM SYSIBM.SYSDUMMY1".to_string())
    }

    fn timestamp_as_date(&self, column: &str) -> String {
        format!("VARCHAR_FORMAT({},'YYYY-MM-DD')", column)
    }

    fn boolean_literal(&self, value: bool) -> String {
        if value { "1" } else { "0" }.to_string()
    }

    /// Only skip-locked reading is expressible; DB2 controls lock waits
    /// through the `LOCKTIMEOUT` register, not per statement.
    fn locking_read_query(&self, query: &str, batch_size: u32, wait: LockWait) -> Result<String> {
        require_select(query)?;
        match wait.mode() {
            LockWaitMode::SkipLocked => Ok(format!(
                "{} FOR UPDATE SKIP LOCKED DATA",
                fetch_first(query, batch_size)
            )),
            mode => Err(DbmsError::unsupported(self.dbms(), mode.to_string(), query)),
        }
    }

    fn peek_query(&self, query: &str, batch_size: u32, _wait: LockWait) -> Result<String> {
        require_select(query)?;
        Ok(fetch_first(query, batch_size))
    }

    fn lob_strategy(&self) -> LobStrategy {
        LobStrategy::CreateUpFront
    }

    async fn schema(&self, conn: &dyn DbConnection) -> Option<String> {
        match conn
            .query_string("SELECT CURRENT SCHEMA FROM SYSIBM.SYSDUMMY1", &[])
            .await
        {
            Ok(schema) => schema.map(|s| s.trim().to_string()),
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
                    "select count(*) from syscat.sequences where seqschema=upper(?) and seqname=upper(?)",
                    &[schema, sequence],
                    &what,
                )
                .await
            }
            None => {
                count_present(
                    conn,
                    "select count(*) from syscat.sequences where seqname=upper(?)",
                    &[sequence],
                    &what,
                )
                .await
            }
        }
    }
}
