//! The DBMS capability strategy.
//!
//! [`DbmsCapability`] describes how one database phrases the SQL the
//! framework needs: locking reads for work queues, pagination, DDL idioms,
//! LOB access and schema introspection. Every method has a default that
//! implements the behavior of a "generic" database; dialect implementations
//! in [`crate::drivers`] override what differs.
//!
//! # Design Patterns
//!
//! - **Strategy**: one capability per dialect, chosen once by the
//!   [`DbmsSelector`](super::selector::DbmsSelector)
//! - **Template Method**: default methods form the generic skeleton

use std::fmt::Debug;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use tracing::warn;

use crate::error::{DbmsError, Result};
use crate::script::split_statements;
use crate::translate::TranslatorRegistry;

use super::connection::{ColumnMeta, DbConnection};
use super::dbms::Dbms;
use super::lob::{LobColumns, LobHandle, LobKind, LobStrategy, LobWriter};
use super::lock::{LockWait, LockWaitMode};
use crate::drivers::common::require_select;

/// Format used for datetime literals.
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// SQL phrasing and introspection strategy for one database.
///
/// Implementations are shared between concurrent callers and must be
/// stateless, or memoize derived facts idempotently.
#[async_trait]
pub trait DbmsCapability: Send + Sync + Debug {
    /// The database this capability is bound to.
    fn dbms(&self) -> Dbms {
        Dbms::Generic
    }

    /// Name of the dialect, equal to its [`Dbms`] key.
    fn name(&self) -> &'static str {
        self.dbms().key()
    }

    /// Whether the database can skip rows locked by other transactions.
    fn has_skip_locked(&self) -> bool {
        false
    }

    /// Whether bound parameters must match the column type exactly.
    fn is_parameter_type_match_required(&self) -> bool {
        false
    }

    // ===== SQL fragments =====

    fn sys_date(&self) -> String {
        "NOW()".to_string()
    }

    fn date_and_offset(&self, value: &str, days: i32) -> String {
        format!("{} + {}", value, days)
    }

    /// Clause completing a select without a table, such as ` FROM DUAL`.
    fn from_for_tableless_select(&self) -> String {
        String::new()
    }

    fn auto_increment_column_ddl(&self) -> String {
        "INT DEFAULT AUTOINCREMENT".to_string()
    }

    fn auto_increment_key_must_be_inserted(&self) -> bool {
        false
    }

    /// Value to insert into an auto increment key, when one is required.
    fn auto_increment_insert_value(&self, _sequence: &str) -> Option<String> {
        None
    }

    fn auto_increment_uses_sequence(&self) -> bool {
        false
    }

    /// Query returning the key generated by the last insert.
    fn inserted_auto_increment_query(&self, _sequence: &str) -> Option<String> {
        None
    }

    fn timestamp_field_type(&self) -> String {
        "TIMESTAMP".to_string()
    }

    fn datetime_literal(&self, value: NaiveDateTime) -> String {
        format!(
            "TO_TIMESTAMP('{}', 'YYYY-MM-DD HH24:MI:SS')",
            value.format(DATETIME_FORMAT)
        )
    }

    fn timestamp_as_date(&self, column: &str) -> String {
        format!("TO_CHAR({},'YYYY-MM-DD')", column)
    }

    fn blob_field_type(&self) -> String {
        "BLOB".to_string()
    }

    fn clob_field_type(&self) -> String {
        "CLOB".to_string()
    }

    fn text_field_type(&self) -> String {
        "VARCHAR".to_string()
    }

    fn length(&self, column: &str) -> String {
        format!("LENGTH({})", column)
    }

    fn boolean_literal(&self, value: bool) -> String {
        if value { "TRUE" } else { "FALSE" }.to_string()
    }

    /// Query selecting the first row of a table.
    fn first_record_query(&self, table: &str) -> String {
        format!("SELECT * FROM {} FETCH FIRST 1 ROWS ONLY", table)
    }

    /// Row number expression ordered by `order` with optional direction.
    fn row_number_expr(&self, order: &str, sort: Option<&str>) -> String {
        match sort.map(str::trim).filter(|s| !s.is_empty()) {
            Some(sort) => format!("ROW_NUMBER() OVER (ORDER BY {} {})", order, sort),
            None => format!("ROW_NUMBER() OVER (ORDER BY {})", order),
        }
    }

    fn index_hint_after_first_keyword(&self, _table: &str, _index: &str) -> String {
        String::new()
    }

    fn first_rows_hint_after_first_keyword(&self, _rows: u32) -> String {
        String::new()
    }

    fn trailing_first_rows_hint(&self, _rows: u32) -> String {
        String::new()
    }

    /// Whether a SQLSTATE denotes an integrity constraint violation.
    fn is_constraint_violation(&self, sql_state: Option<&str>) -> bool {
        sql_state.map_or(false, |state| state.starts_with("23"))
    }

    // ===== Query shaping =====

    /// Rewrite a select into a query claiming up to `batch_size` rows.
    ///
    /// A `batch_size` of zero places no limit on the number of rows.
    fn locking_read_query(&self, query: &str, _batch_size: u32, wait: LockWait) -> Result<String> {
        require_select(query)?;
        match wait.mode() {
            LockWaitMode::SkipLocked => {
                warn!(
                    "don't know how to perform a locking read for dialect [{}], doing a guess",
                    self.name()
                );
                Ok(format!("{} FOR UPDATE", query))
            }
            mode => Err(DbmsError::unsupported(self.dbms(), mode.to_string(), query)),
        }
    }

    /// Rewrite a select into a non-claiming look-ahead for available work.
    fn peek_query(&self, query: &str, _batch_size: u32, _wait: LockWait) -> Result<String> {
        require_select(query)?;
        Ok(query.to_string())
    }

    fn non_locking_read_query(&self, query: &str) -> Result<String> {
        Ok(query.to_string())
    }

    // ===== LOB access =====

    fn lob_strategy(&self) -> LobStrategy {
        LobStrategy::Locator
    }

    fn open_lob_update(
        &self,
        rs: &mut dyn LobColumns,
        column: usize,
        kind: LobKind,
    ) -> Result<LobHandle> {
        self.lob_strategy().open(rs, column, kind)
    }

    fn lob_writer(&self, handle: LobHandle) -> LobWriter {
        handle.into_writer()
    }

    fn commit_lob(&self, rs: &mut dyn LobColumns, column: usize, writer: LobWriter) -> Result<()> {
        self.lob_strategy().commit(rs, column, writer)
    }

    // ===== Introspection =====

    /// Current schema of the connection, `None` when unknown.
    async fn schema(&self, _conn: &dyn DbConnection) -> Option<String> {
        None
    }

    async fn table_present(&self, conn: &dyn DbConnection, schema: Option<&str>, table: &str) -> bool {
        match conn.tables(schema, table).await {
            Ok(tables) => !tables.is_empty(),
            Err(e) => {
                warn!("could not determine presence of table [{}]: {}", table, e);
                false
            }
        }
    }

    async fn column_present(
        &self,
        conn: &dyn DbConnection,
        schema: Option<&str>,
        table: &str,
        column: &str,
    ) -> bool {
        match conn.columns(schema, table, Some(column)).await {
            Ok(columns) => !columns.is_empty(),
            Err(e) => {
                warn!(
                    "could not determine presence of column [{}] of table [{}]: {}",
                    column, table, e
                );
                false
            }
        }
    }

    /// Whether an index on `table` starts with `column`.
    async fn index_on_column(
        &self,
        conn: &dyn DbConnection,
        schema: Option<&str>,
        table: &str,
        column: &str,
    ) -> bool {
        match conn.index_columns(schema, table).await {
            Ok(index_columns) => index_columns.iter().any(|c| {
                c.table.eq_ignore_ascii_case(table)
                    && c.column.eq_ignore_ascii_case(column)
                    && c.ordinal_position == 1
            }),
            Err(e) => {
                warn!(
                    "could not determine presence of index on column [{}] of table [{}]: {}",
                    column, table, e
                );
                false
            }
        }
    }

    /// Whether an index on `table` covers exactly `columns` as its leading columns.
    async fn index_on_columns(
        &self,
        _conn: &dyn DbConnection,
        _schema: Option<&str>,
        table: &str,
        _columns: &[&str],
    ) -> bool {
        warn!("could not determine presence of index columns on table [{}]", table);
        true
    }

    async fn sequence_present(
        &self,
        _conn: &dyn DbConnection,
        _schema: Option<&str>,
        _table: &str,
        sequence: &str,
    ) -> bool {
        warn!("could not determine presence of sequence [{}]", sequence);
        true
    }

    async fn table_columns(
        &self,
        conn: &dyn DbConnection,
        schema: Option<&str>,
        table: &str,
    ) -> Result<Vec<ColumnMeta>> {
        conn.columns(schema, table, None).await.map_err(|e| {
            DbmsError::driver(format!("retrieving columns for table [{}]", table), e)
        })
    }

    // ===== Translation =====

    /// Convert a script written for `source` into this dialect.
    ///
    /// Statements the translator drops are left out; the remaining ones
    /// are joined with newlines.
    fn convert_query(&self, query: &str, source: Dbms, registry: &TranslatorRegistry) -> String {
        if source == Dbms::None || source == self.dbms() {
            return query.to_string();
        }
        let Some(translator) = registry.translator(source, self.dbms()) else {
            warn!(
                "don't know how to convert queries from [{}] to [{}], returning query unchanged",
                source,
                self.dbms()
            );
            return query.to_string();
        };
        split_statements(query)
            .iter()
            .filter_map(|statement| translator.translate(statement))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use chrono::NaiveDate;

    use super::*;
    use crate::core::connection::mock::MockConnection;
    use crate::core::connection::{IndexColumn, TableRef};
    use crate::core::lob::mock::MockRow;

    #[derive(Debug)]
    struct Plain;

    impl DbmsCapability for Plain {}

    #[test]
    fn test_generic_fragments() {
        let d = Plain;
        assert_eq!(d.name(), "generic");
        assert_eq!(d.sys_date(), "NOW()");
        assert_eq!(d.date_and_offset("created", -3), "created + -3");
        assert_eq!(d.boolean_literal(true), "TRUE");
        assert_eq!(d.length("c"), "LENGTH(c)");
        assert_eq!(d.auto_increment_insert_value("seq"), None);
        assert_eq!(
            d.row_number_expr("id", Some("DESC")),
            "ROW_NUMBER() OVER (ORDER BY id DESC)"
        );
        assert_eq!(d.row_number_expr("id", None), "ROW_NUMBER() OVER (ORDER BY id)");
        let ts = NaiveDate::from_ymd_opt(2024, 3, 1)
            .unwrap()
            .and_hms_opt(13, 4, 5)
            .unwrap();
        assert_eq!(
            d.datetime_literal(ts),
            "TO_TIMESTAMP('2024-03-01 13:04:05', 'YYYY-MM-DD HH24:MI:SS')"
        );
    }

    #[test]
    fn test_constraint_violation() {
        let d = Plain;
        assert!(d.is_constraint_violation(Some("23505")));
        assert!(!d.is_constraint_violation(Some("42000")));
        assert!(!d.is_constraint_violation(None));
    }

    #[test]
    fn test_generic_locking_read() {
        let d = Plain;
        assert_eq!(
            d.locking_read_query("SELECT * FROM t", 10, LockWait::SKIP_LOCKED)
                .unwrap(),
            "SELECT * FROM t FOR UPDATE"
        );
        assert!(matches!(
            d.locking_read_query("SELECT * FROM t", 10, LockWait::NO_WAIT),
            Err(DbmsError::Unsupported { .. })
        ));
        assert!(matches!(
            d.locking_read_query("SELECT * FROM t", 10, LockWait::seconds(5)),
            Err(DbmsError::Unsupported { .. })
        ));
    }

    #[test]
    fn test_peek_requires_select() {
        let d = Plain;
        assert!(d.peek_query("DELETE FROM t", 1, LockWait::default()).is_err());
        assert_eq!(
            d.peek_query("SELECT 1", 1, LockWait::default()).unwrap(),
            "SELECT 1"
        );
    }

    #[test]
    fn test_lob_update_through_capability() {
        let d = Plain;
        let mut row = MockRow::default();
        let handle = d.open_lob_update(&mut row, 1, LobKind::Clob).unwrap();
        let mut writer = d.lob_writer(handle);
        writer.write_all(b"x").unwrap();
        d.commit_lob(&mut row, 1, writer).unwrap();
        assert_eq!(row.updated_lobs, vec![1]);
    }

    #[tokio::test]
    async fn test_metadata_checks() {
        let mut conn = MockConnection::new("Generic", "1");
        conn.tables.push(TableRef {
            schema: None,
            name: "IBISSTORE".to_string(),
        });
        conn.index_columns.push(IndexColumn {
            table: "IBISSTORE".to_string(),
            index_name: "IX_1".to_string(),
            column: "TYPE".to_string(),
            ordinal_position: 1,
        });
        conn.index_columns.push(IndexColumn {
            table: "IBISSTORE".to_string(),
            index_name: "IX_1".to_string(),
            column: "SLOTID".to_string(),
            ordinal_position: 2,
        });

        let d = Plain;
        assert!(d.table_present(&conn, None, "ibisstore").await);
        assert!(!d.table_present(&conn, None, "other").await);
        assert!(d.index_on_column(&conn, None, "IBISSTORE", "type").await);
        assert!(!d.index_on_column(&conn, None, "IBISSTORE", "slotid").await);
        assert!(d.schema(&conn).await.is_none());
    }

    #[tokio::test]
    async fn test_metadata_failure_is_absent() {
        let conn = MockConnection::new("Generic", "1").failing();
        let d = Plain;
        assert!(!d.table_present(&conn, None, "t").await);
        assert!(!d.column_present(&conn, None, "t", "c").await);
        assert!(!d.index_on_column(&conn, None, "t", "c").await);
        assert!(matches!(
            d.table_columns(&conn, None, "t").await,
            Err(DbmsError::Driver { .. })
        ));
    }

    #[tokio::test]
    async fn test_unverifiable_checks_answer_true() {
        let conn = MockConnection::new("Generic", "1");
        let d = Plain;
        assert!(d.sequence_present(&conn, None, "t", "seq").await);
        assert!(d.index_on_columns(&conn, None, "t", &["a", "b"]).await);
    }

    #[test]
    fn test_convert_query_same_dialect_is_identity() {
        let registry = TranslatorRegistry::new();
        let d = Plain;
        let script = "SELECT 1;SELECT 2;";
        assert_eq!(d.convert_query(script, Dbms::Generic, &registry), script);
        assert_eq!(d.convert_query(script, Dbms::None, &registry), script);
    }
}
