//! Oracle SQL dialect (Strategy pattern).
//!
//! Oracle supports all three lock-wait modes natively and answers
//! introspection from its `ALL_*`/`USER_*` data dictionary views.

use async_trait::async_trait;
use tracing::warn;

use crate::core::connection::DbConnection;
use crate::core::dbms::Dbms;
use crate::core::introspect::{
    column_present_in_catalog, count_present, index_on_columns_in_catalog,
    table_present_in_catalog, ColumnsCatalog, IndexCatalog, TablesCatalog,
};
use crate::core::lock::{LockWait, LockWaitMode};
use crate::core::traits::DbmsCapability;
use crate::drivers::common::require_select;
use crate::error::Result;

const ALL_TABLES: TablesCatalog = TablesCatalog {
    view: "all_tables",
    schema_column: Some("owner"),
    table_column: "table_name",
};

const USER_TABLES: TablesCatalog = TablesCatalog {
    view: "user_tables",
    schema_column: None,
    table_column: "table_name",
};

const ALL_COLUMNS: ColumnsCatalog = ColumnsCatalog {
    view: "all_tab_columns",
    schema_column: Some("owner"),
    table_column: "table_name",
    column_column: "column_name",
};

const USER_COLUMNS: ColumnsCatalog = ColumnsCatalog {
    view: "user_tab_columns",
    schema_column: None,
    table_column: "table_name",
    column_column: "column_name",
};

const INDEXES: IndexCatalog = IndexCatalog {
    index_view: "all_indexes",
    index_column_view: "all_ind_columns",
    owner_column: Some("table_owner"),
    table_column: "table_name",
    index_name_column: "index_name",
    column_name_column: "column_name",
    position_column: "column_position",
};

const CURRENT_SCHEMA_QUERY: &str = "SELECT SYS_CONTEXT('USERENV','CURRENT_SCHEMA') FROM DUAL";

/// Oracle dialect implementation.
#[derive(Debug, Clone, Default)]
pub struct OracleDialect;

impl OracleDialect {
    /// Create a new Oracle dialect instance.
    pub fn new() -> Self {
        Self
    }
}

fn has_schema(schema: Option<&str>) -> Option<&str> {
    schema.filter(|s| !s.is_empty())
}

#[async_trait]
impl DbmsCapability for OracleDialect {
    fn dbms(&self) -> Dbms {
        Dbms::Oracle
    }

    fn has_skip_locked(&self) -> bool {
        true
    }

    fn sys_date(&self) -> String {
        "SYSDATE".to_string()
    }

    fn from_for_tableless_select(&self) -> String {
        " FROM DUAL".to_string()
    }

    fn auto_increment_column_ddl(&self) -> String {
        "NUMBER(10)".to_string()
    }

    fn auto_increment_key_must_be_inserted(&self) -> bool {
        true
    }

    fn auto_increment_insert_value(&self, sequence: &str) -> Option<String> {
        Some(format!("{}.NEXTVAL", sequence))
    }

    fn auto_increment_uses_sequence(&self) -> bool {
        true
    }

    fn inserted_auto_increment_query(&self, sequence: &str) -> Option<String> {
        Some(format!("SELECT {}.CURRVAL FROM DUAL", sequence))
    }

    fn text_field_type(&self) -> String {
        "VARCHAR2".to_string()
    }

    fn boolean_literal(&self, value: bool) -> String {
        if value { "1" } else { "0" }.to_string()
    }

    fn first_record_query(&self, table: &str) -> String {
        format!("SELECT * FROM {} WHERE ROWNUM=1", table)
    }

    fn index_hint_after_first_keyword(&self, table: &str, index: &str) -> String {
        format!(" /*+ INDEX ( {} {} ) */ ", table, index)
    }

    fn first_rows_hint_after_first_keyword(&self, rows: u32) -> String {
        format!(" /*+ FIRST_ROWS( {} ) */ ", rows)
    }

    /// Oracle cannot combine `ROWNUM` limiting with `SKIP LOCKED`, so the
    /// batch size is left to the fetch size of the caller.
    fn locking_read_query(&self, query: &str, _batch_size: u32, wait: LockWait) -> Result<String> {
        require_select(query)?;
        Ok(match wait.mode() {
            LockWaitMode::SkipLocked => format!("{} FOR UPDATE SKIP LOCKED", query),
            LockWaitMode::NoWait => format!("{} FOR UPDATE NOWAIT", query),
            LockWaitMode::Seconds(n) => format!("{} FOR UPDATE WAIT {}", query, n),
        })
    }

    async fn schema(&self, conn: &dyn DbConnection) -> Option<String> {
        match conn.query_string(CURRENT_SCHEMA_QUERY, &[]).await {
            Ok(schema) => schema,
            Err(e) => {
                warn!("could not determine current schema: {}", e);
                None
            }
        }
    }

    async fn table_present(&self, conn: &dyn DbConnection, schema: Option<&str>, table: &str) -> bool {
        match has_schema(schema) {
            Some(schema) => table_present_in_catalog(conn, &ALL_TABLES, Some(schema), table).await,
            None => table_present_in_catalog(conn, &USER_TABLES, None, table).await,
        }
    }

    async fn column_present(
        &self,
        conn: &dyn DbConnection,
        schema: Option<&str>,
        table: &str,
        column: &str,
    ) -> bool {
        match has_schema(schema) {
            Some(schema) => {
                column_present_in_catalog(conn, &ALL_COLUMNS, Some(schema), table, column).await
            }
            None => column_present_in_catalog(conn, &USER_COLUMNS, None, table, column).await,
        }
    }

    async fn index_on_columns(
        &self,
        conn: &dyn DbConnection,
        schema: Option<&str>,
        table: &str,
        columns: &[&str],
    ) -> bool {
        let upper: Vec<String> = columns.iter().map(|c| c.to_uppercase()).collect();
        let upper_refs: Vec<&str> = upper.iter().map(String::as_str).collect();
        let owner = has_schema(schema).map(str::to_uppercase);
        index_on_columns_in_catalog(
            conn,
            &INDEXES,
            owner.as_deref(),
            &table.to_uppercase(),
            &upper_refs,
        )
        .await
    }

    async fn sequence_present(
        &self,
        conn: &dyn DbConnection,
        schema: Option<&str>,
        _table: &str,
        sequence: &str,
    ) -> bool {
        let what = format!("sequence [{}]", sequence);
        match has_schema(schema) {
            Some(schema) => {
                count_present(
                    conn,
                    "select count(*) from all_sequences where sequence_owner=upper(?) and sequence_name=upper(?)",
                    &[schema, sequence],
                    &what,
                )
                .await
            }
            None => {
                count_present(
                    conn,
                    "select count(*) from user_sequences where sequence_name=upper(?)",
                    &[sequence],
                    &what,
                )
                .await
            }
        }
    }
}
