//! Catalog-query helpers behind the advisory existence checks.
//!
//! Existence checks never propagate driver failures: a failed lookup is
//! logged and answered with `false`.

use tracing::warn;

use super::connection::DbConnection;
use super::identifier::quote_literal;

/// Catalog view listing tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TablesCatalog {
    pub view: &'static str,
    pub schema_column: Option<&'static str>,
    pub table_column: &'static str,
}

/// Catalog view listing columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ColumnsCatalog {
    pub view: &'static str,
    pub schema_column: Option<&'static str>,
    pub table_column: &'static str,
    pub column_column: &'static str,
}

/// Pair of catalog views describing indexes and their columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexCatalog {
    pub index_view: &'static str,
    pub index_column_view: &'static str,
    pub owner_column: Option<&'static str>,
    pub table_column: &'static str,
    pub index_name_column: &'static str,
    pub column_name_column: &'static str,
    pub position_column: &'static str,
}

/// Run a `count(*)` query and report whether it found at least one row.
pub async fn count_present(conn: &dyn DbConnection, sql: &str, params: &[&str], what: &str) -> bool {
    match conn.query_int(sql, params).await {
        Ok(count) => count >= 1,
        Err(e) => {
            warn!("could not determine presence of {} using query [{}]: {}", what, sql, e);
            false
        }
    }
}

fn schema_filter(schema_column: Option<&str>, schema: Option<&str>, view: &str, what: &str) -> Option<String> {
    match (schema, schema_column) {
        (Some(schema), Some(column)) if !schema.is_empty() => Some(format!(
            " and upper({})='{}'",
            column,
            schema.to_uppercase().replace('\'', "''")
        )),
        (Some(schema), None) if !schema.is_empty() => {
            warn!(
                "no schema column present in [{}] to test for presence of {} in schema [{}]",
                view, what, schema
            );
            None
        }
        _ => Some(String::new()),
    }
}

pub async fn table_present_in_catalog(
    conn: &dyn DbConnection,
    catalog: &TablesCatalog,
    schema: Option<&str>,
    table: &str,
) -> bool {
    let what = format!("table [{}]", table);
    let Some(filter) = schema_filter(catalog.schema_column, schema, catalog.view, &what) else {
        return false;
    };
    let sql = format!(
        "select count(*) from {} where upper({})=?{}",
        catalog.view, catalog.table_column, filter
    );
    count_present(conn, &sql, &[&table.to_uppercase()], &what).await
}

pub async fn column_present_in_catalog(
    conn: &dyn DbConnection,
    catalog: &ColumnsCatalog,
    schema: Option<&str>,
    table: &str,
    column: &str,
) -> bool {
    let what = format!("column [{}] of table [{}]", column, table);
    let Some(filter) = schema_filter(catalog.schema_column, schema, catalog.view, &what) else {
        return false;
    };
    let sql = format!(
        "select count(*) from {} where upper({})=? and upper({})=?{}",
        catalog.view, catalog.table_column, catalog.column_column, filter
    );
    count_present(
        conn,
        &sql,
        &[&table.to_uppercase(), &column.to_uppercase()],
        &what,
    )
    .await
}

/// Build the query that counts indexes covering `columns` in that order.
pub fn index_on_columns_query(
    catalog: &IndexCatalog,
    schema: Option<&str>,
    table: &str,
    columns: &[&str],
) -> crate::error::Result<String> {
    let mut sql = format!("select count(*) from {} ai", catalog.index_view);
    for i in 1..=columns.len() {
        sql.push_str(&format!(", {} aic{}", catalog.index_column_view, i));
    }
    sql.push_str(&format!(
        " where ai.{}={}",
        catalog.table_column,
        quote_literal(table)?
    ));
    if let (Some(owner_column), Some(schema)) = (catalog.owner_column, schema) {
        sql.push_str(&format!(" and ai.{}={}", owner_column, quote_literal(schema)?));
    }
    for (i, column) in columns.iter().enumerate() {
        let n = i + 1;
        sql.push_str(&format!(
            " and ai.{idx}=aic{n}.{idx} and aic{n}.{col}={lit} and aic{n}.{pos}={n}",
            idx = catalog.index_name_column,
            col = catalog.column_name_column,
            pos = catalog.position_column,
            lit = quote_literal(column)?,
            n = n
        ));
    }
    Ok(sql)
}

pub async fn index_on_columns_in_catalog(
    conn: &dyn DbConnection,
    catalog: &IndexCatalog,
    schema: Option<&str>,
    table: &str,
    columns: &[&str],
) -> bool {
    let what = format!("index columns {:?} on table [{}]", columns, table);
    match index_on_columns_query(catalog, schema, table, columns) {
        Ok(sql) => count_present(conn, &sql, &[], &what).await,
        Err(e) => {
            warn!("could not determine presence of {}: {}", what, e);
            false
        }
    }
}
