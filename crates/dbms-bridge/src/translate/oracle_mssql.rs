//! Oracle to SQL Server statement rewriter.

use tracing::debug;

use crate::core::dbms::Dbms;

use super::oracle::{
    clamp_maxvalue, number_any_precision, pseudo_column, remove_from_dual, remove_words,
    replace_empty_lobs, replace_words, strip_length_semantics, strip_storage_clauses,
};
use super::statement::{
    ends_with_words, find_top_level, rewrite_with, Rewrite, Statement, StatementClass,
};
use super::tokens::is_word;
use super::QueryTranslator;

/// Largest value of a SQL Server BIGINT sequence.
const MSSQL_MAX_SEQUENCE_VALUE: &str = "9223372036854775807";

const SEQUENCE_NEGATIONS: &[(&str, &[&str])] = &[
    ("NOCACHE", &["NO", "CACHE"]),
    ("NOCYCLE", &["NO", "CYCLE"]),
    ("NOMAXVALUE", &["NO", "MAXVALUE"]),
    ("NOMINVALUE", &["NO", "MINVALUE"]),
];

const DATE_FUNCTIONS: &[(&str, &[&str])] = &[
    ("SYSDATE", &["GETDATE()"]),
    ("SYSTIMESTAMP", &["CURRENT_TIMESTAMP"]),
];

const COLUMN_TYPES: &[(&str, &[&str])] = &[
    ("VARCHAR2", &["VARCHAR"]),
    ("NVARCHAR2", &["NVARCHAR"]),
    ("NUMBER", &["NUMERIC"]),
    ("CLOB", &["VARCHAR(MAX)"]),
    ("BLOB", &["VARBINARY(MAX)"]),
    ("DATE", &["DATETIME"]),
    ("TIMESTAMP", &["DATETIME2"]),
];

const ROW_LOCK_HINT: &str = "WITH (UPDLOCK, ROWLOCK)";

/// Rewrites Oracle statements so they run on SQL Server.
#[derive(Debug, Clone, Default)]
pub struct OracleToMssql;

impl OracleToMssql {
    pub fn new() -> Self {
        Self
    }
}

impl QueryTranslator for OracleToMssql {
    fn source(&self) -> Dbms {
        Dbms::Oracle
    }

    fn target(&self) -> Dbms {
        Dbms::Mssql
    }

    fn translate(&self, statement: &str) -> Option<String> {
        rewrite_with(statement, rewrite)
    }
}

fn rewrite(statement: &Statement) -> Rewrite {
    if statement.class() == StatementClass::SqlPlus {
        debug!("dropping SQL*Plus command for MS_SQL");
        return Rewrite::Dropped;
    }

    let mut tokens = statement.tokens().to_vec();
    if let Some(current) = current_value_query(&tokens) {
        return Rewrite::Rewritten(current);
    }

    let mut changed = sequence_pseudo_columns(&mut tokens)
        | replace_words(&mut tokens, DATE_FUNCTIONS)
        | replace_empty_lobs(&mut tokens, "0x", "''")
        | remove_from_dual(&mut tokens);

    changed |= match statement.class() {
        StatementClass::Select => row_lock_hint(&mut tokens),
        StatementClass::CreateSequence => {
            replace_words(&mut tokens, SEQUENCE_NEGATIONS)
                | remove_words(&mut tokens, &["ORDER", "NOORDER"])
                | clamp_maxvalue(&mut tokens, MSSQL_MAX_SEQUENCE_VALUE)
        }
        StatementClass::CreateTable => {
            strip_storage_clauses(&mut tokens, statement.class())
                | number_any_precision(&mut tokens)
                | strip_length_semantics(&mut tokens)
                | column_types(&mut tokens)
        }
        StatementClass::CreateIndex | StatementClass::AlterTable => {
            strip_storage_clauses(&mut tokens, statement.class())
        }
        _ => false,
    };

    if changed {
        Rewrite::Rewritten(tokens)
    } else {
        Rewrite::Unchanged
    }
}

fn current_value_subquery(sequence: &str) -> String {
    format!(
        "SELECT CURRENT_VALUE FROM SYS.SEQUENCES WHERE NAME = '{}'",
        sequence
    )
}

/// `SELECT seq.CURRVAL FROM DUAL` reads the sequence catalog directly.
fn current_value_query(tokens: &[String]) -> Option<Vec<String>> {
    if tokens.len() != 4
        || !is_word(&tokens[0], "SELECT")
        || !is_word(&tokens[2], "FROM")
        || !is_word(&tokens[3], "DUAL")
    {
        return None;
    }
    let sequence = pseudo_column(&tokens[1], "CURRVAL")?;
    Some(vec![current_value_subquery(sequence)])
}

/// `seq.NEXTVAL` becomes `NEXT VALUE FOR seq`; `seq.CURRVAL` elsewhere
/// becomes a sub-select on the sequence catalog.
fn sequence_pseudo_columns(tokens: &mut Vec<String>) -> bool {
    let mut changed = false;
    let mut out = Vec::with_capacity(tokens.len());
    for token in tokens.drain(..) {
        if let Some(sequence) = pseudo_column(&token, "NEXTVAL") {
            out.extend(["NEXT", "VALUE", "FOR", sequence].map(String::from));
            changed = true;
        } else if let Some(sequence) = pseudo_column(&token, "CURRVAL") {
            out.push(format!("({})", current_value_subquery(sequence)));
            changed = true;
        } else {
            out.push(token);
        }
    }
    *tokens = out;
    changed
}

/// A trailing `FOR UPDATE` on `SELECT ... FROM t WHERE ...` becomes a table
/// hint on `t`.
fn row_lock_hint(tokens: &mut Vec<String>) -> bool {
    if !ends_with_words(tokens, &["FOR", "UPDATE"]) {
        return false;
    }
    let Some(from) = find_top_level(tokens, "FROM") else {
        return false;
    };
    let simple = tokens.get(from + 2).map_or(false, |t| is_word(t, "WHERE"))
        && tokens.get(from + 1).map_or(false, |t| t != "(");
    if !simple {
        return false;
    }
    tokens.truncate(tokens.len() - 2);
    tokens.insert(from + 2, ROW_LOCK_HINT.to_string());
    true
}

/// Map the type of each column definition in a `CREATE TABLE` column list.
fn column_types(tokens: &mut [String]) -> bool {
    enum Expect {
        Name,
        Type,
        Other,
    }

    let mut changed = false;
    let mut depth = 0usize;
    let mut expect = Expect::Other;
    for token in tokens.iter_mut() {
        match token.as_str() {
            "(" => {
                depth += 1;
                expect = if depth == 1 { Expect::Name } else { Expect::Other };
                continue;
            }
            ")" => {
                depth = depth.saturating_sub(1);
                expect = Expect::Other;
                continue;
            }
            "," if depth == 1 => {
                expect = Expect::Name;
                continue;
            }
            _ => {}
        }
        if depth != 1 {
            continue;
        }
        match expect {
            Expect::Name => expect = Expect::Type,
            Expect::Type => {
                if let Some((_, to)) = COLUMN_TYPES.iter().find(|(from, _)| is_word(token, from)) {
                    *token = to.join(" ");
                    changed = true;
                }
                expect = Expect::Other;
            }
            Expect::Other => {}
        }
    }
    changed
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mssql(sql: &str) -> Option<String> {
        OracleToMssql::new().translate(sql)
    }

    #[test]
    fn test_nextval_from_dual() {
        assert_eq!(
            mssql("SELECT NEXTSEQ.NEXTVAL FROM DUAL").as_deref(),
            Some("SELECT NEXT VALUE FOR NEXTSEQ")
        );
        assert_eq!(
            mssql("INSERT INTO t (id, a) VALUES (seq.NEXTVAL, 1);").as_deref(),
            Some("INSERT INTO t (id , a) VALUES (NEXT VALUE FOR seq , 1);")
        );
    }

    #[test]
    fn test_currval() {
        assert_eq!(
            mssql("SELECT NEXTSEQ.CURRVAL FROM DUAL;").as_deref(),
            Some("SELECT CURRENT_VALUE FROM SYS.SEQUENCES WHERE NAME = 'NEXTSEQ';")
        );
        assert_eq!(
            mssql("UPDATE t SET ref = seq.CURRVAL WHERE id = 1").as_deref(),
            Some("UPDATE t SET ref = (SELECT CURRENT_VALUE FROM SYS.SEQUENCES WHERE NAME = 'seq') WHERE id = 1")
        );
    }

    #[test]
    fn test_for_update_becomes_hint() {
        assert_eq!(
            mssql("SELECT a, b FROM t WHERE id = ? FOR UPDATE").as_deref(),
            Some("SELECT a , b FROM t WITH (UPDLOCK, ROWLOCK) WHERE id = ?")
        );
        let joined = "SELECT a FROM t x, u y WHERE x.id = y.id FOR UPDATE";
        assert_eq!(mssql(joined).as_deref(), Some(joined));
    }

    #[test]
    fn test_functions_and_lobs() {
        assert_eq!(
            mssql("INSERT INTO t (d, b, c) VALUES (SYSDATE, EMPTY_BLOB(), EMPTY_CLOB())").as_deref(),
            Some("INSERT INTO t (d , b , c) VALUES (GETDATE() , 0x , '')")
        );
        assert_eq!(
            mssql("SELECT SYSTIMESTAMP FROM DUAL").as_deref(),
            Some("SELECT CURRENT_TIMESTAMP")
        );
    }

    #[test]
    fn test_create_sequence() {
        assert_eq!(
            mssql("CREATE SEQUENCE s MAXVALUE 99999999999999999999999 NOCACHE NOCYCLE ORDER;").as_deref(),
            Some("CREATE SEQUENCE s MAXVALUE 9223372036854775807 NO CACHE NO CYCLE;")
        );
        assert_eq!(
            mssql("CREATE SEQUENCE s NOMAXVALUE NOMINVALUE").as_deref(),
            Some("CREATE SEQUENCE s NO MAXVALUE NO MINVALUE")
        );
    }

    #[test]
    fn test_create_table_types() {
        let sql = "CREATE TABLE t (id NUMBER(*, 0) NOT NULL, name VARCHAR2(100 CHAR), \
                   note NVARCHAR2(10), body CLOB, data BLOB, created DATE, changed TIMESTAMP(6), \
                   CONSTRAINT pk PRIMARY KEY (id)) TABLESPACE users NOLOGGING;";
        assert_eq!(
            mssql(sql).as_deref(),
            Some(
                "CREATE TABLE t (id NUMERIC (38 , 0) NOT NULL , name VARCHAR (100) , \
                 note NVARCHAR (10) , body VARCHAR(MAX) , data VARBINARY(MAX) , created DATETIME , \
                 changed DATETIME2 (6) , CONSTRAINT pk PRIMARY KEY (id));"
            )
        );
    }

    #[test]
    fn test_storage_clauses_only_after_table_body() {
        let sql = "ALTER TABLE t ADD parallel NUMBER(1) NOLOGGING";
        assert_eq!(mssql(sql).as_deref(), Some(sql));
        assert_eq!(
            mssql("ALTER TABLE t PARALLEL 8 NOLOGGING").as_deref(),
            Some("ALTER TABLE t")
        );
        assert_eq!(
            mssql("CREATE INDEX i ON t (compress) TABLESPACE idx").as_deref(),
            Some("CREATE INDEX i ON t (compress)")
        );
    }

    #[test]
    fn test_sqlplus_dropped_and_other_unchanged() {
        assert_eq!(mssql("SET DEFINE OFF;"), None);
        assert_eq!(mssql("exit"), None);
        let sql = "DELETE FROM t WHERE created < :cutoff";
        assert_eq!(mssql(sql).as_deref(), Some(sql));
    }
}
