//! Oracle to H2 statement rewriter.

use tracing::debug;

use crate::core::dbms::Dbms;

use super::oracle::{
    clamp_maxvalue, number_any_precision, remove_words, replace_empty_lobs,
    strip_length_semantics, strip_storage_clauses,
};
use super::statement::{ends_with_words, rewrite_with, Rewrite, Statement, StatementClass};
use super::tokens::is_word;
use super::QueryTranslator;

/// Largest sequence value H2 accepts.
const H2_MAX_SEQUENCE_VALUE: &str = "999999999999999999";

/// Sequence options H2 does not know.
const UNSUPPORTED_SEQUENCE_OPTIONS: &[&str] = &["ORDER", "NOORDER", "KEEP", "NOKEEP", "NOSCALE"];

/// Rewrites Oracle statements so they run on H2.
#[derive(Debug, Clone, Default)]
pub struct OracleToH2;

impl OracleToH2 {
    pub fn new() -> Self {
        Self
    }
}

impl QueryTranslator for OracleToH2 {
    fn source(&self) -> Dbms {
        Dbms::Oracle
    }

    fn target(&self) -> Dbms {
        Dbms::H2
    }

    fn translate(&self, statement: &str) -> Option<String> {
        rewrite_with(statement, rewrite)
    }
}

fn rewrite(statement: &Statement) -> Rewrite {
    let mut tokens = statement.tokens().to_vec();
    let changed = match statement.class() {
        StatementClass::CreateSequence => {
            clamp_maxvalue(&mut tokens, H2_MAX_SEQUENCE_VALUE)
                | remove_words(&mut tokens, UNSUPPORTED_SEQUENCE_OPTIONS)
        }
        StatementClass::CreateTable | StatementClass::CreateIndex | StatementClass::AlterTable => {
            strip_storage_clauses(&mut tokens, statement.class())
                | number_any_precision(&mut tokens)
                | strip_length_semantics(&mut tokens)
        }
        StatementClass::Select => select_for_update_with_key(&mut tokens),
        StatementClass::Insert | StatementClass::Update => {
            replace_empty_lobs(&mut tokens, "''", "''")
        }
        StatementClass::Drop => drop_if_exists(&mut tokens),
        StatementClass::Trigger | StatementClass::SqlPlus => {
            debug!("dropping {:?} statement for H2", statement.class());
            return Rewrite::Dropped;
        }
        StatementClass::Delete | StatementClass::Other => false,
    };

    if changed {
        Rewrite::Rewritten(tokens)
    } else {
        Rewrite::Unchanged
    }
}

/// `SELECT c FROM t WHERE k = v FOR UPDATE` selects `k` as well, so H2
/// locks the row through its key.
fn select_for_update_with_key(tokens: &mut Vec<String>) -> bool {
    if tokens.len() < 10 || !ends_with_words(tokens, &["FOR", "UPDATE"]) {
        return false;
    }
    let column = &tokens[1];
    let single_column = column != "*" && !is_word(column, "DISTINCT") && is_word(&tokens[2], "FROM");
    let keyed = is_word(&tokens[4], "WHERE") && tokens[6] == "=";
    if !single_column || !keyed || tokens[5].eq_ignore_ascii_case(column) {
        return false;
    }
    let key = tokens[5].clone();
    tokens.splice(1..1, [key, ",".to_string()]);
    true
}

/// `DROP TABLE|SEQUENCE` gets `IF EXISTS`; `CASCADE CONSTRAINTS` becomes
/// `CASCADE` and `PURGE` is removed.
fn drop_if_exists(tokens: &mut Vec<String>) -> bool {
    let mut changed = false;
    let object = tokens.get(1).map(|t| t.to_ascii_uppercase()).unwrap_or_default();
    let has_if = tokens.get(2).map_or(false, |t| is_word(t, "IF"));
    if (object == "TABLE" || object == "SEQUENCE") && !has_if && tokens.len() > 2 {
        tokens.splice(2..2, ["IF".to_string(), "EXISTS".to_string()]);
        changed = true;
    }

    let mut i = 0;
    while i < tokens.len() {
        if is_word(&tokens[i], "CONSTRAINTS")
            && i > 0
            && is_word(&tokens[i - 1], "CASCADE")
        {
            tokens.remove(i);
            changed = true;
        } else if is_word(&tokens[i], "PURGE") {
            tokens.remove(i);
            changed = true;
        } else {
            i += 1;
        }
    }
    changed
}
