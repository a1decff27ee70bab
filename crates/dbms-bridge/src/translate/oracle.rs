//! Token rules for Oracle-sourced statements, shared by the H2 and
//! SQL Server rewriters. Each rule edits the tokens in place and reports
//! whether it changed anything.

use super::statement::StatementClass;
use super::tokens::is_word;

/// Clauses Oracle accepts on tables and indexes that carry no meaning
/// elsewhere.
const STORAGE_FLAGS: &[&str] = &[
    "LOGGING",
    "NOLOGGING",
    "NOCOMPRESS",
    "NOPARALLEL",
    "MONITORING",
    "NOMONITORING",
];

/// Storage clauses followed by an optional numeric argument.
const STORAGE_OPTIONAL_ARG: &[&str] = &["COMPRESS", "PARALLEL"];

/// Storage clauses followed by a mandatory argument.
const STORAGE_REQUIRED_ARG: &[&str] = &["TABLESPACE", "PCTFREE", "PCTUSED", "INITRANS", "MAXTRANS"];

fn is_number(token: &str) -> bool {
    !token.is_empty() && token.chars().all(|c| c.is_ascii_digit())
}

fn contains_word(words: &[&str], token: &str) -> bool {
    words.iter().any(|w| is_word(token, w))
}

/// Compare two unsigned decimal strings numerically.
fn exceeds(value: &str, max: &str) -> bool {
    let value = value.trim_start_matches('0');
    if value.len() != max.len() {
        return value.len() > max.len();
    }
    value > max
}

/// Lower a `MAXVALUE n` above `max` to `max`.
pub fn clamp_maxvalue(tokens: &mut [String], max: &str) -> bool {
    let mut changed = false;
    for i in 1..tokens.len() {
        if is_word(&tokens[i - 1], "MAXVALUE") && is_number(&tokens[i]) && exceeds(&tokens[i], max) {
            tokens[i] = max.to_string();
            changed = true;
        }
    }
    changed
}

/// Remove every token matching one of the keywords.
pub fn remove_words(tokens: &mut Vec<String>, words: &[&str]) -> bool {
    let before = tokens.len();
    tokens.retain(|t| !contains_word(words, t));
    tokens.len() != before
}

/// Replace keywords by their counterparts, which may span several tokens.
pub fn replace_words(tokens: &mut Vec<String>, replacements: &[(&str, &[&str])]) -> bool {
    let mut changed = false;
    let mut out = Vec::with_capacity(tokens.len());
    for token in tokens.drain(..) {
        match replacements.iter().find(|(from, _)| is_word(&token, from)) {
            Some((_, to)) => {
                out.extend(to.iter().map(|t| t.to_string()));
                changed = true;
            }
            None => out.push(token),
        }
    }
    *tokens = out;
    changed
}

/// Number of tokens taken by the storage clause starting at `i`, if any.
fn storage_clause_len(tokens: &[String], i: usize) -> Option<usize> {
    let token = &tokens[i];
    if contains_word(STORAGE_FLAGS, token) {
        return Some(1);
    }
    if contains_word(STORAGE_OPTIONAL_ARG, token) {
        let has_arg = tokens.get(i + 1).map_or(false, |t| is_number(t));
        return Some(if has_arg { 2 } else { 1 });
    }
    if contains_word(STORAGE_REQUIRED_ARG, token) && i + 1 < tokens.len() {
        return Some(2);
    }
    if is_word(token, "STORAGE") && tokens.get(i + 1).map_or(false, |t| t == "(") {
        let mut depth = 0usize;
        for (offset, t) in tokens[i + 1..].iter().enumerate() {
            match t.as_str() {
                "(" => depth += 1,
                ")" => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        return Some(offset + 2);
                    }
                }
                _ => {}
            }
        }
        return Some(tokens.len() - i);
    }
    None
}

/// Index of the `)` closing the column list, if the statement has one.
///
/// `CREATE TABLE t AS SELECT ...` has none: the first group belongs to the
/// query.
fn first_group_end(tokens: &[String]) -> Option<usize> {
    let open = tokens.iter().position(|t| t == "(")?;
    if tokens[..open].iter().any(|t| is_word(t, "AS")) {
        return None;
    }
    let mut depth = 0usize;
    for (i, t) in tokens.iter().enumerate().skip(open) {
        match t.as_str() {
            "(" => depth += 1,
            ")" => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Strip storage and physical attribute clauses from table and index DDL.
///
/// In `CREATE TABLE` and `CREATE INDEX` the clauses follow the column list
/// and end at a top-level `AS`. In `ALTER TABLE` only a run of clauses
/// directly after the table name is removed. Column definitions are never
/// touched, whatever their names.
pub fn strip_storage_clauses(tokens: &mut Vec<String>, class: StatementClass) -> bool {
    let (start, directly_after_name) = match class {
        StatementClass::CreateTable | StatementClass::CreateIndex => match first_group_end(tokens) {
            Some(end) => (end + 1, false),
            None => return false,
        },
        StatementClass::AlterTable => (3.min(tokens.len()), true),
        _ => return false,
    };

    let mut out = tokens[..start].to_vec();
    let mut depth = 0usize;
    let mut i = start;
    while i < tokens.len() {
        if depth == 0 {
            if let Some(len) = storage_clause_len(tokens, i) {
                i += len;
                continue;
            }
            if directly_after_name || is_word(&tokens[i], "AS") {
                out.extend_from_slice(&tokens[i..]);
                break;
            }
        }
        match tokens[i].as_str() {
            "(" => depth += 1,
            ")" => depth = depth.saturating_sub(1),
            _ => {}
        }
        out.push(tokens[i].clone());
        i += 1;
    }
    let changed = out.len() != tokens.len();
    *tokens = out;
    changed
}

/// `NUMBER(*, n)` becomes `NUMBER(38, n)`.
pub fn number_any_precision(tokens: &mut [String]) -> bool {
    let mut changed = false;
    for i in 2..tokens.len() {
        if tokens[i] == "*" && tokens[i - 1] == "(" && is_word(&tokens[i - 2], "NUMBER") {
            tokens[i] = "38".to_string();
            changed = true;
        }
    }
    changed
}

/// Drop `CHAR`/`BYTE` length semantics inside a size, as in `VARCHAR2(10 CHAR)`.
pub fn strip_length_semantics(tokens: &mut Vec<String>) -> bool {
    let before = tokens.len();
    let mut i = 1;
    while i + 1 < tokens.len() {
        if (is_word(&tokens[i], "CHAR") || is_word(&tokens[i], "BYTE"))
            && is_number(&tokens[i - 1])
            && tokens[i + 1] == ")"
        {
            tokens.remove(i);
        } else {
            i += 1;
        }
    }
    tokens.len() != before
}

/// Replace `EMPTY_BLOB()` and `EMPTY_CLOB()` calls by literals.
pub fn replace_empty_lobs(tokens: &mut Vec<String>, blob: &str, clob: &str) -> bool {
    let mut changed = false;
    let mut out = Vec::with_capacity(tokens.len());
    let mut i = 0;
    while i < tokens.len() {
        let is_call = tokens.get(i + 1).map_or(false, |t| t == "(")
            && tokens.get(i + 2).map_or(false, |t| t == ")");
        let literal = if !is_call {
            None
        } else if is_word(&tokens[i], "EMPTY_BLOB") {
            Some(blob)
        } else if is_word(&tokens[i], "EMPTY_CLOB") {
            Some(clob)
        } else {
            None
        };
        match literal {
            Some(literal) => {
                out.push(literal.to_string());
                changed = true;
                i += 3;
            }
            None => {
                out.push(tokens[i].clone());
                i += 1;
            }
        }
    }
    *tokens = out;
    changed
}

/// Remove every `FROM DUAL` pair.
pub fn remove_from_dual(tokens: &mut Vec<String>) -> bool {
    let mut changed = false;
    let mut i = 0;
    while i + 1 < tokens.len() {
        if is_word(&tokens[i], "FROM") && is_word(&tokens[i + 1], "DUAL") {
            tokens.drain(i..i + 2);
            changed = true;
        } else {
            i += 1;
        }
    }
    changed
}

/// Sequence name of a `seq.NEXTVAL` style pseudo column.
pub fn pseudo_column<'a>(token: &'a str, column: &str) -> Option<&'a str> {
    let (sequence, suffix) = token.rsplit_once('.')?;
    (!sequence.is_empty() && is_word(suffix, column)).then_some(sequence)
}
