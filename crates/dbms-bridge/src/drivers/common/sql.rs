//! SQL text helpers shared by the dialect implementations.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{DbmsError, Result};

const KEYWORD_SELECT: &str = "select";

static WHERE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bWHERE\b").unwrap());
static GROUP_BY_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bGROUP\s+BY\b").unwrap());
static ORDER_BY_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\bORDER\s+BY\b").unwrap());

/// Fail unless `query` starts with the keyword `SELECT`.
pub fn require_select(query: &str) -> Result<()> {
    let head = query.trim_start();
    let is_select = head
        .get(..KEYWORD_SELECT.len())
        .map_or(false, |kw| kw.eq_ignore_ascii_case(KEYWORD_SELECT))
        && head[KEYWORD_SELECT.len()..]
            .chars()
            .next()
            .map_or(true, |c| !c.is_alphanumeric() && c != '_');
    if is_select {
        Ok(())
    } else {
        Err(DbmsError::invalid_query(
            query,
            format!("query must start with keyword [{}]", KEYWORD_SELECT),
        ))
    }
}

/// The part of a select query after its `SELECT` keyword, trimmed.
///
/// Callers must have checked the shape with [`require_select`].
pub fn after_select(query: &str) -> &str {
    query.trim_start()[KEYWORD_SELECT.len()..].trim()
}

/// Append `LIMIT n`; zero leaves the query unlimited.
pub fn with_limit(query: &str, batch_size: u32) -> String {
    if batch_size > 0 {
        format!("{} LIMIT {}", query, batch_size)
    } else {
        query.to_string()
    }
}

/// Byte offsets of `query` that lie outside string literals and parentheses.
fn top_level_mask(query: &str) -> Vec<bool> {
    let mut mask = vec![false; query.len()];
    let mut in_quote = false;
    let mut depth = 0usize;
    for (i, c) in query.char_indices() {
        match c {
            '\'' => in_quote = !in_quote,
            '(' if !in_quote => depth += 1,
            ')' if !in_quote => depth = depth.saturating_sub(1),
            _ => {}
        }
        let top = !in_quote && depth == 0 && c != '\'';
        for slot in mask.iter_mut().skip(i).take(c.len_utf8()) {
            *slot = top;
        }
    }
    mask
}

fn first_top_level(query: &str, mask: &[bool], re: &Regex) -> Option<usize> {
    re.find_iter(query)
        .map(|m| m.start())
        .find(|&start| mask.get(start).copied().unwrap_or(false))
}

/// Position where a table hint belongs: before the first top-level `WHERE`,
/// else before `GROUP BY` or `ORDER BY`; `None` means "append".
pub fn table_hint_position(query: &str) -> Option<usize> {
    let mask = top_level_mask(query);
    first_top_level(query, &mask, &WHERE_RE)
        .or_else(|| first_top_level(query, &mask, &GROUP_BY_RE))
        .or_else(|| first_top_level(query, &mask, &ORDER_BY_RE))
}

/// Insert a table hint such as `WITH (nolock)` directly after the table list.
pub fn insert_table_hint(query: &str, hint: &str) -> String {
    match table_hint_position(query) {
        Some(pos) => format!("{} {} {}", query[..pos].trim_end(), hint, &query[pos..]),
        None => format!("{} {}", query.trim_end(), hint),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_select() {
        assert!(require_select("SELECT * FROM t").is_ok());
        assert!(require_select("  select 1").is_ok());
        assert!(require_select("select*from t").is_ok());
        assert!(require_select("SELECTED").is_err());
        assert!(require_select("UPDATE t SET x=1").is_err());
        assert!(require_select("").is_err());
    }

    #[test]
    fn test_after_select() {
        assert_eq!(after_select(" SELECT  a, b FROM t"), "a, b FROM t");
    }

    #[test]
    fn test_hint_position_skips_literals_and_subqueries() {
        let q = "SELECT * FROM t WHERE x IN (SELECT y FROM u WHERE z=1)";
        assert_eq!(table_hint_position(q), Some(16));

        let q = "SELECT 'WHERE' FROM t";
        assert_eq!(table_hint_position(q), None);

        let q = "SELECT * FROM (SELECT * FROM u WHERE a=1) v ORDER BY b";
        assert_eq!(&q[table_hint_position(q).unwrap()..], "ORDER BY b");
    }

    #[test]
    fn test_insert_table_hint() {
        assert_eq!(
            insert_table_hint("SELECT * FROM t WHERE x=1", "WITH (nolock)"),
            "SELECT * FROM t WITH (nolock) WHERE x=1"
        );
        assert_eq!(
            insert_table_hint("SELECT * FROM t", "WITH (nolock)"),
            "SELECT * FROM t WITH (nolock)"
        );
        assert_eq!(
            insert_table_hint("SELECT a FROM t GROUP BY a", "WITH (nolock)"),
            "SELECT a FROM t WITH (nolock) GROUP BY a"
        );
    }
}
