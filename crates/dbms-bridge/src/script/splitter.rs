//! Statement splitter for multi-statement scripts.
//!
//! A script is cut at every `;` that closes a statement. A `;` stays inside
//! the current statement when the statement so far holds an odd number of
//! single quotes (the `;` is part of a literal), or when it has more `BEGIN`
//! keywords than `END;` terminators (the `;` closes a statement inside a
//! PL/SQL style block).

use once_cell::sync::Lazy;
use regex::Regex;

static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static BEGIN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\sBEGIN\s").unwrap());
static END_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\sEND;").unwrap());

/// Count `BEGIN` keywords preceded and followed by whitespace.
///
/// Whitespace runs are doubled first so that adjacent keywords do not
/// share the whitespace between them.
fn count_begin(upper: &str) -> usize {
    BEGIN_RE
        .find_iter(&WHITESPACE_RE.replace_all(upper, "  "))
        .count()
}

/// Count `END;` terminators preceded by whitespace.
fn count_end(upper: &str) -> usize {
    END_RE.find_iter(&upper.replace(';', "; ")).count()
}

fn closes_statement(segment: &str) -> bool {
    let quotes = segment.matches('\'').count();
    if quotes % 2 != 0 {
        return false;
    }
    let upper = segment.to_uppercase();
    count_begin(&upper) == count_end(&upper)
}

/// Split a script into trimmed statements, each keeping its closing `;`.
///
/// A script without any `;` is returned as a single statement. Text after
/// the last closing `;` becomes a final statement unless it is blank.
pub fn split_statements(script: &str) -> Vec<String> {
    if !script.contains(';') {
        return vec![script.to_string()];
    }

    let mut statements = Vec::new();
    let mut start = 0;
    for (pos, _) in script.match_indices(';') {
        let segment = &script[start..=pos];
        if closes_statement(segment) {
            statements.push(segment.trim().to_string());
            start = pos + 1;
        }
    }

    let rest = script[start..].trim();
    if !rest.is_empty() {
        statements.push(rest.to_string());
    }
    statements
}
