//! Translator driven by the source/target rule tables.

use once_cell::sync::Lazy;
use regex::{Regex, RegexBuilder};
use tracing::trace;

use crate::core::dbms::Dbms;
use crate::error::{DbmsError, Result};

use super::rule_table::RuleTable;
use super::tokens::collapse_whitespace;
use super::QueryTranslator;

static GROUP_REF_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\$(\d+)").unwrap());

/// Make every `.*` in a pattern lazy, leaving escaped dots and character
/// classes alone.
fn lazy_wildcards(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() + 4);
    let mut chars = pattern.chars().peekable();
    let mut escaped = false;
    let mut class_depth = 0usize;
    // A `]` right after `[` or `[^` is a literal member of the class.
    let mut class_start = false;
    while let Some(c) = chars.next() {
        out.push(c);
        if escaped {
            escaped = false;
            class_start = false;
            continue;
        }
        let at_class_start = std::mem::replace(&mut class_start, false);
        match c {
            '\\' => escaped = true,
            '[' => {
                class_depth += 1;
                class_start = true;
            }
            '^' if at_class_start => class_start = true,
            ']' if class_depth > 0 && !at_class_start => class_depth -= 1,
            '.' if class_depth == 0 && chars.peek() == Some(&'*') => {
                out.push('*');
                chars.next();
                if chars.peek() != Some(&'?') {
                    out.push('?');
                }
            }
            _ => {}
        }
    }
    out
}

/// Turn `$1` group references into `${1}` so a following letter is not
/// read as part of the group name.
fn braced_group_refs(template: &str) -> String {
    GROUP_REF_RE.replace_all(template, "$${${1}}").into_owned()
}

#[derive(Debug, Clone)]
struct CompiledRule {
    id: String,
    pattern: Regex,
    replacement: String,
}

/// Applies the rules of a source column, in table order, with the
/// replacements of a target column.
#[derive(Debug, Clone)]
pub struct RegexTableTranslator {
    source: Dbms,
    target: Dbms,
    rules: Vec<CompiledRule>,
}

impl RegexTableTranslator {
    /// Compile the rules for one dialect pair.
    ///
    /// Fails when either table lacks a column for its dialect or a pattern
    /// does not compile. A dialect paired with itself gets no rules and
    /// passes statements through untouched.
    pub fn from_tables(
        source_table: &RuleTable,
        target_table: &RuleTable,
        source: Dbms,
        target: Dbms,
    ) -> Result<Self> {
        if source == target {
            return Ok(Self {
                source,
                target,
                rules: Vec::new(),
            });
        }
        if !source_table.has_dialect(source) {
            return Err(DbmsError::translation(
                source,
                target,
                format!("{} has no column for {}", source_table.origin(), source),
            ));
        }
        if !target_table.has_dialect(target) {
            return Err(DbmsError::translation(
                source,
                target,
                format!("{} has no column for {}", target_table.origin(), target),
            ));
        }

        let mut rules = Vec::new();
        for row in source_table.rows() {
            let Some(pattern) = row.cell(source) else {
                continue;
            };
            let pattern = RegexBuilder::new(&lazy_wildcards(pattern))
                .case_insensitive(true)
                .multi_line(true)
                .build()
                .map_err(|source| DbmsError::Pattern {
                    rule: row.id.clone(),
                    source,
                })?;
            let replacement = target_table
                .row(&row.id)
                .and_then(|target_row| target_row.cell(target))
                .map(braced_group_refs)
                .unwrap_or_default();
            rules.push(CompiledRule {
                id: row.id.clone(),
                pattern,
                replacement,
            });
        }

        Ok(Self {
            source,
            target,
            rules,
        })
    }

    /// Number of rules that apply to this pair.
    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }
}

impl QueryTranslator for RegexTableTranslator {
    fn source(&self) -> Dbms {
        self.source
    }

    fn target(&self) -> Dbms {
        self.target
    }

    fn translate(&self, statement: &str) -> Option<String> {
        if self.source == self.target {
            return Some(statement.to_string());
        }
        let mut text = statement.to_string();
        for rule in &self.rules {
            if rule.pattern.is_match(&text) {
                trace!("applying rule {} ({} -> {})", rule.id, self.source, self.target);
                text = rule
                    .pattern
                    .replace_all(&text, rule.replacement.as_str())
                    .into_owned();
            }
        }
        let text = collapse_whitespace(&text);
        (!text.is_empty()).then_some(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::translate::rule_table::RuleSource;

    fn embedded(source: Dbms, target: Dbms) -> RegexTableTranslator {
        let (s, t) = RuleSource::Embedded.load().unwrap();
        RegexTableTranslator::from_tables(&s, &t, source, target).unwrap()
    }

    #[test]
    fn test_lazy_wildcards() {
        assert_eq!(lazy_wildcards("a.*b"), "a.*?b");
        assert_eq!(lazy_wildcards("a.*?b"), "a.*?b");
        assert_eq!(lazy_wildcards(r"a\.*b"), r"a\.*b");
        assert_eq!(lazy_wildcards("(.*),(.*)"), "(.*?),(.*?)");
    }

    #[test]
    fn test_lazy_wildcards_skip_character_classes() {
        assert_eq!(lazy_wildcards("[.*]x.*"), "[.*]x.*?");
        assert_eq!(lazy_wildcards("[]a.*]b.*"), "[]a.*]b.*?");
        assert_eq!(lazy_wildcards("[^].*]c.*"), "[^].*]c.*?");
        assert_eq!(lazy_wildcards(r"[\].*]d.*"), r"[\].*]d.*?");
        assert_eq!(lazy_wildcards("[[:alpha:].*]e.*"), "[[:alpha:].*]e.*?");
    }

    #[test]
    fn test_character_class_keeps_its_meaning() {
        let s = RuleTable::parse("s", "rule\tOracle\nSTARS\t[.*]+\n").unwrap();
        let t = RuleTable::parse("t", "rule\tH2\nSTARS\t#\n").unwrap();
        let translator = RegexTableTranslator::from_tables(&s, &t, Dbms::Oracle, Dbms::H2).unwrap();
        assert_eq!(translator.translate("a ** b ?? c .").as_deref(), Some("a # b ?? c #"));
    }

    #[test]
    fn test_same_dialect_leaves_input_untouched() {
        let (s, t) = RuleSource::Embedded.load().unwrap();
        let translator = RegexTableTranslator::from_tables(&s, &t, Dbms::Oracle, Dbms::Oracle).unwrap();
        assert_eq!(translator.rule_count(), 0);
        let statement = "SELECT  a,   NUMBER ( *, 2) FROM   DUAL";
        assert_eq!(translator.translate(statement).as_deref(), Some(statement));

        let translator = RegexTableTranslator::from_tables(&s, &t, Dbms::Generic, Dbms::Generic).unwrap();
        assert_eq!(translator.translate(statement).as_deref(), Some(statement));
    }

    #[test]
    fn test_braced_group_refs() {
        assert_eq!(braced_group_refs("$1.NEXTVAL"), "${1}.NEXTVAL");
        assert_eq!(braced_group_refs("nextval('$1')"), "nextval('${1}')");
        assert_eq!(braced_group_refs("${2}"), "${2}");
    }

    #[test]
    fn test_oracle_to_postgres() {
        let translator = embedded(Dbms::Oracle, Dbms::Postgresql);
        assert_eq!(
            translator.translate("SELECT seq.NEXTVAL, SYSDATE FROM DUAL").as_deref(),
            Some("SELECT nextval('seq'), CURRENT_TIMESTAMP")
        );
        assert_eq!(
            translator
                .translate("CREATE TABLE t (a NUMBER(*, 2), b VARCHAR2(10),\n   c CLOB, d BLOB)")
                .as_deref(),
            Some("CREATE TABLE t (a NUMERIC(38, 2), b VARCHAR(10), c TEXT, d BYTEA)")
        );
        assert_eq!(
            translator.translate("SELECT NVL(a, 'x  y') FROM t").as_deref(),
            Some("SELECT COALESCE(a, 'x  y') FROM t")
        );
    }

    #[test]
    fn test_oracle_to_db2_keeps_dual_equivalent() {
        let translator = embedded(Dbms::Oracle, Dbms::Db2);
        assert_eq!(
            translator.translate("SELECT s.CURRVAL FROM DUAL").as_deref(),
            Some("SELECT PREVIOUS VALUE FOR s FROM SYSIBM.SYSDUMMY1")
        );
    }

    #[test]
    fn test_mssql_to_oracle() {
        let translator = embedded(Dbms::Mssql, Dbms::Oracle);
        assert_eq!(
            translator
                .translate("INSERT INTO t (id, at) VALUES (NEXT VALUE FOR s, GETDATE())")
                .as_deref(),
            Some("INSERT INTO t (id, at) VALUES (s.NEXTVAL, SYSDATE)")
        );
    }

    #[test]
    fn test_retranslating_output_is_noop() {
        let script = [
            "SELECT seq.NEXTVAL FROM DUAL",
            "INSERT INTO t (a, b) VALUES (EMPTY_BLOB(), NVL(:x, SYSTIMESTAMP))",
            "CREATE TABLE t (a NUMBER, b NVARCHAR2(5), c CLOB)",
            "UPDATE t SET a = s.CURRVAL",
        ];
        for target in [Dbms::Mssql, Dbms::Db2, Dbms::Mysql, Dbms::Mariadb, Dbms::Postgresql] {
            let translator = embedded(Dbms::Oracle, target);
            for statement in script {
                let once = translator.translate(statement).unwrap();
                assert_eq!(translator.translate(&once), Some(once.clone()), "{target}: {statement}");
            }
        }
    }

    #[test]
    fn test_missing_column_fails() {
        let (s, t) = RuleSource::Embedded.load().unwrap();
        let err = RegexTableTranslator::from_tables(&s, &t, Dbms::Generic, Dbms::Oracle).unwrap_err();
        assert!(matches!(err, DbmsError::Translation { .. }));
    }

    #[test]
    fn test_bad_pattern_fails() {
        let s = RuleTable::parse("s", "rule\tOracle\nBROKEN\t(unclosed\n").unwrap();
        let t = RuleTable::parse("t", "rule\tH2\nBROKEN\tx\n").unwrap();
        let err = RegexTableTranslator::from_tables(&s, &t, Dbms::Oracle, Dbms::H2).unwrap_err();
        match err {
            DbmsError::Pattern { rule, .. } => assert_eq!(rule, "BROKEN"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_absent_replacement_deletes() {
        let s = RuleTable::parse("s", "rule\tOracle\nHINT\t/\\*\\+.*\\*/\n").unwrap();
        let t = RuleTable::parse("t", "rule\tPostgreSQL\n").unwrap();
        let translator = RegexTableTranslator::from_tables(&s, &t, Dbms::Oracle, Dbms::Postgresql).unwrap();
        assert_eq!(
            translator.translate("SELECT /*+ INDEX(t) */ a FROM t /*+ x */").as_deref(),
            Some("SELECT a FROM t")
        );
    }
}
