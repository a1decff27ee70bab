//! SQL dialect translation.
//!
//! - [`rule_table`]: tab-separated source/target rule tables
//! - [`regex_table`]: the generic translator built from those tables
//! - [`tokens`] and [`statement`]: tokenizer and statement classification
//! - [`oracle_h2`], [`oracle_mssql`]: tokenizing rewriters for Oracle scripts
//!
//! Translators are obtained from a [`TranslatorRegistry`], which builds each
//! (source, target) pair once and caches it. A pair that cannot be built is
//! disabled for the lifetime of the registry.

pub mod oracle;
pub mod oracle_h2;
pub mod oracle_mssql;
pub mod regex_table;
pub mod rule_table;
pub mod statement;
pub mod tokens;

use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use once_cell::sync::OnceCell;
use tracing::{debug, warn};

use crate::config::TranslationConfig;
use crate::core::dbms::Dbms;
use crate::error::{DbmsError, Result};
use crate::script::split_statements;

pub use oracle_h2::OracleToH2;
pub use oracle_mssql::OracleToMssql;
pub use regex_table::RegexTableTranslator;
pub use rule_table::{RuleSource, RuleTable};
pub use statement::{Rewrite, StatementClass};

/// Rewrites single statements from one dialect to another.
pub trait QueryTranslator: Send + Sync + fmt::Debug {
    /// Dialect the input is written in.
    fn source(&self) -> Dbms;

    /// Dialect the output is written in.
    fn target(&self) -> Dbms;

    /// Translate one statement; `None` means the statement has no
    /// counterpart in the target dialect and is dropped.
    fn translate(&self, statement: &str) -> Option<String>;
}

/// Translator for a dialect onto itself.
#[derive(Debug, Clone, Copy)]
pub struct IdentityTranslator {
    dbms: Dbms,
}

impl IdentityTranslator {
    pub fn new(dbms: Dbms) -> Self {
        Self { dbms }
    }
}

impl QueryTranslator for IdentityTranslator {
    fn source(&self) -> Dbms {
        self.dbms
    }

    fn target(&self) -> Dbms {
        self.dbms
    }

    fn translate(&self, statement: &str) -> Option<String> {
        Some(statement.to_string())
    }
}

#[derive(Debug, Clone)]
enum Slot {
    Ready(Arc<dyn QueryTranslator>),
    Disabled(String),
}

type LoadedTables = std::result::Result<Arc<(RuleTable, RuleTable)>, String>;

/// Cache of translators keyed by (source, target).
///
/// Each pair is built on first use. Oracle to H2 and Oracle to MS_SQL use
/// the tokenizing rewriters, identical dialects the identity translator, and
/// every other pair the regex-table translator.
#[derive(Debug, Default)]
pub struct TranslatorRegistry {
    rules: RuleSource,
    tables: OnceCell<LoadedTables>,
    slots: DashMap<(Dbms, Dbms), Slot>,
}

impl TranslatorRegistry {
    /// Create a registry using the embedded rule tables.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry reading rule tables from the given source.
    pub fn with_rule_source(rules: RuleSource) -> Self {
        Self {
            rules,
            ..Self::default()
        }
    }

    /// Create a registry from the translation section of the configuration.
    pub fn from_config(config: &TranslationConfig) -> Self {
        Self::with_rule_source(config.rule_source())
    }

    pub fn rule_source(&self) -> &RuleSource {
        &self.rules
    }

    /// Get the translator for a pair, building it on first use.
    ///
    /// Returns `None`, with a warning, when the pair is disabled.
    pub fn translator(&self, source: Dbms, target: Dbms) -> Option<Arc<dyn QueryTranslator>> {
        let slot = self
            .slots
            .entry((source, target))
            .or_insert_with(|| self.build(source, target))
            .value()
            .clone();
        match slot {
            Slot::Ready(translator) => Some(translator),
            Slot::Disabled(reason) => {
                warn!(
                    "translation from {} to {} is disabled: {}",
                    source, target, reason
                );
                None
            }
        }
    }

    /// Whether a pair has been tried and disabled.
    pub fn is_disabled(&self, source: Dbms, target: Dbms) -> bool {
        self.slots
            .get(&(source, target))
            .map_or(false, |slot| matches!(slot.value(), Slot::Disabled(_)))
    }

    /// Build the translator for a pair without caching it.
    pub fn create(&self, source: Dbms, target: Dbms) -> Result<Arc<dyn QueryTranslator>> {
        if source == target {
            return Ok(Arc::new(IdentityTranslator::new(source)));
        }
        match (source, target) {
            (Dbms::Oracle, Dbms::H2) => Ok(Arc::new(OracleToH2::new())),
            (Dbms::Oracle, Dbms::Mssql) => Ok(Arc::new(OracleToMssql::new())),
            _ => {
                let tables = self.tables()?;
                let (source_table, target_table) = tables.as_ref();
                let translator =
                    RegexTableTranslator::from_tables(source_table, target_table, source, target)?;
                debug!(
                    "built regex translator {} -> {} with {} rules",
                    source,
                    target,
                    translator.rule_count()
                );
                Ok(Arc::new(translator))
            }
        }
    }

    /// Split a script and translate every statement, leaving out the
    /// dropped ones.
    pub fn translate_statements(
        &self,
        source: Dbms,
        target: Dbms,
        script: &str,
    ) -> Result<Vec<String>> {
        let translator = self.translator(source, target).ok_or_else(|| {
            DbmsError::translation(source, target, "no translator available for this pair")
        })?;
        Ok(split_statements(script)
            .iter()
            .filter_map(|statement| translator.translate(statement))
            .collect())
    }

    /// Translate a script, joining the translated statements by line breaks.
    pub fn translate_script(&self, source: Dbms, target: Dbms, script: &str) -> Result<String> {
        Ok(self.translate_statements(source, target, script)?.join("\n"))
    }

    fn build(&self, source: Dbms, target: Dbms) -> Slot {
        match self.create(source, target) {
            Ok(translator) => Slot::Ready(translator),
            Err(e) => {
                warn!(
                    "disabling translation from {} to {}: {}",
                    source,
                    target,
                    e.format_detailed().trim_end()
                );
                Slot::Disabled(e.to_string())
            }
        }
    }

    fn tables(&self) -> Result<Arc<(RuleTable, RuleTable)>> {
        self.tables
            .get_or_init(|| {
                self.rules
                    .load()
                    .map(Arc::new)
                    .map_err(|e| e.to_string())
            })
            .clone()
            .map_err(|message| DbmsError::RuleTable {
                path: self.rules.to_string(),
                message,
            })
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    #[test]
    fn test_routing() {
        let registry = TranslatorRegistry::new();
        let h2 = registry.translator(Dbms::Oracle, Dbms::H2).unwrap();
        assert_eq!((h2.source(), h2.target()), (Dbms::Oracle, Dbms::H2));
        assert_eq!(
            h2.translate("SELECT col FROM t WHERE id = ? FOR UPDATE").as_deref(),
            Some("SELECT id , col FROM t WHERE id = ? FOR UPDATE")
        );
        let mssql = registry.translator(Dbms::Oracle, Dbms::Mssql).unwrap();
        assert_eq!(
            mssql.translate("SELECT NEXTSEQ.NEXTVAL FROM DUAL").as_deref(),
            Some("SELECT NEXT VALUE FOR NEXTSEQ")
        );
        let pg = registry.translator(Dbms::Oracle, Dbms::Postgresql).unwrap();
        assert_eq!(pg.translate("SELECT SYSDATE FROM DUAL").as_deref(), Some("SELECT CURRENT_TIMESTAMP"));
    }

    #[test]
    fn test_same_dialect_is_noop() {
        let registry = TranslatorRegistry::new();
        let statement = "SELECT  seq.NEXTVAL FROM DUAL FOR UPDATE";
        for dbms in [Dbms::Oracle, Dbms::H2, Dbms::Mssql, Dbms::Postgresql, Dbms::Generic] {
            let translator = registry.translator(dbms, dbms).unwrap();
            assert_eq!(translator.translate(statement).as_deref(), Some(statement));
        }
    }

    #[test]
    fn test_translators_are_cached() {
        let registry = TranslatorRegistry::new();
        let first = registry.translator(Dbms::Oracle, Dbms::Mysql).unwrap();
        let second = registry.translator(Dbms::Oracle, Dbms::Mysql).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_pair_without_column_is_disabled() {
        let registry = TranslatorRegistry::new();
        assert!(registry.translator(Dbms::Generic, Dbms::Oracle).is_none());
        assert!(registry.is_disabled(Dbms::Generic, Dbms::Oracle));
        assert!(registry.translator(Dbms::Generic, Dbms::Oracle).is_none());
        assert!(!registry.is_disabled(Dbms::Oracle, Dbms::H2));
    }

    #[test]
    fn test_missing_rule_files_disable_regex_pairs_only() {
        let registry = TranslatorRegistry::with_rule_source(RuleSource::Files {
            source: PathBuf::from("/nonexistent/source.tsv"),
            target: PathBuf::from("/nonexistent/target.tsv"),
        });
        assert!(registry.translator(Dbms::Oracle, Dbms::Postgresql).is_none());
        assert!(registry.translator(Dbms::Oracle, Dbms::H2).is_some());
        let err = registry
            .translate_script(Dbms::Oracle, Dbms::Postgresql, "SELECT 1 FROM DUAL;")
            .unwrap_err();
        assert_eq!(err.exit_code(), 4);
    }

    #[test]
    fn test_concurrent_first_use_builds_once() {
        let registry = &TranslatorRegistry::new();
        let race = |source: Dbms, target: Dbms| -> Vec<Option<Arc<dyn QueryTranslator>>> {
            std::thread::scope(|scope| {
                let handles: Vec<_> = (0..8)
                    .map(|_| scope.spawn(move || registry.translator(source, target)))
                    .collect();
                handles.into_iter().map(|h| h.join().unwrap()).collect()
            })
        };

        let ready = race(Dbms::Oracle, Dbms::Postgresql);
        let first = ready[0].clone().unwrap();
        for translator in &ready {
            assert!(Arc::ptr_eq(&first, translator.as_ref().unwrap()));
        }

        let disabled = race(Dbms::Generic, Dbms::Oracle);
        assert!(disabled.iter().all(Option::is_none));
        assert!(registry.is_disabled(Dbms::Generic, Dbms::Oracle));
        assert!(registry.translator(Dbms::Generic, Dbms::Oracle).is_none());
    }

    #[test]
    fn test_translate_statements_drops_sqlplus() {
        let registry = TranslatorRegistry::new();
        let statements = registry
            .translate_statements(
                Dbms::Oracle,
                Dbms::Mssql,
                "-- ids\nSELECT s.NEXTVAL FROM DUAL;\nEXIT;\nDELETE FROM t;",
            )
            .unwrap();
        assert_eq!(
            statements,
            vec!["-- ids\nSELECT NEXT VALUE FOR s;", "DELETE FROM t;"]
        );
    }

    #[test]
    fn test_translate_script() {
        let registry = TranslatorRegistry::new();
        let script = "SET DEFINE OFF;\nCREATE SEQUENCE s MAXVALUE 9999999999999999999 NOORDER;\n\
                      INSERT INTO t (c) VALUES (EMPTY_CLOB());\nEXIT;";
        assert_eq!(
            registry.translate_script(Dbms::Oracle, Dbms::H2, script).unwrap(),
            "CREATE SEQUENCE s MAXVALUE 999999999999999999;\nINSERT INTO t (c) VALUES ('');"
        );
    }
}
