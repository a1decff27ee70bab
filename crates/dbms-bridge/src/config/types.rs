//! Configuration type definitions.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::core::dbms::Dbms;
use crate::core::lock::LockWait;
use crate::translate::RuleSource;

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Dialect selection overrides.
    #[serde(default)]
    pub selector: SelectorConfig,

    /// Rule tables for the regex translator.
    #[serde(default)]
    pub translation: TranslationConfig,

    /// Defaults for locking reads.
    #[serde(default)]
    pub locking: LockingConfig,
}

/// Dialect selection configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SelectorConfig {
    /// Reported product name mapped to the dialect that should serve it,
    /// e.g. `EnterpriseDB: PostgreSQL`.
    #[serde(default)]
    pub overrides: BTreeMap<String, Dbms>,
}

/// Translation rule table configuration.
///
/// Both paths or neither must be set; without them the embedded tables
/// are used.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TranslationConfig {
    /// Tab-separated table of source patterns.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_table: Option<PathBuf>,

    /// Tab-separated table of target replacements.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_table: Option<PathBuf>,
}

impl TranslationConfig {
    /// Rule source described by this section.
    pub fn rule_source(&self) -> RuleSource {
        match (&self.source_table, &self.target_table) {
            (Some(source), Some(target)) => RuleSource::Files {
                source: source.clone(),
                target: target.clone(),
            },
            _ => RuleSource::Embedded,
        }
    }
}

/// Locking read defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LockingConfig {
    /// Lock wait used when none is given (default: -1, skip locked rows).
    #[serde(default)]
    pub default_wait: LockWait,

    /// Rows fetched per locking read (default: 100).
    #[serde(default = "default_batch_size")]
    pub batch_size: u32,
}

impl Default for LockingConfig {
    fn default() -> Self {
        Self {
            default_wait: LockWait::default(),
            batch_size: default_batch_size(),
        }
    }
}

fn default_batch_size() -> u32 {
    100
}
