//! Tab-separated translation rule tables.
//!
//! Two parallel tables drive the regex translator. The source table holds,
//! per dialect, the pattern recognizing a construct; the target table holds,
//! per dialect, the replacement producing it. Rows are keyed by a rule id
//! shared between both tables.
//!
//! ```text
//! # comment
//! rule      Oracle          MS_SQL
//! SYSDATE   \bSYSDATE\b     \bGETDATE\(\)
//! ```
//!
//! The first non-comment line is the header: `rule` followed by dialect
//! keys. Empty cells mean "no rule for this dialect". Cells are taken
//! verbatim, so a replacement may start with a space.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::core::dbms::Dbms;
use crate::error::{DbmsError, Result};

const EMBEDDED_SOURCE: &str = include_str!("../../rules/source.tsv");
const EMBEDDED_TARGET: &str = include_str!("../../rules/target.tsv");

/// One row of a rule table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleRow {
    pub id: String,
    cells: HashMap<Dbms, String>,
}

impl RuleRow {
    /// Cell for a dialect, `None` when absent or empty.
    pub fn cell(&self, dbms: Dbms) -> Option<&str> {
        self.cells.get(&dbms).map(String::as_str)
    }
}

/// A parsed rule table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleTable {
    origin: String,
    dialects: Vec<Dbms>,
    rows: Vec<RuleRow>,
}

impl RuleTable {
    /// Parse a table; `origin` names the table in error messages.
    pub fn parse(origin: impl Into<String>, text: &str) -> Result<Self> {
        let origin = origin.into();
        let error = |line: usize, message: String| DbmsError::RuleTable {
            path: origin.clone(),
            message: format!("line {}: {}", line, message),
        };

        let mut lines = text
            .lines()
            .enumerate()
            .map(|(i, line)| (i + 1, line.trim_end_matches('\r')))
            .filter(|(_, line)| {
                let trimmed = line.trim_start();
                !trimmed.is_empty() && !trimmed.starts_with('#')
            });

        let Some((header_line, header)) = lines.next() else {
            return Err(DbmsError::RuleTable {
                path: origin.clone(),
                message: "no header line".to_string(),
            });
        };
        let mut header_cells = header.split('\t').map(str::trim);
        if !header_cells
            .next()
            .map_or(false, |first| first.eq_ignore_ascii_case("rule"))
        {
            return Err(error(header_line, "header must start with 'rule'".to_string()));
        }
        let mut dialects = Vec::new();
        for key in header_cells {
            let dbms = Dbms::from_key(key).map_err(|e| error(header_line, e.to_string()))?;
            if dialects.contains(&dbms) {
                return Err(error(header_line, format!("duplicate dialect column '{}'", key)));
            }
            dialects.push(dbms);
        }

        let mut rows = Vec::new();
        let mut seen = HashSet::new();
        for (line_no, line) in lines {
            let mut cells = line.split('\t');
            let id = cells.next().unwrap_or_default().trim().to_string();
            if !seen.insert(id.clone()) {
                return Err(error(line_no, format!("duplicate rule '{}'", id)));
            }
            let values: Vec<&str> = cells.collect();
            if values.len() > dialects.len() {
                return Err(error(
                    line_no,
                    format!(
                        "rule '{}' has {} cells but the header names {} dialects",
                        id,
                        values.len(),
                        dialects.len()
                    ),
                ));
            }
            let cells = dialects
                .iter()
                .zip(values)
                .filter(|(_, value)| !value.is_empty())
                .map(|(dbms, value)| (*dbms, value.to_string()))
                .collect();
            rows.push(RuleRow { id, cells });
        }

        Ok(RuleTable {
            origin,
            dialects,
            rows,
        })
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Whether the table has a column for a dialect.
    pub fn has_dialect(&self, dbms: Dbms) -> bool {
        self.dialects.contains(&dbms)
    }

    pub fn dialects(&self) -> &[Dbms] {
        &self.dialects
    }

    /// Rows in table order.
    pub fn rows(&self) -> &[RuleRow] {
        &self.rows
    }

    pub fn row(&self, id: &str) -> Option<&RuleRow> {
        self.rows.iter().find(|row| row.id == id)
    }
}

/// Where the source and target rule tables come from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RuleSource {
    /// Tables compiled into the library.
    #[default]
    Embedded,
    /// Tables read from disk.
    Files { source: PathBuf, target: PathBuf },
}

impl RuleSource {
    /// Load and parse both tables.
    pub fn load(&self) -> Result<(RuleTable, RuleTable)> {
        match self {
            RuleSource::Embedded => Ok((
                RuleTable::parse("embedded source.tsv", EMBEDDED_SOURCE)?,
                RuleTable::parse("embedded target.tsv", EMBEDDED_TARGET)?,
            )),
            RuleSource::Files { source, target } => {
                let read = |path: &PathBuf| {
                    fs::read_to_string(path).map_err(|e| DbmsError::RuleTable {
                        path: path.display().to_string(),
                        message: e.to_string(),
                    })
                };
                Ok((
                    RuleTable::parse(source.display().to_string(), &read(source)?)?,
                    RuleTable::parse(target.display().to_string(), &read(target)?)?,
                ))
            }
        }
    }
}

impl fmt::Display for RuleSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuleSource::Embedded => f.write_str("embedded rule tables"),
            RuleSource::Files { source, target } => {
                write!(f, "{} and {}", source.display(), target.display())
            }
        }
    }
}
