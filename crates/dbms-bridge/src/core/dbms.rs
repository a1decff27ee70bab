//! Closed set of database identities.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{DbmsError, Result};

/// A supported database identity.
///
/// Each variant has a stable key (used in rule tables and configuration)
/// and, for real products, the product name a driver reports in its
/// metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Dbms {
    None,
    Generic,
    Oracle,
    Mssql,
    Db2,
    H2,
    Mysql,
    Mariadb,
    Postgresql,
}

impl Dbms {
    /// All identities, in declaration order.
    pub const ALL: [Dbms; 9] = [
        Dbms::None,
        Dbms::Generic,
        Dbms::Oracle,
        Dbms::Mssql,
        Dbms::Db2,
        Dbms::H2,
        Dbms::Mysql,
        Dbms::Mariadb,
        Dbms::Postgresql,
    ];

    /// Stable key of this identity.
    pub fn key(&self) -> &'static str {
        match self {
            Dbms::None => "none",
            Dbms::Generic => "generic",
            Dbms::Oracle => "Oracle",
            Dbms::Mssql => "MS_SQL",
            Dbms::Db2 => "DB2",
            Dbms::H2 => "H2",
            Dbms::Mysql => "MySQL",
            Dbms::Mariadb => "MariaDB",
            Dbms::Postgresql => "PostgreSQL",
        }
    }

    /// Product name as reported by driver metadata, if this is a real product.
    ///
    /// DB2 drivers report a platform suffix (`DB2/NT64`, `DB2/LINUXX8664`),
    /// so its name is matched as a prefix.
    pub fn product_name(&self) -> Option<&'static str> {
        match self {
            Dbms::None | Dbms::Generic => None,
            Dbms::Oracle => Some("Oracle"),
            Dbms::Mssql => Some("Microsoft SQL Server"),
            Dbms::Db2 => Some("DB2/"),
            Dbms::H2 => Some("H2"),
            Dbms::Mysql => Some("MySQL"),
            Dbms::Mariadb => Some("MariaDB"),
            Dbms::Postgresql => Some("PostgreSQL"),
        }
    }

    /// Find the identity whose product name matches a reported product name.
    pub fn from_product_name(product: &str) -> Option<Dbms> {
        let product = product.trim();
        Dbms::ALL.iter().copied().find(|dbms| match dbms.product_name() {
            Some(name) if name.ends_with('/') => product.starts_with(name),
            Some(name) => product.eq_ignore_ascii_case(name),
            None => false,
        })
    }

    /// Parse a dialect key, accepting common aliases.
    pub fn from_key(key: &str) -> Result<Dbms> {
        match key.trim().to_lowercase().as_str() {
            "none" | "" => Ok(Dbms::None),
            "generic" => Ok(Dbms::Generic),
            "oracle" => Ok(Dbms::Oracle),
            "ms_sql" | "mssql" | "sqlserver" | "sql_server" => Ok(Dbms::Mssql),
            "db2" => Ok(Dbms::Db2),
            "h2" => Ok(Dbms::H2),
            "mysql" => Ok(Dbms::Mysql),
            "mariadb" => Ok(Dbms::Mariadb),
            "postgresql" | "postgres" | "pg" => Ok(Dbms::Postgresql),
            other => Err(DbmsError::Config(format!(
                "Unknown dialect: '{}'. Supported dialects: {}",
                other,
                Dbms::ALL.iter().map(Dbms::key).collect::<Vec<_>>().join(", ")
            ))),
        }
    }
}

impl fmt::Display for Dbms {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Dbms {
    type Err = DbmsError;

    fn from_str(s: &str) -> Result<Self> {
        Dbms::from_key(s)
    }
}

impl TryFrom<String> for Dbms {
    type Error = DbmsError;

    fn try_from(value: String) -> Result<Self> {
        Dbms::from_key(&value)
    }
}

impl From<Dbms> for String {
    fn from(value: Dbms) -> Self {
        value.key().to_string()
    }
}
