//! Dialect selection from driver metadata.
//!
//! The [`DbmsSelector`] maps the product name a driver reports to a
//! [`DbmsCapability`]. It is explicitly constructed and handed to whoever
//! opens datasources, so tests and embedders can replace any mapping.
//!
//! Lookup order for a reported product:
//!
//! 1. MySQL servers whose version string contains `MariaDB` are treated as MariaDB
//! 2. An override registered for the product name
//! 3. The built-in constructor for the matching [`Dbms`]
//! 4. The generic dialect, with a warning

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::config::SelectorConfig;
use crate::drivers::{
    Db2Dialect, GenericDialect, H2Dialect, MariadbDialect, MssqlDialect, MysqlDialect,
    OracleDialect, PostgresDialect,
};
use crate::error::{BoxError, DbmsError, Result};

use super::connection::{DbConnection, ServerInfo};
use super::dbms::Dbms;
use super::traits::DbmsCapability;

/// Constructor for a capability, given the reported server identity.
pub type CapabilityCtor = Arc<
    dyn Fn(&ServerInfo) -> std::result::Result<Arc<dyn DbmsCapability>, BoxError> + Send + Sync,
>;

/// Registry of capability constructors keyed by database and product name.
#[derive(Clone, Default)]
pub struct DbmsSelector {
    /// Built-in constructors by database identity.
    builtins: HashMap<Dbms, CapabilityCtor>,

    /// Overrides keyed by lower-cased product name.
    overrides: HashMap<String, CapabilityCtor>,
}

impl fmt::Debug for DbmsSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut builtins: Vec<_> = self.builtins.keys().map(Dbms::key).collect();
        builtins.sort_unstable();
        let mut overrides: Vec<_> = self.overrides.keys().collect();
        overrides.sort_unstable();
        f.debug_struct("DbmsSelector")
            .field("builtins", &builtins)
            .field("overrides", &overrides)
            .finish()
    }
}

fn ctor<F, C>(build: F) -> CapabilityCtor
where
    F: Fn(&ServerInfo) -> C + Send + Sync + 'static,
    C: DbmsCapability + 'static,
{
    Arc::new(move |info: &ServerInfo| {
        Ok::<_, BoxError>(Arc::new(build(info)) as Arc<dyn DbmsCapability>)
    })
}

impl DbmsSelector {
    /// Create an empty selector; every product resolves to generic.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a selector with the built-in dialects registered.
    pub fn with_builtins() -> Self {
        let mut selector = Self::new();
        selector.register_builtin(Dbms::Generic, ctor(|_| GenericDialect::new()));
        selector.register_builtin(Dbms::Oracle, ctor(|_| OracleDialect::new()));
        selector.register_builtin(Dbms::Mssql, ctor(|_| MssqlDialect::new()));
        selector.register_builtin(Dbms::Db2, ctor(|_| Db2Dialect::new()));
        selector.register_builtin(Dbms::H2, ctor(|_| H2Dialect::new()));
        selector.register_builtin(
            Dbms::Mysql,
            ctor(|info| MysqlDialect::with_server_version(info.product_version.clone())),
        );
        selector.register_builtin(
            Dbms::Mariadb,
            ctor(|info| MariadbDialect::with_server_version(info.product_version.clone())),
        );
        selector.register_builtin(Dbms::Postgresql, ctor(|_| PostgresDialect::new()));
        selector
    }

    /// Create a built-in selector with the overrides from configuration.
    pub fn from_config(config: &SelectorConfig) -> Result<Self> {
        let mut selector = Self::with_builtins();
        for (product, dbms) in &config.overrides {
            selector.override_with_dialect(product.clone(), *dbms)?;
        }
        Ok(selector)
    }

    /// Register the built-in constructor for a database.
    pub fn register_builtin(&mut self, dbms: Dbms, ctor: CapabilityCtor) {
        self.builtins.insert(dbms, ctor);
    }

    /// Register a constructor for a product name, taking precedence over built-ins.
    pub fn register_override(&mut self, product: impl Into<String>, ctor: CapabilityCtor) {
        self.overrides.insert(product.into().to_lowercase(), ctor);
    }

    /// Builder form of [`register_override`](Self::register_override).
    pub fn with_override(mut self, product: impl Into<String>, ctor: CapabilityCtor) -> Self {
        self.register_override(product, ctor);
        self
    }

    /// Resolve a product name to the built-in constructor of another dialect.
    pub fn override_with_dialect(&mut self, product: impl Into<String>, dbms: Dbms) -> Result<()> {
        let product = product.into();
        let ctor = self.builtins.get(&dbms).cloned().ok_or_else(|| {
            DbmsError::Config(format!(
                "Cannot map product '{}' to dialect '{}': no such built-in dialect",
                product, dbms
            ))
        })?;
        self.register_override(product, ctor);
        Ok(())
    }

    /// Check if an override is registered for a product name.
    pub fn has_override(&self, product: &str) -> bool {
        self.overrides.contains_key(&product.trim().to_lowercase())
    }

    /// Select the capability for a reported product name and version.
    pub fn select(&self, product_name: &str, product_version: &str) -> Result<Arc<dyn DbmsCapability>> {
        let mut product = product_name.trim().to_string();
        if Dbms::from_product_name(&product) == Some(Dbms::Mysql)
            && product_version.to_lowercase().contains("mariadb")
        {
            debug!(
                "MySQL product reports version [{}], selecting MariaDB",
                product_version
            );
            product = "MariaDB".to_string();
        }
        let info = ServerInfo::new(product.clone(), product_version);

        if let Some(ctor) = self.overrides.get(&product.to_lowercase()) {
            debug!("using overridden capability for product [{}]", product);
            return construct(ctor, &info);
        }

        let builtin = Dbms::from_product_name(&product).and_then(|dbms| self.builtins.get(&dbms));
        if let Some(ctor) = builtin {
            return construct(ctor, &info);
        }

        warn!(
            "no capability found for product [{}], using generic support",
            product
        );
        match self.builtins.get(&Dbms::Generic) {
            Some(ctor) => construct(ctor, &info),
            None => Ok(Arc::new(GenericDialect::new())),
        }
    }

    /// Select the built-in capability for a dialect, bypassing product overrides.
    pub fn select_dialect(&self, dbms: Dbms, product_version: &str) -> Result<Arc<dyn DbmsCapability>> {
        let product = dbms.product_name().unwrap_or(dbms.key()).trim_end_matches('/');
        let info = ServerInfo::new(product, product_version);
        match self.builtins.get(&dbms) {
            Some(ctor) => construct(ctor, &info),
            None => {
                warn!("no built-in capability for {}, using generic support", dbms);
                Ok(Arc::new(GenericDialect::new()))
            }
        }
    }

    /// Select the capability for the database behind a connection.
    pub fn select_for(&self, conn: &dyn DbConnection) -> Result<Arc<dyn DbmsCapability>> {
        let info = conn.server_info();
        self.select(&info.product_name, &info.product_version)
    }
}

fn construct(ctor: &CapabilityCtor, info: &ServerInfo) -> Result<Arc<dyn DbmsCapability>> {
    ctor(info).map_err(|source| DbmsError::Construction {
        product: info.product_name.clone(),
        source,
    })
}
