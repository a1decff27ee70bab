//! Configuration validation.

use super::Config;
use crate::core::dbms::Dbms;
use crate::error::{DbmsError, Result};

/// Validate the configuration.
pub fn validate(config: &Config) -> Result<()> {
    // Selector validation
    for (product, dbms) in &config.selector.overrides {
        if product.trim().is_empty() {
            return Err(DbmsError::Config(
                "selector.overrides contains an empty product name".into(),
            ));
        }
        if *dbms == Dbms::None {
            return Err(DbmsError::Config(format!(
                "selector.overrides.{} cannot map to '{}'",
                product,
                Dbms::None
            )));
        }
    }

    // Translation validation
    let translation = &config.translation;
    if translation.source_table.is_some() != translation.target_table.is_some() {
        return Err(DbmsError::Config(
            "translation.source_table and translation.target_table must be set together".into(),
        ));
    }

    // Locking validation
    if config.locking.batch_size == 0 {
        return Err(DbmsError::Config(
            "locking.batch_size must be at least 1".into(),
        ));
    }

    Ok(())
}
