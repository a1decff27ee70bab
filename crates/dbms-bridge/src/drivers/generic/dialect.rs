//! Generic SQL dialect.
//!
//! Used for databases without a dedicated implementation. All behavior comes
//! from the defaults of [`DbmsCapability`].

use crate::core::traits::DbmsCapability;

/// Fallback dialect for unrecognized databases.
#[derive(Debug, Clone, Default)]
pub struct GenericDialect;

impl GenericDialect {
    /// Create a new generic dialect instance.
    pub fn new() -> Self {
        Self
    }
}

impl DbmsCapability for GenericDialect {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::dbms::Dbms;
    use crate::core::lob::LobStrategy;
    use crate::core::lock::LockWait;

    #[test]
    fn test_identity() {
        let d = GenericDialect::new();
        assert_eq!(d.dbms(), Dbms::Generic);
        assert_eq!(d.name(), "generic");
        assert!(!d.has_skip_locked());
        assert_eq!(d.lob_strategy(), LobStrategy::Locator);
    }

    #[test]
    fn test_rejects_non_select_for_every_wait() {
        let d = GenericDialect::new();
        for wait in [-1, 0, 5] {
            assert!(d
                .locking_read_query("UPDATE t SET x=1", 1, LockWait::new(wait))
                .is_err());
        }
    }

    #[test]
    fn test_first_record_query() {
        assert_eq!(
            GenericDialect::new().first_record_query("ibisstore"),
            "SELECT * FROM ibisstore FETCH FIRST 1 ROWS ONLY"
        );
    }
}
