//! Error types for the capability and translation layer.

use thiserror::Error;

use crate::core::dbms::Dbms;

/// Boxed driver error as handed back by a [`DbConnection`](crate::core::DbConnection).
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Main error type for capability and translation operations.
#[derive(Error, Debug)]
pub enum DbmsError {
    /// Configuration error (invalid YAML, unknown dialect key, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// The query does not have the shape the operation requires.
    #[error("Invalid query [{query}]: {reason}")]
    InvalidQuery { query: String, reason: String },

    /// The dialect cannot express the requested behavior.
    #[error("{dbms} does not support {feature} (query [{query}])")]
    Unsupported {
        dbms: Dbms,
        feature: String,
        query: String,
    },

    /// A capability constructor failed for a reported product.
    #[error("Cannot construct capability for product [{product}]")]
    Construction {
        product: String,
        #[source]
        source: BoxError,
    },

    /// Translation between two dialects could not be set up or applied.
    #[error("Cannot translate from {source_dbms} to {target_dbms}: {message}")]
    Translation {
        source_dbms: String,
        target_dbms: String,
        message: String,
    },

    /// A rule table could not be parsed.
    #[error("Rule table {path}: {message}")]
    RuleTable { path: String, message: String },

    /// A rule pattern failed to compile.
    #[error("Rule [{rule}] has an invalid pattern")]
    Pattern {
        rule: String,
        #[source]
        source: regex::Error,
    },

    /// Error reported by the caller-supplied connection or result set.
    #[error("Driver error while {context}")]
    Driver {
        context: String,
        #[source]
        source: BoxError,
    },

    /// IO error (file operations)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl DbmsError {
    /// Create an InvalidQuery error.
    pub fn invalid_query(query: impl Into<String>, reason: impl Into<String>) -> Self {
        DbmsError::InvalidQuery {
            query: query.into(),
            reason: reason.into(),
        }
    }

    /// Create an Unsupported error.
    pub fn unsupported(dbms: Dbms, feature: impl Into<String>, query: impl Into<String>) -> Self {
        DbmsError::Unsupported {
            dbms,
            feature: feature.into(),
            query: query.into(),
        }
    }

    /// Wrap a driver error with a description of what was being attempted.
    pub fn driver(context: impl Into<String>, source: BoxError) -> Self {
        DbmsError::Driver {
            context: context.into(),
            source,
        }
    }

    /// Create a Translation error.
    pub fn translation(source: Dbms, target: Dbms, message: impl Into<String>) -> Self {
        DbmsError::Translation {
            source_dbms: source.key().to_string(),
            target_dbms: target.key().to_string(),
            message: message.into(),
        }
    }

    /// Process exit code used by the command line front-end.
    pub fn exit_code(&self) -> u8 {
        match self {
            DbmsError::Config(_) | DbmsError::Yaml(_) => 1,
            DbmsError::InvalidQuery { .. } => 2,
            DbmsError::Unsupported { .. } => 3,
            DbmsError::Translation { .. }
            | DbmsError::RuleTable { .. }
            | DbmsError::Pattern { .. } => 4,
            DbmsError::Construction { .. } | DbmsError::Driver { .. } => 5,
            DbmsError::Io(_) => 7,
        }
    }

    /// Format error with full details including error chain
    pub fn format_detailed(&self) -> String {
        let mut output = format!("Error: {}\n", self);

        let mut source = std::error::Error::source(self);
        let mut depth = 1;
        while let Some(err) = source {
            output.push_str(&format!("\nCaused by:\n  {}: {}", depth, err));
            source = err.source();
            depth += 1;
        }

        output
    }
}

/// Result type alias for capability and translation operations.
pub type Result<T> = std::result::Result<T, DbmsError>;
