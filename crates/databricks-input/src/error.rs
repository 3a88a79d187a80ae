//! Error types for databricks-input
//!
//! Every fault carries the option, column or statement that caused it:
//! - Configuration faults (missing auth fields, rejected replication modes)
//! - Connection and namespace faults raised while opening a session
//! - Type faults raised while building the portable schema

use std::fmt;
use thiserror::Error;

/// Result type for databricks-input operations
pub type Result<T> = std::result::Result<T, Error>;

/// Coarse classification of [`Error`], for callers deciding what to do next
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Driver could not reach the warehouse or refused the credentials
    Connection,
    /// Configuration error, including capability rejections
    Configuration,
    /// Catalog or schema selection failed
    Namespace,
    /// Statement rejected by the warehouse
    Query,
    /// Source type cannot be represented
    UnsupportedType,
    /// Value coercion failed (not retriable)
    TypeConversion,
    /// Anything else
    Other,
}

impl ErrorCategory {
    /// Whether errors in this category are generally retriable.
    ///
    /// Informational only: nothing in this crate retries.
    #[inline]
    pub const fn is_retriable(self) -> bool {
        matches!(self, Self::Connection)
    }
}

/// Errors raised while configuring, opening or describing a session
#[derive(Error, Debug)]
#[allow(missing_docs)]
pub enum Error {
    /// Invalid or contradictory configuration
    #[error("configuration error: {message}")]
    Configuration {
        message: String,
        /// Offending option name, when one can be named
        option: Option<String>,
    },

    /// Requested replication mode cannot be served by this engine
    #[error("configuration error: {reason}")]
    CapabilityRejected {
        reason: crate::capability::RejectionReason,
    },

    /// Driver connect or probe failure
    #[error("cannot connect to warehouse: {message}")]
    Connection {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Catalog or schema selection failed
    #[error("failed to select {kind} '{name}': {source}")]
    Namespace {
        kind: crate::session::NamespaceKind,
        name: String,
        #[source]
        source: Box<Error>,
    },

    /// Statement failed on the warehouse
    #[error("statement failed: {message}")]
    Query {
        message: String,
        sql: Option<String>,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Column has a source type that cannot be represented
    #[error("unsupported type '{type_name}' for column '{column}'")]
    UnsupportedType { column: String, type_name: String },

    /// Value could not be coerced to the resolved portable type
    #[error("type conversion error in column '{column}': {message}")]
    TypeConversion { column: String, message: String },

    /// Broken invariant inside this crate
    #[error("internal error: {message}")]
    Internal { message: String },
}

impl Error {
    /// Category of this error
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Configuration { .. } | Self::CapabilityRejected { .. } => {
                ErrorCategory::Configuration
            }
            Self::Connection { .. } => ErrorCategory::Connection,
            Self::Namespace { .. } => ErrorCategory::Namespace,
            Self::Query { .. } => ErrorCategory::Query,
            Self::UnsupportedType { .. } => ErrorCategory::UnsupportedType,
            Self::TypeConversion { .. } => ErrorCategory::TypeConversion,
            Self::Internal { .. } => ErrorCategory::Other,
        }
    }

    /// Shorthand for `self.category().is_retriable()`
    #[inline]
    pub fn is_retriable(&self) -> bool {
        self.category().is_retriable()
    }

    /// Configuration fault without a specific option
    pub fn config(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
            option: None,
        }
    }

    /// Configuration fault naming the offending option
    pub fn config_option(option: impl Into<String>, message: impl Into<String>) -> Self {
        let option = option.into();
        Self::Configuration {
            message: format!("'{}' {}", option, message.into()),
            option: Some(option),
        }
    }

    /// Connection fault
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
            source: None,
        }
    }

    /// Connection fault wrapping the driver error
    pub fn connection_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Connection {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Statement failure, keeping the statement text
    pub fn query_with_sql(message: impl Into<String>, sql: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
            sql: Some(sql.into()),
            source: None,
        }
    }

    /// Column whose source type has no portable form
    pub fn unsupported_type(column: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self::UnsupportedType {
            column: column.into(),
            type_name: type_name.into(),
        }
    }

    /// Value that could not be coerced, naming its column
    pub fn type_conversion(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::TypeConversion {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Broken invariant
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Attach the offending option name to a configuration error
    pub fn for_option(self, option: impl Into<String>) -> Self {
        match self {
            Self::Configuration { message, .. } => Self::config_option(option, message),
            other => other,
        }
    }

    /// Offending option name for configuration faults
    pub fn option(&self) -> Option<&str> {
        match self {
            Self::Configuration { option, .. } => option.as_deref(),
            _ => None,
        }
    }
}

impl ErrorCategory {
    /// Lower-case name, as used in logs
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Connection => "connection",
            Self::Configuration => "configuration",
            Self::Namespace => "namespace",
            Self::Query => "query",
            Self::UnsupportedType => "unsupported_type",
            Self::TypeConversion => "type_conversion",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
