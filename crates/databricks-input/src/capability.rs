//! Pre-flight rejection of replication modes the warehouse cannot serve
//!
//! The warehouse reports zero result columns when asked for the metadata of
//! a placeholder query, so a raw query with incremental boundaries would
//! produce an empty schema. Such requests are refused before any connection
//! is opened.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// What the extraction reads from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplicationMode {
    /// A table, queried by the extraction engine
    Table,
    /// A user-supplied query
    Query,
}

impl fmt::Display for ReplicationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Table => write!(f, "table"),
            Self::Query => write!(f, "query"),
        }
    }
}

/// Replication settings the extraction engine will run with
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplicationRequest {
    /// Table or query extraction
    pub mode: ReplicationMode,
    /// Incremental extraction from a last-seen record
    pub incremental: bool,
    /// Raw query with placeholders for incremental boundaries
    pub use_raw_query_with_incremental: bool,
    /// Columns defining the incremental boundary, in order
    pub incremental_columns: Vec<String>,
    /// Last-seen values of the incremental columns
    pub last_record: Option<Vec<String>>,
}

impl ReplicationRequest {
    /// Plain, non-incremental request
    pub fn new(mode: ReplicationMode) -> Self {
        Self {
            mode,
            incremental: false,
            use_raw_query_with_incremental: false,
            incremental_columns: Vec::new(),
            last_record: None,
        }
    }

    /// Table extraction
    pub fn table() -> Self {
        Self::new(ReplicationMode::Table)
    }

    /// Query extraction
    pub fn query() -> Self {
        Self::new(ReplicationMode::Query)
    }

    /// Enable incremental extraction over the given columns
    pub fn with_incremental<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.incremental = true;
        self.incremental_columns = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Set the raw-query incremental flag
    pub fn with_raw_query_incremental(mut self, enabled: bool) -> Self {
        self.use_raw_query_with_incremental = enabled;
        self
    }

    /// Set the last-seen record
    pub fn with_last_record<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.last_record = Some(values.into_iter().map(Into::into).collect());
        self
    }
}

/// Why a request was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RejectionReason {
    /// Raw-query incremental mode needs placeholder-query metadata
    RawQueryIncrementalUnsupported,
}

impl RejectionReason {
    /// Configuration option that triggered the rejection
    pub fn option(&self) -> &'static str {
        match self {
            Self::RawQueryIncrementalUnsupported => "use_raw_query_with_incremental",
        }
    }
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RawQueryIncrementalUnsupported => write!(
                f,
                "raw-query incremental mode unsupported: {} option is not supported",
                self.option()
            ),
        }
    }
}

impl From<RejectionReason> for Error {
    fn from(reason: RejectionReason) -> Self {
        Error::CapabilityRejected { reason }
    }
}

/// Stateless predicate over [`ReplicationRequest`]s
#[derive(Debug, Clone, Copy, Default)]
pub struct CapabilityGate;

impl CapabilityGate {
    /// The gate
    pub const fn new() -> Self {
        Self
    }

    /// Check a request without touching any connection.
    ///
    /// Raw-query incremental mode is refused whatever the other fields say.
    /// Plain incremental requests pass through unchanged; key-column
    /// resolution is left to the extraction engine.
    pub fn check(&self, request: &ReplicationRequest) -> std::result::Result<(), RejectionReason> {
        if request.use_raw_query_with_incremental {
            return Err(RejectionReason::RawQueryIncrementalUnsupported);
        }
        Ok(())
    }

    /// [`check`](Self::check) lifted into the crate error type
    pub fn validate(&self, request: &ReplicationRequest) -> Result<()> {
        self.check(request).map_err(Error::from)
    }
}
