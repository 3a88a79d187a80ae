//! Connection traits for databricks-input
//!
//! Core abstractions over the driver:
//! - Connection: statement execution and metadata introspection
//! - ConnectionFactory: opens connections from assembled properties
//! - StatementScopedConnection: runs every statement as its own unit of work

use async_trait::async_trait;
use tracing::debug;

use crate::error::Result;
use crate::properties::ConnectionProperties;
use crate::types::{ColumnMetadata, Row, Value};

/// A connection to the SQL warehouse
#[async_trait]
pub trait Connection: Send + Sync {
    /// Run a statement and collect its rows
    async fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>>;

    /// Run a statement for its effect; returns the affected row count
    async fn execute(&self, sql: &str, params: &[Value]) -> Result<u64>;

    /// First row of a statement, if any
    async fn query_one(&self, sql: &str, params: &[Value]) -> Result<Option<Row>> {
        self.query(sql, params)
            .await
            .map(|rows| rows.into_iter().next())
    }

    /// Describe the result columns of a statement without running it
    async fn describe(&self, sql: &str) -> Result<Vec<ColumnMetadata>>;

    /// Enable or disable implicit auto-commit
    async fn set_auto_commit(&self, enabled: bool) -> Result<()>;

    /// Commit the current unit of work
    async fn commit(&self) -> Result<()>;

    /// Whether the driver still considers the session usable
    async fn is_valid(&self) -> bool;

    /// Release the driver session
    async fn close(&self) -> Result<()>;
}

/// Driver binding: turns assembled properties into a live session
#[async_trait]
pub trait ConnectionFactory: Send + Sync {
    /// Open one session
    async fn connect(&self, properties: &ConnectionProperties) -> Result<Box<dyn Connection>>;
}

/// Wraps a connection so each statement is its own unit of work.
///
/// The warehouse has no multi-statement transactions. Transaction controls
/// issued by callers become no-ops instead of reaching the driver.
pub struct StatementScopedConnection {
    inner: Box<dyn Connection>,
}

impl StatementScopedConnection {
    /// Wrap a driver connection
    pub fn new(inner: Box<dyn Connection>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl Connection for StatementScopedConnection {
    async fn query(&self, sql: &str, params: &[Value]) -> Result<Vec<Row>> {
        self.inner.query(sql, params).await
    }

    async fn execute(&self, sql: &str, params: &[Value]) -> Result<u64> {
        self.inner.execute(sql, params).await
    }

    async fn describe(&self, sql: &str) -> Result<Vec<ColumnMetadata>> {
        self.inner.describe(sql).await
    }

    async fn set_auto_commit(&self, enabled: bool) -> Result<()> {
        debug!(enabled, "Ignoring auto-commit change on statement-scoped connection");
        Ok(())
    }

    async fn commit(&self) -> Result<()> {
        debug!("Ignoring commit on statement-scoped connection");
        Ok(())
    }

    async fn is_valid(&self) -> bool {
        self.inner.is_valid().await
    }

    async fn close(&self) -> Result<()> {
        self.inner.close().await
    }
}

impl std::fmt::Debug for StatementScopedConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StatementScopedConnection").finish_non_exhaustive()
    }
}
